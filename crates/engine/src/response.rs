//! Wire envelopes for the operation results.
//!
//! Transports carry operation outcomes as a tagged object:
//! `{"status":"OK", ...payload}` or `{"status":"ERROR","error":"<kind>"}`.
//! The engine itself returns typed `Result`s; this module is the mapping
//! an embedding service serializes.

use serde::{Deserialize, Serialize};

use crate::ops::ErrorKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum Envelope<T> {
    #[serde(rename = "OK")]
    Ok(T),

    #[serde(rename = "ERROR")]
    Error { error: String },
}

impl<T> Envelope<T> {
    pub fn from_result<E: ErrorKind>(result: Result<T, E>) -> Self {
        match result {
            Ok(payload) => Envelope::Ok(payload),
            Err(err) => Envelope::Error {
                error: err.kind().to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Envelope::Ok(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Accepted, CreateOrderError, CreatedOrder, UpdateOrderError};
    use shopcore_core::BasketToken;

    #[test]
    fn ok_envelope_carries_the_payload_under_the_status_tag() {
        let token = BasketToken::mint();
        let envelope = Envelope::from_result::<CreateOrderError>(Ok(CreatedOrder {
            basket_token: token,
        }));
        let json: serde_json::Value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "OK");
        assert_eq!(json["basket_token"], token.to_string());
    }

    #[test]
    fn empty_ok_payload_is_just_the_tag() {
        let envelope = Envelope::from_result::<UpdateOrderError>(Ok(Accepted {}));
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"status":"OK"}"#
        );
    }

    #[test]
    fn error_envelope_spells_the_wire_code() {
        let envelope: Envelope<Accepted> =
            Envelope::from_result(Err(UpdateOrderError::ItemSoldOut));
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"status":"ERROR","error":"item_sold_out"}"#
        );
    }

    #[test]
    fn envelopes_round_trip() {
        let envelope: Envelope<Accepted> = Envelope::Error {
            error: "basket_expired".to_string(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        let back: Envelope<Accepted> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope);
    }
}

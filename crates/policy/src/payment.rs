//! Payment capture.

use serde::{Deserialize, Serialize};

use shopcore_core::{BasketToken, Money};

/// Result of a charge attempt.
///
/// `Unreachable` means the gateway could not be consulted within its
/// timeout; the caller treats it as transient and must not assume the
/// charge went through. `Rejected` is the customer failing to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeOutcome {
    Accepted,
    Rejected,
    Unreachable,
}

/// External payment gateway.
pub trait PaymentGateway: Send + Sync {
    fn charge(&self, amount: Money, basket: &BasketToken) -> ChargeOutcome;
}

/// Stub gateway: every charge settles.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllGateway;

impl PaymentGateway for AcceptAllGateway {
    fn charge(&self, _amount: Money, _basket: &BasketToken) -> ChargeOutcome {
        ChargeOutcome::Accepted
    }
}

//! Minor-unit money and ISO-4217 currency codes.
//!
//! Amounts are integers in the smallest currency unit (e.g. cents,
//! grosze). Arithmetic is checked: mixing currencies or overflowing is an
//! error, never a silent wrap.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("currency code must be three uppercase ASCII letters, got {0:?}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("currency mismatch: {0} vs {1}")]
    CurrencyMismatch(Currency, Currency),

    #[error("amount overflow")]
    Overflow,
}

/// ISO-4217 alphabetic currency code, e.g. `PLN`, `USD`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub fn as_str(&self) -> &str {
        // Construction guarantees uppercase ASCII.
        core::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return Err(CurrencyError::Malformed(s.to_string()));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.as_str().to_string()
    }
}

/// An amount of money in minor units of a single currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (e.g., cents).
    pub minor: u64,
    pub currency: Currency,
}

impl Money {
    pub fn new(minor: u64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Add two amounts of the same currency.
    pub fn checked_add(self, other: Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(self.currency, other.currency));
        }
        let minor = self
            .minor
            .checked_add(other.minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money {
            minor,
            currency: self.currency,
        })
    }

    /// Scale a unit price by a quantity (line total).
    pub fn checked_mul(self, qty: u32) -> Result<Money, MoneyError> {
        let minor = self
            .minor
            .checked_mul(u64::from(qty))
            .ok_or(MoneyError::Overflow)?;
        Ok(Money {
            minor,
            currency: self.currency,
        })
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.minor, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pln() -> Currency {
        "PLN".parse().unwrap()
    }

    fn usd() -> Currency {
        "USD".parse().unwrap()
    }

    #[test]
    fn currency_parse_enforces_iso_alpha() {
        assert!("PLN".parse::<Currency>().is_ok());
        assert!("pln".parse::<Currency>().is_err());
        assert!("ZLOTY".parse::<Currency>().is_err());
        assert!("P1N".parse::<Currency>().is_err());
    }

    #[test]
    fn add_same_currency() {
        let total = Money::new(1499, pln()).checked_add(Money::new(1, pln())).unwrap();
        assert_eq!(total, Money::new(1500, pln()));
    }

    #[test]
    fn add_mixed_currency_fails() {
        let err = Money::new(1, pln()).checked_add(Money::new(1, usd())).unwrap_err();
        assert_eq!(err, MoneyError::CurrencyMismatch(pln(), usd()));
    }

    #[test]
    fn line_total_scales_unit_price() {
        // 3 flags at 14.99 PLN
        let total = Money::new(1499, pln()).checked_mul(3).unwrap();
        assert_eq!(total.minor, 4497);
    }

    #[test]
    fn overflow_is_an_error() {
        assert_eq!(
            Money::new(u64::MAX, pln()).checked_add(Money::new(1, pln())),
            Err(MoneyError::Overflow)
        );
        assert_eq!(
            Money::new(u64::MAX, pln()).checked_mul(2),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn currency_serde_round_trip() {
        let json = serde_json::to_string(&pln()).unwrap();
        assert_eq!(json, "\"PLN\"");
        let back: Currency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pln());
    }
}

//! Invoice records.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{BasketToken, Currency, Money};

use crate::code::InvoiceCode;

/// Immutable record of a sealed basket. Created exactly once per
/// successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub code: InvoiceCode,
    pub basket_token: BasketToken,
    pub goods_cost: Money,
    pub ship_cost: Money,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn total(&self) -> Option<Money> {
        self.goods_cost.checked_add(self.ship_cost).ok()
    }
}

/// Append-only record of issued invoices, keyed by code.
#[derive(Debug, Default)]
pub struct InvoiceRegister {
    invoices: RwLock<HashMap<InvoiceCode, Invoice>>,
}

impl InvoiceRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issued invoice. Returns `false` (and keeps the original)
    /// if the code was already recorded; codes are never reused.
    pub fn record(&self, invoice: Invoice) -> bool {
        let Ok(mut invoices) = self.invoices.write() else {
            return false;
        };
        if invoices.contains_key(&invoice.code) {
            return false;
        }
        invoices.insert(invoice.code.clone(), invoice);
        true
    }

    pub fn get(&self, code: &InvoiceCode) -> Option<Invoice> {
        self.invoices.read().ok()?.get(code).cloned()
    }

    pub fn count(&self) -> usize {
        self.invoices.read().map(|i| i.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pln() -> Currency {
        "PLN".parse().unwrap()
    }

    fn invoice(code: &str) -> Invoice {
        Invoice {
            code: InvoiceCode::new(code),
            basket_token: BasketToken::mint(),
            goods_cost: Money::new(2998, pln()),
            ship_cost: Money::new(4000, pln()),
            currency: pln(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn total_sums_goods_and_shipping() {
        assert_eq!(invoice("Z-000012").total(), Some(Money::new(6998, pln())));
    }

    #[test]
    fn register_refuses_code_reuse() {
        let register = InvoiceRegister::new();
        assert!(register.record(invoice("Z-000012")));
        assert!(!register.record(invoice("Z-000012")));
        assert_eq!(register.count(), 1);
    }

    #[test]
    fn lookup_by_code() {
        let register = InvoiceRegister::new();
        let original = invoice("Z-000012");
        register.record(original.clone());
        assert_eq!(register.get(&InvoiceCode::new("Z-000012")), Some(original));
        assert_eq!(register.get(&InvoiceCode::new("Z-999999")), None);
    }
}

//! Purchase eligibility rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopcore_core::{AuthToken, Currency, ItemId};

/// Everything a policy needs to rule on one reservation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseContext {
    pub item_id: ItemId,
    pub currency: Currency,
    /// Quantity being requested now.
    pub requested_qty: u32,
    /// Quantity the customer already holds in this basket.
    pub held_qty: u32,
    pub customer: AuthToken,
}

impl PurchaseContext {
    /// Quantity the customer would hold if the request goes through.
    pub fn prospective_qty(&self) -> u32 {
        self.held_qty.saturating_add(self.requested_qty)
    }
}

/// Why a purchase was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PolicyViolation {
    /// Regional/legal rules forbid selling this item to this customer.
    #[error("item not available to this customer")]
    NotAvailable,

    /// The customer may not transact in the item's currency.
    #[error("currency not allowed for this customer")]
    CurrencyNotAllowed,

    /// Per-customer quantity cap would be exceeded.
    #[error("maximum quantity {limit} exceeded")]
    MaxQuantityExceeded { limit: u32 },
}

/// External eligibility oracle. A violation is a business-rule answer,
/// not a fault: the basket is left untouched and the customer corrects
/// their input.
pub trait PricingPolicy: Send + Sync {
    fn check(&self, ctx: &PurchaseContext) -> Result<(), PolicyViolation>;
}

/// Stub policy: everything is allowed.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenPricingPolicy;

impl PricingPolicy for OpenPricingPolicy {
    fn check(&self, _ctx: &PurchaseContext) -> Result<(), PolicyViolation> {
        Ok(())
    }
}

//! The basket lifecycle state machine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopcore_core::{AuthToken, BasketToken, ItemId, Money, MoneyError};

/// Basket lifecycle. `Open` is the only mutable state; the other three
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasketStatus {
    Open,
    Sealed,
    Expired,
    Abandoned,
}

/// One held claim: quantity plus the unit price captured when the item
/// was first reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: u32,
    pub unit_price: Money,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BasketError {
    #[error("basket is {0:?}, not open")]
    NotOpen(BasketStatus),

    #[error("basket has expired")]
    Expired,

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("item {0} is not in the basket")]
    LineMissing(ItemId),

    #[error("basket holds {held} of item {item_id}, cannot remove {requested}")]
    InsufficientHeld {
        item_id: ItemId,
        held: u32,
        requested: u32,
    },

    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A customer's in-progress, time-limited collection of reserved line
/// items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    token: BasketToken,
    auth_token: AuthToken,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: BasketStatus,
    line_items: BTreeMap<ItemId, LineItem>,
}

impl Basket {
    pub fn new(
        token: BasketToken,
        auth_token: AuthToken,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            auth_token,
            created_at,
            expires_at,
            status: BasketStatus::Open,
            line_items: BTreeMap::new(),
        }
    }

    pub fn token(&self) -> BasketToken {
        self.token
    }

    pub fn auth_token(&self) -> &AuthToken {
        &self.auth_token
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn status(&self) -> BasketStatus {
        self.status
    }

    pub fn line_items(&self) -> &BTreeMap<ItemId, LineItem> {
        &self.line_items
    }

    pub fn is_open(&self) -> bool {
        self.status == BasketStatus::Open
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Lazily apply expiry: if the basket is still `Open` past its
    /// deadline, transition to `Expired` and hand back the held
    /// quantities for ledger release.
    ///
    /// The status guard makes this exactly-once: only the first observer
    /// (under the basket lock) receives `Some`, so the corresponding
    /// release cannot run twice.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> Option<Vec<(ItemId, u32)>> {
        if self.status != BasketStatus::Open || !self.is_past_expiry(now) {
            return None;
        }
        self.status = BasketStatus::Expired;
        tracing::info!(basket = %self.token, "basket expired");
        Some(self.held_quantities())
    }

    /// Expire an open basket ahead of its deadline (the session window
    /// closed underneath it). Exactly-once via the same status guard as
    /// [`Basket::expire_if_due`].
    pub fn force_expire(&mut self) -> Option<Vec<(ItemId, u32)>> {
        if self.status != BasketStatus::Open {
            return None;
        }
        self.status = BasketStatus::Expired;
        tracing::info!(basket = %self.token, "basket expired with its session");
        Some(self.held_quantities())
    }

    /// Explicitly discard an open basket (terminal), handing back the
    /// held quantities for ledger release. Exactly-once via the same
    /// status guard as expiry.
    pub fn abandon(&mut self) -> Option<Vec<(ItemId, u32)>> {
        if self.status != BasketStatus::Open {
            return None;
        }
        self.status = BasketStatus::Abandoned;
        tracing::info!(basket = %self.token, "basket abandoned");
        Some(self.held_quantities())
    }

    /// All held (item, quantity) claims.
    pub fn held_quantities(&self) -> Vec<(ItemId, u32)> {
        self.line_items
            .iter()
            .map(|(id, line)| (id.clone(), line.quantity))
            .collect()
    }

    fn ensure_open(&self) -> Result<(), BasketError> {
        match self.status {
            BasketStatus::Open => Ok(()),
            BasketStatus::Expired => Err(BasketError::Expired),
            other => Err(BasketError::NotOpen(other)),
        }
    }

    /// Record `qty` more units of an item. The caller has already
    /// reserved that quantity in the ledger.
    ///
    /// Merging keeps the price snapshot taken when the line was first
    /// added; the claim was priced at reservation time.
    pub fn add_line(
        &mut self,
        item_id: ItemId,
        qty: u32,
        unit_price: Money,
    ) -> Result<(), BasketError> {
        self.ensure_open()?;
        if qty == 0 {
            return Err(BasketError::ZeroQuantity);
        }
        self.line_items
            .entry(item_id)
            .and_modify(|line| line.quantity += qty)
            .or_insert(LineItem {
                quantity: qty,
                unit_price,
            });
        Ok(())
    }

    /// Remove `qty` units of an item. The caller releases that quantity
    /// back to the ledger. An entry dropping to zero is removed, not
    /// stored.
    pub fn remove_line(&mut self, item_id: &ItemId, qty: u32) -> Result<(), BasketError> {
        self.ensure_open()?;
        if qty == 0 {
            return Err(BasketError::ZeroQuantity);
        }
        let line = self
            .line_items
            .get_mut(item_id)
            .ok_or_else(|| BasketError::LineMissing(item_id.clone()))?;
        if qty > line.quantity {
            return Err(BasketError::InsufficientHeld {
                item_id: item_id.clone(),
                held: line.quantity,
                requested: qty,
            });
        }
        line.quantity -= qty;
        if line.quantity == 0 {
            self.line_items.remove(item_id);
        }
        Ok(())
    }

    /// Irreversible `Open` → `Sealed` transition (successful checkout).
    pub fn seal(&mut self, now: DateTime<Utc>) -> Result<(), BasketError> {
        self.ensure_open()?;
        if self.is_past_expiry(now) {
            return Err(BasketError::Expired);
        }
        self.status = BasketStatus::Sealed;
        tracing::info!(basket = %self.token, "basket sealed");
        Ok(())
    }

    /// Push the deadline out for a transient-failure retry. Never
    /// shortens the window; ignored once the basket is no longer open.
    pub fn extend_expiry(&mut self, until: DateTime<Utc>) {
        if self.is_open() && until > self.expires_at {
            self.expires_at = until;
        }
    }

    /// Sum of line totals at their snapshot prices. `None` for an empty
    /// basket (no currency to denominate a zero in).
    pub fn goods_cost(&self) -> Result<Option<Money>, MoneyError> {
        let mut total: Option<Money> = None;
        for line in self.line_items.values() {
            let line_total = line.unit_price.checked_mul(line.quantity)?;
            total = Some(match total {
                Some(sum) => sum.checked_add(line_total)?,
                None => line_total,
            });
        }
        Ok(total)
    }
}

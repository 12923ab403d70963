//! The in-memory inventory ledger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

use shopcore_core::ItemId;

use crate::record::{InventoryRecord, ItemSnapshot};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("item {0} is not registered")]
    ItemNotFound(ItemId),

    #[error("item {0} already registered")]
    AlreadyRegistered(ItemId),

    #[error("item {0} is sold out")]
    SoldOut(ItemId),

    #[error("item {item_id}: only {available} of the requested quantity available")]
    Partial { item_id: ItemId, available: u32 },

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("release of {requested} would push item {item_id} past its ceiling ({stock}/{ceiling})")]
    ReleaseOverflow {
        item_id: ItemId,
        stock: u32,
        ceiling: u32,
        requested: u32,
    },

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

/// Per-item stock truth with linearizable reserve/release.
///
/// The outer map is read-locked only long enough to fetch an item's cell;
/// the stock mutation itself runs under that item's own mutex. Concurrent
/// calls on the same item serialize, calls on distinct items proceed
/// independently.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    items: RwLock<HashMap<ItemId, Arc<Mutex<InventoryRecord>>>>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new item to the ledger.
    pub fn register(&self, record: InventoryRecord) -> Result<(), LedgerError> {
        let mut items = self.items.write().map_err(|_| LedgerError::LockPoisoned)?;
        if items.contains_key(&record.item_id) {
            return Err(LedgerError::AlreadyRegistered(record.item_id));
        }
        tracing::info!(item_id = %record.item_id, stock = record.stock, "item registered");
        items.insert(record.item_id.clone(), Arc::new(Mutex::new(record)));
        Ok(())
    }

    fn cell(&self, item_id: &ItemId) -> Result<Arc<Mutex<InventoryRecord>>, LedgerError> {
        let items = self.items.read().map_err(|_| LedgerError::LockPoisoned)?;
        items
            .get(item_id)
            .cloned()
            .ok_or_else(|| LedgerError::ItemNotFound(item_id.clone()))
    }

    /// Read an item's current state.
    pub fn lookup(&self, item_id: &ItemId) -> Result<ItemSnapshot, LedgerError> {
        let cell = self.cell(item_id)?;
        let record = cell.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(ItemSnapshot::from(&*record))
    }

    /// Current stock count (test and ops convenience).
    pub fn stock_of(&self, item_id: &ItemId) -> Result<u32, LedgerError> {
        let cell = self.cell(item_id)?;
        let record = cell.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(record.stock)
    }

    /// Atomically take `qty` units of an item.
    ///
    /// On failure nothing is mutated: `SoldOut` when the count is zero,
    /// `Partial { available }` when some but not all of the request is
    /// coverable. Callers that accept partial fills re-issue the call with
    /// the reported availability.
    pub fn reserve(&self, item_id: &ItemId, qty: u32) -> Result<(), LedgerError> {
        if qty == 0 {
            return Err(LedgerError::ZeroQuantity);
        }
        let cell = self.cell(item_id)?;
        let mut record = cell.lock().map_err(|_| LedgerError::LockPoisoned)?;

        if record.stock == 0 {
            return Err(LedgerError::SoldOut(item_id.clone()));
        }
        if record.stock < qty {
            return Err(LedgerError::Partial {
                item_id: item_id.clone(),
                available: record.stock,
            });
        }

        record.stock -= qty;
        tracing::debug!(item_id = %item_id, qty, stock = record.stock, "stock reserved");
        Ok(())
    }

    /// Atomically return `qty` units of an item.
    ///
    /// The ceiling is a defensive bound: a release that would push the
    /// count past it indicates a double-release upstream and is rejected
    /// without mutation.
    pub fn release(&self, item_id: &ItemId, qty: u32) -> Result<(), LedgerError> {
        if qty == 0 {
            return Err(LedgerError::ZeroQuantity);
        }
        let cell = self.cell(item_id)?;
        let mut record = cell.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let new_stock = record.stock.checked_add(qty);
        if new_stock.is_none() || new_stock.is_some_and(|s| s > record.ceiling) {
            tracing::warn!(
                item_id = %item_id,
                qty,
                stock = record.stock,
                ceiling = record.ceiling,
                "release rejected: would exceed ceiling"
            );
            return Err(LedgerError::ReleaseOverflow {
                item_id: item_id.clone(),
                stock: record.stock,
                ceiling: record.ceiling,
                requested: qty,
            });
        }

        record.stock += qty;
        tracing::debug!(item_id = %item_id, qty, stock = record.stock, "stock released");
        Ok(())
    }
}

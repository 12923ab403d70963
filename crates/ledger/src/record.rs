//! Inventory records and their read-only snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{ItemId, Money};

/// Descriptive item metadata. Immutable after registration; only the stock
/// count of a record ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub brand: String,
    pub description: String,
    /// Size label, or `"N/A"` for one-size items.
    pub size: String,
    pub colour: String,
    pub photos: Vec<String>,
}

/// A ledger entry: one catalog item and its stock truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub item_id: ItemId,
    /// Units currently available for reservation.
    pub stock: u32,
    /// Upper bound on stock; releases may never push the count past this.
    pub ceiling: u32,
    pub unit_price: Money,
    pub metadata: ItemMetadata,
    pub registered_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Register a record with its initial stock as the ceiling.
    pub fn new(
        item_id: ItemId,
        stock: u32,
        unit_price: Money,
        metadata: ItemMetadata,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id,
            stock,
            ceiling: stock,
            unit_price,
            metadata,
            registered_at,
        }
    }

    pub fn with_ceiling(mut self, ceiling: u32) -> Self {
        self.ceiling = ceiling.max(self.stock);
        self
    }
}

/// Read-only copy of a record, handed out by `lookup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: ItemId,
    pub stock: u32,
    pub unit_price: Money,
    pub metadata: ItemMetadata,
}

impl From<&InventoryRecord> for ItemSnapshot {
    fn from(record: &InventoryRecord) -> Self {
        Self {
            item_id: record.item_id.clone(),
            stock: record.stock,
            unit_price: record.unit_price,
            metadata: record.metadata.clone(),
        }
    }
}

//! Inventory ledger — the single source of truth for per-item stock.
//!
//! Baskets hold *claims* against this ledger (item id + quantity), never a
//! second stock count. All stock mutation goes through [`InventoryLedger`],
//! which serializes reserve/release per item.

pub mod ledger;
pub mod record;

pub use ledger::{InventoryLedger, LedgerError};
pub use record::{InventoryRecord, ItemMetadata, ItemSnapshot};

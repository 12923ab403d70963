//! Basket store — customer baskets and their lifecycle.
//!
//! A basket is a time-limited claim on ledger stock: line items record
//! item id, quantity and a price snapshot, never a second stock count.
//! This crate is pure bookkeeping; it does not touch the inventory
//! ledger. The reservation engine owns the pairing of ledger mutation
//! with basket mutation.

pub mod basket;
pub mod store;

pub use basket::{Basket, BasketError, BasketStatus, LineItem};
pub use store::{BasketStore, BasketStoreError};

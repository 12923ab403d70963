//! `shopcore-core` — shared domain primitives.
//!
//! This crate contains **pure domain** building blocks (no IO, no clocks):
//! typed identifiers and minor-unit money. Everything above it (ledger,
//! basket store, engine) speaks in these types.

pub mod id;
pub mod money;

pub use id::{AuthToken, BasketToken, IdError, ItemId};
pub use money::{Currency, CurrencyError, Money, MoneyError};

//! `shopcore-invoicing` — invoices and invoice codes.
//!
//! An invoice is the immutable record of a sealed basket. Invoice-number
//! generation is an external concern; this crate defines the seam and a
//! sequential in-memory source for tests and embedding demos.

pub mod code;
pub mod invoice;

pub use code::{CodeSourceUnavailable, InvoiceCode, InvoiceCodeSource, SequentialCodes};
pub use invoice::{Invoice, InvoiceRegister};

//! `shopcore-policy` — external business-rule and gateway seams.
//!
//! Regional eligibility, currency rules, quantity limits, shipping
//! assessment and payment capture are all decided outside the
//! reservation core. This crate defines the traits the engine consumes,
//! plus permissive deterministic stubs for tests and embedding demos.
//! Every implementation must bound its own timeouts; "could not decide"
//! surfaces as an explicit outcome, never as a hang.

pub mod payment;
pub mod pricing;
pub mod shipping;

pub use payment::{AcceptAllGateway, ChargeOutcome, PaymentGateway};
pub use pricing::{OpenPricingPolicy, PolicyViolation, PricingPolicy, PurchaseContext};
pub use shipping::{FlatRateShipping, ShippingManifest, ShippingPolicy};

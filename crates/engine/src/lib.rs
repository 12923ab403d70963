//! `shopcore-engine` — the reservation engine.
//!
//! Orchestrates the basket lifecycle against the inventory ledger under
//! the documented operation contracts: `create_order`, `update_order`,
//! `delete_order`, `checkout_order`, `list_orders`. Token validation,
//! business rules, shipping, payment and invoice numbering are consumed
//! through collaborator seams; this crate owns the state machine, the
//! error taxonomy and the compensation paths.

pub mod engine;
pub mod ops;
pub mod response;

pub use engine::{Collaborators, EngineConfig, ReservationEngine};
pub use ops::{
    Accepted, CheckoutError, CheckoutOrderRequest, CheckoutSummary, CreateOrderError, CreatedOrder,
    DeleteOrderError, DeleteOrderRequest, ErrorKind, ListOrdersError, ListedOrders, OrderedItem,
    UpdateOrderError, UpdateOrderRequest,
};
pub use response::Envelope;

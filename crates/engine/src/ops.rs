//! Operation requests, success payloads and error taxonomies.
//!
//! One request struct and one error enum per operation. Requests carry
//! raw strings and wide integers; the engine parses at the boundary and
//! answers with the operation's own named error kind, never a panic or a
//! catch-all. Error kinds spell exactly like the documented wire codes
//! (see [`ErrorKind::kind`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopcore_core::{BasketToken, Currency, ItemId, Money};
use shopcore_invoicing::InvoiceCode;

/// Stable wire code for an operation error.
pub trait ErrorKind {
    fn kind(&self) -> &'static str;
}

// ─── create_order ───────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreateOrderError {
    /// Technical issue with the validation process; retry later.
    #[error("unable to validate token")]
    UnableToValidateToken,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,

    #[error("internal error")]
    Internal,
}

impl ErrorKind for CreateOrderError {
    fn kind(&self) -> &'static str {
        match self {
            Self::UnableToValidateToken => "unable_to_validate_token",
            Self::TokenExpired => "token_expired",
            Self::InvalidToken => "invalid_token",
            Self::Internal => "internal_error",
        }
    }
}

/// Success payload of `create_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub basket_token: BasketToken,
}

// ─── update_order ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub basket_token: String,
    pub item_id: String,
    pub qty: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpdateOrderError {
    /// Malformed input (non-positive quantity, bad item id syntax).
    #[error("data validation failed")]
    DataValidation,

    #[error("item is sold out")]
    ItemSoldOut,

    /// Stock covered only part of the request. The available part **was**
    /// reserved and recorded; the shortfall is reported here.
    #[error("only {reserved} of {requested} requested units were available")]
    PartialOrder { requested: u32, reserved: u32 },

    /// Business rules forbid selling this item to this customer.
    #[error("item not available to this customer")]
    NotAvailable,

    #[error("currency not allowed for this customer")]
    InvalidCurrency,

    #[error("maximum quantity per customer exceeded")]
    MaximumQuantityExceeded,

    #[error("item does not exist")]
    ItemDoesNotExist,

    #[error("invalid basket token")]
    InvalidBasket,

    #[error("basket expired")]
    BasketExpired,

    #[error("internal error")]
    Internal,
}

impl ErrorKind for UpdateOrderError {
    fn kind(&self) -> &'static str {
        match self {
            Self::DataValidation => "data_validation",
            Self::ItemSoldOut => "item_sold_out",
            Self::PartialOrder { .. } => "partial_order",
            Self::NotAvailable => "not_available",
            Self::InvalidCurrency => "invalid_currency",
            Self::MaximumQuantityExceeded => "maximum_quantity_exceeded",
            Self::ItemDoesNotExist => "item_does_not_exist",
            Self::InvalidBasket => "invalid_basket",
            Self::BasketExpired => "basket_expired",
            Self::Internal => "internal_error",
        }
    }
}

// ─── delete_order ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOrderRequest {
    pub basket_token: String,
    pub item_id: String,
    pub qty: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeleteOrderError {
    /// Zero or negative removal; use `update_order` to add units.
    #[error("quantity too low")]
    QuantityTooLow,

    /// Removal exceeds the quantity held in the basket.
    #[error("quantity too high")]
    QuantityTooHigh,

    #[error("invalid basket token")]
    InvalidBasket,

    #[error("basket expired")]
    BasketExpired,

    /// The item is not in the basket.
    #[error("invalid item code")]
    InvalidItemCode,

    #[error("internal error")]
    Internal,
}

impl ErrorKind for DeleteOrderError {
    fn kind(&self) -> &'static str {
        match self {
            Self::QuantityTooLow => "quantity_too_low",
            Self::QuantityTooHigh => "quantity_too_high",
            Self::InvalidBasket => "invalid_basket",
            Self::BasketExpired => "basket_expired",
            Self::InvalidItemCode => "invalid_item_code",
            Self::Internal => "internal_error",
        }
    }
}

/// Empty success payload for the mutating operations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accepted {}

// ─── checkout_order ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOrderRequest {
    pub basket_token: String,
    pub auth_token: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Transient validation outage; the basket stays open with extra time.
    #[error("unable to validate auth token")]
    UnableToValidateAuthToken,

    /// The session outlived its token; the basket window is over too.
    #[error("auth token expired")]
    AuthTokenExpired,

    /// Rejection; the reservation is discarded.
    #[error("invalid auth token")]
    InvalidAuthToken,

    /// Transient store fault; the basket stays open with extra time.
    #[error("unable to validate basket token")]
    UnableToValidateBasketToken,

    #[error("basket token expired")]
    BasketTokenExpired,

    /// Unknown, spent or mismatched token; the reservation is destroyed.
    #[error("invalid basket token")]
    InvalidBasketToken,

    /// The financial side could not produce an invoice; the basket stays
    /// open with extra time and no charge was captured.
    #[error("unable to generate invoice")]
    UnableToGenerateInvoice,

    /// The customer could not settle; the reservation is discarded.
    #[error("payment rejected")]
    PaymentRejected,

    #[error("internal error")]
    Internal,
}

impl ErrorKind for CheckoutError {
    fn kind(&self) -> &'static str {
        match self {
            Self::UnableToValidateAuthToken => "unable_to_validate_auth_token",
            Self::AuthTokenExpired => "auth_token_expired",
            Self::InvalidAuthToken => "invalid_auth_token",
            Self::UnableToValidateBasketToken => "unable_to_validate_basket_token",
            Self::BasketTokenExpired => "basket_token_expired",
            Self::InvalidBasketToken => "invalid_basket_token",
            Self::UnableToGenerateInvoice => "unable_to_generate_invoice",
            Self::PaymentRejected => "payment_rejected",
            Self::Internal => "internal_error",
        }
    }
}

/// Success payload of `checkout_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub invoice_currency: Currency,
    pub ship_cost: Money,
    pub goods_cost: Money,
    pub invoice_code: InvoiceCode,
}

// ─── list_orders ────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListOrdersError {
    #[error("unable to validate token")]
    UnableToValidateToken,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,

    #[error("internal error")]
    Internal,
}

impl ErrorKind for ListOrdersError {
    fn kind(&self) -> &'static str {
        match self {
            Self::UnableToValidateToken => "unable_to_validate_token",
            Self::TokenExpired => "token_expired",
            Self::InvalidToken => "invalid_token",
            Self::Internal => "internal_error",
        }
    }
}

/// One basket line enriched with current catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub item_id: ItemId,
    pub quantity: u32,
    pub description: String,
    pub size: String,
    pub colour: String,
    /// Price snapshot captured at reservation time.
    pub unit_price: Money,
    pub line_total: Money,
}

/// Success payload of `list_orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedOrders {
    pub items: Vec<OrderedItem>,
}

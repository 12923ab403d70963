//! The reservation engine: state machine, orchestration, compensation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use shopcore_auth::{TokenValidator, TokenVerdict};
use shopcore_basket::{Basket, BasketStatus, BasketStore, BasketStoreError};
use shopcore_core::{AuthToken, BasketToken, ItemId};
use shopcore_invoicing::{Invoice, InvoiceCodeSource, InvoiceRegister};
use shopcore_ledger::{InventoryLedger, LedgerError};
use shopcore_policy::{
    ChargeOutcome, PaymentGateway, PolicyViolation, PricingPolicy, PurchaseContext,
    ShippingManifest, ShippingPolicy,
};

use crate::ops::{
    Accepted, CheckoutError, CheckoutOrderRequest, CheckoutSummary, CreateOrderError, CreatedOrder,
    DeleteOrderError, DeleteOrderRequest, ListOrdersError, ListedOrders, OrderedItem,
    UpdateOrderError, UpdateOrderRequest,
};

/// Engine tunables.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Shopping window granted to a fresh basket.
    pub basket_ttl: Duration,
    /// Extra time granted when a transient collaborator failure tells the
    /// customer to retry.
    pub validation_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            basket_ttl: Duration::minutes(30),
            validation_grace: Duration::minutes(10),
        }
    }
}

/// External collaborators the engine consumes. All are trait objects so
/// embedders and tests can swap any seam independently.
pub struct Collaborators {
    pub validator: Arc<dyn TokenValidator>,
    pub pricing: Arc<dyn PricingPolicy>,
    pub shipping: Arc<dyn ShippingPolicy>,
    pub payments: Arc<dyn PaymentGateway>,
    pub codes: Arc<dyn InvoiceCodeSource>,
}

impl Collaborators {
    /// Everything-allowed stub wiring around a real validator: open
    /// pricing policy, flat 40.00 shipping, accept-all payments,
    /// sequential `Z-…` invoice codes.
    pub fn permissive(validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            validator,
            pricing: Arc::new(shopcore_policy::OpenPricingPolicy),
            shipping: Arc::new(shopcore_policy::FlatRateShipping { fee_minor: 4000 }),
            payments: Arc::new(shopcore_policy::AcceptAllGateway),
            codes: Arc::new(shopcore_invoicing::SequentialCodes::new("Z")),
        }
    }
}

/// Outcome of resolving a basket for mutation; shared by the operations
/// whose taxonomies distinguish invalid vs expired vs technical.
enum Gate {
    Invalid,
    Expired,
    Technical,
}

/// The basket/order lifecycle core.
///
/// One instance serves many concurrent customer sessions: basket-level
/// mutation serializes on the basket's own lock, stock mutation on the
/// item's, and the engine pairs the two under the basket lock so the
/// reserve+record (or release+remove) steps are never observably torn.
pub struct ReservationEngine {
    ledger: Arc<InventoryLedger>,
    baskets: Arc<BasketStore>,
    invoices: Arc<InvoiceRegister>,
    validator: Arc<dyn TokenValidator>,
    pricing: Arc<dyn PricingPolicy>,
    shipping: Arc<dyn ShippingPolicy>,
    payments: Arc<dyn PaymentGateway>,
    codes: Arc<dyn InvoiceCodeSource>,
    grace: Duration,
}

impl ReservationEngine {
    pub fn new(
        config: EngineConfig,
        ledger: Arc<InventoryLedger>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            ledger,
            baskets: Arc::new(BasketStore::new(config.basket_ttl)),
            invoices: Arc::new(InvoiceRegister::new()),
            validator: collaborators.validator,
            pricing: collaborators.pricing,
            shipping: collaborators.shipping,
            payments: collaborators.payments,
            codes: collaborators.codes,
            grace: config.validation_grace,
        }
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn baskets(&self) -> &BasketStore {
        &self.baskets
    }

    pub fn invoices(&self) -> &InvoiceRegister {
        &self.invoices
    }

    // ─── create_order ───────────────────────────────────────────────────

    pub fn create_order(&self, auth_token: &str) -> Result<CreatedOrder, CreateOrderError> {
        self.create_order_at(auth_token, Utc::now())
    }

    pub fn create_order_at(
        &self,
        auth_token: &str,
        now: DateTime<Utc>,
    ) -> Result<CreatedOrder, CreateOrderError> {
        let auth =
            AuthToken::new(auth_token).map_err(|_| CreateOrderError::InvalidToken)?;
        match self.validator.validate(&auth, now) {
            TokenVerdict::Valid => {}
            TokenVerdict::Expired => return Err(CreateOrderError::TokenExpired),
            TokenVerdict::Invalid => return Err(CreateOrderError::InvalidToken),
            TokenVerdict::Unreachable => return Err(CreateOrderError::UnableToValidateToken),
        }

        let basket_token = self
            .baskets
            .create(auth, now)
            .map_err(|_| CreateOrderError::Internal)?;
        Ok(CreatedOrder { basket_token })
    }

    // ─── update_order ───────────────────────────────────────────────────

    pub fn update_order(&self, req: &UpdateOrderRequest) -> Result<Accepted, UpdateOrderError> {
        self.update_order_at(req, Utc::now())
    }

    pub fn update_order_at(
        &self,
        req: &UpdateOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<Accepted, UpdateOrderError> {
        let qty = positive_qty(req.qty).ok_or(UpdateOrderError::DataValidation)?;
        let item_id: ItemId = req
            .item_id
            .parse()
            .map_err(|_| UpdateOrderError::DataValidation)?;

        let outcome = self.with_open_basket(&req.basket_token, now, |basket| {
            self.reserve_into_basket(basket, &item_id, qty)
        });
        match outcome {
            Ok(inner) => inner.map(|()| Accepted {}),
            Err(Gate::Invalid) => Err(UpdateOrderError::InvalidBasket),
            Err(Gate::Expired) => Err(UpdateOrderError::BasketExpired),
            Err(Gate::Technical) => Err(UpdateOrderError::Internal),
        }
    }

    /// Reserve stock and record the line, both under the caller-held
    /// basket lock.
    fn reserve_into_basket(
        &self,
        basket: &mut Basket,
        item_id: &ItemId,
        qty: u32,
    ) -> Result<(), UpdateOrderError> {
        let snapshot = match self.ledger.lookup(item_id) {
            Ok(snapshot) => snapshot,
            Err(LedgerError::ItemNotFound(_)) => return Err(UpdateOrderError::ItemDoesNotExist),
            Err(err) => {
                tracing::error!(item = %item_id, %err, "ledger lookup failed");
                return Err(UpdateOrderError::Internal);
            }
        };

        let held_qty = basket
            .line_items()
            .get(item_id)
            .map(|line| line.quantity)
            .unwrap_or(0);
        let ctx = PurchaseContext {
            item_id: item_id.clone(),
            currency: snapshot.unit_price.currency,
            requested_qty: qty,
            held_qty,
            customer: basket.auth_token().clone(),
        };
        self.pricing.check(&ctx).map_err(|violation| match violation {
            PolicyViolation::NotAvailable => UpdateOrderError::NotAvailable,
            PolicyViolation::CurrencyNotAllowed => UpdateOrderError::InvalidCurrency,
            PolicyViolation::MaxQuantityExceeded { .. } => {
                UpdateOrderError::MaximumQuantityExceeded
            }
        })?;

        // Walk the partial ladder: take what the ledger reports available.
        // Racing takers can only shrink the figure, so the walk terminates.
        let mut want = qty;
        let reserved = loop {
            match self.ledger.reserve(item_id, want) {
                Ok(()) => break want,
                Err(LedgerError::Partial { available, .. }) => want = available,
                Err(LedgerError::SoldOut(_)) => break 0,
                Err(LedgerError::ItemNotFound(_)) => {
                    return Err(UpdateOrderError::ItemDoesNotExist)
                }
                Err(err) => {
                    tracing::error!(item = %item_id, %err, "reserve failed");
                    return Err(UpdateOrderError::Internal);
                }
            }
        };
        if reserved == 0 {
            return Err(UpdateOrderError::ItemSoldOut);
        }

        if let Err(err) = basket.add_line(item_id.clone(), reserved, snapshot.unit_price) {
            // The hold has no basket record; undo it before reporting.
            self.release_all(&[(item_id.clone(), reserved)]);
            tracing::error!(item = %item_id, %err, "line bookkeeping failed after reserve");
            return Err(UpdateOrderError::Internal);
        }

        if reserved < qty {
            tracing::info!(item = %item_id, requested = qty, reserved, "partial reservation");
            return Err(UpdateOrderError::PartialOrder {
                requested: qty,
                reserved,
            });
        }
        tracing::info!(item = %item_id, qty, "reservation recorded");
        Ok(())
    }

    // ─── delete_order ───────────────────────────────────────────────────

    pub fn delete_order(&self, req: &DeleteOrderRequest) -> Result<Accepted, DeleteOrderError> {
        self.delete_order_at(req, Utc::now())
    }

    pub fn delete_order_at(
        &self,
        req: &DeleteOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<Accepted, DeleteOrderError> {
        if req.qty < 1 {
            return Err(DeleteOrderError::QuantityTooLow);
        }
        let qty = u32::try_from(req.qty).map_err(|_| DeleteOrderError::QuantityTooHigh)?;
        let item_id: ItemId = req
            .item_id
            .parse()
            .map_err(|_| DeleteOrderError::InvalidItemCode)?;

        let outcome = self.with_open_basket(&req.basket_token, now, |basket| {
            let held = basket
                .line_items()
                .get(&item_id)
                .map(|line| line.quantity)
                .ok_or(DeleteOrderError::InvalidItemCode)?;
            if qty > held {
                return Err(DeleteOrderError::QuantityTooHigh);
            }

            // Ledger release precedes the basket commit; both run under
            // the basket lock, so no observer sees one without the other.
            if let Err(err) = self.ledger.release(&item_id, qty) {
                tracing::warn!(item = %item_id, qty, %err, "release refused");
                return Err(DeleteOrderError::Internal);
            }
            if let Err(err) = basket.remove_line(&item_id, qty) {
                tracing::error!(item = %item_id, %err, "basket bookkeeping failed after release");
                return Err(DeleteOrderError::Internal);
            }
            tracing::info!(item = %item_id, qty, "reservation reduced");
            Ok(())
        });
        match outcome {
            Ok(inner) => inner.map(|()| Accepted {}),
            Err(Gate::Invalid) => Err(DeleteOrderError::InvalidBasket),
            Err(Gate::Expired) => Err(DeleteOrderError::BasketExpired),
            Err(Gate::Technical) => Err(DeleteOrderError::Internal),
        }
    }

    // ─── checkout_order ─────────────────────────────────────────────────

    pub fn checkout_order(
        &self,
        req: &CheckoutOrderRequest,
    ) -> Result<CheckoutSummary, CheckoutError> {
        self.checkout_order_at(req, Utc::now())
    }

    pub fn checkout_order_at(
        &self,
        req: &CheckoutOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let auth = AuthToken::new(req.auth_token.as_str())
            .map_err(|_| CheckoutError::InvalidAuthToken)?;

        // Auth first. Its failure modes decide the basket's fate: a
        // transient outage buys the customer time, an expired session
        // closes the basket window, a rejection discards the reservation.
        match self.validator.validate(&auth, now) {
            TokenVerdict::Valid => {}
            TokenVerdict::Unreachable => {
                self.grant_grace(&req.basket_token, now);
                return Err(CheckoutError::UnableToValidateAuthToken);
            }
            TokenVerdict::Expired => {
                self.close_with(&req.basket_token, now, Basket::force_expire);
                return Err(CheckoutError::AuthTokenExpired);
            }
            TokenVerdict::Invalid => {
                self.close_with(&req.basket_token, now, |basket| basket.abandon());
                return Err(CheckoutError::InvalidAuthToken);
            }
        }

        let token: BasketToken = req
            .basket_token
            .parse()
            .map_err(|_| CheckoutError::InvalidBasketToken)?;
        let cell = self.baskets.handle(&token).map_err(|err| match err {
            BasketStoreError::UnknownBasket(_) => CheckoutError::InvalidBasketToken,
            BasketStoreError::LockPoisoned => CheckoutError::UnableToValidateBasketToken,
        })?;
        let mut basket = cell
            .lock()
            .map_err(|_| CheckoutError::UnableToValidateBasketToken)?;

        if let Some(held) = basket.expire_if_due(now) {
            self.release_all(&held);
            return Err(CheckoutError::BasketTokenExpired);
        }
        match basket.status() {
            BasketStatus::Open => {}
            BasketStatus::Expired => return Err(CheckoutError::BasketTokenExpired),
            _ => return Err(CheckoutError::InvalidBasketToken),
        }

        if basket.auth_token() != &auth {
            // A real token presented by the wrong session: basket-token
            // invalidity is the class that destroys the reservation.
            if let Some(held) = basket.abandon() {
                self.release_all(&held);
            }
            tracing::warn!(basket = %token, "auth/basket binding mismatch at checkout");
            return Err(CheckoutError::InvalidBasketToken);
        }

        let goods = match basket.goods_cost() {
            Ok(Some(goods)) => goods,
            Ok(None) => {
                // Nothing to invoice yet; leave the window open so the
                // customer can add items and retry.
                basket.extend_expiry(now + self.grace);
                return Err(CheckoutError::UnableToGenerateInvoice);
            }
            Err(err) => {
                tracing::error!(basket = %token, %err, "goods cost computation failed");
                return Err(CheckoutError::Internal);
            }
        };

        let manifest = ShippingManifest {
            goods_cost: goods,
            lines: basket.held_quantities(),
        };
        let ship = self.shipping.quote(&manifest);
        let total = match goods.checked_add(ship) {
            Ok(total) => total,
            Err(err) => {
                tracing::error!(basket = %token, %err, "invoice total computation failed");
                return Err(CheckoutError::Internal);
            }
        };

        // Draw the code before charging: a code-source outage must never
        // strand a captured payment. A rejected charge wastes one code,
        // which shows up as a gap in the sequence.
        let code = match self.codes.next_code() {
            Ok(code) => code,
            Err(_) => {
                basket.extend_expiry(now + self.grace);
                tracing::warn!(basket = %token, "invoice code source unavailable");
                return Err(CheckoutError::UnableToGenerateInvoice);
            }
        };

        match self.payments.charge(total, &token) {
            ChargeOutcome::Accepted => {}
            ChargeOutcome::Rejected => {
                if let Some(held) = basket.abandon() {
                    self.release_all(&held);
                }
                tracing::warn!(basket = %token, "payment rejected, reservation discarded");
                return Err(CheckoutError::PaymentRejected);
            }
            ChargeOutcome::Unreachable => {
                basket.extend_expiry(now + self.grace);
                tracing::warn!(basket = %token, "payment gateway unreachable");
                return Err(CheckoutError::UnableToGenerateInvoice);
            }
        }

        if let Err(err) = basket.seal(now) {
            // A captured payment with an unsealable basket is the one
            // state this machine must never reach quietly.
            tracing::error!(basket = %token, %err, "seal failed after captured payment");
            return Err(CheckoutError::Internal);
        }

        let invoice = Invoice {
            code: code.clone(),
            basket_token: token,
            goods_cost: goods,
            ship_cost: ship,
            currency: goods.currency,
            created_at: now,
        };
        if !self.invoices.record(invoice) {
            tracing::error!(basket = %token, code = %code, "invoice code collision");
        }
        tracing::info!(basket = %token, code = %code, "checkout complete");

        Ok(CheckoutSummary {
            invoice_currency: goods.currency,
            ship_cost: ship,
            goods_cost: goods,
            invoice_code: code,
        })
    }

    // ─── list_orders ────────────────────────────────────────────────────

    pub fn list_orders(&self, basket_token: &str) -> Result<ListedOrders, ListOrdersError> {
        self.list_orders_at(basket_token, Utc::now())
    }

    pub fn list_orders_at(
        &self,
        basket_token: &str,
        now: DateTime<Utc>,
    ) -> Result<ListedOrders, ListOrdersError> {
        let token: BasketToken = basket_token
            .parse()
            .map_err(|_| ListOrdersError::InvalidToken)?;
        let cell = self.baskets.handle(&token).map_err(|err| match err {
            BasketStoreError::UnknownBasket(_) => ListOrdersError::InvalidToken,
            BasketStoreError::LockPoisoned => ListOrdersError::UnableToValidateToken,
        })?;
        let mut basket = cell
            .lock()
            .map_err(|_| ListOrdersError::UnableToValidateToken)?;

        if let Some(held) = basket.expire_if_due(now) {
            self.release_all(&held);
            return Err(ListOrdersError::TokenExpired);
        }
        match basket.status() {
            BasketStatus::Open => {}
            BasketStatus::Expired => return Err(ListOrdersError::TokenExpired),
            _ => return Err(ListOrdersError::InvalidToken),
        }

        let mut items = Vec::with_capacity(basket.line_items().len());
        for (item_id, line) in basket.line_items() {
            let snapshot = self.ledger.lookup(item_id).map_err(|err| {
                tracing::error!(item = %item_id, %err, "metadata lookup failed");
                ListOrdersError::Internal
            })?;
            let line_total = line
                .unit_price
                .checked_mul(line.quantity)
                .map_err(|_| ListOrdersError::Internal)?;
            items.push(OrderedItem {
                item_id: item_id.clone(),
                quantity: line.quantity,
                description: snapshot.metadata.description,
                size: snapshot.metadata.size,
                colour: snapshot.metadata.colour,
                unit_price: line.unit_price,
                line_total,
            });
        }
        Ok(ListedOrders { items })
    }

    // ─── maintenance ────────────────────────────────────────────────────

    /// Proactively reclaim stock from overdue baskets. Lazy per-access
    /// expiry already keeps things correct; this just returns stock to
    /// the shelf sooner. Returns the number of baskets reclaimed.
    pub fn reclaim_expired(&self) -> usize {
        self.reclaim_expired_at(Utc::now())
    }

    pub fn reclaim_expired_at(&self, now: DateTime<Utc>) -> usize {
        match self.baskets.sweep(now) {
            Ok(reclaimed) => {
                for (token, held) in &reclaimed {
                    tracing::info!(basket = %token, lines = held.len(), "reclaiming expired basket");
                    self.release_all(held);
                }
                reclaimed.len()
            }
            Err(err) => {
                tracing::warn!(%err, "expiry sweep failed");
                0
            }
        }
    }

    // ─── internals ──────────────────────────────────────────────────────

    /// Resolve an open basket and run `f` under its lock. Lazy expiry is
    /// applied first: the observer that flips the status also performs
    /// the ledger release, exactly once.
    fn with_open_basket<R>(
        &self,
        basket_token: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut Basket) -> R,
    ) -> Result<R, Gate> {
        let token: BasketToken = basket_token.parse().map_err(|_| Gate::Invalid)?;
        let cell = self.baskets.handle(&token).map_err(|err| match err {
            BasketStoreError::UnknownBasket(_) => Gate::Invalid,
            BasketStoreError::LockPoisoned => Gate::Technical,
        })?;
        let mut basket = cell.lock().map_err(|_| Gate::Technical)?;

        if let Some(held) = basket.expire_if_due(now) {
            self.release_all(&held);
            return Err(Gate::Expired);
        }
        match basket.status() {
            BasketStatus::Open => Ok(f(&mut basket)),
            BasketStatus::Expired => Err(Gate::Expired),
            // Sealed and abandoned baskets have spent their token.
            _ => Err(Gate::Invalid),
        }
    }

    /// Return held claims to the ledger. Compensation must not fail the
    /// operation that triggered it; refusals are logged and the rest of
    /// the claims still go back.
    fn release_all(&self, held: &[(ItemId, u32)]) {
        for (item_id, qty) in held {
            if let Err(err) = self.ledger.release(item_id, *qty) {
                tracing::warn!(item = %item_id, qty, %err, "compensating release refused");
            }
        }
    }

    /// Best-effort: give an open basket more time after a transient
    /// collaborator failure. An already-overdue basket expires instead.
    fn grant_grace(&self, basket_token: &str, now: DateTime<Utc>) {
        let Ok(token) = basket_token.parse::<BasketToken>() else {
            return;
        };
        let Ok(cell) = self.baskets.handle(&token) else {
            return;
        };
        let Ok(mut basket) = cell.lock() else {
            return;
        };
        if let Some(held) = basket.expire_if_due(now) {
            self.release_all(&held);
        } else {
            basket.extend_expiry(now + self.grace);
        }
    }

    /// Best-effort terminal close (expire or abandon) with ledger
    /// release, used by the checkout rejection paths.
    fn close_with(
        &self,
        basket_token: &str,
        now: DateTime<Utc>,
        close: impl FnOnce(&mut Basket) -> Option<Vec<(ItemId, u32)>>,
    ) {
        let Ok(token) = basket_token.parse::<BasketToken>() else {
            return;
        };
        let Ok(cell) = self.baskets.handle(&token) else {
            return;
        };
        let Ok(mut basket) = cell.lock() else {
            return;
        };
        // Lazy expiry first so an overdue basket ends as Expired, not
        // whatever the caller was about to make it.
        if let Some(held) = basket.expire_if_due(now) {
            self.release_all(&held);
            return;
        }
        if let Some(held) = close(&mut basket) {
            self.release_all(&held);
        }
    }
}

fn positive_qty(qty: i64) -> Option<u32> {
    if qty < 1 {
        return None;
    }
    u32::try_from(qty).ok()
}

//! In-memory basket store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use shopcore_core::{AuthToken, BasketToken, ItemId};

use crate::basket::Basket;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BasketStoreError {
    #[error("unknown basket token {0}")]
    UnknownBasket(BasketToken),

    #[error("basket store lock poisoned")]
    LockPoisoned,
}

/// Keyed store of basket cells.
///
/// The outer map is locked only to create or fetch a cell; all lifecycle
/// mutation happens under the individual basket's mutex, so racing
/// requests against one basket serialize while other baskets proceed
/// untouched.
#[derive(Debug)]
pub struct BasketStore {
    baskets: RwLock<HashMap<BasketToken, Arc<Mutex<Basket>>>>,
    ttl: Duration,
}

impl BasketStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            baskets: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open a basket for a customer session; returns the fresh token.
    pub fn create(
        &self,
        auth_token: AuthToken,
        now: DateTime<Utc>,
    ) -> Result<BasketToken, BasketStoreError> {
        let token = BasketToken::mint();
        let basket = Basket::new(token, auth_token, now, now + self.ttl);
        let mut baskets = self
            .baskets
            .write()
            .map_err(|_| BasketStoreError::LockPoisoned)?;
        baskets.insert(token, Arc::new(Mutex::new(basket)));
        tracing::info!(basket = %token, "basket opened");
        Ok(token)
    }

    /// Fetch the cell for a basket. Expiry is evaluated by the caller
    /// under the basket's own lock (`Basket::expire_if_due`), because the
    /// observer that flips the status is also responsible for ledger
    /// release, and the store never touches the ledger.
    pub fn handle(&self, token: &BasketToken) -> Result<Arc<Mutex<Basket>>, BasketStoreError> {
        let baskets = self
            .baskets
            .read()
            .map_err(|_| BasketStoreError::LockPoisoned)?;
        baskets
            .get(token)
            .cloned()
            .ok_or(BasketStoreError::UnknownBasket(*token))
    }

    /// Proactive expiry sweep: transition every overdue open basket and
    /// collect the claims to release. Lazy per-access expiry already
    /// keeps the system correct; sweeping just reclaims stock sooner.
    pub fn sweep(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(BasketToken, Vec<(ItemId, u32)>)>, BasketStoreError> {
        let cells: Vec<(BasketToken, Arc<Mutex<Basket>>)> = {
            let baskets = self
                .baskets
                .read()
                .map_err(|_| BasketStoreError::LockPoisoned)?;
            baskets
                .iter()
                .map(|(token, cell)| (*token, Arc::clone(cell)))
                .collect()
        };

        let mut reclaimed = Vec::new();
        for (token, cell) in cells {
            let mut basket = cell.lock().map_err(|_| BasketStoreError::LockPoisoned)?;
            if let Some(held) = basket.expire_if_due(now) {
                if !held.is_empty() {
                    reclaimed.push((token, held));
                }
            }
        }
        Ok(reclaimed)
    }

    pub fn len(&self) -> usize {
        self.baskets.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::BasketStatus;
    use shopcore_core::Money;

    fn auth() -> AuthToken {
        AuthToken::new("8zQ74sSawCfWza05").unwrap()
    }

    #[test]
    fn create_returns_resolvable_token() {
        let store = BasketStore::new(Duration::minutes(30));
        let now = Utc::now();
        let token = store.create(auth(), now).unwrap();

        let cell = store.handle(&token).unwrap();
        let basket = cell.lock().unwrap();
        assert_eq!(basket.status(), BasketStatus::Open);
        assert_eq!(basket.expires_at(), now + Duration::minutes(30));
    }

    #[test]
    fn unknown_token_does_not_resolve() {
        let store = BasketStore::new(Duration::minutes(30));
        let stranger = BasketToken::mint();
        assert_eq!(
            store.handle(&stranger).unwrap_err(),
            BasketStoreError::UnknownBasket(stranger)
        );
    }

    #[test]
    fn tokens_are_single_use_distinct() {
        let store = BasketStore::new(Duration::minutes(30));
        let now = Utc::now();
        let a = store.create(auth(), now).unwrap();
        let b = store.create(auth(), now).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn sweep_reclaims_only_overdue_open_baskets() {
        let store = BasketStore::new(Duration::minutes(30));
        let now = Utc::now();

        let overdue = store.create(auth(), now).unwrap();
        {
            let cell = store.handle(&overdue).unwrap();
            let mut basket = cell.lock().unwrap();
            basket
                .add_line(
                    "I-00002".parse().unwrap(),
                    3,
                    Money::new(1499, "PLN".parse().unwrap()),
                )
                .unwrap();
        }
        let fresh = store.create(auth(), now + Duration::minutes(10)).unwrap();

        let reclaimed = store.sweep(now + Duration::minutes(31)).unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].0, overdue);
        assert_eq!(reclaimed[0].1, vec![("I-00002".parse().unwrap(), 3)]);

        let fresh_cell = store.handle(&fresh).unwrap();
        assert!(fresh_cell.lock().unwrap().is_open());

        // A second sweep finds nothing left to reclaim.
        assert!(store.sweep(now + Duration::minutes(32)).unwrap().is_empty());
    }
}

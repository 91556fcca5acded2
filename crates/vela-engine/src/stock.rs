//! # Stock Controller
//!
//! The only path through which sales touch inventory counters.
//!
//! ## Reservation Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve(product, qty)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Conditional UPDATE (vela-db, single statement)                         │
//! │       │                                                                 │
//! │       ├── row matched ──► Ok(remaining stock)                           │
//! │       │                                                                 │
//! │       └── no match ──► follow-up SELECT to classify:                    │
//! │               ├── product exists ──► InsufficientStock { available }    │
//! │               └── product absent ──► ProductNotFound                    │
//! │                                                                         │
//! │  The classification read runs AFTER the failed update and is only       │
//! │  used for the error message; the decision itself was made atomically.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use vela_core::{validation, CoreError};
use vela_db::ProductRepository;

/// Mediates every stock mutation the checkout flow performs.
#[derive(Debug, Clone)]
pub struct StockController {
    products: ProductRepository,
}

impl StockController {
    /// Creates a new StockController over the product repository.
    pub fn new(products: ProductRepository) -> Self {
        StockController { products }
    }

    /// Atomically reserves `quantity` units of a product.
    ///
    /// ## Returns
    /// The stock remaining after the reservation.
    ///
    /// ## Errors
    /// - Validation errors for out-of-range quantities
    /// - `ProductNotFound` when the product id is unknown
    /// - `InsufficientStock` when fewer than `quantity` units are on hand
    pub async fn reserve(&self, product_id: &str, quantity: i64) -> EngineResult<i64> {
        validation::validate_quantity(quantity)?;

        match self.products.reserve(product_id, quantity).await? {
            Some(remaining) => {
                debug!(product_id = %product_id, quantity, remaining, "Stock reserved");
                Ok(remaining)
            }
            None => Err(self.classify_failure(product_id, quantity).await?),
        }
    }

    /// Transaction-scoped variant of [`reserve`](Self::reserve), used by
    /// strict-mode checkout. Skips nothing: the caller rolls back on error.
    pub async fn reserve_on(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<i64> {
        validation::validate_quantity(quantity)?;

        match ProductRepository::reserve_on(conn, product_id, quantity).await? {
            Some(remaining) => Ok(remaining),
            // Classify on the SAME connection: the caller holds a
            // transaction, and a pool lookup here could deadlock.
            None => match ProductRepository::get_by_id_on(conn, product_id).await? {
                Some(product) => Err(EngineError::Domain(CoreError::InsufficientStock {
                    product: product.name,
                    available: product.quantity_on_hand,
                    requested: quantity,
                })),
                None => Err(EngineError::Domain(CoreError::ProductNotFound(
                    product_id.to_string(),
                ))),
            },
        }
    }

    /// Restores `quantity` units, reversing an earlier reservation.
    ///
    /// A missing product is NOT an error here: voiding an old sale whose
    /// product has since left the catalog logs the skip and carries on.
    ///
    /// ## Returns
    /// * `true` - stock restored
    /// * `false` - product no longer exists, restore skipped
    pub async fn restore(&self, product_id: &str, quantity: i64) -> EngineResult<bool> {
        let restored = self.products.restore(product_id, quantity).await?;
        if restored {
            debug!(product_id = %product_id, quantity, "Stock restored");
        } else {
            warn!(product_id = %product_id, quantity, "Restore skipped: product no longer exists");
        }
        Ok(restored)
    }

    /// Turns a failed conditional update into the right domain error.
    async fn classify_failure(&self, product_id: &str, quantity: i64) -> EngineResult<EngineError> {
        match self.products.get_by_id(product_id).await? {
            Some(product) => Ok(EngineError::Domain(CoreError::InsufficientStock {
                product: product.name,
                available: product.quantity_on_hand,
                requested: quantity,
            })),
            None => Ok(EngineError::Domain(CoreError::ProductNotFound(
                product_id.to_string(),
            ))),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vela_core::Product;
    use vela_db::{Database, DbConfig};

    async fn setup(stock: i64) -> (Database, StockController) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: "p1".to_string(),
                name: "Widget".to_string(),
                buy_price_cents: 300,
                sell_price_cents: 500,
                quantity_bought: stock,
                quantity_on_hand: stock,
                total_sold: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        let controller = StockController::new(db.products());
        (db, controller)
    }

    #[tokio::test]
    async fn test_reserve_returns_remaining() {
        let (_db, stock) = setup(10).await;
        assert_eq!(stock.reserve("p1", 4).await.unwrap(), 6);
        assert_eq!(stock.reserve("p1", 6).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_reports_available() {
        let (_db, stock) = setup(3).await;

        let err = stock.reserve("p1", 5).await.unwrap_err();
        match err {
            EngineError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reserve_unknown_product() {
        let (_db, stock) = setup(3).await;

        let err = stock.reserve("ghost", 1).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reserve_rejects_zero_and_oversized_quantities() {
        let (_db, stock) = setup(10).await;

        assert!(stock.reserve("p1", 0).await.is_err());
        assert!(stock.reserve("p1", -2).await.is_err());
        assert!(stock
            .reserve("p1", vela_core::MAX_ITEM_QUANTITY + 1)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_restore_missing_product_is_not_an_error() {
        let (_db, stock) = setup(10).await;
        assert!(!stock.restore("ghost", 3).await.unwrap());
    }

    /// Two waves of concurrent reservations racing for 5 units: the
    /// conditional update guarantees no over-sell, whatever the interleaving.
    #[tokio::test]
    async fn test_concurrent_reservations_never_oversell() {
        let (db, stock) = setup(5).await;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let s = stock.clone();
            handles.push(tokio::spawn(async move { s.reserve("p1", 3).await }));
        }

        let mut successes = 0;
        let mut failures = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(EngineError::Domain(CoreError::InsufficientStock { .. })) => failures += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(failures, 1);

        let product = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.quantity_on_hand, 2);
        assert_eq!(product.total_sold, 3);
    }
}

//! # Low-Stock Alerting
//!
//! Decides when a product's stock level warrants a warning.
//!
//! ## Dedup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock after sale ≤ threshold (default 10)?                             │
//! │       │ no → nothing                                                    │
//! │       ▼ yes                                                             │
//! │  most recent warning tagged with this product_id                        │
//! │       │                                                                 │
//! │       ├── within the window (default 1h) → suppress                     │
//! │       └── none, or older                 → emit warning                 │
//! │                                                                         │
//! │  The lookup keys on the product_id COLUMN of the notification row.      │
//! │  Message text is presentation; it never participates in dedup, so       │
//! │  rewording a message cannot break suppression.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::EngineResult;
use vela_core::{Notification, NotificationKind, Product};
use vela_db::NotificationRepository;

/// Watches post-sale stock levels and produces deduplicated warnings.
#[derive(Debug, Clone)]
pub struct LowStockNotifier {
    notifications: NotificationRepository,
    threshold: i64,
    window_secs: i64,
}

impl LowStockNotifier {
    /// Creates a notifier with the given threshold and dedup window.
    pub fn new(notifications: NotificationRepository, threshold: i64, window_secs: i64) -> Self {
        LowStockNotifier {
            notifications,
            threshold,
            window_secs,
        }
    }

    /// Checks a product after its stock changed.
    ///
    /// ## Returns
    /// `Some(notification)` when a warning should be raised. The caller
    /// hands it to the dispatcher; this method persists nothing.
    pub async fn check(&self, product: &Product) -> EngineResult<Option<Notification>> {
        if product.quantity_on_hand > self.threshold {
            return Ok(None);
        }

        if let Some(last) = self
            .notifications
            .last_warning_for_product(&product.id)
            .await?
        {
            let age = Utc::now().signed_duration_since(last);
            if age < Duration::seconds(self.window_secs) {
                debug!(
                    product_id = %product.id,
                    age_secs = age.num_seconds(),
                    "Low-stock warning suppressed by dedup window"
                );
                return Ok(None);
            }
        }

        Ok(Some(Self::build_warning(product)))
    }

    fn build_warning(product: &Product) -> Notification {
        Notification {
            id: Uuid::new_v4().to_string(),
            kind: NotificationKind::Warning,
            title: "Low stock".to_string(),
            message: format!(
                "{} is running low: {} left in stock",
                product.name, product.quantity_on_hand
            ),
            product_id: Some(product.id.clone()),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vela_core::{LOW_STOCK_DEDUP_WINDOW_SECS, LOW_STOCK_THRESHOLD};
    use vela_db::{Database, DbConfig};

    fn product_with_stock(id: &str, on_hand: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            buy_price_cents: 300,
            sell_price_cents: 500,
            quantity_bought: 100,
            quantity_on_hand: on_hand,
            total_sold: 100 - on_hand,
            created_at: now,
            updated_at: now,
        }
    }

    async fn setup() -> (Database, LowStockNotifier) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let notifier = LowStockNotifier::new(
            db.notifications(),
            LOW_STOCK_THRESHOLD,
            LOW_STOCK_DEDUP_WINDOW_SECS,
        );
        (db, notifier)
    }

    #[tokio::test]
    async fn test_above_threshold_is_quiet() {
        let (_db, notifier) = setup().await;
        let product = product_with_stock("p1", 11);
        assert!(notifier.check(&product).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_at_threshold_warns() {
        let (_db, notifier) = setup().await;
        let product = product_with_stock("p1", 10);

        let warning = notifier.check(&product).await.unwrap().unwrap();
        assert_eq!(warning.kind, NotificationKind::Warning);
        assert_eq!(warning.product_id.as_deref(), Some("p1"));
        assert!(warning.message.contains("10 left"));
    }

    #[tokio::test]
    async fn test_recent_warning_suppresses_repeat() {
        let (db, notifier) = setup().await;
        let product = product_with_stock("p1", 5);

        let first = notifier.check(&product).await.unwrap().unwrap();
        db.notifications().insert(&first).await.unwrap();

        assert!(notifier.check(&product).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_warning_older_than_window_fires_again() {
        let (db, notifier) = setup().await;
        let product = product_with_stock("p1", 5);

        let mut stale = notifier.check(&product).await.unwrap().unwrap();
        stale.created_at = Utc::now() - Duration::seconds(LOW_STOCK_DEDUP_WINDOW_SECS + 60);
        db.notifications().insert(&stale).await.unwrap();

        assert!(notifier.check(&product).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dedup_is_per_product() {
        let (db, notifier) = setup().await;

        let p1 = product_with_stock("p1", 5);
        let warning = notifier.check(&p1).await.unwrap().unwrap();
        db.notifications().insert(&warning).await.unwrap();

        // A different product with the same stock level still warns.
        let p2 = product_with_stock("p2", 5);
        assert!(notifier.check(&p2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_message_text_does_not_affect_dedup() {
        let (db, notifier) = setup().await;
        let product = product_with_stock("p1", 5);

        // A recent warning with a completely unrelated message but the
        // same product_id tag still suppresses.
        let mut recent = notifier.check(&product).await.unwrap().unwrap();
        recent.message = "reworded alert body".to_string();
        db.notifications().insert(&recent).await.unwrap();

        assert!(notifier.check(&product).await.unwrap().is_none());
    }
}

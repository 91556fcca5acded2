//! # Notification Repository
//!
//! Persistence for the notification feed, including the structured
//! low-stock dedup lookup.
//!
//! ## Dedup Key
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "Has this product been warned about recently?"                         │
//! │                                                                         │
//! │  Answered by (kind, product_id, created_at) — a dedicated column,       │
//! │  never by searching for the product name inside message text.           │
//! │  Covered by idx_notifications_dedup.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use vela_core::{Notification, NotificationKind};

const NOTIFICATION_COLUMNS: &str =
    "id, kind, title, message, product_id, is_read, created_at";

/// Repository for notification records.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Inserts a notification record.
    pub async fn insert(&self, notification: &Notification) -> DbResult<()> {
        debug!(id = %notification.id, kind = ?notification.kind, "Inserting notification");

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, kind, title, message, product_id, is_read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&notification.id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.product_id)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns the timestamp of the most recent warning tagged with
    /// `product_id`, if any.
    pub async fn last_warning_for_product(
        &self,
        product_id: &str,
    ) -> DbResult<Option<DateTime<Utc>>> {
        let last: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT created_at FROM notifications
            WHERE kind = ?1 AND product_id = ?2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(NotificationKind::Warning)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(last)
    }

    /// Lists notifications, newest first.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Marks a notification as read.
    ///
    /// ## Returns
    /// * `Ok(true)` - Updated
    /// * `Ok(false)` - Notification not found
    pub async fn mark_read(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use uuid::Uuid;

    fn sample(kind: NotificationKind, product_id: Option<&str>) -> Notification {
        Notification {
            id: Uuid::new_v4().to_string(),
            kind,
            title: "Test".to_string(),
            message: "Test message".to_string(),
            product_id: product_id.map(String::from),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.notifications();

        let mut older = sample(NotificationKind::Info, None);
        older.created_at = Utc::now() - chrono::Duration::seconds(30);
        repo.insert(&older).await.unwrap();

        let newer = sample(NotificationKind::Success, None);
        repo.insert(&newer).await.unwrap();

        let list = repo.list(50).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_last_warning_matches_kind_and_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.notifications();

        // Warning for a different product and non-warning for ours: no match.
        repo.insert(&sample(NotificationKind::Warning, Some("other")))
            .await
            .unwrap();
        repo.insert(&sample(NotificationKind::Info, Some("p1")))
            .await
            .unwrap();
        assert!(repo.last_warning_for_product("p1").await.unwrap().is_none());

        let warning = sample(NotificationKind::Warning, Some("p1"));
        repo.insert(&warning).await.unwrap();

        let last = repo.last_warning_for_product("p1").await.unwrap().unwrap();
        assert_eq!(
            last.timestamp_millis(),
            warning.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_mark_read() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.notifications();

        let n = sample(NotificationKind::Error, None);
        repo.insert(&n).await.unwrap();

        assert!(repo.mark_read(&n.id).await.unwrap());
        let list = repo.list(10).await.unwrap();
        assert!(list[0].is_read);

        assert!(!repo.mark_read("ghost").await.unwrap());
    }
}

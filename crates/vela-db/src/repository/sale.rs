//! # Sale Repository
//!
//! Database operations for the sale ledger: sales and their line items.
//!
//! ## Data Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales (1) ──────< sale_items (N)                                       │
//! │                                                                         │
//! │  • sale_items.sale_id → sales.id  ON DELETE CASCADE                     │
//! │  • sale_items.product_id carries NO foreign key: line items snapshot    │
//! │    the product name and unit price at sale time, so deleting or         │
//! │    repricing a product never rewrites history                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vela_core::{LineItem, Sale};

const SALE_COLUMNS: &str = "id, subtotal_cents, discount_cents, tax_cents, grand_total_cents, \
     payment_method, amount_paid_cents, change_cents, status, \
     customer_name, customer_phone, notes, created_at";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, product_name, unit_price_cents, quantity, line_total_cents, created_at";

/// Aggregated totals over a time window, used by the stats endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodTotals {
    pub sale_count: i64,
    pub revenue_cents: i64,
}

/// Repository for sale ledger operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale with its line items in a single transaction.
    ///
    /// Either the sale and every line item land, or none do.
    pub async fn insert(&self, sale: &Sale, items: &[LineItem]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        Self::insert_on(&mut tx, sale, items).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Transaction-scoped variant of [`insert`](Self::insert).
    ///
    /// Strict-mode checkout writes the sale on the same connection that
    /// holds the stock reservations, so a rollback unwinds everything.
    pub async fn insert_on(
        conn: &mut SqliteConnection,
        sale: &Sale,
        items: &[LineItem],
    ) -> DbResult<()> {
        debug!(id = %sale.id, items = items.len(), "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, subtotal_cents, discount_cents, tax_cents, grand_total_cents,
                payment_method, amount_paid_cents, change_cents, status,
                customer_name, customer_phone, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.grand_total_cents)
        .bind(sale.payment_method)
        .bind(sale.amount_paid_cents)
        .bind(sale.change_cents)
        .bind(sale.status)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, product_name,
                    unit_price_cents, quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets the line items of a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Deletes a sale; line items cascade.
    ///
    /// ## Returns
    /// * `Ok(true)` - Sale deleted
    /// * `Ok(false)` - Sale not found
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all sales in the ledger.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Aggregates completed-sale count and revenue within `[since, until)`.
    pub async fn period_totals(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<PeriodTotals> {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(grand_total_cents), 0)
            FROM sales
            WHERE status = 'completed' AND created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(since)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(PeriodTotals {
            sale_count: row.0,
            revenue_cents: row.1,
        })
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
    use vela_core::{PaymentMethod, SaleStatus};

    fn sample_sale(id: &str, grand_total: i64) -> Sale {
        Sale {
            id: id.to_string(),
            subtotal_cents: grand_total,
            discount_cents: 0,
            tax_cents: 0,
            grand_total_cents: grand_total,
            payment_method: PaymentMethod::Cash,
            amount_paid_cents: grand_total,
            change_cents: 0,
            status: SaleStatus::Completed,
            customer_name: None,
            customer_phone: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn sample_item(sale_id: &str, quantity: i64) -> LineItem {
        LineItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            product_id: "p1".to_string(),
            product_name: "Widget".to_string(),
            unit_price_cents: 500,
            quantity,
            line_total_cents: 500 * quantity,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        let sale = sample_sale("s1", 2100);
        let items = vec![sample_item("s1", 2), sample_item("s1", 1)];
        repo.insert(&sale, &items).await.unwrap();

        let found = repo.get_by_id("s1").await.unwrap().unwrap();
        assert_eq!(found.grand_total_cents, 2100);
        assert_eq!(found.status, SaleStatus::Completed);

        let read_items = repo.get_items("s1").await.unwrap();
        assert_eq!(read_items.len(), 2);
        assert_eq!(read_items[0].quantity, 2);
        assert_eq!(read_items[1].quantity, 1);
    }

    #[tokio::test]
    async fn test_items_preserved_after_product_deleted_elsewhere() {
        // Line items snapshot product data; they reference no products row.
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        let sale = sample_sale("s1", 500);
        repo.insert(&sale, &[sample_item("s1", 1)]).await.unwrap();

        let items = repo.get_items("s1").await.unwrap();
        assert_eq!(items[0].product_name, "Widget");
        assert_eq!(items[0].unit_price_cents, 500);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        repo.insert(&sample_sale("s1", 500), &[sample_item("s1", 1)])
            .await
            .unwrap();

        assert!(repo.delete("s1").await.unwrap());
        assert!(repo.get_by_id("s1").await.unwrap().is_none());
        assert!(repo.get_items("s1").await.unwrap().is_empty());

        assert!(!repo.delete("s1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        let mut older = sample_sale("older", 100);
        older.created_at = Utc::now() - chrono::Duration::seconds(60);
        repo.insert(&older, &[]).await.unwrap();
        repo.insert(&sample_sale("newer", 200), &[]).await.unwrap();

        let sales = repo.list(50, 0).await.unwrap();
        assert_eq!(sales[0].id, "newer");
        assert_eq!(sales[1].id, "older");
    }

    #[tokio::test]
    async fn test_period_totals_excludes_other_statuses_and_windows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        repo.insert(&sample_sale("s1", 1000), &[]).await.unwrap();
        repo.insert(&sample_sale("s2", 500), &[]).await.unwrap();

        let mut refunded = sample_sale("s3", 9999);
        refunded.status = SaleStatus::Refunded;
        repo.insert(&refunded, &[]).await.unwrap();

        let mut ancient = sample_sale("s4", 7777);
        ancient.created_at = Utc::now() - chrono::Duration::days(400);
        repo.insert(&ancient, &[]).await.unwrap();

        let since = Utc::now() - chrono::Duration::hours(1);
        let until = Utc::now() + chrono::Duration::hours(1);
        let totals = repo.period_totals(since, until).await.unwrap();

        assert_eq!(totals.sale_count, 2);
        assert_eq!(totals.revenue_cents, 1500);
    }
}

//! # Product Repository
//!
//! Database operations for products, including the atomic stock mutation
//! every sale flows through.
//!
//! ## Stock Update Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Conditional Decrement                                │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write (racy, can over-sell)                        │
//! │     SELECT quantity_on_hand ...                                         │
//! │     UPDATE products SET quantity_on_hand = 7 WHERE id = ?               │
//! │                                                                         │
//! │  ✅ CORRECT: single conditional statement                               │
//! │     UPDATE products                                                     │
//! │     SET quantity_on_hand = quantity_on_hand - ?                         │
//! │     WHERE id = ? AND quantity_on_hand >= ?                              │
//! │                                                                         │
//! │  Two concurrent sales racing for the last units: the database           │
//! │  serializes the writes and exactly one statement matches the            │
//! │  WHERE clause. The loser gets zero rows and reports                     │
//! │  insufficient stock.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vela_core::Product;

const PRODUCT_COLUMNS: &str = "id, name, buy_price_cents, sell_price_cents, \
     quantity_bought, quantity_on_hand, total_sold, created_at, updated_at";

/// Repository for product database operations.
///
/// This is the sole writer of `quantity_on_hand` / `total_sold`.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Transaction-scoped variant of [`get_by_id`](Self::get_by_id).
    pub async fn get_by_id_on(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Lists all products, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, buy_price_cents, sell_price_cents,
                quantity_bought, quantity_on_hand, total_sold,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.buy_price_cents)
        .bind(product.sell_price_cents)
        .bind(product.quantity_bought)
        .bind(product.quantity_on_hand)
        .bind(product.total_sold)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Atomically reserves stock: decrements `quantity_on_hand` and
    /// increments `total_sold`, but only when enough stock is on hand.
    ///
    /// ## Returns
    /// * `Ok(Some(remaining))` - Reserved; `remaining` is the post-decrement
    ///   stock level
    /// * `Ok(None)` - Condition failed: the product is missing OR its stock
    ///   is below `quantity`. The caller classifies which (this method stays
    ///   a single statement so the check and the decrement cannot be split).
    pub async fn reserve(&self, id: &str, quantity: i64) -> DbResult<Option<i64>> {
        debug!(id = %id, quantity = %quantity, "Reserving stock");

        let mut conn = self.pool.acquire().await?;
        Self::reserve_on(&mut conn, id, quantity).await
    }

    /// Transaction-scoped variant of [`reserve`](Self::reserve).
    ///
    /// Strict-mode checkout runs every line item's reservation on one
    /// connection inside a transaction so a later failure unwinds them all.
    pub async fn reserve_on(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<Option<i64>> {
        let now = Utc::now();

        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET quantity_on_hand = quantity_on_hand - ?2,
                total_sold = total_sold + ?2,
                updated_at = ?3
            WHERE id = ?1 AND quantity_on_hand >= ?2
            RETURNING quantity_on_hand
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(remaining)
    }

    /// Restores previously reserved stock: increments `quantity_on_hand`
    /// and decrements `total_sold`, floored at zero.
    ///
    /// Used only by the reversal path.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock restored
    /// * `Ok(false)` - Product not found (caller logs and skips)
    pub async fn restore(&self, id: &str, quantity: i64) -> DbResult<bool> {
        debug!(id = %id, quantity = %quantity, "Restoring stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_on_hand = quantity_on_hand + ?2,
                total_sold = MAX(total_sold - ?2, 0),
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Receives stock into the catalog: bumps `quantity_bought` and
    /// `quantity_on_hand` together so the conservation invariant holds.
    pub async fn receive_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Receiving stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_bought = quantity_bought + ?2,
                quantity_on_hand = quantity_on_hand + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_product(id: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            buy_price_cents: 300,
            sell_price_cents: 500,
            quantity_bought: stock,
            quantity_on_hand: stock,
            total_sold: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("p1", 10)).await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.quantity_on_hand, 10);
        assert_eq!(found.sell_price_cents, 500);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reserve_decrements_and_tracks_sold() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&sample_product("p1", 10)).await.unwrap();

        let remaining = repo.reserve("p1", 4).await.unwrap();
        assert_eq!(remaining, Some(6));

        let product = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.quantity_on_hand, 6);
        assert_eq!(product.total_sold, 4);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_stock_leaves_row_untouched() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&sample_product("p1", 3)).await.unwrap();

        let remaining = repo.reserve("p1", 5).await.unwrap();
        assert_eq!(remaining, None);

        let product = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.quantity_on_hand, 3);
        assert_eq!(product.total_sold, 0);
    }

    #[tokio::test]
    async fn test_reserve_missing_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        assert_eq!(repo.reserve("ghost", 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_reverses_reserve_exactly() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&sample_product("p1", 10)).await.unwrap();

        repo.reserve("p1", 7).await.unwrap();
        assert!(repo.restore("p1", 7).await.unwrap());

        let product = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.quantity_on_hand, 10);
        assert_eq!(product.total_sold, 0);
    }

    #[tokio::test]
    async fn test_restore_floors_total_sold_at_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&sample_product("p1", 10)).await.unwrap();

        // Restore more than was ever sold
        assert!(repo.restore("p1", 5).await.unwrap());

        let product = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.quantity_on_hand, 15);
        assert_eq!(product.total_sold, 0);
    }

    #[tokio::test]
    async fn test_restore_missing_product_returns_false() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        assert!(!repo.restore("ghost", 5).await.unwrap());
    }

    #[tokio::test]
    async fn test_receive_stock_keeps_invariant() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&sample_product("p1", 10)).await.unwrap();

        repo.receive_stock("p1", 5).await.unwrap();

        let product = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.quantity_bought, 15);
        assert_eq!(product.quantity_on_hand, 15);
    }
}

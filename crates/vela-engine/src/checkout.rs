//! # Sale Transaction Coordinator
//!
//! The checkout flow: reserve stock, recompute money, persist the sale,
//! raise notifications.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(request)                                                   │
//! │       │                                                                 │
//! │       ├── 1. Validate input shape (counts, quantities, amounts)         │
//! │       ├── 2. Snapshot products (name & price frozen at sale time)       │
//! │       ├── 3. Reserve stock per line item                                │
//! │       │        Legacy: skip failures, warn, keep going                  │
//! │       │        Strict: one failure rolls back the whole sale            │
//! │       ├── 4. Recompute totals from what was ACTUALLY reserved           │
//! │       │        (client-submitted totals are never trusted)              │
//! │       ├── 5. Persist sale + line items atomically                       │
//! │       └── 6. Notify: success record, low-stock warnings                 │
//! │                                                                         │
//! │  A failure at step 4 or 5 restores every reservation made at step 3.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Void Flow
//! Look up the sale, restore each line item's stock (skipping products
//! that have left the catalog, with a warning), delete the row. Line
//! items cascade.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::alerts::LowStockNotifier;
use crate::config::{EngineConfig, ReservationMode};
use crate::dispatch::NotificationDispatcher;
use crate::error::{EngineError, EngineResult};
use crate::stock::StockController;
use vela_core::{
    validation, CoreError, LineItem, Money, Notification, NotificationKind, PaymentMethod,
    Product, Sale, SaleStatus, SaleSummary,
};
use vela_db::Database;

// =============================================================================
// Request / Response Types
// =============================================================================

/// One requested line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// A checkout request.
///
/// Note what is ABSENT: no subtotal, tax or total fields. Those are
/// always recomputed here from the reserved items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub items: Vec<SaleItemRequest>,
    #[serde(default)]
    pub discount_cents: i64,
    pub payment_method: PaymentMethod,
    pub amount_paid_cents: i64,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A line item that legacy-mode checkout could not fulfill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedItem {
    pub product_id: String,
    pub reason: String,
}

/// The outcome of a completed checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale: Sale,
    #[serde(rename = "lineItems")]
    pub items: Vec<LineItem>,
    /// Items skipped by legacy-mode partial fulfillment. Always empty
    /// in strict mode.
    pub skipped: Vec<SkippedItem>,
    /// Low-stock warnings this sale triggered, already persisted and
    /// queued for delivery. The caller sees them without polling the
    /// notification feed.
    #[serde(rename = "lowStockNotifications")]
    pub low_stock: Vec<Notification>,
}

// A successful reservation waiting to be persisted (or unwound).
struct ReservedLine {
    item: LineItem,
    // Product snapshot with quantity_on_hand set to the POST-reservation
    // level, for the low-stock check.
    product_after: Product,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Orchestrates the full lifecycle of a sale.
#[derive(Clone)]
pub struct SaleCoordinator {
    db: Database,
    stock: StockController,
    alerts: LowStockNotifier,
    dispatcher: NotificationDispatcher,
    config: EngineConfig,
}

impl SaleCoordinator {
    pub fn new(
        db: Database,
        stock: StockController,
        alerts: LowStockNotifier,
        dispatcher: NotificationDispatcher,
        config: EngineConfig,
    ) -> Self {
        SaleCoordinator {
            db,
            stock,
            alerts,
            dispatcher,
            config,
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a sale: reserves stock, recomputes totals, persists, notifies.
    pub async fn create_sale(&self, request: CreateSaleRequest) -> EngineResult<SaleReceipt> {
        self.validate_request(&request)?;

        let (mut receipt, touched) = match self.config.reservation_mode {
            ReservationMode::Legacy => self.create_sale_legacy(&request).await?,
            ReservationMode::Strict => self.create_sale_strict(&request).await?,
        };

        info!(
            sale_id = %receipt.sale.id,
            items = receipt.items.len(),
            skipped = receipt.skipped.len(),
            grand_total_cents = receipt.sale.grand_total_cents,
            "Sale completed"
        );

        receipt.low_stock = self.notify_after_sale(&receipt, &touched).await;
        Ok(receipt)
    }

    fn validate_request(&self, request: &CreateSaleRequest) -> EngineResult<()> {
        validation::validate_line_item_count(request.items.len())?;
        for item in &request.items {
            validation::validate_quantity(item.quantity)?;
        }
        validation::validate_non_negative_cents("discount", request.discount_cents)?;
        validation::validate_amount_paid(request.amount_paid_cents)?;
        validation::validate_customer_field("customerName", request.customer_name.as_deref())?;
        validation::validate_customer_field("customerPhone", request.customer_phone.as_deref())?;
        Ok(())
    }

    /// Legacy mode: partial fulfillment. Unreservable items are skipped
    /// with a warning; the sale goes through with the rest. Only a sale
    /// where NOTHING could be reserved is rejected.
    async fn create_sale_legacy(
        &self,
        request: &CreateSaleRequest,
    ) -> EngineResult<(SaleReceipt, Vec<Product>)> {
        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut reserved: Vec<ReservedLine> = Vec::new();
        let mut skipped: Vec<SkippedItem> = Vec::new();
        let mut first_failure: Option<EngineError> = None;

        for item in &request.items {
            let snapshot = match self.db.products().get_by_id(&item.product_id).await? {
                Some(product) => product,
                None => {
                    warn!(product_id = %item.product_id, "Skipping line item: product not found");
                    skipped.push(SkippedItem {
                        product_id: item.product_id.clone(),
                        reason: "product not found".to_string(),
                    });
                    first_failure.get_or_insert(EngineError::Domain(CoreError::ProductNotFound(
                        item.product_id.clone(),
                    )));
                    continue;
                }
            };

            match self.stock.reserve(&item.product_id, item.quantity).await {
                Ok(remaining) => {
                    reserved.push(Self::reserved_line(
                        &sale_id, &snapshot, item.quantity, remaining, now,
                    ));
                }
                Err(err @ EngineError::Domain(_)) => {
                    warn!(
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        error = %err,
                        "Skipping line item: reservation failed"
                    );
                    skipped.push(SkippedItem {
                        product_id: item.product_id.clone(),
                        reason: err.to_string(),
                    });
                    first_failure.get_or_insert(err);
                }
                // Storage failures abort outright.
                Err(err) => {
                    self.unwind(&reserved).await;
                    return Err(err);
                }
            }
        }

        if reserved.is_empty() {
            // Nothing could be fulfilled. Surface the first failure.
            return Err(first_failure.unwrap_or_else(|| {
                EngineError::Domain(CoreError::InvalidPaymentAmount {
                    reason: "no line items could be fulfilled".to_string(),
                })
            }));
        }

        let (sale, items) = match self.assemble_sale(sale_id, request, &reserved, now) {
            Ok(parts) => parts,
            Err(err) => {
                self.unwind(&reserved).await;
                return Err(err);
            }
        };

        if let Err(err) = self.db.sales().insert(&sale, &items).await {
            self.unwind(&reserved).await;
            return Err(err.into());
        }

        let touched = reserved.into_iter().map(|r| r.product_after).collect();
        Ok((
            SaleReceipt {
                sale,
                items,
                skipped,
                low_stock: Vec::new(),
            },
            touched,
        ))
    }

    /// Strict mode: all or nothing. Reservations and the sale insert run
    /// in one transaction; any failure rolls everything back.
    async fn create_sale_strict(
        &self,
        request: &CreateSaleRequest,
    ) -> EngineResult<(SaleReceipt, Vec<Product>)> {
        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        // Dropping the transaction on any early return rolls back every
        // reservation made so far.
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(vela_db::DbError::from)?;

        let mut reserved: Vec<ReservedLine> = Vec::new();
        for item in &request.items {
            let snapshot =
                match vela_db::ProductRepository::get_by_id_on(&mut tx, &item.product_id).await? {
                    Some(product) => product,
                    None => {
                        return Err(EngineError::Domain(CoreError::ProductNotFound(
                            item.product_id.clone(),
                        )));
                    }
                };

            let remaining = self
                .stock
                .reserve_on(&mut tx, &item.product_id, item.quantity)
                .await?;
            reserved.push(Self::reserved_line(
                &sale_id, &snapshot, item.quantity, remaining, now,
            ));
        }

        let (sale, items) = self.assemble_sale(sale_id, request, &reserved, now)?;

        vela_db::SaleRepository::insert_on(&mut tx, &sale, &items).await?;
        tx.commit().await.map_err(vela_db::DbError::from)?;

        let touched = reserved.into_iter().map(|r| r.product_after).collect();
        Ok((
            SaleReceipt {
                sale,
                items,
                skipped: Vec::new(),
                low_stock: Vec::new(),
            },
            touched,
        ))
    }

    fn reserved_line(
        sale_id: &str,
        snapshot: &Product,
        quantity: i64,
        remaining: i64,
        now: chrono::DateTime<Utc>,
    ) -> ReservedLine {
        let mut product_after = snapshot.clone();
        product_after.quantity_on_hand = remaining;
        product_after.total_sold += quantity;

        ReservedLine {
            item: LineItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.to_string(),
                product_id: snapshot.id.clone(),
                product_name: snapshot.name.clone(),
                unit_price_cents: snapshot.sell_price_cents,
                quantity,
                line_total_cents: snapshot.sell_price_cents * quantity,
                created_at: now,
            },
            product_after,
        }
    }

    /// Recomputes the money fields from the reserved lines and builds the
    /// persistable sale.
    fn assemble_sale(
        &self,
        sale_id: String,
        request: &CreateSaleRequest,
        reserved: &[ReservedLine],
        now: chrono::DateTime<Utc>,
    ) -> EngineResult<(Sale, Vec<LineItem>)> {
        let line_totals: Vec<Money> = reserved.iter().map(|r| r.item.line_total()).collect();
        let summary = SaleSummary::compute(
            &line_totals,
            Money::from_cents(request.discount_cents),
            Money::from_cents(request.amount_paid_cents),
            self.config.tax_rate(),
        )?;

        let sale = Sale {
            id: sale_id,
            customer_name: request.customer_name.clone(),
            customer_phone: request.customer_phone.clone(),
            notes: request.notes.clone(),
            subtotal_cents: summary.subtotal_cents,
            discount_cents: summary.discount_cents,
            tax_cents: summary.tax_cents,
            grand_total_cents: summary.grand_total_cents,
            payment_method: request.payment_method,
            amount_paid_cents: summary.amount_paid_cents,
            change_cents: summary.change_cents,
            status: SaleStatus::Completed,
            created_at: now,
        };

        let items = reserved.iter().map(|r| r.item.clone()).collect();
        Ok((sale, items))
    }

    /// Restores every reservation in `reserved`. Failures are logged and
    /// skipped; unwinding must not mask the original error.
    async fn unwind(&self, reserved: &[ReservedLine]) {
        for line in reserved {
            if let Err(err) = self
                .stock
                .restore(&line.item.product_id, line.item.quantity)
                .await
            {
                warn!(
                    product_id = %line.item.product_id,
                    error = %err,
                    "Failed to restore reservation during unwind"
                );
            }
        }
    }

    /// Post-commit notifications: a success record plus low-stock warnings
    /// for any product the sale pushed to the threshold. All best-effort:
    /// the sale already committed, so failures here only log.
    ///
    /// Returns the low-stock warnings that fired, for the receipt.
    async fn notify_after_sale(
        &self,
        receipt: &SaleReceipt,
        touched: &[Product],
    ) -> Vec<Notification> {
        let success = Notification {
            id: Uuid::new_v4().to_string(),
            kind: NotificationKind::Success,
            title: "Sale completed".to_string(),
            message: format!(
                "Sale of {} item(s) for {}",
                receipt.items.len(),
                Money::from_cents(receipt.sale.grand_total_cents)
            ),
            product_id: None,
            is_read: false,
            created_at: Utc::now(),
        };
        if let Err(err) = self.dispatcher.dispatch(success).await {
            warn!(error = %err, "Failed to record sale notification");
        }

        // `touched` carries the post-reservation stock levels captured when
        // each reservation succeeded; no re-read needed.
        let mut fired = Vec::new();
        for product in touched {
            match self.alerts.check(product).await {
                Ok(Some(warning)) => {
                    match self.dispatcher.dispatch(warning.clone()).await {
                        Ok(()) => fired.push(warning),
                        Err(err) => warn!(
                            product_id = %product.id,
                            error = %err,
                            "Failed to record low-stock warning"
                        ),
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        product_id = %product.id,
                        error = %err,
                        "Low-stock check failed"
                    );
                }
            }
        }
        fired
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Fetches a sale with its line items.
    pub async fn get_sale(&self, id: &str) -> EngineResult<SaleReceipt> {
        let sale = self
            .db
            .sales()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let items = self.db.sales().get_items(id).await?;

        Ok(SaleReceipt {
            sale,
            items,
            skipped: Vec::new(),
            low_stock: Vec::new(),
        })
    }

    /// Lists sales, newest first.
    pub async fn list_sales(&self, limit: i64, offset: i64) -> EngineResult<Vec<Sale>> {
        Ok(self.db.sales().list(limit, offset).await?)
    }

    // =========================================================================
    // Void
    // =========================================================================

    /// Voids a sale: restores stock for each line item, then deletes the
    /// sale (line items cascade).
    ///
    /// Products that have left the catalog since the sale are skipped
    /// with a warning; the void still completes.
    pub async fn void_sale(&self, id: &str) -> EngineResult<Sale> {
        let sale = self
            .db
            .sales()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let items = self.db.sales().get_items(id).await?;

        for item in &items {
            // restore() already warns on a missing product.
            self.stock.restore(&item.product_id, item.quantity).await?;
        }

        self.db.sales().delete(id).await?;

        info!(sale_id = %id, items = items.len(), "Sale voided");

        let notice = Notification {
            id: Uuid::new_v4().to_string(),
            kind: NotificationKind::Info,
            title: "Sale voided".to_string(),
            message: format!(
                "Sale {} voided; stock restored for {} item(s)",
                sale.id,
                items.len()
            ),
            product_id: None,
            is_read: false,
            created_at: Utc::now(),
        };
        if let Err(err) = self.dispatcher.dispatch(notice).await {
            warn!(error = %err, "Failed to record void notification");
        }

        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

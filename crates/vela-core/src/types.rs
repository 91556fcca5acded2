//! # Domain Types
//!
//! Core domain types used throughout Vela POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  Notification   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  customer info  │   │  kind           │       │
//! │  │  sell_price     │   │  summary fields │   │  title/message  │       │
//! │  │  quantity_on_   │   │  status         │   │  product_id     │       │
//! │  │    hand         │   │  line items ──┐ │   │  is_read        │       │
//! │  └─────────────────┘   └───────────────│─┘   └─────────────────┘       │
//! │                                        │                               │
//! │                        ┌───────────────▼─┐                             │
//! │                        │    LineItem     │                             │
//! │                        │  ─────────────  │                             │
//! │                        │  product_id     │                             │
//! │                        │  name snapshot  │                             │
//! │                        │  price snapshot │                             │
//! │                        │  quantity       │                             │
//! │                        └─────────────────┘                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Line items freeze the product name and unit price at the moment of sale.
//! The sale history stays correct even if the catalog changes or a product
//! is later deleted; reversal only needs the product id and quantity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5% (the fixed sale tax rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product with live stock counters.
///
/// ## Stock Invariant
/// `quantity_on_hand` never goes negative: the storage layer only mutates
/// it through a conditional update, and `quantity_on_hand` always equals
/// `quantity_bought` minus the quantities in non-reversed sale line items
/// (minus out-of-band catalog adjustments).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on receipts and in alerts.
    pub name: String,

    /// Unit cost in cents (what the store paid).
    pub buy_price_cents: i64,

    /// Unit price in cents (what the customer pays).
    pub sell_price_cents: i64,

    /// Cumulative lifetime stock received.
    pub quantity_bought: i64,

    /// Current available units. Never negative.
    pub quantity_on_hand: i64,

    /// Cumulative units sold. Decremented (floored at 0) on reversal.
    pub total_sold: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }

    /// Checks whether `quantity` units could be sold right now.
    ///
    /// Advisory only: the authoritative check is the conditional update in
    /// the storage layer, which is atomic with the decrement.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity_on_hand >= quantity
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid and stock reserved.
    Completed,
    /// Sale was cancelled before completion.
    Cancelled,
    /// Sale was completed, then refunded.
    Refunded,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Mobile wallet / QR payment.
    Mobile,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale transaction.
///
/// The summary fields are flattened onto the row and are ALWAYS the
/// server-side recomputation; client-submitted totals never reach here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Customer name, free text. Optional.
    pub customer_name: Option<String>,
    /// Customer phone. Optional.
    pub customer_phone: Option<String>,
    /// Free-text notes. Optional.
    pub notes: Option<String>,
    /// Sum of line totals, in cents.
    pub subtotal_cents: i64,
    /// Discount applied before tax, in cents. Never negative.
    pub discount_cents: i64,
    /// Tax on (subtotal - discount), in cents.
    pub tax_cents: i64,
    /// subtotal - discount + tax, in cents.
    pub grand_total_cents: i64,
    pub payment_method: PaymentMethod,
    /// What the customer handed over. At least the grand total.
    pub amount_paid_cents: i64,
    /// amount_paid - grand_total. Never negative.
    pub change_cents: i64,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Line Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold. Always positive.
    pub quantity: i64,
    /// unit_price_cents × quantity.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Sale Summary
// =============================================================================

/// Server-side recomputation of a sale's money fields.
///
/// ## The Consistency Contract
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  subtotal    = Σ line_total                                             │
/// │  tax         = rate × (subtotal - discount)                             │
/// │  grand_total = subtotal - discount + tax                                │
/// │  change      = amount_paid - grand_total      (amount_paid ≥ total)     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// The caller's submitted totals are ignored; only the discount, payment
/// method and amount paid are taken from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
    pub amount_paid_cents: i64,
    pub change_cents: i64,
}

impl SaleSummary {
    /// Recomputes the summary from the line items actually reserved.
    ///
    /// ## Errors
    /// - `InvalidPaymentAmount` when discount is negative or the amount
    ///   paid does not cover the grand total.
    pub fn compute(
        line_totals: &[Money],
        discount: Money,
        amount_paid: Money,
        tax_rate: TaxRate,
    ) -> Result<SaleSummary, CoreError> {
        if discount.is_negative() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "discount cannot be negative".to_string(),
            });
        }

        let subtotal = line_totals
            .iter()
            .fold(Money::zero(), |acc, line| acc + *line);
        let taxable = subtotal - discount;
        let tax = taxable.calculate_tax(tax_rate);
        let grand_total = taxable + tax;

        if amount_paid < grand_total {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "amount paid {} is less than grand total {}",
                    amount_paid, grand_total
                ),
            });
        }

        Ok(SaleSummary {
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            tax_cents: tax.cents(),
            grand_total_cents: grand_total.cents(),
            amount_paid_cents: amount_paid.cents(),
            change_cents: amount_paid.saturating_sub_zero(grand_total).cents(),
        })
    }
}

// =============================================================================
// Notification
// =============================================================================

/// Notification severity / category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    Info,
}

/// A persisted notification record.
///
/// Nothing references notifications (no foreign keys point here): they are
/// created by the low-stock notifier and sale lifecycle events, toggled
/// read/unread by the UI, and deleted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Structured dedup key: the product a `warning` alert refers to.
    /// Dedup is (product_id, kind, created_at window) - never a substring
    /// match on message text.
    pub product_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SALE_TAX_RATE_BPS;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(500);
        assert_eq!(rate.bps(), 500);
        assert!((rate.percentage() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_summary_contract_values() {
        // subtotal 100.00, discount 10.00, 5% tax → tax 4.50, total 94.50
        let summary = SaleSummary::compute(
            &[Money::from_cents(10000)],
            Money::from_cents(1000),
            Money::from_cents(9450),
            TaxRate::from_bps(SALE_TAX_RATE_BPS),
        )
        .unwrap();

        assert_eq!(summary.subtotal_cents, 10000);
        assert_eq!(summary.tax_cents, 450);
        assert_eq!(summary.grand_total_cents, 9450);
        assert_eq!(summary.change_cents, 0);
    }

    #[test]
    fn test_summary_two_item_scenario() {
        // 2 × $5.00 + 1 × $10.00, no discount → subtotal $20.00,
        // tax $1.00, grand total $21.00, exact payment → no change
        let lines = [
            Money::from_cents(500).multiply_quantity(2),
            Money::from_cents(1000),
        ];
        let summary = SaleSummary::compute(
            &lines,
            Money::zero(),
            Money::from_cents(2100),
            TaxRate::from_bps(SALE_TAX_RATE_BPS),
        )
        .unwrap();

        assert_eq!(summary.subtotal_cents, 2000);
        assert_eq!(summary.tax_cents, 100);
        assert_eq!(summary.grand_total_cents, 2100);
        assert_eq!(summary.change_cents, 0);
    }

    #[test]
    fn test_summary_rejects_underpayment() {
        let result = SaleSummary::compute(
            &[Money::from_cents(2000)],
            Money::zero(),
            Money::from_cents(2000), // grand total is 2100 with tax
            TaxRate::from_bps(SALE_TAX_RATE_BPS),
        );
        assert!(matches!(
            result,
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn test_summary_rejects_negative_discount() {
        let result = SaleSummary::compute(
            &[Money::from_cents(2000)],
            Money::from_cents(-100),
            Money::from_cents(5000),
            TaxRate::from_bps(SALE_TAX_RATE_BPS),
        );
        assert!(matches!(
            result,
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn test_product_can_sell() {
        let product = Product {
            id: "p1".to_string(),
            name: "Widget".to_string(),
            buy_price_cents: 300,
            sell_price_cents: 500,
            quantity_bought: 20,
            quantity_on_hand: 5,
            total_sold: 15,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(product.can_sell(5));
        assert!(!product.can_sell(6));
    }
}

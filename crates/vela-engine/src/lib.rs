//! # vela-engine: Sale Transaction & Inventory Consistency Engine
//!
//! Everything between the REST boundary and the repositories: checkout,
//! stock reservation, low-stock alerting, notification fan-out and
//! ledger statistics.
//!
//! ## Component Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         vela-engine                                     │
//! │                                                                         │
//! │   ┌──────────────────┐        ┌──────────────────┐                      │
//! │   │ SaleCoordinator  │───────►│ StockController  │── conditional        │
//! │   │   (checkout.rs)  │        │    (stock.rs)    │   UPDATE (vela-db)   │
//! │   └────────┬─────────┘        └──────────────────┘                      │
//! │            │                                                            │
//! │            │                  ┌──────────────────┐                      │
//! │            ├─────────────────►│ LowStockNotifier │── dedup by           │
//! │            │                  │   (alerts.rs)    │   product_id column  │
//! │            │                  └────────┬─────────┘                      │
//! │            │                           │                                │
//! │            ▼                           ▼                                │
//! │   ┌─────────────────────────────────────────────┐                       │
//! │   │        NotificationDispatcher               │                       │
//! │   │            (dispatch.rs)                    │                       │
//! │   │  persist sync ──► queue ──► email / SMS     │                       │
//! │   └─────────────────────────────────────────────┘                       │
//! │                                                                         │
//! │   ┌──────────────────┐                                                  │
//! │   │   StatsService   │── today / MTD / YTD aggregates                   │
//! │   │    (stats.rs)    │                                                  │
//! │   └──────────────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod checkout;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod stats;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use alerts::LowStockNotifier;
pub use checkout::{CreateSaleRequest, SaleCoordinator, SaleItemRequest, SaleReceipt, SkippedItem};
pub use config::{EmailConfig, EngineConfig, ReservationMode, SmsConfig};
pub use dispatch::{
    EmailTransport, HttpEmailTransport, HttpSmsTransport, NotificationDispatcher, SmsTransport,
};
pub use error::{EngineError, EngineResult};
pub use stats::{PeriodStats, SalesStats, StatsService};
pub use stock::StockController;

use std::sync::Arc;

use vela_db::Database;

/// Wires the full engine from a database handle and configuration.
///
/// The server binary calls this once at startup; tests usually build
/// components individually instead.
pub fn build(db: Database, config: EngineConfig) -> (SaleCoordinator, StatsService) {
    let email: Option<Arc<dyn EmailTransport>> = config
        .email
        .clone()
        .map(|c| Arc::new(HttpEmailTransport::new(c)) as Arc<dyn EmailTransport>);
    let sms: Option<Arc<dyn SmsTransport>> = config
        .sms
        .clone()
        .map(|c| Arc::new(HttpSmsTransport::new(c)) as Arc<dyn SmsTransport>);

    let stock = StockController::new(db.products());
    let alerts = LowStockNotifier::new(
        db.notifications(),
        config.low_stock_threshold,
        config.dedup_window_secs,
    );
    let dispatcher =
        NotificationDispatcher::new(db.notifications(), email, sms, config.queue_capacity);
    let stats = StatsService::new(db.sales());
    let coordinator = SaleCoordinator::new(db, stock, alerts, dispatcher, config);

    (coordinator, stats)
}

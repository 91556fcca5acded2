//! # Repository Layer
//!
//! Data access grouped by aggregate. Each repository owns the SQL for
//! its tables and hands typed rows back to the engine layer.

pub mod notification;
pub mod product;
pub mod sale;

pub use notification::NotificationRepository;
pub use product::ProductRepository;
pub use sale::{PeriodTotals, SaleRepository};

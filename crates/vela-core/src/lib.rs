//! # vela-core: Pure Business Logic for Vela POS
//!
//! This crate is the **heart** of the sale & inventory engine. It contains
//! all business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vela POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  │    POST /sales ──► GET /sales ──► DELETE /sales/:id             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vela-engine                                  │   │
//! │  │    checkout, stock control, low-stock alerts, dispatch          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vela-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │   money   │  │  summary  │  │ validation│   │   │
//! │  │   │  Product  │  │   Money   │  │  recompute│  │   rules   │   │   │
//! │  │   │   Sale    │  │  TaxRate  │  │  tax math │  │   checks  │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vela-db (Storage Layer)                      │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, LineItem, Notification, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vela_core::Money` instead of
// `use vela_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Contract Constants
// =============================================================================
// Fixed by the external contract. Changing any of these changes observable
// behavior for every consumer, so they live here rather than in config
// defaults scattered across crates (config may still override the first two
// per deployment; the tax rate and SMS cap are hard contract values).

/// Stock level at or below which a low-stock warning fires.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Seconds a low-stock warning for a product suppresses further warnings
/// for that same product.
pub const LOW_STOCK_DEDUP_WINDOW_SECS: i64 = 3600;

/// Sales tax applied to (subtotal - discount), in basis points.
/// 500 bps = 5%.
pub const SALE_TAX_RATE_BPS: u32 = 500;

/// Maximum SMS body length; longer notification text is truncated.
pub const SMS_BODY_MAX_CHARS: usize = 160;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum line items in a single sale.
///
/// ## Business Reason
/// Prevents runaway requests and keeps transaction sizes reasonable.
pub const MAX_SALE_ITEMS: usize = 100;

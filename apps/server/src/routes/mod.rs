//! # HTTP Routes
//!
//! ```text
//! POST   /sales              create a sale
//! GET    /sales              list sales (newest first)
//! GET    /sales/stats        today / MTD / YTD aggregates
//! GET    /sales/:id          fetch one sale with line items
//! DELETE /sales/:id          void a sale (restores stock)
//! GET    /notifications      recent notification feed
//! GET    /health             liveness + database reachability
//! ```

pub mod health;
pub mod notifications;
pub mod sales;

use axum::Router;

use crate::state::SharedState;

/// Builds the full application router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .merge(sales::router())
        .merge(notifications::router())
        .merge(health::router())
        .with_state(state)
}

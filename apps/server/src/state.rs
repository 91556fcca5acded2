//! Shared application state threaded through the axum handlers.

use std::sync::Arc;

use vela_db::Database;
use vela_engine::{SaleCoordinator, StatsService};

/// Everything a handler needs.
pub struct AppState {
    pub db: Database,
    pub coordinator: SaleCoordinator,
    pub stats: StatsService,
}

pub type SharedState = Arc<AppState>;

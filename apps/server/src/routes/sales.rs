//! Sale endpoints: create, list, fetch, void, stats.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use vela_core::Sale;
use vela_engine::{CreateSaleRequest, SaleReceipt, SalesStats};

use crate::error::ApiError;
use crate::state::SharedState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/stats", get(sales_stats))
        .route("/sales/:id", get(get_sale).delete(void_sale))
}

async fn create_sale(
    State(state): State<SharedState>,
    Json(request): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleReceipt>), ApiError> {
    let receipt = state.coordinator.create_sale(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_sales(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let sales = state.coordinator.list_sales(limit, offset).await?;
    Ok(Json(sales))
}

async fn get_sale(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SaleReceipt>, ApiError> {
    let receipt = state.coordinator.get_sale(&id).await?;
    Ok(Json(receipt))
}

async fn void_sale(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    let sale = state.coordinator.void_sale(&id).await?;
    Ok(Json(sale))
}

async fn sales_stats(State(state): State<SharedState>) -> Result<Json<SalesStats>, ApiError> {
    let stats = state.stats.compute(Utc::now()).await?;
    Ok(Json(stats))
}

// =============================================================================
// Route Tests
// =============================================================================

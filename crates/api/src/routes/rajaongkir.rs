//! Shipping-rate pass-through endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use courier::CostQuery;
use serde_json::Value;
use store::Store;

use crate::error::ApiError;
use crate::middleware::ApiForm;
use crate::state::AppState;

/// GET /api/rajaongkir/province
#[tracing::instrument(skip(state))]
pub async fn provinces<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.courier.provinces().await?))
}

/// GET /api/rajaongkir/city/{province_id}
#[tracing::instrument(skip(state))]
pub async fn cities<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(province_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.courier.cities(&province_id).await?))
}

/// POST /api/rajaongkir/cost — form fields origin, destination, weight, courier.
#[tracing::instrument(skip(state))]
pub async fn costs<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiForm(query): ApiForm<CostQuery>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.courier.costs(&query).await?))
}

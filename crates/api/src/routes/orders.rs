//! Order endpoints: checkout, lookups, admin listing and line repair.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use common::{BookId, Order, OrderId};
use serde::Deserialize;
use store::Store;

use super::{PageParams, PageResponse, parse_id};
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RepairLinesRequest {
    pub book_ids: Vec<i64>,
}

/// POST /api/orders — place an order for the caller.
///
/// The raw body is handed to the domain layer so that unparseable JSON is
/// reported like any other validation error.
#[tracing::instrument(skip(state, principal, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    body: Bytes,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .create_order_from_json(Some(&principal), &body)
        .await?;
    Ok(Json(order))
}

/// GET /api/orders/{id} — one order with its books and owner.
#[tracing::instrument(skip(state, _principal))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    Ok(Json(state.orders.get_order(id).await?))
}

/// GET /api/user-orders — every order owned by the caller.
#[tracing::instrument(skip(state, principal))]
pub async fn for_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.orders_for_user(principal.user_id).await?))
}

/// GET /api/orders?page&page_size — all orders, paginated (admin only).
#[tracing::instrument(skip(state, _admin))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<Order>>, ApiError> {
    let (page, page_size) = params.resolve()?;
    let orders = state.orders.list_orders(page, page_size).await?;
    Ok(Json(orders.into()))
}

/// POST /api/orders/{id}/lines — create whichever requested lines are missing.
#[tracing::instrument(skip(state, principal, req))]
pub async fn repair_lines<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RepairLinesRequest>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let book_ids = req.book_ids.into_iter().map(BookId::from).collect();
    let order = state
        .orders
        .repair_missing_lines(&principal, id, book_ids)
        .await?;
    Ok(Json(order))
}

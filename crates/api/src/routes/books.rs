//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Book, BookId};
use domain::BookInput;
use serde::Serialize;
use store::Store;

use super::{DataResponse, PageParams, PageResponse, parse_id};
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiJson};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    #[serde(rename = "topSellerBooks")]
    pub top_seller_books: Vec<Book>,
    #[serde(rename = "recommendedBooks")]
    pub recommended_books: Vec<Book>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub status: bool,
}

/// GET /api/books — paginated catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<Book>>, ApiError> {
    let (page, page_size) = params.resolve()?;
    Ok(Json(state.books.list_books(page, page_size).await?.into()))
}

/// GET /api/books/home — top sellers and recommendations.
#[tracing::instrument(skip(state))]
pub async fn home<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<HomeResponse>, ApiError> {
    let (page, page_size) = params.resolve()?;
    let home = state.books.home_books(page, page_size).await?;

    Ok(Json(HomeResponse {
        top_seller_books: home.top_sellers.items,
        recommended_books: home.recommended,
        page: home.top_sellers.requested_page,
        page_size: home.top_sellers.page_size,
        total_items: home.top_sellers.pagination.total_items,
        total_pages: home.top_sellers.pagination.total_pages,
        status: true,
    }))
}

/// GET /api/books/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Book>>, ApiError> {
    let id: BookId = parse_id(&id, "book")?;
    Ok(Json(DataResponse::new(state.books.get_book(id).await?)))
}

/// POST /api/books (admin only)
#[tracing::instrument(skip(state, _admin, input))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<BookInput>,
) -> Result<(StatusCode, Json<DataResponse<Book>>), ApiError> {
    let book = state.books.create_book(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(book))))
}

/// PUT /api/books/{id} (admin only)
#[tracing::instrument(skip(state, _admin, input))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<BookInput>,
) -> Result<Json<DataResponse<Book>>, ApiError> {
    let id: BookId = parse_id(&id, "book")?;
    Ok(Json(DataResponse::new(
        state.books.update_book(id, input).await?,
    )))
}

/// DELETE /api/books/{id} (admin only)
#[tracing::instrument(skip(state, _admin))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: BookId = parse_id(&id, "book")?;
    state.books.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

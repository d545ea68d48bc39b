//! HTTP route handlers.

pub mod books;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod rajaongkir;
pub mod users;

use std::str::FromStr;

use domain::pagination::DEFAULT_PAGE_SIZE;
use domain::{DomainError, Page};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// `?page&page_size` query parameters, parsed leniently so that bad values
/// become validation errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageParams {
    /// Returns `(page, page_size)`, defaulting to `(1, 10)`.
    pub fn resolve(&self) -> Result<(i64, i64), ApiError> {
        let page = parse_or(self.page.as_deref(), 1, "Invalid page number")?;
        let page_size = parse_or(
            self.page_size.as_deref(),
            i64::from(DEFAULT_PAGE_SIZE),
            "Invalid page size",
        )?;
        Ok((page, page_size))
    }
}

fn parse_or(raw: Option<&str>, default: i64, message: &str) -> Result<i64, ApiError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| DomainError::Validation(message.to_string()).into()),
    }
}

/// Parses a numeric path segment into a typed id.
pub fn parse_id<T: FromStr>(raw: &str, entity: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| DomainError::Validation(format!("Invalid {entity} id")).into())
}

/// Paginated listing envelope.
///
/// `page` echoes the requested page; `current_page` is the page clamped to
/// the last existing one.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub current_page: u64,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub status: bool,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.items,
            page: page.requested_page,
            current_page: page.pagination.page,
            page_size: page.page_size,
            total_items: page.pagination.total_items,
            total_pages: page.pagination.total_pages,
            status: true,
        }
    }
}

/// `{status, data}` envelope for single resources.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub status: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { status: true, data }
    }
}

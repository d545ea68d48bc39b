//! Page validation and page-count arithmetic shared by every listing.

use serde::Serialize;
use store::PageQuery;

use crate::error::{DomainError, Result};

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the caller does not send one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A validated listing request: `page >= 1` and `1 <= page_size <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validates raw page parameters.
    pub fn new(page: i64, page_size: i64) -> Result<Self> {
        let page = u32::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| DomainError::Validation("Invalid page number".to_string()))?;
        let page_size = u32::try_from(page_size)
            .ok()
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .ok_or_else(|| DomainError::Validation("Invalid page size".to_string()))?;

        Ok(Self { page, page_size })
    }

    /// The requested page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The requested page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The storage window for this request.
    pub fn query(&self) -> PageQuery {
        PageQuery::new(self.page, self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Page counts derived from a total.
///
/// `page` is the requested page clamped to the last existing page. Listings
/// still echo the page the caller asked for; see [`Page::requested_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total_items: u64,
    pub total_pages: u64,
    pub page: u64,
}

impl Pagination {
    /// `total_pages = ceil(total_items / page_size)`; a page past the end is
    /// clamped to the last page, and never below 1.
    pub fn calculate(total_items: u64, page: u32, page_size: u32) -> Self {
        let page_size = u64::from(page_size.max(1));
        let total_pages = total_items.div_ceil(page_size);
        let page = u64::from(page).min(total_pages).max(1);

        Self {
            total_items,
            total_pages,
            page,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The page number as sent by the caller, possibly past the last page.
    pub requested_page: u32,
    pub page_size: u32,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Wraps a storage result for a validated request.
    pub fn new(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
        Self {
            items,
            requested_page: request.page(),
            page_size: request.page_size(),
            pagination: Pagination::calculate(total_items, request.page(), request.page_size()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination::calculate(25, 1, 10);
        assert_eq!(p.total_items, 25);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn exact_multiple_has_no_extra_page() {
        assert_eq!(Pagination::calculate(30, 1, 10).total_pages, 3);
    }

    #[test]
    fn page_past_the_end_is_clamped_but_request_is_echoed() {
        let request = PageRequest::new(5, 10).unwrap();
        let page: Page<()> = Page::new(Vec::new(), 25, request);

        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.page, 3);
        assert_eq!(page.requested_page, 5);
    }

    #[test]
    fn empty_listing_reports_first_page() {
        let p = Pagination::calculate(0, 4, 10);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(-3, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, 101).is_err());
        assert!(matches!(
            PageRequest::new(1, 500),
            Err(DomainError::Validation(msg)) if msg == "Invalid page size"
        ));
    }

    #[test]
    fn accepts_boundaries() {
        let request = PageRequest::new(1, 100).unwrap();
        assert_eq!(request.page_size(), 100);
        assert_eq!(PageRequest::new(7, 1).unwrap().query().offset(), 6);
    }
}

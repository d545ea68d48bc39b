/// A 1-based page window over an ordered listing.
///
/// Bounds are enforced by the callers; the store only translates the window
/// into `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Page number, starting at 1.
    pub page: u32,

    /// Number of rows per page.
    pub page_size: u32,
}

impl PageQuery {
    /// Creates a page window.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Number of rows to skip: `(page - 1) * page_size`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Maximum number of rows to return.
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_has_no_offset() {
        let query = PageQuery::new(1, 10);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn offset_is_page_minus_one_times_size() {
        assert_eq!(PageQuery::new(3, 25).offset(), 50);
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        assert_eq!(PageQuery::new(0, 10).offset(), 0);
    }
}

//! Page-based pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 10;
/// Largest page size a client may request.
pub const MAX_LIMIT: u64 = 100;
/// Highest page number a client may request.
pub const MAX_PAGE: u64 = 1_000_000;

/// Normalized page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Build a page request, clamping missing or out-of-range values.
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Number of pages needed for `total` rows.
    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wrap a page of rows.
    #[must_use]
    pub const fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            total_pages: request.total_pages(total),
            data,
        }
    }

    /// Convert every row, keeping the envelope.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

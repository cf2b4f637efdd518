//! Offset-based pagination helpers.
//!
//! Every list endpoint accepts `page`/`limit` query parameters and returns
//! a pagination block alongside the rows. Out-of-range values are clamped
//! rather than rejected.

use serde::{Deserialize, Serialize};

/// Default page number when the query omits it.
pub const DEFAULT_PAGE: i64 = 1;
/// Default page size when the query omits it.
pub const DEFAULT_LIMIT: i64 = 10;
/// Hard ceiling on page size.
pub const MAX_LIMIT: i64 = 100;

/// Page/limit query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Normalizes the raw query into a concrete page selection.
    pub fn normalize(self) -> PageSelection {
        let page = self.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        PageSelection { page, limit }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: None,
            limit: None,
        }
    }
}

/// A normalized page selection ready to turn into LIMIT/OFFSET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSelection {
    pub page: i64,
    pub limit: i64,
}

impl PageSelection {
    /// SQL OFFSET for this selection: `(page - 1) * limit`.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Builds the response pagination block for a total row count.
    pub fn info(&self, total: i64) -> PageInfo {
        PageInfo {
            page: self.page,
            limit: self.limit,
            total,
            pages: pages_for(total, self.limit),
        }
    }
}

/// Pagination block returned alongside every page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Number of pages needed for `total` rows at `limit` rows per page,
/// i.e. `ceil(total / limit)`.
fn pages_for(total: i64, limit: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

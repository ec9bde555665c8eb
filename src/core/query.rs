//! Query parameters and pagination utilities

use serde::{Deserialize, Serialize};

/// Pagination parameters as they arrive in a query string
///
/// Both values are optional; [`PageRequest::resolve`] applies the
/// configured default and maximum page size.
///
/// # Example
/// ```text
/// GET /products?page=2&limit=10
/// GET /orders?status=pendiente&page=1
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct PageRequest {
    /// Page number (starts at 1)
    pub page: Option<usize>,

    /// Number of items per page
    pub limit: Option<usize>,
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Clamp into a concrete page: page >= 1, 1 <= limit <= `max_limit`
    pub fn resolve(&self, default_limit: usize, max_limit: usize) -> Page {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
        Page { page, limit }
    }
}

/// A resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Page {
    /// Number of rows to skip
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }

    /// Slice an already sorted collection into this page
    pub fn slice<T>(&self, items: Vec<T>) -> Paginated<T> {
        let total = items.len();
        let data = items.into_iter().skip(self.offset()).take(self.limit).collect();
        Paginated::new(data, *self, total)
    }
}

/// Paginated response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: Page, total: usize) -> Self {
        Self {
            data,
            pagination: PaginationMeta {
                page: page.page,
                limit: page.limit,
                total,
                pages: total.div_ceil(page.limit),
            },
        }
    }
}

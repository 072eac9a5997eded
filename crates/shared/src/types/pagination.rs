//! Query envelope and list response for master endpoints.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Largest page a client may request.
pub const MAX_LIMIT: u64 = 200;

/// Page size when none is given.
pub const DEFAULT_LIMIT: u64 = 20;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Request parameters accepted by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    /// Number of rows to skip.
    #[serde(default)]
    pub offset: u64,
    /// Page size, 1..=200.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Case-insensitive substring matched against the table's text columns.
    #[serde(default)]
    pub search: Option<String>,
    /// Column name to sort by.
    #[serde(default)]
    pub sort: Option<String>,
    /// Sort direction.
    #[serde(default)]
    pub dir: SortDir,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            search: None,
            sort: None,
            dir: SortDir::Asc,
        }
    }
}

impl ListQuery {
    /// Checks the envelope bounds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when `limit` is outside 1..=200.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Returns the trimmed search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Response wrapper for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// The items in the current page.
    pub items: Vec<T>,
    /// Total number of matching rows across all pages.
    pub total: u64,
}

impl<T> ListResponse<T> {
    /// Creates a new list response.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    /// Maps the items, keeping the total.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListResponse<U> {
        ListResponse {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

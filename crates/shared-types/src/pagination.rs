// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Pagination primitives
//!
//! Callers page with `{page, limit}` (1-based pages). The local store keeps that
//! convention while the indexer windows with `{limit, offset}`; both are derived
//! from the same [`PaginationWindow`] so they stay numerically consistent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default upper bound for a page size
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 100;

/// Errors raised while building a pagination window
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Pages are 1-based
    #[error("page must be at least 1, got {page}")]
    InvalidPage {
        /// Requested page
        page: u32,
    },

    /// Limit outside `1..=max`
    #[error("limit must be between 1 and {max}, got {limit}")]
    InvalidLimit {
        /// Requested limit
        limit: u32,
        /// Largest accepted limit
        max: u32,
    },
}

/// Caller-side page request
///
/// Deserialized windows are checked against [`DEFAULT_MAX_PAGE_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct PaginationWindow {
    page: u32,
    limit: u32,
}

#[derive(Deserialize)]
struct RawWindow {
    page: u32,
    limit: u32,
}

impl TryFrom<RawWindow> for PaginationWindow {
    type Error = PaginationError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        Self::new(raw.page, raw.limit)
    }
}

impl PaginationWindow {
    /// Create a window bounded by [`DEFAULT_MAX_PAGE_LIMIT`]
    pub fn new(page: u32, limit: u32) -> Result<Self, PaginationError> {
        Self::with_max_limit(page, limit, DEFAULT_MAX_PAGE_LIMIT)
    }

    /// Create a window with a custom upper bound for the limit
    pub fn with_max_limit(page: u32, limit: u32, max: u32) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::InvalidPage { page });
        }
        if limit == 0 || limit > max {
            return Err(PaginationError::InvalidLimit { limit, max });
        }
        Ok(Self { page, limit })
    }

    /// 1-based page number
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items before this page, `(page - 1) * limit`
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Translate into the indexer's `{limit, offset}` convention
    pub fn to_indexer(&self) -> IndexerWindow {
        IndexerWindow {
            limit: self.limit,
            offset: self.offset(),
        }
    }

    /// Compute page flags for this window over a universe of `total_count` items
    pub fn page_info(&self, total_count: u64) -> PageInfo {
        PageInfo {
            has_next_page: self.offset() + u64::from(self.limit) < total_count,
            has_previous_page: self.page > 1,
            total_count,
        }
    }
}

/// Indexer-side window, `offset` counted in items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexerWindow {
    /// Maximum number of items to return
    pub limit: u32,
    /// Number of items to skip
    pub offset: u64,
}

/// Page metadata detached from the page content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether items exist after this page
    pub has_next_page: bool,
    /// Whether items exist before this page
    pub has_previous_page: bool,
    /// Size of the filtered universe before pagination
    pub total_count: u64,
}

impl PageInfo {
    /// Metadata of an unwindowed result holding `total_count` items
    pub fn complete(total_count: u64) -> Self {
        Self {
            has_next_page: false,
            has_previous_page: false,
            total_count,
        }
    }
}

/// A page of items with its metadata
///
/// `total_count` is the size of the filtered universe, not `data.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// Items of this page
    pub data: Vec<T>,
    /// Whether items exist after this page
    pub has_next_page: bool,
    /// Whether items exist before this page
    pub has_previous_page: bool,
    /// Size of the filtered universe before pagination
    pub total_count: u64,
}

impl<T> PageResult<T> {
    /// Assemble a page from items and detached metadata
    pub fn new(data: Vec<T>, info: PageInfo) -> Self {
        Self {
            data,
            has_next_page: info.has_next_page,
            has_previous_page: info.has_previous_page,
            total_count: info.total_count,
        }
    }

    /// An empty result over an empty universe
    pub fn empty() -> Self {
        Self::new(Vec::new(), PageInfo::default())
    }

    /// Metadata of this page
    pub fn info(&self) -> PageInfo {
        PageInfo {
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
            total_count: self.total_count,
        }
    }

    /// Split into items and metadata
    pub fn into_parts(self) -> (Vec<T>, PageInfo) {
        let info = self.info();
        (self.data, info)
    }

    /// Transform the items, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        let (data, info) = self.into_parts();
        PageResult::new(data.into_iter().map(f).collect(), info)
    }
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_validation() {
        assert_eq!(
            PaginationWindow::new(0, 10),
            Err(PaginationError::InvalidPage { page: 0 })
        );
        assert!(PaginationWindow::new(1, 0).is_err());
        assert!(PaginationWindow::new(1, DEFAULT_MAX_PAGE_LIMIT + 1).is_err());
        assert!(PaginationWindow::with_max_limit(1, 500, 500).is_ok());
    }

    #[test]
    fn deserialized_windows_are_validated() {
        let window: PaginationWindow = serde_json::from_str(r#"{"page":2,"limit":5}"#).unwrap();
        assert_eq!(window.offset(), 5);

        let error = serde_json::from_str::<PaginationWindow>(r#"{"page":0,"limit":10}"#)
            .unwrap_err()
            .to_string();
        assert!(error.contains("page must be at least 1"));
        assert!(serde_json::from_str::<PaginationWindow>(r#"{"page":1,"limit":0}"#).is_err());
        assert!(serde_json::from_str::<PaginationWindow>(r#"{"page":1,"limit":101}"#).is_err());
    }

    #[test]
    fn offset_translation() {
        let window = PaginationWindow::new(3, 20).unwrap();
        assert_eq!(window.offset(), 40);
        assert_eq!(
            window.to_indexer(),
            IndexerWindow {
                limit: 20,
                offset: 40
            }
        );
        assert_eq!(PaginationWindow::new(1, 20).unwrap().offset(), 0);
    }

    #[test]
    fn page_info_boundaries() {
        let first = PaginationWindow::new(1, 10).unwrap().page_info(25);
        assert!(first.has_next_page);
        assert!(!first.has_previous_page);

        let last = PaginationWindow::new(3, 10).unwrap().page_info(25);
        assert!(!last.has_next_page);
        assert!(last.has_previous_page);

        let exact = PaginationWindow::new(2, 10).unwrap().page_info(20);
        assert!(!exact.has_next_page);
        assert_eq!(exact.total_count, 20);
    }

    #[test]
    fn page_result_serializes_camel_case() {
        let page = PageResult::new(vec![1, 2], PaginationWindow::new(1, 2).unwrap().page_info(3));
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPreviousPage"], false);
        assert_eq!(json["totalCount"], 3);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn map_keeps_metadata() {
        let page = PageResult::new(vec![1, 2], PageInfo::complete(2)).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20]);
        assert_eq!(page.total_count, 2);
        assert!(!page.has_next_page);
    }
}

use serde::{Deserialize, Serialize};

use crate::config::PaginationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Requested page of a listing. Every field is optional; see [`PageWindow`]
/// for how missing or out-of-range values are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationRequest {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: SortDirection,
}

impl PaginationRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = direction;
        self
    }

    /// Resolves the request against the configured limits.
    #[must_use]
    pub fn window(&self, policy: PaginationPolicy) -> PageWindow {
        PageWindow::resolve(self, policy)
    }
}

/// Page, limit and offset actually used for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl PageWindow {
    /// `page` defaults to 1 and is at least 1. A missing or zero `limit` uses
    /// the default limit, and the result never exceeds `max_limit`.
    #[must_use]
    pub fn resolve(request: &PaginationRequest, policy: PaginationPolicy) -> Self {
        let page = request.page.unwrap_or(1).max(1);
        let requested = request
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(policy.default_limit);
        let limit = requested.min(policy.max_limit).max(1);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Rows matching the filter, across all pages
    pub total: u64,
    pub page: u64,
    /// Effective limit after applying the configured maximum
    pub limit: u64,
}

/// Full-text search results. Unlike [`Page`] the window is not echoed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> SearchResults<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }
}

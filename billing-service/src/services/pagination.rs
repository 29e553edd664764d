//! Page-number pagination for list use-cases.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: u64,
    pub page_size: u64,
}

impl PaginationParams {
    pub const DEFAULT_PAGE_SIZE: u64 = 10;
    pub const MAX_PAGE_SIZE: u64 = 100;

    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    /// Page is at least 1; a zero page size falls back to the default and
    /// anything else is capped at [`Self::MAX_PAGE_SIZE`].
    pub fn normalize(self) -> Self {
        let page_size = match self.page_size {
            0 => Self::DEFAULT_PAGE_SIZE,
            n => n.min(Self::MAX_PAGE_SIZE),
        };
        Self {
            page: self.page.max(1),
            page_size,
        }
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub page: u64,
    pub page_count: u64,
    pub page_size: u64,
    pub size: u64,
}

impl PaginationResult {
    pub fn new(params: PaginationParams, size: u64) -> Self {
        let params = params.normalize();
        Self {
            page: params.page,
            page_count: size.div_ceil(params.page_size),
            page_size: params.page_size,
            size,
        }
    }
}

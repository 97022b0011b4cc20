//! Pagination types shared by every list endpoint

use database_layer::PageRequest;
use serde::{Deserialize, Serialize};

/// `?page=&limit=` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaginationParams {
    /// Get the page number (defaults to 1, minimum 1)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the page size, clamped between 1 and `max`
    pub fn limit(&self, default: u32, max: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, max.max(1))
    }

    pub fn to_request(&self, default: u32, max: u32) -> PageRequest {
        PageRequest::new(self.page(), self.limit(default, max))
    }
}

/// `pagination` block of a list response
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationInfo {
    pub current: u32,
    pub pages: u32,
    pub total: i64,
}

impl PaginationInfo {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total_pages = u64::try_from(total.max(0))
            .unwrap_or_default()
            .div_ceil(u64::from(request.limit));
        Self {
            current: request.page,
            pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total,
        }
    }
}

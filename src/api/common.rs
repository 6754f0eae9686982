//! Common API utilities and shared types

use serde::{Deserialize, Serialize};

use crate::models::PublicContentQuery;

/// Default page number (1-indexed)
pub const DEFAULT_PAGE: i64 = 1;

/// Parse a `page` query value. Non-numeric or < 1 falls back to 1.
pub fn clamp_page(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(DEFAULT_PAGE)
}

/// Parse a `pageSize` query value. Non-numeric or outside 1..=100 falls back to 24.
pub fn clamp_page_size(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|size| (1..=PublicContentQuery::MAX_PAGE_SIZE).contains(size))
        .unwrap_or(PublicContentQuery::DEFAULT_PAGE_SIZE)
}

/// Parse an optional numeric query value, treating garbage as absent
pub fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

/// `{ "success": true }`
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

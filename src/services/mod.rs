//! Services layer - Business logic
//!
//! Services validate input, apply defaults, coordinate repositories and the
//! cache, and report failures through one error enum per service. The API
//! layer maps those enums onto HTTP responses.

pub mod ad;
pub mod analytics;
pub mod auth;
pub mod bookmark;
pub mod category;
pub mod comment;
pub mod content;
pub mod link;
pub mod partner;
pub mod password;
pub mod rate_limiter;
pub mod redirect;
pub mod report;
pub mod settings;

use std::future::Future;

pub use ad::{AdService, AdServiceError};
pub use analytics::{AnalyticsService, AnalyticsServiceError};
pub use auth::{AuthService, AuthServiceError, LoginOutcome};
pub use bookmark::{BookmarkService, BookmarkServiceError};
pub use category::{CategoryService, CategoryServiceError};
pub use comment::{strip_urls, CommentService, CommentServiceError};
pub use content::{ContentService, ContentServiceError};
pub use link::{LinkService, LinkServiceError};
pub use partner::{PartnerService, PartnerServiceError};
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use redirect::{RedirectOutcome, RedirectService, RedirectServiceError};
pub use report::{ReportService, ReportServiceError};
pub use settings::{SettingsService, SettingsServiceError};

/// Slug used when the source text has no ASCII letters or digits
const FALLBACK_SLUG: &str = "item";

/// Generate a URL-friendly slug
///
/// ASCII letters and digits are kept (lowercased). Every other run of
/// characters collapses into a single hyphen, and leading or trailing hyphens
/// are dropped.
pub fn generate_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Find the first free slug among `base`, `base-2`, `base-3`, ...
///
/// `exists` reports whether a candidate is already taken.
pub async fn unique_slug<F, Fut>(base: &str, mut exists: F) -> anyhow::Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let mut candidate = base.to_string();
    let mut counter = 2;

    while exists(candidate.clone()).await? {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }

    Ok(candidate)
}

/// Trim a required text field, treating blank as missing
pub(crate) fn required_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trim an optional text field, storing blank as `None`
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

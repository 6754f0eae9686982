//! Content link model
//!
//! External source URLs of a content item, their verification state and the
//! click log written by the redirect flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, ContentSummary};

string_enum! {
    /// What the visitor does at the destination
    pub enum LinkType {
        Read => "READ",
        Watch => "WATCH",
        Download => "DOWNLOAD",
        Visit => "VISIT",
        Mirror => "MIRROR",
        External => "EXTERNAL",
    }
}

string_enum! {
    /// Moderation state. Only verified links are offered to visitors.
    pub enum LinkStatus {
        Verified => "VERIFIED",
        Unverified => "UNVERIFIED",
        Blocked => "BLOCKED",
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::Unverified
    }
}

/// Content link entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentLink {
    pub id: i64,
    pub content_id: i64,
    pub url: String,
    pub source_name: String,
    pub link_type: LinkType,
    pub status: LinkStatus,
    pub priority: i32,
    pub partner_id: Option<i64>,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentLink {
    pub fn is_verified(&self) -> bool {
        self.status == LinkStatus::Verified
    }
}

/// Public view of the partner behind a link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSummary {
    pub id: i64,
    pub name: String,
    pub is_verified: bool,
    pub logo_url: Option<String>,
}

/// Link joined with its partner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkWithPartner {
    #[serde(flatten)]
    pub link: ContentLink,
    pub partner: Option<PartnerSummary>,
}

impl LinkWithPartner {
    /// Name shown to visitors: the partner when linked, else the source
    pub fn display_name(&self) -> &str {
        self.partner
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or(&self.link.source_name)
    }
}

/// Link as listed in the admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLink {
    #[serde(flatten)]
    pub link: ContentLink,
    pub partner: Option<PartnerSummary>,
    pub content: ContentSummary,
}

/// Link nested in a content creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLinkInput {
    pub url: String,
    pub source_name: String,
    pub link_type: LinkType,
    #[serde(default)]
    pub status: LinkStatus,
    #[serde(default)]
    pub priority: i32,
}

/// Input for creating a standalone link
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkInput {
    pub content_id: Option<i64>,
    pub url: Option<String>,
    pub source_name: Option<String>,
    pub link_type: Option<LinkType>,
    pub status: Option<LinkStatus>,
    pub priority: Option<i32>,
    pub partner_id: Option<i64>,
}

impl CreateLinkInput {
    pub fn new(
        content_id: i64,
        url: impl Into<String>,
        source_name: impl Into<String>,
        link_type: LinkType,
    ) -> Self {
        Self {
            content_id: Some(content_id),
            url: Some(url.into()),
            source_name: Some(source_name.into()),
            link_type: Some(link_type),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: LinkStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_partner(mut self, partner_id: i64) -> Self {
        self.partner_id = Some(partner_id);
        self
    }
}

/// Partial update of a link
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkInput {
    pub url: Option<String>,
    pub source_name: Option<String>,
    pub link_type: Option<LinkType>,
    pub status: Option<LinkStatus>,
    pub priority: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub partner_id: Option<Option<i64>>,
}

/// One recorded click on a specific link
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkClick {
    pub id: i64,
    pub link_id: i64,
    pub content_id: i64,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request metadata captured for a link click
#[derive(Debug, Clone, Default)]
pub struct NewLinkClick {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
}

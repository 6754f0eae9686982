//! Partner model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::double_option;

/// A source site whose links are promoted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub website_url: String,
    pub logo_url: Option<String>,
    pub is_verified: bool,
    pub priority_score: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partner with the number of links attached to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerWithLinkCount {
    #[serde(flatten)]
    pub partner: Partner,
    pub links_count: i64,
}

/// Input for creating a partner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartnerInput {
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub is_verified: Option<bool>,
    pub priority_score: Option<i32>,
    pub description: Option<String>,
}

impl CreatePartnerInput {
    pub fn new(name: impl Into<String>, website_url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            website_url: Some(website_url.into()),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority_score: i32) -> Self {
        self.priority_score = Some(priority_score);
        self
    }

    pub fn verified(mut self) -> Self {
        self.is_verified = Some(true);
        self
    }
}

/// Partial update of a partner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartnerInput {
    pub name: Option<String>,
    pub website_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
    pub is_verified: Option<bool>,
    pub priority_score: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

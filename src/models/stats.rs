//! Analytics models

use serde::{Deserialize, Serialize};

use super::ContentType;

/// A tracked visitor interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatEvent {
    View,
    Click,
}

impl std::str::FromStr for StatEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "click" => Ok(Self::Click),
            _ => Err(format!("Invalid event: {}", s)),
        }
    }
}

/// Site-wide totals for one UTC day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyTotals {
    /// `YYYY-MM-DD`
    pub date: String,
    pub views: i64,
    pub clicks: i64,
}

/// Per-content totals within the analytics range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopContent {
    pub content_id: i64,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub total_views: i64,
    pub total_clicks: i64,
    /// Click-through rate, clicks / views or 0 with no views
    pub ctr: f64,
}

impl TopContent {
    pub fn click_through_rate(views: i64, clicks: i64) -> f64 {
        if views > 0 {
            clicks as f64 / views as f64
        } else {
            0.0
        }
    }
}

/// Analytics dashboard payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub range_days: i64,
    pub daily: Vec<DailyTotals>,
    pub top_content: Vec<TopContent>,
}

//! Analytics service
//!
//! Counts content views and clicks per UTC day and rolls them up for the
//! admin dashboard. Each increment updates the daily row and the lifetime
//! total on the content in one transaction.

use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::db::repositories::{ContentRepository, StatsRepository};
use crate::models::{AnalyticsOverview, StatEvent};

/// Number of rows in the top content table
const TOP_CONTENT_LIMIT: i64 = 20;

/// Range used when the requested one is not supported
const DEFAULT_RANGE_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum AnalyticsServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Analytics service
pub struct AnalyticsService {
    stats: Arc<dyn StatsRepository>,
    contents: Arc<dyn ContentRepository>,
}

impl AnalyticsService {
    pub fn new(stats: Arc<dyn StatsRepository>, contents: Arc<dyn ContentRepository>) -> Self {
        Self { stats, contents }
    }

    pub async fn increment_content_view(&self, content_id: i64) -> anyhow::Result<()> {
        self.stats
            .record_event(content_id, &date_key(today()), StatEvent::View)
            .await
    }

    pub async fn increment_content_click(&self, content_id: i64) -> anyhow::Result<()> {
        self.stats
            .record_event(content_id, &date_key(today()), StatEvent::Click)
            .await
    }

    /// Record an event reported by the public site
    ///
    /// The content must exist and be published.
    pub async fn record_public_event(
        &self,
        content_id: Option<i64>,
        event: Option<&str>,
    ) -> Result<(), AnalyticsServiceError> {
        let event: StatEvent = event
            .unwrap_or_default()
            .parse()
            .map_err(|_| AnalyticsServiceError::Validation("Invalid event".to_string()))?;
        let content_id = content_id
            .ok_or_else(|| AnalyticsServiceError::Validation("contentId is required".to_string()))?;

        match self.contents.get_by_id(content_id).await? {
            Some(content) if content.is_published() => {}
            _ => return Err(AnalyticsServiceError::NotFound("Content not found".to_string())),
        }

        self.stats
            .record_event(content_id, &date_key(today()), event)
            .await?;
        Ok(())
    }

    /// Daily totals and top content for the last 7, 30 or 90 days
    pub async fn overview(&self, days: Option<i64>) -> Result<AnalyticsOverview, AnalyticsServiceError> {
        let range_days = normalize_range(days);
        let from = date_key(range_start(today(), range_days));

        let daily = self.stats.daily_totals(&from).await?;
        let top_content = self.stats.top_content(&from, TOP_CONTENT_LIMIT).await?;

        Ok(AnalyticsOverview {
            range_days,
            daily,
            top_content,
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 30 and 90 are honoured, anything else falls back to 7
pub fn normalize_range(days: Option<i64>) -> i64 {
    match days {
        Some(30) => 30,
        Some(90) => 90,
        _ => DEFAULT_RANGE_DAYS,
    }
}

/// First day of a range ending today, inclusive
fn range_start(today: NaiveDate, range_days: i64) -> NaiveDate {
    today - Duration::days(range_days - 1)
}

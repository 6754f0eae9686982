//! Content report model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentSummary;

string_enum! {
    /// Triage state of a visitor report
    pub enum ReportStatus {
        Pending => "PENDING",
        Reviewed => "REVIEWED",
        Resolved => "RESOLVED",
        Dismissed => "DISMISSED",
    }
}

impl Default for ReportStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// A visitor report about a broken or inappropriate item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentReport {
    pub id: i64,
    pub content_id: i64,
    pub reason: String,
    pub details: Option<String>,
    pub reporter_ip: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report joined with the reported content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWithContent {
    #[serde(flatten)]
    pub report: ContentReport,
    pub content: ContentSummary,
}

/// Public report submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    pub content_id: Option<i64>,
    pub reason: Option<String>,
    pub details: Option<String>,
}

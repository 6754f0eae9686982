//! Report service
//!
//! Visitors flag broken or inappropriate items; admins triage them.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use super::{optional_text, required_text};
use crate::db::repositories::{ContentRepository, ReportRepository};
use crate::models::{ContentReport, CreateReportInput, ReportStatus, ReportWithContent};

#[derive(Debug, Error)]
pub enum ReportServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Report service
pub struct ReportService {
    repo: Arc<dyn ReportRepository>,
    contents: Arc<dyn ContentRepository>,
}

impl ReportService {
    pub fn new(repo: Arc<dyn ReportRepository>, contents: Arc<dyn ContentRepository>) -> Self {
        Self { repo, contents }
    }

    /// Store a visitor report with status PENDING
    pub async fn create(
        &self,
        input: CreateReportInput,
        reporter_ip: Option<String>,
    ) -> Result<ContentReport, ReportServiceError> {
        let reason = required_text(input.reason.as_deref());
        let (Some(content_id), Some(reason)) = (input.content_id, reason) else {
            return Err(ReportServiceError::Validation(
                "contentId and reason are required".to_string(),
            ));
        };

        if self.contents.get_by_id(content_id).await?.is_none() {
            return Err(ReportServiceError::NotFound("Content not found".to_string()));
        }

        let now = Utc::now();
        let report = ContentReport {
            id: 0,
            content_id,
            reason,
            details: optional_text(input.details),
            reporter_ip,
            status: ReportStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&report).await?;
        tracing::info!("Report {} filed for content {}", created.id, content_id);
        Ok(created)
    }

    pub async fn list(&self, status: Option<&str>) -> Result<Vec<ReportWithContent>, ReportServiceError> {
        let status = status
            .filter(|s| !s.is_empty())
            .map(parse_status)
            .transpose()?;
        Ok(self.repo.list(status).await?)
    }

    pub async fn update_status(&self, id: i64, status: Option<&str>) -> Result<ContentReport, ReportServiceError> {
        let status = parse_status(status.unwrap_or_default())?;
        if !self.repo.update_status(id, status).await? {
            return Err(ReportServiceError::NotFound("Report not found".to_string()));
        }
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ReportServiceError::NotFound("Report not found".to_string()))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ReportServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ReportServiceError::NotFound("Report not found".to_string()));
        }
        Ok(())
    }
}

fn parse_status(raw: &str) -> Result<ReportStatus, ReportServiceError> {
    raw.parse()
        .map_err(|_| ReportServiceError::Validation("Invalid status".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_content, migrated_pool};
    use crate::db::repositories::{SqlxContentRepository, SqlxReportRepository};

    fn report(content_id: i64, reason: &str) -> CreateReportInput {
        CreateReportInput {
            content_id: Some(content_id),
            reason: Some(reason.to_string()),
            details: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_triage() {
        let pool = migrated_pool().await;
        let service = ReportService::new(
            SqlxReportRepository::boxed(pool.clone()),
            SqlxContentRepository::boxed(pool.clone()),
        );
        let content = insert_content(&pool, "jujutsu-kaisen").await;

        let created = service
            .create(report(content.id, "Broken link"), Some("198.51.100.4".to_string()))
            .await
            .unwrap();
        assert_eq!(created.status, ReportStatus::Pending);
        assert!(created.details.is_none());
        assert_eq!(created.reporter_ip.as_deref(), Some("198.51.100.4"));

        let resolved = service.update_status(created.id, Some("RESOLVED")).await.unwrap();
        assert_eq!(resolved.status, ReportStatus::Resolved);

        assert!(service.list(Some("PENDING")).await.unwrap().is_empty());
        let listed = service.list(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content.slug, "jujutsu-kaisen");

        service.delete(created.id).await.unwrap();
        assert!(service.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_and_missing_records() {
        let pool = migrated_pool().await;
        let service = ReportService::new(
            SqlxReportRepository::boxed(pool.clone()),
            SqlxContentRepository::boxed(pool.clone()),
        );
        let content = insert_content(&pool, "hells-paradise").await;

        assert!(matches!(
            service.create(report(content.id, " "), None).await,
            Err(ReportServiceError::Validation(_))
        ));
        assert!(matches!(
            service.create(report(31337, "Spam"), None).await,
            Err(ReportServiceError::NotFound(_))
        ));

        let created = service.create(report(content.id, "Spam"), None).await.unwrap();
        assert!(matches!(
            service.update_status(created.id, Some("ARCHIVED")).await,
            Err(ReportServiceError::Validation(_))
        ));
        assert!(matches!(
            service.update_status(999, Some("REVIEWED")).await,
            Err(ReportServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.list(Some("bogus")).await,
            Err(ReportServiceError::Validation(_))
        ));
    }
}

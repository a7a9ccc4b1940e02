// ============================================================================
// Tala Core - Report Entities
// File: crates/tala-core/src/domain/report.rs
// Description: Report exports and dashboard read models
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// Report type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    AssessmentSummary,
    TeamPerformance,
    PdiProgress,
    RecruitingMetrics,
    UsageAnalytics,
    OrganizationOverview,
    Custom,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::AssessmentSummary => "ASSESSMENT_SUMMARY",
            ReportType::TeamPerformance => "TEAM_PERFORMANCE",
            ReportType::PdiProgress => "PDI_PROGRESS",
            ReportType::RecruitingMetrics => "RECRUITING_METRICS",
            ReportType::UsageAnalytics => "USAGE_ANALYTICS",
            ReportType::OrganizationOverview => "ORGANIZATION_OVERVIEW",
            ReportType::Custom => "CUSTOM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ASSESSMENT_SUMMARY" => Some(ReportType::AssessmentSummary),
            "TEAM_PERFORMANCE" => Some(ReportType::TeamPerformance),
            "PDI_PROGRESS" => Some(ReportType::PdiProgress),
            "RECRUITING_METRICS" => Some(ReportType::RecruitingMetrics),
            "USAGE_ANALYTICS" => Some(ReportType::UsageAnalytics),
            "ORGANIZATION_OVERVIEW" => Some(ReportType::OrganizationOverview),
            "CUSTOM" => Some(ReportType::Custom),
            _ => None,
        }
    }
}

/// Requested export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportFormat {
    Html,
    Pdf,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Html => "HTML",
            ReportFormat::Pdf => "PDF",
            ReportFormat::Json => "JSON",
            ReportFormat::Csv => "CSV",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "HTML" => Some(ReportFormat::Html),
            "PDF" => Some(ReportFormat::Pdf),
            "JSON" => Some(ReportFormat::Json),
            "CSV" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

/// Report generation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Generating,
    Completed,
    Failed,
    Expired,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Generating => "GENERATING",
            ReportStatus::Completed => "COMPLETED",
            ReportStatus::Failed => "FAILED",
            ReportStatus::Expired => "EXPIRED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GENERATING" => Some(ReportStatus::Generating),
            "COMPLETED" => Some(ReportStatus::Completed),
            "FAILED" => Some(ReportStatus::Failed),
            "EXPIRED" => Some(ReportStatus::Expired),
            _ => None,
        }
    }
}

/// A requested export. Content is the rendered text for HTML/JSON/CSV;
/// PDF requests fail with an explicit unsupported error.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Report {
    pub id: Uuid,
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,
    pub report_type: ReportType,
    pub format: ReportFormat,
    pub status: ReportStatus,

    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub filters: Value,

    pub content: String,
    pub data: Value,

    pub expires_at: Option<DateTime<Utc>>,
    pub generated_by: Option<Uuid>,
    pub generation_started_at: DateTime<Utc>,
    pub generation_completed_at: Option<DateTime<Utc>>,
    pub generation_error: String,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn new(
        organization_id: Uuid,
        title: String,
        report_type: ReportType,
        format: ReportFormat,
        generated_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let report = Self {
            id: Uuid::new_v4(),
            organization_id,
            title,
            description: String::new(),
            report_type,
            format,
            status: ReportStatus::Generating,
            date_from: None,
            date_to: None,
            filters: Value::Object(Default::default()),
            content: String::new(),
            data: Value::Object(Default::default()),
            expires_at: None,
            generated_by,
            generation_started_at: now,
            generation_completed_at: None,
            generation_error: String::new(),
            created_at: now,
            modified_at: None,
        };
        report.validate()?;
        Ok(report)
    }

    pub fn mark_completed(&mut self, content: String, data: Value) {
        self.status = ReportStatus::Completed;
        self.content = content;
        self.data = data;
        self.generation_completed_at = Some(Utc::now());
        self.modified_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = ReportStatus::Failed;
        self.generation_error = error;
        self.generation_completed_at = Some(Utc::now());
        self.modified_at = Some(Utc::now());
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

/// Organization dashboard aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_members: i64,
    pub total_assessments: i64,
    pub completed_assessments: i64,
    pub assessment_completion_rate: f64,
    pub total_pdi_plans: i64,
    pub active_pdi_plans: i64,
    pub open_jobs: i64,
}

impl DashboardSummary {
    pub fn completion_rate(completed: i64, total: i64) -> f64 {
        if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        }
    }
}

/// Per-definition invitation funnel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionFunnelRow {
    pub assessment_id: Uuid,
    pub assessment_name: String,
    pub invited: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub expired: i64,
    pub completion_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lifecycle() {
        let mut report = Report::new(
            Uuid::new_v4(),
            "Quarterly overview".into(),
            ReportType::OrganizationOverview,
            ReportFormat::Json,
            None,
        )
        .unwrap();
        assert_eq!(report.status, ReportStatus::Generating);

        report.mark_completed("{}".into(), serde_json::json!({"total_members": 4}));
        assert_eq!(report.status, ReportStatus::Completed);
        assert!(report.generation_completed_at.is_some());

        let mut failing = Report::new(
            Uuid::new_v4(),
            "Broken".into(),
            ReportType::Custom,
            ReportFormat::Pdf,
            None,
        )
        .unwrap();
        failing.mark_failed("PDF output is not supported".into());
        assert_eq!(failing.status, ReportStatus::Failed);
    }

    #[test]
    fn test_completion_rate_guards_zero() {
        assert_eq!(DashboardSummary::completion_rate(0, 0), 0.0);
        assert_eq!(DashboardSummary::completion_rate(3, 4), 75.0);
    }

    #[test]
    fn test_empty_title_rejected() {
        let report = Report::new(
            Uuid::new_v4(),
            String::new(),
            ReportType::Custom,
            ReportFormat::Html,
            None,
        );
        assert!(report.is_err());
    }
}

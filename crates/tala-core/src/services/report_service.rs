// ============================================================================
// Tala Core - Report Service
// File: crates/tala-core/src/services/report_service.rs
// ============================================================================
//! Dashboard aggregates and report exports

use std::sync::Arc;

use chrono::Utc;
use handlebars::Handlebars;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use tala_shared::types::Pagination;

use crate::domain::{CompletionFunnelRow, DashboardSummary, Report, ReportFormat, ReportType};
use crate::error::DomainError;
use crate::repositories::ReportRepository;

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{{title}}</title></head>
<body>
<h1>{{title}}</h1>
<p>Generated {{generated_at}}</p>
{{#if summary}}
<ul>
<li>Members: {{summary.total_members}}</li>
<li>Assessments: {{summary.completed_assessments}} of {{summary.total_assessments}} completed ({{summary.assessment_completion_rate}}%)</li>
<li>Development plans: {{summary.active_pdi_plans}} active of {{summary.total_pdi_plans}}</li>
<li>Open jobs: {{summary.open_jobs}}</li>
</ul>
{{/if}}
{{#if funnel}}
<table border="1">
<tr><th>Assessment</th><th>Invited</th><th>In progress</th><th>Completed</th><th>Expired</th><th>Rate</th></tr>
{{#each funnel}}
<tr><td>{{assessment_name}}</td><td>{{invited}}</td><td>{{in_progress}}</td><td>{{completed}}</td><td>{{expired}}</td><td>{{completion_rate}}%</td></tr>
{{/each}}
</table>
{{/if}}
</body>
</html>
"#;

pub struct ReportService<S: ReportRepository> {
    report_repo: Arc<S>,
    renderer: Handlebars<'static>,
}

impl<S: ReportRepository> ReportService<S> {
    pub fn new(report_repo: Arc<S>) -> Self {
        Self {
            report_repo,
            renderer: Handlebars::new(),
        }
    }

    // ------------------------------------------------------------------
    // Dashboard aggregates
    // ------------------------------------------------------------------

    pub async fn dashboard(
        &self,
        organization_id: &Uuid,
    ) -> Result<DashboardSummary, DomainError> {
        self.report_repo.dashboard_summary(organization_id).await
    }

    pub async fn completion_funnel(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<CompletionFunnelRow>, DomainError> {
        self.report_repo.completion_funnel(organization_id).await
    }

    // ------------------------------------------------------------------
    // Exports
    // ------------------------------------------------------------------

    pub async fn get_report(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Report, DomainError> {
        self.report_repo
            .find_report(organization_id, id)
            .await?
            .ok_or(DomainError::ReportNotFound)
    }

    pub async fn list_reports(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Report>, DomainError> {
        self.report_repo
            .list_reports(organization_id, pagination.clamped())
            .await
    }

    /// Creates the export row and renders it in place. PDF requests are
    /// persisted as FAILED so the row records why nothing was produced.
    pub async fn generate(
        &self,
        organization_id: &Uuid,
        title: &str,
        report_type: ReportType,
        format: ReportFormat,
        generated_by: Option<Uuid>,
    ) -> Result<Report, DomainError> {
        let report = Report::new(
            *organization_id,
            title.to_string(),
            report_type,
            format,
            generated_by,
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let mut report = self.report_repo.create_report(&report).await?;

        if format == ReportFormat::Pdf {
            report.mark_failed("PDF output is not supported".to_string());
            self.report_repo.update_report(&report).await?;
            return Err(DomainError::ReportFormatUnsupported(
                format.as_str().to_string(),
            ));
        }

        match self.build(&report).await {
            Ok((content, data)) => {
                report.mark_completed(content, data);
                let report = self.report_repo.update_report(&report).await?;
                info!(
                    "Report {} generated ({} as {})",
                    report.id,
                    report.report_type.as_str(),
                    report.format.as_str()
                );
                Ok(report)
            }
            Err(e) => {
                report.mark_failed(e.to_string());
                if let Err(update_err) = self.report_repo.update_report(&report).await {
                    warn!("Failed to persist report failure: {}", update_err);
                }
                Err(e)
            }
        }
    }

    /// Assembles the data payload for the report type and renders it in
    /// the requested format.
    async fn build(&self, report: &Report) -> Result<(String, Value), DomainError> {
        let data = match report.report_type {
            ReportType::AssessmentSummary => {
                let funnel = self
                    .report_repo
                    .completion_funnel(&report.organization_id)
                    .await?;
                json!({ "funnel": funnel })
            }
            ReportType::OrganizationOverview => {
                let summary = self
                    .report_repo
                    .dashboard_summary(&report.organization_id)
                    .await?;
                let funnel = self
                    .report_repo
                    .completion_funnel(&report.organization_id)
                    .await?;
                json!({ "summary": summary, "funnel": funnel })
            }
            _ => {
                let summary = self
                    .report_repo
                    .dashboard_summary(&report.organization_id)
                    .await?;
                json!({ "summary": summary })
            }
        };

        let content = match report.format {
            ReportFormat::Json => serde_json::to_string_pretty(&data)
                .map_err(|e| DomainError::InternalError(e.to_string()))?,
            ReportFormat::Html => {
                let mut context = data.clone();
                context["title"] = Value::String(report.title.clone());
                context["generated_at"] = Value::String(Utc::now().to_rfc3339());
                self.renderer
                    .render_template(HTML_TEMPLATE, &context)
                    .map_err(|e| DomainError::TemplateRenderError(e.to_string()))?
            }
            ReportFormat::Csv => Self::to_csv(&data),
            // Rejected before rendering
            ReportFormat::Pdf => {
                return Err(DomainError::ReportFormatUnsupported(
                    report.format.as_str().to_string(),
                ))
            }
        };
        Ok((content, data))
    }

    /// Funnel rows become one CSV line per definition; summary payloads
    /// flatten to metric,value pairs.
    fn to_csv(data: &Value) -> String {
        let mut lines = Vec::new();
        if let Some(funnel) = data.get("funnel").and_then(Value::as_array) {
            lines.push(
                "assessment,invited,in_progress,completed,expired,completion_rate".to_string(),
            );
            for row in funnel {
                lines.push(format!(
                    "{},{},{},{},{},{}",
                    row.get("assessment_name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .replace(',', " "),
                    row.get("invited").and_then(Value::as_i64).unwrap_or(0),
                    row.get("in_progress").and_then(Value::as_i64).unwrap_or(0),
                    row.get("completed").and_then(Value::as_i64).unwrap_or(0),
                    row.get("expired").and_then(Value::as_i64).unwrap_or(0),
                    row.get("completion_rate")
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0),
                ));
            }
        } else if let Some(summary) = data.get("summary").and_then(Value::as_object) {
            lines.push("metric,value".to_string());
            for (key, value) in summary {
                lines.push(format!("{},{}", key, value));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReportStatus;
    use crate::repositories::report_repository::MockReportRepository;

    fn funnel_row(name: &str) -> CompletionFunnelRow {
        CompletionFunnelRow {
            assessment_id: Uuid::new_v4(),
            assessment_name: name.to_string(),
            invited: 10,
            in_progress: 2,
            completed: 6,
            expired: 1,
            completion_rate: 60.0,
        }
    }

    #[tokio::test]
    async fn test_generate_json_report_completes() {
        let mut repo = MockReportRepository::new();
        repo.expect_create_report().returning(|r| Ok(r.clone()));
        repo.expect_dashboard_summary().returning(|_| {
            Ok(DashboardSummary {
                total_members: 12,
                total_assessments: 30,
                completed_assessments: 18,
                assessment_completion_rate: 60.0,
                total_pdi_plans: 5,
                active_pdi_plans: 3,
                open_jobs: 2,
            })
        });
        repo.expect_update_report()
            .withf(|r| {
                r.status == ReportStatus::Completed
                    && r.content.contains("\"total_members\": 12")
                    && r.generation_completed_at.is_some()
            })
            .returning(|r| Ok(r.clone()));

        let service = ReportService::new(Arc::new(repo));
        let report = service
            .generate(
                &Uuid::new_v4(),
                "Team overview",
                ReportType::TeamPerformance,
                ReportFormat::Json,
                None,
            )
            .await
            .unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
    }

    #[tokio::test]
    async fn test_generate_html_renders_funnel_table() {
        let mut repo = MockReportRepository::new();
        repo.expect_create_report().returning(|r| Ok(r.clone()));
        repo.expect_completion_funnel()
            .returning(|_| Ok(vec![funnel_row("Big Five")]));
        repo.expect_update_report()
            .withf(|r| {
                r.status == ReportStatus::Completed
                    && r.content.contains("<td>Big Five</td>")
                    && r.content.contains("Quarterly funnel")
            })
            .returning(|r| Ok(r.clone()));

        let service = ReportService::new(Arc::new(repo));
        let report = service
            .generate(
                &Uuid::new_v4(),
                "Quarterly funnel",
                ReportType::AssessmentSummary,
                ReportFormat::Html,
                None,
            )
            .await
            .unwrap();
        assert!(report.content.contains("<table"));
    }

    #[tokio::test]
    async fn test_pdf_recorded_as_unsupported() {
        let mut repo = MockReportRepository::new();
        repo.expect_create_report().returning(|r| Ok(r.clone()));
        repo.expect_update_report()
            .withf(|r| {
                r.status == ReportStatus::Failed
                    && r.generation_error.contains("not supported")
            })
            .returning(|r| Ok(r.clone()));

        let service = ReportService::new(Arc::new(repo));
        let err = service
            .generate(
                &Uuid::new_v4(),
                "Print me",
                ReportType::OrganizationOverview,
                ReportFormat::Pdf,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ReportFormatUnsupported(_)));
    }

    #[tokio::test]
    async fn test_failed_aggregate_marks_report_failed() {
        let mut repo = MockReportRepository::new();
        repo.expect_create_report().returning(|r| Ok(r.clone()));
        repo.expect_dashboard_summary()
            .returning(|_| Err(DomainError::DatabaseError("relation missing".into())));
        repo.expect_update_report()
            .withf(|r| r.status == ReportStatus::Failed && !r.generation_error.is_empty())
            .returning(|r| Ok(r.clone()));

        let service = ReportService::new(Arc::new(repo));
        let err = service
            .generate(
                &Uuid::new_v4(),
                "Broken",
                ReportType::UsageAnalytics,
                ReportFormat::Csv,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }

    #[test]
    fn test_csv_flattens_funnel() {
        let data = json!({ "funnel": [funnel_row("DISC, v2")] });
        let csv = ReportService::<MockReportRepository>::to_csv(&data);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("assessment,invited,in_progress,completed,expired,completion_rate")
        );
        // Commas inside names cannot break the row layout.
        assert_eq!(lines.next(), Some("DISC  v2,10,2,6,1,60"));
    }
}

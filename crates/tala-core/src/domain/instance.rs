// ============================================================================
// Tala Core - Assessment Instance Entities
// File: crates/tala-core/src/domain/instance.rs
// Description: Assessment runs, per-question responses and score profiles
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Instance lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Invited,
    Started,
    InProgress,
    Completed,
    Expired,
    Cancelled,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Invited => "INVITED",
            InstanceStatus::Started => "STARTED",
            InstanceStatus::InProgress => "IN_PROGRESS",
            InstanceStatus::Completed => "COMPLETED",
            InstanceStatus::Expired => "EXPIRED",
            InstanceStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "INVITED" => Some(InstanceStatus::Invited),
            "STARTED" => Some(InstanceStatus::Started),
            "IN_PROGRESS" => Some(InstanceStatus::InProgress),
            "COMPLETED" => Some(InstanceStatus::Completed),
            "EXPIRED" => Some(InstanceStatus::Expired),
            "CANCELLED" => Some(InstanceStatus::Cancelled),
            _ => None,
        }
    }

    /// Open instances still accept answers.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            InstanceStatus::Invited | InstanceStatus::Started | InstanceStatus::InProgress
        )
    }
}

/// One run of an assessment by one user, reached through an unguessable
/// access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentInstance {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub assessment_id: Uuid,
    pub user_id: Uuid,
    pub status: InstanceStatus,

    pub token: String,
    pub invited_by: Option<Uuid>,

    pub current_question: i32,
    pub progress_percentage: f64,

    pub invited_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,

    // Snapshot of the calculated scores, mirrored on the score profile
    pub raw_scores: BTreeMap<String, f64>,
    pub percentile_scores: BTreeMap<String, f64>,
}

impl AssessmentInstance {
    pub fn new(
        organization_id: Uuid,
        assessment_id: Uuid,
        user_id: Uuid,
        token: String,
        invited_by: Option<Uuid>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            assessment_id,
            user_id,
            status: InstanceStatus::Invited,
            token,
            invited_by,
            current_question: 0,
            progress_percentage: 0.0,
            invited_at: Utc::now(),
            started_at: None,
            completed_at: None,
            expires_at,
            raw_scores: BTreeMap::new(),
            percentile_scores: BTreeMap::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == InstanceStatus::Completed
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }

    /// First access moves an invited instance to STARTED.
    pub fn mark_started(&mut self) {
        if self.status == InstanceStatus::Invited {
            self.status = InstanceStatus::Started;
            self.started_at = Some(Utc::now());
        }
    }

    pub fn mark_in_progress(&mut self) {
        self.status = InstanceStatus::InProgress;
    }

    pub fn mark_expired(&mut self) {
        self.status = InstanceStatus::Expired;
    }

    pub fn cancel(&mut self) {
        self.status = InstanceStatus::Cancelled;
    }

    pub fn complete(
        &mut self,
        raw_scores: BTreeMap<String, f64>,
        percentile_scores: BTreeMap<String, f64>,
    ) {
        self.status = InstanceStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.progress_percentage = 100.0;
        self.raw_scores = raw_scores;
        self.percentile_scores = percentile_scores;
    }

    pub fn update_progress(&mut self, answered: usize, total: usize) {
        self.progress_percentage = if total == 0 {
            0.0
        } else {
            (answered as f64 / total as f64) * 100.0
        };
    }
}

/// Answer to one question. `(instance_id, question_id)` is unique; a
/// re-submission overwrites the previous answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub question_id: Uuid,

    pub numeric_value: Option<i32>,
    pub text_value: String,
    pub selected_option_id: Option<Uuid>,

    pub answered_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Response {
    pub fn new(
        instance_id: Uuid,
        question_id: Uuid,
        numeric_value: Option<i32>,
        text_value: String,
        selected_option_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instance_id,
            question_id,
            numeric_value,
            text_value,
            selected_option_id,
            answered_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn overwrite(
        &mut self,
        numeric_value: Option<i32>,
        text_value: String,
        selected_option_id: Option<Uuid>,
    ) {
        self.numeric_value = numeric_value;
        self.text_value = text_value;
        self.selected_option_id = selected_option_id;
        self.modified_at = Some(Utc::now());
    }
}

/// Calculated dimension scores for a completed instance, one per instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreProfile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub instance_id: Uuid,

    pub dimension_scores: BTreeMap<String, f64>,
    pub percentile_scores: BTreeMap<String, f64>,

    pub profile_type: String,
    pub strengths: Vec<String>,
    pub development_areas: Vec<String>,
    pub recommendations: Vec<String>,

    pub calculated_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl ScoreProfile {
    pub fn new(
        organization_id: Uuid,
        instance_id: Uuid,
        dimension_scores: BTreeMap<String, f64>,
        percentile_scores: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            instance_id,
            dimension_scores,
            percentile_scores,
            profile_type: String::new(),
            strengths: Vec::new(),
            development_areas: Vec::new(),
            recommendations: Vec::new(),
            calculated_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn dimension_score(&self, dimension: &str) -> f64 {
        self.dimension_scores.get(dimension).copied().unwrap_or(0.0)
    }

    /// Missing dimensions read as the 50th percentile.
    pub fn percentile_score(&self, dimension: &str) -> f64 {
        self.percentile_scores
            .get(dimension)
            .copied()
            .unwrap_or(50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn instance() -> AssessmentInstance {
        AssessmentInstance::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "tok".into(),
            None,
            None,
        )
    }

    #[test]
    fn test_starts_invited() {
        let instance = instance();
        assert_eq!(instance.status, InstanceStatus::Invited);
        assert!(instance.status.is_open());
        assert!(!instance.is_expired());
    }

    #[test]
    fn test_mark_started_only_from_invited() {
        let mut instance = instance();
        instance.mark_started();
        assert_eq!(instance.status, InstanceStatus::Started);
        let started_at = instance.started_at;
        assert!(started_at.is_some());

        instance.mark_in_progress();
        instance.mark_started();
        assert_eq!(instance.status, InstanceStatus::InProgress);
        assert_eq!(instance.started_at, started_at);
    }

    #[test]
    fn test_expiry_window() {
        let mut instance = instance();
        instance.expires_at = Some(Utc::now() - Duration::minutes(1));
        assert!(instance.is_expired());
        instance.expires_at = Some(Utc::now() + Duration::minutes(1));
        assert!(!instance.is_expired());
    }

    #[test]
    fn test_complete_snapshots_scores() {
        let mut instance = instance();
        let mut dims = BTreeMap::new();
        dims.insert("openness".to_string(), 4.2);
        let mut pct = BTreeMap::new();
        pct.insert("openness".to_string(), 60.0);
        instance.complete(dims, pct);
        assert!(instance.is_completed());
        assert!(!instance.status.is_open());
        assert_eq!(instance.progress_percentage, 100.0);
        assert_eq!(instance.raw_scores.get("openness"), Some(&4.2));
    }

    #[test]
    fn test_progress_with_no_questions() {
        let mut instance = instance();
        instance.update_progress(0, 0);
        assert_eq!(instance.progress_percentage, 0.0);
        instance.update_progress(3, 12);
        assert_eq!(instance.progress_percentage, 25.0);
    }

    #[test]
    fn test_profile_fallback_scores() {
        let profile = ScoreProfile::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            BTreeMap::new(),
            BTreeMap::new(),
        );
        assert_eq!(profile.dimension_score("openness"), 0.0);
        assert_eq!(profile.percentile_score("openness"), 50.0);
    }
}

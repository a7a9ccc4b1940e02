// ============================================================================
// Tala Core - PDI Entities
// File: crates/tala-core/src/domain/pdi.rs
// Description: Individual development plans, SMART tasks and templates
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::assessment::Framework;
use super::instance::{AssessmentInstance, ScoreProfile};

/// Plan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Draft,
    PendingApproval,
    Approved,
    InProgress,
    Completed,
    Cancelled,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Draft => "DRAFT",
            PlanStatus::PendingApproval => "PENDING_APPROVAL",
            PlanStatus::Approved => "APPROVED",
            PlanStatus::InProgress => "IN_PROGRESS",
            PlanStatus::Completed => "COMPLETED",
            PlanStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(PlanStatus::Draft),
            "PENDING_APPROVAL" => Some(PlanStatus::PendingApproval),
            "APPROVED" => Some(PlanStatus::Approved),
            "IN_PROGRESS" => Some(PlanStatus::InProgress),
            "COMPLETED" => Some(PlanStatus::Completed),
            "CANCELLED" => Some(PlanStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, PlanStatus::Completed | PlanStatus::Cancelled)
    }
}

/// Plan priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl PlanPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanPriority::Low => "LOW",
            PlanPriority::Medium => "MEDIUM",
            PlanPriority::High => "HIGH",
            PlanPriority::Critical => "CRITICAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(PlanPriority::Low),
            "MEDIUM" => Some(PlanPriority::Medium),
            "HIGH" => Some(PlanPriority::High),
            "CRITICAL" => Some(PlanPriority::Critical),
            _ => None,
        }
    }
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::OnHold => "ON_HOLD",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NOT_STARTED" => Some(TaskStatus::NotStarted),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            "ON_HOLD" => Some(TaskStatus::OnHold),
            "CANCELLED" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

/// Development task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    TechnicalSkills,
    SoftSkills,
    Leadership,
    Communication,
    CareerDevelopment,
    Performance,
    Knowledge,
    Certification,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::TechnicalSkills => "TECHNICAL_SKILLS",
            TaskCategory::SoftSkills => "SOFT_SKILLS",
            TaskCategory::Leadership => "LEADERSHIP",
            TaskCategory::Communication => "COMMUNICATION",
            TaskCategory::CareerDevelopment => "CAREER_DEVELOPMENT",
            TaskCategory::Performance => "PERFORMANCE",
            TaskCategory::Knowledge => "KNOWLEDGE",
            TaskCategory::Certification => "CERTIFICATION",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TECHNICAL_SKILLS" => Some(TaskCategory::TechnicalSkills),
            "SOFT_SKILLS" => Some(TaskCategory::SoftSkills),
            "LEADERSHIP" => Some(TaskCategory::Leadership),
            "COMMUNICATION" => Some(TaskCategory::Communication),
            "CAREER_DEVELOPMENT" => Some(TaskCategory::CareerDevelopment),
            "PERFORMANCE" => Some(TaskCategory::Performance),
            "KNOWLEDGE" => Some(TaskCategory::Knowledge),
            "CERTIFICATION" => Some(TaskCategory::Certification),
            _ => None,
        }
    }
}

impl Default for TaskCategory {
    fn default() -> Self {
        TaskCategory::Performance
    }
}

/// Individual development plan, tenant scoped.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PdiPlan {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub employee_id: Uuid,
    pub manager_id: Option<Uuid>,
    pub hr_contact_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,
    pub status: PlanStatus,
    pub priority: PlanPriority,

    pub source_assessment_id: Option<Uuid>,

    pub start_date: NaiveDate,
    pub target_completion_date: NaiveDate,
    pub actual_completion_date: Option<NaiveDate>,

    pub overall_progress: f64,
    pub last_review_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,

    // Approval trail
    pub submitted_for_approval_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: String,

    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl PdiPlan {
    pub fn new(
        organization_id: Uuid,
        employee_id: Uuid,
        title: String,
        start_date: NaiveDate,
        target_completion_date: NaiveDate,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let plan = Self {
            id: Uuid::new_v4(),
            organization_id,
            employee_id,
            manager_id: None,
            hr_contact_id: None,
            title,
            description: String::new(),
            status: PlanStatus::Draft,
            priority: PlanPriority::Medium,
            source_assessment_id: None,
            start_date,
            target_completion_date,
            actual_completion_date: None,
            overall_progress: 0.0,
            last_review_date: None,
            next_review_date: None,
            submitted_for_approval_at: None,
            approved_by: None,
            approved_at: None,
            approval_notes: String::new(),
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            removed_at: None,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, PlanStatus::Approved | PlanStatus::InProgress)
    }

    pub fn is_overdue(&self) -> bool {
        self.target_completion_date < Utc::now().date_naive() && !self.status.is_closed()
    }

    pub fn days_remaining(&self) -> i64 {
        if self.status.is_closed() {
            return 0;
        }
        let delta = self.target_completion_date - Utc::now().date_naive();
        delta.num_days().max(0)
    }

    pub fn submit_for_approval(&mut self) {
        self.status = PlanStatus::PendingApproval;
        self.submitted_for_approval_at = Some(Utc::now());
        self.modified_at = Some(Utc::now());
    }

    pub fn approve(&mut self, approved_by: Uuid, notes: String) {
        self.status = PlanStatus::Approved;
        self.approved_by = Some(approved_by);
        self.approved_at = Some(Utc::now());
        self.approval_notes = notes;
        self.modified_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = PlanStatus::Completed;
        self.actual_completion_date = Some(Utc::now().date_naive());
        self.overall_progress = 100.0;
        self.modified_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.status = PlanStatus::Cancelled;
        self.modified_at = Some(Utc::now());
    }

    /// Weighted progress over active tasks; 0 when there are no active
    /// tasks or all weights are zero.
    pub fn recompute_progress(&mut self, tasks: &[PdiTask]) {
        let active: Vec<&PdiTask> = tasks.iter().filter(|t| t.is_active).collect();
        if active.is_empty() {
            self.overall_progress = 0.0;
            return;
        }

        let total_weight: f64 = active.iter().map(|t| t.weight).sum();
        if total_weight == 0.0 {
            self.overall_progress = 0.0;
            return;
        }

        let weighted: f64 = active
            .iter()
            .map(|t| (t.progress_percentage / 100.0) * t.weight)
            .sum();
        self.overall_progress = (weighted / total_weight) * 100.0;
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
    }
}

/// SMART goal within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PdiTask {
    pub id: Uuid,
    pub plan_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,
    pub specific_objective: String,
    pub measurable_criteria: String,
    pub achievable_steps: String,
    pub relevant_justification: String,
    pub time_bound_deadline: NaiveDate,

    pub category: TaskCategory,
    pub competency_area: String,

    pub status: TaskStatus,
    pub progress_percentage: f64,
    pub weight: f64,

    pub required_resources: String,
    pub assigned_mentor: Option<Uuid>,
    pub estimated_hours: i32,
    pub actual_hours: i32,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_update_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl PdiTask {
    pub fn new(
        plan_id: Uuid,
        title: String,
        description: String,
        category: TaskCategory,
        time_bound_deadline: NaiveDate,
    ) -> Result<Self, validator::ValidationErrors> {
        let task = Self {
            id: Uuid::new_v4(),
            plan_id,
            title,
            description,
            specific_objective: String::new(),
            measurable_criteria: String::new(),
            achievable_steps: String::new(),
            relevant_justification: String::new(),
            time_bound_deadline,
            category,
            competency_area: String::new(),
            status: TaskStatus::NotStarted,
            progress_percentage: 0.0,
            weight: 1.0,
            required_resources: String::new(),
            assigned_mentor: None,
            estimated_hours: 0,
            actual_hours: 0,
            started_at: None,
            completed_at: None,
            last_update_at: None,
            is_active: true,
            created_at: Utc::now(),
            modified_at: None,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn is_overdue(&self) -> bool {
        self.time_bound_deadline < Utc::now().date_naive()
            && !matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    pub fn days_remaining(&self) -> i64 {
        if matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled) {
            return 0;
        }
        (self.time_bound_deadline - Utc::now().date_naive())
            .num_days()
            .max(0)
    }

    pub fn mark_completed(&mut self) {
        self.status = TaskStatus::Completed;
        self.progress_percentage = 100.0;
        self.completed_at = Some(Utc::now());
        self.modified_at = Some(Utc::now());
    }

    /// Clamps to [0, 100]. Crossing 100 completes the task; the first
    /// nonzero progress starts it.
    pub fn apply_progress(&mut self, percentage: f64) {
        self.progress_percentage = percentage.clamp(0.0, 100.0);
        self.last_update_at = Some(Utc::now());

        if percentage >= 100.0 && self.status != TaskStatus::Completed {
            self.mark_completed();
        } else if percentage > 0.0 && self.status == TaskStatus::NotStarted {
            self.status = TaskStatus::InProgress;
            self.started_at = Some(Utc::now());
        }
        self.modified_at = Some(Utc::now());
    }
}

/// Append-only progress history entry. Records the percentage as
/// submitted, before clamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdiProgressUpdate {
    pub id: Uuid,
    pub task_id: Uuid,
    pub progress_percentage: f64,
    pub notes: String,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PdiProgressUpdate {
    pub fn new(task_id: Uuid, progress_percentage: f64, notes: String, updated_by: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            progress_percentage,
            notes,
            updated_by,
            created_at: Utc::now(),
        }
    }
}

/// Score window a template task requires before it is instantiated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreCondition {
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
}

/// One task blueprint inside a template's `template_tasks` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateTask {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub specific_objective: String,
    #[serde(default)]
    pub measurable_criteria: String,
    #[serde(default)]
    pub achievable_steps: String,
    #[serde(default)]
    pub relevant_justification: String,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub competency_area: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub estimated_hours: i32,
    #[serde(default)]
    pub conditions: BTreeMap<String, ScoreCondition>,
}

fn default_weight() -> f64 {
    1.0
}

/// Template that turns assessment results into a development plan.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PdiTemplate {
    pub id: Uuid,
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: String,
    pub framework: Framework,

    pub auto_generate: bool,
    pub requires_approval: bool,
    pub default_duration_days: i32,

    pub template_tasks: Vec<TemplateTask>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl PdiTemplate {
    pub fn new(
        organization_id: Uuid,
        name: String,
        framework: Framework,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let template = Self {
            id: Uuid::new_v4(),
            organization_id,
            name,
            description: String::new(),
            framework,
            auto_generate: true,
            requires_approval: true,
            default_duration_days: 90,
            template_tasks: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
        };
        template.validate()?;
        Ok(template)
    }

    /// Builds a plan plus the template tasks whose conditions hold for the
    /// given score profile. Task deadlines inherit the plan target date.
    pub fn generate_plan(
        &self,
        instance: &AssessmentInstance,
        definition_name: &str,
        profile: &ScoreProfile,
    ) -> Result<(PdiPlan, Vec<PdiTask>), validator::ValidationErrors> {
        let start = Utc::now().date_naive();
        let target = start + Duration::days(i64::from(self.default_duration_days));

        let mut plan = PdiPlan::new(
            instance.organization_id,
            instance.user_id,
            format!("Development Plan - {definition_name}"),
            start,
            target,
            instance.invited_by,
        )?;
        plan.description = format!("Auto-generated from {definition_name} results");
        plan.source_assessment_id = Some(instance.id);
        plan.status = if self.requires_approval {
            PlanStatus::PendingApproval
        } else {
            PlanStatus::Approved
        };

        let mut tasks = Vec::new();
        for blueprint in &self.template_tasks {
            if !conditions_hold(&blueprint.conditions, &profile.dimension_scores) {
                continue;
            }
            let mut task = PdiTask::new(
                plan.id,
                blueprint.title.clone(),
                blueprint.description.clone(),
                blueprint.category,
                target,
            )?;
            task.specific_objective = blueprint.specific_objective.clone();
            task.measurable_criteria = blueprint.measurable_criteria.clone();
            task.achievable_steps = blueprint.achievable_steps.clone();
            task.relevant_justification = blueprint.relevant_justification.clone();
            task.competency_area = blueprint.competency_area.clone();
            task.weight = blueprint.weight;
            task.estimated_hours = blueprint.estimated_hours;
            tasks.push(task);
        }

        Ok((plan, tasks))
    }
}

/// A condition fails iff the dimension score is below `min_score` or above
/// `max_score`. Missing dimensions score 0; no conditions means generate.
pub fn conditions_hold(
    conditions: &BTreeMap<String, ScoreCondition>,
    dimension_scores: &BTreeMap<String, f64>,
) -> bool {
    for (dimension, rule) in conditions {
        let score = dimension_scores.get(dimension).copied().unwrap_or(0.0);
        if rule.min_score.is_some_and(|min| score < min) {
            return false;
        }
        if rule.max_score.is_some_and(|max| score > max) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> PdiPlan {
        let today = Utc::now().date_naive();
        PdiPlan::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Q3 growth".into(),
            today,
            today + Duration::days(90),
            None,
        )
        .unwrap()
    }

    fn task(plan_id: Uuid, weight: f64, progress: f64) -> PdiTask {
        let mut task = PdiTask::new(
            plan_id,
            "Read the handbook".into(),
            String::new(),
            TaskCategory::Knowledge,
            Utc::now().date_naive() + Duration::days(30),
        )
        .unwrap();
        task.weight = weight;
        task.progress_percentage = progress;
        task
    }

    #[test]
    fn test_plan_progress_weighted() {
        let mut plan = plan();
        let tasks = vec![task(plan.id, 1.0, 100.0), task(plan.id, 3.0, 0.0)];
        plan.recompute_progress(&tasks);
        assert_eq!(plan.overall_progress, 25.0);
    }

    #[test]
    fn test_plan_progress_without_tasks() {
        let mut plan = plan();
        plan.recompute_progress(&[]);
        assert_eq!(plan.overall_progress, 0.0);

        let zero_weight = vec![task(plan.id, 0.0, 80.0)];
        plan.recompute_progress(&zero_weight);
        assert_eq!(plan.overall_progress, 0.0);
    }

    #[test]
    fn test_plan_progress_skips_inactive_tasks() {
        let mut plan = plan();
        let mut inactive = task(plan.id, 5.0, 100.0);
        inactive.is_active = false;
        let tasks = vec![inactive, task(plan.id, 1.0, 50.0)];
        plan.recompute_progress(&tasks);
        assert_eq!(plan.overall_progress, 50.0);
    }

    #[test]
    fn test_task_progress_clamps_and_completes() {
        let mut task = task(Uuid::new_v4(), 1.0, 0.0);
        task.apply_progress(150.0);
        assert_eq!(task.progress_percentage, 100.0);
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn test_first_progress_starts_task() {
        let mut task = task(Uuid::new_v4(), 1.0, 0.0);
        assert_eq!(task.status, TaskStatus::NotStarted);
        task.apply_progress(10.0);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.started_at.is_some());

        // Going back to zero keeps the task started
        task.apply_progress(-5.0);
        assert_eq!(task.progress_percentage, 0.0);
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_approval_flow() {
        let mut plan = plan();
        plan.submit_for_approval();
        assert_eq!(plan.status, PlanStatus::PendingApproval);
        assert!(plan.submitted_for_approval_at.is_some());

        let approver = Uuid::new_v4();
        plan.approve(approver, "looks good".into());
        assert_eq!(plan.status, PlanStatus::Approved);
        assert_eq!(plan.approved_by, Some(approver));
        assert!(plan.is_active());
    }

    #[test]
    fn test_conditions_missing_dimension_scores_zero() {
        let mut conditions = BTreeMap::new();
        conditions.insert(
            "openness".to_string(),
            ScoreCondition {
                min_score: Some(1.0),
                max_score: None,
            },
        );
        assert!(!conditions_hold(&conditions, &BTreeMap::new()));
    }

    #[test]
    fn test_conditions_window() {
        let mut conditions = BTreeMap::new();
        conditions.insert(
            "rigor".to_string(),
            ScoreCondition {
                min_score: Some(2.0),
                max_score: Some(4.0),
            },
        );
        let mut scores = BTreeMap::new();
        scores.insert("rigor".to_string(), 3.0);
        assert!(conditions_hold(&conditions, &scores));
        scores.insert("rigor".to_string(), 4.5);
        assert!(!conditions_hold(&conditions, &scores));
        scores.insert("rigor".to_string(), 1.0);
        assert!(!conditions_hold(&conditions, &scores));
    }

    #[test]
    fn test_empty_conditions_always_generate() {
        assert!(conditions_hold(&BTreeMap::new(), &BTreeMap::new()));
    }

    #[test]
    fn test_generate_plan_filters_tasks() {
        let org = Uuid::new_v4();
        let mut template =
            PdiTemplate::new(org, "Big Five follow-up".into(), Framework::BigFive, None).unwrap();
        template.requires_approval = false;
        template.template_tasks = vec![
            TemplateTask {
                title: "Public speaking course".into(),
                description: "Practice presentations".into(),
                specific_objective: String::new(),
                measurable_criteria: String::new(),
                achievable_steps: String::new(),
                relevant_justification: String::new(),
                category: TaskCategory::Communication,
                competency_area: "extraversion".into(),
                weight: 2.0,
                estimated_hours: 10,
                conditions: {
                    let mut c = BTreeMap::new();
                    c.insert(
                        "extraversion".to_string(),
                        ScoreCondition {
                            min_score: None,
                            max_score: Some(3.0),
                        },
                    );
                    c
                },
            },
            TemplateTask {
                title: "Mentoring".into(),
                description: "Mentor a junior".into(),
                specific_objective: String::new(),
                measurable_criteria: String::new(),
                achievable_steps: String::new(),
                relevant_justification: String::new(),
                category: TaskCategory::Leadership,
                competency_area: String::new(),
                weight: 1.0,
                estimated_hours: 0,
                conditions: {
                    let mut c = BTreeMap::new();
                    c.insert(
                        "extraversion".to_string(),
                        ScoreCondition {
                            min_score: Some(4.0),
                            max_score: None,
                        },
                    );
                    c
                },
            },
        ];

        let instance = AssessmentInstance::new(
            org,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "tok".into(),
            Some(Uuid::new_v4()),
            None,
        );
        let mut scores = BTreeMap::new();
        scores.insert("extraversion".to_string(), 2.0);
        let profile = ScoreProfile::new(org, instance.id, scores, BTreeMap::new());

        let (plan, tasks) = template.generate_plan(&instance, "Big Five", &profile).unwrap();
        assert_eq!(plan.status, PlanStatus::Approved);
        assert_eq!(plan.title, "Development Plan - Big Five");
        assert_eq!(plan.source_assessment_id, Some(instance.id));
        assert_eq!(plan.employee_id, instance.user_id);
        assert_eq!(
            plan.target_completion_date,
            plan.start_date + Duration::days(90)
        );
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Public speaking course");
        assert_eq!(tasks[0].time_bound_deadline, plan.target_completion_date);
        assert_eq!(tasks[0].weight, 2.0);
    }

    #[test]
    fn test_template_task_json_defaults() {
        let raw = r#"{"title": "Read", "description": "Read a book"}"#;
        let parsed: TemplateTask = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.category, TaskCategory::Performance);
        assert_eq!(parsed.weight, 1.0);
        assert_eq!(parsed.estimated_hours, 0);
        assert!(parsed.conditions.is_empty());
    }
}

//! Assessment repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AssessmentDefinition, AssessmentInstance, Question, QuestionOption, Response, ScoreProfile,
};
use crate::error::DomainError;
use tala_shared::types::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    // Definitions
    async fn find_definition(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<AssessmentDefinition>, DomainError>;
    async fn list_definitions(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<AssessmentDefinition>, DomainError>;
    async fn create_definition(
        &self,
        definition: &AssessmentDefinition,
    ) -> Result<AssessmentDefinition, DomainError>;
    async fn update_definition(
        &self,
        definition: &AssessmentDefinition,
    ) -> Result<AssessmentDefinition, DomainError>;

    // Questions and options
    async fn find_question(
        &self,
        assessment_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Question>, DomainError>;
    /// Active questions in display order.
    async fn list_questions(&self, assessment_id: &Uuid) -> Result<Vec<Question>, DomainError>;
    async fn create_question(&self, question: &Question) -> Result<Question, DomainError>;
    async fn update_question(&self, question: &Question) -> Result<Question, DomainError>;
    async fn list_options(&self, question_id: &Uuid) -> Result<Vec<QuestionOption>, DomainError>;
    async fn create_option(&self, option: &QuestionOption)
        -> Result<QuestionOption, DomainError>;

    // Instances
    async fn find_instance(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<AssessmentInstance>, DomainError>;
    async fn find_instance_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AssessmentInstance>, DomainError>;
    /// Open (invited/started/in-progress) instance of this assessment for
    /// the user, if any.
    async fn find_open_instance_for_user(
        &self,
        assessment_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<AssessmentInstance>, DomainError>;
    async fn list_instances(
        &self,
        organization_id: &Uuid,
        assessment_id: Option<Uuid>,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Vec<AssessmentInstance>, DomainError>;
    async fn create_instance(
        &self,
        instance: &AssessmentInstance,
    ) -> Result<AssessmentInstance, DomainError>;
    async fn update_instance(
        &self,
        instance: &AssessmentInstance,
    ) -> Result<AssessmentInstance, DomainError>;
    /// Flips open instances past `expires_at` to EXPIRED; returns how many.
    async fn expire_overdue_instances(&self) -> Result<u64, DomainError>;

    // Responses
    async fn list_responses(&self, instance_id: &Uuid) -> Result<Vec<Response>, DomainError>;
    async fn count_responses(&self, instance_id: &Uuid) -> Result<i64, DomainError>;
    /// Inserts or overwrites the answer for `(instance, question)`.
    async fn upsert_response(&self, response: &Response) -> Result<Response, DomainError>;

    // Score profiles
    async fn find_profile_by_instance(
        &self,
        instance_id: &Uuid,
    ) -> Result<Option<ScoreProfile>, DomainError>;
    /// Persists completion atomically: instance status/scores plus the
    /// score profile row.
    async fn complete_instance(
        &self,
        instance: &AssessmentInstance,
        profile: &ScoreProfile,
    ) -> Result<(), DomainError>;
}

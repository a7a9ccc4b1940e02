// ============================================================================
// Tala Core - Assessment Definition Entities
// File: crates/tala-core/src/domain/assessment.rs
// Description: Assessment frameworks, questions and answer options
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Psychological assessment framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Framework {
    BigFive,
    Disc,
    CareerAnchors,
    Ocean,
    Custom,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::BigFive => "BIG_FIVE",
            Framework::Disc => "DISC",
            Framework::CareerAnchors => "CAREER_ANCHORS",
            Framework::Ocean => "OCEAN",
            Framework::Custom => "CUSTOM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BIG_FIVE" => Some(Framework::BigFive),
            "DISC" => Some(Framework::Disc),
            "CAREER_ANCHORS" => Some(Framework::CareerAnchors),
            "OCEAN" => Some(Framework::Ocean),
            "CUSTOM" => Some(Framework::Custom),
            _ => None,
        }
    }
}

/// Definition lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefinitionStatus {
    Draft,
    Active,
    Archived,
}

impl DefinitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionStatus::Draft => "DRAFT",
            DefinitionStatus::Active => "ACTIVE",
            DefinitionStatus::Archived => "ARCHIVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(DefinitionStatus::Draft),
            "ACTIVE" => Some(DefinitionStatus::Active),
            "ARCHIVED" => Some(DefinitionStatus::Archived),
            _ => None,
        }
    }
}

/// Question response format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    Likert5,
    Likert7,
    MultipleChoice,
    ForcedChoice,
    Ranking,
    Text,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Likert5 => "LIKERT_5",
            QuestionKind::Likert7 => "LIKERT_7",
            QuestionKind::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionKind::ForcedChoice => "FORCED_CHOICE",
            QuestionKind::Ranking => "RANKING",
            QuestionKind::Text => "TEXT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LIKERT_5" => Some(QuestionKind::Likert5),
            "LIKERT_7" => Some(QuestionKind::Likert7),
            "MULTIPLE_CHOICE" => Some(QuestionKind::MultipleChoice),
            "FORCED_CHOICE" => Some(QuestionKind::ForcedChoice),
            "RANKING" => Some(QuestionKind::Ranking),
            "TEXT" => Some(QuestionKind::Text),
            _ => None,
        }
    }

    /// Maximum value on the reverse-scoring scale, when the kind has one.
    pub fn scale_max(&self) -> Option<i32> {
        match self {
            QuestionKind::Likert5 => Some(5),
            QuestionKind::Likert7 => Some(7),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, QuestionKind::Text)
    }
}

/// Assessment definition, tenant scoped. Only ACTIVE definitions accept
/// new invitations.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssessmentDefinition {
    pub id: Uuid,
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: String,
    pub framework: Framework,
    pub version: String,
    pub status: DefinitionStatus,

    // Taker-facing configuration
    pub instructions: String,
    pub estimated_duration: i32,
    pub randomize_questions: bool,
    pub allow_skip: bool,
    pub show_progress: bool,

    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl AssessmentDefinition {
    pub fn new(
        organization_id: Uuid,
        name: String,
        framework: Framework,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let definition = Self {
            id: Uuid::new_v4(),
            organization_id,
            name,
            description: String::new(),
            framework,
            version: "1.0".to_string(),
            status: DefinitionStatus::Draft,
            instructions: String::new(),
            estimated_duration: 15,
            randomize_questions: false,
            allow_skip: false,
            show_progress: true,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            removed_at: None,
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn is_active(&self) -> bool {
        self.status == DefinitionStatus::Active
    }

    pub fn activate(&mut self) {
        self.status = DefinitionStatus::Active;
        self.modified_at = Some(Utc::now());
    }

    pub fn archive(&mut self) {
        self.status = DefinitionStatus::Archived;
        self.modified_at = Some(Utc::now());
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
    }
}

/// Single question within a definition. `dimension` groups questions for
/// scoring; blank falls back to the general dimension.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Question {
    pub id: Uuid,
    pub assessment_id: Uuid,

    #[validate(length(min = 1))]
    pub text: String,
    pub kind: QuestionKind,
    pub order: i32,

    // Scoring
    pub dimension: String,
    pub reverse_scored: bool,
    pub weight: f64,

    pub required: bool,
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(
        assessment_id: Uuid,
        text: String,
        kind: QuestionKind,
        order: i32,
        dimension: String,
    ) -> Result<Self, validator::ValidationErrors> {
        let question = Self {
            id: Uuid::new_v4(),
            assessment_id,
            text,
            kind,
            order,
            dimension,
            reverse_scored: false,
            weight: 1.0,
            required: true,
            is_active: true,
            created_at: Utc::now(),
            modified_at: None,
        };
        question.validate()?;
        Ok(question)
    }
}

/// Answer option for multiple choice questions.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub text: String,
    pub value: i32,
    pub order: i32,
}

impl QuestionOption {
    pub fn new(
        question_id: Uuid,
        text: String,
        value: i32,
        order: i32,
    ) -> Result<Self, validator::ValidationErrors> {
        let option = Self {
            id: Uuid::new_v4(),
            question_id,
            text,
            value,
            order,
        };
        option.validate()?;
        Ok(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_starts_as_draft() {
        let definition = AssessmentDefinition::new(
            Uuid::new_v4(),
            "Big Five".into(),
            Framework::BigFive,
            None,
        )
        .unwrap();
        assert_eq!(definition.status, DefinitionStatus::Draft);
        assert!(!definition.is_active());
        assert_eq!(definition.version, "1.0");
        assert_eq!(definition.estimated_duration, 15);
    }

    #[test]
    fn test_definition_lifecycle() {
        let mut definition = AssessmentDefinition::new(
            Uuid::new_v4(),
            "DISC".into(),
            Framework::Disc,
            None,
        )
        .unwrap();
        definition.activate();
        assert!(definition.is_active());
        definition.archive();
        assert_eq!(definition.status, DefinitionStatus::Archived);
    }

    #[test]
    fn test_question_kind_scale() {
        assert_eq!(QuestionKind::Likert5.scale_max(), Some(5));
        assert_eq!(QuestionKind::Likert7.scale_max(), Some(7));
        assert_eq!(QuestionKind::Text.scale_max(), None);
        assert!(!QuestionKind::Text.is_numeric());
        assert!(QuestionKind::Ranking.is_numeric());
    }

    #[test]
    fn test_question_defaults() {
        let question = Question::new(
            Uuid::new_v4(),
            "I enjoy meeting new people".into(),
            QuestionKind::Likert5,
            1,
            "extraversion".into(),
        )
        .unwrap();
        assert!(!question.reverse_scored);
        assert_eq!(question.weight, 1.0);
        assert!(question.required);
    }
}

// ============================================================================
// Tala Core - Workforce Entities
// File: crates/tala-core/src/domain/workforce.rs
// Description: Departments, positions and employees inside a company tenant
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Employment type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contractor,
    Intern,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FULL_TIME",
            EmploymentType::PartTime => "PART_TIME",
            EmploymentType::Contractor => "CONTRACTOR",
            EmploymentType::Intern => "INTERN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FULL_TIME" => Some(EmploymentType::FullTime),
            "PART_TIME" => Some(EmploymentType::PartTime),
            "CONTRACTOR" => Some(EmploymentType::Contractor),
            "INTERN" => Some(EmploymentType::Intern),
            _ => None,
        }
    }
}

/// Department within a company. `(organization_id, name)` is unique; a
/// department may nest under a parent department.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Department {
    pub id: Uuid,
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: String,
    pub parent_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Department {
    pub fn new(
        organization_id: Uuid,
        name: String,
        description: String,
        parent_id: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let department = Self {
            id: Uuid::new_v4(),
            organization_id,
            name,
            description,
            parent_id,
            manager_id: None,
            is_active: true,
            created_at: Utc::now(),
            modified_at: None,
        };
        department.validate()?;
        Ok(department)
    }

    pub fn assign_manager(&mut self, user_id: Uuid) {
        self.manager_id = Some(user_id);
        self.modified_at = Some(Utc::now());
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
    }
}

/// Job position inside a department. Level runs 1 (entry) to 5 (executive).
/// `(organization_id, department_id, title)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Position {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub department_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,

    #[validate(range(min = 1, max = 5))]
    pub level: i32,
    pub reports_to: Option<Uuid>,

    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub min_experience_years: i32,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn new(
        organization_id: Uuid,
        department_id: Uuid,
        title: String,
        description: String,
        level: i32,
    ) -> Result<Self, validator::ValidationErrors> {
        let position = Self {
            id: Uuid::new_v4(),
            organization_id,
            department_id,
            title,
            description,
            level,
            reports_to: None,
            required_skills: Vec::new(),
            preferred_skills: Vec::new(),
            min_experience_years: 0,
            is_active: true,
            created_at: Utc::now(),
            modified_at: None,
        };
        position.validate()?;
        Ok(position)
    }

    pub fn set_requirements(
        &mut self,
        required_skills: Vec<String>,
        preferred_skills: Vec<String>,
        min_experience_years: i32,
    ) {
        self.required_skills = required_skills;
        self.preferred_skills = preferred_skills;
        self.min_experience_years = min_experience_years;
        self.modified_at = Some(Utc::now());
    }
}

/// Employment record linking a user to a position. `salary` is encrypted at
/// rest by the persistence layer; the entity always holds plaintext.
/// `(organization_id, user_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,

    pub department_id: Uuid,
    pub position_id: Uuid,
    pub employee_number: String,

    pub hire_date: NaiveDate,
    pub termination_date: Option<NaiveDate>,
    pub employment_type: EmploymentType,

    pub manager_id: Option<Uuid>,

    pub salary: String,
    pub currency: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Employee {
    pub fn new(
        organization_id: Uuid,
        user_id: Uuid,
        department_id: Uuid,
        position_id: Uuid,
        hire_date: NaiveDate,
        employment_type: EmploymentType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            department_id,
            position_id,
            employee_number: String::new(),
            hire_date,
            termination_date: None,
            employment_type,
            manager_id: None,
            salary: String::new(),
            currency: "USD".to_string(),
            is_active: true,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn terminate(&mut self, date: NaiveDate) {
        self.termination_date = Some(date);
        self.is_active = false;
        self.modified_at = Some(Utc::now());
    }

    pub fn is_terminated(&self) -> bool {
        self.termination_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_requires_name() {
        let err = Department::new(Uuid::new_v4(), String::new(), String::new(), None);
        assert!(err.is_err());
    }

    #[test]
    fn test_position_level_bounds() {
        let org = Uuid::new_v4();
        let dept = Uuid::new_v4();
        assert!(Position::new(org, dept, "Engineer".into(), String::new(), 0).is_err());
        assert!(Position::new(org, dept, "Engineer".into(), String::new(), 6).is_err());
        let position = Position::new(org, dept, "Engineer".into(), String::new(), 2).unwrap();
        assert!(position.required_skills.is_empty());
    }

    #[test]
    fn test_employee_termination() {
        let mut employee = Employee::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            EmploymentType::FullTime,
        );
        assert!(employee.is_active);
        employee.terminate(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        assert!(employee.is_terminated());
        assert!(!employee.is_active);
    }

    #[test]
    fn test_employment_type_round_trip() {
        assert_eq!(
            EmploymentType::from_str("CONTRACTOR"),
            Some(EmploymentType::Contractor)
        );
        assert_eq!(EmploymentType::FullTime.as_str(), "FULL_TIME");
        assert_eq!(EmploymentType::from_str("TEMP"), None);
    }
}

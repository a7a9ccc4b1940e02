// ============================================================================
// Tala Infrastructure - PostgreSQL Workforce Repository
// File: crates/tala-infrastructure/src/database/postgres/workforce_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{Department, Employee, EmploymentType, Position};
use tala_core::error::DomainError;
use tala_core::repositories::WorkforceRepository;
use tala_security::FieldCipher;
use tala_shared::types::Pagination;

use crate::database::connection::{commit, tenant_tx};

pub struct PgWorkforceRepository {
    pool: PgPool,
    cipher: Arc<FieldCipher>,
}

impl PgWorkforceRepository {
    pub fn new(pool: PgPool, cipher: Arc<FieldCipher>) -> Self {
        Self { pool, cipher }
    }

    fn decrypt(&self, mut employee: Employee) -> Employee {
        employee.salary = self.cipher.decrypt(&employee.salary);
        employee
    }

    fn encrypt(&self, value: &str) -> Result<String, DomainError> {
        self.cipher
            .encrypt(value)
            .map_err(|e| DomainError::InternalError(e.to_string()))
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct DepartmentRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub parent_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Department {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            parent_id: row.parent_id,
            manager_id: row.manager_id,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PositionRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub department_id: Uuid,
    pub title: String,
    pub description: String,
    pub level: i32,
    pub reports_to: Option<Uuid>,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub min_experience_years: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<PositionRow> for Position {
    fn from(row: PositionRow) -> Self {
        Position {
            id: row.id,
            organization_id: row.organization_id,
            department_id: row.department_id,
            title: row.title,
            description: row.description,
            level: row.level,
            reports_to: row.reports_to,
            required_skills: row.required_skills,
            preferred_skills: row.preferred_skills,
            min_experience_years: row.min_experience_years,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct EmployeeRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub position_id: Uuid,
    pub employee_number: String,
    pub hire_date: NaiveDate,
    pub termination_date: Option<NaiveDate>,
    pub employment_type: String,
    pub manager_id: Option<Uuid>,
    pub salary: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            organization_id: row.organization_id,
            user_id: row.user_id,
            department_id: row.department_id,
            position_id: row.position_id,
            employee_number: row.employee_number,
            hire_date: row.hire_date,
            termination_date: row.termination_date,
            employment_type: EmploymentType::from_str(&row.employment_type)
                .unwrap_or(EmploymentType::FullTime),
            manager_id: row.manager_id,
            salary: row.salary,
            currency: row.currency,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[async_trait]
impl WorkforceRepository for PgWorkforceRepository {
    async fn find_department(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Department>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<DepartmentRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, description, parent_id, manager_id,
                is_active, created_at, modified_at
            FROM departments
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding department: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_departments(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<Department>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<DepartmentRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, description, parent_id, manager_id,
                is_active, created_at, modified_at
            FROM departments
            WHERE organization_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing departments: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_department(&self, department: &Department) -> Result<Department, DomainError> {
        info!("Creating department: {}", department.name);

        let mut tx = tenant_tx(&self.pool, &department.organization_id).await?;
        let row: DepartmentRow = sqlx::query_as(
            r#"
            INSERT INTO departments (
                id, organization_id, name, description, parent_id, manager_id,
                is_active, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, organization_id, name, description, parent_id, manager_id,
                is_active, created_at, modified_at
            "#,
        )
        .bind(department.id)
        .bind(department.organization_id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.parent_id)
        .bind(department.manager_id)
        .bind(department.is_active)
        .bind(department.created_at)
        .bind(department.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating department: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::ValidationError(format!(
                    "department '{}' already exists",
                    department.name
                ))
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn update_department(&self, department: &Department) -> Result<Department, DomainError> {
        let mut tx = tenant_tx(&self.pool, &department.organization_id).await?;
        let row: DepartmentRow = sqlx::query_as(
            r#"
            UPDATE departments SET
                name = $2,
                description = $3,
                parent_id = $4,
                manager_id = $5,
                is_active = $6,
                modified_at = $7
            WHERE id = $1
            RETURNING
                id, organization_id, name, description, parent_id, manager_id,
                is_active, created_at, modified_at
            "#,
        )
        .bind(department.id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.parent_id)
        .bind(department.manager_id)
        .bind(department.is_active)
        .bind(department.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating department: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::ValidationError(format!(
                    "department '{}' already exists",
                    department.name
                ))
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn find_position(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Position>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<PositionRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, department_id, title, description, level,
                reports_to, required_skills, preferred_skills, min_experience_years,
                is_active, created_at, modified_at
            FROM positions
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding position: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_positions(&self, organization_id: &Uuid) -> Result<Vec<Position>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<PositionRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, department_id, title, description, level,
                reports_to, required_skills, preferred_skills, min_experience_years,
                is_active, created_at, modified_at
            FROM positions
            WHERE organization_id = $1
            ORDER BY title ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing positions: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_position(&self, position: &Position) -> Result<Position, DomainError> {
        info!("Creating position: {}", position.title);

        let mut tx = tenant_tx(&self.pool, &position.organization_id).await?;
        let row: PositionRow = sqlx::query_as(
            r#"
            INSERT INTO positions (
                id, organization_id, department_id, title, description, level,
                reports_to, required_skills, preferred_skills, min_experience_years,
                is_active, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING
                id, organization_id, department_id, title, description, level,
                reports_to, required_skills, preferred_skills, min_experience_years,
                is_active, created_at, modified_at
            "#,
        )
        .bind(position.id)
        .bind(position.organization_id)
        .bind(position.department_id)
        .bind(&position.title)
        .bind(&position.description)
        .bind(position.level)
        .bind(position.reports_to)
        .bind(&position.required_skills)
        .bind(&position.preferred_skills)
        .bind(position.min_experience_years)
        .bind(position.is_active)
        .bind(position.created_at)
        .bind(position.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating position: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::ValidationError(format!(
                    "position '{}' already exists in this department",
                    position.title
                ))
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn update_position(&self, position: &Position) -> Result<Position, DomainError> {
        let mut tx = tenant_tx(&self.pool, &position.organization_id).await?;
        let row: PositionRow = sqlx::query_as(
            r#"
            UPDATE positions SET
                department_id = $2,
                title = $3,
                description = $4,
                level = $5,
                reports_to = $6,
                required_skills = $7,
                preferred_skills = $8,
                min_experience_years = $9,
                is_active = $10,
                modified_at = $11
            WHERE id = $1
            RETURNING
                id, organization_id, department_id, title, description, level,
                reports_to, required_skills, preferred_skills, min_experience_years,
                is_active, created_at, modified_at
            "#,
        )
        .bind(position.id)
        .bind(position.department_id)
        .bind(&position.title)
        .bind(&position.description)
        .bind(position.level)
        .bind(position.reports_to)
        .bind(&position.required_skills)
        .bind(&position.preferred_skills)
        .bind(position.min_experience_years)
        .bind(position.is_active)
        .bind(position.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating position: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn find_employee(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Employee>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<EmployeeRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, user_id, department_id, position_id,
                employee_number, hire_date, termination_date, employment_type,
                manager_id, salary, currency, is_active, created_at, modified_at
            FROM employees
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding employee: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| self.decrypt(r.into())))
    }

    async fn find_employee_by_user(
        &self,
        organization_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<Employee>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<EmployeeRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, user_id, department_id, position_id,
                employee_number, hire_date, termination_date, employment_type,
                manager_id, salary, currency, is_active, created_at, modified_at
            FROM employees
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding employee by user: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| self.decrypt(r.into())))
    }

    async fn list_employees(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Employee>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<EmployeeRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, user_id, department_id, position_id,
                employee_number, hire_date, termination_date, employment_type,
                manager_id, salary, currency, is_active, created_at, modified_at
            FROM employees
            WHERE organization_id = $1
            ORDER BY employee_number ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing employees: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows
            .into_iter()
            .map(|r| self.decrypt(r.into()))
            .collect())
    }

    async fn create_employee(&self, employee: &Employee) -> Result<Employee, DomainError> {
        info!("Creating employee record: {}", employee.employee_number);

        let mut tx = tenant_tx(&self.pool, &employee.organization_id).await?;
        let row: EmployeeRow = sqlx::query_as(
            r#"
            INSERT INTO employees (
                id, organization_id, user_id, department_id, position_id,
                employee_number, hire_date, termination_date, employment_type,
                manager_id, salary, currency, is_active, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING
                id, organization_id, user_id, department_id, position_id,
                employee_number, hire_date, termination_date, employment_type,
                manager_id, salary, currency, is_active, created_at, modified_at
            "#,
        )
        .bind(employee.id)
        .bind(employee.organization_id)
        .bind(employee.user_id)
        .bind(employee.department_id)
        .bind(employee.position_id)
        .bind(&employee.employee_number)
        .bind(employee.hire_date)
        .bind(employee.termination_date)
        .bind(employee.employment_type.as_str())
        .bind(employee.manager_id)
        .bind(self.encrypt(&employee.salary)?)
        .bind(&employee.currency)
        .bind(employee.is_active)
        .bind(employee.created_at)
        .bind(employee.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating employee: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::EmployeeAlreadyExists
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        info!("Employee created successfully: {}", row.id);
        Ok(self.decrypt(row.into()))
    }

    async fn update_employee(&self, employee: &Employee) -> Result<Employee, DomainError> {
        let mut tx = tenant_tx(&self.pool, &employee.organization_id).await?;
        let row: EmployeeRow = sqlx::query_as(
            r#"
            UPDATE employees SET
                department_id = $2,
                position_id = $3,
                employee_number = $4,
                hire_date = $5,
                termination_date = $6,
                employment_type = $7,
                manager_id = $8,
                salary = $9,
                currency = $10,
                is_active = $11,
                modified_at = $12
            WHERE id = $1
            RETURNING
                id, organization_id, user_id, department_id, position_id,
                employee_number, hire_date, termination_date, employment_type,
                manager_id, salary, currency, is_active, created_at, modified_at
            "#,
        )
        .bind(employee.id)
        .bind(employee.department_id)
        .bind(employee.position_id)
        .bind(&employee.employee_number)
        .bind(employee.hire_date)
        .bind(employee.termination_date)
        .bind(employee.employment_type.as_str())
        .bind(employee.manager_id)
        .bind(self.encrypt(&employee.salary)?)
        .bind(&employee.currency)
        .bind(employee.is_active)
        .bind(employee.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating employee: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(self.decrypt(row.into()))
    }
}

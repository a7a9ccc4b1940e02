// ============================================================================
// Tala Core - Workforce Service
// File: crates/tala-core/src/services/workforce_service.rs
// ============================================================================
//! Departments, positions and employee records

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use tala_shared::types::Pagination;

use crate::domain::{Department, Employee, EmploymentType, Position};
use crate::error::DomainError;
use crate::repositories::{OrganizationRepository, WorkforceRepository};

pub struct WorkforceService<W, O>
where
    W: WorkforceRepository,
    O: OrganizationRepository,
{
    workforce_repo: Arc<W>,
    org_repo: Arc<O>,
}

impl<W, O> WorkforceService<W, O>
where
    W: WorkforceRepository,
    O: OrganizationRepository,
{
    pub fn new(workforce_repo: Arc<W>, org_repo: Arc<O>) -> Self {
        Self { workforce_repo, org_repo }
    }

    // ------------------------------------------------------------------
    // Departments
    // ------------------------------------------------------------------

    pub async fn create_department(
        &self,
        organization_id: &Uuid,
        name: &str,
        description: String,
        parent_id: Option<Uuid>,
    ) -> Result<Department, DomainError> {
        if let Some(parent) = parent_id {
            self.workforce_repo
                .find_department(organization_id, &parent)
                .await?
                .ok_or(DomainError::DepartmentNotFound)?;
        }
        let department =
            Department::new(*organization_id, name.to_string(), description, parent_id)
                .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let department = self.workforce_repo.create_department(&department).await?;
        info!("Department created: {} in org {}", department.name, organization_id);
        Ok(department)
    }

    pub async fn get_department(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Department, DomainError> {
        self.workforce_repo
            .find_department(organization_id, id)
            .await?
            .ok_or(DomainError::DepartmentNotFound)
    }

    pub async fn list_departments(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<Department>, DomainError> {
        self.workforce_repo.list_departments(organization_id).await
    }

    pub async fn update_department(
        &self,
        department: &Department,
    ) -> Result<Department, DomainError> {
        self.workforce_repo.update_department(department).await
    }

    pub async fn assign_department_manager(
        &self,
        organization_id: &Uuid,
        department_id: &Uuid,
        manager_user_id: &Uuid,
    ) -> Result<Department, DomainError> {
        let mut department = self.get_department(organization_id, department_id).await?;
        self.require_active_member(organization_id, manager_user_id)
            .await?;
        department.assign_manager(*manager_user_id);
        self.workforce_repo.update_department(&department).await
    }

    // ------------------------------------------------------------------
    // Positions
    // ------------------------------------------------------------------

    pub async fn create_position(
        &self,
        organization_id: &Uuid,
        department_id: &Uuid,
        title: &str,
        description: String,
        level: i32,
    ) -> Result<Position, DomainError> {
        self.get_department(organization_id, department_id).await?;
        let position = Position::new(
            *organization_id,
            *department_id,
            title.to_string(),
            description,
            level,
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        self.workforce_repo.create_position(&position).await
    }

    pub async fn get_position(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Position, DomainError> {
        self.workforce_repo
            .find_position(organization_id, id)
            .await?
            .ok_or(DomainError::PositionNotFound)
    }

    pub async fn list_positions(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<Position>, DomainError> {
        self.workforce_repo.list_positions(organization_id).await
    }

    pub async fn update_position(&self, position: &Position) -> Result<Position, DomainError> {
        self.workforce_repo.update_position(position).await
    }

    // ------------------------------------------------------------------
    // Employees
    // ------------------------------------------------------------------

    /// Creates the employment record. The user must already be an active
    /// member of the organization, and the position must belong to the
    /// department.
    pub async fn create_employee(
        &self,
        organization_id: &Uuid,
        user_id: &Uuid,
        department_id: &Uuid,
        position_id: &Uuid,
        hire_date: NaiveDate,
        employment_type: EmploymentType,
    ) -> Result<Employee, DomainError> {
        // 1. Active membership gate
        self.require_active_member(organization_id, user_id).await?;

        // 2. One employment record per (org, user)
        if self
            .workforce_repo
            .find_employee_by_user(organization_id, user_id)
            .await?
            .is_some_and(|e| e.is_active)
        {
            return Err(DomainError::EmployeeAlreadyExists);
        }

        // 3. Department and position must line up
        self.get_department(organization_id, department_id).await?;
        let position = self.get_position(organization_id, position_id).await?;
        if position.department_id != *department_id {
            return Err(DomainError::PositionNotFound);
        }

        let employee = Employee::new(
            *organization_id,
            *user_id,
            *department_id,
            *position_id,
            hire_date,
            employment_type,
        );
        let employee = self.workforce_repo.create_employee(&employee).await?;
        info!("Employee record created for user {} in org {}", user_id, organization_id);
        Ok(employee)
    }

    pub async fn get_employee(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Employee, DomainError> {
        self.workforce_repo
            .find_employee(organization_id, id)
            .await?
            .ok_or(DomainError::EmployeeNotFound)
    }

    pub async fn list_employees(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Employee>, DomainError> {
        self.workforce_repo
            .list_employees(organization_id, pagination.clamped())
            .await
    }

    pub async fn update_employee(&self, employee: &Employee) -> Result<Employee, DomainError> {
        self.workforce_repo.update_employee(employee).await
    }

    pub async fn terminate_employee(
        &self,
        organization_id: &Uuid,
        employee_id: &Uuid,
        date: NaiveDate,
    ) -> Result<Employee, DomainError> {
        let mut employee = self.get_employee(organization_id, employee_id).await?;
        employee.terminate(date);
        self.workforce_repo.update_employee(&employee).await
    }

    async fn require_active_member(
        &self,
        organization_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), DomainError> {
        match self.org_repo.find_membership(user_id, organization_id).await? {
            Some(m) if m.is_active => Ok(()),
            _ => Err(DomainError::MembershipNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MemberRole, Membership};
    use crate::repositories::organization_repository::MockOrganizationRepository;
    use crate::repositories::workforce_repository::MockWorkforceRepository;

    fn member_org_repo() -> MockOrganizationRepository {
        let mut org_repo = MockOrganizationRepository::new();
        org_repo.expect_find_membership().returning(|user, org| {
            Ok(Some(Membership::new(*user, *org, MemberRole::Member)))
        });
        org_repo
    }

    #[tokio::test]
    async fn test_create_department_with_missing_parent() {
        let mut workforce_repo = MockWorkforceRepository::new();
        workforce_repo
            .expect_find_department()
            .returning(|_, _| Ok(None));

        let service = WorkforceService::new(
            Arc::new(workforce_repo),
            Arc::new(MockOrganizationRepository::new()),
        );
        let err = service
            .create_department(&Uuid::new_v4(), "Engineering", String::new(), Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DepartmentNotFound));
    }

    #[tokio::test]
    async fn test_create_employee_requires_membership() {
        let mut org_repo = MockOrganizationRepository::new();
        org_repo.expect_find_membership().returning(|_, _| Ok(None));

        let service = WorkforceService::new(
            Arc::new(MockWorkforceRepository::new()),
            Arc::new(org_repo),
        );
        let err = service
            .create_employee(
                &Uuid::new_v4(),
                &Uuid::new_v4(),
                &Uuid::new_v4(),
                &Uuid::new_v4(),
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                EmploymentType::FullTime,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::MembershipNotFound));
    }

    #[tokio::test]
    async fn test_create_employee_rejects_duplicate() {
        let org_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut workforce_repo = MockWorkforceRepository::new();
        workforce_repo
            .expect_find_employee_by_user()
            .returning(move |org, user| {
                Ok(Some(Employee::new(
                    *org,
                    *user,
                    Uuid::new_v4(),
                    Uuid::new_v4(),
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    EmploymentType::FullTime,
                )))
            });

        let service = WorkforceService::new(Arc::new(workforce_repo), Arc::new(member_org_repo()));
        let err = service
            .create_employee(
                &org_id,
                &user_id,
                &Uuid::new_v4(),
                &Uuid::new_v4(),
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                EmploymentType::PartTime,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmployeeAlreadyExists));
    }

    #[tokio::test]
    async fn test_create_employee_checks_position_department() {
        let org_id = Uuid::new_v4();
        let dept_id = Uuid::new_v4();
        let pos_id = Uuid::new_v4();

        let mut workforce_repo = MockWorkforceRepository::new();
        workforce_repo
            .expect_find_employee_by_user()
            .returning(|_, _| Ok(None));
        workforce_repo
            .expect_find_department()
            .returning(move |org, id| {
                Ok(Some(
                    Department::new(*org, "Engineering".into(), String::new(), None).map(|mut d| {
                        d.id = *id;
                        d
                    })
                    .unwrap(),
                ))
            });
        // Position exists but belongs to a different department.
        workforce_repo.expect_find_position().returning(move |org, id| {
            let mut position =
                Position::new(*org, Uuid::new_v4(), "Engineer".into(), String::new(), 2).unwrap();
            position.id = *id;
            Ok(Some(position))
        });

        let service = WorkforceService::new(Arc::new(workforce_repo), Arc::new(member_org_repo()));
        let err = service
            .create_employee(
                &org_id,
                &Uuid::new_v4(),
                &dept_id,
                &pos_id,
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                EmploymentType::FullTime,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PositionNotFound));
    }
}

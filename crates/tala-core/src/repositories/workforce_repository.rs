//! Workforce repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Department, Employee, Position};
use crate::error::DomainError;
use tala_shared::types::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkforceRepository: Send + Sync {
    // Departments
    async fn find_department(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Department>, DomainError>;
    async fn list_departments(&self, organization_id: &Uuid)
        -> Result<Vec<Department>, DomainError>;
    async fn create_department(&self, department: &Department)
        -> Result<Department, DomainError>;
    async fn update_department(&self, department: &Department)
        -> Result<Department, DomainError>;

    // Positions
    async fn find_position(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Position>, DomainError>;
    async fn list_positions(&self, organization_id: &Uuid) -> Result<Vec<Position>, DomainError>;
    async fn create_position(&self, position: &Position) -> Result<Position, DomainError>;
    async fn update_position(&self, position: &Position) -> Result<Position, DomainError>;

    // Employees
    async fn find_employee(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Employee>, DomainError>;
    async fn find_employee_by_user(
        &self,
        organization_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<Employee>, DomainError>;
    async fn list_employees(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Employee>, DomainError>;
    async fn create_employee(&self, employee: &Employee) -> Result<Employee, DomainError>;
    async fn update_employee(&self, employee: &Employee) -> Result<Employee, DomainError>;
}

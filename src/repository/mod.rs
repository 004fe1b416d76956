//! Data-access traits and their two backends.
//!
//! Handlers are generic over these traits so the same routes run against
//! the in-memory arena (tests, demos) and MySQL.

pub mod memory;
pub mod mysql;
pub mod page;

use std::future::Future;

use crate::error::RepoResult;
use crate::model::{
    department::{Department, DepartmentInput},
    employee::{Employee, EmployeeInput, EmployeePatch},
    user::{NewUser, User},
};
pub use page::{
    Direction, DepartmentSortField, EmployeeSortField, Page, PageRequest, Sort,
};

pub use memory::{MemoryDb, MemoryDepartmentRepository, MemoryEmployeeRepository, MemoryUserRepository};
pub use mysql::{MySqlDepartmentRepository, MySqlEmployeeRepository, MySqlUserRepository};

/// Optional restriction applied before paging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub empno: Option<u64>,
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        self.empno.is_none_or(|empno| employee.empno == empno)
    }
}

/// Employee persistence.
///
/// Writes cascade to nested `mgr`/`department` bodies and are atomic.
/// Deletes never cascade: subordinates lose their `mgr` instead.
pub trait EmployeeRepository: Send + Sync + 'static {
    fn find_page(
        &self,
        filter: EmployeeFilter,
        request: PageRequest<EmployeeSortField>,
    ) -> impl Future<Output = RepoResult<Page<Employee>>> + Send;
    fn find_by_id(&self, empno: u64) -> impl Future<Output = RepoResult<Option<Employee>>> + Send;
    fn create(&self, input: EmployeeInput) -> impl Future<Output = RepoResult<Employee>> + Send;
    fn replace(
        &self,
        empno: u64,
        input: EmployeeInput,
    ) -> impl Future<Output = RepoResult<Employee>> + Send;
    fn patch(
        &self,
        empno: u64,
        patch: EmployeePatch,
    ) -> impl Future<Output = RepoResult<Employee>> + Send;
    fn delete(&self, empno: u64) -> impl Future<Output = RepoResult<()>> + Send;
}

/// Department persistence. Deleting a department clears it on employees.
pub trait DepartmentRepository: Send + Sync + 'static {
    fn find_page(
        &self,
        request: PageRequest<DepartmentSortField>,
    ) -> impl Future<Output = RepoResult<Page<Department>>> + Send;
    fn find_by_id(&self, id: u64) -> impl Future<Output = RepoResult<Option<Department>>> + Send;
    fn create(
        &self,
        input: DepartmentInput,
    ) -> impl Future<Output = RepoResult<Department>> + Send;
    fn replace(
        &self,
        id: u64,
        input: DepartmentInput,
    ) -> impl Future<Output = RepoResult<Department>> + Send;
    fn delete(&self, id: u64) -> impl Future<Output = RepoResult<()>> + Send;
}

pub trait UserRepository: Send + Sync + 'static {
    /// Exact, case-sensitive match.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = RepoResult<Option<User>>> + Send;
    /// Fails with `RepoError::Conflict` when the username is taken.
    fn create(&self, user: NewUser) -> impl Future<Output = RepoResult<User>> + Send;
}

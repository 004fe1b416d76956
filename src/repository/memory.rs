//! In-memory arena store.
//!
//! Records live in identifier-keyed maps and refer to each other by
//! identifier. Every write runs against a draft copy of the arena that is
//! swapped in only when the whole write succeeded.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{
    DepartmentRepository, DepartmentSortField, Direction, EmployeeFilter, EmployeeRepository,
    EmployeeSortField, Page, PageRequest, UserRepository,
};
use crate::error::{RepoError, RepoResult};
use crate::model::{
    department::{Department, DepartmentInput},
    employee::{Employee, EmployeeInput, EmployeePatch},
    link::Link,
    user::{NewUser, User},
};

#[derive(Debug, Clone, Default)]
struct Arena {
    employees: BTreeMap<u64, Employee>,
    departments: BTreeMap<u64, Department>,
    users: BTreeMap<u64, User>,
    last_empno: u64,
    last_department_id: u64,
    last_user_id: u64,
}

impl Arena {
    fn employee(&self, empno: u64) -> RepoResult<&Employee> {
        self.employees.get(&empno).ok_or(RepoError::NotFound {
            entity: "employee",
            id: empno,
        })
    }

    fn insert_employee(&mut self, input: &EmployeeInput) -> RepoResult<u64> {
        let mgr = match &input.mgr {
            Some(link) => Some(self.resolve_employee(link)?),
            None => None,
        };
        let department_id = match &input.department {
            Some(link) => Some(self.resolve_department(link)?),
            None => None,
        };
        self.last_empno += 1;
        let empno = self.last_empno;
        self.employees
            .insert(empno, Employee::from_input(empno, input, mgr, department_id));
        Ok(empno)
    }

    fn patch_employee(&mut self, empno: u64, patch: &EmployeePatch) -> RepoResult<()> {
        let mut row = self.employee(empno)?.clone();
        patch.apply_scalars(&mut row);

        if let Some(link) = &patch.mgr {
            row.mgr = match link {
                Some(link) => {
                    let mgr = self.resolve_employee(link)?;
                    self.ensure_acyclic(empno, mgr)?;
                    Some(mgr)
                }
                None => None,
            };
        }
        if let Some(link) = &patch.department {
            row.department_id = match link {
                Some(link) => Some(self.resolve_department(link)?),
                None => None,
            };
        }

        self.employees.insert(empno, row);
        Ok(())
    }

    fn resolve_employee(&mut self, link: &Link<EmployeeInput>) -> RepoResult<u64> {
        match link {
            Link::Reference(empno) => {
                self.known_employee(*empno)?;
                Ok(*empno)
            }
            Link::Merge(empno, input) => {
                self.known_employee(*empno)?;
                self.patch_employee(*empno, &EmployeePatch::from(input.clone()))?;
                Ok(*empno)
            }
            Link::Create(input) => self.insert_employee(input),
        }
    }

    fn resolve_department(&mut self, link: &Link<DepartmentInput>) -> RepoResult<u64> {
        match link {
            Link::Reference(id) => {
                self.known_department(*id)?;
                Ok(*id)
            }
            Link::Merge(id, input) => {
                self.known_department(*id)?;
                self.departments.insert(*id, Department::from_input(*id, input));
                Ok(*id)
            }
            Link::Create(input) => Ok(self.insert_department(input)),
        }
    }

    fn known_employee(&self, empno: u64) -> RepoResult<()> {
        if self.employees.contains_key(&empno) {
            Ok(())
        } else {
            Err(RepoError::UnknownReference {
                entity: "employee",
                id: empno,
            })
        }
    }

    fn known_department(&self, id: u64) -> RepoResult<()> {
        if self.departments.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::UnknownReference {
                entity: "department",
                id,
            })
        }
    }

    /// Refuses `mgr` if `empno` already appears in `mgr`'s management chain.
    fn ensure_acyclic(&self, empno: u64, mgr: u64) -> RepoResult<()> {
        let mut seen = HashSet::new();
        let mut cursor = Some(mgr);
        while let Some(current) = cursor {
            if current == empno {
                return Err(RepoError::Invalid(format!(
                    "employee {empno} cannot be managed by {mgr}: management chain would loop"
                )));
            }
            if !seen.insert(current) {
                break;
            }
            cursor = self.employees.get(&current).and_then(|e| e.mgr);
        }
        Ok(())
    }

    fn insert_department(&mut self, input: &DepartmentInput) -> u64 {
        self.last_department_id += 1;
        let id = self.last_department_id;
        self.departments.insert(id, Department::from_input(id, input));
        id
    }
}

/// Shared handle to one arena. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    arena: Arc<RwLock<Arena>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, Arena>> {
        self.arena.read().map_err(|_| RepoError::Unavailable)
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Arena>> {
        self.arena.write().map_err(|_| RepoError::Unavailable)
    }

    /// Runs `op` on a draft and commits it only if `op` succeeds.
    fn transact<T>(&self, op: impl FnOnce(&mut Arena) -> RepoResult<T>) -> RepoResult<T> {
        let mut guard = self.write()?;
        let mut draft = guard.clone();
        let out = op(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

fn cmp_nullable<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    // None < Some, as MySQL orders NULLs
    a.cmp(b)
}

/// Case-insensitive, like the default MySQL collation.
fn cmp_nullable_text(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
    }
}

fn cmp_nullable_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

fn compare_employees(a: &Employee, b: &Employee, field: EmployeeSortField) -> Ordering {
    match field {
        EmployeeSortField::Empno => a.empno.cmp(&b.empno),
        EmployeeSortField::Ename => cmp_nullable_text(&a.ename, &b.ename),
        EmployeeSortField::Job => cmp_nullable_text(&a.job, &b.job),
        EmployeeSortField::Hiredate => cmp_nullable(&a.hiredate, &b.hiredate),
        EmployeeSortField::Sal => cmp_nullable_f64(a.sal, b.sal),
        EmployeeSortField::Comm => cmp_nullable_f64(a.comm, b.comm),
    }
}

fn compare_departments(a: &Department, b: &Department, field: DepartmentSortField) -> Ordering {
    match field {
        DepartmentSortField::Id => a.id.cmp(&b.id),
        DepartmentSortField::Name => cmp_nullable_text(&a.name, &b.name),
        DepartmentSortField::Description => cmp_nullable_text(&a.description, &b.description),
    }
}

fn directed(ordering: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    }
}

#[derive(Debug, Clone)]
pub struct MemoryEmployeeRepository {
    db: MemoryDb,
}

impl MemoryEmployeeRepository {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }
}

impl EmployeeRepository for MemoryEmployeeRepository {
    async fn find_page(
        &self,
        filter: EmployeeFilter,
        request: PageRequest<EmployeeSortField>,
    ) -> RepoResult<Page<Employee>> {
        let arena = self.db.read()?;
        let mut rows: Vec<Employee> = arena
            .employees
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        let sort = request.sort;
        rows.sort_by(|a, b| {
            directed(compare_employees(a, b, sort.field), sort.direction)
                .then_with(|| a.empno.cmp(&b.empno))
        });
        debug!(?filter, ?request, matched = rows.len(), "Paging employees");
        Ok(Page::slice(rows, &request))
    }

    async fn find_by_id(&self, empno: u64) -> RepoResult<Option<Employee>> {
        Ok(self.db.read()?.employees.get(&empno).cloned())
    }

    async fn create(&self, input: EmployeeInput) -> RepoResult<Employee> {
        self.db.transact(|arena| {
            let empno = arena.insert_employee(&input)?;
            arena.employee(empno).cloned()
        })
    }

    async fn replace(&self, empno: u64, input: EmployeeInput) -> RepoResult<Employee> {
        self.patch(empno, EmployeePatch::from(input)).await
    }

    async fn patch(&self, empno: u64, patch: EmployeePatch) -> RepoResult<Employee> {
        self.db.transact(|arena| {
            arena.patch_employee(empno, &patch)?;
            arena.employee(empno).cloned()
        })
    }

    async fn delete(&self, empno: u64) -> RepoResult<()> {
        self.db.transact(|arena| {
            arena.employees.remove(&empno).ok_or(RepoError::NotFound {
                entity: "employee",
                id: empno,
            })?;
            for subordinate in arena.employees.values_mut() {
                if subordinate.mgr == Some(empno) {
                    subordinate.mgr = None;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDepartmentRepository {
    db: MemoryDb,
}

impl MemoryDepartmentRepository {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }
}

impl DepartmentRepository for MemoryDepartmentRepository {
    async fn find_page(
        &self,
        request: PageRequest<DepartmentSortField>,
    ) -> RepoResult<Page<Department>> {
        let arena = self.db.read()?;
        let mut rows: Vec<Department> = arena.departments.values().cloned().collect();
        let sort = request.sort;
        rows.sort_by(|a, b| {
            directed(compare_departments(a, b, sort.field), sort.direction)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(Page::slice(rows, &request))
    }

    async fn find_by_id(&self, id: u64) -> RepoResult<Option<Department>> {
        Ok(self.db.read()?.departments.get(&id).cloned())
    }

    async fn create(&self, input: DepartmentInput) -> RepoResult<Department> {
        self.db.transact(|arena| {
            let id = arena.insert_department(&input);
            Ok(Department::from_input(id, &input))
        })
    }

    async fn replace(&self, id: u64, input: DepartmentInput) -> RepoResult<Department> {
        self.db.transact(|arena| {
            let slot = arena.departments.get_mut(&id).ok_or(RepoError::NotFound {
                entity: "department",
                id,
            })?;
            *slot = Department::from_input(id, &input);
            Ok(slot.clone())
        })
    }

    async fn delete(&self, id: u64) -> RepoResult<()> {
        self.db.transact(|arena| {
            arena.departments.remove(&id).ok_or(RepoError::NotFound {
                entity: "department",
                id,
            })?;
            for employee in arena.employees.values_mut() {
                if employee.department_id == Some(id) {
                    employee.department_id = None;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryUserRepository {
    db: MemoryDb,
}

impl MemoryUserRepository {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }
}

impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        Ok(self
            .db
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        self.db.transact(|arena| {
            if arena.users.values().any(|u| u.username == user.username) {
                return Err(RepoError::Conflict(format!(
                    "Username '{}' already exists",
                    user.username
                )));
            }
            arena.last_user_id += 1;
            let stored = User {
                id: arena.last_user_id,
                username: user.username,
                password: user.password,
                role_id: user.role.id(),
                is_active: true,
            };
            arena.users.insert(stored.id, stored.clone());
            Ok(stored)
        })
    }
}

//! MySQL store on a sqlx pool.
//!
//! Each write runs in one transaction; nested `mgr`/`department` bodies are
//! written first so the outer row can reference them.

use std::collections::HashSet;

use futures::future::{BoxFuture, FutureExt};
use sqlx::{MySqlConnection, MySqlPool};
use tracing::debug;

use super::{
    DepartmentRepository, DepartmentSortField, EmployeeFilter, EmployeeRepository,
    EmployeeSortField, Page, PageRequest, UserRepository,
};
use crate::error::{RepoError, RepoResult};
use crate::model::{
    department::{Department, DepartmentInput},
    employee::{Employee, EmployeeInput, EmployeePatch},
    link::Link,
    user::{NewUser, User},
};
use crate::utils::db_utils::{SqlValue, build_update_sql, execute_update};

const EMPLOYEE_COLUMNS: &str = "empno, ename, job, mgr, hiredate, sal, comm, department_id";
const DEPARTMENT_COLUMNS: &str = "id, name, description";

async fn fetch_employee(conn: &mut MySqlConnection, empno: u64) -> RepoResult<Option<Employee>> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE empno = ?");
    let row = sqlx::query_as::<_, Employee>(&sql)
        .bind(empno)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

async fn employee_exists(conn: &mut MySqlConnection, empno: u64) -> RepoResult<bool> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE empno = ?")
        .bind(empno)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

async fn department_exists(conn: &mut MySqlConnection, id: u64) -> RepoResult<bool> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments WHERE id = ?")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

async fn insert_department(conn: &mut MySqlConnection, input: &DepartmentInput) -> RepoResult<u64> {
    let result = sqlx::query("INSERT INTO departments (name, description) VALUES (?, ?)")
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .execute(conn)
        .await?;
    Ok(result.last_insert_id())
}

async fn write_department(
    conn: &mut MySqlConnection,
    id: u64,
    input: &DepartmentInput,
) -> RepoResult<()> {
    sqlx::query("UPDATE departments SET name = ?, description = ? WHERE id = ?")
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn resolve_department_link(
    conn: &mut MySqlConnection,
    link: &Link<DepartmentInput>,
) -> RepoResult<u64> {
    match link {
        Link::Create(input) => insert_department(conn, input).await,
        Link::Reference(id) | Link::Merge(id, _) => {
            if !department_exists(&mut *conn, *id).await? {
                return Err(RepoError::UnknownReference {
                    entity: "department",
                    id: *id,
                });
            }
            if let Link::Merge(_, input) = link {
                write_department(conn, *id, input).await?;
            }
            Ok(*id)
        }
    }
}

/// Boxed to break the recursion between nested employee bodies.
fn resolve_employee_link<'a>(
    conn: &'a mut MySqlConnection,
    link: &'a Link<EmployeeInput>,
) -> BoxFuture<'a, RepoResult<u64>> {
    async move {
        match link {
            Link::Create(input) => insert_employee(conn, input).await,
            Link::Reference(empno) | Link::Merge(empno, _) => {
                if !employee_exists(&mut *conn, *empno).await? {
                    return Err(RepoError::UnknownReference {
                        entity: "employee",
                        id: *empno,
                    });
                }
                if let Link::Merge(_, input) = link {
                    patch_employee(conn, *empno, &EmployeePatch::from(input.clone())).await?;
                }
                Ok(*empno)
            }
        }
    }
    .boxed()
}

async fn insert_employee(conn: &mut MySqlConnection, input: &EmployeeInput) -> RepoResult<u64> {
    let mgr = match &input.mgr {
        Some(link) => Some(resolve_employee_link(&mut *conn, link).await?),
        None => None,
    };
    let department_id = match &input.department {
        Some(link) => Some(resolve_department_link(&mut *conn, link).await?),
        None => None,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (ename, job, mgr, hiredate, sal, comm, department_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.ename.as_deref())
    .bind(input.job.as_deref())
    .bind(mgr)
    .bind(input.hiredate)
    .bind(input.sal)
    .bind(input.comm)
    .bind(department_id)
    .execute(conn)
    .await?;

    Ok(result.last_insert_id())
}

async fn patch_employee(
    conn: &mut MySqlConnection,
    empno: u64,
    patch: &EmployeePatch,
) -> RepoResult<()> {
    if !employee_exists(&mut *conn, empno).await? {
        return Err(RepoError::NotFound {
            entity: "employee",
            id: empno,
        });
    }

    let mut assignments = Vec::new();
    if let Some(v) = &patch.ename {
        assignments.push(("ename", SqlValue::Text(v.clone())));
    }
    if let Some(v) = &patch.job {
        assignments.push(("job", SqlValue::Text(v.clone())));
    }
    if let Some(v) = patch.hiredate {
        assignments.push(("hiredate", SqlValue::DateTime(v)));
    }
    if let Some(v) = patch.sal {
        assignments.push(("sal", SqlValue::F64(v)));
    }
    if let Some(v) = patch.comm {
        assignments.push(("comm", SqlValue::F64(v)));
    }
    if let Some(link) = &patch.mgr {
        let mgr = match link {
            Some(link) => {
                let mgr = resolve_employee_link(&mut *conn, link).await?;
                ensure_acyclic(&mut *conn, empno, mgr).await?;
                Some(mgr)
            }
            None => None,
        };
        assignments.push(("mgr", SqlValue::U64(mgr)));
    }
    if let Some(link) = &patch.department {
        let department_id = match link {
            Some(link) => Some(resolve_department_link(&mut *conn, link).await?),
            None => None,
        };
        assignments.push(("department_id", SqlValue::U64(department_id)));
    }

    if let Some(update) = build_update_sql("employees", assignments, "empno", empno) {
        debug!(sql = %update.sql, empno, "Updating employee");
        execute_update(conn, update).await?;
    }
    Ok(())
}

async fn ensure_acyclic(conn: &mut MySqlConnection, empno: u64, mgr: u64) -> RepoResult<()> {
    let mut seen = HashSet::new();
    let mut cursor = Some(mgr);
    while let Some(current) = cursor {
        if current == empno {
            return Err(RepoError::Invalid(format!(
                "employee {empno} cannot be managed by {mgr}: management chain would loop"
            )));
        }
        // an existing loop that does not pass through `empno`
        if !seen.insert(current) {
            break;
        }
        cursor = sqlx::query_scalar::<_, Option<u64>>("SELECT mgr FROM employees WHERE empno = ?")
            .bind(current)
            .fetch_optional(&mut *conn)
            .await?
            .flatten();
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct MySqlEmployeeRepository {
    pool: MySqlPool,
}

impl MySqlEmployeeRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl EmployeeRepository for MySqlEmployeeRepository {
    async fn find_page(
        &self,
        filter: EmployeeFilter,
        request: PageRequest<EmployeeSortField>,
    ) -> RepoResult<Page<Employee>> {
        let where_clause = if filter.empno.is_some() {
            "WHERE empno = ?"
        } else {
            ""
        };

        // ---------- total count ----------
        let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
        debug!(sql = %count_sql, ?filter, "Counting employees");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(empno) = filter.empno {
            count_query = count_query.bind(empno);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        // ---------- data query ----------
        let data_sql = format!(
            "SELECT {} FROM employees {} ORDER BY {} {}, empno ASC LIMIT ? OFFSET ?",
            EMPLOYEE_COLUMNS,
            where_clause,
            request.sort.field.column(),
            request.sort.direction.sql(),
        );
        debug!(sql = %data_sql, page = request.page, size = request.size, "Fetching employees");

        let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
        if let Some(empno) = filter.empno {
            data_query = data_query.bind(empno);
        }
        let content = data_query
            .bind(u64::from(request.size))
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            content,
            number: request.page,
            size: request.size,
            total_elements: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn find_by_id(&self, empno: u64) -> RepoResult<Option<Employee>> {
        let mut conn = self.pool.acquire().await?;
        fetch_employee(&mut conn, empno).await
    }

    async fn create(&self, input: EmployeeInput) -> RepoResult<Employee> {
        let mut tx = self.pool.begin().await?;
        let empno = insert_employee(&mut tx, &input).await?;
        let created = fetch_employee(&mut tx, empno).await?.ok_or(RepoError::NotFound {
            entity: "employee",
            id: empno,
        })?;
        tx.commit().await?;
        Ok(created)
    }

    async fn replace(&self, empno: u64, input: EmployeeInput) -> RepoResult<Employee> {
        self.patch(empno, EmployeePatch::from(input)).await
    }

    async fn patch(&self, empno: u64, patch: EmployeePatch) -> RepoResult<Employee> {
        let mut tx = self.pool.begin().await?;
        patch_employee(&mut tx, empno, &patch).await?;
        let updated = fetch_employee(&mut tx, empno).await?.ok_or(RepoError::NotFound {
            entity: "employee",
            id: empno,
        })?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, empno: u64) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        if !employee_exists(&mut tx, empno).await? {
            return Err(RepoError::NotFound {
                entity: "employee",
                id: empno,
            });
        }
        sqlx::query("UPDATE employees SET mgr = NULL WHERE mgr = ?")
            .bind(empno)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM employees WHERE empno = ?")
            .bind(empno)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MySqlDepartmentRepository {
    pool: MySqlPool,
}

impl MySqlDepartmentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl DepartmentRepository for MySqlDepartmentRepository {
    async fn find_page(
        &self,
        request: PageRequest<DepartmentSortField>,
    ) -> RepoResult<Page<Department>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            "SELECT {} FROM departments ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
            DEPARTMENT_COLUMNS,
            request.sort.field.column(),
            request.sort.direction.sql(),
        );
        debug!(sql = %data_sql, page = request.page, size = request.size, "Fetching departments");

        let content = sqlx::query_as::<_, Department>(&data_sql)
            .bind(u64::from(request.size))
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            content,
            number: request.page,
            size: request.size,
            total_elements: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn find_by_id(&self, id: u64) -> RepoResult<Option<Department>> {
        let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?");
        let row = sqlx::query_as::<_, Department>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(&self, input: DepartmentInput) -> RepoResult<Department> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_department(&mut conn, &input).await?;
        Ok(Department::from_input(id, &input))
    }

    async fn replace(&self, id: u64, input: DepartmentInput) -> RepoResult<Department> {
        let mut tx = self.pool.begin().await?;
        if !department_exists(&mut tx, id).await? {
            return Err(RepoError::NotFound {
                entity: "department",
                id,
            });
        }
        write_department(&mut tx, id, &input).await?;
        tx.commit().await?;
        Ok(Department::from_input(id, &input))
    }

    async fn delete(&self, id: u64) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        if !department_exists(&mut tx, id).await? {
            return Err(RepoError::NotFound {
                entity: "department",
                id,
            });
        }
        sqlx::query("UPDATE employees SET department_id = NULL WHERE department_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for MySqlUserRepository {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, role_id, is_active
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let result = sqlx::query(
            r#"INSERT INTO users (username, password, role_id, is_active) VALUES (?, ?, ?, TRUE)"#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.role.id())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_id(),
                username: user.username,
                password: user.password,
                role_id: user.role.id(),
                is_active: true,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
                Err(RepoError::Conflict(format!(
                    "Username '{}' already exists",
                    user.username
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use super::department::DepartmentInput;
use super::link::{Link, Linkable};
use super::{present, present_millis};

/// Stored employee row. Associations are held as identifiers.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Employee {
    pub empno: u64,
    pub ename: Option<String>,
    pub job: Option<String>,
    pub mgr: Option<u64>,
    pub hiredate: Option<DateTime<Utc>>,
    pub sal: Option<f64>,
    pub comm: Option<f64>,
    pub department_id: Option<u64>,
}

impl Employee {
    /// Builds a new row from a body whose associations are already resolved.
    pub fn from_input(
        empno: u64,
        input: &EmployeeInput,
        mgr: Option<u64>,
        department_id: Option<u64>,
    ) -> Self {
        Self {
            empno,
            ename: input.ename.clone(),
            job: input.job.clone(),
            mgr,
            hiredate: input.hiredate,
            sal: input.sal,
            comm: input.comm,
            department_id,
        }
    }
}

/// Create / full-replace body. Any `empno` member is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[schema(example = json!({
    "ename": "SMITH",
    "job": "CLERK",
    "hiredate": 345427200000i64,
    "sal": 800.0,
    "comm": null,
    "mgr": { "empno": 7902 },
    "department": { "id": 20 }
}))]
pub struct EmployeeInput {
    pub ename: Option<String>,
    pub job: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    #[schema(value_type = Option<i64>)]
    pub hiredate: Option<DateTime<Utc>>,
    pub sal: Option<f64>,
    pub comm: Option<f64>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub mgr: Option<Box<Link<EmployeeInput>>>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub department: Option<Link<DepartmentInput>>,
}

impl Linkable for EmployeeInput {
    const ID_FIELD: &'static str = "empno";
}

/// Partial update body. Outer `None` leaves a field untouched, `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmployeePatch {
    #[serde(default, deserialize_with = "present")]
    pub ename: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub job: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_millis")]
    pub hiredate: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub sal: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub comm: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub mgr: Option<Option<Box<Link<EmployeeInput>>>>,
    #[serde(default, deserialize_with = "present")]
    pub department: Option<Option<Link<DepartmentInput>>>,
}

impl From<EmployeeInput> for EmployeePatch {
    /// A full replace is a patch that touches every field.
    fn from(input: EmployeeInput) -> Self {
        Self {
            ename: Some(input.ename),
            job: Some(input.job),
            hiredate: Some(input.hiredate),
            sal: Some(input.sal),
            comm: Some(input.comm),
            mgr: Some(input.mgr),
            department: Some(input.department),
        }
    }
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.ename.is_none()
            && self.job.is_none()
            && self.hiredate.is_none()
            && self.sal.is_none()
            && self.comm.is_none()
            && self.mgr.is_none()
            && self.department.is_none()
    }

    /// Applies the scalar members to `employee`. Associations are resolved by
    /// the store and written separately.
    pub fn apply_scalars(&self, employee: &mut Employee) {
        if let Some(v) = &self.ename {
            employee.ename = v.clone();
        }
        if let Some(v) = &self.job {
            employee.job = v.clone();
        }
        if let Some(v) = self.hiredate {
            employee.hiredate = v;
        }
        if let Some(v) = self.sal {
            employee.sal = v;
        }
        if let Some(v) = self.comm {
            employee.comm = v;
        }
    }
}

//! Response bodies: entities with `_links`, and the page envelope.

use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::model::{department::Department, employee::Employee};
use crate::repository::Page;

pub const JSON_UTF8: &str = "application/json;charset=UTF-8";

/// Route names used for link generation.
pub mod route {
    pub const EMPLOYEE: &str = "employee";
    pub const EMPLOYEE_MGR: &str = "employee_mgr";
    pub const EMPLOYEE_DEPARTMENT: &str = "employee_department";
    pub const DEPARTMENT: &str = "department";
}

pub fn json<T: Serialize>(mut builder: HttpResponseBuilder, body: &T) -> HttpResponse {
    builder.content_type(JSON_UTF8).json(body)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Href {
    #[schema(example = "http://localhost:8080/api/employees/1")]
    pub href: String,
}

impl Href {
    pub fn to(req: &HttpRequest, route: &str, id: u64) -> Result<Self, ApiError> {
        req.url_for(route, [id.to_string()])
            .map(|url| Href {
                href: url.to_string(),
            })
            .map_err(|e| {
                error!(error = ?e, route, id, "Failed to build link");
                ApiError::Internal
            })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeLinks {
    #[serde(rename = "self")]
    pub self_link: Href,
    pub employee: Href,
    pub mgr: Href,
    pub department: Href,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeResource {
    #[schema(example = 7369)]
    pub empno: u64,
    #[schema(example = "SMITH")]
    pub ename: Option<String>,
    #[schema(example = "CLERK")]
    pub job: Option<String>,
    /// epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    #[schema(value_type = Option<i64>, example = 345427200000i64)]
    pub hiredate: Option<DateTime<Utc>>,
    #[schema(example = 800.0)]
    pub sal: Option<f64>,
    pub comm: Option<f64>,
    #[serde(rename = "_links")]
    pub links: EmployeeLinks,
}

impl EmployeeResource {
    /// `mgr` and `department` links are always present; they resolve to 404
    /// when the association is unset.
    pub fn new(req: &HttpRequest, employee: Employee) -> Result<Self, ApiError> {
        let self_link = Href::to(req, route::EMPLOYEE, employee.empno)?;
        let links = EmployeeLinks {
            employee: self_link.clone(),
            self_link,
            mgr: Href::to(req, route::EMPLOYEE_MGR, employee.empno)?,
            department: Href::to(req, route::EMPLOYEE_DEPARTMENT, employee.empno)?,
        };
        Ok(Self {
            empno: employee.empno,
            ename: employee.ename,
            job: employee.job,
            hiredate: employee.hiredate,
            sal: employee.sal,
            comm: employee.comm,
            links,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentLinks {
    #[serde(rename = "self")]
    pub self_link: Href,
    pub department: Href,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentResource {
    #[schema(example = 20)]
    pub id: u64,
    #[schema(example = "RESEARCH")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "_links")]
    pub links: DepartmentLinks,
}

impl DepartmentResource {
    pub fn new(req: &HttpRequest, department: Department) -> Result<Self, ApiError> {
        let self_link = Href::to(req, route::DEPARTMENT, department.id)?;
        Ok(Self {
            id: department.id,
            name: department.name,
            description: department.description,
            links: DepartmentLinks {
                department: self_link.clone(),
                self_link,
            },
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(EmployeePage = PageResponse<EmployeeResource>, DepartmentPage = PageResponse<DepartmentResource>)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    /// zero-based page index
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number_of_elements: usize,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            total_pages: page.total_pages(),
            number_of_elements: page.number_of_elements(),
            first: page.is_first(),
            last: page.is_last(),
            empty: page.content.is_empty(),
            number: page.number,
            size: page.size,
            total_elements: page.total_elements,
            content: page.content,
        }
    }
}

use crate::{
    api::{
        page_request,
        resource::{DepartmentResource, EmployeePage, EmployeeResource, PageResponse, json},
    },
    auth::auth::AuthUser,
    config::Config,
    error::ApiError,
    model::employee::{EmployeeInput, EmployeePatch},
    repository::{DepartmentRepository, EmployeeFilter, EmployeeRepository, EmployeeSortField},
};
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Zero-based page index
    #[param(example = 0)]
    pub page: Option<u32>,
    /// Page size
    #[param(example = 10)]
    pub size: Option<u32>,
    /// `property[,asc|desc]`; properties: empno, ename, job, hiredate, sal, comm
    #[param(example = "empno,desc")]
    pub sort: Option<String>,
    /// Restrict to one employee
    pub empno: Option<u64>,
}

fn not_found(empno: u64) -> ApiError {
    ApiError::NotFound(format!("employee {empno} not found"))
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Page of employees", body = EmployeePage),
        (status = 400, description = "Unknown sort property or malformed query")
    ),
    tag = "Employee"
)]
pub async fn list_employees<E: EmployeeRepository>(
    req: HttpRequest,
    repo: web::Data<E>,
    config: web::Data<Config>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    let request =
        page_request::<EmployeeSortField>(&config, query.page, query.size, query.sort.as_deref())?;
    let filter = EmployeeFilter { empno: query.empno };

    let page = repo.find_page(filter, request).await?;
    debug!(
        total = page.total_elements,
        returned = page.content.len(),
        "Listed employees"
    );

    let page = page.try_map(|e| EmployeeResource::new(&req, e))?;
    Ok(json(HttpResponse::Ok(), &PageResponse::from(page)))
}

/// Get employee by empno
#[utoipa::path(
    get,
    path = "/api/employees/{empno}",
    params(("empno" = u64, Path, description = "Employee number")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeResource),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn get_employee<E: EmployeeRepository>(
    req: HttpRequest,
    repo: web::Data<E>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let empno = path.into_inner();
    let employee = repo.find_by_id(empno).await?.ok_or_else(|| not_found(empno))?;
    Ok(json(HttpResponse::Ok(), &EmployeeResource::new(&req, employee)?))
}

/// Manager of an employee
#[utoipa::path(
    get,
    path = "/api/employees/{empno}/mgr",
    params(("empno" = u64, Path, description = "Employee number")),
    responses(
        (status = 200, description = "Manager", body = EmployeeResource),
        (status = 404, description = "Employee unknown or has no manager")
    ),
    tag = "Employee"
)]
pub async fn get_manager<E: EmployeeRepository>(
    req: HttpRequest,
    repo: web::Data<E>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let empno = path.into_inner();
    let employee = repo.find_by_id(empno).await?.ok_or_else(|| not_found(empno))?;
    let mgr = employee
        .mgr
        .ok_or_else(|| ApiError::NotFound(format!("employee {empno} has no manager")))?;
    let manager = repo.find_by_id(mgr).await?.ok_or_else(|| not_found(mgr))?;
    Ok(json(HttpResponse::Ok(), &EmployeeResource::new(&req, manager)?))
}

/// Department of an employee
#[utoipa::path(
    get,
    path = "/api/employees/{empno}/department",
    params(("empno" = u64, Path, description = "Employee number")),
    responses(
        (status = 200, description = "Department", body = DepartmentResource),
        (status = 404, description = "Employee unknown or has no department")
    ),
    tag = "Employee"
)]
pub async fn get_employee_department<E: EmployeeRepository, D: DepartmentRepository>(
    req: HttpRequest,
    employees: web::Data<E>,
    departments: web::Data<D>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let empno = path.into_inner();
    let employee = employees
        .find_by_id(empno)
        .await?
        .ok_or_else(|| not_found(empno))?;
    let id = employee
        .department_id
        .ok_or_else(|| ApiError::NotFound(format!("employee {empno} has no department")))?;
    let department = departments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("department {id} not found")))?;
    Ok(json(HttpResponse::Ok(), &DepartmentResource::new(&req, department)?))
}

/// Create employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResource),
        (status = 400, description = "Malformed body or unknown referenced record"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Employee",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_employee<E: EmployeeRepository>(
    req: HttpRequest,
    auth: AuthUser,
    repo: web::Data<E>,
    payload: web::Json<EmployeeInput>,
) -> Result<HttpResponse, ApiError> {
    let created = repo.create(payload.into_inner()).await?;
    info!(empno = created.empno, by = %auth.username, "Employee created");

    let resource = EmployeeResource::new(&req, created)?;
    let mut builder = HttpResponse::Created();
    builder.insert_header((header::LOCATION, resource.links.self_link.href.clone()));
    Ok(json(builder, &resource))
}

/// Replace employee
#[utoipa::path(
    put,
    path = "/api/employees/{empno}",
    params(("empno" = u64, Path, description = "Employee number")),
    request_body = EmployeeInput,
    responses(
        (status = 200, description = "Employee replaced", body = EmployeeResource),
        (status = 400, description = "Malformed body, unknown reference or management cycle"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_employee<E: EmployeeRepository>(
    req: HttpRequest,
    auth: AuthUser,
    repo: web::Data<E>,
    path: web::Path<u64>,
    payload: web::Json<EmployeeInput>,
) -> Result<HttpResponse, ApiError> {
    let empno = path.into_inner();
    let updated = repo.replace(empno, payload.into_inner()).await?;
    info!(empno, by = %auth.username, "Employee replaced");
    Ok(json(HttpResponse::Ok(), &EmployeeResource::new(&req, updated)?))
}

/// Partially update employee
#[utoipa::path(
    patch,
    path = "/api/employees/{empno}",
    params(("empno" = u64, Path, description = "Employee number")),
    request_body(content = EmployeeInput, description = "Any subset of the employee members; null clears a member"),
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResource),
        (status = 400, description = "Malformed body, unknown reference or management cycle"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn patch_employee<E: EmployeeRepository>(
    req: HttpRequest,
    auth: AuthUser,
    repo: web::Data<E>,
    path: web::Path<u64>,
    payload: web::Json<EmployeePatch>,
) -> Result<HttpResponse, ApiError> {
    let empno = path.into_inner();
    let patch = payload.into_inner();
    let updated = if patch.is_empty() {
        repo.find_by_id(empno).await?.ok_or_else(|| not_found(empno))?
    } else {
        repo.patch(empno, patch).await?
    };
    info!(empno, by = %auth.username, "Employee patched");
    Ok(json(HttpResponse::Ok(), &EmployeeResource::new(&req, updated)?))
}

/// Delete employee
#[utoipa::path(
    delete,
    path = "/api/employees/{empno}",
    params(("empno" = u64, Path, description = "Employee number")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_employee<E: EmployeeRepository>(
    auth: AuthUser,
    repo: web::Data<E>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let empno = path.into_inner();
    repo.delete(empno).await?;
    info!(empno, by = %auth.username, "Employee deleted");
    Ok(HttpResponse::NoContent().finish())
}

use crate::{
    api::{
        page_request,
        resource::{DepartmentPage, DepartmentResource, PageResponse, json},
    },
    auth::auth::AuthUser,
    config::Config,
    error::ApiError,
    model::department::DepartmentInput,
    repository::{DepartmentRepository, DepartmentSortField},
};
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepartmentQuery {
    /// Zero-based page index
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// `property[,asc|desc]`; properties: id, name, description
    #[param(example = "name,asc")]
    pub sort: Option<String>,
}

/// List departments
#[utoipa::path(
    get,
    path = "/api/departments",
    params(DepartmentQuery),
    responses(
        (status = 200, description = "Page of departments", body = DepartmentPage),
        (status = 400, description = "Unknown sort property or malformed query")
    ),
    tag = "Department"
)]
pub async fn list_departments<D: DepartmentRepository>(
    req: HttpRequest,
    repo: web::Data<D>,
    config: web::Data<Config>,
    query: web::Query<DepartmentQuery>,
) -> Result<HttpResponse, ApiError> {
    let request =
        page_request::<DepartmentSortField>(&config, query.page, query.size, query.sort.as_deref())?;
    let page = repo
        .find_page(request)
        .await?
        .try_map(|d| DepartmentResource::new(&req, d))?;
    Ok(json(HttpResponse::Ok(), &PageResponse::from(page)))
}

/// Get department by id
#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department found", body = DepartmentResource),
        (status = 404, description = "Department not found")
    ),
    tag = "Department"
)]
pub async fn get_department<D: DepartmentRepository>(
    req: HttpRequest,
    repo: web::Data<D>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let department = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("department {id} not found")))?;
    Ok(json(HttpResponse::Ok(), &DepartmentResource::new(&req, department)?))
}

/// Create department
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = DepartmentInput,
    responses(
        (status = 201, description = "Department created", body = DepartmentResource),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Department",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_department<D: DepartmentRepository>(
    req: HttpRequest,
    auth: AuthUser,
    repo: web::Data<D>,
    payload: web::Json<DepartmentInput>,
) -> Result<HttpResponse, ApiError> {
    let created = repo.create(payload.into_inner()).await?;
    info!(id = created.id, by = %auth.username, "Department created");

    let resource = DepartmentResource::new(&req, created)?;
    let mut builder = HttpResponse::Created();
    builder.insert_header((header::LOCATION, resource.links.self_link.href.clone()));
    Ok(json(builder, &resource))
}

/// Replace department
#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department id")),
    request_body = DepartmentInput,
    responses(
        (status = 200, description = "Department replaced", body = DepartmentResource),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_department<D: DepartmentRepository>(
    req: HttpRequest,
    auth: AuthUser,
    repo: web::Data<D>,
    path: web::Path<u64>,
    payload: web::Json<DepartmentInput>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let updated = repo.replace(id, payload.into_inner()).await?;
    info!(id, by = %auth.username, "Department replaced");
    Ok(json(HttpResponse::Ok(), &DepartmentResource::new(&req, updated)?))
}

/// Delete department; its employees keep existing without a department
#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department id")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_department<D: DepartmentRepository>(
    auth: AuthUser,
    repo: web::Data<D>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    repo.delete(id).await?;
    info!(id, by = %auth.username, "Department deleted");
    Ok(HttpResponse::NoContent().finish())
}

use crate::api::resource::{
    DepartmentLinks, DepartmentPage, DepartmentResource, EmployeeLinks, EmployeePage,
    EmployeeResource, Href,
};
use crate::model::{department::DepartmentInput, employee::EmployeeInput, role::Role};
use crate::models::{LoginReqDto, LoginResponse, Principal, RegisterRequest};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Employee Directory API",
        version = "1.0.0",
        description = r#"
## Employee Directory

CRUD over **employees** and **departments**, with a small **user** store for authentication.

### Resources
- **Employees** have an optional manager (another employee) and an optional department.
  Writes accept nested `mgr` / `department` bodies: a body with only an id references an
  existing record, a body with an id and members updates it, a body without an id creates it.
- **Departments** can be managed on their own; deleting one leaves its employees in place.

### Security
Reads are public. Writes need `Authorization: Basic ...` or a bearer token from `POST /auth/login`.

### Response format
- `application/json;charset=UTF-8`
- Entities carry `_links`; lists are pages (`content`, `number`, `size`, `totalElements`, ...)
- `hiredate` is epoch milliseconds
"#,
    ),
    paths(
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::get_manager,
        crate::api::employee::get_employee_department,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::patch_employee,
        crate::api::employee::delete_employee,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::auth::handlers::login,
        crate::auth::handlers::register,
        crate::auth::handlers::me
    ),
    components(
        schemas(
            EmployeeInput,
            DepartmentInput,
            Href,
            EmployeeLinks,
            EmployeeResource,
            EmployeePage,
            DepartmentLinks,
            DepartmentResource,
            DepartmentPage,
            Role,
            LoginReqDto,
            LoginResponse,
            RegisterRequest,
            Principal
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "Auth", description = "Login and user registration"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        );
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

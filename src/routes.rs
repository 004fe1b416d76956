use crate::{
    api::{
        department, employee,
        resource::route,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::ApiError,
    repository::{DepartmentRepository, EmployeeRepository, UserRepository},
    utils::user_cache::UserCache,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;
use std::time::Duration;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Limiter {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are non-zero");
    Arc::new(Governor::new(&cfg))
}

/// Everything the routes need, shared by all workers.
pub struct AppState<E, D, U> {
    pub config: web::Data<Config>,
    pub employees: web::Data<E>,
    pub departments: web::Data<D>,
    pub users: web::Data<U>,
    pub user_cache: web::Data<UserCache>,
    login_limiter: Limiter,
    register_limiter: Limiter,
}

impl<E, D, U> AppState<E, D, U>
where
    E: EmployeeRepository,
    D: DepartmentRepository,
    U: UserRepository,
{
    pub fn new(config: Config, employees: E, departments: D, users: U) -> Self {
        let user_cache = UserCache::new(
            config.user_cache_capacity,
            Duration::from_secs(config.user_cache_ttl),
        );
        Self {
            login_limiter: build_limiter(config.rate_login_per_min),
            register_limiter: build_limiter(config.rate_register_per_min),
            config: web::Data::new(config),
            employees: web::Data::new(employees),
            departments: web::Data::new(departments),
            users: web::Data::new(users),
            user_cache: web::Data::new(user_cache),
        }
    }
}

impl<E, D, U> Clone for AppState<E, D, U> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            employees: self.employees.clone(),
            departments: self.departments.clone(),
            users: self.users.clone(),
            user_cache: self.user_cache.clone(),
            login_limiter: self.login_limiter.clone(),
            register_limiter: self.register_limiter.clone(),
        }
    }
}

pub fn configure<E, D, U>(cfg: &mut web::ServiceConfig, state: &AppState<E, D, U>)
where
    E: EmployeeRepository,
    D: DepartmentRepository,
    U: UserRepository,
{
    cfg.app_data(state.config.clone())
        .app_data(state.employees.clone())
        .app_data(state.departments.clone())
        .app_data(state.users.clone())
        .app_data(state.user_cache.clone())
        // extractor failures answer with the same JSON error body as handlers
        .app_data(web::JsonConfig::default().error_handler(|err, _| {
            ApiError::BadRequest(format!("Malformed request body: {err}")).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _| {
            ApiError::BadRequest(format!("Malformed query: {err}")).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _| {
            ApiError::BadRequest(format!("Malformed path: {err}")).into()
        }));

    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(state.login_limiter.clone())
                    .route(web::post().to(handlers::login::<U>)),
            )
            .service(
                web::resource("/register")
                    .wrap(from_fn(auth_middleware::<U>))
                    .wrap(state.register_limiter.clone())
                    .route(web::post().to(handlers::register::<U>)),
            )
            .service(
                web::resource("/me")
                    .wrap(from_fn(auth_middleware::<U>))
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Reads are public; writes require credentials
    cfg.service(
        web::scope(&state.config.api_prefix)
            .wrap(from_fn(auth_middleware::<U>))
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees::<E>))
                            .route(web::post().to(employee::create_employee::<E>)),
                    )
                    // /employees/{empno}
                    .service(
                        web::resource("/{empno}")
                            .name(route::EMPLOYEE)
                            .route(web::get().to(employee::get_employee::<E>))
                            .route(web::put().to(employee::update_employee::<E>))
                            .route(web::patch().to(employee::patch_employee::<E>))
                            .route(web::delete().to(employee::delete_employee::<E>)),
                    )
                    // /employees/{empno}/mgr
                    .service(
                        web::resource("/{empno}/mgr")
                            .name(route::EMPLOYEE_MGR)
                            .route(web::get().to(employee::get_manager::<E>)),
                    )
                    // /employees/{empno}/department
                    .service(
                        web::resource("/{empno}/department")
                            .name(route::EMPLOYEE_DEPARTMENT)
                            .route(web::get().to(employee::get_employee_department::<E, D>)),
                    ),
            )
            .service(
                web::scope("/departments")
                    // /departments
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments::<D>))
                            .route(web::post().to(department::create_department::<D>)),
                    )
                    // /departments/{id}
                    .service(
                        web::resource("/{id}")
                            .name(route::DEPARTMENT)
                            .route(web::get().to(department::get_department::<D>))
                            .route(web::put().to(department::update_department::<D>))
                            .route(web::delete().to(department::delete_department::<D>)),
                    ),
            ),
    );
}

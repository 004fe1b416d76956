use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use employee_directory::{
    auth::handlers::seed_admin,
    config::{Config, Storage},
    db::init_db,
    docs::ApiDoc,
    repository::{
        DepartmentRepository, EmployeeRepository, MemoryDb, MemoryDepartmentRepository,
        MemoryEmployeeRepository, MemoryUserRepository, MySqlDepartmentRepository,
        MySqlEmployeeRepository, MySqlUserRepository, UserRepository,
    },
    routes::{self, AppState},
};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(storage = %config.storage, addr = %config.server_addr, "Server starting...");
    if config.jwt_secret == Config::default().jwt_secret {
        warn!("JWT_SECRET is the placeholder value");
    }

    match config.storage {
        Storage::Memory => {
            let db = MemoryDb::new();
            serve(
                config,
                MemoryEmployeeRepository::new(db.clone()),
                MemoryDepartmentRepository::new(db.clone()),
                MemoryUserRepository::new(db),
            )
            .await
        }
        Storage::MySql => {
            let url = config
                .database_url
                .clone()
                .context("DATABASE_URL must be set when STORAGE=mysql")?;
            let pool = init_db(&url).await?;
            serve(
                config,
                MySqlEmployeeRepository::new(pool.clone()),
                MySqlDepartmentRepository::new(pool.clone()),
                MySqlUserRepository::new(pool),
            )
            .await
        }
    }
}

async fn serve<E, D, U>(config: Config, employees: E, departments: D, users: U) -> anyhow::Result<()>
where
    E: EmployeeRepository,
    D: DepartmentRepository,
    U: UserRepository,
{
    seed_admin(&users, &config).await?;

    let server_addr = config.server_addr.clone();
    let state = AppState::new(config, employees, departments, users);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} matches the UI's JS/CSS files
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(|cfg| routes::configure(cfg, &state))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}

#![allow(dead_code)]

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::header,
    middleware::NormalizePath,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use employee_directory::{
    auth::{handlers::seed_admin, jwt::generate_access_token, password::hash_password},
    config::Config,
    model::{role::Role, user::NewUser},
    repository::{
        MemoryDb, MemoryDepartmentRepository, MemoryEmployeeRepository, MemoryUserRepository,
        UserRepository,
    },
    routes::{self, AppState},
};
use serde_json::Value;
use std::net::SocketAddr;

pub const ADMIN: (&str, &str) = ("admin", "admin-pass");
pub const CLERK: (&str, &str) = ("clerk", "clerk-pass");
pub const SECRET: &str = "test-secret";
/// The login and register limiters key on the peer address.
pub const PEER: &str = "127.0.0.1:40000";

pub type State = AppState<MemoryEmployeeRepository, MemoryDepartmentRepository, MemoryUserRepository>;

pub struct TestCtx {
    pub state: State,
    pub admin_token: String,
    pub clerk_token: String,
}

pub fn config() -> Config {
    Config {
        jwt_secret: SECRET.to_string(),
        admin_username: Some(ADMIN.0.to_string()),
        admin_password: Some(ADMIN.1.to_string()),
        ..Config::default()
    }
}

/// Fresh in-memory store with an admin and a regular user.
pub async fn setup() -> TestCtx {
    let config = config();
    let db = MemoryDb::new();
    let users = MemoryUserRepository::new(db.clone());

    seed_admin(&users, &config).await.unwrap();
    users
        .create(NewUser {
            username: CLERK.0.to_string(),
            password: hash_password(CLERK.1).unwrap(),
            role: Role::User,
        })
        .await
        .unwrap();

    let token_for = |name: &str| {
        let users = users.clone();
        let name = name.to_string();
        async move {
            let user = users.find_by_username(&name).await.unwrap().unwrap();
            generate_access_token(&user, SECRET, 600).unwrap()
        }
    };
    let admin_token = token_for(ADMIN.0).await;
    let clerk_token = token_for(CLERK.0).await;

    let state = AppState::new(
        config,
        MemoryEmployeeRepository::new(db.clone()),
        MemoryDepartmentRepository::new(db),
        users,
    );

    TestCtx {
        state,
        admin_token,
        clerk_token,
    }
}

pub fn app(
    state: State,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(NormalizePath::trim())
        .configure(move |cfg| routes::configure(cfg, &state))
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

pub fn basic(username: &str, password: &str) -> (header::HeaderName, String) {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    (header::AUTHORIZATION, format!("Basic {encoded}"))
}

pub fn content_type(resp: &ServiceResponse<impl MessageBody>) -> String {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `empno` of an employee resource body.
pub fn empno(body: &Value) -> u64 {
    body["empno"].as_u64().expect("body has an empno")
}

pub fn href(body: &Value, rel: &str) -> String {
    body["_links"][rel]["href"]
        .as_str()
        .expect("link present")
        .to_string()
}

pub fn peer() -> SocketAddr {
    PEER.parse().unwrap()
}

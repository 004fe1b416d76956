use crate::{
    api::resource::json,
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{ApiError, RepoError},
    model::{role::Role, user::NewUser},
    models::{LoginReqDto, LoginResponse, Principal, RegisterRequest},
    repository::UserRepository,
    utils::user_cache::UserCache,
};
use actix_web::{HttpResponse, web};
use tracing::{debug, error, info, instrument};

/// Log in
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(users, cache, config, user),
    fields(username = %user.username)
)]
pub async fn login<U: UserRepository>(
    user: web::Json<LoginReqDto>,
    users: web::Data<U>,
    cache: web::Data<UserCache>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ApiError::BadRequest("Username or password required".into()));
    }

    // 2️⃣ Fetch user
    let db_user = match cache.get_or_load(&user.username, users.get_ref()).await? {
        Some(u) if u.is_active => {
            debug!(user_id = u.id, "User found");
            u
        }
        _ => {
            info!("Invalid credentials: user not found or inactive");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    // 3️⃣ Verify password
    let password = user.password.clone();
    let hash = db_user.password.clone();
    let verified = web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|_| ApiError::Internal)?;
    if let Err(e) = verified {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    // 4️⃣ Generate access token
    let access_token = generate_access_token(&db_user, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            ApiError::Internal
        })?;

    info!("Login successful");

    Ok(json(
        HttpResponse::Ok(),
        &LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: config.access_token_ttl,
        },
    ))
}

/// Register a user (admin only)
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = Principal),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Username already exists")
    ),
    tag = "Auth",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn register<U: UserRepository>(
    auth: AuthUser,
    body: web::Json<RegisterRequest>,
    users: web::Data<U>,
    cache: web::Data<UserCache>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let body = body.into_inner();
    let username = body.username.trim().to_string();
    if username.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password must not be empty".into(),
        ));
    }
    let role = match body.role_id {
        None => Role::User,
        Some(id) => Role::from_id(id)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown role id {id}")))?,
    };

    let password = body.password;
    let hashed = web::block(move || hash_password(&password))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|e| {
            error!(error = %e, "Failed to hash password");
            ApiError::Internal
        })?;

    let created = users
        .create(NewUser {
            username: username.clone(),
            password: hashed,
            role,
        })
        .await
        .map_err(|e| match e {
            RepoError::Conflict(_) => ApiError::Conflict("Username already exists".into()),
            other => other.into(),
        })?;
    cache.invalidate(&username).await;

    info!(user_id = created.id, username = %created.username, by = %auth.username, "User registered");

    Ok(json(
        HttpResponse::Created(),
        &Principal {
            user_id: created.id,
            username: created.username,
            role,
        },
    ))
}

/// Current principal
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = Principal),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Auth",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn me(auth: AuthUser) -> HttpResponse {
    json(
        HttpResponse::Ok(),
        &Principal {
            user_id: auth.user_id,
            username: auth.username,
            role: auth.role,
        },
    )
}

/// Creates the configured admin account if it is missing.
pub async fn seed_admin<U: UserRepository>(users: &U, config: &Config) -> anyhow::Result<()> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    if users.find_by_username(username).await?.is_some() {
        debug!(username = %username, "Admin account present");
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;
    users
        .create(NewUser {
            username: username.clone(),
            password: hashed,
            role: Role::Admin,
        })
        .await?;

    info!(username = %username, "Seeded admin account");
    Ok(())
}

use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::auth::password::verify_password;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::repository::UserRepository;
use crate::utils::user_cache::UserCache;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header},
    web::{self, Data},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::{debug, info};

/// Authenticates `Basic` and `Bearer` credentials.
///
/// A request that carries credentials must present valid ones. A request
/// without credentials passes through for safe methods and is rejected for
/// anything that writes.
pub async fn auth_middleware<U: UserRepository>(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|h| h.to_str().map(str::to_owned));

    let auth_user = match header_value {
        None if is_safe(req.method()) => return next.call(req).await,
        None => Err(ApiError::Unauthorized("Missing Authorization header".into())),
        Some(Err(_)) => Err(ApiError::Unauthorized(
            "Invalid Authorization header encoding".into(),
        )),
        Some(Ok(value)) => authenticate::<U>(&req, &value).await,
    };

    match auth_user {
        Ok(user) => {
            debug!(user_id = user.user_id, username = %user.username, "Authenticated");
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(e) => Ok(req.into_response(e.error_response())),
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

async fn authenticate<U: UserRepository>(
    req: &ServiceRequest,
    header_value: &str,
) -> Result<AuthUser, ApiError> {
    if let Some(token) = header_value.strip_prefix("Bearer ") {
        let config = req.app_data::<Data<Config>>().ok_or(ApiError::Internal)?;
        let claims = verify_token(token.trim(), &config.jwt_secret).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;
        let role = Role::from_id(claims.role)
            .ok_or_else(|| ApiError::Unauthorized("Invalid role".into()))?;
        return Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
        });
    }

    if let Some(encoded) = header_value.strip_prefix("Basic ") {
        let users = req.app_data::<Data<U>>().ok_or(ApiError::Internal)?;
        let cache = req.app_data::<Data<UserCache>>().ok_or(ApiError::Internal)?;
        let (username, password) = decode_basic(encoded)?;

        let bad_credentials = || ApiError::Unauthorized("Invalid credentials".into());

        let user = match cache.get_or_load(&username, users.get_ref()).await? {
            Some(user) if user.is_active => user,
            _ => {
                info!(username = %username, "Basic authentication failed: unknown or inactive user");
                return Err(bad_credentials());
            }
        };

        // argon2 is CPU bound; keep it off the async workers
        let hash = user.password.clone();
        let verified = web::block(move || verify_password(&password, &hash))
            .await
            .map_err(|_| ApiError::Internal)?;
        if verified.is_err() {
            info!(username = %username, "Basic authentication failed: password mismatch");
            return Err(bad_credentials());
        }

        let role = user.role().ok_or_else(|| ApiError::Unauthorized("Invalid role".into()))?;
        return Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            role,
        });
    }

    Err(ApiError::Unauthorized(
        "Unsupported authorization scheme".into(),
    ))
}

/// `base64(username:password)` → parts. The password may contain `:`.
fn decode_basic(encoded: &str) -> Result<(String, String), ApiError> {
    let malformed = || ApiError::Unauthorized("Malformed Basic credentials".into());
    let raw = STANDARD.decode(encoded.trim()).map_err(|_| malformed())?;
    let text = String::from_utf8(raw).map_err(|_| malformed())?;
    let (username, password) = text.split_once(':').ok_or_else(malformed)?;
    Ok((username.to_string(), password.to_string()))
}

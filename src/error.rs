use actix_web::{
    HttpResponse, ResponseError,
    http::{StatusCode, header},
};
use derive_more::Display;
use serde_json::json;
use tracing::error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Failures raised by the repository layer.
#[derive(Debug, Display)]
pub enum RepoError {
    #[display(fmt = "{} {} not found", entity, id)]
    NotFound { entity: &'static str, id: u64 },

    #[display(fmt = "referenced {} {} does not exist", entity, id)]
    UnknownReference { entity: &'static str, id: u64 },

    #[display(fmt = "{}", _0)]
    Invalid(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "store unavailable")]
    Unavailable,
}

impl std::error::Error for RepoError {}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        RepoError::Database(e)
    }
}

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "Something went wrong, contact the system admin")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, r#"Basic realm="employees""#));
        }
        builder
            .insert_header((header::CONTENT_TYPE, crate::api::resource::JSON_UTF8))
            .json(json!({
                "status": status.as_u16(),
                "error": status.canonical_reason().unwrap_or("Error"),
                "message": self.to_string(),
            }))
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            RepoError::UnknownReference { .. } | RepoError::Invalid(_) => {
                ApiError::BadRequest(e.to_string())
            }
            RepoError::Conflict(_) => ApiError::Conflict(e.to_string()),
            RepoError::Database(_) | RepoError::Unavailable => {
                error!(error = %e, "Store operation failed");
                ApiError::Internal
            }
        }
    }
}

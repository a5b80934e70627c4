use actix_web::{HttpResponse, http::StatusCode};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Unified error type returned by every service and handler.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient stock for book: {0}")]
    InsufficientStock(String),

    #[error("{0}")]
    InvariantViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(m) => format!("{}: {}", field, m),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();
        if details.is_empty() {
            // nested (per-item) failures carry no top-level field entry
            return ServiceError::Validation("Validation failed".to_string());
        }
        ServiceError::Validation(details.join("; "))
    }
}

impl actix_web::ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::InsufficientStock(_)
            | ServiceError::InvariantViolation(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidCredentials | ServiceError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Internal detail stays in the server log, never in the body
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            eprintln!("❌ Internal error: {}", self);
            return HttpResponse::build(status).json(json!({
                "error": "Internal server error"
            }));
        }

        HttpResponse::build(status).json(json!({
            "error": self.to_string()
        }))
    }
}

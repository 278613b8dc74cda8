use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    Database(SqlxError),

    #[error("Constraint violation: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RegistryError::Validation(msg.into())
    }
}

impl From<SqlxError> for RegistryError {
    fn from(e: SqlxError) -> Self {
        let unique = e
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());
        if unique {
            RegistryError::Conflict(e.to_string())
        } else {
            RegistryError::Database(e)
        }
    }
}

impl From<figment::Error> for RegistryError {
    fn from(e: figment::Error) -> Self {
        RegistryError::Config(Box::new(e))
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            RegistryError::Validation(msg) => {
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorBody {
                    code: "BAD_REQUEST".to_string(),
                    message: msg,
                };
                (status, body)
            }
            RegistryError::Conflict(_) => {
                let status = StatusCode::CONFLICT;
                let body = ApiErrorBody {
                    code: "CONFLICT".to_string(),
                    message: "The record conflicts with existing data.".to_string(),
                };
                (status, body)
            }
            RegistryError::Database(_) | RegistryError::Config(_) | RegistryError::Io(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                };
                (status, body)
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

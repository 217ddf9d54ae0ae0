use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::respond;

/// Body shape shared by every failing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// A request field violated one of its documented constraints.
    #[error("{0}")]
    Validation(String),
    /// The request body could not be decoded into the expected payload.
    #[error("Invalid JSON body: {0}")]
    BadJson(String),
    /// The update/delete target id matched no row.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The `path` parameter named no resource, or the (method, resource)
    /// pair is outside the route table.
    #[error("Not found")]
    UnknownRoute,
    /// Method outside GET/POST/PUT/DELETE/OPTIONS.
    #[error("Method not allowed")]
    MethodNotAllowed,
    /// A uniqueness or foreign-key constraint rejected the write.
    #[error("Conflict: the change violates a relational constraint")]
    Conflict,
    /// Any other storage failure. Raw driver detail stays in the logs.
    #[error("Internal server error")]
    Database(#[source] sqlx::Error),
    /// A row held a value the JSON encoder cannot represent.
    #[error("Internal server error")]
    Serialize(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadJson(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::UnknownRoute => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation => return ApiError::Conflict,
                _ => {}
            }
        }
        ApiError::Database(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialize(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(source) => tracing::error!(error = %source, "storage error"),
            ApiError::Serialize(source) => {
                tracing::error!(error = %source, "response serialization error")
            }
            _ => {}
        }
        respond(
            self.status_code(),
            &ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}

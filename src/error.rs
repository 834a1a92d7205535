use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::error;

use crate::schema;

/// Failures surfaced by the schema store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Constraint violation on {index}")]
    ConstraintViolation { index: String },

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_constraint(&self) -> bool {
        !matches!(self, StoreError::Database(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let Some(db_err) = err.as_database_error() else {
            return StoreError::Database(err);
        };

        match db_err.kind() {
            ErrorKind::UniqueViolation => StoreError::ConstraintViolation {
                index: unique_index_from_message(db_err.message()),
            },
            ErrorKind::ForeignKeyViolation => {
                StoreError::ReferentialIntegrity(db_err.message().to_string())
            }
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                StoreError::Domain(db_err.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Maps "UNIQUE constraint failed: enrollments.class_id, enrollments.student_id"
/// back to the catalog's index name.
fn unique_index_from_message(message: &str) -> String {
    let Some((_, cols)) = message.split_once(": ") else {
        return message.to_string();
    };

    let mut table = None;
    let mut columns = Vec::new();
    for qualified in cols.split(", ") {
        let Some((t, c)) = qualified.trim().split_once('.') else {
            return message.to_string();
        };
        table.get_or_insert(t);
        columns.push(c);
    }

    table
        .and_then(|t| schema::unique_index_on(t, &columns))
        .map(|idx| idx.name.to_string())
        .unwrap_or_else(|| cols.to_string())
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e) if e.is_constraint() => (StatusCode::CONFLICT, e.to_string()),
            AppError::Store(e) => {
                error!("academic service error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}

//! HTTP mapping of catalog failures.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::catalog_store::{CatalogError, EntityKind};

fn error_body(status: StatusCode, code: &str, message: String) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message,
        }
    }));
    (status, body).into_response()
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        match self {
            CatalogError::NotFound { .. } => {
                debug!("{}", self);
                error_body(StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            }
            CatalogError::Validation(ref err) => {
                debug!("Rejected body: {}", err);
                error_body(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", err.to_string())
            }
            CatalogError::Storage(ref err) => {
                error!("Catalog storage failure: {:#}", err);
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

/// Failures a handler can return before or after touching the catalog.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A path segment that can never name an entity.
    #[error("{kind} '{raw}' not found")]
    MalformedId { kind: EntityKind, raw: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Catalog(err) => err.into_response(),
            ApiError::MalformedId { .. } => {
                debug!("{}", self);
                error_body(StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            }
            ApiError::InvalidBody(message) => {
                debug!("Rejected body: {}", message);
                error_body(StatusCode::BAD_REQUEST, "INVALID_BODY", message)
            }
        }
    }
}

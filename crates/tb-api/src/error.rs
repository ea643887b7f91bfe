//! API error handling
//!
//! Every failure is rendered as `{"error": <code>, "message": ..., "details": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tb_core::config::ConfigError;
use tb_core::error::{TbError, ValidationErrors};
use tb_services::{KanbanError, ResolveError, WriteError};

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound { resource: &'static str, id: String },
    Validation(ValidationErrors),
    BadRequest(String),
    Conflict(String),
    /// The backend failed or returned nothing usable
    Backend(String),
    /// Data for the request has not been loaded yet
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        ApiError::Backend(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::Validation(_) => "validation_failed",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::Backend(_) => "backend_error",
            ApiError::Unavailable(_) => "not_loaded",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<ValidationDetails>,
}

#[derive(Serialize)]
struct ValidationDetails {
    fields: std::collections::HashMap<String, Vec<String>>,
    base: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.code();

        let body = match self {
            ApiError::NotFound { resource, id } => ErrorBody {
                error,
                message: format!("{} with id {} not found", resource, id),
                details: None,
            },
            ApiError::Validation(errors) => ErrorBody {
                error,
                message: errors.full_messages().join(", "),
                details: Some(ValidationDetails {
                    fields: errors.errors,
                    base: errors.base_errors,
                }),
            },
            ApiError::BadRequest(message)
            | ApiError::Conflict(message)
            | ApiError::Backend(message)
            | ApiError::Unavailable(message)
            | ApiError::Internal(message) => ErrorBody {
                error,
                message,
                details: None,
            },
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), message = %body.message, "Request failed");
        }

        (status, Json(body)).into_response()
    }
}

impl From<TbError> for ApiError {
    fn from(err: TbError) -> Self {
        match err {
            TbError::NotFound { entity, id } => ApiError::NotFound {
                resource: entity,
                id,
            },
            TbError::Validation(errors) => ApiError::Validation(errors),
            TbError::Backend(msg) => ApiError::Backend(msg),
            TbError::Config(msg) | TbError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<WriteError> for ApiError {
    fn from(err: WriteError) -> Self {
        TbError::from(err).into()
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        TbError::from(err).into()
    }
}

impl From<KanbanError> for ApiError {
    fn from(err: KanbanError) -> Self {
        match err {
            KanbanError::StaleSource { .. } => ApiError::Conflict(err.to_string()),
            KanbanError::OutOfRange { .. } => ApiError::BadRequest(err.to_string()),
            KanbanError::Write { .. } => ApiError::Backend(err.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

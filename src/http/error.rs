use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    auth::session::SessionError,
    config::ConfigError,
    consent::ConsentError,
    reporting::{ReportingError, StoreError},
    secrets::SecretError,
    security::SecurityError,
};

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ConsentError> for AppError {
    fn from(value: ConsentError) -> Self {
        match value {
            ConsentError::InvalidTenantSelector => AppError::bad_request(value.to_string()),
            ConsentError::Config(_) | ConsentError::Secret(_) | ConsentError::Security(_) => {
                AppError::internal(value.to_string())
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::internal(value.to_string())
    }
}

impl From<SecretError> for AppError {
    fn from(value: SecretError) -> Self {
        AppError::internal(value.to_string())
    }
}

impl From<SecurityError> for AppError {
    fn from(value: SecurityError) -> Self {
        AppError::internal(value.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        AppError::unauthorized(value.to_string())
    }
}

impl From<ReportingError> for AppError {
    fn from(value: ReportingError) -> Self {
        match value {
            ReportingError::NotAuthorized => AppError::forbidden(value.to_string()),
            ReportingError::Store(err) => AppError::from(err),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::internal(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::internal(value.to_string())
    }
}

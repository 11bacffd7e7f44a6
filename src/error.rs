use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::user::repo::StoreError;

/// Errors surfaced by the user API. Every client-input variant leaves the
/// user store untouched.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a user with this email already exists")]
    DuplicateUser,
    #[error("password must be at least {min_length} characters")]
    InvalidPassword { min_length: usize },
    #[error("unable to authenticate with provided credentials")]
    Authentication,
    #[error("{0}")]
    Validation(String),
    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateUser,
            StoreError::Database(e) => AuthError::Internal(e.into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateUser => "DUPLICATE_USER",
            Self::InvalidPassword { .. } => "INVALID_PASSWORD",
            Self::Authentication => "AUTHENTICATION_FAILED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateUser
            | Self::InvalidPassword { .. }
            | Self::Authentication
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(e) => {
                error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.code(),
            message: &message,
        };
        (self.status(), Json(body)).into_response()
    }
}

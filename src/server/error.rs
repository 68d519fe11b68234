use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::progression::auth::AuthError;
use crate::progression::error::SyncError;

const LOG_TARGET: &str = "server::error";

/// Wire-level error mapping. Internal storage detail never reaches the
/// response body; it goes to the log only.
#[derive(Debug)]
pub enum ApiError {
    MissingCredentials,
    AuthDenied(&'static str),
    InvalidBody,
    MissingFields(Vec<&'static str>),
    OutdatedData,
    NotRoundOwner,
    RoundFinalized,
    NotFound(&'static str),
    Database(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<&'static str>>,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            missing: None,
        }
    }

    fn with_missing(message: impl Into<String>, missing: Vec<&'static str>) -> Self {
        Self {
            error: message.into(),
            missing: Some(missing),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => Self::MissingCredentials,
            AuthError::InvalidToken => Self::AuthDenied("Invalid API token"),
            AuthError::TokenDisabled => Self::AuthDenied("Disabled API token"),
            AuthError::IdentityMismatch => {
                Self::AuthDenied("API token not authorized for use with this server")
            }
            AuthError::Storage(err) => Self::from(err),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Database(detail) => Self::Database(detail.to_string()),
            SyncError::MissingFields(keys) => Self::MissingFields(keys),
            SyncError::OutdatedData { .. } => Self::OutdatedData,
            SyncError::NotFound(what) => Self::NotFound(what),
            SyncError::NotRoundOwner => Self::NotRoundOwner,
            SyncError::AlreadyFinalized => Self::RoundFinalized,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Missing required auth headers"),
            ),
            Self::AuthDenied(message) => (StatusCode::FORBIDDEN, ErrorBody::new(message)),
            Self::InvalidBody => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Missing or invalid body JSON data"),
            ),
            Self::MissingFields(keys) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::with_missing("Missing or invalid body JSON data", keys),
            ),
            Self::OutdatedData => (StatusCode::BAD_REQUEST, ErrorBody::new("Outdated data")),
            Self::NotRoundOwner => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("You cannot finalize a round you did not create"),
            ),
            Self::RoundFinalized => (
                StatusCode::LOCKED,
                ErrorBody::new("Round has already been finalized"),
            ),
            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new(format!("{what} not found")),
            ),
            Self::Database(detail) => {
                error!(target = LOG_TARGET, %detail, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Database error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

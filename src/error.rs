//! Error types for the flag engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message a guarded decision point reports when none is supplied.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "This feature is currently disabled";

// == Flag Error Enum ==
/// Unified error type for flag mutations and lookups.
///
/// Evaluation never produces one of these: a missing or disabled flag
/// resolves to `false` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// Mutation target does not exist
    #[error("Flag not found: {0}")]
    NotFound(String),

    /// A flag with this key already exists
    #[error("Flag with key '{0}' already exists")]
    Duplicate(String),

    /// Strategy configuration does not match its strategy type
    #[error("Invalid strategy config: {0}")]
    InvalidStrategyConfig(String),

    /// A guarded decision point found the flag off
    #[error("{message}")]
    FeatureDisabled { flag_key: String, message: String },

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for FlagError {
    fn into_response(self) -> Response {
        let status = match &self {
            FlagError::NotFound(_) => StatusCode::NOT_FOUND,
            FlagError::Duplicate(_) => StatusCode::CONFLICT,
            FlagError::InvalidStrategyConfig(_) => StatusCode::BAD_REQUEST,
            FlagError::FeatureDisabled { .. } => StatusCode::FORBIDDEN,
            FlagError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the flag engine.
pub type Result<T> = std::result::Result<T, FlagError>;

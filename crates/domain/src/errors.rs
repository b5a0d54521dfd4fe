//! Error types used throughout the analytics engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for VisaPath
///
/// Validation errors (`InvalidFilter`, `InvalidRange`, `UnauthorizedScope`)
/// are raised before any storage query is issued. `Database` errors abort
/// the whole aggregate computation they occur in; partial dashboards are
/// never returned as success.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum VisaPathError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Unauthorized scope: {0}")]
    UnauthorizedScope(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for VisaPath operations
pub type Result<T> = std::result::Result<T, VisaPathError>;

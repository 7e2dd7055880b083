//! Unified error handling for the witkit library.
//!
//! This module provides a comprehensive error hierarchy using `thiserror` for better
//! programmatic error handling and more informative error messages.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all witkit operations
#[derive(Error, Debug)]
pub enum WitkitError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Errors from Azure DevOps REST API interactions
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: the personal access token was rejected (HTTP 401)")]
    Unauthorized,

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Failed to parse API response: {message}")]
    ParseError { message: String },

    #[error("Azure DevOps client error: {0}")]
    Client(#[from] azure_core::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from configuration loading and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting '{field}' (set it via CLI, the {env_var} environment variable, or the credentials file)")]
    MissingRequired { field: String, env_var: String },

    #[error("Failed to read config file {path}: {message}")]
    FileReadError { path: PathBuf, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to create directory {path}: {message}")]
    DirectoryCreationError { path: PathBuf, message: String },
}

/// Errors from bulk test case import
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported import format '{extension}' (expected .json or .csv)")]
    UnsupportedFormat { extension: String },

    #[error("Record {index} is invalid: {reason}")]
    RecordInvalid { index: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for witkit operations
pub type WitkitResult<T> = std::result::Result<T, WitkitError>;

/// Result alias for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Result alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result alias for import operations
pub type ImportResult<T> = std::result::Result<T, ImportError>;

impl ApiError {
    /// Map an HTTP status and response body into the matching error variant.
    ///
    /// 401 becomes [`ApiError::Unauthorized`], 404 becomes [`ApiError::NotFound`]
    /// and everything else is surfaced as [`ApiError::RequestFailed`] with the
    /// raw response body as the message.
    pub fn from_status(status: u16, resource: &str, body: String) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound {
                resource: resource.to_string(),
            },
            _ => ApiError::RequestFailed {
                status,
                message: body,
            },
        }
    }
}

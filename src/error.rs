//! Error types for the Airlift deploy pipeline.
//!
//! This module provides the error hierarchy for all operations in the
//! deploy lifecycle: configuration, local staging, the hosting API, and
//! the content-addressed sync engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Airlift deploy pipeline.
#[derive(Debug, Error)]
pub enum AirliftError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local staging errors.
    #[error("Staging error: {0}")]
    Stage(#[from] StageError),

    /// Hosting API errors.
    #[error("Airlift API error: {0}")]
    Api(#[from] ApiError),

    /// Sync engine errors.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// The authentication token is missing.
    #[error("User authentication token is required (set AIRLIFT_TOKEN or pass --token)")]
    MissingToken,

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Local staging errors.
#[derive(Debug, Error)]
pub enum StageError {
    /// The application root directory does not exist.
    #[error("The directory {path} does not exist")]
    RootMissing {
        /// The missing root directory.
        path: PathBuf,
    },

    /// An exclusion pattern could not be compiled.
    #[error("Invalid exclusion pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Description of the problem.
        message: String,
    },

    /// A file could not be copied into the staging directory.
    #[error("Failed to stage {path}: {message}")]
    CopyFailed {
        /// Source path of the file.
        path: PathBuf,
        /// Description of the copy failure.
        message: String,
    },

    /// The staging directory could not be created.
    #[error("Failed to create staging directory: {message}")]
    TempDirFailed {
        /// Description of the failure.
        message: String,
    },
}

/// Hosting API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource does not exist (HTTP 404).
    ///
    /// On build creation this means the application has not been created
    /// yet; it is the only classification with an automated recovery.
    #[error("Not found: {message}")]
    NotFound {
        /// Error message from the API.
        message: String,
    },

    /// The credential was rejected (HTTP 401/403).
    #[error("{message}")]
    Unauthorized {
        /// Error message from the API, surfaced verbatim.
        message: String,
    },

    /// The remote accepted the request but signalled a soft failure
    /// (a `status` or `error` field on an otherwise successful response).
    #[error("{message}")]
    Rejected {
        /// The remote's error value.
        message: String,
    },

    /// The remote returned a structurally invalid success response.
    #[error(
        "Unexpected build data.\n\
         ====== Build Data Start ======\n\
         {payload}\n\
         ====== Build Data End ======\n\
         Contact support@airlift.sh with this data for diagnostic purposes."
    )]
    UnexpectedBuild {
        /// The raw response payload, for diagnostics.
        payload: String,
    },

    /// Any other non-2xx response.
    #[error("API request failed: {status} - {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message, from the remote error body when present.
        message: String,
    },

    /// Network error.
    #[error("Network error communicating with the Airlift API: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("Invalid response from the Airlift API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Sync engine errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The build's storage credentials could not be decoded.
    #[error("Failed to decode build storage credentials: {message}")]
    CredentialDecode {
        /// Description of the decode failure.
        message: String,
    },

    /// The sync engine exhausted its recovery attempts.
    #[error("Sync failed: {message}")]
    Fatal {
        /// Description of the fatal sync failure.
        message: String,
    },

    /// An upload failed permanently for a specific file.
    #[error("Upload failed for {path}: {message}")]
    UploadFailed {
        /// Relative path of the file.
        path: String,
        /// Description of the upload failure.
        message: String,
    },
}

/// Result type alias for Airlift operations.
pub type Result<T> = std::result::Result<T, AirliftError>;

impl AirliftError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is a not-found API failure.
    ///
    /// Not-found on build creation triggers the create-application
    /// recovery branch; every other classification is fatal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound { .. }))
    }

    /// Returns true if this error is an unauthorized API failure.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(ApiError::Unauthorized { .. }))
    }

    /// The message surfaced on the terminal `error` event.
    ///
    /// Remote failures surface the remote's structured error message
    /// when one is present; everything else uses the display form.
    #[must_use]
    pub fn surface_message(&self) -> String {
        match self {
            Self::Api(
                ApiError::NotFound { message }
                | ApiError::Unauthorized { message }
                | ApiError::Rejected { message }
                | ApiError::RequestFailed { message, .. },
            ) if !message.is_empty() => message.clone(),
            Self::Api(e) => e.to_string(),
            Self::Stage(e) => e.to_string(),
            Self::Sync(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl ApiError {
    /// Creates a request-failed error.
    #[must_use]
    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

impl SyncError {
    /// Creates a fatal sync error.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }
}

//! Error Types
//!
//! Errors surfaced by the backend client and the configuration loader.
//! Poll loops classify [`BackendError`]s instead of propagating them: a
//! failed routine poll only means "not ready this tick".

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by a [`crate::backend::SessionBackend`]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status and no usable body
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Response body could not be decoded
    #[error("could not decode backend response: {0}")]
    Decode(String),

    /// Backend understood the request and refused it
    #[error("backend rejected the request: {reason}")]
    Rejected {
        /// Machine-readable category (`model_loading`, `generation_error`, ...)
        error_type: Option<String>,
        /// Human-readable reason from the backend
        reason: String,
    },
}

impl BackendError {
    /// Build a rejection without a category
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            error_type: None,
            reason: reason.into(),
        }
    }

    /// Whether the error is a transport or decode hiccup rather than a
    /// deliberate refusal by the backend
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Decode(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Rejected { .. } => false,
        }
    }

    /// Message suitable for a user-facing notice
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { error_type, reason } => match error_type.as_deref() {
                Some("model_loading") => {
                    "The model is still loading, please try again shortly".to_string()
                }
                Some("model_error") => "The model failed to load, check the model files".to_string(),
                Some("invalid_stress_level") => {
                    "Invalid music preference, choose pop, rock or classical".to_string()
                }
                Some("generation_error") => "Audio generation failed, please retry".to_string(),
                Some("file_error") => {
                    "File operation failed, check available storage".to_string()
                }
                _ if reason.is_empty() => "Music generation failed".to_string(),
                _ => reason.clone(),
            },
            other => other.to_string(),
        }
    }
}

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::SessionConfig`]
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

//! Error types for meshconfig-cache.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur when working with a configuration cache.
///
/// Only [`CacheError::RegistrationError`] and [`CacheError::CloseError`] are ever
/// returned to callers of the cache. Reload errors are logged by the cache and
/// surface here so the reload path can be tested and reported uniformly.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Setting up the watch on the configuration file failed.
    #[error("Failed to watch {}: {reason}", path.display())]
    RegistrationError {
        /// The path that could not be watched
        path: PathBuf,
        /// Why registration failed
        reason: String,
    },

    /// The configuration file could not be read during a reload.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    ReloadIoError {
        /// The file being reloaded
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file contents could not be merged onto the defaults.
    #[error("Failed to apply configuration from {}: {source}", path.display())]
    ReloadParseError {
        /// The file being reloaded
        path: PathBuf,
        /// The merge failure
        #[source]
        source: MergeError,
    },

    /// The watch subscription failed to release cleanly.
    #[error("Failed to close watch on {}: {reason}", path.display())]
    CloseError {
        /// The watched path
        path: PathBuf,
        /// Why the close failed
        reason: String,
    },
}

/// Errors produced while merging raw configuration onto a default value.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The raw bytes are not a well-formed document.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// The merged document does not match the configuration schema.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// The merged configuration is well-formed but semantically invalid.
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

/// Validation error for configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field path, e.g. `defaultConfig.statusPort`
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Fold a list of collected errors into a single result.
    ///
    /// An empty list is success, a single error is returned as-is and anything
    /// longer becomes [`ValidationError::Multiple`].
    pub fn from_errors(mut errors: Vec<ValidationError>) -> std::result::Result<(), Self> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Multiple(errors)),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

use std::fmt;

use thiserror::Error;

/// How an ambiguous lookup was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguityKind {
    /// Two or more names on writable images matched.
    ReadWrite,
    /// At most one name on a writable image matched, but the matched names
    /// differ or no writable image could break the tie.
    ReadOnly,
}

impl fmt::Display for AmbiguityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmbiguityKind::ReadWrite => f.write_str("read/write"),
            AmbiguityKind::ReadOnly => f.write_str("read-only"),
        }
    }
}

/// Image management error types
#[derive(Error, Debug)]
pub enum ImageError {
    /// A reference string is not a valid image reference
    #[error("invalid image reference \"{reference}\": {reason}")]
    InvalidReference { reference: String, reason: String },

    /// No stored name matches the search input
    #[error("unable to find a name and tag match for {reference} in repotags")]
    NotFound { reference: String },

    /// Several distinct images or names remain after tie-break
    #[error("found multiple {kind} images {}", .names.join(","))]
    Ambiguous {
        kind: AmbiguityKind,
        names: Vec<String>,
    },

    /// Signature policy could not be loaded or instantiated
    #[error("Policy error: {0}")]
    Policy(String),

    /// Image store error
    #[error("Image store error: {0}")]
    Store(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImageError {
    /// Number of distinct conflicting names carried by an ambiguity error.
    pub fn ambiguous_count(&self) -> Option<usize> {
        match self {
            ImageError::Ambiguous { names, .. } => Some(names.len()),
            _ => None,
        }
    }

    /// Wrap an error with extra context while keeping its kind.
    pub fn context(self, context: &str) -> Self {
        match self {
            ImageError::InvalidReference { reference, reason } => ImageError::InvalidReference {
                reference,
                reason: format!("{context}: {reason}"),
            },
            ImageError::Policy(msg) => ImageError::Policy(format!("{context}: {msg}")),
            ImageError::Store(msg) => ImageError::Store(format!("{context}: {msg}")),
            ImageError::Config(msg) => ImageError::Config(format!("{context}: {msg}")),
            ImageError::Serialization(msg) => {
                ImageError::Serialization(format!("{context}: {msg}"))
            }
            other => other,
        }
    }
}

impl From<serde_json::Error> for ImageError {
    fn from(err: serde_json::Error) -> Self {
        ImageError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ImageError {
    fn from(err: serde_yaml::Error) -> Self {
        ImageError::Serialization(err.to_string())
    }
}

/// Result type alias for image operations
pub type Result<T> = std::result::Result<T, ImageError>;

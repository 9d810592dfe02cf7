//! repotag Core - Foundational Types
//!
//! Error taxonomy and configuration shared by the image resolution
//! crate and the `repotag` CLI.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{ImageConfig, LogLevel, TagMatching, DEFAULT_LOCAL_REGISTRY};
pub use error::{AmbiguityKind, ImageError, Result};

/// repotag version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

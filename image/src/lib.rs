//! repotag Image - local image reference resolution.
//!
//! Decomposes image references, resolves partial names against the
//! images stored on this host and derives names for saved archives.

#![allow(clippy::result_large_err)]

pub mod oci;

// Re-export common types
pub use oci::{resolve, save_destination_name, ImageRecord, ImageReference, Resolution, Resolver};
pub use oci::{copy_options, CopyOptions, DockerRegistryOptions, RegistryAuth, SigningOptions, SystemContext};
pub use oci::{policy_context, FilePolicyProvider, Policy, PolicyContext, PolicyProvider};
pub use oci::{ImageStore, LocalImage};

/// repotag Image version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

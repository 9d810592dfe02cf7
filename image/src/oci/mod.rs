//! Local image naming for repotag.
//!
//! This module resolves the names users type against the images stored on
//! this host. It provides:
//!
//! - Reference decomposition (registry, repository, tag, digest)
//! - Repotag resolution with read-only/writable tie-break
//! - Save/export destination naming
//! - Copy option and signature policy assembly for the transfer layer
//!
//! # Resolution flow
//!
//! ```text
//! ┌──────────────┐   parse    ┌────────────────┐
//! │ "app:v1"     │ ─────────► │ ImageReference │──┐
//! └──────────────┘            └────────────────┘  │ repository + tag class
//!                                                 ▼
//! ┌──────────────┐   parse    ┌────────────────┐  ┌──────────────┐
//! │ stored names │ ─────────► │ candidates     │─►│ tie-break    │─► image
//! └──────────────┘  (skip on  └────────────────┘  └──────────────┘   or error
//!                    failure)
//! ```

pub mod copy;
pub mod policy;
pub mod reference;
pub mod resolve;
pub mod save;
pub mod store;

pub use copy::{copy_options, CopyOptions, DockerRegistryOptions, RegistryAuth, SigningOptions, SystemContext};
pub use policy::{policy_context, FilePolicyProvider, Policy, PolicyContext, PolicyProvider, PolicyRequirement};
pub use reference::{additional_tags, has_transport, ImageReference};
pub use resolve::{resolve, Candidate, CandidateSet, ImageRecord, Resolution, Resolver};
pub use save::save_destination_name;
pub use store::{ImageStore, LocalImage};

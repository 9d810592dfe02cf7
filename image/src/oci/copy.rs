//! Configuration bundles handed to the image copy subsystem.
//!
//! Nothing here transfers data: these builders only combine caller options
//! with a parent [`SystemContext`] into the per-side contexts and the
//! [`CopyOptions`] a transfer implementation consumes.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use repotag_core::config::ImageConfig;

use super::reference::ImageReference;

/// Authentication credentials for a container registry.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistryAuth {
    username: Option<String>,
    password: Option<String>,
}

impl RegistryAuth {
    /// Create anonymous authentication (no credentials).
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Create basic authentication with username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() || self.password.is_none()
    }
}

// Keep the password out of logs.
impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Settings shared by everything that talks to registries and storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemContext {
    /// Signature policy file
    pub signature_policy_path: Option<PathBuf>,
    /// Registry auth file
    pub auth_file_path: Option<PathBuf>,
    /// Registries configuration file
    pub registries_conf_path: Option<PathBuf>,
    /// User agent for registry requests
    pub registry_user_agent: Option<String>,
    /// Scratch directory for large temporary files
    pub big_files_temporary_dir: Option<PathBuf>,
    /// Force compression of `dir:` destinations
    pub dir_force_compress: bool,
    /// Compression format for OCI destinations (e.g., "gzip", "zstd")
    pub oci_compression_format: Option<String>,
    /// Credentials for registry access
    pub registry_auth: Option<RegistryAuth>,
    /// Directory with client certificates
    pub registry_cert_path: Option<PathBuf>,
    /// Skip TLS verification; `None` leaves the registry default
    pub insecure_skip_tls_verify: Option<bool>,
    /// Extra names recorded in docker-archive destinations
    pub docker_archive_additional_tags: Vec<ImageReference>,
    /// Platform selection overrides
    pub os_choice: Option<String>,
    pub architecture_choice: Option<String>,
    pub variant_choice: Option<String>,
}

impl SystemContext {
    /// Base context carrying the configured signature policy.
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            signature_policy_path: config.signature_policy_path.clone(),
            ..Default::default()
        }
    }
}

/// Per-side registry options supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerRegistryOptions {
    pub registry_auth: Option<RegistryAuth>,
    pub cert_path: Option<PathBuf>,
    pub insecure_skip_tls_verify: Option<bool>,
    pub os_choice: Option<String>,
    pub architecture_choice: Option<String>,
    pub variant_choice: Option<String>,
}

impl DockerRegistryOptions {
    /// Build the context for one side of a copy.
    ///
    /// Registry settings come from `self`; policy, auth file, registries
    /// configuration, user agent, temp dir and compression settings are
    /// inherited from `parent`.
    pub fn system_context(
        &self,
        parent: Option<&SystemContext>,
        additional_tags: &[ImageReference],
    ) -> SystemContext {
        let mut ctx = SystemContext {
            registry_auth: self.registry_auth.clone(),
            registry_cert_path: self.cert_path.clone(),
            insecure_skip_tls_verify: self.insecure_skip_tls_verify,
            docker_archive_additional_tags: additional_tags.to_vec(),
            os_choice: self.os_choice.clone(),
            architecture_choice: self.architecture_choice.clone(),
            variant_choice: self.variant_choice.clone(),
            ..Default::default()
        };

        if let Some(parent) = parent {
            ctx.signature_policy_path = parent.signature_policy_path.clone();
            ctx.auth_file_path = parent.auth_file_path.clone();
            ctx.registries_conf_path = parent.registries_conf_path.clone();
            ctx.registry_user_agent = parent.registry_user_agent.clone();
            ctx.big_files_temporary_dir = parent.big_files_temporary_dir.clone();
            ctx.dir_force_compress = parent.dir_force_compress;
            ctx.oci_compression_format = parent.oci_compression_format.clone();
        }

        ctx
    }
}

/// Signing behavior for a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningOptions {
    /// Drop existing signatures from the destination
    pub remove_signatures: bool,
    /// Key identity to sign the destination with
    pub sign_by: Option<String>,
}

/// Everything the copy subsystem needs for one transfer.
#[derive(Default)]
pub struct CopyOptions {
    pub remove_signatures: bool,
    pub sign_by: Option<String>,
    /// Progress sink
    pub report_writer: Option<Box<dyn Write + Send>>,
    pub source_ctx: SystemContext,
    pub destination_ctx: SystemContext,
    /// Manifest MIME type to convert to; `None` keeps the source type
    pub force_manifest_mime_type: Option<String>,
}

impl fmt::Debug for CopyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOptions")
            .field("remove_signatures", &self.remove_signatures)
            .field("sign_by", &self.sign_by)
            .field("report_writer", &self.report_writer.is_some())
            .field("source_ctx", &self.source_ctx)
            .field("destination_ctx", &self.destination_ctx)
            .field("force_manifest_mime_type", &self.force_manifest_mime_type)
            .finish()
    }
}

/// Assemble copy options; absent registry options mean defaults.
pub fn copy_options(
    ctx: Option<&SystemContext>,
    report_writer: Option<Box<dyn Write + Send>>,
    src_registry: Option<&DockerRegistryOptions>,
    dest_registry: Option<&DockerRegistryOptions>,
    signing: &SigningOptions,
    manifest_type: Option<&str>,
    additional_tags: &[ImageReference],
) -> CopyOptions {
    let defaults = DockerRegistryOptions::default();
    let src_registry = src_registry.unwrap_or(&defaults);
    let dest_registry = dest_registry.unwrap_or(&defaults);

    CopyOptions {
        remove_signatures: signing.remove_signatures,
        sign_by: signing.sign_by.clone(),
        report_writer,
        source_ctx: src_registry.system_context(ctx, additional_tags),
        destination_ctx: dest_registry.system_context(ctx, additional_tags),
        force_manifest_mime_type: manifest_type
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    }
}

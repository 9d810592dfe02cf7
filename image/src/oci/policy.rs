//! Signature policy loading.
//!
//! Reads `containers-policy.json` style files and turns them into a
//! [`PolicyContext`]. Evaluating signatures against the requirements is
//! left to the transfer implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use repotag_core::error::{ImageError, Result};
use serde::{Deserialize, Serialize};

use super::copy::SystemContext;

/// System-wide policy file used when the context names none.
pub const SYSTEM_POLICY_PATH: &str = "/etc/containers/policy.json";

/// A single policy requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PolicyRequirement {
    #[serde(rename = "insecureAcceptAnything")]
    InsecureAcceptAnything,
    #[serde(rename = "reject")]
    Reject,
    #[serde(rename = "signedBy", rename_all = "camelCase")]
    SignedBy {
        key_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signed_identity: Option<serde_json::Value>,
    },
}

/// Parsed signature policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Requirements for scopes without a specific entry
    #[serde(default)]
    pub default: Vec<PolicyRequirement>,
    /// transport → scope → requirements
    #[serde(default)]
    pub transports: HashMap<String, HashMap<String, Vec<PolicyRequirement>>>,
}

impl Policy {
    /// Parse a policy document.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| ImageError::Policy(format!("invalid policy: {e}")))
    }

    /// Load a policy file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            ImageError::Policy(format!("Failed to read policy {}: {}", path.display(), e))
        })?;
        Self::from_json(&data)
            .map_err(|e| e.context(&format!("policy {}", path.display())))
    }
}

/// A validated policy, ready for use by a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyContext {
    policy: Policy,
}

impl PolicyContext {
    /// Validate `policy`; it must define at least one default requirement.
    pub fn new(policy: Policy) -> Result<Self> {
        if policy.default.is_empty() {
            return Err(ImageError::Policy(
                "policy defines no default requirements".to_string(),
            ));
        }
        for (transport, scopes) in &policy.transports {
            for (scope, requirements) in scopes {
                if requirements.is_empty() {
                    return Err(ImageError::Policy(format!(
                        "no requirements for {transport} scope \"{scope}\""
                    )));
                }
            }
        }
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Requirements for `scope` under `transport`.
    ///
    /// The most specific scope wins: the full scope, then each parent
    /// namespace (`quay.io/org/app` → `quay.io/org` → `quay.io`), then the
    /// transport's `""` entry, then the policy default.
    pub fn requirements_for(&self, transport: &str, scope: &str) -> &[PolicyRequirement] {
        if let Some(scopes) = self.policy.transports.get(transport) {
            let mut candidate = scope;
            loop {
                if let Some(reqs) = scopes.get(candidate) {
                    return reqs;
                }
                match candidate.rfind('/') {
                    Some(pos) => candidate = &candidate[..pos],
                    None => break,
                }
            }
            if let Some(reqs) = scopes.get("") {
                return reqs;
            }
        }
        &self.policy.default
    }
}

/// Source of signature policies.
pub trait PolicyProvider {
    /// Load the policy that applies to `ctx`.
    fn default_policy(&self, ctx: Option<&SystemContext>) -> Result<Policy>;

    /// Turn a loaded policy into a usable context.
    fn new_policy_context(&self, policy: Policy) -> Result<PolicyContext>;
}

/// Loads policies from disk.
#[derive(Debug, Clone)]
pub struct FilePolicyProvider {
    system_path: PathBuf,
}

impl Default for FilePolicyProvider {
    fn default() -> Self {
        Self::new(PathBuf::from(SYSTEM_POLICY_PATH))
    }
}

impl FilePolicyProvider {
    /// Use `system_path` when a context names no policy file.
    pub fn new(system_path: PathBuf) -> Self {
        Self { system_path }
    }

    fn policy_path<'a>(&'a self, ctx: Option<&'a SystemContext>) -> &'a Path {
        ctx.and_then(|c| c.signature_policy_path.as_deref())
            .unwrap_or(&self.system_path)
    }
}

impl PolicyProvider for FilePolicyProvider {
    fn default_policy(&self, ctx: Option<&SystemContext>) -> Result<Policy> {
        let path = self.policy_path(ctx);
        tracing::debug!(path = %path.display(), "Loading signature policy");
        Policy::from_file(path)
    }

    fn new_policy_context(&self, policy: Policy) -> Result<PolicyContext> {
        PolicyContext::new(policy)
    }
}

/// Load the default policy for `ctx` and build a context from it.
pub fn policy_context<P: PolicyProvider + ?Sized>(
    provider: &P,
    ctx: Option<&SystemContext>,
) -> Result<PolicyContext> {
    let policy = provider.default_policy(ctx)?;
    provider.new_policy_context(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const POLICY: &str = r#"{
        "default": [{"type": "insecureAcceptAnything"}],
        "transports": {
            "docker": {
                "quay.io/org": [{"type": "signedBy", "keyType": "GPGKeys", "keyPath": "/keys/org.gpg"}],
                "quay.io/org/public": [{"type": "insecureAcceptAnything"}],
                "": [{"type": "reject"}]
            }
        }
    }"#;

    fn write_policy(dir: &Path, data: &str) -> PathBuf {
        let path = dir.join("policy.json");
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_parse_policy() {
        let policy = Policy::from_json(POLICY).unwrap();
        assert_eq!(policy.default, vec![PolicyRequirement::InsecureAcceptAnything]);
        let docker = &policy.transports["docker"];
        match &docker["quay.io/org"][0] {
            PolicyRequirement::SignedBy {
                key_type, key_path, ..
            } => {
                assert_eq!(key_type, "GPGKeys");
                assert_eq!(key_path.as_deref(), Some(Path::new("/keys/org.gpg")));
            }
            other => panic!("unexpected requirement: {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_requirement() {
        let err = Policy::from_json(r#"{"default": [{"type": "maybe"}]}"#).unwrap_err();
        assert!(matches!(err, ImageError::Policy(_)));
    }

    #[test]
    fn test_context_requires_default() {
        let policy = Policy::from_json(r#"{"default": []}"#).unwrap();
        assert!(PolicyContext::new(policy).is_err());
    }

    #[test]
    fn test_context_rejects_empty_scope() {
        let policy = Policy::from_json(
            r#"{"default": [{"type": "reject"}], "transports": {"docker": {"quay.io": []}}}"#,
        )
        .unwrap();
        let err = PolicyContext::new(policy).unwrap_err();
        assert!(err.to_string().contains("quay.io"));
    }

    #[test]
    fn test_requirements_for_most_specific_scope() {
        let ctx = PolicyContext::new(Policy::from_json(POLICY).unwrap()).unwrap();

        assert_eq!(
            ctx.requirements_for("docker", "quay.io/org/public"),
            &[PolicyRequirement::InsecureAcceptAnything]
        );
        assert!(matches!(
            ctx.requirements_for("docker", "quay.io/org/app")[0],
            PolicyRequirement::SignedBy { .. }
        ));
        assert_eq!(
            ctx.requirements_for("docker", "docker.io/library/nginx"),
            &[PolicyRequirement::Reject]
        );
        assert_eq!(
            ctx.requirements_for("oci", "/tmp/layout"),
            &[PolicyRequirement::InsecureAcceptAnything]
        );
    }

    #[test]
    fn test_policy_context_from_context_path() {
        let tmp = TempDir::new().unwrap();
        let path = write_policy(tmp.path(), POLICY);
        let ctx = SystemContext {
            signature_policy_path: Some(path),
            ..Default::default()
        };

        let provider = FilePolicyProvider::new(tmp.path().join("missing.json"));
        let policy_ctx = policy_context(&provider, Some(&ctx)).unwrap();
        assert_eq!(policy_ctx.policy().default.len(), 1);
    }

    #[test]
    fn test_policy_context_falls_back_to_system_path() {
        let tmp = TempDir::new().unwrap();
        let path = write_policy(tmp.path(), POLICY);
        let provider = FilePolicyProvider::new(path);
        assert!(policy_context(&provider, None).is_ok());
    }

    #[test]
    fn test_policy_context_missing_file() {
        let tmp = TempDir::new().unwrap();
        let provider = FilePolicyProvider::new(tmp.path().join("missing.json"));
        let err = policy_context(&provider, None).unwrap_err();
        assert!(err.to_string().contains("Failed to read policy"));
    }

    #[test]
    fn test_policy_context_invalid_policy_propagates() {
        let tmp = TempDir::new().unwrap();
        let path = write_policy(tmp.path(), r#"{"default": []}"#);
        let provider = FilePolicyProvider::new(path);
        let err = policy_context(&provider, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Policy error: policy defines no default requirements"
        );
    }

    struct FailingProvider;

    impl PolicyProvider for FailingProvider {
        fn default_policy(&self, _ctx: Option<&SystemContext>) -> Result<Policy> {
            Err(ImageError::Policy("no policy configured".to_string()))
        }

        fn new_policy_context(&self, _policy: Policy) -> Result<PolicyContext> {
            panic!("must not be called after a load failure");
        }
    }

    #[test]
    fn test_policy_context_stops_on_load_error() {
        let err = policy_context(&FailingProvider, None).unwrap_err();
        assert_eq!(err.to_string(), "Policy error: no policy configured");
    }
}

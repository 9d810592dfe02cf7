//! Image reference decomposition.
//!
//! Splits references like `quay.io/org/app:v1` into registry, repository,
//! tag and digest without applying Docker Hub normalization, so that stored
//! repotags and partial user input can be compared component by component.

use once_cell::sync::Lazy;
use regex::Regex;
use repotag_core::error::{ImageError, Result};

/// Registry used when normalizing an unqualified reference.
pub const DOCKER_HUB_REGISTRY: &str = "docker.io";

/// Namespace Docker Hub applies to single-component repositories.
const DOCKER_HUB_NAMESPACE: &str = "library";

/// Tag assumed when a reference carries neither tag nor digest.
pub const DEFAULT_TAG: &str = "latest";

/// Effective tag of a digest-only reference.
const DIGEST_ONLY_TAG: &str = "none";

/// Longest name (registry plus repository) a reference may carry.
const MAX_NAME_LENGTH: usize = 255;

/// A tag made of this many lowercase hex digits reads like an image ID.
const SUSPICIOUS_TAG_LENGTHS: std::ops::RangeInclusive<usize> = 12..=64;

/// Anchored reference grammar with capture groups for name, tag and digest.
static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    let domain_component = r"(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])";
    let domain = format!(r"{domain_component}(?:\.{domain_component})*(?::[0-9]+)?");
    let path_component = r"[a-z0-9]+(?:(?:[._]|__|[-]*)[a-z0-9]+)*";
    let name = format!(r"(?:{domain}/)?{path_component}(?:/{path_component})*");
    let tag = r"[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}";
    let digest = r"[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[[:xdigit:]]{32,}";
    Regex::new(&format!(r"^({name})(?::({tag}))?(?:@({digest}))?$"))
        .expect("reference grammar is a valid regex")
});

/// Decomposed image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Registry host, with optional port (e.g., "quay.io", "localhost:5000")
    pub registry: Option<String>,
    /// Repository path without the registry (e.g., "library/nginx", "org/app")
    pub repository: String,
    /// Tag (e.g., "latest", "v1")
    pub tag: Option<String>,
    /// Digest (e.g., "sha256:abc123...")
    pub digest: Option<String>,
    /// Whether the tag reads like a content digest or image ID
    pub suspicious_tag: bool,
}

impl ImageReference {
    /// Decompose an image reference string.
    ///
    /// No defaults are applied: `nginx` has no registry and no tag. A leading
    /// path component is taken as the registry only when it contains `.` or
    /// `:` or is `localhost`, so `myuser/app` keeps `myuser` in the
    /// repository.
    ///
    /// Supports formats:
    /// - `nginx` → repository `nginx`
    /// - `myuser/app:v1` → repository `myuser/app`, tag `v1`
    /// - `quay.io/org/app:v1` → registry `quay.io`, repository `org/app`
    /// - `localhost:5000/app@sha256:...` → registry `localhost:5000`, digest
    pub fn parse(reference: &str) -> Result<Self> {
        let input = reference.trim();
        if input.is_empty() {
            return Err(invalid(reference, "empty reference"));
        }

        let captures = match REFERENCE_RE.captures(input) {
            Some(captures) => captures,
            None => {
                let lowered = input.to_ascii_lowercase();
                let reason = if lowered != input && REFERENCE_RE.is_match(&lowered) {
                    "repository name must be lowercase"
                } else {
                    "invalid reference format"
                };
                return Err(invalid(reference, reason));
            }
        };

        let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        if name.len() > MAX_NAME_LENGTH {
            return Err(invalid(
                reference,
                &format!("repository name must not be longer than {MAX_NAME_LENGTH} characters"),
            ));
        }

        let tag = captures.get(2).map(|m| m.as_str().to_string());
        let digest = captures.get(3).map(|m| m.as_str().to_string());
        let (registry, repository) = split_registry(name);
        let suspicious_tag = tag.as_deref().is_some_and(is_suspicious_tag);

        Ok(ImageReference {
            registry,
            repository,
            tag,
            digest,
            suspicious_tag,
        })
    }

    /// Whether an explicit registry component is present.
    pub fn has_registry(&self) -> bool {
        self.registry.is_some()
    }

    /// Tag used when comparing tags: the explicit tag, `latest` when neither
    /// tag nor digest is given, `none` for a digest-only reference.
    pub fn effective_tag(&self) -> &str {
        match (&self.tag, &self.digest) {
            (Some(tag), _) => tag,
            (None, Some(_)) => DIGEST_ONLY_TAG,
            (None, None) => DEFAULT_TAG,
        }
    }

    /// Registry-qualified repository path (`quay.io/org/app` or `org/app`).
    pub fn name(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}", registry, self.repository),
            None => self.repository.clone(),
        }
    }

    /// Docker Hub normalized form: `docker.io` registry, `library/` namespace
    /// for single-component names and the `latest` tag when nothing else
    /// pins the image.
    pub fn normalized(&self) -> Self {
        let registry = self
            .registry
            .clone()
            .unwrap_or_else(|| DOCKER_HUB_REGISTRY.to_string());
        let repository = if registry == DOCKER_HUB_REGISTRY && !self.repository.contains('/') {
            format!("{}/{}", DOCKER_HUB_NAMESPACE, self.repository)
        } else {
            self.repository.clone()
        };
        let tag = if self.tag.is_none() && self.digest.is_none() {
            Some(DEFAULT_TAG.to_string())
        } else {
            self.tag.clone()
        };

        ImageReference {
            registry: Some(registry),
            repository,
            suspicious_tag: tag.as_deref().is_some_and(is_suspicious_tag),
            tag,
            digest: self.digest.clone(),
        }
    }

    /// Qualify an unqualified reference with `registry`.
    ///
    /// Fails when the reference already names a registry or when the
    /// combination does not form a valid reference.
    pub fn with_registry(&self, registry: &str) -> Result<Self> {
        if let Some(existing) = &self.registry {
            return Err(invalid(
                &self.full_reference(),
                &format!("reference already names registry {existing}"),
            ));
        }
        let qualified = format!("{}/{}", registry, self.full_reference());
        let parsed = Self::parse(&qualified)?;
        if parsed.registry.as_deref() != Some(registry) {
            return Err(invalid(&qualified, &format!("{registry} is not a registry host")));
        }
        Ok(parsed)
    }

    /// Get the full reference string, without any defaults applied.
    pub fn full_reference(&self) -> String {
        let mut s = self.name();
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}

impl std::str::FromStr for ImageReference {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Registries must contain a `.` or a `:` or be `localhost`.
pub fn is_registry(component: &str) -> bool {
    component.contains(['.', ':']) || component == "localhost"
}

/// A tag is suspicious when it is all lowercase hex and as long as a short
/// or full image ID.
pub fn is_suspicious_tag(tag: &str) -> bool {
    SUSPICIOUS_TAG_LENGTHS.contains(&tag.len())
        && tag.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Whether the input carries a transport prefix such as `docker://`.
pub fn has_transport(image: &str) -> bool {
    image.contains("://")
}

/// Parse additional names for an archive destination, keeping only the
/// tagged ones in normalized form.
pub fn additional_tags<S: AsRef<str>>(images: &[S]) -> Result<Vec<ImageReference>> {
    let mut tags = Vec::new();
    for image in images {
        let reference = ImageReference::parse(image.as_ref())
            .map_err(|e| e.context("error parsing additional tags"))?;
        if reference.tag.is_some() {
            tags.push(reference.normalized());
        }
    }
    Ok(tags)
}

fn split_registry(name: &str) -> (Option<String>, String) {
    match name.split_once('/') {
        Some((first, rest)) if is_registry(first) => (Some(first.to_string()), rest.to_string()),
        _ => (None, name.to_string()),
    }
}

fn invalid(reference: &str, reason: &str) -> ImageError {
    ImageError::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}

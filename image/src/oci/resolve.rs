//! Repotag resolution: find the one local image a partial reference means.
//!
//! Every stored name is decomposed and compared with the search on the
//! repository path (exact, or as a `/`-bounded suffix) and on the
//! suspicious-tag class. When several names match, a single writable image
//! behind a single distinct name wins; anything else is ambiguous.

use std::collections::BTreeSet;

use repotag_core::config::{ImageConfig, TagMatching};
use repotag_core::error::{AmbiguityKind, ImageError, Result};

use super::reference::ImageReference;

/// Read access to a locally stored image.
pub trait ImageRecord {
    /// Stable content identifier.
    fn id(&self) -> &str;
    /// Raw repotags, in display order.
    fn names(&self) -> &[String];
    /// Whether the storage layer marked the image read-only.
    fn is_read_only(&self) -> bool;
}

/// A stored name that matched the search, paired with its image.
#[derive(Debug)]
pub struct Candidate<'a, I> {
    pub name: &'a str,
    pub image: &'a I,
}

// Manual impls: derives would require `I: Clone`/`I: Copy`.
impl<I> Clone for Candidate<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for Candidate<'_, I> {}

/// Outcome of the matching phase, before tie-break.
#[derive(Debug)]
pub struct CandidateSet<'a, I> {
    /// The decomposed search input
    pub search: ImageReference,
    /// Every matching (name, image) pair
    pub candidates: Vec<Candidate<'a, I>>,
    /// Stored names skipped because they failed to decompose
    pub skipped: usize,
}

/// A successfully resolved image.
#[derive(Debug)]
pub struct Resolution<'a, I> {
    /// The selected image
    pub image: &'a I,
    /// The stored name that selected it
    pub name: &'a str,
    /// Stored names skipped because they failed to decompose
    pub skipped: usize,
}

/// Resolves partial references against a snapshot of local images.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    tag_matching: TagMatching,
}

impl Resolver {
    pub fn new(tag_matching: TagMatching) -> Self {
        Self { tag_matching }
    }

    pub fn from_config(config: &ImageConfig) -> Self {
        Self::new(config.tag_matching)
    }

    /// Collect every stored name matching `search`.
    ///
    /// Fails only when `search` itself does not decompose. Stored names that
    /// do not decompose are skipped and counted.
    pub fn candidates<'a, I: ImageRecord>(
        &self,
        search: &str,
        images: &'a [I],
    ) -> Result<CandidateSet<'a, I>> {
        let search = ImageReference::parse(search)?;

        let mut candidates = Vec::new();
        let mut skipped = 0;
        for image in images {
            for name in image.names() {
                let stored = match ImageReference::parse(name) {
                    Ok(stored) => stored,
                    Err(e) => {
                        skipped += 1;
                        tracing::debug!(
                            image = image.id(),
                            name = %name,
                            error = %e,
                            "Skipping malformed stored name"
                        );
                        continue;
                    }
                };
                if self.matches(&search, &stored) {
                    candidates.push(Candidate {
                        name: name.as_str(),
                        image,
                    });
                }
            }
        }

        Ok(CandidateSet {
            search,
            candidates,
            skipped,
        })
    }

    /// Resolve `search` to exactly one image.
    pub fn resolve<'a, I: ImageRecord>(
        &self,
        search: &str,
        images: &'a [I],
    ) -> Result<Resolution<'a, I>> {
        let set = self.candidates(search, images)?;
        tracing::debug!(
            search = %search,
            candidates = set.candidates.len(),
            skipped = set.skipped,
            "Matched stored names"
        );

        let (image, name) = match set.candidates.as_slice() {
            [] => {
                return Err(ImageError::NotFound {
                    reference: search.to_string(),
                })
            }
            [only] => (only.image, only.name),
            many => break_tie(many)?,
        };

        Ok(Resolution {
            image,
            name,
            skipped: set.skipped,
        })
    }

    fn matches(&self, search: &ImageReference, stored: &ImageReference) -> bool {
        if stored.suspicious_tag != search.suspicious_tag {
            return false;
        }
        if self.tag_matching == TagMatching::Exact
            && stored.effective_tag() != search.effective_tag()
        {
            return false;
        }
        repository_matches(&stored.repository, &search.repository)
    }
}

/// Resolve with the default matching rules.
pub fn resolve<'a, I: ImageRecord>(search: &str, images: &'a [I]) -> Result<Resolution<'a, I>> {
    Resolver::default().resolve(search, images)
}

/// `stored` equals `search` or ends with `/` + `search`.
fn repository_matches(stored: &str, search: &str) -> bool {
    match stored.strip_suffix(search) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('/'),
        None => false,
    }
}

/// Pick the winner among several candidates, or classify the ambiguity.
///
/// Only the multiset of (name, read-only) pairs counts, so the result does
/// not depend on candidate order or on which image carries which name.
/// Every writable candidate counts once, even when two of them belong to
/// the same image.
fn break_tie<'a, I: ImageRecord>(candidates: &[Candidate<'a, I>]) -> Result<(&'a I, &'a str)> {
    let mut names = BTreeSet::new();
    let mut writable = Vec::new();
    for candidate in candidates {
        names.insert(candidate.name);
        if !candidate.image.is_read_only() {
            writable.push(candidate.image);
        }
    }

    if let ([image], Some(name)) = (writable.as_slice(), names.first()) {
        if names.len() == 1 {
            return Ok((*image, *name));
        }
    }

    let kind = if writable.len() > 1 {
        AmbiguityKind::ReadWrite
    } else {
        AmbiguityKind::ReadOnly
    };
    Err(ImageError::Ambiguous {
        kind,
        names: names.into_iter().map(str::to_string).collect(),
    })
}

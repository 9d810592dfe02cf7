//! Local image index.
//!
//! Keeps the images known on this host, their repotags and their
//! read-only flag in an in-memory index backed by a persistent
//! `images.json` file. Lookups take a snapshot of the index and hand it
//! to the [`Resolver`], so resolution never holds the lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use repotag_core::config::ImageConfig;
use repotag_core::error::{ImageError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::reference::{has_transport, ImageReference, DEFAULT_TAG};
use super::resolve::{ImageRecord, Resolver};

/// Shortest ID prefix accepted for lookups.
const MIN_ID_PREFIX: usize = 3;

/// Metadata for a locally stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalImage {
    /// Content identifier (e.g., hex of the config digest)
    pub id: String,
    /// Repotags, in the order they were added
    #[serde(default)]
    pub names: Vec<String>,
    /// Set for images that live in a read-only layer of the storage
    #[serde(default)]
    pub read_only: bool,
    /// When the image was added to the store
    pub created_at: DateTime<Utc>,
}

impl LocalImage {
    pub fn new(id: impl Into<String>, names: Vec<String>, read_only: bool) -> Self {
        Self {
            id: id.into(),
            names,
            read_only,
            created_at: Utc::now(),
        }
    }

    /// First 12 characters of the ID.
    pub fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }
}

impl ImageRecord for LocalImage {
    fn id(&self) -> &str {
        &self.id
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

/// Persistent index stored as JSON on disk.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreIndex {
    images: Vec<LocalImage>,
}

/// Local image store with an in-memory index.
pub struct ImageStore {
    /// Root directory of the store
    store_dir: PathBuf,
    /// In-memory index: id → LocalImage
    index: Arc<RwLock<HashMap<String, LocalImage>>>,
    /// Registry unqualified names are tagged under
    local_registry: String,
    /// Matching rules for name lookups
    resolver: Resolver,
}

impl ImageStore {
    /// Open (or create) a store.
    ///
    /// Creates the store directory if it doesn't exist and loads
    /// any existing index from disk.
    pub fn new(store_dir: &Path, local_registry: &str, resolver: Resolver) -> Result<Self> {
        std::fs::create_dir_all(store_dir).map_err(|e| {
            ImageError::Store(format!(
                "Failed to create image store directory {}: {}",
                store_dir.display(),
                e
            ))
        })?;

        let index = load_index(&store_dir.join("images.json"))?;
        Ok(Self {
            store_dir: store_dir.to_path_buf(),
            index: Arc::new(RwLock::new(index)),
            local_registry: local_registry.to_string(),
            resolver,
        })
    }

    /// Open the store described by `config`.
    pub fn open(config: &ImageConfig) -> Result<Self> {
        Self::new(
            &config.store_dir,
            &config.default_local_registry,
            Resolver::from_config(config),
        )
    }

    /// Snapshot of all images, oldest first.
    pub async fn list(&self) -> Vec<LocalImage> {
        let index = self.index.read().await;
        let mut images: Vec<LocalImage> = index.values().cloned().collect();
        images.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        images
    }

    /// Get an image by full ID.
    pub async fn get(&self, id: &str) -> Option<LocalImage> {
        self.index.read().await.get(id).cloned()
    }

    /// Images whose ID starts with `prefix`.
    pub async fn find_by_id_prefix(&self, prefix: &str) -> Vec<LocalImage> {
        let index = self.index.read().await;
        let mut found: Vec<LocalImage> = index
            .values()
            .filter(|img| img.id.starts_with(prefix))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    /// Resolve a partial reference against the current snapshot.
    pub async fn resolve(&self, search: &str) -> Result<LocalImage> {
        let images = self.list().await;
        let resolution = self.resolver.resolve(search, &images)?;
        if resolution.skipped > 0 {
            tracing::debug!(
                search = %search,
                skipped = resolution.skipped,
                "Ignored malformed names during lookup"
            );
        }
        Ok(resolution.image.clone())
    }

    /// Find an image by full ID, repotag or unique ID prefix, in that order.
    ///
    /// Transport-qualified input (`docker://...`) names a remote image and
    /// is rejected.
    pub async fn lookup(&self, input: &str) -> Result<LocalImage> {
        if has_transport(input) {
            return Err(ImageError::InvalidReference {
                reference: input.to_string(),
                reason: "transport prefixes do not name local images".to_string(),
            });
        }

        if let Some(image) = self.get(input).await {
            return Ok(image);
        }

        match self.resolve(input).await {
            Err(ImageError::NotFound { reference }) => {
                if input.len() < MIN_ID_PREFIX {
                    return Err(ImageError::NotFound { reference });
                }
                let mut found = self.find_by_id_prefix(input).await;
                match found.len() {
                    0 => Err(ImageError::NotFound { reference }),
                    1 => Ok(found.remove(0)),
                    n => Err(ImageError::Store(format!(
                        "ID prefix {input} matches {n} images"
                    ))),
                }
            }
            other => other,
        }
    }

    /// Add an image to the store.
    ///
    /// Names are qualified as by [`ImageStore::tag`]. A writable image takes
    /// its names away from any other writable image holding them.
    pub async fn add(&self, image: LocalImage) -> Result<LocalImage> {
        let names = image
            .names
            .iter()
            .map(|n| self.qualify(n))
            .collect::<Result<Vec<_>>>()?;

        let mut index = self.index.write().await;
        if index.contains_key(&image.id) {
            return Err(ImageError::Store(format!("Image {} already exists", image.id)));
        }

        if !image.read_only {
            for name in &names {
                release_name(&mut index, name);
            }
        }
        let mut stored = image;
        stored.names = dedup(names);
        index.insert(stored.id.clone(), stored.clone());
        self.save_index(&index).await?;
        drop(index);

        tracing::info!(id = %stored.id, names = ?stored.names, "Added image");
        Ok(stored)
    }

    /// Add a name to a writable image.
    ///
    /// Unqualified names are placed under the local registry and get the
    /// `latest` tag when they carry neither tag nor digest. Returns the
    /// name as stored.
    pub async fn tag(&self, id: &str, name: &str) -> Result<String> {
        let name = self.qualify(name)?;

        let mut index = self.index.write().await;
        check_writable(&index, id)?;
        release_name(&mut index, &name);
        if let Some(image) = index.get_mut(id) {
            if !image.names.contains(&name) {
                image.names.push(name.clone());
            }
        }
        self.save_index(&index).await?;
        drop(index);

        tracing::info!(id = %id, name = %name, "Tagged image");
        Ok(name)
    }

    /// Remove a name from a writable image.
    pub async fn untag(&self, id: &str, name: &str) -> Result<()> {
        let mut index = self.index.write().await;
        check_writable(&index, id)?;
        let image = index
            .get_mut(id)
            .ok_or_else(|| ImageError::Store(format!("Image not found: {id}")))?;

        let qualified = self.qualify(name).unwrap_or_else(|_| name.to_string());
        let before = image.names.len();
        image.names.retain(|n| n != name && *n != qualified);
        if image.names.len() == before {
            return Err(ImageError::Store(format!("Image {id} has no name {name}")));
        }
        self.save_index(&index).await?;
        drop(index);

        tracing::info!(id = %id, name = %name, "Untagged image");
        Ok(())
    }

    /// Remove a writable image.
    pub async fn remove(&self, id: &str) -> Result<LocalImage> {
        let mut index = self.index.write().await;
        check_writable(&index, id)?;
        let removed = index
            .remove(id)
            .ok_or_else(|| ImageError::Store(format!("Image not found: {id}")))?;
        self.save_index(&index).await?;
        drop(index);

        tracing::info!(id = %id, "Removed image");
        Ok(removed)
    }

    /// Get the store directory path.
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// The registry unqualified names are placed under.
    pub fn local_registry(&self) -> &str {
        &self.local_registry
    }

    fn qualify(&self, name: &str) -> Result<String> {
        let mut reference = ImageReference::parse(name)?;
        if !reference.has_registry() {
            reference = reference.with_registry(&self.local_registry)?;
        }
        if reference.tag.is_none() && reference.digest.is_none() {
            reference.tag = Some(DEFAULT_TAG.to_string());
        }
        Ok(reference.full_reference())
    }

    /// Save index to disk.
    ///
    /// Callers must hold the index write guard across the call.
    async fn save_index(&self, index: &HashMap<String, LocalImage>) -> Result<()> {
        let mut images: Vec<LocalImage> = index.values().cloned().collect();
        images.sort_by(|a, b| a.id.cmp(&b.id));

        let data = serde_json::to_string_pretty(&StoreIndex { images })?;
        let index_path = self.store_dir.join("images.json");
        let tmp_path = self.store_dir.join("images.json.tmp");

        tokio::fs::write(&tmp_path, data).await.map_err(|e| {
            ImageError::Store(format!(
                "Failed to write image index {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        tokio::fs::rename(&tmp_path, &index_path).await.map_err(|e| {
            ImageError::Store(format!(
                "Failed to replace image index {}: {}",
                index_path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

/// Load index from disk; a missing file is an empty store.
fn load_index(index_path: &Path) -> Result<HashMap<String, LocalImage>> {
    if !index_path.exists() {
        return Ok(HashMap::new());
    }

    let data = std::fs::read_to_string(index_path).map_err(|e| {
        ImageError::Store(format!(
            "Failed to read image index {}: {}",
            index_path.display(),
            e
        ))
    })?;
    let store_index: StoreIndex = serde_json::from_str(&data)
        .map_err(|e| ImageError::Store(format!("Failed to parse image index: {}", e)))?;

    Ok(store_index
        .images
        .into_iter()
        .map(|img| (img.id.clone(), img))
        .collect())
}

fn check_writable(index: &HashMap<String, LocalImage>, id: &str) -> Result<()> {
    match index.get(id) {
        None => Err(ImageError::Store(format!("Image not found: {id}"))),
        Some(image) if image.read_only => {
            Err(ImageError::Store(format!("Image {id} is read-only")))
        }
        Some(_) => Ok(()),
    }
}

/// Take `name` away from every writable image. Read-only images keep
/// their names, which is how one name ends up on several images.
fn release_name(index: &mut HashMap<String, LocalImage>, name: &str) {
    for image in index.values_mut().filter(|img| !img.read_only) {
        image.names.retain(|n| n != name);
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

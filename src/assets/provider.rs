use std::{
    collections::HashMap,
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::foundation::{
    core::{Category, LayerId},
    error::{AvatarError, AvatarResult},
};

/// Maps a `(category, id)` pair to encoded image bytes.
///
/// Implementations must be shareable across threads: thumbnails and export layers are loaded
/// in parallel.
pub trait AssetProvider: Send + Sync {
    /// Load the encoded bytes for one layer. Failure is an [`AvatarError::Asset`].
    fn load(&self, category: Category, id: &LayerId) -> AvatarResult<Vec<u8>>;

    /// Stable key identifying the resource, used for memoization.
    fn resource_key(&self, category: Category, id: &LayerId) -> String {
        format!("{}/{}.png", category.dir_name(), id)
    }
}

/// Validate that a layer id is a single relative path segment.
///
/// Ids end up in file paths, so separators, `.`/`..` and absolute forms are rejected.
pub(crate) fn validate_id_segment(id: &str) -> AvatarResult<&str> {
    if id.is_empty() {
        return Err(AvatarError::validation("asset id must be non-empty"));
    }
    if id.contains(['/', '\\']) {
        return Err(AvatarError::validation(
            "asset id must not contain path separators",
        ));
    }
    if id == "." || id == ".." {
        return Err(AvatarError::validation("asset id must not be '.' or '..'"));
    }
    Ok(id)
}

/// Reads `root/{dir}/{id}.png` from the filesystem.
#[derive(Debug)]
pub struct FsAssetProvider {
    root: PathBuf,
    loads: AtomicU64,
}

impl FsAssetProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loads: AtomicU64::new(0),
        }
    }

    /// Path the provider reads for a layer.
    pub fn path_for(&self, category: Category, id: &LayerId) -> AvatarResult<PathBuf> {
        let id = validate_id_segment(id.as_str())?;
        Ok(self
            .root
            .join(category.dir_name())
            .join(format!("{id}.png")))
    }

    /// Number of successful loads served so far.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}

impl AssetProvider for FsAssetProvider {
    fn load(&self, category: Category, id: &LayerId) -> AvatarResult<Vec<u8>> {
        let path = self.path_for(category, id)?;
        let bytes = std::fs::read(&path).map_err(|e| {
            AvatarError::asset(category, id.as_str(), format!("read '{}': {e}", path.display()))
        })?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(bytes)
    }
}

/// In-memory provider keyed by `(category, id)`.
#[derive(Debug, Default)]
pub struct MemoryAssetProvider {
    entries: HashMap<(Category, LayerId), Vec<u8>>,
    loads: AtomicU64,
}

impl MemoryAssetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, id: LayerId, bytes: Vec<u8>) {
        self.entries.insert((category, id), bytes);
    }

    pub fn with(mut self, category: Category, id: LayerId, bytes: Vec<u8>) -> Self {
        self.insert(category, id, bytes);
        self
    }

    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}

impl AssetProvider for MemoryAssetProvider {
    fn load(&self, category: Category, id: &LayerId) -> AvatarResult<Vec<u8>> {
        let bytes = self
            .entries
            .get(&(category, id.clone()))
            .cloned()
            .ok_or_else(|| AvatarError::asset(category, id.as_str(), "not found"))?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/provider.rs"]
mod tests;

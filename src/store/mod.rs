//! Attribution entry points and directory discovery
//!
//! [`AttributionStore`] creates sidecars. It owns the configuration and a
//! shareable [`DigestCache`]; discovery and bulk resolution need neither and
//! are free functions.

use std::path::Path;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::attribution::Attribution;
use crate::checksum::{digest_of_bytes, DigestCache};
use crate::config::{ConfigError, StoreConfig};
use crate::content::{AttributedContent, EmbeddedContent, LocalContent};
use crate::error::{AttribError, Result};
use crate::pointer::AttributedContentPointer;
use crate::sidecar::{self, SidecarKind, WriteOptions};

/// Creates attributed content sidecars
#[derive(Debug, Clone)]
pub struct AttributionStore {
    config: StoreConfig,
    cache: Arc<DigestCache>,
}

impl Default for AttributionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributionStore {
    /// Default configuration with a fresh digest cache
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            cache: Arc::new(DigestCache::new()),
        }
    }

    /// Store with its own digest cache built from `config`
    pub fn with_config(config: StoreConfig) -> std::result::Result<Self, ConfigError> {
        let policy = config.cache_policy()?;
        Ok(Self {
            config,
            cache: Arc::new(DigestCache::with_policy(policy)),
        })
    }

    /// Store sharing an existing digest cache. The cache keeps its own policy.
    pub fn with_shared_cache(config: StoreConfig, cache: Arc<DigestCache>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<DigestCache> {
        &self.cache
    }

    pub fn write_options(&self) -> WriteOptions {
        self.config.write_options()
    }

    /// Attribute the file at `path` in place.
    ///
    /// Records the file's digest (through the cache) and writes
    /// `<path>.local.attrib`. The file itself is not touched.
    pub fn attribute_local(
        &self,
        path: &Path,
        attributions: Vec<Attribution>,
    ) -> Result<AttributedContentPointer> {
        let digest = self.cache.digest_of_file(path)?;
        self.write_local(path, digest, attributions)
    }

    /// Attribute a file whose bytes the caller just wrote, without the cache
    pub(crate) fn attribute_local_bytes(
        &self,
        path: &Path,
        bytes: &[u8],
        attributions: Vec<Attribution>,
    ) -> Result<AttributedContentPointer> {
        self.write_local(path, digest_of_bytes(bytes), attributions)
    }

    fn write_local(
        &self,
        path: &Path,
        digest: String,
        attributions: Vec<Attribution>,
    ) -> Result<AttributedContentPointer> {
        let content = LocalContent::new(path.to_path_buf(), digest, attributions);
        let sidecar_path = SidecarKind::Local.sidecar_path(path);
        sidecar::write_sidecar(&sidecar_path, &content.to_sidecar(), self.write_options())?;

        tracing::debug!(
            sidecar = %sidecar_path.display(),
            digest = %content.digest(),
            attributions = content.attributions().len(),
            "attributed local content"
        );
        Ok(AttributedContentPointer::new(sidecar_path))
    }

    /// Attribute in-memory bytes, embedding them in `<label>.raw.attrib`
    pub fn attribute_raw(
        &self,
        label: &Path,
        data: &[u8],
        attributions: Vec<Attribution>,
    ) -> Result<AttributedContentPointer> {
        let sidecar_path = SidecarKind::Embedded.sidecar_path(label);
        let content = EmbeddedContent::new(sidecar_path.clone(), data.to_vec(), attributions);
        sidecar::write_sidecar(&sidecar_path, &content.to_sidecar(), self.write_options())?;

        tracing::debug!(
            sidecar = %sidecar_path.display(),
            bytes = data.len(),
            attributions = content.attributions().len(),
            "attributed embedded content"
        );
        Ok(AttributedContentPointer::new(sidecar_path))
    }
}

/// Resolve a single sidecar path
pub fn resolve(path: &Path) -> Result<AttributedContent> {
    AttributedContent::load(path)
}

/// Every sidecar under `root`, in walk order. Symlinks are not followed.
pub fn enumerate(root: &Path) -> Result<Vec<AttributedContentPointer>> {
    let mut pointers = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| AttribError::Walk {
            root: root.to_path_buf(),
            source: e,
        })?;

        if entry.file_type().is_dir() {
            continue;
        }
        if sidecar::is_sidecar(entry.path()) {
            pointers.push(AttributedContentPointer::new(entry.into_path()));
        }
    }

    tracing::debug!(root = %root.display(), found = pointers.len(), "enumerated sidecars");
    Ok(pointers)
}

/// Enumerate and resolve every sidecar under `root`.
///
/// All or nothing: the first failure is returned and no partial results.
pub fn resolve_all(root: &Path) -> Result<Vec<AttributedContent>> {
    enumerate(root)?
        .iter()
        .map(AttributedContentPointer::resolve)
        .collect()
}

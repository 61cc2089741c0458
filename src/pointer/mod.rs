//! Lazily resolved handles to sidecars
//!
//! An [`AttributedContentPointer`] is just a sidecar path. Resolving it parses
//! the sidecar; copy and delete go through the resolved content.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::content::AttributedContent;
use crate::error::{AttribError, CopyStage, DeleteStage, IoOp, Result};
use crate::sidecar::{self, SidecarKind, LOCAL_SIDECAR_SUFFIX, RAW_SIDECAR_SUFFIX};
use crate::store::AttributionStore;

/// Locator for a persisted sidecar
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributedContentPointer {
    path: PathBuf,
}

impl AttributedContentPointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sidecar path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Variant encoded by the sidecar suffix
    pub fn kind(&self) -> Result<SidecarKind> {
        SidecarKind::detect(&self.path)
    }

    /// Parse the sidecar into content
    pub fn resolve(&self) -> Result<AttributedContent> {
        AttributedContent::load(&self.path)
    }

    /// Path of the referenced data file; local sidecars only
    pub fn data_path(&self) -> Result<PathBuf> {
        let content = self.resolve()?;
        Ok(content.into_local()?.data_path().to_path_buf())
    }

    /// Logical content name: the sidecar file name minus its variant suffix
    pub fn base_name(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        [RAW_SIDECAR_SUFFIX, LOCAL_SIDECAR_SUFFIX]
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .map(str::to_string)
            .unwrap_or(name)
    }

    /// Remove backing data (local only), then the sidecar.
    ///
    /// Steps run in order and the first failure aborts, naming the step.
    pub fn delete(&self) -> Result<()> {
        let content = self
            .resolve()
            .map_err(|e| AttribError::delete(DeleteStage::Resolve, &self.path, e))?;
        self.delete_resolved(&content)
    }

    fn delete_resolved(&self, content: &AttributedContent) -> Result<()> {
        content
            .delete()
            .map_err(|e| AttribError::delete(DeleteStage::Content, &self.path, e))?;

        fs::remove_file(&self.path).map_err(|e| {
            AttribError::delete(
                DeleteStage::Sidecar,
                &self.path,
                AttribError::io(IoOp::Remove, &self.path, e),
            )
        })?;

        tracing::debug!(
            sidecar = %self.path.display(),
            kind = %content.kind(),
            "deleted attributed content"
        );
        Ok(())
    }

    /// Copy the content to `new_path` and attribute the copy as local content.
    ///
    /// The attributions are carried over verbatim. The destination is fully
    /// written before its sidecar is created.
    ///
    /// The copy's digest is computed from the written bytes; the store's digest
    /// cache is neither consulted nor updated.
    pub fn copy_to(&self, store: &AttributionStore, new_path: &Path) -> Result<Self> {
        let content = self
            .resolve()
            .map_err(|e| AttribError::copy(CopyStage::Resolve, new_path, e))?;

        let bytes = content
            .read()
            .map_err(|e| AttribError::copy(CopyStage::Read, new_path, e))?;

        if let Some(parent) = new_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AttribError::copy(
                    CopyStage::CreateDirs,
                    new_path,
                    AttribError::io(IoOp::CreateDir, parent, e),
                )
            })?;
        }

        sidecar::write_bytes(new_path, &bytes, store.write_options().atomic)
            .map_err(|e| AttribError::copy(CopyStage::Write, new_path, e))?;

        let pointer = store
            .attribute_local_bytes(new_path, &bytes, content.into_attributions())
            .map_err(|e| AttribError::copy(CopyStage::Attribute, new_path, e))?;

        tracing::debug!(
            from = %self.path.display(),
            to = %new_path.display(),
            "copied attributed content"
        );
        Ok(pointer)
    }

    /// Copy into `dir`, keeping the content's base name
    pub fn copy_to_dir(&self, store: &AttributionStore, dir: &Path) -> Result<Self> {
        self.copy_to(store, &dir.join(self.base_name()))
    }
}

impl fmt::Display for AttributedContentPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<PathBuf> for AttributedContentPointer {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl AsRef<Path> for AttributedContentPointer {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

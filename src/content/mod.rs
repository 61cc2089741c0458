//! Attributed content in its two storage forms
//!
//! [`AttributedContent`] is the resolved form of a sidecar. Callers use the
//! shared operations without caring which variant they hold; the
//! variant-specific ones report a type mismatch instead.

mod embedded;
mod local;

pub use embedded::EmbeddedContent;
pub use local::LocalContent;

use std::path::Path;

use crate::attribution::Attribution;
use crate::error::{AttribError, Result};
use crate::sidecar::{self, EmbeddedSidecar, LocalSidecar, SidecarKind};

/// Content plus its ordered attributions
#[derive(Debug, Clone, PartialEq)]
pub enum AttributedContent {
    /// Bytes live at a separate path, checked against a recorded digest
    Local(LocalContent),
    /// Bytes live inside the sidecar
    Embedded(EmbeddedContent),
}

impl AttributedContent {
    /// Parse the sidecar at `path` with the codec its suffix selects
    pub fn load(path: &Path) -> Result<Self> {
        match SidecarKind::detect(path)? {
            SidecarKind::Local => {
                let sidecar: LocalSidecar = sidecar::read_sidecar(path)?;
                Ok(AttributedContent::Local(sidecar.into()))
            }
            SidecarKind::Embedded => {
                let sidecar: EmbeddedSidecar = sidecar::read_sidecar(path)?;
                let data = sidecar.decode_data(path)?;
                Ok(AttributedContent::Embedded(EmbeddedContent::new(
                    path.to_path_buf(),
                    data,
                    sidecar.attributions,
                )))
            }
        }
    }

    pub fn kind(&self) -> SidecarKind {
        match self {
            AttributedContent::Local(_) => SidecarKind::Local,
            AttributedContent::Embedded(_) => SidecarKind::Embedded,
        }
    }

    pub fn attributions(&self) -> &[Attribution] {
        match self {
            AttributedContent::Local(c) => c.attributions(),
            AttributedContent::Embedded(c) => c.attributions(),
        }
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            AttributedContent::Local(c) => c.read(),
            AttributedContent::Embedded(c) => Ok(c.read()),
        }
    }

    pub fn read_as_text(&self) -> Result<String> {
        match self {
            AttributedContent::Local(c) => c.read_as_text(),
            AttributedContent::Embedded(c) => c.read_as_text(),
        }
    }

    /// Recorded digest for local content, computed digest for embedded content
    pub fn digest(&self) -> String {
        match self {
            AttributedContent::Local(c) => c.digest().to_string(),
            AttributedContent::Embedded(c) => c.digest(),
        }
    }

    /// Remove backing storage, if any. Never touches the sidecar.
    pub fn delete(&self) -> Result<()> {
        match self {
            AttributedContent::Local(c) => c.delete(),
            AttributedContent::Embedded(c) => c.delete(),
        }
    }

    /// Path of the referenced data file; local content only
    pub fn data_path(&self) -> Result<&Path> {
        match self {
            AttributedContent::Local(c) => Ok(c.data_path()),
            AttributedContent::Embedded(c) => Err(type_mismatch(
                c.sidecar_path(),
                SidecarKind::Local,
                SidecarKind::Embedded,
            )),
        }
    }

    pub fn as_local(&self) -> Option<&LocalContent> {
        match self {
            AttributedContent::Local(c) => Some(c),
            AttributedContent::Embedded(_) => None,
        }
    }

    pub fn as_embedded(&self) -> Option<&EmbeddedContent> {
        match self {
            AttributedContent::Embedded(c) => Some(c),
            AttributedContent::Local(_) => None,
        }
    }

    pub fn into_local(self) -> Result<LocalContent> {
        match self {
            AttributedContent::Local(c) => Ok(c),
            AttributedContent::Embedded(c) => Err(type_mismatch(
                c.sidecar_path(),
                SidecarKind::Local,
                SidecarKind::Embedded,
            )),
        }
    }

    pub fn into_embedded(self) -> Result<EmbeddedContent> {
        match self {
            AttributedContent::Embedded(c) => Ok(c),
            AttributedContent::Local(c) => Err(type_mismatch(
                c.data_path(),
                SidecarKind::Embedded,
                SidecarKind::Local,
            )),
        }
    }

    /// Consume the content, keeping only its attributions
    pub fn into_attributions(self) -> Vec<Attribution> {
        match self {
            AttributedContent::Local(c) => c.into_attributions(),
            AttributedContent::Embedded(c) => c.into_attributions(),
        }
    }
}

fn type_mismatch(path: &Path, expected: SidecarKind, actual: SidecarKind) -> AttribError {
    AttribError::TypeMismatch {
        path: path.to_path_buf(),
        expected: expected.as_str(),
        actual: actual.as_str(),
    }
}

impl From<LocalContent> for AttributedContent {
    fn from(content: LocalContent) -> Self {
        AttributedContent::Local(content)
    }
}

impl From<EmbeddedContent> for AttributedContent {
    fn from(content: EmbeddedContent) -> Self {
        AttributedContent::Embedded(content)
    }
}

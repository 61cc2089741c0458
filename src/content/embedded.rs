//! Content carried inside its own sidecar

use std::path::{Path, PathBuf};

use crate::attribution::Attribution;
use crate::checksum::digest_of_bytes;
use crate::error::{AttribError, Result};
use crate::sidecar::EmbeddedSidecar;

/// Attributed content whose bytes live in the sidecar itself.
///
/// Content and record are one artifact, so reads never fail integrity checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedContent {
    attributions: Vec<Attribution>,
    data: Vec<u8>,
    sidecar_path: PathBuf,
}

impl EmbeddedContent {
    /// Content carried by the sidecar at `sidecar_path`
    pub fn new(sidecar_path: PathBuf, data: Vec<u8>, attributions: Vec<Attribution>) -> Self {
        Self {
            attributions,
            data,
            sidecar_path,
        }
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }

    pub fn attributions(&self) -> &[Attribution] {
        &self.attributions
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn read(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Payload as text.
    ///
    /// Text payloads always succeed. Only binary payloads, which are stored
    /// base64 encoded, fail with `NotText`.
    pub fn read_as_text(&self) -> Result<String> {
        String::from_utf8(self.data.clone()).map_err(|e| AttribError::NotText {
            path: self.sidecar_path.clone(),
            source: e,
        })
    }

    /// Digest of the embedded bytes, computed on every call
    pub fn digest(&self) -> String {
        digest_of_bytes(&self.data)
    }

    /// Nothing to remove besides the sidecar, which the pointer owns
    pub fn delete(&self) -> Result<()> {
        Ok(())
    }

    pub(crate) fn to_sidecar(&self) -> EmbeddedSidecar {
        EmbeddedSidecar::new(self.attributions.clone(), &self.data)
    }

    pub(crate) fn into_attributions(self) -> Vec<Attribution> {
        self.attributions
    }
}

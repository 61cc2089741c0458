//! Content referenced by path, verified against its recorded digest on read

use std::fs;
use std::path::{Path, PathBuf};

use crate::attribution::Attribution;
use crate::checksum::digest_of_bytes;
use crate::error::{AttribError, IoOp, Result};
use crate::sidecar::LocalSidecar;

/// Attributed content stored in a separate file.
///
/// The digest is the one recorded at attribution time and is never
/// recomputed; every read re-hashes the file and compares.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalContent {
    attributions: Vec<Attribution>,
    data_path: PathBuf,
    sha256: String,
}

impl LocalContent {
    pub fn new(data_path: PathBuf, sha256: String, attributions: Vec<Attribution>) -> Self {
        Self {
            attributions,
            data_path,
            sha256,
        }
    }

    pub fn attributions(&self) -> &[Attribution] {
        &self.attributions
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Recorded digest
    pub fn digest(&self) -> &str {
        &self.sha256
    }

    /// Read the referenced file, failing if it no longer matches the recorded digest
    pub fn read(&self) -> Result<Vec<u8>> {
        let bytes =
            fs::read(&self.data_path).map_err(|e| AttribError::io(IoOp::Read, &self.data_path, e))?;

        let current = digest_of_bytes(&bytes);
        if current != self.sha256 {
            return Err(AttribError::Integrity {
                path: self.data_path.clone(),
                expected: self.sha256.clone(),
                actual: current,
            });
        }

        Ok(bytes)
    }

    pub fn read_as_text(&self) -> Result<String> {
        let bytes = self.read()?;
        String::from_utf8(bytes).map_err(|e| AttribError::NotText {
            path: self.data_path.clone(),
            source: e,
        })
    }

    /// Remove the referenced data file. The sidecar is left alone.
    pub fn delete(&self) -> Result<()> {
        fs::remove_file(&self.data_path)
            .map_err(|e| AttribError::io(IoOp::Remove, &self.data_path, e))
    }

    pub(crate) fn to_sidecar(&self) -> LocalSidecar {
        LocalSidecar {
            attributions: self.attributions.clone(),
            data_path: self.data_path.clone(),
            sha256_checksum: self.sha256.clone(),
        }
    }

    pub(crate) fn into_attributions(self) -> Vec<Attribution> {
        self.attributions
    }
}

impl From<LocalSidecar> for LocalContent {
    fn from(sidecar: LocalSidecar) -> Self {
        Self::new(
            sidecar.data_path,
            sidecar.sha256_checksum,
            sidecar.attributions,
        )
    }
}

//! Sidecar file codec
//!
//! A sidecar persists an attributed content's metadata next to (or instead of)
//! the content. The suffix selects the shape:
//! - `<data>.local.attrib`: attributions, `dataPath`, `sha256Checksum`
//! - `<label>.raw.attrib`: attributions and the `data` payload (plain text,
//!   or base64 with `"encoding": "base64"` when the bytes are not UTF-8)
//!
//! Both extend the generic `.attrib` discovery suffix. Sidecars are JSON.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::attribution::Attribution;
use crate::error::{AttribError, IoOp, Result};

/// Generic suffix shared by every sidecar
pub const SIDECAR_SUFFIX: &str = ".attrib";

/// Suffix of sidecars that reference a local file
pub const LOCAL_SIDECAR_SUFFIX: &str = ".local.attrib";

/// Suffix of sidecars that embed their content
pub const RAW_SIDECAR_SUFFIX: &str = ".raw.attrib";

/// Which codec a sidecar path uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidecarKind {
    Local,
    Embedded,
}

impl SidecarKind {
    /// Classify a sidecar path by its suffix
    pub fn detect(path: &Path) -> Result<Self> {
        let name = path.to_string_lossy();
        if name.ends_with(RAW_SIDECAR_SUFFIX) {
            Ok(SidecarKind::Embedded)
        } else if name.ends_with(LOCAL_SIDECAR_SUFFIX) {
            Ok(SidecarKind::Local)
        } else {
            Err(AttribError::UnknownFormat {
                path: path.to_path_buf(),
            })
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            SidecarKind::Local => LOCAL_SIDECAR_SUFFIX,
            SidecarKind::Embedded => RAW_SIDECAR_SUFFIX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SidecarKind::Local => "local",
            SidecarKind::Embedded => "embedded",
        }
    }

    /// Sidecar path for content named `base`
    pub fn sidecar_path(&self, base: &Path) -> PathBuf {
        let mut s = base.as_os_str().to_os_string();
        s.push(self.suffix());
        PathBuf::from(s)
    }
}

impl std::fmt::Display for SidecarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if `path` ends with the generic sidecar suffix
pub fn is_sidecar(path: &Path) -> bool {
    path.to_string_lossy().ends_with(SIDECAR_SUFFIX)
}

/// On-disk shape of a local sidecar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSidecar {
    #[serde(default)]
    pub attributions: Vec<Attribution>,

    #[serde(rename = "dataPath")]
    pub data_path: PathBuf,

    #[serde(rename = "sha256Checksum")]
    pub sha256_checksum: String,
}

/// How an embedded `data` payload is encoded on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    Base64,
}

/// On-disk shape of an embedded sidecar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedSidecar {
    #[serde(default)]
    pub attributions: Vec<Attribution>,

    /// Content as a plain string unless `encoding` says otherwise
    pub data: String,

    /// Absent for plain text payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<PayloadEncoding>,
}

impl EmbeddedSidecar {
    /// UTF-8 bytes are stored verbatim; anything else is base64 encoded
    pub fn new(attributions: Vec<Attribution>, data: &[u8]) -> Self {
        match std::str::from_utf8(data) {
            Ok(text) => Self {
                attributions,
                data: text.to_string(),
                encoding: None,
            },
            Err(_) => Self {
                attributions,
                data: base64::engine::general_purpose::STANDARD.encode(data),
                encoding: Some(PayloadEncoding::Base64),
            },
        }
    }

    /// Decode the payload; `path` names the sidecar in errors
    pub fn decode_data(&self, path: &Path) -> Result<Vec<u8>> {
        match self.encoding {
            None => Ok(self.data.as_bytes().to_vec()),
            Some(PayloadEncoding::Base64) => base64::engine::general_purpose::STANDARD
                .decode(self.data.as_bytes())
                .map_err(|e| AttribError::Payload {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }),
        }
    }
}

/// How sidecars and copied content are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Pretty-print JSON
    pub pretty: bool,

    /// Write to a temp file in the target directory, then rename into place
    pub atomic: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            atomic: true,
        }
    }
}

/// Serialize `value` and write it to `path`
pub fn write_sidecar<T: Serialize>(path: &Path, value: &T, options: WriteOptions) -> Result<()> {
    let bytes = if options.pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|e| AttribError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    write_bytes(path, &bytes, options.atomic)
}

/// Read and parse a sidecar of the expected shape
pub fn read_sidecar<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| AttribError::io(IoOp::Read, path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| AttribError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `bytes` to `path`, optionally via temp-then-rename.
///
/// With `atomic`, readers never observe a partially written file at `path`.
pub fn write_bytes(path: &Path, bytes: &[u8], atomic: bool) -> Result<()> {
    if !atomic {
        return fs::write(path, bytes).map_err(|e| AttribError::io(IoOp::Write, path, e));
    }

    let temp_path = temp_path_for(path);
    if let Err(e) = fs::write(&temp_path, bytes) {
        let _ = fs::remove_file(&temp_path);
        return Err(AttribError::io(IoOp::Write, &temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(AttribError::io(IoOp::Rename, path, e));
    }

    Ok(())
}

/// Hidden temp file next to `path`, so the rename stays on one filesystem
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_name = format!(".{}.tmp.{}", name, uuid::Uuid::new_v4().simple());
    match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

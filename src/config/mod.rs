//! Store configuration
//!
//! Built-in defaults, optionally overlaid by one or more TOML files:
//!
//! ```toml
//! [digest_cache]
//! enabled = true
//! bypass = ["**/*.log"]
//!
//! [sidecar]
//! pretty = true
//! atomic_writes = true
//! ```

mod merge;

pub use merge::{deep_merge, merge_layers};

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checksum::CachePolicy;
use crate::sidecar::WriteOptions;

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid bypass pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Digest cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestCacheConfig {
    /// Memoise file digests
    pub enabled: bool,

    /// Glob patterns (matched against absolute paths) that are never cached
    pub bypass: Vec<String>,
}

impl Default for DigestCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bypass: Vec::new(),
        }
    }
}

/// Sidecar writing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    pub pretty: bool,

    /// Write via temp file and rename
    pub atomic_writes: bool,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            atomic_writes: true,
        }
    }
}

/// Configuration for an [`AttributionStore`](crate::AttributionStore)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub digest_cache: DigestCacheConfig,
    pub sidecar: SidecarConfig,
}

impl StoreConfig {
    /// Defaults overlaid with a single TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Self::from_layers(vec![parse_toml(toml_str)?])
    }

    /// Defaults overlaid with a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_files(&[path])
    }

    /// Defaults overlaid with each existing file in order; later files win.
    ///
    /// Missing files are skipped.
    pub fn from_files(paths: &[&Path]) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            layers.push(parse_toml(&contents)?);
        }
        Self::from_layers(layers)
    }

    fn from_layers(overlays: Vec<Value>) -> Result<Self, ConfigError> {
        let defaults =
            serde_json::to_value(Self::default()).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut layers = vec![defaults];
        layers.extend(overlays);
        let merged = merge_layers(layers);

        let config: Self =
            serde_json::from_value(merged).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.cache_policy()?;
        Ok(config)
    }

    /// Compile the digest cache settings
    pub fn cache_policy(&self) -> Result<CachePolicy, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.digest_cache.bypass {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            builder.add(glob);
        }
        let bypass = builder.build().map_err(|e| ConfigError::InvalidPattern {
            pattern: self.digest_cache.bypass.join(", "),
            reason: e.to_string(),
        })?;

        Ok(CachePolicy {
            enabled: self.digest_cache.enabled,
            bypass,
        })
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            pretty: self.sidecar.pretty,
            atomic: self.sidecar.atomic_writes,
        }
    }
}

fn parse_toml(contents: &str) -> Result<Value, ConfigError> {
    let value: toml::Value = toml::from_str(contents)
        .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))?;
    Ok(merge::toml_to_json(value))
}

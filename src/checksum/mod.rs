//! SHA-256 content digests with a memoising file-digest cache
//!
//! Digests are lowercase hex SHA-256. [`DigestCache`] remembers the digest of
//! every file it has hashed, keyed by absolute path, and never revalidates:
//! a later call for the same path returns the first digest even if the file
//! has changed since. Callers that need a fresh digest use
//! [`DigestCache::digest_of_file_uncached`], [`DigestCache::forget`], or a
//! bypass pattern in [`CachePolicy`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use globset::GlobSet;
use sha2::{Digest, Sha256};

use crate::error::{AttribError, IoOp, Result};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of bytes and return hex string
pub fn digest_of_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Stream a file through SHA-256 without consulting any cache
fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| AttribError::io(IoOp::Open, path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| AttribError::io(IoOp::Read, path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// When the cache is consulted
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Memoise file digests at all
    pub enabled: bool,

    /// Absolute paths matching any of these are always re-hashed
    pub bypass: GlobSet,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            bypass: GlobSet::empty(),
        }
    }
}

impl CachePolicy {
    fn applies_to(&self, path: &Path) -> bool {
        self.enabled && !self.bypass.is_match(path)
    }
}

/// Thread-safe memo of file digests keyed by absolute path.
///
/// Lookups take a shared lock and inserts an exclusive one; hashing itself
/// happens outside the lock so different files hash concurrently.
#[derive(Debug, Default)]
pub struct DigestCache {
    entries: RwLock<HashMap<PathBuf, String>>,
    policy: CachePolicy,
}

impl DigestCache {
    /// Create an empty cache with the default policy (always cache)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache with the given policy
    pub fn with_policy(policy: CachePolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Digest of the file at `path`, from the cache when present.
    ///
    /// On a miss the file is streamed through SHA-256 and the result stored.
    pub fn digest_of_file(&self, path: &Path) -> Result<String> {
        let key = cache_key(path);

        if !self.policy.applies_to(&key) {
            tracing::trace!(path = %key.display(), "digest cache bypassed");
            return hash_file(path);
        }

        if let Some(digest) = self.cached(&key) {
            tracing::trace!(path = %key.display(), digest = %digest, "digest cache hit");
            return Ok(digest);
        }

        let digest = hash_file(path)?;
        tracing::trace!(path = %key.display(), digest = %digest, "digest cache miss");

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, digest.clone());

        Ok(digest)
    }

    /// Digest of the file at `path`, always re-reading it. The cache is not updated.
    pub fn digest_of_file_uncached(&self, path: &Path) -> Result<String> {
        hash_file(path)
    }

    /// Previously computed digest for `path`, if any
    pub fn cached(&self, path: &Path) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&cache_key(path))
            .cloned()
    }

    /// Drop the memoised digest for `path`, returning it
    pub fn forget(&self, path: &Path) -> Option<String> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&cache_key(path))
    }

    /// Drop every memoised digest
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Absolute form of `path` without touching the filesystem
fn cache_key(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

//! Attrib Store - provenance sidecars bound to content
//!
//! Attaches ordered [`Attribution`] records to content and persists them as
//! sidecar files. Content is either referenced by path (`.local.attrib`,
//! integrity-checked by SHA-256 on every read) or embedded in the sidecar
//! (`.raw.attrib`). Sidecars are discovered by their `.attrib` suffix.

pub mod attribution;
pub mod checksum;
pub mod config;
pub mod content;
pub mod error;
pub mod pointer;
pub mod sidecar;
pub mod store;

pub use attribution::{Attribution, AttributionBuilder, ATTRIBUTION_SUFFIX};
pub use checksum::{digest_of_bytes, CachePolicy, DigestCache};
pub use config::{ConfigError, StoreConfig};
pub use content::{AttributedContent, EmbeddedContent, LocalContent};
pub use error::{AttribError, ErrorKind, Result};
pub use pointer::AttributedContentPointer;
pub use sidecar::{SidecarKind, LOCAL_SIDECAR_SUFFIX, RAW_SIDECAR_SUFFIX, SIDECAR_SUFFIX};
pub use store::{enumerate, resolve, resolve_all, AttributionStore};

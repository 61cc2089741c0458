//! Provenance records
//!
//! An [`Attribution`] describes one collection event for a piece of content.
//! Fields are unvalidated: empty strings and epoch timestamps are legal.
//!
//! A lone record can also be saved as `<base>.atrib`. That suffix does not
//! end in `.attrib`, so these files are invisible to sidecar discovery.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sidecar::{self, WriteOptions};

/// Suffix of single-record attribution files
pub const ATTRIBUTION_SUFFIX: &str = ".atrib";

/// A single provenance record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribution {
    /// Where the content was fetched from
    pub origin_url: String,

    /// When the content was collected
    pub collected_at: DateTime<Utc>,

    /// Title of the content at its origin
    pub original_title: String,

    pub author: String,

    pub author_url: String,

    /// License name (e.g., "CC-BY-4.0")
    pub license: String,

    pub license_url: String,

    /// When the content was originally created
    pub created_at: DateTime<Utc>,

    /// Free-text context, in insertion order
    pub context: Vec<String>,

    /// How the content was scraped or collected
    pub scraping_methodology: String,
}

impl Attribution {
    pub fn builder(origin_url: impl Into<String>) -> AttributionBuilder {
        AttributionBuilder::new(origin_url)
    }

    /// Write this record alone to `<base>.atrib`, returning the written path
    pub fn write_to(&self, base: &Path) -> Result<PathBuf> {
        let path = record_path(base);
        sidecar::write_sidecar(&path, self, WriteOptions::default())?;
        Ok(path)
    }

    /// Read a record written by [`Attribution::write_to`]
    pub fn read_from(base: &Path) -> Result<Self> {
        sidecar::read_sidecar(&record_path(base))
    }
}

fn record_path(base: &Path) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(ATTRIBUTION_SUFFIX);
    PathBuf::from(s)
}

/// Builder for constructing attributions
#[derive(Debug, Clone)]
pub struct AttributionBuilder {
    inner: Attribution,
}

impl AttributionBuilder {
    /// Start a record for content collected from `origin_url`, stamped now
    pub fn new(origin_url: impl Into<String>) -> Self {
        Self {
            inner: Attribution {
                origin_url: origin_url.into(),
                collected_at: Utc::now(),
                ..Attribution::default()
            },
        }
    }

    pub fn collected_at(mut self, at: DateTime<Utc>) -> Self {
        self.inner.collected_at = at;
        self
    }

    pub fn original_title(mut self, title: impl Into<String>) -> Self {
        self.inner.original_title = title.into();
        self
    }

    pub fn author(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.inner.author = name.into();
        self.inner.author_url = url.into();
        self
    }

    pub fn license(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.inner.license = name.into();
        self.inner.license_url = url.into();
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.inner.created_at = at;
        self
    }

    /// Append one context string
    pub fn context(mut self, line: impl Into<String>) -> Self {
        self.inner.context.push(line.into());
        self
    }

    pub fn scraping_methodology(mut self, method: impl Into<String>) -> Self {
        self.inner.scraping_methodology = method.into();
        self
    }

    pub fn build(self) -> Attribution {
        self.inner
    }
}

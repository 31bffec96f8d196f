//! Directory listings.
//!
//! # Data Flow
//! ```text
//! store entries under a prefix
//!     → ListingEntry::from_store (names made relative, empty names dropped)
//!     → sort.rs (SortPolicy, total order)
//!     → render.rs (JSON, HTML, simple HTML or Apache table)
//! ```

pub mod render;
pub mod sort;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::StoreEntry;

pub use render::{render, RenderedListing};
pub use sort::SortPolicy;

/// Size reported for pseudo-directories.
pub const DIRECTORY_SIZE: i64 = -1;

/// One child of a listed prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    /// Name relative to the listed prefix; directories end in `/`.
    pub name: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ListingEntry {
    pub fn file(name: impl Into<String>, size: i64, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            size,
            last_modified,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: DIRECTORY_SIZE,
            last_modified: None,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Convert store entries to entries relative to `prefix`.
    pub fn from_store(prefix: &str, entries: Vec<StoreEntry>) -> Vec<ListingEntry> {
        entries
            .into_iter()
            .filter_map(|entry| match entry {
                StoreEntry::Prefix(key) => {
                    relative(prefix, &key).map(ListingEntry::directory)
                }
                StoreEntry::Object {
                    key,
                    size,
                    last_modified,
                } => relative(prefix, &key)
                    .map(|name| ListingEntry::file(name, size as i64, Some(last_modified))),
            })
            .collect()
    }
}

fn relative(prefix: &str, key: &str) -> Option<String> {
    let name = key.strip_prefix(prefix).unwrap_or(key);
    (!name.is_empty()).then(|| name.to_string())
}

//! Entry types shared between list fragments and merged results.

use chrono::{DateTime, Utc};

/// The owner of an object, included when the client requests `fetch-owner`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    /// Canonical owner ID.
    pub id: Option<String>,
    /// Display name, when the backend reports one.
    pub display_name: Option<String>,
}

/// One object entry in a listing (`<Contents>` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectEntry {
    /// The object key.
    pub key: String,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag, quoted as the backend returned it.
    pub e_tag: Option<String>,
    /// Object size in bytes.
    pub size: Option<i64>,
    /// Storage class, passed through from the backend verbatim.
    pub storage_class: Option<String>,
    /// Object owner, present only for `fetch-owner` listings.
    pub owner: Option<Owner>,
}

impl ObjectEntry {
    /// Convenience constructor for an entry with only a key, used widely in
    /// merge tests.
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// A synthetic "folder" entry for a delimited listing
/// (`<CommonPrefixes>` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommonPrefix {
    /// The shared key prefix up to and including the delimiter.
    pub prefix: String,
}

impl CommonPrefix {
    /// Create a common prefix entry.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

//! Project snapshot types — events, object references, bank inclusions

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::QueryFailure;

/// Opaque id of any project object (a GUID such as `{3A4B...}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(String);

impl ObjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One entry of a bank's direct inclusion list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InclusionEntry {
    /// Included object
    pub object: ObjectRef,

    /// Inclusion categories (`events`, `structures`, `media`, ...) as Wwise reports them.
    /// Kept verbatim; resolution ignores them.
    #[serde(default)]
    pub filter: Vec<String>,
}

/// Event names reachable from bank inclusions
pub type ReachableEvents = HashSet<String>;

/// Every event in the project, name → path, in the order WAAPI listed them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCatalog {
    events: IndexMap<String, String>,
}

impl EventCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event; a name seen twice is rejected rather than overwritten
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<(), QueryFailure> {
        let name = name.into();
        let path = path.into();
        if let Some(first_path) = self.events.get(&name) {
            return Err(QueryFailure::DuplicateEvent {
                first_path: first_path.clone(),
                second_path: path,
                name,
            });
        }
        self.events.insert(name, path);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    /// `(name, path)` pairs in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.events.iter().map(|(name, path)| (name.as_str(), path.as_str()))
    }
}

/// One line of the audit report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub name: String,
    pub path: String,
}

impl ReportRow {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

//! Scope handling and persistence.
//!
//! A scope is the ordered key/value evaluation context used to resolve a
//! graph instance from the backing rule engine. It round-trips to a compact
//! `key:value, key:value` text line and to a persisted per-application,
//! per-cube entry.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Namespace prefix for persisted scope entries.
pub const SCOPE_MAP_NAMESPACE: &str = "scopemap";

/// Backend envelope keys that must never appear in a logical scope.
///
/// Stripped immediately upon receipt, before any serialization or
/// comparison.
const METADATA_KEYS: [&str; 2] = ["@type", "@id"];

/// An ordered key/value scope mapping.
///
/// Keys keep their insertion order; setting an existing key overwrites its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    entries: Vec<(String, String)>,
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a scope from its `key:value, key:value` text form.
    ///
    /// Entries are split on commas, then on the first colon. Both sides are
    /// trimmed. Malformed entries (no colon, or an empty value after
    /// trimming) are tolerated by omission; well-formed entries around them
    /// are kept.
    pub fn parse(text: &str) -> Self {
        let mut scope = Self::new();
        for entry in text.split(',') {
            let Some((key, value)) = entry.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            scope.set(key, value);
        }
        scope
    }

    /// Serialize to the `key:value, key:value` text form.
    ///
    /// Comma-space separated, no trailing separator. `Scope::parse` of the
    /// result reproduces this scope.
    pub fn to_text(&self) -> String {
        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        pairs.join(", ")
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a key to a value, overwriting in place if the key exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove a key, returning its value if present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Drop the backend envelope keys (`@type`, `@id`).
    pub fn strip_metadata(&mut self) {
        self.entries.retain(|(k, _)| !METADATA_KEYS.contains(&k.as_str()));
    }

    /// Whether the scope has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Build the persisted-store key for a cube's scope.
///
/// Namespace prefix, then the hosting-application identifier, then the cube
/// name, both lower-cased.
pub fn storage_key(app_id: &str, cube_name: &str) -> String {
    format!(
        "{SCOPE_MAP_NAMESPACE}:{}:{}",
        app_id.to_lowercase(),
        cube_name.to_lowercase()
    )
}

/// Persisted scope storage.
///
/// Absence of an entry is an empty scope, not an error. Saving an empty
/// scope removes the entry: save and delete are the same operation keyed on
/// emptiness.
pub trait ScopeStorage {
    /// Load the scope persisted under `key`, or an empty scope if none.
    fn load(&self, key: &str) -> Result<Scope>;

    /// Persist `scope` under `key`, or remove the entry if `scope` is empty.
    fn save(&mut self, key: &str, scope: &Scope) -> Result<()>;
}

/// In-memory scope store for tests and embedding hosts with their own
/// persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryScopeStore {
    entries: HashMap<String, Scope>,
}

impl MemoryScopeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeStorage for MemoryScopeStore {
    fn load(&self, key: &str) -> Result<Scope> {
        Ok(self.entries.get(key).cloned().unwrap_or_default())
    }

    fn save(&mut self, key: &str, scope: &Scope) -> Result<()> {
        if scope.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.to_string(), scope.clone());
        }
        Ok(())
    }
}

/// File-backed scope store.
///
/// Persists all entries as a single JSON map in one file. A missing file is
/// an empty store.
#[derive(Debug, Clone)]
pub struct FileScopeStore {
    path: PathBuf,
}

impl FileScopeStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<HashMap<String, Scope>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write_map(&self, map: &HashMap<String, Scope>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl ScopeStorage for FileScopeStore {
    fn load(&self, key: &str) -> Result<Scope> {
        let map = self.read_map()?;
        Ok(map.get(key).cloned().unwrap_or_default())
    }

    fn save(&mut self, key: &str, scope: &Scope) -> Result<()> {
        let mut map = self.read_map()?;
        if scope.is_empty() {
            map.remove(key);
        } else {
            map.insert(key.to_string(), scope.clone());
        }
        tracing::debug!(key, entries = scope.len(), "persisting scope");
        self.write_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let scope = Scope::parse("state: OH, product:  WORKCOMP");
        assert_eq!(scope.get("state"), Some("OH"));
        assert_eq!(scope.get("product"), Some("WORKCOMP"));
        assert_eq!(scope.to_text(), "state:OH, product:WORKCOMP");
    }

    #[test]
    fn parse_drops_malformed_entries_only() {
        let scope = Scope::parse("state:OH, nocolon, empty:, product:WC");
        assert_eq!(scope.len(), 2);
        assert_eq!(scope.get("state"), Some("OH"));
        assert_eq!(scope.get("product"), Some("WC"));
    }

    #[test]
    fn parse_keeps_first_colon_split() {
        let scope = Scope::parse("url:http://example");
        assert_eq!(scope.get("url"), Some("http://example"));
    }

    #[test]
    fn round_trip_is_exact_for_well_formed_text() {
        let text = "state:OH, product:WORKCOMP, quoteDate:2016-01-01";
        assert_eq!(Scope::parse(text).to_text(), text);
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut scope = Scope::parse("a:1, b:2");
        scope.set("a", "9");
        assert_eq!(scope.to_text(), "a:9, b:2");
    }

    #[test]
    fn strip_metadata_removes_envelope_keys() {
        let mut scope = Scope::parse("@type:map, state:OH, @id:7");
        scope.strip_metadata();
        assert_eq!(scope.to_text(), "state:OH");
    }

    #[test]
    fn storage_key_lower_cases_parts() {
        assert_eq!(
            storage_key("MyApp", "rpm.class.Product"),
            "scopemap:myapp:rpm.class.product"
        );
    }

    #[test]
    fn memory_store_save_empty_deletes() {
        let mut store = MemoryScopeStore::new();
        let key = storage_key("app", "cube");
        store.save(&key, &Scope::parse("state:OH")).unwrap();
        assert_eq!(store.load(&key).unwrap().get("state"), Some("OH"));

        store.save(&key, &Scope::new()).unwrap();
        assert!(store.load(&key).unwrap().is_empty());
    }
}

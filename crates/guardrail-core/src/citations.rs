//! Static document-title to URL citation table.
//!
//! The table is loaded once at process start from a JSON array of
//! `{"title": ..., "url": ...}` entries. Lookups are keyed by a normalized
//! form of the document name; a miss resolves to no URL, never an error.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One entry of the citation source file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Human-readable document title.
    pub title: String,
    /// Canonical URL for the document.
    pub url: String,
}

/// Normalizes a document name into a citation lookup key.
///
/// Trims, lowercases, replaces spaces with underscores, and strips
/// parentheses: `"Machine Guarding (Best Practices)"` becomes
/// `"machine_guarding_best_practices"`.
pub fn normalize_title(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['(', ')'], "")
}

/// In-memory title→URL table with normalized keys.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    urls: HashMap<String, String>,
}

impl SourceTable {
    /// Creates an empty table; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from parsed entries, normalizing each title.
    pub fn from_entries(entries: Vec<SourceEntry>) -> Self {
        let urls = entries
            .into_iter()
            .map(|entry| (normalize_title(&entry.title), entry.url))
            .collect();
        Self { urls }
    }

    /// Parses a table from the JSON source file contents.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<SourceEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    /// Loads the table from a JSON file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_json_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        debug!("Loaded {} citation sources", table.urls.len());
        Ok(table)
    }

    /// Resolves a document name to its citation URL.
    ///
    /// The name is normalized before lookup; if that misses and the name
    /// carries a file extension, the stem is tried as well (chunk records
    /// store source file names like `machine_guarding.pdf`, while the table
    /// is keyed by document title).
    pub fn url_for(&self, doc_name: &str) -> Option<&str> {
        if let Some(url) = self.urls.get(&normalize_title(doc_name)) {
            return Some(url.as_str());
        }
        let stem = Path::new(doc_name.trim()).file_stem()?.to_str()?;
        self.urls.get(&normalize_title(stem)).map(String::as_str)
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_parens_and_spaces() {
        assert_eq!(
            normalize_title("Machine Guarding (Best Practices)"),
            "machine_guarding_best_practices"
        );
    }

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_title("  Forklift Safety  "), "forklift_safety");
        assert_eq!(normalize_title("PPE"), "ppe");
    }

    #[test]
    fn test_lookup_hit() {
        let table = SourceTable::from_json_str(
            r#"[{"title": "Machine Guarding (Best Practices)", "url": "https://example.org/guarding"}]"#,
        )
        .unwrap();
        assert_eq!(
            table.url_for("Machine Guarding (Best Practices)"),
            Some("https://example.org/guarding")
        );
    }

    #[test]
    fn test_lookup_by_file_name_stem() {
        let table = SourceTable::from_json_str(
            r#"[{"title": "Machine Guarding", "url": "https://example.org/guarding"}]"#,
        )
        .unwrap();
        assert_eq!(
            table.url_for("Machine Guarding.pdf"),
            Some("https://example.org/guarding")
        );
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let table = SourceTable::empty();
        assert_eq!(table.url_for("Unknown Document"), None);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(SourceTable::from_json_str("not json").is_err());
        assert!(SourceTable::from_json_str(r#"{"title": "x"}"#).is_err());
    }
}

//! Core types for the merged Unicode dataset

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::blocks::UNKNOWN_BLOCK;

/// Information about a single character, keyed externally by its canonical
/// code point (uppercase hex, zero-padded to at least 4 digits).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharRecord {
    /// Formal character name from the primary database
    pub name: String,
    /// General category code (e.g. "Lu")
    pub category: String,
    /// Single-character textual rendering
    pub glyph: String,
    /// Block name, or "Unknown Block" when no range matches
    #[serde(default = "unknown_block")]
    pub block: String,
}

fn unknown_block() -> String {
    UNKNOWN_BLOCK.to_string()
}

/// The merged dataset: character records plus normalized aliases.
///
/// Both maps are keyed by canonical code points. The serde field names match
/// the on-disk master snapshot layout, so a `Dataset` round-trips through
/// JSON unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// code_point -> character record
    #[serde(rename = "unicode_data")]
    pub records: BTreeMap<String, CharRecord>,
    /// code_point -> sorted, deduplicated aliases
    #[serde(rename = "aliases_data")]
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of character records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the dataset holds no character records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Aliases for a code point. A code point without an entry is treated
    /// the same as one with an empty alias list.
    pub fn aliases_for(&self, code_point: &str) -> &[String] {
        self.aliases.get(code_point).map_or(&[], Vec::as_slice)
    }

    /// Largest alias count held by any character record in this dataset.
    ///
    /// Orphan alias entries (code points without a record) do not count,
    /// since exports iterate records.
    pub fn max_alias_count(&self) -> usize {
        self.records
            .keys()
            .map(|cp| self.aliases_for(cp).len())
            .max()
            .unwrap_or(0)
    }
}

/// Format a scalar value as a canonical code-point key.
pub fn format_code_point(cp: u32) -> String {
    format!("{cp:04X}")
}

/// Re-format a hex string into the canonical key form, if it parses.
pub fn canonicalize_code_point(hex: &str) -> Option<String> {
    u32::from_str_radix(hex.trim(), 16).ok().map(format_code_point)
}

/// Identifier for a source file consumed by the pipeline.
pub const SOURCE_PRIMARY: &str = "primary";
pub const SOURCE_FORMAL_ALIASES: &str = "formal_aliases";
pub const SOURCE_INFORMATIVE_ALIASES: &str = "informative_aliases";
pub const SOURCE_ANNOTATIONS: &str = "annotations";

/// Local paths to the source files contributing to a dataset.
///
/// These are produced by an external fetch collaborator; the pipeline only
/// ever reads local files. Only the primary database is mandatory.
#[derive(Debug, Clone)]
pub struct SourceFiles {
    pub primary: PathBuf,
    pub formal_aliases: Option<PathBuf>,
    pub informative_aliases: Option<PathBuf>,
    pub annotations: Option<PathBuf>,
}

impl SourceFiles {
    /// Build a source set with only the mandatory primary database
    pub fn primary_only(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            formal_aliases: None,
            informative_aliases: None,
            annotations: None,
        }
    }

    /// Present (identifier, path) pairs, sorted by identifier
    pub fn entries(&self) -> Vec<(&'static str, &Path)> {
        let mut entries: Vec<(&'static str, &Path)> =
            vec![(SOURCE_PRIMARY, self.primary.as_path())];
        if let Some(path) = &self.formal_aliases {
            entries.push((SOURCE_FORMAL_ALIASES, path.as_path()));
        }
        if let Some(path) = &self.informative_aliases {
            entries.push((SOURCE_INFORMATIVE_ALIASES, path.as_path()));
        }
        if let Some(path) = &self.annotations {
            entries.push((SOURCE_ANNOTATIONS, path.as_path()));
        }
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_code_point() {
        assert_eq!(format_code_point(0x41), "0041");
        assert_eq!(format_code_point(0x1F600), "1F600");
        assert_eq!(format_code_point(0x0), "0000");
    }

    #[test]
    fn test_canonicalize_code_point() {
        assert_eq!(canonicalize_code_point("41"), Some("0041".to_string()));
        assert_eq!(canonicalize_code_point("00e9"), Some("00E9".to_string()));
        assert_eq!(canonicalize_code_point(" 1f600 "), Some("1F600".to_string()));
        assert_eq!(canonicalize_code_point("not hex"), None);
    }

    #[test]
    fn test_aliases_for_absent_key() {
        let ds = Dataset::new();
        assert!(ds.aliases_for("0041").is_empty());
    }

    #[test]
    fn test_max_alias_count_ignores_orphans() {
        let mut ds = Dataset::new();
        ds.records.insert(
            "0041".to_string(),
            CharRecord {
                name: "LATIN CAPITAL LETTER A".to_string(),
                category: "Lu".to_string(),
                glyph: "A".to_string(),
                block: "Basic Latin".to_string(),
            },
        );
        ds.aliases
            .insert("0041".to_string(), vec!["latin letter a".to_string()]);
        // Orphan entry with more aliases than any record
        ds.aliases.insert(
            "FFFF".to_string(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        );

        assert_eq!(ds.max_alias_count(), 1);
    }

    #[test]
    fn test_snapshot_field_names_round_trip() {
        let mut ds = Dataset::new();
        ds.records.insert(
            "0041".to_string(),
            CharRecord {
                name: "LATIN CAPITAL LETTER A".to_string(),
                category: "Lu".to_string(),
                glyph: "A".to_string(),
                block: "Basic Latin".to_string(),
            },
        );

        let json = serde_json::to_string(&ds).unwrap();
        assert!(json.contains("\"unicode_data\""));
        assert!(json.contains("\"aliases_data\""));

        let loaded: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.records, ds.records);
    }

    #[test]
    fn test_block_defaults_when_missing() {
        let json = r#"{"name":"X","category":"Lu","glyph":"X"}"#;
        let rec: CharRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.block, "Unknown Block");
    }

    #[test]
    fn test_source_entries_sorted() {
        let files = SourceFiles {
            primary: PathBuf::from("UnicodeData.txt"),
            formal_aliases: Some(PathBuf::from("NameAliases.txt")),
            informative_aliases: Some(PathBuf::from("NamesList.txt")),
            annotations: Some(PathBuf::from("en.xml")),
        };

        let ids: Vec<&str> = files.entries().iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec!["annotations", "formal_aliases", "informative_aliases", "primary"]
        );
    }
}

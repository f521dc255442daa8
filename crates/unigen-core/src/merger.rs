//! Alias merging and normalization

use crate::dataset::{Dataset, SourceFiles};
use crate::error::Result;
use crate::parser::{
    parse_annotations, parse_formal_aliases, parse_informative_aliases, parse_primary,
    RawAliasMap,
};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Which alias sources participate in a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasSources {
    pub formal: bool,
    pub informative: bool,
    pub annotations: bool,
}

impl Default for AliasSources {
    fn default() -> Self {
        Self {
            formal: true,
            informative: true,
            annotations: true,
        }
    }
}

/// Normalize an alias: trim surrounding whitespace and lower-case.
///
/// Idempotent: normalizing an already-normalized alias yields itself.
pub fn normalize_alias(alias: &str) -> String {
    alias.trim().to_lowercase()
}

/// Merge raw alias maps into one deduplicated, sorted alias set.
///
/// Keys are expected to be canonical already (the parsers guarantee this);
/// values are normalized here. Aliases that normalize to the empty string
/// are dropped.
pub fn merge_aliases(sources: &[RawAliasMap]) -> BTreeMap<String, Vec<String>> {
    let mut sets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for source in sources {
        for (code_point, aliases) in source {
            let set = sets.entry(code_point.clone()).or_default();
            for alias in aliases {
                let normalized = normalize_alias(alias);
                if normalized.is_empty() {
                    debug!("dropping empty alias for {code_point}");
                    continue;
                }
                set.insert(normalized);
            }
        }
    }

    // BTreeSet iteration is already sorted, so re-serialization is stable.
    sets.into_iter()
        .map(|(cp, set)| (cp, set.into_iter().collect()))
        .collect()
}

/// Parse all source files and merge them into a fresh dataset.
///
/// A failure reading the primary database is fatal; disabled or missing
/// alias sources simply contribute nothing.
pub fn build_dataset(files: &SourceFiles, sources: AliasSources) -> Result<Dataset> {
    let records = parse_primary(&files.primary)?;

    let mut raw: Vec<RawAliasMap> = Vec::new();
    if sources.formal {
        if let Some(path) = &files.formal_aliases {
            raw.push(parse_formal_aliases(path));
        }
    }
    if sources.informative {
        if let Some(path) = &files.informative_aliases {
            raw.push(parse_informative_aliases(path));
        }
    }
    if sources.annotations {
        if let Some(path) = &files.annotations {
            raw.push(parse_annotations(path));
        }
    }

    Ok(Dataset {
        records,
        aliases: merge_aliases(&raw),
    })
}

/// Summary statistics over an alias set
#[derive(Debug, Clone, PartialEq)]
pub struct AliasStatistics {
    /// Characters with at least one alias entry
    pub total_characters: usize,
    /// Aliases across all characters
    pub total_aliases: usize,
    pub avg_aliases_per_char: f64,
    pub median_aliases_per_char: f64,
    pub max_aliases: usize,
    pub min_aliases: usize,
}

/// Compute summary statistics for an alias set.
pub fn alias_statistics(aliases: &BTreeMap<String, Vec<String>>) -> AliasStatistics {
    if aliases.is_empty() {
        return AliasStatistics {
            total_characters: 0,
            total_aliases: 0,
            avg_aliases_per_char: 0.0,
            median_aliases_per_char: 0.0,
            max_aliases: 0,
            min_aliases: 0,
        };
    }

    let mut counts: Vec<usize> = aliases.values().map(Vec::len).collect();
    counts.sort_unstable();

    let total_characters = counts.len();
    let total_aliases: usize = counts.iter().sum();
    let mid = total_characters / 2;
    let median = if total_characters % 2 == 0 {
        (counts[mid - 1] + counts[mid]) as f64 / 2.0
    } else {
        counts[mid] as f64
    };

    AliasStatistics {
        total_characters,
        total_aliases,
        avg_aliases_per_char: total_aliases as f64 / total_characters as f64,
        median_aliases_per_char: median,
        max_aliases: *counts.last().unwrap_or(&0),
        min_aliases: *counts.first().unwrap_or(&0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[(&str, &[&str])]) -> RawAliasMap {
        entries
            .iter()
            .map(|(cp, aliases)| {
                (
                    cp.to_string(),
                    aliases.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_normalize_alias_idempotent() {
        assert_eq!(normalize_alias("  LATIN LETTER A "), "latin letter a");
        assert_eq!(normalize_alias("latin letter a"), "latin letter a");
        assert_eq!(
            normalize_alias(&normalize_alias("Mixed Case")),
            normalize_alias("Mixed Case")
        );
    }

    #[test]
    fn test_merge_deduplicates_across_sources() {
        let a = raw(&[("0041", &["LATIN LETTER A"])]);
        let b = raw(&[("0041", &["latin letter a", "first letter"])]);

        let merged = merge_aliases(&[a, b]);
        assert_eq!(
            merged["0041"],
            vec!["first letter".to_string(), "latin letter a".to_string()]
        );
    }

    #[test]
    fn test_merge_output_is_sorted() {
        let source = raw(&[("0041", &["zulu", "alpha", "mike"])]);
        let merged = merge_aliases(&[source]);
        assert_eq!(merged["0041"], vec!["alpha", "mike", "zulu"]);
    }

    #[test]
    fn test_merge_drops_empty_aliases() {
        let source = raw(&[("0041", &["   ", "real alias"])]);
        let merged = merge_aliases(&[source]);
        assert_eq!(merged["0041"], vec!["real alias"]);
    }

    #[test]
    fn test_merge_keeps_orphan_code_points() {
        // Alias sources may report code points the primary database never
        // produced; they stay in the alias set.
        let source = raw(&[("FFFF", &["orphan"])]);
        let merged = merge_aliases(&[source]);
        assert_eq!(merged["FFFF"], vec!["orphan"]);
    }

    #[test]
    fn test_alias_statistics() {
        let aliases: BTreeMap<String, Vec<String>> = raw(&[
            ("0041", &["a", "b", "c"]),
            ("0042", &["d"]),
        ]);

        let stats = alias_statistics(&aliases);
        assert_eq!(stats.total_characters, 2);
        assert_eq!(stats.total_aliases, 4);
        assert_eq!(stats.max_aliases, 3);
        assert_eq!(stats.min_aliases, 1);
        assert_eq!(stats.avg_aliases_per_char, 2.0);
        assert_eq!(stats.median_aliases_per_char, 2.0);
    }

    #[test]
    fn test_alias_statistics_empty() {
        let stats = alias_statistics(&BTreeMap::new());
        assert_eq!(stats.total_characters, 0);
        assert_eq!(stats.max_aliases, 0);
    }
}

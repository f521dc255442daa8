//! Narrowing a dataset to a named subset or an explicit block list
//!
//! Filtering is non-destructive: both functions build new maps and leave
//! the input dataset untouched.

use crate::blocks::{dataset_blocks, DATASET_TEST, TEST_DATASET_BLOCK, TEST_DATASET_LIMIT};
use crate::dataset::Dataset;
use log::debug;

/// Sentinel block name that disables filtering
pub const ALL_BLOCKS: &str = "all";

/// Narrow a dataset to a named subset.
///
/// `"test"` takes a deterministic prefix of Basic Latin records for fast
/// smoke-testing; a name with no block restriction (including `"complete"`
/// and unknown names) returns an unchanged copy.
pub fn filter_by_dataset(dataset: &Dataset, name: &str) -> Dataset {
    if name == DATASET_TEST {
        return test_subset(dataset);
    }

    match dataset_blocks(name) {
        Some(blocks) if !blocks.is_empty() => {
            let owned: Vec<String> = blocks.iter().map(|b| b.to_string()).collect();
            filter_by_blocks(dataset, &owned)
        }
        _ => {
            debug!("dataset '{name}' has no block restriction; keeping all records");
            dataset.clone()
        }
    }
}

/// Keep only records whose block is in the given list.
///
/// An empty list, or a list containing the `"all"` sentinel, disables
/// filtering. The alias set is restricted to surviving code points.
pub fn filter_by_blocks(dataset: &Dataset, blocks: &[String]) -> Dataset {
    if blocks.is_empty() || blocks.iter().any(|b| b == ALL_BLOCKS) {
        return dataset.clone();
    }

    let mut filtered = Dataset::new();
    for (code_point, record) in &dataset.records {
        if blocks.contains(&record.block) {
            filtered
                .records
                .insert(code_point.clone(), record.clone());
            if let Some(aliases) = dataset.aliases.get(code_point) {
                filtered.aliases.insert(code_point.clone(), aliases.clone());
            }
        }
    }

    debug!(
        "block filter kept {} of {} records",
        filtered.len(),
        dataset.len()
    );
    filtered
}

/// Bounded prefix of the test block, sorted by code point.
fn test_subset(dataset: &Dataset) -> Dataset {
    let mut filtered = Dataset::new();

    // BTreeMap iteration is already sorted by code point.
    for (code_point, record) in &dataset.records {
        if record.block != TEST_DATASET_BLOCK {
            continue;
        }
        filtered.records.insert(code_point.clone(), record.clone());
        if let Some(aliases) = dataset.aliases.get(code_point) {
            filtered.aliases.insert(code_point.clone(), aliases.clone());
        }
        if filtered.len() >= TEST_DATASET_LIMIT {
            break;
        }
    }

    filtered
}

//! Content-addressable cache for merged datasets
//!
//! A master snapshot is the persisted form of a fully merged dataset, named
//! by a checksum over every contributing source file. Identical source bytes
//! always map to the same snapshot; a single changed byte anywhere produces
//! a different key and forces a fresh merge.

use crate::dataset::{Dataset, SourceFiles};
use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prefix shared by every snapshot file name
const SNAPSHOT_PREFIX: &str = "unicode_master_data";
/// Length of the formatted cache key
const KEY_LEN: usize = 32;

/// Streaming content digest of a file, as lowercase hex.
///
/// A missing file digests to the empty string so a cache key is still
/// well-defined when optional sources are absent.
pub fn file_digest<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(String::new());
    }

    let mut file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Combined cache key over all source files.
///
/// Deterministic: `identifier:digest` pairs are concatenated in identifier
/// order and hashed again, so identical file bytes and identifier sets
/// always yield the same key.
pub fn compute_cache_key(files: &SourceFiles) -> Result<String> {
    let mut parts = Vec::new();
    for (id, path) in files.entries() {
        parts.push(format!("{id}:{}", file_digest(path)?));
    }

    let combined = parts.join(",");
    let digest = blake3::hash(combined.as_bytes()).to_hex().to_string();
    Ok(digest[..KEY_LEN].to_string())
}

/// Snapshot file name for a cache key.
///
/// `None` selects the legacy fixed name used when no source checksum is
/// available.
pub fn snapshot_file_name(key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{SNAPSHOT_PREFIX}_{key}.json"),
        None => format!("{SNAPSHOT_PREFIX}.json"),
    }
}

/// Find an existing snapshot for a key.
///
/// Returns `None` for a missing snapshot or a missing cache directory.
pub fn locate<P: AsRef<Path>>(cache_dir: P, key: &str) -> Option<PathBuf> {
    let path = cache_dir.as_ref().join(snapshot_file_name(Some(key)));
    if path.exists() {
        debug!("cache hit: {}", path.display());
        Some(path)
    } else {
        debug!("cache miss for key {key}");
        None
    }
}

/// Persist a dataset as a master snapshot.
///
/// The snapshot is written to a temporary name and atomically renamed, so a
/// partially written snapshot is never visible under its final name.
pub fn persist<P: AsRef<Path>>(dataset: &Dataset, cache_dir: P, key: Option<&str>) -> Result<PathBuf> {
    let cache_dir = cache_dir.as_ref();
    fs::create_dir_all(cache_dir)?;

    let final_path = cache_dir.join(snapshot_file_name(key));
    let tmp_path = final_path.with_extension("json.tmp");

    let content = serde_json::to_string_pretty(dataset)?;
    fs::write(&tmp_path, content).map_err(|e| Error::FileWrite {
        path: tmp_path.clone(),
        source: e,
    })?;
    fs::rename(&tmp_path, &final_path).map_err(|e| Error::FileWrite {
        path: final_path.clone(),
        source: e,
    })?;

    debug!(
        "persisted snapshot with {} records to {}",
        dataset.len(),
        final_path.display()
    );
    Ok(final_path)
}

/// Load a dataset back from a master snapshot.
///
/// Fails closed: structural problems (missing fields, wrong shapes, zero
/// records) come back as `SnapshotInvalid` so callers can fall back to a
/// full re-parse instead of crashing.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let dataset: Dataset =
        serde_json::from_str(&content).map_err(|e| Error::SnapshotInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if dataset.records.is_empty() {
        return Err(Error::SnapshotInvalid {
            path: path.to_path_buf(),
            message: "snapshot contains no character records".to_string(),
        });
    }

    debug!(
        "loaded snapshot {} ({} records, {} alias entries)",
        path.display(),
        dataset.records.len(),
        dataset.aliases.len()
    );
    Ok(dataset)
}

/// Enumerate master snapshots in a cache directory, sorted by path.
///
/// Snapshots are never deleted automatically; this feeds the explicit
/// cache-maintenance commands.
pub fn list_snapshots<P: AsRef<Path>>(cache_dir: P) -> Result<Vec<PathBuf>> {
    let cache_dir = cache_dir.as_ref();
    if !cache_dir.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();
    for entry in WalkDir::new(cache_dir).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(".json") {
            snapshots.push(path.to_path_buf());
        }
    }
    snapshots.sort();
    Ok(snapshots)
}

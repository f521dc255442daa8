//! End-to-end pipeline: parse, merge, cache, filter, export
//!
//! The run is strictly sequential. A cached snapshot is reused if and only
//! if every contributing source file is byte-identical to the run that
//! produced it; a snapshot that fails to load falls back to a full
//! re-parse instead of aborting.

use crate::cache;
use crate::dataset::{Dataset, SourceFiles};
use crate::error::Result;
use crate::export::{export_dataset, ExportOptions};
use crate::filter::{filter_by_blocks, filter_by_dataset};
use crate::merger::{build_dataset, AliasSources};
use log::{info, warn};
use std::path::PathBuf;

/// How to narrow the dataset before export (mutually exclusive modes)
#[derive(Debug, Clone)]
pub enum Selection {
    /// Named dataset (e.g. "every-day", "complete", "test")
    Dataset(String),
    /// Explicit block names; "all" disables filtering
    Blocks(Vec<String>),
}

/// Options controlling a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory holding master snapshots
    pub cache_dir: PathBuf,
    /// Re-parse even when a matching snapshot exists
    pub force_refresh: bool,
    /// Which alias sources participate in the merge
    pub alias_sources: AliasSources,
    /// Dataset narrowing applied before export
    pub selection: Selection,
}

/// Pipeline stages reported through the progress sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CacheKey,
    CacheLookup,
    Parse,
    Persist,
    Filter,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Running,
    Success,
    Failure,
}

/// Interface to an external progress display.
///
/// The pipeline only pushes status updates through this trait; it never
/// depends on the sink's timing or implementation.
pub trait ProgressSink {
    fn stage(&self, stage: Stage, status: StageStatus, detail: &str) {
        let _ = (stage, status, detail);
    }
}

/// Sink that discards all updates
pub struct NullProgress;

impl ProgressSink for NullProgress {}

/// Result of a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Final output files, one per successful format
    pub files: Vec<PathBuf>,
    /// Master snapshot backing this run
    pub snapshot: Option<PathBuf>,
    /// True when the dataset came from a cached snapshot
    pub from_cache: bool,
}

/// Run the full pipeline for a set of source files.
pub fn run(
    sources: &SourceFiles,
    options: &PipelineOptions,
    export: &ExportOptions,
    progress: &dyn ProgressSink,
) -> Result<PipelineOutcome> {
    progress.stage(Stage::CacheKey, StageStatus::Running, "");
    let key = cache::compute_cache_key(sources)?;
    progress.stage(Stage::CacheKey, StageStatus::Success, &key);

    let mut snapshot: Option<PathBuf> = None;
    let mut cached: Option<Dataset> = None;

    if options.force_refresh {
        info!("force refresh requested; skipping cache lookup");
    } else {
        progress.stage(Stage::CacheLookup, StageStatus::Running, "");
        if let Some(path) = cache::locate(&options.cache_dir, &key) {
            match cache::load(&path) {
                Ok(dataset) => {
                    progress.stage(
                        Stage::CacheLookup,
                        StageStatus::Success,
                        &format!("reusing {}", path.display()),
                    );
                    snapshot = Some(path);
                    cached = Some(dataset);
                }
                Err(e) => {
                    // A bad snapshot is recovered locally by re-parsing
                    warn!("snapshot unusable, falling back to re-parse: {e}");
                    progress.stage(Stage::CacheLookup, StageStatus::Failure, "snapshot invalid");
                }
            }
        } else {
            progress.stage(Stage::CacheLookup, StageStatus::Success, "miss");
        }
    }

    let from_cache = cached.is_some();
    let dataset = match cached {
        Some(dataset) => dataset,
        None => {
            progress.stage(Stage::Parse, StageStatus::Running, "");
            let dataset = match build_dataset(sources, options.alias_sources) {
                Ok(dataset) => dataset,
                Err(e) => {
                    progress.stage(Stage::Parse, StageStatus::Failure, &e.to_string());
                    return Err(e);
                }
            };
            progress.stage(
                Stage::Parse,
                StageStatus::Success,
                &format!("{} chars", dataset.len()),
            );

            progress.stage(Stage::Persist, StageStatus::Running, "");
            match cache::persist(&dataset, &options.cache_dir, Some(&key)) {
                Ok(path) => {
                    progress.stage(Stage::Persist, StageStatus::Success, &key);
                    snapshot = Some(path);
                }
                Err(e) => {
                    progress.stage(Stage::Persist, StageStatus::Failure, &e.to_string());
                    return Err(e);
                }
            }
            dataset
        }
    };

    progress.stage(Stage::Filter, StageStatus::Running, "");
    let narrowed = match &options.selection {
        Selection::Dataset(name) => filter_by_dataset(&dataset, name),
        Selection::Blocks(blocks) => filter_by_blocks(&dataset, blocks),
    };
    progress.stage(
        Stage::Filter,
        StageStatus::Success,
        &format!("{} of {} chars", narrowed.len(), dataset.len()),
    );

    progress.stage(Stage::Export, StageStatus::Running, "");
    let files = match export_dataset(&narrowed, export) {
        Ok(files) => files,
        Err(e) => {
            progress.stage(Stage::Export, StageStatus::Failure, &e.to_string());
            return Err(e);
        }
    };
    progress.stage(
        Stage::Export,
        StageStatus::Success,
        &format!("{} files", files.len()),
    );

    Ok(PipelineOutcome {
        files,
        snapshot,
        from_cache,
    })
}

//! unigen-core: Core library for building and exporting Unicode character datasets
//!
//! This library provides functionality to:
//! - Parse the Unicode character database and several alias/annotation sources
//! - Merge aliases into one normalized, deduplicated set per code point
//! - Cache the merged dataset under a content-derived checksum key
//! - Narrow a dataset to named subsets or explicit block lists
//! - Export filtered datasets to CSV, JSON, text, and Lua, optionally gzipped

pub mod blocks;
pub mod cache;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod merger;
pub mod parser;
pub mod pipeline;
pub mod writers;

pub use dataset::{CharRecord, Dataset, SourceFiles};
pub use error::{Error, Result};
pub use export::{export_dataset, output_file_name, ExportOptions};
pub use filter::{filter_by_blocks, filter_by_dataset};
pub use merger::{alias_statistics, build_dataset, normalize_alias, AliasSources};
pub use pipeline::{
    run, NullProgress, PipelineOptions, PipelineOutcome, ProgressSink, Selection, Stage,
    StageStatus,
};
pub use writers::Format;

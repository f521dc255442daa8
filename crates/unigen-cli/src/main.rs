//! unigen CLI
//!
//! Command-line tool for building Unicode character datasets from local
//! source files and exporting them to multiple formats.

use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use unigen_core::{
    alias_statistics, build_dataset, cache, AliasSources, ExportOptions, PipelineOptions,
    ProgressSink, Selection, SourceFiles, Stage, StageStatus,
};

#[derive(Parser)]
#[command(name = "unigen")]
#[command(about = "Unicode character dataset generator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Local paths to the Unicode source files
#[derive(Args)]
struct SourceArgs {
    /// Path to the primary character database (UnicodeData.txt)
    #[arg(long)]
    primary: PathBuf,

    /// Path to the formal alias source (NameAliases.txt)
    #[arg(long)]
    formal_aliases: Option<PathBuf>,

    /// Path to the informative alias source (NamesList.txt)
    #[arg(long)]
    informative_aliases: Option<PathBuf>,

    /// Path to the annotations XML source (en.xml)
    #[arg(long)]
    annotations: Option<PathBuf>,
}

impl SourceArgs {
    fn to_source_files(&self) -> SourceFiles {
        SourceFiles {
            primary: self.primary.clone(),
            formal_aliases: self.formal_aliases.clone(),
            informative_aliases: self.informative_aliases.clone(),
            annotations: self.annotations.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dataset and export it to the requested formats
    Generate {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output format (csv, json, lua, txt, or all)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Directory holding master snapshots
        #[arg(long, default_value = ".cache/unigen")]
        cache_dir: PathBuf,

        /// Dataset to export (every-day, complete, test)
        #[arg(long, default_value = "every-day")]
        dataset: String,

        /// Unicode block(s) to include instead of a named dataset
        /// (can be given multiple times; "all" disables filtering)
        #[arg(long)]
        block: Vec<String>,

        /// Compress output files with gzip
        #[arg(long)]
        compress: bool,

        /// Regenerate the master snapshot even if a cached one exists
        #[arg(long)]
        force: bool,
    },

    /// List master snapshots in the cache directory
    CacheList {
        /// Directory holding master snapshots
        #[arg(long, default_value = ".cache/unigen")]
        cache_dir: PathBuf,
    },

    /// Delete all master snapshots from the cache directory
    CacheClean {
        /// Directory holding master snapshots
        #[arg(long, default_value = ".cache/unigen")]
        cache_dir: PathBuf,
    },

    /// Show alias statistics for the merged dataset
    Stats {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

/// Prints one line per finished pipeline stage
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn stage(&self, stage: Stage, status: StageStatus, detail: &str) {
        let label = match stage {
            Stage::CacheKey => "Cache key",
            Stage::CacheLookup => "Cache lookup",
            Stage::Parse => "Parsing",
            Stage::Persist => "Master data",
            Stage::Filter => "Filtering",
            Stage::Export => "Exporting",
        };
        match status {
            StageStatus::Running => {}
            StageStatus::Success => {
                if detail.is_empty() {
                    println!("{label}: ok");
                } else {
                    println!("{label}: {detail}");
                }
            }
            StageStatus::Failure => println!("{label}: FAILED {detail}"),
        }
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> unigen_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            sources,
            format,
            output_dir,
            cache_dir,
            dataset,
            block,
            compress,
            force,
        } => cmd_generate(
            &sources, &format, output_dir, cache_dir, dataset, block, compress, force,
        ),
        Commands::CacheList { cache_dir } => cmd_cache_list(&cache_dir),
        Commands::CacheClean { cache_dir } => cmd_cache_clean(&cache_dir),
        Commands::Stats { sources } => cmd_stats(&sources),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    sources: &SourceArgs,
    format: &str,
    output_dir: PathBuf,
    cache_dir: PathBuf,
    dataset: String,
    block: Vec<String>,
    compress: bool,
    force: bool,
) -> unigen_core::Result<()> {
    if block.is_empty() && !unigen_core::blocks::DATASETS.contains(&dataset.as_str()) {
        eprintln!("Warning: unknown dataset '{dataset}'; exporting all blocks");
    }

    let formats: Vec<String> = if format.eq_ignore_ascii_case("all") {
        unigen_core::Format::ALL
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    } else {
        vec![format.to_string()]
    };

    let selection = if block.is_empty() {
        Selection::Dataset(dataset.clone())
    } else {
        Selection::Blocks(block)
    };

    let pipeline_options = PipelineOptions {
        cache_dir,
        force_refresh: force,
        alias_sources: AliasSources::default(),
        selection,
    };

    let mut export = ExportOptions::new(output_dir, formats);
    export.dataset_label = dataset;
    export.compress = compress;

    let outcome = unigen_core::run(
        &sources.to_source_files(),
        &pipeline_options,
        &export,
        &ConsoleProgress,
    )?;

    println!();
    if outcome.from_cache {
        println!("Reused master snapshot (sources unchanged)");
    }
    println!("Generated {} file(s):", outcome.files.len());
    for path in &outcome.files {
        println!("  {}", path.display());
    }

    Ok(())
}

fn cmd_cache_list(cache_dir: &PathBuf) -> unigen_core::Result<()> {
    let snapshots = cache::list_snapshots(cache_dir)?;

    if snapshots.is_empty() {
        println!("No master snapshots in {}", cache_dir.display());
        return Ok(());
    }

    println!("Master snapshots in {}:", cache_dir.display());
    for path in &snapshots {
        let meta = fs::metadata(path)?;
        let size_kb = meta.len() as f64 / 1024.0;
        let modified: DateTime<Local> = meta.modified()?.into();
        println!(
            "  {}  {:.1} KB  {}",
            path.file_name().unwrap_or_default().to_string_lossy(),
            size_kb,
            modified.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

fn cmd_cache_clean(cache_dir: &PathBuf) -> unigen_core::Result<()> {
    let snapshots = cache::list_snapshots(cache_dir)?;

    for path in &snapshots {
        fs::remove_file(path)?;
    }
    println!("Removed {} snapshot(s)", snapshots.len());

    Ok(())
}

fn cmd_stats(sources: &SourceArgs) -> unigen_core::Result<()> {
    let dataset = build_dataset(&sources.to_source_files(), AliasSources::default())?;
    let stats = alias_statistics(&dataset.aliases);

    println!("Characters: {}", dataset.len());
    println!("Characters with aliases: {}", stats.total_characters);
    println!("Total aliases: {}", stats.total_aliases);
    println!("Average aliases per character: {:.2}", stats.avg_aliases_per_char);
    println!("Median aliases per character: {:.1}", stats.median_aliases_per_char);
    println!("Max aliases: {}", stats.max_aliases);
    println!("Min aliases: {}", stats.min_aliases);

    Ok(())
}

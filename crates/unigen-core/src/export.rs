//! Multi-format streaming exporter
//!
//! Streams a dataset once, feeding every requested format writer from the
//! same record traversal. Each format writes to a temporary file that is
//! only renamed to (or compressed into) its final name after the body is
//! complete, flushed, fsynced, and verified, so a mid-export failure never
//! leaves a partial file behind under a final name.

use crate::blocks::DATASET_EVERYDAY;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::writers::{writer_for, ExportRecord, Format, RecordWriter};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Prefix of every output file name
pub const OUTPUT_PREFIX: &str = "unicode";

/// Options controlling a single export call
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Directory receiving the output files (created if needed)
    pub output_dir: PathBuf,
    /// Requested format identifiers (e.g. "csv", "json")
    pub formats: Vec<String>,
    /// Dataset label used in output file names
    pub dataset_label: String,
    /// Gzip the outputs at maximum compression
    pub compress: bool,
}

impl ExportOptions {
    pub fn new(output_dir: impl Into<PathBuf>, formats: Vec<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            formats,
            dataset_label: DATASET_EVERYDAY.to_string(),
            compress: false,
        }
    }
}

/// Output file name for a format and dataset label.
///
/// The default dataset gets the fixed short name; every other dataset is
/// embedded in the file name.
pub fn output_file_name(format: Format, dataset: &str) -> String {
    if dataset == DATASET_EVERYDAY {
        format!("{OUTPUT_PREFIX}{}", format.extension())
    } else {
        format!("{OUTPUT_PREFIX}.{dataset}{}", format.extension())
    }
}

/// One format's in-flight output state
struct FormatJob {
    format: Format,
    writer: Box<dyn RecordWriter>,
    out: BufWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
}

/// Export a dataset to every requested format in one record traversal.
///
/// A failing format is reported and cleaned up without aborting the others;
/// the call fails only when the dataset is empty, no format resolves to a
/// writer, or zero formats produce a finished file. Returns the final
/// output paths.
pub fn export_dataset(dataset: &Dataset, options: &ExportOptions) -> Result<Vec<PathBuf>> {
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let mut failures: Vec<(String, String)> = Vec::new();
    let mut formats: Vec<Format> = Vec::new();
    for id in &options.formats {
        match Format::parse(id) {
            Some(format) => {
                if !formats.contains(&format) {
                    formats.push(format);
                }
            }
            None => {
                warn!("no exporter for format '{id}'");
                failures.push((id.clone(), "no exporter for format".to_string()));
            }
        }
    }
    if formats.is_empty() {
        return Err(Error::NoFormats(options.formats.join(", ")));
    }

    fs::create_dir_all(&options.output_dir)?;

    // The CSV header is sized to the filtered dataset, so the alias column
    // count can differ between subsets of the same master data.
    let max_aliases = dataset.max_alias_count();

    let mut jobs: Vec<FormatJob> = Vec::new();
    for format in formats {
        let final_path = options
            .output_dir
            .join(output_file_name(format, &options.dataset_label));
        let temp_path = temp_name(&final_path);

        match open_job(format, max_aliases, &temp_path, &final_path) {
            Ok(job) => jobs.push(job),
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                warn!("export failed for {format}: {e}");
                failures.push((format.name().to_string(), e.to_string()));
            }
        }
    }

    // Single pass over the records, feeding every open writer
    for (code_point, record) in &dataset.records {
        let rec = ExportRecord {
            code_point,
            record,
            aliases: dataset.aliases_for(code_point),
        };

        let mut idx = 0;
        while idx < jobs.len() {
            let job = &mut jobs[idx];
            match job.writer.write_record(&mut job.out, &rec) {
                Ok(()) => idx += 1,
                Err(e) => {
                    let job = jobs.remove(idx);
                    abandon_job(job, e.to_string(), &mut failures);
                }
            }
        }
    }

    let mut outputs = Vec::new();
    for job in jobs {
        let format = job.format;
        let temp_path = job.temp_path.clone();
        match finalize_job(job, options.compress) {
            Ok(path) => {
                debug!("finished {format} export: {}", path.display());
                outputs.push(path);
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                warn!("export failed for {format}: {e}");
                failures.push((format.name().to_string(), e.to_string()));
            }
        }
    }

    if outputs.is_empty() {
        let reason = failures
            .iter()
            .map(|(format, message)| format!("{format}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::NoOutputFiles(reason));
    }
    Ok(outputs)
}

/// Open a format's temp file and write its preamble.
fn open_job(
    format: Format,
    max_aliases: usize,
    temp_path: &Path,
    final_path: &Path,
) -> io::Result<FormatJob> {
    let mut writer = writer_for(format, max_aliases);
    let file = File::create(temp_path)?;
    let mut out = BufWriter::new(file);
    writer.begin(&mut out)?;
    Ok(FormatJob {
        format,
        writer,
        out,
        temp_path: temp_path.to_path_buf(),
        final_path: final_path.to_path_buf(),
    })
}

/// Drop a failed job's file handle and remove its temp file.
fn abandon_job(job: FormatJob, message: String, failures: &mut Vec<(String, String)>) {
    warn!("export failed for {}: {message}", job.format);
    drop(job.out);
    let _ = fs::remove_file(&job.temp_path);
    failures.push((job.format.name().to_string(), message));
}

/// Write the footer, flush to disk, then compress or verify-and-rename.
fn finalize_job(mut job: FormatJob, compress: bool) -> Result<PathBuf> {
    job.writer.finish(&mut job.out)?;
    job.out.flush()?;
    job.out.get_ref().sync_all()?;
    drop(job.out);

    if compress {
        let mut os: OsString = job.final_path.clone().into_os_string();
        os.push(".gz");
        let gz_path = PathBuf::from(os);
        compress_file(&job.temp_path, &gz_path)?;
        // The temp file goes away only after compression succeeded
        fs::remove_file(&job.temp_path)?;
        Ok(gz_path)
    } else {
        job.writer.verify(&job.temp_path)?;
        fs::rename(&job.temp_path, &job.final_path).map_err(|e| Error::FileWrite {
            path: job.final_path.clone(),
            source: e,
        })?;
        Ok(job.final_path)
    }
}

/// Temporary name for an output file (`<final>.temp`)
fn temp_name(final_path: &Path) -> PathBuf {
    let mut os: OsString = final_path.to_path_buf().into_os_string();
    os.push(".temp");
    PathBuf::from(os)
}

/// Gzip a file at maximum compression.
///
/// A partial output is removed when compression fails part-way.
pub fn compress_file(input: &Path, output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_file(output).map_err(|e| Error::Compression {
            path: output.to_path_buf(),
            source: e,
        })?;
    }

    let result = (|| -> io::Result<()> {
        let mut reader = File::open(input)?;
        let file = File::create(output)?;
        let mut encoder = GzEncoder::new(file, Compression::best());
        io::copy(&mut reader, &mut encoder)?;
        let file = encoder.finish()?;
        file.sync_all()
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(output);
        return Err(Error::Compression {
            path: input.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

/// Decompress a gzip file (round-trips `compress_file`).
pub fn decompress_file(input: &Path, output: &Path) -> Result<()> {
    let file = File::open(input).map_err(|e| Error::FileRead {
        path: input.to_path_buf(),
        source: e,
    })?;
    let mut decoder = GzDecoder::new(file);
    let mut content = Vec::new();
    decoder.read_to_end(&mut content).map_err(|e| Error::FileRead {
        path: input.to_path_buf(),
        source: e,
    })?;
    fs::write(output, content).map_err(|e| Error::FileWrite {
        path: output.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CharRecord;

    fn single_record_dataset() -> Dataset {
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
        ds
    }

    fn no_temp_files(dir: &Path) {
        for entry in fs::read_dir(dir).unwrap() {
            let name = entry.unwrap().file_name();
            assert!(
                !name.to_string_lossy().ends_with(".temp"),
                "leftover temp file: {name:?}"
            );
        }
    }

    #[test]
    fn test_export_csv_exact_content() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions::new(dir.path(), vec!["csv".to_string()]);

        let outputs = export_dataset(&single_record_dataset(), &options).unwrap();
        assert_eq!(outputs, vec![dir.path().join("unicode.csv")]);

        let content = fs::read_to_string(&outputs[0]).unwrap();
        assert_eq!(
            content,
            "code_point,character,name,category,block,alias_1\n\
             U+0041,A,LATIN CAPITAL LETTER A,Lu,Basic Latin,latin letter a\n"
        );
        no_temp_files(dir.path());
    }

    #[test]
    fn test_export_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let formats = Format::ALL.iter().map(|f| f.name().to_string()).collect();
        let options = ExportOptions::new(dir.path(), formats);

        let outputs = export_dataset(&single_record_dataset(), &options).unwrap();
        assert_eq!(outputs.len(), 4);
        for path in &outputs {
            assert!(path.exists(), "missing output: {}", path.display());
        }
        no_temp_files(dir.path());
    }

    #[test]
    fn test_export_named_dataset_in_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = ExportOptions::new(dir.path(), vec!["txt".to_string()]);
        options.dataset_label = "complete".to_string();

        let outputs = export_dataset(&single_record_dataset(), &options).unwrap();
        assert_eq!(outputs, vec![dir.path().join("unicode.complete.txt")]);
    }

    #[test]
    fn test_export_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = ExportOptions::new(dir.path(), vec!["csv".to_string()]);
        options.compress = true;

        let outputs = export_dataset(&single_record_dataset(), &options).unwrap();
        assert_eq!(outputs, vec![dir.path().join("unicode.csv.gz")]);
        assert!(!dir.path().join("unicode.csv").exists());
        no_temp_files(dir.path());

        // Round-trip through the decompressor
        let restored = dir.path().join("restored.csv");
        decompress_file(&outputs[0], &restored).unwrap();
        let content = fs::read_to_string(&restored).unwrap();
        assert!(content.starts_with("code_point,character"));
    }

    #[test]
    fn test_export_empty_dataset_rejected_before_fs() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("never-created");
        let options = ExportOptions::new(&output_dir, vec!["csv".to_string()]);

        let err = export_dataset(&Dataset::new(), &options).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_export_unknown_format_alone_fails() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions::new(dir.path(), vec!["yaml".to_string()]);

        let err = export_dataset(&single_record_dataset(), &options).unwrap_err();
        assert!(matches!(err, Error::NoFormats(_)));
    }

    #[test]
    fn test_export_unknown_format_does_not_abort_others() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions::new(
            dir.path(),
            vec!["yaml".to_string(), "csv".to_string()],
        );

        let outputs = export_dataset(&single_record_dataset(), &options).unwrap();
        assert_eq!(outputs, vec![dir.path().join("unicode.csv")]);
    }

    #[test]
    fn test_failed_format_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the final name makes the rename fail
        // after the body was fully written.
        fs::create_dir(dir.path().join("unicode.csv")).unwrap();
        let options = ExportOptions::new(dir.path(), vec!["csv".to_string()]);

        let err = export_dataset(&single_record_dataset(), &options).unwrap_err();
        assert!(matches!(err, Error::NoOutputFiles(_)));
        no_temp_files(dir.path());
        // The squatter is still a directory; no file appeared anywhere
        assert!(dir.path().join("unicode.csv").is_dir());
    }

    #[test]
    fn test_failed_format_does_not_abort_others() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("unicode.csv")).unwrap();
        let options = ExportOptions::new(
            dir.path(),
            vec!["csv".to_string(), "txt".to_string()],
        );

        let outputs = export_dataset(&single_record_dataset(), &options).unwrap();
        assert_eq!(outputs, vec![dir.path().join("unicode.txt")]);
        no_temp_files(dir.path());
    }

    #[test]
    fn test_compress_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        fs::write(&input, "some content worth compressing\n").unwrap();
        let gz = dir.path().join("input.txt.gz");
        let restored = dir.path().join("restored.txt");

        compress_file(&input, &gz).unwrap();
        decompress_file(&gz, &restored).unwrap();

        assert_eq!(
            fs::read_to_string(&input).unwrap(),
            fs::read_to_string(&restored).unwrap()
        );
    }
}

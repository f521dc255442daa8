//! Per-format writer capabilities for the exporter
//!
//! Each writer knows how to emit its format's preamble, one body entry per
//! record, and its closing, against any `io::Write` sink, plus how to verify
//! a finished file by structurally re-parsing it. Writers are resolved
//! through an explicit `Format` enum owned by the caller; there is no global
//! registry.

use crate::dataset::CharRecord;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    Json,
    Txt,
    Lua,
}

impl Format {
    /// Every supported format, in canonical order
    pub const ALL: [Format; 4] = [Format::Csv, Format::Json, Format::Txt, Format::Lua];

    /// Resolve a format identifier, or `None` for an unknown one
    pub fn parse(s: &str) -> Option<Format> {
        match s.to_lowercase().as_str() {
            "csv" => Some(Format::Csv),
            "json" => Some(Format::Json),
            "txt" => Some(Format::Txt),
            "lua" => Some(Format::Lua),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Txt => "txt",
            Format::Lua => "lua",
        }
    }

    /// File extension including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => ".csv",
            Format::Json => ".json",
            Format::Txt => ".txt",
            Format::Lua => ".lua",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One record as seen by the writers during the export traversal
#[derive(Debug, Clone, Copy)]
pub struct ExportRecord<'a> {
    /// Canonical code point (without the U+ prefix)
    pub code_point: &'a str,
    pub record: &'a CharRecord,
    pub aliases: &'a [String],
}

/// A single entry of the JSON export body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub code_point: String,
    pub character: String,
    pub name: String,
    pub category: String,
    pub block: String,
    pub aliases: Vec<String>,
}

impl ExportEntry {
    fn from_record(rec: &ExportRecord<'_>) -> Self {
        Self {
            code_point: format!("U+{}", rec.code_point),
            character: rec.record.glyph.clone(),
            name: rec.record.name.clone(),
            category: rec.record.category.clone(),
            block: rec.record.block.clone(),
            aliases: rec.aliases.to_vec(),
        }
    }
}

/// Header/body/footer semantics for one output format
pub trait RecordWriter {
    /// Emit the format preamble (header row, opening bracket, ...)
    fn begin(&mut self, out: &mut dyn Write) -> io::Result<()>;

    /// Emit one record body entry
    fn write_record(&mut self, out: &mut dyn Write, rec: &ExportRecord<'_>) -> io::Result<()>;

    /// Emit the format closing
    fn finish(&mut self, out: &mut dyn Write) -> io::Result<()>;

    /// Structurally re-parse a finished file
    fn verify(&self, path: &Path) -> Result<()>;
}

/// Resolve the writer for a format.
///
/// `max_aliases` is the largest alias count in the dataset being exported;
/// only the CSV writer uses it (its header is sized to the filtered data).
pub fn writer_for(format: Format, max_aliases: usize) -> Box<dyn RecordWriter> {
    match format {
        Format::Csv => Box::new(CsvWriter { max_aliases }),
        Format::Json => Box::new(JsonWriter { first: true }),
        Format::Txt => Box::new(TxtWriter),
        Format::Lua => Box::new(LuaWriter),
    }
}

/// Columns every CSV export starts with
const CSV_BASE_COLUMNS: [&str; 5] = ["code_point", "character", "name", "category", "block"];

struct CsvWriter {
    max_aliases: usize,
}

impl RecordWriter for CsvWriter {
    fn begin(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let mut header: Vec<String> =
            CSV_BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        for i in 1..=self.max_aliases {
            header.push(format!("alias_{i}"));
        }
        writeln!(out, "{}", header.join(","))
    }

    fn write_record(&mut self, out: &mut dyn Write, rec: &ExportRecord<'_>) -> io::Result<()> {
        let mut row: Vec<String> = vec![
            format!("U+{}", rec.code_point),
            escape_csv(&rec.record.glyph),
            escape_csv(&rec.record.name),
            escape_csv(&rec.record.category),
            escape_csv(&rec.record.block),
        ];
        for i in 0..self.max_aliases {
            row.push(match rec.aliases.get(i) {
                Some(alias) => escape_csv(alias),
                None => String::new(),
            });
        }
        writeln!(out, "{}", row.join(","))
    }

    fn finish(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn verify(&self, path: &Path) -> Result<()> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| Error::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;

        let headers = reader.headers().map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        for required in CSV_BASE_COLUMNS {
            if !headers.iter().any(|h| h == required) {
                return Err(Error::Verification {
                    path: path.to_path_buf(),
                    message: format!("missing required column: {required}"),
                });
            }
        }

        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;
            if record.len() < CSV_BASE_COLUMNS.len() {
                return Err(Error::Verification {
                    path: path.to_path_buf(),
                    message: format!("row {} has insufficient columns", idx + 2),
                });
            }
        }
        Ok(())
    }
}

struct JsonWriter {
    first: bool,
}

impl RecordWriter for JsonWriter {
    fn begin(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"[\n")
    }

    fn write_record(&mut self, out: &mut dyn Write, rec: &ExportRecord<'_>) -> io::Result<()> {
        // Separator before the second and subsequent entries only
        if self.first {
            self.first = false;
        } else {
            out.write_all(b",\n")?;
        }
        let entry = ExportEntry::from_record(rec);
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        out.write_all(json.as_bytes())
    }

    fn finish(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"\n]")
    }

    fn verify(&self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let entries: Vec<ExportEntry> =
            serde_json::from_str(&content).map_err(|e| Error::Verification {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if entries.is_empty() {
            return Err(Error::Verification {
                path: path.to_path_buf(),
                message: "JSON data is empty".to_string(),
            });
        }
        Ok(())
    }
}

struct TxtWriter;

impl RecordWriter for TxtWriter {
    fn begin(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn write_record(&mut self, out: &mut dyn Write, rec: &ExportRecord<'_>) -> io::Result<()> {
        // Character first so substring search hits the glyph before the
        // descriptive fields.
        let code_point = format!("U+{}", rec.code_point);
        let mut parts: Vec<&str> = vec![
            rec.record.glyph.as_str(),
            rec.record.name.as_str(),
            code_point.as_str(),
            rec.record.category.as_str(),
            rec.record.block.as_str(),
        ];
        for alias in rec.aliases {
            parts.push(alias.as_str());
        }
        writeln!(out, "{}", parts.join("|"))
    }

    fn finish(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn verify(&self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() < 5 {
                return Err(Error::Verification {
                    path: path.to_path_buf(),
                    message: format!("line {} has insufficient fields", idx + 1),
                });
            }
            // The glyph itself may be a pipe, so look for the code-point
            // field anywhere in the line rather than at a fixed position.
            if !parts.iter().any(|p| is_code_point_field(p)) {
                return Err(Error::Verification {
                    path: path.to_path_buf(),
                    message: format!("line {} has no code point field", idx + 1),
                });
            }
        }
        Ok(())
    }
}

fn is_code_point_field(field: &str) -> bool {
    let Some(hex) = field.strip_prefix("U+") else {
        return false;
    };
    (4..=6).contains(&hex.len())
        && hex.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}

struct LuaWriter;

impl RecordWriter for LuaWriter {
    fn begin(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"-- Auto-generated unicode data module\n")?;
        out.write_all(b"-- Generated by unigen\n")?;
        out.write_all(b"return {\n")
    }

    fn write_record(&mut self, out: &mut dyn Write, rec: &ExportRecord<'_>) -> io::Result<()> {
        writeln!(out, "  {{")?;
        writeln!(out, "    code_point = \"U+{}\",", rec.code_point)?;
        writeln!(out, "    character = \"{}\",", escape_lua(&rec.record.glyph))?;
        writeln!(out, "    name = \"{}\",", escape_lua(&rec.record.name))?;
        writeln!(out, "    category = \"{}\",", escape_lua(&rec.record.category))?;
        writeln!(out, "    block = \"{}\",", escape_lua(&rec.record.block))?;
        if rec.aliases.is_empty() {
            writeln!(out, "    aliases = {{}},")?;
        } else {
            writeln!(out, "    aliases = {{")?;
            for alias in rec.aliases {
                writeln!(out, "      \"{}\",", escape_lua(alias))?;
            }
            writeln!(out, "    }},")?;
        }
        writeln!(out, "  }},")
    }

    fn finish(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"}\n")
    }

    fn verify(&self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let fail = |message: &str| {
            Err(Error::Verification {
                path: path.to_path_buf(),
                message: message.to_string(),
            })
        };

        if !content.starts_with("--") {
            return fail("missing comment header");
        }
        if !content.contains("return {") {
            return fail("missing 'return {'");
        }
        if !content.trim_end().ends_with('}') {
            return fail("missing closing brace");
        }
        Ok(())
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or line break
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Escape a string for a double-quoted Lua literal.
///
/// Conventional short escapes for `\n \r \t " \\`; any other control
/// character becomes a fixed-width decimal escape.
fn escape_lua(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 32 => out.push_str(&format!("\\{:03}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

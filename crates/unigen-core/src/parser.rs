//! Parsers for the Unicode source file formats
//!
//! Each parser turns one local file into a normalized intermediate mapping.
//! Code-point keys are canonicalized (uppercase hex, zero-padded to at least
//! 4 digits) at parser output, so downstream merging never has to reconcile
//! case conventions between sources.
//!
//! The primary database is mandatory; a missing or unreadable file there is
//! an error. The alias parsers degrade to an empty mapping instead, letting
//! the pipeline proceed without that source.

use crate::blocks::block_name;
use crate::dataset::{canonicalize_code_point, format_code_point, CharRecord};
use crate::error::{Error, Result};
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Raw (un-normalized) aliases keyed by canonical code point
pub type RawAliasMap = BTreeMap<String, Vec<String>>;

/// Parse the primary character database.
///
/// Each line is a semicolon-delimited record; field 0 is the code point,
/// field 1 the name, field 2 the general category. Range placeholder rows
/// are skipped, not expanded.
pub fn parse_primary<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, CharRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(parse_primary_str(&content))
}

/// Parse primary database content from a string (useful for testing)
pub fn parse_primary_str(content: &str) -> BTreeMap<String, CharRecord> {
    let mut records = BTreeMap::new();

    for (line_no, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() < 3 {
            debug!("skipping malformed primary line {}: {line}", line_no + 1);
            continue;
        }

        let name = fields[1];
        // Range boundaries come in paired First/Last rows; neither becomes
        // a record.
        if name.starts_with('<') && (name.ends_with(", First>") || name.ends_with(", Last>")) {
            continue;
        }

        let Ok(cp) = u32::from_str_radix(fields[0].trim(), 16) else {
            debug!("skipping invalid code point '{}' ({name})", fields[0]);
            continue;
        };
        let Some(glyph) = char::from_u32(cp) else {
            debug!("skipping non-scalar code point {cp:04X} ({name})");
            continue;
        };

        records.insert(
            format_code_point(cp),
            CharRecord {
                name: name.to_string(),
                category: fields[2].to_string(),
                glyph: glyph.to_string(),
                block: block_name(cp).to_string(),
            },
        );
    }

    records
}

/// Parse the formal alias source (`code_point;alias;alias_type` lines).
///
/// Returns an empty mapping when the file is missing or unreadable.
pub fn parse_formal_aliases<P: AsRef<Path>>(path: P) -> RawAliasMap {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => parse_formal_aliases_str(&content),
        Err(e) => {
            warn!("formal alias source '{}' unreadable: {e}", path.display());
            RawAliasMap::new()
        }
    }
}

/// Parse formal alias content from a string (useful for testing)
pub fn parse_formal_aliases_str(content: &str) -> RawAliasMap {
    let mut aliases = RawAliasMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() < 2 {
            debug!("skipping malformed alias line: {line}");
            continue;
        }

        let Some(cp) = canonicalize_code_point(fields[0]) else {
            debug!("skipping alias with invalid code point: {line}");
            continue;
        };
        aliases.entry(cp).or_default().push(fields[1].to_string());
    }

    aliases
}

/// Longest cross-reference note accepted as an alias
const MAX_NOTE_LEN: usize = 50;

/// Parse the informative alias source (indentation-sensitive names list).
///
/// Returns an empty mapping when the file is missing or unreadable.
pub fn parse_informative_aliases<P: AsRef<Path>>(path: P) -> RawAliasMap {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => parse_informative_aliases_str(&content),
        Err(e) => {
            warn!(
                "informative alias source '{}' unreadable: {e}",
                path.display()
            );
            RawAliasMap::new()
        }
    }
}

/// Parse informative alias content from a string (useful for testing)
pub fn parse_informative_aliases_str(content: &str) -> RawAliasMap {
    let mut aliases = RawAliasMap::new();
    let mut current: Option<String> = None;

    for raw_line in content.lines() {
        let line = raw_line.trim();

        // Headers, comments, and blank separators
        if line.is_empty() || line.starts_with('@') || line.starts_with(';') {
            continue;
        }

        if !raw_line.starts_with('\t') {
            // Non-indented lines open a new character context; the first
            // tab-delimited field is the code point.
            let mut parts = line.splitn(2, '\t');
            let head = parts.next().unwrap_or("");
            current = if parts.next().is_some() {
                canonicalize_code_point(head)
            } else {
                None
            };
        } else if let Some(cp) = &current {
            if let Some(alias) = line.strip_prefix('=') {
                let alias = alias.trim();
                if !alias.is_empty() {
                    aliases.entry(cp.clone()).or_default().push(alias.to_string());
                }
            } else if let Some(note) = line.strip_prefix('*') {
                let note = note.trim();
                // Long or parenthesized notes reference other characters;
                // they are noise, not aliases.
                if !note.is_empty()
                    && note.chars().count() < MAX_NOTE_LEN
                    && !note.contains('(')
                    && !note.contains(')')
                {
                    aliases.entry(cp.clone()).or_default().push(note.to_string());
                }
            }
        }
    }

    aliases
}

/// Parse the annotations XML source.
///
/// `<annotation cp="…">a | b</annotation>` elements contribute their
/// pipe-separated text; elements carrying a `type` attribute are
/// machine-pronunciation entries and are skipped. Returns an empty mapping
/// when the file is missing or unreadable; a malformed document yields
/// whatever was collected before the error.
pub fn parse_annotations<P: AsRef<Path>>(path: P) -> RawAliasMap {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => parse_annotations_str(&content),
        Err(e) => {
            warn!("annotation source '{}' unreadable: {e}", path.display());
            RawAliasMap::new()
        }
    }
}

/// Parse annotation XML content from a string (useful for testing)
pub fn parse_annotations_str(content: &str) -> RawAliasMap {
    let mut aliases = RawAliasMap::new();
    let mut reader = Reader::from_str(content);
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"annotation" => {
                current = annotation_key(&e);
            }
            Ok(Event::Text(t)) => {
                if let Some(cp) = &current {
                    match t.unescape() {
                        Ok(text) => {
                            for segment in text.split('|') {
                                let segment = segment.trim();
                                if !segment.is_empty() {
                                    aliases
                                        .entry(cp.clone())
                                        .or_default()
                                        .push(segment.to_string());
                                }
                            }
                        }
                        Err(e) => debug!("skipping undecodable annotation text: {e}"),
                    }
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"annotation" => {
                current = None;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("malformed annotation XML: {e}");
                break;
            }
        }
    }

    aliases
}

/// Merge key for an annotation element, or `None` when the element should
/// be skipped.
///
/// Multi-character `cp` sequences collapse to the first scalar's code
/// point; sequence ligatures are out of scope.
fn annotation_key(element: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    let mut cp_value: Option<String> = None;

    for attr in element.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(e) => {
                debug!("skipping annotation with bad attribute: {e}");
                return None;
            }
        };
        match attr.key.as_ref() {
            b"type" => return None,
            b"cp" => match attr.unescape_value() {
                Ok(value) => cp_value = Some(value.into_owned()),
                Err(e) => {
                    debug!("skipping annotation with undecodable cp: {e}");
                    return None;
                }
            },
            _ => {}
        }
    }

    let first = cp_value?.chars().next()?;
    Some(format_code_point(first as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primary_basic() {
        let content = "0041;LATIN CAPITAL LETTER A;Lu;0;L;;;;;N;;;;;\n\
                       0042;LATIN CAPITAL LETTER B;Lu;0;L;;;;;N;;;;;\n";
        let records = parse_primary_str(content);

        assert_eq!(records.len(), 2);
        let a = &records["0041"];
        assert_eq!(a.name, "LATIN CAPITAL LETTER A");
        assert_eq!(a.category, "Lu");
        assert_eq!(a.glyph, "A");
        assert_eq!(a.block, "Basic Latin");
    }

    #[test]
    fn test_parse_primary_code_point_round_trip() {
        let content = "1F600;GRINNING FACE;So;0;ON;;;;;N;;;;;\n";
        let records = parse_primary_str(content);
        let (cp, rec) = records.iter().next().unwrap();

        assert_eq!(u32::from_str_radix(cp, 16).unwrap(), 0x1F600);
        assert_eq!(rec.glyph, "\u{1F600}");
        assert_eq!(rec.block, "Emoticons");
    }

    #[test]
    fn test_parse_primary_skips_range_markers() {
        let content = "3400;<CJK Ideograph Extension A, First>;Lo;0;L;;;;;N;;;;;\n\
                       4DBF;<CJK Ideograph Extension A, Last>;Lo;0;L;;;;;N;;;;;\n\
                       0041;LATIN CAPITAL LETTER A;Lu;0;L;;;;;N;;;;;\n";
        let records = parse_primary_str(content);

        assert_eq!(records.len(), 1);
        assert!(records.contains_key("0041"));
    }

    #[test]
    fn test_parse_primary_skips_surrogates_and_garbage() {
        let content = "D800;<Non Private Use High Surrogate>;Cs;0;L;;;;;N;;;;;\n\
                       XYZ;NOT HEX;Lu;0;L;;;;;N;;;;;\n\
                       garbage line\n";
        let records = parse_primary_str(content);
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_primary_canonicalizes_key() {
        let content = "41;LATIN CAPITAL LETTER A;Lu;0;L;;;;;N;;;;;\n";
        let records = parse_primary_str(content);
        assert!(records.contains_key("0041"));
    }

    #[test]
    fn test_parse_primary_missing_file_is_fatal() {
        let err = parse_primary("/no/such/file.txt").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_parse_formal_aliases() {
        let content = "# NameAliases\n\
                       \n\
                       0041;LATIN LETTER A;correction\n\
                       0041;FIRST LETTER;figment\n\
                       000A;LINE FEED;control\n";
        let aliases = parse_formal_aliases_str(content);

        assert_eq!(
            aliases["0041"],
            vec!["LATIN LETTER A".to_string(), "FIRST LETTER".to_string()]
        );
        assert_eq!(aliases["000A"], vec!["LINE FEED".to_string()]);
    }

    #[test]
    fn test_parse_formal_aliases_lowercase_keys_canonicalized() {
        let aliases = parse_formal_aliases_str("00e9;e acute;abbreviation\n");
        assert!(aliases.contains_key("00E9"));
    }

    #[test]
    fn test_parse_formal_aliases_missing_file_degrades() {
        assert!(parse_formal_aliases("/no/such/file.txt").is_empty());
    }

    #[test]
    fn test_parse_informative_aliases() {
        let content = "@\tBasic Latin\n\
                       0026\tAMPERSAND\n\
                       \t= and sign\n\
                       \t* short note\n\
                       \t* this note is definitely much longer than fifty characters in total length\n\
                       \t* note (with reference)\n\
                       0027\tAPOSTROPHE\n\
                       \t= apl quote\n";
        let aliases = parse_informative_aliases_str(content);

        assert_eq!(
            aliases["0026"],
            vec!["and sign".to_string(), "short note".to_string()]
        );
        assert_eq!(aliases["0027"], vec!["apl quote".to_string()]);
    }

    #[test]
    fn test_parse_informative_aliases_resets_context() {
        // A non-indented line without a tab field clears the context, so
        // following indented lines are dropped.
        let content = "0041\tLATIN CAPITAL LETTER A\n\
                       not a character line\n\
                       \t= stray alias\n";
        let aliases = parse_informative_aliases_str(content);
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_parse_annotations() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ldml>
  <annotations>
    <annotation cp="&#x1F600;">face | grin | grinning face</annotation>
    <annotation cp="&#x1F600;" type="tts">grinning face</annotation>
    <annotation cp="A">letter a</annotation>
  </annotations>
</ldml>"#;
        let aliases = parse_annotations_str(xml);

        assert_eq!(
            aliases["1F600"],
            vec![
                "face".to_string(),
                "grin".to_string(),
                "grinning face".to_string()
            ]
        );
        assert_eq!(aliases["0041"], vec!["letter a".to_string()]);
    }

    #[test]
    fn test_parse_annotations_multi_char_sequence_uses_first_scalar() {
        let xml = r#"<ldml><annotations>
            <annotation cp="AB">letters</annotation>
        </annotations></ldml>"#;
        let aliases = parse_annotations_str(xml);

        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases["0041"], vec!["letters".to_string()]);
    }

    #[test]
    fn test_parse_annotations_malformed_keeps_collected() {
        let xml = r#"<ldml><annotations>
            <annotation cp="A">letter a</annotation>
            <broken"#;
        let aliases = parse_annotations_str(xml);
        assert_eq!(aliases["0041"], vec!["letter a".to_string()]);
    }
}

//! Static index of Unicode block ranges and named dataset definitions

/// Sentinel block name for code points outside every known range
pub const UNKNOWN_BLOCK: &str = "Unknown Block";

/// Dataset name constants
pub const DATASET_EVERYDAY: &str = "every-day";
pub const DATASET_COMPLETE: &str = "complete";
pub const DATASET_TEST: &str = "test";

/// All recognized dataset names
pub const DATASETS: &[&str] = &[DATASET_EVERYDAY, DATASET_COMPLETE, DATASET_TEST];

/// Block the "test" dataset draws from
pub const TEST_DATASET_BLOCK: &str = "Basic Latin";
/// Maximum number of records in the "test" dataset
pub const TEST_DATASET_LIMIT: usize = 50;

/// Inclusive code-point ranges mapped to block names
const BLOCKS: &[(u32, u32, &str)] = &[
    (0x0000, 0x007F, "Basic Latin"),
    (0x0080, 0x00FF, "Latin-1 Supplement"),
    (0x0100, 0x017F, "Latin Extended-A"),
    (0x0180, 0x024F, "Latin Extended-B"),
    (0x0250, 0x02AF, "IPA Extensions"),
    (0x02B0, 0x02FF, "Spacing Modifier Letters"),
    (0x0300, 0x036F, "Combining Diacritical Marks"),
    (0x0370, 0x03FF, "Greek and Coptic"),
    (0x0400, 0x04FF, "Cyrillic"),
    (0x0500, 0x052F, "Cyrillic Supplement"),
    (0x0530, 0x058F, "Armenian"),
    (0x0590, 0x05FF, "Hebrew"),
    (0x0600, 0x06FF, "Arabic"),
    (0x0900, 0x097F, "Devanagari"),
    (0x0980, 0x09FF, "Bengali"),
    (0x0B80, 0x0BFF, "Tamil"),
    (0x0E00, 0x0E7F, "Thai"),
    (0x10A0, 0x10FF, "Georgian"),
    (0x1100, 0x11FF, "Hangul Jamo"),
    (0x1E00, 0x1EFF, "Latin Extended Additional"),
    (0x1F00, 0x1FFF, "Greek Extended"),
    (0x2000, 0x206F, "General Punctuation"),
    (0x2070, 0x209F, "Superscripts and Subscripts"),
    (0x20A0, 0x20CF, "Currency Symbols"),
    (0x20D0, 0x20FF, "Combining Diacritical Marks for Symbols"),
    (0x2100, 0x214F, "Letterlike Symbols"),
    (0x2150, 0x218F, "Number Forms"),
    (0x2190, 0x21FF, "Arrows"),
    (0x2200, 0x22FF, "Mathematical Operators"),
    (0x2300, 0x23FF, "Miscellaneous Technical"),
    (0x2400, 0x243F, "Control Pictures"),
    (0x2460, 0x24FF, "Enclosed Alphanumerics"),
    (0x2500, 0x257F, "Box Drawing"),
    (0x2580, 0x259F, "Block Elements"),
    (0x25A0, 0x25FF, "Geometric Shapes"),
    (0x2600, 0x26FF, "Miscellaneous Symbols"),
    (0x2700, 0x27BF, "Dingbats"),
    (0x2800, 0x28FF, "Braille Patterns"),
    (0x2900, 0x297F, "Supplemental Arrows-B"),
    (0x2A00, 0x2AFF, "Supplemental Mathematical Operators"),
    (0x3000, 0x303F, "CJK Symbols and Punctuation"),
    (0x3040, 0x309F, "Hiragana"),
    (0x30A0, 0x30FF, "Katakana"),
    (0x4E00, 0x9FFF, "CJK Unified Ideographs"),
    (0xAC00, 0xD7AF, "Hangul Syllables"),
    (0xE000, 0xF8FF, "Private Use Area"),
    (0xFB00, 0xFB4F, "Alphabetic Presentation Forms"),
    (0xFFF0, 0xFFFF, "Specials"),
    (0x1D400, 0x1D7FF, "Mathematical Alphanumeric Symbols"),
    (0x1F300, 0x1F5FF, "Miscellaneous Symbols and Pictographs"),
    (0x1F600, 0x1F64F, "Emoticons"),
    (0x1F680, 0x1F6FF, "Transport and Map Symbols"),
    (0x1F900, 0x1F9FF, "Supplemental Symbols and Pictographs"),
];

/// Blocks included in the "every-day" dataset
const EVERYDAY_BLOCKS: &[&str] = &[
    "Basic Latin",
    "Latin-1 Supplement",
    "Latin Extended-A",
    "Latin Extended-B",
    "General Punctuation",
    "Currency Symbols",
    "Letterlike Symbols",
    "Arrows",
    "Mathematical Operators",
    "Box Drawing",
    "Block Elements",
    "Geometric Shapes",
    "Miscellaneous Symbols",
    "Dingbats",
    "Miscellaneous Symbols and Pictographs",
    "Emoticons",
    "Transport and Map Symbols",
    "Supplemental Symbols and Pictographs",
];

/// Look up the block name for a code point.
pub fn block_name(code_point: u32) -> &'static str {
    for (start, end, name) in BLOCKS {
        if (*start..=*end).contains(&code_point) {
            return name;
        }
    }
    UNKNOWN_BLOCK
}

/// Block list for a named dataset.
///
/// An empty list means "no restriction". `None` means the dataset name is
/// unknown; callers treat that the same as no restriction.
pub fn dataset_blocks(dataset: &str) -> Option<&'static [&'static str]> {
    match dataset {
        DATASET_EVERYDAY => Some(EVERYDAY_BLOCKS),
        DATASET_COMPLETE => Some(&[]),
        DATASET_TEST => Some(&[TEST_DATASET_BLOCK]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_name_basic_latin() {
        assert_eq!(block_name(0x0041), "Basic Latin");
        assert_eq!(block_name(0x007F), "Basic Latin");
    }

    #[test]
    fn test_block_name_boundaries() {
        assert_eq!(block_name(0x0080), "Latin-1 Supplement");
        assert_eq!(block_name(0x2600), "Miscellaneous Symbols");
        assert_eq!(block_name(0x1F600), "Emoticons");
    }

    #[test]
    fn test_block_name_unknown() {
        // Hole between Control Pictures and Enclosed Alphanumerics
        assert_eq!(block_name(0x2450), UNKNOWN_BLOCK);
        assert_eq!(block_name(0x10FFFF), UNKNOWN_BLOCK);
    }

    #[test]
    fn test_dataset_blocks() {
        assert!(dataset_blocks(DATASET_COMPLETE).unwrap().is_empty());
        assert!(dataset_blocks(DATASET_EVERYDAY)
            .unwrap()
            .contains(&"Basic Latin"));
        assert_eq!(dataset_blocks("no-such-dataset"), None);
    }

    #[test]
    fn test_ranges_do_not_overlap() {
        let mut sorted: Vec<_> = BLOCKS.to_vec();
        sorted.sort_by_key(|(start, _, _)| *start);
        for pair in sorted.windows(2) {
            assert!(
                pair[0].1 < pair[1].0,
                "ranges overlap: {:?} / {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_everyday_blocks_are_known() {
        let known: Vec<&str> = BLOCKS.iter().map(|(_, _, name)| *name).collect();
        for block in EVERYDAY_BLOCKS {
            assert!(known.contains(block), "unknown block in dataset: {block}");
        }
    }
}

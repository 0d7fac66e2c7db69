//! WaveDrom block extraction and image naming.
//!
//! Blocks are located with a single static regex. Every call to
//! [`extract_blocks`] starts a fresh scan, so no match position survives
//! between documents.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::consts::{DOCUMENT_SUFFIX, IMAGE_EXTENSION};

/// Opening fence tagged `wavedrom`, lazily matched up to the next closing fence.
static BLOCK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```wavedrom\r?\n(.*?)\r?\n```").unwrap());

/// A fenced WaveDrom block found in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramBlock<'a> {
    /// The full matched block, fences included.
    pub raw_text: &'a str,
    /// Diagram description between the fences, verbatim.
    pub payload: &'a str,
    /// Zero-based position among the document's blocks.
    pub sequence_index: usize,
    /// Byte offset of `raw_text` within the document.
    pub source_offset: usize,
}

impl DiagramBlock<'_> {
    /// One-based diagram number used in file names and messages.
    #[must_use]
    pub fn number(&self) -> usize {
        self.sequence_index + 1
    }

    /// Byte offset just past the closing fence.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.source_offset + self.raw_text.len()
    }
}

/// Find every WaveDrom block in `text`, in order of appearance.
///
/// Blocks tagged with any other language are ignored, and so is anything
/// inserted by a previous run since reference fragments are not fenced.
#[must_use]
pub fn extract_blocks(text: &str) -> Vec<DiagramBlock<'_>> {
    BLOCK_PATTERN
        .captures_iter(text)
        .enumerate()
        .filter_map(|(sequence_index, caps)| {
            let whole = caps.get(0)?;
            let payload = caps.get(1)?;
            Some(DiagramBlock {
                raw_text: whole.as_str(),
                payload: payload.as_str(),
                sequence_index,
                source_offset: whole.start(),
            })
        })
        .collect()
}

/// Document file name without its `.md` suffix.
///
/// Only a trailing suffix is removed; other dots are kept.
#[must_use]
pub fn document_base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(DOCUMENT_SUFFIX) {
        Some(stripped) => stripped.to_owned(),
        None => name,
    }
}

/// Image file name for a block: `<base>-diagram-<n>.svg`.
#[must_use]
pub fn image_file_name(base_name: &str, block: &DiagramBlock<'_>) -> String {
    format!("{base_name}-diagram-{}.{IMAGE_EXTENSION}", block.number())
}

/// Human-readable diagram title, e.g. `DUTY CYCLE FIX - Diagram 2`.
#[must_use]
pub fn diagram_title(base_name: &str, number: usize) -> String {
    let readable = base_name.replace(['-', '_'], " ");
    format!("{readable} - Diagram {number}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_BLOCKS: &str = "# Demo\n\n```wavedrom\n{ signal: [{ name: 'clk', wave: 'p...' }] }\n```\n\nText\n\n```wavedrom\n{\"signal\": []}\n```\n";

    #[test]
    fn test_extract_no_blocks() {
        assert!(extract_blocks("# Title\n\nNo diagrams here.\n").is_empty());
        assert!(extract_blocks("").is_empty());
    }

    #[test]
    fn test_extract_two_blocks_in_order() {
        let blocks = extract_blocks(TWO_BLOCKS);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].sequence_index, 0);
        assert_eq!(blocks[1].sequence_index, 1);
        assert_eq!(
            blocks[0].payload,
            "{ signal: [{ name: 'clk', wave: 'p...' }] }"
        );
        assert_eq!(blocks[1].payload, "{\"signal\": []}");
        assert!(blocks[0].source_offset < blocks[1].source_offset);
    }

    #[test]
    fn test_extract_offsets_point_at_raw_text() {
        for block in extract_blocks(TWO_BLOCKS) {
            assert_eq!(
                &TWO_BLOCKS[block.source_offset..block.end_offset()],
                block.raw_text
            );
            assert!(block.raw_text.starts_with("```wavedrom\n"));
            assert!(block.raw_text.ends_with("\n```"));
        }
    }

    #[test]
    fn test_extract_ignores_other_languages() {
        let text = "```json\n{\"signal\": []}\n```\n\n```wavedromx\n{}\n```\n\n```\nplain\n```\n";
        assert!(extract_blocks(text).is_empty());
    }

    #[test]
    fn test_extract_multiline_payload_verbatim() {
        let text = "```wavedrom\n{ signal: [\n  { name: 'a', wave: '01' },\n]}\n```";
        let blocks = extract_blocks(text);

        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].payload,
            "{ signal: [\n  { name: 'a', wave: '01' },\n]}"
        );
        assert_eq!(blocks[0].source_offset, 0);
    }

    #[test]
    fn test_extract_crlf_line_endings() {
        let text = "intro\r\n```wavedrom\r\n{\"signal\": []}\r\n```\r\n";
        let blocks = extract_blocks(text);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].payload, "{\"signal\": []}");
        assert_eq!(blocks[0].source_offset, 7);
    }

    #[test]
    fn test_extract_ignores_inserted_references() {
        let text = "```wavedrom\n{}\n```\n\n**Rendered Diagram** (GitHub):\n\n![WaveDrom Diagram](./wavedrom-images/DEMO-diagram-1.svg)\n\n";
        assert_eq!(extract_blocks(text).len(), 1);
    }

    #[test]
    fn test_extract_is_restartable() {
        let first = extract_blocks(TWO_BLOCKS);
        let second = extract_blocks(TWO_BLOCKS);
        assert_eq!(first, second);
    }

    #[test]
    fn test_document_base_name() {
        assert_eq!(document_base_name(Path::new("DEMO.md")), "DEMO");
        assert_eq!(document_base_name(Path::new("docs/MUX8_ANALYSIS.md")), "MUX8_ANALYSIS");
        assert_eq!(document_base_name(Path::new("v1.md.notes.md")), "v1.md.notes");
        assert_eq!(document_base_name(Path::new("README")), "README");
    }

    #[test]
    fn test_image_file_name_is_one_based() {
        let blocks = extract_blocks(TWO_BLOCKS);
        assert_eq!(image_file_name("DEMO", &blocks[0]), "DEMO-diagram-1.svg");
        assert_eq!(image_file_name("DEMO", &blocks[1]), "DEMO-diagram-2.svg");
    }

    #[test]
    fn test_diagram_title() {
        assert_eq!(
            diagram_title("DUTY_CYCLE-FIX", 3),
            "DUTY CYCLE FIX - Diagram 3"
        );
    }
}

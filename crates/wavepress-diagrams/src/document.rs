//! In-memory markdown document being rewritten.
//!
//! Block offsets come from the original text. Every spliced fragment shifts
//! later insertion points by its own length (or by the length difference
//! when it replaces an earlier reference), so [`DocumentState`] keeps one
//! running shift. Blocks must be spliced in document order.

use std::sync::LazyLock;

use regex::Regex;

use crate::block::DiagramBlock;

/// A reference fragment directly after a closing fence: caption paragraph,
/// image paragraph, and an optional `<sub>` note paragraph.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\A\n\n[^\n]*\n\n",
        r"!\[[^\]\n]*\]\(([^)\n]*)\)\n\n",
        r"(?:<sub>[^\n]*</sub>\n\n)?",
    ))
    .unwrap()
});

/// Markdown inserted after each rendered block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTemplate {
    /// Caption line above the image.
    pub caption: String,
    /// Image alt text.
    pub alt: String,
    /// Optional trailing line (e.g., a hint under placeholder images).
    pub note: Option<String>,
}

impl ReferenceTemplate {
    /// Create a template with the given caption and alt text.
    #[must_use]
    pub fn new(caption: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            alt: alt.into(),
            note: None,
        }
    }

    /// Set the trailing note line.
    #[must_use]
    pub fn with_note(mut self, note: Option<&str>) -> Self {
        self.note = note.map(str::to_owned);
        self
    }

    /// Fragment referencing `relative_path`.
    ///
    /// Blank-line separated so it renders as its own paragraph right after
    /// the closing fence.
    #[must_use]
    pub fn render(&self, relative_path: &str) -> String {
        let mut fragment = format!(
            "\n\n{}\n\n![{}]({relative_path})\n\n",
            self.caption, self.alt
        );
        if let Some(note) = &self.note {
            fragment.push_str(note);
            fragment.push_str("\n\n");
        }
        fragment
    }
}

impl Default for ReferenceTemplate {
    fn default() -> Self {
        Self::new("**Rendered Diagram** (GitHub):", "WaveDrom Diagram")
    }
}

/// Result of a splice attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceOutcome {
    /// The fragment was inserted.
    Inserted,
    /// An older reference to the same image was rewritten in place.
    Replaced,
    /// The same fragment already follows the block; nothing changed.
    AlreadyPresent,
}

/// Markdown content plus insertion bookkeeping.
#[derive(Debug)]
pub struct DocumentState {
    content: String,
    /// Net bytes added so far (negative when replacements shrank the text).
    shift: isize,
    /// Number of fragments inserted.
    insertions: usize,
    /// Number of older references rewritten.
    replacements: usize,
    /// End of the last spliced block in original-document offsets.
    cursor: usize,
}

impl DocumentState {
    /// Wrap the original document text.
    #[must_use]
    pub fn new(content: String) -> Self {
        Self {
            content,
            shift: 0,
            insertions: 0,
            replacements: 0,
            cursor: 0,
        }
    }

    /// Current content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume the state, returning the rewritten content.
    #[must_use]
    pub fn into_content(self) -> String {
        self.content
    }

    /// Net bytes added so far.
    #[must_use]
    pub fn shift(&self) -> isize {
        self.shift
    }

    /// Number of fragments inserted so far.
    #[must_use]
    pub fn insertions(&self) -> usize {
        self.insertions
    }

    /// Number of older references rewritten so far.
    #[must_use]
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Whether the content differs from what was loaded.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.insertions + self.replacements > 0
    }

    /// Place the reference to `relative_path` right after `block`'s closing
    /// fence.
    ///
    /// A reference to the same image already sitting there (from an earlier
    /// run, possibly with another caption or note) is rewritten instead of
    /// duplicated. `block` must come from the text this state was created
    /// with, and blocks must be passed in increasing `source_offset` order.
    pub fn splice(
        &mut self,
        block: &DiagramBlock<'_>,
        template: &ReferenceTemplate,
        relative_path: &str,
    ) -> SpliceOutcome {
        debug_assert!(
            block.source_offset >= self.cursor,
            "blocks must be spliced in document order"
        );
        self.cursor = block.end_offset();

        let fragment = template.render(relative_path);
        let position = block.end_offset().saturating_add_signed(self.shift);
        let rest = &self.content[position..];
        let existing = REFERENCE_PATTERN
            .captures(rest)
            .filter(|caps| {
                caps.get(1)
                    .is_some_and(|path| path.as_str() == relative_path)
            })
            .and_then(|caps| caps.get(0))
            .map(|whole| whole.len());

        let unchanged = match existing {
            Some(old_len) => rest[..old_len] == fragment,
            None => rest.starts_with(&fragment),
        };
        if unchanged {
            return SpliceOutcome::AlreadyPresent;
        }

        if let Some(old_len) = existing {
            self.content
                .replace_range(position..position + old_len, &fragment);
            self.shift += signed_len(fragment.len()) - signed_len(old_len);
            self.replacements += 1;
            return SpliceOutcome::Replaced;
        }

        self.content.insert_str(position, &fragment);
        self.shift += signed_len(fragment.len());
        self.insertions += 1;
        SpliceOutcome::Inserted
    }
}

fn signed_len(len: usize) -> isize {
    isize::try_from(len).unwrap_or(isize::MAX)
}

use std::sync::Arc;

use crate::error::LayoutError;
use crate::font::Typeface;
use crate::layout::break_resolver::{self, BreakMode};
use crate::layout::collection::{ParagraphCollection, RunCollection};
use crate::layout::composed_line::ComposedLine;
use crate::layout::line_resolver::{LineResolver, TruncationPlace};
use crate::layout::shape_resolver;
use crate::layout::token;
use crate::style::SpanList;
use crate::unicode::BaseDirection;
use crate::unicode::breaks;

/// Analyzed, shaped text ready for line composition.
///
/// Construction runs the full analysis pipeline once: break records, the
/// bidi algorithm and shaping of every (bidi × script × style) run. Lines
/// are then composed on demand against the cached collections.
#[derive(Debug)]
pub struct Typesetter {
    text: String,
    chars: Vec<char>,
    spans: SpanList,
    breaks: Vec<u8>,
    paragraphs: ParagraphCollection,
    runs: RunCollection,
}

impl Typesetter {
    /// Typeset styled text with base direction detected from content.
    pub fn new(text: impl Into<String>, spans: SpanList) -> Result<Self, LayoutError> {
        Self::with_base_direction(text, spans, BaseDirection::Auto)
    }

    /// Typeset plain text in a single typeface and size.
    pub fn with_typeface(
        text: impl Into<String>,
        typeface: Arc<Typeface>,
        type_size: f32,
    ) -> Result<Self, LayoutError> {
        Self::new(text, SpanList::with_defaults(typeface, type_size))
    }

    pub fn with_base_direction(
        text: impl Into<String>,
        spans: SpanList,
        base_direction: BaseDirection,
    ) -> Result<Self, LayoutError> {
        let text = text.into();
        if text.is_empty() {
            return Err(LayoutError::InvalidRange { range: 0..0, len: 0 });
        }

        let chars: Vec<char> = text.chars().collect();
        let mut char_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        char_offsets.push(text.len());

        let mut break_record = vec![0u8; chars.len()];
        breaks::fill_breaks(&text, &char_offsets, &mut break_record);

        let mut paragraphs = ParagraphCollection::new();
        let mut runs = RunCollection::new();
        shape_resolver::fill_runs(
            &text,
            &chars,
            &char_offsets,
            &spans,
            base_direction,
            &mut break_record,
            &mut paragraphs,
            &mut runs,
        )?;

        Ok(Self {
            text,
            chars,
            spans,
            breaks: break_record,
            paragraphs,
            runs,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    pub fn spans(&self) -> &SpanList {
        &self.spans
    }

    /// Whether a paragraph boundary sits immediately before `char_end`.
    pub(crate) fn ends_paragraph(&self, char_end: usize) -> bool {
        char_end > 0 && self.breaks[char_end - 1] & breaks::BreakType::Paragraph.flag(true) != 0
    }

    fn check_range(&self, char_start: usize, char_end: usize) -> Result<(), LayoutError> {
        if char_start >= char_end || char_end > self.chars.len() {
            return Err(LayoutError::InvalidRange {
                range: char_start..char_end,
                len: self.chars.len(),
            });
        }
        Ok(())
    }

    fn resolver(&self) -> LineResolver<'_> {
        LineResolver::new(&self.chars, &self.spans, &self.paragraphs, &self.runs)
    }

    /// Greatest index in `(char_start, char_end]` such that
    /// `[char_start, index)` fits the extent.
    pub fn suggest_forward_break(
        &self,
        char_start: usize,
        char_end: usize,
        extent: f32,
        mode: BreakMode,
    ) -> Result<usize, LayoutError> {
        self.check_range(char_start, char_end)?;
        Ok(break_resolver::suggest_forward_break(
            &self.chars,
            &self.runs,
            &self.breaks,
            char_start,
            char_end,
            extent,
            mode,
        ))
    }

    /// Smallest index in `[char_start, char_end)` such that
    /// `[index, char_end)` fits the extent.
    pub fn suggest_backward_break(
        &self,
        char_start: usize,
        char_end: usize,
        extent: f32,
        mode: BreakMode,
    ) -> Result<usize, LayoutError> {
        self.check_range(char_start, char_end)?;
        Ok(break_resolver::suggest_backward_break(
            &self.chars,
            &self.runs,
            &self.breaks,
            char_start,
            char_end,
            extent,
            mode,
        ))
    }

    /// Compose the range into a single line with no width constraint.
    pub fn create_simple_line(
        &self,
        char_start: usize,
        char_end: usize,
    ) -> Result<ComposedLine, LayoutError> {
        self.check_range(char_start, char_end)?;
        Ok(self.resolver().create_simple_line(char_start, char_end))
    }

    /// Compose the range into a line no wider than `max_width`, replacing
    /// excised text with a truncation token.
    pub fn create_truncated_line(
        &self,
        char_start: usize,
        char_end: usize,
        max_width: f32,
        mode: BreakMode,
        place: TruncationPlace,
        token_str: Option<&str>,
    ) -> Result<ComposedLine, LayoutError> {
        self.check_range(char_start, char_end)?;

        let token = token::create_token(&self.runs, char_start, char_end, place, token_str)?;
        Ok(self.resolver().create_compact_line(
            char_start,
            char_end,
            max_width,
            &self.breaks,
            mode,
            place,
            &token,
        ))
    }

    /// Compose the range into a line whose interior whitespace is widened
    /// to approach `justification_width`.
    pub fn create_justified_line(
        &self,
        char_start: usize,
        char_end: usize,
        justification_factor: f32,
        justification_width: f32,
    ) -> Result<ComposedLine, LayoutError> {
        self.check_range(char_start, char_end)?;
        Ok(self.resolver().create_justified_line(
            char_start,
            char_end,
            justification_factor,
            justification_width,
        ))
    }
}

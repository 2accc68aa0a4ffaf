//! Per-range style attributes resolved during shaping.
//!
//! A `SpanList` associates typed attributes with character ranges. At any
//! position the winning value per attribute type is the last span applied,
//! mirroring platform span stacks.

use core::fmt;
use core::ops::Range;
use std::sync::Arc;

use crate::font::Typeface;

/// Metrics reported by an inline replacement object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplacementMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
    pub extent: f32,
}

/// An inline non-text object occupying a character range.
///
/// The layout engine never draws a replacement; it only reserves space for
/// it based on the reported metrics.
pub trait Replacement: fmt::Debug + Send + Sync {
    fn metrics(&self, char_range: Range<usize>) -> ReplacementMetrics;
}

/// A single typed style attribute.
#[derive(Debug, Clone)]
pub enum SpanAttribute {
    Typeface(Arc<Typeface>),
    TypeSize(f32),
    ScaleX(f32),
    BaselineShift(f32),
    Replacement(Arc<dyn Replacement>),
}

/// A style attribute applied to a character range.
#[derive(Debug, Clone)]
pub struct Span {
    pub range: Range<usize>,
    pub attribute: SpanAttribute,
}

/// Style attributes in effect at a single position.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    pub typeface: Option<Arc<Typeface>>,
    pub type_size: f32,
    pub scale_x: f32,
    pub baseline_shift: f32,
    pub replacement: Option<Arc<dyn Replacement>>,
}

impl ResolvedStyle {
    /// Whether two resolved styles shape identically and may be merged
    /// into one run.
    pub fn merges_with(&self, other: &ResolvedStyle) -> bool {
        let same_typeface = match (&self.typeface, &other.typeface) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        let same_replacement = match (&self.replacement, &other.replacement) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };

        same_typeface
            && same_replacement
            && self.type_size == other.type_size
            && self.scale_x == other.scale_x
            && self.baseline_shift == other.baseline_shift
    }
}

/// Ordered list of style spans with defaults for unstyled text.
#[derive(Debug, Clone)]
pub struct SpanList {
    spans: Vec<Span>,
    default_typeface: Option<Arc<Typeface>>,
    default_type_size: f32,
}

const DEFAULT_TYPE_SIZE: f32 = 16.0;

impl Default for SpanList {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanList {
    pub fn new() -> Self {
        Self {
            spans: Vec::new(),
            default_typeface: None,
            default_type_size: DEFAULT_TYPE_SIZE,
        }
    }

    /// A span list whose every position resolves to one typeface and size.
    pub fn with_defaults(typeface: Arc<Typeface>, type_size: f32) -> Self {
        Self {
            spans: Vec::new(),
            default_typeface: Some(typeface),
            default_type_size: type_size,
        }
    }

    pub fn set_default_typeface(&mut self, typeface: Arc<Typeface>) {
        self.default_typeface = Some(typeface);
    }

    pub fn set_default_type_size(&mut self, type_size: f32) {
        self.default_type_size = type_size;
    }

    /// Apply an attribute to a character range. Later additions win over
    /// earlier ones where they overlap.
    pub fn add(&mut self, range: Range<usize>, attribute: SpanAttribute) {
        assert!(
            range.start <= range.end,
            "span range must not be inverted: [{}..{})",
            range.start,
            range.end
        );
        self.spans.push(Span { range, attribute });
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The next position in `(index, limit]` where any span starts or ends.
    pub fn next_span_transition(&self, index: usize, limit: usize) -> usize {
        let mut next = limit;
        for span in &self.spans {
            if span.range.start > index && span.range.start < next {
                next = span.range.start;
            }
            if span.range.end > index && span.range.end < next {
                next = span.range.end;
            }
        }
        next
    }

    /// Resolve the winning attributes at a position.
    pub fn resolved_style(&self, index: usize) -> ResolvedStyle {
        let mut style = ResolvedStyle {
            typeface: self.default_typeface.clone(),
            type_size: self.default_type_size,
            scale_x: 1.0,
            baseline_shift: 0.0,
            replacement: None,
        };

        for span in &self.spans {
            if !span.range.contains(&index) {
                continue;
            }
            match &span.attribute {
                SpanAttribute::Typeface(typeface) => style.typeface = Some(typeface.clone()),
                SpanAttribute::TypeSize(size) => style.type_size = size.max(0.0),
                SpanAttribute::ScaleX(scale) => style.scale_x = *scale,
                SpanAttribute::BaselineShift(shift) => style.baseline_shift = *shift,
                SpanAttribute::Replacement(replacement) => {
                    style.replacement = Some(replacement.clone())
                }
            }
        }

        style
    }

    /// All spans overlapping a character range, in application order.
    pub fn spans_in(&self, range: Range<usize>) -> Vec<Span> {
        self.spans
            .iter()
            .filter(|span| span.range.start < range.end && span.range.end > range.start)
            .cloned()
            .collect()
    }
}

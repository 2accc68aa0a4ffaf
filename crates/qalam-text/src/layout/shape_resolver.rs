use core::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::error::LayoutError;
use crate::layout::collection::{ParagraphCollection, RunCollection};
use crate::layout::run::{IntrinsicRun, ReplacementRun, TextRun};
use crate::shaping::ShapingEngine;
use crate::style::{ResolvedStyle, SpanList};
use crate::unicode::bidi::{self, BaseDirection};
use crate::unicode::breaks::BreakType;
use crate::unicode::script;

/// A maximal sub-range whose resolved style shapes uniformly.
#[derive(Debug)]
struct ShapingRun {
    range: Range<usize>,
    style: ResolvedStyle,
}

/// Walks style transitions within a range, merging adjacent sub-ranges
/// whose typeface, size, scale, baseline shift and replacement all match.
struct ShapingRunLocator<'a> {
    spans: &'a SpanList,
    cursor: usize,
    limit: usize,
}

impl<'a> ShapingRunLocator<'a> {
    fn new(spans: &'a SpanList, range: Range<usize>) -> Self {
        Self {
            spans,
            cursor: range.start,
            limit: range.end,
        }
    }
}

impl Iterator for ShapingRunLocator<'_> {
    type Item = ShapingRun;

    fn next(&mut self) -> Option<ShapingRun> {
        if self.cursor >= self.limit {
            return None;
        }

        let start = self.cursor;
        let style = self.spans.resolved_style(start);
        let mut end = self.spans.next_span_transition(start, self.limit);

        // Merge runs of similar style.
        while end < self.limit {
            let next = self.spans.resolved_style(end);
            if style.merges_with(&next) {
                end = self.spans.next_span_transition(end, self.limit);
            } else {
                break;
            }
        }

        self.cursor = end;
        Some(ShapingRun {
            range: start..end,
            style,
        })
    }
}

/// Shape the whole text into intrinsic and replacement runs.
///
/// Every paragraph from the bidi algorithm is split into logical level
/// runs, script runs and style runs; each resulting sub-range is shaped
/// with the resolved typeface and size. Paragraph break flags are stamped
/// into the break record along the way.
pub(crate) fn fill_runs(
    text: &str,
    chars: &[char],
    char_offsets: &[usize],
    spans: &SpanList,
    base_direction: BaseDirection,
    breaks: &mut [u8],
    paragraphs: &mut ParagraphCollection,
    runs: &mut RunCollection,
) -> Result<(), LayoutError> {
    let mut engine = ShapingEngine::new();

    for paragraph in bidi::analyze(text, char_offsets, base_direction) {
        let range = paragraph.char_range.clone();
        if !range.is_empty() {
            breaks[range.start] |= BreakType::Paragraph.flag(false);
            breaks[range.end - 1] |= BreakType::Paragraph.flag(true);
        }

        for bidi_run in paragraph.logical_runs() {
            for script_run in script::script_runs(chars, bidi_run.char_range.clone()) {
                engine.set_script(script_run.script);
                engine.set_direction(script::script_direction(script_run.script));

                resolve_typefaces(
                    text,
                    char_offsets,
                    spans,
                    &mut engine,
                    bidi_run.level,
                    script_run.char_range,
                    runs,
                )?;
            }
        }

        paragraphs.push(paragraph);
    }

    debug!(
        paragraphs = paragraphs.len(),
        runs = runs.len(),
        "resolved shaped runs"
    );

    Ok(())
}

fn resolve_typefaces(
    text: &str,
    char_offsets: &[usize],
    spans: &SpanList,
    engine: &mut ShapingEngine,
    bidi_level: u8,
    range: Range<usize>,
    runs: &mut RunCollection,
) -> Result<(), LayoutError> {
    for shaping_run in ShapingRunLocator::new(spans, range) {
        let style = shaping_run.style;
        let run_range = shaping_run.range;

        let typeface = style
            .typeface
            .clone()
            .ok_or_else(|| LayoutError::MissingTypeface(run_range.clone()))?;

        let text_run = if let Some(replacement) = style.replacement {
            let metrics = replacement.metrics(run_range.clone());

            TextRun::Replacement(Arc::new(ReplacementRun::new(
                run_range,
                bidi_level,
                typeface,
                style.type_size,
                metrics.ascent,
                metrics.descent,
                metrics.leading,
                metrics.extent,
                replacement,
            )))
        } else {
            engine.set_typeface(typeface.clone());
            engine.set_type_size(style.type_size);

            let byte_range = char_offsets[run_range.start]..char_offsets[run_range.end];
            let mut result = engine.shape(&text[byte_range]);

            // Horizontal scale multiplies x-offsets and advances; caret
            // edges follow from the scaled advances.
            if style.scale_x != 1.0 {
                for offset in &mut result.glyph_offsets {
                    offset.0 *= style.scale_x;
                }
                for advance in &mut result.glyph_advances {
                    *advance *= style.scale_x;
                }
            }

            // Baseline shift moves y-offsets only.
            if style.baseline_shift != 0.0 {
                for offset in &mut result.glyph_offsets {
                    offset.1 += style.baseline_shift;
                }
            }

            let scaled = typeface.scaled_metrics(style.type_size);

            TextRun::Intrinsic(Arc::new(IntrinsicRun::new(
                run_range,
                result.is_backward,
                bidi_level,
                engine.direction(),
                typeface,
                style.type_size,
                scaled.ascent,
                scaled.descent,
                scaled.leading,
                result.glyph_ids,
                result.glyph_offsets,
                result.glyph_advances,
                result.cluster_map,
            )))
        };

        runs.push(text_run);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::Typeface;
    use crate::style::{Replacement, ReplacementMetrics, SpanAttribute};
    use crate::unicode::breaks::fill_breaks;

    #[derive(Debug)]
    struct FixedBox(f32);

    impl Replacement for FixedBox {
        fn metrics(&self, _range: Range<usize>) -> ReplacementMetrics {
            ReplacementMetrics {
                ascent: 10.0,
                descent: 2.0,
                leading: 0.0,
                extent: self.0,
            }
        }
    }

    fn analyze(text: &str, spans: &SpanList) -> Result<(ParagraphCollection, RunCollection), LayoutError> {
        let chars: Vec<char> = text.chars().collect();
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        let mut breaks = vec![0u8; chars.len()];
        fill_breaks(text, &offsets, &mut breaks);

        let mut paragraphs = ParagraphCollection::new();
        let mut runs = RunCollection::new();
        fill_runs(
            text,
            &chars,
            &offsets,
            spans,
            BaseDirection::Auto,
            &mut breaks,
            &mut paragraphs,
            &mut runs,
        )?;
        Ok((paragraphs, runs))
    }

    #[test]
    fn missing_typeface_is_fatal() {
        let spans = SpanList::new();
        let result = analyze("abc", &spans);
        assert!(matches!(result, Err(LayoutError::MissingTypeface(_))));
    }

    #[test]
    fn replacement_spans_bypass_shaping() {
        let typeface = Arc::new(Typeface::stub(8.0, 2.0, 0.0));
        let mut spans = SpanList::with_defaults(typeface, 16.0);
        spans.add(0..3, SpanAttribute::Replacement(Arc::new(FixedBox(30.0))));

        let (paragraphs, runs) = analyze("abc", &spans).unwrap();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(runs.len(), 1);

        let run = runs.get(0);
        assert!(matches!(run, TextRun::Replacement(_)));
        assert_eq!(run.width(), 30.0);
        assert_eq!(run.char_range(), 0..3);
    }

    #[test]
    fn adjacent_replacement_ranges_with_distinct_objects_do_not_merge() {
        let typeface = Arc::new(Typeface::stub(8.0, 2.0, 0.0));
        let mut spans = SpanList::with_defaults(typeface, 16.0);
        spans.add(0..2, SpanAttribute::Replacement(Arc::new(FixedBox(10.0))));
        spans.add(2..4, SpanAttribute::Replacement(Arc::new(FixedBox(20.0))));

        let (_, runs) = analyze("abcd", &spans).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs.get(0).width(), 10.0);
        assert_eq!(runs.get(1).width(), 20.0);
    }

    #[test]
    fn shapes_real_text_when_a_system_font_exists() {
        let Ok(typeface) = crate::font::load_system_default_font() else {
            return;
        };

        let spans = SpanList::with_defaults(typeface, 16.0);
        let (paragraphs, runs) = analyze("Hello World", &spans).unwrap();

        assert_eq!(paragraphs.len(), 1);
        assert_eq!(runs.len(), 1);

        let run = runs.get(0);
        assert_eq!(run.char_range(), 0..11);
        assert!(run.width() > 0.0);
        assert!(!run.is_backward());

        // Caret edges are monotonically non-decreasing for an LTR run.
        let edges = run.caret_edges();
        for i in 1..edges.len() {
            assert!(edges.get(i) >= edges.get(i - 1));
        }
    }

    #[test]
    fn mixed_direction_text_produces_multiple_runs() {
        let Ok(typeface) = crate::font::load_system_default_font() else {
            return;
        };

        let spans = SpanList::with_defaults(typeface, 16.0);
        let (_, runs) = analyze("abc אבג", &spans).unwrap();

        // At least an LTR and an RTL run.
        assert!(runs.len() >= 2);
        assert!(!runs.get(0).is_rtl());
        assert!(runs.runs().iter().any(|run| run.is_rtl()));

        // Runs cover the text contiguously.
        assert_eq!(runs.get(0).char_start(), 0);
        assert_eq!(runs.runs().last().unwrap().char_end(), 7);
        for pair in runs.runs().windows(2) {
            assert_eq!(pair[0].char_end(), pair[1].char_start());
        }
    }

    #[test]
    fn scale_x_multiplies_advances() {
        let Ok(typeface) = crate::font::load_system_default_font() else {
            return;
        };

        let plain = SpanList::with_defaults(typeface.clone(), 16.0);
        let (_, plain_runs) = analyze("scale", &plain).unwrap();

        let mut scaled = SpanList::with_defaults(typeface, 16.0);
        scaled.add(0..5, SpanAttribute::ScaleX(2.0));
        let (_, scaled_runs) = analyze("scale", &scaled).unwrap();

        let plain_width = plain_runs.get(0).width();
        let scaled_width = scaled_runs.get(0).width();
        assert!((scaled_width - plain_width * 2.0).abs() < 1e-3);
    }
}

use core::ops::Range;
use std::sync::Arc;

use tracing::trace;

use crate::layout::break_resolver::{self, BreakMode};
use crate::layout::collection::{ParagraphCollection, RunCollection};
use crate::layout::composed_line::{ComposedLine, GlyphRun};
use crate::layout::run::{JustifiedRun, RunSlice, TextRun};
use crate::style::SpanList;
use crate::unicode::bidi::BidiRun;
use crate::unicode::whitespace::{leading_whitespace_end, next_space, trailing_whitespace_start};

/// Where the truncation token is placed within a truncated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationPlace {
    Start,
    Middle,
    End,
}

fn create_glyph_run(text_run: &TextRun, span_start: usize, span_end: usize, spans: &SpanList) -> GlyphRun {
    let inner = match text_run {
        TextRun::Intrinsic(run) => TextRun::Slice(RunSlice::new(
            run.clone(),
            span_start,
            span_end,
            spans.spans_in(span_start..span_end),
        )),
        other => other.clone(),
    };

    GlyphRun::new(inner)
}

fn create_composed_line(
    chars: &[char],
    char_range: Range<usize>,
    mut run_list: Vec<GlyphRun>,
    paragraph_level: u8,
) -> ComposedLine {
    let mut line_ascent = 0.0f32;
    let mut line_descent = 0.0f32;
    let mut line_leading = 0.0f32;
    let mut line_extent = 0.0f32;

    let trailing_whitespace_start =
        trailing_whitespace_start(chars, char_range.start, char_range.end);
    let mut trailing_whitespace_extent = 0.0f32;

    for glyph_run in &mut run_list {
        glyph_run.set_origin_x(line_extent);

        let ws_start = glyph_run.char_start().max(trailing_whitespace_start);
        let ws_end = glyph_run.char_end().min(char_range.end);
        if ws_start < ws_end {
            trailing_whitespace_extent += glyph_run.range_distance(ws_start, ws_end);
        }

        line_ascent = line_ascent.max(glyph_run.ascent());
        line_descent = line_descent.max(glyph_run.descent());
        line_leading = line_leading.max(glyph_run.leading());
        line_extent += glyph_run.width();
    }

    ComposedLine::new(
        char_range,
        paragraph_level,
        line_ascent,
        line_descent,
        line_leading,
        line_extent,
        trailing_whitespace_extent,
        run_list,
    )
}

/// Assembles visually ordered lines from paragraph and run collections.
pub(crate) struct LineResolver<'a> {
    chars: &'a [char],
    spans: &'a SpanList,
    paragraphs: &'a ParagraphCollection,
    runs: &'a RunCollection,
}

impl<'a> LineResolver<'a> {
    pub fn new(
        chars: &'a [char],
        spans: &'a SpanList,
        paragraphs: &'a ParagraphCollection,
        runs: &'a RunCollection,
    ) -> Self {
        Self {
            chars,
            spans,
            paragraphs,
            runs,
        }
    }

    pub fn create_simple_line(&self, start: usize, end: usize) -> ComposedLine {
        let mut run_list = Vec::new();

        self.paragraphs.for_each_line_run(start..end, self.chars, |bidi_run| {
            self.add_visual_runs(bidi_run.char_range.clone(), &mut run_list);
        });

        create_composed_line(
            self.chars,
            start..end,
            run_list,
            self.paragraphs.char_level(start),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_compact_line(
        &self,
        start: usize,
        end: usize,
        extent: f32,
        breaks: &[u8],
        mode: BreakMode,
        place: TruncationPlace,
        token: &ComposedLine,
    ) -> ComposedLine {
        let tokenless_width = extent - token.width();

        match place {
            TruncationPlace::Start => {
                self.create_start_truncated_line(start, end, tokenless_width, breaks, mode, token)
            }
            TruncationPlace::Middle => {
                self.create_middle_truncated_line(start, end, tokenless_width, breaks, mode, token)
            }
            TruncationPlace::End => {
                self.create_end_truncated_line(start, end, tokenless_width, breaks, mode, token)
            }
        }
    }

    fn create_start_truncated_line(
        &self,
        start: usize,
        end: usize,
        tokenless_width: f32,
        breaks: &[u8],
        mode: BreakMode,
        token: &ComposedLine,
    ) -> ComposedLine {
        let truncated_start = break_resolver::suggest_backward_break(
            self.chars,
            self.runs,
            breaks,
            start,
            end,
            tokenless_width,
            mode,
        );

        if truncated_start > start {
            let mut run_list = Vec::new();
            let mut token_insert_index = 0;

            if truncated_start < end {
                let mut handler = TruncationHandler::new(start, truncated_start, &mut run_list);
                self.run_truncation_handler(&mut handler, start, end);
                token_insert_index = handler.trailing_token_index.unwrap_or(0);
            }
            add_token_runs(token, &mut run_list, token_insert_index);

            return create_composed_line(
                self.chars,
                truncated_start..end,
                run_list,
                self.paragraphs.char_level(truncated_start),
            );
        }

        self.create_simple_line(truncated_start, end)
    }

    fn create_middle_truncated_line(
        &self,
        start: usize,
        end: usize,
        tokenless_width: f32,
        breaks: &[u8],
        mode: BreakMode,
        token: &ComposedLine,
    ) -> ComposedLine {
        let half_width = tokenless_width / 2.0;
        let mut first_mid_end = break_resolver::suggest_forward_break(
            self.chars,
            self.runs,
            breaks,
            start,
            end,
            half_width,
            mode,
        );
        let mut second_mid_start = break_resolver::suggest_backward_break(
            self.chars,
            self.runs,
            breaks,
            start,
            end,
            half_width,
            mode,
        );

        if first_mid_end < second_mid_start {
            // Exclude inner whitespace as the truncation token replaces it.
            first_mid_end = trailing_whitespace_start(self.chars, start, first_mid_end);
            second_mid_start = leading_whitespace_end(self.chars, second_mid_start, end);

            let mut run_list = Vec::new();
            let mut token_insert_index = 0;

            if start < first_mid_end || second_mid_start < end {
                let mut handler =
                    TruncationHandler::new(first_mid_end, second_mid_start, &mut run_list);
                self.run_truncation_handler(&mut handler, start, end);
                token_insert_index = handler.leading_token_index.unwrap_or(0);
            }
            add_token_runs(token, &mut run_list, token_insert_index);

            return create_composed_line(
                self.chars,
                start..end,
                run_list,
                self.paragraphs.char_level(start),
            );
        }

        self.create_simple_line(start, end)
    }

    fn create_end_truncated_line(
        &self,
        start: usize,
        end: usize,
        tokenless_width: f32,
        breaks: &[u8],
        mode: BreakMode,
        token: &ComposedLine,
    ) -> ComposedLine {
        let mut truncated_end = break_resolver::suggest_forward_break(
            self.chars,
            self.runs,
            breaks,
            start,
            end,
            tokenless_width,
            mode,
        );

        if truncated_end < end {
            // Exclude trailing whitespace as the truncation token replaces it.
            truncated_end = trailing_whitespace_start(self.chars, start, truncated_end);

            let mut run_list = Vec::new();
            let mut token_insert_index = 0;

            if start < truncated_end {
                let mut handler = TruncationHandler::new(truncated_end, end, &mut run_list);
                self.run_truncation_handler(&mut handler, start, end);
                token_insert_index = handler.leading_token_index.unwrap_or(0);
            }
            add_token_runs(token, &mut run_list, token_insert_index);

            return create_composed_line(
                self.chars,
                start..truncated_end,
                run_list,
                self.paragraphs.char_level(start),
            );
        }

        self.create_simple_line(start, truncated_end)
    }

    fn run_truncation_handler(
        &self,
        handler: &mut TruncationHandler<'_>,
        char_start: usize,
        char_end: usize,
    ) {
        self.paragraphs
            .for_each_line_run(char_start..char_end, self.chars, |bidi_run| {
                handler.accept(self, bidi_run);
            });
    }

    fn add_visual_runs(&self, visual_range: Range<usize>, run_list: &mut Vec<GlyphRun>) {
        let mut visual_start = visual_range.start;
        let visual_end = visual_range.end;

        if visual_start < visual_end {
            // A visual range may fall in one or more intrinsic runs, and
            // consecutive intrinsic runs may share a bidi level.
            let mut insert_index = run_list.len();
            let mut previous_level: Option<u8> = None;

            loop {
                let run_index = self
                    .runs
                    .binary_search(visual_start)
                    .expect("visual range must fall within shaped runs");

                let text_run = self.runs.get(run_index);
                let feasible_start = text_run.char_start().max(visual_start);
                let feasible_end = text_run.char_end().min(visual_end);

                let bidi_level = text_run.bidi_level();
                let is_forward_run = bidi_level & 1 == 0;

                if let Some(previous) = previous_level {
                    if bidi_level != previous || is_forward_run {
                        insert_index = run_list.len();
                    }
                }

                let mut span_start = feasible_start;
                while span_start < feasible_end {
                    let span_end = self.spans.next_span_transition(span_start, feasible_end);

                    let glyph_run = create_glyph_run(text_run, span_start, span_end, self.spans);
                    run_list.insert(insert_index, glyph_run);

                    if is_forward_run {
                        insert_index += 1;
                    }

                    span_start = span_end;
                }

                previous_level = Some(bidi_level);
                visual_start = feasible_end;

                if visual_start == visual_end {
                    break;
                }
            }
        }
    }

    pub fn create_justified_line(
        &self,
        char_start: usize,
        char_end: usize,
        justification_factor: f32,
        justification_width: f32,
    ) -> ComposedLine {
        let word_start = leading_whitespace_end(self.chars, char_start, char_end);
        let word_end = trailing_whitespace_start(self.chars, char_start, char_end);

        let actual_width = self.runs.measure_chars(char_start, char_end);
        let extra_width = justification_width - actual_width;
        let available_width = extra_width * justification_factor;

        let inner_space_count = self.compute_space_count(word_start, word_end);
        if inner_space_count == 0 || available_width <= 0.0 {
            // Nothing to distribute over, or the line already fills the
            // justification width.
            return self.create_simple_line(char_start, char_end);
        }
        let space_addition = available_width / inner_space_count as f32;

        trace!(
            char_start,
            char_end,
            inner_space_count,
            available_width,
            "justifying line"
        );

        let mut run_list = Vec::new();
        self.paragraphs
            .for_each_line_run(char_start..char_end, self.chars, |bidi_run| {
                self.add_visual_runs(bidi_run.char_range.clone(), &mut run_list);
            });

        for glyph_run in &mut run_list {
            let text_run = glyph_run.text_run().clone();
            if text_run.replacement().is_some() {
                // Replacement advances are externally fixed.
                continue;
            }

            let mut glyph_advances = text_run.glyph_advances().to_vec();

            let run_start = word_start.max(text_run.char_start());
            let run_end = word_end.min(text_run.char_end());

            let mut index = run_start;
            while index < run_end {
                let space_start = next_space(self.chars, index, run_end);
                let space_end = leading_whitespace_end(self.chars, space_start, run_end);

                index = space_end;

                if space_start == space_end {
                    continue;
                }

                let glyph_range = text_run.glyph_range_for_chars(space_start, space_end);
                let glyph_count = glyph_range.len();
                let space_count = space_end - space_start;

                // Convert the per-space addition into a per-glyph addition
                // across the glyphs spanning this whitespace stretch.
                let distribution = space_count as f32 / glyph_count as f32;
                let advance_addition = space_addition * distribution;

                for advance in &mut glyph_advances[glyph_range] {
                    *advance += advance_addition;
                }
            }

            let justified = JustifiedRun::new(text_run, glyph_advances);
            glyph_run.replace_text_run(TextRun::Justified(Arc::new(justified)));
        }

        let paragraph_level = self.paragraphs.char_level(char_start);

        create_composed_line(self.chars, char_start..char_end, run_list, paragraph_level)
    }

    fn compute_space_count(&self, start_index: usize, end_index: usize) -> usize {
        let mut space_count = 0;

        let mut index = start_index;
        while index < end_index {
            let space_start = next_space(self.chars, index, end_index);
            let space_end = leading_whitespace_end(self.chars, space_start, end_index);

            space_count += space_end - space_start;
            index = space_end + 1;
        }

        space_count
    }
}

/// Collects a truncated line's surviving visual runs and remembers where
/// the excised range fell so token runs can be inserted there.
struct TruncationHandler<'a> {
    skip_start: usize,
    skip_end: usize,
    run_list: &'a mut Vec<GlyphRun>,
    leading_token_index: Option<usize>,
    trailing_token_index: Option<usize>,
}

impl<'a> TruncationHandler<'a> {
    fn new(skip_start: usize, skip_end: usize, run_list: &'a mut Vec<GlyphRun>) -> Self {
        Self {
            skip_start,
            skip_end,
            run_list,
            leading_token_index: None,
            trailing_token_index: None,
        }
    }

    fn accept(&mut self, resolver: &LineResolver<'_>, bidi_run: &BidiRun) {
        let visual_start = bidi_run.char_range.start;
        let visual_end = bidi_run.char_range.end;

        if bidi_run.is_rtl() {
            // Handle second part of characters.
            if visual_end >= self.skip_end {
                resolver.add_visual_runs(
                    visual_start.max(self.skip_end)..visual_end,
                    self.run_list,
                );

                if visual_start < self.skip_end {
                    self.trailing_token_index = Some(self.run_list.len());
                }
            }

            // Handle first part of characters.
            if visual_start <= self.skip_start {
                if visual_end > self.skip_start {
                    self.leading_token_index = Some(self.run_list.len());
                }

                resolver.add_visual_runs(
                    visual_start..visual_end.min(self.skip_start),
                    self.run_list,
                );
            }
        } else {
            // Handle first part of characters.
            if visual_start <= self.skip_start {
                resolver.add_visual_runs(
                    visual_start..visual_end.min(self.skip_start),
                    self.run_list,
                );

                if visual_end > self.skip_start {
                    self.leading_token_index = Some(self.run_list.len());
                }
            }

            // Handle second part of characters.
            if visual_end >= self.skip_end {
                if visual_start < self.skip_end {
                    self.trailing_token_index = Some(self.run_list.len());
                }

                resolver.add_visual_runs(
                    visual_start.max(self.skip_end)..visual_end,
                    self.run_list,
                );
            }
        }
    }
}

fn add_token_runs(token: &ComposedLine, run_list: &mut Vec<GlyphRun>, index: usize) {
    let mut insert_index = index;

    for truncation_run in token.runs() {
        run_list.insert(insert_index, truncation_run.clone());
        insert_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::run::tests::{intrinsic_ltr, intrinsic_rtl};
    use crate::unicode::bidi::{self, BaseDirection};
    use crate::unicode::breaks::{BreakType, fill_breaks};

    struct Fixture {
        chars: Vec<char>,
        spans: SpanList,
        paragraphs: ParagraphCollection,
        runs: RunCollection,
        breaks: Vec<u8>,
    }

    impl Fixture {
        /// Shape-free layout state: every char is its own 10-unit cluster,
        /// split into runs at bidi level boundaries.
        fn new(text: &str) -> Self {
            let chars: Vec<char> = text.chars().collect();
            let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
            offsets.push(text.len());

            let mut breaks = vec![0u8; chars.len()];
            fill_breaks(text, &offsets, &mut breaks);

            let mut paragraphs = ParagraphCollection::new();
            let mut runs = RunCollection::new();

            for paragraph in bidi::analyze(text, &offsets, BaseDirection::Auto) {
                let range = paragraph.char_range.clone();
                breaks[range.start] |= BreakType::Paragraph.flag(false);
                breaks[range.end - 1] |= BreakType::Paragraph.flag(true);

                for bidi_run in paragraph.logical_runs() {
                    let len = bidi_run.char_range.len();
                    let advances = vec![10.0; len];
                    let run = if bidi_run.is_rtl() {
                        intrinsic_rtl(
                            bidi_run.char_range.clone(),
                            advances,
                            (0..len).rev().collect(),
                        )
                    } else {
                        intrinsic_ltr(bidi_run.char_range.clone(), advances, (0..len).collect())
                    };
                    runs.push(TextRun::Intrinsic(run));
                }
                paragraphs.push(paragraph);
            }

            Self {
                chars,
                spans: SpanList::new(),
                paragraphs,
                runs,
                breaks,
            }
        }

        fn resolver(&self) -> LineResolver<'_> {
            LineResolver::new(&self.chars, &self.spans, &self.paragraphs, &self.runs)
        }

        /// A one-run token line of the given width.
        fn token(&self, width: f32) -> ComposedLine {
            let run = intrinsic_ltr(0..1, vec![width], vec![0]);
            let glyph_run = GlyphRun::new(TextRun::Slice(RunSlice::new(run, 0, 1, Vec::new())));
            create_composed_line(&['\u{2026}'], 0..1, vec![glyph_run], 0)
        }
    }

    #[test]
    fn simple_line_composes_metrics_and_width() {
        let fixture = Fixture::new("one two");
        let line = fixture.resolver().create_simple_line(0, 7);

        assert_eq!(line.char_range(), 0..7);
        assert_eq!(line.width(), 70.0);
        assert_eq!(line.ascent(), 8.0);
        assert_eq!(line.descent(), 2.0);
        assert_eq!(line.runs().len(), 1);
        assert_eq!(line.trailing_whitespace_extent(), 0.0);
    }

    #[test]
    fn trailing_whitespace_extent_is_tracked() {
        let fixture = Fixture::new("one  ");
        let line = fixture.resolver().create_simple_line(0, 5);

        assert_eq!(line.width(), 50.0);
        assert_eq!(line.trailing_whitespace_extent(), 20.0);
    }

    #[test]
    fn mixed_direction_line_orders_runs_visually() {
        let fixture = Fixture::new("ab אבג cd");
        let line = fixture.resolver().create_simple_line(0, 9);

        assert_eq!(line.width(), 90.0);
        let runs = line.runs();
        assert!(runs.len() >= 3);

        // Visual order: leading LTR part first, trailing LTR part last.
        assert_eq!(runs[0].char_start(), 0);
        assert_eq!(runs[runs.len() - 1].char_end(), 9);

        // Origins accumulate left to right without gaps.
        let mut extent = 0.0;
        for run in runs {
            assert!((run.origin_x() - extent).abs() < 1e-4);
            extent += run.width();
        }
    }

    #[test]
    fn char_distance_walks_visual_runs() {
        let fixture = Fixture::new("one two");
        let line = fixture.resolver().create_simple_line(0, 7);

        assert_eq!(line.compute_char_distance(0), 0.0);
        assert_eq!(line.compute_char_distance(3), 30.0);
        assert_eq!(line.compute_char_distance(7), 70.0);

        let edges = line.compute_visual_edges(1, 3);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0], (10.0, 30.0));
    }

    #[test]
    fn end_truncated_line_inserts_token_after_kept_text() {
        let fixture = Fixture::new("one two three");
        let token = fixture.token(10.0);

        // 90 units: token takes 10, "one two " fits in the remaining 80;
        // trailing whitespace before the token is excised.
        let line = fixture.resolver().create_compact_line(
            0,
            13,
            90.0,
            &fixture.breaks,
            BreakMode::Line,
            TruncationPlace::End,
            &token,
        );

        assert_eq!(line.char_range(), 0..7);
        assert_eq!(line.width(), 80.0);
        assert!(line.width() <= 90.0);

        // Token runs sit at the end of the visual list.
        let token_run = line.runs().last().unwrap();
        assert_eq!(token_run.width(), 10.0);
    }

    #[test]
    fn start_truncated_line_inserts_token_before_kept_text() {
        let fixture = Fixture::new("one two three");
        let token = fixture.token(10.0);

        let line = fixture.resolver().create_compact_line(
            0,
            13,
            60.0,
            &fixture.breaks,
            BreakMode::Line,
            TruncationPlace::Start,
            &token,
        );

        // 50 units of text survive at the end, the token leads the line.
        assert_eq!(line.char_range(), 8..13);
        assert_eq!(line.runs().first().unwrap().width(), 10.0);
        assert_eq!(line.width(), 60.0);
    }

    #[test]
    fn middle_truncated_line_keeps_both_edges() {
        let fixture = Fixture::new("one two three");
        let token = fixture.token(10.0);

        let line = fixture.resolver().create_compact_line(
            0,
            13,
            90.0,
            &fixture.breaks,
            BreakMode::Character,
            TruncationPlace::Middle,
            &token,
        );

        assert_eq!(line.char_range(), 0..13);
        assert!(line.width() <= 90.0);

        // The token sits strictly between surviving leading and trailing
        // text.
        let widths: Vec<f32> = line.runs().iter().map(|r| r.width()).collect();
        let token_position = widths.iter().position(|w| *w == 10.0).unwrap();
        assert!(token_position > 0);
        assert!(token_position < widths.len() - 1);
    }

    #[test]
    fn untruncated_text_composes_simple_line() {
        let fixture = Fixture::new("one");
        let token = fixture.token(10.0);

        let line = fixture.resolver().create_compact_line(
            0,
            3,
            100.0,
            &fixture.breaks,
            BreakMode::Line,
            TruncationPlace::End,
            &token,
        );

        assert_eq!(line.char_range(), 0..3);
        assert_eq!(line.width(), 30.0);
    }

    #[test]
    fn justification_distributes_available_width() {
        let fixture = Fixture::new("one two three");
        let natural = fixture.resolver().create_simple_line(0, 13).width();

        let target = 170.0;
        let line = fixture.resolver().create_justified_line(0, 13, 1.0, target);
        assert!((line.width() - target).abs() < 1e-3);
        assert!(line.width() >= natural);
    }

    #[test]
    fn justification_factor_scales_distribution() {
        let fixture = Fixture::new("one two three");
        let natural = 130.0;
        let target = 170.0;

        let line = fixture.resolver().create_justified_line(0, 13, 0.5, target);
        let expected = natural + (target - natural) * 0.5;
        assert!((line.width() - expected).abs() < 1e-3);
    }

    #[test]
    fn justification_without_interior_whitespace_is_skipped() {
        let fixture = Fixture::new("word");
        let line = fixture.resolver().create_justified_line(0, 4, 1.0, 100.0);
        assert_eq!(line.width(), 40.0);
    }

    #[test]
    fn justification_never_shrinks_below_natural_width() {
        let fixture = Fixture::new("one two");
        // Target narrower than the natural width: distribution is skipped.
        let line = fixture.resolver().create_justified_line(0, 7, 1.0, 50.0);
        assert_eq!(line.width(), 70.0);
    }
}

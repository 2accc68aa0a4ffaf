use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::LayoutError;
use crate::layout::break_resolver::BreakMode;
use crate::layout::composed_line::ComposedLine;
use crate::layout::line_resolver::TruncationPlace;
use crate::layout::typesetter::Typesetter;

/// Cooperative cancellation flag for long-running layout passes.
///
/// Checked between discrete units of work (one line at a time); a
/// cancelled pass aborts with [`LayoutError::Cancelled`] and publishes no
/// partial results.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Horizontal placement of lines within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlignment {
    /// Flush with the paragraph's natural edge (left for LTR, right for
    /// RTL).
    #[default]
    Natural,
    Left,
    Center,
    Right,
}

impl TextAlignment {
    fn flush_factor(self, paragraph_level: u8) -> f32 {
        match self {
            TextAlignment::Left => 0.0,
            TextAlignment::Center => 0.5,
            TextAlignment::Right => 1.0,
            TextAlignment::Natural => {
                if paragraph_level & 1 == 1 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// A frame of positioned lines produced by [`FrameResolver`].
#[derive(Debug)]
pub struct ComposedFrame {
    char_start: usize,
    char_end: usize,
    width: f32,
    height: f32,
    lines: Vec<ComposedLine>,
}

impl ComposedFrame {
    pub fn char_start(&self) -> usize {
        self.char_start
    }

    /// End of the text actually laid out; less than the requested end when
    /// the frame ran out of vertical room.
    pub fn char_end(&self) -> usize {
        self.char_end
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn lines(&self) -> &[ComposedLine] {
        &self.lines
    }
}

/// Fills a width/height box with lines, one break suggestion at a time.
#[derive(Debug)]
pub struct FrameResolver<'a> {
    typesetter: &'a Typesetter,
    pub frame_width: f32,
    pub frame_height: f32,
    pub alignment: TextAlignment,
    pub break_mode: BreakMode,
    /// Extra space added below every line.
    pub extra_line_spacing: f32,
    /// When set, interior whitespace of every non-paragraph-final line is
    /// widened to fill the frame width, scaled by this factor.
    pub justification_factor: Option<f32>,
    /// When set, the last line that fits receives this truncation if text
    /// remains beyond it.
    pub truncation_place: Option<TruncationPlace>,
    pub cancellation: Option<CancellationToken>,
}

impl<'a> FrameResolver<'a> {
    pub fn new(typesetter: &'a Typesetter, frame_width: f32) -> Self {
        Self {
            typesetter,
            frame_width,
            frame_height: f32::INFINITY,
            alignment: TextAlignment::default(),
            break_mode: BreakMode::Line,
            extra_line_spacing: 0.0,
            justification_factor: None,
            truncation_place: None,
            cancellation: None,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn place_line(&self, line: &mut ComposedLine, y: f32) {
        let flush = self.alignment.flush_factor(line.paragraph_level());
        let visible_width = line.width() - line.trailing_whitespace_extent();
        let origin_x = (self.frame_width - visible_width) * flush;
        line.set_origin(origin_x, y + line.ascent());
    }

    /// Lay the character range out into the frame.
    pub fn create_frame(
        &self,
        char_start: usize,
        char_end: usize,
    ) -> Result<ComposedFrame, LayoutError> {
        let mut lines: Vec<ComposedLine> = Vec::new();
        let mut line_start = char_start;
        let mut y = 0.0f32;
        let mut out_of_room = false;

        while line_start < char_end {
            if self.is_cancelled() {
                return Err(LayoutError::Cancelled);
            }

            let line_end = self.typesetter.suggest_forward_break(
                line_start,
                char_end,
                self.frame_width,
                self.break_mode,
            )?;

            let justify = self
                .justification_factor
                .filter(|_| !self.typesetter.ends_paragraph(line_end));
            let mut line = match justify {
                Some(factor) => self.typesetter.create_justified_line(
                    line_start,
                    line_end,
                    factor,
                    self.frame_width,
                )?,
                None => self.typesetter.create_simple_line(line_start, line_end)?,
            };

            if y + line.height() > self.frame_height {
                out_of_room = true;
                break;
            }

            self.place_line(&mut line, y);
            y += line.height() + self.extra_line_spacing;

            line_start = line_end;
            lines.push(line);
        }

        // Re-compose the last visible line with a truncation token when
        // text remains below the frame.
        if out_of_room && !lines.is_empty() {
            if let Some(place) = self.truncation_place {
                let last = lines.pop().expect("frame has a last line");
                let last_start = last.char_start();
                let last_top = last.origin_y() - last.ascent();

                let mut truncated = self.typesetter.create_truncated_line(
                    last_start,
                    char_end,
                    self.frame_width,
                    self.break_mode,
                    place,
                    None,
                )?;
                self.place_line(&mut truncated, last_top);
                lines.push(truncated);
            }
        }

        let char_end = lines.last().map_or(char_start, ComposedLine::char_end);

        debug!(
            lines = lines.len(),
            height = y,
            truncated = out_of_room,
            "composed frame"
        );

        Ok(ComposedFrame {
            char_start,
            char_end,
            width: self.frame_width,
            height: y,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::load_system_default_font;

    fn typesetter(text: &str) -> Option<Typesetter> {
        let typeface = load_system_default_font().ok()?;
        Typesetter::with_typeface(text, typeface, 16.0).ok()
    }

    #[test]
    fn wraps_text_into_multiple_lines() {
        let Some(typesetter) = typesetter("alpha beta gamma delta epsilon zeta") else {
            return;
        };

        let resolver = FrameResolver::new(&typesetter, 100.0);
        let frame = resolver.create_frame(0, typesetter.char_count()).unwrap();

        assert!(frame.lines().len() > 1);
        assert_eq!(frame.char_end(), typesetter.char_count());
        assert!(frame.height() > 0.0);

        // Lines tile the range contiguously, top to bottom.
        for pair in frame.lines().windows(2) {
            assert_eq!(pair[0].char_end(), pair[1].char_start());
            assert!(pair[1].origin_y() > pair[0].origin_y());
        }
    }

    #[test]
    fn mandatory_breaks_produce_separate_lines() {
        let Some(typesetter) = typesetter("one\ntwo") else {
            return;
        };

        let resolver = FrameResolver::new(&typesetter, 1.0e6);
        let frame = resolver.create_frame(0, 7).unwrap();
        assert_eq!(frame.lines().len(), 2);
        assert_eq!(frame.lines()[0].char_range(), 0..4);
        assert_eq!(frame.lines()[1].char_range(), 4..7);
    }

    #[test]
    fn cancelled_pass_publishes_nothing() {
        let Some(typesetter) = typesetter("some text to lay out") else {
            return;
        };

        let token = CancellationToken::new();
        token.cancel();

        let mut resolver = FrameResolver::new(&typesetter, 100.0);
        resolver.cancellation = Some(token);

        assert!(matches!(
            resolver.create_frame(0, typesetter.char_count()),
            Err(LayoutError::Cancelled)
        ));
    }

    #[test]
    fn height_limit_truncates_remaining_text() {
        let Some(typesetter) = typesetter("alpha beta gamma delta epsilon zeta eta theta") else {
            return;
        };

        let line_height = typesetter.create_simple_line(0, 5).unwrap().height();

        let mut resolver = FrameResolver::new(&typesetter, 120.0);
        resolver.frame_height = line_height * 2.5;
        resolver.truncation_place = Some(TruncationPlace::End);

        let frame = resolver.create_frame(0, typesetter.char_count()).unwrap();
        assert_eq!(frame.lines().len(), 2);
        assert!(frame.char_end() < typesetter.char_count());
        assert!(frame.lines().last().unwrap().width() <= 120.0);
    }

    #[test]
    fn center_alignment_offsets_origins() {
        let Some(typesetter) = typesetter("hi") else {
            return;
        };

        let mut resolver = FrameResolver::new(&typesetter, 400.0);
        resolver.alignment = TextAlignment::Center;

        let frame = resolver.create_frame(0, 2).unwrap();
        let line = &frame.lines()[0];
        let expected = (400.0 - line.width()) / 2.0;
        assert!((line.origin_x() - expected).abs() < 1e-3);
    }

    #[test]
    fn justified_frame_fills_line_width() {
        let Some(typesetter) = typesetter("words that should spread out nicely across lines") else {
            return;
        };

        let mut resolver = FrameResolver::new(&typesetter, 160.0);
        resolver.justification_factor = Some(1.0);

        let frame = resolver.create_frame(0, typesetter.char_count()).unwrap();
        assert!(frame.lines().len() > 1);

        // Every line but the paragraph-final one approaches the frame
        // width once trailing whitespace is discounted.
        for line in &frame.lines()[..frame.lines().len() - 1] {
            let visible = line.width() - line.trailing_whitespace_extent();
            assert!(visible <= 160.0 + 0.1);
        }
    }
}

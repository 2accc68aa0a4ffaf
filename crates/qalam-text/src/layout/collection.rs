use core::ops::Range;

use crate::layout::run::TextRun;
use crate::unicode::bidi::{BidiParagraph, BidiRun};

/// Ordered, binary-searchable list of shaped runs keyed by character index.
///
/// Runs are pushed in logical order during shaping and cover the text
/// contiguously without overlap.
#[derive(Debug, Default)]
pub struct RunCollection {
    runs: Vec<TextRun>,
}

impl RunCollection {
    pub fn new() -> Self {
        Self { runs: Vec::new() }
    }

    pub fn push(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn get(&self, index: usize) -> &TextRun {
        &self.runs[index]
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Index of the run containing `char_index`.
    pub fn binary_search(&self, char_index: usize) -> Option<usize> {
        let mut low = 0isize;
        let mut high = self.runs.len() as isize - 1;

        while low <= high {
            let mid = ((low + high) >> 1) as usize;
            let run = &self.runs[mid];

            if char_index >= run.char_end() {
                low = mid as isize + 1;
            } else if char_index < run.char_start() {
                high = mid as isize - 1;
            } else {
                return Some(mid);
            }
        }

        None
    }

    /// Measured width of the character range `[char_start, char_end)`,
    /// summed across all runs it intersects.
    pub fn measure_chars(&self, char_start: usize, char_end: usize) -> f32 {
        let mut start = char_start;
        let mut extent = 0.0;

        if char_end > start {
            let mut run_index = self
                .binary_search(start)
                .expect("char index must fall within a shaped run");

            loop {
                let run = &self.runs[run_index];
                let segment_end = char_end.min(run.char_end());
                extent += run.range_distance(start, segment_end);

                start = segment_end;
                run_index += 1;

                if start >= char_end {
                    break;
                }
            }
        }

        extent
    }
}

/// Ordered, binary-searchable list of bidi paragraphs.
#[derive(Debug, Default)]
pub struct ParagraphCollection {
    paragraphs: Vec<BidiParagraph>,
}

impl ParagraphCollection {
    pub fn new() -> Self {
        Self {
            paragraphs: Vec::new(),
        }
    }

    pub fn push(&mut self, paragraph: BidiParagraph) {
        self.paragraphs.push(paragraph);
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn paragraphs(&self) -> &[BidiParagraph] {
        &self.paragraphs
    }

    /// Index of the paragraph containing `char_index`.
    pub fn binary_search(&self, char_index: usize) -> Option<usize> {
        let mut low = 0isize;
        let mut high = self.paragraphs.len() as isize - 1;

        while low <= high {
            let mid = ((low + high) >> 1) as usize;
            let paragraph = &self.paragraphs[mid];

            if char_index >= paragraph.char_range.end {
                low = mid as isize + 1;
            } else if char_index < paragraph.char_range.start {
                high = mid as isize - 1;
            } else {
                return Some(mid);
            }
        }

        None
    }

    /// Base embedding level of the paragraph containing `char_index`.
    pub fn char_level(&self, char_index: usize) -> u8 {
        let index = self
            .binary_search(char_index)
            .expect("char index must fall within a paragraph");
        self.paragraphs[index].base_level
    }

    /// Invoke `consumer` for every visual run of the line `[start, end)`.
    ///
    /// Runs arrive in left-to-right visual order. When the line spans
    /// multiple paragraphs and the first paragraph is right-to-left, the
    /// paragraphs themselves are visited right to left.
    pub fn for_each_line_run<F>(&self, line_range: Range<usize>, chars: &[char], mut consumer: F)
    where
        F: FnMut(&BidiRun),
    {
        let mut index = self
            .binary_search(line_range.start)
            .expect("line start must fall within a paragraph");
        let directional = &self.paragraphs[index];
        let is_rtl = directional.is_rtl();

        if is_rtl && directional.char_range.end < line_range.end {
            index = self
                .binary_search(line_range.end - 1)
                .expect("line end must fall within a paragraph");
        }

        loop {
            let paragraph = &self.paragraphs[index];
            let feasible_start = paragraph.char_range.start.max(line_range.start);
            let feasible_end = paragraph.char_range.end.min(line_range.end);

            for run in paragraph.visual_runs(feasible_start..feasible_end, chars) {
                consumer(&run);
            }

            let covered = if is_rtl {
                feasible_start == line_range.start
            } else {
                feasible_end == line_range.end
            };
            if covered {
                break;
            }

            if is_rtl {
                index -= 1;
            } else {
                index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::run::tests::{intrinsic_ltr, intrinsic_rtl};
    use crate::unicode::bidi::{self, BaseDirection};

    fn collection() -> RunCollection {
        let mut runs = RunCollection::new();
        runs.push(TextRun::Intrinsic(intrinsic_ltr(
            0..3,
            vec![5.0, 5.0, 5.0],
            vec![0, 1, 2],
        )));
        runs.push(TextRun::Intrinsic(intrinsic_rtl(
            3..6,
            vec![4.0, 4.0, 4.0],
            (0..3).rev().collect(),
        )));
        runs.push(TextRun::Intrinsic(intrinsic_ltr(
            6..9,
            vec![6.0, 6.0, 6.0],
            vec![0, 1, 2],
        )));
        runs
    }

    #[test]
    fn binary_search_locates_runs() {
        let runs = collection();
        assert_eq!(runs.binary_search(0), Some(0));
        assert_eq!(runs.binary_search(4), Some(1));
        assert_eq!(runs.binary_search(8), Some(2));
        assert_eq!(runs.binary_search(9), None);
    }

    #[test]
    fn measure_chars_spans_runs() {
        let runs = collection();
        assert_eq!(runs.measure_chars(0, 3), 15.0);
        assert_eq!(runs.measure_chars(0, 9), 45.0);
        assert_eq!(runs.measure_chars(2, 4), 9.0);
        assert_eq!(runs.measure_chars(4, 4), 0.0);
    }

    #[test]
    fn paragraph_lookup_and_levels() {
        let text = "abc\nאבג";
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());

        let mut paragraphs = ParagraphCollection::new();
        for paragraph in bidi::analyze(text, &offsets, BaseDirection::Auto) {
            paragraphs.push(paragraph);
        }

        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs.char_level(1), 0);
        assert_ne!(paragraphs.char_level(5) & 1, 0);
    }

    #[test]
    fn line_runs_arrive_in_visual_order() {
        let text = "ab אב cd";
        let chars: Vec<char> = text.chars().collect();
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());

        let mut paragraphs = ParagraphCollection::new();
        for paragraph in bidi::analyze(text, &offsets, BaseDirection::Ltr) {
            paragraphs.push(paragraph);
        }

        let mut visual = Vec::new();
        paragraphs.for_each_line_run(0..8, &chars, |run| {
            visual.push((run.char_range.clone(), run.is_rtl()));
        });

        assert!(visual.len() >= 3);
        assert_eq!(visual.first().unwrap().0.start, 0);
        assert_eq!(visual.last().unwrap().0.end, 8);
        assert!(visual.iter().any(|(_, rtl)| *rtl));
    }
}

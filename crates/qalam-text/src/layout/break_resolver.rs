use crate::layout::collection::RunCollection;
use crate::unicode::breaks::{BackwardBreakIter, BreakType, ForwardBreakIter};
use crate::unicode::whitespace::trailing_whitespace_start;

/// Break opportunity granularity used when fitting text into an extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakMode {
    /// Break at grapheme cluster boundaries.
    Character,
    /// Break at line break opportunities.
    Line,
}

fn find_forward_break(
    chars: &[char],
    runs: &RunCollection,
    breaks: &[u8],
    ty: BreakType,
    start: usize,
    end: usize,
    extent: f32,
) -> usize {
    let mut forward_break = start;
    let mut measurement = 0.0f32;

    for point in ForwardBreakIter::new(breaks, ty, start, end) {
        let segment_end = point.index;
        measurement += runs.measure_chars(forward_break, segment_end);

        // A mandatory break always wins; it is taken when it fits and ends
        // the scan either way.
        if point.mandatory {
            if measurement <= extent {
                forward_break = segment_end;
            }
            break;
        }

        if measurement > extent {
            // Re-test after excluding the segment's trailing whitespace,
            // letting the line hang trailing spaces past the extent.
            let whitespace_start = trailing_whitespace_start(chars, forward_break, segment_end);
            let whitespace_width = runs.measure_chars(whitespace_start, segment_end);

            if measurement - whitespace_width <= extent {
                forward_break = segment_end;
            }
            break;
        }

        forward_break = segment_end;
    }

    forward_break
}

fn find_backward_break(
    chars: &[char],
    runs: &RunCollection,
    breaks: &[u8],
    ty: BreakType,
    start: usize,
    end: usize,
    extent: f32,
) -> usize {
    let mut backward_break = end;
    let mut measurement = 0.0f32;

    for point in BackwardBreakIter::new(breaks, ty, start, end) {
        let segment_start = point.index;
        measurement += runs.measure_chars(segment_start, backward_break);

        if point.mandatory {
            if measurement <= extent {
                backward_break = segment_start;
            }
            break;
        }

        if measurement > extent {
            // Re-test after excluding the candidate segment's trailing
            // whitespace.
            let whitespace_start = trailing_whitespace_start(chars, segment_start, backward_break);
            let whitespace_width = runs.measure_chars(whitespace_start, backward_break);

            if measurement - whitespace_width <= extent {
                backward_break = segment_start;
            }
            break;
        }

        backward_break = segment_start;
    }

    backward_break
}

/// Greatest index in `(start, end]` such that `[start, index)` fits the
/// extent at grapheme granularity. Always advances by at least one grapheme
/// cluster, even when the extent is smaller than the first cluster.
pub fn suggest_forward_char_break(
    chars: &[char],
    runs: &RunCollection,
    breaks: &[u8],
    start: usize,
    end: usize,
    extent: f32,
) -> usize {
    let mut forward_break =
        find_forward_break(chars, runs, breaks, BreakType::Character, start, end, extent);

    // Take at least one grapheme if the extent is too small.
    if forward_break == start && start < end {
        forward_break = ForwardBreakIter::new(breaks, BreakType::Character, start, end)
            .next()
            .map(|point| point.index)
            .unwrap_or_else(|| (start + 1).min(end));
    }

    forward_break
}

/// Backward counterpart of [`suggest_forward_char_break`], fitting
/// `[index, end)` into the extent.
pub fn suggest_backward_char_break(
    chars: &[char],
    runs: &RunCollection,
    breaks: &[u8],
    start: usize,
    end: usize,
    extent: f32,
) -> usize {
    let mut backward_break =
        find_backward_break(chars, runs, breaks, BreakType::Character, start, end, extent);

    if backward_break == end && start < end {
        backward_break = BackwardBreakIter::new(breaks, BreakType::Character, start, end)
            .next()
            .map(|point| point.index)
            .unwrap_or_else(|| end.saturating_sub(1).max(start));
    }

    backward_break
}

/// Greatest index in `(start, end]` such that `[start, index)` fits the
/// extent at line granularity, falling back to grapheme granularity when no
/// line break opportunity fits.
pub fn suggest_forward_line_break(
    chars: &[char],
    runs: &RunCollection,
    breaks: &[u8],
    start: usize,
    end: usize,
    extent: f32,
) -> usize {
    let forward_break =
        find_forward_break(chars, runs, breaks, BreakType::Line, start, end, extent);

    if forward_break == start {
        return suggest_forward_char_break(chars, runs, breaks, start, end, extent);
    }

    forward_break
}

/// Backward counterpart of [`suggest_forward_line_break`].
pub fn suggest_backward_line_break(
    chars: &[char],
    runs: &RunCollection,
    breaks: &[u8],
    start: usize,
    end: usize,
    extent: f32,
) -> usize {
    let backward_break =
        find_backward_break(chars, runs, breaks, BreakType::Line, start, end, extent);

    if backward_break == end {
        return suggest_backward_char_break(chars, runs, breaks, start, end, extent);
    }

    backward_break
}

pub fn suggest_forward_break(
    chars: &[char],
    runs: &RunCollection,
    breaks: &[u8],
    start: usize,
    end: usize,
    extent: f32,
    mode: BreakMode,
) -> usize {
    match mode {
        BreakMode::Character => suggest_forward_char_break(chars, runs, breaks, start, end, extent),
        BreakMode::Line => suggest_forward_line_break(chars, runs, breaks, start, end, extent),
    }
}

pub fn suggest_backward_break(
    chars: &[char],
    runs: &RunCollection,
    breaks: &[u8],
    start: usize,
    end: usize,
    extent: f32,
    mode: BreakMode,
) -> usize {
    match mode {
        BreakMode::Character => {
            suggest_backward_char_break(chars, runs, breaks, start, end, extent)
        }
        BreakMode::Line => suggest_backward_line_break(chars, runs, breaks, start, end, extent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::run::TextRun;
    use crate::layout::run::tests::intrinsic_ltr;
    use crate::unicode::breaks::fill_breaks;

    /// Shape-free fixture: every char is its own cluster, 10 units wide.
    fn fixture(text: &str) -> (Vec<char>, RunCollection, Vec<u8>) {
        let chars: Vec<char> = text.chars().collect();
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());

        let mut breaks = vec![0u8; chars.len()];
        fill_breaks(text, &offsets, &mut breaks);

        // Stamp paragraph flags the way the shape resolver does.
        let mut para_start = 0;
        for (i, ch) in chars.iter().enumerate() {
            if *ch == '\n' {
                breaks[para_start] |= BreakType::Paragraph.flag(false);
                breaks[i] |= BreakType::Paragraph.flag(true);
                para_start = i + 1;
            }
        }
        if para_start < chars.len() {
            breaks[para_start] |= BreakType::Paragraph.flag(false);
            breaks[chars.len() - 1] |= BreakType::Paragraph.flag(true);
        }

        let mut runs = RunCollection::new();
        runs.push(TextRun::Intrinsic(intrinsic_ltr(
            0..chars.len(),
            vec![10.0; chars.len()],
            (0..chars.len()).collect(),
        )));

        (chars, runs, breaks)
    }

    #[test]
    fn forward_line_break_prefers_word_boundary() {
        let (chars, runs, breaks) = fixture("one two three");
        // 80 units fit "one two " (8 chars).
        let index = suggest_forward_line_break(&chars, &runs, &breaks, 0, 13, 80.0);
        assert_eq!(index, 8);
    }

    #[test]
    fn trailing_whitespace_hangs_past_extent() {
        let (chars, runs, breaks) = fixture("one two three");
        // 75 units do not fit "one two " (80), but the trailing space may
        // hang, so the break still lands after it.
        let index = suggest_forward_line_break(&chars, &runs, &breaks, 0, 13, 75.0);
        assert_eq!(index, 8);
    }

    #[test]
    fn mandatory_break_wins() {
        let (chars, runs, breaks) = fixture("ab\ncd ef");
        // Plenty of room, but the newline forces the break after it.
        let index = suggest_forward_line_break(&chars, &runs, &breaks, 0, 8, 1000.0);
        assert_eq!(index, 3);
    }

    #[test]
    fn whole_range_fits() {
        let (chars, runs, breaks) = fixture("one two");
        let index = suggest_forward_line_break(&chars, &runs, &breaks, 0, 7, 1000.0);
        assert_eq!(index, 7);
    }

    #[test]
    fn progress_guaranteed_for_tiny_extent() {
        let (chars, runs, breaks) = fixture("word");
        let index = suggest_forward_line_break(&chars, &runs, &breaks, 0, 4, 1.0);
        assert_eq!(index, 1);

        let index = suggest_forward_char_break(&chars, &runs, &breaks, 0, 4, 1.0);
        assert_eq!(index, 1);
    }

    #[test]
    fn backward_break_measures_from_the_end() {
        let (chars, runs, breaks) = fixture("one two three");
        // 60 units fit "three" (50) but not " three" measured to a word
        // boundary; the backward break lands before "three".
        let index = suggest_backward_line_break(&chars, &runs, &breaks, 0, 13, 60.0);
        assert_eq!(index, 8);
    }

    #[test]
    fn backward_break_takes_at_least_one_grapheme() {
        let (chars, runs, breaks) = fixture("word");
        let index = suggest_backward_char_break(&chars, &runs, &breaks, 0, 4, 1.0);
        assert_eq!(index, 3);
    }

    #[test]
    fn forward_break_never_returns_start_for_nonempty_range() {
        let (chars, runs, breaks) = fixture("a b c");
        for extent in [0.0, 0.5, 5.0, 15.0, 100.0] {
            let index = suggest_forward_line_break(&chars, &runs, &breaks, 0, 5, extent);
            assert!(index > 0);
        }
    }
}

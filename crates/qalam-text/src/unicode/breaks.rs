use unicode_linebreak::linebreaks;
use unicode_segmentation::UnicodeSegmentation;

use crate::unicode::bidi::char_index_of;

/// Kind of break opportunity recorded per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakType {
    /// Line break opportunity (UAX-14).
    Line,
    /// Grapheme cluster boundary (UAX-29).
    Character,
    /// Paragraph boundary; always wins over an optional break.
    Paragraph,
}

impl BreakType {
    /// Bit flag for this break type in the given scan direction.
    pub fn flag(self, forward: bool) -> u8 {
        let base = match self {
            BreakType::Line => 1 << 0,
            BreakType::Character => 1 << 2,
            BreakType::Paragraph => 1 << 4,
        };
        if forward { base } else { base << 1 }
    }
}

/// Fill the break record with line and grapheme break flags.
///
/// The record holds one byte of flags per character. A forward flag at
/// index `i` means text may break after character `i`; a backward flag at
/// index `i` means text may break before character `i`. Paragraph flags are
/// stamped separately during shaping, one pair per bidi paragraph.
pub fn fill_breaks(text: &str, char_offsets: &[usize], breaks: &mut [u8]) {
    debug_assert_eq!(breaks.len() + 1, char_offsets.len());

    for (byte_offset, _) in linebreaks(text) {
        let boundary = char_index_of(char_offsets, byte_offset);
        if boundary > 0 {
            breaks[boundary - 1] |= BreakType::Line.flag(true);
        }
        if boundary < breaks.len() {
            breaks[boundary] |= BreakType::Line.flag(false);
        }
    }

    for (byte_offset, _) in text.grapheme_indices(true).skip(1) {
        let boundary = char_index_of(char_offsets, byte_offset);
        breaks[boundary - 1] |= BreakType::Character.flag(true);
        breaks[boundary] |= BreakType::Character.flag(false);
    }
    if !breaks.is_empty() {
        breaks[breaks.len() - 1] |= BreakType::Character.flag(true);
        breaks[0] |= BreakType::Character.flag(false);
    }
}

/// A break opportunity produced by the break iterators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPoint {
    /// Character index of the boundary; text splits as `[.., index)` and
    /// `[index, ..)`.
    pub index: usize,
    /// Whether a paragraph boundary forces this break.
    pub mandatory: bool,
}

/// Forward iterator over break opportunities in `(start, end]`.
///
/// Flagged boundaries are produced in ascending order; the range end is
/// always produced as the final opportunity.
pub struct ForwardBreakIter<'a> {
    breaks: &'a [u8],
    ty: BreakType,
    cursor: usize,
    end: usize,
    done: bool,
}

impl<'a> ForwardBreakIter<'a> {
    pub fn new(breaks: &'a [u8], ty: BreakType, start: usize, end: usize) -> Self {
        Self {
            breaks,
            ty,
            cursor: start,
            end,
            done: start >= end,
        }
    }
}

impl Iterator for ForwardBreakIter<'_> {
    type Item = BreakPoint;

    fn next(&mut self) -> Option<BreakPoint> {
        if self.done {
            return None;
        }

        let flag = self.ty.flag(true);
        let must = BreakType::Paragraph.flag(true);

        while self.cursor < self.end {
            let char_type = self.breaks[self.cursor];
            let boundary = self.cursor + 1;
            self.cursor = boundary;

            if char_type & (flag | must) != 0 {
                if boundary == self.end {
                    self.done = true;
                }
                return Some(BreakPoint {
                    index: boundary,
                    mandatory: char_type & must != 0,
                });
            }
        }

        self.done = true;
        Some(BreakPoint {
            index: self.end,
            mandatory: self.breaks[self.end - 1] & must != 0,
        })
    }
}

/// Backward iterator over break opportunities in `[start, end)`.
///
/// Flagged boundaries are produced in descending order; the range start is
/// always produced as the final opportunity.
pub struct BackwardBreakIter<'a> {
    breaks: &'a [u8],
    ty: BreakType,
    cursor: usize,
    start: usize,
    done: bool,
}

impl<'a> BackwardBreakIter<'a> {
    pub fn new(breaks: &'a [u8], ty: BreakType, start: usize, end: usize) -> Self {
        Self {
            breaks,
            ty,
            cursor: end,
            start,
            done: start >= end,
        }
    }
}

impl Iterator for BackwardBreakIter<'_> {
    type Item = BreakPoint;

    fn next(&mut self) -> Option<BreakPoint> {
        if self.done {
            return None;
        }

        let flag = self.ty.flag(false);
        let must = BreakType::Paragraph.flag(false);

        while self.cursor > self.start + 1 {
            self.cursor -= 1;
            let char_type = self.breaks[self.cursor];

            if char_type & (flag | must) != 0 {
                return Some(BreakPoint {
                    index: self.cursor,
                    mandatory: char_type & must != 0,
                });
            }
        }

        self.done = true;
        Some(BreakPoint {
            index: self.start,
            mandatory: self.breaks[self.start] & must != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> Vec<u8> {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        let mut breaks = vec![0u8; text.chars().count()];
        fill_breaks(text, &offsets, &mut breaks);
        breaks
    }

    fn stamp_paragraphs(text: &str, breaks: &mut [u8]) {
        let mut start = 0;
        for (i, ch) in text.chars().enumerate() {
            if ch == '\n' {
                breaks[start] |= BreakType::Paragraph.flag(false);
                breaks[i] |= BreakType::Paragraph.flag(true);
                start = i + 1;
            }
        }
        if start < breaks.len() {
            breaks[start] |= BreakType::Paragraph.flag(false);
            breaks[breaks.len() - 1] |= BreakType::Paragraph.flag(true);
        }
    }

    #[test]
    fn forward_grapheme_breaks_cover_every_boundary() {
        let breaks = record("Hello\nWorld!");
        let indices: Vec<usize> =
            ForwardBreakIter::new(&breaks, BreakType::Character, 3, 8)
                .map(|b| b.index)
                .collect();
        assert_eq!(indices, vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn forward_line_breaks_include_mandatory_newline() {
        let mut breaks = record("Hello\nWorld!");
        stamp_paragraphs("Hello\nWorld!", &mut breaks);

        let points: Vec<BreakPoint> =
            ForwardBreakIter::new(&breaks, BreakType::Line, 2, 9).collect();
        let indices: Vec<usize> = points.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![6, 9]);
        assert!(points[0].mandatory);
    }

    #[test]
    fn backward_grapheme_breaks_descend() {
        let breaks = record("Hello\nWorld!");
        let indices: Vec<usize> =
            BackwardBreakIter::new(&breaks, BreakType::Character, 3, 8)
                .map(|b| b.index)
                .collect();
        assert_eq!(indices, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn combining_mark_is_not_a_grapheme_boundary() {
        let breaks = record("a\u{0301}b");
        let indices: Vec<usize> =
            ForwardBreakIter::new(&breaks, BreakType::Character, 0, 3)
                .map(|b| b.index)
                .collect();
        // "a" + combining acute form one grapheme; no boundary at 1.
        assert_eq!(indices, vec![2, 3]);
    }

    #[test]
    fn empty_range_yields_nothing() {
        let breaks = record("abc");
        assert_eq!(
            ForwardBreakIter::new(&breaks, BreakType::Line, 1, 1).count(),
            0
        );
        assert_eq!(
            BackwardBreakIter::new(&breaks, BreakType::Line, 1, 1).count(),
            0
        );
    }
}

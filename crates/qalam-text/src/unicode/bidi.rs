use core::ops::Range;

use unicode_bidi::{BidiInfo, LTR_LEVEL, Level, RTL_LEVEL};

/// Base direction hint for paragraph analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseDirection {
    /// Detect paragraph base direction from text (first strong char).
    Auto,
    /// Force overall left-to-right base direction.
    Ltr,
    /// Force overall right-to-left base direction.
    Rtl,
}

impl BaseDirection {
    pub fn to_level(self) -> Option<Level> {
        match self {
            BaseDirection::Auto => None,
            BaseDirection::Ltr => Some(LTR_LEVEL),
            BaseDirection::Rtl => Some(RTL_LEVEL),
        }
    }
}

/// A run of text with a single BiDi embedding level.
#[derive(Debug, Clone)]
pub struct BidiRun {
    /// Character range in the typeset text.
    pub char_range: Range<usize>,
    /// Embedding level for this run.
    pub level: u8,
}

impl BidiRun {
    pub fn is_rtl(&self) -> bool {
        self.level & 1 == 1
    }
}

/// BiDi information for a single paragraph (UAX-9).
///
/// Levels are resolved once by `unicode-bidi` during analysis; visual run
/// computation for arbitrary line sub-ranges is derived from the stored
/// per-character levels.
#[derive(Debug, Clone)]
pub struct BidiParagraph {
    /// Character range of this paragraph, separator included.
    pub char_range: Range<usize>,
    /// Paragraph embedding level.
    pub base_level: u8,
    /// Embedding level of each character in the paragraph.
    levels: Vec<u8>,
}

impl BidiParagraph {
    pub fn is_rtl(&self) -> bool {
        self.base_level & 1 == 1
    }

    /// Embedding level of the character at an absolute index.
    pub fn char_level(&self, char_index: usize) -> u8 {
        self.levels[char_index - self.char_range.start]
    }

    /// Maximal level runs in logical order, covering the whole paragraph.
    pub fn logical_runs(&self) -> Vec<BidiRun> {
        let mut runs = Vec::new();
        let mut start = 0;

        while start < self.levels.len() {
            let level = self.levels[start];
            let mut end = start + 1;
            while end < self.levels.len() && self.levels[end] == level {
                end += 1;
            }
            runs.push(BidiRun {
                char_range: (self.char_range.start + start)..(self.char_range.start + end),
                level,
            });
            start = end;
        }

        runs
    }

    /// Level runs of a line sub-range in visual order.
    ///
    /// Trailing whitespace of the line is reset to the paragraph level
    /// (rule L1) before runs are reordered by level (rule L2).
    pub fn visual_runs(&self, line_range: Range<usize>, chars: &[char]) -> Vec<BidiRun> {
        debug_assert!(line_range.start >= self.char_range.start);
        debug_assert!(line_range.end <= self.char_range.end);

        if line_range.is_empty() {
            return Vec::new();
        }

        let local = (line_range.start - self.char_range.start)
            ..(line_range.end - self.char_range.start);
        let mut levels = self.levels[local].to_vec();

        // L1: trailing whitespace takes the paragraph level.
        for (i, level) in levels.iter_mut().enumerate().rev() {
            if chars[line_range.start + i].is_whitespace() {
                *level = self.base_level;
            } else {
                break;
            }
        }

        // Group into logical runs.
        let mut runs = Vec::new();
        let mut start = 0;
        while start < levels.len() {
            let level = levels[start];
            let mut end = start + 1;
            while end < levels.len() && levels[end] == level {
                end += 1;
            }
            runs.push(BidiRun {
                char_range: (line_range.start + start)..(line_range.start + end),
                level,
            });
            start = end;
        }

        // L2: from the highest level down to the lowest odd level, reverse
        // every maximal sequence of runs at or above that level.
        let max_level = runs.iter().map(|r| r.level).max().unwrap_or(0);
        let min_odd = runs
            .iter()
            .map(|r| r.level)
            .filter(|l| l & 1 == 1)
            .min()
            .unwrap_or(max_level + 1);

        let mut level = max_level;
        while level >= min_odd && level > 0 {
            let mut i = 0;
            while i < runs.len() {
                if runs[i].level >= level {
                    let mut j = i;
                    while j < runs.len() && runs[j].level >= level {
                        j += 1;
                    }
                    runs[i..j].reverse();
                    i = j;
                } else {
                    i += 1;
                }
            }
            level -= 1;
        }

        runs
    }
}

/// Run the Unicode BiDi algorithm over the whole text.
///
/// `char_offsets` maps character index to byte offset (length `chars + 1`)
/// and is used to translate `unicode-bidi`'s byte-oriented output.
pub fn analyze(text: &str, char_offsets: &[usize], base: BaseDirection) -> Vec<BidiParagraph> {
    let info = BidiInfo::new(text, base.to_level());

    info.paragraphs
        .iter()
        .map(|para| {
            let char_start = char_index_of(char_offsets, para.range.start);
            let char_end = char_index_of(char_offsets, para.range.end);

            let levels = (char_start..char_end)
                .map(|i| info.levels[char_offsets[i]].number())
                .collect();

            BidiParagraph {
                char_range: char_start..char_end,
                base_level: para.level.number(),
                levels,
            }
        })
        .collect()
}

/// Translate a byte offset at a character boundary into a character index.
pub(crate) fn char_index_of(char_offsets: &[usize], byte_offset: usize) -> usize {
    match char_offsets.binary_search(&byte_offset) {
        Ok(index) => index,
        Err(index) => index - 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(text: &str) -> Vec<usize> {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        offsets
    }

    #[test]
    fn single_ltr_paragraph() {
        let text = "hello world";
        let paras = analyze(text, &offsets(text), BaseDirection::Auto);
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].char_range, 0..11);
        assert!(!paras[0].is_rtl());
        assert_eq!(paras[0].logical_runs().len(), 1);
    }

    #[test]
    fn newline_splits_paragraphs() {
        let text = "ab\ncd";
        let paras = analyze(text, &offsets(text), BaseDirection::Auto);
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].char_range, 0..3);
        assert_eq!(paras[1].char_range, 3..5);
    }

    #[test]
    fn detects_rtl_paragraph() {
        let text = "אבג abc";
        let paras = analyze(text, &offsets(text), BaseDirection::Auto);
        assert_eq!(paras.len(), 1);
        assert!(paras[0].is_rtl());
    }

    #[test]
    fn mixed_text_has_distinct_logical_runs() {
        let text = "abc אבג def";
        let paras = analyze(text, &offsets(text), BaseDirection::Auto);
        let runs = paras[0].logical_runs();
        assert!(runs.len() >= 3);
        assert_eq!(runs[0].char_range.start, 0);
        assert_eq!(runs.last().unwrap().char_range.end, 11);
    }

    #[test]
    fn visual_runs_reorder_rtl_segment() {
        let text = "abc אבג";
        let chars: Vec<char> = text.chars().collect();
        let paras = analyze(text, &offsets(text), BaseDirection::Ltr);
        let runs = paras[0].visual_runs(0..7, &chars);

        // LTR base: Latin run first, Hebrew run after it in visual order.
        assert_eq!(runs[0].char_range.start, 0);
        assert!(runs.last().unwrap().is_rtl());
    }

    #[test]
    fn visual_runs_rtl_base_puts_latin_leftmost() {
        let text = "אבג abc";
        let chars: Vec<char> = text.chars().collect();
        let paras = analyze(text, &offsets(text), BaseDirection::Auto);
        let runs = paras[0].visual_runs(0..7, &chars);

        // RTL base: the logically-first Hebrew run renders rightmost, so the
        // Latin run leads the left-to-right visual order.
        assert!(!runs[0].is_rtl());
        assert_eq!(runs[0].char_range, 4..7);
        assert!(runs.last().unwrap().is_rtl());
        assert_eq!(runs.last().unwrap().char_range.start, 0);
    }

    #[test]
    fn trailing_whitespace_takes_paragraph_level() {
        let text = "abc אבג ";
        let chars: Vec<char> = text.chars().collect();
        let paras = analyze(text, &offsets(text), BaseDirection::Ltr);
        let runs = paras[0].visual_runs(0..8, &chars);

        // The trailing space stays at the line's right edge for LTR base.
        let last = runs.last().unwrap();
        assert_eq!(last.char_range.end, 8);
        assert!(!last.is_rtl());
    }
}

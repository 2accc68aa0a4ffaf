mod engine;

pub use engine::ShapingEngine;

use swash::GlyphId;

/// Writing direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn is_rtl(self) -> bool {
        matches!(self, Direction::RightToLeft)
    }
}

/// Output of one shaping invocation over a single run.
///
/// Glyphs are in visual order. The cluster map holds one entry per
/// character of the shaped range, pointing at the first glyph of the
/// character's cluster; entries are non-decreasing for forward runs and
/// non-increasing for backward runs.
#[derive(Debug, Clone)]
pub struct ShapingResult {
    /// Glyph ids in visual order.
    pub glyph_ids: Vec<GlyphId>,
    /// Glyph (x, y) offsets from the pen position, in pixels.
    pub glyph_offsets: Vec<(f32, f32)>,
    /// Glyph advances in pixels.
    pub glyph_advances: Vec<f32>,
    /// Character index (relative to the shaped range) to glyph index.
    pub cluster_map: Vec<usize>,
    /// Whether the cluster map runs backward (right-to-left shaping).
    pub is_backward: bool,
}

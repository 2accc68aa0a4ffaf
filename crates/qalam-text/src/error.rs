use core::ops::Range;

/// Errors surfaced by layout composition.
///
/// Configuration errors are fatal for the current line or frame computation
/// and are never silently defaulted.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// No typeface could be resolved for the given character range.
    #[error("no typeface is specified for range [{}..{})", .0.start, .0.end)]
    MissingTypeface(Range<usize>),

    /// A caller-supplied character range is out of bounds or inverted.
    #[error("invalid character range [{}..{}) for text of length {len}", .range.start, .range.end)]
    InvalidRange { range: Range<usize>, len: usize },

    /// A layout pass was cancelled before completion.
    #[error("layout pass was cancelled")]
    Cancelled,
}

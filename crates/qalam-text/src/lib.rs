//! qalam-text: text layout composition engine.
//!
//! The crate turns styled Unicode text into visually ordered lines of shaped
//! glyphs:
//! - `unicode`: bidirectional analysis, script itemization, break records
//! - `font`: typeface loading and metrics
//! - `style`: per-range style attributes and inline replacements
//! - `shaping`: the OpenType shaping driver (harfrust)
//! - `layout`: runs, caret edges, break/line resolution and frame filling

pub mod font;
pub mod layout;
pub mod shaping;
pub mod style;
pub mod unicode;

mod error;

pub use error::LayoutError;

pub use font::{FontCache, FontError, FontKey, Typeface};
pub use layout::{
    BreakMode, CancellationToken, ComposedFrame, ComposedLine, FrameResolver, GlyphRun,
    TextAlignment, TextRun, TruncationPlace, Typesetter,
};
pub use shaping::Direction;
pub use style::{Replacement, ReplacementMetrics, Span, SpanAttribute, SpanList};
pub use unicode::BaseDirection;

//! qalam: text layout composition engine with glyph caching.
//!
//! The facade crate re-exports the two workspace members:
//! - `qalam-text`: bidirectional text analysis, shaping and line composition
//! - `qalam-graphics`: rasterized glyph caching on top of composed layout

pub use qalam_graphics as graphics;
pub use qalam_text as text;

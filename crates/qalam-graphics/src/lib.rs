//! qalam-graphics: rasterized glyph caching for composed text.
//!
//! Builds on `qalam-text` typefaces:
//! - `key`: value-typed rendering-attribute keys (data/color/stroke)
//! - `glyph`: lazily populated glyph payloads (image, outline, path)
//! - `rasterizer`: the swash-backed rasterization source
//! - `cache`: a segmented, size-bounded LRU with double-checked population

pub mod cache;
pub mod glyph;
pub mod key;
pub mod measure;
pub mod rasterizer;

pub use cache::GlyphCache;
pub use glyph::{Glyph, GlyphImage, GlyphKind, GlyphOutline, GlyphPath, ImageContent};
pub use key::{ColorKey, DataKey, GlyphAttributes, GlyphKey, LineCap, LineJoin, StrokeKey};
pub use measure::{BoundingBox, compute_bounding_box};
pub use rasterizer::{GlyphRasterizer, GlyphSource};

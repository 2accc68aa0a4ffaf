use std::sync::Arc;

use swash::zeno::Command;

/// Which representations are valid for a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    /// Monochrome coverage mask only.
    Mask,
    /// Color image only.
    Color,
    /// Both; the color rendering depends on the foreground color and is
    /// cached per color key instead of in the data segment.
    Mixed,
}

/// Pixel content of a rasterized glyph image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageContent {
    /// 8-bit coverage mask.
    Mask,
    /// 32-bit RGBA color data.
    Color,
}

/// A rasterized glyph image with its placement relative to the pen.
#[derive(Debug, Clone)]
pub struct GlyphImage {
    /// Horizontal offset from the pen to the left edge.
    pub left: i32,
    /// Vertical offset from the baseline up to the top edge.
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub content: ImageContent,
    pub data: Vec<u8>,
}

impl GlyphImage {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub(crate) fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Scaled vector outline of a glyph, used for stroking.
#[derive(Debug, Clone)]
pub struct GlyphOutline {
    pub commands: Vec<Command>,
}

impl GlyphOutline {
    pub(crate) fn size_bytes(&self) -> usize {
        self.commands.len() * size_of::<Command>()
    }
}

/// Fill path of a glyph, exposed to callers for geometry operations.
#[derive(Debug, Clone)]
pub struct GlyphPath {
    pub commands: Vec<Command>,
}

impl GlyphPath {
    pub(crate) fn size_bytes(&self) -> usize {
        self.commands.len() * size_of::<Command>()
    }
}

/// Cache payload with lazily populated representations.
///
/// Entries are immutable once stored; adding a representation replaces the
/// map entry with a merged copy under the cache lock.
#[derive(Debug, Clone, Default)]
pub struct Glyph {
    /// Set once the image representation has been resolved; `None` while
    /// only the outline or path has been loaded.
    pub kind: Option<GlyphKind>,
    pub image: Option<Arc<GlyphImage>>,
    pub outline: Option<Arc<GlyphOutline>>,
    pub path: Option<Arc<GlyphPath>>,
}

impl Glyph {
    pub(crate) fn size_bytes(&self) -> usize {
        self.image.as_ref().map_or(0, |image| image.size_bytes())
            + self.outline.as_ref().map_or(0, |outline| outline.size_bytes())
            + self.path.as_ref().map_or(0, |path| path.size_bytes())
    }
}

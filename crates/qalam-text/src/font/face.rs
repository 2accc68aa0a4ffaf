use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use swash::{FontRef, GlyphId, Metrics};

use crate::font::{FontError, FontMetrics, Result, ScaledFontMetrics};

static NEXT_TYPEFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Loaded font face backed by a font file (TTF/OTF).
///
/// This is a thin wrapper around `swash::FontRef` that owns the underlying
/// font data and exposes metrics and glyph id lookup. A process-unique id
/// gives typefaces a stable identity for hashing and cache keys.
#[derive(Debug, Clone)]
pub struct Typeface {
    /// Full font data.
    data: Arc<[u8]>,
    /// Font index within the file (for collections).
    index: u32,
    /// Process-unique identity.
    unique_id: u64,
    /// Extracted font metrics in font units.
    metrics: FontMetrics,
}

impl Typeface {
    /// Create a typeface from raw bytes and a font index within the file.
    pub fn from_bytes(data: Arc<[u8]>, index: usize) -> Result<Self> {
        let font = FontRef::from_index(&data, index).ok_or(FontError::InvalidFont)?;
        let metrics = Self::metrics_from_swash(&font);
        Ok(Self {
            data,
            index: index as u32,
            unique_id: NEXT_TYPEFACE_ID.fetch_add(1, Ordering::Relaxed),
            metrics,
        })
    }

    /// Create a typeface from raw bytes owned by a `Vec<u8>`.
    pub fn from_vec(data: Vec<u8>, index: usize) -> Result<Self> {
        Self::from_bytes(Arc::from(data), index)
    }

    /// Create a typeface from a font file on disk.
    pub fn from_path(path: impl AsRef<std::path::Path>, index: usize) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_vec(data, index)
    }

    fn metrics_from_swash(font: &FontRef<'_>) -> FontMetrics {
        // Use default (no variation) coordinates.
        let Metrics {
            units_per_em,
            ascent,
            descent,
            leading,
            ..
        } = font.metrics(&[]);

        FontMetrics {
            ascent,
            descent,
            leading,
            units_per_em,
        }
    }

    /// Expose the raw font bytes for integration with libraries that take
    /// ownership of the font data (e.g. the shaping engine).
    pub fn as_bytes(&self) -> Arc<[u8]> {
        self.data.clone()
    }

    /// Font index within the backing file.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Process-unique identity of this typeface.
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// Return a transient `FontRef` for interacting with swash APIs.
    pub fn as_swash_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.index as usize)
    }

    /// Font metrics in font units.
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Font metrics scaled to the requested pixel size (px per em).
    pub fn scaled_metrics(&self, type_size: f32) -> ScaledFontMetrics {
        self.metrics.scale_to_pixels(type_size)
    }

    /// Glyph id for a character, or the missing-glyph id 0.
    pub fn glyph_id(&self, ch: char) -> GlyphId {
        self.as_swash_ref()
            .map(|font| font.charmap().map(ch))
            .unwrap_or(0)
    }

    /// Construct a typeface with synthetic metrics and no font data, for
    /// exercising layout code without a real font file.
    #[cfg(test)]
    pub(crate) fn stub(ascent: f32, descent: f32, leading: f32) -> Self {
        Self {
            data: Arc::from(Vec::new()),
            index: 0,
            unique_id: NEXT_TYPEFACE_ID.fetch_add(1, Ordering::Relaxed),
            metrics: FontMetrics {
                ascent,
                descent,
                leading,
                units_per_em: 1000,
            },
        }
    }
}

impl PartialEq for Typeface {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}

impl Eq for Typeface {}

impl std::hash::Hash for Typeface {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.unique_id.hash(state);
    }
}

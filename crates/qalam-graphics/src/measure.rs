use swash::GlyphId;

use crate::cache::GlyphCache;
use crate::key::GlyphAttributes;

/// Axis-aligned bounding box in pixels, y-down with the baseline at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    /// An empty box positioned at the origin.
    pub fn empty() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Ink bounding box of a glyph sequence, computed from cached images.
///
/// The glyph slices come from a text run's accessors: ids, (x, y) offsets
/// from the pen position and advances, all in visual order. Glyphs without
/// an image contribute nothing.
pub fn compute_bounding_box(
    cache: &GlyphCache,
    attributes: &GlyphAttributes,
    glyph_ids: &[GlyphId],
    glyph_offsets: &[(f32, f32)],
    glyph_advances: &[f32],
) -> BoundingBox {
    let mut cumulated = None::<BoundingBox>;
    let mut pen_x = 0.0f32;

    for ((glyph_id, offset), advance) in glyph_ids
        .iter()
        .zip(glyph_offsets.iter())
        .zip(glyph_advances.iter())
    {
        if let Some(image) = cache.get_glyph_image(attributes, *glyph_id) {
            if !image.is_empty() {
                let left = pen_x + offset.0 + image.left as f32;
                let top = offset.1 - image.top as f32;
                let glyph_box = BoundingBox {
                    left,
                    top,
                    right: left + image.width as f32,
                    bottom: top + image.height as f32,
                };

                cumulated = Some(match cumulated {
                    None => glyph_box,
                    Some(current) => BoundingBox {
                        left: current.left.min(glyph_box.left),
                        top: current.top.min(glyph_box.top),
                        right: current.right.max(glyph_box.right),
                        bottom: current.bottom.max(glyph_box.bottom),
                    },
                });
            }
        }

        pen_x += advance;
    }

    cumulated.unwrap_or_else(BoundingBox::empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qalam_text::font::load_system_default_font;

    #[test]
    fn bounding_box_unions_glyph_images() {
        let Ok(typeface) = load_system_default_font() else {
            return;
        };

        let glyph_ids = [typeface.glyph_id('A'), typeface.glyph_id('g')];
        let mut attributes = GlyphAttributes::new(typeface);
        attributes.set_type_size(32.0);

        let cache = GlyphCache::with_default_capacity();
        let offsets = [(0.0, 0.0); 2];
        let advances = [20.0, 20.0];

        let bounds =
            compute_bounding_box(&cache, &attributes, &glyph_ids, &offsets, &advances);

        assert!(bounds.width() > 0.0);
        assert!(bounds.height() > 0.0);
        // "A" rises above the baseline, "g" descends below it.
        assert!(bounds.top < 0.0);
        assert!(bounds.bottom > 0.0);
        // The second glyph starts one advance in, so the box extends past
        // the first glyph's width.
        assert!(bounds.right > 20.0);
    }

    #[test]
    fn empty_input_yields_empty_box() {
        let Ok(typeface) = load_system_default_font() else {
            return;
        };

        let attributes = GlyphAttributes::new(typeface);
        let cache = GlyphCache::with_default_capacity();

        let bounds = compute_bounding_box(&cache, &attributes, &[], &[], &[]);
        assert_eq!(bounds, BoundingBox::empty());
        assert_eq!(bounds.width(), 0.0);
    }
}

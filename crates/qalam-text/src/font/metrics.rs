/// Font-level metrics in font units.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    /// Ascent above baseline (positive).
    pub ascent: f32,
    /// Descent below baseline (positive).
    pub descent: f32,
    /// Line gap (leading).
    pub leading: f32,
    /// Units per em.
    pub units_per_em: u16,
}

impl FontMetrics {
    /// Scale metrics to pixel size, where `type_size` is in logical pixels
    /// (px per em).
    pub fn scale_to_pixels(&self, type_size: f32) -> ScaledFontMetrics {
        let scale = if self.units_per_em != 0 {
            type_size / self.units_per_em as f32
        } else {
            1.0
        };
        ScaledFontMetrics {
            ascent: self.ascent * scale,
            descent: self.descent * scale,
            leading: self.leading * scale,
            type_size,
        }
    }
}

/// Scaled font metrics in pixels.
#[derive(Debug, Clone, Copy)]
pub struct ScaledFontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
    pub type_size: f32,
}

impl ScaledFontMetrics {
    /// Line height (ascent + descent + leading).
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.leading
    }
}

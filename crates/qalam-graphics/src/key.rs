//! Value-typed keys identifying rendering attributes.
//!
//! Keys are hashed and compared by value and cloned before they are stored
//! in the cache maps, so no key ever aliases a caller's mutable attribute
//! object. Sizes and skew are held in fixed point to make equality exact.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use qalam_text::Typeface;

/// Line cap used when stroking glyph outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join used when stroking glyph outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineJoin {
    Bevel,
    #[default]
    Miter,
    Round,
}

/// Base key: typeface identity plus fixed-point dimensions.
#[derive(Debug, Clone)]
pub struct DataKey {
    pub typeface: Arc<Typeface>,
    /// 26.6 fixed-point value.
    pub pixel_width: i32,
    /// 26.6 fixed-point value.
    pub pixel_height: i32,
    /// 16.16 fixed-point value.
    pub skew_x: i32,
}

impl DataKey {
    pub fn size_x(&self) -> f32 {
        self.pixel_width as f32 / 64.0
    }

    pub fn size_y(&self) -> f32 {
        self.pixel_height as f32 / 64.0
    }

    pub fn skew(&self) -> f32 {
        self.skew_x as f32 / 65536.0
    }
}

impl PartialEq for DataKey {
    fn eq(&self, other: &Self) -> bool {
        self.typeface.unique_id() == other.typeface.unique_id()
            && self.pixel_width == other.pixel_width
            && self.pixel_height == other.pixel_height
            && self.skew_x == other.skew_x
    }
}

impl Eq for DataKey {}

impl Hash for DataKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.typeface.unique_id().hash(state);
        self.pixel_width.hash(state);
        self.pixel_height.hash(state);
        self.skew_x.hash(state);
    }
}

/// Data key extended with a foreground color, for color glyphs whose
/// rendering depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorKey {
    pub data: DataKey,
    /// RGBA, 8 bits per channel.
    pub foreground_color: u32,
}

/// Data key extended with stroke parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrokeKey {
    pub data: DataKey,
    /// 26.6 fixed-point value.
    pub line_radius: i32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// 16.16 fixed-point value.
    pub miter_limit: i32,
}

impl StrokeKey {
    pub fn radius(&self) -> f32 {
        self.line_radius as f32 / 64.0
    }

    pub fn miter(&self) -> f32 {
        self.miter_limit as f32 / 65536.0
    }
}

/// Composite segment key for the glyph cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlyphKey {
    Data(DataKey),
    Color(ColorKey),
    Stroke(StrokeKey),
}

/// Builder for the key hierarchy, converting float inputs to fixed point.
#[derive(Debug, Clone)]
pub struct GlyphAttributes {
    typeface: Arc<Typeface>,
    pixel_width: i32,
    pixel_height: i32,
    skew_x: i32,
    foreground_color: u32,
    line_radius: i32,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: i32,
}

impl GlyphAttributes {
    pub fn new(typeface: Arc<Typeface>) -> Self {
        Self {
            typeface,
            pixel_width: 0,
            pixel_height: 0,
            skew_x: 0,
            foreground_color: 0x0000_00FF,
            line_radius: 0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 0x1_0000,
        }
    }

    pub fn set_typeface(&mut self, typeface: Arc<Typeface>) {
        self.typeface = typeface;
    }

    pub fn set_pixel_width(&mut self, pixel_width: f32) {
        self.pixel_width = (pixel_width * 64.0).round() as i32;
    }

    pub fn set_pixel_height(&mut self, pixel_height: f32) {
        self.pixel_height = (pixel_height * 64.0).round() as i32;
    }

    pub fn set_type_size(&mut self, type_size: f32) {
        self.set_pixel_width(type_size);
        self.set_pixel_height(type_size);
    }

    pub fn set_skew_x(&mut self, skew_x: f32) {
        self.skew_x = (skew_x * 65536.0).round() as i32;
    }

    pub fn set_foreground_color(&mut self, foreground_color: u32) {
        self.foreground_color = foreground_color;
    }

    pub fn set_line_radius(&mut self, line_radius: f32) {
        self.line_radius = (line_radius * 64.0).round() as i32;
    }

    pub fn set_line_cap(&mut self, line_cap: LineCap) {
        self.line_cap = line_cap;
    }

    pub fn set_line_join(&mut self, line_join: LineJoin) {
        self.line_join = line_join;
    }

    pub fn set_miter_limit(&mut self, miter_limit: f32) {
        self.miter_limit = (miter_limit * 65536.0).round() as i32;
    }

    /// Whether the configured size can be rasterized at all (one pixel in
    /// 26.6 fixed point).
    pub fn is_renderable(&self) -> bool {
        self.pixel_width >= 64 && self.pixel_height >= 64
    }

    pub fn data_key(&self) -> DataKey {
        DataKey {
            typeface: self.typeface.clone(),
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
            skew_x: self.skew_x,
        }
    }

    pub fn color_key(&self) -> ColorKey {
        ColorKey {
            data: self.data_key(),
            foreground_color: self.foreground_color,
        }
    }

    pub fn stroke_key(&self) -> StrokeKey {
        StrokeKey {
            data: self.data_key(),
            line_radius: self.line_radius,
            line_cap: self.line_cap,
            line_join: self.line_join,
            miter_limit: self.miter_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qalam_text::font::load_system_default_font;
    use std::collections::hash_map::DefaultHasher;

    fn attributes() -> Option<GlyphAttributes> {
        let typeface = load_system_default_font().ok()?;
        let mut attributes = GlyphAttributes::new(typeface);
        attributes.set_type_size(16.0);
        Some(attributes)
    }

    fn hash_of(key: &GlyphKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn keys_copied_from_same_attributes_are_equal() {
        let Some(attributes) = attributes() else {
            return;
        };
        let a = GlyphKey::Data(attributes.data_key());
        let b = GlyphKey::Data(attributes.data_key());
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn size_changes_the_key() {
        let Some(mut attributes) = attributes() else {
            return;
        };
        let a = attributes.data_key();
        attributes.set_type_size(17.0);
        let b = attributes.data_key();
        assert_ne!(a, b);
    }

    #[test]
    fn color_and_stroke_keys_extend_the_data_key() {
        let Some(mut attributes) = attributes() else {
            return;
        };
        attributes.set_foreground_color(0xFF00_00FF);
        attributes.set_line_radius(1.5);

        let color = attributes.color_key();
        assert_eq!(color.data, attributes.data_key());
        assert_eq!(color.foreground_color, 0xFF00_00FF);

        let stroke = attributes.stroke_key();
        assert_eq!(stroke.data, attributes.data_key());
        assert!((stroke.radius() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn key_variants_never_collide() {
        let Some(attributes) = attributes() else {
            return;
        };
        let data = GlyphKey::Data(attributes.data_key());
        let color = GlyphKey::Color(attributes.color_key());
        let stroke = GlyphKey::Stroke(attributes.stroke_key());
        assert_ne!(data, color);
        assert_ne!(data, stroke);
        assert_ne!(color, stroke);
    }

    #[test]
    fn fixed_point_conversion_round_trips() {
        let Some(mut attributes) = attributes() else {
            return;
        };
        attributes.set_pixel_width(12.5);
        attributes.set_pixel_height(12.5);
        attributes.set_skew_x(0.25);

        let key = attributes.data_key();
        assert!((key.size_x() - 12.5).abs() < 1.0 / 64.0);
        assert!((key.size_y() - 12.5).abs() < 1.0 / 64.0);
        assert!((key.skew() - 0.25).abs() < 1.0 / 65536.0);
    }

    #[test]
    fn renderability_needs_at_least_one_pixel() {
        let Some(mut attributes) = attributes() else {
            return;
        };
        assert!(attributes.is_renderable());
        attributes.set_type_size(0.5);
        assert!(!attributes.is_renderable());
    }
}

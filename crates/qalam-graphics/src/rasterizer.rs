use core::fmt;
use std::sync::Arc;

use swash::scale::image::{Content, Image};
use swash::scale::outline::Outline;
use swash::scale::{Render, ScaleContext, Scaler, Source, StrikeWith};
use swash::zeno::{Angle, Cap, Command, Join, Mask, Stroke, Transform, Verb};
use swash::GlyphId;

use qalam_text::Typeface;

use crate::glyph::{GlyphImage, GlyphKind, GlyphOutline, GlyphPath, ImageContent};
use crate::key::{DataKey, LineCap, LineJoin, StrokeKey};

/// Source of rasterized glyph artifacts, as consumed by the cache.
///
/// All methods degrade to `None` on failure; a missing image is recorded
/// by the cache and never fails a line.
pub trait GlyphSource: fmt::Debug + Send + Sync {
    fn glyph_kind(&self, glyph_id: GlyphId) -> GlyphKind;
    fn glyph_image(&self, glyph_id: GlyphId) -> Option<GlyphImage>;
    fn color_image(&self, glyph_id: GlyphId, foreground_color: u32) -> Option<GlyphImage>;
    fn glyph_outline(&self, glyph_id: GlyphId) -> Option<GlyphOutline>;
    fn glyph_path(&self, glyph_id: GlyphId) -> Option<GlyphPath>;
    fn stroke_image(&self, outline: &GlyphOutline, stroke: &StrokeKey) -> Option<GlyphImage>;
}

/// Swash-backed glyph rasterizer for one data key.
///
/// A transient scale context is built per call; the rasterizer itself
/// holds no mutable state and may be shared across threads.
#[derive(Debug, Clone)]
pub struct GlyphRasterizer {
    typeface: Arc<Typeface>,
    size: f32,
    skew: f32,
}

impl GlyphRasterizer {
    pub fn new(key: &DataKey) -> Self {
        Self {
            typeface: key.typeface.clone(),
            size: key.size_y(),
            skew: key.skew(),
        }
    }

    fn with_scaler<T>(&self, body: impl FnOnce(&mut Scaler<'_>) -> T) -> Option<T> {
        let font = self.typeface.as_swash_ref()?;
        let mut context = ScaleContext::new();
        let mut scaler = context.builder(font).size(self.size).hint(true).build();
        Some(body(&mut scaler))
    }

    fn transform(&self) -> Option<Transform> {
        if self.skew == 0.0 {
            return None;
        }
        Some(Transform::skew(
            Angle::from_radians(self.skew.atan()),
            Angle::from_degrees(0.0),
        ))
    }

    fn render_sources(&self, glyph_id: GlyphId, sources: &[Source]) -> Option<GlyphImage> {
        let transform = self.transform();
        self.with_scaler(|scaler| {
            Render::new(sources)
                .transform(transform)
                .render(scaler, glyph_id)
                .map(convert_image)
        })
        .flatten()
    }
}

impl GlyphSource for GlyphRasterizer {
    fn glyph_kind(&self, glyph_id: GlyphId) -> GlyphKind {
        self.with_scaler(|scaler| {
            let has_mask = scaler.scale_outline(glyph_id).is_some()
                || scaler.scale_bitmap(glyph_id, StrikeWith::BestFit).is_some();
            let has_color = scaler.scale_color_outline(glyph_id).is_some()
                || scaler
                    .scale_color_bitmap(glyph_id, StrikeWith::BestFit)
                    .is_some();

            match (has_mask, has_color) {
                (true, true) => GlyphKind::Mixed,
                (false, true) => GlyphKind::Color,
                _ => GlyphKind::Mask,
            }
        })
        .unwrap_or(GlyphKind::Mask)
    }

    fn glyph_image(&self, glyph_id: GlyphId) -> Option<GlyphImage> {
        // Prefer scalable outlines; fall back to embedded bitmaps.
        self.render_sources(
            glyph_id,
            &[
                Source::Outline,
                Source::Bitmap(StrikeWith::BestFit),
                Source::ColorBitmap(StrikeWith::BestFit),
            ],
        )
    }

    fn color_image(&self, glyph_id: GlyphId, foreground_color: u32) -> Option<GlyphImage> {
        let transform = self.transform();
        self.with_scaler(|scaler| {
            Render::new(&[
                Source::ColorOutline(0),
                Source::ColorBitmap(StrikeWith::BestFit),
            ])
            .transform(transform)
            .default_color(rgba_bytes(foreground_color))
            .render(scaler, glyph_id)
            .map(convert_image)
        })
        .flatten()
    }

    fn glyph_outline(&self, glyph_id: GlyphId) -> Option<GlyphOutline> {
        self.with_scaler(|scaler| {
            scaler.scale_outline(glyph_id).map(|outline| GlyphOutline {
                commands: outline_commands(&outline),
            })
        })
        .flatten()
    }

    fn glyph_path(&self, glyph_id: GlyphId) -> Option<GlyphPath> {
        self.with_scaler(|scaler| {
            scaler.scale_outline(glyph_id).map(|outline| GlyphPath {
                commands: outline_commands(&outline),
            })
        })
        .flatten()
    }

    fn stroke_image(&self, outline: &GlyphOutline, stroke: &StrokeKey) -> Option<GlyphImage> {
        if outline.commands.is_empty() {
            return None;
        }

        let style = Stroke::new(stroke.radius())
            .cap(match stroke.line_cap {
                LineCap::Butt => Cap::Butt,
                LineCap::Round => Cap::Round,
                LineCap::Square => Cap::Square,
            })
            .join(match stroke.line_join {
                LineJoin::Bevel => Join::Bevel,
                LineJoin::Miter => Join::Miter,
                LineJoin::Round => Join::Round,
            })
            .miter_limit(stroke.miter())
            .to_owned();

        let (data, placement) = Mask::new(&outline.commands[..]).style(style).render();
        if placement.width == 0 || placement.height == 0 {
            return None;
        }

        Some(GlyphImage {
            left: placement.left,
            top: placement.top,
            width: placement.width,
            height: placement.height,
            content: ImageContent::Mask,
            data,
        })
    }
}

fn rgba_bytes(color: u32) -> [u8; 4] {
    [
        (color >> 24) as u8,
        (color >> 16) as u8,
        (color >> 8) as u8,
        color as u8,
    ]
}

fn convert_image(image: Image) -> GlyphImage {
    GlyphImage {
        left: image.placement.left,
        top: image.placement.top,
        width: image.placement.width,
        height: image.placement.height,
        content: match image.content {
            Content::Mask => ImageContent::Mask,
            Content::SubpixelMask | Content::Color => ImageContent::Color,
        },
        data: image.data,
    }
}

fn outline_commands(outline: &Outline) -> Vec<Command> {
    let points = outline.points();
    let verbs = outline.verbs();

    let mut commands = Vec::with_capacity(verbs.len());
    let mut next = 0usize;

    for verb in verbs {
        match verb {
            Verb::MoveTo => {
                commands.push(Command::MoveTo(points[next]));
                next += 1;
            }
            Verb::LineTo => {
                commands.push(Command::LineTo(points[next]));
                next += 1;
            }
            Verb::QuadTo => {
                commands.push(Command::QuadTo(points[next], points[next + 1]));
                next += 2;
            }
            Verb::CurveTo => {
                commands.push(Command::CurveTo(
                    points[next],
                    points[next + 1],
                    points[next + 2],
                ));
                next += 3;
            }
            Verb::Close => commands.push(Command::Close),
        }
    }

    commands
}

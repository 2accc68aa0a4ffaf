use std::sync::Arc;

use harfrust::{
    Direction as HbDirection, FontRef as HbFontRef, Script as HbScript, ShaperData,
    ShaperInstance, Tag as HbTag, UnicodeBuffer as HbUnicodeBuffer,
};
use swash::GlyphId;
use unicode_script::Script;

use crate::font::Typeface;
use crate::unicode::script::script_tag;

use super::{Direction, ShapingResult};

/// OpenType shaping driver built on harfrust (pure-Rust HarfBuzz port).
///
/// The engine is configured once per run with script, direction, typeface
/// and size, then invoked on the run's text slice. Output is deterministic
/// for identical inputs.
#[derive(Debug, Clone)]
pub struct ShapingEngine {
    script: Script,
    direction: Direction,
    typeface: Option<Arc<Typeface>>,
    type_size: f32,
}

impl Default for ShapingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapingEngine {
    pub fn new() -> Self {
        Self {
            script: Script::Latin,
            direction: Direction::LeftToRight,
            typeface: None,
            type_size: 16.0,
        }
    }

    pub fn set_script(&mut self, script: Script) {
        self.script = script;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_typeface(&mut self, typeface: Arc<Typeface>) {
        self.typeface = Some(typeface);
    }

    pub fn set_type_size(&mut self, type_size: f32) {
        self.type_size = type_size;
    }

    /// Shape a run's text slice.
    ///
    /// The slice must correspond to one directionally and stylistically
    /// uniform run; the caller supplies the typeface beforehand.
    pub fn shape(&self, text: &str) -> ShapingResult {
        let typeface = self
            .typeface
            .as_ref()
            .expect("a typeface must be set before shaping");

        let char_starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let char_count = char_starts.len();

        // Build a harfrust FontRef from the typeface bytes.
        let font_data = typeface.as_bytes();
        let font_ref = HbFontRef::from_index(&font_data, typeface.index())
            .expect("valid font data for harfrust");

        // Shaper configuration with default (no variations) instance.
        let data = ShaperData::new(&font_ref);
        let instance =
            ShaperInstance::from_variations(&font_ref, core::iter::empty::<harfrust::Variation>());
        let shaper = data
            .shaper(&font_ref)
            .instance(Some(&instance))
            .point_size(None)
            .build();

        let mut buffer = HbUnicodeBuffer::new();
        buffer.push_str(text);
        buffer.set_direction(match self.direction {
            Direction::LeftToRight => HbDirection::LeftToRight,
            Direction::RightToLeft => HbDirection::RightToLeft,
        });
        let tag = HbTag::new(&script_tag(self.script));
        if let Some(script) = HbScript::from_iso15924_tag(tag) {
            buffer.set_script(script);
        }
        buffer.guess_segment_properties();

        let glyph_buffer = shaper.shape(buffer, &[]);
        let infos = glyph_buffer.glyph_infos();
        let positions = glyph_buffer.glyph_positions();

        // harfrust uses design units; convert to pixels using the font's
        // units-per-em and requested size.
        let upem = typeface.metrics().units_per_em;
        let scale = if upem != 0 {
            self.type_size / upem as f32
        } else {
            1.0
        };

        let mut glyph_ids = Vec::with_capacity(infos.len());
        let mut glyph_offsets = Vec::with_capacity(infos.len());
        let mut glyph_advances = Vec::with_capacity(infos.len());
        let mut clusters = Vec::with_capacity(infos.len());

        for (info, pos) in infos.iter().zip(positions.iter()) {
            glyph_ids.push(info.glyph_id as GlyphId);
            glyph_offsets.push((
                pos.x_offset as f32 * scale,
                -(pos.y_offset as f32) * scale,
            ));
            glyph_advances.push(pos.x_advance as f32 * scale);

            // Cluster values are byte offsets into the shaped slice; map
            // them back to character indices.
            let byte = info.cluster as usize;
            let char_index = match char_starts.binary_search(&byte) {
                Ok(index) => index,
                Err(index) => index.saturating_sub(1),
            };
            clusters.push(char_index);
        }

        let is_backward = self.direction.is_rtl();
        let cluster_map = build_cluster_map(&clusters, char_count, is_backward);

        ShapingResult {
            glyph_ids,
            glyph_offsets,
            glyph_advances,
            cluster_map,
            is_backward,
        }
    }
}

/// Expand per-glyph cluster values into a per-character cluster map.
///
/// Each entry points at the lowest glyph index of the character's cluster.
/// Forward runs produce a non-decreasing map, backward runs (glyphs in
/// reversed visual order) a non-increasing one.
pub(crate) fn build_cluster_map(
    clusters: &[usize],
    char_count: usize,
    is_backward: bool,
) -> Vec<usize> {
    let mut map = vec![0usize; char_count];
    let glyph_count = clusters.len();

    if glyph_count == 0 {
        return map;
    }

    if !is_backward {
        let mut glyph_index = 0;
        while glyph_index < glyph_count {
            let cluster = clusters[glyph_index];
            let mut next = glyph_index + 1;
            while next < glyph_count && clusters[next] == cluster {
                next += 1;
            }

            let char_end = if next < glyph_count {
                clusters[next]
            } else {
                char_count
            };
            for entry in &mut map[cluster..char_end] {
                *entry = glyph_index;
            }

            glyph_index = next;
        }
    } else {
        // Backward runs place the logically-first characters at the end of
        // the glyph list; walk cluster groups from there.
        let mut group_end = glyph_count;
        while group_end > 0 {
            let mut group_start = group_end - 1;
            let cluster = clusters[group_start];
            while group_start > 0 && clusters[group_start - 1] == cluster {
                group_start -= 1;
            }

            let char_end = if group_start > 0 {
                clusters[group_start - 1]
            } else {
                char_count
            };
            for entry in &mut map[cluster..char_end] {
                *entry = group_start;
            }

            group_end = group_start;
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::load_system_default_font;

    #[test]
    fn forward_cluster_map_expands_ligatures() {
        // Three chars, two glyphs; "fi" ligated into the glyph at index 1.
        let clusters = [0usize, 1];
        let map = build_cluster_map(&clusters, 3, false);
        assert_eq!(map, vec![0, 1, 1]);
    }

    #[test]
    fn forward_cluster_map_handles_multiple_glyphs_per_char() {
        // One char decomposed into two glyphs.
        let clusters = [0usize, 0, 1];
        let map = build_cluster_map(&clusters, 2, false);
        assert_eq!(map, vec![0, 2]);
    }

    #[test]
    fn backward_cluster_map_is_non_increasing() {
        // Four RTL chars, one glyph each, glyphs in visual order.
        let clusters = [3usize, 2, 1, 0];
        let map = build_cluster_map(&clusters, 4, true);
        assert_eq!(map, vec![3, 2, 1, 0]);
    }

    #[test]
    fn backward_cluster_map_groups_ligatures() {
        // RTL ligature: chars 1 and 2 share the glyph at index 0.
        let clusters = [1usize, 0];
        let map = build_cluster_map(&clusters, 3, true);
        assert_eq!(map, vec![1, 0, 0]);
    }

    #[test]
    fn empty_run_maps_to_zero() {
        assert_eq!(build_cluster_map(&[], 2, false), vec![0, 0]);
    }

    #[test]
    fn shapes_basic_latin() {
        let Ok(face) = load_system_default_font() else {
            return;
        };

        let mut engine = ShapingEngine::new();
        engine.set_typeface(face);
        engine.set_type_size(16.0);

        let result = engine.shape("Hello");
        assert_eq!(result.cluster_map.len(), 5);
        assert!(!result.is_backward);
        assert!(!result.glyph_ids.is_empty());
        assert!(result.glyph_advances.iter().all(|a| *a >= 0.0));

        // Cluster map is non-decreasing for a forward run.
        assert!(result.cluster_map.windows(2).all(|w| w[0] <= w[1]));
    }
}

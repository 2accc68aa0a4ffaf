use core::ops::Range;
use std::sync::Arc;

use swash::GlyphId;

use crate::font::Typeface;
use crate::layout::caret::{CaretEdges, CaretEdgesBuilder};
use crate::layout::cluster_map::ClusterMap;
use crate::shaping::Direction;
use crate::style::{Replacement, Span};

/// A run holding the full output of one shaping invocation.
#[derive(Debug)]
pub struct IntrinsicRun {
    pub char_start: usize,
    pub char_end: usize,
    pub is_backward: bool,
    pub bidi_level: u8,
    pub direction: Direction,
    pub typeface: Arc<Typeface>,
    pub type_size: f32,
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
    glyph_ids: Vec<GlyphId>,
    glyph_offsets: Vec<(f32, f32)>,
    glyph_advances: Arc<[f32]>,
    cluster_map: Arc<[usize]>,
    caret_edges: Arc<[f32]>,
}

impl IntrinsicRun {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        char_range: Range<usize>,
        is_backward: bool,
        bidi_level: u8,
        direction: Direction,
        typeface: Arc<Typeface>,
        type_size: f32,
        ascent: f32,
        descent: f32,
        leading: f32,
        glyph_ids: Vec<GlyphId>,
        glyph_offsets: Vec<(f32, f32)>,
        glyph_advances: Vec<f32>,
        cluster_map: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(cluster_map.len(), char_range.len());

        let glyph_advances: Arc<[f32]> = Arc::from(glyph_advances);
        let cluster_map: Arc<[usize]> = Arc::from(cluster_map);

        let map_view = ClusterMap::new(cluster_map.clone());
        let caret_edges: Arc<[f32]> = Arc::from(
            CaretEdgesBuilder::new(&glyph_advances, &map_view)
                .backward(is_backward)
                .rtl(bidi_level & 1 == 1)
                .build(),
        );

        Self {
            char_start: char_range.start,
            char_end: char_range.end,
            is_backward,
            bidi_level,
            direction,
            typeface,
            type_size,
            ascent,
            descent,
            leading,
            glyph_ids,
            glyph_offsets,
            glyph_advances,
            cluster_map,
            caret_edges,
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.bidi_level & 1 == 1
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_ids.len()
    }

    fn map_view(&self) -> ClusterMap {
        ClusterMap::new(self.cluster_map.clone())
    }

    fn edges_view(&self) -> CaretEdges {
        CaretEdges::new(self.caret_edges.clone())
    }

    pub fn cluster_start(&self, char_index: usize) -> usize {
        self.map_view().cluster_start(char_index - self.char_start) + self.char_start
    }

    pub fn cluster_end(&self, char_index: usize) -> usize {
        self.map_view().cluster_end(char_index - self.char_start) + self.char_start
    }

    pub fn glyph_range_for_chars(&self, from: usize, to: usize) -> Range<usize> {
        self.map_view().glyph_range(
            from - self.char_start,
            to - self.char_start,
            self.is_backward,
            self.glyph_count(),
        )
    }

    pub fn leading_glyph_index(&self, char_index: usize) -> usize {
        self.map_view().leading_glyph_index(
            char_index - self.char_start,
            self.is_backward,
            self.glyph_count(),
        )
    }

    pub fn trailing_glyph_index(&self, char_index: usize) -> usize {
        self.map_view().trailing_glyph_index(
            char_index - self.char_start,
            self.is_backward,
            self.glyph_count(),
        )
    }

    pub fn caret_boundary(&self, from: usize, to: usize) -> f32 {
        self.edges_view()
            .left_margin(self.is_rtl(), from - self.char_start, to - self.char_start)
    }

    pub fn caret_edge(&self, char_index: usize) -> f32 {
        self.caret_edges[char_index - self.char_start]
    }

    pub fn range_distance(&self, from: usize, to: usize) -> f32 {
        self.edges_view().distance(
            from - self.char_start,
            to - self.char_start,
            self.is_rtl(),
        )
    }

    pub fn nearest_char_index(&self, distance: f32, from: usize, to: usize) -> usize {
        self.edges_view().nearest_index(
            self.is_rtl(),
            from - self.char_start,
            to - self.char_start,
            distance,
        ) + self.char_start
    }
}

/// Zero-copy view of a character sub-range of an intrinsic run.
///
/// Glyph and caret-edge accessors are computed as sub-ranges of the
/// parent's arrays. When the slice edges fall inside a cluster, the extra
/// lengths report how many characters of the boundary clusters straddle
/// the edge; the drawing layer uses them to clip partial clusters.
#[derive(Debug, Clone)]
pub struct RunSlice {
    base: Arc<IntrinsicRun>,
    pub char_start: usize,
    pub char_end: usize,
    glyph_offset: usize,
    glyph_count: usize,
    caret_boundary: f32,
    spans: Vec<Span>,
}

impl RunSlice {
    pub fn new(base: Arc<IntrinsicRun>, char_start: usize, char_end: usize, spans: Vec<Span>) -> Self {
        debug_assert!(char_start >= base.char_start && char_end <= base.char_end);

        let glyph_range = base.glyph_range_for_chars(char_start, char_end);
        let caret_boundary = base.caret_boundary(char_start, char_end);

        Self {
            base,
            char_start,
            char_end,
            glyph_offset: glyph_range.start,
            glyph_count: glyph_range.len(),
            caret_boundary,
            spans,
        }
    }

    pub fn base(&self) -> &Arc<IntrinsicRun> {
        &self.base
    }

    fn actual_range(&self) -> Range<usize> {
        self.base.cluster_start(self.char_start)..self.base.cluster_end(self.char_end - 1)
    }

    fn map_view(&self) -> ClusterMap {
        let actual = self.actual_range();
        ClusterMap::with_parts(
            self.base.cluster_map.clone(),
            actual.start - self.base.char_start,
            actual.len(),
            self.glyph_offset,
        )
    }

    fn edges_view(&self) -> CaretEdges {
        let actual = self.actual_range();
        CaretEdges::with_parts(
            self.base.caret_edges.clone(),
            actual.start - self.base.char_start,
            actual.len() + 1,
            self.caret_boundary,
        )
    }
}

/// A single inline non-text object occupying a character range.
///
/// Reports one synthetic glyph spanning the replacement's entire advance.
#[derive(Debug)]
pub struct ReplacementRun {
    pub char_start: usize,
    pub char_end: usize,
    pub bidi_level: u8,
    pub typeface: Arc<Typeface>,
    pub type_size: f32,
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
    pub extent: f32,
    replacement: Arc<dyn Replacement>,
    glyph_ids: [GlyphId; 1],
    glyph_offsets: [(f32, f32); 1],
    glyph_advances: [f32; 1],
    cluster_map: Arc<[usize]>,
    caret_edges: Arc<[f32]>,
}

impl ReplacementRun {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        char_range: Range<usize>,
        bidi_level: u8,
        typeface: Arc<Typeface>,
        type_size: f32,
        ascent: f32,
        descent: f32,
        leading: f32,
        extent: f32,
        replacement: Arc<dyn Replacement>,
    ) -> Self {
        let cluster_map: Arc<[usize]> = Arc::from(vec![0usize; char_range.len()]);
        let advances = [extent];

        let map_view = ClusterMap::new(cluster_map.clone());
        let caret_edges: Arc<[f32]> = Arc::from(
            CaretEdgesBuilder::new(&advances, &map_view)
                .rtl(bidi_level & 1 == 1)
                .build(),
        );

        let glyph_id = typeface.glyph_id(' ');

        Self {
            char_start: char_range.start,
            char_end: char_range.end,
            bidi_level,
            typeface,
            type_size,
            ascent,
            descent,
            leading,
            extent,
            replacement,
            glyph_ids: [glyph_id],
            glyph_offsets: [(0.0, 0.0)],
            glyph_advances: advances,
            cluster_map,
            caret_edges,
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.bidi_level & 1 == 1
    }

    pub fn replacement(&self) -> &Arc<dyn Replacement> {
        &self.replacement
    }

    fn edges_view(&self) -> CaretEdges {
        CaretEdges::new(self.caret_edges.clone())
    }
}

/// A wrapper substituting post-justification advances for a base run.
///
/// Caret edges are re-derived from the adjusted advances; every
/// non-advance-dependent query delegates to the base run.
#[derive(Debug)]
pub struct JustifiedRun {
    base: TextRun,
    glyph_advances: Arc<[f32]>,
    caret_edges: Arc<[f32]>,
    caret_boundary: f32,
}

impl JustifiedRun {
    pub fn new(base: TextRun, justified_advances: Vec<f32>) -> Self {
        debug_assert_eq!(justified_advances.len(), base.glyph_count());

        let glyph_advances: Arc<[f32]> = Arc::from(justified_advances);
        let is_rtl = base.is_rtl();

        let map_view = base.cluster_map();
        let caret_edges: Arc<[f32]> = Arc::from(
            CaretEdgesBuilder::new(&glyph_advances, &map_view)
                .backward(base.is_backward())
                .rtl(is_rtl)
                .build(),
        );

        let mut caret_boundary = 0.0;
        if is_rtl && base.start_extra() > 0 {
            let edges = CaretEdges::new(caret_edges.clone());
            let actual_start = base.cluster_start(base.char_start());
            caret_boundary = edges.left_margin(
                true,
                base.char_start() - actual_start,
                base.char_end() - actual_start,
            );
        }

        Self {
            base,
            glyph_advances,
            caret_edges,
            caret_boundary,
        }
    }

    pub fn base(&self) -> &TextRun {
        &self.base
    }

    fn actual_start(&self) -> usize {
        self.base.cluster_start(self.base.char_start())
    }

    fn edges_view(&self) -> CaretEdges {
        let len = self.caret_edges.len();
        CaretEdges::with_parts(self.caret_edges.clone(), 0, len, self.caret_boundary)
    }
}

/// A contiguous, directionally-consistent span of shaped content.
///
/// The closed variant set keeps dispatch exhaustive: an intrinsic run owns
/// shaping output, a slice is a zero-copy sub-range of one, a replacement
/// stands in for an inline object and a justified run substitutes adjusted
/// advances.
#[derive(Debug, Clone)]
pub enum TextRun {
    Intrinsic(Arc<IntrinsicRun>),
    Slice(RunSlice),
    Replacement(Arc<ReplacementRun>),
    Justified(Arc<JustifiedRun>),
}

impl TextRun {
    pub fn char_start(&self) -> usize {
        match self {
            TextRun::Intrinsic(run) => run.char_start,
            TextRun::Slice(slice) => slice.char_start,
            TextRun::Replacement(run) => run.char_start,
            TextRun::Justified(run) => run.base.char_start(),
        }
    }

    pub fn char_end(&self) -> usize {
        match self {
            TextRun::Intrinsic(run) => run.char_end,
            TextRun::Slice(slice) => slice.char_end,
            TextRun::Replacement(run) => run.char_end,
            TextRun::Justified(run) => run.base.char_end(),
        }
    }

    pub fn char_range(&self) -> Range<usize> {
        self.char_start()..self.char_end()
    }

    pub fn is_backward(&self) -> bool {
        match self {
            TextRun::Intrinsic(run) => run.is_backward,
            TextRun::Slice(slice) => slice.base.is_backward,
            TextRun::Replacement(_) => false,
            TextRun::Justified(run) => run.base.is_backward(),
        }
    }

    pub fn bidi_level(&self) -> u8 {
        match self {
            TextRun::Intrinsic(run) => run.bidi_level,
            TextRun::Slice(slice) => slice.base.bidi_level,
            TextRun::Replacement(run) => run.bidi_level,
            TextRun::Justified(run) => run.base.bidi_level(),
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.bidi_level() & 1 == 1
    }

    pub fn typeface(&self) -> &Arc<Typeface> {
        match self {
            TextRun::Intrinsic(run) => &run.typeface,
            TextRun::Slice(slice) => &slice.base.typeface,
            TextRun::Replacement(run) => &run.typeface,
            TextRun::Justified(run) => run.base.typeface(),
        }
    }

    pub fn type_size(&self) -> f32 {
        match self {
            TextRun::Intrinsic(run) => run.type_size,
            TextRun::Slice(slice) => slice.base.type_size,
            TextRun::Replacement(run) => run.type_size,
            TextRun::Justified(run) => run.base.type_size(),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TextRun::Intrinsic(run) => run.direction,
            TextRun::Slice(slice) => slice.base.direction,
            TextRun::Replacement(_) => Direction::LeftToRight,
            TextRun::Justified(run) => run.base.direction(),
        }
    }

    pub fn ascent(&self) -> f32 {
        match self {
            TextRun::Intrinsic(run) => run.ascent,
            TextRun::Slice(slice) => slice.base.ascent,
            TextRun::Replacement(run) => run.ascent,
            TextRun::Justified(run) => run.base.ascent(),
        }
    }

    pub fn descent(&self) -> f32 {
        match self {
            TextRun::Intrinsic(run) => run.descent,
            TextRun::Slice(slice) => slice.base.descent,
            TextRun::Replacement(run) => run.descent,
            TextRun::Justified(run) => run.base.descent(),
        }
    }

    pub fn leading(&self) -> f32 {
        match self {
            TextRun::Intrinsic(run) => run.leading,
            TextRun::Slice(slice) => slice.base.leading,
            TextRun::Replacement(run) => run.leading,
            TextRun::Justified(run) => run.base.leading(),
        }
    }

    pub fn height(&self) -> f32 {
        self.ascent() + self.descent() + self.leading()
    }

    /// Style annotations carried by this run.
    pub fn spans(&self) -> &[Span] {
        match self {
            TextRun::Slice(slice) => &slice.spans,
            TextRun::Justified(run) => run.base.spans(),
            _ => &[],
        }
    }

    /// The inline object backing a replacement run.
    pub fn replacement(&self) -> Option<&Arc<dyn Replacement>> {
        match self {
            TextRun::Replacement(run) => Some(run.replacement()),
            TextRun::Justified(run) => run.base.replacement(),
            _ => None,
        }
    }

    /// Characters of the leading boundary cluster excluded by a slice.
    pub fn start_extra(&self) -> usize {
        match self {
            TextRun::Slice(slice) => slice.char_start - slice.base.cluster_start(slice.char_start),
            TextRun::Justified(run) => run.base.start_extra(),
            _ => 0,
        }
    }

    /// Characters of the trailing boundary cluster excluded by a slice.
    pub fn end_extra(&self) -> usize {
        match self {
            TextRun::Slice(slice) => slice.base.cluster_end(slice.char_end - 1) - slice.char_end,
            TextRun::Justified(run) => run.base.end_extra(),
            _ => 0,
        }
    }

    pub fn glyph_count(&self) -> usize {
        match self {
            TextRun::Intrinsic(run) => run.glyph_count(),
            TextRun::Slice(slice) => slice.glyph_count,
            TextRun::Replacement(_) => 1,
            TextRun::Justified(run) => run.base.glyph_count(),
        }
    }

    pub fn glyph_ids(&self) -> &[GlyphId] {
        match self {
            TextRun::Intrinsic(run) => &run.glyph_ids,
            TextRun::Slice(slice) => {
                &slice.base.glyph_ids[slice.glyph_offset..slice.glyph_offset + slice.glyph_count]
            }
            TextRun::Replacement(run) => &run.glyph_ids,
            TextRun::Justified(run) => run.base.glyph_ids(),
        }
    }

    pub fn glyph_offsets(&self) -> &[(f32, f32)] {
        match self {
            TextRun::Intrinsic(run) => &run.glyph_offsets,
            TextRun::Slice(slice) => {
                &slice.base.glyph_offsets
                    [slice.glyph_offset..slice.glyph_offset + slice.glyph_count]
            }
            TextRun::Replacement(run) => &run.glyph_offsets,
            TextRun::Justified(run) => run.base.glyph_offsets(),
        }
    }

    pub fn glyph_advances(&self) -> &[f32] {
        match self {
            TextRun::Intrinsic(run) => &run.glyph_advances,
            TextRun::Slice(slice) => {
                &slice.base.glyph_advances
                    [slice.glyph_offset..slice.glyph_offset + slice.glyph_count]
            }
            TextRun::Replacement(run) => &run.glyph_advances,
            TextRun::Justified(run) => &run.glyph_advances,
        }
    }

    /// Char→glyph cluster map, relative to this run's glyph indexing.
    pub fn cluster_map(&self) -> ClusterMap {
        match self {
            TextRun::Intrinsic(run) => run.map_view(),
            TextRun::Slice(slice) => slice.map_view(),
            TextRun::Replacement(run) => ClusterMap::new(run.cluster_map.clone()),
            TextRun::Justified(run) => run.base.cluster_map(),
        }
    }

    /// Caret edges, relative to this run's visual left margin.
    pub fn caret_edges(&self) -> CaretEdges {
        match self {
            TextRun::Intrinsic(run) => run.edges_view(),
            TextRun::Slice(slice) => slice.edges_view(),
            TextRun::Replacement(run) => run.edges_view(),
            TextRun::Justified(run) => run.edges_view(),
        }
    }

    /// Start of the cluster containing `char_index` (absolute index).
    pub fn cluster_start(&self, char_index: usize) -> usize {
        match self {
            TextRun::Intrinsic(run) => run.cluster_start(char_index),
            TextRun::Slice(slice) => slice.base.cluster_start(char_index),
            TextRun::Replacement(run) => run.char_start,
            TextRun::Justified(run) => run.base.cluster_start(char_index),
        }
    }

    /// End of the cluster containing `char_index` (absolute index).
    pub fn cluster_end(&self, char_index: usize) -> usize {
        match self {
            TextRun::Intrinsic(run) => run.cluster_end(char_index),
            TextRun::Slice(slice) => slice.base.cluster_end(char_index),
            TextRun::Replacement(run) => run.char_end,
            TextRun::Justified(run) => run.base.cluster_end(char_index),
        }
    }

    /// Glyph range covering the characters `[from, to)`, relative to this
    /// run's glyph indexing.
    pub fn glyph_range_for_chars(&self, from: usize, to: usize) -> Range<usize> {
        match self {
            TextRun::Intrinsic(run) => run.glyph_range_for_chars(from, to),
            TextRun::Slice(slice) => {
                let range = slice.base.glyph_range_for_chars(from, to);
                (range.start - slice.glyph_offset)..(range.end - slice.glyph_offset)
            }
            TextRun::Replacement(_) => 0..1,
            TextRun::Justified(run) => run.base.glyph_range_for_chars(from, to),
        }
    }

    pub fn leading_glyph_index(&self, char_index: usize) -> usize {
        match self {
            TextRun::Intrinsic(run) => run.leading_glyph_index(char_index),
            TextRun::Slice(slice) => {
                slice.base.leading_glyph_index(char_index) - slice.glyph_offset
            }
            TextRun::Replacement(_) => 0,
            TextRun::Justified(run) => run.base.leading_glyph_index(char_index),
        }
    }

    pub fn trailing_glyph_index(&self, char_index: usize) -> usize {
        match self {
            TextRun::Intrinsic(run) => run.trailing_glyph_index(char_index),
            TextRun::Slice(slice) => {
                slice.base.trailing_glyph_index(char_index) - slice.glyph_offset
            }
            TextRun::Replacement(_) => 0,
            TextRun::Justified(run) => run.base.trailing_glyph_index(char_index),
        }
    }

    /// Left margin of the caret-edge span `[from, to]`.
    pub fn caret_boundary(&self, from: usize, to: usize) -> f32 {
        match self {
            TextRun::Intrinsic(run) => run.caret_boundary(from, to),
            TextRun::Slice(slice) => slice.base.caret_boundary(from, to) - slice.caret_boundary,
            TextRun::Replacement(_) => 0.0,
            TextRun::Justified(run) => {
                let actual_start = run.actual_start();
                run.edges_view().left_margin(
                    run.base.is_rtl(),
                    from - actual_start,
                    to - actual_start,
                )
            }
        }
    }

    /// Caret offset of `char_index` from this run's visual left margin.
    pub fn caret_edge(&self, char_index: usize) -> f32 {
        match self {
            TextRun::Intrinsic(run) => run.caret_edge(char_index),
            TextRun::Slice(slice) => slice.base.caret_edge(char_index) - slice.caret_boundary,
            TextRun::Replacement(run) => run.caret_edges[char_index - run.char_start],
            TextRun::Justified(run) => {
                run.edges_view().get(char_index - run.actual_start())
            }
        }
    }

    /// Measured width of the character range `[from, to)`.
    pub fn range_distance(&self, from: usize, to: usize) -> f32 {
        match self {
            TextRun::Intrinsic(run) => run.range_distance(from, to),
            TextRun::Slice(slice) => slice.base.range_distance(from, to),
            TextRun::Replacement(run) => run.edges_view().distance(
                from - run.char_start,
                to - run.char_start,
                run.is_rtl(),
            ),
            TextRun::Justified(run) => {
                let actual_start = run.actual_start();
                run.edges_view().distance(
                    from - actual_start,
                    to - actual_start,
                    run.base.is_rtl(),
                )
            }
        }
    }

    /// Character index whose caret sits nearest to `distance` from this
    /// run's visual left margin.
    pub fn nearest_char_index(&self, distance: f32) -> usize {
        match self {
            TextRun::Intrinsic(run) => {
                run.nearest_char_index(distance, run.char_start, run.char_end)
            }
            TextRun::Slice(slice) => {
                slice
                    .base
                    .nearest_char_index(distance, slice.char_start, slice.char_end)
            }
            TextRun::Replacement(run) => {
                run.edges_view()
                    .nearest_index(run.is_rtl(), 0, run.char_end - run.char_start, distance)
                    + run.char_start
            }
            TextRun::Justified(run) => {
                let actual_start = run.actual_start();
                run.edges_view().nearest_index(
                    run.base.is_rtl(),
                    run.base.char_start() - actual_start,
                    run.base.char_end() - actual_start,
                    distance,
                ) + actual_start
            }
        }
    }

    /// Sum of glyph advances over `[glyph_start, glyph_end)`.
    pub fn typographic_extent(&self, glyph_start: usize, glyph_end: usize) -> f32 {
        match self {
            TextRun::Replacement(run) => run.extent,
            _ => self.glyph_advances()[glyph_start..glyph_end].iter().sum(),
        }
    }

    /// Measured width of the whole run.
    pub fn width(&self) -> f32 {
        match self {
            TextRun::Replacement(run) => run.extent,
            _ => self.range_distance(self.char_start(), self.char_end()),
        }
    }
}

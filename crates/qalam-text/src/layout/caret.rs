use std::sync::Arc;

use crate::layout::cluster_map::ClusterMap;

/// Read-only caret-edge list over a shared backing array.
///
/// An edge holds the cumulative advance from the run's visual left margin
/// to a caret position; a run covering `n` characters has `n + 1` edges.
/// Slices reuse the parent's array with an offset and a boundary that is
/// subtracted from every value.
#[derive(Debug, Clone)]
pub struct CaretEdges {
    data: Arc<[f32]>,
    offset: usize,
    len: usize,
    boundary: f32,
}

impl CaretEdges {
    pub fn new(data: Arc<[f32]>) -> Self {
        let len = data.len();
        Self {
            data,
            offset: 0,
            len,
            boundary: 0.0,
        }
    }

    pub fn with_parts(data: Arc<[f32]>, offset: usize, len: usize, boundary: f32) -> Self {
        debug_assert!(offset + len <= data.len());
        Self {
            data,
            offset,
            len,
            boundary,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> f32 {
        debug_assert!(index < self.len);
        self.data[index + self.offset] - self.boundary
    }

    /// Edge closest to the visual left margin of the span `[first, last]`.
    pub fn left_margin(&self, is_rtl: bool, first: usize, last: usize) -> f32 {
        self.get(if is_rtl { last } else { first })
    }

    /// Distance covered by the edge span `[first, last]`.
    pub fn distance(&self, first: usize, last: usize, is_rtl: bool) -> f32 {
        let first_edge = self.get(first);
        let last_edge = self.get(last);

        if is_rtl {
            first_edge - last_edge
        } else {
            last_edge - first_edge
        }
    }

    /// Edge index nearest to `distance` from the visual left margin of the
    /// span `[first, last]`.
    ///
    /// Edge spans are short, so a linear scan from the appropriate end is
    /// used rather than a binary search. Ties at the midpoint round to the
    /// closer edge.
    pub fn nearest_index(&self, is_rtl: bool, first: usize, last: usize, distance: f32) -> usize {
        let left_margin = self.left_margin(is_rtl, first, last);

        let mut leading: Option<(usize, f32)> = None;
        let mut trailing: Option<(usize, f32)> = None;

        let mut index = if is_rtl { last as isize } else { first as isize };
        let step: isize = if is_rtl { -1 } else { 1 };

        while index >= first as isize && index <= last as isize {
            let caret_edge = self.get(index as usize) - left_margin;

            if caret_edge <= distance {
                leading = Some((index as usize, caret_edge));
            } else {
                trailing = Some((index as usize, caret_edge));
                break;
            }

            index += step;
        }

        match (leading, trailing) {
            // Nothing is covered by the input distance.
            (None, _) => first,
            // Whole span is covered by the input distance.
            (Some((leading_index, _)), None) => {
                let _ = leading_index;
                last
            }
            (Some((leading_index, leading_edge)), Some((trailing_index, trailing_edge))) => {
                if distance <= (leading_edge + trailing_edge) / 2.0 {
                    leading_index
                } else {
                    trailing_index
                }
            }
        }
    }
}

/// Derives caret edges from glyph advances and a cluster map.
///
/// Walks character positions, groups positions that share a glyph cluster,
/// sums the advances of the cluster's glyphs and divides the sum evenly
/// across the cluster's caret stops. The optional stop mask withholds
/// interior caret positions (e.g. for diacritics).
pub struct CaretEdgesBuilder<'a> {
    is_backward: bool,
    is_rtl: bool,
    glyph_advances: &'a [f32],
    cluster_map: &'a ClusterMap,
    caret_stops: Option<&'a [bool]>,
}

impl<'a> CaretEdgesBuilder<'a> {
    pub fn new(glyph_advances: &'a [f32], cluster_map: &'a ClusterMap) -> Self {
        Self {
            is_backward: false,
            is_rtl: false,
            glyph_advances,
            cluster_map,
            caret_stops: None,
        }
    }

    pub fn backward(mut self, is_backward: bool) -> Self {
        self.is_backward = is_backward;
        self
    }

    pub fn rtl(mut self, is_rtl: bool) -> Self {
        self.is_rtl = is_rtl;
        self
    }

    pub fn caret_stops(mut self, caret_stops: Option<&'a [bool]>) -> Self {
        self.caret_stops = caret_stops;
        self
    }

    fn build_caret_advances(&self) -> Vec<f32> {
        let code_unit_count = self.cluster_map.len();
        let mut caret_advances = vec![0.0f32; code_unit_count + 1];

        // Glyph cursors are kept one past the actual index so that zero can
        // mark the position before the first glyph of a backward run.
        let mut glyph_index = self.cluster_map.get(0) + 1;
        let mut ref_index = glyph_index;
        let mut total_stops = 0usize;
        let mut cluster_start = 0usize;

        for code_unit_index in 1..=code_unit_count {
            let old_index = glyph_index;

            if code_unit_index != code_unit_count {
                glyph_index = self.cluster_map.get(code_unit_index) + 1;

                if let Some(stops) = self.caret_stops {
                    if !stops[code_unit_index - 1] {
                        continue;
                    }
                }
                total_stops += 1;
            } else {
                total_stops += 1;
                glyph_index = if self.is_backward {
                    0
                } else {
                    self.glyph_advances.len() + 1
                };
            }

            if glyph_index != old_index {
                // Find the advance of the current cluster.
                let mut cluster_advance = 0.0f32;
                if self.is_backward {
                    while ref_index > glyph_index {
                        cluster_advance += self.glyph_advances[ref_index - 1];
                        ref_index -= 1;
                    }
                } else {
                    while ref_index < glyph_index {
                        cluster_advance += self.glyph_advances[ref_index - 1];
                        ref_index += 1;
                    }
                }

                // Divide the advance evenly between the cluster's stops.
                let mut distance = 0.0f32;
                let mut counter = 1usize;
                while cluster_start < code_unit_index {
                    let mut advance = 0.0;

                    let is_stop = self
                        .caret_stops
                        .map_or(true, |stops| stops[cluster_start])
                        || cluster_start == code_unit_count - 1;
                    if is_stop {
                        let previous = distance;
                        distance = (cluster_advance * counter as f32) / total_stops as f32;
                        advance = distance - previous;
                        counter += 1;
                    }

                    caret_advances[cluster_start] = advance;
                    cluster_start += 1;
                }

                total_stops = 0;
            }
        }

        caret_advances
    }

    /// Build the cumulative caret-edge array of length `char_count + 1`.
    ///
    /// Edge 0 is pinned to zero for left-to-right runs; the last edge is
    /// pinned to zero for right-to-left runs.
    pub fn build(self) -> Vec<f32> {
        let code_unit_count = self.cluster_map.len();
        if code_unit_count == 0 {
            return vec![0.0];
        }

        let mut caret_edges = self.build_caret_advances();
        let mut distance = 0.0f32;

        if self.is_rtl {
            // Last edge should be zero.
            caret_edges[code_unit_count] = 0.0;

            for i in (0..code_unit_count).rev() {
                distance += caret_edges[i];
                caret_edges[i] = distance;
            }
        } else {
            let mut advance = caret_edges[0];

            // First edge should be zero.
            caret_edges[0] = 0.0;

            for i in 1..=code_unit_count {
                distance += advance;
                advance = caret_edges[i];
                caret_edges[i] = distance;
            }
        }

        caret_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_map(values: &[usize]) -> ClusterMap {
        ClusterMap::new(Arc::from(values.to_vec()))
    }

    fn assert_edges(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn forward_ltr_single_glyph_clusters() {
        let map = cluster_map(&[0, 1, 2]);
        let advances = [10.0, 20.0, 30.0];
        let edges = CaretEdgesBuilder::new(&advances, &map).build();
        assert_edges(&edges, &[0.0, 10.0, 30.0, 60.0]);
    }

    #[test]
    fn backward_rtl_pins_last_edge_to_zero() {
        // Ten RTL chars, one cluster per character, each 5 units wide.
        let map = cluster_map(&[9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
        let advances = [5.0f32; 10];
        let edges = CaretEdgesBuilder::new(&advances, &map)
            .backward(true)
            .rtl(true)
            .build();
        assert_edges(
            &edges,
            &[50.0, 45.0, 40.0, 35.0, 30.0, 25.0, 20.0, 15.0, 10.0, 5.0, 0.0],
        );
    }

    #[test]
    fn ligature_advance_divides_evenly() {
        // Two chars share one glyph of width 12.
        let map = cluster_map(&[0, 0]);
        let advances = [12.0];
        let edges = CaretEdgesBuilder::new(&advances, &map).build();
        assert_edges(&edges, &[0.0, 6.0, 12.0]);
    }

    #[test]
    fn caret_stops_withhold_interior_positions() {
        // Two chars share one glyph; the first position is not a caret
        // stop, so the interior edge collapses onto the cluster start and
        // the whole advance lands on the remaining stop.
        let map = cluster_map(&[0, 0]);
        let advances = [12.0];
        let stops = [false, true];
        let edges = CaretEdgesBuilder::new(&advances, &map)
            .caret_stops(Some(&stops))
            .build();
        assert_edges(&edges, &[0.0, 0.0, 12.0]);
    }

    #[test]
    fn caret_stops_redistribute_cluster_advance() {
        // Base + mark + base: the mark position is masked, the pooled
        // advance splits across the two stop positions.
        let map = cluster_map(&[0, 0, 1]);
        let advances = [12.0, 8.0];
        let stops = [true, false, true];
        let edges = CaretEdgesBuilder::new(&advances, &map)
            .caret_stops(Some(&stops))
            .build();
        assert_edges(&edges, &[0.0, 10.0, 10.0, 20.0]);
    }

    #[test]
    fn monotonic_for_ltr() {
        let map = cluster_map(&[0, 1, 1, 2]);
        let advances = [4.0, 6.0, 2.0];
        let edges = CaretEdgesBuilder::new(&advances, &map).build();
        assert_eq!(edges[0], 0.0);
        assert!(edges.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn nearest_index_rounds_at_midpoint() {
        let edges = CaretEdges::new(Arc::from(vec![0.0f32, 10.0, 20.0]));
        assert_eq!(edges.nearest_index(false, 0, 2, -1.0), 0);
        assert_eq!(edges.nearest_index(false, 0, 2, 4.9), 0);
        assert_eq!(edges.nearest_index(false, 0, 2, 5.1), 1);
        assert_eq!(edges.nearest_index(false, 0, 2, 25.0), 2);
    }

    #[test]
    fn nearest_index_rtl_scans_from_the_end() {
        let edges = CaretEdges::new(Arc::from(vec![20.0f32, 10.0, 0.0]));
        // Distance from the visual left margin; index 2 sits at the left.
        assert_eq!(edges.nearest_index(true, 0, 2, 0.0), 2);
        assert_eq!(edges.nearest_index(true, 0, 2, 9.0), 1);
        assert_eq!(edges.nearest_index(true, 0, 2, 19.0), 0);
    }

    #[test]
    fn distance_is_direction_aware() {
        let ltr = CaretEdges::new(Arc::from(vec![0.0f32, 10.0, 30.0]));
        assert_eq!(ltr.distance(0, 2, false), 30.0);

        let rtl = CaretEdges::new(Arc::from(vec![30.0f32, 20.0, 0.0]));
        assert_eq!(rtl.distance(0, 2, true), 30.0);
    }
}

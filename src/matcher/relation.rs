//! Rotation- and translation-invariant pair relations.
//!
//! A compiled minutia set keeps at most `max_minutiae` of its most reliable
//! minutiae and a table of every pair within the configured distance range,
//! sorted by distance so that compatible gallery pairs for a probe pair form a
//! contiguous run found by binary search.

use crate::matcher::MatchConfig;
use crate::minutia::{Minutia, MinutiaSet};
use crate::util::math::{atan2_deg, normalize_deg};

/// Geometry of an unordered minutia pair, measured from `a` to `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairwiseRelation {
    /// Index of the first minutia in the compiled set.
    pub a: usize,
    /// Index of the second minutia in the compiled set.
    pub b: usize,
    pub distance: f32,
    /// Direction of the line from `a` to `b`, in [0, 360).
    pub line_angle_deg: f32,
    /// Line direction relative to the orientation of `a`.
    pub bearing_a_deg: f32,
    /// Reverse line direction relative to the orientation of `b`.
    pub bearing_b_deg: f32,
}

impl PairwiseRelation {
    pub(crate) fn between(points: &[Minutia], a: usize, b: usize) -> Self {
        let pa = points[a];
        let pb = points[b];
        let line = atan2_deg(pb.y - pa.y, pb.x - pa.x);
        Self {
            a,
            b,
            distance: pa.distance(&pb),
            line_angle_deg: line,
            bearing_a_deg: normalize_deg(line - pa.angle_deg),
            bearing_b_deg: normalize_deg(line + 180.0 - pb.angle_deg),
        }
    }
}

/// Minutia set prepared for repeated matching.
#[derive(Clone, Debug)]
pub struct CompiledMinutiae {
    points: Vec<Minutia>,
    source_indices: Vec<usize>,
    relations: Vec<PairwiseRelation>,
}

impl CompiledMinutiae {
    /// Selects the most reliable minutiae and builds the relation table.
    pub fn compile(set: &MinutiaSet, cfg: &MatchConfig) -> Self {
        let mut order: Vec<usize> = (0..set.len()).collect();
        let all = set.as_slice();
        order.sort_by(|&i, &j| {
            let (a, b) = (&all[i], &all[j]);
            b.reliability
                .total_cmp(&a.reliability)
                .then(a.y.total_cmp(&b.y))
                .then(a.x.total_cmp(&b.x))
                .then(a.angle_deg.total_cmp(&b.angle_deg))
        });
        order.truncate(cfg.max_minutiae);

        let points: Vec<Minutia> = order.iter().map(|&i| all[i]).collect();
        let mut relations = Vec::new();
        for a in 0..points.len() {
            for b in a + 1..points.len() {
                let d = points[a].distance(&points[b]);
                if d >= cfg.min_pair_distance && d <= cfg.max_pair_distance {
                    relations.push(PairwiseRelation::between(&points, a, b));
                }
            }
        }
        relations.sort_by(|r, s| {
            r.distance
                .total_cmp(&s.distance)
                .then(r.a.cmp(&s.a))
                .then(r.b.cmp(&s.b))
        });

        Self {
            points,
            source_indices: order,
            relations,
        }
    }

    /// Returns the number of selected minutiae.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the selected minutiae, most reliable first.
    pub fn minutiae(&self) -> &[Minutia] {
        &self.points
    }

    /// Returns the relation table sorted by distance.
    pub fn relations(&self) -> &[PairwiseRelation] {
        &self.relations
    }

    /// Maps a compiled index back to the index in the source set.
    pub fn source_index(&self, idx: usize) -> Option<usize> {
        self.source_indices.get(idx).copied()
    }

    /// Relations whose distance lies strictly within `tolerance` of `distance`.
    pub(crate) fn relations_near(&self, distance: f32, tolerance: f32) -> &[PairwiseRelation] {
        let lo = self
            .relations
            .partition_point(|r| r.distance <= distance - tolerance);
        let hi = self
            .relations
            .partition_point(|r| r.distance < distance + tolerance);
        self.relations.get(lo..hi.max(lo)).unwrap_or(&[])
    }
}

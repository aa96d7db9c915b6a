//! Rotation- and translation-invariant minutiae matching.
//!
//! Matching compares intra-set pair relations, so neither set needs to be
//! aligned beforehand. The score is the size of the largest group of
//! correspondences that agree on one rigid motion.

mod cluster;
mod relation;
mod transform;

pub use relation::{CompiledMinutiae, PairwiseRelation};
pub use transform::RigidTransform;

use crate::minutia::MinutiaSet;
use crate::trace::{trace_event, trace_span};
use crate::util::{RidgeMatchError, RidgeMatchResult};

/// Configuration for minutiae matching.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchConfig {
    /// Pair distances closer than this are compatible.
    pub distance_tolerance: f32,
    /// Bearing compatibility window in degrees.
    pub angle_tolerance_deg: f32,
    /// Shortest pair kept in a relation table.
    pub min_pair_distance: f32,
    /// Longest pair kept in a relation table.
    pub max_pair_distance: f32,
    /// Rotation agreement within a cluster, in degrees.
    pub transform_angle_tolerance_deg: f32,
    /// Position agreement within a cluster, in pixels.
    pub translation_tolerance: f32,
    /// Fraction of cluster members a new correspondence must agree with.
    pub cluster_agreement_fraction: f32,
    /// Most reliable minutiae kept per set.
    pub max_minutiae: usize,
    /// Score gallery entries in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            distance_tolerance: 10.0,
            angle_tolerance_deg: 12.0,
            min_pair_distance: 8.0,
            max_pair_distance: 125.0,
            transform_angle_tolerance_deg: 20.0,
            translation_tolerance: 20.0,
            cluster_agreement_fraction: 0.5,
            max_minutiae: 150,
            parallel: false,
        }
    }
}

impl MatchConfig {
    /// Checks that every option is in range.
    pub fn validate(&self) -> RidgeMatchResult<()> {
        let invalid = |reason| Err(RidgeMatchError::InvalidConfig { reason });
        let tolerances = [
            self.distance_tolerance,
            self.angle_tolerance_deg,
            self.transform_angle_tolerance_deg,
            self.translation_tolerance,
        ];
        if tolerances.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return invalid("tolerances must be finite and non-negative");
        }
        if !(self.min_pair_distance.is_finite() && self.max_pair_distance.is_finite())
            || self.min_pair_distance < 0.0
            || self.min_pair_distance > self.max_pair_distance
        {
            return invalid("pair distance range must satisfy 0 <= min <= max");
        }
        if !(0.0..=1.0).contains(&self.cluster_agreement_fraction) {
            return invalid("cluster_agreement_fraction must lie in [0, 1]");
        }
        if self.max_minutiae < 2 {
            return invalid("max_minutiae must be at least 2");
        }
        Ok(())
    }
}

/// A probe minutia paired with a gallery minutia.
///
/// Indices refer to the original (uncompiled) sets.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Correspondence {
    pub probe: usize,
    pub gallery: usize,
    /// Motion implied by the pair-of-pairs that introduced this pairing.
    pub transform: RigidTransform,
}

/// Least-squares alignment of the winning cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alignment {
    /// Maps probe coordinates onto gallery coordinates.
    pub transform: RigidTransform,
    /// Mean distance between mapped probe and gallery minutiae.
    pub mean_residual: f32,
}

/// Outcome of comparing two minutia sets.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchResult {
    /// Number of mutually consistent correspondences.
    pub score: u32,
    /// Probe minutiae considered after capping.
    pub probe_minutiae: usize,
    /// Gallery minutiae considered after capping.
    pub gallery_minutiae: usize,
    /// Threshold decision, when a threshold was supplied.
    pub matched: Option<bool>,
    pub correspondences: Vec<Correspondence>,
    pub alignment: Option<Alignment>,
}

impl MatchResult {
    fn empty(probe_minutiae: usize, gallery_minutiae: usize) -> Self {
        Self {
            score: 0,
            probe_minutiae,
            gallery_minutiae,
            matched: None,
            correspondences: Vec::new(),
            alignment: None,
        }
    }

    /// Records the decision `score >= threshold`.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.matched = Some(self.score >= threshold);
        self
    }
}

/// Gallery entry ranked by identification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    /// Position in the gallery slice.
    pub index: usize,
    pub score: u32,
}

/// Minutiae matcher with a fixed configuration.
#[derive(Clone, Debug)]
pub struct Matcher {
    cfg: MatchConfig,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            cfg: MatchConfig::default(),
        }
    }
}

impl Matcher {
    /// Creates a matcher after validating `cfg`.
    pub fn new(cfg: MatchConfig) -> RidgeMatchResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the matcher configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Compiles a set for repeated matching with this configuration.
    pub fn compile(&self, set: &MinutiaSet) -> CompiledMinutiae {
        CompiledMinutiae::compile(set, &self.cfg)
    }

    /// Compares two minutia sets.
    pub fn match_sets(&self, probe: &MinutiaSet, gallery: &MinutiaSet) -> MatchResult {
        self.match_compiled(&self.compile(probe), &self.compile(gallery))
    }

    /// Returns only the similarity score.
    pub fn score(&self, probe: &MinutiaSet, gallery: &MinutiaSet) -> u32 {
        self.match_sets(probe, gallery).score
    }

    /// Compares two sets and records whether the score reaches `threshold`.
    pub fn match_with_threshold(
        &self,
        probe: &MinutiaSet,
        gallery: &MinutiaSet,
        threshold: u32,
    ) -> MatchResult {
        self.match_sets(probe, gallery).with_threshold(threshold)
    }

    /// Compares two compiled sets.
    ///
    /// Both sets should be compiled with this matcher's configuration.
    pub fn match_compiled(
        &self,
        probe: &CompiledMinutiae,
        gallery: &CompiledMinutiae,
    ) -> MatchResult {
        let _span = trace_span!("match", probe = probe.len(), gallery = gallery.len()).entered();

        if probe.is_empty() || gallery.is_empty() {
            trace_event!(
                "match_empty_input",
                probe = probe.len(),
                gallery = gallery.len()
            );
            return MatchResult::empty(probe.len(), gallery.len());
        }

        let links = cluster::pair_matches(probe, gallery, &self.cfg);
        trace_event!("pair_matches", count = links.len());
        let Some(best) = cluster::best_cluster(probe, gallery, &links, &self.cfg) else {
            return MatchResult::empty(probe.len(), gallery.len());
        };

        let correspondences = best
            .members
            .iter()
            .filter_map(|m| {
                Some(Correspondence {
                    probe: probe.source_index(m.probe)?,
                    gallery: gallery.source_index(m.gallery)?,
                    transform: m.transform,
                })
            })
            .collect::<Vec<_>>();
        let score = u32::try_from(correspondences.len()).unwrap_or(u32::MAX);
        trace_event!("match", score = score);

        MatchResult {
            score,
            probe_minutiae: probe.len(),
            gallery_minutiae: gallery.len(),
            matched: None,
            correspondences,
            alignment: Some(Alignment {
                transform: best.fit,
                mean_residual: best.mean_residual,
            }),
        }
    }

    /// Scores `probe` against every gallery entry, best first.
    ///
    /// Equal scores keep gallery order. Runs in parallel when the `rayon`
    /// feature is enabled and [`MatchConfig::parallel`] is set.
    pub fn identify(&self, probe: &MinutiaSet, gallery: &[CompiledMinutiae]) -> Vec<Candidate> {
        let _span = trace_span!("identify", gallery = gallery.len()).entered();
        let probe = self.compile(probe);

        #[cfg(feature = "rayon")]
        let mut ranked = if self.cfg.parallel {
            self.identify_par(&probe, gallery)
        } else {
            self.identify_seq(&probe, gallery)
        };
        #[cfg(not(feature = "rayon"))]
        let mut ranked = self.identify_seq(&probe, gallery);

        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        ranked
    }

    fn identify_seq(&self, probe: &CompiledMinutiae, gallery: &[CompiledMinutiae]) -> Vec<Candidate> {
        gallery
            .iter()
            .enumerate()
            .map(|(index, entry)| Candidate {
                index,
                score: self.match_compiled(probe, entry).score,
            })
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn identify_par(&self, probe: &CompiledMinutiae, gallery: &[CompiledMinutiae]) -> Vec<Candidate> {
        use rayon::prelude::*;
        gallery
            .par_iter()
            .enumerate()
            .map(|(index, entry)| Candidate {
                index,
                score: self.match_compiled(probe, entry).score,
            })
            .collect()
    }
}

/// Scores two sets with the default configuration.
pub fn match_score(probe: &MinutiaSet, gallery: &MinutiaSet) -> u32 {
    Matcher::default().score(probe, gallery)
}

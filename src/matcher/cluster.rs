//! Compatible pair-of-pairs and best-first consistency clustering.
//!
//! Every compatible pair-of-pairs links two correspondences and carries the
//! rigid transform implied by its two point pairs. Clusters start from the
//! longest-baseline links and grow through links that share a member
//! correspondence, lowest residual under the seed transform first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::matcher::relation::CompiledMinutiae;
use crate::matcher::transform::RigidTransform;
use crate::matcher::MatchConfig;
use crate::trace::trace_detail;
use crate::util::math::angle_dist_deg;

/// Two probe minutiae matched to two gallery minutiae.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PairMatch {
    pub(crate) probe: [usize; 2],
    pub(crate) gallery: [usize; 2],
    pub(crate) transform: RigidTransform,
    /// Probe pair distance.
    pub(crate) baseline: f32,
}

/// Correspondence accepted into a cluster, in compiled indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Member {
    pub(crate) probe: usize,
    pub(crate) gallery: usize,
    pub(crate) transform: RigidTransform,
}

#[derive(Clone, Debug)]
pub(crate) struct Cluster {
    pub(crate) members: Vec<Member>,
    pub(crate) fit: RigidTransform,
    pub(crate) mean_residual: f32,
}

fn point(set: &CompiledMinutiae, idx: usize) -> (f32, f32) {
    let m = set.minutiae()[idx];
    (m.x, m.y)
}

/// Enumerates compatible pair-of-pairs for both gallery orderings.
pub(crate) fn pair_matches(
    probe: &CompiledMinutiae,
    gallery: &CompiledMinutiae,
    cfg: &MatchConfig,
) -> Vec<PairMatch> {
    let tol = cfg.angle_tolerance_deg;
    let mut out = Vec::new();
    for r in probe.relations() {
        let (p0, p1) = (point(probe, r.a), point(probe, r.b));
        for g in gallery.relations_near(r.distance, cfg.distance_tolerance) {
            let direct = angle_dist_deg(r.bearing_a_deg, g.bearing_a_deg) <= tol
                && angle_dist_deg(r.bearing_b_deg, g.bearing_b_deg) <= tol;
            if direct {
                let rotation = g.line_angle_deg - r.line_angle_deg;
                let (q0, q1) = (point(gallery, g.a), point(gallery, g.b));
                out.push(PairMatch {
                    probe: [r.a, r.b],
                    gallery: [g.a, g.b],
                    transform: RigidTransform::from_segments(rotation, p0, p1, q0, q1),
                    baseline: r.distance,
                });
            }
            let swapped = angle_dist_deg(r.bearing_a_deg, g.bearing_b_deg) <= tol
                && angle_dist_deg(r.bearing_b_deg, g.bearing_a_deg) <= tol;
            if swapped {
                let rotation = g.line_angle_deg + 180.0 - r.line_angle_deg;
                let (q0, q1) = (point(gallery, g.b), point(gallery, g.a));
                out.push(PairMatch {
                    probe: [r.a, r.b],
                    gallery: [g.b, g.a],
                    transform: RigidTransform::from_segments(rotation, p0, p1, q0, q1),
                    baseline: r.distance,
                });
            }
        }
    }
    out
}

/// Pair-of-pairs grouped by the correspondences they contain.
struct CorrespondenceIndex {
    offsets: Vec<usize>,
    entries: Vec<usize>,
    gallery_len: usize,
}

impl CorrespondenceIndex {
    fn build(matches: &[PairMatch], probe_len: usize, gallery_len: usize) -> Self {
        let keys = probe_len * gallery_len;
        let mut offsets = vec![0usize; keys + 1];
        for pm in matches {
            for slot in 0..2 {
                offsets[pm.probe[slot] * gallery_len + pm.gallery[slot] + 1] += 1;
            }
        }
        for k in 0..keys {
            offsets[k + 1] += offsets[k];
        }
        let mut cursor = offsets.clone();
        let mut entries = vec![0usize; offsets[keys]];
        for (idx, pm) in matches.iter().enumerate() {
            for slot in 0..2 {
                let key = pm.probe[slot] * gallery_len + pm.gallery[slot];
                entries[cursor[key]] = idx;
                cursor[key] += 1;
            }
        }
        Self {
            offsets,
            entries,
            gallery_len,
        }
    }

    fn get(&self, probe: usize, gallery: usize) -> &[usize] {
        let key = probe * self.gallery_len + gallery;
        match (self.offsets.get(key), self.offsets.get(key + 1)) {
            (Some(&lo), Some(&hi)) => &self.entries[lo..hi],
            _ => &[],
        }
    }
}

/// Heap entry ordered so that the lowest residual pops first.
#[derive(Clone, Copy, Debug)]
struct Frontier {
    residual: f32,
    entry: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .residual
            .total_cmp(&self.residual)
            .then(other.entry.cmp(&self.entry))
    }
}

/// Scratch buffers reused across seeds; `stamp` invalidates them per cluster.
struct Workspace {
    stamp: u32,
    visited: Vec<u32>,
    probe_claim: Vec<(u32, usize)>,
    gallery_claim: Vec<(u32, usize)>,
    heap: BinaryHeap<Frontier>,
}

impl Workspace {
    fn new(entries: usize, probe_len: usize, gallery_len: usize) -> Self {
        Self {
            stamp: 0,
            visited: vec![0; entries],
            probe_claim: vec![(0, 0); probe_len],
            gallery_claim: vec![(0, 0); gallery_len],
            heap: BinaryHeap::new(),
        }
    }

    fn claimed_probe(&self, probe: usize) -> Option<usize> {
        let (stamp, gallery) = self.probe_claim[probe];
        (stamp == self.stamp).then_some(gallery)
    }

    fn claimed_gallery(&self, gallery: usize) -> Option<usize> {
        let (stamp, probe) = self.gallery_claim[gallery];
        (stamp == self.stamp).then_some(probe)
    }

    fn claim(&mut self, probe: usize, gallery: usize) {
        self.probe_claim[probe] = (self.stamp, gallery);
        self.gallery_claim[gallery] = (self.stamp, probe);
    }
}

struct Grower<'a> {
    probe: &'a CompiledMinutiae,
    gallery: &'a CompiledMinutiae,
    matches: &'a [PairMatch],
    index: &'a CorrespondenceIndex,
    cfg: &'a MatchConfig,
}

impl Grower<'_> {
    fn residual(&self, transform: &RigidTransform, probe: usize, gallery: usize) -> f32 {
        transform.residual(point(self.probe, probe), point(self.gallery, gallery))
    }

    fn agrees(&self, member: &Member, candidate: &RigidTransform, probe: usize, gallery: usize) -> bool {
        angle_dist_deg(member.transform.rotation_deg, candidate.rotation_deg)
            <= self.cfg.transform_angle_tolerance_deg
            && self.residual(&member.transform, probe, gallery) <= self.cfg.translation_tolerance
    }

    fn push_frontier(&self, ws: &mut Workspace, seed: &RigidTransform, probe: usize, gallery: usize) {
        for &entry in self.index.get(probe, gallery) {
            if ws.visited[entry] == ws.stamp {
                continue;
            }
            ws.visited[entry] = ws.stamp;
            let pm = &self.matches[entry];
            let residual = (0..2)
                .map(|s| self.residual(seed, pm.probe[s], pm.gallery[s]))
                .fold(0.0f32, f32::max);
            ws.heap.push(Frontier { residual, entry });
        }
    }

    /// Grows one cluster from `seed`.
    fn grow(&self, ws: &mut Workspace, seed: usize) -> Vec<Member> {
        ws.stamp += 1;
        ws.heap.clear();
        let seed_pm = self.matches[seed];
        let seed_t = seed_pm.transform;
        ws.visited[seed] = ws.stamp;

        let mut members = Vec::new();
        for s in 0..2 {
            ws.claim(seed_pm.probe[s], seed_pm.gallery[s]);
            members.push(Member {
                probe: seed_pm.probe[s],
                gallery: seed_pm.gallery[s],
                transform: seed_t,
            });
        }
        for s in 0..2 {
            self.push_frontier(ws, &seed_t, seed_pm.probe[s], seed_pm.gallery[s]);
        }

        while let Some(Frontier { entry, .. }) = ws.heap.pop() {
            let pm = self.matches[entry];
            let mut fresh = Vec::with_capacity(2);
            let mut conflict = false;
            for s in 0..2 {
                let (p, g) = (pm.probe[s], pm.gallery[s]);
                match (ws.claimed_probe(p), ws.claimed_gallery(g)) {
                    (Some(claimed), _) if claimed == g => {}
                    (None, None) => fresh.push((p, g)),
                    _ => conflict = true,
                }
            }
            if conflict {
                continue;
            }
            if fresh.is_empty() {
                continue;
            }

            let fraction = f64::from(self.cfg.cluster_agreement_fraction);
            let required = ((fraction * members.len() as f64).ceil() as usize).max(1);
            let joins = fresh.iter().all(|&(p, g)| {
                members
                    .iter()
                    .filter(|m| self.agrees(m, &pm.transform, p, g))
                    .count()
                    >= required
            });
            if !joins {
                continue;
            }
            for &(p, g) in &fresh {
                ws.claim(p, g);
                members.push(Member {
                    probe: p,
                    gallery: g,
                    transform: pm.transform,
                });
            }
            for &(p, g) in &fresh {
                self.push_frontier(ws, &seed_t, p, g);
            }
        }
        members
    }

    fn evaluate(&self, members: Vec<Member>) -> Cluster {
        let pairs: Vec<_> = members
            .iter()
            .map(|m| (point(self.probe, m.probe), point(self.gallery, m.gallery)))
            .collect();
        let fit = RigidTransform::fit(&pairs).unwrap_or_default();
        let mean_residual = if pairs.is_empty() {
            0.0
        } else {
            pairs.iter().map(|&(p, q)| fit.residual(p, q)).sum::<f32>() / pairs.len() as f32
        };
        Cluster {
            members,
            fit,
            mean_residual,
        }
    }
}

/// Largest consistent cluster, ties broken by the lowest mean fit residual.
pub(crate) fn best_cluster(
    probe: &CompiledMinutiae,
    gallery: &CompiledMinutiae,
    matches: &[PairMatch],
    cfg: &MatchConfig,
) -> Option<Cluster> {
    if matches.is_empty() {
        return None;
    }
    let index = CorrespondenceIndex::build(matches, probe.len(), gallery.len());
    let grower = Grower {
        probe,
        gallery,
        matches,
        index: &index,
        cfg,
    };
    let mut ws = Workspace::new(matches.len(), probe.len(), gallery.len());

    let mut seeds: Vec<usize> = (0..matches.len()).collect();
    seeds.sort_by(|&i, &j| {
        let (a, b) = (&matches[i], &matches[j]);
        b.baseline
            .total_cmp(&a.baseline)
            .then(a.probe.cmp(&b.probe))
            .then(a.gallery.cmp(&b.gallery))
            .then(i.cmp(&j))
    });

    // Every pair-of-pairs seeds a cluster, including ones already absorbed
    // into an earlier cluster.
    let ceiling = probe.len().min(gallery.len());
    let mut best: Option<Cluster> = None;
    let mut grown = 0usize;
    for seed in seeds {
        grown += 1;
        let members = grower.grow(&mut ws, seed);
        let candidate = grower.evaluate(members);
        let better = best.as_ref().map_or(true, |b| {
            candidate.members.len() > b.members.len()
                || (candidate.members.len() == b.members.len()
                    && candidate.mean_residual < b.mean_residual)
        });
        if better {
            best = Some(candidate);
        }
        if best.as_ref().is_some_and(|b| b.members.len() >= ceiling) {
            break;
        }
    }
    trace_detail!("clusters_grown", count = grown);
    best
}

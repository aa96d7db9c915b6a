//! Minutia candidates from the crossing structure of the skeleton.
//!
//! A skeleton pixel with one neighbour is a ridge ending. Pixels with three or
//! more neighbours are junction pixels; thinning often leaves a fork as a
//! small cluster of them, so 8-connected junction pixels are grouped first
//! and a group with exactly three branches leaving it yields one bifurcation.
//! Each candidate takes its undirected orientation from the direction map and
//! is given a direction by walking along the ridge.

use crate::image::Grid;
use crate::minutia::MinutiaKind;
use crate::preprocess::{DirectionMap, SegmentationMask};
use crate::skeleton::table::NEIGHBOR_OFFSETS;
use crate::skeleton::{neighbor_pattern, Skeleton};
use crate::trace::{trace_detail, trace_event, trace_span};
use crate::util::math::{angle_dist_deg, atan2_deg, normalize_deg, sin_cos_deg};

/// Why a ridge walk stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceStop {
    /// The walk reached its length limit.
    Length,
    /// The ridge ended (or closed on itself).
    Ending,
    /// The walk reached a pixel with three or more neighbours.
    Junction,
}

/// Outcome of walking along a ridge from a minutia.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RidgeTrace {
    /// Pixels stepped after leaving the start pixel.
    pub length: usize,
    /// Last pixel reached.
    pub end: (usize, usize),
    pub stop: TraceStop,
}

/// Unfiltered minutia found on the skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMinutia {
    pub x: usize,
    pub y: usize,
    pub kind: MinutiaKind,
    /// Directed orientation in [0, 360).
    pub angle_deg: f32,
    /// Walk along the ridge for endings; `None` for bifurcations.
    pub trace: Option<RidgeTrace>,
}

/// Finds ridge endings and bifurcations on foreground skeleton pixels.
///
/// `trace_length` bounds every ridge walk. Candidates are returned in raster
/// order.
pub fn detect(
    skeleton: &Skeleton,
    directions: &DirectionMap,
    mask: &SegmentationMask,
    trace_length: usize,
) -> Vec<RawMinutia> {
    let _span = trace_span!("detect").entered();

    let grid = skeleton.as_grid();
    let mut out = Vec::new();
    let mut junction_pixels = Vec::new();
    for (x, y, set) in grid.cells() {
        if !set || !mask.is_foreground(x, y) {
            continue;
        }
        match neighbor_pattern(grid, x, y).count_ones() {
            1 => out.extend(ending(grid, directions, (x, y), trace_length)),
            n if n >= 3 => junction_pixels.push((x, y)),
            _ => {}
        }
    }

    let groups = junction_groups(&junction_pixels);
    trace_detail!("junction_groups", count = groups.len());
    out.extend(
        groups
            .iter()
            .filter_map(|group| bifurcation(grid, directions, group, trace_length)),
    );
    out.sort_by_key(|m| (m.y, m.x));

    trace_event!("detect", candidates = out.len());
    out
}

fn ending(
    grid: &Grid<bool>,
    directions: &DirectionMap,
    at: (usize, usize),
    limit: usize,
) -> Option<RawMinutia> {
    let cell = directions.cell_at(at.0, at.1)?;
    let first = neighbors(grid, at.0, at.1).next()?;
    let trace = trace_ridge(grid, &[at], first, limit);
    Some(RawMinutia {
        x: at.0,
        y: at.1,
        kind: MinutiaKind::RidgeEnding,
        angle_deg: direct_away(cell.angle_deg, at, trace.end),
        trace: Some(trace),
    })
}

/// One bifurcation for a junction group with exactly three branches, placed
/// at the group pixel nearest the group centroid.
fn bifurcation(
    grid: &Grid<bool>,
    directions: &DirectionMap,
    group: &[(usize, usize)],
    limit: usize,
) -> Option<RawMinutia> {
    let exits = branch_exits(grid, group);
    if exits.len() != 3 {
        return None;
    }
    let at = centre_pixel(group)?;
    let cell = directions.cell_at(at.0, at.1)?;
    let branches: Vec<RidgeTrace> = exits
        .iter()
        .map(|&exit| trace_ridge(grid, group, exit, limit))
        .collect();
    let angle_deg = match stem(&branches, at) {
        Some(branch) => direct_away(cell.angle_deg, at, branch.end),
        None => normalize_deg(cell.angle_deg),
    };
    Some(RawMinutia {
        x: at.0,
        y: at.1,
        kind: MinutiaKind::Bifurcation,
        angle_deg,
        trace: None,
    })
}

fn touches(a: (usize, usize), b: (usize, usize)) -> bool {
    a != b && a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1
}

/// Labels of the 8-connected components of `pixels`, numbered from 0 in
/// order of first appearance.
fn components(pixels: &[(usize, usize)]) -> (Vec<usize>, usize) {
    let mut label = vec![usize::MAX; pixels.len()];
    let mut count = 0;
    for start in 0..pixels.len() {
        if label[start] != usize::MAX {
            continue;
        }
        label[start] = count;
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            for (j, &q) in pixels.iter().enumerate() {
                if label[j] == usize::MAX && touches(pixels[i], q) {
                    label[j] = count;
                    stack.push(j);
                }
            }
        }
        count += 1;
    }
    (label, count)
}

/// Splits junction pixels into 8-connected groups, each in raster order.
fn junction_groups(pixels: &[(usize, usize)]) -> Vec<Vec<(usize, usize)>> {
    let (label, count) = components(pixels);
    let mut groups = vec![Vec::new(); count];
    for (&p, &l) in pixels.iter().zip(&label) {
        groups[l].push(p);
    }
    for group in &mut groups {
        group.sort_by_key(|&(x, y)| (y, x));
    }
    groups
}

/// First exit pixel (raster order) of every branch leaving `group`.
///
/// Exit pixels that touch each other belong to the same branch.
fn branch_exits(grid: &Grid<bool>, group: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut exits: Vec<(usize, usize)> = group
        .iter()
        .flat_map(|&(x, y)| neighbors(grid, x, y))
        .filter(|p| !group.contains(p))
        .collect();
    exits.sort_by_key(|&(x, y)| (y, x));
    exits.dedup();

    let (label, count) = components(&exits);
    let mut firsts: Vec<Option<(usize, usize)>> = vec![None; count];
    for (&p, &l) in exits.iter().zip(&label) {
        firsts[l].get_or_insert(p);
    }
    firsts.into_iter().flatten().collect()
}

fn centre_pixel(group: &[(usize, usize)]) -> Option<(usize, usize)> {
    let n = group.len() as f32;
    let cx = group.iter().map(|p| p.0 as f32).sum::<f32>() / n;
    let cy = group.iter().map(|p| p.1 as f32).sum::<f32>() / n;
    let spread = |p: &(usize, usize)| (p.0 as f32 - cx).powi(2) + (p.1 as f32 - cy).powi(2);
    group
        .iter()
        .copied()
        .min_by(|a, b| spread(a).total_cmp(&spread(b)))
}

fn neighbors(grid: &Grid<bool>, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        grid.is_set(nx, ny).then_some((nx as usize, ny as usize))
    })
}

/// Neighbour count of `p` with the `origin` pixels counted as one node.
fn degree(grid: &Grid<bool>, p: (usize, usize), origin: &[(usize, usize)]) -> u32 {
    let mut count = 0;
    let mut touches_origin = false;
    for q in neighbors(grid, p.0, p.1) {
        if origin.contains(&q) {
            touches_origin = true;
        } else {
            count += 1;
        }
    }
    count + u32::from(touches_origin)
}

/// Walks from the `origin` pixels through `first` until the ridge ends,
/// branches or the walk reaches `limit` steps. Edge neighbours are preferred
/// over diagonal ones so that staircase pixels are not skipped.
pub(crate) fn trace_ridge(
    grid: &Grid<bool>,
    origin: &[(usize, usize)],
    first: (usize, usize),
    limit: usize,
) -> RidgeTrace {
    let mut visited = origin.to_vec();
    visited.push(first);
    let mut current = first;
    let mut length = 1usize;
    loop {
        let count = degree(grid, current, origin);
        if count >= 3 {
            return RidgeTrace {
                length,
                end: current,
                stop: TraceStop::Junction,
            };
        }
        if count <= 1 {
            return RidgeTrace {
                length,
                end: current,
                stop: TraceStop::Ending,
            };
        }
        if length >= limit {
            return RidgeTrace {
                length,
                end: current,
                stop: TraceStop::Length,
            };
        }
        let next = neighbors(grid, current.0, current.1)
            .filter(|p| !visited.contains(p))
            .min_by_key(|&(nx, ny)| usize::from(nx != current.0 && ny != current.1));
        let Some(next) = next else {
            return RidgeTrace {
                length,
                end: current,
                stop: TraceStop::Ending,
            };
        };
        visited.push(next);
        current = next;
        length += 1;
    }
}

/// Picks the stem of a bifurcation: the branch left over once the two
/// branches with the smallest angle between them are paired.
fn stem(branches: &[RidgeTrace], origin: (usize, usize)) -> Option<RidgeTrace> {
    if branches.len() != 3 {
        return None;
    }
    let heading = |t: &RidgeTrace| {
        atan2_deg(
            t.end.1 as f32 - origin.1 as f32,
            t.end.0 as f32 - origin.0 as f32,
        )
    };
    let headings: Vec<f32> = branches.iter().map(heading).collect();
    let pairs = [(0usize, 1usize, 2usize), (0, 2, 1), (1, 2, 0)];
    let mut best: Option<(f32, usize)> = None;
    for (a, b, rest) in pairs {
        let spread = angle_dist_deg(headings[a], headings[b]);
        if best.map_or(true, |(s, _)| spread < s) {
            best = Some((spread, rest));
        }
    }
    best.map(|(_, rest)| branches[rest])
}

/// Chooses between `ridge_deg` and its opposite so that the result points
/// away from `toward`.
fn direct_away(ridge_deg: f32, origin: (usize, usize), toward: (usize, usize)) -> f32 {
    let vx = toward.0 as f32 - origin.0 as f32;
    let vy = toward.1 as f32 - origin.1 as f32;
    let (sin, cos) = sin_cos_deg(ridge_deg);
    if cos * vx + sin * vy < 0.0 {
        normalize_deg(ridge_deg)
    } else {
        normalize_deg(ridge_deg + 180.0)
    }
}

//! False-minutia removal and reliability scoring.
//!
//! Rules run in a fixed order. Each rule decides its removals over the
//! survivors of the previous rule before applying any of them, so the result
//! does not depend on candidate order.

use crate::detect::{RawMinutia, TraceStop};
use crate::extract::ExtractConfig;
use crate::minutia::{Minutia, MinutiaKind, MinutiaSet};
use crate::preprocess::{DirectionMap, SegmentationMask};
use crate::trace::{trace_detail, trace_event, trace_span};

/// Chebyshev distance within which a spur's junction matches a bifurcation.
const SPUR_JUNCTION_RADIUS: usize = 2;

/// Applies the boundary, separation, fragment and coherence rules and scores
/// the survivors.
pub fn filter(
    raw: &[RawMinutia],
    directions: &DirectionMap,
    mask: &SegmentationMask,
    cfg: &ExtractConfig,
) -> MinutiaSet {
    let _span = trace_span!("filter", candidates = raw.len()).entered();

    let mut alive: Vec<bool> = raw
        .iter()
        .map(|m| mask.square_is_foreground(m.x, m.y, cfg.boundary_margin))
        .collect();
    trace_detail!("filter_boundary", survivors = count(&alive));

    remove_crowded(raw, &mut alive, cfg.min_separation);
    trace_detail!("filter_separation", survivors = count(&alive));

    remove_fragments(raw, &mut alive, cfg.min_ridge_length);
    trace_detail!("filter_fragments", survivors = count(&alive));

    for (m, keep) in raw.iter().zip(alive.iter_mut()) {
        if *keep {
            let coherence = directions.cell_at(m.x, m.y).map_or(0.0, |c| c.coherence);
            *keep = coherence >= cfg.min_coherence;
        }
    }
    trace_detail!("filter_coherence", survivors = count(&alive));

    let survivors: Vec<&RawMinutia> = raw
        .iter()
        .zip(&alive)
        .filter_map(|(m, &keep)| keep.then_some(m))
        .collect();
    let set: MinutiaSet = survivors
        .iter()
        .map(|m| {
            let coherence = directions.cell_at(m.x, m.y).map_or(0.0, |c| c.coherence);
            let contrast = unit(mask.contrast_at(m.x, m.y) / cfg.contrast_reference);
            let isolation = survivors
                .iter()
                .filter(|o| !std::ptr::eq(**o, *m))
                .map(|o| pixel_distance(m, o))
                .min_by(f32::total_cmp)
                .map_or(1.0, |d| unit(d / cfg.isolation_distance));
            let reliability = 0.5 * coherence + 0.25 * contrast + 0.25 * isolation;
            Minutia::new(m.x as f32, m.y as f32, m.angle_deg, m.kind, reliability)
        })
        .collect();

    trace_event!("filter", minutiae = set.len());
    set
}

fn count(alive: &[bool]) -> usize {
    alive.iter().filter(|&&a| a).count()
}

fn unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn pixel_distance(a: &RawMinutia, b: &RawMinutia) -> f32 {
    (a.x as f32 - b.x as f32).hypot(a.y as f32 - b.y as f32)
}

/// Drops every survivor that has another survivor closer than `min_separation`.
fn remove_crowded(raw: &[RawMinutia], alive: &mut [bool], min_separation: f32) {
    let mut drop = vec![false; raw.len()];
    for i in 0..raw.len() {
        if !alive[i] {
            continue;
        }
        for j in i + 1..raw.len() {
            if alive[j] && pixel_distance(&raw[i], &raw[j]) < min_separation {
                drop[i] = true;
                drop[j] = true;
            }
        }
    }
    for (keep, gone) in alive.iter_mut().zip(drop) {
        *keep &= !gone;
    }
}

/// Drops endings on short isolated fragments, and spurs together with the
/// bifurcation they hang from.
fn remove_fragments(raw: &[RawMinutia], alive: &mut [bool], min_ridge_length: usize) {
    let mut drop = vec![false; raw.len()];
    for (i, m) in raw.iter().enumerate() {
        if !alive[i] || m.kind != MinutiaKind::RidgeEnding {
            continue;
        }
        let Some(trace) = m.trace else {
            continue;
        };
        if trace.length > min_ridge_length {
            continue;
        }
        match trace.stop {
            TraceStop::Ending => drop[i] = true,
            TraceStop::Junction => {
                drop[i] = true;
                let (jx, jy) = trace.end;
                for (k, b) in raw.iter().enumerate() {
                    if alive[k]
                        && b.kind == MinutiaKind::Bifurcation
                        && b.x.abs_diff(jx) <= SPUR_JUNCTION_RADIUS
                        && b.y.abs_diff(jy) <= SPUR_JUNCTION_RADIUS
                    {
                        drop[k] = true;
                    }
                }
            }
            TraceStop::Length => {}
        }
    }
    for (keep, gone) in alive.iter_mut().zip(drop) {
        *keep &= !gone;
    }
}

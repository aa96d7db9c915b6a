//! Rigid 2D transforms between minutia frames.

use crate::minutia::Minutia;
use crate::util::math::{normalize_deg, sin_cos_deg, wrap_deg};

/// Rotation about the origin followed by a translation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidTransform {
    /// Rotation in degrees, in [-180, 180).
    pub rotation_deg: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation_deg: 0.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Maps a point.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let (sin, cos) = sin_cos_deg(self.rotation_deg);
        (cos * x - sin * y + self.tx, sin * x + cos * y + self.ty)
    }

    /// Maps a minutia, rotating its direction as well.
    pub fn apply_minutia(&self, m: &Minutia) -> Minutia {
        let (x, y) = self.apply(m.x, m.y);
        Minutia {
            x,
            y,
            angle_deg: normalize_deg(m.angle_deg + self.rotation_deg),
            ..*m
        }
    }

    /// Distance between the image of `p` and `q`.
    pub fn residual(&self, p: (f32, f32), q: (f32, f32)) -> f32 {
        let (x, y) = self.apply(p.0, p.1);
        (x - q.0).hypot(y - q.1)
    }

    /// Transform with the given rotation that maps the midpoint of `p0 p1`
    /// onto the midpoint of `q0 q1`.
    pub(crate) fn from_segments(
        rotation_deg: f32,
        p0: (f32, f32),
        p1: (f32, f32),
        q0: (f32, f32),
        q1: (f32, f32),
    ) -> Self {
        let rotation_deg = wrap_deg(rotation_deg);
        let (sin, cos) = sin_cos_deg(rotation_deg);
        let (px, py) = ((p0.0 + p1.0) * 0.5, (p0.1 + p1.1) * 0.5);
        let (qx, qy) = ((q0.0 + q1.0) * 0.5, (q0.1 + q1.1) * 0.5);
        Self {
            rotation_deg,
            tx: qx - (cos * px - sin * py),
            ty: qy - (sin * px + cos * py),
        }
    }

    /// Least-squares rigid fit mapping each `p` onto its `q`.
    ///
    /// Returns `None` for fewer than two pairs.
    pub fn fit(pairs: &[((f32, f32), (f32, f32))]) -> Option<Self> {
        if pairs.len() < 2 {
            return None;
        }
        let n = pairs.len() as f64;
        let (mut spx, mut spy, mut sqx, mut sqy) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for &(p, q) in pairs {
            spx += f64::from(p.0);
            spy += f64::from(p.1);
            sqx += f64::from(q.0);
            sqy += f64::from(q.1);
        }
        let (cpx, cpy, cqx, cqy) = (spx / n, spy / n, sqx / n, sqy / n);

        let mut dot = 0.0f64;
        let mut cross = 0.0f64;
        for &(p, q) in pairs {
            let (px, py) = (f64::from(p.0) - cpx, f64::from(p.1) - cpy);
            let (qx, qy) = (f64::from(q.0) - cqx, f64::from(q.1) - cqy);
            dot += px * qx + py * qy;
            cross += px * qy - py * qx;
        }
        let theta = cross.atan2(dot);
        let (sin, cos) = theta.sin_cos();
        Some(Self {
            rotation_deg: wrap_deg(theta.to_degrees() as f32),
            tx: (cqx - (cos * cpx - sin * cpy)) as f32,
            ty: (cqy - (sin * cpx + cos * cpy)) as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RigidTransform;

    #[test]
    fn segment_transform_maps_midpoints() {
        let t = RigidTransform::from_segments(90.0, (0.0, 0.0), (10.0, 0.0), (5.0, 5.0), (5.0, 15.0));
        let (x, y) = t.apply(5.0, 0.0);
        assert!((x - 5.0).abs() < 1e-4 && (y - 10.0).abs() < 1e-4);
        assert!(t.residual((0.0, 0.0), (5.0, 5.0)) < 1e-4);
    }

    #[test]
    fn fit_recovers_known_motion() {
        let truth = RigidTransform {
            rotation_deg: -35.0,
            tx: 14.0,
            ty: -3.0,
        };
        let pairs: Vec<_> = [(0.0, 0.0), (30.0, 5.0), (-12.0, 40.0), (7.0, -22.0)]
            .into_iter()
            .map(|p| (p, truth.apply(p.0, p.1)))
            .collect();
        let fit = RigidTransform::fit(&pairs).unwrap();
        assert!((fit.rotation_deg + 35.0).abs() < 1e-3);
        assert!((fit.tx - 14.0).abs() < 1e-3);
        assert!((fit.ty + 3.0).abs() < 1e-3);
        assert!(RigidTransform::fit(&pairs[..1]).is_none());
    }
}

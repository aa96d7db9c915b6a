//! Angle helpers shared by the extraction stages and the matcher.

/// Wraps an angle in degrees to the range [-180, 180).
pub(crate) fn wrap_deg(angle_deg: f32) -> f32 {
    let mut wrapped = angle_deg % 360.0;
    if wrapped < -180.0 {
        wrapped += 360.0;
    }
    if wrapped >= 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Normalizes a directed angle in degrees to [0, 360).
pub(crate) fn normalize_deg(angle_deg: f32) -> f32 {
    let wrapped = angle_deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Folds an undirected angle in degrees to [0, 180).
pub(crate) fn fold_deg_180(angle_deg: f32) -> f32 {
    let folded = angle_deg.rem_euclid(180.0);
    if folded >= 180.0 {
        0.0
    } else {
        folded
    }
}

/// Absolute circular difference between two directed angles, in [0, 180].
pub(crate) fn angle_dist_deg(a: f32, b: f32) -> f32 {
    wrap_deg(a - b).abs()
}

/// Computes sine and cosine for an angle in degrees.
pub(crate) fn sin_cos_deg(angle_deg: f32) -> (f32, f32) {
    angle_deg.to_radians().sin_cos()
}

/// Direction of the vector `(dx, dy)` in image coordinates, in [0, 360).
pub(crate) fn atan2_deg(dy: f32, dx: f32) -> f32 {
    normalize_deg(dy.atan2(dx).to_degrees())
}

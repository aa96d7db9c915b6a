//! Minutia values and minutia sets.

use crate::util::math::{normalize_deg, sin_cos_deg};

/// Structural type of a minutia.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MinutiaKind {
    /// A ridge that terminates.
    RidgeEnding,
    /// A ridge that splits into two.
    Bifurcation,
}

/// A ridge ending or bifurcation.
///
/// Coordinates are pixels in the resolution-normalized frame, `angle_deg` is
/// the directed orientation in [0, 360) measured from the +x axis towards +y
/// (image rows grow downwards), and `reliability` lies in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Minutia {
    pub x: f32,
    pub y: f32,
    pub angle_deg: f32,
    pub kind: MinutiaKind,
    pub reliability: f32,
}

impl Minutia {
    /// Creates a minutia, normalizing the angle and clamping the reliability.
    pub fn new(x: f32, y: f32, angle_deg: f32, kind: MinutiaKind, reliability: f32) -> Self {
        Self {
            x,
            y,
            angle_deg: normalize_deg(angle_deg),
            kind,
            reliability: if reliability.is_finite() {
                reliability.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// Applies a rigid transform: rotation about the origin, then translation.
    pub fn transformed(&self, rotation_deg: f32, tx: f32, ty: f32) -> Self {
        let (sin, cos) = sin_cos_deg(rotation_deg);
        Self {
            x: cos * self.x - sin * self.y + tx,
            y: sin * self.x + cos * self.y + ty,
            angle_deg: normalize_deg(self.angle_deg + rotation_deg),
            ..*self
        }
    }

    /// Euclidean distance to another minutia.
    pub fn distance(&self, other: &Minutia) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Minutiae extracted from one capture.
///
/// The order carries no meaning for matching.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MinutiaSet {
    minutiae: Vec<Minutia>,
}

impl MinutiaSet {
    /// Wraps a list of minutiae.
    pub fn new(minutiae: Vec<Minutia>) -> Self {
        Self { minutiae }
    }

    /// Returns the minutiae as a slice.
    pub fn as_slice(&self) -> &[Minutia] {
        &self.minutiae
    }

    /// Returns the number of minutiae.
    pub fn len(&self) -> usize {
        self.minutiae.len()
    }

    /// Returns true when the set holds no minutiae.
    pub fn is_empty(&self) -> bool {
        self.minutiae.is_empty()
    }

    /// Iterates over the minutiae.
    pub fn iter(&self) -> std::slice::Iter<'_, Minutia> {
        self.minutiae.iter()
    }

    /// Counts minutiae of the given kind.
    pub fn count_kind(&self, kind: MinutiaKind) -> usize {
        self.minutiae.iter().filter(|m| m.kind == kind).count()
    }

    /// Returns a copy of the set with a rigid transform applied to every minutia.
    pub fn transformed(&self, rotation_deg: f32, tx: f32, ty: f32) -> Self {
        Self::new(
            self.minutiae
                .iter()
                .map(|m| m.transformed(rotation_deg, tx, ty))
                .collect(),
        )
    }

    /// Consumes the set and returns the underlying minutiae.
    pub fn into_vec(self) -> Vec<Minutia> {
        self.minutiae
    }
}

impl FromIterator<Minutia> for MinutiaSet {
    fn from_iter<I: IntoIterator<Item = Minutia>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MinutiaSet {
    type Item = &'a Minutia;
    type IntoIter = std::slice::Iter<'a, Minutia>;

    fn into_iter(self) -> Self::IntoIter {
        self.minutiae.iter()
    }
}

//! Orientation enumeration for rectangular boxes.
//!
//! A box with edges (l, w, h) can be placed in up to six axis-aligned
//! rotations. The two upright rotations keep `h` vertical; the four side-laying
//! rotations tip the box so that `l` or `w` becomes the height.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{Dimensional, EPSILON_GENERAL, Vec3};

/// Growth of the height penalty in the side-laying stability score.
const HEIGHT_RATIO_FACTOR: f64 = 0.5;

/// Named assignment of the box edges to the container axes.
///
/// The axis code (e.g. `LWH`) lists which box edge runs along the container
/// length, width and height, in that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationKind {
    /// (l, w, h)
    Upright,
    /// (w, l, h)
    UprightRotated,
    /// (w, h, l)
    LaidSideL,
    /// (l, h, w)
    LaidSideW,
    /// (h, l, w)
    LaidHL,
    /// (h, w, l)
    LaidHW,
}

impl OrientationKind {
    /// Order in which the packer tries rotations.
    pub const PACKING_ORDER: [OrientationKind; 6] = [
        OrientationKind::Upright,
        OrientationKind::LaidSideW,
        OrientationKind::UprightRotated,
        OrientationKind::LaidSideL,
        OrientationKind::LaidHL,
        OrientationKind::LaidHW,
    ];

    /// Order in which rotations are reported by [`generate_orientations`].
    pub const REPORT_ORDER: [OrientationKind; 6] = [
        OrientationKind::Upright,
        OrientationKind::UprightRotated,
        OrientationKind::LaidSideL,
        OrientationKind::LaidSideW,
        OrientationKind::LaidHL,
        OrientationKind::LaidHW,
    ];

    /// Position in [`Self::PACKING_ORDER`].
    pub fn packing_rank(self) -> usize {
        Self::PACKING_ORDER
            .iter()
            .position(|&kind| kind == self)
            .unwrap_or(Self::PACKING_ORDER.len())
    }

    pub fn is_upright(self) -> bool {
        matches!(self, OrientationKind::Upright | OrientationKind::UprightRotated)
    }

    /// Effective (length, width, height) of a box with edges `(l, w, h)`.
    pub fn apply(self, (l, w, h): (f64, f64, f64)) -> (f64, f64, f64) {
        match self {
            OrientationKind::Upright => (l, w, h),
            OrientationKind::UprightRotated => (w, l, h),
            OrientationKind::LaidSideL => (w, h, l),
            OrientationKind::LaidSideW => (l, h, w),
            OrientationKind::LaidHL => (h, l, w),
            OrientationKind::LaidHW => (h, w, l),
        }
    }

    pub fn axis_code(self) -> &'static str {
        match self {
            OrientationKind::Upright => "LWH",
            OrientationKind::UprightRotated => "WLH",
            OrientationKind::LaidSideL => "WHL",
            OrientationKind::LaidSideW => "LHW",
            OrientationKind::LaidHL => "HLW",
            OrientationKind::LaidHW => "HWL",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrientationKind::Upright => "upright",
            OrientationKind::UprightRotated => "upright-rotated",
            OrientationKind::LaidSideL => "laid-side-l",
            OrientationKind::LaidSideW => "laid-side-w",
            OrientationKind::LaidHL => "laid-h-l",
            OrientationKind::LaidHW => "laid-h-w",
        }
    }
}

/// One rotation of a box together with its stability heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct Orientation {
    pub kind: OrientationKind,
    #[schema(value_type = [f64; 3])]
    pub dims: (f64, f64, f64),
    /// Higher is preferred; upright rotations score 1.0.
    pub stability: f64,
}

impl Orientation {
    /// Checks the rotated box against container bounds.
    pub fn fits(&self, container: (f64, f64, f64)) -> bool {
        self.dimensions().is_valid_dimension() && self.fits_in(&Vec3::from_tuple(container), 0.0)
    }
}

impl Dimensional for Orientation {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

/// Stability heuristic for a box standing on a `footprint_l × footprint_w` base.
///
/// Penalizes tall, narrow stances and elongated footprints:
/// `1/(1 + heightRatio·0.5) · (0.7 + squareness·0.3)`.
pub fn orientation_stability(footprint_l: f64, footprint_w: f64, height: f64) -> f64 {
    let base_area = footprint_l * footprint_w;
    if base_area <= 0.0 {
        return 0.0;
    }

    let short = footprint_l.min(footprint_w);
    let aspect_ratio = footprint_l.max(footprint_w) / if short > 0.0 { short } else { 1.0 };
    let height_ratio = height / base_area.sqrt();
    let squareness = 1.0 / (1.0 + (aspect_ratio - 1.0).abs());

    (1.0 / (1.0 + height_ratio * HEIGHT_RATIO_FACTOR)) * (0.7 + squareness * 0.3)
}

/// Produces the rotations of a box with edges `(l, w, h)`.
///
/// Always yields the two upright rotations; the four side-laying rotations
/// follow only when `allow_side_laying` is set. Bounds filtering is left to
/// the caller.
pub fn generate_orientations(dims: (f64, f64, f64), allow_side_laying: bool) -> Vec<Orientation> {
    OrientationKind::REPORT_ORDER
        .iter()
        .filter(|kind| allow_side_laying || kind.is_upright())
        .map(|&kind| {
            let rotated = kind.apply(dims);
            let stability = if kind.is_upright() {
                1.0
            } else {
                orientation_stability(rotated.0, rotated.1, rotated.2)
            };
            Orientation {
                kind,
                dims: rotated,
                stability,
            }
        })
        .collect()
}

/// Distinct rotations in packing order that fit inside `container`.
///
/// Takes the rotations of [`generate_orientations`], so the side-laying rule
/// and stability scores are shared. Rotations with identical effective
/// dimensions (cubes, square faces) are reported once, keeping the first in
/// [`OrientationKind::PACKING_ORDER`].
pub fn packing_orientations(
    dims: (f64, f64, f64),
    container: (f64, f64, f64),
    allow_side_laying: bool,
) -> Vec<Orientation> {
    let mut ordered = generate_orientations(dims, allow_side_laying);
    ordered.sort_by_key(|o| o.kind.packing_rank());

    let mut distinct: Vec<Orientation> = Vec::with_capacity(ordered.len());
    for orientation in ordered {
        let (l, w, h) = orientation.dims;
        let duplicate = distinct.iter().any(|o| {
            (o.dims.0 - l).abs() <= EPSILON_GENERAL
                && (o.dims.1 - w).abs() <= EPSILON_GENERAL
                && (o.dims.2 - h).abs() <= EPSILON_GENERAL
        });
        if !duplicate {
            distinct.push(orientation);
        }
    }
    distinct.retain(|o| o.fits(container));
    distinct
}

//! Geometric checks over placed boxes.
//!
//! Collision and containment helpers used to validate packing results and to
//! locate the boxes a placement rests on.

use crate::model::Placement;
use crate::types::{EPSILON_GENERAL, Vec3};

/// Checks whether two placements share volume.
///
/// Uses axis-aligned bounding boxes. Two boxes do NOT intersect when they are
/// separated along at least one axis; touching faces count as separated.
pub fn intersects(a: &Placement, b: &Placement) -> bool {
    a.bounding_box().intersects(&b.bounding_box())
}

/// Footprint overlap of two placements in the length × width plane.
pub fn overlap_area_xy(a: &Placement, b: &Placement) -> f64 {
    a.footprint().overlap_area(&b.footprint())
}

/// Placements whose top face lies at `floor` and whose footprint overlaps `placed`.
pub fn resting_on<'a>(
    placed: &Placement,
    others: &'a [Placement],
    height_epsilon: f64,
) -> impl Iterator<Item = &'a Placement> {
    let floor = placed.floor_height();
    others.iter().filter(move |p| {
        (p.top_z() - floor).abs() < height_epsilon && overlap_area_xy(placed, p) > 0.0
    })
}

/// First pair of placements that intersect, by sequence number.
pub fn first_overlap(placements: &[Placement]) -> Option<(usize, usize)> {
    for (i, a) in placements.iter().enumerate() {
        for b in &placements[i + 1..] {
            if intersects(a, b) {
                return Some((a.sequence, b.sequence));
            }
        }
    }
    None
}

/// Whether every placement lies inside `[0, dims]` on all three axes.
pub fn all_within_container(placements: &[Placement], dims: (f64, f64, f64)) -> bool {
    let bounds = Vec3::from_tuple(dims);
    placements
        .iter()
        .all(|p| p.bounding_box().is_inside(&bounds, EPSILON_GENERAL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::OrientationKind;

    fn placed(sequence: usize, position: (f64, f64, f64), dims: (f64, f64, f64)) -> Placement {
        Placement {
            sequence,
            group_id: 0,
            orientation: OrientationKind::Upright,
            position,
            dims,
            center: (
                position.0 + dims.0 / 2.0,
                position.1 + dims.1 / 2.0,
                position.2 + dims.2 / 2.0,
            ),
            weight: 1.0,
            support: 1.0,
        }
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = placed(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let side = placed(1, (10.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let above = placed(2, (0.0, 0.0, 10.0), (10.0, 10.0, 10.0));
        let inside = placed(3, (5.0, 5.0, 5.0), (2.0, 2.0, 2.0));

        assert!(!intersects(&a, &side));
        assert!(!intersects(&a, &above));
        assert!(intersects(&a, &inside));
        assert_eq!(first_overlap(&[a.clone(), side.clone(), above.clone()]), None);
        assert_eq!(first_overlap(&[a, side, inside]), Some((0, 3)));
    }

    #[test]
    fn footprint_overlap() {
        let a = placed(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = placed(1, (5.0, 5.0, 10.0), (10.0, 10.0, 10.0));

        assert!((overlap_area_xy(&a, &b) - 25.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn finds_supporting_boxes() {
        let lower = vec![
            placed(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0)),
            placed(1, (10.0, 0.0, 0.0), (10.0, 10.0, 5.0)),
            placed(2, (20.0, 0.0, 0.0), (10.0, 10.0, 10.0)),
        ];
        let upper = placed(3, (5.0, 0.0, 10.0), (10.0, 10.0, 10.0));

        let supports: Vec<usize> = resting_on(&upper, &lower, 1e-3).map(|p| p.sequence).collect();
        assert_eq!(supports, vec![0]);
    }

    #[test]
    fn containment_check() {
        let inside = vec![placed(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0))];
        let sticking_out = vec![placed(0, (95.0, 0.0, 0.0), (10.0, 10.0, 10.0))];
        assert!(all_within_container(&inside, (100.0, 100.0, 100.0)));
        assert!(!all_within_container(&sticking_out, (100.0, 100.0, 100.0)));
    }
}

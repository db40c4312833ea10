//! Maximal free rectangles in the footprint plane (MaxRects).
//!
//! The set starts as the whole floor. Occupying a rectangle splits every free
//! rectangle it overlaps into up to four maximal remainders, after which any
//! rectangle fully contained in another is pruned.

use crate::types::{EPSILON_GENERAL, Rect};

#[derive(Clone, Debug)]
pub struct FreeRectSet {
    bounds: Rect,
    free: Vec<Rect>,
}

impl FreeRectSet {
    /// Creates a set covering a `length × width` floor.
    pub fn new(length: f64, width: f64) -> Self {
        let bounds = Rect::new(0.0, 0.0, length.max(0.0), width.max(0.0));
        let free = if bounds.area() > 0.0 {
            vec![bounds]
        } else {
            Vec::new()
        };
        Self { bounds, free }
    }

    pub fn rects(&self) -> &[Rect] {
        &self.free
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Whether `rect` lies entirely inside one free rectangle.
    pub fn can_place(&self, rect: &Rect) -> bool {
        self.free.iter().any(|f| f.contains(rect, EPSILON_GENERAL))
    }

    /// Bottom-left slot for a `length × width` footprint.
    ///
    /// Prefers the smallest width coordinate, then the smallest length
    /// coordinate, mirroring row-by-row filling.
    pub fn find_bottom_left(&self, length: f64, width: f64) -> Option<Rect> {
        self.free
            .iter()
            .filter(|f| f.length + EPSILON_GENERAL >= length && f.width + EPSILON_GENERAL >= width)
            .map(|f| Rect::new(f.x, f.y, length, width))
            .min_by(|a, b| {
                a.y.partial_cmp(&b.y)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
            })
    }

    /// Marks `rect` as occupied.
    ///
    /// Returns `false` (leaving the set untouched) when `rect` is outside the
    /// floor or overlaps space that is already taken.
    pub fn occupy(&mut self, rect: Rect) -> bool {
        if !self.bounds.contains(&rect, EPSILON_GENERAL) || !self.can_place(&rect) {
            return false;
        }

        let mut next = Vec::with_capacity(self.free.len() + 4);
        for free in &self.free {
            if !free.intersects(&rect) {
                next.push(*free);
                continue;
            }
            split_around(free, &rect, &mut next);
        }
        self.free = next;
        self.prune();
        true
    }

    /// Largest free rectangle by area.
    pub fn largest(&self) -> Option<Rect> {
        self.free
            .iter()
            .copied()
            .max_by(|a, b| a.area().partial_cmp(&b.area()).unwrap_or(std::cmp::Ordering::Equal))
    }

    fn prune(&mut self) {
        let mut kept: Vec<Rect> = Vec::with_capacity(self.free.len());
        for (i, candidate) in self.free.iter().enumerate() {
            let dominated = self.free.iter().enumerate().any(|(j, other)| {
                if i == j || !other.contains(candidate, EPSILON_GENERAL) {
                    return false;
                }
                // identical rectangles: keep the first occurrence only
                !candidate.contains(other, EPSILON_GENERAL) || j < i
            });
            if !dominated {
                kept.push(*candidate);
            }
        }
        self.free = kept;
    }
}

/// Pushes the up-to-four maximal pieces of `free` not covered by `used`.
fn split_around(free: &Rect, used: &Rect, out: &mut Vec<Rect>) {
    // left of the used rectangle
    if used.x > free.x + EPSILON_GENERAL {
        out.push(Rect::new(free.x, free.y, used.x - free.x, free.width));
    }
    // right
    if used.right() < free.right() - EPSILON_GENERAL {
        out.push(Rect::new(
            used.right(),
            free.y,
            free.right() - used.right(),
            free.width,
        ));
    }
    // near side
    if used.y > free.y + EPSILON_GENERAL {
        out.push(Rect::new(free.x, free.y, free.length, used.y - free.y));
    }
    // far side
    if used.far() < free.far() - EPSILON_GENERAL {
        out.push(Rect::new(
            free.x,
            used.far(),
            free.length,
            free.far() - used.far(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_covered(set: &FreeRectSet) -> usize {
        set.rects().len()
    }

    #[test]
    fn occupying_a_corner_leaves_two_maximal_rects() {
        let mut set = FreeRectSet::new(100.0, 50.0);
        assert!(set.occupy(Rect::new(0.0, 0.0, 30.0, 20.0)));

        let rects = set.rects();
        assert_eq!(total_covered(&set), 2);
        assert!(rects.contains(&Rect::new(30.0, 0.0, 70.0, 50.0)));
        assert!(rects.contains(&Rect::new(0.0, 20.0, 100.0, 30.0)));
    }

    #[test]
    fn occupying_the_middle_yields_four_rects() {
        let mut set = FreeRectSet::new(100.0, 100.0);
        assert!(set.occupy(Rect::new(40.0, 40.0, 20.0, 20.0)));
        assert_eq!(set.rects().len(), 4);
        assert!(!set.can_place(&Rect::new(45.0, 45.0, 5.0, 5.0)));
        assert!(set.can_place(&Rect::new(0.0, 0.0, 40.0, 100.0)));
    }

    #[test]
    fn rejects_overlap_and_out_of_bounds() {
        let mut set = FreeRectSet::new(100.0, 100.0);
        assert!(set.occupy(Rect::new(0.0, 0.0, 50.0, 50.0)));
        assert!(!set.occupy(Rect::new(25.0, 25.0, 50.0, 50.0)));
        assert!(!set.occupy(Rect::new(80.0, 80.0, 30.0, 30.0)));
        assert!(set.occupy(Rect::new(50.0, 0.0, 50.0, 50.0)));
    }

    #[test]
    fn pruning_removes_contained_rects() {
        let mut set = FreeRectSet::new(100.0, 100.0);
        set.occupy(Rect::new(0.0, 0.0, 50.0, 50.0));
        set.occupy(Rect::new(50.0, 0.0, 50.0, 50.0));

        // the bottom half is full; only the top strip remains
        assert_eq!(set.rects(), &[Rect::new(0.0, 50.0, 100.0, 50.0)]);
        assert_eq!(set.largest(), Some(Rect::new(0.0, 50.0, 100.0, 50.0)));
    }

    #[test]
    fn bottom_left_fills_rows() {
        let mut set = FreeRectSet::new(100.0, 100.0);
        let mut slots = Vec::new();
        while let Some(slot) = set.find_bottom_left(50.0, 50.0) {
            assert!(set.occupy(slot));
            slots.push(slot);
        }
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0], Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(slots[1], Rect::new(50.0, 0.0, 50.0, 50.0));
        assert_eq!(slots[2], Rect::new(0.0, 50.0, 50.0, 50.0));
        assert!(set.is_empty());
    }

    #[test]
    fn empty_floor_has_no_space() {
        let set = FreeRectSet::new(0.0, 100.0);
        assert!(set.is_empty());
        assert!(set.find_bottom_left(1.0, 1.0).is_none());
    }
}

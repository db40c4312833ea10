//! Single-box tiling.
//!
//! Evaluates how many identical boxes fit into one container using regular
//! grids and an interlocked (brick-bond) layout where consecutive rows are
//! rotated by 90°. Both container orientations are tried; the best layout is
//! materialized as footprint slots for one layer.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::free_space::FreeRectSet;
use crate::orientation::OrientationKind;
use crate::types::Rect;

/// Stability bonus of interlocked layouts.
const INTERLOCK_BONUS: f64 = 1.15;
/// Stability differences up to this are treated as ties.
const STABILITY_TIE: f64 = 0.05;

/// One row of an interlocked layer.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PatternRow {
    /// Whether the boxes in this row are turned by 90°
    pub rotated: bool,
    pub count_l: u64,
    pub box_l: f64,
    pub box_w: f64,
}

/// Best layout for a single box type.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TileResult {
    /// `none` when nothing fits
    pub pattern: String,
    pub orientation: Option<OrientationKind>,
    pub interlocked: bool,
    /// Layout computed with container length and width exchanged
    pub container_swapped: bool,
    /// Grid counts, absent for interlocked layouts
    pub count_l: Option<u64>,
    pub count_w: Option<u64>,
    pub layers: u64,
    pub per_layer: u64,
    pub total: u64,
    #[schema(value_type = [f64; 3])]
    pub box_dims: (f64, f64, f64),
    #[schema(value_type = [f64; 3])]
    pub used_dims: (f64, f64, f64),
    pub rows: Vec<PatternRow>,
    pub stability_score: f64,
    pub volume_efficiency: f64,
    /// Footprints of one layer in the container frame
    pub layer_slots: Vec<Rect>,
    /// Largest free floor rectangle left in a layer
    pub largest_gap: Option<Rect>,
}

impl TileResult {
    /// Result for a box that does not fit at all.
    pub fn none() -> Self {
        Self {
            pattern: "none".to_string(),
            orientation: None,
            interlocked: false,
            container_swapped: false,
            count_l: Some(0),
            count_w: Some(0),
            layers: 0,
            per_layer: 0,
            total: 0,
            box_dims: (0.0, 0.0, 0.0),
            used_dims: (0.0, 0.0, 0.0),
            rows: Vec::new(),
            stability_score: 0.0,
            volume_efficiency: 0.0,
            layer_slots: Vec::new(),
            largest_gap: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Baseline stability of a tiling orientation.
fn baseline(kind: OrientationKind) -> f64 {
    match kind {
        OrientationKind::Upright | OrientationKind::UprightRotated => 1.0,
        OrientationKind::LaidSideL | OrientationKind::LaidSideW => 0.9,
        OrientationKind::LaidHL | OrientationKind::LaidHW => 0.85,
    }
}

/// Floor area in which a pattern is computed.
#[derive(Clone, Copy)]
struct Floor {
    length: f64,
    width: f64,
    swapped: bool,
}

/// Finds the layout holding the most boxes of `box_dims` in `space`.
///
/// Ties in the total are broken by a clearly higher stability score, then by
/// volume efficiency. Non-positive inputs yield [`TileResult::none`].
pub fn best_tile(box_dims: (f64, f64, f64), space: (f64, f64, f64), allow_side_laying: bool) -> TileResult {
    let (bl, bw, bh) = box_dims;
    let (sl, sw, sh) = space;
    if [bl, bw, bh, sl, sw, sh].iter().any(|v| *v <= 0.0 || !v.is_finite()) {
        return TileResult::none();
    }

    let floors = [
        Floor {
            length: sl,
            width: sw,
            swapped: false,
        },
        Floor {
            length: sw,
            width: sl,
            swapped: true,
        },
    ];

    let mut best: Option<TileResult> = None;
    for floor in floors {
        for kind in OrientationKind::REPORT_ORDER {
            if !allow_side_laying && !kind.is_upright() {
                continue;
            }
            let dims = kind.apply(box_dims);
            for candidate in [uniform(kind, dims, floor, sh), interlocked(kind, dims, floor, sh)]
                .into_iter()
                .flatten()
            {
                if best.as_ref().is_none_or(|b| is_better(&candidate, b)) {
                    best = Some(candidate);
                }
            }
        }
    }

    match best {
        Some(mut tile) => {
            materialize_layer(&mut tile, space);
            log::debug!(
                "best tile for {:?} in {:?}: {} [{}] ({} per layer × {} layers)",
                box_dims,
                space,
                tile.pattern,
                tile.orientation.map_or("-", OrientationKind::axis_code),
                tile.per_layer,
                tile.layers
            );
            tile
        }
        None => TileResult::none(),
    }
}

fn is_better(new: &TileResult, current: &TileResult) -> bool {
    if new.total != current.total {
        return new.total > current.total;
    }
    let stability_diff = new.stability_score - current.stability_score;
    if stability_diff.abs() > STABILITY_TIE {
        return stability_diff > 0.0;
    }
    new.volume_efficiency > current.volume_efficiency
}

fn pattern_name(prefix: &str, kind: OrientationKind, floor: Floor) -> String {
    let suffix = if floor.swapped { "-swapped" } else { "" };
    format!("{prefix}{}{suffix}", kind.label())
}

/// Regular grid of identically oriented boxes.
fn uniform(kind: OrientationKind, (l, w, h): (f64, f64, f64), floor: Floor, height: f64) -> Option<TileResult> {
    let count_l = (floor.length / l).floor() as u64;
    let count_w = (floor.width / w).floor() as u64;
    let layers = (height / h).floor() as u64;
    if count_l == 0 || count_w == 0 || layers == 0 {
        return None;
    }

    let per_layer = count_l * count_w;
    let aspect_ratio = l.max(w) / l.min(w);
    let height_ratio = h / l.max(w);
    let stability_score =
        baseline(kind) * (1.0 / (1.0 + aspect_ratio * 0.1)) * (1.0 / (1.0 + height_ratio * 0.2));
    let used_dims = (count_l as f64 * l, count_w as f64 * w, layers as f64 * h);

    Some(TileResult {
        pattern: pattern_name("", kind, floor),
        orientation: Some(kind),
        interlocked: false,
        container_swapped: floor.swapped,
        count_l: Some(count_l),
        count_w: Some(count_w),
        layers,
        per_layer,
        total: per_layer * layers,
        box_dims: (l, w, h),
        used_dims,
        rows: Vec::new(),
        stability_score,
        volume_efficiency: used_dims.0 * used_dims.1 * used_dims.2 / (floor.length * floor.width * height),
        layer_slots: Vec::new(),
        largest_gap: None,
    })
}

/// Rows alternating between the orientation and its 90° turn.
///
/// Skipped for square footprints, where both rows would be identical.
fn interlocked(kind: OrientationKind, (l, w, h): (f64, f64, f64), floor: Floor, height: f64) -> Option<TileResult> {
    if l == w {
        return None;
    }
    let layers = (height / h).floor() as u64;
    if layers == 0 {
        return None;
    }

    let mut rows: Vec<PatternRow> = Vec::new();
    let mut remaining_w = floor.width;
    let mut per_layer = 0;
    let mut used_l = 0.0_f64;
    let mut used_w = 0.0;

    while remaining_w >= l.min(w) {
        let rotated = rows.len() % 2 == 1;
        let (row_l, row_w) = if rotated { (w, l) } else { (l, w) };
        if remaining_w < row_w {
            break;
        }
        let cols = (floor.length / row_l).floor() as u64;
        if cols == 0 {
            break;
        }
        rows.push(PatternRow {
            rotated,
            count_l: cols,
            box_l: row_l,
            box_w: row_w,
        });
        per_layer += cols;
        used_l = used_l.max(cols as f64 * row_l);
        used_w += row_w;
        remaining_w -= row_w;
    }

    if rows.is_empty() {
        return None;
    }

    Some(TileResult {
        pattern: pattern_name("mixed-", kind, floor),
        orientation: Some(kind),
        interlocked: true,
        container_swapped: floor.swapped,
        count_l: None,
        count_w: None,
        layers,
        per_layer,
        total: per_layer * layers,
        box_dims: (l, w, h),
        used_dims: (used_l, used_w, layers as f64 * h),
        rows,
        stability_score: baseline(kind) * INTERLOCK_BONUS,
        volume_efficiency: (per_layer * layers) as f64 * l * w * h / (floor.length * floor.width * height),
        layer_slots: Vec::new(),
        largest_gap: None,
    })
}

/// Fills one layer's slots and the largest remaining gap, in the container frame.
fn materialize_layer(tile: &mut TileResult, space: (f64, f64, f64)) {
    let (length, width) = if tile.container_swapped {
        (space.1, space.0)
    } else {
        (space.0, space.1)
    };
    let mut free = FreeRectSet::new(length, width);
    let mut slots: Vec<Rect> = Vec::with_capacity(tile.per_layer as usize);

    if tile.interlocked {
        let mut y = 0.0;
        for row in &tile.rows {
            for col in 0..row.count_l {
                let slot = Rect::new(col as f64 * row.box_l, y, row.box_l, row.box_w);
                if free.occupy(slot) {
                    slots.push(slot);
                }
            }
            y += row.box_w;
        }
    } else {
        let (l, w, _) = tile.box_dims;
        while (slots.len() as u64) < tile.per_layer && !free.is_empty() {
            let Some(slot) = free.find_bottom_left(l, w) else {
                break;
            };
            if !free.occupy(slot) {
                break;
            }
            slots.push(slot);
        }
    }

    log::debug!(
        "layer holds {} slots, {} free rectangles left",
        slots.len(),
        free.rects().len()
    );
    let largest = free.largest();
    if tile.container_swapped {
        tile.layer_slots = slots.iter().map(Rect::transposed).collect();
        tile.largest_gap = largest.map(|r| r.transposed());
    } else {
        tile.layer_slots = slots;
        tile.largest_gap = largest;
    }
}

/// Optional single-box limits.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SingleBoxLimits {
    /// Requested number of boxes; capped at the capacity
    #[serde(default)]
    pub desired_count: Option<u64>,
    /// Maximum gross weight of one box
    #[serde(default)]
    pub max_box_weight: Option<f64>,
    /// Maximum gross weight of the loaded container
    #[serde(default)]
    pub max_container_weight: Option<f64>,
}

/// Tile result combined with count and weight checks.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SingleBoxSummary {
    pub tile: TileResult,
    pub capacity: u64,
    pub effective_count: u64,
    pub desired_exceeds_capacity: bool,
    pub box_weight: f64,
    pub box_overweight: bool,
    pub total_weight: f64,
    pub container_overweight: bool,
}

/// Applies the desired count and weight limits to a tile result.
pub fn summarize_single_box(tile: TileResult, box_weight: f64, limits: &SingleBoxLimits) -> SingleBoxSummary {
    let capacity = tile.total;
    let (effective_count, desired_exceeds_capacity) = match limits.desired_count {
        Some(desired) if desired > 0 && desired > capacity => (capacity, true),
        Some(desired) if desired > 0 => (desired, false),
        _ => (capacity, false),
    };

    let total_weight = effective_count as f64 * box_weight;
    let exceeds = |limit: Option<f64>, value: f64| limit.is_some_and(|max| max > 0.0 && value > max);

    SingleBoxSummary {
        capacity,
        effective_count,
        desired_exceeds_capacity,
        box_weight,
        box_overweight: exceeds(limits.max_box_weight, box_weight),
        total_weight,
        container_overweight: exceeds(limits.max_container_weight, total_weight),
        tile,
    }
}

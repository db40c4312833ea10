//! Greedy height-mapped packing of one container.
//!
//! Boxes are placed one at a time. Every iteration scores all feasible
//! (group, orientation, position) triples and commits the lowest score:
//! - floor height dominates, so a layer is completed before the next starts
//! - then the position along the container length (back to front)
//! - then the position along the width (left to right)
//! - a small bonus prefers larger boxes among near-ties
//!
//! Support and weight distribution are resolved afterwards by
//! [`crate::stability`].

use std::collections::HashSet;

use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::geometry::{all_within_container, first_overlap};
use crate::height_map::HeightMap;
use crate::model::{Container, Group, Placement};
use crate::orientation::{Orientation, packing_orientations};
use crate::stability::{
    StabilitySummary, WeightDistribution, analyze_stability, analyze_weight_distribution,
    compute_support,
};
use crate::types::{BoundingBox, Dimensional, EPSILON_HEIGHT, Vec3};

/// Weight of the floor height in the placement score.
const FLOOR_WEIGHT: f64 = 100_000.0;
/// Weight of the length coordinate in the placement score.
const LENGTH_WEIGHT: f64 = 100.0;
/// Volume units per bonus point.
const VOLUME_BONUS_DIVISOR: f64 = 1_000_000.0;
const VOLUME_BONUS_WEIGHT: f64 = 1000.0;

/// Configuration for the packing engine.
///
/// Holds grid resolution, search limits and analysis tolerances. Passed by
/// reference into every engine call.
#[derive(Copy, Clone, Debug, Serialize, ToSchema)]
pub struct PackingConfig {
    /// Cell edge of the height map (smaller = more candidate positions, slower)
    pub height_map_resolution: f64,
    /// Upper bound on placement iterations per container
    pub max_iterations: usize,
    /// Support fraction below which a box is reported as an issue
    pub stability_threshold: f64,
    /// Allowed center-of-mass deviation as a fraction of the floor diagonal
    pub balance_tolerance: f64,
    /// Tolerance for matching a floor against the top face below
    pub height_epsilon: f64,
    /// Global side-laying permission; groups may override it
    pub allow_side_laying: bool,
    /// Order groups of equal unit volume by density before packing
    pub sort_by_density: bool,
}

impl PackingConfig {
    pub const DEFAULT_HEIGHT_MAP_RESOLUTION: f64 = 50.0;
    pub const DEFAULT_MAX_ITERATIONS: usize = 50_000;
    pub const DEFAULT_STABILITY_THRESHOLD: f64 = 0.7;
    pub const DEFAULT_BALANCE_TOLERANCE: f64 = 0.15;
    pub const DEFAULT_HEIGHT_EPSILON: f64 = EPSILON_HEIGHT;
    pub const DEFAULT_ALLOW_SIDE_LAYING: bool = true;
    pub const DEFAULT_SORT_BY_DENSITY: bool = true;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            height_map_resolution: Self::DEFAULT_HEIGHT_MAP_RESOLUTION,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            stability_threshold: Self::DEFAULT_STABILITY_THRESHOLD,
            balance_tolerance: Self::DEFAULT_BALANCE_TOLERANCE,
            height_epsilon: Self::DEFAULT_HEIGHT_EPSILON,
            allow_side_laying: Self::DEFAULT_ALLOW_SIDE_LAYING,
            sort_by_density: Self::DEFAULT_SORT_BY_DENSITY,
        }
    }
}

/// Builder for [`PackingConfig`].
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the height map cell edge.
    pub fn height_map_resolution(mut self, resolution: f64) -> Self {
        self.config.height_map_resolution = resolution;
        self
    }

    /// Sets the iteration ceiling.
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.config.max_iterations = iterations;
        self
    }

    /// Sets the support threshold for stability issues.
    pub fn stability_threshold(mut self, threshold: f64) -> Self {
        self.config.stability_threshold = threshold;
        self
    }

    /// Sets the balance tolerance as a fraction of the floor diagonal.
    pub fn balance_tolerance(mut self, tolerance: f64) -> Self {
        self.config.balance_tolerance = tolerance;
        self
    }

    pub fn height_epsilon(mut self, epsilon: f64) -> Self {
        self.config.height_epsilon = epsilon;
        self
    }

    pub fn allow_side_laying(mut self, allowed: bool) -> Self {
        self.config.allow_side_laying = allowed;
        self
    }

    pub fn sort_by_density(mut self, enabled: bool) -> Self {
        self.config.sort_by_density = enabled;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Packing outcome of one group inside one container.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GroupResult {
    pub id: usize,
    pub name: String,
    /// Quantity handed to this container
    pub requested_quantity: u32,
    pub placed_quantity: u32,
    /// `placed_quantity × inners_per_box`
    pub placed_inner_units: u64,
    pub unit_weight: f64,
    pub placements: Vec<Placement>,
}

impl GroupResult {
    /// Quantity that did not fit into this container.
    pub fn unplaced_quantity(&self) -> u32 {
        self.requested_quantity.saturating_sub(self.placed_quantity)
    }

    pub fn placed_weight(&self) -> f64 {
        self.unit_weight * f64::from(self.placed_quantity)
    }
}

/// Aggregate result of packing one container.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PackingResult {
    pub container_id: usize,
    #[schema(value_type = [f64; 3], example = json!([5895.0, 2350.0, 2392.0]))]
    pub container_dims: (f64, f64, f64),
    pub total_placed: usize,
    /// Number of distinct floor heights
    pub total_layers: usize,
    pub total_volume: f64,
    pub total_weight: f64,
    /// Span of the placed block along length and width, tallest top
    #[schema(value_type = [f64; 3], example = json!([5800.0, 2300.0, 2100.0]))]
    pub used_dims: (f64, f64, f64),
    /// Placed volume as a percentage of the container volume
    pub volume_utilization: f64,
    /// Placed volume divided by the used bounding volume
    pub packing_density: f64,
    /// Every input group in input order, including unplaced ones
    pub groups: Vec<GroupResult>,
    /// All placements in placement order
    pub placements: Vec<Placement>,
    pub stability: StabilitySummary,
    pub weight_distribution: WeightDistribution,
    /// Iterations spent in the search loop
    pub iterations: usize,
}

impl PackingResult {
    /// Result of a container without any placement.
    fn empty(groups: &[Group], container: &Container, config: &PackingConfig) -> Self {
        Self::assemble(groups, container, config, Vec::new(), 0)
    }

    /// Whether every requested unit found a place.
    pub fn is_complete(&self) -> bool {
        self.groups.iter().all(|g| g.placed_quantity >= g.requested_quantity)
    }

    pub fn requested_quantity(&self) -> u64 {
        self.groups.iter().map(|g| u64::from(g.requested_quantity)).sum()
    }

    pub fn unplaced_quantity(&self) -> u64 {
        self.groups.iter().map(|g| u64::from(g.unplaced_quantity())).sum()
    }

    /// Placed quantity of one group, zero when the group is unknown.
    pub fn placed_of(&self, group_id: usize) -> u32 {
        self.groups
            .iter()
            .filter(|g| g.id == group_id)
            .map(|g| g.placed_quantity)
            .sum()
    }

    fn assemble(
        groups: &[Group],
        container: &Container,
        config: &PackingConfig,
        mut placements: Vec<Placement>,
        iterations: usize,
    ) -> Self {
        let eps = config.height_epsilon;

        // supports are resolved on a floor-ordered copy and written back by sequence
        let resolved = compute_support(&placements, eps);
        for p in &resolved {
            if let Some(target) = placements.get_mut(p.sequence) {
                target.support = p.support;
            }
        }
        let stability = analyze_stability(&resolved, config.stability_threshold);
        let weight_distribution = analyze_weight_distribution(
            &placements,
            container.dims,
            container.max_weight,
            config.balance_tolerance,
        );

        let total_volume: f64 = placements.iter().map(|p| p.volume()).sum();
        let used_dims = used_extents(&placements);
        let container_volume = container.volume();
        let used_volume = used_dims.0 * used_dims.1 * used_dims.2;

        let group_results = groups
            .iter()
            .map(|group| {
                let own: Vec<Placement> = placements
                    .iter()
                    .filter(|p| p.group_id == group.id)
                    .cloned()
                    .collect();
                let placed = u32::try_from(own.len()).unwrap_or(u32::MAX);
                GroupResult {
                    id: group.id,
                    name: group.name.clone(),
                    requested_quantity: group.quantity,
                    placed_quantity: placed,
                    placed_inner_units: u64::from(placed) * u64::from(group.inners_per_box),
                    unit_weight: group.weight,
                    placements: own,
                }
            })
            .collect();

        Self {
            container_id: container.id,
            container_dims: container.dims,
            total_placed: placements.len(),
            total_layers: count_layers(&placements, eps),
            total_volume,
            total_weight: weight_distribution.total_weight,
            used_dims,
            volume_utilization: if container_volume > 0.0 {
                total_volume / container_volume * 100.0
            } else {
                0.0
            },
            packing_density: if used_volume > 0.0 {
                total_volume / used_volume
            } else {
                0.0
            },
            groups: group_results,
            placements,
            stability,
            weight_distribution,
            iterations,
        }
    }
}

/// Packs as many units of `groups` as fit into `container`.
///
/// Never fails: a container with a non-positive dimension yields an empty
/// result, and groups without a fitting orientation are reported with zero
/// placed units.
#[allow(dead_code)]
pub fn pack_container(groups: &[Group], container: &Container, config: &PackingConfig) -> PackingResult {
    pack_container_with_progress(groups, container, config, |_| {})
}

/// Group state local to one packing run.
struct ActiveGroup<'a> {
    group: &'a Group,
    remaining: u32,
    orientations: Vec<Orientation>,
}

/// Best triple found in one iteration.
#[derive(Clone, Copy)]
struct Candidate {
    active: usize,
    orientation: Orientation,
    position: (f64, f64),
    floor: f64,
    score: f64,
}

/// Like [`pack_container`], calling `on_place` after every committed box.
pub fn pack_container_with_progress(
    groups: &[Group],
    container: &Container,
    config: &PackingConfig,
    mut on_place: impl FnMut(&Placement),
) -> PackingResult {
    if !container.has_valid_dims() {
        log::debug!(
            "container {} has invalid dimensions {:?}, skipping search",
            container.id,
            container.dims
        );
        return PackingResult::empty(groups, container, config);
    }

    let (length, width, height) = container.dims;
    let mut active = active_groups(groups, container, config);
    if active.is_empty() {
        return PackingResult::empty(groups, container, config);
    }

    let mut height_map = HeightMap::new(length, width, config.height_map_resolution);
    let mut candidates: Vec<(f64, f64)> = Vec::new();
    let mut seen: HashSet<(u64, u64)> = HashSet::new();
    for origin in height_map.cell_origins() {
        push_candidate(&mut candidates, &mut seen, origin);
    }

    log::debug!(
        "packing container {} ({} groups, {}x{} cells of {} mm, {} candidate positions)",
        container.id,
        active.len(),
        height_map.cells_l(),
        height_map.cells_w(),
        height_map.resolution(),
        candidates.len()
    );

    let mut placements: Vec<Placement> = Vec::new();
    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;

        let Some(best) = find_best(&active, &candidates, &height_map, container.dims) else {
            break;
        };

        let entry = &mut active[best.active];
        entry.remaining -= 1;
        let (l, w, h) = best.orientation.dims;
        let (pos_l, pos_w) = best.position;
        let placement = Placement {
            sequence: placements.len(),
            group_id: entry.group.id,
            orientation: best.orientation.kind,
            position: (pos_l, pos_w, best.floor),
            dims: (l, w, h),
            center: BoundingBox::from_position_and_dims(
                Vec3::new(pos_l, pos_w, best.floor),
                Vec3::new(l, w, h),
            )
            .center()
            .as_tuple(),
            weight: entry.group.weight,
            support: if best.floor == 0.0 { 1.0 } else { 0.0 },
        };

        height_map.raise(pos_l, pos_w, l, w, best.floor + h);
        for corner in [(pos_l + l, pos_w), (pos_l, pos_w + w), (pos_l + l, pos_w + w)] {
            push_candidate(&mut candidates, &mut seen, corner);
        }

        on_place(&placement);
        placements.push(placement);

        if active.iter().all(|a| a.remaining == 0) {
            break;
        }
    }

    if iterations >= config.max_iterations {
        log::debug!(
            "container {}: iteration ceiling {} reached",
            container.id,
            config.max_iterations
        );
    }

    let result = PackingResult::assemble(groups, container, config, placements, iterations);
    debug_assert!(first_overlap(&result.placements).is_none());
    debug_assert!(all_within_container(&result.placements, container.dims));
    log::debug!(
        "container {}: placed {} of {} boxes in {} iterations ({}x{}x{}), {} unplaced{}",
        container.id,
        result.total_placed,
        result.requested_quantity(),
        iterations,
        length,
        width,
        height,
        result.unplaced_quantity(),
        if result.is_complete() { "" } else { ", incomplete" }
    );
    result
}

/// Groups with remaining quantity and at least one fitting rotation, in
/// packing order.
fn active_groups<'a>(
    groups: &'a [Group],
    container: &Container,
    config: &PackingConfig,
) -> Vec<ActiveGroup<'a>> {
    let mut active: Vec<ActiveGroup<'a>> = groups
        .iter()
        .filter(|g| g.quantity > 0)
        .filter_map(|group| {
            let orientations = packing_orientations(
                group.dims,
                container.dims,
                group.side_laying_allowed(config.allow_side_laying),
            );
            if orientations.is_empty() {
                log::debug!(
                    "group {} ({:?}) has no orientation fitting container {}",
                    group.id,
                    group.dims,
                    container.id
                );
                return None;
            }
            Some(ActiveGroup {
                group,
                remaining: group.quantity,
                orientations,
            })
        })
        .collect();

    if config.sort_by_density {
        active.sort_by(|a, b| b.group.density().total_cmp(&a.group.density()));
    }
    active.sort_by(|a, b| b.group.volume().total_cmp(&a.group.volume()));
    active
}

/// Scans every feasible triple and returns the lowest score.
///
/// Ties keep the first triple found: group order, orientation order, then
/// candidate order.
fn find_best(
    active: &[ActiveGroup<'_>],
    candidates: &[(f64, f64)],
    height_map: &HeightMap,
    (length, width, height): (f64, f64, f64),
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for (index, entry) in active.iter().enumerate() {
        if entry.remaining == 0 {
            continue;
        }
        for orientation in &entry.orientations {
            let (l, w, h) = orientation.dims;
            let bonus = orientation.volume() / VOLUME_BONUS_DIVISOR * VOLUME_BONUS_WEIGHT;

            for &(pos_l, pos_w) in candidates {
                if pos_l + l > length || pos_w + w > width {
                    continue;
                }
                // floor >= 0, so this is a lower bound of the full score
                let partial = pos_l * LENGTH_WEIGHT + pos_w - bonus;
                if best.is_some_and(|b| partial >= b.score) {
                    continue;
                }
                let floor = height_map.floor_height(pos_l, pos_w, l, w);
                if floor + h > height {
                    continue;
                }
                let score = floor * FLOOR_WEIGHT + partial;
                if best.is_none_or(|b| score < b.score) {
                    best = Some(Candidate {
                        active: index,
                        orientation: *orientation,
                        position: (pos_l, pos_w),
                        floor,
                        score,
                    });
                }
            }
        }
    }

    best
}

fn push_candidate(candidates: &mut Vec<(f64, f64)>, seen: &mut HashSet<(u64, u64)>, position: (f64, f64)) {
    if seen.insert((position.0.to_bits(), position.1.to_bits())) {
        candidates.push(position);
    }
}

/// Length and width span of the placed block, and the tallest top.
fn used_extents(placements: &[Placement]) -> (f64, f64, f64) {
    if placements.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let mut min_l = f64::INFINITY;
    let mut max_l = f64::NEG_INFINITY;
    let mut min_w = f64::INFINITY;
    let mut max_w = f64::NEG_INFINITY;
    let mut max_top = 0.0_f64;
    for p in placements {
        let rect = p.footprint();
        min_l = min_l.min(rect.x);
        max_l = max_l.max(rect.right());
        min_w = min_w.min(rect.y);
        max_w = max_w.max(rect.far());
        max_top = max_top.max(p.top_z());
    }
    (max_l - min_l, max_w - min_w, max_top)
}

/// Number of distinct floor heights.
fn count_layers(placements: &[Placement], eps: f64) -> usize {
    let mut floors: Vec<f64> = placements.iter().map(Placement::floor_height).collect();
    floors.sort_by(f64::total_cmp);
    floors.dedup_by(|a, b| (*a - *b).abs() < eps);
    floors.len()
}

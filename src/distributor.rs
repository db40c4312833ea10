//! Distribution of group quantities across several containers.
//!
//! Two splitting modes exist:
//! - sequential: every container receives whatever is still unplaced
//! - even spread: quantities are divided up front, without carry-forward
//!
//! A container with a non-empty allow-list never receives other groups.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::model::{Container, Group};
use crate::optimizer::{PackingConfig, PackingResult, pack_container_with_progress};
use crate::orientation::OrientationKind;

/// Mode flags for one distribution run.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct DistributionOptions {
    /// Split every group evenly across all containers instead of filling them in order
    #[serde(default)]
    pub spread_evenly: bool,
}

/// Result of packing one container within a distribution run.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ContainerLoad {
    /// Position of the container in the request
    pub index: usize,
    pub container_id: usize,
    pub label: Option<String>,
    pub max_weight: f64,
    pub cost_weight: f64,
    /// Sum of placed quantity × unit weight over all groups
    pub total_weight: f64,
    pub result: PackingResult,
}

impl ContainerLoad {
    pub fn total_placed(&self) -> usize {
        self.result.total_placed
    }

    pub fn exceeds_weight_limit(&self) -> bool {
        self.total_weight > self.max_weight
    }
}

/// Quantity of a group that no container could take.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct UnplacedGroup {
    pub id: usize,
    pub name: String,
    pub quantity: u32,
}

/// Outcome of a distribution run over all containers.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct DistributionResult {
    pub loads: Vec<ContainerLoad>,
    pub unplaced: Vec<UnplacedGroup>,
    pub total_placed: usize,
    pub total_weight: f64,
}

impl DistributionResult {
    /// Whether all requested units were placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn container_count(&self) -> usize {
        self.loads.len()
    }

    /// Mean volume utilization over all containers.
    pub fn average_utilization(&self) -> f64 {
        if self.loads.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.loads.iter().map(|l| l.result.volume_utilization).sum();
        sum / self.loads.len() as f64
    }

    /// Placed quantity of one group over all containers.
    #[allow(dead_code)]
    pub fn placed_of(&self, group_id: usize) -> u64 {
        self.loads
            .iter()
            .map(|l| u64::from(l.result.placed_of(group_id)))
            .sum()
    }
}

/// Events emitted during a distribution run, suitable for live visualization.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// Packing of a container begins.
    ContainerStarted {
        index: usize,
        id: usize,
        dims: (f64, f64, f64),
        max_weight: f64,
        label: Option<String>,
        requested: u64,
    },
    /// A box was committed.
    BoxPlaced {
        container_index: usize,
        container_id: usize,
        sequence: usize,
        group_id: usize,
        orientation: OrientationKind,
        pos: (f64, f64, f64),
        dims: (f64, f64, f64),
        weight: f64,
        total_weight: f64,
    },
    /// A container is fully packed and analyzed.
    ContainerFinished {
        index: usize,
        id: usize,
        placed: usize,
        total_weight: f64,
        volume_utilization: f64,
        stability_score: f64,
    },
    /// The run is complete.
    Finished {
        containers: usize,
        placed: usize,
        unplaced: u64,
    },
}

/// Splits `total` over `containers` as evenly as possible.
///
/// Every container receives `total / containers`; the first `total % containers`
/// receive one more.
pub fn spread_allocations(total: u32, containers: usize) -> Vec<u32> {
    if containers == 0 {
        return Vec::new();
    }
    let n = u32::try_from(containers).unwrap_or(u32::MAX);
    let base = total / n;
    let remainder = (total % n) as usize;
    (0..containers)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Packs `groups` into `containers` in order.
pub fn pack_containers(
    groups: &[Group],
    containers: &[Container],
    options: DistributionOptions,
    config: &PackingConfig,
) -> DistributionResult {
    pack_containers_with_progress(groups, containers, options, config, |_| {})
}

/// Like [`pack_containers`], reporting progress through `on_event`.
pub fn pack_containers_with_progress(
    groups: &[Group],
    containers: &[Container],
    options: DistributionOptions,
    config: &PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> DistributionResult {
    let spread = options.spread_evenly && containers.len() > 1;
    let allocations: Vec<Vec<u32>> = if spread {
        groups
            .iter()
            .map(|g| spread_allocations(g.quantity, containers.len()))
            .collect()
    } else {
        Vec::new()
    };
    let mut remaining: Vec<u32> = groups.iter().map(|g| g.quantity).collect();
    let mut loads: Vec<ContainerLoad> = Vec::with_capacity(containers.len());

    for (index, container) in containers.iter().enumerate() {
        let assigned: Vec<Group> = groups
            .iter()
            .enumerate()
            .map(|(gi, group)| {
                let quantity = if !container.allows_group(group.id) {
                    0
                } else if spread {
                    allocations[gi][index]
                } else {
                    remaining[gi]
                };
                group.with_quantity(quantity)
            })
            .collect();

        on_event(&PackEvent::ContainerStarted {
            index,
            id: container.id,
            dims: container.dims,
            max_weight: container.max_weight,
            label: container.label.clone(),
            requested: assigned.iter().map(|g| u64::from(g.quantity)).sum(),
        });

        let mut running_weight = 0.0;
        let result = pack_container_with_progress(&assigned, container, config, |placement| {
            running_weight += placement.weight;
            on_event(&PackEvent::BoxPlaced {
                container_index: index,
                container_id: container.id,
                sequence: placement.sequence,
                group_id: placement.group_id,
                orientation: placement.orientation,
                pos: placement.position,
                dims: placement.dims,
                weight: placement.weight,
                total_weight: running_weight,
            });
        });

        if !spread {
            for (gi, group_result) in result.groups.iter().enumerate() {
                remaining[gi] = remaining[gi].saturating_sub(group_result.placed_quantity);
            }
        }

        let total_weight: f64 = result.groups.iter().map(|g| g.placed_weight()).sum();
        on_event(&PackEvent::ContainerFinished {
            index,
            id: container.id,
            placed: result.total_placed,
            total_weight,
            volume_utilization: result.volume_utilization,
            stability_score: result.stability.score,
        });

        log::debug!(
            "container {} (#{index}): {} placed, {:.1} kg, {:.1}% volume",
            container.id,
            result.total_placed,
            total_weight,
            result.volume_utilization
        );

        let load = ContainerLoad {
            index,
            container_id: container.id,
            label: container.label.clone(),
            max_weight: container.max_weight,
            cost_weight: container.cost_weight,
            total_weight,
            result,
        };
        if load.exceeds_weight_limit() {
            log::warn!(
                "container {} (#{index}) carries {:.1} kg, above its {:.1} kg limit",
                container.id,
                load.total_weight,
                load.max_weight
            );
        }
        loads.push(load);
    }

    let unplaced: Vec<UnplacedGroup> = groups
        .iter()
        .filter_map(|group| {
            let placed: u64 = loads
                .iter()
                .map(|l| u64::from(l.result.placed_of(group.id)))
                .sum();
            let missing = u64::from(group.quantity).saturating_sub(placed);
            (missing > 0).then(|| UnplacedGroup {
                id: group.id,
                name: group.name.clone(),
                quantity: u32::try_from(missing).unwrap_or(u32::MAX),
            })
        })
        .collect();

    let total_placed: usize = loads.iter().map(ContainerLoad::total_placed).sum();
    let total_weight: f64 = loads.iter().map(|l| l.total_weight).sum();
    let unplaced_total: u64 = unplaced.iter().map(|u| u64::from(u.quantity)).sum();

    on_event(&PackEvent::Finished {
        containers: loads.len(),
        placed: total_placed,
        unplaced: unplaced_total,
    });

    DistributionResult {
        loads,
        unplaced,
        total_placed,
        total_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn cube_container(id: usize) -> Container {
        Container::new(id, (1000.0, 1000.0, 1000.0), 10_000.0).unwrap()
    }

    fn cubes(id: usize, quantity: u32) -> Group {
        Group::new(id, format!("cube {id}"), (500.0, 500.0, 500.0), 10.0, quantity).unwrap()
    }

    #[test_case(10, 3 => vec![4, 3, 3] ; "remainder to the first")]
    #[test_case(2, 4 => vec![1, 1, 0, 0] ; "fewer units than containers")]
    #[test_case(0, 2 => vec![0, 0] ; "nothing to split")]
    #[test_case(9, 1 => vec![9] ; "single container")]
    #[test_case(5, 0 => Vec::<u32>::new() ; "no containers")]
    fn spread_allocations_cases(total: u32, containers: usize) -> Vec<u32> {
        spread_allocations(total, containers)
    }

    #[test]
    fn spread_allocations_sum_and_differ_by_one() {
        for total in 0..40 {
            for n in 1..7 {
                let parts = spread_allocations(total, n);
                assert_eq!(parts.iter().sum::<u32>(), total);
                let max = parts.iter().max().copied().unwrap_or(0);
                let min = parts.iter().min().copied().unwrap_or(0);
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn sequential_mode_carries_remainder_forward() {
        let result = pack_containers(
            &[cubes(1, 10)],
            &[cube_container(0), cube_container(1)],
            DistributionOptions::default(),
            &PackingConfig::default(),
        );

        assert_eq!(result.loads[0].total_placed(), 8);
        assert_eq!(result.loads[1].total_placed(), 2);
        assert_eq!(result.loads[1].result.groups[0].requested_quantity, 2);
        assert_eq!(result.placed_of(1), 10);
        assert!(result.is_complete());
        assert!((result.total_weight - 100.0).abs() < 1e-9);
    }

    #[test]
    fn sequential_mode_never_exceeds_request() {
        let groups = vec![cubes(1, 20), cubes(2, 3)];
        let result = pack_containers(
            &groups,
            &[cube_container(0), cube_container(1)],
            DistributionOptions::default(),
            &PackingConfig::default(),
        );

        for group in &groups {
            assert!(result.placed_of(group.id) <= u64::from(group.quantity));
        }
        assert_eq!(result.total_placed, 16);
        let missing: u32 = result.unplaced.iter().map(|u| u.quantity).sum();
        assert_eq!(missing, 7);
    }

    #[test]
    fn even_spread_splits_up_front() {
        let result = pack_containers(
            &[cubes(1, 9)],
            &[cube_container(0), cube_container(1)],
            DistributionOptions { spread_evenly: true },
            &PackingConfig::default(),
        );

        assert_eq!(result.loads[0].result.groups[0].requested_quantity, 5);
        assert_eq!(result.loads[1].result.groups[0].requested_quantity, 4);
        assert_eq!(result.loads[0].total_placed(), 5);
        assert_eq!(result.loads[1].total_placed(), 4);
    }

    #[test]
    fn even_spread_does_not_carry_forward() {
        // 10 per container requested, only 8 fit each
        let result = pack_containers(
            &[cubes(1, 20)],
            &[cube_container(0), cube_container(1)],
            DistributionOptions { spread_evenly: true },
            &PackingConfig::default(),
        );
        assert_eq!(result.total_placed, 16);
        assert_eq!(result.unplaced[0].quantity, 4);
    }

    #[test]
    fn allow_lists_route_groups() {
        let only_two = cube_container(0).with_allowed_groups(vec![2]);
        let result = pack_containers(
            &[cubes(1, 2), cubes(2, 2)],
            &[only_two, cube_container(1)],
            DistributionOptions::default(),
            &PackingConfig::default(),
        );

        assert_eq!(result.loads[0].result.placed_of(1), 0);
        assert_eq!(result.loads[0].result.placed_of(2), 2);
        assert_eq!(result.loads[0].result.groups[0].requested_quantity, 0);
        assert_eq!(result.loads[1].result.placed_of(1), 2);
        assert_eq!(result.loads[1].result.placed_of(2), 0);
    }

    #[test]
    fn emits_events_in_order() {
        let mut events = Vec::new();
        let result = pack_containers_with_progress(
            &[cubes(1, 3)],
            &[cube_container(0)],
            DistributionOptions::default(),
            &PackingConfig::default(),
            |event| events.push(event.clone()),
        );

        assert!(matches!(events.first(), Some(PackEvent::ContainerStarted { requested: 3, .. })));
        assert!(matches!(
            events.last(),
            Some(PackEvent::Finished { containers: 1, placed: 3, unplaced: 0 })
        ));
        let placed = events
            .iter()
            .filter(|e| matches!(e, PackEvent::BoxPlaced { .. }))
            .count();
        assert_eq!(placed, result.total_placed);
        if let Some(PackEvent::BoxPlaced { total_weight, .. }) = events.get(3) {
            assert!((total_weight - 30.0).abs() < 1e-9);
        } else {
            panic!("expected third placement event");
        }

        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["type"], "ContainerStarted");
    }

    #[test]
    fn no_containers_leaves_everything_unplaced() {
        let result = pack_containers(
            &[cubes(1, 4)],
            &[],
            DistributionOptions::default(),
            &PackingConfig::default(),
        );
        assert_eq!(result.container_count(), 0);
        assert_eq!(result.unplaced[0].quantity, 4);
        assert_eq!(result.average_utilization(), 0.0);
    }
}

//! Heuristic container recommendation.
//!
//! Finds a low-cost combination of catalog container types that holds the
//! whole request. The search is bounded: up to four instances of one type, or
//! pairs of two distinct types. Every candidate is verified by an actual
//! sequential packing run.

use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use crate::distributor::{DistributionOptions, pack_containers};
use crate::model::{Container, ContainerType, Group};
use crate::optimizer::PackingConfig;

/// Maximum instances of a single type tried on its own.
const MAX_SINGLE_TYPE_COUNT: usize = 4;
/// Costs closer than this are considered equal when ranking.
const COST_TOLERANCE: f64 = 0.01;
/// Largest fallback that is verified by a packing run.
const MAX_VERIFIED_FALLBACK: usize = 16;

/// Number of instances of one catalog type in a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct TypeCount {
    pub type_id: usize,
    pub label: String,
    pub count: usize,
}

/// A verified combination of container instances.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RecommendationCandidate {
    /// Instantiated containers in packing order
    pub containers: Vec<Container>,
    pub type_counts: Vec<TypeCount>,
    /// Sum of the cost weights of all instances
    pub total_cost: f64,
    pub total_placed: u64,
    pub total_requested: u64,
    /// Produced by repeating the largest type because nothing else qualified
    pub fallback: bool,
    /// False when `total_placed` is estimated from the single-container capacity
    pub verified: bool,
}

impl RecommendationCandidate {
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    pub fn covers_request(&self) -> bool {
        self.total_placed >= self.total_requested
    }
}

/// Catalog type with its single-container capacity for the request.
struct RatedType<'a> {
    container_type: &'a ContainerType,
    capacity: u64,
}

/// Recommends container combinations for `groups`, best first.
///
/// Returns an empty list when there is nothing to ship or no catalog type can
/// hold a single unit.
pub fn recommend_containers(
    groups: &[Group],
    catalog: &[ContainerType],
    config: &PackingConfig,
) -> Vec<RecommendationCandidate> {
    let total_requested: u64 = groups.iter().map(|g| u64::from(g.quantity)).sum();
    if groups.is_empty() || total_requested == 0 {
        return Vec::new();
    }

    let mut rated: Vec<RatedType<'_>> = catalog
        .iter()
        .filter(|t| t.is_usable())
        .map(|container_type| RatedType {
            container_type,
            capacity: evaluate(groups, &[container_type], config),
        })
        .filter(|r| r.capacity > 0)
        .collect();
    rated.sort_by(|a, b| b.capacity.cmp(&a.capacity));

    let Some(largest) = rated.first() else {
        log::info!("no catalog type can hold any of the {total_requested} requested units");
        return Vec::new();
    };

    for r in &rated {
        log::debug!(
            "capacity of '{}': {} of {} units",
            r.container_type.label,
            r.capacity,
            total_requested
        );
    }

    let mut candidates: Vec<RecommendationCandidate> = Vec::new();

    // a single type, as few instances as possible
    for r in &rated {
        for count in 1..=MAX_SINGLE_TYPE_COUNT {
            let combo = vec![r.container_type; count];
            let placed = evaluate(groups, &combo, config);
            if placed >= total_requested {
                candidates.push(candidate(&combo, placed, total_requested, false));
                break;
            }
        }
    }

    // pairs of distinct types, larger capacity first
    for (i, first) in rated.iter().enumerate() {
        for second in &rated[i + 1..] {
            let mut combos = vec![vec![first.container_type, second.container_type]];
            if first.capacity > second.capacity {
                combos.push(vec![
                    first.container_type,
                    second.container_type,
                    second.container_type,
                ]);
            }
            for combo in combos {
                let placed = evaluate(groups, &combo, config);
                if placed >= total_requested {
                    candidates.push(candidate(&combo, placed, total_requested, false));
                }
            }
        }
    }

    if candidates.is_empty() {
        let count = usize::try_from(total_requested.div_ceil(largest.capacity)).unwrap_or(usize::MAX);
        log::info!(
            "no bounded combination covers {total_requested} units, repeating '{}' {count} times",
            largest.container_type.label
        );
        let combo = vec![largest.container_type; count];
        let fallback = if count <= MAX_VERIFIED_FALLBACK {
            candidate(&combo, evaluate(groups, &combo, config), total_requested, true)
        } else {
            let estimate = largest.capacity.saturating_mul(count as u64).min(total_requested);
            RecommendationCandidate {
                verified: false,
                ..candidate(&combo, estimate, total_requested, true)
            }
        };
        if !fallback.covers_request() {
            log::warn!(
                "fallback of {count} × '{}' places only {} of {total_requested} units",
                largest.container_type.label,
                fallback.total_placed
            );
        }
        return vec![fallback];
    }

    rank(candidates)
}

/// Units placed when packing `combo` sequentially.
fn evaluate(groups: &[Group], combo: &[&ContainerType], config: &PackingConfig) -> u64 {
    let containers = instantiate(combo);
    pack_containers(groups, &containers, DistributionOptions::default(), config).total_placed as u64
}

fn instantiate(combo: &[&ContainerType]) -> Vec<Container> {
    combo
        .iter()
        .enumerate()
        .map(|(i, t)| t.instantiate(i))
        .collect()
}

fn candidate(
    combo: &[&ContainerType],
    total_placed: u64,
    total_requested: u64,
    fallback: bool,
) -> RecommendationCandidate {
    let mut type_counts: Vec<TypeCount> = Vec::new();
    for t in combo {
        match type_counts.iter_mut().find(|c| c.type_id == t.id) {
            Some(entry) => entry.count += 1,
            None => type_counts.push(TypeCount {
                type_id: t.id,
                label: t.label.clone(),
                count: 1,
            }),
        }
    }

    RecommendationCandidate {
        containers: instantiate(combo),
        type_counts,
        total_cost: combo.iter().map(|t| t.cost_weight).sum(),
        total_placed,
        total_requested,
        fallback,
        verified: true,
    }
}

/// Orders candidates best first.
///
/// Insertion keeps the order deterministic even though the cost tolerance is
/// not transitive.
fn rank(candidates: Vec<RecommendationCandidate>) -> Vec<RecommendationCandidate> {
    let mut ranked: Vec<RecommendationCandidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        let position = ranked
            .iter()
            .position(|existing| is_better(&c, existing))
            .unwrap_or(ranked.len());
        ranked.insert(position, c);
    }
    ranked
}

/// Priority: cost (low) > container count (low) > placed units (high).
fn is_better(new: &RecommendationCandidate, current: &RecommendationCandidate) -> bool {
    match compare_with_epsilon(new.total_cost, current.total_cost, COST_TOLERANCE) {
        Ordering::Less => return true,
        Ordering::Greater => return false,
        Ordering::Equal => {}
    }

    match new.container_count().cmp(&current.container_count()) {
        Ordering::Less => return true,
        Ordering::Greater => return false,
        Ordering::Equal => {}
    }

    new.total_placed > current.total_placed
}

fn compare_with_epsilon(a: f64, b: f64, eps: f64) -> Ordering {
    if (a - b).abs() <= eps {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubes(edge: f64, quantity: u32) -> Group {
        Group::new(1, "cube", (edge, edge, edge), 1.0, quantity).unwrap()
    }

    fn small_and_large() -> Vec<ContainerType> {
        vec![
            // 10 × 5 × 2 cubes of 100
            ContainerType::new(0, "A", (1000.0, 500.0, 200.0), 10_000.0, 1.0).unwrap(),
            // 10 × 5 × 5 cubes of 100
            ContainerType::new(1, "B", (1000.0, 500.0, 500.0), 10_000.0, 1.5).unwrap(),
        ]
    }

    #[test]
    fn prefers_one_large_over_several_small() {
        let ranked = recommend_containers(&[cubes(100.0, 240)], &small_and_large(), &PackingConfig::default());

        let best = &ranked[0];
        assert_eq!(best.container_count(), 1);
        assert_eq!(best.type_counts, vec![TypeCount { type_id: 1, label: "B".into(), count: 1 }]);
        assert!((best.total_cost - 1.5).abs() < 1e-9);
        assert!(best.covers_request());
        assert!(!best.fallback);

        // 3 × A qualifies as well but costs more
        let three_small = ranked
            .iter()
            .find(|c| c.type_counts == vec![TypeCount { type_id: 0, label: "A".into(), count: 3 }])
            .expect("3 × A candidate");
        assert!((three_small.total_cost - 3.0).abs() < 1e-9);

        let costs: Vec<f64> = ranked.iter().map(|c| c.total_cost).collect();
        assert!(costs.windows(2).all(|w| w[0] <= w[1] + COST_TOLERANCE));
    }

    #[test]
    fn falls_back_to_repeating_the_largest_type() {
        let catalog = vec![ContainerType::new(0, "cube", (1000.0, 1000.0, 1000.0), 1000.0, 1.0).unwrap()];
        let ranked = recommend_containers(&[cubes(500.0, 40)], &catalog, &PackingConfig::default());

        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].fallback);
        assert_eq!(ranked[0].container_count(), 5);
        assert_eq!(ranked[0].total_placed, 40);
        assert!(ranked[0].verified);
    }

    #[test]
    fn large_fallback_is_estimated_without_packing_every_container() {
        // 8 cubes per container, 20 containers needed
        let catalog = vec![ContainerType::new(0, "cube", (1000.0, 1000.0, 1000.0), 1000.0, 1.0).unwrap()];
        let ranked = recommend_containers(&[cubes(500.0, 160)], &catalog, &PackingConfig::default());

        assert_eq!(ranked.len(), 1);
        let fallback = &ranked[0];
        assert!(fallback.fallback);
        assert!(!fallback.verified);
        assert_eq!(fallback.container_count(), 20);
        assert_eq!(fallback.total_placed, 160);
        assert!((fallback.total_cost - 20.0).abs() < 1e-9);
    }

    #[test]
    fn mixed_pair_wins_when_cheaper_than_repeats() {
        // 3 × A and 2 × B both cost 3.0, B + A costs 2.5
        let ranked = recommend_containers(&[cubes(100.0, 300)], &small_and_large(), &PackingConfig::default());

        let best = &ranked[0];
        assert_eq!(
            best.type_counts,
            vec![
                TypeCount { type_id: 1, label: "B".into(), count: 1 },
                TypeCount { type_id: 0, label: "A".into(), count: 1 },
            ]
        );
        assert!((best.total_cost - 2.5).abs() < 1e-9);
        assert_eq!(best.total_placed, 300);
        assert!(!best.fallback);

        // equal cost: fewer containers first
        assert_eq!(ranked[1].type_counts, vec![TypeCount { type_id: 1, label: "B".into(), count: 2 }]);
        assert_eq!(ranked[2].type_counts, vec![TypeCount { type_id: 0, label: "A".into(), count: 3 }]);

        // one larger plus two smaller qualifies as well
        assert!(ranked.iter().any(|c| c.type_counts
            == vec![
                TypeCount { type_id: 1, label: "B".into(), count: 1 },
                TypeCount { type_id: 0, label: "A".into(), count: 2 },
            ]));
    }

    #[test]
    fn infeasible_and_empty_requests_return_nothing() {
        let config = PackingConfig::default();
        assert!(recommend_containers(&[cubes(5000.0, 1)], &small_and_large(), &config).is_empty());
        assert!(recommend_containers(&[], &small_and_large(), &config).is_empty());
        assert!(recommend_containers(&[cubes(100.0, 0)], &small_and_large(), &config).is_empty());
    }

    #[test]
    fn unusable_catalog_entries_are_ignored() {
        let mut catalog = small_and_large();
        catalog[1].max_weight = 0.0;
        let ranked = recommend_containers(&[cubes(100.0, 150)], &catalog, &PackingConfig::default());

        assert!(ranked.iter().all(|c| c.type_counts.iter().all(|t| t.type_id == 0)));
        assert_eq!(ranked[0].container_count(), 2);
    }

    #[test]
    fn ranking_breaks_cost_ties_by_count_then_placed() {
        let catalog = small_and_large();
        let a = &catalog[0];
        let b = &catalog[1];

        let ranked = rank(vec![
            candidate(&[a, a], 10, 10, false),
            candidate(&[b], 10, 10, false),
            candidate(&[a, a], 12, 10, false),
        ]);
        // costs 2.0, 1.5, 2.0
        assert_eq!(ranked[0].container_count(), 1);
        assert_eq!(ranked[1].total_placed, 12);
        assert_eq!(ranked[2].total_placed, 10);
    }
}

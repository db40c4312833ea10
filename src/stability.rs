//! Post-hoc stability and weight analysis of a packed container.
//!
//! Support is resolved after packing: boxes are visited in ascending floor
//! height and each one collects the overlap with the top faces of the boxes
//! that end exactly where it starts.

use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::geometry::{overlap_area_xy, resting_on};
use crate::model::Placement;
use crate::types::{CenterOfMassCalculator, Dimensional, Vec3, Weighted};

/// Severity band of an under-supported box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Less than 30% support
    Critical,
    /// Less than 50% support
    Warning,
    /// Less than 70% support
    Caution,
    /// Below a raised threshold but at least 70% support
    Advisory,
}

impl Severity {
    pub fn from_support(support: f64) -> Self {
        if support < 0.3 {
            Severity::Critical
        } else if support < 0.5 {
            Severity::Warning
        } else if support < 0.7 {
            Severity::Caution
        } else {
            Severity::Advisory
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Severity::Critical => "Critical: Less than 30% support. High risk of falling.",
            Severity::Warning => "Warning: Less than 50% support. May shift during transport.",
            Severity::Caution => "Caution: Marginal support. Consider repositioning.",
            Severity::Advisory => "Acceptable support level.",
        }
    }
}

/// A box whose support fraction is below the configured threshold.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct StabilityIssue {
    pub sequence: usize,
    pub group_id: usize,
    #[schema(value_type = [f64; 3])]
    pub center: (f64, f64, f64),
    pub support: f64,
    pub severity: Severity,
    pub recommendation: String,
}

/// Aggregate stability verdict for one container.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct StabilitySummary {
    /// Mean support over all placements (1.0 when empty)
    pub score: f64,
    pub issues: Vec<StabilityIssue>,
    pub is_stable: bool,
    pub recommendation: String,
}

impl StabilitySummary {
    /// Summary of a container without boxes.
    pub fn empty() -> Self {
        Self {
            score: 1.0,
            issues: Vec::new(),
            is_stable: true,
            recommendation: String::new(),
        }
    }
}

/// Center of mass and balance verdict for one container.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct WeightDistribution {
    #[schema(value_type = [f64; 3], example = json!([2947.5, 1175.0, 598.0]))]
    pub center_of_mass: (f64, f64, f64),
    /// Centered on the floor, a quarter of the container height up
    #[schema(value_type = [f64; 3])]
    pub ideal_center: (f64, f64, f64),
    pub deviation: f64,
    pub max_deviation: f64,
    pub is_balanced: bool,
    pub total_weight: f64,
    pub max_weight: f64,
    /// Advisory only; the packer never stops on weight.
    pub exceeds_weight_limit: bool,
}

/// Resolves the support fraction of every placement.
///
/// Returns a new sequence sorted by floor height (stable, so equal floors keep
/// placement order). Boxes on the container floor get exactly 1.0; others get
/// the share of their base overlapping top faces at their floor height.
pub fn compute_support(placements: &[Placement], height_epsilon: f64) -> Vec<Placement> {
    let mut ordered: Vec<Placement> = placements.to_vec();
    ordered.sort_by(|a, b| {
        a.floor_height()
            .partial_cmp(&b.floor_height())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for i in 0..ordered.len() {
        let (below, rest) = ordered.split_at_mut(i);
        let current = &mut rest[0];

        if current.floor_height() <= height_epsilon {
            current.support = 1.0;
            continue;
        }

        let base_area = current.base_area();
        let supported: f64 = resting_on(current, below, height_epsilon)
            .map(|p| overlap_area_xy(current, p))
            .sum();

        current.support = if base_area > 0.0 {
            (supported / base_area).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    ordered
}

/// Overall verdict text for a mean support score and issue count.
pub fn overall_recommendation(score: f64, issue_count: usize) -> &'static str {
    if score > 0.9 && issue_count == 0 {
        "Excellent stability. Load is well-balanced and secure."
    } else if score > 0.8 && issue_count <= 2 {
        "Good stability with minor issues. Check highlighted items."
    } else if score > 0.7 {
        "Acceptable stability. Some adjustments recommended."
    } else if score > 0.5 {
        "Poor stability. Significant adjustments needed."
    } else {
        "Critical stability issues. Complete reorganization recommended."
    }
}

/// Aggregates resolved supports into a stability summary.
pub fn analyze_stability(placements: &[Placement], threshold: f64) -> StabilitySummary {
    if placements.is_empty() {
        return StabilitySummary::empty();
    }

    let issues: Vec<StabilityIssue> = placements
        .iter()
        .filter(|p| p.support < threshold)
        .map(|p| {
            let severity = Severity::from_support(p.support);
            StabilityIssue {
                sequence: p.sequence,
                group_id: p.group_id,
                center: p.center,
                support: p.support,
                severity,
                recommendation: severity.recommendation().to_string(),
            }
        })
        .collect();

    let score = placements.iter().map(|p| p.support).sum::<f64>() / placements.len() as f64;

    StabilitySummary {
        score,
        is_stable: issues.is_empty(),
        recommendation: overall_recommendation(score, issues.len()).to_string(),
        issues,
    }
}

/// Computes the center of mass and checks it against the ideal load point.
///
/// The load counts as balanced when the distance to the ideal point does not
/// exceed `sqrt(L² + W²) · tolerance`.
pub fn analyze_weight_distribution(
    placements: &[Placement],
    container_dims: (f64, f64, f64),
    max_weight: f64,
    tolerance: f64,
) -> WeightDistribution {
    let (length, width, height) = container_dims;
    let ideal = Vec3::new(length / 2.0, width / 2.0, height * 0.25);
    let max_deviation = (length * length + width * width).sqrt() * tolerance;

    let mut calc = CenterOfMassCalculator::new();
    for p in placements {
        calc.add_point(Vec3::from_tuple(p.center), p.weight());
    }
    let total_weight = calc.total_weight();

    let (center_of_mass, deviation, is_balanced) = match calc.compute() {
        Some(center) => {
            let deviation = center.distance_to(&ideal);
            (center.as_tuple(), deviation, deviation <= max_deviation)
        }
        None => ((0.0, 0.0, 0.0), 0.0, true),
    };

    WeightDistribution {
        center_of_mass,
        ideal_center: ideal.as_tuple(),
        deviation,
        max_deviation,
        is_balanced,
        total_weight,
        max_weight,
        exceeds_weight_limit: total_weight > max_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::OrientationKind;
    use test_case::test_case;

    fn placement(sequence: usize, position: (f64, f64, f64), dims: (f64, f64, f64), weight: f64) -> Placement {
        Placement {
            sequence,
            group_id: 1,
            orientation: OrientationKind::Upright,
            position,
            dims,
            center: (
                position.0 + dims.0 / 2.0,
                position.1 + dims.1 / 2.0,
                position.2 + dims.2 / 2.0,
            ),
            weight,
            support: 0.0,
        }
    }

    #[test]
    fn floor_boxes_are_fully_supported() {
        let placements = vec![
            placement(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0), 1.0),
            placement(1, (10.0, 0.0, 0.0), (10.0, 10.0, 5.0), 1.0),
        ];
        let resolved = compute_support(&placements, 1e-3);
        assert!(resolved.iter().all(|p| p.support == 1.0));
    }

    #[test]
    fn overhanging_box_gets_partial_support() {
        // upper box centered over the seam of two boxes with different heights
        let placements = vec![
            placement(0, (0.0, 0.0, 10.0), (5.0, 10.0, 5.0), 1.0),
            placement(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0), 1.0),
            placement(2, (10.0, 0.0, 0.0), (10.0, 10.0, 5.0), 1.0),
            placement(3, (5.0, 0.0, 10.0), (10.0, 10.0, 5.0), 1.0),
        ];
        let resolved = compute_support(&placements, 1e-3);

        let floors: Vec<f64> = resolved.iter().map(|p| p.floor_height()).collect();
        assert_eq!(floors, vec![0.0, 0.0, 10.0, 10.0]);
        // stable order for equal floors
        let sequences: Vec<usize> = resolved.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 0, 3]);

        let first_upper = &resolved[2];
        assert!((first_upper.support - 1.0).abs() < 1e-9);
        let seam = &resolved[3];
        assert!((seam.support - 0.5).abs() < 1e-9);
    }

    #[test]
    fn floating_box_has_zero_support() {
        let placements = vec![
            placement(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0), 1.0),
            placement(1, (20.0, 0.0, 10.0), (10.0, 10.0, 10.0), 1.0),
        ];
        let resolved = compute_support(&placements, 1e-3);
        assert_eq!(resolved[1].support, 0.0);
    }

    #[test_case(0.95, 0 => "Excellent stability. Load is well-balanced and secure." ; "excellent")]
    #[test_case(0.95, 1 => "Good stability with minor issues. Check highlighted items." ; "good despite high score")]
    #[test_case(0.85, 2 => "Good stability with minor issues. Check highlighted items." ; "good")]
    #[test_case(0.85, 3 => "Acceptable stability. Some adjustments recommended." ; "acceptable many issues")]
    #[test_case(0.75, 0 => "Acceptable stability. Some adjustments recommended." ; "acceptable")]
    #[test_case(0.6, 0 => "Poor stability. Significant adjustments needed." ; "poor")]
    #[test_case(0.5, 0 => "Critical stability issues. Complete reorganization recommended." ; "critical boundary")]
    fn recommendation_bands(score: f64, issues: usize) -> &'static str {
        overall_recommendation(score, issues)
    }

    #[test_case(0.1 => Severity::Critical ; "critical")]
    #[test_case(0.3 => Severity::Warning ; "warning boundary")]
    #[test_case(0.6 => Severity::Caution ; "caution")]
    #[test_case(0.75 => Severity::Advisory ; "advisory")]
    fn severity_bands(support: f64) -> Severity {
        Severity::from_support(support)
    }

    #[test]
    fn issues_are_reported_below_threshold() {
        let mut placements = vec![
            placement(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0), 1.0),
            placement(1, (0.0, 0.0, 10.0), (10.0, 10.0, 10.0), 1.0),
        ];
        placements[0].support = 1.0;
        placements[1].support = 0.4;

        let summary = analyze_stability(&placements, 0.7);
        assert!((summary.score - 0.7).abs() < 1e-9);
        assert_eq!(summary.issues.len(), 1);
        assert_eq!(summary.issues[0].sequence, 1);
        assert_eq!(summary.issues[0].severity, Severity::Warning);
        assert!(!summary.is_stable);
        assert_eq!(
            summary.recommendation,
            "Poor stability. Significant adjustments needed."
        );
    }

    #[test]
    fn empty_load_is_stable_and_balanced() {
        let summary = analyze_stability(&[], 0.7);
        assert_eq!(summary.score, 1.0);
        assert!(summary.is_stable);

        let weight = analyze_weight_distribution(&[], (100.0, 100.0, 100.0), 10.0, 0.15);
        assert!(weight.is_balanced);
        assert_eq!(weight.total_weight, 0.0);
        assert!(!weight.exceeds_weight_limit);
    }

    #[test]
    fn weight_distribution_balance_verdict() {
        let dims = (1000.0, 1000.0, 1000.0);
        // one heavy box low and centered: deviation from (500, 500, 250) is 200
        let centered = vec![placement(0, (400.0, 400.0, 0.0), (200.0, 200.0, 100.0), 50.0)];
        let report = analyze_weight_distribution(&centered, dims, 40.0, 0.15);
        assert!((report.deviation - 200.0).abs() < 1e-9);
        assert!((report.max_deviation - 2_000_000.0_f64.sqrt() * 0.15).abs() < 1e-9);
        assert!(report.is_balanced);
        assert!(report.exceeds_weight_limit);

        let corner = vec![placement(0, (0.0, 0.0, 0.0), (100.0, 100.0, 100.0), 50.0)];
        let report = analyze_weight_distribution(&corner, dims, 100.0, 0.15);
        assert_eq!(report.center_of_mass, (50.0, 50.0, 50.0));
        assert!(!report.is_balanced);
    }
}

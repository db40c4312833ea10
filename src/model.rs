//! Data models for container load planning.
//!
//! This module defines the fundamental data structures of the packing engine:
//! - `Group`: A box type with a requested quantity
//! - `Container`: One container instance with its limits and group allow-list
//! - `ContainerType`: A catalog entry used by the recommender
//! - `Placement`: One packed box instance inside a container
//!
//! Dimensions are always given as (length, width, height).

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::orientation::OrientationKind;
use crate::types::{BoundingBox, Dimensional, Rect, Vec3, Weighted};

/// Validation error for input data.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Checks that all three edges are positive and finite.
pub fn validate_dims(dims: (f64, f64, f64), prefix: &str) -> Result<(), ValidationError> {
    validate_dimension(dims.0, &format!("{prefix} length"))?;
    validate_dimension(dims.1, &format!("{prefix} width"))?;
    validate_dimension(dims.2, &format!("{prefix} height"))?;
    Ok(())
}

/// Box weights may be zero, container limits must be positive.
fn validate_weight_value(value: f64, allow_zero: bool) -> Result<(), ValidationError> {
    let below_minimum = if allow_zero { value < 0.0 } else { value <= 0.0 };
    if below_minimum || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "Weight must be {}, got: {}",
            if allow_zero { "non-negative" } else { "positive" },
            value
        )));
    }
    Ok(())
}

fn validate_cost_weight(value: f64) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidConfiguration(format!(
            "Cost weight must be positive, got: {}",
            value
        )));
    }
    Ok(())
}

fn default_cost_weight() -> f64 {
    1.0
}

/// A box type together with the quantity that should be shipped.
///
/// # Fields
/// * `id` - Opaque identity, referenced by placements and allow-lists
/// * `dims` - Edge lengths (length, width, height)
/// * `weight` - Weight of one unit in kg
/// * `quantity` - Requested number of units
/// * `inners_per_box` - Inner units contained in one box (reporting only)
/// * `allow_side_laying` - Per-group override of the global side-laying permission
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: usize,
    #[serde(default)]
    pub name: String,
    #[schema(value_type = [f64; 3], example = json!([600.0, 400.0, 300.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
    pub quantity: u32,
    #[serde(default)]
    pub inners_per_box: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub allow_side_laying: Option<bool>,
}

impl Group {
    /// Creates a new group after validating dimensions and weight.
    ///
    /// # Returns
    /// `Ok(Group)` for valid values, otherwise `Err(ValidationError)`
    #[allow(dead_code)]
    pub fn new(
        id: usize,
        name: impl Into<String>,
        dims: (f64, f64, f64),
        weight: f64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        validate_dims(dims, "Box")?;
        validate_weight_value(weight, true)?;
        Ok(Self {
            id,
            name: name.into(),
            dims,
            weight,
            quantity,
            inners_per_box: 0,
            color: None,
            allow_side_laying: None,
        })
    }

    /// Re-runs the constructor checks on a deserialized value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dims(self.dims, "Box")?;
        validate_weight_value(self.weight, true)
    }

    /// Sets the per-group side-laying permission.
    #[allow(dead_code)]
    pub fn with_side_laying(mut self, allowed: bool) -> Self {
        self.allow_side_laying = Some(allowed);
        self
    }

    /// Resolves the side-laying permission against the global setting.
    pub fn side_laying_allowed(&self, global: bool) -> bool {
        self.allow_side_laying.unwrap_or(global)
    }

    /// Weight per volume unit, used to order groups before packing.
    pub fn density(&self) -> f64 {
        let volume = self.volume();
        if volume > 0.0 {
            self.weight / volume
        } else {
            self.weight
        }
    }

    /// Copy of this group with a different requested quantity.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

impl Dimensional for Group {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

impl Weighted for Group {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// A container instance with capacity limits.
///
/// # Fields
/// * `dims` - Interior dimensions (length, width, height)
/// * `max_weight` - Maximum gross weight in kg (advisory, reported only)
/// * `cost_weight` - Relative procurement cost, used by the recommender
/// * `allowed_groups` - Group ids this container may hold; empty means all
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Container {
    pub id: usize,
    #[serde(default)]
    pub label: Option<String>,
    #[schema(value_type = [f64; 3], example = json!([5895.0, 2350.0, 2392.0]))]
    pub dims: (f64, f64, f64),
    pub max_weight: f64,
    #[serde(default = "default_cost_weight")]
    pub cost_weight: f64,
    #[serde(default)]
    pub allowed_groups: Vec<usize>,
}

impl Container {
    /// Creates a new unrestricted container with validation.
    #[allow(dead_code)]
    pub fn new(id: usize, dims: (f64, f64, f64), max_weight: f64) -> Result<Self, ValidationError> {
        validate_dims(dims, "Container")?;
        validate_weight_value(max_weight, false)?;

        Ok(Self {
            id,
            label: None,
            dims,
            max_weight,
            cost_weight: default_cost_weight(),
            allowed_groups: Vec::new(),
        })
    }

    /// Re-runs the constructor checks on a deserialized value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dims(self.dims, "Container")?;
        validate_weight_value(self.max_weight, false)?;
        validate_cost_weight(self.cost_weight)
    }

    /// Restricts the container to the given groups.
    #[allow(dead_code)]
    pub fn with_allowed_groups(mut self, groups: Vec<usize>) -> Self {
        self.allowed_groups = groups;
        self
    }

    /// Checks the allow-list; an empty list admits every group.
    pub fn allows_group(&self, group_id: usize) -> bool {
        self.allowed_groups.is_empty() || self.allowed_groups.contains(&group_id)
    }

    /// Whether all three interior dimensions are positive and finite.
    pub fn has_valid_dims(&self) -> bool {
        self.dimensions().is_valid_dimension()
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

/// Template for a container type offered to the recommender.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ContainerType {
    pub id: usize,
    pub label: String,
    #[schema(value_type = [f64; 3], example = json!([12024.0, 2350.0, 2697.0]))]
    pub dims: (f64, f64, f64),
    pub max_weight: f64,
    #[serde(default = "default_cost_weight")]
    pub cost_weight: f64,
}

impl ContainerType {
    /// Creates a new container type after validating the parameters.
    #[allow(dead_code)]
    pub fn new(
        id: usize,
        label: impl Into<String>,
        dims: (f64, f64, f64),
        max_weight: f64,
        cost_weight: f64,
    ) -> Result<Self, ValidationError> {
        validate_dims(dims, "Container")?;
        validate_weight_value(max_weight, false)?;
        validate_cost_weight(cost_weight)?;
        Ok(Self {
            id,
            label: label.into(),
            dims,
            max_weight,
            cost_weight,
        })
    }

    /// Catalog entries need usable dimensions and a weight limit.
    pub fn is_usable(&self) -> bool {
        self.dimensions().is_valid_dimension() && self.max_weight > 0.0
    }

    /// Instantiates an unrestricted container of this type.
    pub fn instantiate(&self, instance_id: usize) -> Container {
        Container {
            id: instance_id,
            label: Some(self.label.clone()),
            dims: self.dims,
            max_weight: self.max_weight,
            cost_weight: self.cost_weight,
            allowed_groups: Vec::new(),
        }
    }
}

impl Dimensional for ContainerType {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

/// Standard shipping container presets.
pub fn container_presets() -> Vec<ContainerType> {
    vec![
        ContainerType {
            id: 0,
            label: "20' Standard (5895 × 2350 × 2392 mm)".to_string(),
            dims: (5895.0, 2350.0, 2392.0),
            max_weight: 28230.0,
            cost_weight: 1.0,
        },
        ContainerType {
            id: 1,
            label: "40' High Cube (12024 × 2350 × 2697 mm)".to_string(),
            dims: (12024.0, 2350.0, 2697.0),
            max_weight: 26460.0,
            cost_weight: 1.5,
        },
    ]
}

/// One packed box instance.
///
/// # Fields
/// * `sequence` - Index in placement order within its container
/// * `position` - Footprint origin (length axis, width axis) and floor height
/// * `dims` - Effective (length, width, height) of the chosen orientation
/// * `center` - Center of the box in container space
/// * `support` - Fraction of the base resting on boxes below (1.0 on the floor)
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct Placement {
    pub sequence: usize,
    pub group_id: usize,
    pub orientation: OrientationKind,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub position: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([600.0, 400.0, 300.0]))]
    pub dims: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([300.0, 200.0, 150.0]))]
    pub center: (f64, f64, f64),
    pub weight: f64,
    pub support: f64,
}

impl Placement {
    /// Height of the floor the box rests on.
    #[inline]
    pub fn floor_height(&self) -> f64 {
        self.position.2
    }

    /// Returns the top Z coordinate of the placed box.
    #[inline]
    pub fn top_z(&self) -> f64 {
        self.position.2 + self.dims.2
    }

    /// Footprint rectangle in the length × width plane.
    #[inline]
    pub fn footprint(&self) -> Rect {
        Rect::new(self.position.0, self.position.1, self.dims.0, self.dims.1)
    }

    /// Calculates the bounding box of the placed box.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(
            Vec3::from_tuple(self.position),
            Vec3::from_tuple(self.dims),
        )
    }
}

impl Dimensional for Placement {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

impl Weighted for Placement {
    fn weight(&self) -> f64 {
        self.weight
    }
}

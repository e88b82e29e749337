//! Data models for a computed stuffing plan.
//!
//! Two layers live here:
//! - The wire contract (`StuffingPlanData` and friends) exactly as the
//!   planning backend serializes it.
//! - The validated, read-only snapshot (`StuffingPlan`) that every other
//!   module consumes. A snapshot is replaced wholesale on reload and never
//!   patched in place.
//!
//! All domain structures implement the traits from the `types` module.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Dimensional, Vec3, Weighted};

/// Validation error for plan data.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

/// Helper to validate a single container dimension (must be strictly positive).
fn validate_container_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_weight_value(value: f64, name: &str) -> Result<(), ValidationError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} must not be negative, got: {}",
            name, value
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Wire contract
// ---------------------------------------------------------------------------

/// Container section of the plan payload.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "20ft Standard",
    "length_mm": 5898.0,
    "width_mm": 2352.0,
    "height_mm": 2393.0,
    "max_weight_kg": 28200.0,
    "volume_m3": 33.2
}))]
pub struct ContainerData {
    pub name: String,
    pub length_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub max_weight_kg: f64,
    #[serde(default)]
    pub volume_m3: f64,
}

/// One item type of the plan. Each physical unit gets its own placement.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemData {
    pub item_id: String,
    pub label: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub length_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub weight_kg: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub color_hex: Option<String>,
    #[serde(default = "default_allow_rotation")]
    pub allow_rotation: bool,
    #[serde(default)]
    pub stacking_limit: u32,
}

fn default_quantity() -> u32 {
    1
}

fn default_allow_rotation() -> bool {
    true
}

/// A single placement produced by the packing engine.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PlacementData {
    #[serde(default)]
    pub placement_id: String,
    pub item_id: String,
    pub pos_x: f64,
    pub pos_y: f64,
    pub pos_z: f64,
    /// Orientation code 0-5.
    #[serde(default)]
    pub rotation: i32,
    /// 1-based loading step.
    pub step_number: u32,
}

/// Calculation section (opaque result of the packing engine).
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CalculationData {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub placements: Vec<PlacementData>,
    #[serde(default)]
    pub volume_utilization_pct: f64,
    #[serde(default)]
    pub efficiency_score: f64,
}

/// Summary statistics reported alongside the plan.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PlanStats {
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_weight_kg: f64,
    #[serde(default)]
    pub total_volume_m3: f64,
    #[serde(default)]
    pub volume_utilization_pct: f64,
    #[serde(default)]
    pub weight_utilization_pct: f64,
}

/// Complete plan payload as injected by the host.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StuffingPlanData {
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub plan_code: Option<String>,
    pub container: ContainerData,
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub calculation: CalculationData,
    #[serde(default)]
    pub stats: PlanStats,
}

// ---------------------------------------------------------------------------
// Validated snapshot
// ---------------------------------------------------------------------------

/// 8-bit RGB display color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    /// Fallback for items without a usable color.
    pub const DEFAULT_ITEM: Rgb = Rgb::new(0x88, 0x88, 0x88);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a 6-digit RGB hex string with optional leading `#`.
    ///
    /// # Examples
    /// ```
    /// use stuffing_visualizer::model::Rgb;
    ///
    /// assert_eq!(Rgb::from_hex("#ff8800").unwrap(), Rgb::new(255, 136, 0));
    /// assert_eq!(Rgb::from_hex("00ff00").unwrap(), Rgb::new(0, 255, 0));
    /// assert!(Rgb::from_hex("#fff").is_err());
    /// ```
    pub fn from_hex(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidColor(format!(
                "expected 6 hex digits, got '{}'",
                raw
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|err| ValidationError::InvalidColor(format!("'{}': {}", raw, err)))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Normalized channels for PDF and shading math.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Scales all channels (flat shading); the factor is clamped to [0, 1].
    pub fn shade(self, factor: f64) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |channel: u8| (channel as f64 * factor).round() as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Linear blend towards `other` by `t` in [0, 1].
    pub fn mix(self, other: Rgb, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self::new(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Validated container shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerSpec {
    pub name: String,
    /// Inner length/width/height in millimeters.
    pub dims: Vec3,
    pub max_weight_kg: f64,
    pub volume_m3: f64,
}

impl ContainerSpec {
    /// Creates a container after validating its dimensions.
    pub fn new(
        name: impl Into<String>,
        dims: Vec3,
        max_weight_kg: f64,
    ) -> Result<Self, ValidationError> {
        validate_container_dimension(dims.x, "Container length")?;
        validate_container_dimension(dims.y, "Container width")?;
        validate_container_dimension(dims.z, "Container height")?;
        validate_weight_value(max_weight_kg, "Container max weight")?;
        Ok(Self {
            name: name.into(),
            dims,
            max_weight_kg,
            volume_m3: dims.volume() / 1_000_000_000.0,
        })
    }

    fn from_data(data: &ContainerData) -> Result<Self, ValidationError> {
        let mut spec = Self::new(
            data.name.clone(),
            Vec3::new(data.length_mm, data.width_mm, data.height_mm),
            data.max_weight_kg,
        )?;
        if data.volume_m3 > 0.0 && data.volume_m3.is_finite() {
            spec.volume_m3 = data.volume_m3;
        }
        Ok(spec)
    }
}

impl Dimensional for ContainerSpec {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

/// Validated item type.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSpec {
    pub id: String,
    pub label: String,
    pub sku: Option<String>,
    /// Base length/width/height before rotation.
    pub base_dims: Vec3,
    pub weight_kg: f64,
    pub color: Rgb,
    /// Informational only.
    pub quantity: u32,
    pub allow_rotation: bool,
    pub stacking_limit: u32,
}

impl ItemSpec {
    /// Creates an item with validated dimensions and weight.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        base_dims: Vec3,
        weight_kg: f64,
        color: Rgb,
    ) -> Result<Self, ValidationError> {
        if !base_dims.is_valid_dimension() {
            return Err(ValidationError::InvalidDimension(format!(
                "Item dimensions must not be negative, got: {} x {} x {}",
                base_dims.x, base_dims.y, base_dims.z
            )));
        }
        validate_weight_value(weight_kg, "Item weight")?;
        Ok(Self {
            id: id.into(),
            label: label.into(),
            sku: None,
            base_dims,
            weight_kg,
            color,
            quantity: 1,
            allow_rotation: true,
            stacking_limit: 0,
        })
    }

    fn from_data(data: &ItemData) -> Result<Self, ValidationError> {
        let color = match data.color_hex.as_deref() {
            Some(raw) => Rgb::from_hex(raw).unwrap_or_else(|err| {
                log::warn!(
                    "⚠️ Item '{}' has an unusable color ({}). Using {}.",
                    data.item_id,
                    err,
                    Rgb::DEFAULT_ITEM
                );
                Rgb::DEFAULT_ITEM
            }),
            None => Rgb::DEFAULT_ITEM,
        };
        let mut spec = Self::new(
            data.item_id.clone(),
            data.label.clone(),
            Vec3::new(data.length_mm, data.width_mm, data.height_mm),
            data.weight_kg,
            color,
        )?;
        spec.sku = data.sku.clone().filter(|sku| !sku.trim().is_empty());
        spec.quantity = data.quantity;
        spec.allow_rotation = data.allow_rotation;
        spec.stacking_limit = data.stacking_limit;
        Ok(spec)
    }
}

impl Dimensional for ItemSpec {
    fn dimensions(&self) -> Vec3 {
        self.base_dims
    }
}

impl Weighted for ItemSpec {
    fn weight(&self) -> f64 {
        self.weight_kg
    }
}

/// One physical unit positioned inside the container.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub id: String,
    pub item_id: String,
    /// Lower front-left corner in millimeters.
    pub position: Vec3,
    /// Raw orientation code as delivered by the packing engine.
    pub rotation_code: i32,
    /// 1-based loading step.
    pub step: u32,
}

impl Placement {
    fn from_data(index: usize, data: &PlacementData) -> Self {
        let id = if data.placement_id.trim().is_empty() {
            format!("placement-{}", index + 1)
        } else {
            data.placement_id.clone()
        };
        Self {
            id,
            item_id: data.item_id.clone(),
            position: Vec3::new(data.pos_x, data.pos_y, data.pos_z),
            rotation_code: data.rotation,
            step: data.step_number,
        }
    }
}

/// Aggregate row of the summary table.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemTotals<'a> {
    pub item: &'a ItemSpec,
    pub packages: usize,
    pub volume_m3: f64,
    pub weight_kg: f64,
}

/// Read-only snapshot of a plan.
#[derive(Clone, Debug)]
pub struct StuffingPlan {
    pub plan_code: Option<String>,
    pub container: ContainerSpec,
    pub items: Vec<ItemSpec>,
    pub placements: Vec<Placement>,
    pub stats: PlanStats,
    pub status: String,
    pub algorithm: String,
    pub volume_utilization_pct: f64,
    item_index: HashMap<String, usize>,
}

impl StuffingPlan {
    /// Validates the wire payload and builds the snapshot.
    ///
    /// Placements referencing unknown items are an upstream consistency
    /// issue. They are logged once here and skipped by
    /// [`StuffingPlan::resolved_placements`].
    pub fn from_data(data: &StuffingPlanData) -> Result<Self, ValidationError> {
        let container = ContainerSpec::from_data(&data.container)?;
        let items = data
            .items
            .iter()
            .map(ItemSpec::from_data)
            .collect::<Result<Vec<_>, _>>()?;
        let placements = data
            .calculation
            .placements
            .iter()
            .enumerate()
            .map(|(index, placement)| Placement::from_data(index, placement))
            .collect();

        let volume_utilization_pct = if data.calculation.volume_utilization_pct > 0.0 {
            data.calculation.volume_utilization_pct
        } else {
            data.stats.volume_utilization_pct
        };

        Ok(Self::assemble(
            data.plan_code.clone(),
            container,
            items,
            placements,
            data.stats.clone(),
            data.calculation.status.clone(),
            data.calculation.algorithm.clone(),
            volume_utilization_pct,
        ))
    }

    /// Builds a snapshot from already validated parts.
    pub fn new(container: ContainerSpec, items: Vec<ItemSpec>, placements: Vec<Placement>) -> Self {
        Self::assemble(
            None,
            container,
            items,
            placements,
            PlanStats::default(),
            String::new(),
            String::new(),
            0.0,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        plan_code: Option<String>,
        container: ContainerSpec,
        items: Vec<ItemSpec>,
        placements: Vec<Placement>,
        stats: PlanStats,
        status: String,
        algorithm: String,
        volume_utilization_pct: f64,
    ) -> Self {
        let item_index = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id.clone(), idx))
            .collect();
        let plan = Self {
            plan_code,
            container,
            items,
            placements,
            stats,
            status,
            algorithm,
            volume_utilization_pct,
            item_index,
        };
        for placement in plan.unresolved_placements() {
            log::warn!(
                "⚠️ Placement '{}' references unknown item '{}'; skipping.",
                placement.id,
                placement.item_id
            );
        }
        plan
    }

    /// Looks up an item by identity.
    pub fn item(&self, item_id: &str) -> Option<&ItemSpec> {
        self.item_index.get(item_id).map(|&idx| &self.items[idx])
    }

    /// Placements whose item exists, in input order.
    pub fn resolved_placements(&self) -> impl Iterator<Item = (&Placement, &ItemSpec)> + '_ {
        self.placements
            .iter()
            .filter_map(move |placement| Some((placement, self.item(&placement.item_id)?)))
    }

    /// Placements referencing an unknown item.
    pub fn unresolved_placements(&self) -> impl Iterator<Item = &Placement> + '_ {
        self.placements
            .iter()
            .filter(move |placement| self.item(&placement.item_id).is_none())
    }

    /// Resolvable placements sorted by step (stable for equal steps).
    pub fn placements_by_step(&self) -> Vec<(&Placement, &ItemSpec)> {
        let mut resolved: Vec<_> = self.resolved_placements().collect();
        resolved.sort_by_key(|(placement, _)| placement.step);
        resolved
    }

    /// Highest step among resolvable placements (0 for an empty plan).
    pub fn max_step(&self) -> u32 {
        self.resolved_placements()
            .map(|(placement, _)| placement.step)
            .max()
            .unwrap_or(0)
    }

    /// Sum of the weights of all placed units.
    pub fn cargo_weight_kg(&self) -> f64 {
        self.resolved_placements().map(|(_, item)| item.weight()).sum()
    }

    /// Loaded cargo volume derived from the reported utilization.
    pub fn cargo_volume_m3(&self) -> f64 {
        self.container.volume_m3 * self.volume_utilization_pct / 100.0
    }

    /// Per-item totals in first-appearance order of the placements.
    pub fn item_totals(&self) -> Vec<ItemTotals<'_>> {
        let mut totals: Vec<ItemTotals<'_>> = Vec::new();
        for (_, item) in self.resolved_placements() {
            match totals.iter_mut().find(|row| row.item.id == item.id) {
                Some(row) => row.packages += 1,
                None => totals.push(ItemTotals {
                    item,
                    packages: 1,
                    volume_m3: 0.0,
                    weight_kg: 0.0,
                }),
            }
        }
        for row in &mut totals {
            row.volume_m3 = row.item.volume() * row.packages as f64 / 1_000_000_000.0;
            row.weight_kg = row.item.weight() * row.packages as f64;
        }
        totals
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// 1m cube container with two unit cubes loaded at steps 1 and 2.
    pub fn two_cube_plan_data() -> StuffingPlanData {
        serde_json::from_value(json!({
            "plan_code": "PLN-0001",
            "container": {
                "name": "Test Box",
                "length_mm": 1000.0,
                "width_mm": 1000.0,
                "height_mm": 1000.0,
                "max_weight_kg": 100.0,
                "volume_m3": 1.0
            },
            "items": [{
                "item_id": "cube",
                "label": "Cube",
                "sku": "CUBE-1",
                "length_mm": 1.0,
                "width_mm": 1.0,
                "height_mm": 1.0,
                "weight_kg": 2.5,
                "quantity": 2,
                "color_hex": "#ff0000",
                "allow_rotation": true,
                "stacking_limit": 0
            }],
            "calculation": {
                "status": "completed",
                "algorithm": "maxrects-bssf",
                "volume_utilization_pct": 0.0000002,
                "placements": [
                    {"placement_id": "p1", "item_id": "cube", "pos_x": 0.0, "pos_y": 0.0, "pos_z": 0.0, "rotation": 0, "step_number": 1},
                    {"placement_id": "p2", "item_id": "cube", "pos_x": 1.0, "pos_y": 0.0, "pos_z": 0.0, "rotation": 0, "step_number": 2}
                ]
            },
            "stats": {}
        }))
        .expect("fixture must deserialize")
    }

    pub fn two_cube_plan() -> StuffingPlan {
        StuffingPlan::from_data(&two_cube_plan_data()).expect("fixture must validate")
    }

    /// Container with boxes of different sizes and rotations, plus one orphan placement.
    pub fn mixed_plan() -> StuffingPlan {
        let container =
            ContainerSpec::new("40ft", Vec3::new(12000.0, 2400.0, 2400.0), 26000.0).unwrap();
        let pallet = ItemSpec::new(
            "pallet",
            "Pallet",
            Vec3::new(1200.0, 800.0, 1000.0),
            300.0,
            Rgb::new(0, 128, 255),
        )
        .unwrap();
        let crate_item = ItemSpec::new(
            "crate",
            "Crate",
            Vec3::new(600.0, 400.0, 300.0),
            40.0,
            Rgb::new(255, 128, 0),
        )
        .unwrap();
        let placements = vec![
            Placement {
                id: "a".into(),
                item_id: "pallet".into(),
                position: Vec3::zero(),
                rotation_code: 0,
                step: 1,
            },
            Placement {
                id: "b".into(),
                item_id: "pallet".into(),
                position: Vec3::new(1200.0, 0.0, 0.0),
                rotation_code: 1,
                step: 2,
            },
            Placement {
                id: "ghost".into(),
                item_id: "missing".into(),
                position: Vec3::zero(),
                rotation_code: 0,
                step: 3,
            },
            Placement {
                id: "c".into(),
                item_id: "crate".into(),
                position: Vec3::new(0.0, 0.0, 1000.0),
                rotation_code: 4,
                step: 5,
            },
        ];
        StuffingPlan::new(container, vec![pallet, crate_item], placements)
    }
}

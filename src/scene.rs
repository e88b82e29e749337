//! Render primitives for one loaded plan.
//!
//! A scene holds the container shell (wireframe outline plus a thin support
//! platform just below the floor) and one group per resolvable placement
//! (solid block plus contrasting edge outline). Every item primitive is
//! registered in an explicit owner map so hit testing resolves a primitive
//! to its item without walking any object hierarchy.

use std::collections::HashMap;

use glam::DVec3;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{Rgb, StuffingPlan};
use crate::picking::highlight_for;
use crate::rotation::{self, Orientation};
use crate::transform::{mm_to_render, placement_center, render_size};
use crate::types::{BoundingBox, Vec3};

/// Render-frame axis-aligned box.
pub type RenderBounds = BoundingBox<DVec3>;

/// Outline color of the container shell.
pub const CONTAINER_EDGE_COLOR: Rgb = Rgb::new(0x88, 0x88, 0x88);
/// Color of the support platform under the container floor.
pub const PLATFORM_COLOR: Rgb = Rgb::new(0xff, 0x88, 0x00);
/// Edge outline drawn around every item.
pub const ITEM_EDGE_COLOR: Rgb = Rgb::WHITE;
/// Platform thickness in render units.
pub const PLATFORM_THICKNESS: f64 = 0.02;

/// Identifier of a low-level primitive, unique within one scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
pub struct PrimitiveId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    ContainerOutline,
    Platform,
    ItemSolid,
    ItemEdges,
}

impl PrimitiveKind {
    /// Outlines are drawn as lines, everything else as filled faces.
    pub fn is_wireframe(self) -> bool {
        matches!(self, PrimitiveKind::ContainerOutline | PrimitiveKind::ItemEdges)
    }
}

/// Surface appearance of a primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f64,
    /// Highlight color and intensity, `None` when not emissive.
    pub emissive: Option<(Rgb, f64)>,
}

impl Material {
    pub fn opaque(color: Rgb) -> Self {
        Self {
            color,
            opacity: 1.0,
            emissive: None,
        }
    }

    /// Base color with the emissive highlight blended in.
    pub fn effective_color(&self) -> Rgb {
        match self.emissive {
            Some((glow, intensity)) => self.color.mix(glow, intensity * 0.5),
            None => self.color,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub kind: PrimitiveKind,
    pub bounds: RenderBounds,
    pub material: Material,
    pub visible: bool,
}

/// Metadata attached to every item group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct PickTag {
    pub item_id: String,
    pub placement_id: String,
    pub step: u32,
}

/// The primitives built for one placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemGroup {
    pub tag: PickTag,
    pub label: String,
    pub solid: PrimitiveId,
    pub edges: PrimitiveId,
    pub orientation: Orientation,
    /// Oriented (length, width, height) in millimeters.
    pub oriented_dims: Vec3,
    pub bounds: RenderBounds,
    pub visible: bool,
}

/// Serializable view of one primitive for remote front-ends.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PrimitiveDescription {
    pub id: PrimitiveId,
    pub kind: PrimitiveKind,
    #[schema(value_type = [f64; 3])]
    pub center: [f64; 3],
    #[schema(value_type = [f64; 3])]
    pub size: [f64; 3],
    pub color: String,
    pub visible: bool,
    pub tag: Option<PickTag>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SceneDescription {
    /// Millimeters to render units.
    pub units_per_mm: f64,
    pub max_step: u32,
    pub primitives: Vec<PrimitiveDescription>,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    container_dims: Vec3,
    primitives: Vec<Primitive>,
    groups: Vec<ItemGroup>,
    owners: HashMap<PrimitiveId, usize>,
}

impl Scene {
    /// Builds the container shell and one group per resolvable placement.
    ///
    /// All item groups start visible; callers apply the step cursor
    /// afterwards.
    pub fn build(plan: &StuffingPlan) -> Self {
        let mut scene = Self {
            container_dims: plan.container.dims,
            ..Self::default()
        };

        let container_size = render_size(plan.container.dims);
        scene.push(
            PrimitiveKind::ContainerOutline,
            RenderBounds::from_center_and_size(DVec3::ZERO, container_size),
            Material::opaque(CONTAINER_EDGE_COLOR),
        );
        let platform_center = DVec3::new(
            0.0,
            -container_size.y / 2.0 - PLATFORM_THICKNESS / 2.0,
            0.0,
        );
        scene.push(
            PrimitiveKind::Platform,
            RenderBounds::from_center_and_size(
                platform_center,
                DVec3::new(container_size.x, PLATFORM_THICKNESS, container_size.z),
            ),
            Material::opaque(PLATFORM_COLOR),
        );

        for (placement, item) in plan.resolved_placements() {
            let resolved = rotation::resolve(item.base_dims, placement.rotation_code);
            let center = placement_center(placement.position, resolved.dims, plan.container.dims);
            let bounds = RenderBounds::from_center_and_size(center, render_size(resolved.dims));

            let solid = scene.push(PrimitiveKind::ItemSolid, bounds, Material::opaque(item.color));
            let edges = scene.push(
                PrimitiveKind::ItemEdges,
                bounds,
                Material::opaque(ITEM_EDGE_COLOR),
            );

            let group_index = scene.groups.len();
            scene.owners.insert(solid, group_index);
            scene.owners.insert(edges, group_index);
            scene.groups.push(ItemGroup {
                tag: PickTag {
                    item_id: item.id.clone(),
                    placement_id: placement.id.clone(),
                    step: placement.step,
                },
                label: item.label.clone(),
                solid,
                edges,
                orientation: resolved.orientation,
                oriented_dims: resolved.dims,
                bounds,
                visible: true,
            });
        }

        log::debug!(
            "🧱 Scene built: {} primitives, {} item groups",
            scene.primitives.len(),
            scene.groups.len()
        );
        scene
    }

    fn push(&mut self, kind: PrimitiveKind, bounds: RenderBounds, material: Material) -> PrimitiveId {
        let id = PrimitiveId(self.primitives.len() as u32);
        self.primitives.push(Primitive {
            id,
            kind,
            bounds,
            material,
            visible: true,
        });
        id
    }

    /// Releases all primitives. The scene is empty afterwards.
    pub fn clear(&mut self) {
        self.primitives.clear();
        self.groups.clear();
        self.owners.clear();
        self.container_dims = Vec3::zero();
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn groups(&self) -> &[ItemGroup] {
        &self.groups
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(id.0 as usize)
    }

    /// Container (length, width, height) in millimeters.
    pub fn container_dims(&self) -> Vec3 {
        self.container_dims
    }

    /// Render-frame box of the container shell.
    pub fn container_bounds(&self) -> RenderBounds {
        RenderBounds::from_center_and_size(DVec3::ZERO, render_size(self.container_dims))
    }

    /// Highest step among item groups.
    pub fn max_step(&self) -> u32 {
        self.groups.iter().map(|group| group.tag.step).max().unwrap_or(0)
    }

    /// Resolves a primitive to the item group that owns it.
    pub fn owner_of(&self, id: PrimitiveId) -> Option<&ItemGroup> {
        self.owners.get(&id).map(|&idx| &self.groups[idx])
    }

    /// A group is visible iff its step is at or below the cursor.
    ///
    /// Returns the number of visible groups.
    pub fn apply_visibility(&mut self, current_step: u32) -> usize {
        let mut visible = 0;
        for group in &mut self.groups {
            group.visible = group.tag.step <= current_step;
            visible += usize::from(group.visible);
            for id in [group.solid, group.edges] {
                if let Some(primitive) = self.primitives.get_mut(id.0 as usize) {
                    primitive.visible = group.visible;
                }
            }
        }
        visible
    }

    pub fn visible_group_count(&self) -> usize {
        self.groups.iter().filter(|group| group.visible).count()
    }

    /// Visible solid primitives, the only ones eligible for picking.
    pub fn pickable_primitives(&self) -> impl Iterator<Item = &Primitive> + '_ {
        self.primitives
            .iter()
            .filter(|primitive| primitive.visible && primitive.kind == PrimitiveKind::ItemSolid)
    }

    /// Applies selection highlighting to every item primitive.
    pub fn apply_selection(&mut self, selected: Option<&str>) {
        for group in &self.groups {
            let highlight = highlight_for(&group.tag.item_id, selected);
            for id in [group.solid, group.edges] {
                if let Some(primitive) = self.primitives.get_mut(id.0 as usize) {
                    primitive.material.opacity = highlight.opacity;
                    primitive.material.emissive = match primitive.kind {
                        PrimitiveKind::ItemSolid => highlight.emissive,
                        _ => None,
                    };
                }
            }
        }
    }

    /// Bounding volume of every item loaded at exactly `step`.
    pub fn step_bounds(&self, step: u32) -> Option<RenderBounds> {
        self.groups
            .iter()
            .filter(|group| group.tag.step == step)
            .map(|group| group.bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
    }

    /// Serializable snapshot of the current primitive state.
    pub fn describe(&self) -> SceneDescription {
        let primitives = self
            .primitives
            .iter()
            .map(|primitive| {
                let center = primitive.bounds.center();
                let size = primitive.bounds.size();
                PrimitiveDescription {
                    id: primitive.id,
                    kind: primitive.kind,
                    center: center.to_array(),
                    size: size.to_array(),
                    color: primitive.material.color.to_string(),
                    visible: primitive.visible,
                    tag: self.owner_of(primitive.id).map(|group| group.tag.clone()),
                }
            })
            .collect();
        SceneDescription {
            units_per_mm: mm_to_render(1.0),
            max_step: self.max_step(),
            primitives,
        }
    }
}

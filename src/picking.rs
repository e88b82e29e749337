//! Pointer hit testing and selection highlighting.
//!
//! Only primitives of currently visible step groups take part in hit
//! testing. A hit resolves to its item through the scene's owner map.

use glam::{DVec2, DVec3};
use serde::Serialize;
use utoipa::ToSchema;

use crate::camera::OrthoCamera;
use crate::model::Rgb;
use crate::observer::{ObserverRegistry, Subscription};
use crate::scene::{ItemGroup, Scene};
use crate::transform::from_render_space;
use crate::types::Vec3;

/// Opacity of items that are not selected while a selection is active.
pub const DIMMED_OPACITY: f64 = 0.15;
/// Emissive highlight of the selected item.
pub const SELECTION_EMISSIVE: (Rgb, f64) = (Rgb::new(0xff, 0xff, 0x00), 0.8);
/// Movement in pixels between press and release still counted as a click.
pub const DEFAULT_CLICK_THRESHOLD_PX: f64 = 5.0;

/// Appearance of one item under the current selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Highlight {
    pub opacity: f64,
    pub emissive: Option<(Rgb, f64)>,
}

/// Pure selection rule.
///
/// With nothing selected every item is fully opaque without emissive
/// highlight. Otherwise the selected item is opaque and glowing and every
/// other item is dimmed.
pub fn highlight_for(item_id: &str, selected: Option<&str>) -> Highlight {
    match selected {
        None => Highlight {
            opacity: 1.0,
            emissive: None,
        },
        Some(selected) if selected == item_id => Highlight {
            opacity: 1.0,
            emissive: Some(SELECTION_EMISSIVE),
        },
        Some(_) => Highlight {
            opacity: DIMMED_OPACITY,
            emissive: None,
        },
    }
}

/// Item under the pointer.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct HoverItem {
    pub item_id: String,
    pub placement_id: String,
    pub label: String,
    pub step: u32,
    /// Lower front-left corner in container millimeters.
    #[schema(value_type = [f64; 3])]
    pub position_mm: [f64; 3],
}

impl HoverItem {
    pub fn new(group: &ItemGroup, container_dims: Vec3) -> Self {
        let bounds = group.bounds;
        // physical Y runs along -Z, so the lower front-left corner is at max.z
        let corner = DVec3::new(bounds.min.x, bounds.min.y, bounds.max.z);
        let position = from_render_space(corner, container_dims);
        Self {
            item_id: group.tag.item_id.clone(),
            placement_id: group.tag.placement_id.clone(),
            label: group.label.clone(),
            step: group.tag.step,
            position_mm: [position.x, position.y, position.z],
        }
    }
}

/// Delivered to hover subscribers on every non-drag pointer move.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct HoverEvent {
    /// `None` when the pointer is over empty space.
    pub item: Option<HoverItem>,
    pub screen_x: f64,
    pub screen_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerGesture {
    Click,
    Drag,
}

/// Distinguishes click-to-select from drag-to-orbit.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    threshold_px: f64,
    pressed_at: Option<DVec2>,
    dragging: bool,
}

impl PointerTracker {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px: threshold_px.max(0.0),
            pressed_at: None,
            dragging: false,
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.pressed_at = Some(DVec2::new(x, y));
        self.dragging = false;
    }

    /// Returns `true` while the pointer is dragging.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        if let Some(start) = self.pressed_at {
            if start.distance(DVec2::new(x, y)) > self.threshold_px {
                self.dragging = true;
            }
        }
        self.dragging
    }

    /// Ends a press. `None` when no press was recorded.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Option<PointerGesture> {
        let start = self.pressed_at.take()?;
        let moved = start.distance(DVec2::new(x, y)) > self.threshold_px;
        let gesture = if self.dragging || moved {
            PointerGesture::Drag
        } else {
            PointerGesture::Click
        };
        self.dragging = false;
        Some(gesture)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CLICK_THRESHOLD_PX)
    }
}

/// Converts pixel coordinates to normalized device coordinates.
pub fn screen_to_ndc(x: f64, y: f64, width: u32, height: u32) -> DVec2 {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    DVec2::new(x / w * 2.0 - 1.0, 1.0 - y / h * 2.0)
}

/// Ray-cast picking plus the hover channel.
pub struct PointerPicker {
    tracker: PointerTracker,
    hover: ObserverRegistry<HoverEvent>,
    selected: Option<String>,
}

impl PointerPicker {
    pub fn new(click_threshold_px: f64) -> Self {
        Self {
            tracker: PointerTracker::new(click_threshold_px),
            hover: ObserverRegistry::new(),
            selected: None,
        }
    }

    /// Nearest visible item under the given NDC position.
    pub fn pick<'s>(scene: &'s Scene, camera: &OrthoCamera, ndc: DVec2) -> Option<&'s ItemGroup> {
        let ray = camera.ray_from_ndc(ndc);
        scene
            .pickable_primitives()
            .filter_map(|primitive| {
                ray.intersect_box(&primitive.bounds)
                    .map(|distance| (distance, primitive.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .and_then(|(_, id)| scene.owner_of(id))
    }

    pub fn on_hover(&self, callback: impl Fn(&HoverEvent) + Send + Sync + 'static) -> Subscription {
        self.hover.subscribe(callback)
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.tracker.pointer_down(x, y);
    }

    /// Handles movement; hover is resolved and broadcast unless dragging.
    ///
    /// `viewport` is the surface size in pixels.
    pub fn pointer_move(
        &mut self,
        scene: &Scene,
        camera: &OrthoCamera,
        viewport: (u32, u32),
        x: f64,
        y: f64,
    ) -> Option<HoverEvent> {
        if self.tracker.pointer_move(x, y) {
            return None;
        }
        let ndc = screen_to_ndc(x, y, viewport.0, viewport.1);
        let event = HoverEvent {
            item: Self::pick(scene, camera, ndc)
                .map(|group| HoverItem::new(group, scene.container_dims())),
            screen_x: x,
            screen_y: y,
        };
        self.hover.notify(&event);
        Some(event)
    }

    /// Ends a press. A click selects the item under the pointer or clears
    /// the selection over empty space; drags leave the selection alone.
    ///
    /// Returns `true` when the selection changed.
    pub fn pointer_up(
        &mut self,
        scene: &Scene,
        camera: &OrthoCamera,
        viewport: (u32, u32),
        x: f64,
        y: f64,
    ) -> bool {
        if self.tracker.pointer_up(x, y) != Some(PointerGesture::Click) {
            return false;
        }
        let ndc = screen_to_ndc(x, y, viewport.0, viewport.1);
        let hit = Self::pick(scene, camera, ndc).map(|group| group.tag.item_id.clone());
        self.select(hit)
    }

    /// Sets the selection; returns `true` when it changed.
    pub fn select(&mut self, item_id: Option<String>) -> bool {
        if self.selected == item_id {
            return false;
        }
        self.selected = item_id;
        true
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Drops the selection and every hover subscriber.
    pub fn clear(&mut self) {
        self.selected = None;
        self.hover.clear();
        self.tracker = PointerTracker::new(self.tracker.threshold_px);
    }
}

//! Orthographic camera and its auto-framing controller.
//!
//! The projection is orthographic so the apparent size of an item does not
//! change with depth. The vertical frustum extent is fixed at
//! [`FRUSTUM_SIZE`]; the horizontal extent follows the viewport aspect and
//! framing is done exclusively through `zoom`.

use glam::{DMat4, DVec2, DVec3};
use thiserror::Error;

use crate::renderer::{RenderError, Renderer};
use crate::scene::RenderBounds;
use crate::transform::mm_to_render;
use crate::types::Vec3;

/// Vertical frustum extent in render units at zoom 1.
pub const FRUSTUM_SIZE: f64 = 20.0;
pub const NEAR_PLANE: f64 = 0.1;
pub const FAR_PLANE: f64 = 2000.0;
/// Interactive viewpoint relative to the orbit target.
pub const DEFAULT_OFFSET: DVec3 = DVec3::new(15.0, 8.0, -10.0);
/// Interactive zoom numerator; divided by the container's largest extent.
pub const FIT_ZOOM_FACTOR: f64 = 14.0;
/// Capture zoom numerator.
pub const CAPTURE_ZOOM_FACTOR: f64 = 30.0;

#[derive(Debug, Error, PartialEq)]
pub enum CaptureError {
    #[error("a capture is already in progress")]
    AlreadyCapturing,
    #[error("invalid capture size {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("no surface attached")]
    NoSurface,
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Half-line in render space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    /// Slab test against an axis-aligned box.
    ///
    /// Returns the distance along the ray to the entry point, or `None` when
    /// the box is missed or lies entirely behind the origin.
    pub fn intersect_box(&self, bounds: &RenderBounds) -> Option<f64> {
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
            if direction.abs() < f64::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let (mut t0, mut t1) = ((lo - origin) * inv, (hi - origin) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoCamera {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub near: f64,
    pub far: f64,
    pub position: DVec3,
    pub target: DVec3,
    pub up: DVec3,
    pub zoom: f64,
}

impl OrthoCamera {
    pub fn new(aspect: f64) -> Self {
        let mut camera = Self {
            left: -FRUSTUM_SIZE / 2.0,
            right: FRUSTUM_SIZE / 2.0,
            top: FRUSTUM_SIZE / 2.0,
            bottom: -FRUSTUM_SIZE / 2.0,
            near: NEAR_PLANE,
            far: FAR_PLANE,
            position: DEFAULT_OFFSET,
            target: DVec3::ZERO,
            up: DVec3::Y,
            zoom: 1.0,
        };
        camera.set_aspect(aspect);
        camera
    }

    fn set_aspect(&mut self, aspect: f64) {
        let half_height = FRUSTUM_SIZE / 2.0;
        self.left = -half_height * aspect;
        self.right = half_height * aspect;
        self.top = half_height;
        self.bottom = -half_height;
    }

    /// Horizontal to vertical frustum ratio.
    pub fn aspect(&self) -> f64 {
        (self.right - self.left) / (self.top - self.bottom)
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::orthographic_rh(
            self.left / self.zoom,
            self.right / self.zoom,
            self.bottom / self.zoom,
            self.top / self.zoom,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Render-space point to normalized device coordinates.
    ///
    /// `x` and `y` span [-1, 1]; `z` spans [0, 1] from near to far.
    pub fn project(&self, point: DVec3) -> DVec3 {
        self.view_projection().project_point3(point)
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> DVec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Ray through the given normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: DVec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 1.0));
        let direction = (far - near).normalize_or_zero();
        Ray {
            origin: near,
            direction: if direction == DVec3::ZERO {
                self.forward()
            } else {
                direction
            },
        }
    }
}

/// Full viewport and camera state pushed by a capture.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SavedView {
    camera: OrthoCamera,
    surface: (u32, u32),
}

#[derive(Debug)]
pub struct CameraController {
    camera: OrthoCamera,
    saved: Option<SavedView>,
}

impl CameraController {
    pub fn new(aspect: f64) -> Self {
        Self {
            camera: OrthoCamera::new(aspect),
            saved: None,
        }
    }

    pub fn camera(&self) -> &OrthoCamera {
        &self.camera
    }

    pub fn zoom(&self) -> f64 {
        self.camera.zoom
    }

    pub fn is_capturing(&self) -> bool {
        self.saved.is_some()
    }

    /// Recomputes the frustum for a new viewport shape.
    ///
    /// The vertical extent stays fixed; degenerate aspects are ignored.
    pub fn update_aspect(&mut self, aspect: f64) {
        if !aspect.is_finite() || aspect <= 0.0 {
            log::warn!("⚠️ Ignoring invalid aspect ratio {}", aspect);
            return;
        }
        self.camera.set_aspect(aspect);
    }

    /// Frames the whole container around the render origin.
    ///
    /// Zoom is inversely proportional to the container's largest extent in
    /// render units, floored at one unit so tiny containers are not blown up.
    ///
    /// # Returns
    /// The applied zoom factor
    pub fn fit_to_container(&mut self, container_dims: Vec3) -> f64 {
        let max_dim = mm_to_render(container_dims.max_component());
        self.camera.target = DVec3::ZERO;
        self.camera.position = DEFAULT_OFFSET;
        self.camera.zoom = FIT_ZOOM_FACTOR / max_dim.max(1.0);
        self.camera.zoom
    }

    /// Moves the orbit target to the center of `bounds`, keeping the
    /// viewing direction and zoom.
    pub fn focus_on_box(&mut self, bounds: &RenderBounds) {
        let center = bounds.center();
        let offset = self.camera.position - self.camera.target;
        self.camera.target = center;
        self.camera.position = center + offset;
    }

    /// Pushes a fixed-resolution, isometric, fitted configuration.
    ///
    /// Only one level of capture is supported; a second call before
    /// [`CameraController::restore`] fails without touching any state.
    pub fn setup_for_capture(
        &mut self,
        renderer: &mut dyn Renderer,
        width: u32,
        height: u32,
        container_dims: Vec3,
    ) -> Result<(), CaptureError> {
        if self.saved.is_some() {
            return Err(CaptureError::AlreadyCapturing);
        }
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidSize(width, height));
        }

        let surface = renderer.size();
        renderer.set_size(width, height)?;
        self.saved = Some(SavedView {
            camera: self.camera,
            surface,
        });

        let max_dim = mm_to_render(container_dims.max_component()).max(f64::EPSILON);
        self.camera.set_aspect(width as f64 / height as f64);
        self.camera.target = DVec3::ZERO;
        self.camera.position = DVec3::ONE.normalize() * (max_dim * 2.0).max(10.0);
        self.camera.zoom = CAPTURE_ZOOM_FACTOR / max_dim;
        log::debug!("📷 Capture configured at {}x{}", width, height);
        Ok(())
    }

    /// Restores the view saved by the last capture.
    ///
    /// Returns `false` when no capture was pending.
    pub fn restore(&mut self, renderer: &mut dyn Renderer) -> bool {
        let Some(saved) = self.saved.take() else {
            return false;
        };
        self.camera = saved.camera;
        let (width, height) = saved.surface;
        if let Err(err) = renderer.set_size(width, height) {
            log::warn!("⚠️ Could not restore surface size {}x{}: {}", width, height, err);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::SoftwareRenderer;

    const EPS: f64 = 1e-9;

    #[test]
    fn aspect_update_keeps_vertical_extent() {
        let mut controller = CameraController::new(1.0);
        for aspect in [0.5, 1.0, 16.0 / 9.0, 3.0] {
            controller.update_aspect(aspect);
            let camera = controller.camera();
            assert!((camera.top - camera.bottom - FRUSTUM_SIZE).abs() < EPS);
            assert!((camera.aspect() - aspect).abs() < EPS);
        }
        controller.update_aspect(0.0);
        controller.update_aspect(f64::NAN);
        assert!((controller.camera().aspect() - 3.0).abs() < EPS);
    }

    #[test]
    fn doubling_container_extent_halves_zoom() {
        let mut controller = CameraController::new(16.0 / 9.0);
        let small = controller.fit_to_container(Vec3::new(6000.0, 2400.0, 2400.0));
        let large = controller.fit_to_container(Vec3::new(12000.0, 2400.0, 2400.0));
        assert!((small - 14.0 / 6.0).abs() < EPS);
        assert!((large - small / 2.0).abs() < EPS);
    }

    #[test]
    fn fit_floors_tiny_containers() {
        let mut controller = CameraController::new(1.0);
        let zoom = controller.fit_to_container(Vec3::new(500.0, 300.0, 200.0));
        assert!((zoom - FIT_ZOOM_FACTOR).abs() < EPS);
    }

    #[test]
    fn focus_moves_target_and_keeps_direction() {
        let mut controller = CameraController::new(1.0);
        controller.fit_to_container(Vec3::new(6000.0, 2400.0, 2400.0));
        let forward = controller.camera().forward();
        let zoom = controller.zoom();

        let bounds = RenderBounds::from_center_and_size(DVec3::new(2.0, -0.5, 0.3), DVec3::ONE);
        controller.focus_on_box(&bounds);

        assert!((controller.camera().target - DVec3::new(2.0, -0.5, 0.3)).length() < EPS);
        assert!((controller.camera().forward() - forward).length() < EPS);
        assert!((controller.zoom() - zoom).abs() < EPS);
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let controller = CameraController::new(4.0 / 3.0);
        let ndc = controller.camera().project(controller.camera().target);
        assert!(ndc.x.abs() < EPS && ndc.y.abs() < EPS);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn center_ray_hits_box_at_origin() {
        let controller = CameraController::new(1.0);
        let ray = controller.camera().ray_from_ndc(DVec2::ZERO);
        let bounds = RenderBounds::from_center_and_size(DVec3::ZERO, DVec3::splat(0.5));
        assert!(ray.intersect_box(&bounds).is_some());

        let far_away = RenderBounds::from_center_and_size(DVec3::new(0.0, 50.0, 0.0), DVec3::ONE);
        assert!(ray.intersect_box(&far_away).is_none());
    }

    #[test]
    fn ray_ignores_boxes_behind_origin() {
        let ray = Ray {
            origin: DVec3::ZERO,
            direction: DVec3::X,
        };
        let behind = RenderBounds::from_center_and_size(DVec3::new(-5.0, 0.0, 0.0), DVec3::ONE);
        let ahead = RenderBounds::from_center_and_size(DVec3::new(5.0, 0.0, 0.0), DVec3::ONE);
        assert!(ray.intersect_box(&behind).is_none());
        assert!((ray.intersect_box(&ahead).unwrap() - 4.5).abs() < EPS);
    }

    #[test]
    fn capture_restores_exact_prior_state() {
        let mut renderer = SoftwareRenderer::new(320, 240).unwrap();
        let mut controller = CameraController::new(320.0 / 240.0);
        controller.fit_to_container(Vec3::new(12000.0, 2400.0, 2600.0));
        controller.focus_on_box(&RenderBounds::from_center_and_size(
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::ONE,
        ));
        let before = *controller.camera();

        controller
            .setup_for_capture(&mut renderer, 1920, 1080, Vec3::new(12000.0, 2400.0, 2600.0))
            .unwrap();
        assert_eq!(renderer.size(), (1920, 1080));
        assert!((controller.zoom() - 30.0 / 12.0).abs() < EPS);
        assert!((controller.camera().aspect() - 1920.0 / 1080.0).abs() < EPS);

        assert!(controller.restore(&mut renderer));
        assert_eq!(*controller.camera(), before);
        assert_eq!(renderer.size(), (320, 240));
        assert!(!controller.restore(&mut renderer));
    }

    #[test]
    fn nested_capture_is_rejected() {
        let mut renderer = SoftwareRenderer::new(64, 64).unwrap();
        let mut controller = CameraController::new(1.0);
        let dims = Vec3::new(1000.0, 1000.0, 1000.0);
        controller.setup_for_capture(&mut renderer, 128, 96, dims).unwrap();
        assert_eq!(
            controller.setup_for_capture(&mut renderer, 256, 256, dims),
            Err(CaptureError::AlreadyCapturing)
        );
        assert_eq!(renderer.size(), (128, 96));
        controller.restore(&mut renderer);
        assert_eq!(renderer.size(), (64, 64));
    }
}

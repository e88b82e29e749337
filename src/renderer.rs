//! Render surfaces.
//!
//! [`SoftwareRenderer`] rasterizes a [`Scene`] into an RGBA frame with a
//! depth buffer and flat Lambert shading. It is headless, deterministic and
//! good enough for previews, snapshots and the report screenshot.

use glam::DVec3;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use thiserror::Error;

use crate::camera::OrthoCamera;
use crate::model::Rgb;
use crate::scene::{Primitive, RenderBounds, Scene};

/// Ambient light intensity.
pub const AMBIENT_INTENSITY: f64 = 0.8;
/// Directional light intensity.
pub const DIRECTIONAL_INTENSITY: f64 = 0.5;
/// Directional light position; the light shines towards the origin.
pub const DIRECTIONAL_POSITION: DVec3 = DVec3::new(20.0, 30.0, 20.0);
pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(0x1a, 0x1a, 0x1a);

/// Depth bias applied to outlines so they win against coplanar faces.
const LINE_DEPTH_BIAS: f32 = 1e-4;

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("surface size must be non-zero, got {0}x{1}")]
    ZeroSize(u32, u32),
    #[error("frame buffer unreadable: {0}")]
    Unreadable(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// A drawable surface owned by the visualizer.
pub trait Renderer: Send {
    /// Current surface size in pixels.
    fn size(&self) -> (u32, u32);

    fn set_size(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    fn set_background(&mut self, color: Rgb);

    /// Draws all visible primitives of `scene` as seen by `camera`.
    fn render(&mut self, scene: &Scene, camera: &OrthoCamera) -> Result<(), RenderError>;

    /// Encodes the last rendered frame as PNG.
    fn read_png(&self) -> Result<Vec<u8>, RenderError>;

    /// Releases the surface. Further renders are no-ops.
    fn dispose(&mut self);
}

/// Corner quads and outward normals of a cuboid, indexed like
/// [`RenderBounds::corners`].
const FACES: [([usize; 4], DVec3); 6] = [
    ([0, 3, 7, 4], DVec3::NEG_X),
    ([1, 2, 6, 5], DVec3::X),
    ([0, 1, 5, 4], DVec3::NEG_Y),
    ([3, 2, 6, 7], DVec3::Y),
    ([0, 1, 2, 3], DVec3::NEG_Z),
    ([4, 5, 6, 7], DVec3::Z),
];

/// Corner pairs forming the twelve box edges.
const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

pub struct SoftwareRenderer {
    frame: RgbaImage,
    depth: Vec<f32>,
    background: Rgb,
    disposed: bool,
}

impl SoftwareRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroSize(width, height));
        }
        Ok(Self {
            frame: RgbaImage::new(width, height),
            depth: vec![f32::INFINITY; (width * height) as usize],
            background: DEFAULT_BACKGROUND,
            disposed: false,
        })
    }

    /// Last rendered frame.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn clear(&mut self) {
        let bg = Rgba([self.background.r, self.background.g, self.background.b, 255]);
        for pixel in self.frame.pixels_mut() {
            *pixel = bg;
        }
        self.depth.fill(f32::INFINITY);
    }

    /// Maps NDC to pixel coordinates with depth in [0, 1].
    fn to_screen(&self, ndc: DVec3) -> (f64, f64, f32) {
        let (w, h) = self.frame.dimensions();
        (
            (ndc.x + 1.0) * 0.5 * w as f64,
            (1.0 - ndc.y) * 0.5 * h as f64,
            ndc.z as f32,
        )
    }

    fn plot(&mut self, x: i64, y: i64, depth: f32, color: Rgb, opacity: f64, write_depth: bool) {
        let (w, h) = self.frame.dimensions();
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 || !(0.0..=1.0).contains(&depth) {
            return;
        }
        let idx = (y as u32 * w + x as u32) as usize;
        if depth > self.depth[idx] {
            return;
        }
        let pixel = self.frame.get_pixel_mut(x as u32, y as u32);
        let dst = Rgb::new(pixel[0], pixel[1], pixel[2]);
        let out = dst.mix(color, opacity);
        *pixel = Rgba([out.r, out.g, out.b, 255]);
        if write_depth {
            self.depth[idx] = depth;
        }
    }

    fn fill_triangle(&mut self, tri: [(f64, f64, f32); 3], color: Rgb, opacity: f64) {
        let (w, h) = self.frame.dimensions();
        let [a, b, c] = tri;
        let area = edge(a, b, c.0, c.1);
        if area.abs() < f64::EPSILON {
            return;
        }
        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as i64;
        let max_x = a.0.max(b.0).max(c.0).ceil().min(w as f64 - 1.0) as i64;
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as i64;
        let max_y = a.1.max(b.1).max(c.1).ceil().min(h as f64 - 1.0) as i64;
        let opaque = opacity >= 1.0;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
                let w0 = edge(b, c, px, py) / area;
                let w1 = edge(c, a, px, py) / area;
                let w2 = edge(a, b, px, py) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let depth = (w0 * a.2 as f64 + w1 * b.2 as f64 + w2 * c.2 as f64) as f32;
                self.plot(x, y, depth, color, opacity, opaque);
            }
        }
    }

    fn draw_line(&mut self, from: (f64, f64, f32), to: (f64, f64, f32), color: Rgb, opacity: f64) {
        let (w, h) = self.frame.dimensions();
        let Some((t0, t1)) = clip_segment(from, to, w as f64, h as f64) else {
            return;
        };
        let lerp = |t: f64| {
            (
                from.0 + (to.0 - from.0) * t,
                from.1 + (to.1 - from.1) * t,
                from.2 + (to.2 - from.2) * t as f32,
            )
        };
        let (start, end) = (lerp(t0), lerp(t1));

        let steps = (end.0 - start.0)
            .abs()
            .max((end.1 - start.1).abs())
            .ceil()
            .max(1.0) as i64;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = start.0 + (end.0 - start.0) * t;
            let y = start.1 + (end.1 - start.1) * t;
            let depth = start.2 + (end.2 - start.2) * t as f32 - LINE_DEPTH_BIAS;
            self.plot(x.floor() as i64, y.floor() as i64, depth, color, opacity, false);
        }
    }

    fn draw_solid(&mut self, primitive: &Primitive, camera: &OrthoCamera) {
        let corners = screen_corners(self, &primitive.bounds, camera);
        let light = (DIRECTIONAL_POSITION - primitive.bounds.center()).normalize_or_zero();
        let base = primitive.material.effective_color();
        for (quad, normal) in FACES {
            let lambert = normal.dot(light).max(0.0);
            let intensity = AMBIENT_INTENSITY + DIRECTIONAL_INTENSITY * lambert;
            let color = base.shade(intensity);
            let [i0, i1, i2, i3] = quad;
            self.fill_triangle(
                [corners[i0], corners[i1], corners[i2]],
                color,
                primitive.material.opacity,
            );
            self.fill_triangle(
                [corners[i0], corners[i2], corners[i3]],
                color,
                primitive.material.opacity,
            );
        }
    }

    fn draw_outline(&mut self, primitive: &Primitive, camera: &OrthoCamera) {
        let corners = screen_corners(self, &primitive.bounds, camera);
        for (a, b) in EDGES {
            self.draw_line(
                corners[a],
                corners[b],
                primitive.material.color,
                primitive.material.opacity,
            );
        }
    }
}

/// Liang-Barsky clip of a screen segment against `[0, w] x [0, h]`.
///
/// Returns the parameter range of the visible part, or `None` when the
/// segment misses the viewport or has non-finite endpoints.
fn clip_segment(
    from: (f64, f64, f32),
    to: (f64, f64, f32),
    w: f64,
    h: f64,
) -> Option<(f64, f64)> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, from.0),
        (dx, w - from.0),
        (-dy, from.1),
        (dy, h - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

fn edge(a: (f64, f64, f32), b: (f64, f64, f32), px: f64, py: f64) -> f64 {
    (b.0 - a.0) * (py - a.1) - (b.1 - a.1) * (px - a.0)
}

fn screen_corners(
    renderer: &SoftwareRenderer,
    bounds: &RenderBounds,
    camera: &OrthoCamera,
) -> [(f64, f64, f32); 8] {
    let view_projection = camera.view_projection();
    bounds
        .corners()
        .map(|corner| renderer.to_screen(view_projection.project_point3(corner)))
}

impl Renderer for SoftwareRenderer {
    fn size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn set_size(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroSize(width, height));
        }
        if self.frame.dimensions() != (width, height) {
            self.frame = RgbaImage::new(width, height);
            self.depth = vec![f32::INFINITY; (width * height) as usize];
        }
        Ok(())
    }

    fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }

    fn render(&mut self, scene: &Scene, camera: &OrthoCamera) -> Result<(), RenderError> {
        if self.disposed {
            return Ok(());
        }
        self.clear();

        let (mut opaque, mut translucent): (Vec<&Primitive>, Vec<&Primitive>) = scene
            .primitives()
            .iter()
            .filter(|primitive| primitive.visible && !primitive.kind.is_wireframe())
            .partition(|primitive| primitive.material.opacity >= 1.0);
        opaque.sort_by(|a, b| depth_of(a, camera).total_cmp(&depth_of(b, camera)));
        // back to front
        translucent.sort_by(|a, b| depth_of(b, camera).total_cmp(&depth_of(a, camera)));

        for primitive in opaque.into_iter().chain(translucent) {
            self.draw_solid(primitive, camera);
        }
        for primitive in scene
            .primitives()
            .iter()
            .filter(|primitive| primitive.visible && primitive.kind.is_wireframe())
        {
            self.draw_outline(primitive, camera);
        }
        Ok(())
    }

    fn read_png(&self) -> Result<Vec<u8>, RenderError> {
        if self.disposed {
            return Err(RenderError::Unreadable("surface disposed".into()));
        }
        let (width, height) = self.frame.dimensions();
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(self.frame.as_raw(), width, height, ColorType::Rgba8)
            .map_err(|err| RenderError::Encode(err.to_string()))?;
        Ok(bytes)
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.depth = Vec::new();
            log::debug!("🧹 Software surface released");
        }
    }
}

fn depth_of(primitive: &Primitive, camera: &OrthoCamera) -> f64 {
    camera.project(primitive.bounds.center()).z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraController;
    use crate::model::StuffingPlan;
    use crate::model::fixtures::{two_cube_plan, two_cube_plan_data};
    use crate::scene::Scene;

    fn frame_has_color_other_than(renderer: &SoftwareRenderer, bg: Rgb) -> bool {
        renderer
            .frame()
            .pixels()
            .any(|p| (p[0], p[1], p[2]) != (bg.r, bg.g, bg.b))
    }

    #[test]
    fn zero_sized_surfaces_are_rejected() {
        assert_eq!(
            SoftwareRenderer::new(0, 10).err(),
            Some(RenderError::ZeroSize(0, 10))
        );
        let mut renderer = SoftwareRenderer::new(4, 4).unwrap();
        assert!(renderer.set_size(4, 0).is_err());
        assert_eq!(renderer.size(), (4, 4));
    }

    #[test]
    fn empty_scene_renders_background_only() {
        let mut renderer = SoftwareRenderer::new(32, 24).unwrap();
        renderer.set_background(Rgb::new(10, 20, 30));
        renderer
            .render(&Scene::default(), CameraController::new(32.0 / 24.0).camera())
            .unwrap();
        assert!(!frame_has_color_other_than(&renderer, Rgb::new(10, 20, 30)));
    }

    #[test]
    fn loaded_scene_draws_geometry() {
        let plan = two_cube_plan();
        let scene = Scene::build(&plan);
        let mut controller = CameraController::new(1.0);
        controller.fit_to_container(plan.container.dims);
        let mut renderer = SoftwareRenderer::new(96, 96).unwrap();
        renderer.render(&scene, controller.camera()).unwrap();
        assert!(frame_has_color_other_than(&renderer, DEFAULT_BACKGROUND));
    }

    #[test]
    fn png_output_has_signature() {
        let mut renderer = SoftwareRenderer::new(8, 8).unwrap();
        renderer
            .render(&Scene::default(), CameraController::new(1.0).camera())
            .unwrap();
        let png = renderer.read_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn segments_are_clipped_to_the_viewport() {
        let inside = clip_segment((1.0, 1.0, 0.5), (5.0, 3.0, 0.5), 10.0, 10.0);
        assert_eq!(inside, Some((0.0, 1.0)));

        let (t0, t1) = clip_segment((-10.0, 5.0, 0.5), (20.0, 5.0, 0.5), 10.0, 10.0).unwrap();
        assert!((t0 - 1.0 / 3.0).abs() < 1e-12);
        assert!((t1 - 2.0 / 3.0).abs() < 1e-12);

        assert_eq!(clip_segment((-5.0, -5.0, 0.5), (-1.0, 20.0, 0.5), 10.0, 10.0), None);
        assert_eq!(clip_segment((f64::NAN, 0.0, 0.5), (1.0, 1.0, 0.5), 10.0, 10.0), None);
    }

    #[test]
    fn oversized_items_render_in_bounded_time() {
        let mut data = two_cube_plan_data();
        data.items[0].length_mm = 1e11;
        data.items[0].width_mm = 1e11;
        let plan = StuffingPlan::from_data(&data).unwrap();
        let scene = Scene::build(&plan);
        let mut controller = CameraController::new(64.0 / 48.0);
        controller.fit_to_container(plan.container.dims);
        let mut renderer = SoftwareRenderer::new(64, 48).unwrap();

        let started = std::time::Instant::now();
        renderer.render(&scene, controller.camera()).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert!(frame_has_color_other_than(&renderer, DEFAULT_BACKGROUND));
    }

    #[test]
    fn disposed_surface_cannot_be_read() {
        let mut renderer = SoftwareRenderer::new(8, 8).unwrap();
        renderer.dispose();
        renderer.dispose();
        assert!(renderer.is_disposed());
        assert!(renderer.read_png().is_err());
        let scene = Scene::default();
        assert!(renderer.render(&scene, CameraController::new(1.0).camera()).is_ok());
    }
}

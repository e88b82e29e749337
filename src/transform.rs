//! Conversions between the physical frame and the render frame.
//!
//! Physical frame (plan data):
//! - X along the container length, Y along the width, Z up
//! - millimeters, origin at the front-left-bottom corner
//!
//! Render frame (scene, camera, picking):
//! - X right, Y up, Z towards the viewer
//! - render units (meters), origin at the container center
//!
//! Physical Y maps to negated render Z, physical Z maps to render Y.

use glam::DVec3;

use crate::types::Vec3;

/// Single fixed linear scale from millimeters to render units.
pub const RENDER_UNITS_PER_MM: f64 = 0.001;

/// Converts a length in millimeters to render units.
#[inline]
pub fn mm_to_render(mm: f64) -> f64 {
    mm * RENDER_UNITS_PER_MM
}

/// Converts a length in render units back to millimeters.
#[inline]
pub fn render_to_mm(units: f64) -> f64 {
    units / RENDER_UNITS_PER_MM
}

/// Maps a corner-origin physical point into the centered render frame.
///
/// # Parameters
/// * `pos` - Physical point in millimeters
/// * `container` - Container (length, width, height) in millimeters
pub fn to_render_space(pos: Vec3, container: Vec3) -> DVec3 {
    DVec3::new(
        mm_to_render(pos.x) - mm_to_render(container.x) / 2.0,
        mm_to_render(pos.z) - mm_to_render(container.z) / 2.0,
        -(mm_to_render(pos.y) - mm_to_render(container.y) / 2.0),
    )
}

/// Inverse of [`to_render_space`].
pub fn from_render_space(point: DVec3, container: Vec3) -> Vec3 {
    Vec3::new(
        render_to_mm(point.x + mm_to_render(container.x) / 2.0),
        render_to_mm(-point.z + mm_to_render(container.y) / 2.0),
        render_to_mm(point.y + mm_to_render(container.z) / 2.0),
    )
}

/// Offset from an item's lower corner to its center, in render axes.
///
/// Placements are given by their lower corner while render primitives are
/// centered on their own origin.
pub fn center_offset(item_dims: Vec3) -> DVec3 {
    DVec3::new(
        mm_to_render(item_dims.x) / 2.0,
        mm_to_render(item_dims.z) / 2.0,
        -mm_to_render(item_dims.y) / 2.0,
    )
}

/// Full size of an oriented box along the render axes.
pub fn render_size(item_dims: Vec3) -> DVec3 {
    DVec3::new(
        mm_to_render(item_dims.x),
        mm_to_render(item_dims.z),
        mm_to_render(item_dims.y),
    )
}

/// Render-space center of a placed box.
pub fn placement_center(corner: Vec3, oriented_dims: Vec3, container: Vec3) -> DVec3 {
    to_render_space(corner, container) + center_offset(oriented_dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    fn assert_close(a: DVec3, b: DVec3) {
        assert!(
            (a - b).abs().max_element() < EPSILON_GENERAL,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn origin_corner_maps_to_front_left_bottom() {
        let container = Vec3::new(12000.0, 2400.0, 2600.0);
        let mapped = to_render_space(Vec3::zero(), container);
        assert_close(mapped, DVec3::new(-6.0, -1.3, 1.2));
    }

    #[test]
    fn container_center_maps_to_render_origin() {
        let container = Vec3::new(6000.0, 2400.0, 2400.0);
        let mapped = to_render_space(container.center(), container);
        assert_close(mapped, DVec3::ZERO);
    }

    #[test]
    fn physical_width_runs_away_from_the_viewer() {
        let container = Vec3::new(1000.0, 1000.0, 1000.0);
        let front = to_render_space(Vec3::zero(), container);
        let back = to_render_space(Vec3::new(0.0, 1000.0, 0.0), container);
        assert_close(back - front, DVec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn inverse_reproduces_physical_position() {
        let container = Vec3::new(5898.0, 2352.0, 2393.0);
        let samples = [
            Vec3::zero(),
            Vec3::new(1200.0, 800.0, 0.0),
            Vec3::new(5898.0, 2352.0, 2393.0),
            Vec3::new(17.5, 2000.25, 999.0),
        ];
        for pos in samples {
            let back = from_render_space(to_render_space(pos, container), container);
            let error = back - pos;
            assert!(
                error.x.abs().max(error.y.abs()).max(error.z.abs()) < 1e-6,
                "{:?} != {:?}",
                back,
                pos
            );
        }
    }

    #[test]
    fn placed_box_center_sits_inside_container_bounds() {
        let container = Vec3::new(1000.0, 1000.0, 1000.0);
        let dims = Vec3::new(1000.0, 1000.0, 1000.0);
        assert_close(placement_center(Vec3::zero(), dims, container), DVec3::ZERO);

        let small = Vec3::new(200.0, 100.0, 50.0);
        let center = placement_center(Vec3::zero(), small, container);
        assert_close(center, DVec3::new(-0.4, -0.475, 0.45));
        assert_close(render_size(small), DVec3::new(0.2, 0.05, 0.1));
    }
}

//! Common types and traits for the physical (container) coordinate frame.
//!
//! Physical quantities are expressed in millimeters with the origin at the
//! front-left-bottom corner of the container:
//! - X runs along the container length
//! - Y runs along the container width
//! - Z runs along the container height

use std::ops::{Add, Mul, Sub};

use glam::DVec3;

/// Global numerical tolerance for floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Represents a 3D vector or point in the physical frame (millimeters).
///
/// # Examples
/// ```
/// use stuffing_visualizer::types::Vec3;
///
/// let corner = Vec3::new(100.0, 0.0, 0.0);
/// let dims = Vec3::new(400.0, 300.0, 200.0);
/// let far_corner = corner + dims;
/// assert_eq!(far_corner.x, 500.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector.
    ///
    /// # Parameters
    /// * `x` - X component (length axis)
    /// * `y` - Y component (width axis)
    /// * `z` - Z component (height axis)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin corner).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Creates from tuple format.
    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Largest of the three components.
    #[inline]
    pub fn max_component(&self) -> f64 {
        self.x.max(self.y).max(self.z)
    }

    /// Checks if all components are non-negative and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0)
    }

    /// Returns the components sorted ascending.
    ///
    /// Two vectors are permutations of each other exactly when their sorted
    /// components match.
    pub fn sorted_components(&self) -> [f64; 3] {
        let mut components = [self.x, self.y, self.z];
        components.sort_by(f64::total_cmp);
        components
    }

    /// Returns the midpoint between the origin and this point.
    #[inline]
    pub fn center(&self) -> Self {
        *self * 0.5
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::from_tuple(tuple)
    }
}

impl From<Vec3> for (f64, f64, f64) {
    #[inline]
    fn from(vec: Vec3) -> Self {
        vec.as_tuple()
    }
}

impl From<Vec3> for DVec3 {
    #[inline]
    fn from(vec: Vec3) -> Self {
        DVec3::new(vec.x, vec.y, vec.z)
    }
}

/// Trait for objects with 3D dimensions (length, width, height).
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume in cubic millimeters.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}

/// Axis-aligned bounding box in the render frame (render units).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<V = DVec3> {
    /// Minimum corner
    pub min: V,
    /// Maximum corner
    pub max: V,
}

impl BoundingBox<DVec3> {
    /// Creates a render-frame box from its center and full size.
    #[inline]
    pub fn from_center_and_size(center: DVec3, size: DVec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing both boxes.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the full extent along each axis.
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// The eight corners, used by projection and rasterization.
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(b.x, b.y, b.z),
            DVec3::new(a.x, b.y, b.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(b.max_component(), 6.0);
    }

    #[test]
    fn test_sorted_components_detects_permutations() {
        let a = Vec3::new(300.0, 100.0, 200.0);
        let b = Vec3::new(200.0, 300.0, 100.0);
        assert_eq!(a.sorted_components(), b.sorted_components());
        assert_eq!(a.sorted_components(), [100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_dimension_validity_allows_zero() {
        assert!(Vec3::new(0.0, 10.0, 10.0).is_valid_dimension());
        assert!(!Vec3::new(-1.0, 10.0, 10.0).is_valid_dimension());
        assert!(!Vec3::new(f64::NAN, 10.0, 10.0).is_valid_dimension());
    }

    #[test]
    fn test_render_bounding_box_union() {
        let a = BoundingBox::from_center_and_size(DVec3::ZERO, DVec3::splat(2.0));
        let b = BoundingBox::from_center_and_size(DVec3::new(3.0, 0.0, 0.0), DVec3::splat(2.0));
        let merged = a.union(&b);

        assert_eq!(merged.min, DVec3::new(-1.0, -1.0, -1.0));
        assert_eq!(merged.max, DVec3::new(4.0, 1.0, 1.0));
        assert!((merged.center().x - 1.5).abs() < EPSILON_GENERAL);
        assert_eq!(merged.corners().len(), 8);
    }
}

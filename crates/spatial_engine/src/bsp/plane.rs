//! Separating planes

use crate::foundation::math::{LocalTransform, Vec3};
use crate::scene::Aabb;

/// Plane used to split space into a front and a back half.
///
/// A point is in front when `normal · p + distance >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BspPlane {
    /// Unit normal pointing into the front half-space
    pub normal: Vec3,
    /// Signed distance term
    pub distance: f32,
}

impl BspPlane {
    /// Plane from a normal and distance; a non-zero normal is rescaled to
    /// unit length together with the distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            return Self { normal, distance };
        }
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Plane through `point` facing along `normal`; a zero normal is kept
    /// as is, like [`new`](Self::new) does
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self::new(normal, -normal.dot(&point))
    }

    /// Plane through a transform's position, facing along its rotated +Z axis
    pub fn from_transform(transform: &LocalTransform) -> Self {
        Self::from_point_normal(transform.position, transform.rotation * Vec3::z())
    }

    /// Signed distance from the plane to `point`
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Whether `point` is in front of or on the plane
    pub fn is_point_in_front(&self, point: Vec3) -> bool {
        self.distance_to_point(point) >= 0.0
    }

    /// Point on the plane closest to the origin
    pub fn closest_point_to_origin(&self) -> Vec3 {
        self.normal * -self.distance
    }

    /// True when all 8 corners of `aabb` lie on the side the camera is not on.
    ///
    /// A box touching or crossing the plane is never fully opposite.
    pub fn is_fully_opposite(&self, aabb: &Aabb, camera_in_front: bool) -> bool {
        aabb.corners()
            .iter()
            .all(|corner| self.is_point_in_front(*corner) != camera_in_front)
    }
}

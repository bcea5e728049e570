//! View frustum extraction and culling tests

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::scene::Aabb;

/// Plane defined by normal and distance from origin
///
/// A point is on the positive side when `normal · p + distance >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (unit length once normalized)
    pub normal: Vec3,
    /// Signed distance term
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Plane `(a, b, c, d)` scaled so the normal has unit length.
    ///
    /// A zero normal is kept as-is.
    fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            return Self::new(normal, coefficients.w);
        }
        Self::new(normal / length, coefficients.w / length)
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Corner of `aabb` furthest along the normal
    pub fn positive_vertex(&self, aabb: &Aabb) -> Vec3 {
        Vec3::new(
            if self.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
            if self.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
            if self.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
        )
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes, normals pointing inward, ordered left, right, bottom, top,
    /// near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Index of the left plane
    pub const LEFT: usize = 0;
    /// Index of the right plane
    pub const RIGHT: usize = 1;
    /// Index of the bottom plane
    pub const BOTTOM: usize = 2;
    /// Index of the top plane
    pub const TOP: usize = 3;
    /// Index of the near plane
    pub const NEAR: usize = 4;
    /// Index of the far plane
    pub const FAR: usize = 5;

    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann: each plane is the fourth row of the combined matrix
    /// plus or minus one of the first three rows, normalized by the length
    /// of its normal. Expects `[-1, 1]` clip depth.
    pub fn extract_from_matrix(view_projection: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { view_projection.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self::new([
            Plane::from_coefficients(r3 + r0),
            Plane::from_coefficients(r3 - r0),
            Plane::from_coefficients(r3 + r1),
            Plane::from_coefficients(r3 - r1),
            Plane::from_coefficients(r3 + r2),
            Plane::from_coefficients(r3 - r2),
        ])
    }

    /// Build from separate projection and view matrices
    pub fn from_view_projection(projection: &Mat4, view: &Mat4) -> Self {
        Self::extract_from_matrix(&(projection * view))
    }

    /// Positive-vertex test.
    ///
    /// Rejects only when some plane has the whole box on its negative side;
    /// boxes straddling several planes near a corner may be kept.
    pub fn is_aabb_inside(&self, min: Vec3, max: Vec3) -> bool {
        self.intersects_aabb(&Aabb::new(min, max))
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(plane.positive_vertex(aabb)) >= 0.0)
    }

    /// Check if a point is inside all six planes
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }
}

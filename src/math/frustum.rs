use cgmath::{InnerSpace, Matrix3, Point3, Rad, Vector3};

use super::{Aabb, Plane};

/// View volume bounded by six world-space planes: near, far, top, bottom,
/// left, right. Plane normals point into the volume.
///
/// Derived once per frame from the camera transform; the overlap test is
/// conservative (a box clipping an edge or corner region may report true).
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Build the frustum for an eye at `position` looking along `forward`.
    ///
    /// `up` does not need to be perpendicular to `forward`; the real up
    /// vector is re-derived from the basis. Field-of-view angles are in
    /// radians and measured across the full extent of each axis.
    pub fn new(
        position: Point3<f32>,
        forward: Vector3<f32>,
        up: Vector3<f32>,
        fov_x: f32,
        fov_y: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let right = forward.cross(up).normalize();
        let up = right.cross(forward).normalize();

        let rotate = |axis: Vector3<f32>, angle: f32, v: Vector3<f32>| -> Vector3<f32> {
            Matrix3::from_axis_angle(axis, Rad(angle)) * v
        };

        let planes = [
            // Near and far, perpendicular to the view direction
            Plane::from_point_and_normal(position + forward * near, forward),
            Plane::from_point_and_normal(position + forward * far, -forward),
            // Top and bottom, through the eye, tilted by half the vertical fov
            Plane::from_point_and_normal(position, rotate(right, 0.5 * fov_y, -up)),
            Plane::from_point_and_normal(position, rotate(right, -0.5 * fov_y, up)),
            // Left and right, through the eye, tilted by half the horizontal fov
            Plane::from_point_and_normal(position, rotate(up, 0.5 * fov_x, right)),
            Plane::from_point_and_normal(position, rotate(up, -0.5 * fov_x, -right)),
        ];

        Self { planes }
    }

    /// True when `bounds` intersects or is contained in the volume; false
    /// only when some plane fully separates the box. A zero-size box is
    /// treated as a point.
    pub fn overlaps(&self, bounds: &Aabb) -> bool {
        for plane in &self.planes {
            let support = bounds.support(plane.normal);
            if plane.signed_distance(support) < 0.0 {
                return false;
            }
        }
        true
    }
}

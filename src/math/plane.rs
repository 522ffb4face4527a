use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

/// A plane in constant-normal form: `dot(normal, p) + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub d: f32,
}

impl Plane {
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            normal,
            d: -normal.dot(point.to_vec()),
        }
    }

    /// Positive on the side the normal points to.
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(point.to_vec()) + self.d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_distance_sides() {
        let plane = Plane::from_point_and_normal(
            Point3::new(0.0, 0.0, 5.0),
            Vector3::new(0.0, 0.0, 1.0),
        );
        assert!((plane.signed_distance(Point3::new(0.0, 0.0, 8.0)) - 3.0).abs() < 1e-6);
        assert!((plane.signed_distance(Point3::new(1.0, 2.0, 2.0)) + 3.0).abs() < 1e-6);
        assert_eq!(plane.signed_distance(Point3::new(7.0, -1.0, 5.0)), 0.0);
    }
}

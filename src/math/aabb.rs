use cgmath::{EuclideanSpace, Point3, Vector3};

/// Axis-aligned bounding box in world space.
///
/// A box with `min == max` is valid and behaves as a point in all queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Point3<f32>, half_extents: Vector3<f32>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box enclosing all points, or `None` for an empty slice.
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.grow(p);
        }
        Some(bounds)
    }

    /// Expand the box to contain `point`.
    pub fn grow(&mut self, point: Point3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Union of two boxes.
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    pub fn translated(&self, offset: Vector3<f32>) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Corner of the box farthest along `direction`.
    pub fn support(&self, direction: Vector3<f32>) -> Point3<f32> {
        Point3::new(
            if direction.x >= 0.0 { self.max.x } else { self.min.x },
            if direction.y >= 0.0 { self.max.y } else { self.min.y },
            if direction.z >= 0.0 { self.max.z } else { self.min.z },
        )
    }

    /// Squared distance from `point` to the box, zero when inside.
    pub fn sq_distance_to(&self, point: Point3<f32>) -> f32 {
        let clamped = Point3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        );
        let delta = point - clamped;
        delta.x * delta.x + delta.y * delta.y + delta.z * delta.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_contains_both() {
        let a = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(0.0, 0.0, 5.0), Point3::new(2.0, 3.0, 9.0));
        let merged = a.merge(&b);
        assert_eq!(merged.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(merged.max, Point3::new(2.0, 3.0, 9.0));
    }

    #[test]
    fn support_picks_farthest_corner() {
        let b = Aabb::new(Point3::new(-1.0, -2.0, -3.0), Point3::new(1.0, 2.0, 3.0));
        let s = b.support(Vector3::new(1.0, -1.0, 1.0));
        assert_eq!(s, Point3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn sq_distance_zero_inside() {
        let b = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        assert_eq!(b.sq_distance_to(Point3::new(1.0, 1.0, 1.0)), 0.0);
        assert!((b.sq_distance_to(Point3::new(5.0, 1.0, 1.0)) - 9.0).abs() < 1e-6);
    }

    #[test]
    fn from_points_encloses_all() {
        let bounds = Aabb::from_points([
            Point3::new(1.0, 0.0, -2.0),
            Point3::new(-3.0, 4.0, 0.5),
            Point3::new(0.0, -1.0, 7.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, Point3::new(-3.0, -1.0, -2.0));
        assert_eq!(bounds.max, Point3::new(1.0, 4.0, 7.0));
        assert!(Aabb::from_points([]).is_none());
    }
}

use cgmath::Point3;

use crate::math::Aabb;

use super::GeometryHandle;

/// One level of detail: a geometry batch valid out to `distance` world
/// units (scaled by the per-draw lod factor).
#[derive(Debug, Clone, Copy)]
pub struct Lod {
    pub handle: GeometryHandle,
    pub distance: f32,
}

/// A logical object: an ordered set of detail levels, finest first.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub lods: Vec<Lod>,
}

impl Geometry {
    pub fn new(lods: Vec<Lod>) -> Self {
        Self { lods }
    }

    /// Geometry with a single level that never drops out by distance.
    pub fn single(handle: GeometryHandle) -> Self {
        Self {
            lods: vec![Lod {
                handle,
                distance: f32::INFINITY,
            }],
        }
    }

    /// Pick the level for this frame, or `None` when the object lies past
    /// every level's range (or no levels are registered).
    ///
    /// Selection is by squared distance from the camera to the world-space
    /// bounds; `lod_scale_sq` scales each level's squared range. The first
    /// (finest) level that covers the distance wins, so the result is
    /// deterministic for given inputs.
    pub fn select(
        &self,
        camera_position: Point3<f32>,
        world_bounds: &Aabb,
        lod_scale_sq: f32,
    ) -> Option<GeometryHandle> {
        let dist_sq = world_bounds.sq_distance_to(camera_position);
        for lod in &self.lods {
            if dist_sq <= lod.distance * lod.distance * lod_scale_sq {
                return Some(lod.handle);
            }
        }
        None
    }
}

use cgmath::Point3;

use crate::math::Aabb;

use super::indexify::indexify;
use super::vertex::{DebugVertex, Triangle};

/// Stable identity of one interned geometry batch.
///
/// Handles are dense integers in insertion order and stay valid for the
/// process lifetime; the cache never evicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(u32);

impl GeometryHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Location of one batch inside the shared vertex/index store.
///
/// Immutable once created; offsets are final at intern time because the
/// store is append-only.
#[derive(Debug, Clone, Copy)]
pub struct GeometryRecord {
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub index_offset: u32,
    pub index_count: u32,
    /// Bounds of the batch in its local space.
    pub bounds: Aabb,
}

/// Append-only store of interned geometry batches.
///
/// Every intern call mints a new handle, including repeated calls with
/// identical data; deduplication across calls is intentionally not
/// attempted. Entries live until the cache is dropped (known scalability
/// limit, kept from the original behavior).
#[derive(Debug, Default)]
pub struct GeometryCache {
    records: Vec<GeometryRecord>,
    vertices: Vec<DebugVertex>,
    indices: Vec<u32>,
    dirty: bool,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an already-indexed batch.
    ///
    /// Returns `None` (a defined no-op, not an error) when either slice is
    /// empty. Otherwise appends the data, computes local bounds from the
    /// vertex positions and returns the next dense handle.
    pub fn intern(&mut self, vertices: &[DebugVertex], indices: &[u32]) -> Option<GeometryHandle> {
        if vertices.is_empty() || indices.is_empty() {
            return None;
        }

        let bounds = Aabb::from_points(vertices.iter().map(|v| Point3::from(v.position)))?;

        let handle = GeometryHandle(self.records.len() as u32);
        self.records.push(GeometryRecord {
            vertex_offset: self.vertices.len() as u32,
            vertex_count: vertices.len() as u32,
            index_offset: self.indices.len() as u32,
            index_count: indices.len() as u32,
            bounds,
        });
        self.vertices.extend_from_slice(vertices);
        self.indices.extend_from_slice(indices);
        self.dirty = true;

        log::debug!(
            "[GeometryCache] interned batch {} ({} vertices, {} indices)",
            handle.0,
            vertices.len(),
            indices.len()
        );

        Some(handle)
    }

    /// Intern a triangle soup, first collapsing bit-exact duplicate
    /// vertices into an indexed form.
    pub fn intern_triangles(&mut self, triangles: &[Triangle]) -> Option<GeometryHandle> {
        let (vertices, indices) = indexify(triangles);
        self.intern(&vertices, &indices)
    }

    /// Record for a handle minted by this cache.
    pub fn record(&self, handle: GeometryHandle) -> &GeometryRecord {
        &self.records[handle.index()]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Byte image of the concatenated vertex store.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Byte image of the concatenated index store.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// True when batches were interned since the last call; clears the
    /// flag. The renderer uses this as its upload gate.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

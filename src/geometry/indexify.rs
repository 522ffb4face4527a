use rustc_hash::FxHashMap;

use super::vertex::{DebugVertex, Triangle, DEBUG_VERTEX_SIZE};

/// Collapse a triangle soup into an indexed mesh.
///
/// Vertices are merged only when bit-exact equal (position, normal, uv and
/// color all identical); no epsilon welding. The reduced vertex set keeps
/// first-seen order and the index buffer references it triangle by
/// triangle in submission order.
pub fn indexify(triangles: &[Triangle]) -> (Vec<DebugVertex>, Vec<u32>) {
    let mut remap: FxHashMap<[u8; DEBUG_VERTEX_SIZE], u32> = FxHashMap::default();
    let mut vertices: Vec<DebugVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::with_capacity(triangles.len() * 3);

    for triangle in triangles {
        for vertex in &triangle.vertices {
            let key = bytemuck::cast::<DebugVertex, [u8; DEBUG_VERTEX_SIZE]>(*vertex);
            let index = *remap.entry(key).or_insert_with(|| {
                vertices.push(*vertex);
                (vertices.len() - 1) as u32
            });
            indices.push(index);
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Color;

    fn vertex(position: [f32; 3]) -> DebugVertex {
        DebugVertex::new(position, [0.0, 1.0, 0.0], [0.0, 0.0], Color::WHITE)
    }

    #[test]
    fn merges_shared_edge_vertices() {
        // Two triangles of a quad sharing the (1,0,0)-(0,1,0) edge.
        let a = vertex([0.0, 0.0, 0.0]);
        let b = vertex([1.0, 0.0, 0.0]);
        let c = vertex([0.0, 1.0, 0.0]);
        let d = vertex([1.0, 1.0, 0.0]);
        let soup = [Triangle::new(a, b, c), Triangle::new(b, d, c)];

        let (vertices, indices) = indexify(&soup);
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices, vec![0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn bit_different_vertices_stay_separate() {
        let mut shifted = vertex([0.0, 0.0, 0.0]);
        shifted.normal = [0.0, 1.0, 1e-7];
        let soup = [Triangle::new(
            vertex([0.0, 0.0, 0.0]),
            shifted,
            vertex([1.0, 0.0, 0.0]),
        )];

        let (vertices, indices) = indexify(&soup);
        assert_eq!(vertices.len(), 3);
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn empty_soup_yields_empty_mesh() {
        let (vertices, indices) = indexify(&[]);
        assert!(vertices.is_empty());
        assert!(indices.is_empty());
    }
}

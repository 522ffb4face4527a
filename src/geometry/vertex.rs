use bytemuck::{Pod, Zeroable};

use crate::math::Color;

/// Vertex format of the batched geometry store.
///
/// Layout matches the shader-side vertex pull: position, normal, uv, and a
/// packed RGBA color, 36 bytes total.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DebugVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: u32,
}

/// Size of one [`DebugVertex`] in bytes.
pub const DEBUG_VERTEX_SIZE: usize = std::mem::size_of::<DebugVertex>();

impl DebugVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], color: Color) -> Self {
        Self {
            position,
            normal,
            uv,
            color: color.to_u32(),
        }
    }
}

/// One triangle of a soup submitted for interning.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Triangle {
    pub vertices: [DebugVertex; 3],
}

impl Triangle {
    pub fn new(v1: DebugVertex, v2: DebugVertex, v3: DebugVertex) -> Self {
        Self {
            vertices: [v1, v2, v3],
        }
    }
}

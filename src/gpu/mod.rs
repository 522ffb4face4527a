//! GPU collaborator surface: the capability trait the renderer draws
//! through, plus the wgpu implementation and a headless recording
//! implementation for capture and tests.

pub mod backend;
pub mod recording;
pub mod ubo;
pub mod wgpu_backend;

pub use backend::{BufferId, BufferKind, GpuBackend, Primitive, RenderTarget};
pub use recording::{GpuCall, RecordingBackend};
pub use ubo::{CameraUniform, LightUniform};
pub use wgpu_backend::WgpuBackend;

/// Binding slots shared between the renderer and the shaders.
pub mod bindings {
    /// Storage slot of the per-draw object array.
    pub const INSTANCE_BUFFER: u32 = 4;
    /// Texture slot of the shadow map.
    pub const SHADOW_MAP: u32 = 3;
    /// Uniform slot of the view/projection block.
    pub const VIEW_PROJECTION: u32 = 0;
    /// Uniform slot of the lighting block.
    pub const LIGHTING: u32 = 1;
}

use crate::error::RenderResult;

/// Opaque identifier of a backend-owned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u64);

impl BufferId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// How a buffer will be consumed; drives backend usage flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
    Storage,
    Indirect,
}

/// Framebuffer a pass renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// The shadow-map depth attachment.
    ShadowDepth,
    /// The swapchain/screen color target.
    Screen,
}

/// Topology of the dedicated non-indexed draw path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Lines,
    Triangles,
}

/// Capability surface the renderer requires from a graphics device.
///
/// The renderer calls these opaquely and never sees device objects; wire
/// formats, pipelines and shader plumbing are the implementation's
/// business. All calls happen on the render thread, between one
/// `begin_frame` and the end of the frame's submission.
pub trait GpuBackend {
    /// Allocate a buffer of `size` bytes. The label is for diagnostics.
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size: u64,
        label: &'static str,
    ) -> RenderResult<BufferId>;

    /// Release a buffer. Destroying an unknown id is a no-op.
    fn destroy_buffer(&mut self, id: BufferId);

    /// Write `data` into the buffer at `offset`. Callers must stay within
    /// the allocated capacity; a violating write is an error, never a
    /// partial write.
    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> RenderResult<()>;

    /// Bind a storage buffer to a shader-visible slot.
    fn bind_storage_buffer(&mut self, id: BufferId, slot: u32) -> RenderResult<()>;

    /// Select the framebuffer subsequent draws render into.
    fn bind_render_target(&mut self, target: RenderTarget);

    /// Viewport for the currently bound target.
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear the given target (color and/or depth as appropriate).
    fn clear(&mut self, target: RenderTarget);

    /// Non-indexed draw of `vertex_count` vertices, used by the line and
    /// unindexed-triangle paths.
    fn draw(
        &mut self,
        primitive: Primitive,
        vertices: BufferId,
        vertex_count: u32,
    ) -> RenderResult<()>;

    /// Issue `draw_count` indexed draws from a command buffer in one call.
    fn multi_draw_indexed_indirect(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        commands: BufferId,
        draw_count: u32,
    ) -> RenderResult<()>;
}

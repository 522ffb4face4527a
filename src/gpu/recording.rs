use rustc_hash::FxHashMap;

use crate::error::{RenderError, RenderResult};

use super::backend::{BufferId, BufferKind, GpuBackend, Primitive, RenderTarget};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuCall {
    CreateBuffer {
        id: BufferId,
        kind: BufferKind,
        size: u64,
        label: &'static str,
    },
    DestroyBuffer {
        id: BufferId,
    },
    WriteBuffer {
        id: BufferId,
        offset: u64,
        len: u64,
    },
    BindStorageBuffer {
        id: BufferId,
        slot: u32,
    },
    BindRenderTarget {
        target: RenderTarget,
    },
    SetViewport {
        width: u32,
        height: u32,
    },
    Clear {
        target: RenderTarget,
    },
    Draw {
        primitive: Primitive,
        vertices: BufferId,
        vertex_count: u32,
    },
    MultiDrawIndexedIndirect {
        vertices: BufferId,
        indices: BufferId,
        commands: BufferId,
        draw_count: u32,
    },
}

#[derive(Debug)]
struct BufferState {
    kind: BufferKind,
    label: &'static str,
    data: Vec<u8>,
}

/// Headless [`GpuBackend`] that models buffer storage in CPU memory and
/// records the full call stream.
///
/// Validates the invariants real devices punish silently: writes stay
/// within capacity and draws only reference live buffers. Used by the
/// test suite and available for capturing a frame for later inspection.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    buffers: FxHashMap<BufferId, BufferState>,
    next_id: u64,
    calls: Vec<GpuCall>,
    /// When set, every allocation fails; exercises out-of-memory paths.
    pub fail_allocations: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// Drain the recorded calls.
    pub fn take_calls(&mut self) -> Vec<GpuCall> {
        std::mem::take(&mut self.calls)
    }

    /// Capacity of a live buffer.
    pub fn buffer_capacity(&self, id: BufferId) -> Option<u64> {
        self.buffers.get(&id).map(|b| b.data.len() as u64)
    }

    /// Current contents of a live buffer.
    pub fn buffer_contents(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|b| b.data.as_slice())
    }

    fn live(&self, id: BufferId) -> RenderResult<&BufferState> {
        self.buffers
            .get(&id)
            .ok_or(RenderError::UnknownBuffer(id.raw()))
    }
}

impl GpuBackend for RecordingBackend {
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size: u64,
        label: &'static str,
    ) -> RenderResult<BufferId> {
        if self.fail_allocations {
            return Err(RenderError::BufferAllocation {
                label,
                size,
                reason: "allocation failure injected".into(),
            });
        }

        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(
            id,
            BufferState {
                kind,
                label,
                data: vec![0; size as usize],
            },
        );
        self.calls.push(GpuCall::CreateBuffer {
            id,
            kind,
            size,
            label,
        });
        Ok(id)
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
        self.calls.push(GpuCall::DestroyBuffer { id });
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> RenderResult<()> {
        let state = self
            .buffers
            .get_mut(&id)
            .ok_or(RenderError::UnknownBuffer(id.raw()))?;
        let capacity = state.data.len() as u64;
        let len = data.len() as u64;
        if offset + len > capacity {
            return Err(RenderError::WriteOutOfBounds {
                label: state.label,
                offset,
                len,
                capacity,
            });
        }
        state.data[offset as usize..(offset + len) as usize].copy_from_slice(data);
        self.calls.push(GpuCall::WriteBuffer { id, offset, len });
        Ok(())
    }

    fn bind_storage_buffer(&mut self, id: BufferId, slot: u32) -> RenderResult<()> {
        self.live(id)?;
        self.calls.push(GpuCall::BindStorageBuffer { id, slot });
        Ok(())
    }

    fn bind_render_target(&mut self, target: RenderTarget) {
        self.calls.push(GpuCall::BindRenderTarget { target });
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(GpuCall::SetViewport { width, height });
    }

    fn clear(&mut self, target: RenderTarget) {
        self.calls.push(GpuCall::Clear { target });
    }

    fn draw(
        &mut self,
        primitive: Primitive,
        vertices: BufferId,
        vertex_count: u32,
    ) -> RenderResult<()> {
        self.live(vertices)?;
        self.calls.push(GpuCall::Draw {
            primitive,
            vertices,
            vertex_count,
        });
        Ok(())
    }

    fn multi_draw_indexed_indirect(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        commands: BufferId,
        draw_count: u32,
    ) -> RenderResult<()> {
        self.live(vertices)?;
        self.live(indices)?;
        let command_buffer = self.live(commands)?;
        if command_buffer.kind != BufferKind::Indirect {
            return Err(RenderError::Backend(format!(
                "buffer '{}' is not an indirect command buffer",
                command_buffer.label
            )));
        }
        self.calls.push(GpuCall::MultiDrawIndexedIndirect {
            vertices,
            indices,
            commands,
            draw_count,
        });
        Ok(())
    }
}

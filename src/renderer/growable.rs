use crate::error::RenderResult;
use crate::gpu::{BufferId, BufferKind, GpuBackend};

/// Multiplier applied to the required size when a buffer must grow.
pub const BUFFER_GROWTH_FACTOR: f64 = 1.5;

/// GPU buffer that grows by a fixed factor and never shrinks.
///
/// At most one reallocation happens per upload: the replacement store is
/// created before the old one is destroyed, so a failed allocation leaves
/// the previous store intact and readers never observe a torn buffer.
#[derive(Debug)]
pub struct GrowableBuffer {
    id: BufferId,
    kind: BufferKind,
    capacity: u64,
    label: &'static str,
}

impl GrowableBuffer {
    pub fn new(
        backend: &mut impl GpuBackend,
        kind: BufferKind,
        initial_capacity: u64,
        label: &'static str,
    ) -> RenderResult<Self> {
        let id = backend.create_buffer(kind, initial_capacity, label)?;
        Ok(Self {
            id,
            kind,
            capacity: initial_capacity,
            label,
        })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Write `data` from offset zero, growing to `len * 1.5` (truncating)
    /// first when the current capacity is insufficient.
    ///
    /// Allocation failure is fatal for the frame and propagates.
    pub fn upload(&mut self, backend: &mut impl GpuBackend, data: &[u8]) -> RenderResult<()> {
        let required = data.len() as u64;
        if required > self.capacity {
            let new_capacity = (required as f64 * BUFFER_GROWTH_FACTOR) as u64;
            let new_id = backend.create_buffer(self.kind, new_capacity, self.label)?;
            backend.destroy_buffer(self.id);
            log::debug!(
                "[GrowableBuffer] '{}' grew {} -> {} bytes",
                self.label,
                self.capacity,
                new_capacity
            );
            self.id = new_id;
            self.capacity = new_capacity;
        }

        if !data.is_empty() {
            backend.write_buffer(self.id, 0, data)?;
        }
        Ok(())
    }
}

//! Renderer error taxonomy.
//!
//! Benign conditions (empty geometry, empty batches, behind-camera points,
//! no acceptable LOD) are handled as no-ops or `Option`s and never surface
//! here. `RenderError` is reserved for conditions that are fatal for the
//! frame and must propagate to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The backing allocator could not satisfy a grown buffer request.
    /// Out of memory is not recoverable at this layer.
    #[error("allocation of {size} bytes for '{label}' failed: {reason}")]
    BufferAllocation {
        label: &'static str,
        size: u64,
        reason: String,
    },

    /// A buffer id that this backend never issued (or already destroyed).
    #[error("unknown buffer id {0}")]
    UnknownBuffer(u64),

    /// A write that would run past the buffer's allocated capacity.
    #[error("write of {len} bytes at offset {offset} exceeds capacity {capacity} of '{label}'")]
    WriteOutOfBounds {
        label: &'static str,
        offset: u64,
        len: u64,
        capacity: u64,
    },

    /// Backend-specific failure.
    #[error("gpu backend: {0}")]
    Backend(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

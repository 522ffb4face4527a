//! The batched renderer: per-frame draw submission, frame batches,
//! growable GPU buffers and indirect-command generation.

pub mod commands;
pub mod debug_renderer;
pub mod frame_batch;
pub mod growable;
pub mod instance;
pub mod text;

pub use commands::{build_commands, IndirectDrawIndexedCommand, INDIRECT_COMMAND_SIZE};
pub use debug_renderer::{CastShadow, DebugRenderer, FrameStats, LineVertex, LINE_VERTEX_SIZE};
pub use frame_batch::{FrameBatch, Pass};
pub use growable::{GrowableBuffer, BUFFER_GROWTH_FACTOR};
pub use instance::{InstanceRecord, INSTANCE_RECORD_SIZE};
pub use text::TextRecord;

use crate::geometry::GeometryHandle;

use super::instance::InstanceRecord;

/// The two draw passes fed from one frame's submissions. Closed set;
/// adding a pass is a code change, not data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Shadow-map depth pass.
    Depth,
    /// Main color pass.
    Color,
}

impl Pass {
    pub const ALL: [Pass; 2] = [Pass::Depth, Pass::Color];

    pub fn index(self) -> usize {
        match self {
            Pass::Depth => 0,
            Pass::Color => 1,
        }
    }
}

/// Per-frame accumulator of (geometry handle, instance bytes) pairs for
/// one pass.
///
/// `pending` is appended in submission order during the frame and cleared
/// after the upload; `issued` is the handle sequence covered by the live
/// indirect-command buffer and survives the clear, so a frame that submits
/// the same sequence again skips the command rebuild.
#[derive(Debug, Default)]
pub struct FrameBatch {
    pending: Vec<GeometryHandle>,
    instance_bytes: Vec<u8>,
    issued: Vec<GeometryHandle>,
}

impl FrameBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: GeometryHandle, instance: &InstanceRecord) {
        self.pending.push(handle);
        self.instance_bytes.extend_from_slice(instance.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[GeometryHandle] {
        &self.pending
    }

    /// Packed instance records, one stride per pending entry.
    pub fn instance_bytes(&self) -> &[u8] {
        &self.instance_bytes
    }

    /// True when the pending sequence differs from the one the command
    /// buffer was last built for.
    pub fn commands_dirty(&self) -> bool {
        self.pending != self.issued
    }

    /// Record the pending sequence as covered by the command buffer.
    pub fn mark_issued(&mut self) {
        self.issued.clear();
        self.issued.extend_from_slice(&self.pending);
    }

    /// Drop this frame's entries. The issued sequence is kept.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
        self.instance_bytes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryCache;
    use crate::geometry::{DebugVertex, Triangle};
    use crate::math::Color;
    use crate::renderer::instance::INSTANCE_RECORD_SIZE;
    use cgmath::Matrix4;

    fn a_handle() -> GeometryHandle {
        let mut cache = GeometryCache::new();
        let v = |p: [f32; 3]| DebugVertex::new(p, [0.0, 1.0, 0.0], [0.0, 0.0], Color::WHITE);
        cache
            .intern_triangles(&[Triangle::new(
                v([0.0, 0.0, 0.0]),
                v([1.0, 0.0, 0.0]),
                v([0.0, 1.0, 0.0]),
            )])
            .unwrap()
    }

    #[test]
    fn push_packs_one_stride_per_entry() {
        let mut batch = FrameBatch::new();
        let handle = a_handle();
        let instance = InstanceRecord::new(Matrix4::from_scale(1.0), Color::WHITE);

        batch.push(handle, &instance);
        batch.push(handle, &instance);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.instance_bytes().len(), 2 * INSTANCE_RECORD_SIZE);
    }

    #[test]
    fn identical_sequences_skip_the_rebuild() {
        let mut batch = FrameBatch::new();
        let handle = a_handle();
        let instance = InstanceRecord::new(Matrix4::from_scale(1.0), Color::WHITE);

        // Frame 1: new sequence, commands must be rebuilt.
        batch.push(handle, &instance);
        assert!(batch.commands_dirty());
        batch.mark_issued();
        batch.clear_pending();

        // Frame 2: same sequence, reuse.
        batch.push(handle, &instance);
        assert!(!batch.commands_dirty());
        batch.mark_issued();
        batch.clear_pending();

        // Frame 3: longer sequence, rebuild.
        batch.push(handle, &instance);
        batch.push(handle, &instance);
        assert!(batch.commands_dirty());
    }

    #[test]
    fn clear_keeps_issued_sequence() {
        let mut batch = FrameBatch::new();
        let handle = a_handle();
        let instance = InstanceRecord::new(Matrix4::from_scale(1.0), Color::WHITE);

        batch.push(handle, &instance);
        batch.mark_issued();
        batch.clear_pending();
        assert!(batch.is_empty());
        assert!(batch.instance_bytes().is_empty());
        // An empty pending list differs from the issued one.
        assert!(batch.commands_dirty());
    }
}

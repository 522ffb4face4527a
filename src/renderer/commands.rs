use bytemuck::{Pod, Zeroable};

use crate::geometry::{GeometryCache, GeometryHandle};

/// Indexed indirect draw command, 20 bytes, matching wgpu's
/// `DrawIndexedIndirectArgs` layout.
///
/// Derived from a geometry record, never authored by callers: one draw of
/// one instance at the record's offsets.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct IndirectDrawIndexedCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

/// Size of one command in the indirect buffer.
pub const INDIRECT_COMMAND_SIZE: usize = std::mem::size_of::<IndirectDrawIndexedCommand>();

/// One command per handle, in submission order.
pub fn build_commands(
    cache: &GeometryCache,
    handles: &[GeometryHandle],
) -> Vec<IndirectDrawIndexedCommand> {
    let mut commands = Vec::with_capacity(handles.len());
    for &handle in handles {
        let record = cache.record(handle);
        commands.push(IndirectDrawIndexedCommand {
            index_count: record.index_count,
            instance_count: 1,
            first_index: record.index_offset,
            base_vertex: record.vertex_offset as i32,
            first_instance: 0,
        });
    }
    commands
}

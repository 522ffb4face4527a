//! Frame-coherent debug-geometry batching and indirect-draw rendering.
//!
//! A simulation submits an unordered stream of lines, triangles, text and
//! geometry instances once per frame; the renderer deduplicates geometry
//! across frames through an append-only cache, culls against the camera
//! frustum (extended along the light for shadow casters), packs instance
//! data into growable GPU buffers and drains everything into two indirect
//! multi-draw passes.
//!
//! The GPU is reached only through the [`gpu::GpuBackend`] capability
//! trait; [`gpu::WgpuBackend`] implements it over wgpu and
//! [`gpu::RecordingBackend`] runs headless for capture and tests.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod hooks;
pub mod math;
pub mod renderer;

use std::sync::Once;

pub use camera::{Camera, OrthographicCamera};
pub use error::{RenderError, RenderResult};
pub use geometry::{DebugVertex, Geometry, GeometryCache, GeometryHandle, Lod, Triangle};
pub use math::{Aabb, Color, Frustum};
pub use renderer::{CastShadow, DebugRenderer, FrameStats, Pass, TextRecord};

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Shadow map is square; this is its edge in texels.
    pub shadow_map_size: u32,
    pub clear_color: [f64; 4],
    pub light_color: [f32; 4],
    /// Initial capacity of the line/triangle vertex buffers, in vertices.
    pub initial_line_vertices: usize,
    /// Initial capacity of the shared geometry store, in vertices.
    pub initial_geometry_vertices: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            shadow_map_size: 2048,
            clear_color: [0.2, 0.2, 0.3, 1.0],
            light_color: [0.4, 0.4, 0.4, 1.0],
            initial_line_vertices: 1024,
            initial_geometry_vertices: 4096,
        }
    }
}

static LOGGING_INIT: Once = Once::new();

/// Initialize the global logger once; later calls are ignored.
///
/// Honors `RUST_LOG`, defaults to `info`. Intended for hosts that do not
/// configure logging themselves.
pub fn init_logging() {
    LOGGING_INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }
        builder.init();
        log::debug!("logging initialized");
    });
}

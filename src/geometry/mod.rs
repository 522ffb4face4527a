//! Geometry interning: vertex formats, triangle-soup indexing, the
//! append-only geometry cache and level-of-detail selection.

pub mod cache;
pub mod indexify;
pub mod lod;
pub mod vertex;

pub use cache::{GeometryCache, GeometryHandle, GeometryRecord};
pub use lod::{Geometry, Lod};
pub use vertex::{DebugVertex, Triangle};

//! Camera model: a perspective orbit camera for the main view and an
//! orthographic camera for the shadow map.

pub mod orthographic;
pub mod perspective;

pub use orthographic::OrthographicCamera;
pub use perspective::{Camera, MOUSE_SENSITIVITY};

use cgmath::{Point3, Vector2};

use crate::math::Color;

/// Text queued for the text-rendering collaborator.
///
/// The renderer only produces these; glyph rendering is out of scope. The
/// screen position and clip-space w come from projecting the world
/// position at submission time, so the consumer can scale the font with
/// distance without touching the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRecord {
    pub text: String,
    pub world_position: Point3<f32>,
    pub screen_position: Vector2<f32>,
    /// Clip-space w of the projected position (perspective depth).
    pub clip_w: f32,
    /// Requested glyph height in world units.
    pub height: f32,
    pub color: Color,
}

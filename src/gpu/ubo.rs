use bytemuck::{Pod, Zeroable};

use crate::camera::{Camera, OrthographicCamera};

/// View/projection uniform block, std140, 208 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// View with the translation stripped, for skybox-style passes.
    pub view_without_translation: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view: camera.view().into(),
            projection: camera.projection().into(),
            view_without_translation: camera.view_without_translation().into(),
            camera_position: [
                camera.position.x,
                camera.position.y,
                camera.position.z,
                1.0,
            ],
        }
    }
}

/// Lighting uniform block, std140, 96 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniform {
    pub light_position: [f32; 4],
    pub light_color: [f32; 4],
    pub light_space: [[f32; 4]; 4],
}

impl LightUniform {
    pub fn from_shadow_camera(shadow_camera: &OrthographicCamera, light_color: [f32; 4]) -> Self {
        Self {
            light_position: [
                shadow_camera.position.x,
                shadow_camera.position.y,
                shadow_camera.position.z,
                1.0,
            ],
            light_color,
            light_space: shadow_camera.light_space().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn uniform_blocks_match_shader_sizes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 208);
        assert_eq!(std::mem::size_of::<LightUniform>(), 96);
    }

    #[test]
    fn camera_uniform_carries_position() {
        let camera = Camera::new(Point3::new(5.0, 2.5, 10.0), 70.0, 0.1, 1000.0, 1280, 720);
        let uniform = CameraUniform::from_camera(&camera);
        assert_eq!(uniform.camera_position, [5.0, 2.5, 10.0, 1.0]);
    }
}

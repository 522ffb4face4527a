use cgmath::{perspective, Matrix4, Point3, Rad, Vector2, Vector3, Vector4};

use crate::math::Frustum;

/// Radians of orbit per pixel of mouse travel.
pub const MOUSE_SENSITIVITY: f32 = 0.001;

/// Perspective camera with two orbit angles as its navigation state.
///
/// All derived state (basis vectors, matrices, frustum) is recomputed by
/// [`Camera::update`], which the frame loop must call once before any
/// culling or projection queries; derived state is read-only for the rest
/// of the frame.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    /// Yaw in radians. Not wrapped.
    pub horizontal_angle: f32,
    /// Pitch in radians. Not clamped.
    pub vertical_angle: f32,

    aspect: f32,
    fov_y: f32,
    fov_x: f32,
    near: f32,
    far: f32,
    width: u32,
    height: u32,
    home: Point3<f32>,

    forward: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    view_without_translation: Matrix4<f32>,
    frustum: Frustum,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    pub fn new(
        position: Point3<f32>,
        fov: f32,
        near: f32,
        far: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let aspect = width as f32 / height as f32;
        let fov_y = fov.to_radians();
        let fov_x = 2.0 * (aspect * (0.5 * fov_y).tan()).atan();

        let mut camera = Self {
            position,
            horizontal_angle: std::f32::consts::PI,
            vertical_angle: 0.0,
            aspect,
            fov_y,
            fov_x,
            near,
            far,
            width,
            height,
            home: position,
            forward: Vector3::new(0.0, 0.0, 1.0),
            right: Vector3::new(1.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            view: Matrix4::from_scale(1.0),
            projection: Matrix4::from_scale(1.0),
            view_without_translation: Matrix4::from_scale(1.0),
            frustum: Frustum::new(
                position,
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(0.0, 1.0, 0.0),
                fov_x,
                fov_y,
                near,
                far,
            ),
        };
        camera.update();
        camera
    }

    /// Recompute the basis, matrices and frustum from the navigation state.
    pub fn update(&mut self) {
        // Spherical to Cartesian
        let (sin_vertical, cos_vertical) = self.vertical_angle.sin_cos();
        let (sin_horizontal, cos_horizontal) = self.horizontal_angle.sin_cos();

        self.forward = Vector3::new(
            cos_vertical * sin_horizontal,
            sin_vertical,
            cos_vertical * cos_horizontal,
        );

        // Right is derived from yaw alone so it stays horizontal at
        // extreme pitch instead of picking up roll.
        let angle_offset = self.horizontal_angle - std::f32::consts::FRAC_PI_2;
        self.right = Vector3::new(angle_offset.sin(), 0.0, angle_offset.cos());

        self.up = self.right.cross(self.forward);

        self.frustum = Frustum::new(
            self.position,
            self.forward,
            self.up,
            self.fov_x,
            self.fov_y,
            self.near,
            self.far,
        );

        let target = self.position + self.forward;
        self.view = Matrix4::look_at_rh(self.position, target, self.up);
        self.projection = perspective(Rad(self.fov_y), self.aspect, self.near, self.far);

        self.view_without_translation = self.view;
        self.view_without_translation.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
    }

    /// Apply a mouse delta (in pixels) to the orbit angles.
    pub fn change_orientation(&mut self, delta: Vector2<f32>) {
        self.horizontal_angle -= MOUSE_SENSITIVITY * delta.x;
        self.vertical_angle -= MOUSE_SENSITIVITY * delta.y;
    }

    /// Project a world-space point to pixel coordinates (origin top-left).
    ///
    /// Returns the screen position and the clip-space w (the perspective
    /// depth), or `None` when the point is behind or on the camera plane.
    pub fn world_to_screen(&self, world_pos: Point3<f32>) -> Option<(Vector2<f32>, f32)> {
        let clip = self.projection
            * self.view
            * Vector4::new(world_pos.x, world_pos.y, world_pos.z, 1.0);

        if clip.w <= 0.0 {
            return None;
        }

        let ndc = clip / clip.w;
        let screen = Vector2::new(
            (ndc.x * 0.5 + 0.5) * self.width as f32,
            (1.0 - (ndc.y * 0.5 + 0.5)) * self.height as f32,
        );
        Some((screen, clip.w))
    }

    /// Update the viewport dimensions, keeping the vertical fov.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.aspect = width as f32 / height as f32;
        self.fov_x = 2.0 * (self.aspect * (0.5 * self.fov_y).tan()).atan();
    }

    /// Restore the initial position and orientation.
    pub fn reset(&mut self) {
        self.position = self.home;
        self.horizontal_angle = std::f32::consts::PI;
        self.vertical_angle = 0.0;
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    /// View matrix with the translation stripped, for skybox-style passes.
    pub fn view_without_translation(&self) -> Matrix4<f32> {
        self.view_without_translation
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

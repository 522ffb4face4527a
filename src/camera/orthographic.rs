use cgmath::{ortho, InnerSpace, Matrix4, Point3, Vector3};

/// Orthographic camera used as the shadow-map light view.
///
/// The symmetric `extent` sets the left/right/bottom/top planes of the
/// projection. `update()` must run whenever position or target change.
#[derive(Debug, Clone)]
pub struct OrthographicCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,

    extent: f32,
    near: f32,
    far: f32,
    up: Vector3<f32>,

    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    light_space: Matrix4<f32>,
}

impl OrthographicCamera {
    pub fn new(position: Point3<f32>, target: Point3<f32>, extent: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            target,
            extent,
            near,
            far,
            up: Vector3::new(0.0, 1.0, 0.0),
            projection: Matrix4::from_scale(1.0),
            view: Matrix4::from_scale(1.0),
            light_space: Matrix4::from_scale(1.0),
        };
        camera.update();
        camera
    }

    pub fn update(&mut self) {
        self.projection = ortho(
            -self.extent,
            self.extent,
            -self.extent,
            self.extent,
            self.near,
            self.far,
        );
        self.view = Matrix4::look_at_rh(self.position, self.target, self.up);
        self.light_space = self.projection * self.view;
    }

    /// Unit vector from the light toward its target.
    pub fn light_direction(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }

    /// Depth covered by the projection; shadow casters are swept this far
    /// along the light direction when building shadow culling volumes.
    pub fn depth_range(&self) -> f32 {
        self.far - self.near
    }

    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Combined projection * view, the matrix shadow shaders consume.
    pub fn light_space(&self) -> Matrix4<f32> {
        self.light_space
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }
}

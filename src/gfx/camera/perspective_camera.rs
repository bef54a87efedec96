use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Y-up perspective camera looking at a point.
///
/// The projection is cached; call [`update_projection_matrix`](Self::update_projection_matrix)
/// after changing `fov`, `aspect`, `znear` or `zfar`.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub position: Vector3<f32>,
    pub look_at: Vector3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    projection: Matrix4<f32>,
    pub uniform: CameraUniform,
}

impl Camera for PerspectiveCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        let target = Point3::from_vec(self.look_at);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        OPENGL_TO_WGPU_MATRIX * self.projection * view
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, znear: f32, zfar: f32) -> Self {
        let mut camera = Self {
            position: Vector3::zero(),
            look_at: Vector3::zero(),
            up: Vector3::unit_y(),
            fov,
            aspect,
            znear,
            zfar,
            projection: Matrix4::identity(),
            uniform: CameraUniform::default(),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    pub fn look_at(&mut self, target: Vector3<f32>) {
        self.look_at = target;
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection_matrix();
    }

    /// Rebuilds the cached projection.
    ///
    /// cgmath asserts on a degenerate frustum, so invalid parameters keep the
    /// previous projection instead.
    pub fn update_projection_matrix(&mut self) {
        let valid = self.fov > 0.0
            && self.fov < 180.0
            && self.aspect > 0.0
            && self.aspect.is_finite()
            && self.znear > 0.0
            && self.zfar > self.znear;
        if !valid {
            log::warn!(
                "Skipping projection update for fov {} aspect {} near {} far {}",
                self.fov,
                self.aspect,
                self.znear,
                self.zfar
            );
            return;
        }
        self.projection = perspective(Deg(self.fov), self.aspect, self.znear, self.zfar);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.position.x, self.position.y, self.position.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

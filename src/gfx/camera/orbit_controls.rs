use cgmath::{InnerSpace, Vector3};

use super::perspective_camera::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Limits applied on every [`OrbitControls::update`].
#[derive(Debug, Clone, Copy)]
pub struct OrbitBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    /// Smallest angle from +Y, in radians
    pub min_polar: f32,
    /// Largest angle from +Y, in radians
    pub max_polar: f32,
}

impl Default for OrbitBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: None,
            min_polar: 0.0,
            max_polar: std::f32::consts::PI,
        }
    }
}

/// Orbits a [`PerspectiveCamera`] around a target point.
///
/// Input accumulates as pending rotation and zoom; [`update`](Self::update) applies it
/// once per frame. With damping enabled the pending deltas decay over several frames
/// instead of being consumed at once.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vector3<f32>,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    /// Radians per pixel of pointer movement
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub bounds: OrbitBounds,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    dragging: bool,
}

impl OrbitControls {
    pub fn new(target: Vector3<f32>) -> Self {
        Self {
            target,
            enable_rotate: true,
            enable_zoom: true,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 1.0,
            bounds: OrbitBounds::default(),
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            dragging: false,
        }
    }

    /// Starts a drag. Returns false if a drag was already in progress.
    pub fn begin_drag(&mut self) -> bool {
        !std::mem::replace(&mut self.dragging, true)
    }

    /// Ends a drag. Returns false if no drag was in progress.
    pub fn end_drag(&mut self) -> bool {
        std::mem::replace(&mut self.dragging, false)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Queues an orbit by pointer movement in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if !self.enable_rotate {
            return;
        }
        self.delta_theta -= dx * self.rotate_speed;
        self.delta_phi -= dy * self.rotate_speed;
    }

    /// Queues a zoom step; positive values move away from the target.
    pub fn zoom(&mut self, delta: f32) {
        if !self.enable_zoom || delta == 0.0 {
            return;
        }
        let step = 0.95_f32.powf(self.zoom_speed * delta.abs());
        if delta > 0.0 {
            self.scale /= step;
        } else {
            self.scale *= step;
        }
    }

    /// Applies pending input to `camera` and points it at the target.
    ///
    /// Returns true if the camera position changed.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.magnitude();
        let before = camera.position;
        let pending = self.delta_theta != 0.0 || self.delta_phi != 0.0 || self.scale != 1.0;

        if pending && radius > EPS {
            let mut theta = offset.x.atan2(offset.z);
            let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

            if self.enable_damping {
                theta += self.delta_theta * self.damping_factor;
                phi += self.delta_phi * self.damping_factor;
            } else {
                theta += self.delta_theta;
                phi += self.delta_phi;
            }

            let min_polar = self.bounds.min_polar.max(EPS);
            let max_polar = self.bounds.max_polar.min(std::f32::consts::PI - EPS);
            phi = phi.clamp(min_polar, max_polar);

            let new_radius = (radius * self.scale).clamp(
                self.bounds.min_distance.unwrap_or(EPS),
                self.bounds.max_distance.unwrap_or(f32::MAX),
            );

            camera.set_position(self.target + spherical_to_cartesian(new_radius, phi, theta));
        }
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        (camera.position - before).magnitude2() > EPS * EPS
    }
}

fn spherical_to_cartesian(radius: f32, phi: f32, theta: f32) -> Vector3<f32> {
    let sin_phi = phi.sin();
    Vector3::new(
        radius * sin_phi * theta.sin(),
        radius * phi.cos(),
        radius * sin_phi * theta.cos(),
    )
}

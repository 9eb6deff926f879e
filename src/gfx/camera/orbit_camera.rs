use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use crate::config;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Below this, a damped delta counts as settled
const SETTLE_EPSILON: f32 = 1e-6;

/// Perspective camera orbiting a target point (Y up)
///
/// Input is accumulated as pending rotation, zoom and pan deltas; [`update`]
/// applies a damped fraction of them once per frame, so motion eases out
/// after the pointer stops.
///
/// [`update`]: OrbitCamera::update
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    /// Fraction of pending motion applied per frame; 0 disables damping
    pub damping_factor: f32,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
    /// Pending azimuth and polar deltas
    azimuth_delta: f32,
    polar_delta: f32,
    /// Pending multiplicative change of distance
    zoom_scale: f32,
    pan_offset: Vector3<f32>,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection_matrix() * self.view_matrix()
    }
}

impl OrbitCamera {
    pub fn new(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            eye,
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            damping_factor: config::ORBIT_DAMPING_FACTOR,
            aspect,
            fovy: Deg(config::CAMERA_FOV_DEGREES).into(),
            znear: config::CAMERA_NEAR,
            zfar: config::CAMERA_FAR,
            uniform: CameraUniform::default(),
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            zoom_scale: 1.0,
            pan_offset: Vector3::zero(),
        };
        camera.update_view_proj();
        camera
    }

    /// Camera at the configured start position looking at the origin
    pub fn from_config(aspect: f32) -> Self {
        Self::new(config::CAMERA_POSITION, config::CAMERA_TARGET, aspect)
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    /// OpenGL-convention perspective projection (clip z in [-1, 1])
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn distance(&self) -> f32 {
        (self.eye - self.target).magnitude()
    }

    /// Angle from the +Y axis, 0 looking straight down
    pub fn polar_angle(&self) -> f32 {
        let offset = self.eye - self.target;
        let radius = offset.magnitude();
        if radius < f32::EPSILON {
            return 0.0;
        }
        (offset.y / radius).clamp(-1.0, 1.0).acos()
    }

    pub fn azimuth_angle(&self) -> f32 {
        let offset = self.eye - self.target;
        offset.x.atan2(offset.z)
    }

    /// Queue rotation around the vertical axis
    pub fn rotate_left(&mut self, angle: f32) {
        self.azimuth_delta -= angle;
    }

    /// Queue rotation towards the top of the orbit
    pub fn rotate_up(&mut self, angle: f32) {
        self.polar_delta -= angle;
    }

    /// Queue a zoom; `scale` < 1 moves closer
    pub fn zoom(&mut self, scale: f32) {
        if scale > 0.0 {
            self.zoom_scale *= scale;
        }
    }

    /// Queue a pan in screen space, scaled by the current distance
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        let pan_scale = self.distance();
        self.pan_offset += (right * delta.0 + up * delta.1) * pan_scale;
    }

    /// Applies pending input, one damping step
    ///
    /// Returns `true` if the camera moved.
    pub fn update(&mut self) -> bool {
        let damping = self.damping_factor;
        let step = if damping > 0.0 { damping } else { 1.0 };

        let pending = (self.azimuth_delta * step).abs() > SETTLE_EPSILON
            || (self.polar_delta * step).abs() > SETTLE_EPSILON
            || (self.zoom_scale - 1.0).abs() > SETTLE_EPSILON
            || (self.pan_offset * step).magnitude() > SETTLE_EPSILON;
        if !pending {
            self.azimuth_delta = 0.0;
            self.polar_delta = 0.0;
            self.zoom_scale = 1.0;
            self.pan_offset = Vector3::zero();
            return false;
        }

        let offset = self.eye - self.target;
        let mut radius = offset.magnitude().max(f32::EPSILON);
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        azimuth += self.azimuth_delta * step;
        polar += self.polar_delta * step;
        polar = polar
            .clamp(self.bounds.min_polar, self.bounds.max_polar)
            .clamp(SETTLE_EPSILON, std::f32::consts::PI - SETTLE_EPSILON);

        radius = (radius * self.zoom_scale)
            .clamp(self.bounds.min_distance, self.bounds.max_distance);

        self.target += self.pan_offset * step;

        self.eye = self.target
            + Vector3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );

        if damping > 0.0 {
            self.azimuth_delta *= 1.0 - damping;
            self.polar_delta *= 1.0 - damping;
            self.pan_offset *= 1.0 - damping;
        } else {
            self.azimuth_delta = 0.0;
            self.polar_delta = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.zoom_scale = 1.0;

        self.update_view_proj();
        true
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
        self.update_view_proj();
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: config::ORBIT_MIN_DISTANCE,
            max_distance: config::ORBIT_MAX_DISTANCE,
            min_polar: config::ORBIT_MIN_POLAR_ANGLE,
            max_polar: config::ORBIT_MAX_POLAR_ANGLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitCamera {
        OrbitCamera::from_config(1200.0 / 800.0)
    }

    #[test]
    fn test_resize_sets_exact_aspect() {
        let mut camera = camera();
        camera.resize_projection(1920, 1080);
        assert_eq!(camera.aspect, 1920.0 / 1080.0);
    }

    #[test]
    fn test_idle_update_does_not_move() {
        let mut camera = camera();
        let eye = camera.eye;
        assert!(!camera.update());
        assert!((camera.eye - eye).magnitude() < 1e-4);
    }

    #[test]
    fn test_damped_rotation_eases_out() {
        let mut camera = camera();
        let start = camera.azimuth_angle();
        camera.rotate_left(-1.0);

        assert!(camera.update());
        let first_step = camera.azimuth_angle() - start;
        assert!((first_step - 0.05).abs() < 1e-4);

        // Remaining motion keeps shrinking and converges to the full delta
        for _ in 0..500 {
            camera.update();
        }
        assert!((camera.azimuth_angle() - start - 1.0).abs() < 1e-3);
        assert!(!camera.update());
    }

    #[test]
    fn test_polar_angle_never_goes_below_ground() {
        let mut camera = camera();
        camera.rotate_up(-10.0);
        for _ in 0..200 {
            camera.update();
            assert!(camera.polar_angle() <= std::f32::consts::FRAC_PI_2 + 1e-4);
            assert!(camera.eye.y >= -1e-3);
        }
    }

    #[test]
    fn test_zoom_is_bounded() {
        let mut camera = camera();
        camera.zoom(1000.0);
        camera.update();
        assert!((camera.distance() - config::ORBIT_MAX_DISTANCE).abs() < 1e-2);

        camera.zoom(1e-6);
        camera.update();
        assert!((camera.distance() - config::ORBIT_MIN_DISTANCE).abs() < 1e-3);
    }

    #[test]
    fn test_pan_moves_target_and_eye_together() {
        let mut camera = camera();
        let offset = camera.eye - camera.target;
        camera.pan((0.1, 0.0));
        for _ in 0..500 {
            camera.update();
        }
        assert!(camera.target.x > 0.0);
        assert!((camera.eye - camera.target - offset).magnitude() < 1e-2);
    }
}

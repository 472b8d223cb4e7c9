//! Camera presets for the host render loop.

use glam::{Mat4, Vec3};

use crate::params::{CameraPreset, FixedCamera, OrbitCamera, RenderConfig};

/// Camera system producing a view-projection matrix per frame
pub struct CameraSystem {
    preset: CameraPreset,
}

impl CameraSystem {
    /// Create new camera system with specified preset
    pub fn new(preset: CameraPreset) -> Self {
        Self { preset }
    }

    /// Compute camera position and look-at target for given time
    pub fn compute_position_and_target(&self, time_s: f32) -> (Vec3, Vec3) {
        match &self.preset {
            CameraPreset::Fixed(p) => Self::compute_fixed(p),
            CameraPreset::Orbit(p) => Self::compute_orbit(p, time_s),
        }
    }

    fn compute_fixed(p: &FixedCamera) -> (Vec3, Vec3) {
        (Vec3::from_array(p.position), Vec3::from_array(p.target))
    }

    fn compute_orbit(p: &OrbitCamera, time_s: f32) -> (Vec3, Vec3) {
        let angle = time_s * p.angular_speed;
        let eye = Vec3::new(
            angle.cos() * p.radius_m,
            p.altitude_m,
            angle.sin() * p.radius_m,
        );
        (eye, Vec3::ZERO)
    }

    /// Build the view-projection matrix for given time
    pub fn view_proj(&self, time_s: f32, config: &RenderConfig) -> Mat4 {
        let (eye, target) = self.compute_position_and_target(time_s);
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            config.fov_degrees.to_radians(),
            config.aspect_ratio(),
            config.near_plane_m,
            config.far_plane_m,
        );
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_camera_is_stationary() {
        let camera = CameraSystem::new(CameraPreset::Fixed(FixedCamera::default()));
        let (eye0, _) = camera.compute_position_and_target(0.0);
        let (eye1, _) = camera.compute_position_and_target(100.0);
        assert_eq!(eye0, eye1);
    }

    #[test]
    fn test_orbit_keeps_radius_and_altitude() {
        let preset = OrbitCamera {
            radius_m: 200.0,
            altitude_m: 50.0,
            angular_speed: 0.1,
        };
        let camera = CameraSystem::new(CameraPreset::Orbit(preset));
        for t in [0.0f32, 3.7, 42.0] {
            let (eye, target) = camera.compute_position_and_target(t);
            let horizontal = (eye.x * eye.x + eye.z * eye.z).sqrt();
            assert!((horizontal - 200.0).abs() < 1e-3);
            assert_eq!(eye.y, 50.0);
            assert_eq!(target, Vec3::ZERO);
        }
    }
}

//! Camera preset parameters.

/// Camera preset selection
#[derive(Debug, Clone)]
pub enum CameraPreset {
    /// Stationary camera at a fixed position looking at a fixed target
    Fixed(FixedCamera),

    /// Slow circular orbit around the patch center
    Orbit(OrbitCamera),
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self::Fixed(FixedCamera::default())
    }
}

/// Fixed camera parameters
#[derive(Debug, Clone)]
pub struct FixedCamera {
    /// Eye position (meters, world space)
    pub position: [f32; 3],

    /// Look-at target (meters, world space)
    pub target: [f32; 3],
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self {
            position: [0.0, 60.0, -180.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Orbit camera parameters
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Orbit radius (meters)
    pub radius_m: f32,

    /// Eye altitude (meters)
    pub altitude_m: f32,

    /// Angular speed (radians per second)
    pub angular_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            radius_m: 220.0,
            altitude_m: 70.0,
            angular_speed: 0.05,
        }
    }
}

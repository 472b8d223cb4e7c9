//! Rendering and recording configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    pub far_plane_m: f32,

    /// Directional light (normalized at use site, world space)
    pub sun_direction: [f32; 3],

    /// Water color at wave troughs (linear RGB)
    pub deep_color: [f32; 3],

    /// Water color at wave crests (linear RGB)
    pub shallow_color: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 60.0,
            near_plane_m: 0.1,
            far_plane_m: 2000.0,
            sun_direction: [0.35, 0.8, 0.5],
            deep_color: [0.008, 0.06, 0.11],
            shallow_color: [0.1, 0.45, 0.5],
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_frame_count() {
        let config = RecordingConfig::new(2.5);
        assert_eq!(config.total_frames(), 150);
    }

    #[test]
    fn test_aspect_ratio() {
        let config = RenderConfig::default();
        assert!((config.aspect_ratio() - 1280.0 / 720.0).abs() < 1e-6);
    }
}

//! Command-line argument parsing.

use clap::Parser;
use glam::Vec2;

use crate::params::{
    CameraPreset, FixedCamera, OceanParams, OrbitCamera, RecordingConfig, SimulationMode,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Spindrift")]
#[command(about = "GPU spectral ocean surface simulation", long_about = None)]
pub struct Args {
    /// Simulation grid resolution (power of two)
    #[arg(long, value_name = "N", default_value = "256")]
    pub resolution: u32,

    /// World-space size of the simulated patch (meters)
    #[arg(long, value_name = "METERS", default_value = "400")]
    pub patch_size: f32,

    /// Wind speed (meters per second)
    #[arg(long, value_name = "M_PER_S", default_value = "12")]
    pub wind_speed: f32,

    /// Wind direction (degrees, 0 = +x)
    #[arg(long, value_name = "DEGREES", default_value = "20")]
    pub wind_degrees: f32,

    /// Simulation mode: spectral (default) or simple
    #[arg(long, value_name = "MODE", default_value = "spectral")]
    pub mode: String,

    /// Camera preset: fixed (default) or orbit
    #[arg(long, value_name = "PRESET", default_value = "fixed")]
    pub camera_preset: String,

    /// Camera elevation for the fixed preset (meters)
    #[arg(long, value_name = "METERS", default_value = "60")]
    pub elevation: f32,

    /// Record frames to disk (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,
}

impl Args {
    /// Build simulation parameters from the command line
    pub fn ocean_params(&self) -> OceanParams {
        let mode = match self.mode.to_lowercase().as_str() {
            "simple" => SimulationMode::Simple,
            "spectral" => SimulationMode::Spectral,
            other => {
                log::warn!("unknown mode '{other}', using spectral");
                SimulationMode::Spectral
            }
        };

        let radians = self.wind_degrees.to_radians();
        OceanParams {
            resolution: self.resolution,
            patch_size_m: self.patch_size,
            wind_speed_m_per_s: self.wind_speed,
            wind_direction: Vec2::new(radians.cos(), radians.sin()),
            mode,
            ..Default::default()
        }
    }

    /// Parse camera preset from command-line arguments
    pub fn parse_camera_preset(&self) -> CameraPreset {
        match self.camera_preset.to_lowercase().as_str() {
            "orbit" => CameraPreset::Orbit(OrbitCamera::default()),
            "fixed" => {
                let mut fixed = FixedCamera::default();
                fixed.position[1] = self.elevation;
                CameraPreset::Fixed(fixed)
            }
            other => {
                log::warn!("unknown camera preset '{other}', using fixed");
                CameraPreset::Fixed(FixedCamera::default())
            }
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| {
            let config = RecordingConfig::new(duration);

            // Create output directories
            std::fs::create_dir_all(config.frames_dir())
                .expect("Failed to create frames directory");

            config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        let args = Args::parse_from(["spindrift", "--mode", "simple"]);
        assert_eq!(args.ocean_params().mode, SimulationMode::Simple);

        let args = Args::parse_from(["spindrift"]);
        assert_eq!(args.ocean_params().mode, SimulationMode::Spectral);
    }

    #[test]
    fn test_wind_direction_from_degrees() {
        let args = Args::parse_from(["spindrift", "--wind-degrees", "90"]);
        let params = args.ocean_params();
        assert!(params.wind_direction.x.abs() < 1e-6);
        assert!((params.wind_direction.y - 1.0).abs() < 1e-6);
    }
}

//! Ocean simulation parameters and validation.

use glam::Vec2;

/// Which surface simulation drives the displacement/normal maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    /// Full spectral synthesis: Phillips spectrum, time evolution, GPU FFT.
    Spectral,
    /// Ping-pong accumulation of layered gradient noise. Cheap, lower fidelity.
    Simple,
}

/// Errors rejected before any GPU resource is allocated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// FFT stages require a power-of-two grid.
    #[error("grid resolution must be a power of two >= 4, got {0}")]
    BadResolution(u32),

    /// The Phillips spectrum is undefined for a windless ocean.
    #[error("wind speed must be > 0, got {0}")]
    BadWindSpeed(f32),

    #[error("gravity must be > 0, got {0}")]
    BadGravity(f32),

    #[error("patch size must be > 0, got {0}")]
    BadPatchSize(f32),

    #[error("wind direction must be a non-zero vector")]
    BadWindDirection,
}

/// Spectral ocean simulation parameters
#[derive(Debug, Clone)]
pub struct OceanParams {
    /// Frequency/spatial grid resolution per side (power of two, e.g. 256)
    pub resolution: u32,

    /// World-space extent of the simulated tile (meters)
    pub patch_size_m: f32,

    /// Wind speed at the surface (meters per second, > 0)
    pub wind_speed_m_per_s: f32,

    /// Wind direction (normalized at validation time)
    pub wind_direction: Vec2,

    /// Gravitational acceleration (meters per second squared)
    pub gravity_m_per_s2: f32,

    /// Phillips spectrum scale constant (dimensionless)
    pub phillips_alpha: f32,

    /// Horizontal displacement strength from the height gradient
    /// (0 = pure vertical heave)
    pub choppiness: f32,

    /// Overall wave height multiplier applied in the surface-map stage
    pub amplitude_m: f32,

    /// Seed for the fixed Gaussian noise field behind h0(k)
    pub noise_seed: i32,

    /// Which simulation path to run
    pub mode: SimulationMode,
}

impl Default for OceanParams {
    fn default() -> Self {
        Self {
            resolution: 256,
            patch_size_m: 400.0,
            wind_speed_m_per_s: 12.0,
            wind_direction: Vec2::new(1.0, 0.3),
            gravity_m_per_s2: 9.81,
            phillips_alpha: 0.0081,
            choppiness: 1.4,
            amplitude_m: 1.0,
            noise_seed: 1234,
            mode: SimulationMode::Spectral,
        }
    }
}

impl OceanParams {
    /// Validate and normalize the parameter set.
    ///
    /// Must pass before `OceanSystem` touches the GPU; a failure here
    /// leaves nothing to tear down.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.resolution < 4 || !self.resolution.is_power_of_two() {
            return Err(ConfigError::BadResolution(self.resolution));
        }
        if self.wind_speed_m_per_s <= 0.0 {
            return Err(ConfigError::BadWindSpeed(self.wind_speed_m_per_s));
        }
        if self.gravity_m_per_s2 <= 0.0 {
            return Err(ConfigError::BadGravity(self.gravity_m_per_s2));
        }
        if self.patch_size_m <= 0.0 {
            return Err(ConfigError::BadPatchSize(self.patch_size_m));
        }
        let len = self.wind_direction.length();
        if !(len > 0.0 && len.is_finite()) {
            return Err(ConfigError::BadWindDirection);
        }
        self.wind_direction /= len;
        Ok(())
    }

    /// Number of butterfly stages per FFT axis (log2 of the resolution)
    pub fn fft_stages(&self) -> u32 {
        self.resolution.trailing_zeros()
    }
}

/// Parameters for the simple ping-pong noise mode
#[derive(Debug, Clone)]
pub struct SimpleWaveParams {
    /// Spatial frequency of the first noise layer (tile repeats per patch)
    pub layer1_frequency: f32,

    /// Spatial frequency of the second noise layer
    pub layer2_frequency: f32,

    /// Scroll velocity of the first layer (UV units per second)
    pub layer1_velocity: Vec2,

    /// Scroll velocity of the second layer
    pub layer2_velocity: Vec2,

    /// Blend factor folding fresh noise into the accumulated height per frame
    /// (0 = frozen, 1 = no accumulation)
    pub blend: f32,

    /// Height of the combined layers (meters)
    pub amplitude_m: f32,
}

impl Default for SimpleWaveParams {
    fn default() -> Self {
        Self {
            layer1_frequency: 4.0,
            layer2_frequency: 11.0,
            layer1_velocity: Vec2::new(0.013, 0.021),
            layer2_velocity: Vec2::new(-0.034, 0.009),
            blend: 0.12,
            amplitude_m: 1.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_validate() {
        let mut params = OceanParams::default();
        assert!(params.validate().is_ok());
        // Wind direction is unit length after validation
        assert!((params.wind_direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_power_of_two_resolution() {
        let mut params = OceanParams {
            resolution: 100,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::BadResolution(100))
        ));
    }

    #[test]
    fn test_rejects_tiny_resolution() {
        let mut params = OceanParams {
            resolution: 2,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_scalars() {
        let mut params = OceanParams {
            wind_speed_m_per_s: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::BadWindSpeed(_))
        ));

        let mut params = OceanParams {
            gravity_m_per_s2: -9.81,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(ConfigError::BadGravity(_))));

        let mut params = OceanParams {
            patch_size_m: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::BadPatchSize(_))
        ));
    }

    #[test]
    fn test_rejects_zero_wind_direction() {
        let mut params = OceanParams {
            wind_direction: Vec2::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::BadWindDirection)
        ));
    }

    #[test]
    fn test_fft_stage_count() {
        let params = OceanParams {
            resolution: 256,
            ..Default::default()
        };
        assert_eq!(params.fft_stages(), 8);

        let params = OceanParams {
            resolution: 4,
            ..Default::default()
        };
        assert_eq!(params.fft_stages(), 2);
    }
}

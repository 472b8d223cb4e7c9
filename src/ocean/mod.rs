//! GPU ocean surface simulation.
//!
//! [`OceanSystem`] is the explicit simulation context owned by the
//! caller: it allocates every GPU resource at construction, records the
//! per-frame passes into the host's command encoder, and releases
//! everything exactly once when dropped. The host only consumes the
//! displacement and normal map views.

pub mod butterfly;
pub mod mesh;
pub mod pipeline;
pub mod simple;
pub mod spectrum;

use crate::params::{ConfigError, OceanParams, SimpleWaveParams, SimulationMode};
use pipeline::WavePipeline;
use simple::SimpleWavePipeline;

/// Intermediate textures exposed read-only for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugTexture {
    /// Phillips spectrum P(k) (spectral mode)
    Phillips,
    /// Fixed Gaussian noise field (spectral mode)
    Noise,
    /// Initial spectrum h0(k) (spectral mode)
    InitialSpectrum,
    /// Time-evolved spectrum h(k,t) of the current frame (spectral mode)
    EvolvedSpectrum,
    /// FFT ping-pong intermediate (spectral mode)
    FftIntermediate,
    /// FFT result before map derivation (spectral mode)
    FftOutput,
    /// Butterfly lookup table (spectral mode)
    Butterfly,
    /// Accumulated height field (simple mode)
    SimpleHeight,
    /// Displacement map (both modes)
    Displacement,
    /// Normal map (both modes)
    NormalMap,
}

enum Mode {
    Spectral(WavePipeline),
    Simple(SimpleWavePipeline),
}

/// Owner and orchestrator of the whole simulation pipeline.
pub struct OceanSystem {
    params: OceanParams,
    mode: Mode,
}

impl OceanSystem {
    /// Validate parameters and allocate the full pipeline.
    ///
    /// Validation happens before the first GPU call; on error no
    /// resource has been created.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mut params: OceanParams,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        log::info!(
            "ocean init: {}x{} grid, mode {:?}",
            params.resolution,
            params.resolution,
            params.mode
        );

        let mode = match params.mode {
            SimulationMode::Spectral => Mode::Spectral(WavePipeline::new(device, queue, &params)),
            SimulationMode::Simple => Mode::Simple(SimpleWavePipeline::new(
                device,
                queue,
                &params,
                SimpleWaveParams::default(),
            )),
        };

        Ok(Self { params, mode })
    }

    /// Record the simulation passes for this frame, in order, into the
    /// host's encoder. The displacement/normal maps are up to date once
    /// the encoder is submitted.
    pub fn record(&mut self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, time: f32) {
        match &mut self.mode {
            Mode::Spectral(pipeline) => pipeline.encode(queue, encoder, time),
            Mode::Simple(pipeline) => pipeline.encode(queue, encoder, time),
        }
    }

    /// Change wind parameters at runtime. Rebuilds the frequency-domain
    /// tables in place; spectral mode only (a no-op in simple mode).
    pub fn set_wind(
        &mut self,
        queue: &wgpu::Queue,
        wind_speed: f32,
        wind_direction: glam::Vec2,
    ) -> Result<(), ConfigError> {
        if wind_speed <= 0.0 {
            return Err(ConfigError::BadWindSpeed(wind_speed));
        }
        let len = wind_direction.length();
        if !(len > 0.0 && len.is_finite()) {
            return Err(ConfigError::BadWindDirection);
        }

        self.params.wind_speed_m_per_s = wind_speed;
        self.params.wind_direction = wind_direction / len;
        if let Mode::Spectral(pipeline) = &mut self.mode {
            pipeline.set_wind(queue, wind_speed, self.params.wind_direction);
        }
        Ok(())
    }

    pub fn displacement_view(&self) -> &wgpu::TextureView {
        match &self.mode {
            Mode::Spectral(pipeline) => pipeline.displacement_view(),
            Mode::Simple(pipeline) => pipeline.displacement_view(),
        }
    }

    pub fn normal_view(&self) -> &wgpu::TextureView {
        match &self.mode {
            Mode::Spectral(pipeline) => pipeline.normal_view(),
            Mode::Simple(pipeline) => pipeline.normal_view(),
        }
    }

    /// Read-only view of an intermediate texture, if the current mode
    /// produces it. Never mutates pipeline state.
    pub fn debug_view(&self, which: DebugTexture) -> Option<&wgpu::TextureView> {
        match (&self.mode, which) {
            (Mode::Spectral(p), DebugTexture::Phillips) => Some(p.phillips_view()),
            (Mode::Spectral(p), DebugTexture::Noise) => Some(p.noise_view()),
            (Mode::Spectral(p), DebugTexture::InitialSpectrum) => Some(p.h0_view()),
            (Mode::Spectral(p), DebugTexture::EvolvedSpectrum) => Some(p.fft().input_view()),
            (Mode::Spectral(p), DebugTexture::FftIntermediate) => Some(p.fft().intermediate_view()),
            (Mode::Spectral(p), DebugTexture::FftOutput) => Some(p.fft().output_view()),
            (Mode::Spectral(p), DebugTexture::Butterfly) => Some(p.fft().butterfly_view()),
            (Mode::Simple(p), DebugTexture::SimpleHeight) => Some(p.height_view()),
            (_, DebugTexture::Displacement) => Some(self.displacement_view()),
            (_, DebugTexture::NormalMap) => Some(self.normal_view()),
            _ => None,
        }
    }

    /// Blocking readback of the current displacement map as RGBA f16
    /// bits (debug only; stalls the queue).
    pub fn read_displacement_raw(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Option<Vec<u8>> {
        let n = self.params.resolution;
        match &self.mode {
            Mode::Spectral(p) => Some(pipeline::read_texture_raw(
                device,
                queue,
                p.displacement_texture(),
                n,
                n,
                8,
            )),
            Mode::Simple(_) => None,
        }
    }

    pub fn params(&self) -> &OceanParams {
        &self.params
    }
}

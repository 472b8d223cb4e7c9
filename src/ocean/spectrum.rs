//! Phillips spectrum and initial wave field, computed CPU-side.
//!
//! The frequency-domain tables (Phillips spectrum, Gaussian noise, h0)
//! depend only on the simulation parameters and a fixed seed, so they are
//! built once on the CPU and uploaded as textures. Everything that varies
//! per frame runs on the GPU.

use glam::Vec2;

use crate::params::OceanParams;

/// Wave numbers below this are treated as the degenerate DC term.
pub const K_EPSILON: f32 = 1e-6;

/// Wave vector for texel (i, j) on an `n`-sized grid over a patch of
/// `patch_size` meters: k = 2π·(i − n/2) / patch_size per axis.
pub fn wave_vector(i: u32, j: u32, n: u32, patch_size: f32) -> Vec2 {
    let two_pi = std::f32::consts::TAU;
    Vec2::new(
        two_pi * (i as f32 - n as f32 / 2.0) / patch_size,
        two_pi * (j as f32 - n as f32 / 2.0) / patch_size,
    )
}

/// Deep-water dispersion relation: ω(k) = sqrt(g·|k|)
pub fn dispersion(k_len: f32, gravity: f32) -> f32 {
    (gravity * k_len).sqrt()
}

/// Phillips spectrum P(k) for a single wave vector.
///
/// P(k) = alpha · exp(−1/(kL)²) / k⁴ · (k̂·ŵ)² · exp(−k²l²)
/// with L = W²/g the largest wind-sustained wave and l = L/1000 damping
/// out sub-scale ripples. Returns exactly 0 for |k| < `K_EPSILON` so the
/// DC singularity can never feed NaN/Inf into the FFT.
pub fn phillips(k: Vec2, params: &OceanParams) -> f32 {
    let k_len = k.length();
    if k_len < K_EPSILON {
        return 0.0;
    }

    let big_l = params.wind_speed_m_per_s * params.wind_speed_m_per_s / params.gravity_m_per_s2;
    let kl = k_len * big_l;
    let k2 = k_len * k_len;
    let k4 = k2 * k2;

    let k_hat = k / k_len;
    let dir = k_hat.dot(params.wind_direction);

    let damping = big_l / 1000.0;
    let suppression = (-k2 * damping * damping).exp();

    params.phillips_alpha * (-1.0 / (kl * kl)).exp() / k4 * dir * dir * suppression
}

/// Full N×N Phillips table in row-major texel order.
pub fn phillips_table(params: &OceanParams) -> Vec<f32> {
    let n = params.resolution;
    let mut table = Vec::with_capacity((n * n) as usize);
    for j in 0..n {
        for i in 0..n {
            let k = wave_vector(i, j, n, params.patch_size_m);
            table.push(phillips(k, params));
        }
    }
    table
}

/// Fixed field of independent standard-normal pairs, one per texel.
///
/// Seeded LCG + Box-Muller; the same seed reproduces the field bit for
/// bit, which keeps the wave field temporally coherent across runs and
/// makes h0 deterministic.
pub fn gaussian_noise_table(seed: i32, n: u32) -> Vec<[f32; 2]> {
    let mut state = seed;
    let mut uniform = move || {
        state = state.wrapping_mul(1103515245).wrapping_add(12345) & 0x7FFF_FFFF;
        (state >> 7) as f64 / (1 << 24) as f64
    };

    let count = (n * n) as usize;
    let mut table = Vec::with_capacity(count);
    for _ in 0..count {
        let u1 = uniform();
        let u2 = uniform();
        // ln argument stays in (0, 1]
        let r = (-2.0 * (1.0 - u1).ln()).sqrt();
        let theta = std::f64::consts::TAU * u2;
        table.push([(r * theta.cos()) as f32, (r * theta.sin()) as f32]);
    }
    table
}

/// Initial frequency-domain amplitudes:
/// h0(k) = sqrt(P(k)/2) · (n_x, n_y).
pub fn initial_spectrum(phillips: &[f32], noise: &[[f32; 2]]) -> Vec<[f32; 2]> {
    debug_assert_eq!(phillips.len(), noise.len());
    phillips
        .iter()
        .zip(noise)
        .map(|(&p, &[nx, ny])| {
            let a = (p / 2.0).sqrt();
            [a * nx, a * ny]
        })
        .collect()
}

/// CPU mirror of the time-evolution shader: h(k,t) = h0(k)·cos(ω(k)·t).
///
/// Cosine-only evolution, matching `shaders/evolve.wgsl`; the conjugate
/// counter-term of the exact technique is intentionally omitted.
pub fn evolve_reference(h0: [f32; 2], k: Vec2, time: f32, gravity: f32) -> [f32; 2] {
    let c = (dispersion(k.length(), gravity) * time).cos();
    [h0[0] * c, h0[1] * c]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_params() -> OceanParams {
        let mut params = OceanParams {
            resolution: 4,
            patch_size_m: 1.0,
            wind_speed_m_per_s: 5.0,
            wind_direction: Vec2::new(1.0, 0.0),
            gravity_m_per_s2: 9.81,
            ..Default::default()
        };
        params.validate().unwrap();
        params
    }

    #[test]
    fn test_phillips_zero_at_dc() {
        let params = toy_params();
        // Texel (2, 2) on a 4-grid maps to k = (0, 0)
        let k = wave_vector(2, 2, 4, params.patch_size_m);
        assert_eq!(k, Vec2::ZERO);
        assert_eq!(phillips(k, &params), 0.0);
    }

    #[test]
    fn test_phillips_never_negative_or_nan() {
        let params = toy_params();
        for p in phillips_table(&params) {
            assert!(p.is_finite());
            assert!(p >= 0.0);
        }
    }

    #[test]
    fn test_phillips_toy_grid_matches_reference() {
        // Scenario: N=4, patch 1m, wind (1,0) at 5 m/s, g = 9.81.
        // Reference value computed step by step in f64 for texel (3, 2),
        // i.e. k = (2π, 0).
        let params = toy_params();
        let k = wave_vector(3, 2, 4, params.patch_size_m);

        let k_len = std::f64::consts::TAU;
        let big_l = 5.0f64 * 5.0 / 9.81;
        let kl = k_len * big_l;
        let k2 = k_len * k_len;
        let damping = big_l / 1000.0;
        let expected = 0.0081 * (-1.0 / (kl * kl)).exp() / (k2 * k2)
            * 1.0 // (k̂·ŵ)² with k and wind both along +x
            * (-k2 * damping * damping).exp();

        let got = phillips(k, &params) as f64;
        assert!(
            (got - expected).abs() <= expected * 1e-5,
            "got {got}, expected {expected}"
        );
    }

    #[test]
    fn test_phillips_directional_term() {
        let params = toy_params();
        // Crosswind texel: k along +y, wind along +x => (k̂·ŵ)² = 0
        let k = wave_vector(2, 3, 4, params.patch_size_m);
        assert_eq!(phillips(k, &params), 0.0);
    }

    #[test]
    fn test_noise_is_deterministic() {
        let a = gaussian_noise_table(1234, 16);
        let b = gaussian_noise_table(1234, 16);
        assert_eq!(a, b);

        let c = gaussian_noise_table(99, 16);
        assert_ne!(a, c);
    }

    #[test]
    fn test_noise_is_roughly_standard_normal() {
        let table = gaussian_noise_table(1234, 64);
        let samples: Vec<f32> = table.iter().flatten().copied().collect();
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        let var = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>()
            / samples.len() as f32;
        assert!(mean.abs() < 0.1, "mean {mean}");
        assert!((var - 1.0).abs() < 0.15, "variance {var}");
    }

    #[test]
    fn test_initial_spectrum_deterministic_and_scaled() {
        let params = toy_params();
        let table = phillips_table(&params);
        let noise = gaussian_noise_table(params.noise_seed, params.resolution);

        let h0a = initial_spectrum(&table, &noise);
        let h0b = initial_spectrum(&table, &noise);
        assert_eq!(h0a, h0b);

        // Spot-check the formula on one texel
        let idx = 3; // row 0, texel (3, 0)
        let amp = (table[idx] / 2.0).sqrt();
        assert_eq!(h0a[idx], [amp * noise[idx][0], amp * noise[idx][1]]);
    }

    #[test]
    fn test_evolution_identity_at_t0() {
        let k = Vec2::new(0.3, -0.7);
        let h0 = [0.25, -1.5];
        assert_eq!(evolve_reference(h0, k, 0.0, 9.81), h0);
    }

    #[test]
    fn test_evolution_periodicity() {
        let k = Vec2::new(2.0, 0.0);
        let h0 = [1.0, 0.5];
        let omega = dispersion(k.length(), 9.81);
        let period = std::f32::consts::TAU / omega;

        let evolved = evolve_reference(h0, k, period, 9.81);
        assert!((evolved[0] - h0[0]).abs() < 1e-4);
        assert!((evolved[1] - h0[1]).abs() < 1e-4);
    }
}

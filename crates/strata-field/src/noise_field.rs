//! Multi-octave fractal Brownian motion (fBm) field sampler.
//!
//! Composites octaves of simplex noise into a height value and derives a
//! color from the normalized height.

use glam::Vec3;
use noise::{NoiseFn, Simplex};

use crate::sample::{FieldSampler, FieldValue};

/// Parameters for multi-octave fBm noise.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// Seed for deterministic generation.
    pub seed: u32,
    /// Number of noise octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first (lowest) octave.
    pub base_frequency: f64,
    /// Amplitude of the first octave.
    pub amplitude: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.004,
            amplitude: 48.0,
        }
    }
}

/// Height field from fractal Brownian motion over simplex noise.
pub struct NoiseField {
    noise: Simplex,
    params: NoiseParams,
}

impl NoiseField {
    /// Create a new sampler with the given parameters.
    pub fn new(params: NoiseParams) -> Self {
        let noise = Simplex::new(params.seed);
        Self { noise, params }
    }

    /// Raw fBm height at a world coordinate.
    pub fn height(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }

    /// Theoretical maximum absolute height (geometric series of amplitudes).
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.params.amplitude;
        for _ in 0..self.params.octaves {
            sum += amp;
            amp *= self.params.persistence;
        }
        sum
    }

    fn color_for(&self, height: f64) -> Vec3 {
        let max = self.max_amplitude();
        let t = if max > 0.0 { (height / max) as f32 } else { 0.0 };
        let sand = Vec3::new(0.76, 0.70, 0.50);
        let grass = Vec3::new(0.25, 0.50, 0.20);
        let rock = Vec3::new(0.45, 0.42, 0.40);
        let snow = Vec3::new(0.95, 0.95, 0.97);
        match t {
            t if t < -0.2 => sand,
            t if t < 0.3 => sand.lerp(grass, ((t + 0.2) / 0.5).clamp(0.0, 1.0)),
            t if t < 0.6 => grass.lerp(rock, (t - 0.3) / 0.3),
            t => rock.lerp(snow, ((t - 0.6) / 0.4).clamp(0.0, 1.0)),
        }
    }
}

impl FieldSampler for NoiseField {
    fn sample(&self, x: f32, y: f32) -> FieldValue {
        let height = self.height(x as f64, y as f64);
        FieldValue {
            height: height as f32,
            color: self.color_for(height),
        }
    }
}

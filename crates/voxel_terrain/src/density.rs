//! Density fields sampled by the extractors.
//!
//! A field maps a world position to a scalar. Values below the configured
//! surface level are inside (solid), values at or above it are outside (air).
//!
//! Fields must be pure: the same position always yields the same value,
//! regardless of which chunk or which thread asks.

use glam::Vec3;
use noise::{NoiseFn, Perlin};

/// Scalar density sampler.
pub trait DensityField: Send + Sync {
  /// Density at a world-space position.
  fn density(&self, position: Vec3) -> f32;
}

impl<F> DensityField for F
where
  F: Fn(Vec3) -> f32 + Send + Sync,
{
  #[inline]
  fn density(&self, position: Vec3) -> f32 {
    self(position)
  }
}

/// Terrain built from a height gradient plus fractal Perlin noise.
///
/// ```text
/// density = (y - base_height) * height_gradient + fbm(p * frequency + offset) * amplitude
/// ```
#[derive(Clone)]
pub struct NoiseTerrain {
  /// Ground level in world units, before noise modulation.
  pub base_height: f32,
  /// Strength of the vertical gradient. Zero gives pure volumetric noise.
  pub height_gradient: f32,
  /// Noise amplitude in density units.
  pub amplitude: f32,
  /// Base noise frequency (inverse feature size).
  pub frequency: f32,
  /// Domain offset applied before sampling.
  pub offset: Vec3,
  /// Fractal octave count.
  pub octaves: u32,
  /// Frequency multiplier per octave.
  pub lacunarity: f32,
  /// Amplitude multiplier per octave.
  pub persistence: f32,
  seed: u32,
  perlin: Perlin,
}

impl Default for NoiseTerrain {
  fn default() -> Self {
    Self::new(1337)
  }
}

impl NoiseTerrain {
  pub fn new(seed: u32) -> Self {
    Self {
      base_height: 0.0,
      height_gradient: 1.0,
      amplitude: 8.0,
      frequency: 0.02,
      offset: Vec3::ZERO,
      octaves: 4,
      lacunarity: 2.0,
      persistence: 0.5,
      seed,
      perlin: Perlin::new(seed),
    }
  }

  pub fn seed(&self) -> u32 {
    self.seed
  }

  pub fn with_base_height(mut self, base_height: f32) -> Self {
    self.base_height = base_height;
    self
  }

  pub fn with_height_gradient(mut self, height_gradient: f32) -> Self {
    self.height_gradient = height_gradient;
    self
  }

  pub fn with_amplitude(mut self, amplitude: f32) -> Self {
    self.amplitude = amplitude;
    self
  }

  pub fn with_frequency(mut self, frequency: f32) -> Self {
    self.frequency = frequency;
    self
  }

  pub fn with_offset(mut self, offset: Vec3) -> Self {
    self.offset = offset;
    self
  }

  pub fn with_octaves(mut self, octaves: u32) -> Self {
    self.octaves = octaves;
    self
  }

  fn fbm(&self, p: Vec3) -> f32 {
    let mut sum = 0.0f64;
    let mut amp = 1.0f64;
    let mut freq = 1.0f64;
    let (x, y, z) = (p.x as f64, p.y as f64, p.z as f64);

    for _ in 0..self.octaves.max(1) {
      sum += self.perlin.get([x * freq, y * freq, z * freq]) * amp;
      freq *= self.lacunarity as f64;
      amp *= self.persistence as f64;
    }

    sum as f32
  }
}

impl DensityField for NoiseTerrain {
  #[inline]
  fn density(&self, position: Vec3) -> f32 {
    let gradient = (position.y - self.base_height) * self.height_gradient;
    let noise = self.fbm(position * self.frequency + self.offset);
    gradient + noise * self.amplitude
  }
}

/// Sphere field: negative inside, zero on the shell.
#[derive(Clone, Copy, Debug)]
pub struct SphereField {
  pub center: Vec3,
  pub radius: f32,
}

impl SphereField {
  pub fn new(center: Vec3, radius: f32) -> Self {
    Self { center, radius }
  }
}

impl DensityField for SphereField {
  #[inline]
  fn density(&self, position: Vec3) -> f32 {
    position.distance(self.center) - self.radius
  }
}

/// Horizontal ground plane at `height`: solid below, air above.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaneField {
  pub height: f32,
}

impl PlaneField {
  pub fn new(height: f32) -> Self {
    Self { height }
  }
}

impl DensityField for PlaneField {
  #[inline]
  fn density(&self, position: Vec3) -> f32 {
    position.y - self.height
  }
}

#[cfg(test)]
#[path = "density_test.rs"]
mod density_test;

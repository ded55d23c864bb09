//! Configuration parsing for the terrain streaming driver.

use anyhow::{Context, Result};
use glam::{IVec3, Vec3};
use serde::Deserialize;
use std::path::Path;
use voxel_terrain::{
	Dispatch, ExtractConfig, ExtractorKind, NoiseTerrain, NormalMode, SliceBudget, StreamConfig,
};

/// Root configuration: one `[stream]` and one `[noise]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	#[serde(default)]
	pub stream: StreamSection,
	#[serde(default)]
	pub noise: NoiseSection,
}

/// Streaming and extraction settings.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamSection {
	/// Cells per chunk axis per LOD, finest first.
	pub lod_resolutions: Vec<usize>,
	/// Chunk edge length in world units.
	pub chunk_size: f32,
	/// Chunks per batch edge.
	pub batch_cube_size: u32,
	/// Load distance in chunks per axis.
	pub load_distance: [i32; 3],
	/// Slice budget in milliseconds.
	pub time_budget_ms: u64,
	pub extractor: ExtractorChoice,
	pub surface_level: f32,
	pub normal_mode: NormalChoice,
	/// Run kernels on the calling thread.
	pub sequential: bool,
}

impl Default for StreamSection {
	fn default() -> Self {
		let defaults = StreamConfig::default();
		Self {
			lod_resolutions: defaults.lod_resolutions,
			chunk_size: defaults.chunk_size,
			batch_cube_size: defaults.batch_cube_size,
			load_distance: defaults.load_distance.to_array(),
			time_budget_ms: defaults.time_budget.max_time.as_millis() as u64,
			extractor: ExtractorChoice::MarchingCubes,
			surface_level: defaults.extract.surface_level,
			normal_mode: NormalChoice::Gradient,
			sequential: false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorChoice {
	MarchingCubes,
	DualContouring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalChoice {
	Gradient,
	Geometry,
}

/// Noise terrain parameters.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseSection {
	pub seed: u32,
	pub base_height: f32,
	pub height_gradient: f32,
	pub amplitude: f32,
	pub frequency: f32,
	pub offset: [f32; 3],
	pub octaves: u32,
}

impl Default for NoiseSection {
	fn default() -> Self {
		let defaults = NoiseTerrain::default();
		Self {
			seed: defaults.seed(),
			base_height: defaults.base_height,
			height_gradient: defaults.height_gradient,
			amplitude: defaults.amplitude,
			frequency: defaults.frequency,
			offset: defaults.offset.to_array(),
			octaves: defaults.octaves,
		}
	}
}

impl Config {
	/// Load and validate configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content)
	}

	/// Parse and validate configuration text.
	pub fn parse(content: &str) -> Result<Self> {
		let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
		config
			.stream_config()
			.validate()
			.context("Invalid [stream] configuration")?;
		Ok(config)
	}

	/// Library streaming configuration.
	pub fn stream_config(&self) -> StreamConfig {
		let s = &self.stream;
		let extractor = match s.extractor {
			ExtractorChoice::MarchingCubes => ExtractorKind::MarchingCubes,
			ExtractorChoice::DualContouring => ExtractorKind::DualContouring,
		};
		let normal_mode = match s.normal_mode {
			NormalChoice::Gradient => NormalMode::Gradient,
			NormalChoice::Geometry => NormalMode::Geometry,
		};
		let dispatch = if s.sequential {
			Dispatch::Sequential
		} else {
			Dispatch::Parallel
		};

		StreamConfig::default()
			.with_lod_resolutions(s.lod_resolutions.clone())
			.with_chunk_size(s.chunk_size)
			.with_batch_cube_size(s.batch_cube_size)
			.with_load_distance(IVec3::from_array(s.load_distance))
			.with_time_budget(SliceBudget::from_millis(s.time_budget_ms))
			.with_extractor(extractor)
			.with_extract(
				ExtractConfig::default()
					.with_surface_level(s.surface_level)
					.with_normal_mode(normal_mode)
					.with_dispatch(dispatch),
			)
	}

	/// Density field described by `[noise]`.
	pub fn terrain(&self) -> NoiseTerrain {
		let n = &self.noise;
		NoiseTerrain::new(n.seed)
			.with_base_height(n.base_height)
			.with_height_gradient(n.height_gradient)
			.with_amplitude(n.amplitude)
			.with_frequency(n.frequency)
			.with_offset(Vec3::from_array(n.offset))
			.with_octaves(n.octaves)
	}
}

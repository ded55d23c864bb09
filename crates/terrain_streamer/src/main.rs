//! Headless terrain streaming driver.
//!
//! Moves a simulated viewer along +X over noise terrain, advancing the chunk
//! streamer one time slice per frame, and logs what a renderer would upload.
//!
//! ```text
//! stream_terrain --config terrain.toml --frames 600 --speed 4
//! RUST_LOG=voxel_terrain=debug stream_terrain --config terrain.toml
//! ```

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use voxel_terrain::{ChunkStreamer, SliceOutcome, StreamEvent};

use config::Config;

/// Stream voxel terrain around a moving viewer without a renderer.
#[derive(Parser, Debug)]
#[command(name = "stream_terrain")]
#[command(about = "Streams LOD voxel terrain around a simulated viewer")]
struct Args {
	/// Path to configuration TOML file.
	#[arg(short, long)]
	config: PathBuf,

	/// Frames to simulate.
	#[arg(short, long, default_value_t = 600)]
	frames: usize,

	/// Viewer speed in world units per frame.
	#[arg(short, long, default_value_t = 4.0)]
	speed: f32,

	/// Finish the pass still running after the last frame.
	#[arg(long)]
	drain: bool,
}

#[derive(Debug, Default)]
struct EventTally {
	created: usize,
	regenerated: usize,
	activated: usize,
	deactivated: usize,
	batches_sealed: usize,
}

impl EventTally {
	fn record(&mut self, event: &StreamEvent) {
		match event {
			StreamEvent::ChunkCreated { .. } => self.created += 1,
			StreamEvent::ChunkRegenerated { .. } => self.regenerated += 1,
			StreamEvent::ChunkActivated(_) => self.activated += 1,
			StreamEvent::ChunkDeactivated(_) => self.deactivated += 1,
			StreamEvent::BatchSealed(_) => self.batches_sealed += 1,
			StreamEvent::Reset => *self = Self::default(),
		}
	}
}

fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();
	tracing::info!(config = %args.config.display(), "loading config");

	let config = Config::load(&args.config)?;
	let stream_config = config.stream_config();
	let budget = stream_config.time_budget;

	let mut streamer =
		ChunkStreamer::new(stream_config, config.terrain()).context("Failed to create chunk streamer")?;

	let mut tally = EventTally::default();
	let mut viewer = Vec3::ZERO;
	let mut yielded_frames = 0usize;

	streamer.on_viewer_moved(viewer);

	for frame in 0..args.frames {
		viewer.x += args.speed;
		streamer.on_viewer_moved(viewer);

		let outcome = streamer
			.advance_one_time_slice(budget)
			.with_context(|| format!("Streaming failed at frame {}", frame))?;
		if outcome == SliceOutcome::Yielded {
			yielded_frames += 1;
		}

		for event in streamer.drain_events() {
			tally.record(&event);
		}
	}

	if args.drain && streamer.is_streaming() {
		streamer.run_to_completion().context("Failed to finish final pass")?;
		for event in streamer.drain_events() {
			tally.record(&event);
		}
	}

	let stats = streamer.stats();
	let metrics = streamer.metrics();
	tracing::info!(
		frames = args.frames,
		viewer_x = viewer.x,
		yielded_frames,
		passes = stats.passes_completed,
		restarts = stats.restarts,
		"simulation finished"
	);
	tracing::info!(
		total = streamer.chunk_count(),
		active = metrics.active_chunks(),
		created = tally.created,
		regenerated = tally.regenerated,
		activated = tally.activated,
		deactivated = tally.deactivated,
		batches_sealed = tally.batches_sealed,
		"chunks"
	);
	tracing::info!(
		vertices = metrics.active_vertices(),
		triangles = metrics.active_triangles(),
		avg_mesh_us = metrics.avg_mesh_timing_us().round(),
		last_mesh_us = metrics.last_mesh_us,
		"geometry"
	);

	for (lod, count) in metrics.chunks_per_lod.iter().enumerate().filter(|(_, count)| **count > 0) {
		tracing::info!(lod, chunks = count, triangles = metrics.triangles_per_lod[lod], "lod");
	}

	Ok(())
}

//! Benchmarks for chunk extraction - sampling, marching cubes, dual contouring.
//!
//! Every extractor benchmark meshes the same pre-sampled noise terrain chunk
//! so the numbers compare algorithms, not density evaluation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::{IVec3, Vec3};
use voxel_terrain::{
	ChunkStreamer, DensityGrid, Dispatch, DualContouring, ExtractConfig, MarchingCubes, NoiseTerrain, OctreeCollapser,
	SliceBudget, SliceOutcome, StreamConfig, SurfaceExtractor,
};

const RESOLUTIONS: [usize; 3] = [16, 32, 64];

fn terrain() -> NoiseTerrain {
	NoiseTerrain::new(42).with_base_height(16.0).with_amplitude(12.0)
}

fn terrain_grid(resolution: usize) -> DensityGrid {
	let voxel_size = 32.0 / resolution as f32;
	DensityGrid::sample(&terrain(), Vec3::ZERO, voxel_size, resolution).unwrap()
}

// ============================================================================
// Sampling
// ============================================================================

fn bench_sample(c: &mut Criterion) {
	let mut group = c.benchmark_group("sample_noise_terrain");
	let field = terrain();

	for resolution in RESOLUTIONS {
		let samples = (resolution + 3).pow(3);
		group.throughput(Throughput::Elements(samples as u64));
		group.bench_with_input(BenchmarkId::from_parameter(resolution), &resolution, |b, &n| {
			b.iter(|| black_box(DensityGrid::sample(&field, Vec3::ZERO, 32.0 / n as f32, n).unwrap()))
		});
	}

	group.finish();
}

// ============================================================================
// Extractors
// ============================================================================

fn bench_marching_cubes(c: &mut Criterion) {
	let mut group = c.benchmark_group("marching_cubes");

	for resolution in RESOLUTIONS {
		let grid = terrain_grid(resolution);
		let mut mc = MarchingCubes::new(resolution);
		let config = ExtractConfig::default();

		group.throughput(Throughput::Elements(resolution.pow(3) as u64));
		group.bench_with_input(BenchmarkId::from_parameter(resolution), &grid, |b, grid| {
			b.iter(|| black_box(mc.extract(grid, &config).unwrap()))
		});
	}

	group.finish();
}

fn bench_dual_contouring(c: &mut Criterion) {
	let mut group = c.benchmark_group("dual_contouring");

	for resolution in RESOLUTIONS {
		let grid = terrain_grid(resolution);
		let mut dc = DualContouring::new(resolution);
		let config = ExtractConfig::default();

		group.throughput(Throughput::Elements(resolution.pow(3) as u64));
		group.bench_with_input(BenchmarkId::from_parameter(resolution), &grid, |b, grid| {
			b.iter(|| black_box(dc.extract(grid, &config).unwrap()))
		});
	}

	group.finish();
}

fn bench_octree_collapse(c: &mut Criterion) {
	let mut group = c.benchmark_group("octree_collapse");

	for resolution in RESOLUTIONS {
		let grid = terrain_grid(resolution);
		let mut collapser = OctreeCollapser::new(resolution);

		group.bench_with_input(BenchmarkId::from_parameter(resolution), &grid, |b, grid| {
			b.iter(|| black_box(collapser.collapse(grid, 0.0)))
		});
	}

	group.finish();
}

/// Parallel versus in-order kernel dispatch on a 32³ chunk.
fn bench_dispatch(c: &mut Criterion) {
	let mut group = c.benchmark_group("dispatch_32");
	let grid = terrain_grid(32);
	let mut mc = MarchingCubes::new(32);

	for (name, dispatch) in [("parallel", Dispatch::Parallel), ("sequential", Dispatch::Sequential)] {
		let config = ExtractConfig::default().with_dispatch(dispatch);
		group.bench_function(name, |b| b.iter(|| black_box(mc.extract(&grid, &config).unwrap())));
	}

	group.finish();
}

// ============================================================================
// Streaming
// ============================================================================

/// Full initial load of a small view.
fn bench_stream_pass(c: &mut Criterion) {
	let config = StreamConfig::default()
		.with_lod_resolutions([16, 8])
		.with_chunk_size(32.0)
		.with_load_distance(IVec3::new(2, 1, 2));

	c.bench_function("stream_initial_pass", |b| {
		b.iter(|| {
			let mut streamer = ChunkStreamer::new(config.clone(), terrain()).unwrap();
			streamer.request_pass();
			while streamer.advance_one_time_slice(SliceBudget::UNLIMITED).unwrap() != SliceOutcome::Completed {}
			black_box(streamer.chunk_count())
		})
	});
}

criterion_group!(
	benches,
	bench_sample,
	bench_marching_cubes,
	bench_dual_contouring,
	bench_octree_collapse,
	bench_dispatch,
	bench_stream_pass,
);
criterion_main!(benches);

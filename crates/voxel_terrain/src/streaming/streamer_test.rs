use glam::IVec3;

use super::*;
use crate::density::PlaneField;
use crate::error::ConfigError;
use crate::types::ExtractorKind;

/// Ground plane crossing the y = 0 chunk row.
fn field() -> PlaneField {
  PlaneField::new(3.0)
}

fn config() -> StreamConfig {
  StreamConfig::default()
    .with_lod_resolutions([8, 4])
    .with_chunk_size(10.0)
    .with_batch_cube_size(3)
    .with_load_distance(IVec3::ONE)
}

fn streamer(config: StreamConfig) -> ChunkStreamer<PlaneField> {
  ChunkStreamer::new(config, field()).unwrap()
}

fn cube(range: std::ops::RangeInclusive<i32>, x_offset: i32) -> HashSet<ChunkCoord> {
  let mut out = HashSet::new();
  for x in range.clone() {
    for y in range.clone() {
      for z in range.clone() {
        out.insert(ChunkCoord::new(x + x_offset, y, z));
      }
    }
  }
  out
}

/// Drive the running pass with one chunk per slice. Returns the yield count.
fn step_to_completion<F: DensityField>(streamer: &mut ChunkStreamer<F>) -> usize {
  let mut yields = 0;
  loop {
    match streamer.advance_one_time_slice(SliceBudget::SINGLE_STEP).unwrap() {
      SliceOutcome::Yielded => yields += 1,
      SliceOutcome::Completed | SliceOutcome::Idle => return yields,
    }
  }
}

fn count<P: Fn(&StreamEvent) -> bool>(events: &[StreamEvent], predicate: P) -> usize {
  events.iter().filter(|e| predicate(e)).count()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_invalid_config_is_rejected() {
  let result = ChunkStreamer::new(config().with_lod_resolutions([4, 8]), field());
  assert!(matches!(
    result,
    Err(StreamError::Config(ConfigError::UnorderedLods { .. }))
  ));
}

#[test]
fn test_advance_while_idle() {
  let mut s = streamer(config());
  assert_eq!(s.advance_one_time_slice(SliceBudget::UNLIMITED).unwrap(), SliceOutcome::Idle);
  assert_eq!(s.chunk_count(), 0);
}

// =============================================================================
// Scenario: 27 chunks around the origin
// =============================================================================

#[test]
fn test_visits_the_27_surrounding_chunks() {
  let mut s = streamer(config());
  s.on_viewer_moved(Vec3::ZERO);
  assert!(s.is_streaming());

  s.run_to_completion().unwrap();

  let expected = cube(-1..=1, 0);
  assert_eq!(s.visible(), &expected);
  assert_eq!(s.chunk_count(), 27);
  assert_eq!(s.state(), StreamState::Idle);

  let events = s.drain_events();
  assert_eq!(count(&events, |e| matches!(e, StreamEvent::ChunkCreated { .. })), 27);

  // World positions are multiples of the chunk size
  let corner = s.chunk(ChunkCoord::new(-1, -1, -1)).unwrap();
  assert_eq!(corner.world_position(), Vec3::splat(-10.0));
}

#[test]
fn test_lod_by_distance() {
  let mut s = streamer(config());
  s.run_to_completion().unwrap();

  for chunk in s.chunks() {
    let expected = if chunk.coord == ChunkCoord::ORIGIN { 0 } else { 1 };
    assert_eq!(chunk.lod, expected, "{:?}", chunk.coord);
    assert_eq!(chunk.resolution, [8, 4][expected]);
    assert_eq!(chunk.scale(), 10.0 / chunk.resolution as f32);
  }
}

#[test]
fn test_single_step_slices() {
  let mut s = streamer(config());
  s.request_pass();

  // One chunk per slice, then one more slice to notice the empty frontier
  assert_eq!(step_to_completion(&mut s), 27);
  assert_eq!(s.stats().slices_yielded, 27);
  assert_eq!(s.stats().chunks_visited, 27);
}

#[test]
fn test_yield_keeps_frontier() {
  let mut s = streamer(config());
  s.request_pass();

  assert_eq!(s.advance_one_time_slice(SliceBudget::SINGLE_STEP).unwrap(), SliceOutcome::Yielded);
  assert_eq!(s.chunk_count(), 1);
  assert_eq!(s.frontier_len(), 26);
  assert!(s.is_streaming());

  assert_eq!(s.advance_one_time_slice(SliceBudget::UNLIMITED).unwrap(), SliceOutcome::Completed);
  assert_eq!(s.chunk_count(), 27);
}

// =============================================================================
// Edge cases
// =============================================================================

#[test]
fn test_zero_load_distance_completes_immediately() {
  let mut s = streamer(config().with_load_distance(IVec3::new(1, 0, 1)));
  s.request_pass();

  assert_eq!(s.advance_one_time_slice(SliceBudget::SINGLE_STEP).unwrap(), SliceOutcome::Completed);
  assert_eq!(s.chunk_count(), 0);
  assert!(s.drain_events().is_empty());
}

#[test]
fn test_degenerate_chunks_are_still_tracked() {
  let mut s = streamer(config());
  s.run_to_completion().unwrap();

  // Entirely below and entirely above the plane
  for y in [-1, 1] {
    let chunk = s.chunk(ChunkCoord::new(0, y, 0)).unwrap();
    assert!(!chunk.is_renderable());
    assert!(chunk.mesh.is_well_formed());
  }
  assert!(s.chunk(ChunkCoord::ORIGIN).unwrap().is_renderable());

  // Revisiting does not mesh them again
  s.request_pass();
  s.run_to_completion().unwrap();
  assert_eq!(s.stats().meshes_generated(), 27);
}

// =============================================================================
// Idempotence and movement
// =============================================================================

#[test]
fn test_second_pass_with_unmoved_viewer_changes_nothing() {
  let mut s = streamer(config());
  s.run_to_completion().unwrap();
  let first = s.visible().clone();
  s.drain_events();

  s.request_pass();
  s.run_to_completion().unwrap();

  assert_eq!(s.visible(), &first);
  assert!(s.drain_events().is_empty());
  assert_eq!(s.stats().chunks_regenerated, 0);
  assert_eq!(s.stats().passes_completed, 2);
  assert!(s.chunks().all(|c| c.active));
}

#[test]
fn test_small_moves_do_not_start_a_pass() {
  let mut s = streamer(config());
  s.on_viewer_moved(Vec3::ZERO);
  s.run_to_completion().unwrap();

  s.on_viewer_moved(Vec3::new(9.9, 0.0, 0.0));
  assert!(!s.is_streaming());
  assert_eq!(s.stats().passes_started, 1);

  // Exactly one chunk size away triggers
  s.on_viewer_moved(Vec3::new(10.0, 0.0, 0.0));
  assert!(s.is_streaming());
  assert_eq!(s.stats().passes_started, 2);
}

#[test]
fn test_moving_away_hides_and_returning_reactivates() {
  let mut s = streamer(config());
  s.run_to_completion().unwrap();
  s.drain_events();

  s.on_viewer_moved(Vec3::new(1000.0, 0.0, 0.0));
  s.run_to_completion().unwrap();

  let events = s.drain_events();
  assert_eq!(count(&events, |e| matches!(e, StreamEvent::ChunkDeactivated(_))), 27);
  assert_eq!(count(&events, |e| matches!(e, StreamEvent::ChunkCreated { .. })), 27);
  assert_eq!(s.chunk_count(), 54);
  assert_eq!(s.metrics().active_chunks(), 27);

  s.on_viewer_moved(Vec3::ZERO);
  s.run_to_completion().unwrap();

  let events = s.drain_events();
  assert_eq!(count(&events, |e| matches!(e, StreamEvent::ChunkActivated(_))), 27);
  assert_eq!(count(&events, |e| matches!(e, StreamEvent::ChunkCreated { .. })), 0);
  assert_eq!(s.stats().chunks_activated, 27);
  assert_eq!(s.metrics().active_chunks(), 27);
}

#[test]
fn test_lod_only_refines() {
  let mut s = streamer(config());
  let target = ChunkCoord::new(1, 0, 0);
  s.run_to_completion().unwrap();
  assert_eq!(s.chunk(target).unwrap().lod, 1);
  s.drain_events();

  // Viewer now sits on the target chunk
  s.on_viewer_moved(Vec3::new(10.0, 0.0, 0.0));
  s.run_to_completion().unwrap();

  let chunk = s.chunk(target).unwrap();
  assert_eq!(chunk.lod, 0);
  assert_eq!(chunk.resolution, 8);
  assert_eq!(chunk.scale(), 1.25);
  assert!(s.drain_events().contains(&StreamEvent::ChunkRegenerated {
    coord: target,
    from_lod: 1,
    to_lod: 0,
  }));

  // Backing off keeps the finer mesh
  s.on_viewer_moved(Vec3::ZERO);
  s.run_to_completion().unwrap();

  assert_eq!(s.chunk(target).unwrap().lod, 0);
  assert!(!s
    .drain_events()
    .iter()
    .any(|e| matches!(e, StreamEvent::ChunkRegenerated { .. })));
}

// =============================================================================
// Restart coalescing
// =============================================================================

#[test]
fn test_restart_coalesces_rapid_moves() {
  let mut s = streamer(config());
  s.run_to_completion().unwrap();
  s.drain_events();

  // Second pass starts, visits its seed, then the viewer moves on twice
  s.on_viewer_moved(Vec3::new(10.0, 0.0, 0.0));
  assert_eq!(s.advance_one_time_slice(SliceBudget::SINGLE_STEP).unwrap(), SliceOutcome::Yielded);

  s.on_viewer_moved(Vec3::new(20.0, 0.0, 0.0));
  s.on_viewer_moved(Vec3::new(20.0, 0.0, 0.0));
  assert!(s.restart_requested());

  step_to_completion(&mut s);

  let stats = *s.stats();
  assert_eq!(stats.restarts, 1);
  assert_eq!(stats.passes_started, 3);
  assert_eq!(stats.passes_completed, 2);
  assert!(!s.restart_requested());
  assert!(!s.is_streaming());

  // Final view around x = 20
  let expected = cube(-1..=1, 2);
  assert_eq!(s.visible(), &expected);

  // Chunks still in view were never hidden; only x = -1 and x = 0 were
  let events = s.drain_events();
  let mut hidden: Vec<ChunkCoord> = events
    .iter()
    .filter_map(|e| match e {
      StreamEvent::ChunkDeactivated(c) => Some(*c),
      _ => None,
    })
    .collect();
  hidden.sort();
  let mut expected_hidden: Vec<ChunkCoord> = cube(-1..=1, 0).into_iter().filter(|c| c.x < 1).collect();
  expected_hidden.sort();
  assert_eq!(hidden, expected_hidden);

  for chunk in s.chunks() {
    assert_eq!(chunk.active, expected.contains(&chunk.coord), "{:?}", chunk.coord);
  }
  assert_eq!(s.metrics().active_chunks(), 27);
}

#[test]
fn test_move_after_last_visit_still_streams() {
  let mut s = streamer(config());
  s.request_pass();

  // Every chunk visited, but the empty frontier is not yet noticed
  for _ in 0..27 {
    assert_eq!(s.advance_one_time_slice(SliceBudget::SINGLE_STEP).unwrap(), SliceOutcome::Yielded);
  }
  assert_eq!(s.frontier_len(), 0);
  assert!(s.is_streaming());

  s.on_viewer_moved(Vec3::new(20.0, 0.0, 0.0));
  assert!(s.restart_requested());

  step_to_completion(&mut s);

  let stats = *s.stats();
  assert_eq!(stats.restarts, 1);
  assert_eq!(stats.passes_started, 2);
  assert_eq!(stats.passes_completed, 1);
  assert!(!s.restart_requested());
  assert!(!s.is_streaming());
  assert_eq!(s.visible(), &cube(-1..=1, 2));
  assert!(s.chunk(ChunkCoord::new(3, 0, 0)).is_some_and(|c| c.active));

  // A later pass is not mistaken for a restart
  s.request_pass();
  s.run_to_completion().unwrap();
  assert_eq!(s.stats().restarts, 1);
  assert_eq!(s.stats().passes_started, 3);
}

#[test]
fn test_restart_requested_only_while_streaming() {
  let mut s = streamer(config());
  s.request_pass();
  s.request_pass();
  assert!(s.restart_requested());
  assert_eq!(s.stats().passes_started, 1);

  s.run_to_completion().unwrap();
  assert_eq!(s.stats().restarts, 1);
  assert_eq!(s.stats().passes_started, 2);
  assert_eq!(s.chunk_count(), 27);
}

// =============================================================================
// Batches
// =============================================================================

#[test]
fn test_full_batch_seals_once() {
  // Batch (0,0,0) of size 2 holds chunks {0,1}^3, all inside the view
  let mut s = streamer(config().with_batch_cube_size(2));
  s.run_to_completion().unwrap();

  let events = s.drain_events();
  let sealed: Vec<&StreamEvent> = events
    .iter()
    .filter(|e| matches!(e, StreamEvent::BatchSealed(_)))
    .collect();
  assert_eq!(sealed, vec![&StreamEvent::BatchSealed(BatchKey(IVec3::ZERO))]);

  // BatchSealed follows the ChunkCreated of the last member
  let at = events
    .iter()
    .position(|e| matches!(e, StreamEvent::BatchSealed(_)))
    .unwrap();
  assert!(matches!(events[at - 1], StreamEvent::ChunkCreated { .. }));

  s.request_pass();
  s.run_to_completion().unwrap();
  assert_eq!(s.stats().batches_sealed, 1);
  assert_eq!(s.batches().len(), 8);
}

#[test]
fn test_chunk_records_its_batch() {
  let mut s = streamer(config().with_batch_cube_size(2));
  s.run_to_completion().unwrap();

  let chunk = s.chunk(ChunkCoord::new(-1, 0, 1)).unwrap();
  assert_eq!(chunk.batch, BatchKey(IVec3::new(-1, 0, 0)));
  let batch = s.batches().get(chunk.batch).unwrap();
  assert!(batch.members.contains(&chunk.coord));
}

// =============================================================================
// Reload and extractors
// =============================================================================

#[test]
fn test_reload_immediate_rebuilds_everything() {
  let mut s = streamer(config());
  s.run_to_completion().unwrap();
  s.drain_events();

  s.reload_immediate().unwrap();

  let events = s.drain_events();
  assert_eq!(events.first(), Some(&StreamEvent::Reset));
  assert_eq!(count(&events, |e| matches!(e, StreamEvent::ChunkCreated { .. })), 27);
  assert_eq!(s.chunk_count(), 27);
  assert_eq!(s.metrics().active_chunks(), 27);
  assert!(!s.is_streaming());
}

#[test]
fn test_dual_contouring_streamer_reports_octree() {
  let mut s = streamer(config().with_extractor(ExtractorKind::DualContouring));
  s.run_to_completion().unwrap();

  let center = s.chunk(ChunkCoord::ORIGIN).unwrap();
  assert!(center.is_renderable());
  let leaves = center.packed_leaves.unwrap();
  assert!(leaves > 0 && leaves < 8 * 8 * 8);

  // Degenerate chunks carry no octree
  assert_eq!(s.chunk(ChunkCoord::new(0, 1, 0)).unwrap().packed_leaves, None);
}

#[test]
fn test_metrics_follow_meshes() {
  let mut s = streamer(config());
  s.run_to_completion().unwrap();

  let triangles: u64 = s.chunks().map(|c| c.mesh.triangle_count() as u64).sum();
  assert_eq!(s.metrics().active_triangles(), triangles);
  assert_eq!(s.metrics().total_meshes_generated, 27);
  assert_eq!(s.metrics().chunks_per_lod[0], 1);
  assert_eq!(s.metrics().chunks_per_lod[1], 26);
}

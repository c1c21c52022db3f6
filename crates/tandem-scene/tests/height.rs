use std::time::{Duration, Instant};

use tandem_base::{HeightConfig, ModelId};
use tandem_geometry::{Vec3, assert_near};
use tandem_scene::{HeightAdjuster, HeightDirection, ModelTransform, TransformStore};

fn store_with(id: ModelId, position: Vec3) -> TransformStore {
    let mut store = TransformStore::new();
    store.insert(id, ModelTransform::at(position));
    store
}

#[test]
fn hold_rate_follows_wall_clock_not_frames() {
    let id = ModelId::new();
    let store = store_with(id, Vec3::new(2.0, 0.0, -3.0));
    let t0 = Instant::now();

    let mut coarse = HeightAdjuster::new(HeightConfig::default());
    coarse.press(id, HeightDirection::Up, &ModelTransform::default(), t0);
    let coarse_y = coarse
        .tick(t0 + Duration::from_millis(1000), &store)
        .and_then(|(_, patch)| patch.position)
        .map(|p| p.y);

    let mut fine = HeightAdjuster::new(HeightConfig::default());
    fine.press(id, HeightDirection::Up, &ModelTransform::default(), t0);
    let mut fine_y = None;
    for ms in (100..=1000).step_by(100) {
        if let Some((_, patch)) = fine.tick(t0 + Duration::from_millis(ms), &store) {
            fine_y = patch.position.map(|p| p.y);
        }
    }

    assert_near!(coarse_y.unwrap_or_default(), 1.5);
    assert_near!(fine_y.unwrap_or_default(), 1.5);
}

#[test]
fn hold_keeps_x_and_z_from_store() {
    let id = ModelId::new();
    let store = store_with(id, Vec3::new(2.0, 0.0, -3.0));
    let t0 = Instant::now();
    let mut height = HeightAdjuster::new(HeightConfig::default());
    height.press(id, HeightDirection::Up, &ModelTransform::default(), t0);
    let patch = height.tick(t0 + Duration::from_millis(500), &store).map(|(_, patch)| patch);
    assert_near!(
        patch.and_then(|patch| patch.position).unwrap_or(Vec3::new(0.0, 0.0, 0.0)),
        Vec3::new(2.0, 0.75, -3.0)
    );
}

#[test]
fn lowering_stops_at_ground_and_raising_at_ceiling() {
    let id = ModelId::new();
    let store = store_with(id, Vec3::new(0.0, 0.3, 0.0));
    let t0 = Instant::now();
    let config = HeightConfig {
        max_height: Some(1.0),
        ..HeightConfig::default()
    };
    let mut height = HeightAdjuster::new(config);

    height.press(id, HeightDirection::Down, &ModelTransform::at(Vec3::new(0.0, 0.3, 0.0)), t0);
    let landed = height.tick(t0 + Duration::from_secs(1), &store);
    assert_eq!(landed.and_then(|(_, p)| p.position).map(|p| p.y), Some(0.0));
    // Already on the ground: nothing to persist.
    assert!(height.tick(t0 + Duration::from_secs(2), &store).is_none());
    assert!(height.is_active());

    height.press(id, HeightDirection::Up, &ModelTransform::at(Vec3::new(0.0, 0.3, 0.0)), t0);
    let capped = height.tick(t0 + Duration::from_secs(5), &store);
    assert_eq!(capped.and_then(|(_, p)| p.position).map(|p| p.y), Some(1.0));
}

#[test]
fn every_stop_path_clears_the_hold() {
    let id = ModelId::new();
    let store = store_with(id, Vec3::new(0.0, 0.0, 0.0));
    let t0 = Instant::now();
    let mut height = HeightAdjuster::new(HeightConfig::default());

    let stops: [fn(&mut HeightAdjuster) -> bool; 3] = [
        HeightAdjuster::release,
        HeightAdjuster::pointer_leave,
        HeightAdjuster::teardown,
    ];
    for stop in stops {
        height.press(id, HeightDirection::Up, &ModelTransform::default(), t0);
        assert_eq!(height.active_model(), Some(id));
        assert!(stop(&mut height));
        assert!(!height.is_active());
        assert!(height.tick(t0 + Duration::from_secs(1), &store).is_none());
        assert!(!stop(&mut height));
    }
}

#[test]
fn removed_model_ends_the_hold() {
    let id = ModelId::new();
    let store = TransformStore::new();
    let mut height = HeightAdjuster::new(HeightConfig::default());
    let t0 = Instant::now();
    height.press(id, HeightDirection::Up, &ModelTransform::default(), t0);
    assert!(height.tick(t0 + Duration::from_secs(1), &store).is_none());
    assert!(!height.is_active());
}

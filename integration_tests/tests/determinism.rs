mod common;

use radar_core::RadarState;
use radar_schema::{sample_items, Position};

fn positions(seed: u64) -> Vec<(i64, Position)> {
    let config = common::test_config();
    let state = RadarState::new(config, sample_items(), seed);
    state
        .placed_items()
        .iter()
        .map(|item| (item.id, item.position.expect("placed")))
        .collect()
}

#[test]
fn same_seed_yields_identical_layouts() {
    assert_eq!(positions(42), positions(42));
}

#[test]
fn different_seeds_move_items() {
    assert_ne!(positions(1), positions(2));
}

#[test]
fn rendering_does_not_reshuffle_positions() {
    let config = common::test_config();
    let mut state = RadarState::new(config, sample_items(), 9);
    let before = state.placed_items().to_vec();

    state.set_title("Renamed radar");
    state.hover_bubble(before[0].id, 10.0, 10.0);
    state.leave_bubble();
    let _ = state.scene(640.0);

    assert_eq!(state.placed_items(), before.as_slice());
}

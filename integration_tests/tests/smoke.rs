mod common;

use radar_core::{polar_of, RadarState};
use radar_schema::sample_items;

#[test]
fn sample_radar_places_every_item_in_its_wedge_and_band() {
    let config = common::test_config();
    let state = RadarState::new(config.clone(), sample_items(), config.seed);

    assert_eq!(state.placed_items().len(), sample_items().len());
    for item in state.placed_items() {
        let position = item.position.expect("placed item has a position");
        let (angle, radius) = polar_of(&position);
        let [min_angle, max_angle] = config.category(item.category).angle_range;
        let [min_radius, max_radius] = config.impact(item.impact).radius_range;
        assert!(
            angle >= min_angle - 1e-6 && angle < max_angle + 1e-6,
            "item {} angle {angle} outside {min_angle}..{max_angle}",
            item.id
        );
        assert!(
            radius >= min_radius - 1e-6 && radius < max_radius + 1e-6,
            "item {} radius {radius} outside {min_radius}..{max_radius}",
            item.id
        );
    }
}

#[test]
fn scene_has_a_bubble_per_item_and_history_starts_with_initial_data() {
    let config = common::test_config();
    let state = RadarState::new(config.clone(), sample_items(), config.seed);

    let scene = state.scene(800.0);
    assert_eq!(scene.bubbles.len(), state.items().len());

    let checkpoints = state.history().checkpoints();
    assert_eq!(checkpoints.len(), 1);
    assert_eq!(checkpoints[0].name, "Initial data");
    assert_eq!(state.history().active_index(), Some(0));
}

#[test]
fn groups_cover_all_items() {
    let config = common::test_config();
    let state = RadarState::new(config.clone(), sample_items(), config.seed);

    let grouped: usize = state.groups().values().map(Vec::len).sum();
    assert_eq!(grouped, state.items().len());
    for (category, items) in state.groups() {
        assert!(items.iter().all(|item| item.category == *category));
    }
}

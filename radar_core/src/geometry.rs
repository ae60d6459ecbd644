//! Polar placement of items onto the radar.

use rand::Rng;
use radar_schema::{MarketItem, Position};

use crate::config::RadarConfig;

/// Percentage coordinate of the chart center on both axes.
pub const CENTER: f64 = 50.0;

/// Attach a position to every item that lacks one.
///
/// Items that already carry a position are returned unchanged, so calling
/// this repeatedly on its own output is a no-op. The input slice is never
/// modified; the random source is supplied by the caller.
pub fn place<R: Rng + ?Sized>(
    items: &[MarketItem],
    config: &RadarConfig,
    rng: &mut R,
) -> Vec<MarketItem> {
    items
        .iter()
        .map(|item| place_item(item, config, rng))
        .collect()
}

pub fn place_item<R: Rng + ?Sized>(
    item: &MarketItem,
    config: &RadarConfig,
    rng: &mut R,
) -> MarketItem {
    if item.position.is_some() {
        return item.clone();
    }

    let wedge = config.category(item.category).angle_range;
    let band = config.impact(item.impact).radius_range;
    let angle_degrees = sample_half_open(rng, wedge);
    let radius_percent = sample_half_open(rng, band);

    item.clone()
        .with_position(polar_to_position(angle_degrees, radius_percent))
}

/// Screen-space position for a polar coordinate around the chart center.
///
/// Angles grow counter-clockwise while screen `top` grows downwards, hence
/// the subtraction on the vertical axis.
pub fn polar_to_position(angle_degrees: f64, radius_percent: f64) -> Position {
    let radians = angle_degrees.to_radians();
    Position::new(
        CENTER - radius_percent * radians.sin(),
        CENTER + radius_percent * radians.cos(),
    )
}

/// Inverse of [`polar_to_position`]: `(angle in [0, 360), radius)`.
pub fn polar_of(position: &Position) -> (f64, f64) {
    let dx = position.left.value() - CENTER;
    let dy = CENTER - position.top.value();
    let radius = dx.hypot(dy);
    let mut angle = dy.atan2(dx).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    (angle, radius)
}

fn sample_half_open<R: Rng + ?Sized>(rng: &mut R, [min, max]: [f64; 2]) -> f64 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

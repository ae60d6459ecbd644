//! Backend-independent layout of the radar chart.
//!
//! [`RadarScene`] describes everything a front-end has to draw in a square of
//! `side` units with the origin at the top-left corner and `y` growing
//! downwards. The terminal UI and the raster exporter both paint from it, and
//! pointer hit testing runs against the same bubbles.

use radar_schema::{Category, Impact, MarketItem, Rgb};

use crate::config::{Corner, RadarConfig};

/// Ring radii as fractions of the half-side, innermost first.
pub const RING_FRACTIONS: [f64; 3] = [1.0 / 3.0, 2.0 / 3.0, 1.0];

/// Minimum distance of ring labels from the chart's top edge, as a fraction of the side.
const RING_LABEL_INSET: f64 = 0.025;
/// Inset of quadrant labels from their corner, as a fraction of the side.
const QUADRANT_LABEL_INSET: f64 = 0.026;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLine {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub impact: Impact,
    pub radius: f64,
    pub label: String,
    /// Center of the label, on the ring's top edge.
    pub label_at: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadrantLabel {
    pub category: Category,
    pub text: String,
    pub color: Rgb,
    pub corner: Corner,
    /// Corner-side anchor; right-hand labels end here, bottom labels sit above it.
    pub anchor: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub item_id: i64,
    pub label: String,
    pub text: String,
    pub category: Category,
    pub color: Rgb,
    pub center: Point,
    pub radius: f64,
}

impl Bubble {
    pub fn contains(&self, point: Point, slop: f64) -> bool {
        self.center.distance(point) <= self.radius + slop
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarScene {
    pub side: f64,
    pub center: Point,
    pub axes: [AxisLine; 2],
    pub rings: Vec<Ring>,
    pub quadrant_labels: Vec<QuadrantLabel>,
    pub bubbles: Vec<Bubble>,
}

impl RadarScene {
    /// Lay out the chart for already-placed `items`.
    ///
    /// Items without a position are skipped.
    pub fn build(items: &[MarketItem], config: &RadarConfig, side: f64) -> Self {
        let half = side / 2.0;
        let center = Point::new(half, half);
        let axes = [
            AxisLine {
                from: Point::new(0.0, half),
                to: Point::new(side, half),
            },
            AxisLine {
                from: Point::new(half, 0.0),
                to: Point::new(half, side),
            },
        ];

        let rings = Impact::ALL
            .iter()
            .zip(RING_FRACTIONS)
            .map(|(impact, fraction)| {
                let radius = half * fraction;
                let label_y = (half - radius).max(side * RING_LABEL_INSET);
                Ring {
                    impact: *impact,
                    radius,
                    label: config.impact(*impact).label.clone(),
                    label_at: Point::new(half, label_y),
                }
            })
            .collect();

        let inset = side * QUADRANT_LABEL_INSET;
        let quadrant_labels = Category::ALL
            .iter()
            .map(|category| {
                let style = config.category(*category);
                let x = if style.label_corner.is_right() {
                    side - inset
                } else {
                    inset
                };
                let y = if style.label_corner.is_bottom() {
                    side - inset
                } else {
                    inset
                };
                QuadrantLabel {
                    category: *category,
                    text: style.label.clone(),
                    color: style.color,
                    corner: style.label_corner,
                    anchor: Point::new(x, y),
                }
            })
            .collect();

        let bubble_radius = side * config.bubble_radius;
        let bubbles = items
            .iter()
            .filter_map(|item| {
                let position = item.position?;
                Some(Bubble {
                    item_id: item.id,
                    label: item.id.to_string(),
                    text: item.text.clone(),
                    category: item.category,
                    color: config.category(item.category).color,
                    center: Point::new(
                        position.left.value() / 100.0 * side,
                        position.top.value() / 100.0 * side,
                    ),
                    radius: bubble_radius,
                })
            })
            .collect();

        Self {
            side,
            center,
            axes,
            rings,
            quadrant_labels,
            bubbles,
        }
    }

    /// Top-most bubble under `(x, y)`, widening each bubble by `slop` units.
    pub fn hit_test(&self, x: f64, y: f64, slop: f64) -> Option<&Bubble> {
        let point = Point::new(x, y);
        self.bubbles
            .iter()
            .rev()
            .find(|bubble| bubble.contains(point, slop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_schema::Position;

    fn scene_with(items: &[MarketItem]) -> RadarScene {
        RadarScene::build(items, &RadarConfig::default(), 400.0)
    }

    #[test]
    fn rings_are_concentric_thirds_labelled_inside_out() {
        let scene = scene_with(&[]);
        let radii: Vec<f64> = scene.rings.iter().map(|ring| ring.radius).collect();
        assert!((radii[0] - 200.0 / 3.0).abs() < 1e-9);
        assert!((radii[1] - 400.0 / 3.0).abs() < 1e-9);
        assert!((radii[2] - 200.0).abs() < 1e-9);
        assert_eq!(scene.rings[0].label, "Near-term impact");
        assert_eq!(scene.rings[2].label, "Longer-term impact");
        // Outer label is clamped inside the chart instead of sitting on the edge.
        assert!((scene.rings[2].label_at.y - 10.0).abs() < 1e-9);
        assert!((scene.rings[0].label_at.y - (200.0 - 200.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn quadrant_labels_follow_configured_corners() {
        let scene = scene_with(&[]);
        let buyer = scene
            .quadrant_labels
            .iter()
            .find(|label| label.category == Category::Buyer)
            .unwrap();
        assert_eq!(buyer.corner, Corner::TopLeft);
        assert!(buyer.anchor.x < 200.0 && buyer.anchor.y < 200.0);
        let competition = scene
            .quadrant_labels
            .iter()
            .find(|label| label.category == Category::Competition)
            .unwrap();
        assert!(competition.anchor.x > 200.0 && competition.anchor.y > 200.0);
    }

    #[test]
    fn unplaced_items_are_not_drawn() {
        let items = vec![
            MarketItem::new(1, "a", Category::Macro, Impact::Near),
            MarketItem::new(2, "b", Category::Macro, Impact::Near)
                .with_position(Position::new(25.0, 75.0)),
        ];
        let scene = scene_with(&items);
        assert_eq!(scene.bubbles.len(), 1);
        let bubble = &scene.bubbles[0];
        assert_eq!(bubble.label, "2");
        assert_eq!(bubble.center, Point::new(300.0, 100.0));
        assert_eq!(bubble.color, Rgb(0x47, 0xa1, 0xad));
    }

    #[test]
    fn hit_test_prefers_top_most_bubble() {
        let items = vec![
            MarketItem::new(1, "under", Category::Buyer, Impact::Near)
                .with_position(Position::new(50.0, 50.0)),
            MarketItem::new(2, "over", Category::Buyer, Impact::Near)
                .with_position(Position::new(50.5, 50.5)),
        ];
        let scene = scene_with(&items);
        assert_eq!(scene.hit_test(201.0, 201.0, 0.0).unwrap().item_id, 2);
        assert!(scene.hit_test(10.0, 10.0, 0.0).is_none());
        assert_eq!(scene.hit_test(196.0, 196.0, 0.0).unwrap().item_id, 1);
    }
}

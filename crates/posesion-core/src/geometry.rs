//! Design-space coordinate transform
//!
//! All field positions are authored against a fixed 1000×772 reference
//! canvas. The physical template pages are letter sheets whose content
//! is rotated 90°, so a design point has to be projected into page
//! space before drawing. Two template-compatible projections exist in
//! the wild; which one a template revision needs is registry data, so
//! both are implemented behind [`RotationStrategy`].

use serde::{Deserialize, Serialize};

/// Width of the reference canvas all coordinates are authored against.
pub const DESIGN_WIDTH: f64 = 1000.0;
/// Height of the reference canvas.
pub const DESIGN_HEIGHT: f64 = 772.0;

/// A point in the 1000×772 reference canvas, bottom-up y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignPoint {
    pub x: f64,
    pub y: f64,
}

impl DesignPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Effective page dimensions the projection is calibrated against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

/// A projected point in page space, plus the glyph rotation to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePoint {
    pub x: f64,
    pub y: f64,
    /// Degrees of counter-clockwise glyph rotation (0 or 90).
    pub rotate: i32,
}

/// How a design point is projected onto the rotated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Compensate for page rotation purely through placement: scale
    /// x by width/1000 and y by height/772, flip y, draw upright.
    CounterRotated,
    /// Swap axes and rotate the glyph itself 90°: scale x by
    /// height/1000 and y by width/772, then map (x, y) to
    /// (scaledY, width − scaledX).
    TrueRotation,
}

impl RotationStrategy {
    /// Project a design point into page space. Pure: the result
    /// depends only on the point, the page geometry and the strategy.
    pub fn project(self, point: DesignPoint, page: PageGeometry) -> PagePoint {
        match self {
            RotationStrategy::CounterRotated => {
                let x = point.x * (page.width / DESIGN_WIDTH);
                let y = page.height - point.y * (page.height / DESIGN_HEIGHT);
                PagePoint { x, y, rotate: 0 }
            }
            RotationStrategy::TrueRotation => {
                let scaled_x = point.x * (page.height / DESIGN_WIDTH);
                let scaled_y = point.y * (page.width / DESIGN_HEIGHT);
                PagePoint {
                    x: scaled_y,
                    y: page.width - scaled_x,
                    rotate: 90,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 0.001;

    // Letter landscape: the known template revision's effective geometry.
    const PAGE: PageGeometry = PageGeometry {
        width: 792.0,
        height: 612.0,
    };

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn counter_rotated_scales_and_flips_y() {
        let p = RotationStrategy::CounterRotated.project(DesignPoint::new(500.0, 386.0), PAGE);
        assert!(approx_eq(p.x, 396.0), "x was {}", p.x);
        assert!(approx_eq(p.y, 306.0), "y was {}", p.y);
        assert_eq!(p.rotate, 0);
    }

    #[test]
    fn counter_rotated_corners() {
        let origin = RotationStrategy::CounterRotated.project(DesignPoint::new(0.0, 0.0), PAGE);
        assert!(approx_eq(origin.x, 0.0));
        assert!(approx_eq(origin.y, 612.0));

        let far = RotationStrategy::CounterRotated
            .project(DesignPoint::new(DESIGN_WIDTH, DESIGN_HEIGHT), PAGE);
        assert!(approx_eq(far.x, 792.0));
        assert!(approx_eq(far.y, 0.0));
    }

    #[test]
    fn true_rotation_swaps_axes_and_rotates_glyph() {
        let p = RotationStrategy::TrueRotation.project(DesignPoint::new(100.0, 200.0), PAGE);
        // scaledX = 100 * 612/1000 = 61.2, scaledY = 200 * 792/772
        assert!(approx_eq(p.x, 200.0 * 792.0 / 772.0), "x was {}", p.x);
        assert!(approx_eq(p.y, 792.0 - 61.2), "y was {}", p.y);
        assert_eq!(p.rotate, 90);
    }

    #[test]
    fn projection_is_deterministic() {
        let point = DesignPoint::new(135.0, 555.0);
        for strategy in [RotationStrategy::CounterRotated, RotationStrategy::TrueRotation] {
            let a = strategy.project(point, PAGE);
            let b = strategy.project(point, PAGE);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn strategy_names_round_trip_through_serde() {
        let json = serde_json::to_string(&RotationStrategy::CounterRotated).unwrap();
        assert_eq!(json, "\"counter_rotated\"");
        let back: RotationStrategy = serde_json::from_str("\"true_rotation\"").unwrap();
        assert_eq!(back, RotationStrategy::TrueRotation);
    }
}

use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// The transform a presenter applies to the active tile grid:
/// translate by the pan offset, then scale about the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Translation in display units
    pub translate: Point,
    /// Continuous scale factor layered on the current resolution level
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translate: Point::new(0.0, 0.0),
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new(translate: Point, scale: f64) -> Self {
        Self { translate, scale }
    }

    /// 2D affine matrix `[a, b, c, d, e, f]` for `translate(e, f) scale(a, d)`
    pub fn matrix(&self) -> [f64; 6] {
        [
            self.scale,
            0.0,
            0.0,
            self.scale,
            self.translate.x,
            self.translate.y,
        ]
    }

    /// Map a point in grid-local coordinates to display coordinates
    pub fn apply(&self, point: Point) -> Point {
        point.multiply(self.scale).add(&self.translate)
    }
}

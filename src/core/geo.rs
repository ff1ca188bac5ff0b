use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a point in screen (display unit) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Address of a single tile in the pyramid.
///
/// `row` and `col` index into the square grid of `level`; the tile server
/// receives them as `x` and `y` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub row: u32,
    pub col: u32,
    pub level: u32,
}

impl TileCoord {
    pub fn new(row: u32, col: u32, level: u32) -> Self {
        Self { row, col, level }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(z, x, y) = ({}, {}, {})", self.level, self.row, self.col)
    }
}

/// Number of tiles along one side of the grid at `level`.
///
/// Level 0 is a single tile; every other level `L` is `2L` tiles wide.
pub fn grid_dimension(level: u32) -> u32 {
    if level == 0 {
        1
    } else {
        level * 2
    }
}

use crate::core::geo::{grid_dimension, TileCoord};
use crate::tiles::fetcher::TileHandle;

/// The square arrangement of tiles needed to display one resolution level.
///
/// Cells are stored row-major. A `None` cell is unresolved: its fetch is
/// still in flight or it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    level: u32,
    dimension: u32,
    cells: Vec<Option<TileHandle>>,
}

impl TileGrid {
    /// An unresolved grid sized for `level`
    pub fn empty(level: u32) -> Self {
        let dimension = grid_dimension(level);
        Self {
            level,
            dimension,
            cells: vec![None; dimension as usize * dimension as usize],
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Tiles along one side
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Every coordinate of this grid, row by row
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let level = self.level;
        let dimension = self.dimension;
        (0..dimension)
            .flat_map(move |row| (0..dimension).map(move |col| TileCoord::new(row, col, level)))
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&TileHandle> {
        self.index(row, col).and_then(|i| self.cells[i].as_ref())
    }

    /// Place a handle at its own coordinate. Returns false when the handle
    /// belongs to another level or lies outside the grid.
    pub fn set(&mut self, handle: TileHandle) -> bool {
        let coord = handle.coord();
        if coord.level != self.level {
            return false;
        }
        match self.index(coord.row, coord.col) {
            Some(i) => {
                self.cells[i] = Some(handle);
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<TileHandle>]> {
        self.cells.chunks(self.dimension as usize)
    }

    pub fn resolved_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn missing(&self) -> Vec<TileCoord> {
        self.coords()
            .zip(self.cells.iter())
            .filter(|(_, cell)| cell.is_none())
            .map(|(coord, _)| coord)
            .collect()
    }

    /// True once every cell holds a handle
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        if row < self.dimension && col < self.dimension {
            Some((row * self.dimension + col) as usize)
        } else {
            None
        }
    }
}

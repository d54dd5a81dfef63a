//! Grid: fixed 15x15 occupancy bookkeeping.
//!
//! No resource logic lives here. Cells are created once per grid and
//! updated in place; their coordinates never change.

use crate::{
    building::{BuildingKind, Color},
    error::{SimError, SimResult},
    types::{CELL_COUNT, GRID_SIZE},
};
use serde::{Deserialize, Serialize};

pub const EMPTY_COLOR: Color = Color::White;

/// Named cell attributes, used as change-notification payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellField {
    Building,
    HasBuilding,
    Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    row:      usize,
    column:   usize,
    building: Option<BuildingKind>,
    color:    Color,
}

impl Cell {
    pub(crate) fn new(row: usize, column: usize, building: Option<BuildingKind>, color: Color) -> Self {
        Self { row, column, building, color }
    }

    pub fn row(&self)      -> usize                { self.row }
    pub fn column(&self)   -> usize                { self.column }
    pub fn building(&self) -> Option<BuildingKind> { self.building }
    pub fn color(&self)    -> Color                { self.color }

    pub fn has_building(&self) -> bool {
        self.building.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// An empty grid, cells in row-major order.
    pub fn new() -> Self {
        let cells = (0..GRID_SIZE)
            .flat_map(|row| (0..GRID_SIZE).map(move |column| Cell::new(row, column, None, EMPTY_COLOR)))
            .collect();
        Self { cells }
    }

    /// Build a grid from cells already in row-major order.
    /// Callers must have checked the shape.
    pub(crate) fn from_cells(cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), CELL_COUNT);
        Self { cells }
    }

    pub fn at(&self, row: usize, column: usize) -> SimResult<&Cell> {
        let index = Self::index(row, column)?;
        Ok(&self.cells[index])
    }

    pub fn place(&mut self, row: usize, column: usize, kind: BuildingKind, color: Color) -> SimResult<()> {
        let cell = self.cell_mut(row, column)?;
        if cell.building.is_some() {
            return Err(SimError::CellOccupied { row, column });
        }
        cell.building = Some(kind);
        cell.color = color;
        Ok(())
    }

    /// Empty the cell and return the kind that stood there.
    pub fn clear(&mut self, row: usize, column: usize) -> SimResult<BuildingKind> {
        let cell = self.cell_mut(row, column)?;
        let kind = cell.building.take().ok_or(SimError::CellEmpty { row, column })?;
        cell.color = EMPTY_COLOR;
        Ok(kind)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn occupied(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| cell.has_building())
    }

    pub fn building_count(&self) -> usize {
        self.occupied().count()
    }

    pub fn in_bounds(row: usize, column: usize) -> bool {
        row < GRID_SIZE && column < GRID_SIZE
    }

    fn cell_mut(&mut self, row: usize, column: usize) -> SimResult<&mut Cell> {
        let index = Self::index(row, column)?;
        Ok(&mut self.cells[index])
    }

    fn index(row: usize, column: usize) -> SimResult<usize> {
        if !Self::in_bounds(row, column) {
            return Err(SimError::OutOfBounds { row, column });
        }
        Ok(row * GRID_SIZE + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_empty_and_row_major() {
        let grid = Grid::new();
        assert_eq!(grid.cells().len(), CELL_COUNT);
        assert_eq!(grid.building_count(), 0);
        for (index, cell) in grid.cells().iter().enumerate() {
            assert_eq!(cell.row(), index / GRID_SIZE);
            assert_eq!(cell.column(), index % GRID_SIZE);
            assert_eq!(cell.color(), EMPTY_COLOR);
        }
    }

    #[test]
    fn place_then_clear_restores_the_cell() {
        let mut grid = Grid::new();
        grid.place(3, 4, BuildingKind::SmallHouse, Color::LightGreen).unwrap();

        let cell = grid.at(3, 4).unwrap();
        assert_eq!(cell.building(), Some(BuildingKind::SmallHouse));
        assert_eq!(cell.color(), Color::LightGreen);

        assert_eq!(grid.clear(3, 4).unwrap(), BuildingKind::SmallHouse);
        assert_eq!(grid, Grid::new());
    }
}

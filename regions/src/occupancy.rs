use crate::error::{GridError, GridResult};
use common::shapes::{GridPos, GridRect};
use std::sync::atomic::{AtomicU32, Ordering};

/// Sentinel stored in cells nobody occupies.
pub const EMPTY: u32 = u32::MAX;

/// Dense cell -> agent id table. Cells are individually atomic so concurrent
/// workers can claim and release them without a table-wide lock.
pub struct OccupancyTable {
    bounds: GridRect,
    cells: Vec<AtomicU32>,
}

impl OccupancyTable {
    pub fn new(bounds: GridRect) -> GridResult<Self> {
        if bounds.is_empty() {
            return Err(GridError::EmptyGrid {
                width: bounds.width,
                height: bounds.height,
            });
        }
        let cells = (0..bounds.area()).map(|_| AtomicU32::new(EMPTY)).collect();
        Ok(Self { bounds, cells })
    }

    pub fn bounds(&self) -> GridRect {
        self.bounds
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.bounds.contains(pos)
    }

    #[inline(always)]
    fn cell(&self, pos: GridPos) -> Option<&AtomicU32> {
        self.bounds.index_of(pos).map(|idx| &self.cells[idx])
    }

    fn out_of_bounds(&self, pos: GridPos) -> GridError {
        GridError::CellOutOfBounds {
            x: pos.x,
            y: pos.y,
            bounds_min_x: self.bounds.left(),
            bounds_min_y: self.bounds.top(),
            bounds_max_x: self.bounds.right() - 1,
            bounds_max_y: self.bounds.bottom() - 1,
        }
    }

    /// Marks every cell empty.
    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell.get_mut() = EMPTY;
        }
    }

    /// Clears the table and records each `(id, pos)`. Fails on the first position
    /// outside the grid. Returns the ids that landed on an already occupied cell;
    /// the first writer keeps the cell.
    pub fn populate<I>(&mut self, occupants: I) -> GridResult<Vec<u32>>
    where
        I: IntoIterator<Item = (u32, GridPos)>,
    {
        self.clear();
        let mut colocated = Vec::new();
        for (id, pos) in occupants {
            let idx = self
                .bounds
                .index_of(pos)
                .ok_or_else(|| self.out_of_bounds(pos))?;
            let cell = self.cells[idx].get_mut();
            if *cell == EMPTY {
                *cell = id;
            } else {
                colocated.push(id);
            }
        }
        Ok(colocated)
    }

    /// Current occupant of `pos`. Out-of-grid cells read as empty.
    pub fn occupant(&self, pos: GridPos) -> Option<u32> {
        match self.cell(pos).map(|c| c.load(Ordering::Acquire)) {
            Some(EMPTY) | None => None,
            Some(id) => Some(id),
        }
    }

    /// A cell is free when it is inside the grid and nobody holds it.
    pub fn is_free(&self, pos: GridPos) -> bool {
        self.cell(pos)
            .map_or(false, |c| c.load(Ordering::Acquire) == EMPTY)
    }

    /// Atomic compare-and-exchange on one cell. Returns the previous value on
    /// success and the observed value on failure, like `AtomicU32::compare_exchange`.
    pub fn compare_exchange(&self, pos: GridPos, expected: u32, new: u32) -> GridResult<Result<u32, u32>> {
        let cell = self.cell(pos).ok_or_else(|| self.out_of_bounds(pos))?;
        Ok(cell.compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire))
    }

    /// Claims an empty cell for `id`. Fails if the cell is held or lies outside the grid.
    pub fn try_claim(&self, pos: GridPos, id: u32) -> bool {
        matches!(self.compare_exchange(pos, EMPTY, id), Ok(Ok(_)))
    }

    /// Releases a cell held by `id`. On failure returns what the cell actually held
    /// (`EMPTY` for a cell outside the grid).
    pub fn release(&self, pos: GridPos, id: u32) -> Result<(), u32> {
        match self.compare_exchange(pos, id, EMPTY) {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(actual)) => Err(actual),
            Err(_) => Err(EMPTY),
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.load(Ordering::Acquire) != EMPTY)
            .count()
    }

    /// Every occupied cell with its occupant, in row-major order.
    pub fn occupied_cells(&self) -> Vec<(GridPos, u32)> {
        let width = self.bounds.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| {
                let id = c.load(Ordering::Acquire);
                if id == EMPTY {
                    return None;
                }
                let pos = GridPos::new(
                    self.bounds.left() + (idx % width) as i32,
                    self.bounds.top() + (idx / width) as i32,
                );
                Some((pos, id))
            })
            .collect()
    }
}

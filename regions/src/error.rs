use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    EmptyGrid {
        width: u32,
        height: u32,
    },
    CellOutOfBounds {
        x: i32,
        y: i32,
        bounds_min_x: i32,
        bounds_min_y: i32,
        bounds_max_x: i32,
        bounds_max_y: i32,
    },
    InvalidNeighborDistance {
        distance: i32,
    },
}

pub type GridResult<T> = Result<T, GridError>;

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::EmptyGrid { width, height } => {
                write!(
                    f,
                    "occupancy grid must have a non-zero size (width: {}, height: {})",
                    width, height
                )
            }
            GridError::CellOutOfBounds {
                x,
                y,
                bounds_min_x,
                bounds_min_y,
                bounds_max_x,
                bounds_max_y,
            } => {
                write!(
                    f,
                    "cell must be within grid bounds (x: {}, y: {}, bounds_min_x: {}, bounds_min_y: {}, bounds_max_x: {}, bounds_max_y: {})",
                    x, y, bounds_min_x, bounds_min_y, bounds_max_x, bounds_max_y
                )
            }
            GridError::InvalidNeighborDistance { distance } => {
                write!(
                    f,
                    "neighbor distance must be non-negative (distance: {})",
                    distance
                )
            }
        }
    }
}

impl std::error::Error for GridError {}

use crate::error::{GridError, GridResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionConfig {
    /// Cells with `x < split_x` fall in the west quadrants.
    pub split_x: i32,
    /// Cells with `y < split_y` fall in the north quadrants.
    pub split_y: i32,
    /// Manhattan radius of the same-region neighbor gather.
    pub neighbor_distance: i32,
}

impl RegionConfig {
    pub fn validate(&self) -> GridResult<()> {
        if self.neighbor_distance < 0 {
            return Err(GridError::InvalidNeighborDistance {
                distance: self.neighbor_distance,
            });
        }
        Ok(())
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        RegionConfig {
            split_x: 100,
            split_y: 60,
            neighbor_distance: 4,
        }
    }
}

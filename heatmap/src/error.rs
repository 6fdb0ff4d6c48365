use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeatmapError {
    EmptyHeatmap { size: usize, cell_size: usize },
    InvalidDecay { decay: f64 },
}

pub type HeatmapResult<T> = Result<T, HeatmapError>;

impl fmt::Display for HeatmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeatmapError::EmptyHeatmap { size, cell_size } => {
                write!(
                    f,
                    "heatmap side and cell size must be non-zero (size: {}, cell_size: {})",
                    size, cell_size
                )
            }
            HeatmapError::InvalidDecay { decay } => {
                write!(f, "heatmap decay must lie in [0, 1] (decay: {})", decay)
            }
        }
    }
}

impl std::error::Error for HeatmapError {}

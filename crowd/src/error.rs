use common::shapes::GridPos;
use heatmap::HeatmapError;
use regions::GridError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown tick strategy `{0}`")]
    UnknownStrategy(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("agent {id} starts at {position}, outside the simulation grid")]
    AgentOutOfBounds { id: u32, position: GridPos },
    #[error("agents {ids:?} start on a cell another agent already holds")]
    AgentsColocated { ids: Vec<u32> },
    #[error("accelerator unavailable: {0}")]
    AcceleratorUnavailable(String),
    #[error("accelerator kernel failed: {0}")]
    Kernel(String),
    #[error("could not start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Heatmap(#[from] HeatmapError),
}

pub type SimResult<T> = Result<T, SimError>;

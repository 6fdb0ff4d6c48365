pub mod config;
pub mod error;
pub mod occupancy;
pub mod partition;

pub use config::RegionConfig;
pub use error::{GridError, GridResult};
pub use occupancy::{OccupancyTable, EMPTY};
pub use partition::{RegionId, RegionPartition};

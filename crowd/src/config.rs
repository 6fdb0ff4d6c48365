use crate::error::{SimError, SimResult};
use common::shapes::GridRect;
use heatmap::HeatmapConfig;
use regions::RegionConfig;
use std::fmt;
use std::str::FromStr;

/// Which execution unit runs the offloaded kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceleratorKind {
    /// A dedicated worker pool with its own device-side buffers.
    #[default]
    Host,
    /// A wgpu compute device. Needs the `gpu` feature and an adapter.
    Gpu,
}

impl fmt::Display for AcceleratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceleratorKind::Host => write!(f, "host"),
            AcceleratorKind::Gpu => write!(f, "gpu"),
        }
    }
}

impl FromStr for AcceleratorKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(AcceleratorKind::Host),
            "gpu" => Ok(AcceleratorKind::Gpu),
            other => Err(SimError::InvalidConfig(format!(
                "unknown accelerator `{}`",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Workers used by every parallel phase.
    pub threads: usize,
    /// Cells covered by the occupancy table. Agents must start inside.
    pub grid: GridRect,
    pub regions: RegionConfig,
    pub heatmap: HeatmapConfig,
    pub accelerator: AcceleratorKind,
}

impl Config {
    pub fn validate(&self) -> SimResult<()> {
        if self.threads == 0 {
            return Err(SimError::InvalidConfig(
                "worker thread count must be at least 1".to_string(),
            ));
        }
        if self.grid.is_empty() {
            return Err(SimError::InvalidConfig(format!(
                "grid must have a non-zero size, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        self.regions.validate()?;
        self.heatmap.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threads: 4,
            grid: GridRect::sized(1024, 1024),
            regions: RegionConfig::default(),
            heatmap: HeatmapConfig::default(),
            accelerator: AcceleratorKind::Host,
        }
    }
}

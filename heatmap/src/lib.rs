//! Decaying density grid of where agents want to go.
//!
//! Every update fades the base grid, adds heat under each desired position,
//! replicates every base cell into a `cell_size` square block and blurs the
//! interior of that scaled grid with a fixed 5x5 kernel. The blurred grid holds
//! packed colors ready to be drawn.

pub mod error;

pub use error::{HeatmapError, HeatmapResult};

use common::shapes::GridPos;
use rayon::prelude::*;
use tracing::trace;

pub const MAX_HEAT: u32 = 255;

pub const BLUR_KERNEL: [[u32; 5]; 5] = [
    [1, 4, 7, 4, 1],
    [4, 16, 26, 16, 4],
    [7, 26, 41, 26, 7],
    [4, 16, 26, 16, 4],
    [1, 4, 7, 4, 1],
];

pub const BLUR_WEIGHT_SUM: u32 = 273;

const BLUR_RADIUS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapConfig {
    /// Side of the base grid, in cells.
    pub size: usize,
    /// Side of the block each base cell becomes in the scaled grid.
    pub cell_size: usize,
    /// Multiplier applied to every base cell before new heat is added.
    pub decay: f64,
    /// Heat added per agent desiring a cell.
    pub increment: u32,
}

impl HeatmapConfig {
    pub fn scaled_size(&self) -> usize {
        self.size * self.cell_size
    }

    pub fn validate(&self) -> HeatmapResult<()> {
        if self.size == 0 || self.cell_size == 0 {
            return Err(HeatmapError::EmptyHeatmap {
                size: self.size,
                cell_size: self.cell_size,
            });
        }
        if !(0.0..=1.0).contains(&self.decay) {
            return Err(HeatmapError::InvalidDecay { decay: self.decay });
        }
        Ok(())
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        HeatmapConfig {
            size: 1024,
            cell_size: 5,
            decay: 0.8,
            increment: 40,
        }
    }
}

/// Heat value as a color: red channel full, alpha proportional to heat.
#[inline(always)]
pub fn packed_color(value: u32) -> u32 {
    0x00FF_0000 | (value.min(MAX_HEAT) << 24)
}

#[inline(always)]
fn faded(value: u32, decay: f64) -> u32 {
    (value as f64 * decay).round() as u32
}

pub struct Heatmap {
    config: HeatmapConfig,
    heat: Vec<u32>,
    scaled: Vec<u32>,
    blurred: Vec<u32>,
    updates: u64,
}

impl Heatmap {
    pub fn new(config: HeatmapConfig) -> HeatmapResult<Self> {
        config.validate()?;
        let scaled_cells = config.scaled_size() * config.scaled_size();
        Ok(Heatmap {
            config,
            heat: vec![0; config.size * config.size],
            scaled: vec![0; scaled_cells],
            blurred: vec![0; scaled_cells],
            updates: 0,
        })
    }

    pub fn config(&self) -> HeatmapConfig {
        self.config
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    pub fn scaled_size(&self) -> usize {
        self.config.scaled_size()
    }

    /// Number of updates applied so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    fn base_index(&self, pos: GridPos) -> Option<usize> {
        let size = self.config.size as i64;
        let (x, y) = (pos.x as i64, pos.y as i64);
        if x < 0 || y < 0 || x >= size || y >= size {
            return None;
        }
        Some((y * size + x) as usize)
    }

    /// Base grid value at `pos`, `None` outside the grid.
    pub fn heat(&self, pos: GridPos) -> Option<u32> {
        self.base_index(pos).map(|idx| self.heat[idx])
    }

    /// Base grid, row-major.
    pub fn heat_grid(&self) -> &[u32] {
        &self.heat
    }

    /// Upscaled grid, row-major, `scaled_size()` squared cells.
    pub fn scaled(&self) -> &[u32] {
        &self.scaled
    }

    /// Blurred packed colors, row-major. Cells within two of an edge stay zero.
    pub fn blurred(&self) -> &[u32] {
        &self.blurred
    }

    pub fn blurred_at(&self, x: usize, y: usize) -> Option<u32> {
        let side = self.scaled_size();
        if x >= side || y >= side {
            return None;
        }
        Some(self.blurred[y * side + x])
    }

    /// Runs one full update on the calling thread.
    pub fn update<I>(&mut self, desired: I)
    where
        I: IntoIterator<Item = GridPos>,
    {
        let decay = self.config.decay;
        for value in self.heat.iter_mut() {
            *value = faded(*value, decay);
        }
        let hits = self.accumulate(desired);
        for value in self.heat.iter_mut() {
            *value = (*value).min(MAX_HEAT);
        }

        let side = self.scaled_size();
        let Heatmap {
            config,
            heat,
            scaled,
            blurred,
            ..
        } = self;
        for (row, out) in scaled.chunks_mut(side).enumerate() {
            upscale_row(heat, config, row, out);
        }
        for (row, out) in blurred.chunks_mut(side).enumerate() {
            blur_row(scaled, side, row, out);
        }

        self.updates += 1;
        trace!(hits, update = self.updates, "heatmap updated");
    }

    /// Same result as [`Heatmap::update`]; the per-cell passes run on the
    /// current rayon pool.
    pub fn par_update(&mut self, desired: &[GridPos]) {
        let decay = self.config.decay;
        self.heat
            .par_iter_mut()
            .for_each(|value| *value = faded(*value, decay));
        let hits = self.accumulate(desired.iter().copied());
        self.heat
            .par_iter_mut()
            .for_each(|value| *value = (*value).min(MAX_HEAT));

        let side = self.scaled_size();
        let Heatmap {
            config,
            heat,
            scaled,
            blurred,
            ..
        } = self;
        let (heat, config) = (&*heat, &*config);
        scaled
            .par_chunks_mut(side)
            .enumerate()
            .for_each(|(row, out)| upscale_row(heat, config, row, out));
        let scaled = &*scaled;
        blurred
            .par_chunks_mut(side)
            .enumerate()
            .for_each(|(row, out)| blur_row(scaled, side, row, out));

        self.updates += 1;
        trace!(hits, update = self.updates, "heatmap updated in parallel");
    }

    /// Adds the increment under every in-bounds position. Returns how many counted.
    fn accumulate<I>(&mut self, desired: I) -> usize
    where
        I: IntoIterator<Item = GridPos>,
    {
        let increment = self.config.increment;
        let mut hits = 0;
        for pos in desired {
            if let Some(idx) = self.base_index(pos) {
                self.heat[idx] = self.heat[idx].saturating_add(increment);
                hits += 1;
            }
        }
        hits
    }
}

fn upscale_row(heat: &[u32], config: &HeatmapConfig, row: usize, out: &mut [u32]) {
    let base_row = row / config.cell_size;
    let base = &heat[base_row * config.size..(base_row + 1) * config.size];
    for (col, value) in out.iter_mut().enumerate() {
        *value = base[col / config.cell_size];
    }
}

fn blur_row(scaled: &[u32], side: usize, row: usize, out: &mut [u32]) {
    if row < BLUR_RADIUS || row + BLUR_RADIUS >= side {
        return;
    }
    for col in BLUR_RADIUS..side - BLUR_RADIUS {
        let mut sum = 0;
        for (k, weights) in BLUR_KERNEL.iter().enumerate() {
            let src = &scaled[(row + k - BLUR_RADIUS) * side..];
            for (l, weight) in weights.iter().enumerate() {
                sum += weight * src[col + l - BLUR_RADIUS];
            }
        }
        out[col] = packed_color(sum / BLUR_WEIGHT_SUM);
    }
}

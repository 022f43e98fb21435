//! Nested-radix coordinate engine.
//!
//! A [`LevelStack`] is an ordered list of levels, finest first. Level `i` holds
//! `radix` steps laid out along one axis; one step of level 0 is a single symbol
//! and one step of level `i > 0` is a full unit of level `i - 1`. Every offset in
//! the sequence therefore decomposes into one coordinate per level, and the sum of
//! `coordinate * pitch` on each axis gives its pixel.

use serde::Serialize;

use crate::config::{Axis, LayoutConfig, LevelSpec};
use crate::error::{LayoutError, Result};

/// Index of the level whose full unit is the largest title a contig may reserve.
pub const TILE_LABEL_LEVEL: usize = 2;

/// Largest pixel span any level, origin or margin may have. Keeps every
/// position sum far from `u64` overflow.
pub const MAX_EXTENT: u64 = 1 << 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub radix: u64,
    /// Pixels one step's content occupies along `axis`.
    pub thickness: u64,
    /// Blank pixels after each step.
    pub padding: u64,
    pub axis: Axis,
    /// Symbols spanned by one full unit of this level.
    pub chunk_size: u64,
}

impl Level {
    pub fn pitch(&self) -> u64 {
        self.thickness + self.padding
    }

    /// Symbols spanned by a single step.
    pub fn step_size(&self) -> u64 {
        self.chunk_size / self.radix
    }

    /// Pixels spanned by a full unit of this level.
    pub fn extent(&self) -> u64 {
        self.radix * self.pitch()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelStack {
    levels: Vec<Level>,
    origin: [u64; 2],
    margin: u64,
}

impl LevelStack {
    /// Derive thickness and chunk sizes from a list of level specs.
    pub fn from_specs(specs: &[LevelSpec], origin: [u64; 2], margin: u64) -> Result<Self> {
        if specs.is_empty() {
            return Err(LayoutError::config("a layout needs at least one level"));
        }
        if origin.iter().chain([&margin]).any(|&v| v > MAX_EXTENT) {
            return Err(LayoutError::config(format!(
                "origin {:?} or margin {} exceeds {} pixels",
                origin, margin, MAX_EXTENT
            )));
        }
        let mut stack = LevelStack {
            levels: Vec::with_capacity(specs.len()),
            origin,
            margin,
        };
        for spec in specs {
            stack.push(spec)?;
        }
        Ok(stack)
    }

    /// The standard line / column / row / tile layout, or the configured custom one.
    pub fn from_config(config: &LayoutConfig) -> Result<Self> {
        config.validate()?;
        let specs = match &config.custom_layout {
            Some(specs) => specs.clone(),
            None => Self::tiled_specs(config.base_width),
        };
        let column_padding = specs.get(TILE_LABEL_LEVEL).map_or(0, |s| s.padding);
        let origin = config.border_width.max(column_padding);
        let margin = origin
            .checked_add(column_padding)
            .ok_or_else(|| LayoutError::config("image margin overflows"))?;
        Self::from_specs(&specs, [origin, origin], margin)
    }

    pub fn tiled_specs(base_width: u64) -> Vec<LevelSpec> {
        let radii = [base_width, base_width.saturating_mul(10), 100, 10, 3, 4, 999];
        let paddings = [0, 0, 6, 6 * 3, 6 * 9, 6 * 27, 6 * 81];
        radii
            .iter()
            .zip(paddings)
            .map(|(&radix, padding)| LevelSpec::new(radix, padding))
            .collect()
    }

    /// Append a coarser level. Its thickness is the full extent of the nearest
    /// finer level on the same axis.
    pub fn push(&mut self, spec: &LevelSpec) -> Result<()> {
        let depth = self.levels.len();
        if spec.radix == 0 {
            return Err(LayoutError::config(format!("level {} has radix 0", depth)));
        }
        let axis = spec.axis.unwrap_or_else(|| Axis::for_depth(depth));
        let thickness = self
            .levels
            .iter()
            .rev()
            .find(|l| l.axis == axis)
            .map_or(1, Level::extent);
        thickness
            .checked_add(spec.padding)
            .and_then(|pitch| pitch.checked_mul(spec.radix))
            .filter(|&extent| extent <= MAX_EXTENT)
            .ok_or_else(|| {
                LayoutError::config(format!(
                    "level {} spans more than {} pixels",
                    depth, MAX_EXTENT
                ))
            })?;
        let below = self.levels.last().map_or(1, |l| l.chunk_size);
        let chunk_size = below.checked_mul(spec.radix).ok_or_else(|| {
            LayoutError::config(format!("chunk size of level {} overflows", depth))
        })?;
        self.levels.push(Level {
            radix: spec.radix,
            thickness,
            padding: spec.padding,
            axis,
            chunk_size,
        });
        Ok(())
    }

    /// Keep only the `n` finest levels.
    pub fn truncate(&mut self, n: usize) {
        self.levels.truncate(n.max(1));
    }

    pub fn set_origin(&mut self, origin: [u64; 2]) {
        self.origin = origin;
    }

    pub fn set_margin(&mut self, margin: u64) {
        self.margin = margin;
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, i: usize) -> &Level {
        &self.levels[i]
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn origin(&self) -> [u64; 2] {
        self.origin
    }

    pub fn margin(&self) -> u64 {
        self.margin
    }

    /// Symbols per row of pixels.
    pub fn base_width(&self) -> u64 {
        self.levels[0].radix
    }

    pub fn chunk_size(&self, i: usize) -> u64 {
        self.levels[i].chunk_size
    }

    /// Chunk size of the level below `i`; a single symbol below level 0.
    pub fn finer_chunk_size(&self, i: usize) -> u64 {
        if i == 0 {
            1
        } else {
            self.levels[i - 1].chunk_size
        }
    }

    fn is_coarsest(&self, i: usize) -> bool {
        i + 1 == self.levels.len()
    }

    /// Per-level coordinates of `offset`. The coarsest level never wraps.
    pub fn coordinates(&self, offset: u64) -> Vec<u64> {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                let steps = offset / level.step_size();
                if self.is_coarsest(i) {
                    steps
                } else {
                    steps % level.radix
                }
            })
            .collect()
    }

    pub fn offset_from_coordinates(&self, coords: &[u64]) -> u64 {
        self.levels
            .iter()
            .zip(coords)
            .map(|(level, &c)| c * level.step_size())
            .sum()
    }

    /// Offset relative to the origin, before any genome shift.
    pub fn relative_position(&self, offset: u64) -> [u64; 2] {
        let mut xy = [0u64; 2];
        for (level, coord) in self.levels.iter().zip(self.coordinates(offset)) {
            let axis = level.axis.index();
            // only the unbounded coarsest coordinate can saturate
            xy[axis] = xy[axis].saturating_add(coord.saturating_mul(level.pitch()));
        }
        xy
    }

    pub fn position_on_screen(&self, offset: u64) -> (u64, u64) {
        let [x, y] = self.relative_position(offset);
        (
            x.saturating_add(self.origin[0]),
            y.saturating_add(self.origin[1]),
        )
    }

    /// Pixel extent per axis reached by `total_length` symbols, counting only the
    /// first `depth` levels. Finer levels nest inside coarser ones, so only the
    /// largest contribution per axis is kept.
    pub fn extents(&self, total_length: u64, depth: usize) -> [u64; 2] {
        let mut extent = [0u64; 2];
        for level in self.levels.iter().take(depth) {
            let step = level.step_size();
            let count = total_length.div_ceil(step).min(level.radix);
            if count > 1 {
                let axis = level.axis.index();
                extent[axis] = extent[axis].max(level.pitch() * count);
            }
        }
        // even a single symbol needs a pixel
        extent.map(|e| e.max(1))
    }

    pub fn dimensions_for_extents(&self, extent: [u64; 2]) -> (u64, u64) {
        (
            self.origin[0] + extent[0] + self.margin,
            self.origin[1] + extent[1] + self.margin,
        )
    }

    /// Canvas size needed for an image of `total_length` offsets.
    pub fn max_dimensions(&self, total_length: u64) -> (u64, u64) {
        self.dimensions_for_extents(self.extents(total_length, self.levels.len()))
    }
}

//! Render long symbol sequences as a single image of nested tiles.
//!
//! A [`LevelStack`] maps every sequence offset to a pixel, a [`PaddingPlanner`]
//! reserves blank space so contigs start on clean boundaries with room for a
//! title, and [`TileLayout`] or [`ParallelLayout`] paint the result.

pub mod canvas;
pub mod config;
pub mod error;
pub mod export;
pub mod font;
pub mod levels;
pub mod palette;
pub mod parallel;
pub mod planner;
pub mod render;
pub mod source;

pub use config::{Axis, LayoutConfig, LevelSpec, PaletteKind};
pub use error::{DrawFault, LayoutError, Result};
pub use levels::{Level, LevelStack};
pub use palette::Palette;
pub use parallel::{Genome, ParallelLayout};
pub use planner::{Padding, PaddingPlanner, Plan};
pub use render::{PassReport, RenderReport, TileLayout};
pub use source::Segment;

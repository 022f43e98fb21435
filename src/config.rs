//! Layout configuration, loadable from JSON or assembled from CLI flags.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Sequence length below which a contig does not get a full title reservation.
pub const SHORT_TITLE_BP: u64 = 10_000;

/// Which pixel axis a level steps along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Alternating assignment used when a level does not name its axis.
    pub fn for_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Axis::X
        } else {
            Axis::Y
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// One entry of a level list before thickness and chunk sizes are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub radix: u64,
    #[serde(default)]
    pub padding: u64,
    #[serde(default)]
    pub axis: Option<Axis>,
}

impl LevelSpec {
    pub fn new(radix: u64, padding: u64) -> Self {
        Self {
            radix,
            padding,
            axis: None,
        }
    }

    pub fn on_axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    #[default]
    Nucleotide,
    Protein,
    /// Byte-valued data drawn on a continuous gradient.
    Spectrum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub use_titles: bool,
    pub sort_contigs: bool,
    pub low_contrast: bool,
    pub base_width: u64,
    pub border_width: u64,
    pub custom_layout: Option<Vec<LevelSpec>>,
    pub palette: PaletteKind,
    pub skip_short_titles: bool,
    pub short_title_threshold: u64,
    pub short_title_padding: u64,
    /// Upper bound on canvas pixels before allocation is refused.
    pub max_pixels: u64,
    /// Parallel layout only: tint each genome's column and draw colored borders.
    pub background_colors: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            use_titles: true,
            sort_contigs: false,
            low_contrast: false,
            base_width: 100,
            border_width: 3,
            custom_layout: None,
            palette: PaletteKind::Nucleotide,
            skip_short_titles: true,
            short_title_threshold: SHORT_TITLE_BP,
            short_title_padding: 0,
            max_pixels: 4_000_000_000,
            background_colors: false,
        }
    }
}

impl LayoutConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| LayoutError::io(path, e))?;
        let config: LayoutConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_width == 0 {
            return Err(LayoutError::config("base_width must be positive"));
        }
        if let Some(levels) = &self.custom_layout {
            if levels.is_empty() {
                return Err(LayoutError::config("custom layout has no levels"));
            }
            if let Some(pos) = levels.iter().position(|l| l.radix == 0) {
                return Err(LayoutError::config(format!("level {} has radix 0", pos)));
            }
        }
        Ok(())
    }
}

/// Parse the compact `([r0,r1,...],[p0,p1,...])` form of a custom layout.
///
/// Paddings may be shorter than radii; missing entries are 0.
pub fn parse_custom_layout(text: &str) -> Result<Vec<LevelSpec>> {
    let inner = text
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();
    let wrapped = format!("[{}]", inner);
    let lists: Vec<Vec<u64>> = serde_json::from_str(&wrapped)
        .map_err(|e| LayoutError::config(format!("unreadable custom layout {:?}: {}", text, e)))?;

    let (radii, paddings) = match lists.as_slice() {
        [radii] => (radii.clone(), Vec::new()),
        [radii, paddings] => (radii.clone(), paddings.clone()),
        _ => {
            return Err(LayoutError::config(
                "custom layout must be ([radii]) or ([radii],[paddings])",
            ))
        }
    };
    if radii.is_empty() {
        return Err(LayoutError::config("custom layout has no levels"));
    }
    if paddings.len() > radii.len() {
        return Err(LayoutError::config("more paddings than levels in custom layout"));
    }

    radii
        .iter()
        .enumerate()
        .map(|(i, &radix)| {
            if radix == 0 {
                return Err(LayoutError::config(format!("level {} has radix 0", i)));
            }
            Ok(LevelSpec::new(radix, paddings.get(i).copied().unwrap_or(0)))
        })
        .collect()
}

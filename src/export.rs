//! JSON manifest describing where every contig landed in the image.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::levels::{Level, LevelStack};
use crate::palette::{LegendEntry, Palette};
use crate::planner::Plan;

#[derive(Debug, Clone, Serialize)]
pub struct ContigSpacing {
    pub name: String,
    pub length: u64,
    /// Offset of the first symbol in layout space.
    pub xy_seq_start: u64,
    pub xy_seq_end: u64,
    pub title_padding: u64,
    pub tail_padding: u64,
    pub title_start: u64,
    pub seq_start: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub image_width: u64,
    pub image_height: u64,
    pub image_length: u64,
    pub origin: [u64; 2],
    pub levels: Vec<Level>,
    pub legend: Vec<LegendEntry>,
    pub contigs: Vec<ContigSpacing>,
}

impl Manifest {
    pub fn new(stack: &LevelStack, palette: &Palette, plan: &Plan, dimensions: (u64, u64)) -> Self {
        let mut progress = 0u64;
        let contigs = plan
            .segments
            .iter()
            .map(|planned| {
                progress += planned.padding.reset + planned.padding.title;
                let start = progress;
                progress += planned.len() + planned.padding.tail;
                ContigSpacing {
                    name: planned.name().to_string(),
                    length: planned.len(),
                    xy_seq_start: start,
                    xy_seq_end: start + planned.len(),
                    title_padding: planned.padding.title,
                    tail_padding: planned.padding.tail,
                    title_start: planned.text.title_start,
                    seq_start: planned.text.seq_start,
                }
            })
            .collect();
        Self {
            image_width: dimensions.0,
            image_height: dimensions.1,
            image_length: plan.image_length,
            origin: stack.origin(),
            levels: stack.levels().to_vec(),
            legend: palette.legend(),
            contigs,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| LayoutError::io(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        info!("Wrote layout manifest {:?}", path);
        Ok(())
    }
}

/// `<dir>/<name>.layout.json`
pub fn manifest_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{}.layout.json", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::planner::PaddingPlanner;
    use crate::source::Segment;

    #[test]
    fn contig_spacing_skips_padding() {
        let config = LayoutConfig::default();
        let stack = LevelStack::from_config(&config).unwrap();
        let planner = PaddingPlanner::from_config(&config);
        let plan = planner
            .plan(
                &stack,
                vec![
                    Segment::new("a", vec![b'A'; 50]),
                    Segment::new("b", vec![b'C'; 150_000]),
                ],
            )
            .unwrap();
        let palette = Palette::from_config(&config);
        let manifest = Manifest::new(&stack, &palette, &plan, (10, 10));

        let b = &manifest.contigs[1];
        assert_eq!(b.xy_seq_start % 100_000, 0);
        assert_eq!(b.title_padding, 100_000);
        assert_eq!(b.xy_seq_end - b.xy_seq_start, 150_000);

        let dir = tempfile::tempdir().unwrap();
        let path = manifest_path(dir.path(), "genome");
        manifest.write(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["contigs"][1]["name"], "b");
        assert_eq!(value["legend"][0]["symbol"], "A");
        assert_eq!(value["levels"][1]["axis"], "y");
    }
}

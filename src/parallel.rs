//! Several aligned genomes interleaved into adjacent sub-columns of one image.

use std::path::Path;
use std::time::Instant;

use log::{info, warn};
use sha2::{Digest, Sha256};

use crate::canvas::{Canvas, TextBox};
use crate::config::{Axis, LayoutConfig, LevelSpec};
use crate::error::{LayoutError, Result};
use crate::font::{advance, line_height};
use crate::levels::LevelStack;
use crate::palette::{hex_to_rgb, Palette, Rgb, GAP_CHAR};
use crate::planner::{PaddingPlanner, Plan};
use crate::render::{
    draw_symbols, draw_titles, run_extras, ExtrasPass, GenomeShift, PassReport, RenderContext,
    RenderReport,
};
use crate::source::Segment;

/// Index of the level whose steps are bundles of genome columns.
pub const BUNDLE_LEVEL: usize = 2;

const COLUMN_COLORS: [u32; 8] = [
    0xFFFFFF, 0xE5F3FF, 0xEAFFE5, 0xFFE7E5, 0xF8E5FF, 0xFFF3E5, 0xFFFFE5, 0xFFF6E5,
];
const BORDER_MARGIN: u64 = 3;
const NAME_SEPARATOR: &str = "      ";
const NAME_COLOR: Rgb = [30, 30, 30];
const NAME_SCALE: u32 = 40;
const NAME_TOP: u64 = 6;

/// One input of a parallel layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    pub name: String,
    pub segments: Vec<Segment>,
}

impl Genome {
    pub fn new(name: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            name: name.into(),
            segments,
        }
    }
}

/// Pastel tint for genomes past the fixed column colors, from a SHA-256 of the name.
pub fn derived_tint(name: &str) -> Rgb {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    let hash = hasher.finalize();
    [hash[24], hash[8], hash[16]].map(|c| 255 - (255 - c) / 5)
}

#[derive(Debug, Clone)]
pub struct ParallelLayout {
    config: LayoutConfig,
    stack: LevelStack,
    palette: Palette,
    planner: PaddingPlanner,
    n_genomes: usize,
    column_offset: u64,
}

impl ParallelLayout {
    /// Rebuild the tiled stack around bundles of `n_genomes` columns.
    pub fn new(config: LayoutConfig, n_genomes: usize) -> Result<Self> {
        config.validate()?;
        if n_genomes == 0 {
            return Err(LayoutError::config("a parallel layout needs at least one genome"));
        }
        let base = match &config.custom_layout {
            Some(specs) => specs.clone(),
            None => LevelStack::tiled_specs(config.base_width),
        };
        if base.len() <= BUNDLE_LEVEL {
            return Err(LayoutError::config(
                "a parallel layout needs lines, columns and rows in its base layout",
            ));
        }

        let overflow = || LayoutError::config("parallel layout dimensions overflow");
        let column_thickness = base[0].radix;
        let column_padding = base[BUNDLE_LEVEL].padding;
        let column_pitch = column_thickness
            .checked_add(column_padding)
            .ok_or_else(overflow)?;
        let row_width = base[BUNDLE_LEVEL]
            .radix
            .checked_mul(column_pitch)
            .ok_or_else(overflow)?;
        let bundle_width = column_pitch
            .checked_mul(n_genomes as u64)
            .and_then(|w| w.checked_add(column_padding.checked_mul(2)?))
            .ok_or_else(overflow)?;
        let bundles_per_row = row_width / bundle_width;
        if bundles_per_row == 0 {
            return Err(LayoutError::config(format!(
                "{} genomes do not fit in one row of {} pixels",
                n_genomes, row_width
            )));
        }

        let mut specs = base[..BUNDLE_LEVEL].to_vec();
        specs.push(
            LevelSpec::new(bundles_per_row, bundle_width - column_thickness)
                .on_axis(Axis::for_depth(BUNDLE_LEVEL)),
        );
        specs.push(LevelSpec::new(10, 36).on_axis(Axis::for_depth(3)));
        specs.push(LevelSpec::new(3, 36 * 3 * 5).on_axis(Axis::for_depth(4)));
        specs.push(LevelSpec::new(999, 162).on_axis(Axis::for_depth(5)));

        let mut stack = LevelStack::from_specs(&specs, [0, 0], 0)?;
        // one row reserved for the combined title; the bundle level bounds both terms
        let row_pitch = stack.level(3).pitch();
        stack.set_origin([column_padding, row_pitch + column_padding]);
        stack.set_margin(2 * column_padding);

        let palette = Palette::from_config(&config);
        let planner = PaddingPlanner::from_config(&config).skipping_first_title();
        Ok(Self {
            config,
            stack,
            palette,
            planner,
            n_genomes,
            column_offset: column_pitch,
        })
    }

    pub fn stack(&self) -> &LevelStack {
        &self.stack
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn column_offset(&self) -> u64 {
        self.column_offset
    }

    pub fn n_genomes(&self) -> usize {
        self.n_genomes
    }

    pub fn shift(&self) -> GenomeShift {
        GenomeShift {
            axis: self.stack.level(BUNDLE_LEVEL).axis,
            column_offset: self.column_offset,
        }
    }

    /// Screen position of `offset` for genome `genome`.
    pub fn position_on_screen(&self, genome: usize, offset: u64) -> (u64, u64) {
        let mut ctx = RenderContext::with_shift(self.shift());
        ctx.genome_index = genome as u64;
        ctx.position(&self.stack, offset)
    }

    /// Canvas size, including the shift of the last genome when a single
    /// bundle is used.
    pub fn max_dimensions(&self, total_length: u64) -> (u64, u64) {
        let mut extent = self.stack.extents(total_length, self.stack.len());
        let axis = self.shift().axis.index();
        let inner = self.stack.extents(total_length, BUNDLE_LEVEL)[axis];
        let shifted = inner + (self.n_genomes as u64 - 1) * self.column_offset;
        extent[axis] = extent[axis].max(shifted);
        self.stack.dimensions_for_extents(extent)
    }

    pub fn tint(&self, genome: usize, name: &str) -> Rgb {
        match COLUMN_COLORS.get(genome) {
            Some(&hex) => hex_to_rgb(hex),
            None => derived_tint(name),
        }
    }

    /// Every genome must hold the same number of segments with the same lengths.
    pub fn check_alignment(&self, genomes: &[Genome]) -> Result<()> {
        if genomes.len() != self.n_genomes {
            return Err(LayoutError::alignment(format!(
                "expected {} genomes, got {}",
                self.n_genomes,
                genomes.len()
            )));
        }
        let reference = &genomes[0];
        for genome in &genomes[1..] {
            if genome.segments.len() != reference.segments.len() {
                return Err(LayoutError::alignment(format!(
                    "{} has {} segments but {} has {}",
                    genome.name,
                    genome.segments.len(),
                    reference.name,
                    reference.segments.len()
                )));
            }
            for (ours, theirs) in genome.segments.iter().zip(&reference.segments) {
                if ours.len() != theirs.len() {
                    return Err(LayoutError::alignment(format!(
                        "{}:{} is {} symbols long but {}:{} is {}",
                        genome.name,
                        ours.name,
                        ours.len(),
                        reference.name,
                        theirs.name,
                        theirs.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// One plan per genome. The first genome's plan sizes the image.
    pub fn plan(&self, genomes: &[Genome]) -> Result<Vec<Plan>> {
        self.check_alignment(genomes)?;
        genomes
            .iter()
            .map(|g| self.planner.plan(&self.stack, g.segments.clone()))
            .collect()
    }

    pub fn render(&self, genomes: &[Genome], plans: &[Plan], output: &Path) -> Result<RenderReport> {
        let start = Instant::now();
        let image_length = plans.first().map_or(0, |p| p.image_length);
        let (width, height) = self.max_dimensions(image_length);
        let mut canvas = Canvas::new(width, height, self.config.max_pixels)?;
        if self.config.background_colors {
            self.fill_colored_borders(&mut canvas, genomes, image_length);
        }
        info!("Initialized Image: {:?}", start.elapsed());

        let mut ctx = RenderContext::with_shift(self.shift());
        let mut passes = Vec::with_capacity(genomes.len() * 2 + 1);
        for (index, (genome, plan)) in genomes.iter().zip(plans).enumerate() {
            ctx.genome_index = index as u64;
            let palette = if self.config.background_colors {
                self.palette.with_color(GAP_CHAR, self.tint(index, &genome.name))
            } else {
                self.palette.clone()
            };
            passes.push(draw_symbols(&self.stack, &palette, &mut canvas, &ctx, plan));
            if self.config.use_titles {
                passes.push(draw_titles(&self.stack, &mut canvas, &mut ctx, plan));
            }
            info!("Drew genome: {} {:?}", genome.name, start.elapsed());
        }

        ctx.genome_index = 0;
        let names = GenomeNames {
            names: genomes
                .iter()
                .enumerate()
                .map(|(i, g)| (g.name.clone(), self.tint(i, &g.name)))
                .collect(),
            background: self.config.background_colors,
        };
        let empty = Plan::default();
        passes.push(run_extras(&names, &mut canvas, &mut ctx, plans.first().unwrap_or(&empty)));

        canvas.save_png(output)?;
        info!("Output Image in: {:?}", start.elapsed());
        Ok(RenderReport {
            output: output.to_path_buf(),
            width,
            height,
            image_length,
            passes,
        })
    }

    pub fn process(&self, genomes: &[Genome], output: &Path) -> Result<(Vec<Plan>, RenderReport)> {
        let plans = self.plan(genomes)?;
        let report = self.render(genomes, &plans, output)?;
        Ok((plans, report))
    }

    /// A tinted rectangle behind each column of genomes 1..n.
    fn fill_colored_borders(&self, canvas: &mut Canvas, genomes: &[Genome], image_length: u64) {
        let column_size = self.stack.chunk_size(1);
        for (index, genome) in genomes.iter().enumerate().skip(1) {
            let color = self.tint(index, &genome.name);
            let mut column = 0;
            while column < image_length {
                let (left, top) = self.position_on_screen(index, column);
                let (right, bottom) = self.position_on_screen(index, column + column_size - 1);
                canvas.fill_rect(
                    left.saturating_sub(BORDER_MARGIN),
                    top.saturating_sub(BORDER_MARGIN),
                    right + BORDER_MARGIN,
                    bottom + BORDER_MARGIN,
                    color,
                );
                column += column_size;
            }
        }
    }
}

/// The combined title row: every genome name, centered, each on its tint.
struct GenomeNames {
    names: Vec<(String, Rgb)>,
    background: bool,
}

impl ExtrasPass for GenomeNames {
    fn draw_extras(
        &self,
        canvas: &mut Canvas,
        ctx: &mut RenderContext,
        _plan: &Plan,
        report: &mut PassReport,
    ) -> Result<()> {
        let span = self
            .names
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR);
        let chars = span.len().max(1) as u64;
        let fit = (canvas.width() / (chars * advance(1) as u64)).max(1);
        let scale = fit.min(NAME_SCALE as u64) as u32;
        let cell = advance(scale) as u64;

        let mut left = (canvas.width() / 2).saturating_sub(chars * cell / 2);
        for (name, tint) in &self.names {
            let width = name.len() as u64 * cell;
            let bounds = TextBox {
                left,
                top: NAME_TOP,
                width,
                height: line_height(scale) as u64,
            };
            if self.background {
                canvas.fill_rect(
                    left,
                    NAME_TOP,
                    left + width,
                    NAME_TOP + bounds.height,
                    *tint,
                );
            }
            let line = vec![name.as_bytes().to_vec()];
            match canvas.draw_text(&line, scale, bounds, false, NAME_COLOR, &mut ctx.glyphs) {
                Ok(()) => report.drawn += 1,
                Err(fault) => {
                    warn!("Could not write genome name {}", name);
                    report.record(fault)
                }
            }
            left += (name.len() + NAME_SEPARATOR.len()) as u64 * cell;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::TILE_LABEL_LEVEL;

    fn layout(n: usize) -> ParallelLayout {
        ParallelLayout::new(LayoutConfig::default(), n).unwrap()
    }

    #[test]
    fn bundle_levels_follow_genome_count() {
        let layout = layout(2);
        let stack = layout.stack();
        assert_eq!(stack.len(), 6);
        assert_eq!(layout.column_offset(), 106);
        // 10600 / (106 * 2 + 12)
        assert_eq!(stack.level(BUNDLE_LEVEL).radix, 47);
        assert_eq!(stack.level(BUNDLE_LEVEL).pitch(), 224);
        assert_eq!(stack.level(3).pitch(), 1036);
        assert_eq!(stack.origin(), [6, 1042]);
        assert_eq!(stack.chunk_size(TILE_LABEL_LEVEL), 100_000 * 47);
    }

    #[test]
    fn second_genome_is_shifted_one_column() {
        let layout = layout(2);
        for offset in [0, 99, 100, 123_456, 5_000_000] {
            let (x0, y0) = layout.position_on_screen(0, offset);
            let (x1, y1) = layout.position_on_screen(1, offset);
            assert_eq!((x1, y1), (x0 + 106, y0));
        }
    }

    #[test]
    fn max_dimensions_cover_the_last_genome() {
        let layout = layout(3);
        let (w, _) = layout.max_dimensions(150_000);
        let (x, _) = layout.position_on_screen(2, 149_999);
        assert!(x < w);
    }

    #[test]
    fn oversized_column_padding_is_a_config_error() {
        let config = LayoutConfig {
            custom_layout: Some(
                crate::config::parse_custom_layout("([100,1000,100],[0,0,18446744073709551615])")
                    .unwrap(),
            ),
            ..LayoutConfig::default()
        };
        let err = ParallelLayout::new(config, 2).unwrap_err();
        assert!(matches!(err, LayoutError::Config(_)));
    }

    #[test]
    fn misaligned_genomes_are_rejected() {
        let layout = layout(2);
        let a = Genome::new("a", vec![Segment::new("x", vec![b'A'; 10])]);
        let b = Genome::new("b", vec![Segment::new("x", vec![b'A'; 11])]);
        let err = layout.plan(&[a.clone(), b]).unwrap_err();
        assert!(matches!(err, LayoutError::Alignment(_)));
        assert!(layout.plan(&[a]).is_err());
    }

    #[test]
    fn first_title_is_folded_into_the_tail() {
        let layout = layout(2);
        let genomes = [
            Genome::new("a", vec![Segment::new("x", vec![b'A'; 150_000])]),
            Genome::new("b", vec![Segment::new("x", vec![b'C'; 150_000])]),
        ];
        let plans = layout.plan(&genomes).unwrap();
        assert_eq!(plans[0].segments[0].padding.title, 0);
        assert_eq!(plans[0].image_length, plans[1].image_length);
    }

    #[test]
    fn tints_extend_past_fixed_colors() {
        let layout = layout(9);
        assert_eq!(layout.tint(0, "a"), [255, 255, 255]);
        assert_eq!(layout.tint(1, "a"), hex_to_rgb(0xE5F3FF));
        let derived = layout.tint(8, "ninth");
        assert_eq!(derived, derived_tint("ninth"));
        assert!(derived.iter().all(|&c| c >= 204));
    }

    #[test]
    fn renders_colored_borders_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("parallel.png");
        let config = LayoutConfig {
            background_colors: true,
            ..LayoutConfig::default()
        };
        let layout = ParallelLayout::new(config, 2).unwrap();
        let genomes = [
            Genome::new("human", vec![Segment::new("chr", b"AC-T".repeat(300))]),
            Genome::new("chimp", vec![Segment::new("chr", b"ACGT".repeat(300))]),
        ];
        let (_, report) = layout.process(&genomes, &out).unwrap();
        assert!(out.exists());
        assert_eq!(report.passes.len(), 5);
        assert!(report.fault_count() == 0, "{:?}", report.passes);

        let img = image::open(&out).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (report.width as u32, report.height as u32));
        // the gap in the first genome takes its (white) tint
        let (x, y) = layout.position_on_screen(0, 2);
        assert_eq!(img.get_pixel(x as u32, y as u32).0, [255, 255, 255]);
        // border of the second genome sits just left of its column
        let (x, y) = layout.position_on_screen(1, 0);
        assert_eq!(img.get_pixel(x as u32 - 1, y as u32).0, hex_to_rgb(0xE5F3FF));
    }
}

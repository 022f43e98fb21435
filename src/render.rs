//! Sequential rendering pipeline: symbols, titles, extras, output.
//!
//! Each pass walks the plan from offset 0 and reports what it drew and which
//! writes it had to skip. A pass never aborts the pipeline; only planning and
//! canvas allocation are fatal.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::canvas::{Canvas, TextBox};
use crate::config::{Axis, LayoutConfig};
use crate::error::{DrawFault, Result};
use crate::font::{advance, line_height, wrap_title, GlyphCache};
use crate::levels::{LevelStack, TILE_LABEL_LEVEL};
use crate::palette::{Palette, Rgb};
use crate::planner::{PaddingPlanner, Plan, PlannedSegment};
use crate::source::{sort_by_length, Segment};

/// Faults kept verbatim per pass; the rest are only counted.
pub const MAX_RECORDED_FAULTS: usize = 256;

const TITLE_COLOR: Rgb = [0, 0, 0];

/// Extra offset applied to every position of one genome in an interleaved layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomeShift {
    pub axis: Axis,
    pub column_offset: u64,
}

/// Mutable state threaded through the passes of one render call.
#[derive(Debug, Default)]
pub struct RenderContext {
    pub genome_index: u64,
    pub shift: Option<GenomeShift>,
    pub glyphs: GlyphCache,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift(shift: GenomeShift) -> Self {
        Self {
            shift: Some(shift),
            ..Self::default()
        }
    }

    pub fn position(&self, stack: &LevelStack, offset: u64) -> (u64, u64) {
        let (x, y) = stack.position_on_screen(offset);
        match self.shift {
            Some(shift) => {
                let delta = self.genome_index * shift.column_offset;
                match shift.axis {
                    Axis::X => (x.saturating_add(delta), y),
                    Axis::Y => (x, y.saturating_add(delta)),
                }
            }
            None => (x, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Symbols,
    Titles,
    Extras,
}

#[derive(Debug, Clone)]
pub struct PassReport {
    pub pass: Pass,
    pub genome: u64,
    /// Symbols painted, titles written, or extras drawn.
    pub drawn: u64,
    pub faults: Vec<DrawFault>,
    pub fault_count: u64,
    pub error: Option<String>,
}

impl PassReport {
    pub fn new(pass: Pass, genome: u64) -> Self {
        Self {
            pass,
            genome,
            drawn: 0,
            faults: Vec::new(),
            fault_count: 0,
            error: None,
        }
    }

    pub fn record(&mut self, fault: DrawFault) {
        warn!("{:?} pass: {}", self.pass, fault);
        self.fault_count += 1;
        if self.faults.len() < MAX_RECORDED_FAULTS {
            self.faults.push(fault);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.fault_count == 0 && self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct RenderReport {
    pub output: PathBuf,
    pub width: u64,
    pub height: u64,
    pub image_length: u64,
    pub passes: Vec<PassReport>,
}

impl RenderReport {
    pub fn fault_count(&self) -> u64 {
        self.passes.iter().map(|p| p.fault_count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.passes.iter().all(PassReport::is_clean)
    }

    pub fn pass(&self, pass: Pass) -> Option<&PassReport> {
        self.passes.iter().find(|p| p.pass == pass)
    }
}

/// Hook for layouts that paint something beyond symbols and titles.
pub trait ExtrasPass {
    fn draw_extras(
        &self,
        canvas: &mut Canvas,
        ctx: &mut RenderContext,
        plan: &Plan,
        report: &mut PassReport,
    ) -> Result<()>;
}

pub struct NoExtras;

impl ExtrasPass for NoExtras {
    fn draw_extras(
        &self,
        _canvas: &mut Canvas,
        _ctx: &mut RenderContext,
        _plan: &Plan,
        _report: &mut PassReport,
    ) -> Result<()> {
        Ok(())
    }
}

/// Paint every symbol of every segment, row by row.
pub fn draw_symbols(
    stack: &LevelStack,
    palette: &Palette,
    canvas: &mut Canvas,
    ctx: &RenderContext,
    plan: &Plan,
) -> PassReport {
    let mut report = PassReport::new(Pass::Symbols, ctx.genome_index);
    let line = stack.base_width();
    let n = plan.segments.len();
    let mut progress = 0u64;

    for (index, planned) in plan.segments.iter().enumerate() {
        progress += planned.padding.reset + planned.padding.title;
        let mut rest: &[u8] = &planned.segment.symbols;
        while !rest.is_empty() {
            // never let a row run past the end of a line
            let room = (line - progress % line) as usize;
            let (row, tail) = rest.split_at(room.min(rest.len()));
            let (x, y) = ctx.position(stack, progress);
            match canvas.paint_row(x, y, row, palette) {
                Ok(()) => report.drawn += row.len() as u64,
                Err(fault) => report.record(fault),
            }
            progress += row.len() as u64;
            rest = tail;
        }
        progress += planned.padding.tail;

        if n < 100 || index % (n / 100) == 0 {
            info!(
                "{:.1}% done: {}",
                progress as f64 / plan.image_length.max(1) as f64 * 100.0,
                planned.name()
            );
        }
    }
    report
}

/// Font scale, wrap width and orientation for one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleStyle {
    pub scale: u32,
    pub wrap: usize,
    pub lines: usize,
    pub vertical: bool,
}

/// Larger reservations get larger type. A title filling exactly one unit of a
/// level is oriented along that level's axis.
pub fn title_style(stack: &LevelStack, title_padding: u64, name: &str) -> TitleStyle {
    let mut style = TitleStyle {
        scale: 1,
        wrap: 18,
        lines: 2,
        vertical: false,
    };
    if stack.len() > 1 && title_padding == stack.chunk_size(1) {
        style.scale = 4;
        style.wrap = 50;
        style.vertical = stack.level(1).axis == Axis::Y;
    }
    if stack.len() > TILE_LABEL_LEVEL {
        let tile_label = stack.chunk_size(TILE_LABEL_LEVEL);
        if title_padding >= tile_label {
            style.scale = 40;
            style.wrap = 50;
            style.vertical = stack.level(TILE_LABEL_LEVEL).axis == Axis::Y;
        }
        if title_padding == tile_label && name.len() < 24 {
            style.scale = 80;
            style.wrap = 25;
        }
    }
    style
}

/// Write each segment's name into the blank space reserved ahead of it.
pub fn draw_titles(
    stack: &LevelStack,
    canvas: &mut Canvas,
    ctx: &mut RenderContext,
    plan: &Plan,
) -> PassReport {
    let mut report = PassReport::new(Pass::Titles, ctx.genome_index);
    let threshold = stack.base_width();
    let mut progress = 0u64;

    for planned in &plan.segments {
        progress += planned.padding.reset;
        if planned.padding.title > threshold {
            match draw_title(stack, canvas, ctx, progress, planned) {
                Ok(()) => report.drawn += 1,
                Err(fault) => report.record(fault),
            }
        }
        progress += planned.padding.title + planned.len() + planned.padding.tail;
    }
    debug!("Drew {} titles", report.drawn);
    report
}

fn draw_title(
    stack: &LevelStack,
    canvas: &mut Canvas,
    ctx: &mut RenderContext,
    progress: u64,
    planned: &PlannedSegment,
) -> std::result::Result<(), DrawFault> {
    let (left, top) = ctx.position(stack, progress);
    let (right, bottom) = ctx.position(stack, progress + planned.padding.title - 2);
    let bounds = TextBox {
        left,
        top,
        width: right.saturating_sub(left),
        height: bottom.saturating_sub(top),
    };

    let style = title_style(stack, planned.padding.title, planned.name());
    let (along, across) = if style.vertical {
        (bounds.height, bounds.width)
    } else {
        (bounds.width, bounds.height)
    };
    let fits = (along / advance(style.scale) as u64).max(1) as usize;
    let fit_lines = (across / line_height(style.scale) as u64).max(1) as usize;
    let lines = wrap_title(
        planned.name(),
        style.wrap.min(fits),
        style.lines.min(fit_lines),
    );
    canvas.draw_text(
        &lines,
        style.scale,
        bounds,
        style.vertical,
        TITLE_COLOR,
        &mut ctx.glyphs,
    )
}

/// Run an extras hook, turning its error into part of the report.
pub fn run_extras(
    extras: &dyn ExtrasPass,
    canvas: &mut Canvas,
    ctx: &mut RenderContext,
    plan: &Plan,
) -> PassReport {
    let mut report = PassReport::new(Pass::Extras, ctx.genome_index);
    if let Err(e) = extras.draw_extras(canvas, ctx, plan, &mut report) {
        warn!("Encountered error while drawing extras: {}", e);
        report.error = Some(e.to_string());
    }
    report
}

/// Single-genome layout: one level stack, one palette, one image.
#[derive(Debug, Clone)]
pub struct TileLayout {
    config: LayoutConfig,
    stack: LevelStack,
    palette: Palette,
    planner: PaddingPlanner,
}

impl TileLayout {
    pub fn new(config: LayoutConfig) -> Result<Self> {
        let stack = LevelStack::from_config(&config)?;
        let palette = Palette::from_config(&config);
        let planner = PaddingPlanner::from_config(&config);
        Ok(Self {
            config,
            stack,
            palette,
            planner,
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn stack(&self) -> &LevelStack {
        &self.stack
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn planner(&self) -> &PaddingPlanner {
        &self.planner
    }

    pub fn plan(&self, mut segments: Vec<Segment>) -> Result<Plan> {
        if self.config.sort_contigs {
            sort_by_length(&mut segments);
        }
        self.planner.plan(&self.stack, segments)
    }

    pub fn render(&self, plan: &Plan, output: &Path) -> Result<RenderReport> {
        self.render_with(plan, output, &NoExtras)
    }

    pub fn render_with(
        &self,
        plan: &Plan,
        output: &Path,
        extras: &dyn ExtrasPass,
    ) -> Result<RenderReport> {
        let start = Instant::now();
        let (width, height) = self.stack.max_dimensions(plan.image_length);
        let mut canvas = Canvas::new(width, height, self.config.max_pixels)?;
        info!("Initialized Image: {:?}", start.elapsed());

        let mut ctx = RenderContext::new();
        let mut passes = Vec::with_capacity(3);
        passes.push(draw_symbols(&self.stack, &self.palette, &mut canvas, &ctx, plan));
        info!("Drew Nucleotides: {:?}", start.elapsed());
        if self.config.use_titles {
            passes.push(draw_titles(&self.stack, &mut canvas, &mut ctx, plan));
            info!("Drew Titles: {:?}", start.elapsed());
        }
        passes.push(run_extras(extras, &mut canvas, &mut ctx, plan));

        canvas.save_png(output)?;
        info!("Output Image in: {:?}", start.elapsed());
        Ok(RenderReport {
            output: output.to_path_buf(),
            width,
            height,
            image_length: plan.image_length,
            passes,
        })
    }

    /// Plan then render.
    pub fn process(&self, segments: Vec<Segment>, output: &Path) -> Result<(Plan, RenderReport)> {
        let plan = self.plan(segments)?;
        let report = self.render(&plan, output)?;
        Ok((plan, report))
    }
}

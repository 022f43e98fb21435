use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use rayon::prelude::*;

use seqtile::config::parse_custom_layout;
use seqtile::export::{manifest_path, Manifest};
use seqtile::source::{display_name, read_fasta};
use seqtile::{Genome, LayoutConfig, PaletteKind, ParallelLayout, RenderReport, TileLayout};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LayoutMode {
    /// One image per input file.
    Tiled,
    /// All inputs interleaved column by column in one image.
    Parallel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PaletteArg {
    Nucleotide,
    Protein,
    Spectrum,
}

impl From<PaletteArg> for PaletteKind {
    fn from(arg: PaletteArg) -> Self {
        match arg {
            PaletteArg::Nucleotide => PaletteKind::Nucleotide,
            PaletteArg::Protein => PaletteKind::Protein,
            PaletteArg::Spectrum => PaletteKind::Spectrum,
        }
    }
}

#[derive(Parser)]
#[command(name = "seqtile")]
#[command(about = "Render sequences as a single zoomable image of nested tiles.", long_about = None)]
struct Args {
    // MANDATORY OPTIONS
    /// Read sequences in FASTA format from this FILE. Repeat for several inputs.
    #[arg(short = 'i', long = "input", value_name = "FILE", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Write images into this directory.
    #[arg(short = 'o', long = "out-dir", value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Base name of the output image (defaults to the input file name).
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    name: Option<String>,

    // Layout Options
    /// How to arrange the inputs.
    #[arg(short = 'L', long = "layout", value_enum, default_value_t = LayoutMode::Tiled)]
    layout: LayoutMode,

    /// Load layout settings from a JSON FILE. Flags below override it.
    #[arg(short = 'C', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Symbols per line of pixels.
    #[arg(short = 'w', long = "base-width", value_name = "N")]
    base_width: Option<u64>,

    /// Minimum blank border around the image in pixels.
    #[arg(short = 'b', long = "border-width", value_name = "N")]
    border_width: Option<u64>,

    /// Custom level radii and paddings, e.g. "([100,100,10],[0,0,6])".
    #[arg(short = 'c', long = "custom-layout", value_name = "LEVELS")]
    custom_layout: Option<String>,

    /// Don't reserve space for contig titles.
    #[arg(short = 'T', long = "no-titles")]
    no_titles: bool,

    /// Draw the longest contigs first.
    #[arg(short = 's', long = "sort-contigs")]
    sort_contigs: bool,

    // Color Options
    /// Color scheme for the symbols.
    #[arg(short = 'p', long = "palette", value_enum)]
    palette: Option<PaletteArg>,

    /// Use the softer, natural nucleotide colors.
    #[arg(short = 'N', long = "natural-colors")]
    natural_colors: bool,

    /// Tint each genome's columns in the parallel layout.
    #[arg(short = 'B', long = "background-colors")]
    background_colors: bool,

    // Output Options
    /// Also write a <name>.layout.json manifest next to each image.
    #[arg(short = 'm', long = "manifest")]
    manifest: bool,

    // Threading
    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn layout_config(args: &Args) -> anyhow::Result<LayoutConfig> {
    let mut config = match &args.config {
        Some(path) => LayoutConfig::from_json_file(path)
            .with_context(|| format!("loading layout config {:?}", path))?,
        None => LayoutConfig::default(),
    };
    if let Some(width) = args.base_width {
        config.base_width = width;
    }
    if let Some(border) = args.border_width {
        config.border_width = border;
    }
    if let Some(levels) = &args.custom_layout {
        config.custom_layout = Some(parse_custom_layout(levels)?);
    }
    if let Some(palette) = args.palette {
        config.palette = palette.into();
    }
    config.use_titles &= !args.no_titles;
    config.sort_contigs |= args.sort_contigs;
    config.low_contrast |= args.natural_colors;
    config.background_colors |= args.background_colors;
    config.validate()?;
    Ok(config)
}

fn summarize(report: &RenderReport) {
    info!(
        "{:?}: {} x {} pixels, {} layout offsets",
        report.output, report.width, report.height, report.image_length
    );
    for pass in report.passes.iter().filter(|p| !p.is_clean()) {
        warn!(
            "{:?} pass of genome {} skipped {} writes{}",
            pass.pass,
            pass.genome,
            pass.fault_count,
            pass.error
                .as_deref()
                .map(|e| format!(" and failed: {}", e))
                .unwrap_or_default()
        );
    }
}

fn run_tiled(args: &Args, config: &LayoutConfig) -> anyhow::Result<()> {
    let single = args.inputs.len() == 1;
    let failures: Vec<(PathBuf, anyhow::Error)> = args
        .inputs
        .par_iter()
        .filter_map(|input| {
            let name = match (&args.name, single) {
                (Some(name), true) => name.clone(),
                _ => display_name(input),
            };
            tiled_job(input, &name, &args.out_dir, config, args.manifest)
                .err()
                .map(|e| (input.clone(), e))
        })
        .collect();

    for (input, e) in &failures {
        log::error!("{:?}: {:#}", input, e);
    }
    if !failures.is_empty() {
        bail!("{} of {} inputs failed", failures.len(), args.inputs.len());
    }
    Ok(())
}

fn tiled_job(
    input: &Path,
    name: &str,
    out_dir: &Path,
    config: &LayoutConfig,
    manifest: bool,
) -> anyhow::Result<()> {
    let segments = read_fasta(input)?;
    let layout = TileLayout::new(config.clone())?;
    let output = out_dir.join(format!("{}.png", name));
    let (plan, report) = layout
        .process(segments, &output)
        .with_context(|| format!("rendering {:?}", input))?;
    summarize(&report);
    if manifest {
        Manifest::new(layout.stack(), layout.palette(), &plan, (report.width, report.height))
            .write(&manifest_path(out_dir, name))?;
    }
    Ok(())
}

fn run_parallel(args: &Args, config: LayoutConfig) -> anyhow::Result<()> {
    let genomes = args
        .inputs
        .par_iter()
        .map(|input| -> anyhow::Result<Genome> {
            Ok(Genome::new(display_name(input), read_fasta(input)?))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let name = args.name.clone().unwrap_or_else(|| {
        genomes
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join("_vs_")
    });

    let layout = ParallelLayout::new(config, genomes.len())?;
    let output = args.out_dir.join(format!("{}.png", name));
    let (plans, report) = layout
        .process(&genomes, &output)
        .context("rendering parallel layout")?;
    summarize(&report);
    if args.manifest {
        if let Some(plan) = plans.first() {
            Manifest::new(layout.stack(), layout.palette(), plan, (report.width, report.height))
                .write(&manifest_path(&args.out_dir, &name))?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the thread pool")?;
    }

    let config = layout_config(&args)?;
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory {:?}", args.out_dir))?;

    info!("Starting visualization...");
    match args.layout {
        LayoutMode::Tiled => run_tiled(&args, &config)?,
        LayoutMode::Parallel => run_parallel(&args, config)?,
    }
    info!("Done.");
    Ok(())
}

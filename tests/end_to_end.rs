use std::fs;

use seqtile::export::{manifest_path, Manifest};
use seqtile::render::Pass;
use seqtile::source::read_fasta;
use seqtile::{LayoutConfig, LayoutError, Segment, TileLayout};

fn contig(name: &str, len: usize) -> Segment {
    Segment::new(name, b"GATTACA".iter().copied().cycle().take(len).collect::<Vec<u8>>())
}

#[test]
fn three_contigs_render_at_planned_size() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("three.png");
    let layout = TileLayout::new(LayoutConfig::default()).unwrap();

    let segments = vec![contig("tiny", 50), contig("chr2", 150_000), contig("dot", 3)];
    let (plan, report) = layout.process(segments, &output).unwrap();

    assert_eq!(plan.segments[0].padding.title, 0);
    assert!(plan.segments[1].padding.title >= 100_000);
    assert_eq!(plan.image_length, 400_099);

    let expected = layout.stack().max_dimensions(plan.image_length);
    assert_eq!((report.width, report.height), expected);
    let image = image::open(&output).unwrap().to_rgb8();
    assert_eq!(
        (image.width() as u64, image.height() as u64),
        expected
    );

    let symbols = report.pass(Pass::Symbols).unwrap();
    assert_eq!(symbols.drawn, 150_053);
    assert!(report.is_clean(), "{:?}", report.passes);
    // only the long contig earns a painted title
    assert_eq!(report.pass(Pass::Titles).unwrap().drawn, 1);

    // first symbol of chr2 sits at the top of the third column
    let start: u64 = plan.segments[..2]
        .iter()
        .map(|s| s.padding.total() + s.len())
        .sum::<u64>()
        - plan.segments[1].padding.tail
        - plan.segments[1].len();
    let (x, y) = layout.stack().position_on_screen(start);
    assert_eq!((x, y), (6 + 2 * 106, 6));
    assert_eq!(
        image.get_pixel(x as u32, y as u32).0,
        layout.palette().color(b'G')
    );
}

#[test]
fn fasta_to_png_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let fasta = dir.path().join("sample.fa");
    fs::write(&fasta, ">short\nacgt\n>long\nACGTACGTNN\nACGT\n").unwrap();

    let config = LayoutConfig {
        sort_contigs: true,
        ..LayoutConfig::default()
    };
    let layout = TileLayout::new(config).unwrap();
    let segments = read_fasta(&fasta).unwrap();
    let output = dir.path().join("sample.png");
    let (plan, report) = layout.process(segments, &output).unwrap();

    assert_eq!(plan.segments[0].name(), "long");
    assert_eq!(plan.segments[1].segment.symbols, b"ACGT");
    assert!(output.exists());

    let path = manifest_path(dir.path(), "sample");
    Manifest::new(layout.stack(), layout.palette(), &plan, (report.width, report.height))
        .write(&path)
        .unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(manifest["image_width"], report.width);
    assert_eq!(manifest["contigs"].as_array().unwrap().len(), 2);
}

#[test]
fn oversized_canvas_is_a_resource_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = LayoutConfig {
        max_pixels: 1_000,
        ..LayoutConfig::default()
    };
    let layout = TileLayout::new(config).unwrap();
    let err = layout
        .process(vec![contig("a", 5_000)], &dir.path().join("a.png"))
        .unwrap_err();
    match err {
        LayoutError::Resource { width, height, .. } => {
            assert_eq!((width, height), layout.stack().max_dimensions(5_099));
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(!dir.path().join("a.png").exists());
}

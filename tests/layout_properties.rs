use proptest::prelude::*;

use seqtile::config::parse_custom_layout;
use seqtile::palette::FALLBACK_COLOR;
use seqtile::{
    Genome, LayoutConfig, LevelSpec, LevelStack, PaddingPlanner, Palette, ParallelLayout, Segment,
};

fn stack_for(base_width: u64) -> LevelStack {
    let config = LayoutConfig {
        base_width,
        ..LayoutConfig::default()
    };
    LevelStack::from_config(&config).unwrap()
}

fn segments(lengths: &[usize]) -> Vec<Segment> {
    lengths
        .iter()
        .enumerate()
        .map(|(i, &len)| Segment::new(format!("contig{}", i), vec![b'A'; len]))
        .collect()
}

proptest! {
    #[test]
    fn positions_stay_inside_the_canvas(
        base_width in 10u64..200,
        lengths in prop::collection::vec(1usize..300_000, 1..6),
        samples in prop::collection::vec(any::<u64>(), 32),
    ) {
        let stack = stack_for(base_width);
        let planner = PaddingPlanner::from_config(&LayoutConfig::default());
        let plan = planner.plan(&stack, segments(&lengths)).unwrap();
        let (width, height) = stack.max_dimensions(plan.image_length);
        for sample in samples.into_iter().chain([0, plan.image_length - 1]) {
            let offset = sample % plan.image_length;
            let (x, y) = stack.position_on_screen(offset);
            prop_assert!(x < width && y < height, "offset {} at ({}, {}) outside {}x{}", offset, x, y, width, height);
        }
    }

    #[test]
    fn coordinates_round_trip(offset in 0u64..10_000_000_000) {
        let stack = stack_for(100);
        prop_assert_eq!(stack.offset_from_coordinates(&stack.coordinates(offset)), offset);
    }

    #[test]
    fn chunk_size_is_radix_times_finer_chunk(radii in prop::collection::vec(1u64..50, 1..7)) {
        let specs: Vec<LevelSpec> = radii.iter().map(|&r| LevelSpec::new(r, 2)).collect();
        let stack = LevelStack::from_specs(&specs, [0, 0], 0).unwrap();
        prop_assert_eq!(stack.chunk_size(0), radii[0]);
        for i in 1..stack.len() {
            prop_assert_eq!(stack.chunk_size(i), radii[i] * stack.chunk_size(i - 1));
        }
    }

    #[test]
    fn padding_and_lengths_sum_to_image_length(
        lengths in prop::collection::vec(0usize..400_000, 1..8),
        use_titles in any::<bool>(),
    ) {
        let config = LayoutConfig { use_titles, ..LayoutConfig::default() };
        let stack = LevelStack::from_config(&config).unwrap();
        let plan = PaddingPlanner::from_config(&config).plan(&stack, segments(&lengths)).unwrap();
        let sum: u64 = plan.segments.iter().map(|s| s.padding.total() + s.len()).sum();
        prop_assert_eq!(sum, plan.image_length);
    }

    #[test]
    fn calc_padding_depends_only_on_its_inputs(progress in 0u64..50_000_000, length in 0u64..5_000_000) {
        let stack = stack_for(100);
        let planner = PaddingPlanner::from_config(&LayoutConfig::default());
        let first = planner.calc_padding(&stack, progress, length).unwrap();
        let second = planner.calc_padding(&stack, progress, length).unwrap();
        prop_assert_eq!(first, second);
        // every segment starts on a line boundary
        if progress > 0 {
            prop_assert_eq!((progress + first.reset + first.title) % 100, 0);
        }
    }

    #[test]
    fn second_genome_is_one_column_over(offset in 0u64..100_000_000) {
        let layout = ParallelLayout::new(LayoutConfig::default(), 2).unwrap();
        let (x0, y0) = layout.position_on_screen(0, offset);
        let (x1, y1) = layout.position_on_screen(1, offset);
        prop_assert_eq!((x1, y1), (x0 + layout.column_offset(), y0));
    }

    #[test]
    fn every_genome_stays_inside_the_parallel_canvas(
        n_genomes in 1usize..9,
        lengths in prop::collection::vec(1usize..300_000, 1..5),
        samples in prop::collection::vec(any::<u64>(), 32),
    ) {
        let layout = ParallelLayout::new(LayoutConfig::default(), n_genomes).unwrap();
        let genomes: Vec<Genome> = (0..n_genomes)
            .map(|i| Genome::new(format!("genome{}", i), segments(&lengths)))
            .collect();
        let plans = layout.plan(&genomes).unwrap();
        let image_length = plans[0].image_length;
        let (width, height) = layout.max_dimensions(image_length);
        for genome in 0..n_genomes {
            for sample in samples.iter().copied().chain([0, image_length - 1]) {
                let offset = sample % image_length;
                let (x, y) = layout.position_on_screen(genome, offset);
                prop_assert!(
                    x < width && y < height,
                    "genome {} offset {} at ({}, {}) outside {}x{}", genome, offset, x, y, width, height
                );
            }
        }
    }

    #[test]
    fn unmapped_symbols_use_the_fallback(symbol in any::<u8>()) {
        let palette = Palette::sequence(false);
        if !palette.is_mapped(symbol) {
            prop_assert_eq!(palette.color(symbol), FALLBACK_COLOR);
        }
    }
}

#[test]
fn half_megabase_segment_on_a_custom_stack() {
    let config = LayoutConfig {
        custom_layout: Some(parse_custom_layout("([100,10,100,10,3,999])").unwrap()),
        ..LayoutConfig::default()
    };
    let stack = LevelStack::from_config(&config).unwrap();
    assert_eq!(stack.chunk_size(1), 1_000);
    assert_eq!(stack.chunk_size(2), 100_000);

    let planner = PaddingPlanner::from_config(&config);
    let padding = planner.calc_padding(&stack, 0, 500_000).unwrap();
    assert_eq!(padding.reset, 0);
    // the first level holding 500,000 + 2,600 is the 1,000,000 unit
    assert!(padding.title >= 100_000);
    assert_eq!((padding.total() + 500_000) % 100_000, 99_999);
}

#[test]
fn misaligned_genomes_never_render() {
    let layout = ParallelLayout::new(LayoutConfig::default(), 2).unwrap();
    let genomes = [
        Genome::new("a", segments(&[10, 20])),
        Genome::new("b", segments(&[10])),
    ];
    assert!(layout.plan(&genomes).is_err());
}

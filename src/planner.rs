//! Blank-space reservations around each segment.
//!
//! Every segment is preceded by a *reset* (blank symbols up to a level boundary)
//! and a *title* reservation, and followed by a *tail* that pads to the end of the
//! next finer unit. All three are measured in sequence offsets, so the renderer
//! can treat them as invisible symbols.

use log::debug;

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::levels::{LevelStack, TILE_LABEL_LEVEL};
use crate::source::Segment;

/// Pixel rows kept free for a title: 20px font height plus 6px margin.
pub const MIN_TITLE_ROWS: u64 = 20 + 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub reset: u64,
    pub title: u64,
    pub tail: u64,
}

impl Padding {
    pub fn total(&self) -> u64 {
        self.reset + self.title + self.tail
    }
}

/// Where a record's header and body start in an exported FASTA text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextOffsets {
    pub title_start: u64,
    pub seq_start: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSegment {
    pub segment: Segment,
    pub padding: Padding,
    pub text: TextOffsets,
}

impl PlannedSegment {
    pub fn name(&self) -> &str {
        &self.segment.name
    }

    pub fn len(&self) -> u64 {
        self.segment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    pub segments: Vec<PlannedSegment>,
    pub image_length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingPlanner {
    use_titles: bool,
    skip_short_titles: bool,
    short_title_threshold: u64,
    short_title_padding: u64,
    skip_first_title: bool,
}

impl PaddingPlanner {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            use_titles: config.use_titles,
            skip_short_titles: config.skip_short_titles,
            short_title_threshold: config.short_title_threshold,
            short_title_padding: config.short_title_padding,
            skip_first_title: false,
        }
    }

    /// Fold the title reservation of the very first segment into its tail.
    pub fn skipping_first_title(mut self) -> Self {
        self.skip_first_title = true;
        self
    }

    /// Reset, title and tail padding for a segment of `next_length` symbols placed
    /// at `total_progress`.
    pub fn calc_padding(
        &self,
        stack: &LevelStack,
        total_progress: u64,
        next_length: u64,
    ) -> Result<Padding> {
        let mut padding = self.level_padding(stack, total_progress, next_length)?;
        if self.skip_first_title && total_progress == 0 {
            padding.tail += padding.title;
            padding.title = 0;
        }
        Ok(padding)
    }

    fn level_padding(
        &self,
        stack: &LevelStack,
        total_progress: u64,
        next_length: u64,
    ) -> Result<Padding> {
        let min_gap = MIN_TITLE_ROWS * stack.base_width();
        let tile_label_size = (stack.len() > TILE_LABEL_LEVEL).then(|| stack.chunk_size(TILE_LABEL_LEVEL));

        for i in 0..stack.len() {
            let chunk = stack.chunk_size(i);
            if next_length + min_gap >= chunk {
                continue;
            }
            let finer = stack.finer_chunk_size(i);

            // reserve at least one full finer unit so a title never shares a row with data
            let mut title = min_gap.max(finer);
            if self.skip_short_titles && next_length < self.short_title_threshold {
                title = self.short_title_padding;
            }
            if !self.use_titles {
                title = 0;
            }
            if let Some(tile_label) = tile_label_size {
                if title > tile_label {
                    title = tile_label;
                }
            }
            if next_length + title > chunk {
                continue;
            }

            let space_remaining = chunk - total_progress % chunk;
            let reset_chunk = if next_length + title < space_remaining {
                finer
            } else {
                chunk
            };
            let reset = if total_progress == 0 {
                0
            } else {
                reset_chunk - total_progress % reset_chunk
            };
            let used = total_progress + reset + title + next_length;
            let tail = finer - used % finer - 1;
            return Ok(Padding { reset, title, tail });
        }

        Err(LayoutError::Planning {
            progress: total_progress,
            length: next_length,
        })
    }

    /// Annotate every segment in order. Must finish before anything is drawn.
    pub fn plan(&self, stack: &LevelStack, segments: Vec<Segment>) -> Result<Plan> {
        let mut total_progress = 0u64;
        let mut text_cursor = 0u64;
        let mut planned = Vec::with_capacity(segments.len());

        for segment in segments {
            let length = segment.len();
            let padding = self.calc_padding(stack, total_progress, length)?;
            let header_length = segment.name.len() as u64 + 1;
            let text = TextOffsets {
                title_start: text_cursor,
                seq_start: text_cursor + header_length,
            };
            debug!(
                "{}: reset {} title {} tail {} at {}",
                segment.name, padding.reset, padding.title, padding.tail, total_progress
            );

            total_progress += padding.total() + length;
            text_cursor += header_length + length;
            planned.push(PlannedSegment {
                segment,
                padding,
                text,
            });
        }

        Ok(Plan {
            segments: planned,
            image_length: total_progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelSpec;

    fn tiled() -> (LevelStack, PaddingPlanner) {
        let config = LayoutConfig::default();
        (
            LevelStack::from_config(&config).unwrap(),
            PaddingPlanner::from_config(&config),
        )
    }

    fn seg(name: &str, len: usize) -> Segment {
        Segment::new(name, vec![b'A'; len])
    }

    #[test]
    fn first_segment_has_no_reset() {
        let (stack, planner) = tiled();
        let p = planner.calc_padding(&stack, 0, 150_000).unwrap();
        assert_eq!(p.reset, 0);
        // one full column
        assert_eq!(p.title, 100_000);
        assert_eq!(p.tail, 100_000 - 250_000 % 100_000 - 1);
    }

    #[test]
    fn reset_aligns_to_finer_unit_when_there_is_headroom() {
        let (stack, planner) = tiled();
        let p = planner.calc_padding(&stack, 99, 150_000).unwrap();
        assert_eq!(p.reset, 100_000 - 99);
        assert_eq!((99 + p.reset) % 100_000, 0);
    }

    #[test]
    fn reset_jumps_a_full_unit_when_the_current_one_is_nearly_full() {
        let (stack, planner) = tiled();
        let progress = 10_000_000 - 50_000;
        let p = planner.calc_padding(&stack, progress, 150_000).unwrap();
        assert_eq!((progress + p.reset) % 10_000_000, 0);
    }

    #[test]
    fn short_and_disabled_titles() {
        let (stack, planner) = tiled();
        assert_eq!(planner.calc_padding(&stack, 0, 50).unwrap().title, 0);

        let config = LayoutConfig {
            use_titles: false,
            ..LayoutConfig::default()
        };
        let planner = PaddingPlanner::from_config(&config);
        assert_eq!(planner.calc_padding(&stack, 0, 150_000).unwrap().title, 0);
    }

    #[test]
    fn large_titles_are_clamped_to_one_row() {
        let (stack, planner) = tiled();
        let p = planner.calc_padding(&stack, 0, 50_000_000).unwrap();
        assert_eq!(p.title, stack.chunk_size(TILE_LABEL_LEVEL));
    }

    #[test]
    fn title_that_overflows_a_unit_moves_up_a_level() {
        let (stack, planner) = tiled();
        // fits one row on its own, but not with a column-sized title
        let length = 9_950_000;
        let p = planner.calc_padding(&stack, 0, length).unwrap();
        assert_eq!(p.title, 10_000_000);
        assert_eq!(p.reset, 0);
        assert_eq!(p.tail, 10_000_000 - length - 1);
        assert_eq!((p.total() + length + 1) % 10_000_000, 0);
    }

    #[test]
    fn calc_padding_is_idempotent() {
        let (stack, planner) = tiled();
        let a = planner.calc_padding(&stack, 123_456, 777_777).unwrap();
        let b = planner.calc_padding(&stack, 123_456, 777_777).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn skipping_first_title_moves_it_into_the_tail() {
        let (stack, planner) = tiled();
        let plain = planner.calc_padding(&stack, 0, 150_000).unwrap();
        let skipped = planner
            .clone()
            .skipping_first_title()
            .calc_padding(&stack, 0, 150_000)
            .unwrap();
        assert_eq!(skipped.title, 0);
        assert_eq!(skipped.tail, plain.tail + plain.title);
        assert_eq!(skipped.total(), plain.total());
    }

    #[test]
    fn oversized_segment_is_a_planning_error() {
        let stack =
            LevelStack::from_specs(&[LevelSpec::new(10, 0), LevelSpec::new(10, 0)], [0, 0], 0)
                .unwrap();
        let planner = PaddingPlanner::from_config(&LayoutConfig::default());
        let err = planner.calc_padding(&stack, 0, 1_000).unwrap_err();
        assert!(matches!(err, LayoutError::Planning { length: 1_000, .. }));
    }

    #[test]
    fn plan_accumulates_image_length_and_text_offsets() {
        let (stack, planner) = tiled();
        let plan = planner
            .plan(&stack, vec![seg("a", 50), seg("bb", 150_000), seg("c", 3)])
            .unwrap();
        let sum: u64 = plan
            .segments
            .iter()
            .map(|s| s.padding.total() + s.len())
            .sum();
        assert_eq!(sum, plan.image_length);
        assert_eq!(plan.segments[1].text.title_start, 2 + 50);
        assert_eq!(plan.segments[1].text.seq_start, 2 + 50 + 3);
    }
}

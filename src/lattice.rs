//! Geometry of a box grid laid over one axis of a sample grid.
//!
//! A lattice of box size `s` translated by `offset` has boxes starting at `i - offset`
//! for `i = 0, s, 2s, ..` up to `extent + offset`, so it always covers the whole axis.
//! Boxes are clipped to `[0, extent)`; boxes lying entirely outside are dropped.

use std::ops::Range;

/// Translation offsets tried along one axis: `0, inc, 2*inc, ..` below both the box
/// size and the axis extent, with `inc = max(1, box_size / num_translations)`.
pub fn offsets(
    box_size: usize,
    extent: usize,
    num_translations: usize,
) -> impl Iterator<Item = usize> + Clone {
    let increment = (box_size / num_translations.max(1)).max(1);
    (0..box_size.min(extent)).step_by(increment)
}

/// The clipped, non-empty index ranges of all boxes along one axis.
pub fn cells(box_size: usize, extent: usize, offset: usize) -> Vec<Range<usize>> {
    (0..=extent + offset)
        .step_by(box_size.max(1))
        .filter_map(|i| {
            let start = i.saturating_sub(offset);
            let end = (i + box_size).saturating_sub(offset).min(extent);
            (start < end).then_some(start..end)
        })
        .collect()
}

/// Every combination of per-axis offsets for the given axis extents.
pub fn translations(
    box_size: usize,
    extents: [usize; 3],
    num_translations: usize,
) -> Vec<[usize; 3]> {
    let mut result = Vec::new();
    for ox in offsets(box_size, extents[0], num_translations) {
        for oy in offsets(box_size, extents[1], num_translations) {
            for oz in offsets(box_size, extents[2], num_translations) {
                result.push([ox, oy, oz]);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offs(box_size: usize, extent: usize, num_translations: usize) -> Vec<usize> {
        offsets(box_size, extent, num_translations).collect()
    }

    #[test]
    fn single_translation_is_origin() {
        assert_eq!(offs(8, 100, 1), vec![0]);
        assert_eq!(translations(8, [100, 100, 1], 1), vec![[0, 0, 0]]);
    }

    #[test]
    fn offsets_limited_by_box_and_extent() {
        assert_eq!(offs(8, 100, 3), vec![0, 2, 4, 6]);
        assert_eq!(offs(8, 3, 4), vec![0, 2]);
        assert_eq!(offs(2, 100, 5), vec![0, 1]);
        assert_eq!(offs(5, 1, 5), vec![0]);
    }

    #[test]
    fn aligned_cells_tile_the_axis() {
        assert_eq!(cells(4, 8, 0), vec![0..4, 4..8]);
        assert_eq!(cells(3, 8, 0), vec![0..3, 3..6, 6..8]);
    }

    #[test]
    fn translated_cells_are_clipped() {
        assert_eq!(cells(4, 8, 1), vec![0..3, 3..7, 7..8]);
        assert_eq!(cells(8, 5, 3), vec![0..5]);
    }

    #[test]
    fn cells_cover_every_index_once() {
        for extent in 1..20 {
            for size in 1..10 {
                for offset in 0..size.min(extent) {
                    let boxes = cells(size, extent, offset);
                    let covered: Vec<usize> = boxes.into_iter().flatten().collect();
                    assert_eq!(covered, (0..extent).collect::<Vec<_>>());
                }
            }
        }
    }
}

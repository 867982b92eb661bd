//! Differential box counting (SDBC) of a grey-level image seen as a height field.
//!
//! The image plane is cut into footprint cells of the box size. For every cell the
//! column of boxes needed to cover the surface over it is derived from the height
//! range inside the cell, and the column counts are summed. In sub-graph mode the
//! column reaches down to the global minimum height, measuring the volume under the
//! surface instead of the local excursion.
//!
//! The method follows W.-S. Chen et al., "Two algorithms to estimate fractal dimension
//! of gray-level images", Optical Engineering 42(8), 2003.

use crate::config::BoxCountConfig;
use crate::grid::SampleGrid;
use crate::lattice::{self, cells};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBoxCounter {
    z_scale: f64,
    sub_graph: bool,
    num_translations: usize,
    global_min: f64,
}

impl SurfaceBoxCounter {
    /// Prepares a counter for the planar `grid`, computing its global minimum height
    /// once. The counter must only be used with that grid.
    pub fn new<G: SampleGrid + ?Sized>(
        grid: &G,
        z_scale: f64,
        sub_graph: bool,
        num_translations: usize,
    ) -> Self {
        let global_min = min_height(grid, z_scale);
        SurfaceBoxCounter {
            z_scale,
            sub_graph,
            num_translations,
            global_min,
        }
    }

    pub fn from_config<G: SampleGrid + ?Sized>(grid: &G, config: &BoxCountConfig) -> Self {
        Self::new(
            grid,
            config.z_scale,
            config.sub_graph,
            config.num_translations,
        )
    }

    pub fn global_min(&self) -> f64 {
        self.global_min
    }

    /// Minimum column box count over all footprint translations.
    pub fn count<G: SampleGrid + ?Sized>(&self, grid: &G, box_size: usize) -> u64 {
        let footprint = [grid.width(), grid.height(), 1];
        lattice::translations(box_size, footprint, self.num_translations)
            .into_iter()
            .map(|offset| self.count_at(grid, box_size, offset))
            .min()
            .unwrap_or(0)
    }

    /// Column box count of the footprint lattice translated by `offset` (z entry ignored).
    ///
    /// Only slice 0 is read, so `grid` must be planar.
    pub fn count_at<G: SampleGrid + ?Sized>(
        &self,
        grid: &G,
        box_size: usize,
        offset: [usize; 3],
    ) -> u64 {
        debug_assert!(grid.is_planar(), "surface counting needs a planar grid");
        let xs = cells(box_size, grid.width(), offset[0]);
        let ys = cells(box_size, grid.height(), offset[1]);
        let size = box_size as f64;

        let mut count = 0;
        for xr in &xs {
            for yr in &ys {
                let mut z_min = f64::INFINITY;
                let mut z_max = f64::NEG_INFINITY;
                for x in xr.clone() {
                    for y in yr.clone() {
                        let z = self.z_scale * grid.get(x, y, 0);
                        z_min = z_min.min(z);
                        z_max = z_max.max(z);
                    }
                }
                // footprint without samples
                if z_max == f64::NEG_INFINITY {
                    continue;
                }

                let base = if self.sub_graph {
                    self.global_min
                } else {
                    z_min
                };
                count += 1 + ((z_max - base + 1.0) / size).floor() as u64;
            }
        }
        count
    }
}

fn min_height<G: SampleGrid + ?Sized>(grid: &G, z_scale: f64) -> f64 {
    let mut min = f64::INFINITY;
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            min = min.min(z_scale * grid.get(x, y, 0));
        }
    }
    min
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VolumeGrid;

    fn ramp(n: usize) -> VolumeGrid {
        VolumeGrid::from_fn([n, n, 1], |x, y, _| (x + 2 * y) as f64)
    }

    fn rough(x: usize, y: usize, _: usize) -> f64 {
        ((x * 31 + y * 17) % 23) as f64 - 5.0
    }

    #[test]
    fn flat_surface_counts_footprints() {
        let grid = VolumeGrid::from_fn([4, 4, 1], |_, _, _| 17.0);
        let counter = SurfaceBoxCounter::new(&grid, 1.0, false, 1);
        assert_eq!(counter.count(&grid, 4), 1);
        assert_eq!(counter.count(&grid, 2), 4);
        assert_eq!(counter.count(&grid, 3), 4);
        // with unit boxes the +1 in the column height adds a second box per cell
        assert_eq!(counter.count(&grid, 1), 32);
    }

    #[test]
    fn column_height_from_local_range() {
        // one 4x4 cell with heights 0..=9: 1 + floor((9 - 0 + 1) / 4) = 3
        let grid = ramp(4);
        let counter = SurfaceBoxCounter::new(&grid, 1.0, false, 1);
        assert_eq!(counter.count(&grid, 4), 3);
        // z scale stretches the range: 1 + floor((18 + 1) / 4) = 5
        let counter = SurfaceBoxCounter::new(&grid, 2.0, false, 1);
        assert_eq!(counter.count(&grid, 4), 5);
    }

    #[test]
    fn sub_graph_reaches_global_minimum() {
        let grid = ramp(4);
        let counter = SurfaceBoxCounter::new(&grid, 1.0, true, 1);
        assert_eq!(counter.global_min(), 0.0);
        // cells (0,0) (2,0) (0,2) (2,2) have maxima 3, 5, 7, 9
        assert_eq!(counter.count(&grid, 2), 3 + 4 + 5 + 6);
        let local = SurfaceBoxCounter::new(&grid, 1.0, false, 1);
        assert_eq!(local.count(&grid, 2), 4 * 3);
    }

    #[test]
    fn sub_graph_never_counts_fewer() {
        let grid = VolumeGrid::from_fn([17, 13, 1], rough);
        for z_scale in [1.0, 0.5, 3.0, -1.0] {
            for translations in [1, 3] {
                let sub = SurfaceBoxCounter::new(&grid, z_scale, true, translations);
                let local = SurfaceBoxCounter::new(&grid, z_scale, false, translations);
                for s in 1..9 {
                    assert!(sub.count(&grid, s) >= local.count(&grid, s));
                }
            }
        }
    }

    #[test]
    fn outside_footprints_are_skipped() {
        // offset 3 with box 4 on a 5 wide axis: cells 0..1 and 1..5, the trailing box is empty
        let grid = VolumeGrid::from_fn([5, 5, 1], |_, _, _| 0.0);
        let counter = SurfaceBoxCounter::new(&grid, 1.0, false, 4);
        assert_eq!(counter.count_at(&grid, 4, [3, 3, 0]), 4);
        assert_eq!(counter.count_at(&grid, 4, [0, 0, 0]), 4);
    }

    #[test]
    fn translations_take_minimum() {
        let grid = ramp(9);
        let counter = SurfaceBoxCounter::new(&grid, 1.0, false, 3);
        let best = counter.count(&grid, 3);
        for offset in lattice::translations(3, [9, 9, 1], 3) {
            assert!(best <= counter.count_at(&grid, 3, offset));
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "planar grid")]
    fn volumes_are_not_counted() {
        let grid = VolumeGrid::from_fn([4, 4, 2], |_, _, _| 1.0);
        SurfaceBoxCounter::new(&grid, 1.0, false, 1).count(&grid, 2);
    }
}

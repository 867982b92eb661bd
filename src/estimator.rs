//! Runs a box counter over a series of box sizes and fits the log-log line.

use std::fmt;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::binary::BinaryBoxCounter;
use crate::config::{BoxCountConfig, CounterKind};
use crate::errors::{config_error, FractalError, Result};
use crate::grid::{SampleGrid, SliceView};
use crate::lattice;
use crate::regression::{self, BoxSizeSample, RegressionResult};
use crate::series::BoxSizeSeries;
use crate::surface::SurfaceBoxCounter;

/// A counter prepared for one grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Counter {
    Binary(BinaryBoxCounter),
    Surface(SurfaceBoxCounter),
}

impl Counter {
    pub fn for_grid<G: SampleGrid + ?Sized>(
        kind: CounterKind,
        grid: &G,
        config: &BoxCountConfig,
    ) -> Self {
        match kind {
            CounterKind::Binary => Counter::Binary(BinaryBoxCounter::from_config(config)),
            CounterKind::Surface => Counter::Surface(SurfaceBoxCounter::from_config(grid, config)),
        }
    }

    pub fn count<G: SampleGrid + ?Sized>(&self, grid: &G, box_size: usize) -> u64 {
        match self {
            Counter::Binary(c) => c.count(grid, box_size),
            Counter::Surface(c) => c.count(grid, box_size),
        }
    }

    pub fn count_at<G: SampleGrid + ?Sized>(
        &self,
        grid: &G,
        box_size: usize,
        offset: [usize; 3],
    ) -> u64 {
        match self {
            Counter::Binary(c) => c.count_at(grid, box_size, offset),
            Counter::Surface(c) => c.count_at(grid, box_size, offset),
        }
    }

    /// The lattice translations `count` minimises over.
    pub fn translations<G: SampleGrid + ?Sized>(
        &self,
        grid: &G,
        box_size: usize,
        num_translations: usize,
    ) -> Vec<[usize; 3]> {
        let extents = match self {
            Counter::Binary(_) => grid.dims(),
            Counter::Surface(_) => [grid.width(), grid.height(), 1],
        };
        lattice::translations(box_size, extents, num_translations)
    }
}

/// Everything needed to count one grid, checked before any counting starts.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub kind: CounterKind,
    pub config: BoxCountConfig,
    pub series: BoxSizeSeries,
    pub counter: Counter,
    pub normalize: f64,
}

impl Plan {
    pub fn new<G: SampleGrid + ?Sized>(
        grid: &G,
        config: &BoxCountConfig,
        kind: CounterKind,
    ) -> Result<Self> {
        config.validate()?;

        let [width, height, depth] = grid.dims();
        if grid.is_empty() {
            return Err(FractalError::EmptyGrid {
                width,
                height,
                depth,
            });
        }
        if kind == CounterKind::Surface && !grid.is_planar() {
            let msg = format!("surface counting needs a 2D grid, got depth {depth}");
            return Err(config_error(msg));
        }

        let (max_box_size, min_box_size) = config.resolve_bounds(grid.dims(), kind)?;
        let series = BoxSizeSeries::new(max_box_size, min_box_size, config.size_step)?;
        if series.is_empty() {
            return Err(FractalError::NoBoxes {
                max_box_size,
                min_box_size,
            });
        }

        let normalize = match kind {
            CounterKind::Binary => 1.0,
            CounterKind::Surface => width as f64,
        };
        let counter = Counter::for_grid(kind, grid, config);

        Ok(Plan {
            kind,
            config: config.clone(),
            series,
            counter,
            normalize,
        })
    }

    pub fn finish(self, samples: Vec<BoxSizeSample>, started: Instant) -> Result<Estimate> {
        if samples.is_empty() {
            return Err(FractalError::NoBoxes {
                max_box_size: self.series.max_box_size(),
                min_box_size: self.series.min_box_size(),
            });
        }

        let regression = regression::fit(&samples, self.normalize)?;
        info!(
            kind = %self.kind,
            dimension = regression.slope,
            box_sizes = samples.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dimension estimate"
        );

        Ok(Estimate {
            kind: self.kind,
            regression,
            samples,
            normalize: self.normalize,
            max_box_size: self.series.max_box_size(),
            min_box_size: self.series.min_box_size(),
            config: self.config,
        })
    }
}

pub(crate) fn log_start<G: SampleGrid + ?Sized>(grid: &G, plan: &Plan) {
    let [width, height, depth] = grid.dims();
    info!(
        kind = %plan.kind,
        width,
        height,
        depth,
        max_box_size = plan.series.max_box_size(),
        min_box_size = plan.series.min_box_size(),
        step = %plan.config.size_step,
        translations = plan.config.num_translations,
        "estimating dimension"
    );
}

/// The outcome of one estimation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub kind: CounterKind,
    pub regression: RegressionResult,
    /// one sample per evaluated box size, largest box first
    pub samples: Vec<BoxSizeSample>,
    /// box sizes are divided by this before taking logarithms
    pub normalize: f64,
    pub max_box_size: usize,
    pub min_box_size: usize,
    pub config: BoxCountConfig,
}

impl Estimate {
    pub fn dimension(&self) -> f64 {
        self.regression.slope
    }

    /// The transformed `(-ln(size / normalize), ln(count))` points the line was fitted to.
    pub fn log_points(&self) -> Vec<(f64, f64)> {
        // counts were checked during the fit
        let point = |s: &BoxSizeSample| {
            let x = -(s.box_size as f64 / self.normalize).ln();
            (x, (s.count as f64).ln())
        };
        self.samples.iter().map(point).collect()
    }

    /// `n` points of the fitted line across the sampled x range.
    pub fn fitted_line(&self, n: usize) -> Vec<(f64, f64)> {
        let points = self.log_points();
        let xs = points.iter().map(|p| p.0);
        let x_min = xs.clone().fold(f64::INFINITY, f64::min);
        let x_max = xs.fold(f64::NEG_INFINITY, f64::max);
        self.regression.fitted_line(x_min, x_max, n)
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dimension estimate: {:.4}: Settings: {}:{}:{}:{}",
            self.dimension(),
            self.max_box_size,
            self.min_box_size,
            self.config.size_step,
            self.config.num_translations
        )
    }
}

/// Estimates the box-counting dimension of `grid`.
pub fn estimate<G: SampleGrid + ?Sized>(
    grid: &G,
    config: &BoxCountConfig,
    kind: CounterKind,
) -> Result<Estimate> {
    run(grid, config, kind, None)
}

/// Like [`estimate`], but stops with [`FractalError::Cancelled`] once `cancel` fires.
/// The token is checked before every box size.
pub fn estimate_with_cancel<G: SampleGrid + ?Sized>(
    grid: &G,
    config: &BoxCountConfig,
    kind: CounterKind,
    cancel: &CancellationToken,
) -> Result<Estimate> {
    run(grid, config, kind, Some(cancel))
}

/// One estimate per z-slice of `grid`, each slice treated as a 2D image.
pub fn estimate_slices<G: SampleGrid + ?Sized>(
    grid: &G,
    config: &BoxCountConfig,
    kind: CounterKind,
) -> Result<Vec<Estimate>> {
    if grid.is_empty() {
        let [width, height, depth] = grid.dims();
        return Err(FractalError::EmptyGrid {
            width,
            height,
            depth,
        });
    }
    (0..grid.depth())
        .map(|z| {
            debug!(slice = z, "estimating slice");
            estimate(&SliceView::new(grid, z)?, config, kind)
        })
        .collect()
}

fn run<G: SampleGrid + ?Sized>(
    grid: &G,
    config: &BoxCountConfig,
    kind: CounterKind,
    cancel: Option<&CancellationToken>,
) -> Result<Estimate> {
    let started = Instant::now();
    let plan = Plan::new(grid, config, kind)?;
    log_start(grid, &plan);

    let mut samples = Vec::with_capacity(plan.series.len());
    for box_size in plan.series.iter() {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            info!(box_size, "estimation cancelled");
            return Err(FractalError::Cancelled);
        }
        let count = plan.counter.count(grid, box_size);
        debug!(box_size, count, "box count");
        samples.push(BoxSizeSample::new(box_size, count));
    }

    plan.finish(samples, started)
}

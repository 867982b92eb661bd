//! Estimation on the tokio runtime.
//!
//! Box sizes are still evaluated one after the other, but the translations of one
//! box size are independent read-only passes over the grid, so each runs as its own
//! blocking task and the minimum is taken once all of them are joined. Results are
//! identical to [`crate::estimate`].

use std::sync::Arc;
use std::time::Instant;

use futures::future;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{BoxCountConfig, CounterKind};
use crate::errors::{FractalError, Result};
use crate::estimator::{log_start, Estimate, Plan};
use crate::grid::SampleGrid;
use crate::regression::BoxSizeSample;

/// Async counterpart of [`crate::estimate_with_cancel`]. The token is checked before
/// every box size.
pub async fn estimate_async<G>(
    grid: Arc<G>,
    config: BoxCountConfig,
    kind: CounterKind,
    cancel: CancellationToken,
) -> Result<Estimate>
where
    G: SampleGrid + Send + Sync + ?Sized + 'static,
{
    let started = Instant::now();

    // the surface counter scans the whole grid for its minimum
    let plan = {
        let grid = grid.clone();
        let config = config.clone();
        spawn_blocking(move || Plan::new(grid.as_ref(), &config, kind))
            .await
            .map_err(task_error)??
    };
    log_start(grid.as_ref(), &plan);

    let counter = plan.counter;
    let mut samples = Vec::with_capacity(plan.series.len());
    for box_size in plan.series.iter() {
        if cancel.is_cancelled() {
            info!(box_size, "estimation cancelled");
            return Err(FractalError::Cancelled);
        }

        let translations = counter.translations(grid.as_ref(), box_size, config.num_translations);
        let tasks = translations.into_iter().map(|offset| {
            let grid = grid.clone();
            spawn_blocking(move || counter.count_at(grid.as_ref(), box_size, offset))
        });
        let counts = future::try_join_all(tasks).await.map_err(task_error)?;

        let count = counts.into_iter().min().unwrap_or(0);
        debug!(box_size, count, "box count");
        samples.push(BoxSizeSample::new(box_size, count));
    }

    plan.finish(samples, started)
}

fn task_error(e: tokio::task::JoinError) -> FractalError {
    FractalError::Task(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeStep;
    use crate::estimate;
    use crate::estimator::tests::CancellingGrid;
    use crate::grid::VolumeGrid;

    fn mixed(x: usize, y: usize, z: usize) -> f64 {
        ((x * 3 + y * 5 + z * 7) % 13) as f64
    }

    #[tokio::test]
    async fn matches_sync_binary() {
        let grid = Arc::new(VolumeGrid::from_fn([20, 18, 6], mixed));
        let config = BoxCountConfig {
            threshold: 10.0,
            auto_bounds: false,
            max_box_size: 9,
            min_box_size: 2,
            size_step: SizeStep::Geometric(1.3),
            num_translations: 3,
            ..BoxCountConfig::binary()
        };
        let expected = estimate(grid.as_ref(), &config, CounterKind::Binary).unwrap();
        let token = CancellationToken::new();
        let actual = estimate_async(grid, config, CounterKind::Binary, token).await;
        assert_eq!(actual.unwrap(), expected);
    }

    #[tokio::test]
    async fn matches_sync_surface() {
        let grid = VolumeGrid::from_fn([24, 20, 1], |x, y, _| ((x * x + y * 7) % 31) as f64);
        let grid = Arc::new(grid);
        let config = BoxCountConfig {
            num_translations: 2,
            ..BoxCountConfig::surface()
        };
        let expected = estimate(grid.as_ref(), &config, CounterKind::Surface).unwrap();
        let token = CancellationToken::new();
        let actual = estimate_async(grid, config, CounterKind::Surface, token).await;
        assert_eq!(actual.unwrap(), expected);
    }

    #[tokio::test]
    async fn cancelled_token_stops_run() {
        let grid = Arc::new(VolumeGrid::from_fn([16, 16, 1], |_, _, _| 255.0));
        let token = CancellationToken::new();
        token.cancel();
        let config = BoxCountConfig::binary();
        let result = estimate_async(grid, config, CounterKind::Binary, token).await;
        assert!(matches!(result, Err(FractalError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_between_box_sizes() {
        let token = CancellationToken::new();
        let inner = VolumeGrid::from_fn([8, 8, 1], |_, _, _| 255.0);
        let grid = Arc::new(CancellingGrid::new(inner, token.clone()));
        let config = BoxCountConfig {
            auto_bounds: false,
            max_box_size: 8,
            min_box_size: 2,
            size_step: SizeStep::Geometric(2.0),
            num_translations: 1,
            ..BoxCountConfig::binary()
        };

        let result = estimate_async(grid.clone(), config, CounterKind::Binary, token).await;
        assert!(matches!(result, Err(FractalError::Cancelled)));
        assert_eq!(grid.reads(), 1);
    }

    #[tokio::test]
    async fn config_errors_surface_before_counting() {
        let grid = Arc::new(VolumeGrid::from_fn([16, 16, 1], |_, _, _| 255.0));
        let config = BoxCountConfig {
            num_translations: 0,
            ..BoxCountConfig::binary()
        };
        let token = CancellationToken::new();
        let result = estimate_async(grid, config, CounterKind::Binary, token).await;
        assert!(matches!(result, Err(FractalError::Configuration(_))));
    }
}

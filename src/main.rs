use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use fractal_dimension::{
    estimate_async, estimate_with_cancel, BoxCountConfig, CounterKind, Estimate, FractalError,
    ImageStack, SampleGrid, SizeStep, SliceView,
};

type SharedGrid = Arc<dyn SampleGrid + Send + Sync>;
type Estimates = fractal_dimension::Result<Vec<Estimate>>;

/// number of points of the printed fitted line
const PLOT_SAMPLES: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Binary,
    Surface,
    Both,
}

/// Estimate the box-counting dimension of grey-level images.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// RON file with a BoxCountConfig replacing the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Mode::Binary)]
    mode: Mode,

    /// foreground threshold for binary counting
    #[arg(long)]
    threshold: Option<f64>,

    /// start box size (turns off automatic box sizes)
    #[arg(long)]
    max_box: Option<usize>,

    /// end box size (turns off automatic box sizes)
    #[arg(long)]
    min_box: Option<usize>,

    /// box division factor
    #[arg(long, conflicts_with = "arithmetic")]
    ratio: Option<f64>,

    /// shrink boxes by one instead of dividing
    #[arg(long)]
    arithmetic: bool,

    #[arg(short, long)]
    translations: Option<usize>,

    /// surface counting: multiply intensities by this to get heights
    #[arg(long)]
    z_scale: Option<f64>,

    /// surface counting: include the volume under the surface
    #[arg(long)]
    sub_graph: Option<bool>,

    #[arg(long)]
    no_auto: bool,

    /// estimate every slice of a stack on its own
    #[arg(long)]
    per_slice: bool,

    /// print the log-log points and the fitted line
    #[arg(long)]
    plot: bool,

    #[arg(short, long)]
    verbose: bool,

    /// one image gives a 2D estimate, several images are stacked into a volume
    #[arg(required = true, num_args = 1..)]
    images: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "fractal_dimension=debug"
    } else {
        "fractal_dimension=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let grid = load_grid(&args.images)?;
    let name = image_name(&args.images);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let runner = Runner {
        grid,
        per_slice: args.per_slice,
        cancel,
    };
    let mut failed = false;
    match args.mode {
        Mode::Binary | Mode::Surface => {
            let kind = if args.mode == Mode::Binary {
                CounterKind::Binary
            } else {
                CounterKind::Surface
            };
            let config = build_config(&args, kind)?;
            let result = runner.run(config, kind).await;
            failed |= !report(&name, kind, result, args.plot);
        }
        Mode::Both => {
            let binary_config = build_config(&args, CounterKind::Binary)?;
            let surface_config = build_config(&args, CounterKind::Surface)?;

            // Compute both estimates concurrently
            let (binary, surface) = tokio::join!(
                runner.run(binary_config, CounterKind::Binary),
                runner.run(surface_config, CounterKind::Surface)
            );
            failed |= !report(&name, CounterKind::Binary, binary, args.plot);
            failed |= !report(&name, CounterKind::Surface, surface, args.plot);
        }
    }

    if failed {
        bail!("dimension estimate failed for {name}");
    }
    Ok(())
}

fn load_grid(paths: &[PathBuf]) -> Result<SharedGrid> {
    let mut slices = Vec::with_capacity(paths.len());
    for path in paths {
        let img = image::open(path)
            .with_context(|| format!("failed to open image {}", path.display()))?;
        // Convert the image to grayscale
        slices.push(img.to_luma8());
    }

    match slices.pop() {
        Some(img) if slices.is_empty() => Ok(Arc::new(img)),
        Some(last) => {
            slices.push(last);
            Ok(Arc::new(ImageStack::new(slices)?))
        }
        None => bail!("no images given"),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn image_name(paths: &[PathBuf]) -> String {
    match paths {
        [single] => file_name(single),
        [first, .., last] => format!("{}..{}", file_name(first), file_name(last)),
        [] => String::new(),
    }
}

fn build_config(args: &Args, kind: CounterKind) -> Result<BoxCountConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let input = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            BoxCountConfig::from_ron(&input)?
        }
        None => BoxCountConfig::preset(kind),
    };

    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(max_box) = args.max_box {
        config.max_box_size = max_box;
        config.auto_bounds = false;
    }
    if let Some(min_box) = args.min_box {
        config.min_box_size = min_box;
        config.auto_bounds = false;
    }
    if args.no_auto {
        config.auto_bounds = false;
    }
    if let Some(ratio) = args.ratio {
        config.size_step = SizeStep::Geometric(ratio);
    }
    if args.arithmetic {
        config.size_step = SizeStep::Arithmetic;
    }
    if let Some(translations) = args.translations {
        config.num_translations = translations;
    }
    if let Some(z_scale) = args.z_scale {
        config.z_scale = z_scale;
    }
    if let Some(sub_graph) = args.sub_graph {
        config.sub_graph = sub_graph;
    }
    Ok(config)
}

/// The grid and settings shared by the estimation runs of one invocation.
struct Runner {
    grid: SharedGrid,
    per_slice: bool,
    cancel: CancellationToken,
}

impl Runner {
    // surface counting of a stack always goes slice by slice
    async fn run(&self, config: BoxCountConfig, kind: CounterKind) -> Estimates {
        let grid = self.grid.clone();
        let cancel = self.cancel.clone();
        if !self.per_slice && (kind == CounterKind::Binary || grid.is_planar()) {
            let estimate = estimate_async(grid, config, kind, cancel).await?;
            return Ok(vec![estimate]);
        }

        spawn_blocking(move || {
            (0..grid.depth())
                .map(|z| {
                    let slice = SliceView::new(grid.as_ref(), z)?;
                    estimate_with_cancel(&slice, &config, kind, &cancel)
                })
                .collect::<Estimates>()
        })
        .await
        .map_err(|e| FractalError::Task(e.to_string()))?
    }
}

/// prints the estimates, returns false on error
fn report(name: &str, kind: CounterKind, result: Estimates, plot: bool) -> bool {
    match result {
        Ok(estimates) => {
            for (z, est) in estimates.iter().enumerate() {
                if estimates.len() > 1 {
                    println!("{name} [slice {}] ({kind}): {est}", z + 1);
                } else {
                    println!("{name} ({kind}): {est}");
                }
                if plot {
                    print_plot(est);
                }
            }
            true
        }
        Err(e) => {
            tracing::error!(kind = %kind, "{name}: {e}");
            false
        }
    }
}

fn print_plot(est: &Estimate) {
    println!("# -log(box size)\tlog(box count)");
    for (x, y) in est.log_points() {
        println!("{x:.6}\t{y:.6}");
    }
    println!("# fitted line, slope {:.4}", est.dimension());
    for (x, y) in est.fitted_line(PLOT_SAMPLES) {
        println!("{x:.6}\t{y:.6}");
    }
}

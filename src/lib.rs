//! Box-counting estimates of the fractal dimension of 2D and 3D images.
//!
//! Two counters are provided:
//! - [`BinaryBoxCounter`] counts the boxes holding any sample at or above a threshold,
//!   for planar images and volumes,
//! - [`SurfaceBoxCounter`] treats a grey-level image as a height field and counts the
//!   boxes needed to cover it (SDBC), optionally down to a common base plane.
//!
//! Both minimise their counts over several translations of the box grid. An
//! estimation run evaluates a descending [`BoxSizeSeries`] and fits a least-squares
//! line to `(-ln size, ln count)`; its slope is the dimension estimate.
//!
//! ```no_run
//! use fractal_dimension::{estimate, BoxCountConfig, CounterKind};
//!
//! let img = image::open("carpet.png").unwrap().to_luma8();
//! let est = estimate(&img, &BoxCountConfig::binary(), CounterKind::Binary).unwrap();
//! println!("{est}");
//! ```

pub mod binary;
pub mod config;
pub mod errors;
pub mod estimator;
pub mod grid;
pub mod lattice;
pub mod regression;
pub mod series;
pub mod surface;
pub mod task;

pub use binary::BinaryBoxCounter;
pub use config::{BoxCountConfig, CounterKind, SizeStep};
pub use errors::{FractalError, Result};
pub use estimator::{estimate, estimate_slices, estimate_with_cancel, Counter, Estimate};
pub use grid::{ImageStack, SampleGrid, SliceView, VolumeGrid};
pub use regression::{fit, BoxSizeSample, RegressionResult};
pub use series::BoxSizeSeries;
pub use surface::SurfaceBoxCounter;
pub use task::estimate_async;

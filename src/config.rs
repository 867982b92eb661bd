//! Box counting parameters.
//!
//! A [`BoxCountConfig`] is an explicit value handed to every estimation run. It can be
//! built in code, starting from one of the presets, or read from a RON file such as
//! ```text
//! BoxCountConfig(
//!     threshold: 128.0,
//!     size_step: Geometric(1.5),
//!     num_translations: 4,
//! )
//! ```
//! where omitted fields keep their default values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{config_error, Result};

/// auto bounds use a maximum box size of the largest grid extent divided by this
pub const AUTO_DIV: usize = 4;

pub const DEFAULT_BINARY_MIN_BOX: usize = 6;
pub const DEFAULT_SURFACE_MIN_BOX: usize = 2;

/// How the box size shrinks from one evaluation to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SizeStep {
    /// `next = floor(size / ratio)`, ratio > 1
    Geometric(f64),
    /// `next = size - 1`
    Arithmetic,
}

impl fmt::Display for SizeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeStep::Geometric(ratio) => write!(f, "{ratio}"),
            SizeStep::Arithmetic => write!(f, "-1"),
        }
    }
}

/// Which counting algorithm an estimation run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterKind {
    /// thresholded occupancy counting over 2D or 3D grids
    Binary,
    /// differential (SDBC) counting of a grey-level height field
    Surface,
}

impl CounterKind {
    pub fn default_min_box_size(&self) -> usize {
        match self {
            CounterKind::Binary => DEFAULT_BINARY_MIN_BOX,
            CounterKind::Surface => DEFAULT_SURFACE_MIN_BOX,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CounterKind::Binary => "binary",
            CounterKind::Surface => "surface",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxCountConfig {
    /// binary mode: intensities `>= threshold` are foreground
    pub threshold: f64,
    pub max_box_size: usize,
    pub min_box_size: usize,
    pub size_step: SizeStep,
    pub num_translations: usize,
    /// surface mode: intensity multiplier giving the height
    pub z_scale: f64,
    /// surface mode: count the volume down to the global minimum instead of the local excursion
    pub sub_graph: bool,
    /// derive the box size range from the grid dimensions
    pub auto_bounds: bool,
    /// overrides the per-kind minimum box size used with `auto_bounds`
    pub auto_min_box_size: Option<usize>,
}

impl Default for BoxCountConfig {
    fn default() -> Self {
        Self::binary()
    }
}

impl BoxCountConfig {
    pub fn binary() -> Self {
        BoxCountConfig {
            threshold: 70.0,
            max_box_size: 24,
            min_box_size: DEFAULT_BINARY_MIN_BOX,
            size_step: SizeStep::Geometric(1.2),
            num_translations: 3,
            z_scale: 1.0,
            sub_graph: false,
            auto_bounds: true,
            auto_min_box_size: None,
        }
    }

    pub fn surface() -> Self {
        BoxCountConfig {
            threshold: 0.0,
            max_box_size: 24,
            min_box_size: DEFAULT_SURFACE_MIN_BOX,
            size_step: SizeStep::Arithmetic,
            num_translations: 1,
            z_scale: 1.0,
            sub_graph: true,
            auto_bounds: true,
            auto_min_box_size: None,
        }
    }

    pub fn preset(kind: CounterKind) -> Self {
        match kind {
            CounterKind::Binary => Self::binary(),
            CounterKind::Surface => Self::surface(),
        }
    }

    pub fn from_ron(input: &str) -> Result<Self> {
        Ok(ron::from_str(input)?)
    }

    /// Checks everything that does not depend on the grid.
    pub fn validate(&self) -> Result<()> {
        if self.num_translations < 1 {
            return Err(config_error(format!(
                "number of translations must be at least 1, got {}",
                self.num_translations
            )));
        }
        if let SizeStep::Geometric(ratio) = self.size_step {
            if !ratio.is_finite() || ratio <= 1.0 {
                let msg = format!("box division factor must be > 1, got {ratio}");
                return Err(config_error(msg));
            }
        }
        if !self.auto_bounds && self.min_box_size < 1 {
            return Err(config_error("minimum box size must be at least 1"));
        }
        if self.auto_min_box_size == Some(0) {
            return Err(config_error("automatic minimum box size must be > 0"));
        }
        if !self.z_scale.is_finite() {
            let msg = format!("z scale must be finite, got {}", self.z_scale);
            return Err(config_error(msg));
        }
        if self.threshold.is_nan() {
            return Err(config_error("threshold is not a number"));
        }
        Ok(())
    }

    /// The `(max, min)` box sizes for a grid of the given dimensions.
    ///
    /// With `auto_bounds` the maximum is a quarter of the largest extent and the minimum
    /// is the per-kind default clipped to the maximum. A resolved range with a minimum
    /// below 1 is a configuration error. Explicit ranges are returned as given, so an
    /// inverted range surfaces later as an empty box size series.
    pub fn resolve_bounds(&self, dims: [usize; 3], kind: CounterKind) -> Result<(usize, usize)> {
        if !self.auto_bounds {
            return Ok((self.max_box_size, self.min_box_size));
        }

        let extent = dims.iter().copied().max().unwrap_or(0);
        let max_box = extent / AUTO_DIV;
        let min_box = self
            .auto_min_box_size
            .unwrap_or_else(|| kind.default_min_box_size())
            .min(max_box);

        if min_box < 1 {
            let [w, h, d] = dims;
            let msg = format!("grid {w}x{h}x{d} is too small for automatic box sizes");
            return Err(config_error(msg));
        }
        Ok((max_box, min_box))
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FractalError>;

#[derive(Error, Debug)]
pub enum FractalError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("empty image ({width}x{height}x{depth}), dimension not defined")]
    EmptyGrid {
        width: usize,
        height: usize,
        depth: usize,
    },

    #[error("no boxes between start size {max_box_size} and end size {min_box_size}")]
    NoBoxes {
        max_box_size: usize,
        min_box_size: usize,
    },

    #[error("no samples to fit")]
    EmptyInput,

    #[error("box count is zero for box size {box_size}, empty image or wrong threshold?")]
    ZeroCount { box_size: usize },

    #[error("cannot fit a line through {samples} sample(s) of fewer than two box sizes")]
    DegenerateFit { samples: usize },

    #[error("grid shape error: {0}")]
    GridShape(String),

    #[error("estimation cancelled")]
    Cancelled,

    #[error("counting task failed: {0}")]
    Task(String),

    #[error("config parse error {0}")]
    Ron(#[from] ron::error::SpannedError),
}

pub fn config_error(msg: impl ToString) -> FractalError {
    FractalError::Configuration(msg.to_string())
}

pub fn shape_error(msg: impl ToString) -> FractalError {
    FractalError::GridShape(msg.to_string())
}

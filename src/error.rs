use thiserror::Error;

/// why a triangle could not be built
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleError {
    #[error("expected exactly 3 points, got {0}")]
    PointCount(usize),
    #[error("color channel {index} is {value}, outside 0..=255")]
    ColorChannel { index: usize, value: i32 },
}

#[derive(Error, Debug)]
pub enum EvolveError {
    #[error("invalid triangle: {0}")]
    InvalidTriangle(#[from] TriangleError),
    #[error("cannot cross a genome of {left} triangles with one of {right}")]
    MismatchedGenomeLength { left: usize, right: usize },
    #[error("population has {len} candidate(s), at least 2 are required")]
    PopulationTooSmall { len: usize },
    #[error("image dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch { expected: (u32, u32), actual: (u32, u32) },
    #[error("target image has no pixels")]
    EmptyTarget,
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("failed to parse settings: {0}")]
    Settings(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, EvolveError>;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TexAllocError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("{what} must be a power of two on both axes, got {width}x{height}")]
    NotPowerOfTwo {
        what: &'static str,
        width: u32,
        height: u32,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TexAllocError>;

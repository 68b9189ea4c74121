//! Error types for gridscope-core operations

use crate::dims::{GridDim, GridIdx};

/// Result type for gridscope-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a trace
///
/// All variants signal driver misconfiguration and propagate immediately.
/// An out-of-bounds memory access discovered during tracing is never an
/// error: it is captured in a record's validity masks and tracing continues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Grid cell index outside the declared grid dimensions
    #[error("grid index {idx} out of bounds for grid {dim}")]
    GridIdxOutOfBounds { idx: GridIdx, dim: GridDim },

    /// Grid dimensions with a zero component
    #[error("invalid grid dimensions {dim}: every component must be positive")]
    InvalidGridDim { dim: GridDim },

    /// Tensor strides do not describe a gapless linear layout
    #[error(
        "tensor at {base_addr:#x} has a memory layout unsupported for tracing: \
         shape {shape:?}, strides {strides:?}"
    )]
    UnsupportedLayout {
        base_addr: u64,
        shape: Vec<usize>,
        strides: Vec<usize>,
    },

    /// Per-launch operation called before `begin_launch`
    #[error("no active launch: call begin_launch first")]
    NoActiveLaunch,

    /// Address batch with no elements
    #[error("address batch is empty")]
    EmptyAddressBatch,

    /// Pointer resolution attempted against an empty tensor registry
    #[error("no tensors registered in the active launch")]
    NoTensors,

    /// Two sequences that must agree in length do not
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Grid declared with an unsupported number of dimensions
    #[error("grid must have 1 to 3 dimensions, got {len}")]
    InvalidGridRank { len: usize },

    /// Sampling index with an unsupported number of components
    #[error("sampling index must have 1 to 3 components, got {len}")]
    InvalidSamplingIdx { len: usize },
}

impl Error {
    /// Create a length mismatch error
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create an unsupported layout error from a descriptor's fields
    pub fn unsupported_layout(base_addr: u64, shape: &[usize], strides: &[usize]) -> Self {
        Self::UnsupportedLayout {
            base_addr,
            shape: shape.to_vec(),
            strides: strides.to_vec(),
        }
    }
}

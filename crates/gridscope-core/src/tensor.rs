//! Tensor descriptors
//!
//! A `TensorDesc` is borrowed metadata about one logical buffer argument of
//! a launch: base address, element type, shape, and per-dimension strides in
//! elements. It never owns the underlying memory, so a captured trace stays
//! valid after the traced buffers are freed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    F16,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U32,
}

impl DType {
    /// Element size in bytes
    pub const fn size_bytes(&self) -> usize {
        match self {
            DType::I8 | DType::U8 => 1,
            DType::F16 | DType::I16 => 2,
            DType::F32 | DType::I32 | DType::U32 => 4,
            DType::F64 | DType::I64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F16 => "f16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::U8 => "u8",
            DType::U32 => "u32",
        };
        f.write_str(name)
    }
}

/// Descriptor of one tensor argument
///
/// Strides are in elements (not bytes); extents and access offsets are in
/// bytes. Registered once per launch before iteration begins and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorDesc {
    base_addr: u64,
    dtype: DType,
    shape: Vec<usize>,
    strides: Vec<usize>,
    element_size: usize,
}

impl TensorDesc {
    /// Create a descriptor
    ///
    /// Shape and strides must have the same length. The element size is
    /// taken from `dtype`.
    pub fn new(base_addr: u64, dtype: DType, shape: Vec<usize>, strides: Vec<usize>) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(Error::length_mismatch(shape.len(), strides.len()));
        }
        Ok(Self {
            base_addr,
            dtype,
            shape,
            strides,
            element_size: dtype.size_bytes(),
        })
    }

    /// Base address of the underlying buffer
    pub fn base_addr(&self) -> u64 {
        self.base_addr
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Tensor shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-dimension strides in elements
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Element size in bytes
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Addressable extent in bytes
    pub fn size_bytes(&self) -> usize {
        self.numel() * self.element_size
    }

    /// Check that the strides describe a gapless, non-overlapping linear
    /// layout
    ///
    /// This is different from row-major contiguity: any permutation of a
    /// dense layout passes. Walking dimensions from smallest stride to
    /// largest, the smallest stride must be exactly 1 and every subsequent
    /// stride must equal the product of the extents walked so far.
    ///
    /// Bounds-check arithmetic assumes a strictly linear addressable layout;
    /// a descriptor failing this check must not be admitted into a trace.
    pub fn is_storage_contiguous(&self) -> bool {
        let mut order: Vec<usize> = (0..self.strides.len()).collect();
        order.sort_by_key(|&d| self.strides[d]);

        let mut shape_prod = 1usize;
        for (walk, &dim) in order.iter().enumerate() {
            let stride = self.strides[dim];
            if walk == 0 && stride != 1 {
                return false;
            }
            if walk != 0 && stride != shape_prod {
                return false;
            }
            shape_prod *= self.shape[dim];
        }
        true
    }
}

//! Out-of-bounds mask computation for batched memory accesses
//!
//! One traced memory operation presents a shaped batch of raw addresses.
//! The whole batch is attributed to a single tensor, resolved from the
//! batch's first address (the representative-pointer heuristic: every
//! address in one operation is assumed to belong to the same tensor, which
//! misattributes under aliasing across tensors). Out-of-range addresses are
//! diagnostic data captured in masks, never an error.

use crate::error::{Error, Result};
use crate::tensor::TensorDesc;

/// A shaped batch of raw addresses for one memory operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBatch {
    data: Vec<u64>,
    shape: Vec<usize>,
}

impl AddressBatch {
    /// Create a batch; the shape's element product must match the data
    /// length
    pub fn new(data: Vec<u64>, shape: Vec<usize>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::length_mismatch(expected, data.len()));
        }
        Ok(Self { data, shape })
    }

    /// Create a 1D batch
    pub fn linear(data: Vec<u64>) -> Self {
        let shape = vec![data.len()];
        Self { data, shape }
    }

    /// Raw addresses in row-major order
    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// Batch shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of addresses
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the batch holds no addresses
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The representative address used for tensor resolution
    pub fn first(&self) -> Option<u64> {
        self.data.first().copied()
    }
}

/// Result of bounds-checking one address batch against its owning tensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundsCheck<'a> {
    /// The resolved owning tensor
    pub tensor: &'a TensorDesc,
    /// Elementwise in-bounds flags
    pub masks: Vec<bool>,
    /// Elementwise negation of `masks`
    pub invalid_masks: Vec<bool>,
    /// Byte offsets with out-of-bounds entries replaced by the 0 sentinel,
    /// so downstream arithmetic never indexes negative or past the extent
    pub offsets: Vec<i64>,
    /// Raw byte offsets, address minus base, before correction
    pub original_offsets: Vec<i64>,
}

/// Floor-lookup over a registry sorted ascending by base address
///
/// Returns the tensor with the greatest base address not exceeding `addr`.
/// An address below every base resolves to the first tensor rather than a
/// not-found error; downstream masks then flag the access invalid.
pub fn resolve_owner(tensors: &[TensorDesc], addr: u64) -> Option<&TensorDesc> {
    if tensors.is_empty() {
        return None;
    }
    let idx = tensors.partition_point(|t| t.base_addr() <= addr);
    Some(&tensors[idx.saturating_sub(1)])
}

/// Compute validity and offset masks for one operation's address batch
///
/// The owning tensor is resolved from the batch's first address only; the
/// offset and mask arithmetic then runs elementwise over the whole batch.
/// `tensors` must already be sorted ascending by base address.
pub fn check_access<'a>(batch: &AddressBatch, tensors: &'a [TensorDesc]) -> Result<BoundsCheck<'a>> {
    let first = batch.first().ok_or(Error::EmptyAddressBatch)?;
    let owner = resolve_owner(tensors, first).ok_or(Error::NoTensors)?;

    let base = owner.base_addr() as i64;
    let extent = owner.size_bytes() as i64;

    let original_offsets: Vec<i64> = batch.data().iter().map(|&a| a as i64 - base).collect();
    let masks: Vec<bool> = original_offsets
        .iter()
        .map(|&off| off >= 0 && off < extent)
        .collect();
    let invalid_masks: Vec<bool> = masks.iter().map(|&valid| !valid).collect();
    let offsets: Vec<i64> = original_offsets
        .iter()
        .zip(&masks)
        .map(|(&off, &valid)| if valid { off } else { 0 })
        .collect();

    Ok(BoundsCheck {
        tensor: owner,
        masks,
        invalid_masks,
        offsets,
        original_offsets,
    })
}

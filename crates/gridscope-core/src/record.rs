//! Trace records and launches
//!
//! A `Launch` is one invocation of a kernel over a full grid; it owns its
//! tensor descriptors and its ordered record list exclusively. A `Record`
//! is one immutable structural or operational event. Every field is an
//! owned plain value, so a finalized trace never refers to live memory.

use crate::dims::{GridDim, GridIdx};
use crate::tensor::TensorDesc;
use serde::{Deserialize, Serialize};

/// One structural or operational event in a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// The driver entered a grid cell
    Grid { idx: GridIdx },

    /// A masked load from one tensor
    Load {
        /// Base address of the resolved owning tensor
        tensor_addr: u64,
        /// Shape of the address batch
        shape: Vec<usize>,
        /// Byte offsets with out-of-bounds entries replaced by 0
        offsets: Vec<i64>,
        /// In-bounds AND predicate mask, elementwise
        masks: Vec<bool>,
        /// Elementwise out-of-bounds flags
        invalid_masks: Vec<bool>,
        /// Raw byte offsets before correction
        original_offsets: Vec<i64>,
        /// The caller's predicate mask, verbatim
        original_masks: Vec<bool>,
    },

    /// A masked store to one tensor
    Store {
        tensor_addr: u64,
        shape: Vec<usize>,
        offsets: Vec<i64>,
        masks: Vec<bool>,
        invalid_masks: Vec<bool>,
        original_offsets: Vec<i64>,
        original_masks: Vec<bool>,
        /// Shape of the value being written
        value_shape: Vec<usize>,
    },

    /// An elementwise binary operation
    BinaryOp {
        op: String,
        input_shapes: (Vec<usize>, Vec<usize>),
        output_shape: Vec<usize>,
    },

    /// A half-open index range construction
    MakeRange { start: i64, end: i64 },

    /// A dimension insertion
    ExpandDims {
        input_shape: Vec<usize>,
        axis: i32,
        output_shape: Vec<usize>,
    },

    /// A matrix product with accumulator
    Dot {
        input_shapes: (Vec<usize>, Vec<usize>),
        acc_shape: Vec<usize>,
        output_shape: Vec<usize>,
    },

    /// A reduction along an axis
    Reduce {
        input_shape: Vec<usize>,
        axis: Option<i32>,
        op: String,
        keep_dims: bool,
        output_shape: Vec<usize>,
    },
}

impl Record {
    /// Short tag for logging
    pub const fn kind(&self) -> &'static str {
        match self {
            Record::Grid { .. } => "grid",
            Record::Load { .. } => "load",
            Record::Store { .. } => "store",
            Record::BinaryOp { .. } => "binary_op",
            Record::MakeRange { .. } => "make_range",
            Record::ExpandDims { .. } => "expand_dims",
            Record::Dot { .. } => "dot",
            Record::Reduce { .. } => "reduce",
        }
    }
}

/// One kernel invocation over a full grid
///
/// Owns its tensors and records exclusively; destroyed only by an explicit
/// session reset. Consumers must treat a finalized launch as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    grid_dim: GridDim,
    tensors: Vec<TensorDesc>,
    records: Vec<Record>,
}

impl Launch {
    /// Create an empty launch over `grid_dim`
    pub(crate) fn new(grid_dim: GridDim) -> Self {
        Self {
            grid_dim,
            tensors: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Grid dimensions of this launch
    pub fn grid_dim(&self) -> GridDim {
        self.grid_dim
    }

    /// Registered tensor descriptors, sorted by base address once finalized
    pub fn tensors(&self) -> &[TensorDesc] {
        &self.tensors
    }

    /// Captured records, in append order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub(crate) fn push_tensor(&mut self, tensor: TensorDesc) {
        self.tensors.push(tensor);
    }

    pub(crate) fn sort_tensors(&mut self) {
        self.tensors.sort_by_key(|t| t.base_addr());
    }

    pub(crate) fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }
}

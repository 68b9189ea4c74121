//! # gridscope-core - Trace Capture for Interpreted Grid Kernels
//!
//! A data-parallel kernel is interpreted on the host one grid cell at a
//! time; gridscope-core intercepts its memory and compute operations and
//! appends structured, replayable records to a queryable trace. Each memory
//! access is resolved back to the logical tensor it belongs to and annotated
//! with an out-of-bounds validity mask, so a downstream visualizer can
//! diagnose the kernel without the original memory.
//!
//! ## Architecture
//!
//! ```text
//! driver (interpreter loop)
//!   -> TraceSession        launch/grid bookkeeping, sampling filter
//!      -> tensor registry  sorted by base address, floor-lookup
//!      -> bounds check     validity/offset masks per access batch
//!      -> Record           immutable tagged event, appended per operation
//! ```
//!
//! The session is an explicit per-trace object handed to every
//! instrumentation point; nothing here is process-global. Out-of-bounds
//! accesses are captured as data in the masks, never raised as errors;
//! errors are reserved for driver misuse (out-of-range cell, missing
//! launch) and for tensors whose layout the bounds arithmetic cannot
//! support.
//!
//! ## Example
//!
//! ```
//! use gridscope_core::{AddressBatch, DType, GridDim, TensorDesc, TraceSession};
//!
//! let mut session = TraceSession::new();
//! session.begin_launch(GridDim::linear(2))?;
//! session.register_tensor(TensorDesc::new(0x1000, DType::F32, vec![16], vec![1])?)?;
//! session.finalize_tensors()?;
//!
//! session.for_each_cell(|session, idx| {
//!     // One interpreted program instance per cell; instrumentation points
//!     // are called from inside the instance.
//!     let base = 0x1000 + u64::from(idx.x) * 32;
//!     let ptrs = AddressBatch::linear((0..8).map(|i| base + i * 4).collect());
//!     session.on_masked_load(&ptrs, &[true; 8])
//! })?;
//!
//! let launch = &session.launches()[0];
//! assert_eq!(launch.records().len(), 4); // two Grid markers, two Loads
//! # Ok::<(), gridscope_core::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`session`] - the stateful recorder driving a trace session
//! - [`hooks`] - instrumentation points called per traced operation
//! - [`bounds`] - address batches and out-of-bounds mask computation
//! - [`tensor`] - tensor descriptors and the storage-contiguity gate
//! - [`record`] - launches and immutable trace records
//! - [`dims`] - grid dimensions, cell indices, sampling targets

pub mod bounds;
pub mod dims;
pub mod error;
pub mod hooks;
pub mod record;
pub mod session;
pub mod tensor;

pub use bounds::{check_access, resolve_owner, AddressBatch, BoundsCheck};
pub use dims::{GridDim, GridIdx, SampleIdx};
pub use error::{Error, Result};
pub use record::{Launch, Record};
pub use session::TraceSession;
pub use tensor::{DType, TensorDesc};

//! Trace session state machine
//!
//! A `TraceSession` owns everything captured while interpreting kernel
//! launches: the launch list, the active grid shape and cell index, and the
//! optional sampling target. One session per trace; instrumentation points
//! receive it as an explicit collaborator rather than reaching for shared
//! global state, so independent traces never observe each other.
//!
//! Lifecycle: `reset()` (or `new()`) -> configure -> one or more launches ->
//! read-only query via [`TraceSession::launches`]. The session is strictly
//! single-driver: exactly one cell is active at any moment and nothing here
//! synchronizes internally.

use crate::bounds;
use crate::dims::{GridDim, GridIdx, SampleIdx};
use crate::error::{Error, Result};
use crate::record::{Launch, Record};
use crate::tensor::TensorDesc;

/// Stateful recorder for one trace session
///
/// # Example
///
/// ```
/// use gridscope_core::{DType, GridDim, GridIdx, TensorDesc, TraceSession};
///
/// let mut session = TraceSession::new();
/// session.begin_launch(GridDim::linear(4))?;
/// session.register_tensor(TensorDesc::new(0x1000, DType::F32, vec![16], vec![1])?)?;
/// session.finalize_tensors()?;
/// session.set_active_cell(GridIdx::new(0, 0, 0))?;
/// assert_eq!(session.launches()[0].records().len(), 1);
/// # Ok::<(), gridscope_core::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct TraceSession {
    launches: Vec<Launch>,
    grid_dim: GridDim,
    grid_idx: GridIdx,
    sampling_idx: Option<SampleIdx>,
}

impl TraceSession {
    /// Create a session in its reset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all launches and restore the initial grid and sampling state
    ///
    /// Must be called between independent trace sessions; captured launches
    /// are dropped, the grid shape returns to the unit shape, the active
    /// index to the origin, and any sampling target is removed.
    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self) {
        self.launches.clear();
        self.grid_dim = GridDim::default();
        self.grid_idx = GridIdx::origin();
        self.sampling_idx = None;
        tracing::debug!("session_reset");
    }

    /// Open a new launch over `dim`, which becomes the active launch
    ///
    /// Every grid component must be positive. Launches never merge: records
    /// and tensors registered after this call belong to the new launch only.
    #[tracing::instrument(skip(self), fields(dim = %dim))]
    pub fn begin_launch(&mut self, dim: GridDim) -> Result<()> {
        if !dim.is_valid() {
            return Err(Error::InvalidGridDim { dim });
        }
        self.grid_dim = dim;
        self.launches.push(Launch::new(dim));
        tracing::debug!(total_cells = dim.total_cells(), "launch_opened");
        Ok(())
    }

    /// Open a launch from 1 to 3 grid components, padding with trailing 1s
    pub fn begin_launch_padded(&mut self, dims: &[u32]) -> Result<()> {
        self.begin_launch(GridDim::from_slice(dims)?)
    }

    /// Restrict recording to a single grid cell
    ///
    /// The target is stored verbatim and flattened only when the filter is
    /// evaluated, against whatever grid shape is active then.
    pub fn set_sampling_idx(&mut self, components: &[u32]) -> Result<()> {
        self.sampling_idx = Some(SampleIdx::new(components)?);
        Ok(())
    }

    /// Remove the sampling filter
    pub fn clear_sampling_idx(&mut self) {
        self.sampling_idx = None;
    }

    /// Register a tensor argument with the active launch
    ///
    /// Must happen after [`begin_launch`](Self::begin_launch) and before the
    /// launch's first record. A descriptor whose strides do not form a
    /// gapless linear layout is refused and nothing is registered: the
    /// bounds arithmetic would produce meaningless masks for it.
    #[tracing::instrument(skip(self, tensor), fields(base_addr = tensor.base_addr()))]
    pub fn register_tensor(&mut self, tensor: TensorDesc) -> Result<()> {
        if !tensor.is_storage_contiguous() {
            return Err(Error::unsupported_layout(
                tensor.base_addr(),
                tensor.shape(),
                tensor.strides(),
            ));
        }
        let launch = self.active_launch_mut()?;
        launch.push_tensor(tensor);
        tracing::debug!(tensors = launch.tensors().len(), "tensor_registered");
        Ok(())
    }

    /// Sort the active launch's tensors ascending by base address
    ///
    /// Must run once, after all registrations and before any pointer
    /// resolution against this launch.
    pub fn finalize_tensors(&mut self) -> Result<()> {
        self.active_launch_mut()?.sort_tensors();
        Ok(())
    }

    /// Enter a grid cell, making it the active program instance
    ///
    /// Fails if any component lies outside the active grid shape. On
    /// success a [`Record::Grid`] marker is appended, subject to the
    /// sampling filter like every other record.
    pub fn set_active_cell(&mut self, idx: GridIdx) -> Result<()> {
        if !self.grid_dim.contains(idx) {
            return Err(Error::GridIdxOutOfBounds {
                idx,
                dim: self.grid_dim,
            });
        }
        self.grid_idx = idx;
        self.append_record(Record::Grid { idx })
    }

    /// Resolve the tensor owning `addr` in the active launch
    ///
    /// Floor-lookup over the finalized registry: the tensor with the
    /// greatest base address not exceeding `addr`. An address below every
    /// base resolves to the first tensor; there is no not-found path.
    pub fn resolve_tensor(&self, addr: u64) -> Result<&TensorDesc> {
        let launch = self.active_launch()?;
        bounds::resolve_owner(launch.tensors(), addr).ok_or(Error::NoTensors)
    }

    /// Append a record to the active launch, subject to the sampling filter
    ///
    /// With no sampling target every record is kept. With one, only the
    /// cell whose flattened index equals the flattened target records
    /// anything, uniformly across record kinds including Grid markers.
    pub fn append_record(&mut self, record: Record) -> Result<()> {
        if !self.sampling_accepts() {
            tracing::trace!(kind = record.kind(), idx = %self.grid_idx, "record_sampled_out");
            return Ok(());
        }
        self.active_launch_mut()?.push_record(record);
        Ok(())
    }

    /// Visit every cell of the active launch in the fixed iteration order
    ///
    /// Cells are visited x outermost, then y, then z, each from 0 to its
    /// bound. This ordering is part of the observable contract: it fixes
    /// the order of records within a launch. Each visit enters the cell
    /// (emitting its Grid marker through the filter) and then runs `f`,
    /// which typically interprets one program instance against the session.
    pub fn for_each_cell<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut TraceSession, GridIdx) -> Result<()>,
    {
        self.active_launch()?;
        let dim = self.grid_dim;
        for x in 0..dim.x {
            for y in 0..dim.y {
                for z in 0..dim.z {
                    let idx = GridIdx::new(x, y, z);
                    self.set_active_cell(idx)?;
                    f(self, idx)?;
                }
            }
        }
        Ok(())
    }

    /// All captured launches, oldest first
    pub fn launches(&self) -> &[Launch] {
        &self.launches
    }

    /// The grid shape of the active launch
    pub fn grid_dim(&self) -> GridDim {
        self.grid_dim
    }

    /// The currently active cell index
    pub fn grid_idx(&self) -> GridIdx {
        self.grid_idx
    }

    pub(crate) fn active_launch(&self) -> Result<&Launch> {
        self.launches.last().ok_or(Error::NoActiveLaunch)
    }

    fn active_launch_mut(&mut self) -> Result<&mut Launch> {
        self.launches.last_mut().ok_or(Error::NoActiveLaunch)
    }

    fn sampling_accepts(&self) -> bool {
        match &self.sampling_idx {
            None => true,
            Some(target) => target.flatten(self.grid_dim) == self.grid_idx.flatten(self.grid_dim),
        }
    }
}

//! Instrumentation points
//!
//! The simulated-execution engine calls one of these methods per traced
//! primitive operation, passing the session it was handed at launch. Each
//! method turns the operation's arguments into exactly one [`Record`] and
//! routes it through the sampling filter; memory operations additionally run
//! the bounds check first.
//!
//! Loads and stores combine masks the way the trace consumer expects:
//! `masks` is the elementwise AND of the in-bounds mask and the caller's
//! predicate, while `original_masks` preserves the predicate verbatim.

use crate::bounds::{self, AddressBatch, BoundsCheck};
use crate::error::{Error, Result};
use crate::record::Record;
use crate::session::TraceSession;

impl TraceSession {
    /// Trace a masked load
    ///
    /// `predicate` is the operation's own mask, one flag per address.
    #[tracing::instrument(skip(self, ptrs, predicate), fields(elems = ptrs.len()))]
    pub fn on_masked_load(&mut self, ptrs: &AddressBatch, predicate: &[bool]) -> Result<()> {
        let check = self.checked_access(ptrs, predicate)?;
        let tensor_addr = check.tensor.base_addr();
        let BoundsCheck {
            masks,
            invalid_masks,
            offsets,
            original_offsets,
            ..
        } = check;
        tracing::debug!(tensor_addr, "load_traced");
        let record = Record::Load {
            tensor_addr,
            shape: ptrs.shape().to_vec(),
            masks: combine_masks(&masks, predicate),
            invalid_masks,
            offsets,
            original_offsets,
            original_masks: predicate.to_vec(),
        };
        self.append_record(record)
    }

    /// Trace a masked store, including the written value's shape
    #[tracing::instrument(skip(self, ptrs, predicate, value_shape), fields(elems = ptrs.len()))]
    pub fn on_masked_store(
        &mut self,
        ptrs: &AddressBatch,
        predicate: &[bool],
        value_shape: &[usize],
    ) -> Result<()> {
        let check = self.checked_access(ptrs, predicate)?;
        let tensor_addr = check.tensor.base_addr();
        let BoundsCheck {
            masks,
            invalid_masks,
            offsets,
            original_offsets,
            ..
        } = check;
        tracing::debug!(tensor_addr, "store_traced");
        let record = Record::Store {
            tensor_addr,
            shape: ptrs.shape().to_vec(),
            masks: combine_masks(&masks, predicate),
            invalid_masks,
            offsets,
            original_offsets,
            original_masks: predicate.to_vec(),
            value_shape: value_shape.to_vec(),
        };
        self.append_record(record)
    }

    /// Trace a half-open range construction
    pub fn on_make_range(&mut self, start: i64, end: i64) -> Result<()> {
        self.append_record(Record::MakeRange { start, end })
    }

    /// Trace an elementwise binary operation
    pub fn on_binary_op(
        &mut self,
        op: impl Into<String>,
        lhs_shape: &[usize],
        rhs_shape: &[usize],
        output_shape: &[usize],
    ) -> Result<()> {
        let op = op.into();
        tracing::debug!(op = %op, "binary_op_traced");
        self.append_record(Record::BinaryOp {
            op,
            input_shapes: (lhs_shape.to_vec(), rhs_shape.to_vec()),
            output_shape: output_shape.to_vec(),
        })
    }

    /// Trace a dimension insertion
    pub fn on_expand_dims(
        &mut self,
        input_shape: &[usize],
        axis: i32,
        output_shape: &[usize],
    ) -> Result<()> {
        self.append_record(Record::ExpandDims {
            input_shape: input_shape.to_vec(),
            axis,
            output_shape: output_shape.to_vec(),
        })
    }

    /// Trace a matrix product with accumulator
    pub fn on_dot(
        &mut self,
        lhs_shape: &[usize],
        rhs_shape: &[usize],
        acc_shape: &[usize],
        output_shape: &[usize],
    ) -> Result<()> {
        self.append_record(Record::Dot {
            input_shapes: (lhs_shape.to_vec(), rhs_shape.to_vec()),
            acc_shape: acc_shape.to_vec(),
            output_shape: output_shape.to_vec(),
        })
    }

    /// Trace a reduction
    pub fn on_reduce(
        &mut self,
        op: impl Into<String>,
        input_shape: &[usize],
        axis: Option<i32>,
        keep_dims: bool,
        output_shape: &[usize],
    ) -> Result<()> {
        let op = op.into();
        tracing::debug!(op = %op, ?axis, "reduce_traced");
        self.append_record(Record::Reduce {
            input_shape: input_shape.to_vec(),
            axis,
            op,
            keep_dims,
            output_shape: output_shape.to_vec(),
        })
    }

    fn checked_access(&self, ptrs: &AddressBatch, predicate: &[bool]) -> Result<BoundsCheck<'_>> {
        if predicate.len() != ptrs.len() {
            return Err(Error::length_mismatch(ptrs.len(), predicate.len()));
        }
        let launch = self.active_launch()?;
        bounds::check_access(ptrs, launch.tensors())
    }
}

fn combine_masks(valid: &[bool], predicate: &[bool]) -> Vec<bool> {
    valid
        .iter()
        .zip(predicate)
        .map(|(&v, &p)| v && p)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dims::{GridDim, GridIdx};
    use crate::tensor::{DType, TensorDesc};

    fn session_with_tensor() -> TraceSession {
        let mut session = TraceSession::new();
        session.begin_launch(GridDim::linear(1)).unwrap();
        session
            .register_tensor(TensorDesc::new(1000, DType::F32, vec![4, 4], vec![4, 1]).unwrap())
            .unwrap();
        session.finalize_tensors().unwrap();
        session.set_active_cell(GridIdx::origin()).unwrap();
        session
    }

    #[test]
    fn load_combines_predicate_with_validity() -> Result<()> {
        let mut session = session_with_tensor();
        let ptrs = AddressBatch::linear(vec![1000, 1032, 1064, 2000]);
        // Predicate keeps the first and third lanes only.
        session.on_masked_load(&ptrs, &[true, false, true, false])?;

        let records = session.launches()[0].records();
        match &records[1] {
            Record::Load {
                tensor_addr,
                masks,
                invalid_masks,
                offsets,
                original_offsets,
                original_masks,
                shape,
            } => {
                assert_eq!(*tensor_addr, 1000);
                assert_eq!(shape, &vec![4]);
                // valid = [t,t,f,f]; predicate = [t,f,t,f]; AND = [t,f,f,f]
                assert_eq!(masks, &vec![true, false, false, false]);
                assert_eq!(invalid_masks, &vec![false, false, true, true]);
                assert_eq!(offsets, &vec![0, 32, 0, 0]);
                assert_eq!(original_offsets, &vec![0, 32, 64, 1000]);
                assert_eq!(original_masks, &vec![true, false, true, false]);
            }
            other => panic!("expected Load, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn store_captures_value_shape() -> Result<()> {
        let mut session = session_with_tensor();
        let ptrs = AddressBatch::new(vec![1000, 1004, 1008, 1012], vec![2, 2])?;
        session.on_masked_store(&ptrs, &[true; 4], &[2, 2])?;

        match &session.launches()[0].records()[1] {
            Record::Store {
                value_shape, shape, ..
            } => {
                assert_eq!(value_shape, &vec![2, 2]);
                assert_eq!(shape, &vec![2, 2]);
            }
            other => panic!("expected Store, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn predicate_length_must_match_batch() {
        let mut session = session_with_tensor();
        let ptrs = AddressBatch::linear(vec![1000, 1004]);
        assert!(matches!(
            session.on_masked_load(&ptrs, &[true]),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn load_with_empty_batch_fails() {
        let mut session = session_with_tensor();
        let ptrs = AddressBatch::linear(vec![]);
        assert!(matches!(
            session.on_masked_load(&ptrs, &[]),
            Err(Error::EmptyAddressBatch)
        ));
    }

    #[test]
    fn compute_hooks_append_in_order() -> Result<()> {
        let mut session = session_with_tensor();
        session.on_make_range(0, 16)?;
        session.on_binary_op("add", &[16], &[16], &[16])?;
        session.on_expand_dims(&[16], 1, &[16, 1])?;
        session.on_dot(&[16, 8], &[8, 4], &[16, 4], &[16, 4])?;
        session.on_reduce("sum", &[16, 4], Some(1), false, &[16])?;

        let kinds: Vec<&str> = session.launches()[0]
            .records()
            .iter()
            .map(|r| r.kind())
            .collect();
        assert_eq!(
            kinds,
            vec!["grid", "make_range", "binary_op", "expand_dims", "dot", "reduce"]
        );
        Ok(())
    }

    #[test]
    fn hooks_respect_sampling_filter() -> Result<()> {
        let mut session = TraceSession::new();
        session.set_sampling_idx(&[1])?;
        session.begin_launch(GridDim::linear(2))?;
        session
            .register_tensor(TensorDesc::new(1000, DType::F32, vec![4], vec![1]).unwrap())?;
        session.finalize_tensors()?;

        session.set_active_cell(GridIdx::origin())?;
        session.on_make_range(0, 4)?; // sampled out
        session.set_active_cell(GridIdx::new(1, 0, 0))?;
        session.on_make_range(4, 8)?; // kept

        let records = session.launches()[0].records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            Record::Grid {
                idx: GridIdx::new(1, 0, 0)
            }
        );
        assert_eq!(records[1], Record::MakeRange { start: 4, end: 8 });
        Ok(())
    }
}

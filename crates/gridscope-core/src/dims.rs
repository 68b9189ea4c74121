//! Grid dimensions and cell indices
//!
//! A launch iterates a 3D grid of program instances. `GridDim` is the
//! iteration space, `GridIdx` one cell in it. Both flatten row-major, which
//! is the ordering contract the sampling filter compares against.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid dimensions for a kernel launch
///
/// Defines the 3D iteration space of program instances. Missing trailing
/// dimensions are padded with 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDim {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridDim {
    /// Create new grid dimensions
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Create a 1D grid
    pub const fn linear(size: u32) -> Self {
        Self { x: size, y: 1, z: 1 }
    }

    /// Create a 2D grid
    pub const fn square(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Create grid dimensions from 1 to 3 components, padding with 1s
    ///
    /// Mirrors how drivers declare partial grids: `&[8]` is an 8-cell 1D
    /// grid, `&[4, 2]` a 4x2 grid.
    pub fn from_slice(dims: &[u32]) -> Result<Self> {
        match dims {
            [x] => Ok(Self::new(*x, 1, 1)),
            [x, y] => Ok(Self::new(*x, *y, 1)),
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(Error::InvalidGridRank { len: dims.len() }),
        }
    }

    /// Total number of cells in the grid
    pub const fn total_cells(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    /// Check that every component is positive
    pub const fn is_valid(&self) -> bool {
        self.x > 0 && self.y > 0 && self.z > 0
    }

    /// Check whether `idx` lies inside this grid
    pub const fn contains(&self, idx: GridIdx) -> bool {
        idx.x < self.x && idx.y < self.y && idx.z < self.z
    }
}

impl Default for GridDim {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

impl fmt::Display for GridDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Index of one grid cell (one program instance)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIdx {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridIdx {
    /// Create a new cell index
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// The origin cell (0, 0, 0)
    pub const fn origin() -> Self {
        Self { x: 0, y: 0, z: 0 }
    }

    /// Row-major linearization within `dim`
    pub const fn flatten(&self, dim: GridDim) -> u64 {
        self.x as u64 * dim.y as u64 * dim.z as u64 + self.y as u64 * dim.z as u64 + self.z as u64
    }
}

impl fmt::Display for GridIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Sampling target: a 1-, 2-, or 3-component cell index stored verbatim
///
/// The target is flattened only at filter-evaluation time, against whatever
/// grid dimensions are active then, using its own component count. Callers
/// must declare grids consistently with the target's dimensionality or the
/// filter is meaningless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleIdx(Vec<u32>);

impl SampleIdx {
    /// Create a sampling target from 1 to 3 components
    pub fn new(components: &[u32]) -> Result<Self> {
        if components.is_empty() || components.len() > 3 {
            return Err(Error::InvalidSamplingIdx {
                len: components.len(),
            });
        }
        Ok(Self(components.to_vec()))
    }

    /// The stored components, verbatim
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Row-major linearization within `dim`, by this target's own arity
    pub fn flatten(&self, dim: GridDim) -> u64 {
        match self.0.as_slice() {
            [a] => *a as u64,
            [a, b] => *a as u64 * dim.y as u64 + *b as u64,
            [a, b, c] => {
                *a as u64 * dim.y as u64 * dim.z as u64 + *b as u64 * dim.z as u64 + *c as u64
            }
            _ => unreachable!("SampleIdx arity checked at construction"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_dim_totals_and_validity() {
        let dim = GridDim::new(4, 2, 3);
        assert_eq!(dim.total_cells(), 24);
        assert!(dim.is_valid());
        assert!(!GridDim::new(4, 0, 1).is_valid());
        assert_eq!(GridDim::linear(8), GridDim::new(8, 1, 1));
        assert_eq!(GridDim::square(4, 2), GridDim::new(4, 2, 1));
    }

    #[test]
    fn grid_dim_from_slice_pads_with_ones() -> Result<()> {
        assert_eq!(GridDim::from_slice(&[4])?, GridDim::new(4, 1, 1));
        assert_eq!(GridDim::from_slice(&[4, 2])?, GridDim::new(4, 2, 1));
        assert_eq!(GridDim::from_slice(&[4, 2, 3])?, GridDim::new(4, 2, 3));
        assert!(GridDim::from_slice(&[]).is_err());
        assert!(GridDim::from_slice(&[1, 2, 3, 4]).is_err());
        Ok(())
    }

    #[test]
    fn grid_idx_flatten_row_major() {
        let dim = GridDim::new(2, 3, 4);
        assert_eq!(GridIdx::origin().flatten(dim), 0);
        assert_eq!(GridIdx::new(0, 0, 3).flatten(dim), 3);
        assert_eq!(GridIdx::new(0, 1, 0).flatten(dim), 4);
        assert_eq!(GridIdx::new(1, 0, 0).flatten(dim), 12);
        assert_eq!(GridIdx::new(1, 2, 3).flatten(dim), 23);
    }

    #[test]
    fn sample_idx_flatten_uses_own_arity() -> Result<()> {
        let dim = GridDim::new(2, 2, 1);
        assert_eq!(SampleIdx::new(&[1])?.flatten(dim), 1);
        assert_eq!(SampleIdx::new(&[0, 1])?.flatten(dim), 1);
        assert_eq!(SampleIdx::new(&[1, 1, 0])?.flatten(dim), 3);
        Ok(())
    }

    #[test]
    fn sample_idx_rejects_bad_arity() {
        assert!(SampleIdx::new(&[]).is_err());
        assert!(SampleIdx::new(&[0, 0, 0, 0]).is_err());
    }

    #[test]
    fn contains_checks_every_component() {
        let dim = GridDim::new(2, 2, 1);
        assert!(dim.contains(GridIdx::new(1, 1, 0)));
        assert!(!dim.contains(GridIdx::new(2, 0, 0)));
        assert!(!dim.contains(GridIdx::new(0, 2, 0)));
        assert!(!dim.contains(GridIdx::new(0, 0, 1)));
    }
}

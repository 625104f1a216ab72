//! The staggered (Yee) grid: cell bookkeeping, linear/tuple index
//! conversion, and the Yee offsets at which E and B are sampled.
//!
//! Cell tuples and per-axis counts are carried as fixed 3-wide arrays with
//! only the leading `Dm::DIM` entries meaningful — the same "3-wide,
//! dimension says how much of it counts" convention as [`crate::vector`],
//! chosen for the same reason: tying an array's length to `Dm::DIM` in a
//! struct definition needs const-generic expressions that Rust does not
//! stabilise. `Cell` doubles as the "can be negative, pre-boundary-policy"
//! representation used while a particle is mid-move.

use crate::dim::Dim;
use crate::errors::{ErrorKind, Result};
use crate::vector::Vector;
use crate::Float;
use std::marker::PhantomData;

/// A cell tuple, possibly out of range (e.g. before boundary reapplication).
pub type Cell = [i64; 3];

pub fn cell_zero() -> Cell {
    [0, 0, 0]
}

/// The D-dimensional axis-aligned rectilinear box fields and particles
/// live on.
#[derive(Debug, Clone)]
pub struct Grid<Dm: Dim> {
    /// Cell count per axis, leading `Dm::DIM` entries meaningful.
    n: [usize; 3],
    /// Cell size per axis (length units), leading `Dm::DIM` entries
    /// meaningful.
    h: [Float; 3],
    epsilon: Float,
    mu: Float,
    _dim: PhantomData<Dm>,
}

impl<Dm: Dim> Grid<Dm> {
    pub fn new(n: &[usize], h: &[Float], epsilon: Float, mu: Float) -> Result<Grid<Dm>> {
        if n.len() != Dm::DIM || h.len() != Dm::DIM {
            return Err(ErrorKind::Configuration(format!(
                "expected {} axis entries for n and h, got {} and {}",
                Dm::DIM,
                n.len(),
                h.len()
            ))
            .into());
        }
        if n.iter().any(|&ni| ni == 0) {
            return Err(ErrorKind::Configuration("cell count per axis must be positive".into()).into());
        }
        if h.iter().any(|&hi| hi <= 0.0) {
            return Err(ErrorKind::Configuration("cell size per axis must be positive".into()).into());
        }
        if epsilon <= 0.0 || mu <= 0.0 {
            return Err(ErrorKind::Configuration("epsilon and mu must be positive".into()).into());
        }

        let mut n_arr = [1usize; 3];
        let mut h_arr = [1.0; 3];
        n_arr[..Dm::DIM].copy_from_slice(n);
        h_arr[..Dm::DIM].copy_from_slice(h);

        Ok(Grid {
            n: n_arr,
            h: h_arr,
            epsilon,
            mu,
            _dim: PhantomData,
        })
    }

    pub fn dim(&self) -> usize {
        Dm::DIM
    }

    pub fn n(&self, axis: usize) -> usize {
        self.n[axis]
    }

    pub fn h(&self, axis: usize) -> Float {
        self.h[axis]
    }

    pub fn cell_sizes(&self) -> Vector {
        Vector::from_slice(&self.h[..Dm::DIM])
    }

    /// Uniform permittivity; the per-cell hook is [`Grid::epsilon_at`].
    pub fn epsilon(&self) -> Float {
        self.epsilon
    }

    /// Uniform permeability; the per-cell hook is [`Grid::mu_at`].
    pub fn mu(&self) -> Float {
        self.mu
    }

    /// Permittivity at a given cell. Uniform by default; override points
    /// for spatially varying media go here.
    pub fn epsilon_at(&self, _cell: usize) -> Float {
        self.epsilon
    }

    /// Permeability at a given cell. Uniform by default.
    pub fn mu_at(&self, _cell: usize) -> Float {
        self.mu
    }

    pub fn total_cells(&self) -> usize {
        self.n[..Dm::DIM].iter().product()
    }

    /// Row-major (last axis varies fastest) linear index of an in-range
    /// cell tuple.
    pub fn to_index(&self, cell: &Cell) -> usize {
        let mut idx = 0usize;
        for d in 0..Dm::DIM {
            idx = idx * self.n[d] + cell[d] as usize;
        }
        idx
    }

    /// Inverse of [`Grid::to_index`].
    pub fn to_cell(&self, mut index: usize) -> Cell {
        let mut cell = cell_zero();
        for d in (0..Dm::DIM).rev() {
            cell[d] = (index % self.n[d]) as i64;
            index /= self.n[d];
        }
        cell
    }

    pub fn is_inside(&self, cell: &Cell) -> bool {
        (0..Dm::DIM).all(|d| cell[d] >= 0 && (cell[d] as usize) < self.n[d])
    }

    pub fn is_outside(&self, cell: &Cell) -> bool {
        !self.is_inside(cell)
    }

    /// True if any cell within `radius` of `cell` would leave the domain —
    /// the fast path the depositor and gather use to skip boundary-policy
    /// lookups entirely away from the border.
    pub fn is_border(&self, cell: &Cell, radius: i64) -> bool {
        (0..Dm::DIM).any(|d| {
            cell[d] - radius < 0 || cell[d] + radius >= self.n[d] as i64
        })
    }

    /// Offset, in cell-size units, at which E's `axis` component is
    /// sampled within a cell: the Yee face-centre offset `0.5 * e_axis`.
    pub fn e_offset(&self, axis: usize) -> Vector {
        let mut v = [0.0; 3];
        v[axis] = 0.5;
        Vector::from_slice(&v[..Dm::DIM])
    }

    /// Offset, in cell-size units, at which B's `axis` component is
    /// sampled: the Yee edge-centre offset. In 3-D this is
    /// `0.5 * (1 - e_axis)`; in lower dimension B has no face/edge axis of
    /// its own to exclude, so every spatial component is offset by 0.5.
    pub fn b_offset(&self, axis: usize) -> Vector {
        if Dm::DIM == 3 {
            let mut v = [0.5; 3];
            v[axis] = 0.0;
            Vector::from_slice(&v[..Dm::DIM])
        } else {
            Vector::from_slice(&[0.5; 3][..Dm::DIM])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::{D1, D2, D3};

    #[test]
    fn index_tuple_roundtrip_3d() {
        let g: Grid<D3> = Grid::new(&[4, 5, 6], &[1.0, 1.0, 1.0], 1.0, 1.0).unwrap();
        for idx in 0..g.total_cells() {
            let cell = g.to_cell(idx);
            assert_eq!(g.to_index(&cell), idx);
        }
    }

    #[test]
    fn index_tuple_roundtrip_1d() {
        let g: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        for idx in 0..g.total_cells() {
            let cell = g.to_cell(idx);
            assert_eq!(g.to_index(&cell), idx);
        }
    }

    #[test]
    fn rejects_non_positive_cell_count() {
        let g: Result<Grid<D2>> = Grid::new(&[0, 4], &[1.0, 1.0], 1.0, 1.0);
        assert!(g.is_err());
    }

    #[test]
    fn rejects_wrong_axis_count() {
        let g: Result<Grid<D3>> = Grid::new(&[4, 4], &[1.0, 1.0], 1.0, 1.0);
        assert!(g.is_err());
    }

    #[test]
    fn is_border_detects_edge_cells() {
        let g: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        assert!(g.is_border(&[0, 0, 0], 1));
        assert!(!g.is_border(&[4, 0, 0], 1));
        assert!(g.is_border(&[7, 0, 0], 1));
    }
}

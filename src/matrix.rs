//! Distributed dense matrices
//!
//! A [`DistMatrix`] stores only the shard of a global `height x width` matrix
//! owned by the calling rank under a 2D block-cyclic layout: rows are dealt
//! over the grid's column of processes, columns over its row of processes.
//! Accessors never communicate; callers that need a globally visible value
//! perform their own broadcast or reduction.

use std::sync::Arc;

use ndarray::Array2;

use crate::dist::BlockCyclicDist;
use crate::error::{Error, Result};
use crate::grid::ProcessGrid;
use crate::indexing::Int;
use crate::scalar::Scalar;

#[derive(Debug, Clone)]
pub struct DistMatrix<T: Scalar> {
    grid: Arc<ProcessGrid>,
    height: Int,
    width: Int,
    row_dist: BlockCyclicDist,
    col_dist: BlockCyclicDist,
    local: Array2<T>,
}

impl<T: Scalar> DistMatrix<T> {
    /// An empty matrix with default (zero) alignments and block size one.
    pub fn new(grid: Arc<ProcessGrid>) -> Result<Self> {
        Self::with_block_size(grid, 1, 1)
    }

    /// An empty matrix with the given per-dimension block sizes.
    pub fn with_block_size(grid: Arc<ProcessGrid>, row_bsize: Int, col_bsize: Int) -> Result<Self> {
        // Non-participating ranks keep a valid descriptor at position zero so
        // shape queries stay well defined; their local shard is always empty.
        let (row, col) = if grid.participating() {
            (grid.row(), grid.col())
        } else {
            (0, 0)
        };
        let row_dist = BlockCyclicDist::new(row, 0, grid.height(), row_bsize, 0)?;
        let col_dist = BlockCyclicDist::new(col, 0, grid.width(), col_bsize, 0)?;
        Ok(Self {
            grid,
            height: 0,
            width: 0,
            row_dist,
            col_dist,
            local: Array2::zeros((0, 0)),
        })
    }

    pub fn grid(&self) -> &Arc<ProcessGrid> {
        &self.grid
    }
    pub fn height(&self) -> Int {
        self.height
    }
    pub fn width(&self) -> Int {
        self.width
    }
    pub fn row_dist(&self) -> &BlockCyclicDist {
        &self.row_dist
    }
    pub fn col_dist(&self) -> &BlockCyclicDist {
        &self.col_dist
    }

    /// Whether this rank holds a shard of the matrix at all.
    pub fn participating(&self) -> bool {
        self.grid.participating()
    }

    pub fn local_height(&self) -> Int {
        self.local.nrows() as Int
    }
    pub fn local_width(&self) -> Int {
        self.local.ncols() as Int
    }

    pub fn local(&self) -> &Array2<T> {
        &self.local
    }
    pub fn local_mut(&mut self) -> &mut Array2<T> {
        &mut self.local
    }

    /// Resize to a new global shape, zero-filling the local shard.
    pub fn resize(&mut self, height: Int, width: Int) -> Result<()> {
        if height < 0 || width < 0 {
            return Err(Error::InvalidArgument(format!(
                "negative matrix shape: {height} x {width}"
            )));
        }
        self.height = height;
        self.width = width;
        let (lh, lw) = if self.participating() {
            (
                self.row_dist.local_length(height)?,
                self.col_dist.local_length(width)?,
            )
        } else {
            (0, 0)
        };
        self.local = Array2::zeros((lh as usize, lw as usize));
        Ok(())
    }

    /// Rebind this matrix's alignments (and first-block cuts) to match
    /// another matrix's distribution. Any local content is discarded, so this
    /// must happen before population. The two matrices must share block
    /// sizes; mixed-blocking alignment has no consistent meaning.
    pub fn align_with<S: Scalar>(&mut self, other: &DistMatrix<S>) -> Result<()> {
        if self.row_dist.block_size() != other.row_dist.block_size()
            || self.col_dist.block_size() != other.col_dist.block_size()
        {
            return Err(Error::InvalidArgument(format!(
                "cannot align block sizes ({}, {}) with ({}, {})",
                self.row_dist.block_size(),
                self.col_dist.block_size(),
                other.row_dist.block_size(),
                other.col_dist.block_size()
            )));
        }
        self.row_dist = self
            .row_dist
            .realigned(other.row_dist.align(), other.row_dist.cut())?;
        self.col_dist = self
            .col_dist
            .realigned(other.col_dist.align(), other.col_dist.cut())?;
        let (height, width) = (self.height, self.width);
        self.resize(height, width)
    }

    pub fn is_local_row(&self, i: Int) -> bool {
        self.participating() && self.row_dist.is_local(i)
    }
    pub fn is_local_col(&self, j: Int) -> bool {
        self.participating() && self.col_dist.is_local(j)
    }
    pub fn is_local(&self, i: Int, j: Int) -> bool {
        self.is_local_row(i) && self.is_local_col(j)
    }

    pub fn local_row(&self, i: Int) -> Result<Int> {
        self.check_participating()?;
        self.check_row(i)?;
        self.row_dist.local_index(i)
    }
    pub fn local_col(&self, j: Int) -> Result<Int> {
        self.check_participating()?;
        self.check_col(j)?;
        self.col_dist.local_index(j)
    }

    /// Global row index of local row `i_loc`.
    pub fn global_row(&self, i_loc: Int) -> Int {
        self.row_dist.global_index(i_loc)
    }
    /// Global column index of local column `j_loc`.
    pub fn global_col(&self, j_loc: Int) -> Int {
        self.col_dist.global_index(j_loc)
    }

    pub fn row_owner(&self, i: Int) -> Int {
        self.row_dist.owner(i)
    }
    pub fn col_owner(&self, j: Int) -> Int {
        self.col_dist.owner(j)
    }
    /// Grid rank owning global entry `(i, j)`.
    pub fn owner(&self, i: Int, j: Int) -> Int {
        self.grid.rank_at(self.row_owner(i), self.col_owner(j))
    }

    /// Read a locally stored entry. Never communicates.
    pub fn get(&self, i: Int, j: Int) -> Result<T> {
        let (il, jl) = self.local_coords(i, j)?;
        Ok(self.local[(il, jl)])
    }

    /// Overwrite a locally stored entry.
    pub fn set(&mut self, i: Int, j: Int, value: T) -> Result<()> {
        let (il, jl) = self.local_coords(i, j)?;
        self.local[(il, jl)] = value;
        Ok(())
    }

    /// Accumulate into a locally stored entry.
    pub fn update(&mut self, i: Int, j: Int, value: T) -> Result<()> {
        let (il, jl) = self.local_coords(i, j)?;
        self.local[(il, jl)] = self.local[(il, jl)] + value;
        Ok(())
    }

    /// Populate every locally owned entry from a function of its global
    /// coordinates. Ranks evaluate `f` only at the entries they own.
    pub fn fill_with<F: FnMut(Int, Int) -> T>(&mut self, mut f: F) {
        for il in 0..self.local_height() {
            let i = self.global_row(il);
            for jl in 0..self.local_width() {
                let j = self.global_col(jl);
                self.local[(il as usize, jl as usize)] = f(i, j);
            }
        }
    }

    fn local_coords(&self, i: Int, j: Int) -> Result<(usize, usize)> {
        self.check_participating()?;
        self.check_row(i)?;
        self.check_col(j)?;
        let il = self.row_dist.local_index(i)?;
        let jl = self.col_dist.local_index(j)?;
        Ok((il as usize, jl as usize))
    }

    fn check_participating(&self) -> Result<()> {
        if self.participating() {
            Ok(())
        } else {
            Err(Error::NotParticipating {
                rank: self.grid.rank(),
            })
        }
    }

    fn check_row(&self, i: Int) -> Result<()> {
        if i < 0 || i >= self.height {
            Err(Error::IndexOutOfRange {
                index: i,
                extent: self.height,
            })
        } else {
            Ok(())
        }
    }

    fn check_col(&self, j: Int) -> Result<()> {
        if j < 0 || j >= self.width {
            Err(Error::IndexOutOfRange {
                index: j,
                extent: self.width,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_for(rank: Int, size: Int) -> Arc<ProcessGrid> {
        Arc::new(ProcessGrid::new(rank, size).unwrap())
    }

    #[test]
    fn test_local_shapes_partition_global() {
        let (h, w) = (23, 17);
        let size = 6;
        let mut total = 0;
        for rank in 0..size {
            let mut a: DistMatrix<f64> =
                DistMatrix::with_block_size(grid_for(rank, size), 3, 2).unwrap();
            a.resize(h, w).unwrap();
            total += a.local_height() * a.local_width();
        }
        assert_eq!(total, h * w);
    }

    #[test]
    fn test_set_get_update_round_trip() {
        let size = 4;
        for rank in 0..size {
            let mut a: DistMatrix<f64> = DistMatrix::new(grid_for(rank, size)).unwrap();
            a.resize(8, 8).unwrap();
            for i in 0..8 {
                for j in 0..8 {
                    if a.is_local(i, j) {
                        a.set(i, j, (i * 8 + j) as f64).unwrap();
                        a.update(i, j, 0.5).unwrap();
                        assert_eq!(a.get(i, j).unwrap(), (i * 8 + j) as f64 + 0.5);
                    } else {
                        assert!(a.get(i, j).is_err());
                    }
                }
            }
        }
    }

    #[test]
    fn test_every_entry_has_one_owner() {
        let size = 6;
        let mats: Vec<DistMatrix<f64>> = (0..size)
            .map(|rank| {
                let mut a = DistMatrix::with_block_size(grid_for(rank, size), 2, 3).unwrap();
                a.resize(11, 13).unwrap();
                a
            })
            .collect();
        for i in 0..11 {
            for j in 0..13 {
                let owners: Vec<Int> = mats
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| a.is_local(i, j))
                    .map(|(r, _)| r as Int)
                    .collect();
                assert_eq!(owners.len(), 1);
                assert_eq!(owners[0], mats[0].owner(i, j));
            }
        }
    }

    #[test]
    fn test_local_global_coordinates_agree() {
        let mut a: DistMatrix<f64> = DistMatrix::with_block_size(grid_for(3, 6), 2, 2).unwrap();
        a.resize(20, 20).unwrap();
        for il in 0..a.local_height() {
            let i = a.global_row(il);
            assert_eq!(a.local_row(i).unwrap(), il);
        }
        for jl in 0..a.local_width() {
            let j = a.global_col(jl);
            assert_eq!(a.local_col(j).unwrap(), jl);
        }
    }

    #[test]
    fn test_non_participating_rank() {
        let grid = Arc::new(ProcessGrid::with_shape(6, 7, 2, 3).unwrap());
        let mut a: DistMatrix<f64> = DistMatrix::new(grid).unwrap();
        a.resize(10, 10).unwrap();
        assert!(!a.participating());
        assert_eq!(a.local_height(), 0);
        assert!(matches!(
            a.get(0, 0),
            Err(Error::NotParticipating { rank: 6 })
        ));
    }

    #[test]
    fn test_align_with() {
        let grid = grid_for(1, 4);
        let mut a: DistMatrix<f64> = DistMatrix::new(grid.clone()).unwrap();
        a.resize(9, 9).unwrap();
        let mut b: DistMatrix<f64> = DistMatrix::new(grid).unwrap();
        b.resize(9, 9).unwrap();
        b.align_with(&a).unwrap();
        assert_eq!(b.row_dist().align(), a.row_dist().align());
        assert_eq!(b.local_height(), a.local_height());

        let mut c: DistMatrix<f64> =
            DistMatrix::with_block_size(a.grid().clone(), 2, 2).unwrap();
        assert!(c.align_with(&a).is_err());
    }

    #[test]
    fn test_out_of_range() {
        let mut a: DistMatrix<f64> = DistMatrix::new(grid_for(0, 1)).unwrap();
        a.resize(4, 4).unwrap();
        assert!(matches!(
            a.get(4, 0),
            Err(Error::IndexOutOfRange { index: 4, extent: 4 })
        ));
        assert!(a.resize(-1, 2).is_err());
    }
}

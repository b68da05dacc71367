//! Two-dimensional process grid
//!
//! A [`ProcessGrid`] models the Cartesian arrangement of the worker processes
//! a matrix is sharded across. It holds no communicator: the host injects the
//! local `(rank, size)` pair and the grid only does coordinate arithmetic.
//! Grids are immutable after construction and are shared by every matrix
//! built on them (via `Arc`), so no synchronization is ever needed.

use crate::error::{Error, Result};
use crate::indexing::Int;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessGrid {
    rank: Int,
    size: Int,
    height: Int,
    width: Int,
}

impl ProcessGrid {
    /// Build a grid over `size` ranks with the most nearly square shape:
    /// the height is the largest divisor of `size` not exceeding its square
    /// root.
    pub fn new(rank: Int, size: Int) -> Result<Self> {
        if size <= 0 {
            return Err(Error::InvalidArgument(format!(
                "grid size must be positive, got {size}"
            )));
        }
        let mut height = (size as f64).sqrt() as Int;
        while size % height != 0 {
            height -= 1;
        }
        Self::with_shape(rank, size, height, size / height)
    }

    /// Build a grid with an explicit `height x width` shape. Ranks at or
    /// beyond `height * width` exist but do not participate.
    pub fn with_shape(rank: Int, size: Int, height: Int, width: Int) -> Result<Self> {
        if size <= 0 {
            return Err(Error::InvalidArgument(format!(
                "grid size must be positive, got {size}"
            )));
        }
        if rank < 0 || rank >= size {
            return Err(Error::InvalidArgument(format!(
                "rank {rank} outside [0, {size})"
            )));
        }
        if height <= 0 || width <= 0 || height * width > size {
            return Err(Error::InvalidArgument(format!(
                "invalid grid shape {height} x {width} for {size} ranks"
            )));
        }
        Ok(Self {
            rank,
            size,
            height,
            width,
        })
    }

    pub fn rank(&self) -> Int {
        self.rank
    }

    /// Total number of ranks in the communicator, participating or not.
    pub fn size(&self) -> Int {
        self.size
    }

    pub fn height(&self) -> Int {
        self.height
    }

    pub fn width(&self) -> Int {
        self.width
    }

    /// Whether this rank lies inside the `height x width` rectangle.
    pub fn participating(&self) -> bool {
        self.rank < self.height * self.width
    }

    /// Grid row of this rank (column-major rank ordering). Only meaningful
    /// when [`ProcessGrid::participating`] holds.
    pub fn row(&self) -> Int {
        self.rank % self.height
    }

    /// Grid column of this rank (column-major rank ordering).
    pub fn col(&self) -> Int {
        self.rank / self.height
    }

    /// Rank of the process at grid position `(row, col)`.
    pub fn rank_at(&self, row: Int, col: Int) -> Int {
        row + col * self.height
    }
}

//! Block-cyclic distribution descriptors
//!
//! A [`BlockCyclicDist`] describes how one dimension of a matrix is spread
//! over `stride` processes: blocks of `bsize` consecutive indices are dealt
//! round-robin starting at `align`, with the first block truncated by `cut`
//! already-consumed entries. `bsize = 1, cut = 0` degenerates to the plain
//! element-wise (stride) distribution, so both spec'd distributions share a
//! single code path.

use crate::error::{Error, Result};
use crate::indexing::{self, Int};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCyclicDist {
    rank: Int,
    align: Int,
    stride: Int,
    bsize: Int,
    cut: Int,
}

impl BlockCyclicDist {
    pub fn new(rank: Int, align: Int, stride: Int, bsize: Int, cut: Int) -> Result<Self> {
        if stride <= 0 {
            return Err(Error::InvalidArgument(format!(
                "stride must be positive, got {stride}"
            )));
        }
        if rank < 0 || rank >= stride {
            return Err(Error::InvalidArgument(format!(
                "invalid rank: rank={rank}, stride={stride}"
            )));
        }
        if align < 0 || align >= stride {
            return Err(Error::InvalidArgument(format!(
                "invalid alignment: align={align}, stride={stride}"
            )));
        }
        if bsize <= 0 {
            return Err(Error::InvalidArgument(format!(
                "block size must be positive, got {bsize}"
            )));
        }
        if cut < 0 || cut >= bsize {
            return Err(Error::InvalidArgument(format!(
                "invalid cut: cut={cut}, bsize={bsize}"
            )));
        }
        Ok(Self {
            rank,
            align,
            stride,
            bsize,
            cut,
        })
    }

    /// The element-wise distribution: block size one, no cut.
    pub fn element_wise(rank: Int, align: Int, stride: Int) -> Result<Self> {
        Self::new(rank, align, stride, 1, 0)
    }

    pub fn rank(&self) -> Int {
        self.rank
    }
    pub fn align(&self) -> Int {
        self.align
    }
    pub fn stride(&self) -> Int {
        self.stride
    }
    pub fn block_size(&self) -> Int {
        self.bsize
    }
    pub fn cut(&self) -> Int {
        self.cut
    }

    /// First global block index owned by this rank.
    pub fn shift(&self) -> Int {
        indexing::shift_unchecked(self.rank, self.align, self.stride)
    }

    /// Number of entries of a length-`n` dimension this rank owns.
    pub fn local_length(&self, n: Int) -> Result<Int> {
        indexing::blocked_length(n, self.shift(), self.bsize, self.cut, self.stride)
    }

    /// Global index of the locally stored entry `i_loc`.
    pub fn global_index(&self, i_loc: Int) -> Int {
        indexing::global_blocked_index(i_loc, self.shift(), self.bsize, self.cut, self.stride)
    }

    /// Rank owning global index `i`.
    pub fn owner(&self, i: Int) -> Int {
        indexing::owning_rank(i, self.align, self.bsize, self.cut, self.stride)
    }

    pub fn is_local(&self, i: Int) -> bool {
        self.owner(i) == self.rank
    }

    /// Local index of global index `i`; fails with [`Error::NotLocal`] when
    /// `i` is owned by a different rank.
    pub fn local_index(&self, i: Int) -> Result<Int> {
        indexing::local_blocked_index(i, self.shift(), self.bsize, self.cut, self.stride)
            .ok_or(Error::NotLocal {
                index: i,
                rank: self.rank,
            })
    }

    /// A descriptor identical to this one but rebound to a new alignment
    /// (and first-block cut). Re-alignment never mutates in place; the owning
    /// matrix rebinds itself to the new descriptor.
    pub fn realigned(&self, align: Int, cut: Int) -> Result<Self> {
        Self::new(self.rank, align, self.stride, self.bsize, cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_over_ranks() {
        let n = 37;
        for stride in [1, 2, 5] {
            for align in 0..stride {
                let total: Int = (0..stride)
                    .map(|r| {
                        BlockCyclicDist::new(r, align, stride, 4, 1)
                            .unwrap()
                            .local_length(n)
                            .unwrap()
                    })
                    .sum();
                assert_eq!(total, n);
            }
        }
    }

    #[test]
    fn test_local_global_round_trip() {
        let d = BlockCyclicDist::new(2, 1, 3, 4, 2).unwrap();
        let n = 50;
        let len = d.local_length(n).unwrap();
        for i_loc in 0..len {
            let i = d.global_index(i_loc);
            assert!(d.is_local(i));
            assert_eq!(d.owner(i), 2);
            assert_eq!(d.local_index(i).unwrap(), i_loc);
        }
    }

    #[test]
    fn test_not_local() {
        let d = BlockCyclicDist::element_wise(0, 0, 2).unwrap();
        assert!(d.is_local(4));
        assert!(!d.is_local(5));
        assert!(matches!(
            d.local_index(5),
            Err(Error::NotLocal { index: 5, rank: 0 })
        ));
    }

    #[test]
    fn test_element_wise_matches_length() {
        let d = BlockCyclicDist::element_wise(3, 1, 4).unwrap();
        // shift = (3-1) mod 4 = 2; indices 2, 6 of [0,10)
        assert_eq!(d.local_length(10).unwrap(), 2);
        assert_eq!(d.global_index(1), 6);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(BlockCyclicDist::new(0, 0, 0, 1, 0).is_err());
        assert!(BlockCyclicDist::new(2, 0, 2, 1, 0).is_err());
        assert!(BlockCyclicDist::new(0, 2, 2, 1, 0).is_err());
        assert!(BlockCyclicDist::new(0, 0, 2, 0, 0).is_err());
        assert!(BlockCyclicDist::new(0, 0, 2, 3, 3).is_err());
    }
}

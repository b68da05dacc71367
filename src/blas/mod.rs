//! Level-2/3 dense kernels
//!
//! Pure-Rust kernels generic over [`Scalar`](crate::scalar::Scalar), so the
//! same code serves `f64`, `Complex<f64>`, and the double-double type. All
//! entry points validate shapes and return `Result`; the arithmetic itself is
//! straightforward triple loops, which is all the eigensolver's window sizes
//! need.

mod gemm;
mod gemv;
pub mod norms;
mod rank_k;
mod trmm;
mod trsm;

pub use gemm::gemm;
pub use gemv::gemv;
pub use rank_k::{her2k, herk};
pub use trmm::trmm;
pub use trsm::trsm;

use crate::scalar::Scalar;

/// How a matrix argument enters a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    Transpose,
    Adjoint,
}

impl Orientation {
    /// Shape of `op(A)` given the stored shape of `A`.
    pub(crate) fn dims(self, a: (usize, usize)) -> (usize, usize) {
        match self {
            Orientation::Normal => a,
            Orientation::Transpose | Orientation::Adjoint => (a.1, a.0),
        }
    }

    /// Entry `(i, j)` of `op(A)`.
    pub(crate) fn entry<T: Scalar>(self, a: &ndarray::ArrayView2<'_, T>, i: usize, j: usize) -> T {
        match self {
            Orientation::Normal => a[(i, j)],
            Orientation::Transpose => a[(j, i)],
            Orientation::Adjoint => a[(j, i)].conj(),
        }
    }
}

/// Which triangle of a triangular/Hermitian argument is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpperOrLower {
    Upper,
    Lower,
}

impl UpperOrLower {
    pub(crate) fn flipped(self) -> Self {
        match self {
            UpperOrLower::Upper => UpperOrLower::Lower,
            UpperOrLower::Lower => UpperOrLower::Upper,
        }
    }
}

/// Which side a triangular factor multiplies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeftOrRight {
    Left,
    Right,
}

/// Whether a triangular factor has an implicit unit diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOrNonUnit {
    Unit,
    NonUnit,
}

pub(crate) fn shape_mismatch(op: &str, detail: String) -> crate::error::Error {
    crate::error::Error::InvalidArgument(format!("{op}: {detail}"))
}

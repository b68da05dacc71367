//! Crate-wide error taxonomy

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the distribution layer and the eigensolver.
///
/// Everything except [`Error::DidNotConverge`] is a precondition violation:
/// a logic error on the caller's side that is reported immediately and is not
/// recoverable by retrying. `DidNotConverge` is the single numerical failure
/// mode, and only escalates to an error when the caller demands convergence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument violated a documented precondition (negative size,
    /// non-positive stride, shift outside `[0, stride)`, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A global index fell outside the matrix extent.
    #[error("global index {index} out of range for extent {extent}")]
    IndexOutOfRange { index: i64, extent: i64 },

    /// A global index is owned by a different rank under the distribution.
    #[error("global index {index} is not local to rank {rank}")]
    NotLocal { index: i64, rank: i64 },

    /// A local accessor was called from a rank outside the process grid.
    #[error("rank {rank} does not participate in the process grid")]
    NotParticipating { rank: i64 },

    /// The QR iteration budget was exhausted with `demand_converged` set.
    #[error("QR iteration did not converge; {num_unconverged} eigenvalues remain")]
    DidNotConverge { num_unconverged: usize },
}

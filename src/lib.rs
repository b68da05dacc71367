//! # gridqr: block-cyclic distributed matrices and a Hessenberg QR eigensolver
//!
//! Two halves that meet in dense eigensolvers: a communication-free data
//! distribution layer mapping global matrix indices onto a 2D process grid
//! under block-cyclic wrapping, and an in-core Schur decomposition of upper
//! Hessenberg matrices driven by the multishift QR algorithm with aggressive
//! early deflation.
//!
//! The distribution layer answers ownership and addressing questions only;
//! it never moves data. The eigensolver is generic over a real scalar trait,
//! so it runs in `f64` or in double-double precision unchanged.

pub mod blas;
pub mod dist;
pub mod error;
pub mod grid;
pub mod indexing;
pub mod matrix;
pub mod scalar;
pub mod schur;

pub use dist::BlockCyclicDist;
pub use error::{Error, Result};
pub use grid::ProcessGrid;
pub use indexing::Int;
pub use matrix::DistMatrix;
pub use scalar::{Real, Scalar, TwoFloatReal};
pub use schur::hessenberg::reduce as hessenberg_reduce;
pub use schur::{hessenberg_schur, hessenberg_schur_complex, HessQrCtrl, HessQrInfo};

// Re-export external dependencies used in the public API
pub use ndarray;
pub use num_complex;

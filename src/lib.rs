//! splitqp: an operator-splitting quadratic program solver.
//!
//! Solves convex quadratic programs of the form
//!
//! ```text
//! minimize    ½ xᵀ P x + qᵀ x
//! subject to  l ≤ A x ≤ u
//! ```
//!
//! using the ADMM algorithm described in:
//!
//! - Stellato, B., Banjac, G., Goulart, P. et al.
//!   **OSQP: an operator splitting solver for quadratic programs.**
//!   *Math. Prog. Comp.* 12, 637–672 (2020).
//!
//! The solver factors one quasi-definite KKT system up front and reuses
//! the factors across all iterations, detects primal and dual
//! infeasibility from iterate differences, and optionally polishes the
//! converged solution by solving a reduced KKT system on the active
//! constraints.
//!
//! Two problem flavors are supported: [`QuadraticProgram`] with dense
//! column-major matrices backed by a dense LDLᵀ factorization, and
//! [`QuadraticProgramSparse`] with a CSC cost matrix and CSR constraint
//! matrix backed by a sparse LDLᵀ factorization. Both run through the
//! same monomorphized iteration.
//!
//! # Example
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use splitqp::{solve, ExitCode, QuadraticProgram, SolverParams};
//!
//! // min x² subject to 1 ≤ x ≤ 2
//! let pbm = QuadraticProgram {
//!     p: DMatrix::from_row_slice(1, 1, &[2.0]),
//!     q: DVector::from_vec(vec![0.0]),
//!     a: DMatrix::from_row_slice(1, 1, &[1.0]),
//!     l: DVector::from_vec(vec![1.0]),
//!     u: DVector::from_vec(vec![2.0]),
//! };
//!
//! let sol = solve(&pbm, &SolverParams::default(), None);
//! assert_eq!(sol.code, ExitCode::Optimal);
//! assert!((sol.primal[0] - 1.0).abs() < 1e-6);
//! ```

#![warn(clippy::all)]

pub mod kkt;
pub mod linalg;
pub mod polish;
pub mod problem;
pub mod solver;
pub mod termination;

pub use polish::polish;
pub use problem::{
    ExitCode, ProblemError, QpForm, QuadraticProgram, QuadraticProgramSparse, Solution,
    SolverParams,
};
pub use solver::solve;

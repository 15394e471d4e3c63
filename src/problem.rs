//! Problem data structures and validation.
//!
//! Both problem flavors describe the same mathematical object,
//!
//! ```text
//! minimize    ½ xᵀ P x + qᵀ x
//! subject to  l ≤ A x ≤ u
//! ```
//!
//! with P an n×n positive semi-definite cost matrix, A an m×n constraint
//! matrix, and ±∞ entries in `l`/`u` leaving a constraint unbounded on
//! that side.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::kkt;
use crate::linalg::sparse::{csr_mul, csr_trans_mul, symm_mul_upper, SparseCsc, SparseCsr};
use crate::linalg::{LdltBackend, LdltDense, LdltSparse, SymmetricUpper};
use crate::termination::dot;

/// Problem construction errors.
#[derive(Debug, Error)]
pub enum ProblemError {
    /// A matrix has the wrong shape.
    #[error("{matrix} has shape {rows}×{cols}, expected {expected_rows}×{expected_cols}")]
    BadShape {
        matrix: &'static str,
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    /// A vector has the wrong length.
    #[error("{vector} has length {len}, expected {expected}")]
    BadLength {
        vector: &'static str,
        len: usize,
        expected: usize,
    },

    /// A bound entry is NaN.
    #[error("bound is NaN at row {0}")]
    NanBound(usize),

    /// The sparse cost matrix must be CSC with only the upper triangle stored.
    #[error("cost matrix must be stored column-major (CSC), upper triangle only")]
    CostStorage,

    /// The sparse constraint matrix must be CSR.
    #[error("constraint matrix must be stored row-major (CSR)")]
    ConstraintStorage,
}

/// Quadratic program with dense column-major storage.
#[derive(Debug, Clone)]
pub struct QuadraticProgram {
    /// Positive semi-definite cost matrix (n×n). The factorization reads
    /// only the upper triangle; products use the matrix as stored.
    pub p: DMatrix<f64>,
    /// Linear cost (length n).
    pub q: DVector<f64>,
    /// Constraint matrix (m×n).
    pub a: DMatrix<f64>,
    /// Constraint lower bounds (length m), −∞ allowed.
    pub l: DVector<f64>,
    /// Constraint upper bounds (length m), +∞ allowed.
    pub u: DVector<f64>,
}

/// Quadratic program with sparse storage.
///
/// The cost matrix is CSC with only the upper triangle stored; the
/// constraint matrix is CSR so each constraint row is contiguous.
#[derive(Debug, Clone)]
pub struct QuadraticProgramSparse {
    /// Positive semi-definite cost matrix (n×n, CSC, upper triangle only).
    pub p: SparseCsc,
    /// Linear cost (length n).
    pub q: Vec<f64>,
    /// Constraint matrix (m×n, CSR).
    pub a: SparseCsr,
    /// Constraint lower bounds (length m), −∞ allowed.
    pub l: Vec<f64>,
    /// Constraint upper bounds (length m), +∞ allowed.
    pub u: Vec<f64>,
}

/// Solver exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Stopping criterion met; primal and dual are populated.
    Optimal,
    /// Converged, but the polish factorization was singular; the
    /// pre-polish primal and dual are retained.
    PolishFailed,
    /// The constraints admit no feasible point.
    PrimalInfeasible,
    /// The objective is unbounded below over the feasible set.
    DualInfeasible,
    /// Iteration budget exhausted; the last iterate is returned.
    MaxIterations,
    /// The KKT factorization failed.
    Unknown,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Optimal => write!(f, "Optimal"),
            ExitCode::PolishFailed => write!(f, "PolishFailed"),
            ExitCode::PrimalInfeasible => write!(f, "Primal Infeasible"),
            ExitCode::DualInfeasible => write!(f, "Dual Infeasible"),
            ExitCode::MaxIterations => write!(f, "MaxIterations"),
            ExitCode::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Solver solution.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Exit code.
    pub code: ExitCode,
    /// Primal vector (length n; empty for certificate exits).
    pub primal: Vec<f64>,
    /// Dual vector (length m; empty for certificate exits).
    pub dual: Vec<f64>,
}

impl Default for Solution {
    fn default() -> Self {
        Self {
            code: ExitCode::Unknown,
            primal: Vec::new(),
            dual: Vec::new(),
        }
    }
}

impl Solution {
    pub(crate) fn empty(code: ExitCode) -> Self {
        Self {
            code,
            primal: Vec::new(),
            dual: Vec::new(),
        }
    }
}

/// Solver options.
#[derive(Debug, Clone)]
pub struct SolverParams {
    /// ADMM relaxation parameter, in (0, 2).
    pub alpha: f64,
    /// Primary dual step size.
    pub rho: f64,
    /// Secondary dual step size / primal regularization.
    pub sigma: f64,

    /// Absolute convergence tolerance.
    pub eps_abs: f64,
    /// Relative convergence tolerance.
    pub eps_rel: f64,
    /// Primal infeasibility certificate tolerance.
    pub eps_primal_inf: f64,
    /// Dual infeasibility certificate tolerance.
    pub eps_dual_inf: f64,

    /// Hard iteration cap.
    pub max_iter: usize,
    /// Iterations between stopping-criterion checks (must be ≥ 1).
    pub stop_check_iter: usize,

    /// Run solution polishing after convergence.
    pub polish: bool,
    /// Iterative-refinement steps during polishing.
    pub polish_iter: usize,
    /// Diagonal regularization for the polish factorization.
    pub delta: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            alpha: 1.6,
            rho: 0.1,
            sigma: 1e-6,
            eps_abs: 1e-3,
            eps_rel: 1e-3,
            eps_primal_inf: 1e-4,
            eps_dual_inf: 1e-4,
            max_iter: usize::MAX,
            stop_check_iter: 10,
            polish: true,
            polish_iter: 5,
            delta: 1e-6,
        }
    }
}

/// Capability set shared by the dense and sparse problem flavors.
///
/// The solver and polisher are generic over this trait, so each flavor
/// compiles to its own loop with the matching factorization backend and no
/// dispatch inside the iteration.
pub trait QpForm {
    /// KKT matrix representation for this flavor.
    type Kkt: SymmetricUpper;
    /// LDLᵀ backend consuming `Self::Kkt`.
    type Ldlt: LdltBackend<Matrix = Self::Kkt>;

    /// Number of variables n.
    fn nvars(&self) -> usize;
    /// Number of constraints m.
    fn ncons(&self) -> usize;

    /// Linear cost.
    fn q(&self) -> &[f64];
    /// Lower bounds.
    fn l(&self) -> &[f64];
    /// Upper bounds.
    fn u(&self) -> &[f64];

    /// out = P x
    fn p_mul(&self, x: &[f64], out: &mut [f64]);
    /// out = A x
    fn a_mul(&self, x: &[f64], out: &mut [f64]);
    /// out = Aᵀ y
    fn at_mul(&self, y: &[f64], out: &mut [f64]);

    /// Assemble the ADMM KKT matrix [P + σI, Aᵀ; ·, −(1/ρ)I].
    fn admm_kkt(&self, sigma: f64, rho: f64) -> Self::Kkt;

    /// Assemble the reduced polish matrix over the active rows `lu_idx`,
    /// unperturbed for `delta == 0` and with the ±δ diagonal shift
    /// otherwise.
    fn polish_kkt(&self, lu_idx: &[usize], delta: f64) -> Self::Kkt;

    /// Objective value ½ xᵀPx + qᵀx.
    fn objective(&self, x: &[f64]) -> f64 {
        let mut px = vec![0.0; self.nvars()];
        self.p_mul(x, &mut px);
        0.5 * dot(x, &px) + dot(self.q(), x)
    }
}

impl QuadraticProgram {
    /// Check dimension consistency and bound sanity.
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.q.len();
        let m = self.l.len();

        if self.p.nrows() != n || self.p.ncols() != n {
            return Err(ProblemError::BadShape {
                matrix: "P",
                rows: self.p.nrows(),
                cols: self.p.ncols(),
                expected_rows: n,
                expected_cols: n,
            });
        }
        if self.a.nrows() != m || self.a.ncols() != n {
            return Err(ProblemError::BadShape {
                matrix: "A",
                rows: self.a.nrows(),
                cols: self.a.ncols(),
                expected_rows: m,
                expected_cols: n,
            });
        }
        if self.u.len() != m {
            return Err(ProblemError::BadLength {
                vector: "u",
                len: self.u.len(),
                expected: m,
            });
        }
        check_bounds(self.l.as_slice(), self.u.as_slice())
    }
}

impl QuadraticProgramSparse {
    /// Check dimension consistency, storage orders, and bound sanity.
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.q.len();
        let m = self.l.len();

        if !self.p.is_csc() || self.p.iter().any(|(_, (row, col))| row > col) {
            return Err(ProblemError::CostStorage);
        }
        if !self.a.is_csr() {
            return Err(ProblemError::ConstraintStorage);
        }
        if self.p.rows() != n || self.p.cols() != n {
            return Err(ProblemError::BadShape {
                matrix: "P",
                rows: self.p.rows(),
                cols: self.p.cols(),
                expected_rows: n,
                expected_cols: n,
            });
        }
        if self.a.rows() != m || self.a.cols() != n {
            return Err(ProblemError::BadShape {
                matrix: "A",
                rows: self.a.rows(),
                cols: self.a.cols(),
                expected_rows: m,
                expected_cols: n,
            });
        }
        if self.u.len() != m {
            return Err(ProblemError::BadLength {
                vector: "u",
                len: self.u.len(),
                expected: m,
            });
        }
        check_bounds(&self.l, &self.u)
    }
}

fn check_bounds(l: &[f64], u: &[f64]) -> Result<(), ProblemError> {
    for i in 0..l.len() {
        if l[i].is_nan() || u[i].is_nan() {
            return Err(ProblemError::NanBound(i));
        }
    }
    Ok(())
}

impl QpForm for QuadraticProgram {
    type Kkt = DMatrix<f64>;
    type Ldlt = LdltDense;

    fn nvars(&self) -> usize {
        self.q.len()
    }

    fn ncons(&self) -> usize {
        self.l.len()
    }

    fn q(&self) -> &[f64] {
        self.q.as_slice()
    }

    fn l(&self) -> &[f64] {
        self.l.as_slice()
    }

    fn u(&self) -> &[f64] {
        self.u.as_slice()
    }

    fn p_mul(&self, x: &[f64], out: &mut [f64]) {
        let n = self.nvars();
        assert_eq!(x.len(), n);
        assert_eq!(out.len(), n);

        // Column-major traversal.
        out.fill(0.0);
        for j in 0..n {
            let xj = x[j];
            for i in 0..n {
                out[i] += self.p[(i, j)] * xj;
            }
        }
    }

    fn a_mul(&self, x: &[f64], out: &mut [f64]) {
        let (m, n) = (self.ncons(), self.nvars());
        assert_eq!(x.len(), n);
        assert_eq!(out.len(), m);

        out.fill(0.0);
        for j in 0..n {
            let xj = x[j];
            for i in 0..m {
                out[i] += self.a[(i, j)] * xj;
            }
        }
    }

    fn at_mul(&self, y: &[f64], out: &mut [f64]) {
        let (m, n) = (self.ncons(), self.nvars());
        assert_eq!(y.len(), m);
        assert_eq!(out.len(), n);

        for j in 0..n {
            let mut acc = 0.0;
            for i in 0..m {
                acc += self.a[(i, j)] * y[i];
            }
            out[j] = acc;
        }
    }

    fn admm_kkt(&self, sigma: f64, rho: f64) -> DMatrix<f64> {
        kkt::admm_kkt_dense(&self.p, &self.a, sigma, rho)
    }

    fn polish_kkt(&self, lu_idx: &[usize], delta: f64) -> DMatrix<f64> {
        kkt::polish_kkt_dense(&self.p, &self.a, lu_idx, delta)
    }
}

impl QpForm for QuadraticProgramSparse {
    type Kkt = SparseCsc;
    type Ldlt = LdltSparse;

    fn nvars(&self) -> usize {
        self.q.len()
    }

    fn ncons(&self) -> usize {
        self.l.len()
    }

    fn q(&self) -> &[f64] {
        &self.q
    }

    fn l(&self) -> &[f64] {
        &self.l
    }

    fn u(&self) -> &[f64] {
        &self.u
    }

    fn p_mul(&self, x: &[f64], out: &mut [f64]) {
        symm_mul_upper(&self.p, x, out);
    }

    fn a_mul(&self, x: &[f64], out: &mut [f64]) {
        csr_mul(&self.a, x, out);
    }

    fn at_mul(&self, y: &[f64], out: &mut [f64]) {
        csr_trans_mul(&self.a, y, out);
    }

    fn admm_kkt(&self, sigma: f64, rho: f64) -> SparseCsc {
        kkt::admm_kkt_sparse(&self.p, &self.a, sigma, rho)
    }

    fn polish_kkt(&self, lu_idx: &[usize], delta: f64) -> SparseCsc {
        kkt::polish_kkt_sparse(&self.p, &self.a, lu_idx, delta)
    }
}

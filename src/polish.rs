//! Active-set polishing.
//!
//! Once the ADMM loop has converged, the active constraints are read off
//! the signs of the dual iterate: a negative multiplier pins its row at
//! the lower bound, a positive one at the upper bound. Solving the
//! equality-constrained KKT system restricted to those rows recovers a
//! solution far more accurate than the stopping tolerance.
//!
//! The reduced matrix has a zero trailing block, so the factored copy
//! carries a ±δ diagonal shift that makes it quasi-definite; a few rounds
//! of iterative refinement against the unperturbed matrix remove the bias
//! the shift introduces.

use crate::linalg::{LdltBackend, SymmetricUpper};
use crate::problem::{ExitCode, QpForm, Solution, SolverParams};

/// Polish a converged solution in place.
///
/// On factorization failure the exit code becomes
/// [`ExitCode::PolishFailed`] and the primal/dual vectors are left
/// untouched; on success the vectors are refined and the code is
/// unchanged.
pub fn polish<P: QpForm>(pbm: &P, sol: &mut Solution, prm: &SolverParams) {
    let n = pbm.nvars();
    let m = pbm.ncons();
    let q = pbm.q();
    let l = pbm.l();
    let u = pbm.u();
    assert_eq!(sol.primal.len(), n);
    assert_eq!(sol.dual.len(), m);

    // Active sets from strict dual signs, lower-bound rows first.
    // TODO: classify with a small margin around zero instead of strict
    // signs, so near-active rows are not dropped from the reduced system.
    let mut lu_idx = Vec::with_capacity(m);
    for i in 0..m {
        if sol.dual[i] < 0.0 {
            lu_idx.push(i);
        }
    }
    let nl = lu_idx.len();
    for i in 0..m {
        if sol.dual[i] > 0.0 {
            lu_idx.push(i);
        }
    }
    let nu = lu_idx.len() - nl;
    let kp = n + nl + nu;

    // The unperturbed matrix is kept for refinement residuals; only the
    // shifted copy is factored.
    let h_mat = pbm.polish_kkt(&lu_idx, 0.0);
    let ldlt = P::Ldlt::factorize(pbm.polish_kkt(&lu_idx, prm.delta));
    if ldlt.info() != 0 {
        sol.code = ExitCode::PolishFailed;
        return;
    }

    // Right-hand side [−q ; l over the lower-active rows ; u over the
    // upper-active rows].
    let mut rhs = vec![0.0; kp];
    for i in 0..n {
        rhs[i] = -q[i];
    }
    for j in 0..nl {
        rhs[n + j] = l[lu_idx[j]];
    }
    for j in 0..nu {
        rhs[n + nl + j] = u[lu_idx[nl + j]];
    }

    // Iterative refinement: t ← t + solve(h − H' t).
    let mut t = vec![0.0; kp];
    let mut resid = vec![0.0; kp];
    let mut step = vec![0.0; kp];
    for _ in 0..prm.polish_iter {
        h_mat.symm_mul(&t, &mut resid);
        for i in 0..kp {
            resid[i] = rhs[i] - resid[i];
        }
        ldlt.solve(&resid, &mut step);
        for i in 0..kp {
            t[i] += step[i];
        }
    }

    sol.primal.copy_from_slice(&t[..n]);
    for j in 0..nl {
        sol.dual[lu_idx[j]] = t[n + j];
    }
    for j in 0..nu {
        sol.dual[lu_idx[nl + j]] = t[n + nl + j];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::sparse::{from_triplets, from_triplets_csr};
    use crate::problem::{QuadraticProgram, QuadraticProgramSparse};
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn test_polish_recovers_exact_active_set_solution() {
        // min x² on 1 ≤ x ≤ 2: solution x = 1 with multiplier −2 on the
        // lower bound. Feed in a slightly perturbed solution and expect
        // the polish to land on the exact one.
        let pbm = QuadraticProgram {
            p: DMatrix::from_row_slice(1, 1, &[2.0]),
            q: DVector::from_vec(vec![0.0]),
            a: DMatrix::from_row_slice(1, 1, &[1.0]),
            l: DVector::from_vec(vec![1.0]),
            u: DVector::from_vec(vec![2.0]),
        };
        let prm = SolverParams::default();

        let mut sol = Solution {
            code: ExitCode::Optimal,
            primal: vec![1.01],
            dual: vec![-1.98],
        };
        polish(&pbm, &mut sol, &prm);

        assert_eq!(sol.code, ExitCode::Optimal);
        assert!((sol.primal[0] - 1.0).abs() < 1e-9, "x = {}", sol.primal[0]);
        assert!((sol.dual[0] + 2.0).abs() < 1e-9, "y = {}", sol.dual[0]);
    }

    #[test]
    fn test_polish_sparse_matches_dense() {
        let pbm = QuadraticProgramSparse {
            p: from_triplets(1, 1, vec![(0, 0, 2.0)]),
            q: vec![0.0],
            a: from_triplets_csr(1, 1, vec![(0, 0, 1.0)]),
            l: vec![1.0],
            u: vec![2.0],
        };
        let prm = SolverParams::default();

        let mut sol = Solution {
            code: ExitCode::Optimal,
            primal: vec![1.01],
            dual: vec![-1.98],
        };
        polish(&pbm, &mut sol, &prm);

        assert_eq!(sol.code, ExitCode::Optimal);
        assert!((sol.primal[0] - 1.0).abs() < 1e-9);
        assert!((sol.dual[0] + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_polish_without_active_rows_solves_unconstrained() {
        // Zero dual leaves the reduced system at P x = −q.
        let pbm = QuadraticProgram {
            p: DMatrix::from_row_slice(1, 1, &[2.0]),
            q: DVector::from_vec(vec![-4.0]),
            a: DMatrix::from_row_slice(1, 1, &[1.0]),
            l: DVector::from_vec(vec![f64::NEG_INFINITY]),
            u: DVector::from_vec(vec![f64::INFINITY]),
        };
        let prm = SolverParams::default();

        let mut sol = Solution {
            code: ExitCode::Optimal,
            primal: vec![1.9],
            dual: vec![0.0],
        };
        polish(&pbm, &mut sol, &prm);

        assert_eq!(sol.code, ExitCode::Optimal);
        assert!((sol.primal[0] - 2.0).abs() < 1e-9);
        assert_eq!(sol.dual[0], 0.0);
    }

    #[test]
    fn test_polish_failure_leaves_solution_untouched() {
        // An all-zero active row with the δ shift disabled leaves a zero
        // pivot in the trailing block of the reduced system.
        let pbm = QuadraticProgram {
            p: DMatrix::from_row_slice(1, 1, &[2.0]),
            q: DVector::from_vec(vec![0.0]),
            a: DMatrix::from_row_slice(1, 1, &[0.0]),
            l: DVector::from_vec(vec![1.0]),
            u: DVector::from_vec(vec![2.0]),
        };
        let prm = SolverParams {
            delta: 0.0,
            ..Default::default()
        };

        let mut sol = Solution {
            code: ExitCode::Optimal,
            primal: vec![1.01],
            dual: vec![-1.98],
        };
        polish(&pbm, &mut sol, &prm);

        assert_eq!(sol.code, ExitCode::PolishFailed);
        assert_eq!(sol.primal, vec![1.01]);
        assert_eq!(sol.dual, vec![-1.98]);
    }
}

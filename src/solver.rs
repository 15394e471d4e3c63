//! ADMM iteration for the operator-splitting QP solver.
//!
//! The KKT matrix is assembled and factored once; every iteration then
//! costs one triangular solve plus vector updates. The stopping criteria
//! (optimality and both infeasibility certificates) are evaluated every
//! `stop_check_iter` iterations on the iterate *before* it is committed,
//! so a converged `x, y` pair is returned exactly as it was tested.
//!
//! No scaling or preconditioning is applied to the problem data;
//! convergence on badly scaled problems can be slow.

use crate::linalg::LdltBackend;
use crate::polish::polish;
use crate::problem::{ExitCode, QpForm, Solution, SolverParams};
use crate::termination;
use crate::termination::inf_norm;

/// Solve a quadratic program by operator splitting.
///
/// `hotstart` seeds the primal and dual iterates from a previous solution
/// to the same (or a nearby) problem; it is only read during
/// initialization.
pub fn solve<P: QpForm>(pbm: &P, prm: &SolverParams, hotstart: Option<&Solution>) -> Solution {
    let n = pbm.nvars();
    let m = pbm.ncons();
    let k = n + m;
    let q = pbm.q();
    let l = pbm.l();
    let u = pbm.u();

    // The feasible set must be nonempty before any factorization work.
    for i in 0..m {
        if u[i] - l[i] < 0.0 || l[i] == f64::INFINITY || u[i] == f64::NEG_INFINITY {
            return Solution::empty(ExitCode::PrimalInfeasible);
        }
    }

    let alpha = prm.alpha;
    let rho = prm.rho;
    let sigma = prm.sigma;

    // Factor H once; the matrix itself is consumed by the factorization.
    let ldlt = P::Ldlt::factorize(pbm.admm_kkt(sigma, rho));
    if ldlt.info() != 0 {
        return Solution::empty(ExitCode::Unknown);
    }

    let mut x = vec![0.0; n];
    let mut y = vec![0.0; m];
    let mut z = vec![0.0; m];
    if let Some(start) = hotstart {
        assert_eq!(start.primal.len(), n);
        assert_eq!(start.dual.len(), m);
        x.copy_from_slice(&start.primal);
        y.copy_from_slice(&start.dual);
        pbm.a_mul(&x, &mut z);
    }

    // Per-iteration workspaces, allocated once.
    let mut h = vec![0.0; k];
    let mut p_sol = vec![0.0; k];
    let mut x_next = vec![0.0; n];
    let mut z_next = vec![0.0; m];
    let mut y_next = vec![0.0; m];
    let mut px = vec![0.0; n];
    let mut ax = vec![0.0; m];
    let mut aty = vec![0.0; n];
    let mut dx = vec![0.0; n];
    let mut dy = vec![0.0; m];
    let mut at_dy = vec![0.0; n];
    let mut p_dx = vec![0.0; n];
    let mut a_dx = vec![0.0; m];

    for iter in 0..prm.max_iter {
        // Solve H p = [σx − q ; z − y/ρ].
        for i in 0..n {
            h[i] = sigma * x[i] - q[i];
        }
        for i in 0..m {
            h[n + i] = z[i] - y[i] / rho;
        }
        ldlt.solve(&h, &mut p_sol);

        // Relaxed updates; z̃ and the interpolated z are per-element
        // scalars, the projection clips onto [l, u].
        for i in 0..n {
            x_next[i] = alpha * p_sol[i] + (1.0 - alpha) * x[i];
        }
        for i in 0..m {
            let z_tilde = z[i] + (p_sol[n + i] - y[i]) / rho;
            let z_interp = alpha * z_tilde + (1.0 - alpha) * z[i];
            z_next[i] = (z_interp + y[i] / rho).max(l[i]).min(u[i]);
            y_next[i] = y[i] + rho * (z_interp - z_next[i]);
        }

        if iter % prm.stop_check_iter == prm.stop_check_iter - 1 {
            // Optimality of the current iterate.
            pbm.p_mul(&x, &mut px);
            pbm.a_mul(&x, &mut ax);
            pbm.at_mul(&y, &mut aty);

            let primal_scale = inf_norm(&ax).max(inf_norm(&z));
            let dual_scale = inf_norm(&px).max(inf_norm(q)).max(inf_norm(&aty));

            let mut primal_res = 0.0_f64;
            for i in 0..m {
                primal_res = primal_res.max((ax[i] - z[i]).abs());
            }
            let mut dual_res = 0.0_f64;
            for i in 0..n {
                dual_res = dual_res.max((px[i] + q[i] + aty[i]).abs());
            }

            if termination::optimal(primal_res, dual_res, primal_scale, dual_scale, prm) {
                let mut sol = Solution {
                    code: ExitCode::Optimal,
                    primal: x,
                    dual: y,
                };
                if prm.polish {
                    polish(pbm, &mut sol, prm);
                }
                return sol;
            }

            // Certificates from the iterate differences.
            for i in 0..n {
                dx[i] = x_next[i] - x[i];
            }
            for i in 0..m {
                dy[i] = y_next[i] - y[i];
            }

            pbm.at_mul(&dy, &mut at_dy);
            if termination::primal_infeasible(&dy, &at_dy, l, u, prm.eps_primal_inf) {
                return Solution::empty(ExitCode::PrimalInfeasible);
            }

            pbm.p_mul(&dx, &mut p_dx);
            pbm.a_mul(&dx, &mut a_dx);
            if termination::dual_infeasible(&dx, &p_dx, &a_dx, q, l, u, prm.eps_dual_inf) {
                return Solution::empty(ExitCode::DualInfeasible);
            }
        }

        // Commit the iterate.
        std::mem::swap(&mut x, &mut x_next);
        std::mem::swap(&mut y, &mut y_next);
        std::mem::swap(&mut z, &mut z_next);
    }

    Solution {
        code: ExitCode::MaxIterations,
        primal: x,
        dual: y,
    }
}

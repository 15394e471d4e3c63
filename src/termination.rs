//! Stopping criteria: optimality test and infeasibility certificates.
//!
//! All tests use the elementwise infinity norm. The certificates are
//! built from iterate differences: a direction `dy` along which the dual
//! update keeps moving certifies primal infeasibility, and a direction
//! `dx` along which the primal update keeps moving certifies dual
//! infeasibility (an unbounded objective).

use crate::problem::SolverParams;

#[inline]
pub(crate) fn inf_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x.abs()).fold(0.0_f64, f64::max)
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(ai, bi)| ai * bi).sum()
}

/// Optimality test on the current iterate.
///
/// `primal_res = ‖Ax − z‖∞` against `eps_abs + eps_rel · max(‖Ax‖∞, ‖z‖∞)`
/// and `dual_res = ‖Px + q + Aᵀy‖∞` against the absolute tolerance plus a
/// scaled part. Note: the relative factor of the dual test is `eps_abs`,
/// not `eps_rel`.
pub fn optimal(
    primal_res: f64,
    dual_res: f64,
    primal_scale: f64,
    dual_scale: f64,
    prm: &SolverParams,
) -> bool {
    primal_res <= prm.eps_abs + prm.eps_rel * primal_scale
        && dual_res <= prm.eps_abs + prm.eps_abs * dual_scale
}

/// Primal infeasibility certificate from the dual increment `dy`.
///
/// Requires both `‖Aᵀ dy‖∞` and `Σᵢ u[i]·max(0, dy[i]) + l[i]·min(0, dy[i])`
/// to fall below `eps · ‖dy‖∞`. A row that is unbounded on the side its
/// increment points to would contribute +∞ to the sum, which destroys the
/// certificate.
pub fn primal_infeasible(dy: &[f64], at_dy: &[f64], l: &[f64], u: &[f64], eps: f64) -> bool {
    let dy_norm = inf_norm(dy);

    let mut u_dyp_plus_l_dyn = 0.0;
    for i in 0..dy.len() {
        if u[i] != f64::INFINITY {
            u_dyp_plus_l_dyn += u[i] * dy[i].max(0.0);
        } else if dy[i] > eps * dy_norm {
            u_dyp_plus_l_dyn = f64::INFINITY;
            break;
        }
        if l[i] != f64::NEG_INFINITY {
            u_dyp_plus_l_dyn += l[i] * dy[i].min(0.0);
        } else if dy[i] < -eps * dy_norm {
            u_dyp_plus_l_dyn = f64::INFINITY;
            break;
        }
    }

    inf_norm(at_dy).max(u_dyp_plus_l_dyn) < eps * dy_norm
}

/// Dual infeasibility certificate from the primal increment `dx`.
///
/// `dx` must leave the curvature term flat (`‖P dx‖∞` small), decrease the
/// linear cost (`qᵀ dx` small), and stay feasible in direction: `(A dx)[i]`
/// may only drift upward where `u[i] = +∞`, downward where `l[i] = −∞`,
/// and must vanish on two-sided rows.
pub fn dual_infeasible(
    dx: &[f64],
    p_dx: &[f64],
    a_dx: &[f64],
    q: &[f64],
    l: &[f64],
    u: &[f64],
    eps: f64,
) -> bool {
    let dx_norm = inf_norm(dx);

    if inf_norm(p_dx) > eps * dx_norm || dot(q, dx) > eps * dx_norm {
        return false;
    }

    for i in 0..a_dx.len() {
        let ok = if u[i] == f64::INFINITY {
            a_dx[i] >= -eps * dx_norm
        } else if l[i] == f64::NEG_INFINITY {
            a_dx[i] <= eps * dx_norm
        } else {
            a_dx[i].abs() < eps * dx_norm
        };
        if !ok {
            return false;
        }
    }

    true
}

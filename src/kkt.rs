//! KKT system assembly.
//!
//! Builds the symmetric saddle-point matrices that the solver factors.
//! The ADMM iteration works against
//!
//! ```text
//! H = [ P + σI      Aᵀ     ]
//!     [   A      −(1/ρ) I  ]
//! ```
//!
//! of dimension n + m, and the polisher against the reduced system
//!
//! ```text
//! H' = [ P    A_Lᵀ  A_Uᵀ ]
//!      [ A_L   0     0   ]
//!      [ A_U   0     0   ]
//! ```
//!
//! of dimension n + nl + nu, where A_L and A_U select the rows of A whose
//! constraints are active at the lower and upper bound. Only the upper
//! triangle is populated; the matrices are handed whole to the LDLᵀ
//! backends.

use nalgebra::DMatrix;

use crate::linalg::sparse::{from_triplets, SparseCsc, SparseCsr};

/// Assemble the dense ADMM KKT matrix.
pub fn admm_kkt_dense(p: &DMatrix<f64>, a: &DMatrix<f64>, sigma: f64, rho: f64) -> DMatrix<f64> {
    let n = p.ncols();
    let m = a.nrows();
    assert_eq!(p.nrows(), n);
    assert_eq!(a.ncols(), n);

    let k = n + m;
    let mut h = DMatrix::zeros(k, k);

    h.view_mut((0, 0), (n, n)).copy_from(p);
    for i in 0..n {
        h[(i, i)] += sigma;
    }
    for row in 0..m {
        for col in 0..n {
            h[(col, n + row)] = a[(row, col)];
        }
        h[(n + row, n + row)] = -1.0 / rho;
    }

    h
}

/// Assemble the sparse ADMM KKT matrix (upper triangle, CSC).
///
/// Nonzeros are reserved per column: the upper triangle of each P column
/// plus one for the σ regularization, and each row of A plus one for the
/// −1/ρ diagonal in its column block of Aᵀ.
pub fn admm_kkt_sparse(p: &SparseCsc, a: &SparseCsr, sigma: f64, rho: f64) -> SparseCsc {
    let n = p.cols();
    let m = a.rows();
    assert_eq!(p.rows(), n);
    assert_eq!(a.cols(), n);
    assert!(p.is_csc());
    assert!(a.is_csr());

    let k = n + m;
    let mut triplets = Vec::with_capacity(p.nnz() + n + a.nnz() + m);

    for (col, col_vec) in p.outer_iterator().enumerate() {
        for (row, &val) in col_vec.iter() {
            if row <= col {
                triplets.push((row, col, val));
            }
        }
        triplets.push((col, col, sigma));
    }

    for (row, row_vec) in a.outer_iterator().enumerate() {
        for (col, &val) in row_vec.iter() {
            triplets.push((col, n + row, val));
        }
        triplets.push((n + row, n + row, -1.0 / rho));
    }

    from_triplets(k, k, triplets)
}

/// Assemble the dense reduced polish matrix.
///
/// With `delta == 0` the matrix is the unperturbed H'; with `delta > 0`
/// the diagonal carries the +δ / −δ regularization split between the
/// primal and active-constraint blocks.
pub fn polish_kkt_dense(
    p: &DMatrix<f64>,
    a: &DMatrix<f64>,
    lu_idx: &[usize],
    delta: f64,
) -> DMatrix<f64> {
    let n = p.ncols();
    let na = lu_idx.len();
    assert_eq!(a.ncols(), n);

    let k = n + na;
    let mut h = DMatrix::zeros(k, k);

    h.view_mut((0, 0), (n, n)).copy_from(p);
    for (j, &row) in lu_idx.iter().enumerate() {
        for col in 0..n {
            h[(col, n + j)] = a[(row, col)];
        }
    }

    if delta != 0.0 {
        for i in 0..n {
            h[(i, i)] += delta;
        }
        for j in 0..na {
            h[(n + j, n + j)] = -delta;
        }
    }

    h
}

/// Assemble the sparse reduced polish matrix (upper triangle, CSC).
///
/// Mirrors the reservation scheme of [`admm_kkt_sparse`], selecting rows
/// of A by the active-set index vector.
pub fn polish_kkt_sparse(
    p: &SparseCsc,
    a: &SparseCsr,
    lu_idx: &[usize],
    delta: f64,
) -> SparseCsc {
    let n = p.cols();
    let na = lu_idx.len();
    assert_eq!(a.cols(), n);
    assert!(p.is_csc());
    assert!(a.is_csr());

    let k = n + na;
    let mut cap = p.nnz() + k;
    for &row in lu_idx {
        cap += a.outer_view(row).map_or(0, |v| v.nnz());
    }
    let mut triplets = Vec::with_capacity(cap);

    for (col, col_vec) in p.outer_iterator().enumerate() {
        for (row, &val) in col_vec.iter() {
            if row <= col {
                triplets.push((row, col, val));
            }
        }
        if delta != 0.0 {
            triplets.push((col, col, delta));
        }
    }

    for (j, &row) in lu_idx.iter().enumerate() {
        if let Some(row_vec) = a.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                triplets.push((col, n + j, val));
            }
        }
        if delta != 0.0 {
            triplets.push((n + j, n + j, -delta));
        }
    }

    from_triplets(k, k, triplets)
}

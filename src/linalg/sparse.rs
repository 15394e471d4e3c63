//! Sparse matrix types and operations.
//!
//! The solver stores the cost matrix P in CSC format (upper triangle only)
//! and the constraint matrix A in CSR format, so that the coefficients of
//! each constraint row are contiguous for row-wise KKT assembly.

use sprs::{CsMat, TriMat};

use super::SymmetricUpper;

/// Sparse matrix in CSC format.
pub type SparseCsc = CsMat<f64>;

/// Sparse matrix in CSR format.
pub type SparseCsr = CsMat<f64>;

/// Build a CSC matrix from (row, col, value) triplets.
///
/// Duplicate entries are summed, which the KKT builders rely on when
/// layering regularization onto existing diagonal entries.
pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I) -> SparseCsc
where
    I: IntoIterator<Item = (usize, usize, f64)>,
{
    let mut tri = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    tri.to_csc()
}

/// Build a CSR matrix from (row, col, value) triplets.
pub fn from_triplets_csr<I>(nrows: usize, ncols: usize, triplets: I) -> SparseCsr
where
    I: IntoIterator<Item = (usize, usize, f64)>,
{
    let mut tri = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    tri.to_csr()
}

/// y = A x for a row-major matrix.
pub fn csr_mul(a: &SparseCsr, x: &[f64], y: &mut [f64]) {
    assert!(a.is_csr());
    assert_eq!(a.cols(), x.len());
    assert_eq!(a.rows(), y.len());

    for (row, row_vec) in a.outer_iterator().enumerate() {
        let mut acc = 0.0;
        for (col, &val) in row_vec.iter() {
            acc += val * x[col];
        }
        y[row] = acc;
    }
}

/// y = Aᵀ x for a row-major matrix.
pub fn csr_trans_mul(a: &SparseCsr, x: &[f64], y: &mut [f64]) {
    assert!(a.is_csr());
    assert_eq!(a.rows(), x.len());
    assert_eq!(a.cols(), y.len());

    y.fill(0.0);
    for (row, row_vec) in a.outer_iterator().enumerate() {
        let xi = x[row];
        for (col, &val) in row_vec.iter() {
            y[col] += val * xi;
        }
    }
}

/// y = M x where M is symmetric with only the upper triangle stored.
///
/// Entries below the diagonal are ignored if present.
pub fn symm_mul_upper(m: &SparseCsc, x: &[f64], y: &mut [f64]) {
    assert_eq!(m.cols(), x.len());
    assert_eq!(m.rows(), y.len());

    y.fill(0.0);
    for (val, (row, col)) in m.iter() {
        if row > col {
            continue;
        }
        y[row] += *val * x[col];
        if row != col {
            y[col] += *val * x[row];
        }
    }
}

impl SymmetricUpper for SparseCsc {
    fn dim(&self) -> usize {
        self.cols()
    }

    fn symm_mul(&self, x: &[f64], y: &mut [f64]) {
        symm_mul_upper(self, x, y);
    }
}

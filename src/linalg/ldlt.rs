//! Sparse LDLᵀ factorization backend.
//!
//! Wraps the `ldl` crate, a QDLDL-style factorization for quasi-definite
//! matrices: L is unit lower triangular, D is diagonal with entries of
//! either sign. The elimination tree and numeric factorization run once at
//! construction; solves reuse the factors.
//!
//! The input must be the upper triangle of a square symmetric matrix in
//! CSC format with every diagonal entry present (the KKT builders
//! guarantee this through their regularization terms).

use super::sparse::SparseCsc;
use super::LdltBackend;

/// Sparse LDLᵀ factorization of a quasi-definite matrix.
pub struct LdltSparse {
    n: usize,
    info: usize,

    /// L in CSC format (column pointers, row indices, values).
    l_p: Vec<usize>,
    l_i: Vec<usize>,
    l_x: Vec<f64>,

    /// Inverse of the diagonal D, for the middle solve step.
    d_inv: Vec<f64>,
}

impl LdltSparse {
    fn failed(n: usize) -> Self {
        Self {
            n,
            info: 1,
            l_p: Vec::new(),
            l_i: Vec::new(),
            l_x: Vec::new(),
            d_inv: Vec::new(),
        }
    }
}

impl LdltBackend for LdltSparse {
    type Matrix = SparseCsc;

    fn factorize(mat: SparseCsc) -> Self {
        let n = mat.cols();
        assert_eq!(mat.rows(), n);
        assert!(mat.is_csc());

        // Keep indptr alive while the raw CSC arrays are borrowed.
        let indptr = mat.indptr();
        let a_p = indptr.raw_storage();
        let a_i = mat.indices();
        let a_x = mat.data();

        // Elimination tree and per-column counts of L.
        let mut work = vec![0usize; n];
        let mut l_nz = vec![0usize; n];
        let mut etree = vec![None; n];

        if ldl::etree(n, a_p, a_i, &mut work, &mut l_nz, &mut etree).is_err() {
            return Self::failed(n);
        }

        // Fill-in can make L larger than the input pattern.
        let nnz_l: usize = l_nz.iter().sum();
        let mut l_p = vec![0usize; n + 1];
        let mut l_i = vec![0usize; nnz_l];
        let mut l_x = vec![0.0; nnz_l];
        let mut d = vec![0.0; n];
        let mut d_inv = vec![0.0; n];

        let mut bwork = vec![ldl::Marker::Unused; n];
        let mut iwork = vec![0usize; 3 * n];
        let mut fwork = vec![0.0; n];

        let result = ldl::factor(
            n,
            a_p,
            a_i,
            a_x,
            &mut l_p,
            &mut l_i,
            &mut l_x,
            &mut d,
            &mut d_inv,
            &l_nz,
            &etree,
            &mut bwork,
            &mut iwork,
            &mut fwork,
        );

        match result {
            Ok(_) => Self {
                n,
                info: 0,
                l_p,
                l_i,
                l_x,
                d_inv,
            },
            Err(_) => Self::failed(n),
        }
    }

    fn info(&self) -> usize {
        self.info
    }

    fn solve(&self, rhs: &[f64], sol: &mut [f64]) {
        assert_eq!(rhs.len(), self.n);
        assert_eq!(sol.len(), self.n);

        sol.copy_from_slice(rhs);
        ldl::solve(self.n, &self.l_p, &self.l_i, &self.l_x, &self.d_inv, sol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::sparse;

    #[test]
    fn test_positive_definite() {
        // [[2, 1], [1, 2]] x = [3, 3] has solution [1, 1]
        let mat = sparse::from_triplets(2, 2, vec![(0, 0, 2.0), (0, 1, 1.0), (1, 1, 2.0)]);

        let ldlt = LdltSparse::factorize(mat);
        assert_eq!(ldlt.info(), 0);

        let b = vec![3.0, 3.0];
        let mut x = vec![0.0; 2];
        ldlt.solve(&b, &mut x);

        assert!((x[0] - 1.0).abs() < 1e-10, "x[0] = {}", x[0]);
        assert!((x[1] - 1.0).abs() < 1e-10, "x[1] = {}", x[1]);
    }

    #[test]
    fn test_quasi_definite() {
        // KKT-like system with positive and negative diagonal blocks:
        // [[1, 0, 1, 0],
        //  [0, 1, 0, 1],
        //  [1, 0, -1, 0],
        //  [0, 1, 0, -1]]
        let mat = sparse::from_triplets(
            4,
            4,
            vec![
                (0, 0, 1.0),
                (0, 2, 1.0),
                (1, 1, 1.0),
                (1, 3, 1.0),
                (2, 2, -1.0),
                (3, 3, -1.0),
            ],
        );

        let ldlt = LdltSparse::factorize(mat);
        assert_eq!(ldlt.info(), 0);

        // Verify by residual against the full symmetric matrix.
        let b = vec![1.0, 2.0, 0.0, -1.0];
        let mut x = vec![0.0; 4];
        ldlt.solve(&b, &mut x);

        let full = [
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
            [1.0, 0.0, -1.0, 0.0],
            [0.0, 1.0, 0.0, -1.0],
        ];
        for i in 0..4 {
            let mut ax = 0.0;
            for j in 0..4 {
                ax += full[i][j] * x[j];
            }
            assert!((ax - b[i]).abs() < 1e-10, "residual at row {}", i);
        }
    }

    #[test]
    fn test_singular_reports_info() {
        // Second pivot is exactly zero.
        let mat = sparse::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 0.0)]);

        let ldlt = LdltSparse::factorize(mat);
        assert!(ldlt.info() > 0);
    }
}

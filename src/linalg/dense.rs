//! Dense symmetric-indefinite LDLᵀ backend.
//!
//! Factors the upper triangle of an owned column-major matrix in place and
//! keeps the factors for repeated solves, mirroring the factor-once /
//! solve-many usage of LAPACK's xSYSVX family. The factorization is
//! unpivoted: the saddle-point matrices handed to this backend are
//! quasi-definite, so every pivot is nonzero away from exact singularity.

use nalgebra::DMatrix;

use super::{LdltBackend, SymmetricUpper};

/// Dense LDLᵀ factorization of a symmetric matrix.
///
/// After construction the strict lower triangle of the stored matrix holds
/// the unit-triangular factor L and the diagonal holds D; the upper
/// triangle retains the input and is never referenced by `solve`.
pub struct LdltDense {
    n: usize,
    lf: DMatrix<f64>,
    info: usize,
}

impl LdltBackend for LdltDense {
    type Matrix = DMatrix<f64>;

    fn factorize(mat: DMatrix<f64>) -> Self {
        let n = mat.ncols();
        assert_eq!(mat.nrows(), n);

        let mut lf = mat;
        let mut info = 0;

        for j in 0..n {
            // d_j = a_jj − Σ_k l_jk² d_k
            let mut d = lf[(j, j)];
            for k in 0..j {
                let ljk = lf[(j, k)];
                d -= ljk * ljk * lf[(k, k)];
            }
            lf[(j, j)] = d;

            if d == 0.0 {
                // LAPACK convention: positive info is the 1-based index of
                // the zero diagonal entry of D.
                info = j + 1;
                break;
            }

            for i in (j + 1)..n {
                // a_ij read from the upper triangle at (j, i)
                let mut v = lf[(j, i)];
                for k in 0..j {
                    v -= lf[(i, k)] * lf[(j, k)] * lf[(k, k)];
                }
                lf[(i, j)] = v / d;
            }
        }

        Self { n, lf, info }
    }

    fn info(&self) -> usize {
        self.info
    }

    fn solve(&self, rhs: &[f64], sol: &mut [f64]) {
        let n = self.n;
        assert_eq!(rhs.len(), n);
        assert_eq!(sol.len(), n);

        sol.copy_from_slice(rhs);

        // L z = b
        for i in 0..n {
            let mut s = sol[i];
            for k in 0..i {
                s -= self.lf[(i, k)] * sol[k];
            }
            sol[i] = s;
        }
        // D w = z
        for i in 0..n {
            sol[i] /= self.lf[(i, i)];
        }
        // Lᵀ x = w
        for i in (0..n).rev() {
            let mut s = sol[i];
            for k in (i + 1)..n {
                s -= self.lf[(k, i)] * sol[k];
            }
            sol[i] = s;
        }
    }
}

impl SymmetricUpper for DMatrix<f64> {
    fn dim(&self) -> usize {
        self.ncols()
    }

    fn symm_mul(&self, x: &[f64], y: &mut [f64]) {
        let n = self.ncols();
        assert_eq!(x.len(), n);
        assert_eq!(y.len(), n);

        y.fill(0.0);
        for j in 0..n {
            for i in 0..=j {
                let v = self[(i, j)];
                y[i] += v * x[j];
                if i != j {
                    y[j] += v * x[i];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_definite() {
        let mat = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);

        let ldlt = LdltDense::factorize(mat);
        assert_eq!(ldlt.info(), 0);

        let b = vec![3.0, 3.0];
        let mut x = vec![0.0; 2];
        ldlt.solve(&b, &mut x);

        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_indefinite_saddle_point() {
        // [[1, 0, 1], [0, 1, 1], [1, 1, -1]]: one negative eigenvalue
        let mat =
            DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, -1.0]);
        let full = mat.clone();

        let ldlt = LdltDense::factorize(mat);
        assert_eq!(ldlt.info(), 0);

        let b = vec![1.0, 2.0, 1.0];
        let mut x = vec![0.0; 3];
        ldlt.solve(&b, &mut x);

        for i in 0..3 {
            let mut ax = 0.0;
            for j in 0..3 {
                ax += full[(i, j)] * x[j];
            }
            assert!((ax - b[i]).abs() < 1e-12, "residual at row {}", i);
        }
    }

    #[test]
    fn test_only_upper_triangle_is_read() {
        // Garbage below the diagonal must not affect the factors.
        let clean = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let dirty = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 99.0, 3.0]);

        let f_clean = LdltDense::factorize(clean);
        let f_dirty = LdltDense::factorize(dirty);
        assert_eq!(f_clean.info(), 0);
        assert_eq!(f_dirty.info(), 0);

        let b = vec![1.0, -2.0];
        let mut x_clean = vec![0.0; 2];
        let mut x_dirty = vec![0.0; 2];
        f_clean.solve(&b, &mut x_clean);
        f_dirty.solve(&b, &mut x_dirty);

        assert_eq!(x_clean, x_dirty);
    }

    #[test]
    fn test_singular_reports_index() {
        // [[1, 1], [1, 1]] is rank one: the second pivot vanishes.
        let mat = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);

        let ldlt = LdltDense::factorize(mat);
        assert_eq!(ldlt.info(), 2);
    }

    #[test]
    fn test_symm_mul_upper_view() {
        // Lower triangle deliberately inconsistent; only the upper counts.
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, -7.0, 3.0]);

        let mut y = vec![0.0; 2];
        m.symm_mul(&[1.0, 2.0], &mut y);

        assert!((y[0] - 4.0).abs() < 1e-12);
        assert!((y[1] - 7.0).abs() < 1e-12);
    }
}

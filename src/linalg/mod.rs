//! Linear algebra layer.
//!
//! Sparse matrix helpers and the two LDLᵀ factorization backends, driven
//! through a common factorize-then-solve facade.

pub mod dense;
pub mod ldlt;
pub mod sparse;

pub use dense::LdltDense;
pub use ldlt::LdltSparse;

/// Symmetric matrix whose upper triangle is the stored representation.
///
/// Both KKT flavors implement this; the polisher relies on `symm_mul` for
/// its refinement residuals.
pub trait SymmetricUpper {
    /// Matrix dimension (matrices here are square).
    fn dim(&self) -> usize;

    /// y = M x using the symmetric (upper-view) product.
    fn symm_mul(&self, x: &[f64], y: &mut [f64]);
}

/// Factorize-then-solve facade over the LDLᵀ backends.
///
/// The factorization consumes the matrix: once factored, callers only ever
/// need the factors, never the assembled system again.
pub trait LdltBackend: Sized {
    type Matrix: SymmetricUpper;

    /// Factor a square symmetric matrix given by its upper triangle.
    fn factorize(mat: Self::Matrix) -> Self;

    /// Factorization status: 0 on success, positive if the matrix is
    /// singular.
    fn info(&self) -> usize;

    /// Solve M x = b against the stored factors.
    ///
    /// The result is undefined unless `info() == 0`.
    fn solve(&self, rhs: &[f64], sol: &mut [f64]);
}

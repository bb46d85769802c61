// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.

#[cfg(test)]
mod tests;

use nalgebra::DMatrix;
use ndarray::prelude::*;
use num_traits::Zero;

use crate::c64;

/// The number of cross-correlation baselines formed by `num_ants` antennas.
#[inline]
pub(crate) fn num_cross_baselines(num_ants: usize) -> usize {
    num_ants * num_ants.saturating_sub(1) / 2
}

/// Invert a complex square matrix. `None` is returned if the matrix is
/// singular or if the inverse contains anything that isn't finite.
pub(crate) fn invert(matrix: ArrayView2<c64>) -> Option<Array2<c64>> {
    let (n, m) = matrix.dim();
    debug_assert_eq!(n, m);
    let na = DMatrix::from_fn(n, n, |i, j| matrix[(i, j)]);
    let inv = na.try_inverse()?;
    if inv.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Array2::from_shape_fn((n, n), |(i, j)| inv[(i, j)]))
}

/// Is everything off the diagonal exactly zero?
pub(crate) fn is_diagonal(matrix: ArrayView2<c64>) -> bool {
    matrix
        .indexed_iter()
        .all(|((i, j), v)| i == j || v.is_zero())
}

/// The real parts of a square matrix's diagonal.
pub(crate) fn real_diagonal(matrix: ArrayView2<c64>) -> Array1<f64> {
    matrix.diag().mapv(|v| v.re)
}

/// Build a complex diagonal matrix from real values.
pub(crate) fn diagonal_matrix(diag: ArrayView1<f64>) -> Array2<c64> {
    let mut out = Array2::zeros((diag.len(), diag.len()));
    out.diag_mut()
        .iter_mut()
        .zip(diag.iter())
        .for_each(|(o, &d)| *o = c64::new(d, 0.0));
    out
}

/// Conjugate transpose.
pub(crate) fn hermitian(matrix: ArrayView2<c64>) -> Array2<c64> {
    matrix.t().mapv(|v| v.conj())
}

/// Find the first value that is negative or not finite.
pub(crate) fn first_invalid_variance(diag: ArrayView1<f64>) -> Option<(usize, f64)> {
    diag.iter()
        .copied()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
}

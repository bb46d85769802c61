// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Jacobian of the measurement equation `V_pq = g_p M_pq conj(g_q)` with
//! respect to the conjugate-augmented gain state.
//!
//! Rows are laid out per channel: the `n_bl` "direct" rows of a channel are
//! followed by its `n_bl` "conjugate" rows. Columns use the state vector
//! ordering of [`crate::gains`]. With `N = n_ant * n_chan * n_dir`,
//! `r1 = 2 * n_bl * nu + row`, `r2 = r1 + n_bl`, `w = sqrt(weight)` and
//! `c(a)` the state index of antenna `a` at `(nu, s)`:
//!
//! ```text
//! J[r1, c(p)]     = w * M       * conj(g0[q]) / 2
//! J[r2, c(q)]     = w * conj(M) * conj(g0[p]) / 2
//! J[r1, N + c(q)] = w * M       * conj(g1[p]) / 2
//! J[r2, N + c(p)] = w * conj(M) * conj(g1[q]) / 2
//! ```
//!
//! Three constructions are available and they all agree exactly: triplet
//! ([`JacobianInputs::build_coo`]), compressed-row
//! ([`JacobianInputs::build_csr`]) and dense ([`JacobianInputs::build_dense`]).

mod error;
mod sparse;
#[cfg(test)]
mod tests;

pub use error::JacobianError;
pub use sparse::{CooMatrix, CsrMatrix};

use log::trace;
use ndarray::{linalg::Dot, prelude::*};
use rayon::prelude::*;

use crate::{
    c64,
    gains::GainShape,
    inputs::VisibilityStep,
    math::{hermitian, num_cross_baselines},
};

/// Everything needed to linearise one time step.
#[derive(Debug, Clone)]
pub struct JacobianInputs<'a> {
    /// Model visibilities with dimensions (row, channel, direction).
    model: ArrayView3<'a, c64>,

    /// Weights with dimensions (row, channel).
    weight: ArrayView2<'a, f64>,

    /// The augmented gains at which the measurement equation is linearised,
    /// with dimensions (antenna, channel, direction, 2).
    gains: ArrayView4<'a, c64>,

    antenna1: &'a [usize],
    antenna2: &'a [usize],

    shape: GainShape,
}

impl<'a> JacobianInputs<'a> {
    /// Check that all the arrays are consistent with the gains' shape. There
    /// must be exactly one row per cross-correlation baseline.
    pub fn new(
        model: ArrayView3<'a, c64>,
        weight: ArrayView2<'a, f64>,
        gains: ArrayView4<'a, c64>,
        antenna1: &'a [usize],
        antenna2: &'a [usize],
    ) -> Result<JacobianInputs<'a>, JacobianError> {
        let (n_ant, n_chan, n_dir, n_aug) = gains.dim();
        if n_aug != 2 || n_ant < 2 || n_chan == 0 || n_dir == 0 {
            return Err(JacobianError::DimensionMismatch {
                array: "jones",
                expected: "(>=2, >=1, >=1, 2)".to_string(),
                got: format!("{:?}", gains.dim()),
            });
        }
        let n_bl = num_cross_baselines(n_ant);
        if model.dim() != (n_bl, n_chan, n_dir) {
            return Err(JacobianError::DimensionMismatch {
                array: "model",
                expected: format!("({n_bl}, {n_chan}, {n_dir})"),
                got: format!("{:?}", model.dim()),
            });
        }
        if weight.dim() != (n_bl, n_chan) {
            return Err(JacobianError::DimensionMismatch {
                array: "weight",
                expected: format!("({n_bl}, {n_chan})"),
                got: format!("{:?}", weight.dim()),
            });
        }
        for (name, ants) in [("antenna1", antenna1), ("antenna2", antenna2)] {
            if ants.len() != n_bl {
                return Err(JacobianError::DimensionMismatch {
                    array: name,
                    expected: format!("({n_bl},)"),
                    got: format!("({},)", ants.len()),
                });
            }
        }
        for (row, (&p, &q)) in antenna1.iter().zip(antenna2.iter()).enumerate() {
            if p >= n_ant || q >= n_ant {
                return Err(JacobianError::AntennaIndex {
                    row,
                    ant: p.max(q),
                    n_ant,
                });
            }
            if p == q {
                return Err(JacobianError::Autocorrelation { row, ant: p });
            }
        }

        Ok(JacobianInputs {
            model,
            weight,
            gains,
            antenna1,
            antenna2,
            shape: GainShape::new(n_ant, n_chan, n_dir),
        })
    }

    /// Linearise the rows of one time step at `gains`.
    pub fn from_step(
        step: &VisibilityStep<'a>,
        gains: ArrayView4<'a, c64>,
    ) -> Result<JacobianInputs<'a>, JacobianError> {
        JacobianInputs::new(
            step.model.clone(),
            step.weight.clone(),
            gains,
            step.antenna1,
            step.antenna2,
        )
    }

    pub fn shape(&self) -> GainShape {
        self.shape
    }

    /// The number of rows in the time step (one per baseline).
    fn num_rows(&self) -> usize {
        self.antenna1.len()
    }

    /// The dimensions of the Jacobian:
    /// `(n_chan * n_ant * (n_ant - 1), 2 * n_ant * n_chan * n_dir)`.
    pub fn dim(&self) -> (usize, usize) {
        (2 * self.shape.n_chan * self.num_rows(), self.shape.state_len())
    }

    /// The number of entries each construction stores:
    /// `2 * n_chan * n_dir * n_ant * (n_ant - 1)`.
    pub fn num_entries(&self) -> usize {
        4 * self.shape.n_chan * self.shape.n_dir * self.num_rows()
    }

    /// The two entries one `(row, nu, s)` contributes to a half Jacobian.
    /// Slot 0 of the half built with `(p, q)` holds the left half of the
    /// Jacobian; slot 1 with `(q, p)` the right half.
    #[inline]
    fn half_entries(
        &self,
        slot: usize,
        ant_a: usize,
        ant_b: usize,
        row: usize,
        nu: usize,
        s: usize,
    ) -> [(usize, usize, c64); 2] {
        let n_row = self.num_rows();
        let sqrt_w = self.weight[(row, nu)].sqrt();
        let m = self.model[(row, nu, s)];
        let r1 = 2 * n_row * nu + row;
        [
            (
                r1,
                self.shape.state_index(ant_a, nu, s),
                sqrt_w * m * self.gains[(ant_b, nu, s, slot)].conj(),
            ),
            (
                r1 + n_row,
                self.shape.state_index(ant_b, nu, s),
                sqrt_w * m.conj() * self.gains[(ant_a, nu, s, slot)].conj(),
            ),
        ]
    }

    /// One half of the (unscaled) Jacobian, `n_rows x N`. Each `(row, nu, s)`
    /// contributes two entries.
    fn jacobian_half(&self, slot: usize, ant_a: &[usize], ant_b: &[usize]) -> CooMatrix {
        let (n_rows, n_cols) = self.dim();
        let n_chan = self.shape.n_chan;
        let n_dir = self.shape.n_dir;
        let num_entries = 2 * n_chan * n_dir * self.num_rows();

        let mut rows = vec![0; num_entries];
        let mut cols = vec![0; num_entries];
        let mut values = vec![c64::default(); num_entries];
        rows.par_chunks_mut(2)
            .zip(cols.par_chunks_mut(2))
            .zip(values.par_chunks_mut(2))
            .enumerate()
            .for_each(|(term, ((rows, cols), values))| {
                let s = term % n_dir;
                let nu = (term / n_dir) % n_chan;
                let row = term / (n_dir * n_chan);
                let entries = self.half_entries(slot, ant_a[row], ant_b[row], row, nu, s);
                for (i, (r, c, v)) in entries.into_iter().enumerate() {
                    rows[i] = r;
                    cols[i] = c;
                    values[i] = v;
                }
            });

        CooMatrix::from_triplets((n_rows, n_cols / 2), rows, cols, values)
    }

    /// Build the Jacobian in triplet form: the left and right halves are
    /// built independently, stacked and halved.
    pub fn build_coo(&self) -> CooMatrix {
        trace!("Building a {:?} COO Jacobian", self.dim());
        let left = self.jacobian_half(0, self.antenna1, self.antenna2);
        let right = self.jacobian_half(1, self.antenna2, self.antenna1);
        left.hstack(right).scale(0.5)
    }

    /// Write the `2 * n_dir` entries of Jacobian row `r` in column order:
    /// the left half (one per direction), then the right half.
    #[inline]
    fn fill_row(&self, r: usize, cols: &mut [usize], values: &mut [c64]) {
        let n_row = self.num_rows();
        let n_dir = self.shape.n_dir;
        let half = self.shape.half_len();
        let nu = r / (2 * n_row);
        let conjugate = r % (2 * n_row) >= n_row;
        let row = r % n_row;
        let (p, q) = (self.antenna1[row], self.antenna2[row]);
        let sqrt_w = self.weight[(row, nu)].sqrt();

        for s in 0..n_dir {
            let m = self.model[(row, nu, s)];
            let (left_ant, right_ant, m, g0_ant, g1_ant) = if conjugate {
                (q, p, m.conj(), p, q)
            } else {
                (p, q, m, q, p)
            };
            cols[s] = self.shape.state_index(left_ant, nu, s);
            values[s] = 0.5 * sqrt_w * m * self.gains[(g0_ant, nu, s, 0)].conj();
            cols[n_dir + s] = half + self.shape.state_index(right_ant, nu, s);
            values[n_dir + s] = 0.5 * sqrt_w * m * self.gains[(g1_ant, nu, s, 1)].conj();
        }
    }

    /// Build the Jacobian directly in compressed-row form. Every row has
    /// exactly `2 * n_dir` entries.
    pub fn build_csr(&self) -> CsrMatrix {
        trace!("Building a {:?} CSR Jacobian", self.dim());
        let (n_rows, _) = self.dim();
        let row_len = 2 * self.shape.n_dir;
        let row_offsets = (0..=n_rows).map(|i| i * row_len).collect();
        let mut col_indices = vec![0; n_rows * row_len];
        let mut values = vec![c64::default(); n_rows * row_len];
        col_indices
            .par_chunks_mut(row_len)
            .zip(values.par_chunks_mut(row_len))
            .enumerate()
            .for_each(|(r, (cols, values))| self.fill_row(r, cols, values));

        CsrMatrix::from_raw_parts(self.dim(), row_offsets, col_indices, values)
    }

    /// Build the Jacobian as a dense matrix.
    pub fn build_dense(&self) -> Array2<c64> {
        trace!("Building a {:?} dense Jacobian", self.dim());
        let row_len = 2 * self.shape.n_dir;
        let mut dense = Array2::zeros(self.dim());
        dense
            .outer_iter_mut()
            .into_par_iter()
            .enumerate()
            .for_each(|(r, mut dense_row)| {
                let mut cols = vec![0; row_len];
                let mut values = vec![c64::default(); row_len];
                self.fill_row(r, &mut cols, &mut values);
                for (c, v) in cols.into_iter().zip(values) {
                    dense_row[c] = v;
                }
            });
        dense
    }
}

/// The linear algebra the Kalman filter needs from a Jacobian, whatever its
/// storage.
pub trait JacobianOperator: Sync {
    /// (rows, columns)
    fn dim(&self) -> (usize, usize);

    /// `J x`
    fn dot(&self, x: ArrayView1<c64>) -> Array1<c64>;

    /// `J^H v`
    fn adjoint_dot(&self, v: ArrayView1<c64>) -> Array1<c64>;

    /// `J^H diag(r) J`, where `r` has one real value per row.
    fn weighted_gram(&self, r: ArrayView1<f64>) -> Array2<c64>;

    /// The (real) diagonal of `J^H J`.
    fn gram_diagonal(&self) -> Array1<f64>;
}

impl JacobianOperator for CsrMatrix {
    fn dim(&self) -> (usize, usize) {
        self.shape()
    }

    fn dot(&self, x: ArrayView1<c64>) -> Array1<c64> {
        debug_assert_eq!(x.len(), self.shape().1);
        let out: Vec<c64> = (0..self.shape().0)
            .into_par_iter()
            .map(|i| {
                let (cols, values) = self.row(i);
                cols.iter().zip(values).map(|(&c, &v)| v * x[c]).sum()
            })
            .collect();
        Array1::from(out)
    }

    fn adjoint_dot(&self, v: ArrayView1<c64>) -> Array1<c64> {
        debug_assert_eq!(v.len(), self.shape().0);
        let mut out = Array1::zeros(self.shape().1);
        for (i, &v_i) in v.iter().enumerate() {
            let (cols, values) = self.row(i);
            for (&c, &j) in cols.iter().zip(values) {
                out[c] += j.conj() * v_i;
            }
        }
        out
    }

    fn weighted_gram(&self, r: ArrayView1<f64>) -> Array2<c64> {
        let (n_rows, n_cols) = self.shape();
        debug_assert_eq!(r.len(), n_rows);
        (0..n_rows)
            .into_par_iter()
            .fold(
                || Array2::zeros((n_cols, n_cols)),
                |mut gram: Array2<c64>, i| {
                    let (cols, values) = self.row(i);
                    for (&a, &va) in cols.iter().zip(values) {
                        let va = va.conj() * r[i];
                        for (&b, &vb) in cols.iter().zip(values) {
                            gram[(a, b)] += va * vb;
                        }
                    }
                    gram
                },
            )
            .reduce(|| Array2::zeros((n_cols, n_cols)), |a, b| a + b)
    }

    fn gram_diagonal(&self) -> Array1<f64> {
        let mut diag = Array1::zeros(self.shape().1);
        for (&c, v) in self.col_indices().iter().zip(self.values()) {
            diag[c] += v.norm_sqr();
        }
        diag
    }
}

impl JacobianOperator for Array2<c64> {
    fn dim(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn dot(&self, x: ArrayView1<c64>) -> Array1<c64> {
        Dot::dot(self, &x)
    }

    fn adjoint_dot(&self, v: ArrayView1<c64>) -> Array1<c64> {
        hermitian(self.view()).dot(&v)
    }

    fn weighted_gram(&self, r: ArrayView1<f64>) -> Array2<c64> {
        debug_assert_eq!(r.len(), self.nrows());
        let weighted =
            Array2::from_shape_fn((self.nrows(), self.ncols()), |(i, j)| self[(i, j)] * r[i]);
        hermitian(self.view()).dot(&weighted)
    }

    fn gram_diagonal(&self) -> Array1<f64> {
        self.mapv(|j| j.norm_sqr()).sum_axis(Axis(0))
    }
}

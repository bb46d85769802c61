// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The three ways of applying a measurement update.

use log::trace;
use ndarray::{prelude::*, Zip};

use crate::{
    c64,
    jacobian::{JacobianInputs, JacobianOperator},
    math::{diagonal_matrix, invert, real_diagonal},
    trajectory::MatrixTrajectory,
};

/// A required inverse wasn't finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Singular;

/// The result of one measurement update.
pub(super) struct Posterior {
    pub(super) mean: Array1<c64>,
    pub(super) variances: Array1<f64>,
    /// The 2-norm of the innovation `y - J m`.
    pub(super) innovation_norm: f64,
}

/// How a strategy holds one covariance matrix.
pub(super) trait Covariance: Sized {
    fn from_prior(prior: ArrayView2<c64>) -> Self;

    /// Posteriors only ever carry variances.
    fn from_variances(variances: Array1<f64>) -> Self;

    /// `P + diag(q)`
    fn add_diagonal(&self, q: ArrayView1<f64>) -> Self;

    fn empty_trajectory(num_timesteps: usize, state_len: usize) -> MatrixTrajectory;

    fn write_to(&self, trajectory: &mut MatrixTrajectory, timestep: usize);
}

impl Covariance for Array2<c64> {
    fn from_prior(prior: ArrayView2<c64>) -> Self {
        prior.to_owned()
    }

    fn from_variances(variances: Array1<f64>) -> Self {
        diagonal_matrix(variances.view())
    }

    fn add_diagonal(&self, q: ArrayView1<f64>) -> Self {
        let mut out = self.clone();
        out.diag_mut()
            .iter_mut()
            .zip(q.iter())
            .for_each(|(p, &q)| *p += q);
        out
    }

    fn empty_trajectory(num_timesteps: usize, state_len: usize) -> MatrixTrajectory {
        MatrixTrajectory::Full(Array3::zeros((num_timesteps, state_len, state_len)))
    }

    fn write_to(&self, trajectory: &mut MatrixTrajectory, timestep: usize) {
        if let MatrixTrajectory::Full(m) = trajectory {
            m.slice_mut(s![timestep, .., ..]).assign(self);
        }
    }
}

impl Covariance for Array1<f64> {
    fn from_prior(prior: ArrayView2<c64>) -> Self {
        real_diagonal(prior)
    }

    fn from_variances(variances: Array1<f64>) -> Self {
        variances
    }

    fn add_diagonal(&self, q: ArrayView1<f64>) -> Self {
        self + &q
    }

    fn empty_trajectory(num_timesteps: usize, state_len: usize) -> MatrixTrajectory {
        MatrixTrajectory::Diagonal(Array2::zeros((num_timesteps, state_len)))
    }

    fn write_to(&self, trajectory: &mut MatrixTrajectory, timestep: usize) {
        if let MatrixTrajectory::Diagonal(d) = trajectory {
            d.row_mut(timestep).assign(self);
        }
    }
}

/// A numerical strategy for the measurement update. Each strategy builds the
/// Jacobian in the form it works best with.
pub(super) trait UpdateStrategy {
    type Covariance: Covariance;

    /// Update the predicted `mean` and `covariance` with the measurements
    /// `y`. `rinv` is the inverse of the (diagonal) measurement noise and
    /// `alpha` damps the step.
    fn update(
        &self,
        jacobian: &JacobianInputs,
        y: ArrayView1<c64>,
        rinv: ArrayView1<f64>,
        mean: ArrayView1<c64>,
        covariance: &Self::Covariance,
        alpha: f64,
    ) -> Result<Posterior, Singular>;
}

/// The matrix-inversion-lemma update with a compressed-row Jacobian.
pub(super) struct SparseUpdate;

/// The matrix-inversion-lemma update with a dense Jacobian.
pub(super) struct DenseUpdate;

/// Only the diagonals of `J^H J` and the covariance are used; nothing is
/// inverted.
pub(super) struct DiagonalUpdate;

impl UpdateStrategy for SparseUpdate {
    type Covariance = Array2<c64>;

    fn update(
        &self,
        jacobian: &JacobianInputs,
        y: ArrayView1<c64>,
        rinv: ArrayView1<f64>,
        mean: ArrayView1<c64>,
        covariance: &Array2<c64>,
        alpha: f64,
    ) -> Result<Posterior, Singular> {
        let j = jacobian.build_csr();
        full_update(&j, y, rinv, mean, covariance.view(), alpha)
    }
}

impl UpdateStrategy for DenseUpdate {
    type Covariance = Array2<c64>;

    fn update(
        &self,
        jacobian: &JacobianInputs,
        y: ArrayView1<c64>,
        rinv: ArrayView1<f64>,
        mean: ArrayView1<c64>,
        covariance: &Array2<c64>,
        alpha: f64,
    ) -> Result<Posterior, Singular> {
        let j = jacobian.build_dense();
        full_update(&j, y, rinv, mean, covariance.view(), alpha)
    }
}

impl UpdateStrategy for DiagonalUpdate {
    type Covariance = Array1<f64>;

    fn update(
        &self,
        jacobian: &JacobianInputs,
        y: ArrayView1<c64>,
        _rinv: ArrayView1<f64>,
        mean: ArrayView1<c64>,
        variances: &Array1<f64>,
        alpha: f64,
    ) -> Result<Posterior, Singular> {
        let j = jacobian.build_csr();
        let pinv = precision(variances.view())?;

        let v = &y - &j.dot(mean);
        let z = j.adjoint_dot(v.view());
        let denom = pinv + j.gram_diagonal();

        let mean = Zip::from(&mean)
            .and(&z)
            .and(&denom)
            .map_collect(|&m, &z, &d| m + z * (alpha / d));
        let variances = Zip::from(variances)
            .and(&denom)
            .map_collect(|&p, &d| (1.0 - alpha) * p + alpha / d);

        Ok(Posterior {
            mean,
            variances,
            innovation_norm: norm(v.view()),
        })
    }
}

/// The reciprocals of the prior variances, which must all be finite.
fn precision(variances: ArrayView1<f64>) -> Result<Array1<f64>, Singular> {
    let pinv = variances.mapv(f64::recip);
    if pinv.iter().all(|p| p.is_finite()) {
        Ok(pinv)
    } else {
        Err(Singular)
    }
}

fn norm(v: ArrayView1<c64>) -> f64 {
    v.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
}

/// With `Pinv = 1 / diag(Pp)`, `A = J^H R^-1 J`, `b = J^H R^-1 v` and
/// `T = Pinv + A`, the Kalman gain only appears as
///
/// ```text
/// K v    = Pp Pinv T^-1 b
/// K J Pp = Pp Pinv T^-1 A Pp
/// ```
///
/// so nothing the size of the measurement space is ever inverted. Only the
/// real diagonal of the posterior covariance is kept.
fn full_update<J: JacobianOperator>(
    j: &J,
    y: ArrayView1<c64>,
    rinv: ArrayView1<f64>,
    mean: ArrayView1<c64>,
    covariance: ArrayView2<c64>,
    alpha: f64,
) -> Result<Posterior, Singular> {
    let prior_variances = real_diagonal(covariance);
    let pinv = precision(prior_variances.view())?;
    if rinv.iter().any(|r| !r.is_finite()) {
        return Err(Singular);
    }

    let v = &y - &j.dot(mean);
    let a = j.weighted_gram(rinv);
    let b = j.adjoint_dot(Zip::from(&v).and(rinv).map_collect(|&v, &r| v * r).view());

    let mut t = a.clone();
    t.diag_mut()
        .iter_mut()
        .zip(pinv.iter())
        .for_each(|(t, &p)| *t += p);
    trace!("Inverting a {0}x{0} matrix", t.nrows());
    // Pinv T^-1
    let mut scaled_t_inv = invert(t.view()).ok_or(Singular)?;
    scaled_t_inv
        .outer_iter_mut()
        .zip(pinv.iter())
        .for_each(|(mut row, &p)| row.mapv_inplace(|x| x * p));

    let kv = covariance.dot(&scaled_t_inv.dot(&b));
    let x_pp = scaled_t_inv.dot(&a).dot(&covariance);
    let mean = Zip::from(&mean)
        .and(&kv)
        .map_collect(|&m, &kv| m + kv * alpha);
    let variances = Array1::from_shape_fn(prior_variances.len(), |i| {
        let kjpp = covariance.row(i).dot(&x_pp.column(i));
        prior_variances[i] - alpha * kjpp.re
    });

    Ok(Posterior {
        mean,
        variances,
        innovation_norm: norm(v.view()),
    })
}

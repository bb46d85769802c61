// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Statistics for judging calibration results against known gains.

mod error;

pub use error::StatisticsError;

use ndarray::prelude::*;

use crate::{
    c64,
    gains::{flatten, true_gains_vector, GainShape},
    math::first_invalid_variance,
    trajectory::MatrixTrajectory,
};

/// The fraction of estimated gains lying within `n_sigma` standard deviations
/// of the true gains, averaged over time.
///
/// `states` has dimensions (time, antenna, channel, direction, 2) and
/// `true_gains` (time, antenna, channel, direction). Both augmentation slots
/// are tested (the true conjugate slot is the conjugate of the true gain). An
/// entry is covered when both its real and imaginary errors are within the
/// bound.
pub fn sigma_test(
    states: ArrayView5<c64>,
    true_gains: ArrayView4<c64>,
    covariances: &MatrixTrajectory,
    n_sigma: f64,
) -> Result<f64, StatisticsError> {
    if !(n_sigma.is_finite() && n_sigma > 0.0) {
        return Err(StatisticsError::InvalidWidth(n_sigma));
    }
    let (num_timesteps, n_ant, n_chan, n_dir) = true_gains.dim();
    if num_timesteps == 0 {
        return Err(StatisticsError::NoTimeSteps);
    }
    if states.dim() != (num_timesteps, n_ant, n_chan, n_dir, 2) {
        return Err(StatisticsError::ShapeMismatch {
            what: "gain trajectory",
            expected: format!("({num_timesteps}, {n_ant}, {n_chan}, {n_dir}, 2)"),
            got: format!("{:?}", states.dim()),
        });
    }
    let shape = GainShape::new(n_ant, n_chan, n_dir);
    let state_len = shape.state_len();
    if covariances.len() != num_timesteps || covariances.state_len() != state_len {
        return Err(StatisticsError::ShapeMismatch {
            what: "covariance trajectory",
            expected: format!("{num_timesteps} matrices of size {state_len}"),
            got: format!(
                "{} matrices of size {}",
                covariances.len(),
                covariances.state_len()
            ),
        });
    }

    let mut total = 0.0;
    for t in 0..num_timesteps {
        let variances = covariances.variances(t);
        if let Some((index, value)) = first_invalid_variance(variances.view()) {
            return Err(StatisticsError::InvalidVariance {
                timestep: t,
                index,
                value,
            });
        }
        let x = flatten(states.slice(s![t, .., .., .., ..]), shape);
        let mu = true_gains_vector(true_gains.slice(s![t, .., .., ..]));
        let covered = x
            .iter()
            .zip(mu.iter())
            .zip(variances.iter())
            .filter(|((x, mu), var)| {
                let bound = n_sigma * var.sqrt();
                let diff = *x - *mu;
                diff.re.abs() <= bound && diff.im.abs() <= bound
            })
            .count();
        total += covered as f64 / state_len as f64;
    }
    Ok(total / num_timesteps as f64)
}

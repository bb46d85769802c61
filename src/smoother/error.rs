// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KalmanSmootherError {
    #[error("There are no time steps to smooth")]
    NoTimeSteps,

    #[error("The {what} has shape {got}, but {expected} was expected")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        got: String,
    },

    #[error("The process noise value {index} is {value}, but it must be finite and non-negative")]
    InvalidProcessNoise { index: usize, value: f64 },

    #[error("Time step {timestep} (time bin {time_bin}): the predicted covariance couldn't be inverted")]
    SingularCovariance { timestep: usize, time_bin: usize },

    #[error("Time step {timestep} (time bin {time_bin}): smoothed variance {index} is {value}")]
    NumericalInstability {
        timestep: usize,
        time_bin: usize,
        index: usize,
        value: f64,
    },
}

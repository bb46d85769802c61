// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::{inputs::InputError, jacobian::JacobianError, measurement::MeasurementError};

#[derive(Error, Debug)]
pub enum KalmanFilterError {
    #[error("Unrecognised filter algorithm '{got}'. Supported algorithms: {}", *super::FILTER_ALGORITHMS)]
    InvalidAlgorithm { got: String },

    #[error("The step control must be greater than 0 and at most 1, but got {0}")]
    InvalidStepControl(f64),

    #[error("The {what} has shape {got}, but {expected} was expected")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        got: String,
    },

    #[error("The {what} value {index} is {value}, but it must be finite and non-negative")]
    InvalidNoise {
        what: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Time step {timestep} (time bin {time_bin}): a covariance matrix inversion gave non-finite values")]
    SingularCovariance { timestep: usize, time_bin: usize },

    #[error("Time step {timestep} (time bin {time_bin}): posterior variance {index} is {value}")]
    NumericalInstability {
        timestep: usize,
        time_bin: usize,
        index: usize,
        value: f64,
    },

    #[error("Time step {timestep} (time bin {time_bin}): {source}")]
    Jacobian {
        timestep: usize,
        time_bin: usize,
        #[source]
        source: JacobianError,
    },

    #[error("Time step {timestep} (time bin {time_bin}): {source}")]
    Measurement {
        timestep: usize,
        time_bin: usize,
        #[source]
        source: MeasurementError,
    },

    #[error("Filtering was aborted after time step {timestep} (time bin {time_bin})")]
    Aborted { timestep: usize, time_bin: usize },

    #[error(transparent)]
    Input(#[from] InputError),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatisticsError {
    #[error("There are no time steps to test")]
    NoTimeSteps,

    #[error("The {what} has shape {got}, but {expected} was expected")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        got: String,
    },

    #[error("The sigma-test width must be positive and finite, but got {0}")]
    InvalidWidth(f64),

    #[error("Time step {timestep}: variance {index} is {value}")]
    InvalidVariance {
        timestep: usize,
        index: usize,
        value: f64,
    },
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JacobianError {
    #[error("Jacobian input '{array}' has shape {got}, but {expected} was expected")]
    DimensionMismatch {
        array: &'static str,
        expected: String,
        got: String,
    },

    #[error("Row {row} refers to antenna {ant}, but there are only {n_ant} antennas")]
    AntennaIndex { row: usize, ant: usize, n_ant: usize },

    #[error("Row {row} is an autocorrelation of antenna {ant}")]
    Autocorrelation { row: usize, ant: usize },
}

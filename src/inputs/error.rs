// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("No visibility rows were supplied")]
    NoRows,

    #[error("Model visibilities need at least one channel and direction, but got {n_chan} channels and {n_dir} directions")]
    EmptyModel { n_chan: usize, n_dir: usize },

    #[error("At least 2 antennas are needed for calibration, but got {n_ant}")]
    TooFewAntennas { n_ant: usize },

    #[error("The {array} array has shape {got}, but {expected} was expected")]
    ShapeMismatch {
        array: &'static str,
        expected: String,
        got: String,
    },

    #[error("Row {row} refers to antenna {ant}, but there are only {n_ant} antennas")]
    AntennaIndex { row: usize, ant: usize, n_ant: usize },

    #[error("Row {row} is an autocorrelation of antenna {ant}; only cross-correlations can be used")]
    Autocorrelation { row: usize, ant: usize },

    #[error("Row {row} has a negative or non-finite weight")]
    InvalidWeight { row: usize },

    #[error("The time bins span {got} rows, but there are {expected} rows of visibilities")]
    TimeBinRows { expected: usize, got: usize },

    #[error("Time bin {index} has {got} rows, but every bin needs one row per baseline ({expected})")]
    BaselinesPerBin {
        index: usize,
        expected: usize,
        got: usize,
    },
}

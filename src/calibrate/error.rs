// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use crate::{filter::KalmanFilterError, smoother::KalmanSmootherError, InputError};

#[derive(Error, Debug)]
pub enum CalibrateError {
    #[error("The number of {what} runs must be at least 1")]
    NoRuns { what: &'static str },

    #[error("{what} must be positive and finite, but got {value}")]
    InvalidSigma { what: &'static str, value: f64 },

    #[error("Argument file '{}' doesn't have a recognised extension. Supported extensions: {}", .path.display(), *super::params::ARG_FILE_TYPES_COMMA_SEPARATED)]
    ArgFileType { path: PathBuf },

    #[error("Couldn't decode {file_type} structure from '{}':\n{err}", .path.display())]
    ArgFileDecode {
        file_type: &'static str,
        path: PathBuf,
        err: String,
    },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Filter(#[from] KalmanFilterError),

    #[error(transparent)]
    Smoother(#[from] KalmanSmootherError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all kalcal-related errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KalcalError {
    #[error(transparent)]
    GainShape(#[from] crate::gains::GainShapeError),

    #[error(transparent)]
    TimeBin(#[from] crate::timebins::TimeBinError),

    #[error(transparent)]
    Input(#[from] crate::inputs::InputError),

    #[error(transparent)]
    Measurement(#[from] crate::measurement::MeasurementError),

    #[error(transparent)]
    Jacobian(#[from] crate::jacobian::JacobianError),

    #[error(transparent)]
    Filter(#[from] crate::filter::KalmanFilterError),

    #[error(transparent)]
    Smoother(#[from] crate::smoother::KalmanSmootherError),

    #[error(transparent)]
    Statistics(#[from] crate::statistics::StatisticsError),

    #[error(transparent)]
    Calibrate(#[from] crate::calibrate::CalibrateError),

    #[error(transparent)]
    Logging(#[from] log::SetLoggerError),
}

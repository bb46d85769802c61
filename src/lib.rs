// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Kalman filter and smoother calibration of radio interferometer antenna gains.

Complex gains are tracked per antenna, channel and direction as a
conjugate-augmented state vector. Each time step linearises the bilinear
measurement equation `V_pq = g_p M_pq conj(g_q)` around the previous
posterior (see [`jacobian`]), updates the state with one of three numerical
strategies (see [`filter`]) and, once the forward pass is complete, a
Rauch-Tung-Striebel smoother refines the whole trajectory (see
[`smoother`]).
 */

pub mod calibrate;
pub mod constants;
mod error;
pub mod filter;
pub mod gains;
pub mod inputs;
pub mod jacobian;
pub mod logging;
pub(crate) mod math;
pub mod measurement;
pub mod smoother;
pub mod statistics;
pub mod timebins;
pub mod trajectory;

#[cfg(test)]
pub(crate) mod tests;

// Re-exports.
pub use calibrate::{
    calibrate, CalibrateError, CalibrationOutput, CalibrationParams, FilterDirection,
};
pub use error::KalcalError;
pub use filter::{
    FilterAlgorithm, FilterOptions, FilterOutput, KalmanFilter, KalmanFilterError, StepHook,
    StepReport,
};
pub use gains::GainShape;
pub use inputs::{InputError, VisibilityInputs};
pub use jacobian::{CooMatrix, CsrMatrix, JacobianError, JacobianInputs, JacobianOperator};
pub use smoother::{KalmanSmoother, KalmanSmootherError, SmootherOutput};
pub use timebins::{TimeBin, TimeBinError, TimeBins};
pub use trajectory::MatrixTrajectory;

/// Double-precision complex numbers are used for every visibility, gain and
/// covariance value.
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

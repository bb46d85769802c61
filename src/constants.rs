// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision.
 */

/// The default step-control (damping) factor applied to every filter update.
pub const DEFAULT_STEP_CONTROL: f64 = 0.5;

/// The default standard deviation of the gains' random-walk evolution. The
/// process-noise covariance is this value squared on the diagonal.
pub const DEFAULT_SIGMA_F: f64 = 0.1;

/// The default standard deviation of the visibility noise. The
/// measurement-noise covariance is twice this value squared on the diagonal
/// (real and imaginary components are independent).
pub const DEFAULT_SIGMA_N: f64 = 0.1;

/// The default number of filter passes made by [`crate::calibrate()`].
pub const DEFAULT_FILTER_RUNS: usize = 1;

/// The default number of smoother passes made by [`crate::calibrate()`].
pub const DEFAULT_SMOOTHER_RUNS: usize = 1;

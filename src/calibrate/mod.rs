// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calibration: repeated filter passes followed by repeated smoother passes.
//!
//! Each filter pass after the first starts from the last posterior of the
//! previous pass and visits the time bins in the opposite order. Smoother
//! passes alternate in the same way. Whatever direction the last passes ran
//! in, the returned trajectories are chronological.

mod error;
mod params;

pub use error::CalibrateError;
pub use params::CalibrationParams;

use std::time::Instant;

use log::info;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    c64, FilterOutput, KalmanFilter, KalmanSmoother, SmootherOutput, TimeBins, VisibilityInputs,
};

/// The order in which time bins are visited.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterDirection {
    /// Earliest time first.
    #[default]
    #[strum(serialize = "forward")]
    Forward,

    /// Latest time first.
    #[strum(serialize = "backward")]
    Backward,
}

impl FilterDirection {
    pub fn toggled(self) -> FilterDirection {
        match self {
            FilterDirection::Forward => FilterDirection::Backward,
            FilterDirection::Backward => FilterDirection::Forward,
        }
    }
}

/// The results of [`calibrate`]. Both trajectories are chronological.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutput {
    pub filter: FilterOutput,
    pub smoother: SmootherOutput,
}

/// Calibrate with the default prior (all gains `1 + 0j` with unit variance)
/// and diagonal noise covariances derived from `params`.
pub fn calibrate(
    inputs: &VisibilityInputs,
    time_bins: &TimeBins,
    params: &CalibrationParams,
) -> Result<CalibrationOutput, CalibrateError> {
    params.validate()?;
    inputs.check_time_bins(time_bins)?;

    let shape = inputs.shape();
    let state_len = shape.state_len();
    let process_noise = params.process_noise(state_len);
    let measurement_noise = params.measurement_noise(2 * shape.n_chan * inputs.num_baselines());
    let mut prior_mean = Array1::from_elem(state_len, c64::new(1.0, 0.0));
    let mut prior_cov = Array2::<c64>::eye(state_len);

    let filter = KalmanFilter::new(params.filter_options())?;
    let filter_start = Instant::now();
    let mut direction = FilterDirection::Forward;
    let mut filtered = filter.run(
        inputs,
        time_bins,
        direction,
        prior_mean.view(),
        prior_cov.view(),
        process_noise.view(),
        measurement_noise.view(),
    )?;
    for _ in 1..params.filter_runs {
        let last = filtered.num_timesteps() - 1;
        prior_mean = filtered.state_vector(last);
        prior_cov = filtered.covariances.matrix(last);
        direction = direction.toggled();
        filtered = filter.run(
            inputs,
            time_bins,
            direction,
            prior_mean.view(),
            prior_cov.view(),
            process_noise.view(),
            measurement_noise.view(),
        )?;
    }
    let filter_duration = filter_start.elapsed();

    // Smooth in the order the last filter pass ran in.
    let smoother = KalmanSmoother::new(params.progress_bars);
    let smoother_start = Instant::now();
    let mut smoothed = smoother.run(&filtered, process_noise.view())?;
    for _ in 1..params.smoother_runs {
        smoothed = smoother.run(&smoothed.reversed().into_filter_output(), process_noise.view())?;
    }
    let smoother_duration = smoother_start.elapsed();

    info!(
        "Filter run(s): {} in {filter_duration:.3?}, smoother run(s): {} in {smoother_duration:.3?}",
        params.filter_runs, params.smoother_runs
    );

    let filter = match filtered.direction {
        FilterDirection::Forward => filtered,
        FilterDirection::Backward => filtered.reversed(),
    };
    let smoother = match smoothed.direction {
        FilterDirection::Forward => smoothed,
        FilterDirection::Backward => smoothed.reversed(),
    };
    Ok(CalibrationOutput { filter, smoother })
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The forward Kalman filter.
//!
//! Time step 0 holds the prior. Every later step predicts from the previous
//! posterior (adding process noise), linearises the measurement equation at
//! the previous posterior gains and applies a measurement update with one of
//! the [`FilterAlgorithm`]s. Every posterior covariance is diagonal; the
//! off-diagonal terms are dropped after each update.

mod error;
mod update;

pub use error::KalmanFilterError;

use std::{ops::ControlFlow, str::FromStr};

use itertools::Itertools;
use log::{debug, info};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    c64,
    calibrate::FilterDirection,
    constants::DEFAULT_STEP_CONTROL,
    gains::{flatten, unflatten, GainShape},
    jacobian::JacobianInputs,
    logging::make_progress_bar,
    math::first_invalid_variance,
    measurement::measurement_vector,
    trajectory::MatrixTrajectory,
    TimeBins, VisibilityInputs,
};
use update::{Covariance, DenseUpdate, DiagonalUpdate, SparseUpdate, UpdateStrategy};

lazy_static::lazy_static! {
    pub(crate) static ref FILTER_ALGORITHMS: String = FilterAlgorithm::iter().join(", ");
}

/// How the measurement update is computed.
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
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FilterAlgorithm {
    /// The matrix-inversion-lemma update with a compressed-row Jacobian.
    #[default]
    #[strum(serialize = "sparse")]
    Sparse,

    /// The matrix-inversion-lemma update with a dense Jacobian.
    #[strum(serialize = "dense")]
    Dense,

    /// Only diagonals are used, so no matrix is ever inverted. The covariance
    /// trajectory only holds variances.
    #[strum(serialize = "diagonal")]
    Diagonal,
}

impl FilterAlgorithm {
    /// Parse an algorithm selector, e.g. "sparse".
    pub fn parse(s: &str) -> Result<FilterAlgorithm, KalmanFilterError> {
        FilterAlgorithm::from_str(&s.trim().to_lowercase()).map_err(|_| {
            KalmanFilterError::InvalidAlgorithm {
                got: s.to_string(),
            }
        })
    }
}

impl TryFrom<String> for FilterAlgorithm {
    type Error = KalmanFilterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        FilterAlgorithm::parse(&s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOptions {
    pub algorithm: FilterAlgorithm,

    /// The fraction of each update that is applied, in (0, 1].
    pub step_control: f64,

    /// Draw a progress bar on stdout?
    pub progress_bars: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            algorithm: FilterAlgorithm::default(),
            step_control: DEFAULT_STEP_CONTROL,
            progress_bars: false,
        }
    }
}

/// What happened in one filter step. Handed to a [`StepHook`] after the
/// step's posterior has been written.
#[derive(Debug)]
pub struct StepReport<'a> {
    /// The position of the step in traversal order.
    pub timestep: usize,

    pub num_timesteps: usize,

    /// The index of the time bin used by this step.
    pub time_bin: usize,

    /// The posterior state vector.
    pub mean: ArrayView1<'a, c64>,

    /// The posterior variances.
    pub variances: ArrayView1<'a, f64>,

    /// The 2-norm of the innovation.
    pub innovation_norm: f64,
}

/// Called between filter steps. Returning [`ControlFlow::Break`] stops the
/// filter; nothing is returned from an aborted run.
pub trait StepHook {
    fn on_step(&mut self, report: &StepReport) -> ControlFlow<()>;
}

impl<F> StepHook for F
where
    F: FnMut(&StepReport) -> ControlFlow<()>,
{
    fn on_step(&mut self, report: &StepReport) -> ControlFlow<()> {
        self(report)
    }
}

/// The filtered trajectory, in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    /// Posterior gains with dimensions (time, antenna, channel, direction, 2).
    pub states: Array5<c64>,

    pub covariances: MatrixTrajectory,

    /// The order the time bins were visited in.
    pub direction: FilterDirection,
}

impl FilterOutput {
    pub fn num_timesteps(&self) -> usize {
        self.states.len_of(Axis(0))
    }

    pub fn shape(&self) -> GainShape {
        let (_, n_ant, n_chan, n_dir, _) = self.states.dim();
        GainShape::new(n_ant, n_chan, n_dir)
    }

    /// The flattened state of time step `k`.
    pub fn state_vector(&self, k: usize) -> Array1<c64> {
        flatten(self.states.slice(s![k, .., .., .., ..]), self.shape())
    }

    /// The same trajectory with the time axis flipped (and the opposite
    /// direction).
    pub fn reversed(&self) -> FilterOutput {
        FilterOutput {
            states: self.states.slice(s![..;-1, .., .., .., ..]).to_owned(),
            covariances: self.covariances.reversed(),
            direction: self.direction.toggled(),
        }
    }
}

/// The forward filter. One instance may be run many times.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    options: FilterOptions,
}

impl KalmanFilter {
    pub fn new(options: FilterOptions) -> Result<KalmanFilter, KalmanFilterError> {
        // A NaN fails this too.
        if !(options.step_control > 0.0 && options.step_control <= 1.0) {
            return Err(KalmanFilterError::InvalidStepControl(options.step_control));
        }
        Ok(KalmanFilter { options })
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Filter over `time_bins` in the given `direction`. The prior describes
    /// the first visited time step; `process_noise` is the diagonal of `Q`
    /// and `measurement_noise` the diagonal of `R`, which has one value per
    /// Jacobian row.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        inputs: &VisibilityInputs,
        time_bins: &TimeBins,
        direction: FilterDirection,
        prior_mean: ArrayView1<c64>,
        prior_covariance: ArrayView2<c64>,
        process_noise: ArrayView1<f64>,
        measurement_noise: ArrayView1<f64>,
    ) -> Result<FilterOutput, KalmanFilterError> {
        self.run_with_hook(
            inputs,
            time_bins,
            direction,
            prior_mean,
            prior_covariance,
            process_noise,
            measurement_noise,
            NoHook,
        )
    }

    /// As [`KalmanFilter::run`], but `hook` is called after every step.
    #[allow(clippy::too_many_arguments)]
    pub fn run_with_hook<H: StepHook>(
        &self,
        inputs: &VisibilityInputs,
        time_bins: &TimeBins,
        direction: FilterDirection,
        prior_mean: ArrayView1<c64>,
        prior_covariance: ArrayView2<c64>,
        process_noise: ArrayView1<f64>,
        measurement_noise: ArrayView1<f64>,
        hook: H,
    ) -> Result<FilterOutput, KalmanFilterError> {
        inputs.check_time_bins(time_bins)?;
        let shape = inputs.shape();
        let state_len = shape.state_len();
        let num_meas = 2 * shape.n_chan * inputs.num_baselines();
        for (what, got, expected) in [
            ("prior mean", prior_mean.len(), state_len),
            ("process noise", process_noise.len(), state_len),
            ("measurement noise", measurement_noise.len(), num_meas),
        ] {
            if got != expected {
                return Err(KalmanFilterError::ShapeMismatch {
                    what,
                    expected: format!("({expected},)"),
                    got: format!("({got},)"),
                });
            }
        }
        if prior_covariance.dim() != (state_len, state_len) {
            return Err(KalmanFilterError::ShapeMismatch {
                what: "prior covariance",
                expected: format!("({state_len}, {state_len})"),
                got: format!("{:?}", prior_covariance.dim()),
            });
        }
        for (what, noise) in [
            ("process noise", process_noise.view()),
            ("measurement noise", measurement_noise.view()),
        ] {
            if let Some((index, value)) = first_invalid_variance(noise) {
                return Err(KalmanFilterError::InvalidNoise { what, index, value });
            }
        }

        let noise = Noise {
            process: process_noise,
            rinv: measurement_noise.mapv(f64::recip),
        };
        let prior = (prior_mean, prior_covariance);
        match self.options.algorithm {
            FilterAlgorithm::Sparse => {
                self.filter(SparseUpdate, inputs, time_bins, direction, prior, noise, hook)
            }
            FilterAlgorithm::Dense => {
                self.filter(DenseUpdate, inputs, time_bins, direction, prior, noise, hook)
            }
            FilterAlgorithm::Diagonal => {
                self.filter(DiagonalUpdate, inputs, time_bins, direction, prior, noise, hook)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn filter<S: UpdateStrategy, H: StepHook>(
        &self,
        strategy: S,
        inputs: &VisibilityInputs,
        time_bins: &TimeBins,
        direction: FilterDirection,
        (prior_mean, prior_covariance): (ArrayView1<c64>, ArrayView2<c64>),
        noise: Noise,
        mut hook: H,
    ) -> Result<FilterOutput, KalmanFilterError> {
        let shape = inputs.shape();
        let bins = time_bins.in_direction(direction);
        let num_timesteps = bins.len();
        let alpha = self.options.step_control;
        info!(
            "Running the {} Kalman filter ({direction}) over {num_timesteps} time steps",
            self.options.algorithm,
        );

        let (n_ant, n_chan, n_dir, _) = shape.tensor_dim();
        let mut states = Array5::zeros((num_timesteps, n_ant, n_chan, n_dir, 2));
        let mut covariances = S::Covariance::empty_trajectory(num_timesteps, shape.state_len());
        states
            .slice_mut(s![0, .., .., .., ..])
            .assign(&unflatten(prior_mean, shape));
        let mut posterior_mean = prior_mean.to_owned();
        let mut posterior_cov = S::Covariance::from_prior(prior_covariance);
        posterior_cov.write_to(&mut covariances, 0);

        let progress = make_progress_bar(
            num_timesteps.saturating_sub(1),
            format!("{} filter", self.options.algorithm),
            self.options.progress_bars,
        );
        for (k, bin) in bins.iter().enumerate().skip(1) {
            // Predict.
            let predicted_cov = posterior_cov.add_diagonal(noise.process);

            // Linearise at the previous posterior.
            let step = inputs.step(bin);
            let jacobian =
                JacobianInputs::from_step(&step, states.slice(s![k - 1, .., .., .., ..]))
                    .map_err(|source| KalmanFilterError::Jacobian {
                        timestep: k,
                        time_bin: bin.index,
                        source,
                    })?;
            let y = measurement_vector(step.data.clone(), step.weight.clone(), n_ant, n_chan)
                .map_err(|source| KalmanFilterError::Measurement {
                    timestep: k,
                    time_bin: bin.index,
                    source,
                })?;

            // Update.
            let posterior = strategy
                .update(
                    &jacobian,
                    y.view(),
                    noise.rinv.view(),
                    posterior_mean.view(),
                    &predicted_cov,
                    alpha,
                )
                .map_err(|_| KalmanFilterError::SingularCovariance {
                    timestep: k,
                    time_bin: bin.index,
                })?;
            if let Some((index, value)) = first_invalid_variance(posterior.variances.view()) {
                return Err(KalmanFilterError::NumericalInstability {
                    timestep: k,
                    time_bin: bin.index,
                    index,
                    value,
                });
            }
            debug!(
                "Time step {k} (bin {}): innovation norm {:.3e}",
                bin.index, posterior.innovation_norm
            );

            states
                .slice_mut(s![k, .., .., .., ..])
                .assign(&unflatten(posterior.mean.view(), shape));
            let report = StepReport {
                timestep: k,
                num_timesteps,
                time_bin: bin.index,
                mean: posterior.mean.view(),
                variances: posterior.variances.view(),
                innovation_norm: posterior.innovation_norm,
            };
            if hook.on_step(&report).is_break() {
                progress.abandon_with_message("Filtering aborted");
                return Err(KalmanFilterError::Aborted {
                    timestep: k,
                    time_bin: bin.index,
                });
            }

            posterior_cov = S::Covariance::from_variances(posterior.variances);
            posterior_cov.write_to(&mut covariances, k);
            posterior_mean = posterior.mean;
            progress.inc(1);
        }
        progress.abandon_with_message("Finished filtering");

        Ok(FilterOutput {
            states,
            covariances,
            direction,
        })
    }
}

/// Never stops the filter.
struct NoHook;

impl StepHook for NoHook {
    fn on_step(&mut self, _: &StepReport) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// The diagonal noise covariances of a run.
struct Noise<'a> {
    process: ArrayView1<'a, f64>,
    /// `1 / diag(R)`
    rinv: Array1<f64>,
}

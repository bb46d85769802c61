// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Rauch-Tung-Striebel smoother.
//!
//! The smoother runs backwards over a filtered trajectory (in the filter's
//! traversal order). The last step is copied verbatim; every earlier step
//! blends its filtered estimate with the smoothed estimate after it:
//!
//! ```text
//! Pp = P[k] + Q
//! G  = P[k] Pp^-1
//! ms[k] = m[k] + G (ms[k+1] - m[k])
//! Ps[k] = Re diag(P[k] + G (Ps[k+1] - Pp) G^T)
//! ```

mod error;

pub use error::KalmanSmootherError;

use log::{debug, info};
use ndarray::{prelude::*, Zip};

use crate::{
    c64,
    calibrate::FilterDirection,
    gains::{flatten, unflatten, GainShape},
    logging::make_progress_bar,
    math::{diagonal_matrix, first_invalid_variance, invert, is_diagonal},
    trajectory::MatrixTrajectory,
    FilterOutput,
};

/// The smoothed trajectory, in the same order (and covariance representation)
/// as the filtered trajectory it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SmootherOutput {
    /// Smoothed gains with dimensions (time, antenna, channel, direction, 2).
    pub states: Array5<c64>,

    pub covariances: MatrixTrajectory,

    /// The smoother gain matrix `G` of every step. The last step has none, so
    /// its slot is zero.
    pub smoother_gains: MatrixTrajectory,

    pub direction: FilterDirection,
}

impl SmootherOutput {
    pub fn num_timesteps(&self) -> usize {
        self.states.len_of(Axis(0))
    }

    /// The flattened state of time step `k`.
    pub fn state_vector(&self, k: usize) -> Array1<c64> {
        let (_, n_ant, n_chan, n_dir, _) = self.states.dim();
        flatten(
            self.states.slice(s![k, .., .., .., ..]),
            GainShape::new(n_ant, n_chan, n_dir),
        )
    }

    /// The same trajectory with the time axis flipped (and the opposite
    /// direction).
    pub fn reversed(&self) -> SmootherOutput {
        SmootherOutput {
            states: self.states.slice(s![..;-1, .., .., .., ..]).to_owned(),
            covariances: self.covariances.reversed(),
            smoother_gains: self.smoother_gains.reversed(),
            direction: self.direction.toggled(),
        }
    }

    /// View the smoothed trajectory as a filtered one, so that it can seed
    /// another pass.
    pub fn into_filter_output(self) -> FilterOutput {
        FilterOutput {
            states: self.states,
            covariances: self.covariances,
            direction: self.direction,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KalmanSmoother {
    progress_bars: bool,
}

impl KalmanSmoother {
    pub fn new(progress_bars: bool) -> KalmanSmoother {
        KalmanSmoother { progress_bars }
    }

    /// Smooth a filtered trajectory. `process_noise` is the diagonal of the
    /// process-noise covariance `Q` used by the filter.
    pub fn run(
        &self,
        filtered: &FilterOutput,
        process_noise: ArrayView1<f64>,
    ) -> Result<SmootherOutput, KalmanSmootherError> {
        self.smooth(
            filtered.states.view(),
            &filtered.covariances,
            process_noise,
            filtered.direction,
        )
    }

    /// Smooth gain `states` (time, antenna, channel, direction, 2) with their
    /// `covariances`.
    pub fn smooth(
        &self,
        states: ArrayView5<c64>,
        covariances: &MatrixTrajectory,
        process_noise: ArrayView1<f64>,
        direction: FilterDirection,
    ) -> Result<SmootherOutput, KalmanSmootherError> {
        let (num_timesteps, n_ant, n_chan, n_dir, n_aug) = states.dim();
        if num_timesteps == 0 {
            return Err(KalmanSmootherError::NoTimeSteps);
        }
        if n_aug != 2 {
            return Err(KalmanSmootherError::ShapeMismatch {
                what: "gain trajectory",
                expected: format!("({num_timesteps}, {n_ant}, {n_chan}, {n_dir}, 2)"),
                got: format!("{:?}", states.dim()),
            });
        }
        let shape = GainShape::new(n_ant, n_chan, n_dir);
        let state_len = shape.state_len();
        if covariances.len() != num_timesteps || covariances.state_len() != state_len {
            return Err(KalmanSmootherError::ShapeMismatch {
                what: "covariance trajectory",
                expected: format!("{num_timesteps} matrices of size {state_len}"),
                got: format!(
                    "{} matrices of size {}",
                    covariances.len(),
                    covariances.state_len()
                ),
            });
        }
        if process_noise.len() != state_len {
            return Err(KalmanSmootherError::ShapeMismatch {
                what: "process noise",
                expected: format!("({state_len},)"),
                got: format!("({},)", process_noise.len()),
            });
        }
        if let Some((index, value)) = first_invalid_variance(process_noise) {
            return Err(KalmanSmootherError::InvalidProcessNoise { index, value });
        }

        info!("Running the Kalman smoother ({direction}) over {num_timesteps} time steps");
        // Trajectories are in traversal order; errors report chronological
        // time bins.
        let time_bin = |k: usize| match direction {
            FilterDirection::Forward => k,
            FilterDirection::Backward => num_timesteps - 1 - k,
        };
        let progress = make_progress_bar(
            num_timesteps - 1,
            "Smoother".to_string(),
            self.progress_bars,
        );

        let mut smoothed_states = Array5::zeros(states.dim());
        smoothed_states
            .slice_mut(s![-1, .., .., .., ..])
            .assign(&states.slice(s![-1, .., .., .., ..]));
        let mut smoothed = flatten(states.slice(s![-1, .., .., .., ..]), shape);

        let (covariances, smoother_gains) = match covariances {
            MatrixTrajectory::Full(p) => {
                let mut ps = Array3::zeros(p.dim());
                let mut gs = Array3::zeros(p.dim());
                ps.slice_mut(s![-1, .., ..]).assign(&p.slice(s![-1, .., ..]));
                for k in (0..num_timesteps - 1).rev() {
                    let m = flatten(states.slice(s![k, .., .., .., ..]), shape);
                    let step = full_step(
                        m.view(),
                        p.slice(s![k, .., ..]),
                        smoothed.view(),
                        ps.slice(s![k + 1, .., ..]),
                        process_noise,
                    )
                    .map_err(|e| e.at(k, time_bin(k)))?;
                    debug!("Smoothed time step {k}");

                    smoothed_states
                        .slice_mut(s![k, .., .., .., ..])
                        .assign(&unflatten(step.mean.view(), shape));
                    ps.slice_mut(s![k, .., ..])
                        .assign(&diagonal_matrix(step.variances.view()));
                    gs.slice_mut(s![k, .., ..]).assign(&step.gain);
                    smoothed = step.mean;
                    progress.inc(1);
                }
                (MatrixTrajectory::Full(ps), MatrixTrajectory::Full(gs))
            }

            MatrixTrajectory::Diagonal(p) => {
                let mut ps = Array2::zeros(p.dim());
                let mut gs = Array2::zeros(p.dim());
                ps.row_mut(num_timesteps - 1)
                    .assign(&p.row(num_timesteps - 1));
                for k in (0..num_timesteps - 1).rev() {
                    let m = flatten(states.slice(s![k, .., .., .., ..]), shape);
                    let step = diagonal_step(
                        m.view(),
                        p.row(k),
                        smoothed.view(),
                        ps.row(k + 1),
                        process_noise,
                    )
                    .map_err(|e| e.at(k, time_bin(k)))?;
                    debug!("Smoothed time step {k}");

                    smoothed_states
                        .slice_mut(s![k, .., .., .., ..])
                        .assign(&unflatten(step.mean.view(), shape));
                    ps.row_mut(k).assign(&step.variances);
                    gs.row_mut(k).assign(&step.gain);
                    smoothed = step.mean;
                    progress.inc(1);
                }
                (MatrixTrajectory::Diagonal(ps), MatrixTrajectory::Diagonal(gs))
            }
        };
        progress.abandon_with_message("Finished smoothing");

        Ok(SmootherOutput {
            states: smoothed_states,
            covariances,
            smoother_gains,
            direction,
        })
    }
}

/// One backward step. `G` is a matrix for full covariances and a vector for
/// diagonal ones.
struct Step<G> {
    mean: Array1<c64>,
    variances: Array1<f64>,
    gain: G,
}

/// Why a step failed, before the time step is known.
enum StepError {
    Singular,
    Unstable { index: usize, value: f64 },
}

impl StepError {
    fn at(self, timestep: usize, time_bin: usize) -> KalmanSmootherError {
        match self {
            StepError::Singular => KalmanSmootherError::SingularCovariance {
                timestep,
                time_bin,
            },
            StepError::Unstable { index, value } => KalmanSmootherError::NumericalInstability {
                timestep,
                time_bin,
                index,
                value,
            },
        }
    }
}

fn check_variances(variances: &Array1<f64>) -> Result<(), StepError> {
    match first_invalid_variance(variances.view()) {
        Some((index, value)) => Err(StepError::Unstable { index, value }),
        None => Ok(()),
    }
}

fn full_step(
    m: ArrayView1<c64>,
    p: ArrayView2<c64>,
    ms_next: ArrayView1<c64>,
    ps_next: ArrayView2<c64>,
    q: ArrayView1<f64>,
) -> Result<Step<Array2<c64>>, StepError> {
    let mut pp = p.to_owned();
    pp.diag_mut()
        .iter_mut()
        .zip(q.iter())
        .for_each(|(p, &q)| *p += q);

    // The filter's posteriors are diagonal, so the inverse usually is too.
    let pp_inv = if is_diagonal(pp.view()) {
        let d = pp.diag().mapv(|v| v.inv());
        if d.iter().any(|v| !v.is_finite()) {
            return Err(StepError::Singular);
        }
        let mut inv = Array2::zeros(pp.dim());
        inv.diag_mut().assign(&d);
        inv
    } else {
        invert(pp.view()).ok_or(StepError::Singular)?
    };
    let g = p.dot(&pp_inv);

    let e = &ms_next - &m;
    let big_e = &ps_next - &pp;
    let mean = &m + &g.dot(&e);
    // diag(G E G^T)_i = sum_jk G[i, j] E[j, k] G[i, k]
    let ge = g.dot(&big_e);
    let variances = Array1::from_shape_fn(m.len(), |i| {
        (p[(i, i)] + ge.row(i).dot(&g.row(i))).re
    });
    check_variances(&variances)?;

    Ok(Step {
        mean,
        variances,
        gain: g,
    })
}

fn diagonal_step(
    m: ArrayView1<c64>,
    p: ArrayView1<f64>,
    ms_next: ArrayView1<c64>,
    ps_next: ArrayView1<f64>,
    q: ArrayView1<f64>,
) -> Result<Step<Array1<f64>>, StepError> {
    let pp = &p + &q;
    let g = &p / &pp;
    if g.iter().any(|v| !v.is_finite()) {
        return Err(StepError::Singular);
    }

    let mean = Zip::from(&m)
        .and(&ms_next)
        .and(&g)
        .map_collect(|&m, &ms, &g| m + (ms - m) * g);
    let variances = Zip::from(&p)
        .and(&ps_next)
        .and(&pp)
        .and(&g)
        .map_collect(|&p, &ps, &pp, &g| p + g * (ps - pp) * g);
    check_variances(&variances)?;

    Ok(Step {
        mean,
        variances,
        gain: g,
    })
}

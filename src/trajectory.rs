// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Covariance matrices over time.

use ndarray::prelude::*;

use crate::{c64, math::diagonal_matrix};

/// One covariance matrix per time step. The sparse and dense filters keep
/// full matrices (even though their posteriors are diagonal, the prior need
/// not be); the diagonal filter only ever stores variances.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixTrajectory {
    /// Dimensions (time, state, state).
    Full(Array3<c64>),

    /// Dimensions (time, state).
    Diagonal(Array2<f64>),
}

impl MatrixTrajectory {
    /// The number of time steps.
    pub fn len(&self) -> usize {
        match self {
            MatrixTrajectory::Full(m) => m.len_of(Axis(0)),
            MatrixTrajectory::Diagonal(d) => d.len_of(Axis(0)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The length of the state vector each matrix describes.
    pub fn state_len(&self) -> usize {
        match self {
            MatrixTrajectory::Full(m) => m.len_of(Axis(1)),
            MatrixTrajectory::Diagonal(d) => d.len_of(Axis(1)),
        }
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(self, MatrixTrajectory::Diagonal(_))
    }

    /// The real parts of the diagonal at time step `k`.
    pub fn variances(&self, k: usize) -> Array1<f64> {
        match self {
            MatrixTrajectory::Full(m) => m.slice(s![k, .., ..]).diag().mapv(|v| v.re),
            MatrixTrajectory::Diagonal(d) => d.row(k).to_owned(),
        }
    }

    /// The covariance matrix at time step `k`, expanding variances into a
    /// diagonal matrix if necessary.
    pub fn matrix(&self, k: usize) -> Array2<c64> {
        match self {
            MatrixTrajectory::Full(m) => m.slice(s![k, .., ..]).to_owned(),
            MatrixTrajectory::Diagonal(d) => diagonal_matrix(d.row(k)),
        }
    }

    /// The same matrices with the time axis flipped.
    pub fn reversed(&self) -> MatrixTrajectory {
        match self {
            MatrixTrajectory::Full(m) => {
                MatrixTrajectory::Full(m.slice(s![..;-1, .., ..]).to_owned())
            }
            MatrixTrajectory::Diagonal(d) => {
                MatrixTrajectory::Diagonal(d.slice(s![..;-1, ..]).to_owned())
            }
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The measurement vector of a single time step.
//!
//! For every channel, the weighted visibilities of all baselines are followed
//! by their conjugates, matching the rows of the augmented Jacobian (see
//! [`crate::jacobian`]).

mod error;
#[cfg(test)]
mod tests;

pub use error::MeasurementError;

use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{c64, math::num_cross_baselines};

/// Pack the visibilities `vis` (row, channel) of one time step, weighted by
/// the square root of `weight` (row, channel), into a measurement vector.
/// There must be exactly one row per cross-correlation baseline.
pub fn measurement_vector(
    vis: ArrayView2<c64>,
    weight: ArrayView2<f64>,
    n_ant: usize,
    n_chan: usize,
) -> Result<Array1<c64>, MeasurementError> {
    if vis.dim() != weight.dim() {
        return Err(MeasurementError::ShapeMismatch {
            vis: vis.dim(),
            weight: weight.dim(),
        });
    }
    let (n_row, vis_chans) = vis.dim();
    if vis_chans != n_chan {
        return Err(MeasurementError::Channels {
            expected: n_chan,
            got: vis_chans,
        });
    }
    let n_bl = num_cross_baselines(n_ant);
    if n_row != n_bl {
        return Err(MeasurementError::Rows {
            expected: n_bl,
            got: n_row,
        });
    }

    let mut y = Array1::zeros(2 * n_bl * n_chan);
    // Each channel owns a contiguous block of 2 * n_bl elements; the first
    // half holds the visibilities and the second half their conjugates.
    y.axis_chunks_iter_mut(Axis(0), 2 * n_bl.max(1))
        .into_par_iter()
        .enumerate()
        .for_each(|(nu, mut y_chan)| {
            for (row, (&v, &w)) in vis
                .column(nu)
                .iter()
                .zip(weight.column(nu).iter())
                .enumerate()
            {
                let sqrt_w = w.sqrt();
                y_chan[row] = v * sqrt_w;
                y_chan[row + n_bl] = v.conj() * sqrt_w;
            }
        });

    Ok(y)
}

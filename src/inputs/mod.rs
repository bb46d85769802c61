// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The immutable visibility inputs of a calibration run.
//!
//! All arrays are baseline-row major: every row is one baseline at one time,
//! and rows of the same time are contiguous (see [`crate::TimeBins`]). Any
//! polarisation/correlation selection must happen before these are made.

mod error;
#[cfg(test)]
mod tests;

pub use error::InputError;

use log::debug;
use ndarray::prelude::*;

use crate::{c64, gains::GainShape, math::num_cross_baselines, TimeBin, TimeBins};

/// Model visibilities, data visibilities, weights and antenna indices for all
/// rows of an observation.
#[derive(Debug, Clone)]
pub struct VisibilityInputs<'a> {
    /// Model visibilities with dimensions (row, channel, direction).
    pub(crate) model: ArrayView3<'a, c64>,

    /// Data visibilities with dimensions (row, channel).
    pub(crate) data: ArrayView2<'a, c64>,

    /// Visibility weights with dimensions (row, channel).
    pub(crate) weight: ArrayView2<'a, f64>,

    /// The first antenna of each row's baseline.
    pub(crate) antenna1: &'a [usize],

    /// The second antenna of each row's baseline.
    pub(crate) antenna2: &'a [usize],

    shape: GainShape,
}

/// The rows of [`VisibilityInputs`] belonging to one time bin.
#[derive(Debug, Clone)]
pub struct VisibilityStep<'a> {
    pub model: ArrayView3<'a, c64>,
    pub data: ArrayView2<'a, c64>,
    pub weight: ArrayView2<'a, f64>,
    pub antenna1: &'a [usize],
    pub antenna2: &'a [usize],
}

impl<'a> VisibilityInputs<'a> {
    /// Bundle and check the input arrays. The number of antennas is one more
    /// than the largest antenna index.
    pub fn new(
        model: ArrayView3<'a, c64>,
        data: ArrayView2<'a, c64>,
        weight: ArrayView2<'a, f64>,
        antenna1: &'a [usize],
        antenna2: &'a [usize],
    ) -> Result<VisibilityInputs<'a>, InputError> {
        let n_ant = antenna1
            .iter()
            .chain(antenna2.iter())
            .max()
            .map(|&a| a + 1)
            .ok_or(InputError::NoRows)?;
        VisibilityInputs::with_num_antennas(model, data, weight, antenna1, antenna2, n_ant)
    }

    /// As [`VisibilityInputs::new`], but the number of antennas is given.
    pub fn with_num_antennas(
        model: ArrayView3<'a, c64>,
        data: ArrayView2<'a, c64>,
        weight: ArrayView2<'a, f64>,
        antenna1: &'a [usize],
        antenna2: &'a [usize],
        n_ant: usize,
    ) -> Result<VisibilityInputs<'a>, InputError> {
        let (n_row, n_chan, n_dir) = model.dim();
        if n_row == 0 {
            return Err(InputError::NoRows);
        }
        if n_chan == 0 || n_dir == 0 {
            return Err(InputError::EmptyModel { n_chan, n_dir });
        }
        if n_ant < 2 {
            return Err(InputError::TooFewAntennas { n_ant });
        }

        for (name, dim) in [("data", data.dim()), ("weight", weight.dim())] {
            if dim != (n_row, n_chan) {
                return Err(InputError::ShapeMismatch {
                    array: name,
                    expected: format!("({n_row}, {n_chan})"),
                    got: format!("{dim:?}"),
                });
            }
        }
        for (name, ants) in [("antenna1", antenna1), ("antenna2", antenna2)] {
            if ants.len() != n_row {
                return Err(InputError::ShapeMismatch {
                    array: name,
                    expected: format!("({n_row},)"),
                    got: format!("({},)", ants.len()),
                });
            }
        }
        for (row, (&p, &q)) in antenna1.iter().zip(antenna2.iter()).enumerate() {
            if p >= n_ant || q >= n_ant {
                return Err(InputError::AntennaIndex {
                    row,
                    ant: p.max(q),
                    n_ant,
                });
            }
            if p == q {
                return Err(InputError::Autocorrelation { row, ant: p });
            }
        }
        if let Some(row) = weight
            .outer_iter()
            .position(|w| w.iter().any(|&w| !w.is_finite() || w < 0.0))
        {
            return Err(InputError::InvalidWeight { row });
        }

        debug!("Visibility inputs: {n_row} rows, {n_ant} antennas, {n_chan} channels, {n_dir} directions");
        Ok(VisibilityInputs {
            model,
            data,
            weight,
            antenna1,
            antenna2,
            shape: GainShape::new(n_ant, n_chan, n_dir),
        })
    }

    /// The shape of the gains being solved for.
    pub fn shape(&self) -> GainShape {
        self.shape
    }

    pub fn num_rows(&self) -> usize {
        self.model.len_of(Axis(0))
    }

    /// The number of rows every time bin must have.
    pub fn num_baselines(&self) -> usize {
        num_cross_baselines(self.shape.n_ant)
    }

    /// Check that `time_bins` spans these inputs exactly and that every bin
    /// holds one row per cross-correlation baseline.
    pub fn check_time_bins(&self, time_bins: &TimeBins) -> Result<(), InputError> {
        if time_bins.total_rows() != self.num_rows() {
            return Err(InputError::TimeBinRows {
                expected: self.num_rows(),
                got: time_bins.total_rows(),
            });
        }
        let n_bl = self.num_baselines();
        if let Some(bin) = time_bins.iter().find(|b| b.count() != n_bl) {
            return Err(InputError::BaselinesPerBin {
                index: bin.index,
                expected: n_bl,
                got: bin.count(),
            });
        }
        Ok(())
    }

    /// The rows belonging to `bin`.
    pub fn step(&self, bin: &TimeBin) -> VisibilityStep<'_> {
        let range = bin.range.clone();
        VisibilityStep {
            model: self.model.slice(s![range.clone(), .., ..]),
            data: self.data.slice(s![range.clone(), ..]),
            weight: self.weight.slice(s![range.clone(), ..]),
            antenna1: &self.antenna1[range.clone()],
            antenna2: &self.antenna2[range],
        }
    }
}

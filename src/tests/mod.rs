// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpful functions for tests: noiseless synthetic observations.

use ndarray::prelude::*;

use crate::{c64, TimeBins, VisibilityInputs};

/// A noiseless synthetic observation. Every time step has one row per
/// cross-correlation baseline, ordered (0, 1), (0, 2), ..., (n-2, n-1).
pub(crate) struct Synthetic {
    pub(crate) n_ant: usize,
    pub(crate) n_chan: usize,
    pub(crate) n_dir: usize,
    pub(crate) n_time: usize,

    /// (row, channel, direction)
    pub(crate) model: Array3<c64>,
    /// (row, channel)
    pub(crate) data: Array2<c64>,
    /// (row, channel)
    pub(crate) weight: Array2<f64>,
    pub(crate) antenna1: Vec<usize>,
    pub(crate) antenna2: Vec<usize>,
    /// (time, antenna, channel, direction)
    pub(crate) true_gains: Array4<c64>,
    pub(crate) time_bins: TimeBins,
}

impl Synthetic {
    /// Data are made from the true gains and the model:
    /// `V_pq = sum_s g_p M_pq conj(g_q)`.
    pub(crate) fn new<G, M>(
        n_ant: usize,
        n_chan: usize,
        n_dir: usize,
        n_time: usize,
        gain_fn: G,
        model_fn: M,
    ) -> Synthetic
    where
        G: Fn(usize, usize, usize, usize) -> c64,
        M: Fn(usize, usize, usize) -> c64,
    {
        let n_bl = n_ant * (n_ant - 1) / 2;
        let n_row = n_bl * n_time;
        let (antenna1, antenna2): (Vec<usize>, Vec<usize>) = (0..n_time)
            .flat_map(|_| (0..n_ant).flat_map(move |p| (p + 1..n_ant).map(move |q| (p, q))))
            .unzip();

        let true_gains = Array4::from_shape_fn((n_time, n_ant, n_chan, n_dir), |(t, a, nu, s)| {
            gain_fn(t, a, nu, s)
        });
        let model = Array3::from_shape_fn((n_row, n_chan, n_dir), |(row, nu, s)| model_fn(row, nu, s));
        let data = Array2::from_shape_fn((n_row, n_chan), |(row, nu)| {
            let t = row / n_bl;
            let (p, q) = (antenna1[row], antenna2[row]);
            (0..n_dir)
                .map(|s| {
                    true_gains[(t, p, nu, s)] * model[(row, nu, s)] * true_gains[(t, q, nu, s)].conj()
                })
                .sum::<c64>()
        });
        let weight = Array2::ones((n_row, n_chan));
        let time_bins = TimeBins::uniform(n_time, n_bl).unwrap();

        Synthetic {
            n_ant,
            n_chan,
            n_dir,
            n_time,
            model,
            data,
            weight,
            antenna1,
            antenna2,
            true_gains,
            time_bins,
        }
    }

    /// Unit gains and unit model visibilities.
    pub(crate) fn unity(n_ant: usize, n_chan: usize, n_dir: usize, n_time: usize) -> Synthetic {
        Synthetic::new(
            n_ant,
            n_chan,
            n_dir,
            n_time,
            |_, _, _, _| c64::new(1.0, 0.0),
            |_, _, _| c64::new(1.0, 0.0),
        )
    }

    /// Smoothly-varying, non-trivial gains and model visibilities.
    pub(crate) fn varied(n_ant: usize, n_chan: usize, n_dir: usize, n_time: usize) -> Synthetic {
        Synthetic::new(
            n_ant,
            n_chan,
            n_dir,
            n_time,
            |t, a, nu, s| {
                let x = (a + 2 * nu + 3 * s) as f64 + 0.05 * t as f64;
                c64::from_polar(1.0 + 0.1 * x.sin(), 0.3 * (0.7 * x).cos())
            },
            |row, nu, s| {
                let x = (row + nu) as f64 * 0.37 + s as f64;
                c64::new(1.0 + 0.5 * x.cos(), 0.25 * x.sin())
            },
        )
    }

    pub(crate) fn inputs(&self) -> VisibilityInputs<'_> {
        VisibilityInputs::new(
            self.model.view(),
            self.data.view(),
            self.weight.view(),
            &self.antenna1,
            &self.antenna2,
        )
        .unwrap()
    }

    /// The true gains of time step `t` with dimensions (antenna, channel,
    /// direction).
    pub(crate) fn gains_at(&self, t: usize) -> ArrayView3<c64> {
        self.true_gains.slice(s![t, .., .., ..])
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::*;
use ndarray::prelude::*;

use kalcal::{
    c64, FilterAlgorithm, FilterDirection, FilterOptions, JacobianInputs, KalmanFilter,
    KalmanSmoother, TimeBins, VisibilityInputs,
};

/// Noiseless visibilities of slowly-varying gains: (model, data, weight,
/// antenna1, antenna2, gains).
#[allow(clippy::type_complexity)]
fn synthetic(
    n_ant: usize,
    n_chan: usize,
    n_dir: usize,
    n_time: usize,
) -> (
    Array3<c64>,
    Array2<c64>,
    Array2<f64>,
    Vec<usize>,
    Vec<usize>,
    Array4<c64>,
) {
    let n_bl = n_ant * (n_ant - 1) / 2;
    let n_row = n_bl * n_time;
    let (antenna1, antenna2): (Vec<usize>, Vec<usize>) = (0..n_time)
        .flat_map(|_| (0..n_ant).flat_map(move |p| (p + 1..n_ant).map(move |q| (p, q))))
        .unzip();
    let gains = Array4::from_shape_fn((n_time, n_ant, n_chan, n_dir), |(t, a, nu, s)| {
        let x = (a + nu + s) as f64 + 0.01 * t as f64;
        c64::from_polar(1.0 + 0.1 * x.sin(), 0.2 * x.cos())
    });
    let model = Array3::from_shape_fn((n_row, n_chan, n_dir), |(row, nu, s)| {
        c64::new(1.0 + 0.1 * ((row + nu + s) as f64).cos(), 0.0)
    });
    let data = Array2::from_shape_fn((n_row, n_chan), |(row, nu)| {
        let t = row / n_bl;
        let (p, q) = (antenna1[row], antenna2[row]);
        (0..n_dir)
            .map(|s| gains[(t, p, nu, s)] * model[(row, nu, s)] * gains[(t, q, nu, s)].conj())
            .sum::<c64>()
    });
    let weight = Array2::ones((n_row, n_chan));
    (model, data, weight, antenna1, antenna2, gains)
}

fn jacobian(c: &mut Criterion) {
    let (n_ant, n_chan, n_dir) = (32, 4, 2);
    let (model, _, weight, antenna1, antenna2, gains) = synthetic(n_ant, n_chan, n_dir, 1);
    let mut augmented = Array4::zeros((n_ant, n_chan, n_dir, 2));
    augmented
        .slice_mut(s![.., .., .., 0])
        .assign(&gains.slice(s![0, .., .., ..]));
    augmented
        .slice_mut(s![.., .., .., 1])
        .assign(&gains.slice(s![0, .., .., ..]).mapv(|g| g.conj()));
    let inputs = JacobianInputs::new(
        model.view(),
        weight.view(),
        augmented.view(),
        &antenna1,
        &antenna2,
    )
    .unwrap();

    let mut group = c.benchmark_group("jacobian");
    group.bench_function("coo", |b| b.iter(|| inputs.build_coo()));
    group.bench_function("csr", |b| b.iter(|| inputs.build_csr()));
    group.bench_function("dense", |b| b.iter(|| inputs.build_dense()));
    group.finish();
}

fn filter_and_smoother(c: &mut Criterion) {
    let (n_ant, n_chan, n_dir, n_time) = (10, 2, 1, 20);
    let (model, data, weight, antenna1, antenna2, _) = synthetic(n_ant, n_chan, n_dir, n_time);
    let inputs = VisibilityInputs::new(
        model.view(),
        data.view(),
        weight.view(),
        &antenna1,
        &antenna2,
    )
    .unwrap();
    let time_bins = TimeBins::uniform(n_time, n_ant * (n_ant - 1) / 2).unwrap();
    let state_len = inputs.shape().state_len();
    let num_meas = 2 * n_chan * inputs.num_baselines();
    let prior_mean = Array1::from_elem(state_len, c64::new(1.0, 0.0));
    let prior_cov = Array2::<c64>::eye(state_len);
    let q = Array1::from_elem(state_len, 1e-4);
    let r = Array1::from_elem(num_meas, 0.02);

    let mut group = c.benchmark_group("filter");
    group.sample_size(10);
    for algorithm in [
        FilterAlgorithm::Sparse,
        FilterAlgorithm::Dense,
        FilterAlgorithm::Diagonal,
    ] {
        let filter = KalmanFilter::new(FilterOptions {
            algorithm,
            ..Default::default()
        })
        .unwrap();
        group.bench_function(algorithm.to_string(), |b| {
            b.iter(|| {
                filter
                    .run(
                        &inputs,
                        &time_bins,
                        FilterDirection::Forward,
                        prior_mean.view(),
                        prior_cov.view(),
                        q.view(),
                        r.view(),
                    )
                    .unwrap()
            })
        });
    }
    group.finish();

    let filtered = KalmanFilter::new(FilterOptions::default())
        .unwrap()
        .run(
            &inputs,
            &time_bins,
            FilterDirection::Forward,
            prior_mean.view(),
            prior_cov.view(),
            q.view(),
            r.view(),
        )
        .unwrap();
    let smoother = KalmanSmoother::default();
    c.bench_function("smoother", |b| {
        b.iter(|| smoother.run(&filtered, q.view()).unwrap())
    });
}

criterion_group!(benches, jacobian, filter_and_smoother);
criterion_main!(benches);

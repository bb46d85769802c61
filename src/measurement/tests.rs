// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_measurement_vector_layout() {
    let n_ant = 3;
    let n_chan = 2;
    // 3 baselines, 2 channels.
    let vis = Array2::from_shape_fn((3, n_chan), |(row, nu)| {
        c64::new(row as f64 + 1.0, 10.0 * (nu as f64 + 1.0))
    });
    let weight = Array2::from_shape_fn((3, n_chan), |(row, _)| (row as f64 + 1.0).powi(2));
    let y = measurement_vector(vis.view(), weight.view(), n_ant, n_chan).unwrap();
    assert_eq!(y.len(), n_chan * n_ant * (n_ant - 1));

    for nu in 0..n_chan {
        for row in 0..3 {
            let sqrt_w = row as f64 + 1.0;
            let direct = y[2 * 3 * nu + row];
            let conjugate = y[2 * 3 * nu + row + 3];
            assert_abs_diff_eq!(direct, vis[(row, nu)] * sqrt_w);
            assert_abs_diff_eq!(conjugate, vis[(row, nu)].conj() * sqrt_w);
        }
    }
}

#[test]
fn test_measurement_vector_zero_weight() {
    let vis = Array2::from_elem((1, 1), c64::new(3.0, -4.0));
    let weight = Array2::zeros((1, 1));
    let y = measurement_vector(vis.view(), weight.view(), 2, 1).unwrap();
    assert_abs_diff_eq!(y, Array1::<c64>::zeros(2));
}

#[test]
fn test_measurement_vector_errors() {
    let vis = Array2::<c64>::zeros((3, 2));
    let weight = Array2::<f64>::ones((3, 1));
    assert!(matches!(
        measurement_vector(vis.view(), weight.view(), 3, 2),
        Err(MeasurementError::ShapeMismatch { .. })
    ));

    let weight = Array2::<f64>::ones((3, 2));
    assert!(matches!(
        measurement_vector(vis.view(), weight.view(), 3, 4),
        Err(MeasurementError::Channels {
            expected: 4,
            got: 2
        })
    ));
    assert!(matches!(
        measurement_vector(vis.view(), weight.view(), 4, 2),
        Err(MeasurementError::Rows {
            expected: 6,
            got: 3
        })
    ));
}

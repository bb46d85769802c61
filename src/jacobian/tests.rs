// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::{
    gains::{augment, true_gains_vector},
    measurement::measurement_vector,
    tests::Synthetic,
};

/// The Jacobian inputs of time step `t`, linearised at the true gains.
fn step_inputs<'a>(
    syn: &'a Synthetic,
    gains: &'a Array4<c64>,
    t: usize,
) -> JacobianInputs<'a> {
    let n_bl = syn.n_ant * (syn.n_ant - 1) / 2;
    let rows = t * n_bl..(t + 1) * n_bl;
    JacobianInputs::new(
        syn.model.slice(s![rows.clone(), .., ..]),
        syn.weight.slice(s![rows.clone(), ..]),
        gains.view(),
        &syn.antenna1[rows.clone()],
        &syn.antenna2[rows],
    )
    .unwrap()
}

#[test]
fn test_jacobian_dimensions_grid() {
    for n_ant in 2..6 {
        for n_chan in 1..4 {
            for n_dir in 1..3 {
                let syn = Synthetic::varied(n_ant, n_chan, n_dir, 1);
                let gains = augment(syn.gains_at(0));
                let inputs = step_inputs(&syn, &gains, 0);

                let expected_dim = (
                    n_chan * n_ant * (n_ant - 1),
                    2 * n_chan * n_dir * n_ant,
                );
                let expected_nnz = 2 * n_chan * n_dir * n_ant * (n_ant - 1);
                assert_eq!(inputs.dim(), expected_dim);
                assert_eq!(inputs.num_entries(), expected_nnz);

                let coo = inputs.build_coo();
                assert_eq!(coo.shape(), expected_dim);
                assert_eq!(coo.nnz(), expected_nnz);

                let csr = inputs.build_csr();
                assert_eq!(csr.shape(), expected_dim);
                assert_eq!(csr.nnz(), expected_nnz);
                assert_eq!(csr.count_nonzero(), expected_nnz);

                let dense = inputs.build_dense();
                assert_eq!(dense.dim(), expected_dim);
                assert_eq!(
                    dense.iter().filter(|v| v.norm_sqr() > 0.0).count(),
                    expected_nnz
                );
            }
        }
    }
}

#[test]
fn test_jacobian_constructions_agree() {
    let syn = Synthetic::varied(5, 3, 2, 2);
    let gains = augment(syn.gains_at(1));
    let inputs = step_inputs(&syn, &gains, 1);

    let coo = inputs.build_coo();
    let csr = inputs.build_csr();
    let dense = inputs.build_dense();

    assert_abs_diff_eq!(coo.to_dense(), dense, epsilon = 1e-14);
    assert_abs_diff_eq!(csr.to_dense(), dense, epsilon = 1e-14);

    // Converting the triplets gives exactly the directly-built structure.
    let converted = coo.to_csr();
    assert_eq!(converted.row_offsets(), csr.row_offsets());
    assert_eq!(converted.col_indices(), csr.col_indices());
    assert_abs_diff_eq!(
        Array1::from(converted.values().to_vec()),
        Array1::from(csr.values().to_vec()),
        epsilon = 1e-14
    );
}

#[test]
fn test_csr_rows_are_sorted() {
    let syn = Synthetic::varied(4, 2, 3, 1);
    let gains = augment(syn.gains_at(0));
    let csr = step_inputs(&syn, &gains, 0).build_csr();
    for i in 0..csr.shape().0 {
        let (cols, _) = csr.row(i);
        assert_eq!(cols.len(), 6);
        assert!(cols.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_measurement_equation_identity() {
    let syn = Synthetic::varied(6, 2, 2, 3);
    for t in 0..syn.n_time {
        let gains = augment(syn.gains_at(t));
        let inputs = step_inputs(&syn, &gains, t);
        let x = true_gains_vector(syn.gains_at(t));

        let n_bl = syn.n_ant * (syn.n_ant - 1) / 2;
        let rows = t * n_bl..(t + 1) * n_bl;
        let y = measurement_vector(
            syn.data.slice(s![rows.clone(), ..]),
            syn.weight.slice(s![rows, ..]),
            syn.n_ant,
            syn.n_chan,
        )
        .unwrap();

        let coo_dense = inputs.build_coo().to_dense();
        let csr = inputs.build_csr();
        let dense = inputs.build_dense();
        assert_abs_diff_eq!(coo_dense.dot(&x), y, epsilon = 1e-5);
        assert_abs_diff_eq!(JacobianOperator::dot(&csr, x.view()), y, epsilon = 1e-5);
        assert_abs_diff_eq!(JacobianOperator::dot(&dense, x.view()), y, epsilon = 1e-5);
    }
}

#[test]
fn test_operator_implementations_agree() {
    let syn = Synthetic::varied(4, 2, 2, 1);
    let gains = augment(syn.gains_at(0));
    let inputs = step_inputs(&syn, &gains, 0);
    let csr = inputs.build_csr();
    let dense = inputs.build_dense();
    let (n_rows, n_cols) = inputs.dim();

    let v = Array1::from_shape_fn(n_rows, |i| c64::new(i as f64 * 0.1, 1.0 - i as f64 * 0.05));
    let r = Array1::from_shape_fn(n_rows, |i| 1.0 + (i % 3) as f64);

    assert_abs_diff_eq!(csr.adjoint_dot(v.view()), dense.adjoint_dot(v.view()), epsilon = 1e-12);
    assert_abs_diff_eq!(
        csr.weighted_gram(r.view()),
        dense.weighted_gram(r.view()),
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(csr.gram_diagonal(), dense.gram_diagonal(), epsilon = 1e-12);

    // The Gram diagonal is the real part of the unweighted Gram matrix's
    // diagonal.
    let gram = dense.weighted_gram(Array1::<f64>::ones(n_rows).view());
    assert_eq!(gram.dim(), (n_cols, n_cols));
    for (g, d) in gram.diag().iter().zip(dense.gram_diagonal().iter()) {
        assert_abs_diff_eq!(g.re, *d, epsilon = 1e-12);
        assert_abs_diff_eq!(g.im, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_coo_hstack_and_scale() {
    let left = CooMatrix::from_triplets((2, 2), vec![0, 1], vec![1, 0], vec![c64::new(2.0, 0.0); 2]);
    let right = CooMatrix::from_triplets((2, 3), vec![1], vec![2], vec![c64::new(0.0, 4.0)]);
    let stacked = left.hstack(right).scale(0.5);
    assert_eq!(stacked.shape(), (2, 5));
    assert_eq!(stacked.nnz(), 3);
    let dense = stacked.to_dense();
    assert_abs_diff_eq!(dense[(0, 1)], c64::new(1.0, 0.0));
    assert_abs_diff_eq!(dense[(1, 0)], c64::new(1.0, 0.0));
    assert_abs_diff_eq!(dense[(1, 4)], c64::new(0.0, 2.0));
}

#[test]
fn test_coo_to_csr_sums_duplicates() {
    let coo = CooMatrix::from_triplets(
        (2, 2),
        vec![1, 0, 1],
        vec![1, 0, 1],
        vec![c64::new(1.0, 0.0), c64::new(3.0, 0.0), c64::new(0.5, 0.5)],
    );
    let csr = coo.to_csr();
    assert_eq!(csr.nnz(), 2);
    assert_eq!(csr.row_offsets(), &[0, 1, 2]);
    assert_abs_diff_eq!(csr.to_dense(), coo.to_dense());
}

#[test]
fn test_jacobian_dimension_errors() {
    let syn = Synthetic::unity(4, 2, 1, 2);
    let gains = augment(syn.gains_at(0));

    // Two time steps' worth of rows.
    let result = JacobianInputs::new(
        syn.model.view(),
        syn.weight.view(),
        gains.view(),
        &syn.antenna1,
        &syn.antenna2,
    );
    assert!(matches!(
        result,
        Err(JacobianError::DimensionMismatch { array: "model", .. })
    ));

    let result = JacobianInputs::new(
        syn.model.slice(s![..6, .., ..]),
        syn.weight.slice(s![..6, ..1]),
        gains.view(),
        &syn.antenna1[..6],
        &syn.antenna2[..6],
    );
    assert!(matches!(
        result,
        Err(JacobianError::DimensionMismatch { array: "weight", .. })
    ));

    let unaugmented = gains.slice(s![.., .., .., ..1]);
    let result = JacobianInputs::new(
        syn.model.slice(s![..6, .., ..]),
        syn.weight.slice(s![..6, ..]),
        unaugmented,
        &syn.antenna1[..6],
        &syn.antenna2[..6],
    );
    assert!(matches!(
        result,
        Err(JacobianError::DimensionMismatch { array: "jones", .. })
    ));

    let mut antenna2 = syn.antenna2[..6].to_vec();
    antenna2[3] = 1;
    let result = JacobianInputs::new(
        syn.model.slice(s![..6, .., ..]),
        syn.weight.slice(s![..6, ..]),
        gains.view(),
        &syn.antenna1[..6],
        &antenna2,
    );
    assert!(matches!(
        result,
        Err(JacobianError::Autocorrelation { row: 3, ant: 1 })
    ));

    antenna2[3] = 9;
    let result = JacobianInputs::new(
        syn.model.slice(s![..6, .., ..]),
        syn.weight.slice(s![..6, ..]),
        gains.view(),
        &syn.antenna1[..6],
        &antenna2,
    );
    assert!(matches!(
        result,
        Err(JacobianError::AntennaIndex {
            row: 3,
            ant: 9,
            n_ant: 4
        })
    ));
}

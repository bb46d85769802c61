// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::*;
use crate::tests::Synthetic;

#[test]
fn test_inputs_infer_num_antennas() {
    let syn = Synthetic::unity(5, 2, 1, 3);
    let inputs = syn.inputs();
    assert_eq!(inputs.shape(), GainShape::new(5, 2, 1));
    assert_eq!(inputs.num_rows(), 30);
    assert_eq!(inputs.num_baselines(), 10);
    inputs.check_time_bins(&syn.time_bins).unwrap();
}

#[test]
fn test_inputs_step_slices_rows() {
    let syn = Synthetic::varied(4, 3, 2, 3);
    let inputs = syn.inputs();
    let bin = syn.time_bins.as_slice()[1].clone();
    let step = inputs.step(&bin);
    assert_eq!(step.model.dim(), (6, 3, 2));
    assert_eq!(step.data.dim(), (6, 3));
    assert_eq!(step.weight.dim(), (6, 3));
    assert_eq!(step.antenna1, &syn.antenna1[6..12]);
    assert_eq!(step.antenna2, &syn.antenna2[6..12]);
    assert_eq!(step.model[(0, 1, 1)], syn.model[(6, 1, 1)]);
    assert_eq!(step.data[(5, 2)], syn.data[(11, 2)]);
}

#[test]
fn test_inputs_shape_mismatch() {
    let syn = Synthetic::unity(3, 2, 1, 2);
    let short_weight = syn.weight.slice(s![..5, ..]);
    let result = VisibilityInputs::new(
        syn.model.view(),
        syn.data.view(),
        short_weight,
        &syn.antenna1,
        &syn.antenna2,
    );
    assert!(matches!(
        result,
        Err(InputError::ShapeMismatch {
            array: "weight",
            ..
        })
    ));

    let result = VisibilityInputs::new(
        syn.model.view(),
        syn.data.view(),
        syn.weight.view(),
        &syn.antenna1[1..],
        &syn.antenna2,
    );
    assert!(matches!(
        result,
        Err(InputError::ShapeMismatch {
            array: "antenna1",
            ..
        })
    ));
}

#[test]
fn test_inputs_bad_antennas() {
    let syn = Synthetic::unity(3, 1, 1, 1);
    let result = VisibilityInputs::with_num_antennas(
        syn.model.view(),
        syn.data.view(),
        syn.weight.view(),
        &syn.antenna1,
        &syn.antenna2,
        2,
    );
    assert!(matches!(
        result,
        Err(InputError::AntennaIndex {
            row: 1,
            ant: 2,
            n_ant: 2
        })
    ));

    let antenna2 = vec![1, 0, 2];
    let result = VisibilityInputs::new(
        syn.model.view(),
        syn.data.view(),
        syn.weight.view(),
        &syn.antenna1,
        &antenna2,
    );
    assert!(matches!(
        result,
        Err(InputError::Autocorrelation { row: 1, ant: 0 })
    ));
}

#[test]
fn test_inputs_bad_weights() {
    let syn = Synthetic::unity(3, 1, 1, 1);
    let mut weight = syn.weight.clone();
    weight[(2, 0)] = -1.0;
    let result = VisibilityInputs::new(
        syn.model.view(),
        syn.data.view(),
        weight.view(),
        &syn.antenna1,
        &syn.antenna2,
    );
    assert!(matches!(result, Err(InputError::InvalidWeight { row: 2 })));
}

#[test]
fn test_inputs_bad_time_bins() {
    let syn = Synthetic::unity(4, 1, 1, 2);
    let inputs = syn.inputs();

    let bins = TimeBins::uniform(3, 6).unwrap();
    assert!(matches!(
        inputs.check_time_bins(&bins),
        Err(InputError::TimeBinRows {
            expected: 12,
            got: 18
        })
    ));

    let bins = TimeBins::from_indices_and_counts(&[0, 5], &[5, 7]).unwrap();
    assert!(matches!(
        inputs.check_time_bins(&bins),
        Err(InputError::BaselinesPerBin {
            index: 0,
            expected: 6,
            got: 5
        })
    ));
}

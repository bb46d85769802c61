// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_num_cross_baselines() {
    assert_eq!(num_cross_baselines(0), 0);
    assert_eq!(num_cross_baselines(1), 0);
    assert_eq!(num_cross_baselines(2), 1);
    assert_eq!(num_cross_baselines(7), 21);
    assert_eq!(num_cross_baselines(128), 8128);
}

#[test]
fn test_invert_complex_matrix() {
    let m = array![
        [c64::new(2.0, 1.0), c64::new(0.5, -0.25)],
        [c64::new(-1.0, 0.0), c64::new(3.0, 2.0)]
    ];
    let inv = invert(m.view()).unwrap();
    let identity = m.dot(&inv);
    assert_abs_diff_eq!(identity, Array2::<c64>::eye(2), epsilon = 1e-12);
}

#[test]
fn test_invert_singular_matrix() {
    let m = array![
        [c64::new(1.0, 0.0), c64::new(2.0, 0.0)],
        [c64::new(2.0, 0.0), c64::new(4.0, 0.0)]
    ];
    assert!(invert(m.view()).is_none());
}

#[test]
fn test_is_diagonal() {
    let mut m = diagonal_matrix(array![1.0, 2.0, 3.0].view());
    assert!(is_diagonal(m.view()));
    assert_abs_diff_eq!(real_diagonal(m.view()), array![1.0, 2.0, 3.0]);

    m[(0, 2)] = c64::new(0.0, 1e-20);
    assert!(!is_diagonal(m.view()));
}

#[test]
fn test_hermitian() {
    let m = array![[c64::new(1.0, 2.0), c64::new(3.0, 4.0)]];
    let h = hermitian(m.view());
    assert_eq!(h.dim(), (2, 1));
    assert_eq!(h[(1, 0)], c64::new(3.0, -4.0));
}

#[test]
fn test_first_invalid_variance() {
    assert_eq!(first_invalid_variance(array![0.0, 1.0].view()), None);
    assert_eq!(
        first_invalid_variance(array![0.0, -1e-3, 2.0].view()),
        Some((1, -1e-3))
    );
    assert!(first_invalid_variance(array![f64::NAN].view()).is_some());
}

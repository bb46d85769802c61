// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Minimal complex sparse matrices: just enough for the Jacobian.

use itertools::Itertools;
use ndarray::prelude::*;
use num_traits::Zero;

use crate::c64;

/// A sparse matrix in triplet (coordinate) form. Duplicate coordinates are
/// allowed and are summed when converting to other forms.
#[derive(Debug, Clone, PartialEq)]
pub struct CooMatrix {
    shape: (usize, usize),
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<c64>,
}

impl CooMatrix {
    pub(crate) fn from_triplets(
        shape: (usize, usize),
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<c64>,
    ) -> CooMatrix {
        debug_assert_eq!(rows.len(), cols.len());
        debug_assert_eq!(rows.len(), values.len());
        debug_assert!(rows.iter().all(|&r| r < shape.0));
        debug_assert!(cols.iter().all(|&c| c < shape.1));
        CooMatrix {
            shape,
            rows,
            cols,
            values,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// The number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    pub fn values(&self) -> &[c64] {
        &self.values
    }

    /// Iterate over (row, column, value) triplets in storage order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, c64)> + '_ {
        self.rows
            .iter()
            .zip(self.cols.iter())
            .zip(self.values.iter())
            .map(|((&r, &c), &v)| (r, c, v))
    }

    /// Place `other` to the right of `self`. Both must have the same number of
    /// rows.
    pub(crate) fn hstack(self, other: CooMatrix) -> CooMatrix {
        assert_eq!(
            self.shape.0, other.shape.0,
            "hstack needs matrices with the same number of rows"
        );
        let col_offset = self.shape.1;
        let shape = (self.shape.0, self.shape.1 + other.shape.1);
        let CooMatrix {
            mut rows,
            mut cols,
            mut values,
            ..
        } = self;
        rows.extend(other.rows);
        cols.extend(other.cols.into_iter().map(|c| c + col_offset));
        values.extend(other.values);
        CooMatrix {
            shape,
            rows,
            cols,
            values,
        }
    }

    /// Multiply every entry by `factor`.
    pub fn scale(mut self, factor: f64) -> CooMatrix {
        self.values.iter_mut().for_each(|v| *v *= factor);
        self
    }

    /// Convert to compressed-row form. Entries within a row are sorted by
    /// column and duplicates are summed.
    pub fn to_csr(&self) -> CsrMatrix {
        let mut row_offsets = vec![0; self.shape.0 + 1];
        let mut col_indices = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());

        let sorted = self
            .triplets()
            .sorted_unstable_by_key(|&(r, c, _)| (r, c))
            .coalesce(|a, b| {
                if (a.0, a.1) == (b.0, b.1) {
                    Ok((a.0, a.1, a.2 + b.2))
                } else {
                    Err((a, b))
                }
            });
        for (r, c, v) in sorted {
            row_offsets[r + 1] += 1;
            col_indices.push(c);
            values.push(v);
        }
        for i in 0..self.shape.0 {
            row_offsets[i + 1] += row_offsets[i];
        }

        CsrMatrix::from_raw_parts(self.shape, row_offsets, col_indices, values)
    }

    pub fn to_dense(&self) -> Array2<c64> {
        let mut dense = Array2::zeros(self.shape);
        for (r, c, v) in self.triplets() {
            dense[(r, c)] += v;
        }
        dense
    }
}

/// A sparse matrix in compressed-row form.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    shape: (usize, usize),
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<c64>,
}

impl CsrMatrix {
    pub(crate) fn from_raw_parts(
        shape: (usize, usize),
        row_offsets: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<c64>,
    ) -> CsrMatrix {
        debug_assert_eq!(row_offsets.len(), shape.0 + 1);
        debug_assert_eq!(row_offsets.last().copied(), Some(values.len()));
        debug_assert_eq!(col_indices.len(), values.len());
        CsrMatrix {
            shape,
            row_offsets,
            col_indices,
            values,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// The number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &[c64] {
        &self.values
    }

    /// The column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[c64]) {
        let range = self.row_offsets[i]..self.row_offsets[i + 1];
        (&self.col_indices[range.clone()], &self.values[range])
    }

    pub fn to_dense(&self) -> Array2<c64> {
        let mut dense = Array2::zeros(self.shape);
        for (i, mut dense_row) in dense.outer_iter_mut().enumerate() {
            let (cols, values) = self.row(i);
            for (&c, &v) in cols.iter().zip(values) {
                dense_row[c] += v;
            }
        }
        dense
    }

    /// The number of stored entries that aren't zero.
    pub fn count_nonzero(&self) -> usize {
        self.values.iter().filter(|v| !v.is_zero()).count()
    }
}

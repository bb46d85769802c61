// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Time bins: contiguous runs of measurement rows sharing the same timestamp.
//! Each bin is one step of the filter and smoother.

mod error;

pub use error::TimeBinError;

use std::ops::Range;

use itertools::Itertools;
use log::trace;
use vec1::Vec1;

use crate::calibrate::FilterDirection;

/// A contiguous run of rows belonging to a single timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBin {
    /// The chronological index of this bin (0 is the earliest).
    pub index: usize,

    /// The rows of the (row-major) input arrays that belong to this bin.
    pub range: Range<usize>,
}

impl TimeBin {
    /// The number of rows in this bin.
    pub fn count(&self) -> usize {
        self.range.len()
    }
}

/// All of the time bins of an observation, in chronological order. There is
/// always at least one bin, the bins are contiguous and no bin is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBins(Vec1<TimeBin>);

impl TimeBins {
    /// Make time bins from the first row index and row count of each bin.
    pub fn from_indices_and_counts(
        indices: &[usize],
        counts: &[usize],
    ) -> Result<TimeBins, TimeBinError> {
        if indices.len() != counts.len() {
            return Err(TimeBinError::LengthMismatch {
                indices: indices.len(),
                counts: counts.len(),
            });
        }

        let mut expected_start = 0;
        let mut bins = Vec::with_capacity(indices.len());
        for (index, (&start, &count)) in indices.iter().zip(counts.iter()).enumerate() {
            if count == 0 {
                return Err(TimeBinError::EmptyBin { index });
            }
            if start != expected_start {
                return Err(TimeBinError::NotContiguous {
                    index,
                    expected: expected_start,
                    got: start,
                });
            }
            bins.push(TimeBin {
                index,
                range: start..start + count,
            });
            expected_start = start + count;
        }

        Vec1::try_from_vec(bins)
            .map(TimeBins)
            .map_err(|_| TimeBinError::NoBins)
    }

    /// Make time bins from per-row timestamps. Rows must be ordered by time;
    /// a timestamp that reappears after a different one is an error.
    pub fn from_timestamps(timestamps: &[f64]) -> Result<TimeBins, TimeBinError> {
        if let Some(row) = timestamps.iter().position(|t| !t.is_finite()) {
            return Err(TimeBinError::NonFiniteTimestamp { row });
        }

        let mut indices = vec![];
        let mut counts = vec![];
        let mut start = 0;
        let mut previous: Option<f64> = None;
        for (count, &timestamp) in timestamps.iter().dedup_with_count() {
            if let Some(previous) = previous {
                if timestamp <= previous {
                    return Err(TimeBinError::NotSorted { row: start });
                }
            }
            indices.push(start);
            counts.push(count);
            start += count;
            previous = Some(timestamp);
        }
        trace!("Found {} time bins in {} rows", indices.len(), timestamps.len());

        TimeBins::from_indices_and_counts(&indices, &counts)
    }

    /// Make `num_bins` bins each with `rows_per_bin` rows.
    pub fn uniform(num_bins: usize, rows_per_bin: usize) -> Result<TimeBins, TimeBinError> {
        let indices = (0..num_bins).map(|i| i * rows_per_bin).collect::<Vec<_>>();
        let counts = vec![rows_per_bin; num_bins];
        TimeBins::from_indices_and_counts(&indices, &counts)
    }

    /// The number of bins (time steps).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The total number of rows spanned by all bins.
    pub fn total_rows(&self) -> usize {
        self.0.last().range.end
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeBin> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TimeBin] {
        self.0.as_slice()
    }

    /// The bins in the order a filter travelling in `direction` visits them.
    pub fn in_direction(&self, direction: FilterDirection) -> Vec<TimeBin> {
        match direction {
            FilterDirection::Forward => self.0.iter().cloned().collect(),
            FilterDirection::Backward => self.0.iter().rev().cloned().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TimeBins {
    type Item = &'a TimeBin;
    type IntoIter = std::slice::Iter<'a, TimeBin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

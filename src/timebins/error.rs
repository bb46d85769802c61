// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeBinError {
    #[error("No time bins were supplied")]
    NoBins,

    #[error("Got {indices} time-bin indices but {counts} time-bin counts")]
    LengthMismatch { indices: usize, counts: usize },

    #[error("Time bin {index} has no rows")]
    EmptyBin { index: usize },

    #[error("Time bin {index} starts at row {got}, but the previous bin ended at row {expected}; time bins must be contiguous and ordered")]
    NotContiguous {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("Timestamps are not sorted; row {row} is earlier than or repeats a previous timestamp")]
    NotSorted { row: usize },

    #[error("The timestamp on row {row} is not finite")]
    NonFiniteTimestamp { row: usize },
}

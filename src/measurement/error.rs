// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("Visibilities have shape {vis:?}, but weights have shape {weight:?}")]
    ShapeMismatch {
        vis: (usize, usize),
        weight: (usize, usize),
    },

    #[error("Expected {expected} channels of visibilities, but got {got}")]
    Channels { expected: usize, got: usize },

    #[error("Expected one row per baseline ({expected}) in the time step, but got {got}")]
    Rows { expected: usize, got: usize },
}

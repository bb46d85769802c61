// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GainShapeError {
    #[error("Gain tensors need an augmentation axis of length 2, but got {got}")]
    Augmentation { got: usize },

    #[error("Expected a state vector of length {expected}, but got {got}")]
    VectorLength { expected: usize, got: usize },
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conversion between gain tensors and flat, conjugate-augmented state
//! vectors.
//!
//! A gain tensor has dimensions (antenna, channel, direction, augmentation),
//! where the augmentation axis has length 2: slot 0 holds the gains and slot 1
//! holds the "conjugate" gains. The flat vector is laid out so that the gain
//! of antenna `a`, channel `nu` and direction `s` lives at
//! `a + n_ant * s + n_ant * n_dir * nu`, with the conjugate slot at the same
//! offset in the second half. The Jacobian's columns use exactly the same
//! ordering.

mod error;

pub use error::GainShapeError;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::c64;

/// The dimensions of a gain tensor (excluding the augmentation axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainShape {
    pub n_ant: usize,
    pub n_chan: usize,
    pub n_dir: usize,
}

impl GainShape {
    pub fn new(n_ant: usize, n_chan: usize, n_dir: usize) -> GainShape {
        GainShape {
            n_ant,
            n_chan,
            n_dir,
        }
    }

    /// Get the shape of a gain tensor; the last axis must have length 2.
    pub fn from_tensor(tensor: ArrayView4<c64>) -> Result<GainShape, GainShapeError> {
        let (n_ant, n_chan, n_dir, n_aug) = tensor.dim();
        if n_aug != 2 {
            return Err(GainShapeError::Augmentation { got: n_aug });
        }
        Ok(GainShape::new(n_ant, n_chan, n_dir))
    }

    /// The number of gains in one half of the state vector.
    pub fn half_len(&self) -> usize {
        self.n_ant * self.n_chan * self.n_dir
    }

    /// The length of the augmented state vector.
    pub fn state_len(&self) -> usize {
        2 * self.half_len()
    }

    /// The dimensions of a gain tensor with this shape.
    pub fn tensor_dim(&self) -> (usize, usize, usize, usize) {
        (self.n_ant, self.n_chan, self.n_dir, 2)
    }

    /// The index of antenna `ant`, channel `chan` and direction `dir` in the
    /// first half of the state vector.
    #[inline]
    pub fn state_index(&self, ant: usize, chan: usize, dir: usize) -> usize {
        ant + self.n_ant * dir + self.n_ant * self.n_dir * chan
    }

    /// The inverse of [`GainShape::state_index`]; `index` must be smaller than
    /// [`GainShape::half_len`].
    #[inline]
    pub fn tensor_index(&self, index: usize) -> (usize, usize, usize) {
        let ant = index % self.n_ant;
        let dir = (index / self.n_ant) % self.n_dir;
        let chan = index / (self.n_ant * self.n_dir);
        (ant, chan, dir)
    }
}

/// Flatten an augmented gain tensor into a state vector.
pub fn to_vector(tensor: ArrayView4<c64>) -> Result<Array1<c64>, GainShapeError> {
    let shape = GainShape::from_tensor(tensor)?;
    Ok(flatten(tensor, shape))
}

/// [`to_vector`] for tensors already known to have an augmentation axis of
/// length 2.
pub(crate) fn flatten(tensor: ArrayView4<c64>, shape: GainShape) -> Array1<c64> {
    debug_assert_eq!(tensor.dim(), shape.tensor_dim());
    let half = shape.half_len();
    Array1::from_shape_fn(shape.state_len(), |i| {
        let (ant, chan, dir) = shape.tensor_index(i % half);
        tensor[(ant, chan, dir, i / half)]
    })
}

/// Reshape a state vector back into an augmented gain tensor.
pub fn to_tensor(
    vector: ArrayView1<c64>,
    shape: GainShape,
) -> Result<Array4<c64>, GainShapeError> {
    if vector.len() != shape.state_len() {
        return Err(GainShapeError::VectorLength {
            expected: shape.state_len(),
            got: vector.len(),
        });
    }
    Ok(unflatten(vector, shape))
}

/// [`to_tensor`] for vectors already known to have the right length.
pub(crate) fn unflatten(vector: ArrayView1<c64>, shape: GainShape) -> Array4<c64> {
    debug_assert_eq!(vector.len(), shape.state_len());
    let half = shape.half_len();
    Array4::from_shape_fn(shape.tensor_dim(), |(ant, chan, dir, aug)| {
        vector[shape.state_index(ant, chan, dir) + aug * half]
    })
}

/// Make an augmented gain tensor out of "true" gains with dimensions
/// (antenna, channel, direction). The second slot holds the conjugates.
pub fn augment(gains: ArrayView3<c64>) -> Array4<c64> {
    let (n_ant, n_chan, n_dir) = gains.dim();
    Array4::from_shape_fn((n_ant, n_chan, n_dir, 2), |(a, nu, s, aug)| {
        let g = gains[(a, nu, s)];
        if aug == 0 {
            g
        } else {
            g.conj()
        }
    })
}

/// The state vector of "true" gains. Useful to check the measurement equation.
pub fn true_gains_vector(gains: ArrayView3<c64>) -> Array1<c64> {
    let (n_ant, n_chan, n_dir) = gains.dim();
    let shape = GainShape::new(n_ant, n_chan, n_dir);
    let half = shape.half_len();
    Array1::from_shape_fn(shape.state_len(), |i| {
        let (ant, chan, dir) = shape.tensor_index(i % half);
        let g = gains[(ant, chan, dir)];
        if i < half {
            g
        } else {
            g.conj()
        }
    })
}

//! A small fixed-width vector type used for particle momenta and field
//! samples: a newtype around a fixed-size array, with only one kind of
//! 3-slot payload rather than a phantom marker distinguishing several.
//!
//! Grid and particle data never need more than three components (the
//! spatial dimension `D` and the B-field dimension `BDIM` of [`crate::dim`]
//! are both at most 3), so rather than a `Vector<const N: usize>` — which
//! would need an associated const (`Dim::BDIM`) in const-generic position,
//! not available on stable Rust — `Vector` is always 3-wide and the unused
//! trailing components are held at zero. `Dim::DIM`/`Dim::BDIM` say how
//! many leading components are meaningful for a given dimension.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use crate::Float;

/// Elementwise arithmetic, implemented by hand rather than via
/// `derive_more`: a bare `[Float; 3]` field has no `Add`/`Sub` impl of its
/// own for `derive_more` to delegate to, so the componentwise behaviour is
/// spelled out directly instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector([Float; 3]);

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        Vector([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        Vector([self.0[0] - rhs.0[0], self.0[1] - rhs.0[1], self.0[2] - rhs.0[2]])
    }
}

impl Mul<Float> for Vector {
    type Output = Vector;
    fn mul(self, rhs: Float) -> Vector {
        Vector([self.0[0] * rhs, self.0[1] * rhs, self.0[2] * rhs])
    }
}

impl Div<Float> for Vector {
    type Output = Vector;
    fn div(self, rhs: Float) -> Vector {
        Vector([self.0[0] / rhs, self.0[1] / rhs, self.0[2] / rhs])
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector([-self.0[0], -self.0[1], -self.0[2]])
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        *self = *self - rhs;
    }
}

impl Vector {
    pub const fn zero() -> Vector {
        Vector([0.0, 0.0, 0.0])
    }

    /// Builds a vector with `n` meaningful leading components drawn from
    /// `comps`, the rest held at zero.
    pub fn from_slice(comps: &[Float]) -> Vector {
        let mut v = [0.0; 3];
        for (dst, src) in v.iter_mut().zip(comps.iter()) {
            *dst = *src;
        }
        Vector(v)
    }

    pub fn dot(&self, other: &Vector) -> Float {
        self.0[0] * other.0[0] + self.0[1] * other.0[1] + self.0[2] * other.0[2]
    }

    pub fn norm2(&self) -> Float {
        self.dot(self)
    }

    pub fn norm(&self) -> Float {
        self.norm2().sqrt()
    }

    pub fn scale(&self, s: Float) -> Vector {
        Vector([self.0[0] * s, self.0[1] * s, self.0[2] * s])
    }

    /// Componentwise product (the "flux factor" pattern: `q * v_cell` per
    /// axis, or a per-axis mirror-sign flip).
    pub fn hadamard(&self, other: &Vector) -> Vector {
        Vector([
            self.0[0] * other.0[0],
            self.0[1] * other.0[1],
            self.0[2] * other.0[2],
        ])
    }

    pub fn as_slice(&self, n: usize) -> &[Float] {
        &self.0[..n]
    }
}

impl From<[Float; 3]> for Vector {
    fn from(v: [Float; 3]) -> Vector {
        Vector(v)
    }
}

impl From<[Float; 2]> for Vector {
    fn from(v: [Float; 2]) -> Vector {
        Vector([v[0], v[1], 0.0])
    }
}

impl From<[Float; 1]> for Vector {
    fn from(v: [Float; 1]) -> Vector {
        Vector([v[0], 0.0, 0.0])
    }
}

impl Index<usize> for Vector {
    type Output = Float;

    fn index(&self, i: usize) -> &Float {
        &self.0[i]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, i: usize) -> &mut Float {
        &mut self.0[i]
    }
}

/// Serialises as a plain 3-element array, a flattened wire representation
/// consistent with how `Particle` itself serialises.
impl Serialize for Vector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Vector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        <[Float; 3]>::deserialize(deserializer).map(Vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_has_zero_norm() {
        assert_eq!(Vector::zero().norm2(), 0.0);
    }

    #[test]
    fn dot_matches_hand_computation() {
        let a = Vector::from([1.0, 2.0, 3.0]);
        let b = Vector::from([4.0, 5.0, 6.0]);
        assert_eq!(a.dot(&b), 32.0);
    }

    #[test]
    fn from_lower_dim_pads_with_zero() {
        let v: Vector = [1.0, 2.0].into();
        assert_eq!(v[2], 0.0);
    }

    #[test]
    fn arithmetic_is_componentwise() {
        let a = Vector::from([1.0, 1.0, 1.0]);
        let b = Vector::from([2.0, 3.0, 4.0]);
        assert_eq!(a + b, Vector::from([3.0, 4.0, 5.0]));
        assert_eq!(b - a, Vector::from([1.0, 2.0, 3.0]));
    }
}

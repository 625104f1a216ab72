//! Compile-time spatial dimension.
//!
//! The spatial dimension is carried as a sealed marker type so that
//! `DIM`/`BDIM` and the dimension-dependent cross/dot rules are resolved at
//! compile time rather than matched on per iteration. `E`/`B`/`J`/`u` are
//! all carried as the fixed-width
//! [`crate::vector::Vector`]; `DIM`/`BDIM` say how many of its three slots
//! are meaningful for a given dimension, the rest being held at zero.

use crate::vector::Vector;
use crate::Float;

mod private {
    pub trait Sealed {}
    impl Sealed for super::D1 {}
    impl Sealed for super::D2 {}
    impl Sealed for super::D3 {}
}

/// A spatial dimension in {1, 2, 3}. `DIM` is the dimension of particle
/// position, E and J; `BDIM` is the dimension of B, which for D<3 lives in
/// the subspace perpendicular to the simulated plane/line (D=1 -> 2,
/// D=2 -> 1, D=3 -> 3).
pub trait Dim: private::Sealed + Copy + Clone + std::fmt::Debug + 'static {
    const DIM: usize;
    const BDIM: usize;

    /// `e × b` lifted to the dimension-appropriate rule: a full 3-vector
    /// cross product in D=3, the in-plane rotation of a D=2 vector by a
    /// scalar out-of-plane field in D=2, and the zero vector in D=1 (cross
    /// products vanish entirely on a line).
    fn cross(e: Vector, b: Vector) -> Vector;

    /// `e · b` lifted across the two (possibly differently-shaped) spaces;
    /// zero unless `DIM == BDIM == 3`, since for D<3 one operand always
    /// lies entirely in the subspace perpendicular to the other.
    fn mixed_dot(e: Vector, b: Vector) -> Float;
}

/// One spatial dimension: a line. B lives in the 2-D subspace
/// perpendicular to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct D1;

/// Two spatial dimensions: a plane. B lives in the 1-D subspace
/// perpendicular to it (the familiar "B_z out of the page").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct D2;

/// Three spatial dimensions: the general case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct D3;

impl Dim for D1 {
    const DIM: usize = 1;
    const BDIM: usize = 2;

    fn cross(_e: Vector, _b: Vector) -> Vector {
        Vector::zero()
    }

    fn mixed_dot(_e: Vector, _b: Vector) -> Float {
        0.0
    }
}

impl Dim for D2 {
    const DIM: usize = 2;
    const BDIM: usize = 1;

    /// In-plane vector crossed with the single out-of-plane B component,
    /// by the right-hand rule: `(e_x, e_y) × b_z = (e_y·b_z, -e_x·b_z)`.
    fn cross(e: Vector, b: Vector) -> Vector {
        let bz = b[0];
        Vector::from([e[1] * bz, -e[0] * bz])
    }

    fn mixed_dot(_e: Vector, _b: Vector) -> Float {
        0.0
    }
}

impl Dim for D3 {
    const DIM: usize = 3;
    const BDIM: usize = 3;

    fn cross(e: Vector, b: Vector) -> Vector {
        Vector::from([
            e[1] * b[2] - e[2] * b[1],
            e[2] * b[0] - e[0] * b[2],
            e[0] * b[1] - e[1] * b[0],
        ])
    }

    fn mixed_dot(e: Vector, b: Vector) -> Float {
        e.dot(&b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d1_cross_vanishes() {
        assert_eq!(D1::cross(Vector::from([1.0]), Vector::from([2.0, 3.0])), Vector::zero());
    }

    #[test]
    fn d2_cross_matches_right_hand_rule() {
        let e = Vector::from([1.0, 0.0]);
        let b = Vector::from([1.0]);
        assert_eq!(D2::cross(e, b), Vector::from([0.0, -1.0]));
    }

    #[test]
    fn d3_cross_matches_standard_basis() {
        let x = Vector::from([1.0, 0.0, 0.0]);
        let y = Vector::from([0.0, 1.0, 0.0]);
        assert_eq!(D3::cross(x, y), Vector::from([0.0, 0.0, 1.0]));
    }

    #[test]
    fn mixed_dot_zero_below_3d() {
        assert_eq!(D1::mixed_dot(Vector::from([1.0]), Vector::from([1.0, 1.0])), 0.0);
        assert_eq!(D2::mixed_dot(Vector::from([1.0, 1.0]), Vector::from([1.0])), 0.0);
    }
}

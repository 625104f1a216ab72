//! Relativistic particle pushers: Boris, Vay, and Higuera-Cary variants of
//! the half-half Lorentz update over `Δt`, all sharing the
//! `k = qΔt/(2m)` scaling and differing only in how the magnetic rotation
//! is applied.

use crate::dim::Dim;
use crate::vector::Vector;
use crate::Float;

/// A relativistic momentum update `u -> u_new` given gathered `E`, `B`, the
/// particle's charge/mass, the timestep, and the speed of light.
pub trait Pusher: Clone + std::fmt::Debug + Send + Sync {
    fn push<Dm: Dim>(&self, u: Vector, e: Vector, b: Vector, charge: Float, mass: Float, dt: Float, c: Float) -> Vector;
}

fn half_impulse(charge: Float, mass: Float, dt: Float) -> Float {
    charge * dt / (2.0 * mass)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boris;

impl Pusher for Boris {
    fn push<Dm: Dim>(&self, u: Vector, e: Vector, b: Vector, charge: Float, mass: Float, dt: Float, c: Float) -> Vector {
        let k = half_impulse(charge, mass, dt);
        let u_minus = u + e.scale(k);
        let gamma_minus = (1.0 + u_minus.norm2() / (c * c)).sqrt();
        let t = b.scale(k / gamma_minus);
        let t_norm2 = cross_self_norm2_fallback::<Dm>(t);
        let rotated = u_minus + Dm::cross(u_minus, t);
        let u_plus = u_minus + Dm::cross(rotated, t).scale(2.0 / (1.0 + t_norm2));
        u_plus + e.scale(k)
    }
}

/// `|t|^2` restricted to the axes that actually carry `B` (`Dm::BDIM`
/// components); `Dim::mixed_dot` is zero below 3-D since it is defined on
/// the `E`/`B` mixed-space pairing, not on `B` alone, so the magnitude of
/// `t` (always a `BDIM`-vector) is taken directly.
fn cross_self_norm2_fallback<Dm: Dim>(t: Vector) -> Float {
    (0..Dm::BDIM).fold(0.0, |acc, d| acc + t[d] * t[d])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vay;

impl Pusher for Vay {
    fn push<Dm: Dim>(&self, u: Vector, e: Vector, b: Vector, charge: Float, mass: Float, dt: Float, c: Float) -> Vector {
        let k = half_impulse(charge, mass, dt);
        let gamma = (1.0 + u.norm2() / (c * c)).sqrt();
        let u_half = u + (e + Dm::cross(u.scale(1.0 / gamma), b)).scale(k);
        let u_prime = u_half + e.scale(k);
        let tau = b.scale(k);
        let tau_norm2 = cross_self_norm2_fallback::<Dm>(tau);
        let u_star = mixed_proj::<Dm>(u_prime, tau) / c;
        let sigma = 1.0 + u_prime.norm2() / (c * c) - tau_norm2;
        let gamma_new2 = (sigma + (sigma * sigma + 4.0 * (tau_norm2 + u_star * u_star)).sqrt()) / 2.0;
        let t = tau.scale(1.0 / gamma_new2.sqrt());
        let t_norm2 = cross_self_norm2_fallback::<Dm>(t);
        (u_prime + t.scale(mixed_proj::<Dm>(u_prime, t)) + Dm::cross(u_prime, t)).scale(1.0 / (1.0 + t_norm2))
    }
}

/// `u' . tau`, where `tau` is a `BDIM`-vector living in the magnetic
/// subspace: the component of `u'` that overlaps `tau`'s axes. Below 3-D
/// this is exactly `Dim::mixed_dot` (zero, since `E`/`u` live in-plane and
/// `B`/`tau` out-of-plane); in 3-D both vectors share the same 3 axes, so
/// it reduces to the ordinary dot product.
fn mixed_proj<Dm: Dim>(u: Vector, tau: Vector) -> Float {
    Dm::mixed_dot(u, tau)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HigueraCary;

impl Pusher for HigueraCary {
    fn push<Dm: Dim>(&self, u: Vector, e: Vector, b: Vector, charge: Float, mass: Float, dt: Float, c: Float) -> Vector {
        let k = half_impulse(charge, mass, dt);
        let u_minus = u + e.scale(k);
        let tau = b.scale(k);
        let tau_norm2 = cross_self_norm2_fallback::<Dm>(tau);
        let u_star = mixed_proj::<Dm>(u_minus, tau) / c;
        let sigma = 1.0 + u_minus.norm2() / (c * c) - tau_norm2;
        let gamma_new2 = (sigma + (sigma * sigma + 4.0 * (tau_norm2 + u_star * u_star)).sqrt()) / 2.0;
        let t = tau.scale(1.0 / gamma_new2.sqrt());
        let t_norm2 = cross_self_norm2_fallback::<Dm>(t);
        let u_plus = (u_minus + t.scale(mixed_proj::<Dm>(u_minus, t)) + Dm::cross(u_minus, t)).scale(1.0 / (1.0 + t_norm2));
        u_plus + e.scale(k) + Dm::cross(u_minus, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::{D1, D3};

    const C: Float = 299_792_458.0;

    #[test]
    fn boris_zero_fields_is_a_no_op() {
        let u = Vector::from([0.1 * C, 0.0, 0.0]);
        let out = Boris.push::<D3>(u, Vector::zero(), Vector::zero(), -1.0, 1.0, 0.01, C);
        assert!((out - u).norm() < 1e-6);
    }

    #[test]
    fn all_pushers_conserve_speed_under_pure_b_field() {
        let u0 = Vector::from([0.2 * C, 0.0, 0.0]);
        let b = Vector::from([0.0, 0.0, 1.0e-3]);
        let dt = 1e-10;
        for pusher_out in [
            Boris.push::<D3>(u0, Vector::zero(), b, -1.6e-19, 9.11e-31, dt, C),
            Vay.push::<D3>(u0, Vector::zero(), b, -1.6e-19, 9.11e-31, dt, C),
            HigueraCary.push::<D3>(u0, Vector::zero(), b, -1.6e-19, 9.11e-31, dt, C),
        ] {
            assert!((pusher_out.norm() - u0.norm()).abs() / u0.norm() < 1e-6);
        }
    }

    #[test]
    fn d1_cross_terms_vanish_so_boris_reduces_to_pure_e_kick() {
        let u0 = Vector::from([0.0]);
        let e = Vector::from([1.0]);
        let b = Vector::from([1.0, 1.0]);
        let out = Boris.push::<D1>(u0, e, b, 1.0, 1.0, 2.0, C);
        // k = q dt / 2m = 1; two kicks of kE with no rotation in between.
        assert!((out[0] - 2.0).abs() < 1e-9);
    }
}

//! Unit systems: anchor the simulation's length/time/mass/current/
//! temperature base units to SI and derive the physical constants the core
//! needs (`c`, `epsilon_zero`, `mu_zero`, `q_e`, `m_e`, `m_p`, `k_B`) in
//! whatever units the simulation was set up in.
//!
//! A PIC run never hard-codes SI values directly: every constant a pusher
//! or evolver touches is expressed in "simulation units", which are free to
//! rescale length/time/mass so that, e.g., a Debye length or a cyclotron
//! period comes out O(1).

use crate::Float;

/// Five independent base units (length, time, mass, current, temperature),
/// each expressed as "how many SI units does 1 simulation unit span".
/// Candela and mole are omitted: a PIC core never needs luminous intensity
/// or amount of substance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSystem {
    length: Float,
    time: Float,
    mass: Float,
    current: Float,
    temperature: Float,
}

impl UnitSystem {
    pub const fn new(
        length_unit: Float,
        time_unit: Float,
        mass_unit: Float,
        current_unit: Float,
        temperature_unit: Float,
    ) -> UnitSystem {
        UnitSystem {
            length: length_unit,
            time: time_unit,
            mass: mass_unit,
            current: current_unit,
            temperature: temperature_unit,
        }
    }

    pub const fn length_unit(&self) -> Float {
        self.length
    }
    pub const fn time_unit(&self) -> Float {
        self.time
    }
    pub const fn mass_unit(&self) -> Float {
        self.mass
    }
    pub const fn current_unit(&self) -> Float {
        self.current
    }
    pub const fn temperature_unit(&self) -> Float {
        self.temperature
    }

    pub const fn charge_unit(&self) -> Float {
        self.current * self.time
    }

    pub const fn si_c() -> Float {
        299_792_458.0
    }

    /// Speed of light, expressed in this unit system.
    pub fn c(&self) -> Float {
        Self::si_c() * self.time / self.length
    }

    pub const fn si_epsilon_zero() -> Float {
        8.854_187_812_8e-12
    }

    /// Vacuum permittivity, expressed in this unit system.
    pub fn epsilon_zero(&self) -> Float {
        Self::si_epsilon_zero() * self.mass * self.length.powi(3)
            / self.current.powi(2)
            / self.time.powi(4)
    }

    pub const fn si_mu_zero() -> Float {
        1.256_637_062_12e-6
    }

    /// Vacuum permeability, expressed in this unit system.
    pub fn mu_zero(&self) -> Float {
        Self::si_mu_zero() * self.time.powi(2) * self.current.powi(2) / self.mass / self.length
    }

    pub const fn si_q_e() -> Float {
        1.602_176_634e-19
    }

    /// Elementary charge, expressed in this unit system.
    pub fn q_e(&self) -> Float {
        Self::si_q_e() / self.current / self.time
    }

    pub const fn si_k_b() -> Float {
        1.380_649e-23
    }

    /// Boltzmann constant, expressed in this unit system.
    pub fn k_b(&self) -> Float {
        Self::si_k_b() * self.temperature * self.time * self.time / self.mass / self.length
            / self.length
    }

    pub const fn si_m_e() -> Float {
        9.109_383_701_5e-31
    }

    /// Electron rest mass, expressed in this unit system.
    pub fn m_e(&self) -> Float {
        Self::si_m_e() / self.mass
    }

    pub const fn si_m_p() -> Float {
        1.672_621_923_69e-27
    }

    /// Proton rest mass, expressed in this unit system.
    pub fn m_p(&self) -> Float {
        Self::si_m_p() / self.mass
    }
}

/// Ready-made unit systems.
pub mod presets {
    use super::UnitSystem;

    /// Raw SI: all base units equal to their own SI unit.
    pub const SI: UnitSystem = UnitSystem::new(1.0, 1.0, 1.0, 1.0, 1.0);

    /// A Gaussian-like "natural" preset anchored to the electron charge and
    /// the speed of light, so that `c == 1` and `q_e == 1` by construction.
    /// Length is taken in metres, giving `time = length / c`, `mass` picked
    /// so that `epsilon_zero` comes out O(1), and `current = q_e / time`.
    pub const NATURAL: UnitSystem = UnitSystem::new(
        1.0,
        1.0 / UnitSystem::si_c(),
        UnitSystem::si_q_e() * UnitSystem::si_q_e() / UnitSystem::si_epsilon_zero(),
        UnitSystem::si_q_e() * UnitSystem::si_c(),
        1.0,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn si_preset_reproduces_si_constants() {
        let u = presets::SI;
        assert!((u.c() - UnitSystem::si_c()).abs() < 1e-6);
        assert!((u.q_e() - UnitSystem::si_q_e()).abs() < 1e-30);
        assert!((u.epsilon_zero() - UnitSystem::si_epsilon_zero()).abs() < 1e-20);
    }

    #[test]
    fn charge_unit_is_current_times_time() {
        let u = UnitSystem::new(2.0, 3.0, 1.0, 5.0, 1.0);
        assert_eq!(u.charge_unit(), 15.0);
    }
}

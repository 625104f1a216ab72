//! Macro-particles and their per-species storage.
//!
//! A particle carries an integer cell, fractional intra-cell position, and
//! reduced momentum `u = γv` (never `v` directly, so that `|v| < c` is
//! never approached by round-off as `γ → ∞`). Species differ only in
//! scalar charge/mass/name, never in type, so a single homogeneous
//! `Vec<SpeciesStore>` suffices.

use crate::errors::{ErrorKind, Result};
use crate::grid::{cell_zero, Cell};
use crate::vector::Vector;
use crate::Float;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub cell: Cell,
    /// Fractional intra-cell position, `p[d] ∈ [0,1)` after boundary
    /// reapplication.
    pub p: Vector,
    /// Reduced momentum `u = γv`.
    pub u: Vector,
}

impl Particle {
    pub fn new(cell: Cell, p: Vector, u: Vector) -> Particle {
        Particle { cell, p, u }
    }

    pub fn at_rest(cell: Cell, p: Vector) -> Particle {
        Particle { cell, p, u: Vector::zero() }
    }

    /// Lorentz factor `γ = √(1 + |u|²/c²)`.
    pub fn gamma(&self, c: Float) -> Float {
        (1.0 + self.u.norm2() / (c * c)).sqrt()
    }

    /// Velocity `v = u/γ`.
    pub fn velocity(&self, c: Float) -> Vector {
        self.u.scale(1.0 / self.gamma(c))
    }

    /// Velocity in cell-size units, `v ⊘ h` (componentwise).
    pub fn velocity_cell(&self, c: Float, h: &[Float]) -> Vector {
        let v = self.velocity(c);
        let mut out = [0.0; 3];
        for (d, hd) in h.iter().enumerate() {
            out[d] = v[d] / hd;
        }
        Vector::from_slice(&out[..h.len()])
    }
}

/// A particle species: name plus the two scalars that distinguish it
/// (`Electron`, `Proton`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    pub charge: Float,
    pub mass: Float,
}

impl Species {
    pub fn new(name: impl Into<String>, charge: Float, mass: Float) -> Species {
        Species {
            name: name.into(),
            charge,
            mass,
        }
    }
}

/// One species' dense particle array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesStore {
    pub species: Species,
    pub particles: Vec<Particle>,
}

impl SpeciesStore {
    pub fn new(species: Species, particles: Vec<Particle>) -> SpeciesStore {
        SpeciesStore { species, particles }
    }
}

/// The fixed, compile-time-declared list of particle species, as a
/// homogeneous collection of per-species stores. "Compile-time-declared"
/// here means the species list is fixed for the lifetime of a
/// `ParticleStorage` (constructed once, never grown or shrunk — no
/// particle creation/destruction per spec's non-goals); it is not a
/// Rust-level type parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleStorage {
    stores: Vec<SpeciesStore>,
}

impl ParticleStorage {
    pub fn new(stores: Vec<SpeciesStore>) -> Result<ParticleStorage> {
        if stores.is_empty() {
            return Err(ErrorKind::Configuration("species list must not be empty".into()).into());
        }
        Ok(ParticleStorage { stores })
    }

    pub fn species(&self) -> &[SpeciesStore] {
        &self.stores
    }

    pub fn species_mut(&mut self) -> &mut [SpeciesStore] {
        &mut self.stores
    }

    pub fn total_particles(&self) -> usize {
        self.stores.iter().map(|s| s.particles.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeciesStore> {
        self.stores.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SpeciesStore> {
        self.stores.iter_mut()
    }
}

pub fn cell_at_origin() -> Cell {
    cell_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_of_rest_particle_is_one() {
        let p = Particle::at_rest([0, 0, 0], Vector::from([0.5]));
        assert_eq!(p.gamma(1.0), 1.0);
    }

    #[test]
    fn velocity_matches_u_over_gamma() {
        let p = Particle::new([0, 0, 0], Vector::zero(), Vector::from([0.1]));
        let c = 1.0;
        let v = p.velocity(c);
        let gamma = p.gamma(c);
        assert!((v[0] - 0.1 / gamma).abs() < 1e-15);
    }

    #[test]
    fn storage_rejects_empty_species_list() {
        assert!(ParticleStorage::new(vec![]).is_err());
    }

    #[test]
    fn storage_counts_particles_across_species() {
        let e = SpeciesStore::new(
            Species::new("electron", -1.0, 1.0),
            vec![Particle::at_rest([0, 0, 0], Vector::zero()); 3],
        );
        let p = SpeciesStore::new(
            Species::new("proton", 1.0, 1836.0),
            vec![Particle::at_rest([0, 0, 0], Vector::zero()); 2],
        );
        let storage = ParticleStorage::new(vec![e, p]).unwrap();
        assert_eq!(storage.total_particles(), 5);
    }
}

//! A relativistic electromagnetic particle-in-cell (PIC) engine core.
//!
//! Co-evolves charged macro-particles (position, relativistic momentum) and
//! electric/magnetic fields sampled on a staggered (Yee) Cartesian grid.
//! Per step: gather fields at particles, push momenta under the Lorentz
//! force, move particles, deposit charge-conserving current (Esirkepov),
//! and evolve the fields (Yee FDTD leap-frog).

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate serde_derive;

pub mod atomic;
pub mod boundary;
pub mod depositor;
pub mod dim;
pub mod errors;
pub mod evolver;
pub mod gather;
pub mod grid;
pub mod hooks;
pub mod mover;
pub mod orchestrator;
pub mod parallel;
pub mod particle;
pub mod pusher;
pub mod shape;
pub mod snapshot;
pub mod units;
pub mod vector;

pub use crate::dim::{Dim, D1, D2, D3};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::grid::Grid;
pub use crate::orchestrator::Simulation;
pub use crate::particle::{Particle, Species};
pub use crate::vector::Vector;

/// Floating point type used throughout the core. A single alias, so that a
/// future single/double precision switch touches one line.
pub type Float = f64;

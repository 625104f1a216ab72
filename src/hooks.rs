//! Diagnostic hook registry.
//!
//! Rust has no compile-time "does this method exist" query outside of a
//! trait, so this is a trait with ten default no-op methods — a consumer
//! overrides exactly the hooks it cares about, and the orchestrator calls
//! all ten unconditionally at fixed points in the step. The registry this
//! module defines (the trait) declares the hooks and invokes them at
//! defined points; what any given hook actually does with the data is an
//! external collaborator's concern.

use crate::boundary::BoundaryKind;
use crate::dim::Dim;
use crate::grid::Grid;
use crate::particle::ParticleStorage;
use crate::vector::Vector;
use crate::Float;

/// An error raised by a diagnostic hook. It propagates to the caller
/// unchanged — the core does not wrap it — so this is an opaque boxed error
/// rather than a core `ErrorKind` variant.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// A read-only description of the grid/boundary configuration passed to
/// hooks, without exposing the core's internal `Grid<Dm>`/`BoundaryPolicy`
/// generics to a hook trait that must stay object-safe
/// (`Vec<Box<dyn DiagnosticHook<Dm>>>` needs a single concrete parameter
/// type per `Dm`).
#[derive(Debug, Clone, Copy)]
pub struct GridDescriptor {
    pub dim: usize,
    pub n: [usize; 3],
    pub h: [Float; 3],
    pub epsilon: Float,
    pub mu: Float,
    pub boundary: BoundaryKind,
}

impl GridDescriptor {
    pub fn new<Dm: Dim>(grid: &Grid<Dm>, boundary: BoundaryKind) -> GridDescriptor {
        let mut n = [1usize; 3];
        let mut h = [1.0; 3];
        for d in 0..Dm::DIM {
            n[d] = grid.n(d);
            h[d] = grid.h(d);
        }
        GridDescriptor {
            dim: Dm::DIM,
            n,
            h,
            epsilon: grid.epsilon(),
            mu: grid.mu(),
            boundary,
        }
    }
}

/// The arguments every hook point receives: particle storage, `E`/`B`/`J`,
/// the timestep, and the grid/boundary descriptor. A consumer overriding
/// any subset of the ten hook methods gets the same bundle at each one.
pub struct HookContext<'a> {
    pub particles: &'a ParticleStorage,
    pub e_field: &'a [Vector],
    pub b_field: &'a [Vector],
    pub j_field: &'a [Vector],
    pub dt: Float,
    pub grid: GridDescriptor,
}

/// The ten diagnostic hook points called by the orchestrator at fixed
/// points in each step, whether or not any individual hook is overridden.
/// All default to a no-op.
pub trait DiagnosticHook: Send + Sync {
    fn pre_step(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn before_mover(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn after_mover(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn before_pusher(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn after_pusher(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn before_evolver(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn after_evolver(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn before_depositer(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn after_depositer(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
    fn post_step(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::D1;
    use crate::grid::Grid;
    use crate::particle::{ParticleStorage, Species, SpeciesStore};

    struct CallCounter {
        pre_step_calls: usize,
        post_step_calls: usize,
    }

    impl DiagnosticHook for CallCounter {
        fn pre_step(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
            self.pre_step_calls += 1;
            Ok(())
        }
        fn post_step(&mut self, _ctx: &HookContext) -> Result<(), HookError> {
            self.post_step_calls += 1;
            Ok(())
        }
    }

    #[test]
    fn unoverridden_hooks_are_harmless_no_ops() {
        let grid: Grid<D1> = Grid::new(&[4], &[1.0], 1.0, 1.0).unwrap();
        let storage = ParticleStorage::new(vec![SpeciesStore::new(Species::new("e", -1.0, 1.0), vec![])]).unwrap();
        let e = vec![Vector::zero(); 4];
        let mut hook = CallCounter { pre_step_calls: 0, post_step_calls: 0 };
        let ctx = HookContext {
            particles: &storage,
            e_field: &e,
            b_field: &e,
            j_field: &e,
            dt: 0.1,
            grid: GridDescriptor::new(&grid, BoundaryKind::Periodic),
        };
        hook.before_mover(&ctx).unwrap();
        hook.pre_step(&ctx).unwrap();
        assert_eq!(hook.pre_step_calls, 1);
        assert_eq!(hook.post_step_calls, 0);
    }
}

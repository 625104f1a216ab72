//! The step orchestrator: owns every piece of simulation state and threads
//! the four algorithmic subsystems together in the exact time-staggered
//! order a leap-frog PIC step requires — half-move, push, evolve, deposit,
//! half-move, with a one-off half-step deposit the first time a
//! freshly-initialised simulation steps, so that `J` starts out aligned
//! with the leap-frog staggering the Yee evolver expects.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::boundary::BoundaryPolicy;
use crate::depositor::{self, DepositorScratch};
use crate::dim::Dim;
use crate::errors::{ErrorKind, Result};
use crate::evolver::Evolver;
use crate::gather;
use crate::grid::Grid;
use crate::hooks::{DiagnosticHook, GridDescriptor, HookContext, HookError};
use crate::mover;
use crate::parallel;
use crate::particle::ParticleStorage;
use crate::pusher::Pusher;
use crate::shape::ParticleShape;
use crate::snapshot;
use crate::vector::Vector;
use crate::Float;

/// Which of the ten hook points is firing; kept internal so [`Simulation::step`]
/// reads as a straight transcription of the per-step control flow rather
/// than ten near-identical dispatch blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookPoint {
    PreStep,
    BeforeMover,
    AfterMover,
    BeforePusher,
    AfterPusher,
    BeforeEvolver,
    AfterEvolver,
    BeforeDepositer,
    AfterDepositer,
    PostStep,
}

/// Builds a [`HookContext`] borrowing the given state. A plain function
/// (not a closure) so its lifetime parameter is ordinary generic-fn
/// elaboration rather than relying on higher-ranked closure inference.
fn hook_ctx<'a>(
    particles: &'a ParticleStorage,
    e_field: &'a [Vector],
    b_field: &'a [Vector],
    j_field: &'a [Vector],
    dt: Float,
    grid: GridDescriptor,
) -> HookContext<'a> {
    HookContext {
        particles,
        e_field,
        b_field,
        j_field,
        dt,
        grid,
    }
}

fn fire_hooks(hooks: &mut [Box<dyn DiagnosticHook>], point: HookPoint, ctx: &HookContext) -> std::result::Result<(), HookError> {
    for hook in hooks.iter_mut() {
        match point {
            HookPoint::PreStep => hook.pre_step(ctx)?,
            HookPoint::BeforeMover => hook.before_mover(ctx)?,
            HookPoint::AfterMover => hook.after_mover(ctx)?,
            HookPoint::BeforePusher => hook.before_pusher(ctx)?,
            HookPoint::AfterPusher => hook.after_pusher(ctx)?,
            HookPoint::BeforeEvolver => hook.before_evolver(ctx)?,
            HookPoint::AfterEvolver => hook.after_evolver(ctx)?,
            HookPoint::BeforeDepositer => hook.before_depositer(ctx)?,
            HookPoint::AfterDepositer => hook.after_depositer(ctx)?,
            HookPoint::PostStep => hook.post_step(ctx)?,
        }
    }
    Ok(())
}

/// Owns grid configuration, field arrays, current array, particle storage,
/// depositor scratch, and the active strategy set (shape, pusher, evolver,
/// boundary policy) — the idiomatic-Rust rendering of `simul_storage` plus
/// `Simulation` from `simul.h`, generalised over the strategies as type
/// parameters (per design note 9's "trait/interface set... parameterising
/// the orchestrator by value or by generic parameter") instead of the
/// original's template-template parameters.
pub struct Simulation<Dm: Dim, S: ParticleShape, P: Pusher, Ev: Evolver, Bnd: BoundaryPolicy<Dm>> {
    grid: Grid<Dm>,
    boundary: Bnd,
    shape: S,
    pusher: P,
    evolver: Ev,
    c_light: Float,
    particles: ParticleStorage,
    e_field: Vec<Vector>,
    b_field: Vec<Vector>,
    j_field: Vec<Vector>,
    depositor_scratch: DepositorScratch,
    /// Set on construction and by [`Simulation::load_snapshot`] of a
    /// snapshot taken before its first step; cleared after the one-off
    /// half-step deposit a fresh run requires. Not the same as "has this
    /// simulation ever stepped" — a snapshot loaded with the flag already
    /// cleared skips the half-step deposit on resume.
    initialised: bool,
    timestep: usize,
    hooks: Vec<Box<dyn DiagnosticHook>>,
    interrupt: Arc<AtomicBool>,
}

impl<Dm: Dim, S: ParticleShape, P: Pusher, Ev: Evolver, Bnd: BoundaryPolicy<Dm>> Simulation<Dm, S, P, Ev, Bnd> {
    /// Builds a simulation from an already-validated `Grid`, boundary
    /// policy, strategy set, particle storage and initial `E`/`B` fields
    /// (`J` always starts at zero — the caller supplies charge/current only
    /// through particles). `initialised` starts `true`, so the first call
    /// to [`Simulation::step`] performs the half-step initial deposit.
    pub fn new(
        grid: Grid<Dm>,
        boundary: Bnd,
        shape: S,
        pusher: P,
        evolver: Ev,
        c_light: Float,
        particles: ParticleStorage,
        e_field: Vec<Vector>,
        b_field: Vec<Vector>,
    ) -> Result<Simulation<Dm, S, P, Ev, Bnd>> {
        let total = grid.total_cells();
        if e_field.len() != total || b_field.len() != total {
            return Err(ErrorKind::Configuration(format!(
                "E/B field arrays must have {} entries (one per cell), got {} and {}",
                total,
                e_field.len(),
                b_field.len()
            ))
            .into());
        }

        Ok(Simulation {
            depositor_scratch: DepositorScratch::new(total),
            j_field: vec![Vector::zero(); total],
            grid,
            boundary,
            shape,
            pusher,
            evolver,
            c_light,
            particles,
            e_field,
            b_field,
            initialised: true,
            timestep: 0,
            hooks: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn add_hook(&mut self, hook: Box<dyn DiagnosticHook>) {
        self.hooks.push(hook);
    }

    /// A shared flag a caller can clone out and hand to a signal handler
    /// (e.g. `ctrlc`, in the binary's ambient stack) running on another
    /// thread, rather than a process-wide global. Checked only at step
    /// boundaries — interruption never lands mid-step.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    /// Directly requests an interrupt-save, for callers that already hold
    /// `&Simulation` rather than a cloned handle.
    pub fn request_interrupt_save(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    pub fn interrupt_requested(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn grid(&self) -> &Grid<Dm> {
        &self.grid
    }

    pub fn boundary(&self) -> &Bnd {
        &self.boundary
    }

    pub fn particles(&self) -> &ParticleStorage {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleStorage {
        &mut self.particles
    }

    pub fn e_field(&self) -> &[Vector] {
        &self.e_field
    }

    pub fn b_field(&self) -> &[Vector] {
        &self.b_field
    }

    pub fn j_field(&self) -> &[Vector] {
        &self.j_field
    }

    /// Advances the simulation by one step of duration `dt`: the one-off
    /// half-step initial deposit, then half-move / push / evolve / deposit /
    /// half-move, firing every registered hook at its documented point. A
    /// hook error aborts the step immediately and propagates unchanged.
    pub fn step(&mut self, dt: Float) -> std::result::Result<(), HookError> {
        let descriptor = GridDescriptor::new(&self.grid, self.boundary.kind());

        macro_rules! fire {
            ($point:expr) => {
                fire_hooks(
                    &mut self.hooks,
                    $point,
                    &hook_ctx(&self.particles, &self.e_field, &self.b_field, &self.j_field, dt, descriptor),
                )?
            };
        }

        fire!(HookPoint::PreStep);

        if self.initialised {
            self.deposit(dt / 2.0);
            self.initialised = false;
        }

        fire!(HookPoint::BeforeMover);
        self.half_move(dt / 2.0);
        fire!(HookPoint::AfterMover);

        fire!(HookPoint::BeforePusher);
        self.push(dt);
        fire!(HookPoint::AfterPusher);

        fire!(HookPoint::BeforeEvolver);
        self.evolve(dt);
        fire!(HookPoint::AfterEvolver);

        fire!(HookPoint::BeforeDepositer);
        self.deposit(dt);
        fire!(HookPoint::AfterDepositer);

        fire!(HookPoint::BeforeMover);
        self.half_move(dt / 2.0);
        fire!(HookPoint::AfterMover);

        fire!(HookPoint::PostStep);

        self.timestep += 1;
        Ok(())
    }

    fn half_move(&mut self, dt_half: Float) {
        let c_light = self.c_light;
        let grid = &self.grid;
        let boundary = &self.boundary;
        let h: Vec<Float> = (0..Dm::DIM).map(|d| grid.h(d)).collect();
        for store in self.particles.iter_mut() {
            parallel::for_each(&mut store.particles, |particle| {
                let v_cell = particle.velocity_cell(c_light, &h);
                mover::mv(grid, boundary, particle, v_cell.scale(dt_half));
            });
        }
    }

    fn push(&mut self, dt: Float) {
        let c_light = self.c_light;
        let grid = &self.grid;
        let boundary = &self.boundary;
        let shape = &self.shape;
        let pusher = &self.pusher;
        let e_field = &self.e_field;
        let b_field = &self.b_field;
        for store in self.particles.iter_mut() {
            let charge = store.species.charge;
            let mass = store.species.mass;
            parallel::for_each(&mut store.particles, |particle| {
                let (e, b) = gather::gather(grid, boundary, shape, e_field, b_field, particle);
                particle.u = pusher.push::<Dm>(particle.u, e, b, charge, mass, dt, c_light);
            });
        }
    }

    fn deposit(&mut self, dt: Float) {
        for v in self.j_field.iter_mut() {
            *v = Vector::zero();
        }
        depositor::deposit_all_species(
            &self.grid,
            &self.boundary,
            &self.shape,
            &self.particles,
            self.c_light,
            dt,
            &self.depositor_scratch,
            &mut self.j_field,
        );
    }

    fn evolve(&mut self, dt: Float) {
        let evolver = &self.evolver;
        let grid = &self.grid;
        let boundary = &self.boundary;
        evolver.step(grid, boundary, &mut self.e_field, &mut self.b_field, &self.j_field, dt);
    }

    /// Writes the full snapshot façade: scratch sections, particle species
    /// (in configuration order), `E`, `B`, `J`, then `initialised`.
    pub fn save_snapshot<W: Write>(&self, w: &mut W, binary: bool) -> Result<()> {
        let species_particles: Vec<&[crate::particle::Particle]> =
            self.particles.iter().map(|s| s.particles.as_slice()).collect();
        snapshot::write::<Dm, W>(w, binary, &species_particles, &self.e_field, &self.b_field, &self.j_field, self.initialised)
    }

    /// Restores state from a stream written by [`Simulation::save_snapshot`].
    /// The species list itself (name/charge/mass, and their count and
    /// order) is assumed already configured identically to when the
    /// snapshot was taken — only per-species particle arrays are replaced.
    pub fn load_snapshot<R: Read>(&mut self, r: &mut R, binary: bool) -> Result<()> {
        let loaded = snapshot::read::<Dm, R>(r, binary)?;
        if loaded.species_particles.len() != self.particles.species().len() {
            return Err(ErrorKind::Snapshot("species_count".into()).into());
        }
        for (store, particles) in self.particles.iter_mut().zip(loaded.species_particles) {
            store.particles = particles;
        }
        self.e_field = loaded.e_field;
        self.b_field = loaded.b_field;
        self.j_field = loaded.j_field;
        self.initialised = loaded.initialised;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Periodic;
    use crate::dim::D1;
    use crate::particle::{Particle, Species, SpeciesStore};
    use crate::pusher::Boris;
    use crate::shape::BSpline;
    use crate::evolver::YeeFdtd;

    fn storage_with(particles: Vec<Particle>) -> ParticleStorage {
        ParticleStorage::new(vec![SpeciesStore::new(Species::new("e", -1.0, 1.0), particles)]).unwrap()
    }

    #[test]
    fn scenario_1_two_stationary_particles_stay_at_rest_with_zero_current() {
        let grid: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        let total = grid.total_cells();
        let particles = vec![
            Particle::at_rest([2, 0, 0], Vector::from([0.5])),
            Particle::at_rest([6, 0, 0], Vector::from([0.5])),
        ];
        let storage = ParticleStorage::new(vec![
            SpeciesStore::new(Species::new("electron", -1.0, 1.0), vec![particles[0]]),
            SpeciesStore::new(Species::new("proton", 1.0, 1836.0), vec![particles[1]]),
        ])
        .unwrap();

        let mut sim = Simulation::new(
            grid,
            Periodic,
            BSpline::new(1),
            Boris,
            YeeFdtd,
            1.0,
            storage,
            vec![Vector::zero(); total],
            vec![Vector::zero(); total],
        )
        .unwrap();

        sim.step(0.1).unwrap();

        for store in sim.particles().iter() {
            for p in &store.particles {
                assert!(p.u.norm() < 1e-15);
            }
        }
        for v in sim.e_field() {
            assert_eq!(v[0], 0.0);
        }
        for v in sim.j_field() {
            assert_eq!(v[0], 0.0);
        }
    }

    #[test]
    fn first_step_after_construction_runs_the_half_step_initial_deposit_exactly_once() {
        let grid: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        let total = grid.total_cells();
        let storage = storage_with(vec![Particle::new([4, 0, 0], Vector::from([0.5]), Vector::from([0.1]))]);
        let mut sim = Simulation::new(
            grid,
            Periodic,
            BSpline::new(1),
            Boris,
            YeeFdtd,
            1.0,
            storage,
            vec![Vector::zero(); total],
            vec![Vector::zero(); total],
        )
        .unwrap();

        assert!(sim.initialised);
        sim.step(0.1).unwrap();
        assert!(!sim.initialised);
        sim.step(0.1).unwrap();
        assert!(!sim.initialised);
    }

    #[test]
    fn hook_errors_propagate_unchanged() {
        struct Failing;
        impl DiagnosticHook for Failing {
            fn pre_step(&mut self, _ctx: &HookContext) -> std::result::Result<(), HookError> {
                Err("diagnostic failed".into())
            }
        }

        let grid: Grid<D1> = Grid::new(&[4], &[1.0], 1.0, 1.0).unwrap();
        let total = grid.total_cells();
        let storage = storage_with(vec![]);
        let mut sim = Simulation::new(
            grid,
            Periodic,
            BSpline::new(0),
            Boris,
            YeeFdtd,
            1.0,
            storage,
            vec![Vector::zero(); total],
            vec![Vector::zero(); total],
        )
        .unwrap();
        sim.add_hook(Box::new(Failing));

        let err = sim.step(0.1).unwrap_err();
        assert!(format!("{}", err).contains("diagnostic failed"));
    }

    #[test]
    fn snapshot_round_trip_reproduces_particle_and_field_state() {
        let grid: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        let total = grid.total_cells();
        let storage = storage_with(vec![Particle::new([3, 0, 0], Vector::from([0.4]), Vector::from([0.2]))]);
        let mut sim = Simulation::new(
            grid,
            Periodic,
            BSpline::new(1),
            Boris,
            YeeFdtd,
            1.0,
            storage,
            vec![Vector::from([1.0]); total],
            vec![Vector::from([0.0, 0.0]); total],
        )
        .unwrap();
        sim.step(0.05).unwrap();

        let mut buf = Vec::new();
        sim.save_snapshot(&mut buf, true).unwrap();

        let grid2: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        let storage2 = storage_with(vec![Particle::at_rest([0, 0, 0], Vector::zero())]);
        let mut sim2 = Simulation::new(
            grid2,
            Periodic,
            BSpline::new(1),
            Boris,
            YeeFdtd,
            1.0,
            storage2,
            vec![Vector::zero(); total],
            vec![Vector::zero(); total],
        )
        .unwrap();
        sim2.load_snapshot(&mut &buf[..], true).unwrap();

        assert_eq!(sim2.particles().iter().next().unwrap().particles, sim.particles().iter().next().unwrap().particles);
        assert_eq!(sim2.e_field(), sim.e_field());
        assert_eq!(sim2.timestep(), 0); // snapshot does not carry the step counter
    }
}

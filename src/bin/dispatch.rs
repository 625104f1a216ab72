//! Resolves a parsed [`crate::config::SimulationSettings`] into a concrete,
//! monomorphized `relapic::Simulation` and drives it to completion.
//!
//! The core's three strategy traits (`BoundaryPolicy`, `ParticleShape`,
//! `Pusher`) are generic, not object-safe, so a config-driven choice among
//! their implementors cannot be boxed as a trait object the way the ten
//! diagnostic hooks are (`relapic::hooks::DiagnosticHook`). Instead each
//! choice gets a small enum that itself implements the trait by delegating
//! to whichever variant was selected — the standard "either" pattern for a
//! closed, config-selected set of strategy implementations. The spatial
//! dimension, which the core expresses as the compile-time `Dim` marker
//! types `D1`/`D2`/`D3`, is resolved once in [`crate::main`] by matching
//! `settings.grid.n.len()` and calling [`run`] with the matching marker.

use std::sync::atomic::Ordering;

use colored::Colorize;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64Mcg;

use relapic::boundary::{BoundaryKind, BoundaryPolicy, MirrorFlags, Periodic, Reflecting};
use relapic::dim::Dim;
use relapic::evolver::YeeFdtd;
use relapic::grid::{Cell, Grid};
use relapic::particle::{Particle, ParticleStorage, Species, SpeciesStore};
use relapic::pusher::{Boris, HigueraCary, Pusher, Vay};
use relapic::shape::{BSpline, ParticleShape, Polynomial};
use relapic::vector::Vector;
use relapic::{Float, Simulation};

use crate::config::{PusherKind, ShapeFamily, SimulationSettings};
use crate::errors::*;

/// Delegates to whichever boundary policy `settings.boundary` selected.
#[derive(Debug, Clone, Copy)]
pub enum BoundaryDispatch {
    Periodic(Periodic),
    Reflecting(Reflecting),
}

impl BoundaryDispatch {
    fn from_kind(kind: BoundaryKind) -> BoundaryDispatch {
        match kind {
            BoundaryKind::Periodic => BoundaryDispatch::Periodic(Periodic),
            BoundaryKind::Reflecting => BoundaryDispatch::Reflecting(Reflecting),
        }
    }
}

impl<Dm: Dim> BoundaryPolicy<Dm> for BoundaryDispatch {
    fn kind(&self) -> BoundaryKind {
        match self {
            BoundaryDispatch::Periodic(p) => <Periodic as BoundaryPolicy<Dm>>::kind(p),
            BoundaryDispatch::Reflecting(r) => <Reflecting as BoundaryPolicy<Dm>>::kind(r),
        }
    }

    fn boundary_e(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        match self {
            BoundaryDispatch::Periodic(p) => p.boundary_e(grid, cell, field),
            BoundaryDispatch::Reflecting(r) => r.boundary_e(grid, cell, field),
        }
    }

    fn boundary_b(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        match self {
            BoundaryDispatch::Periodic(p) => p.boundary_b(grid, cell, field),
            BoundaryDispatch::Reflecting(r) => r.boundary_b(grid, cell, field),
        }
    }

    fn boundary_j(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        match self {
            BoundaryDispatch::Periodic(p) => p.boundary_j(grid, cell, field),
            BoundaryDispatch::Reflecting(r) => r.boundary_j(grid, cell, field),
        }
    }

    fn boundary_particle(&self, grid: &Grid<Dm>, cell: &mut Cell, p: &mut Vector, u: &mut Vector, force: bool) {
        match self {
            BoundaryDispatch::Periodic(policy) => policy.boundary_particle(grid, cell, p, u, force),
            BoundaryDispatch::Reflecting(policy) => policy.boundary_particle(grid, cell, p, u, force),
        }
    }

    fn for_all_neighbours(
        &self,
        grid: &Grid<Dm>,
        radius: i64,
        cell: &Cell,
        visit: &mut dyn FnMut(usize, Cell, Cell, MirrorFlags),
    ) {
        match self {
            BoundaryDispatch::Periodic(p) => p.for_all_neighbours(grid, radius, cell, visit),
            BoundaryDispatch::Reflecting(r) => r.for_all_neighbours(grid, radius, cell, visit),
        }
    }
}

/// Delegates to whichever shape family `settings.shape.family` selected.
#[derive(Debug, Clone)]
pub enum ShapeDispatch {
    BSpline(BSpline),
    Polynomial(Polynomial),
}

impl ShapeDispatch {
    fn new(family: ShapeFamily, order: usize) -> ShapeDispatch {
        match family {
            ShapeFamily::BSpline => ShapeDispatch::BSpline(BSpline::new(order)),
            ShapeFamily::Polynomial => ShapeDispatch::Polynomial(Polynomial::new(order)),
        }
    }
}

impl ParticleShape for ShapeDispatch {
    fn order(&self) -> usize {
        match self {
            ShapeDispatch::BSpline(s) => s.order(),
            ShapeDispatch::Polynomial(s) => s.order(),
        }
    }

    fn half_width(&self) -> Float {
        match self {
            ShapeDispatch::BSpline(s) => s.half_width(),
            ShapeDispatch::Polynomial(s) => s.half_width(),
        }
    }

    fn value_1d(&self, x: Float) -> Float {
        match self {
            ShapeDispatch::BSpline(s) => s.value_1d(x),
            ShapeDispatch::Polynomial(s) => s.value_1d(x),
        }
    }

    fn antiderivative_1d(&self, x: Float) -> Float {
        match self {
            ShapeDispatch::BSpline(s) => s.antiderivative_1d(x),
            ShapeDispatch::Polynomial(s) => s.antiderivative_1d(x),
        }
    }
}

/// Delegates to whichever pusher `settings.pusher` selected.
#[derive(Debug, Clone, Copy)]
pub enum PusherDispatch {
    Boris(Boris),
    Vay(Vay),
    HigueraCary(HigueraCary),
}

impl PusherDispatch {
    fn from_kind(kind: PusherKind) -> PusherDispatch {
        match kind {
            PusherKind::Boris => PusherDispatch::Boris(Boris),
            PusherKind::Vay => PusherDispatch::Vay(Vay),
            PusherKind::HigueraCary => PusherDispatch::HigueraCary(HigueraCary),
        }
    }
}

impl Pusher for PusherDispatch {
    fn push<Dm: Dim>(&self, u: Vector, e: Vector, b: Vector, charge: Float, mass: Float, dt: Float, c: Float) -> Vector {
        match self {
            PusherDispatch::Boris(p) => p.push::<Dm>(u, e, b, charge, mass, dt, c),
            PusherDispatch::Vay(p) => p.push::<Dm>(u, e, b, charge, mass, dt, c),
            PusherDispatch::HigueraCary(p) => p.push::<Dm>(u, e, b, charge, mass, dt, c),
        }
    }
}

/// Builds a per-species particle array: positions drawn uniformly over the
/// whole grid, momenta drawn from a zero-mean Maxwellian of the species'
/// configured thermal spread (zero spread collapses to particles at rest).
fn seed_species<Dm: Dim>(
    grid: &Grid<Dm>,
    settings: &crate::config::SpeciesSettings,
    rng: &mut Pcg64Mcg,
) -> Result<SpeciesStore> {
    let normal = if settings.thermal_spread > 0.0 {
        Some(Normal::new(0.0, settings.thermal_spread).chain_err(|| "invalid thermal_spread")?)
    } else {
        None
    };

    let particles = (0..settings.count)
        .map(|_| {
            let mut cell = relapic::grid::cell_zero();
            let mut p = [0.0; 3];
            for d in 0..Dm::DIM {
                cell[d] = rng.gen_range(0, grid.n(d) as i64);
                p[d] = rng.gen_range(0.0, 1.0);
            }
            let mut u = [0.0; 3];
            if let Some(dist) = &normal {
                for ud in u.iter_mut().take(Dm::DIM) {
                    *ud = dist.sample(rng);
                }
            }
            Particle::new(cell, Vector::from_slice(&p[..Dm::DIM]), Vector::from_slice(&u[..Dm::DIM]))
        })
        .collect();

    Ok(SpeciesStore::new(
        Species::new(settings.name.clone(), settings.charge, settings.mass),
        particles,
    ))
}

/// Builds the concrete `Simulation` for spatial dimension `Dm` from a
/// validated configuration and drives it for `settings.number_of_timesteps`
/// steps, writing periodic and/or final snapshots per `settings.output` and
/// honouring an interrupt request by saving early.
pub fn run<Dm: Dim>(
    settings: &SimulationSettings,
    output_path: &crate::output::OutputPath,
    show_progress: bool,
    resume: bool,
) -> Result<()> {
    let grid: Grid<Dm> = Grid::new(&settings.grid.n, &settings.grid.h, settings.grid.epsilon, settings.grid.mu)
        .chain_err(|| "invalid grid configuration")?;

    let boundary = BoundaryDispatch::from_kind(settings.boundary);
    let shape = ShapeDispatch::new(settings.shape.family, settings.shape.order);
    let pusher = PusherDispatch::from_kind(settings.pusher);

    let mut rng = Pcg64Mcg::seed_from_u64(settings.seed);
    let stores: Vec<SpeciesStore> = settings
        .species
        .iter()
        .map(|sp| seed_species(&grid, sp, &mut rng))
        .collect::<Result<_>>()?;
    let particles = ParticleStorage::new(stores).chain_err(|| "invalid species configuration")?;

    let total_cells = grid.total_cells();
    let e_field = vec![Vector::zero(); total_cells];
    let b_field = vec![Vector::zero(); total_cells];

    let mut simulation = Simulation::new(
        grid,
        boundary,
        shape,
        pusher,
        YeeFdtd,
        relapic::units::UnitSystem::si_c(),
        particles,
        e_field,
        b_field,
    )
    .chain_err(|| "invalid simulation configuration")?;

    if resume {
        let resume_from = settings
            .output
            .resume_from
            .as_ref()
            .ok_or("cannot resume: `output.resume_from` is not set in the parameter file")?;
        let mut f = std::fs::File::open(resume_from).chain_err(|| "unable to open snapshot to resume from")?;
        simulation
            .load_snapshot(&mut f, settings.output.binary)
            .chain_err(|| "unable to read snapshot")?;
        info!("Resumed from snapshot '{}'.", resume_from);
    }

    let interrupted = simulation.interrupt_handle();
    ctrlc::set_handler(move || {
        interrupted.store(true, Ordering::SeqCst);
    })
    .chain_err(|| "unable to install interrupt handler")?;

    let mut pb = pbr::ProgressBar::new(settings.number_of_timesteps as u64);
    pb.show_bar = show_progress;
    pb.show_counter = show_progress;
    pb.show_percent = show_progress;
    pb.show_speed = show_progress;
    pb.show_time_left = show_progress;
    pb.show_message = show_progress;

    let start_timestep = simulation.timestep();
    let last_timestep = start_timestep + settings.number_of_timesteps;

    while simulation.timestep() < last_timestep {
        simulation
            .step(settings.timestep)
            .map_err(|e| ErrorKind::Msg(format!("diagnostic hook failed: {}", e)))?;
        pb.inc();

        let timestep = simulation.timestep();

        if simulation.interrupt_requested() {
            info!("Interrupt requested; saving snapshot at timestep {}.", timestep);
            write_snapshot(&simulation, output_path, settings, timestep)?;
            break;
        }

        if let Some(every) = settings.output.snapshot_every {
            if timestep % every == 0 {
                debug!("Timestep {}: saving snapshot.", timestep);
                write_snapshot(&simulation, output_path, settings, timestep)?;
            }
        }
    }

    pb.finish_print(&format!("{} ", "done".green().bold()));

    if settings.output.final_snapshot {
        write_snapshot(&simulation, output_path, settings, simulation.timestep())?;
    }

    Ok(())
}

fn write_snapshot<Dm, S, P, Ev, Bnd>(
    simulation: &Simulation<Dm, S, P, Ev, Bnd>,
    output_path: &crate::output::OutputPath,
    settings: &SimulationSettings,
    timestep: usize,
) -> Result<()>
where
    Dm: Dim,
    S: ParticleShape,
    P: Pusher,
    Ev: relapic::evolver::Evolver,
    Bnd: BoundaryPolicy<Dm>,
{
    let path = output_path.with_extension(&format!("{}.snapshot", timestep));
    let mut f = std::fs::File::create(&path).chain_err(|| "unable to create snapshot file")?;
    simulation
        .save_snapshot(&mut f, settings.output.binary)
        .chain_err(|| "unable to write snapshot")?;
    Ok(())
}

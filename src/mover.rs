//! The sub-cell position update: `move(particle, δp)` advances the
//! integer cell and fractional position by a cell-size-unit displacement
//! and reapplies the active boundary policy.

use crate::boundary::BoundaryPolicy;
use crate::dim::Dim;
use crate::grid::Grid;
use crate::particle::Particle;
use crate::vector::Vector;

/// Advances `particle` by `delta_p` (cell-size units), folding any whole
/// cells crossed into `particle.cell` and finishing with a boundary-policy
/// reapplication (wrap for periodic, mirror+momentum-flip for reflecting).
pub fn mv<Dm: Dim, B: BoundaryPolicy<Dm>>(grid: &Grid<Dm>, boundary: &B, particle: &mut Particle, delta_p: Vector) {
    mv_force(grid, boundary, particle, delta_p, false)
}

/// As [`mv`], but when `force` is set the boundary-policy reapplication runs
/// unconditionally rather than only when the cell has left the domain. Used
/// by the depositor's boundary-crossing clone, which must fold a
/// particle sitting exactly on the crossing time regardless of whether the
/// cell arithmetic alone flags it as out of range.
pub fn mv_force<Dm: Dim, B: BoundaryPolicy<Dm>>(
    grid: &Grid<Dm>,
    boundary: &B,
    particle: &mut Particle,
    delta_p: Vector,
    force: bool,
) {
    for d in 0..Dm::DIM {
        let new_p = particle.p[d] + delta_p[d];
        let whole = new_p.floor();
        particle.cell[d] += whole as i64;
        particle.p[d] = new_p - whole;
    }
    boundary.boundary_particle(grid, &mut particle.cell, &mut particle.p, &mut particle.u, force);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{Periodic, Reflecting};
    use crate::dim::D1;

    #[test]
    fn move_within_cell_leaves_cell_unchanged() {
        let grid: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        let mut p = Particle::at_rest([3, 0, 0], Vector::from([0.2]));
        mv(&grid, &Periodic, &mut p, Vector::from([0.1]));
        assert_eq!(p.cell[0], 3);
        assert!((p.p[0] - 0.3).abs() < 1e-15);
    }

    #[test]
    fn move_crossing_cell_boundary_increments_cell() {
        let grid: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        let mut p = Particle::at_rest([3, 0, 0], Vector::from([0.8]));
        mv(&grid, &Periodic, &mut p, Vector::from([0.5]));
        assert_eq!(p.cell[0], 4);
        assert!((p.p[0] - 0.3).abs() < 1e-15);
    }

    #[test]
    fn move_past_periodic_edge_wraps() {
        let grid: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        let mut p = Particle::at_rest([7, 0, 0], Vector::from([0.8]));
        mv(&grid, &Periodic, &mut p, Vector::from([0.5]));
        assert_eq!(p.cell[0], 0);
        assert!(p.cell[0] >= 0 && (p.cell[0] as usize) < grid.n(0));
        assert!(p.p[0] >= 0.0 && p.p[0] < 1.0);
    }

    #[test]
    fn move_past_reflecting_wall_bounces_and_flips_momentum() {
        let grid: Grid<D1> = Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap();
        let mut p = Particle::new([7, 0, 0], Vector::from([0.8]), Vector::from([1.0]));
        mv(&grid, &Reflecting, &mut p, Vector::from([0.5]));
        assert!(p.cell[0] >= 0 && (p.cell[0] as usize) < grid.n(0));
        assert!(p.p[0] >= 0.0 && p.p[0] < 1.0);
        assert!(p.u[0] < 0.0);
    }
}

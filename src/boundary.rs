//! Boundary policies: periodic wrap-around and reflecting walls.
//!
//! Both variants resolve an out-of-range cell tuple to an in-range one for
//! field lookups (`boundary_e`/`boundary_b`/`boundary_j`), reflect or wrap
//! a particle that has left the domain (`boundary_particle`), and drive
//! the neighbour-iteration contract used by gather and the depositor,
//! which additionally reports per-axis "this neighbour was mirrored in"
//! flags so callers can mirror the particle's relative position before
//! evaluating the shape function.

use crate::dim::Dim;
use crate::grid::{cell_zero, Cell, Grid};
use crate::vector::Vector;

/// Per-axis "was this cell reached by reflecting across a wall" flags.
pub type MirrorFlags = [bool; 3];

/// Tags which boundary policy is active, for consumers (diagnostic hooks)
/// that only need to know the variant and not its behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    Periodic,
    Reflecting,
}

pub trait BoundaryPolicy<Dm: Dim>: Clone + std::fmt::Debug + Send + Sync {
    fn kind(&self) -> BoundaryKind;

    fn boundary_e(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector;
    fn boundary_b(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector;
    fn boundary_j(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector;

    /// Applies the particle boundary operator in place: wraps (periodic)
    /// or reflects (reflecting) `cell`, and for reflecting also flips the
    /// mirrored axes of `p` (intra-cell fraction) and `u` (momentum).
    /// Runs unconditionally if `force`, otherwise only when `cell` has
    /// left the domain.
    fn boundary_particle(&self, grid: &Grid<Dm>, cell: &mut Cell, p: &mut Vector, u: &mut Vector, force: bool);

    /// Visits every cell within `radius` of `cell` (a D-cube of side
    /// `2*radius+1`), reporting for each: the linear index and resolved
    /// in-range cell (for field lookups), the raw per-axis displacement
    /// from `cell` before wrapping/reflection (for shape-weight maths,
    /// which must see the unbounded "virtual" offset, not the folded
    /// one), and per-axis mirror flags.
    fn for_all_neighbours(
        &self,
        grid: &Grid<Dm>,
        radius: i64,
        cell: &Cell,
        visit: &mut dyn FnMut(usize, Cell, Cell, MirrorFlags),
    );
}

/// Skips all boundary-policy lookups: the stencil is assumed to stay
/// entirely inside the domain (callers check [`Grid::is_border`] first).
pub fn for_all_neighbours_unchecked<Dm: Dim>(
    grid: &Grid<Dm>,
    radius: i64,
    cell: &Cell,
    mut visit: impl FnMut(usize, Cell, Cell, MirrorFlags),
) {
    fn go<Dm: Dim>(
        grid: &Grid<Dm>,
        radius: i64,
        base: &Cell,
        axis: usize,
        cur: &mut Cell,
        delta: &mut Cell,
        visit: &mut dyn FnMut(usize, Cell, Cell, MirrorFlags),
    ) {
        if axis == Dm::DIM {
            visit(grid.to_index(cur), *cur, *delta, [false; 3]);
            return;
        }
        for d in -radius..=radius {
            cur[axis] = base[axis] + d;
            delta[axis] = d;
            go(grid, radius, base, axis + 1, cur, delta, visit);
        }
    }
    let mut cur = cell_zero();
    let mut delta = cell_zero();
    go(grid, radius, cell, 0, &mut cur, &mut delta, &mut visit);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Periodic;

impl Periodic {
    fn resolve<Dm: Dim>(&self, grid: &Grid<Dm>, cell: &Cell) -> Cell {
        let mut resolved = cell_zero();
        for d in 0..Dm::DIM {
            let n = grid.n(d) as i64;
            resolved[d] = cell[d].rem_euclid(n);
        }
        resolved
    }
}

impl<Dm: Dim> BoundaryPolicy<Dm> for Periodic {
    fn kind(&self) -> BoundaryKind {
        BoundaryKind::Periodic
    }

    fn boundary_e(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        field[grid.to_index(&self.resolve(grid, cell))]
    }

    fn boundary_b(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        field[grid.to_index(&self.resolve(grid, cell))]
    }

    fn boundary_j(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        field[grid.to_index(&self.resolve(grid, cell))]
    }

    fn boundary_particle(&self, grid: &Grid<Dm>, cell: &mut Cell, _p: &mut Vector, _u: &mut Vector, force: bool) {
        if force || grid.is_outside(cell) {
            for d in 0..Dm::DIM {
                let n = grid.n(d) as i64;
                cell[d] = cell[d].rem_euclid(n);
            }
        }
    }

    fn for_all_neighbours(
        &self,
        grid: &Grid<Dm>,
        radius: i64,
        cell: &Cell,
        visit: &mut dyn FnMut(usize, Cell, Cell, MirrorFlags),
    ) {
        fn go<Dm: Dim>(
            grid: &Grid<Dm>,
            radius: i64,
            base: &Cell,
            axis: usize,
            cur: &mut Cell,
            delta: &mut Cell,
            visit: &mut dyn FnMut(usize, Cell, Cell, MirrorFlags),
        ) {
            if axis == Dm::DIM {
                visit(grid.to_index(cur), *cur, *delta, [false; 3]);
                return;
            }
            let n = grid.n(axis) as i64;
            for d in -radius..=radius {
                cur[axis] = (base[axis] + d).rem_euclid(n);
                delta[axis] = d;
                go(grid, radius, base, axis + 1, cur, delta, visit);
            }
        }
        let mut cur = cell_zero();
        let mut delta = cell_zero();
        go(grid, radius, cell, 0, &mut cur, &mut delta, visit);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflecting;

impl Reflecting {
    /// Resolves a possibly out-of-range cell, reporting which axes were
    /// reached by reflection.
    fn resolve<Dm: Dim>(&self, grid: &Grid<Dm>, cell: &Cell) -> (Cell, MirrorFlags) {
        let mut resolved = cell_zero();
        let mut mirrored = [false; 3];
        for d in 0..Dm::DIM {
            let n = grid.n(d) as i64;
            if cell[d] < 0 {
                resolved[d] = -cell[d] - 1;
                mirrored[d] = true;
            } else if cell[d] >= n {
                resolved[d] = 2 * n - cell[d] - 1;
                mirrored[d] = true;
            } else {
                resolved[d] = cell[d];
            }
        }
        (resolved, mirrored)
    }
}

impl<Dm: Dim> BoundaryPolicy<Dm> for Reflecting {
    fn kind(&self) -> BoundaryKind {
        BoundaryKind::Reflecting
    }

    fn boundary_e(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        let (resolved, mirrored) = self.resolve(grid, cell);
        let mut v = field[grid.to_index(&resolved)];
        for d in 0..Dm::DIM {
            if mirrored[d] {
                v[d] = -v[d];
            }
        }
        v
    }

    fn boundary_b(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        let (resolved, mirrored) = self.resolve(grid, cell);
        let mut v = field[grid.to_index(&resolved)];
        // In D<3, B lives entirely in the subspace perpendicular to the
        // simulated plane/line, so reflection across a simulated axis
        // never flips it; only in D=3 does a reflected axis flip B too.
        if Dm::DIM == 3 {
            for d in 0..Dm::DIM {
                if mirrored[d] {
                    v[d] = -v[d];
                }
            }
        }
        v
    }

    fn boundary_j(&self, grid: &Grid<Dm>, cell: &Cell, field: &[Vector]) -> Vector {
        // No sign flip: the Esirkepov depositor already encodes the
        // mirror sign into W via the flux factor at write time.
        let (resolved, _) = self.resolve(grid, cell);
        field[grid.to_index(&resolved)]
    }

    fn boundary_particle(&self, grid: &Grid<Dm>, cell: &mut Cell, p: &mut Vector, u: &mut Vector, force: bool) {
        if force || grid.is_outside(cell) {
            for d in 0..Dm::DIM {
                let n = grid.n(d) as i64;
                if cell[d] < 0 {
                    u[d] = -u[d];
                    p[d] = 1.0 - p[d];
                    cell[d] = -cell[d] - 1;
                } else if cell[d] >= n {
                    u[d] = -u[d];
                    p[d] = 1.0 - p[d];
                    cell[d] = 2 * n - cell[d] - 1;
                }
            }
        }
    }

    fn for_all_neighbours(
        &self,
        grid: &Grid<Dm>,
        radius: i64,
        cell: &Cell,
        visit: &mut dyn FnMut(usize, Cell, Cell, MirrorFlags),
    ) {
        fn go<Dm: Dim>(
            grid: &Grid<Dm>,
            radius: i64,
            base: &Cell,
            axis: usize,
            cur: &mut Cell,
            delta: &mut Cell,
            mirrored: &mut MirrorFlags,
            visit: &mut dyn FnMut(usize, Cell, Cell, MirrorFlags),
        ) {
            if axis == Dm::DIM {
                visit(grid.to_index(cur), *cur, *delta, *mirrored);
                return;
            }
            let n = grid.n(axis) as i64;
            for d in -radius..=radius {
                let raw = base[axis] + d;
                delta[axis] = d;
                if raw < 0 {
                    cur[axis] = -raw - 1;
                    mirrored[axis] = true;
                } else if raw >= n {
                    cur[axis] = 2 * n - raw - 1;
                    mirrored[axis] = true;
                } else {
                    cur[axis] = raw;
                    mirrored[axis] = false;
                }
                go(grid, radius, base, axis + 1, cur, delta, mirrored, visit);
            }
        }
        let mut cur = cell_zero();
        let mut delta = cell_zero();
        let mut mirrored = [false; 3];
        go(grid, radius, cell, 0, &mut cur, &mut delta, &mut mirrored, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::D1;
    use crate::grid::Grid;

    fn grid() -> Grid<D1> {
        Grid::new(&[8], &[1.0], 1.0, 1.0).unwrap()
    }

    #[test]
    fn periodic_wraps_negative_cell() {
        let g = grid();
        let field: Vec<Vector> = (0..8).map(|i| Vector::from([i as f64])).collect();
        let v = Periodic.boundary_e(&g, &[-1, 0, 0], &field);
        assert_eq!(v[0], 7.0);
    }

    #[test]
    fn reflecting_flips_e_on_mirrored_axis() {
        let g = grid();
        let field: Vec<Vector> = (0..8).map(|_| Vector::from([1.0])).collect();
        let v = Reflecting.boundary_e(&g, &[-1, 0, 0], &field);
        assert_eq!(v[0], -1.0);
    }

    #[test]
    fn reflecting_does_not_flip_j() {
        let g = grid();
        let field: Vec<Vector> = (0..8).map(|_| Vector::from([1.0])).collect();
        let v = Reflecting.boundary_j(&g, &[-1, 0, 0], &field);
        assert_eq!(v[0], 1.0);
    }

    #[test]
    fn reflecting_particle_bounces_off_lower_wall() {
        let g = grid();
        let mut cell: Cell = [-1, 0, 0];
        let mut p = Vector::from([0.3]);
        let mut u = Vector::from([-0.5]);
        Reflecting.boundary_particle(&g, &mut cell, &mut p, &mut u, false);
        assert_eq!(cell[0], 0);
        assert!((p[0] - 0.7).abs() < 1e-15);
        assert_eq!(u[0], 0.5);
    }

    #[test]
    fn periodic_neighbours_wrap_around() {
        let g = grid();
        let mut seen = Vec::new();
        Periodic.for_all_neighbours(&g, 1, &[0, 0, 0], &mut |idx, cell, delta, mirrored| {
            seen.push((idx, cell[0], delta[0], mirrored[0]));
        });
        assert!(seen.contains(&(7, 7, -1, false)));
        assert!(seen.contains(&(0, 0, 0, false)));
        assert!(seen.contains(&(1, 1, 1, false)));
    }

    #[test]
    fn reflecting_neighbours_report_mirrored_flag() {
        let g = grid();
        let mut seen = Vec::new();
        Reflecting.for_all_neighbours(&g, 1, &[0, 0, 0], &mut |idx, cell, delta, mirrored| {
            seen.push((idx, cell[0], delta[0], mirrored[0]));
        });
        assert!(seen.contains(&(0, 0, -1, true)));
        assert!(seen.contains(&(0, 0, 0, false)));
        assert!(seen.contains(&(1, 1, 1, false)));
    }
}

//! Relax a monolayer by moving atoms towards the centroid of their neighbours.
//!
//! Two atoms are neighbours if they are of the same species, lie in the same
//! plane and are closer than 1.5 lattice constants. Atoms at the edges of the
//! structure and atoms close to an anchor are fixed. Every other atom with an even
//! number of neighbours, at least six, is moved in-plane to their centroid.

use crate::coord::Coord;
use crate::error::{GrainError, Result};
use crate::structure::AtomicStructure;

use log::debug;
use std::cmp;

/// Neighbours are closer than this many lattice constants.
const NEIGHBOUR_CUTOFF: f64 = 1.5;

/// Atoms are in the same plane if their heights differ by less than this many
/// lattice constants.
const PLANE_TOLERANCE: f64 = 0.1;

/// Added to half a lattice constant to get the width of the fixed edge.
const EDGE_CORRECTION: f64 = 0.1;

/// Atoms need at least this many neighbours to be moved.
const MIN_NEIGHBOURS: usize = 6;

/// Relax a structure in place for a number of steps.
///
/// All atoms are moved at once in each step, using the positions from the start
/// of the step. Atoms within `0.1 * lattice_constant` of any of the `anchors`
/// are never moved.
///
/// Returns the total number of moves.
///
/// # Errors
/// Returns an error if the lattice constant is not positive.
pub fn relax(structure: &mut AtomicStructure, lattice_constant: f64, steps: usize,
        anchors: &[Coord]) -> Result<usize> {
    if lattice_constant.is_nan() || lattice_constant <= 0.0 {
        return Err(GrainError::InvalidParameter(
            format!("relaxation needs a positive lattice constant (got {})", lattice_constant)
        ));
    }

    if structure.is_empty() {
        return Ok(0);
    }

    let fixed = get_fixed_atoms(structure, lattice_constant, anchors);
    let mut num_moved = 0;

    for step in 0..steps {
        let positions: Vec<Coord> = structure.atoms.iter().map(|atom| atom.position).collect();
        let grid = NeighbourGrid::new(&positions, NEIGHBOUR_CUTOFF * lattice_constant);

        let updates: Vec<(usize, Coord)> = (0..positions.len())
            .filter(|&i| !fixed[i])
            .filter_map(|i| {
                let neighbours = get_neighbours(structure, &positions, &grid, i, lattice_constant);
                let num_neighbours = neighbours.len();

                if num_neighbours < MIN_NEIGHBOURS || num_neighbours % 2 != 0 {
                    return None;
                }

                let sum = neighbours.iter().fold(Coord::ORIGO, |acc, &j| acc + positions[j]);
                let centroid = sum * (1.0 / num_neighbours as f64);

                Some((i, Coord::new(centroid.x, centroid.y, positions[i].z)))
            })
            .collect();

        debug!("relaxation step {}: moved {} atoms", step + 1, updates.len());
        num_moved += updates.len();

        for (i, position) in updates {
            structure.atoms[i].position = position;
        }
    }

    Ok(num_moved)
}

/// Mark atoms close to the edges of the bounding box or to an anchor.
fn get_fixed_atoms(structure: &AtomicStructure, lattice_constant: f64, anchors: &[Coord])
        -> Vec<bool> {
    let (min, max) = bounding_box(structure.atoms.iter().map(|atom| atom.position));
    let margin = lattice_constant / 2.0 + EDGE_CORRECTION;
    let anchor_cutoff = PLANE_TOLERANCE * lattice_constant;

    structure.atoms
        .iter()
        .map(|atom| {
            let Coord { x, y, .. } = atom.position;

            x < min.x + margin || x > max.x - margin || y < min.y + margin || y > max.y - margin
                || anchors.iter().any(|&anchor| atom.position.distance(anchor) < anchor_cutoff)
        })
        .collect()
}

fn get_neighbours(structure: &AtomicStructure, positions: &[Coord], grid: &NeighbourGrid,
        i: usize, lattice_constant: f64) -> Vec<usize> {
    let position = positions[i];
    let species = &structure.atoms[i].species;

    grid.candidates(&position)
        .into_iter()
        .filter(|&j| {
            let other = positions[j];

            j != i
                && structure.atoms[j].species == *species
                && (other.z - position.z).abs() < PLANE_TOLERANCE * lattice_constant
                && other.distance(position) < NEIGHBOUR_CUTOFF * lattice_constant
        })
        .collect()
}

fn bounding_box<I: Iterator<Item=Coord>>(coords: I) -> (Coord, Coord) {
    coords.fold(
        (Coord::new(std::f64::INFINITY, std::f64::INFINITY, std::f64::INFINITY),
         Coord::new(std::f64::NEG_INFINITY, std::f64::NEG_INFINITY, std::f64::NEG_INFINITY)),
        |(min, max), c| (
            Coord::new(min.x.min(c.x), min.y.min(c.y), min.z.min(c.z)),
            Coord::new(max.x.max(c.x), max.y.max(c.y), max.z.max(c.z)),
        )
    )
}

/// A cell list in the x-y plane: atom indices binned by position with a bin
/// size equal to the neighbour cutoff, so that all neighbours of an atom are
/// found in its own and the eight surrounding bins.
struct NeighbourGrid {
    origin: (f64, f64),
    spacing: f64,
    shape: (usize, usize),
    cells: Vec<Vec<usize>>,
}

impl NeighbourGrid {
    fn new(positions: &[Coord], spacing: f64) -> NeighbourGrid {
        let (min, max) = bounding_box(positions.iter().cloned());
        let nx = cmp::max(1, ((max.x - min.x) / spacing).ceil() as usize);
        let ny = cmp::max(1, ((max.y - min.y) / spacing).ceil() as usize);

        let mut grid = NeighbourGrid {
            origin: (min.x, min.y),
            spacing,
            shape: (nx, ny),
            cells: vec![Vec::new(); nx * ny],
        };

        for (i, coord) in positions.iter().enumerate() {
            let (col, row) = grid.col_row(coord);
            let index = grid.cell_at_position(col, row);
            grid.cells[index].push(i);
        }

        grid
    }

    fn cell_at_position(&self, col: usize, row: usize) -> usize {
        let (nx, _) = self.shape;
        row * nx + col
    }

    fn col_row(&self, coord: &Coord) -> (usize, usize) {
        let (nx, ny) = self.shape;
        let col = ((coord.x - self.origin.0) / self.spacing).floor().max(0.0) as usize;
        let row = ((coord.y - self.origin.1) / self.spacing).floor().max(0.0) as usize;

        (cmp::min(col, nx - 1), cmp::min(row, ny - 1))
    }

    fn candidates(&self, coord: &Coord) -> Vec<usize> {
        let (nx, ny) = self.shape;
        let (i, j) = self.col_row(coord);
        let (i, j) = (i as isize, j as isize);

        let (imin, imax) = (cmp::max(0, i - 1), cmp::min(nx as isize, i + 2));
        let (jmin, jmax) = (cmp::max(0, j - 1), cmp::min(ny as isize, j + 2));

        let mut candidates = Vec::new();

        for col in imin..imax {
            for row in jmin..jmax {
                let index = self.cell_at_position(col as usize, row as usize);
                candidates.extend_from_slice(&self.cells[index]);
            }
        }

        candidates
    }
}

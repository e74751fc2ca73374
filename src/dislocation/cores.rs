//! Fuse two regular polygons into a decorated dislocation core.

use crate::coord::{Coord, Translate};
use crate::dislocation::DefectType;
use crate::material::CoreSpecies;
use crate::polygon::RegularPolygon;
use crate::structure::{Atom, AtomicStructure, Cell};

use log::debug;
use std::f64::consts::PI;

/// Atoms of a finished core which are closer than this are duplicates.
const DUPLICATE_CUTOFF: f64 = 0.5;

/// Construct a dislocation core for a lattice constant `a`.
///
/// The first ring is decorated starting with `species[0]`, the second ring with
/// the species given by the defect recipe. Species with a nonzero separation are
/// split into two atoms placed symmetrically above and below the middle plane.
///
/// The core is returned in an orthorhombic cell of size `(2a, 3a√3/2, 2a)` with its
/// first atom at the top of the cell and its middle plane at half the cell height.
pub fn build_core(defect: DefectType, a: f64, species: &[CoreSpecies; 2]) -> AtomicStructure {
    let recipe = defect.recipe();
    let alignment = recipe.alignment;

    let first = RegularPolygon::new(recipe.sides.0, a);
    let mut second = RegularPolygon::new(recipe.sides.1, a);

    if alignment.flip {
        second.rotate(PI, None);
    }

    let dy = first.vertices[alignment.first_vertex].y - second.vertices[alignment.second_vertex].y;
    second.translate_in_place(Coord::new(0.0, dy, 0.0));

    let mut atoms = decorate(&first, species, 0);
    atoms.extend(decorate(&second, species, recipe.second_start));

    for &i in recipe.deletions {
        if i < atoms.len() {
            atoms.remove(i);
        }
    }

    let cell = Cell::orthorhombic(2.0 * a, 3.0 * a * 3.0f64.sqrt() / 2.0, 2.0 * a);
    let top = atoms.first().map(|atom| atom.position.y).unwrap_or(0.0);

    let mut core = AtomicStructure::new(atoms, cell)
        .with_lattice_constants(Coord::new(a, a, 2.0 * a))
        .translate(Coord::new(a, cell[1].y - top, a));

    let num_removed = core.remove_duplicates(DUPLICATE_CUTOFF);
    debug!("built {} core with {} atoms ({} duplicates removed)", defect, core.len(), num_removed);

    core
}

/// Place atoms on the vertices of a polygon, alternating between the two species
/// of the table. Odd polygons cannot alternate all the way around, so the species
/// is flipped an extra time at the vertex halfway around the ring.
fn decorate(polygon: &RegularPolygon, species: &[CoreSpecies; 2], start: usize) -> Vec<Atom> {
    let seam = (polygon.sides + 1) / 2;
    let mut current = start % 2;
    let mut atoms = Vec::new();

    for (i, vertex) in polygon.vertices.iter().enumerate() {
        if polygon.is_odd() && i == seam {
            current = 1 - current;
        }

        let entry = &species[current];
        let dz = entry.separation / 2.0;

        if entry.separation > 0.0 {
            atoms.push(Atom::new(&entry.species, Coord::new(vertex.x, vertex.y, -dz)));
            atoms.push(Atom::new(&entry.species, Coord::new(vertex.x, vertex.y, dz)));
        } else {
            atoms.push(Atom::new(&entry.species, Coord::new(vertex.x, vertex.y, 0.0)));
        }

        current = 1 - current;
    }

    atoms
}

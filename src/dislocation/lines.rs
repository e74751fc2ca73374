//! Insert a dislocation core at the edge of a strip of monolayer.

use crate::coord::{Coord, Direction, Translate};
use crate::dislocation::{build_core, DefectType};
use crate::error::{GrainError, Result};
use crate::material::{CoreSpecies, Material, Polarity};
use crate::structure::AtomicStructure;

use log::debug;
use std::f64;

/// Atoms left of this after shifting the strip are cut to make room for the core.
const CUT_EPS: f64 = 1e-4;

/// Construct a dislocation line: a strip of `2 * (rows - 1)` rows of monolayer
/// two unit cells wide, with a core of the input type at one edge.
///
/// With `Polarity::CentralFirst` the core leads with the central species and sits
/// at the top edge of the cell. With `Polarity::PeripheralFirst` the roles of the
/// core are swapped and the whole line is mirrored, placing the core at the
/// bottom edge.
///
/// # Errors
/// Returns an error if `rows < 2`, or if the monolayer of the material is empty.
pub fn build_line(defect: DefectType, material: &Material, rows: usize, polarity: Polarity)
        -> Result<AtomicStructure> {
    if rows < 2 {
        return Err(GrainError::InvalidParameter(
            format!("a dislocation line needs at least 2 rows (got {})", rows)
        ));
    }

    let a = material.lattice_constant();
    let mut line = material.primitive.clone();
    line.to_monolayer();

    let separation = material.peripheral_separation(&line);
    let mut species = [
        CoreSpecies::new(&material.roles.central, 0.0),
        CoreSpecies::new(&material.roles.peripheral, separation),
    ];

    line.repeat(2, 2 * (rows - 1), 1);
    line.to_orthorhombic();
    let plane = material.middle_plane(&line).unwrap_or(0.0);

    if polarity == Polarity::PeripheralFirst {
        species.swap(0, 1);
        line.reflect(0.0, Direction::Y);
    }

    let mut core = build_core(defect, a, &species);
    let dz = plane - core.cell[2].z / 2.0;
    core.translate_in_place(Coord::new(0.0, 0.0, dz));

    let top = line.max_atom(Direction::Y, None)
        .map(|atom| atom.position)
        .ok_or_else(|| GrainError::InvalidParameter(
            "the monolayer of the primitive cell has no atoms".to_string()
        ))?;

    line.translate_in_place(Coord::new(-a / 2.0, -top.y, 0.0));
    line.remove_atoms(f64::NEG_INFINITY, CUT_EPS, Direction::X);
    line += &core;

    if polarity == Polarity::PeripheralFirst {
        line.reflect(0.0, Direction::Y);
    }

    let core_height = core.cell[1].y;
    line.cell[1] = Coord::new(0.0, line.cell[1].y + core_height, 0.0);

    let shift = match polarity {
        Polarity::PeripheralFirst => core_height,
        Polarity::CentralFirst => line.cell[1].y - core_height,
    };
    line.translate_in_place(Coord::new(0.0, shift, 0.0));

    debug!("built {} dislocation line with polarity {} and {} atoms", defect, polarity, line.len());

    Ok(line)
}

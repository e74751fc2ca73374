//! A single dislocation between two mirrored domains.

use crate::boundary::{boundary_distance, misorientation, BoundaryConf};
use crate::coord::{Coord, Direction, Translate};
use crate::dislocation::build_line;
use crate::error::{GrainError, Result};
use crate::material::{Material, Polarity};
use crate::structure::{AtomicStructure, Cell, Pbc, Pivot};

use log::{debug, info};
use std::f64;

/// Construct a grain boundary with one dislocation core per period along y.
///
/// A domain `columns` unit cells wide is rotated by half the misorientation angle
/// and cut to a cell whose height fits one core. A dislocation line is placed at
/// its right edge and the result is mirrored about that edge, doubling the width
/// of the cell. Atoms which overlap at the mirror plane are merged. The ribbon is
/// periodic along y only.
///
/// # Errors
/// Returns an error if `rows < 2` or `columns < 1`, or if the domain contains
/// no atoms of the central species to anchor the line against.
pub fn nanoribbon(material: &Material, conf: &BoundaryConf) -> Result<AtomicStructure> {
    conf.validate(1)?;

    let BoundaryConf { defect, rows, columns, strain } = *conf;
    let a = material.lattice_constant();
    let angle = misorientation(rows) / 2.0;

    let mut domain = material.primitive.clone();
    domain.repeat(columns, 2 * rows, 1);
    domain.to_monolayer();
    domain.to_orthorhombic();

    let width = domain.cell[0].x;
    let height = boundary_distance(rows, a);
    let cell = Cell::new(domain.cell[0], Coord::new(0.0, height, 0.0), domain.cell[2]);

    // Over-tile to cover the cell after rotating
    domain.repeat(3, 3, 1);
    domain.rotate(angle, Pivot::CellCenter, false);
    domain.translate_in_place(Coord::new(-width, -height, 0.0));
    domain.set_cell(cell);

    domain.remove_atoms(f64::NEG_INFINITY, 0.0, Direction::X);
    domain.remove_atoms(width, f64::INFINITY, Direction::X);
    domain.remove_atoms(f64::NEG_INFINITY, 0.0, Direction::Y);
    domain.remove_atoms(height, f64::INFINITY, Direction::Y);

    let anchor = domain.max_atom(Direction::X, Some(&material.roles.central))
        .map(|atom| atom.position)
        .ok_or_else(|| missing_anchor(&material.roles.central))?;

    domain.translate_in_place(Coord::new(width - anchor.x + strain / 4.0, 0.0, 0.0));
    debug!("anchored dislocation line at ({:.3}, {:.3})", width + strain / 4.0, anchor.y);

    let mut line = build_line(defect, material, rows, Polarity::CentralFirst)?;
    let top = line.max_atom(Direction::Y, None)
        .map(|atom| atom.position)
        .ok_or_else(|| missing_anchor("any"))?;
    line.translate_in_place(Coord::new(width - top.x, anchor.y - top.y, 0.0));

    domain.remove_atoms(width - a + strain / 4.0 + 0.1, f64::INFINITY, Direction::X);
    domain += &line;
    domain.wrap(Pbc::Y);

    domain.mirror(Direction::X);
    let num_merged = domain.merge_near_duplicates(width, domain.min_lattice_constant());
    debug!("merged {} overlapping atom pairs at the mirror plane", num_merged);

    // The ribbon ends at both edges of the cell along x
    domain.pbc = Pbc::Y;

    info!("built a {} nanoribbon of {} atoms ({} rows, {} columns, strain {})",
        defect, domain.len(), rows, columns, strain);

    Ok(domain)
}

pub(crate) fn missing_anchor(species: &str) -> GrainError {
    GrainError::InvalidParameter(
        format!("found no atoms of {} species to anchor the dislocation line", species)
    )
}

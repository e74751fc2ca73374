//! Grain boundaries which are periodic in both in-plane directions.

use crate::boundary::nanoribbon::missing_anchor;
use crate::boundary::{misorientation, nanoribbon, BoundaryConf};
use crate::coord::{Coord, Direction, Translate};
use crate::dislocation::build_line;
use crate::error::Result;
use crate::material::{Material, Polarity};
use crate::structure::{Atom, AtomicStructure, Cell, Pbc, Pivot};

use log::{debug, info};
use std::f64;

/// Atoms this close to the upper edge of the doubled cell are images of atoms
/// at its lower edge.
const EDGE_EPS: f64 = 0.01;

/// Construct a grain boundary with a single dislocation core per period, which
/// is periodic along both x and y.
///
/// The domain is a fan of `columns` strips which are rotated by a decreasing angle,
/// from zero at the far edge to nearly half the misorientation angle next to the
/// dislocation line. The fan is mirrored about the line, which is closed by capping
/// atoms on both of its sides, and the cell is doubled along x. A positive strain
/// shrinks the cell by `strain / 2` per boundary side.
///
/// # Errors
/// Returns an error if `rows < 2` or `columns < 2`, or if the fan has no atoms of
/// the anchoring species.
pub fn periodic_single(material: &Material, conf: &BoundaryConf, polarity: Polarity)
        -> Result<AtomicStructure> {
    conf.validate(2)?;

    let BoundaryConf { defect, rows, columns, strain } = *conf;
    let a = material.lattice_constant();
    let angle = misorientation(rows) / 2.0;

    let mut strip = material.primitive.clone();
    strip.to_monolayer();
    strip.repeat(1, 2 * rows + 1, 1);
    strip.to_orthorhombic();

    let fan_angle = angle / (columns - 1) as f64;
    let sign = match polarity {
        Polarity::CentralFirst => -1.0,
        Polarity::PeripheralFirst => 1.0,
    };

    let mut domain = strip.clone();
    for i in 1..columns {
        let mut rotated = strip.clone();
        rotated.rotate(-(i as f64) * fan_angle, Pivot::CellCenter, false);
        rotated.translate_in_place(Coord::new(sign * i as f64 * a, 0.0, 0.0));
        domain += &rotated;
    }

    let domain_width = columns as f64 * a;

    match polarity {
        Polarity::CentralFirst => {
            domain.translate_in_place(Coord::new(domain_width - a, 0.0, 0.0));
        },
        Polarity::PeripheralFirst => {
            domain.translate_in_place(Coord::new(-a / 2.0 - domain_width, 0.0, 0.0));
            domain.reflect(0.0, Direction::X);
        },
    }

    domain.cell[0] = Coord::new(domain_width, 0.0, 0.0);

    let anchor_species = match polarity {
        Polarity::CentralFirst => &material.roles.peripheral,
        Polarity::PeripheralFirst => &material.roles.central,
    };
    let anchor = domain.min_atom(Direction::X, Some(anchor_species))
        .map(|atom| atom.position)
        .ok_or_else(|| missing_anchor(anchor_species))?;

    let mut line = build_line(defect, material, rows, polarity)?;

    let (bottom, top, second) = {
        let sorted = line.sorted_along(Direction::Y, polarity == Polarity::PeripheralFirst);
        let n = sorted.len();

        if n < 2 {
            return Err(missing_anchor("any"));
        }

        (sorted[0].position, sorted[n - 1].position, sorted[n - 2].position)
    };

    let caps = capping_atoms(material, polarity, angle, top, second);
    line += &caps;

    let line_width = a * (angle / 2.0).cos();
    let dx = bottom.x - anchor.x;
    line.translate_in_place(Coord::new(-line_width, anchor.y - bottom.y, 0.0));

    let shift = dx - strain / 2.0;
    domain.cell[0].x += shift;
    domain.translate_in_place(Coord::new(shift, 0.0, 0.0));

    let mut left = domain.clone();
    left.reflect(0.0, Direction::X);

    domain += &line;
    domain += &left;

    let half_width = domain.cell[0].x;
    domain.translate_in_place(Coord::new(half_width, 0.0, 0.0));
    domain.cell[0].x = 2.0 * half_width;
    domain.remove_atoms(domain.cell[0].x - EDGE_EPS, f64::INFINITY, Direction::X);

    info!("built a {} periodic boundary with polarity {} of {} atoms ({} rows, {} columns, strain {})",
        defect, polarity, domain.len(), rows, columns, strain);

    Ok(domain)
}

/// Atoms which close the bonds of a dislocation line against the fan: one per side
/// for `CentralFirst`, two per side for `PeripheralFirst`. They are placed one
/// lattice constant from the top atom of the line, rotated by the negative half
/// misorientation angle and mirrored about the line.
fn capping_atoms(material: &Material, polarity: Polarity, angle: f64, top: Coord, second: Coord)
        -> AtomicStructure {
    let a = material.lattice_constant();

    let (species, heights) = match polarity {
        Polarity::CentralFirst => (&material.roles.central, vec![top.z]),
        Polarity::PeripheralFirst => (&material.roles.peripheral, vec![top.z, second.z]),
    };

    let atoms = heights.into_iter()
        .map(|z| Atom::new(species, Coord::new(a, 0.0, z)))
        .collect();

    let mut caps = AtomicStructure::new(atoms, Cell::orthorhombic(1.0, 1.0, 1.0));
    caps.rotate(-angle, Pivot::CellCenter, false);

    let mut mirrored = caps.clone();
    mirrored.reflect(0.0, Direction::X);
    caps += &mirrored;

    caps.translate(Coord::new(top.x, top.y, 0.0))
}

/// Construct a grain boundary with two dislocation cores of opposite polarity per
/// period, which is periodic along both x and y.
///
/// A nanoribbon is closed by a second dislocation line anchored at its rightmost
/// peripheral atom. The result is mirrored about the new line and cropped to a
/// cell which holds one core of each polarity.
///
/// # Errors
/// Returns an error if `rows < 2` or `columns < 1`.
pub fn periodic(material: &Material, conf: &BoundaryConf) -> Result<AtomicStructure> {
    conf.validate(1)?;

    let BoundaryConf { defect, rows, columns, strain } = *conf;
    let a = material.lattice_constant();

    let mut boundary = nanoribbon(material, conf)?;
    let ribbon_width = boundary.cell[0].x / 2.0;

    let anchor = boundary.max_atom(Direction::X, Some(&material.roles.peripheral))
        .map(|atom| atom.position)
        .ok_or_else(|| missing_anchor(&material.roles.peripheral))?;
    let plane = anchor.x - strain / 4.0;

    let mut line = build_line(defect, material, rows, Polarity::PeripheralFirst)?;
    let bottom = line.min_atom(Direction::Y, None)
        .map(|atom| atom.position)
        .ok_or_else(|| missing_anchor("any"))?;
    line.translate_in_place(Coord::new(plane - bottom.x, anchor.y - bottom.y, 0.0));

    boundary.remove_atoms(plane - a + 0.1, f64::INFINITY, Direction::X);
    boundary += &line;
    boundary.wrap(Pbc::Y);

    let mut right = boundary.clone();
    right.reflect(plane, Direction::X);
    boundary += &right;

    let num_merged = boundary.merge_near_duplicates(plane, boundary.min_lattice_constant());
    debug!("merged {} overlapping atom pairs at the second dislocation", num_merged);

    let width = 2.0 * (plane - ribbon_width);
    boundary.cell[0] = Coord::new(width, 0.0, 0.0);

    boundary.translate_in_place(Coord::new(-width / 4.0, 0.0, 0.0));
    boundary.remove_atoms(f64::NEG_INFINITY, 0.0, Direction::X);
    boundary.remove_atoms(width, f64::INFINITY, Direction::X);
    boundary.pbc = Pbc::X | Pbc::Y;

    info!("built a {} periodic boundary with two cores of {} atoms ({} rows, {} columns, strain {})",
        defect, boundary.len(), rows, columns, strain);

    Ok(boundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dislocation::DefectType;
    use crate::material::tests::setup_mos2;
    use approx::assert_relative_eq;

    #[test]
    fn periodic_single_needs_two_columns() {
        let material = setup_mos2();
        let conf = BoundaryConf::new(DefectType::FiveSeven, 3, 1);

        assert!(periodic_single(&material, &conf, Polarity::CentralFirst).is_err());
    }

    #[test]
    fn periodic_single_atoms_lie_within_the_doubled_cell() {
        let material = setup_mos2();
        let conf = BoundaryConf::new(DefectType::FiveSeven, 3, 3);

        for &polarity in &[Polarity::CentralFirst, Polarity::PeripheralFirst] {
            let boundary = periodic_single(&material, &conf, polarity).unwrap();
            let width = boundary.cell[0].x;

            assert!(width > 0.0);
            assert!(!boundary.is_empty());
            assert!(boundary.atoms.iter().all(|atom| atom.position.x <= width - EDGE_EPS));
        }
    }

    #[test]
    fn periodic_single_strain_shrinks_the_cell() {
        let material = setup_mos2();
        let conf = BoundaryConf::new(DefectType::FiveSeven, 3, 3);

        let relaxed = periodic_single(&material, &conf, Polarity::CentralFirst).unwrap();
        let strained = periodic_single(&material, &conf.with_strain(0.4), Polarity::CentralFirst)
            .unwrap();

        assert_relative_eq!(relaxed.cell[0].x - 0.4, strained.cell[0].x, epsilon = 1e-9);
        assert_eq!(relaxed.cell[1], strained.cell[1]);
    }

    #[test]
    fn capping_atoms_are_mirrored_about_the_line() {
        let material = setup_mos2();
        let top = Coord::new(2.0, 5.0, 4.0);
        let second = Coord::new(2.0, 4.0, 1.5);

        let caps = capping_atoms(&material, Polarity::CentralFirst, 0.0, top, second);
        assert_eq!(2, caps.len());
        assert_eq!(vec!["Mo".to_string()], caps.species());

        let caps = capping_atoms(&material, Polarity::PeripheralFirst, 0.1, top, second);
        assert_eq!(4, caps.len());
        assert_eq!(vec!["S".to_string()], caps.species());

        // Mirrored pairs have the same distance to the line through the top atom
        for (atom, image) in caps.atoms[..2].iter().zip(caps.atoms[2..].iter()) {
            assert_relative_eq!(atom.position.x - top.x, top.x - image.position.x, epsilon = 1e-9);
            assert_relative_eq!(atom.position.y, image.position.y, epsilon = 1e-9);
            assert_relative_eq!(atom.position.z, image.position.z, epsilon = 1e-9);
        }

        assert_relative_eq!(4.0, caps.atoms[0].position.z);
        assert_relative_eq!(1.5, caps.atoms[1].position.z);
    }

    /// Width of the periodic cell: twice the distance from the first dislocation to
    /// the rightmost peripheral atom of the nanoribbon, less the strain.
    fn expected_width(ribbon: &AtomicStructure, strain: f64) -> (f64, f64) {
        let plane = ribbon.max_atom(Direction::X, Some("S")).unwrap().position.x - strain / 4.0;
        (plane, 2.0 * (plane - ribbon.cell[0].x / 2.0))
    }

    #[test]
    fn periodic_boundary_shares_the_height_of_the_nanoribbon() {
        let material = setup_mos2();
        let conf = BoundaryConf::new(DefectType::FiveSeven, 3, 4);

        let ribbon = nanoribbon(&material, &conf).unwrap();
        let boundary = periodic(&material, &conf).unwrap();

        assert_eq!(ribbon.cell[1], boundary.cell[1]);
        assert_eq!(Pbc::X | Pbc::Y, boundary.pbc);

        let (_, width) = expected_width(&ribbon, 0.0);
        assert_relative_eq!(width, boundary.cell[0].x, epsilon = 1e-9);
        assert!(boundary.atoms.iter().all(|atom| {
            atom.position.x >= 0.0 && atom.position.x <= width
        }));
    }

    #[test]
    fn periodic_boundary_keeps_the_nanoribbon_up_to_the_second_dislocation() {
        let material = setup_mos2();
        let a = material.lattice_constant();
        let conf = BoundaryConf::new(DefectType::FiveSeven, 3, 4);

        let ribbon = nanoribbon(&material, &conf).unwrap();
        let boundary = periodic(&material, &conf).unwrap();
        let (plane, width) = expected_width(&ribbon, 0.0);

        // The first dislocation and the domain to its right are shifted by a quarter cell
        let shift = Coord::new(width / 4.0, 0.0, 0.0);
        let kept: Vec<&Atom> = ribbon.atoms
            .iter()
            .filter(|atom| atom.position.x > width / 4.0 + 0.01 && atom.position.x < plane - 2.0 * a)
            .collect();

        assert!(!kept.is_empty());
        for atom in kept.iter() {
            assert!(boundary.atoms.iter().any(|other| {
                other.species == atom.species && other.position == atom.position - shift
            }));
        }

        // The second dislocation fills the cell beyond the kept domain
        let beyond = plane - 2.0 * a - width / 4.0;
        let species: Vec<&str> = boundary.atoms
            .iter()
            .filter(|atom| atom.position.x > beyond)
            .map(|atom| atom.species.as_str())
            .collect();

        assert!(boundary.len() > kept.len());
        assert!(species.contains(&"Mo"));
        assert!(species.contains(&"S"));
    }

    #[test]
    fn periodic_boundary_strain_shrinks_the_cell() {
        let material = setup_mos2();
        let conf = BoundaryConf::new(DefectType::FiveSeven, 3, 4);
        let strain = 0.4;

        let relaxed = periodic(&material, &conf).unwrap();
        let strained = periodic(&material, &conf.with_strain(strain)).unwrap();

        let ribbon = nanoribbon(&material, &conf.with_strain(strain)).unwrap();
        let (_, width) = expected_width(&ribbon, strain);

        assert_relative_eq!(width, strained.cell[0].x, epsilon = 1e-9);
        assert_relative_eq!(relaxed.cell[0].x - strain, strained.cell[0].x, epsilon = 1e-6);
        assert_eq!(relaxed.cell[1], strained.cell[1]);
    }

    #[test]
    fn periodic_boundary_has_no_overlaps_across_the_cell() {
        let material = setup_mos2();
        let a = material.lattice_constant();

        for &defect in DefectType::ALL.iter() {
            let boundary = periodic(&material, &BoundaryConf::new(defect, 3, 4)).unwrap();

            // Distances use the minimum image along both periodic axes
            let mut copy = boundary.clone();
            assert_eq!(0, copy.remove_duplicates(a / 3.0), "overlaps in a {} boundary", defect);
        }
    }
}

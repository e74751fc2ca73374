//! Lateral heterostructures of two materials joined by dislocation lines.

use crate::boundary::nanoribbon::missing_anchor;
use crate::boundary::{periodic_single, BoundaryConf};
use crate::coord::{Coord, Translate};
use crate::error::Result;
use crate::material::{Material, Polarity};
use crate::structure::AtomicStructure;

use log::{debug, info};

/// Construct a lateral heterostructure of the two materials.
///
/// Material `a` should have the larger lattice constant. Two periodic boundaries
/// of `a` (with the peripheral species leading the lower core, the central species
/// leading the upper core) are stacked along y and a slab of material `b` is added
/// above and below them. The strain of the boundaries is set such that the cell
/// width of `a` matches `2 * (columns + 1)` unit cells of `b`, and `b` is aligned
/// with `a` on the height of the central species. The strain of the input
/// configuration is not used.
///
/// # Errors
/// Returns an error if `rows < 2` or `columns < 2`, or if either material has no
/// central species left after cutting its monolayer.
pub fn heterostructure(a: &Material, b: &Material, conf: &BoundaryConf)
        -> Result<AtomicStructure> {
    let BoundaryConf { rows, columns, .. } = *conf;

    let unstrained = periodic_single(a, &conf.with_strain(0.0), Polarity::CentralFirst)?;
    let strain = unstrained.cell[0].x - 2.0 * (columns + 1) as f64 * b.lattice_constant();
    debug!("heterostructure strain: {:.4}", strain);

    let strained = conf.with_strain(strain);
    let lower = periodic_single(a, &strained, Polarity::PeripheralFirst)?;
    let upper = periodic_single(a, &strained, Polarity::CentralFirst)?
        .translate(Coord::new(0.0, lower.cell[1].y, 0.0));

    let mut structure = lower.clone();
    structure += &upper;
    structure.cell[1] = structure.cell[1] * 2.0;

    let mut slab = b.primitive.clone();
    slab.repeat(2 * (columns + 1), 2 * rows, 1);
    slab.to_monolayer();
    slab.to_orthorhombic();

    let height_a = a.first_central_height(&lower)
        .ok_or_else(|| missing_anchor(&a.roles.central))?;
    let height_b = b.first_central_height(&slab)
        .ok_or_else(|| missing_anchor(&b.roles.central))?;
    let dz = height_a - height_b;

    let slab_height = slab.cell[1].y;
    let slab_above = slab.clone()
        .translate(Coord::new(-b.lattice_constant() / 2.0, structure.cell[1].y, dz));
    let slab_below = slab
        .translate(Coord::new(-b.lattice_constant() / 2.0, -slab_height, dz));

    structure += &slab_above;
    structure += &slab_below;

    structure.translate_in_place(Coord::new(0.0, slab_height, 0.0));
    structure.cell[1] = structure.cell[1] + Coord::new(0.0, 2.0 * slab_height, 0.0);

    info!("built a {} heterostructure of {} atoms ({} rows, {} columns)",
        conf.defect, structure.len(), rows, columns);

    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dislocation::DefectType;
    use crate::material::tests::setup_mos2;
    use crate::structure::Atom;
    use approx::assert_relative_eq;

    /// MoS2 with a smaller lattice constant and tungsten as the central species.
    fn setup_ws2() -> Material {
        let mut material = setup_mos2();
        let scale = 3.10 / material.lattice_constant();

        for vector in material.primitive.cell.0.iter_mut() {
            vector.x *= scale;
            vector.y *= scale;
        }
        material.primitive.lattice_constants.x *= scale;
        material.primitive.lattice_constants.y *= scale;

        material.primitive.atoms = material.primitive.atoms
            .iter()
            .map(|atom| {
                let species = if atom.species == "Mo" { "W" } else { "S" };
                let position = Coord::new(atom.position.x * scale, atom.position.y * scale, atom.position.z);
                Atom::new(species, position)
            })
            .collect();

        Material::detect(material.primitive).unwrap()
    }

    #[test]
    fn heterostructure_stacks_two_boundaries_between_two_slabs() {
        let a = setup_mos2();
        let b = setup_ws2();
        let conf = BoundaryConf::new(DefectType::FiveSeven, 3, 3);

        let structure = heterostructure(&a, &b, &conf).unwrap();
        let boundary = periodic_single(&a, &conf, Polarity::CentralFirst).unwrap();

        // The strained boundary matches the width of 8 unit cells of the second material
        let strain = boundary.cell[0].x - 8.0 * 3.10;
        let strained = conf.with_strain(strain);

        let lower = periodic_single(&a, &strained, Polarity::CentralFirst).unwrap();
        assert_relative_eq!(8.0 * 3.10, lower.cell[0].x, epsilon = 1e-9);

        let upper = periodic_single(&a, &strained, Polarity::PeripheralFirst).unwrap();
        assert_relative_eq!(upper.cell[0].x, structure.cell[0].x, epsilon = 1e-9);

        let slab_height = 2.0 * 3.0 * 3.10 * 3.0f64.sqrt() / 2.0;
        assert_relative_eq!(2.0 * boundary.cell[1].y + 2.0 * slab_height, structure.cell[1].y,
            epsilon = 1e-9);

        let species = structure.species();
        assert!(species.contains(&"Mo".to_string()));
        assert!(species.contains(&"W".to_string()));
    }

    #[test]
    fn heterostructure_aligns_the_central_planes() {
        let a = setup_mos2();
        let b = setup_ws2();
        let conf = BoundaryConf::new(DefectType::FiveSeven, 3, 3);

        let structure = heterostructure(&a, &b, &conf).unwrap();

        let mo = structure.atoms.iter().find(|atom| atom.species == "Mo").unwrap();
        let w = structure.atoms.iter().find(|atom| atom.species == "W").unwrap();
        assert_relative_eq!(mo.position.z, w.position.z, epsilon = 1e-9);
    }
}

//! Materials: a primitive cell together with the chemical roles of its species.
//!
//! The builders distinguish two roles. The *central* species is the host lattice
//! site (the transition metal of a dichalcogenide) and lies in the middle plane of a
//! monolayer. The *peripheral* species caps or bridges the central sites and may be
//! split into two sub-layers above and below the middle plane.

use crate::coord::{Coord, Direction};
use crate::error::{GrainError, Result};
use crate::structure::AtomicStructure;

use log::debug;
use std::fmt;
use std::str::FromStr;

/// Species recognized as central when detecting roles.
pub const CENTRAL_SPECIES: &[&str] = &["Mo", "W"];

/// Species recognized as peripheral when detecting roles.
pub const PERIPHERAL_SPECIES: &[&str] = &["S", "Se"];

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
/// The species which play the central and peripheral roles of a material.
pub struct Roles {
    pub central: String,
    pub peripheral: String,
}

impl Roles {
    pub fn new(central: &str, peripheral: &str) -> Roles {
        Roles {
            central: central.to_string(),
            peripheral: peripheral.to_string(),
        }
    }

    /// Detect the roles of a structure from the known species tables. The first
    /// species (in atom order) which matches a role is assigned to it.
    ///
    /// # Errors
    /// Returns an error naming the missing role if either role has no match.
    pub fn detect(structure: &AtomicStructure) -> Result<Roles> {
        let species = structure.species();

        let find = |known: &[&str], role: &'static str| {
            species.iter()
                .find(|s| known.contains(&s.as_str()))
                .cloned()
                .ok_or_else(|| GrainError::MissingRole { role, species: species.clone() })
        };

        let central = find(CENTRAL_SPECIES, "central")?;
        let peripheral = find(PERIPHERAL_SPECIES, "peripheral")?;

        Ok(Roles { central, peripheral })
    }

    /// Assert that both role species exist in a structure.
    ///
    /// # Errors
    /// Returns an error naming the first missing role.
    pub fn validate(&self, structure: &AtomicStructure) -> Result<()> {
        let species = structure.species();

        for &(role, name) in [("central", &self.central), ("peripheral", &self.peripheral)].iter() {
            if !species.contains(name) {
                return Err(GrainError::MissingRole { role, species });
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
/// A primitive cell and its role table.
pub struct Material {
    /// Primitive (bulk) cell of the material.
    pub primitive: AtomicStructure,
    /// Chemical roles of the species.
    pub roles: Roles,
}

impl Material {
    /// Couple a primitive cell with an explicit role table.
    ///
    /// # Errors
    /// Returns an error if a role species is not present in the cell, or if the
    /// in-plane lattice constants are not positive.
    pub fn new(primitive: AtomicStructure, roles: Roles) -> Result<Material> {
        roles.validate(&primitive)?;
        validate_lattice_constants(&primitive)?;

        Ok(Material { primitive, roles })
    }

    /// Couple a primitive cell with roles detected from its species.
    ///
    /// # Errors
    /// Returns an error if a role could not be detected, or if the in-plane lattice
    /// constants are not positive.
    pub fn detect(primitive: AtomicStructure) -> Result<Material> {
        let roles = Roles::detect(&primitive)?;
        validate_lattice_constants(&primitive)?;

        debug!("detected central species {} and peripheral species {}",
            roles.central, roles.peripheral);

        Ok(Material { primitive, roles })
    }

    /// The in-plane lattice constant of the primitive cell.
    pub fn lattice_constant(&self) -> f64 {
        self.primitive.lattice_constant()
    }

    /// The out-of-plane distance between the highest and lowest peripheral atoms
    /// of a structure, or 0 if there are none.
    pub fn peripheral_separation(&self, structure: &AtomicStructure) -> f64 {
        let species = Some(self.roles.peripheral.as_str());

        match (structure.max_atom(Direction::Z, species), structure.min_atom(Direction::Z, species)) {
            (Some(high), Some(low)) => high.position.z - low.position.z,
            _ => 0.0,
        }
    }

    /// The height of the middle plane of a structure, taken halfway between its highest
    /// and lowest peripheral atoms or, without peripheral atoms, at its first central atom.
    pub fn middle_plane(&self, structure: &AtomicStructure) -> Option<f64> {
        let species = Some(self.roles.peripheral.as_str());

        match (structure.max_atom(Direction::Z, species), structure.min_atom(Direction::Z, species)) {
            (Some(high), Some(low)) => Some(0.5 * (high.position.z + low.position.z)),
            _ => self.first_central_height(structure),
        }
    }

    /// Height of the first central atom of a structure.
    pub fn first_central_height(&self, structure: &AtomicStructure) -> Option<f64> {
        structure.atoms
            .iter()
            .find(|atom| atom.species == self.roles.central)
            .map(|atom| atom.position.z)
    }
}

/// Every length of a built structure scales with the in-plane lattice constants.
fn validate_lattice_constants(primitive: &AtomicStructure) -> Result<()> {
    let Coord { x, y, .. } = primitive.lattice_constants;

    if x > 0.0 && y > 0.0 {
        Ok(())
    } else {
        Err(GrainError::InvalidParameter(
            format!("the in-plane lattice constants of a material must be positive (got {}, {})", x, y)
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
/// An entry of the two species table used to decorate dislocation cores.
pub struct CoreSpecies {
    /// Chemical symbol.
    pub species: String,
    /// Distance along z between the two sub-layers of the species. Zero for species
    /// which form a single layer.
    pub separation: f64,
}

impl CoreSpecies {
    pub fn new(species: &str, separation: f64) -> CoreSpecies {
        CoreSpecies { species: species.to_string(), separation }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
/// Which role occupies the geometrically distinguished sites of a dislocation core.
pub enum Polarity {
    /// The central species leads the core rings (0).
    CentralFirst,
    /// The peripheral species leads the core rings and the line is mirrored (1).
    PeripheralFirst,
}

impl Default for Polarity {
    fn default() -> Polarity {
        Polarity::CentralFirst
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Polarity::CentralFirst => write!(f, "0"),
            Polarity::PeripheralFirst => write!(f, "1"),
        }
    }
}

impl FromStr for Polarity {
    type Err = GrainError;

    fn from_str(s: &str) -> Result<Polarity> {
        match s.trim() {
            "0" => Ok(Polarity::CentralFirst),
            "1" => Ok(Polarity::PeripheralFirst),
            other => Err(GrainError::InvalidParameter(
                format!("polarity must be 0 or 1, not '{}'", other)
            )),
        }
    }
}

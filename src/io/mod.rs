//! Read primitive cells from structure files and write structure descriptions.
//!
//! Two formats are understood, chosen by the file extension: crystallographic
//! information files (`.cif`) and the JSON description of an `AtomicStructure`
//! (`.json`) which `write_json` produces.

pub mod cif;

use crate::coord::Coord;
use crate::error::{GrainError, Result};
use crate::structure::AtomicStructure;

use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Read a structure from a file, deciding the format from its extension.
///
/// # Errors
/// Returns an error if the file could not be opened or parsed, or if the
/// extension is not `cif` or `json`.
pub fn read_structure<P: AsRef<Path>>(path: P) -> Result<AtomicStructure> {
    let path = path.as_ref();
    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    let structure = match extension.as_ref().map(|ext| ext.as_str()) {
        Some("cif") => cif::read_file(path)?,
        Some("json") => read_json(path)?,
        _ => {
            return Err(GrainError::Parse(
                format!("unknown structure format of '{}' (expected .cif or .json)", path.display())
            ));
        },
    };

    debug!("read {} atoms of species [{}] from '{}'",
        structure.len(), structure.species().join(", "), path.display());

    Ok(structure)
}

/// Read the JSON description of a structure.
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<AtomicStructure> {
    let file = File::open(path)?;
    from_reader(BufReader::new(file))
}

/// Write the JSON description of a structure.
pub fn write_json<P: AsRef<Path>>(structure: &AtomicStructure, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    to_writer(structure, &mut writer)?;
    writer.flush()?;

    Ok(())
}

/// Descriptions without lattice constants get the lengths of their cell vectors,
/// like a primitive cell read from a CIF file.
fn from_reader<R: Read>(reader: R) -> Result<AtomicStructure> {
    let mut structure: AtomicStructure = serde_json::from_reader(reader)?;

    if structure.lattice_constants == Coord::ORIGO {
        structure.lattice_constants = structure.cell.lengths();
        debug!("set missing lattice constants to the cell vector lengths {:?}",
            structure.lattice_constants.to_tuple());
    }

    Ok(structure)
}

fn to_writer<W: Write>(structure: &AtomicStructure, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(writer, structure).map_err(GrainError::from)
}

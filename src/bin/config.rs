//! Configure and run the program.

use crate::error::Result;
use crate::{BoundaryArgs, Command, Opt, OutputArgs};

use grainforge::boundary::{self, BoundaryConf};
use grainforge::dislocation::{build_line, DefectType};
use grainforge::io;
use grainforge::material::{Material, Polarity};
use grainforge::relax::relax;
use grainforge::structure::AtomicStructure;

use colored::*;
use log::info;
use std::path::{Path, PathBuf};

/// The structure to construct, with its materials read from disk.
enum Job {
    Line { material: Material, defect: DefectType, rows: usize, polarity: Polarity },
    Nanoribbon { material: Material, conf: BoundaryConf },
    PeriodicSingle { material: Material, conf: BoundaryConf, polarity: Polarity },
    Periodic { material: Material, conf: BoundaryConf },
    Heterostructure { a: Material, b: Material, conf: BoundaryConf },
}

/// The program run configuration.
pub struct Config {
    /// Structure to construct.
    job: Job,
    /// Number of relaxation steps after construction.
    relax_steps: usize,
    /// Path of the optional structure description.
    json: Option<PathBuf>,
}

impl Config {
    /// Parse the command line arguments and read the materials.
    ///
    /// # Errors
    /// Returns an error if a material could not be read or if its central and
    /// peripheral species could not be detected.
    pub fn new(opt: Opt) -> Result<Config> {
        let (job, output) = match opt.command {
            Command::Line { primitive, rows, defect, polarity, output } => {
                let material = read_material(&primitive)?;
                (Job::Line { material, defect, rows, polarity }, output)
            },
            Command::Nanoribbon { primitive, boundary, output } => {
                let material = read_material(&primitive)?;
                (Job::Nanoribbon { material, conf: to_conf(&boundary) }, output)
            },
            Command::PeriodicSingle { primitive, boundary, polarity, output } => {
                let material = read_material(&primitive)?;
                (Job::PeriodicSingle { material, conf: to_conf(&boundary), polarity }, output)
            },
            Command::Periodic { primitive, boundary, output } => {
                let material = read_material(&primitive)?;
                (Job::Periodic { material, conf: to_conf(&boundary) }, output)
            },
            Command::Heterostructure { material_a, material_b, boundary, output } => {
                let a = read_material(&material_a)?;
                let b = read_material(&material_b)?;
                (Job::Heterostructure { a, b, conf: to_conf(&boundary) }, output)
            },
        };

        let OutputArgs { relax_steps, json } = output;

        Ok(Config { job, relax_steps, json })
    }

    /// Run the program.
    ///
    /// # Errors
    /// Returns an error if the structure couldn't be constructed or written to disk.
    pub fn run(&self) -> Result<()> {
        let (mut structure, lattice_constant) = match self.job {
            Job::Line { ref material, defect, rows, polarity } => {
                (build_line(defect, material, rows, polarity)?, material.lattice_constant())
            },
            Job::Nanoribbon { ref material, ref conf } => {
                (boundary::nanoribbon(material, conf)?, material.lattice_constant())
            },
            Job::PeriodicSingle { ref material, ref conf, polarity } => {
                (boundary::periodic_single(material, conf, polarity)?, material.lattice_constant())
            },
            Job::Periodic { ref material, ref conf } => {
                (boundary::periodic(material, conf)?, material.lattice_constant())
            },
            Job::Heterostructure { ref a, ref b, ref conf } => {
                (boundary::heterostructure(a, b, conf)?, a.lattice_constant())
            },
        };

        if self.relax_steps > 0 {
            let num_moved = relax(&mut structure, lattice_constant, self.relax_steps, &[])?;
            info!("relaxation moved atoms {} times in {} steps", num_moved, self.relax_steps);
        }

        print_summary(&structure);

        if let Some(ref path) = self.json {
            io::write_json(&structure, path)?;
            info!("wrote structure description to '{}'", path.display());
        }

        Ok(())
    }
}

fn read_material(path: &Path) -> Result<Material> {
    let primitive = io::read_structure(path)?;
    let material = Material::detect(primitive)?;

    info!("read material with central species {} and peripheral species {} from '{}'",
        material.roles.central, material.roles.peripheral, path.display());

    Ok(material)
}

fn to_conf(args: &BoundaryArgs) -> BoundaryConf {
    BoundaryConf::new(args.defect, args.rows, args.columns).with_strain(args.strain)
}

fn print_summary(structure: &AtomicStructure) {
    println!("{} {}", "Atoms:".bold(), structure.len());
    println!("{} [{}]", "Species:".bold(), structure.species().join(", "));
    println!("{}", "Cell:".bold());

    for vector in structure.cell.0.iter() {
        println!("    {:12.6} {:12.6} {:12.6}", vector.x, vector.y, vector.z);
    }
}

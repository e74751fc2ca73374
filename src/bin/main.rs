//! Create dislocation cores, grain boundaries and lateral heterostructures in
//! two-dimensional transition metal dichalcogenides.
//!
//! # Usage
//! ```text
//! USAGE:
//!     grainforge [FLAGS] <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!     -v, --verbose    Log every construction step
//!
//! SUBCOMMANDS:
//!     line          A single dislocation line
//!     nr            A grain boundary in a nanoribbon
//!     pbc-single    A periodic grain boundary with one core per period
//!     pbc           A periodic grain boundary with two cores per period
//!     lh            A lateral heterostructure of two materials
//! ```
//!
//! Every subcommand reads the primitive cell of the bulk material from a `.cif`
//! or `.json` file. The central (Mo, W) and peripheral (S, Se) species are
//! detected from the cell. Options which apply to all subcommands:
//!
//! ```text
//!         --relax-steps <N>    Relax the structure for this many steps [default: 0]
//!         --json <PATH>        Write the structure description to this file
//! ```

mod config;
mod error;

use crate::config::Config;

use grainforge::dislocation::DefectType;
use grainforge::material::Polarity;

use env_logger::Env;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "grainforge")]
/// Create dislocation cores, grain boundaries and lateral heterostructures in
/// two-dimensional materials.
pub struct Opt {
    #[structopt(short, long)]
    /// Log every construction step
    verbose: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    #[structopt(name = "line")]
    /// A single dislocation line
    Line {
        #[structopt(parse(from_os_str))]
        /// Primitive cell of the bulk material (.cif or .json)
        primitive: PathBuf,

        #[structopt(long)]
        /// Number of rows in the line
        rows: usize,

        #[structopt(long)]
        /// Dislocation type (4|6, 5|7 or 6|8)
        defect: DefectType,

        #[structopt(long, default_value = "0")]
        /// Which species leads the core: 0 (central) or 1 (peripheral)
        polarity: Polarity,

        #[structopt(flatten)]
        output: OutputArgs,
    },

    #[structopt(name = "nr")]
    /// A grain boundary in a nanoribbon
    Nanoribbon {
        #[structopt(parse(from_os_str))]
        /// Primitive cell of the bulk material (.cif or .json)
        primitive: PathBuf,

        #[structopt(flatten)]
        boundary: BoundaryArgs,

        #[structopt(flatten)]
        output: OutputArgs,
    },

    #[structopt(name = "pbc-single")]
    /// A periodic grain boundary with one core per period
    PeriodicSingle {
        #[structopt(parse(from_os_str))]
        /// Primitive cell of the bulk material (.cif or .json)
        primitive: PathBuf,

        #[structopt(flatten)]
        boundary: BoundaryArgs,

        #[structopt(long, default_value = "0")]
        /// Which species leads the core: 0 (central) or 1 (peripheral)
        polarity: Polarity,

        #[structopt(flatten)]
        output: OutputArgs,
    },

    #[structopt(name = "pbc")]
    /// A periodic grain boundary with two cores per period
    Periodic {
        #[structopt(parse(from_os_str))]
        /// Primitive cell of the bulk material (.cif or .json)
        primitive: PathBuf,

        #[structopt(flatten)]
        boundary: BoundaryArgs,

        #[structopt(flatten)]
        output: OutputArgs,
    },

    #[structopt(name = "lh")]
    /// A lateral heterostructure of two materials
    Heterostructure {
        #[structopt(parse(from_os_str))]
        /// Primitive cell of the material with the larger lattice constant
        material_a: PathBuf,

        #[structopt(parse(from_os_str))]
        /// Primitive cell of the material with the smaller lattice constant
        material_b: PathBuf,

        #[structopt(flatten)]
        boundary: BoundaryArgs,

        #[structopt(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, StructOpt)]
pub struct BoundaryArgs {
    #[structopt(long)]
    /// Number of rows between cores, which sets the misorientation angle
    rows: usize,

    #[structopt(long)]
    /// Number of unit cells across each domain
    columns: usize,

    #[structopt(long)]
    /// Dislocation type (4|6, 5|7 or 6|8)
    defect: DefectType,

    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    /// Strain absorbed by the boundary (length along x)
    strain: f64,
}

#[derive(Debug, StructOpt)]
pub struct OutputArgs {
    #[structopt(long = "relax-steps", default_value = "0")]
    /// Relax the structure for this many steps
    relax_steps: usize,

    #[structopt(long, parse(from_os_str))]
    /// Write the structure description to this file
    json: Option<PathBuf>,
}

fn main() {
    let opt = Opt::from_args();

    let log_level = if opt.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(err) = Config::new(opt).and_then(|conf| conf.run()) {
        let mut stderr = io::stderr();
        writeln!(&mut stderr, "{}", err).expect("could not write to stderr");
        process::exit(1);
    }
}

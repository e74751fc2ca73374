//! Create dislocation cores, grain boundaries and lateral heterostructures in
//! two-dimensional transition metal dichalcogenides.
//!
//! A `Material` is read from the primitive cell of a bulk crystal. Its monolayer
//! is cut into domains which are rotated against each other and joined by lines
//! of dislocation cores. The resulting `AtomicStructure` can be relaxed and
//! written to disk.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate serde_derive;

pub mod boundary;
pub mod coord;
pub mod dislocation;
pub mod error;
pub mod io;
pub mod material;
pub mod polygon;
pub mod relax;
pub mod structure;

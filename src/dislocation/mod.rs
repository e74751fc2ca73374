//! Construct dislocation cores and the dislocation lines which carry them.
//!
//! A core is made of two fused rings of different size: a square and a hexagon
//! (4|6), a pentagon and a heptagon (5|7) or a hexagon and an octagon (6|8). A line
//! is a strip of monolayer with a core inserted at one of its edges.
//!
//! # Examples
//! Build a 5|7 core decorated like a MoS2 monolayer.
//!
//! ```
//! use grainforge::dislocation::{build_core, DefectType};
//! use grainforge::material::CoreSpecies;
//!
//! let species = [CoreSpecies::new("Mo", 0.0), CoreSpecies::new("S", 3.13)];
//! let core = build_core(DefectType::FiveSeven, 3.16, &species);
//!
//! assert!(!core.is_empty());
//! ```

mod cores;
mod lines;

pub use self::cores::build_core;
pub use self::lines::build_line;

use crate::error::{GrainError, Result};

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
/// Topology of a dislocation core, named after its two rings.
pub enum DefectType {
    #[serde(rename = "4|6")]
    FourSix,
    #[serde(rename = "5|7")]
    FiveSeven,
    #[serde(rename = "6|8")]
    SixEight,
}

/// How the second ring of a core is placed against the first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Alignment {
    /// Turn the second ring upside down (about its own center) before aligning.
    pub flip: bool,
    /// Vertex of the first ring which sets the height.
    pub first_vertex: usize,
    /// Vertex of the second ring which is moved to that height.
    pub second_vertex: usize,
}

/// Construction recipe of a core.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recipe {
    /// Number of sides of the first and second rings.
    pub sides: (usize, usize),
    /// Placement of the second ring.
    pub alignment: Alignment,
    /// Index into the species table which starts the second ring.
    pub second_start: usize,
    /// Atom indices which are deleted, in order, after both rings are decorated.
    pub deletions: &'static [usize],
}

impl DefectType {
    /// All supported defect types.
    pub const ALL: [DefectType; 3] = [DefectType::FourSix, DefectType::FiveSeven, DefectType::SixEight];

    /// Look up the construction recipe of the defect.
    pub fn recipe(self) -> Recipe {
        match self {
            DefectType::FourSix => Recipe {
                sides: (4, 6),
                alignment: Alignment { flip: false, first_vertex: 2, second_vertex: 0 },
                second_start: 0,
                deletions: &[],
            },
            DefectType::FiveSeven => Recipe {
                sides: (5, 7),
                alignment: Alignment { flip: true, first_vertex: 3, second_vertex: 3 },
                second_start: 1,
                deletions: &[],
            },
            DefectType::SixEight => Recipe {
                sides: (6, 8),
                alignment: Alignment { flip: false, first_vertex: 2, second_vertex: 1 },
                second_start: 1,
                deletions: &[9, 9],
            },
        }
    }
}

impl fmt::Display for DefectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (first, second) = self.recipe().sides;
        write!(f, "{}|{}", first, second)
    }
}

impl FromStr for DefectType {
    type Err = GrainError;

    /// Parse a defect type from either its ring notation ("5|7") or name ("five-seven").
    ///
    /// # Errors
    /// Returns `GrainError::UnsupportedDefect` naming the input tag if it has no recipe.
    fn from_str(tag: &str) -> Result<DefectType> {
        match tag.trim().to_lowercase().as_str() {
            "4|6" | "four-six" => Ok(DefectType::FourSix),
            "5|7" | "five-seven" => Ok(DefectType::FiveSeven),
            "6|8" | "six-eight" => Ok(DefectType::SixEight),
            _ => Err(GrainError::UnsupportedDefect(tag.to_string())),
        }
    }
}

//! Assemble grain boundaries and lateral heterostructures from dislocation lines.
//!
//! Four assemblies are available:
//!
//! * `nanoribbon`: a single dislocation between two misoriented domains, periodic
//!   along the boundary only.
//! * `periodic_single`: a single dislocation between a fan of slightly misoriented
//!   domains which is periodic in both in-plane directions.
//! * `periodic`: two dislocations of opposite polarity per period.
//! * `heterostructure`: a lateral interface between two materials.
//!
//! Strain is absorbed symmetrically: a quarter of it when a single boundary is
//! shifted and half of it when a cell which contains two boundaries is resized.

mod heterostructure;
mod nanoribbon;
mod periodic;

pub use self::heterostructure::heterostructure;
pub use self::nanoribbon::nanoribbon;
pub use self::periodic::{periodic, periodic_single};

use crate::dislocation::DefectType;
use crate::error::{GrainError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
/// Configuration of a grain boundary assembly.
pub struct BoundaryConf {
    /// Type of the dislocation cores.
    pub defect: DefectType,
    /// Number of rows between cores, which sets the misorientation angle.
    pub rows: usize,
    /// Number of unit cells across each domain.
    pub columns: usize,
    #[serde(default)]
    /// Strain absorbed by the boundary, in units of length along x.
    pub strain: f64,
}

impl BoundaryConf {
    /// A configuration without strain.
    pub fn new(defect: DefectType, rows: usize, columns: usize) -> BoundaryConf {
        BoundaryConf { defect, rows, columns, strain: 0.0 }
    }

    /// Set the strain and return the configuration.
    pub fn with_strain(self, strain: f64) -> BoundaryConf {
        BoundaryConf { strain, .. self }
    }

    /// Assert that the rows and columns can build a boundary.
    fn validate(&self, min_columns: usize) -> Result<()> {
        if self.rows < 2 {
            return Err(GrainError::InvalidParameter(
                format!("a grain boundary needs at least 2 rows (got {})", self.rows)
            ));
        }

        if self.columns < min_columns {
            return Err(GrainError::InvalidParameter(
                format!("this grain boundary needs at least {} columns (got {})",
                    min_columns, self.columns)
            ));
        }

        Ok(())
    }
}

/// Distance between two neighbouring dislocation cores along the boundary.
///
/// # Examples
/// ```
/// # use grainforge::boundary::boundary_distance;
/// let d = boundary_distance(3, 2.0);
/// assert!((d - 3.5 * 2.0 * 3.0f64.sqrt()).abs() < 1e-12);
/// ```
pub fn boundary_distance(rows: usize, lattice_constant: f64) -> f64 {
    3.0f64.sqrt() * lattice_constant * (rows as f64 + 0.5)
}

/// Misorientation angle (in radians) between the two domains of a boundary.
pub fn misorientation(rows: usize) -> f64 {
    (1.0 / (3.0f64.sqrt() * (rows as f64 + 0.5))).asin()
}

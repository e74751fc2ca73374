//! Implements the custom `GrainError` class for the library.

use std::{error, fmt, io, result};

#[derive(Debug)]
/// A class for configuration or runtime errors.
pub enum GrainError {
    /// A defect type tag which has no core recipe.
    UnsupportedDefect(String),
    /// A chemical role could not be assigned from the species of a primitive cell.
    MissingRole {
        /// Name of the role which is missing.
        role: &'static str,
        /// Species which were present in the structure.
        species: Vec<String>,
    },
    /// An input parameter (number of rows, columns, ...) is out of range.
    InvalidParameter(String),
    /// Something went wrong when reading a structure.
    Io(io::Error),
    /// A structure file could not be parsed.
    Parse(String),
}

/// Shorthand for our `Result` class.
pub type Result<T> = result::Result<T, GrainError>;

impl fmt::Display for GrainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GrainError::UnsupportedDefect(ref tag) => {
                write!(f, "dislocation type '{}' is not supported", tag)
            },
            GrainError::MissingRole { role, ref species } => {
                write!(f, "no {} species found among [{}]", role, species.join(", "))
            },
            GrainError::InvalidParameter(ref err) => write!(f, "{}", err),
            GrainError::Io(ref err) => write!(f, "{}", err),
            GrainError::Parse(ref err) => write!(f, "could not parse structure: {}", err),
        }
    }
}

impl error::Error for GrainError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            GrainError::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for GrainError {
    fn from(err: io::Error) -> GrainError {
        GrainError::Io(err)
    }
}

impl From<serde_json::Error> for GrainError {
    fn from(err: serde_json::Error) -> GrainError {
        GrainError::Parse(err.to_string())
    }
}

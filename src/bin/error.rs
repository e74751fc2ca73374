//! Errors when executing the binary.

use grainforge::error::GrainError;

use colored::*;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::result;

/// Shorthand for our `Result` class.
pub type Result<T> = result::Result<T, GrainforgeCliError>;

#[derive(Debug)]
/// A class for configuration or runtime errors.
pub enum GrainforgeCliError {
    /// Something went wrong when reading or writing.
    IoError(io::Error),
    /// Something went wrong when reading a material or constructing the system.
    RunError(GrainError),
}

impl Error for GrainforgeCliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            GrainforgeCliError::IoError(ref err) => Some(err),
            GrainforgeCliError::RunError(ref err) => Some(err),
        }
    }
}

impl Display for GrainforgeCliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let red_error = "error:".color("red");

        match *self {
            GrainforgeCliError::IoError(ref err) => write!(f, "{} {}", red_error, err),
            GrainforgeCliError::RunError(ref err) => write!(f, "{} {}", red_error, err),
        }
    }
}

impl From<io::Error> for GrainforgeCliError {
    fn from(err: io::Error) -> GrainforgeCliError {
        GrainforgeCliError::IoError(err)
    }
}

impl From<GrainError> for GrainforgeCliError {
    fn from(err: GrainError) -> GrainforgeCliError {
        match err {
            GrainError::Io(err) => GrainforgeCliError::IoError(err),
            err => GrainforgeCliError::RunError(err),
        }
    }
}

//! Implement elementary coordinate operations.

use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::GrainError;

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
/// A three-dimensional carthesian coordinate.
///
/// # Examples
/// ```
/// # use grainforge::coord::Coord;
/// let coord1 = Coord::new(1.0, 0.0, 1.0);
/// let coord2 = Coord::new(0.5, 0.5, 0.5);
///
/// assert_eq!(Coord::new(1.5, 0.5, 1.5), coord1 + coord2);
/// assert_eq!(Coord::new(0.5, -0.5, 0.5), coord1 - coord2);
/// ```
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coord {
    /// A coordinate at origo.
    pub const ORIGO: Self = Coord { x: 0.0, y: 0.0, z: 0.0 };

    /// Construct a new coordinate.
    pub fn new(x: f64, y: f64, z: f64) -> Coord {
        Coord { x, y, z }
    }

    /// Unpack the coordinate into a tuple.
    pub fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Calculate the absolute distance between two coordinates.
    ///
    /// # Examples
    /// ```
    /// # use grainforge::coord::Coord;
    /// let coord1 = Coord::new(0.0, 1.0, 4.0);
    /// let coord2 = Coord::new(4.0, 4.0, 4.0);
    /// assert!((coord1.distance(coord2) - 5.0).abs() < 1e-9);
    /// ```
    pub fn distance(self, other: Coord) -> f64 {
        (self - other).norm()
    }

    /// Length of the coordinate seen as a vector from origo.
    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Return the component along an axis.
    pub fn get(&self, axis: Direction) -> f64 {
        match axis {
            Direction::X => self.x,
            Direction::Y => self.y,
            Direction::Z => self.z,
        }
    }

    /// Mutable access to the component along an axis.
    pub fn get_mut(&mut self, axis: Direction) -> &mut f64 {
        match axis {
            Direction::X => &mut self.x,
            Direction::Y => &mut self.y,
            Direction::Z => &mut self.z,
        }
    }

    /// Return the coordinate with one component replaced.
    pub fn with(mut self, axis: Direction, value: f64) -> Coord {
        *self.get_mut(axis) = value;
        self
    }

    /// Rotate the coordinate by an angle (in radians) around the z axis
    /// which passes through `pivot`. The z component is not changed.
    ///
    /// # Examples
    /// ```
    /// # use grainforge::coord::Coord;
    /// # use std::f64::consts::FRAC_PI_2;
    /// let coord = Coord::new(2.0, 1.0, 3.0);
    /// let pivot = Coord::new(1.0, 1.0, 0.0);
    /// assert_eq!(Coord::new(1.0, 2.0, 3.0), coord.rotate_z(FRAC_PI_2, pivot));
    /// ```
    pub fn rotate_z(self, angle: f64, pivot: Coord) -> Coord {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;

        Coord {
            x: dx * cos - dy * sin + pivot.x,
            y: dx * sin + dy * cos + pivot.y,
            z: self.z,
        }
    }

    /// Mirror a component through the plane `axis = at`.
    pub fn reflect(self, at: f64, axis: Direction) -> Coord {
        let value = self.get(axis);
        self.with(axis, 2.0 * at - value)
    }
}

impl Default for Coord {
    fn default() -> Coord {
        Coord::ORIGO
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

macro_rules! impl_elementwise {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait for Coord {
            type Output = Coord;

            fn $method(self, other: Coord) -> Coord {
                Coord::new(self.x $op other.x, self.y $op other.y, self.z $op other.z)
            }
        }

        impl $assign_trait for Coord {
            fn $assign_method(&mut self, other: Coord) {
                *self = *self $op other;
            }
        }
    }
}

impl_elementwise!(Add, add, AddAssign, add_assign, +);
impl_elementwise!(Sub, sub, SubAssign, sub_assign, -);

impl Neg for Coord {
    type Output = Coord;

    fn neg(self) -> Coord {
        Coord::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Coord {
    type Output = Coord;

    fn mul(self, value: f64) -> Coord {
        Coord::new(self.x * value, self.y * value, self.z * value)
    }
}

impl MulAssign<f64> for Coord {
    fn mul_assign(&mut self, value: f64) {
        *self = *self * value;
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Coord) -> bool {
        let atol = 1e-9;
        (self.x - other.x).abs() < atol
            && (self.y - other.y).abs() < atol
            && (self.z - other.z).abs() < atol
    }
}

impl From<[f64; 3]> for Coord {
    fn from(values: [f64; 3]) -> Coord {
        Coord::new(values[0], values[1], values[2])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
/// Carthesian axis. The x and y axes span the plane of a monolayer, z is its normal.
pub enum Direction { X, Y, Z }

impl Direction {
    /// Index of the axis in a carthesian triple.
    pub fn index(self) -> usize {
        match self {
            Direction::X => 0,
            Direction::Y => 1,
            Direction::Z => 2,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Direction::X => write!(f, "X"),
            Direction::Y => write!(f, "Y"),
            Direction::Z => write!(f, "Z"),
        }
    }
}

impl FromStr for Direction {
    type Err = GrainError;

    fn from_str(s: &str) -> Result<Direction, GrainError> {
        match s.trim().to_lowercase().as_str() {
            "x" => Ok(Direction::X),
            "y" => Ok(Direction::Y),
            "z" => Ok(Direction::Z),
            other => Err(GrainError::InvalidParameter(format!("'{}' is not an axis", other))),
        }
    }
}

/// Translate an object by a `Coord`.
pub trait Translate {
    fn translate(self, coord: Coord) -> Self;
    fn translate_in_place(&mut self, coord: Coord);
}

/// Trait denoting periodic boundary condition operations on objects.
pub trait Periodic {
    /// Extend an object by some integer amounts of its periodic cell.
    fn pbc_multiply(&self, nx: usize, ny: usize, nz: usize) -> Self;
}

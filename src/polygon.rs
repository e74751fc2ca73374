//! Regular polygons which lay out the rings of dislocation cores.

use crate::coord::{Coord, Translate};

use std::f64::consts::PI;

#[derive(Clone, Debug)]
/// A regular polygon in the x-y plane, sized such that its bonds match those of a
/// hexagonal lattice with an input lattice constant.
///
/// Vertex `i` lies at an angle `-2πi/sides` from the vertical (clockwise, starting
/// at the top). The vertex order is significant to the species assignment of cores.
pub struct RegularPolygon {
    /// Number of sides.
    pub sides: usize,
    /// Center of the polygon. Follows the translations of the vertices.
    pub center: Coord,
    /// Length of each side.
    pub edge_length: f64,
    /// Distance from the center to each vertex.
    pub radius: f64,
    /// Vertex positions (z = 0).
    pub vertices: Vec<Coord>,
}

impl RegularPolygon {
    /// Construct a polygon centered at origo.
    ///
    /// # Examples
    /// ```
    /// # use grainforge::polygon::RegularPolygon;
    /// let hexagon = RegularPolygon::new(6, 3.0);
    /// assert_eq!(6, hexagon.vertices.len());
    /// assert!((hexagon.vertices[0].y - hexagon.radius).abs() < 1e-12);
    /// ```
    pub fn new(sides: usize, lattice_constant: f64) -> RegularPolygon {
        let n = sides as f64;
        let edge_length = lattice_constant * 3.0f64.sqrt()
            / (4.0 * (PI / (2.0 * n)).cos() * (PI / n).cos());
        let radius = edge_length / (2.0 * (PI / n).sin());

        let vertices = (0..sides)
            .map(|i| {
                let angle = 2.0 * PI * (i as f64) / n;
                Coord::new(-angle.sin() * radius, angle.cos() * radius, 0.0)
            })
            .collect();

        RegularPolygon {
            sides,
            center: Coord::ORIGO,
            edge_length,
            radius,
            vertices,
        }
    }

    /// Rotate the polygon in-plane by an angle (radians) around a pivot, or around
    /// its own center if no pivot is given. The tracked center is not moved.
    pub fn rotate(&mut self, angle: f64, pivot: Option<Coord>) {
        let pivot = pivot.unwrap_or(self.center);

        for vertex in self.vertices.iter_mut() {
            *vertex = vertex.rotate_z(angle, pivot);
        }
    }

    /// Whether the polygon has an odd number of sides.
    pub fn is_odd(&self) -> bool {
        self.sides % 2 == 1
    }
}

impl Translate for RegularPolygon {
    fn translate(mut self, coord: Coord) -> Self {
        self.translate_in_place(coord);
        self
    }

    fn translate_in_place(&mut self, coord: Coord) {
        let shift = Coord::new(coord.x, coord.y, 0.0);

        self.center += shift;
        for vertex in self.vertices.iter_mut() {
            *vertex += shift;
        }
    }
}

//! The atomic structure which every builder reads and writes: a list of atoms
//! inside a periodic cell, with the geometric operations used to cut, tile, mirror
//! and splice structures together.
//!
//! All mutators work in place on a structure which exclusively owns its atoms.
//! Clone a structure before mutating it if the original is needed afterwards.

use crate::coord::{Coord, Direction, Periodic, Translate};

use log::warn;
use nalgebra::{Matrix3, Vector3};
use std::cmp::Ordering;
use std::ops::{AddAssign, Index, IndexMut};

/// Atoms with a first coordinate below this are considered to have been wrapped
/// around the cell origin by `to_orthorhombic`.
const ORTHORHOMBIC_EPS: f64 = 1e-4;

/// Tolerance of periodic wrapping: atoms this close below the upper cell edge are
/// folded to the lower edge.
const WRAP_EPS: f64 = 1e-7;

bitflags! {
    #[derive(Deserialize, Serialize)]
    /// Periodic axes of a structure.
    pub struct Pbc: u8 {
        const X = 0b001;
        const Y = 0b010;
        const Z = 0b100;
    }
}

impl Pbc {
    /// The flag of a single axis.
    pub fn axis(axis: Direction) -> Pbc {
        match axis {
            Direction::X => Pbc::X,
            Direction::Y => Pbc::Y,
            Direction::Z => Pbc::Z,
        }
    }
}

impl Default for Pbc {
    /// Monolayers are periodic in-plane only.
    fn default() -> Pbc {
        Pbc::X | Pbc::Y
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
/// A cell spanned by three lattice vectors.
pub struct Cell(pub [Coord; 3]);

impl Cell {
    /// A cell with the input vectors.
    pub fn new(a: Coord, b: Coord, c: Coord) -> Cell {
        Cell([a, b, c])
    }

    /// An orthorhombic cell with the given side lengths.
    pub fn orthorhombic(x: f64, y: f64, z: f64) -> Cell {
        Cell([Coord::new(x, 0.0, 0.0), Coord::new(0.0, y, 0.0), Coord::new(0.0, 0.0, z)])
    }

    /// The middle point of the cell.
    pub fn center(&self) -> Coord {
        (self.0[0] + self.0[1] + self.0[2]) * 0.5
    }

    /// Lengths of the three lattice vectors.
    pub fn lengths(&self) -> Coord {
        Coord::new(self.0[0].norm(), self.0[1].norm(), self.0[2].norm())
    }

    /// Extent of the cell along an axis, read from the diagonal.
    pub fn extent(&self, axis: Direction) -> f64 {
        self.0[axis.index()].get(axis)
    }

    fn matrix(&self) -> Matrix3<f64> {
        let [a, b, c] = self.0;

        // Columns are the lattice vectors, so that M * f = r.
        Matrix3::new(
            a.x, b.x, c.x,
            a.y, b.y, c.y,
            a.z, b.z, c.z,
        )
    }

    /// Convert a carthesian coordinate to fractional coordinates of the cell.
    /// Returns `None` for a singular cell.
    pub fn to_fractional(&self, coord: Coord) -> Option<Coord> {
        self.matrix()
            .try_inverse()
            .map(|inverse| inverse * Vector3::new(coord.x, coord.y, coord.z))
            .map(|f| Coord::new(f[0], f[1], f[2]))
    }

    /// Convert fractional coordinates of the cell to a carthesian coordinate.
    pub fn to_cartesian(&self, fractional: Coord) -> Coord {
        self.0[0] * fractional.x + self.0[1] * fractional.y + self.0[2] * fractional.z
    }
}

impl Default for Cell {
    fn default() -> Cell {
        Cell::orthorhombic(0.0, 0.0, 0.0)
    }
}

impl Index<usize> for Cell {
    type Output = Coord;

    fn index(&self, i: usize) -> &Coord {
        &self.0[i]
    }
}

impl IndexMut<usize> for Cell {
    fn index_mut(&mut self, i: usize) -> &mut Coord {
        &mut self.0[i]
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
/// A single atom.
pub struct Atom {
    /// Chemical symbol.
    pub species: String,
    /// Absolute position.
    pub position: Coord,
}

impl Atom {
    pub fn new(species: &str, position: Coord) -> Atom {
        Atom { species: species.to_string(), position }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Point around which a structure is rotated.
pub enum Pivot {
    /// The middle of the unit cell.
    CellCenter,
    /// The mean position of all atoms.
    Centroid,
    /// An explicit point.
    Point(Coord),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
/// Atoms in a periodic cell.
pub struct AtomicStructure {
    /// List of atoms. Indices are not stable over the mutators that remove atoms.
    pub atoms: Vec<Atom>,
    /// Lattice vectors of the cell.
    pub cell: Cell,
    #[serde(default)]
    /// Reference periodic spacings along each axis. Used as a length scale when
    /// cutting and merging, and never updated by tiling.
    pub lattice_constants: Coord,
    #[serde(default)]
    /// Periodic axes.
    pub pbc: Pbc,
}

impl AtomicStructure {
    /// Construct a structure with lattice constants set to zero.
    pub fn new(atoms: Vec<Atom>, cell: Cell) -> AtomicStructure {
        AtomicStructure {
            atoms,
            cell,
            lattice_constants: Coord::ORIGO,
            pbc: Pbc::default(),
        }
    }

    /// Set the lattice constants and return the structure.
    pub fn with_lattice_constants(mut self, lattice_constants: Coord) -> AtomicStructure {
        self.lattice_constants = lattice_constants;
        self
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// The in-plane lattice constant.
    pub fn lattice_constant(&self) -> f64 {
        self.lattice_constants.x
    }

    /// The smallest of the lattice constants.
    pub fn min_lattice_constant(&self) -> f64 {
        let (a, b, c) = self.lattice_constants.to_tuple();
        a.min(b).min(c)
    }

    /// Chemical species in the order they are first seen.
    pub fn species(&self) -> Vec<String> {
        let mut species: Vec<String> = Vec::new();

        for atom in &self.atoms {
            if !species.contains(&atom.species) {
                species.push(atom.species.clone());
            }
        }

        species
    }

    /// Replace the cell. Atoms are not moved.
    pub fn set_cell(&mut self, cell: Cell) {
        self.cell = cell;
    }

    /// Rotate all atoms about the z axis by an angle in radians.
    pub fn rotate(&mut self, angle: f64, pivot: Pivot, rotate_cell: bool) {
        let center = match pivot {
            Pivot::CellCenter => self.cell.center(),
            Pivot::Centroid => self.centroid(),
            Pivot::Point(coord) => coord,
        };

        for atom in self.atoms.iter_mut() {
            atom.position = atom.position.rotate_z(angle, center);
        }

        if rotate_cell {
            for vector in self.cell.0.iter_mut() {
                *vector = vector.rotate_z(angle, Coord::ORIGO);
            }
        }
    }

    /// Reflect all atoms through the plane `axis = at`. The same component of every
    /// cell vector is reflected, which makes the operation an involution.
    pub fn reflect(&mut self, at: f64, axis: Direction) {
        for atom in self.atoms.iter_mut() {
            atom.position = atom.position.reflect(at, axis);
        }

        for vector in self.cell.0.iter_mut() {
            *vector = vector.reflect(at, axis);
        }
    }

    /// Cut a bulk cell of two layers into a monolayer: the cell height is halved and
    /// every atom above the new height is removed.
    pub fn to_monolayer(&mut self) {
        let height = if self.lattice_constants.z == 0.0 {
            warn!("no out-of-plane lattice constant set, halving the cell height instead");
            self.cell[2].z / 2.0
        } else {
            self.lattice_constants.z / 2.0
        };

        self.cell[2].z = height;
        self.atoms.retain(|atom| atom.position.z <= height);
    }

    /// Make the cell orthorhombic. Atoms which lie on or left of the cell origin are
    /// moved into the cell by multiples of the first cell vector before the off-diagonal
    /// components are dropped.
    pub fn to_orthorhombic(&mut self) {
        let width = self.cell[0].x.abs();

        if width > 0.0 {
            // The second pass catches atoms that rounding left at the boundary.
            for _ in 0..2 {
                for atom in self.atoms.iter_mut() {
                    let x = atom.position.x;

                    if x < ORTHORHOMBIC_EPS {
                        let multiplier = (x.abs() / width).floor() + 1.0;
                        atom.position.x += multiplier * width;
                    }
                }
            }
        }

        let height = self.cell[1].y.abs();
        self.cell = Cell::new(
            Coord::new(width, 0.0, 0.0),
            Coord::new(0.0, height, 0.0),
            self.cell[2],
        );
    }

    /// Remove all atoms with a component along `axis` strictly between `low` and `high`.
    pub fn remove_atoms(&mut self, low: f64, high: f64, axis: Direction) {
        self.atoms.retain(|atom| {
            let value = atom.position.get(axis);
            !(value > low && value < high)
        });
    }

    /// Replace pairs of overlapping atoms near a line `x = anchor` with a single atom
    /// at their average position. Only atoms within `window` of the line are
    /// considered as the first atom of a pair, and atoms overlap if they are closer
    /// than a third of the smallest lattice constant. Repeats until no overlaps remain.
    ///
    /// Returns the number of merged pairs.
    pub fn merge_near_duplicates(&mut self, anchor: f64, window: f64) -> usize {
        let cutoff = self.min_lattice_constant() / 3.0;
        let mut merged = 0;

        while let Some((i, j)) = self.find_overlap(anchor, window, cutoff) {
            let midpoint = (self.atoms[i].position + self.atoms[j].position) * 0.5;
            self.atoms[j].position = midpoint;
            self.atoms.remove(i);
            merged += 1;
        }

        merged
    }

    fn find_overlap(&self, anchor: f64, window: f64, cutoff: f64) -> Option<(usize, usize)> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| (atom.position.x - anchor).abs() <= window)
            .filter_map(|(i, atom)| {
                self.atoms
                    .iter()
                    .enumerate()
                    .find(|&(j, other)| {
                        i != j && atom.position.distance(other.position) < cutoff
                    })
                    .map(|(j, _)| (i, j))
            })
            .next()
    }

    /// Delete the first atom of every pair which is closer than `cutoff`. Distances
    /// use the minimum image along periodic axes, which assumes an orthorhombic cell.
    ///
    /// Returns the number of deleted atoms.
    pub fn remove_duplicates(&mut self, cutoff: f64) -> usize {
        let num_atoms = self.atoms.len();
        let mut duplicate = vec![false; num_atoms];

        for i in 0..num_atoms {
            for j in (i + 1)..num_atoms {
                let d = self.minimum_image(self.atoms[j].position - self.atoms[i].position);

                if d.norm() < cutoff {
                    duplicate[i] = true;
                }
            }
        }

        let mut flags = duplicate.iter();
        self.atoms.retain(|_| !flags.next().cloned().unwrap_or(false));

        num_atoms - self.atoms.len()
    }

    fn minimum_image(&self, mut delta: Coord) -> Coord {
        for &axis in &[Direction::X, Direction::Y, Direction::Z] {
            let length = self.cell.extent(axis).abs();

            if self.pbc.contains(Pbc::axis(axis)) && length > 0.0 {
                let value = delta.get(axis);
                *delta.get_mut(axis) = value - length * (value / length).round();
            }
        }

        delta
    }

    /// Add the atoms of another structure. The cell is not changed: the caller
    /// decides the periodic extent of the combined structure.
    pub fn append(&mut self, other: &AtomicStructure) {
        self.atoms.extend_from_slice(&other.atoms);
    }

    /// Fold atoms back into the cell along the input axes.
    pub fn wrap(&mut self, axes: Pbc) {
        if self.cell.to_fractional(Coord::ORIGO).is_none() {
            warn!("cannot wrap atoms into a singular cell");
            return;
        }

        for atom in self.atoms.iter_mut() {
            if let Some(mut fractional) = self.cell.to_fractional(atom.position) {
                for &axis in &[Direction::X, Direction::Y, Direction::Z] {
                    if axes.contains(Pbc::axis(axis)) {
                        let value = fractional.get(axis);
                        *fractional.get_mut(axis) = (value + WRAP_EPS).rem_euclid(1.0) - WRAP_EPS;
                    }
                }

                atom.position = self.cell.to_cartesian(fractional);
            }
        }
    }

    /// Tile the structure in place. See `Periodic::pbc_multiply`.
    pub fn repeat(&mut self, nx: usize, ny: usize, nz: usize) {
        *self = self.pbc_multiply(nx, ny, nz);
    }

    /// Mirror the structure about the upper cell edge along an axis and add the image.
    /// The cell is extended to twice its size along the axis.
    pub fn mirror(&mut self, axis: Direction) {
        let i = axis.index();
        let edge = self.cell[i].get(axis);

        let mut image = self.clone();
        image.reflect(edge, axis);
        *self += &image;

        *self.cell[i].get_mut(axis) = 2.0 * edge;
    }

    /// The mean position of all atoms, or origo for an empty structure.
    pub fn centroid(&self) -> Coord {
        if self.atoms.is_empty() {
            return Coord::ORIGO;
        }

        let sum = self.atoms.iter().fold(Coord::ORIGO, |acc, atom| acc + atom.position);
        sum * (1.0 / self.atoms.len() as f64)
    }

    /// The atom with the largest component along an axis, optionally only of one
    /// species. The first atom in the list wins ties.
    pub fn max_atom(&self, axis: Direction, species: Option<&str>) -> Option<&Atom> {
        self.extreme_atom(axis, species, Ordering::Greater)
    }

    /// The atom with the smallest component along an axis, optionally only of one
    /// species. The first atom in the list wins ties.
    pub fn min_atom(&self, axis: Direction, species: Option<&str>) -> Option<&Atom> {
        self.extreme_atom(axis, species, Ordering::Less)
    }

    fn extreme_atom(&self, axis: Direction, species: Option<&str>, wins: Ordering)
            -> Option<&Atom> {
        self.atoms
            .iter()
            .filter(|atom| species.map(|s| atom.species == s).unwrap_or(true))
            .fold(None, |best: Option<&Atom>, atom| match best {
                Some(current) => {
                    let value = atom.position.get(axis);
                    match value.partial_cmp(&current.position.get(axis)) {
                        Some(ordering) if ordering == wins => Some(atom),
                        _ => Some(current),
                    }
                },
                None => Some(atom),
            })
    }

    /// Atoms stably sorted along an axis. Atoms with equal components keep their
    /// relative order also when sorting in descending order.
    pub fn sorted_along(&self, axis: Direction, descending: bool) -> Vec<&Atom> {
        let mut sorted: Vec<&Atom> = self.atoms.iter().collect();

        sorted.sort_by(|a, b| {
            let (va, vb) = (a.position.get(axis), b.position.get(axis));
            let ordering = va.partial_cmp(&vb).unwrap_or(Ordering::Equal);

            if descending { ordering.reverse() } else { ordering }
        });

        sorted
    }
}

impl<'a> AddAssign<&'a AtomicStructure> for AtomicStructure {
    fn add_assign(&mut self, other: &'a AtomicStructure) {
        self.append(other);
    }
}

impl Translate for AtomicStructure {
    /// Translate all atoms by an input `Coord`. The cell is not moved.
    fn translate(mut self, coord: Coord) -> Self {
        self.translate_in_place(coord);
        self
    }

    fn translate_in_place(&mut self, coord: Coord) {
        for atom in self.atoms.iter_mut() {
            atom.position += coord;
        }
    }
}

impl Periodic for AtomicStructure {
    /// Clone the atoms into periodic images. The images are ordered by their first
    /// cell vector multiple, then the second, then the third. Every cell vector is
    /// scaled by its multiple while the lattice constants are kept.
    fn pbc_multiply(&self, nx: usize, ny: usize, nz: usize) -> AtomicStructure {
        let mut atoms = Vec::with_capacity(nx * ny * nz * self.atoms.len());

        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    let shift = self.cell[0] * i as f64
                        + self.cell[1] * j as f64
                        + self.cell[2] * k as f64;

                    atoms.extend(self.atoms.iter().map(|atom| Atom {
                        species: atom.species.clone(),
                        position: atom.position + shift,
                    }));
                }
            }
        }

        let cell = Cell::new(
            self.cell[0] * nx as f64,
            self.cell[1] * ny as f64,
            self.cell[2] * nz as f64,
        );

        AtomicStructure {
            atoms,
            cell,
            .. self.clone()
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// A small two-species structure in a 3-by-4-by-6 cell.
    pub fn setup_structure() -> AtomicStructure {
        AtomicStructure::new(
            vec![
                Atom::new("Mo", Coord::new(0.5, 0.5, 1.0)),
                Atom::new("S", Coord::new(1.5, 1.0, 0.5)),
                Atom::new("S", Coord::new(1.5, 1.0, 2.0)),
                Atom::new("Mo", Coord::new(2.5, 3.0, 4.0)),
                Atom::new("S", Coord::new(0.0, 2.0, 5.0)),
            ],
            Cell::orthorhombic(3.0, 4.0, 6.0),
        ).with_lattice_constants(Coord::new(3.0, 4.0, 6.0))
    }

    fn positions(structure: &AtomicStructure) -> Vec<Coord> {
        structure.atoms.iter().map(|atom| atom.position).collect()
    }

    #[test]
    fn species_are_listed_in_the_order_they_are_seen() {
        assert_eq!(vec!["Mo".to_string(), "S".to_string()], setup_structure().species());
    }

    #[test]
    fn translate_moves_atoms_but_not_the_cell() {
        let structure = setup_structure();
        let shift = Coord::new(1.0, -1.0, 0.5);
        let translated = structure.clone().translate(shift);

        for (before, after) in positions(&structure).iter().zip(positions(&translated)) {
            assert_eq!(*before + shift, after);
        }
        assert_eq!(structure.cell, translated.cell);
    }

    #[test]
    fn rotate_about_the_cell_center() {
        let mut structure = AtomicStructure::new(
            vec![Atom::new("C", Coord::new(2.0, 1.0, 0.5))],
            Cell::orthorhombic(2.0, 2.0, 1.0),
        );

        structure.rotate(std::f64::consts::PI, Pivot::CellCenter, false);

        assert_eq!(Coord::new(0.0, 1.0, 0.5), structure.atoms[0].position);
        assert_eq!(Cell::orthorhombic(2.0, 2.0, 1.0), structure.cell);
    }

    #[test]
    fn rotate_about_a_point_can_rotate_the_cell() {
        let mut structure = AtomicStructure::new(
            vec![Atom::new("C", Coord::new(1.0, 0.0, 0.0))],
            Cell::orthorhombic(2.0, 3.0, 1.0),
        );

        structure.rotate(std::f64::consts::FRAC_PI_2, Pivot::Point(Coord::ORIGO), true);

        assert_eq!(Coord::new(0.0, 1.0, 0.0), structure.atoms[0].position);
        assert_eq!(Coord::new(0.0, 2.0, 0.0), structure.cell[0]);
        assert_eq!(Coord::new(-3.0, 0.0, 0.0), structure.cell[1]);
    }

    #[test]
    fn rotate_about_the_centroid_keeps_the_centroid() {
        let mut structure = setup_structure();
        let centroid = structure.centroid();

        structure.rotate(0.7, Pivot::Centroid, false);

        assert_eq!(centroid, structure.centroid());
    }

    #[test]
    fn reflect_twice_restores_positions_and_cell() {
        let structure = setup_structure();
        let mut reflected = structure.clone();

        reflected.reflect(1.25, Direction::X);
        assert_eq!(Coord::new(2.0, 0.5, 1.0), reflected.atoms[0].position);
        assert_eq!(Coord::new(-0.5, 0.0, 0.0), reflected.cell[0]);

        reflected.reflect(1.25, Direction::X);
        assert_eq!(positions(&structure), positions(&reflected));
        assert_eq!(structure.cell, reflected.cell);
    }

    #[test]
    fn to_monolayer_removes_atoms_above_half_height() {
        let mut structure = setup_structure();
        structure.to_monolayer();

        assert_eq!(3.0, structure.cell[2].z);
        assert_eq!(3, structure.len());
        assert!(structure.atoms.iter().all(|atom| atom.position.z <= 3.0));
    }

    #[test]
    fn to_monolayer_without_lattice_constant_uses_the_cell() {
        let mut structure = setup_structure().with_lattice_constants(Coord::new(3.0, 4.0, 0.0));
        structure.cell[2].z = 4.0;
        structure.to_monolayer();

        assert_eq!(2.0, structure.cell[2].z);
        assert_eq!(3, structure.len());
    }

    #[test]
    fn to_monolayer_removes_consecutive_atoms() {
        // Neighbouring atoms above the cut must both be removed.
        let mut structure = AtomicStructure::new(
            vec![
                Atom::new("A", Coord::new(0.0, 0.0, 5.0)),
                Atom::new("A", Coord::new(0.0, 0.0, 5.5)),
                Atom::new("B", Coord::new(0.0, 0.0, 1.0)),
                Atom::new("A", Coord::new(0.0, 0.0, 6.0)),
            ],
            Cell::orthorhombic(1.0, 1.0, 8.0),
        );

        structure.to_monolayer();

        assert_eq!(1, structure.len());
        assert_eq!("B", structure.atoms[0].species);
    }

    #[test]
    fn to_orthorhombic_moves_wrapped_atoms_and_drops_off_diagonals() {
        let mut structure = AtomicStructure::new(
            vec![
                Atom::new("A", Coord::new(0.0, 0.0, 0.0)),
                Atom::new("A", Coord::new(-1.0, 1.0, 0.0)),
                Atom::new("A", Coord::new(-5.0, 2.0, 0.0)),
                Atom::new("A", Coord::new(1.0, 1.0, 0.0)),
            ],
            Cell::new(
                Coord::new(2.0, 0.0, 0.0),
                Coord::new(-1.0, 3.0, 0.0),
                Coord::new(0.0, 0.0, 4.0),
            ),
        );

        structure.to_orthorhombic();

        assert_eq!(Cell::orthorhombic(2.0, 3.0, 4.0), structure.cell);
        assert_eq!(
            vec![2.0, 1.0, 1.0, 1.0],
            structure.atoms.iter().map(|atom| atom.position.x).collect::<Vec<_>>()
        );
    }

    #[test]
    fn to_orthorhombic_is_idempotent() {
        let mut once = setup_structure();
        once.atoms.push(Atom::new("S", Coord::new(-3.2, 1.0, 0.0)));
        once.atoms.push(Atom::new("S", Coord::new(0.00005, 1.0, 0.0)));
        once.cell[1] = Coord::new(1.5, 4.0, 0.0);
        once.to_orthorhombic();

        let mut twice = once.clone();
        twice.to_orthorhombic();

        assert_eq!(once.cell, twice.cell);
        assert_eq!(positions(&once), positions(&twice));
    }

    #[test]
    fn remove_atoms_is_exclusive_and_keeps_the_rest() {
        let structure = setup_structure();
        let mut removed = structure.clone();

        removed.remove_atoms(0.5, 2.5, Direction::X);

        assert!(removed.atoms.iter().all(|atom| {
            let x = atom.position.x;
            !(x > 0.5 && x < 2.5)
        }));

        let expected: Vec<Atom> = structure.atoms
            .iter()
            .filter(|atom| atom.position.x <= 0.5 || atom.position.x >= 2.5)
            .cloned()
            .collect();
        assert_eq!(expected, removed.atoms);
        assert_eq!(3, removed.len());
    }

    #[test]
    fn remove_atoms_along_y_and_z() {
        let mut structure = setup_structure();
        structure.remove_atoms(std::f64::NEG_INFINITY, 1.5, Direction::Y);
        assert_eq!(2, structure.len());

        let mut structure = setup_structure();
        structure.remove_atoms(1.5, std::f64::INFINITY, Direction::Z);
        assert_eq!(2, structure.len());
    }

    #[test]
    fn merge_near_duplicates_replaces_pairs_with_their_midpoint() {
        let mut structure = AtomicStructure::new(
            vec![
                Atom::new("S", Coord::new(3.0, 1.0, 0.0)),
                Atom::new("Mo", Coord::new(0.0, 0.0, 0.0)),
                Atom::new("S", Coord::new(3.2, 1.0, 0.0)),
                Atom::new("S", Coord::new(3.0, 4.0, 0.0)),
            ],
            Cell::orthorhombic(6.0, 6.0, 6.0),
        ).with_lattice_constants(Coord::new(3.0, 3.0, 12.0));

        let merged = structure.merge_near_duplicates(3.0, 3.0);

        assert_eq!(1, merged);
        assert_eq!(3, structure.len());
        assert_eq!(Coord::new(3.1, 1.0, 0.0), structure.atoms[1].position);
    }

    #[test]
    fn merge_near_duplicates_ignores_pairs_far_from_the_anchor() {
        let mut structure = AtomicStructure::new(
            vec![
                Atom::new("S", Coord::new(10.0, 1.0, 0.0)),
                Atom::new("S", Coord::new(10.1, 1.0, 0.0)),
            ],
            Cell::orthorhombic(20.0, 6.0, 6.0),
        ).with_lattice_constants(Coord::new(3.0, 3.0, 12.0));

        assert_eq!(0, structure.merge_near_duplicates(0.0, 3.0));
        assert_eq!(2, structure.len());
    }

    #[test]
    fn merge_near_duplicates_repeats_until_no_overlaps_remain() {
        let mut structure = AtomicStructure::new(
            vec![
                Atom::new("S", Coord::new(0.0, 0.0, 0.0)),
                Atom::new("S", Coord::new(0.2, 0.0, 0.0)),
                Atom::new("S", Coord::new(0.4, 0.0, 0.0)),
            ],
            Cell::orthorhombic(6.0, 6.0, 6.0),
        ).with_lattice_constants(Coord::new(3.0, 3.0, 3.0));

        assert_eq!(2, structure.merge_near_duplicates(0.0, 3.0));
        assert_eq!(1, structure.len());
    }

    #[test]
    fn remove_duplicates_deletes_the_first_of_each_pair() {
        let mut structure = AtomicStructure::new(
            vec![
                Atom::new("A", Coord::new(1.0, 1.0, 0.0)),
                Atom::new("B", Coord::new(1.2, 1.0, 0.0)),
                Atom::new("C", Coord::new(3.0, 1.0, 0.0)),
            ],
            Cell::orthorhombic(10.0, 10.0, 10.0),
        );

        assert_eq!(1, structure.remove_duplicates(0.5));
        assert_eq!(vec!["B".to_string(), "C".to_string()], structure.species());
    }

    #[test]
    fn remove_duplicates_uses_the_minimum_image_in_plane() {
        let mut structure = AtomicStructure::new(
            vec![
                Atom::new("A", Coord::new(0.1, 1.0, 0.1)),
                Atom::new("B", Coord::new(9.9, 1.0, 0.1)),
                Atom::new("C", Coord::new(5.0, 1.0, 0.0)),
                Atom::new("D", Coord::new(5.0, 1.0, 9.9)),
            ],
            Cell::orthorhombic(10.0, 10.0, 10.0),
        );

        // Periodic along x but not z.
        assert_eq!(1, structure.remove_duplicates(0.5));
        assert_eq!(3, structure.len());
        assert_eq!("B", structure.atoms[0].species);
    }

    #[test]
    fn append_keeps_the_cell() {
        let mut structure = setup_structure();
        let mut other = setup_structure();
        other.cell = Cell::orthorhombic(1.0, 1.0, 1.0);

        structure.append(&other);

        assert_eq!(10, structure.len());
        assert_eq!(Cell::orthorhombic(3.0, 4.0, 6.0), structure.cell);
    }

    #[test]
    fn wrap_folds_only_the_requested_axes() {
        let mut structure = AtomicStructure::new(
            vec![
                Atom::new("A", Coord::new(-1.0, 5.0, 7.0)),
                Atom::new("A", Coord::new(4.0, -0.5, 0.0)),
                Atom::new("A", Coord::new(1.0, 4.0 - 1e-9, 0.0)),
            ],
            Cell::orthorhombic(3.0, 4.0, 6.0),
        );

        structure.wrap(Pbc::Y);

        assert_eq!(Coord::new(-1.0, 1.0, 7.0), structure.atoms[0].position);
        assert_eq!(Coord::new(4.0, 3.5, 0.0), structure.atoms[1].position);
        assert!(structure.atoms[2].position.y.abs() < 1e-6);
    }

    #[test]
    fn wrap_works_in_oblique_cells() {
        let mut structure = AtomicStructure::new(
            vec![Atom::new("A", Coord::new(0.5 + 1.0 + 2.0, 3.0, 0.0))],
            Cell::new(
                Coord::new(2.0, 0.0, 0.0),
                Coord::new(1.0, 3.0, 0.0),
                Coord::new(0.0, 0.0, 1.0),
            ),
        );

        structure.wrap(Pbc::X | Pbc::Y);

        assert_eq!(Coord::new(0.5, 0.0, 0.0), structure.atoms[0].position);
    }

    #[test]
    fn repeat_orders_images_and_scales_the_cell() {
        let mut structure = AtomicStructure::new(
            vec![Atom::new("A", Coord::new(0.5, 0.5, 0.5))],
            Cell::orthorhombic(1.0, 2.0, 3.0),
        ).with_lattice_constants(Coord::new(1.0, 2.0, 3.0));

        structure.repeat(2, 3, 1);

        assert_eq!(6, structure.len());
        assert_eq!(Cell::orthorhombic(2.0, 6.0, 3.0), structure.cell);
        assert_eq!(Coord::new(1.0, 2.0, 3.0), structure.lattice_constants);

        let expected = vec![
            Coord::new(0.5, 0.5, 0.5),
            Coord::new(0.5, 2.5, 0.5),
            Coord::new(0.5, 4.5, 0.5),
            Coord::new(1.5, 0.5, 0.5),
            Coord::new(1.5, 2.5, 0.5),
            Coord::new(1.5, 4.5, 0.5),
        ];
        assert_eq!(expected, positions(&structure));
    }

    #[test]
    fn mirror_doubles_atoms_and_cell_extent() {
        let mut structure = setup_structure();
        let num_atoms = structure.len();

        structure.mirror(Direction::X);

        assert_eq!(2 * num_atoms, structure.len());
        assert_eq!(6.0, structure.cell[0].x);
        assert_eq!(Coord::new(5.5, 0.5, 1.0), structure.atoms[num_atoms].position);
    }

    #[test]
    fn extreme_atoms_prefer_the_first_on_ties() {
        let structure = setup_structure();

        let top = structure.max_atom(Direction::Y, None).unwrap();
        assert_eq!(Coord::new(2.5, 3.0, 4.0), top.position);

        // Two S atoms share the largest x: the first is returned
        let right = structure.max_atom(Direction::X, Some("S")).unwrap();
        assert_eq!(Coord::new(1.5, 1.0, 0.5), right.position);

        let left = structure.min_atom(Direction::X, Some("Mo")).unwrap();
        assert_eq!(Coord::new(0.5, 0.5, 1.0), left.position);

        assert!(structure.max_atom(Direction::X, Some("W")).is_none());
    }

    #[test]
    fn sorting_is_stable_in_both_directions() {
        let structure = setup_structure();

        let ascending = structure.sorted_along(Direction::X, false);
        assert_eq!(Coord::new(0.0, 2.0, 5.0), ascending[0].position);
        assert_eq!(Coord::new(1.5, 1.0, 0.5), ascending[2].position);
        assert_eq!(Coord::new(1.5, 1.0, 2.0), ascending[3].position);

        let descending = structure.sorted_along(Direction::X, true);
        assert_eq!(Coord::new(2.5, 3.0, 4.0), descending[0].position);
        assert_eq!(Coord::new(1.5, 1.0, 0.5), descending[1].position);
        assert_eq!(Coord::new(1.5, 1.0, 2.0), descending[2].position);
    }

    #[test]
    fn fractional_coordinates_round_trip() {
        let cell = Cell::new(
            Coord::new(3.0, 0.0, 0.0),
            Coord::new(-1.5, 2.6, 0.0),
            Coord::new(0.0, 0.0, 12.0),
        );
        let coord = Coord::new(1.0, 2.0, 3.0);

        let fractional = cell.to_fractional(coord).unwrap();
        assert_eq!(coord, cell.to_cartesian(fractional));
        assert!(Cell::default().to_fractional(coord).is_none());
    }

    #[test]
    fn structure_serializes_to_json_and_back() {
        let structure = setup_structure();
        let json = serde_json::to_string(&structure).unwrap();
        let parsed: AtomicStructure = serde_json::from_str(&json).unwrap();

        assert_eq!(structure.atoms, parsed.atoms);
        assert_eq!(structure.cell, parsed.cell);
        assert_eq!(structure.pbc, parsed.pbc);
    }
}

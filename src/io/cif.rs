//! Read crystallographic information files (.cif).
//!
//! Only the parts needed to construct a primitive cell are read: the cell
//! parameters, the symmetry operations and the atom sites. Sites are expanded
//! by the symmetry operations and duplicates are removed.

use crate::coord::Coord;
use crate::error::{GrainError, Result};
use crate::structure::{Atom, AtomicStructure, Cell};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Fractional coordinates closer than this (per component, modulo 1) are the same site.
const SITE_TOLERANCE: f64 = 1e-4;

/// Read a structure from a CIF file.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<AtomicStructure> {
    let path = path.as_ref();
    let file = File::open(path)?;

    read_input(&mut BufReader::new(file))
        .map_err(|err| match err {
            GrainError::Parse(msg) => GrainError::Parse(format!("{}: {}", path.display(), msg)),
            err => err,
        })
}

fn read_input<R: Read>(input: &mut R) -> Result<AtomicStructure> {
    let mut buf = String::new();
    input.read_to_string(&mut buf)?;

    let data = CifData::from_str(&buf)?;
    let cell = data.cell()?;
    let operations = data.symmetry_operations()?;
    let sites = data.atom_sites()?;

    let mut expanded: Vec<(String, Coord)> = Vec::new();

    for (species, site) in sites {
        for op in &operations {
            let fractional = wrap_fractional(op.apply(site));

            if !expanded.iter().any(|(_, other)| is_same_site(fractional, *other)) {
                expanded.push((species.clone(), fractional));
            }
        }
    }

    let atoms = expanded.into_iter()
        .map(|(species, fractional)| Atom::new(&species, cell.to_cartesian(fractional)))
        .collect();

    let lattice_constants = cell.lengths();

    Ok(AtomicStructure::new(atoms, cell).with_lattice_constants(lattice_constants))
}

fn wrap_fractional(coord: Coord) -> Coord {
    let wrap = |v: f64| {
        let w = v.rem_euclid(1.0);
        if 1.0 - w < SITE_TOLERANCE { 0.0 } else { w }
    };

    Coord::new(wrap(coord.x), wrap(coord.y), wrap(coord.z))
}

fn is_same_site(f1: Coord, f2: Coord) -> bool {
    let d = f1 - f2;
    [d.x, d.y, d.z].iter().all(|v| (v - v.round()).abs() < SITE_TOLERANCE)
}

/// Key-value pairs and loops of a single data block.
#[derive(Debug, Default)]
struct CifData {
    values: HashMap<String, String>,
    loops: Vec<Loop>,
}

#[derive(Debug, Default)]
struct Loop {
    tags: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Loop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }
}

impl FromStr for CifData {
    type Err = GrainError;

    fn from_str(s: &str) -> Result<CifData> {
        let mut data = CifData::default();
        let mut lines = s.lines().map(strip_comment).peekable();

        while let Some(line) = lines.next() {
            let line = line.trim();

            if line.is_empty() || line.starts_with("data_") {
                continue;
            } else if line.starts_with(';') {
                // Skip a text field
                while let Some(next) = lines.next() {
                    if next.trim_start().starts_with(';') {
                        break;
                    }
                }
            } else if line.eq_ignore_ascii_case("loop_") {
                let mut current = Loop::default();

                while let Some(next) = lines.peek() {
                    let next = next.trim();

                    if next.starts_with('_') {
                        current.tags.push(next.to_lowercase());
                        lines.next();
                    } else {
                        break;
                    }
                }

                let mut tokens = Vec::new();
                while let Some(next) = lines.peek() {
                    let next = next.trim();

                    if next.starts_with('_') || next.eq_ignore_ascii_case("loop_")
                            || next.starts_with("data_") {
                        break;
                    }

                    tokens.extend(tokenize(next));
                    lines.next();
                }

                if current.tags.is_empty() {
                    return Err(GrainError::Parse("a loop has no tags".to_string()));
                }

                if tokens.len() % current.tags.len() != 0 {
                    return Err(GrainError::Parse(format!(
                        "the loop of {} has {} values which do not fill rows of {} columns",
                        current.tags[0], tokens.len(), current.tags.len()
                    )));
                }

                current.rows = tokens.chunks(current.tags.len()).map(|row| row.to_vec()).collect();
                data.loops.push(current);
            } else if line.starts_with('_') {
                let mut tokens = tokenize(line).into_iter();
                let tag = tokens.next().map(|t| t.to_lowercase()).unwrap_or_default();
                let value = tokens.next();

                match value {
                    Some(value) => {
                        data.values.insert(tag, value);
                    },
                    None => {
                        // The value is on the following line
                        if let Some(next) = lines.next() {
                            if let Some(value) = tokenize(next.trim()).into_iter().next() {
                                data.values.insert(tag, value);
                            }
                        }
                    },
                }
            }
        }

        Ok(data)
    }
}

impl CifData {
    fn number(&self, tag: &str) -> Result<f64> {
        let value = self.values
            .get(tag)
            .ok_or_else(|| GrainError::Parse(format!("missing '{}'", tag)))?;

        parse_number(value)
            .ok_or_else(|| GrainError::Parse(format!("could not read '{}' as a number for '{}'", value, tag)))
    }

    fn find_loop(&self, tag: &str) -> Option<(&Loop, usize)> {
        self.loops
            .iter()
            .filter_map(|l| l.column(tag).map(|i| (l, i)))
            .next()
    }

    fn cell(&self) -> Result<Cell> {
        let a = self.number("_cell_length_a")?;
        let b = self.number("_cell_length_b")?;
        let c = self.number("_cell_length_c")?;
        let alpha = self.number("_cell_angle_alpha")?.to_radians();
        let beta = self.number("_cell_angle_beta")?.to_radians();
        let gamma = self.number("_cell_angle_gamma")?.to_radians();

        let (sin_gamma, cos_gamma) = gamma.sin_cos();
        let cx = c * beta.cos();
        let cy = c * (alpha.cos() - beta.cos() * cos_gamma) / sin_gamma;
        let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();

        // Round away the noise of trigonometry on exact angles (cos 90° != 0)
        let clean = |v: f64| if v.abs() < 1e-10 { 0.0 } else { v };

        Ok(Cell::new(
            Coord::new(a, 0.0, 0.0),
            Coord::new(clean(b * cos_gamma), clean(b * sin_gamma), 0.0),
            Coord::new(clean(cx), clean(cy), clean(cz)),
        ))
    }

    fn symmetry_operations(&self) -> Result<Vec<SymmetryOperation>> {
        let tags = ["_symmetry_equiv_pos_as_xyz", "_space_group_symop_operation_xyz"];

        match tags.iter().filter_map(|tag| self.find_loop(tag)).next() {
            Some((symops, column)) => symops.rows
                .iter()
                .map(|row| SymmetryOperation::from_str(&row[column]))
                .collect(),
            None => Ok(vec![SymmetryOperation::identity()]),
        }
    }

    fn atom_sites(&self) -> Result<Vec<(String, Coord)>> {
        let (sites, x) = self.find_loop("_atom_site_fract_x")
            .ok_or_else(|| GrainError::Parse("missing the '_atom_site_fract_x' loop".to_string()))?;

        let column = |tag: &str| {
            sites.column(tag)
                .ok_or_else(|| GrainError::Parse(format!("missing '{}' in the atom site loop", tag)))
        };

        let y = column("_atom_site_fract_y")?;
        let z = column("_atom_site_fract_z")?;
        let species = sites.column("_atom_site_type_symbol")
            .or_else(|| sites.column("_atom_site_label"))
            .ok_or_else(|| GrainError::Parse("the atom sites have no species or labels".to_string()))?;

        sites.rows
            .iter()
            .map(|row| {
                let name = element_symbol(&row[species]);
                let coords = [&row[x], &row[y], &row[z]]
                    .iter()
                    .map(|value| parse_number(value)
                        .ok_or_else(|| GrainError::Parse(format!("could not read the fractional coordinate '{}'", value))))
                    .collect::<Result<Vec<f64>>>()?;

                Ok((name, Coord::new(coords[0], coords[1], coords[2])))
            })
            .collect()
    }
}

/// Remove a trailing comment from a line. Hashes inside quotes are kept.
fn strip_comment(line: &str) -> &str {
    let mut quote = None;

    for (i, c) in line.char_indices() {
        match (c, quote) {
            ('\'', None) | ('"', None) => quote = Some(c),
            (q, Some(open)) if q == open => quote = None,
            ('#', None) => return &line[..i],
            _ => (),
        }
    }

    line
}

/// Split a line into whitespace separated values. Quoted values may contain spaces.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' || c == '"' {
            chars.next();
            let token: String = chars.by_ref().take_while(|&next| next != c).collect();
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() {
                    break;
                }
                token.push(next);
                chars.next();
            }
            tokens.push(token);
        }
    }

    tokens
}

/// Parse a number with an optional standard uncertainty: "3.160(2)".
fn parse_number(value: &str) -> Option<f64> {
    let value = match value.find('(') {
        Some(i) => &value[..i],
        None => value,
    };

    value.trim().parse::<f64>().ok()
}

/// The alphabetic prefix of a type symbol or label: "Mo1" and "Mo4+" are "Mo".
fn element_symbol(label: &str) -> String {
    label.chars().take_while(|c| c.is_ascii_alphabetic()).collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// An affine operation on fractional coordinates.
struct SymmetryOperation {
    rotation: [[f64; 3]; 3],
    translation: [f64; 3],
}

impl SymmetryOperation {
    fn identity() -> SymmetryOperation {
        SymmetryOperation {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0; 3],
        }
    }

    fn apply(&self, coord: Coord) -> Coord {
        let f = [coord.x, coord.y, coord.z];
        let mut result = self.translation;

        for (i, row) in self.rotation.iter().enumerate() {
            result[i] += row.iter().zip(f.iter()).map(|(r, v)| r * v).sum::<f64>();
        }

        Coord::from(result)
    }
}

impl FromStr for SymmetryOperation {
    type Err = GrainError;

    /// Parse an operation like "-x+y, 1/2+z, -y".
    fn from_str(s: &str) -> Result<SymmetryOperation> {
        let err = || GrainError::Parse(format!("could not read the symmetry operation '{}'", s));

        let components: Vec<&str> = s.split(',').map(|c| c.trim()).collect();
        if components.len() != 3 {
            return Err(err());
        }

        let mut op = SymmetryOperation { rotation: [[0.0; 3]; 3], translation: [0.0; 3] };

        for (i, component) in components.iter().enumerate() {
            let expression: String = component.chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_ascii_lowercase())
                .collect();

            if expression.is_empty() {
                return Err(err());
            }

            // Split into signed terms: "-x+1/2" -> ["-x", "+1/2"]
            let mut terms: Vec<String> = Vec::new();
            for c in expression.chars() {
                if (c == '+' || c == '-') || terms.is_empty() {
                    terms.push(String::new());
                }
                if let Some(term) = terms.last_mut() {
                    term.push(c);
                }
            }

            for term in terms {
                let (sign, body) = match term.chars().next() {
                    Some('-') => (-1.0, &term[1..]),
                    Some('+') => (1.0, &term[1..]),
                    _ => (1.0, &term[..]),
                };

                let axis = match body.chars().last() {
                    Some('x') => Some(0),
                    Some('y') => Some(1),
                    Some('z') => Some(2),
                    _ => None,
                };

                match axis {
                    Some(j) => {
                        let factor = &body[..body.len() - 1];
                        let factor = if factor.is_empty() {
                            1.0
                        } else {
                            parse_fraction(factor.trim_end_matches('*')).ok_or_else(err)?
                        };
                        op.rotation[i][j] += sign * factor;
                    },
                    None => {
                        op.translation[i] += sign * parse_fraction(body).ok_or_else(err)?;
                    },
                }
            }
        }

        Ok(op)
    }
}

/// Parse "1/2", "0.5" or "1".
fn parse_fraction(value: &str) -> Option<f64> {
    let mut parts = value.splitn(2, '/');
    let numerator = parts.next()?.parse::<f64>().ok()?;

    match parts.next() {
        Some(denominator) => denominator.parse::<f64>().ok().map(|d| numerator / d),
        None => Some(numerator),
    }
}

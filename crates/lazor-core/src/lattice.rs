//! Doubled-coordinate lattice.
//!
//! An `R x C` author grid expands to a `(2C+1) x (2R+1)` lattice. Block slots
//! sit at odd/odd coordinates; every other point is a node or edge that rays
//! travel through and that never holds a block.

use crate::error::{LazorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lattice coordinate. Signed so that one step past the border is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are odd, i.e. the point is a block slot.
    pub fn is_slot(&self) -> bool {
        self.x % 2 != 0 && self.y % 2 != 0
    }

    /// 1-based (column, row) of the author grid cell for a slot point
    pub fn author_coords(&self) -> (i32, i32) {
        (self.x / 2 + 1, self.y / 2 + 1)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The three block kinds a slot can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Mirrors one axis of the ray direction
    Reflect,
    /// Absorbs the ray
    Opaque,
    /// Splits the ray into a transmitted and a reflected branch
    Refract,
}

impl BlockKind {
    pub const ALL: [BlockKind; 3] = [BlockKind::Reflect, BlockKind::Opaque, BlockKind::Refract];

    /// Letter used by the puzzle format
    pub fn letter(self) -> char {
        match self {
            BlockKind::Reflect => 'A',
            BlockKind::Opaque => 'B',
            BlockKind::Refract => 'C',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'A' => Some(BlockKind::Reflect),
            'B' => Some(BlockKind::Opaque),
            'C' => Some(BlockKind::Refract),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            BlockKind::Reflect => 0,
            BlockKind::Opaque => 1,
            BlockKind::Refract => 2,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Reflect => write!(f, "Reflect"),
            BlockKind::Opaque => write!(f, "Opaque"),
            BlockKind::Refract => write!(f, "Refract"),
        }
    }
}

/// Value of a single lattice cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Node, edge, or blank slot. Never interacts.
    #[default]
    Empty,
    /// Slot that can never hold a block
    Blocked,
    /// Slot available for placement
    Open,
    /// Block given by the puzzle itself
    Fixed(BlockKind),
    /// Block placed by the search
    Placed(BlockKind),
}

impl Cell {
    /// The block occupying this cell, whether fixed or placed
    pub fn block(&self) -> Option<BlockKind> {
        match self {
            Cell::Fixed(kind) | Cell::Placed(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Cell::Open)
    }

    /// Symbol in the compact author-grid view
    pub fn symbol(&self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Blocked => 'x',
            Cell::Open => 'o',
            Cell::Fixed(kind) | Cell::Placed(kind) => kind.letter(),
        }
    }
}

/// Rectangular lattice of cells, row-major.
///
/// Dimensions are odd and at least 3, and only odd/odd slots hold anything
/// other than `Empty`. Deserialization checks the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLattice")]
pub struct Lattice {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

#[derive(Deserialize)]
struct RawLattice {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl TryFrom<RawLattice> for Lattice {
    type Error = LazorError;

    fn try_from(raw: RawLattice) -> Result<Self> {
        if raw.width < 3 || raw.height < 3 || raw.width % 2 == 0 || raw.height % 2 == 0 {
            return Err(LazorError::InvalidLattice(format!(
                "dimensions {}x{} must be odd and at least 3",
                raw.width, raw.height
            )));
        }
        if raw.cells.len() != raw.width * raw.height {
            return Err(LazorError::InvalidLattice(format!(
                "{} cells for a {}x{} lattice",
                raw.cells.len(),
                raw.width,
                raw.height
            )));
        }

        let lattice = Lattice {
            width: raw.width,
            height: raw.height,
            cells: raw.cells,
        };
        if let Some(p) = lattice
            .points()
            .find(|p| !p.is_slot() && lattice.cell_at(*p) != Cell::Empty)
        {
            return Err(LazorError::InvalidLattice(format!(
                "{} is not a slot but holds '{}'",
                p,
                lattice.cell_at(p).symbol()
            )));
        }
        Ok(lattice)
    }
}

impl Lattice {
    /// Expand author rows into the doubled lattice.
    ///
    /// Fails when there are no rows, a row is empty, or rows differ in length.
    pub fn from_author_rows(rows: &[Vec<Cell>]) -> Result<Self> {
        let author_width = rows.first().map_or(0, Vec::len);
        if author_width == 0 {
            return Err(LazorError::InvalidLattice("author grid is empty".to_string()));
        }
        if let Some(row) = rows.iter().position(|r| r.len() != author_width) {
            return Err(LazorError::InvalidLattice(format!(
                "author row {} has {} cells, expected {}",
                row + 1,
                rows[row].len(),
                author_width
            )));
        }

        let width = author_width * 2 + 1;
        let height = rows.len() * 2 + 1;
        let mut cells = vec![Cell::Empty; width * height];

        for (row, line) in rows.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                cells[(row * 2 + 1) * width + col * 2 + 1] = *cell;
            }
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.height
    }

    fn index(&self, p: Point) -> Option<usize> {
        if self.contains(p) {
            Some(p.y as usize * self.width + p.x as usize)
        } else {
            None
        }
    }

    /// Cell at `p`, or `None` when out of bounds
    pub fn get(&self, p: Point) -> Option<Cell> {
        self.index(p).map(|i| self.cells[i])
    }

    /// Put `kind` into the open slot at `position`.
    pub fn place(&mut self, kind: BlockKind, position: Point) -> Result<()> {
        let idx = self
            .index(position)
            .ok_or_else(|| LazorError::invalid_placement(position, "outside the lattice"))?;
        match self.cells[idx] {
            Cell::Open => {
                self.cells[idx] = Cell::Placed(kind);
                Ok(())
            }
            other => Err(LazorError::invalid_placement(
                position,
                format!("slot is not open (holds '{}')", other.symbol()),
            )),
        }
    }

    /// Undo a search placement, returning the slot to `Open`.
    pub fn revert(&mut self, position: Point) -> Result<BlockKind> {
        let idx = self
            .index(position)
            .ok_or_else(|| LazorError::invalid_placement(position, "outside the lattice"))?;
        match self.cells[idx] {
            Cell::Placed(kind) => {
                self.cells[idx] = Cell::Open;
                Ok(kind)
            }
            other => Err(LazorError::invalid_placement(
                position,
                format!("no placed block to revert (holds '{}')", other.symbol()),
            )),
        }
    }

    /// Every open slot, row-major
    pub fn available_positions(&self) -> Vec<Point> {
        self.points().filter(|&p| self.cell_at(p).is_open()).collect()
    }

    /// Blocks placed by the search, row-major
    pub fn placed_blocks(&self) -> Vec<(Point, BlockKind)> {
        self.points()
            .filter_map(|p| match self.cell_at(p) {
                Cell::Placed(kind) => Some((p, kind)),
                _ => None,
            })
            .collect()
    }

    fn cell_at(&self, p: Point) -> Cell {
        self.cells[p.y as usize * self.width + p.x as usize]
    }

    fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Point::new(x as i32, y as i32)))
    }

    /// Compact author-grid rows (slot symbols only)
    pub fn author_rows(&self) -> Vec<String> {
        (1..self.height)
            .step_by(2)
            .map(|y| {
                (1..self.width)
                    .step_by(2)
                    .map(|x| self.cells[y * self.width + x].symbol().to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

#[cfg(test)]
impl Lattice {
    /// Build from author rows written like the puzzle format, e.g. `["o x", "A o"]`.
    pub(crate) fn from_rows_str(rows: &[&str]) -> Self {
        let rows: Vec<Vec<Cell>> = rows
            .iter()
            .map(|row| {
                row.split_whitespace()
                    .map(|token| match token {
                        "o" => Cell::Open,
                        "x" => Cell::Blocked,
                        "." => Cell::Empty,
                        other => Cell::Fixed(
                            BlockKind::from_letter(other.chars().next().unwrap_or('?'))
                                .expect("unknown test token"),
                        ),
                    })
                    .collect()
            })
            .collect();
        Self::from_author_rows(&rows).expect("test rows must be rectangular")
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.author_rows() {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

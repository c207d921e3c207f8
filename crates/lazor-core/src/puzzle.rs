//! Puzzle ingestion for the line-oriented `.bff` format.
//!
//! ```text
//! # comment
//! GRID START
//! o B o
//! o o x
//! GRID STOP
//! A 2
//! L 2 4 1 -1
//! P 4 1
//! ```
//!
//! Grid tokens are `o` (open), `x` (never holds a block) and `A`/`B`/`C`
//! (a block fixed by the puzzle). Ray and target coordinates are lattice
//! coordinates, not author-grid ones.

use crate::error::{LazorError, Result};
use crate::{BlockKind, Cell, Direction, Inventory, Lattice, Point, Ray};
use std::path::Path;
use std::str::FromStr;

/// Everything the search needs: the starting lattice, the blocks to place,
/// the rays and the target points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub lattice: Lattice,
    pub inventory: Inventory,
    pub rays: Vec<Ray>,
    pub targets: Vec<Point>,
}

impl Puzzle {
    pub fn new(lattice: Lattice, inventory: Inventory, rays: Vec<Ray>, targets: Vec<Point>) -> Self {
        Self {
            lattice,
            inventory,
            rays,
            targets,
        }
    }

    /// Read and parse a puzzle file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let puzzle: Puzzle = text.parse()?;
        log::debug!(
            "loaded {}: {}x{} lattice, {} rays, {} targets",
            path.display(),
            puzzle.lattice.width(),
            puzzle.lattice.height(),
            puzzle.rays.len(),
            puzzle.targets.len()
        );
        Ok(puzzle)
    }
}

impl FromStr for Puzzle {
    type Err = LazorError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser::default();
        for (index, raw) in s.lines().enumerate() {
            parser.line(index + 1, raw.trim())?;
        }
        parser.finish()
    }
}

#[derive(Default)]
struct Parser {
    rows: Vec<Vec<Cell>>,
    /// Line of the `GRID START` currently open
    grid_open: Option<usize>,
    grid_seen: bool,
    counts: [Option<usize>; 3],
    rays: Vec<(usize, Point, Direction)>,
    targets: Vec<(usize, Point)>,
    last_line: usize,
}

impl Parser {
    fn line(&mut self, line: usize, text: &str) -> Result<()> {
        self.last_line = line;
        if text.is_empty() || text.starts_with('#') {
            return Ok(());
        }

        match text {
            "GRID START" => {
                if self.grid_open.is_some() {
                    return Err(LazorError::parse(line, "nested GRID START"));
                }
                if self.grid_seen {
                    return Err(LazorError::parse(line, "puzzle already has a grid"));
                }
                self.grid_open = Some(line);
                self.grid_seen = true;
                return Ok(());
            }
            "GRID STOP" => {
                if self.grid_open.take().is_none() {
                    return Err(LazorError::parse(line, "GRID STOP without GRID START"));
                }
                return Ok(());
            }
            _ => {}
        }

        if self.grid_open.is_some() {
            return self.grid_row(line, text);
        }

        let fields: Vec<&str> = text.split_whitespace().collect();
        match fields[0] {
            "A" | "B" | "C" => self.count(line, &fields),
            "L" => {
                let [x, y, dx, dy] = integers::<4>(line, &fields)?;
                let direction = Direction::new(dx, dy).ok_or_else(|| {
                    LazorError::parse(line, format!("ray direction ({}, {}) must be diagonal", dx, dy))
                })?;
                self.rays.push((line, Point::new(x, y), direction));
                Ok(())
            }
            "P" => {
                let [x, y] = integers::<2>(line, &fields)?;
                self.targets.push((line, Point::new(x, y)));
                Ok(())
            }
            other => Err(LazorError::parse(line, format!("unknown directive '{}'", other))),
        }
    }

    fn grid_row(&mut self, line: usize, text: &str) -> Result<()> {
        let row = text
            .split_whitespace()
            .map(|token| match token {
                "o" => Ok(Cell::Open),
                "x" => Ok(Cell::Blocked),
                "A" | "B" | "C" => Ok(Cell::Fixed(kind_of(token))),
                other => Err(LazorError::parse(line, format!("unknown grid token '{}'", other))),
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(first) = self.rows.first() {
            if first.len() != row.len() {
                return Err(LazorError::parse(
                    line,
                    format!("grid row has {} cells, expected {}", row.len(), first.len()),
                ));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    fn count(&mut self, line: usize, fields: &[&str]) -> Result<()> {
        let kind = kind_of(fields[0]);
        if fields.len() != 2 {
            return Err(LazorError::parse(
                line,
                format!("expected '{} <count>'", kind.letter()),
            ));
        }
        let count: usize = fields[1].parse().map_err(|_| {
            LazorError::parse(line, format!("invalid block count '{}'", fields[1]))
        })?;

        let slot = &mut self.counts[kind.index()];
        if slot.is_some() {
            return Err(LazorError::parse(
                line,
                format!("count for '{}' given twice", kind.letter()),
            ));
        }
        *slot = Some(count);
        Ok(())
    }

    fn finish(self) -> Result<Puzzle> {
        let end = self.last_line.max(1);
        if let Some(start) = self.grid_open {
            return Err(LazorError::parse(start, "GRID START is never closed"));
        }
        if self.rows.is_empty() {
            return Err(LazorError::parse(end, "puzzle has no grid rows"));
        }

        let lattice = Lattice::from_author_rows(&self.rows)?;

        let mut inventory = Inventory::default();
        for kind in BlockKind::ALL {
            inventory.set(kind, self.counts[kind.index()].unwrap_or(0));
        }
        if inventory.total() == 0 {
            return Err(LazorError::parse(end, "puzzle has no blocks to place"));
        }

        let mut rays = Vec::with_capacity(self.rays.len());
        for (line, origin, direction) in self.rays {
            if !lattice.contains(origin) {
                return Err(LazorError::parse(
                    line,
                    format!("ray origin {} is outside the lattice", origin),
                ));
            }
            rays.push(Ray::new(origin, direction));
        }
        if rays.is_empty() {
            return Err(LazorError::parse(end, "puzzle has no rays"));
        }

        let mut targets = Vec::with_capacity(self.targets.len());
        for (line, target) in self.targets {
            if !lattice.contains(target) {
                return Err(LazorError::parse(
                    line,
                    format!("target {} is outside the lattice", target),
                ));
            }
            targets.push(target);
        }
        if targets.is_empty() {
            return Err(LazorError::parse(end, "puzzle has no targets"));
        }

        Ok(Puzzle::new(lattice, inventory, rays, targets))
    }
}

/// Only called with "A", "B" or "C".
fn kind_of(token: &str) -> BlockKind {
    match token {
        "A" => BlockKind::Reflect,
        "B" => BlockKind::Opaque,
        _ => BlockKind::Refract,
    }
}

/// Parse the `N` integer fields following the directive letter.
fn integers<const N: usize>(line: usize, fields: &[&str]) -> Result<[i32; N]> {
    if fields.len() != N + 1 {
        return Err(LazorError::parse(
            line,
            format!("'{}' takes {} values, got {}", fields[0], N, fields.len() - 1),
        ));
    }
    let mut values = [0; N];
    for (value, field) in values.iter_mut().zip(&fields[1..]) {
        *value = field
            .parse()
            .map_err(|_| LazorError::parse(line, format!("'{}' is not an integer", field)))?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = "\
# a small puzzle
GRID START
o B o
x o o
GRID STOP

A 2
C 1
L 2 4 1 -1
P 4 1
P 3 2
";

    fn parse_err(text: &str) -> (usize, String) {
        match text.parse::<Puzzle>() {
            Err(LazorError::Parse { line, message }) => (line, message),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_puzzle() {
        let puzzle: Puzzle = MIXED.parse().unwrap();

        assert_eq!(puzzle.lattice.width(), 7);
        assert_eq!(puzzle.lattice.height(), 5);
        assert_eq!(puzzle.lattice.get(Point::new(3, 1)), Some(Cell::Fixed(BlockKind::Opaque)));
        assert_eq!(puzzle.lattice.get(Point::new(1, 3)), Some(Cell::Blocked));
        assert_eq!(puzzle.lattice.get(Point::new(5, 3)), Some(Cell::Open));
        assert_eq!(puzzle.lattice.available_positions().len(), 4);

        assert_eq!(puzzle.inventory, Inventory::new(2, 0, 1));
        assert_eq!(
            puzzle.rays,
            vec![Ray::new(Point::new(2, 4), Direction::new(1, -1).unwrap())]
        );
        assert_eq!(puzzle.targets, vec![Point::new(4, 1), Point::new(3, 2)]);
    }

    #[test]
    fn test_fixed_blocks_are_not_search_placements() {
        let puzzle: Puzzle = MIXED.parse().unwrap();
        assert!(puzzle.lattice.placed_blocks().is_empty());
        assert_eq!(puzzle.lattice.to_string(), "o B o\nx o o\n");
    }

    #[test]
    fn test_rejects_unterminated_grid() {
        let (line, message) = parse_err("GRID START\no o\n");
        assert_eq!(line, 1);
        assert!(message.contains("never closed"));
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let (line, _) = parse_err("GRID START\no o\no\nGRID STOP\nA 1\nL 0 1 1 1\nP 1 0\n");
        assert_eq!(line, 3);
    }

    #[test]
    fn test_rejects_unknown_tokens() {
        let (line, message) = parse_err("GRID START\no q\nGRID STOP\n");
        assert_eq!(line, 2);
        assert!(message.contains("'q'"));

        let (line, _) = parse_err("GRID START\no\nGRID STOP\nZ 1\n");
        assert_eq!(line, 4);
    }

    #[test]
    fn test_rejects_bad_counts() {
        let grid = "GRID START\no o\nGRID STOP\n";
        let (line, message) = parse_err(&format!("{}A 1\nA 2\n", grid));
        assert_eq!(line, 5);
        assert!(message.contains("twice"));

        let (_, message) = parse_err(&format!("{}B -1\n", grid));
        assert!(message.contains("invalid block count"));

        let (_, message) = parse_err(&format!("{}C 1 2\n", grid));
        assert!(message.contains("expected"));
    }

    #[test]
    fn test_rejects_bad_rays_and_targets() {
        let grid = "GRID START\no o\nGRID STOP\nA 1\n";
        let (line, message) = parse_err(&format!("{}L 1 2 1 0\nP 1 0\n", grid));
        assert_eq!(line, 5);
        assert!(message.contains("diagonal"));

        let (_, message) = parse_err(&format!("{}L 1 2 1\nP 1 0\n", grid));
        assert!(message.contains("takes 4 values"));

        let (_, message) = parse_err(&format!("{}L 1 two 1 1\nP 1 0\n", grid));
        assert!(message.contains("not an integer"));

        let (line, message) = parse_err(&format!("{}L 9 2 1 1\nP 1 0\n", grid));
        assert_eq!(line, 5);
        assert!(message.contains("outside"));

        let (line, _) = parse_err(&format!("{}L 0 1 1 1\nP 1 3\n", grid));
        assert_eq!(line, 6);
    }

    #[test]
    fn test_rejects_incomplete_puzzles() {
        let grid = "GRID START\no o\nGRID STOP\n";
        let (_, message) = parse_err(&format!("{}L 0 1 1 1\nP 1 0\n", grid));
        assert!(message.contains("no blocks"));

        let (_, message) = parse_err(&format!("{}A 1\nP 1 0\n", grid));
        assert!(message.contains("no rays"));

        let (_, message) = parse_err(&format!("{}A 1\nL 0 1 1 1\n", grid));
        assert!(message.contains("no targets"));

        let (_, message) = parse_err("A 1\nL 0 1 1 1\nP 1 0\n");
        assert!(message.contains("no grid"));
    }

    #[test]
    fn test_rejects_grid_markers_out_of_order() {
        let (line, _) = parse_err("GRID STOP\n");
        assert_eq!(line, 1);

        let (line, message) = parse_err("GRID START\no\nGRID STOP\nGRID START\no\nGRID STOP\n");
        assert_eq!(line, 4);
        assert!(message.contains("already"));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Puzzle::load("/nonexistent/puzzle.bff").unwrap_err();
        assert!(matches!(err, LazorError::Io(_)));
    }
}

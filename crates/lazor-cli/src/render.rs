use lazor_core::{BlockKind, Outcome, Point, SearchStats, Solution, Strategy};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Machine-readable form of a solve, written by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub puzzle: String,
    pub solved: bool,
    /// `solved`, `no_solution` or `out_of_budget`
    pub status: &'static str,
    pub strategy: Option<Strategy>,
    pub seed: u64,
    pub elapsed_secs: f64,
    /// Compact author-grid rows of the solved lattice
    pub grid: Vec<String>,
    pub placements: Vec<PlacedBlock>,
    pub stats: SearchStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedBlock {
    pub kind: BlockKind,
    pub letter: char,
    /// 1-based author-grid column
    pub column: i32,
    /// 1-based author-grid row
    pub row: i32,
    pub position: Point,
}

impl Report {
    pub fn new(puzzle: &str, outcome: &Outcome, seed: u64, elapsed: Duration) -> Self {
        let status = match outcome {
            Outcome::Solved(_) => "solved",
            Outcome::NoSolution { .. } => "no_solution",
            Outcome::OutOfBudget { .. } => "out_of_budget",
        };
        let solution = outcome.solution();
        Self {
            puzzle: puzzle.to_string(),
            solved: outcome.is_solved(),
            status,
            strategy: solution.map(|s| s.strategy),
            seed: solution.and_then(|s| s.seed).unwrap_or(seed),
            elapsed_secs: elapsed.as_secs_f64(),
            grid: solution.map(|s| s.lattice.author_rows()).unwrap_or_default(),
            placements: solution.map(placed_blocks).unwrap_or_default(),
            stats: *outcome.stats(),
        }
    }
}

fn placed_blocks(solution: &Solution) -> Vec<PlacedBlock> {
    solution
        .placements
        .iter()
        .map(|placement| {
            let (column, row) = placement.position.author_coords();
            PlacedBlock {
                kind: placement.kind,
                letter: placement.kind.letter(),
                column,
                row,
                position: placement.position,
            }
        })
        .collect()
}

/// Human-readable report
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.solved {
            writeln!(f, "=== SOLUTION ===")?;
            writeln!(f, "Final Grid Layout:")?;
            for row in &self.grid {
                writeln!(f, "{}", row)?;
            }

            writeln!(f, "\nPlaced Blocks:")?;
            for (i, block) in self.placements.iter().enumerate() {
                writeln!(
                    f,
                    "{}. Block {} at ({}, {})",
                    i + 1,
                    block.letter,
                    block.column,
                    block.row
                )?;
            }

            let kinds: BTreeSet<BlockKind> = self.placements.iter().map(|b| b.kind).collect();
            writeln!(
                f,
                "\nSummary: Placed {} blocks ({} unique types)",
                self.placements.len(),
                kinds.len()
            )?;
            if let Some(strategy) = self.strategy {
                writeln!(f, "Strategy: {}", strategy)?;
            }
        } else if self.status == "out_of_budget" {
            writeln!(
                f,
                "No solution within the iteration budget ({} iterations)",
                self.stats.iterations
            )?;
        } else {
            writeln!(
                f,
                "No solution found ({} placements tried, {} backtracks)",
                self.stats.placements, self.stats.backtracks
            )?;
        }

        writeln!(f, "Seed: {}", self.seed)?;
        let verb = if self.solved { "solved" } else { "searched" };
        writeln!(f, "Puzzle {} in {:.2} seconds", verb, self.elapsed_secs)
    }
}

use crate::{BlockKind, Lattice, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate-generation policy of a single search run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Reflect/refract only where a ray grazes an open slot; opaque anywhere
    Heuristic,
    /// Every kind at every open slot
    Exhaustive,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Heuristic => write!(f, "Heuristic"),
            Strategy::Exhaustive => write!(f, "Exhaustive"),
        }
    }
}

/// Which strategies a solve runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    /// Heuristic first, exhaustive if that finds nothing
    #[default]
    Auto,
    Heuristic,
    Exhaustive,
}

impl StrategyChoice {
    /// Strategies to run, in order
    pub fn sequence(&self) -> &'static [Strategy] {
        match self {
            StrategyChoice::Auto => &[Strategy::Heuristic, Strategy::Exhaustive],
            StrategyChoice::Heuristic => &[Strategy::Heuristic],
            StrategyChoice::Exhaustive => &[Strategy::Exhaustive],
        }
    }
}

/// Configuration for a solve
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Strategy selection
    pub strategy: StrategyChoice,
    /// Seed for candidate selection; drawn from OS entropy when absent
    pub seed: Option<u64>,
    /// Loop iterations allowed per strategy run before giving up
    pub max_iterations: Option<usize>,
    /// Step ceiling for a single trace; scales with lattice size when absent
    pub trace_step_limit: Option<usize>,
}

impl SolverConfig {
    pub fn auto() -> Self {
        Self::default()
    }

    pub fn heuristic() -> Self {
        Self {
            strategy: StrategyChoice::Heuristic,
            ..Self::default()
        }
    }

    pub fn exhaustive() -> Self {
        Self {
            strategy: StrategyChoice::Exhaustive,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

/// One committed decision of the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Point,
    pub kind: BlockKind,
}

/// Counters collected over one or more search runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Loop iterations of the search state machine
    pub iterations: usize,
    /// Blocks put on the lattice (including ones later undone)
    pub placements: usize,
    pub backtracks: usize,
    /// Goal evaluations at full depth
    pub evaluations: usize,
    /// Traces abandoned at the step ceiling
    pub trace_overruns: usize,
}

impl SearchStats {
    pub(crate) fn absorb(&mut self, other: &SearchStats) {
        self.iterations += other.iterations;
        self.placements += other.placements;
        self.backtracks += other.backtracks;
        self.evaluations += other.evaluations;
        self.trace_overruns += other.trace_overruns;
    }
}

/// A solved puzzle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Lattice with every block placed
    pub lattice: Lattice,
    /// Placements in the order they were made
    pub placements: Vec<Placement>,
    /// Strategy that found the solution
    pub strategy: Strategy,
    /// Seed the random source was built from, when the solver built it
    pub seed: Option<u64>,
    pub stats: SearchStats,
}

/// Result of a solve. `NoSolution` is an answer, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Solved(Solution),
    /// Every branch was exhausted
    NoSolution { stats: SearchStats },
    /// The iteration budget ran out first
    OutOfBudget { stats: SearchStats },
}

impl Outcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Outcome::Solved(_))
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Outcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn into_solution(self) -> Option<Solution> {
        match self {
            Outcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn stats(&self) -> &SearchStats {
        match self {
            Outcome::Solved(solution) => &solution.stats,
            Outcome::NoSolution { stats } | Outcome::OutOfBudget { stats } => stats,
        }
    }
}

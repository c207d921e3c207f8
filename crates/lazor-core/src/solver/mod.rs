//! Solver orchestrator.
//!
//! Runs the placement search under one or both candidate policies and
//! packages the result. All search state is per-call.

mod candidates;
mod goal;
mod search;
mod types;

pub use candidates::{AttemptSet, CandidatePool, KindCandidates};
pub use goal::{is_solved, unhit_targets};
pub use search::{Search, SearchEnd, SearchState};
pub use types::{
    Outcome, Placement, SearchStats, Solution, SolverConfig, Strategy, StrategyChoice,
};

use crate::error::Result;
use crate::tracer::{Trace, Tracer};
use crate::{Lattice, Puzzle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct Solver {
    config: SolverConfig,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a solver with the default configuration (auto strategy, entropy seed).
    pub fn new() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Tracer for `lattice`, honoring a configured step ceiling
    pub fn tracer_for(&self, lattice: &Lattice) -> Tracer {
        match self.config.trace_step_limit {
            Some(limit) => Tracer::new(limit),
            None => Tracer::for_lattice(lattice),
        }
    }

    /// Solve the puzzle with a random source seeded from the configuration.
    pub fn solve(&self, puzzle: &Puzzle) -> Result<Outcome> {
        let seed = self.config.seed.unwrap_or_else(entropy_seed);
        log::info!("solving with seed {}", seed);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut outcome = self.solve_with_rng(puzzle, &mut rng)?;
        if let Outcome::Solved(solution) = &mut outcome {
            solution.seed = Some(seed);
        }
        Ok(outcome)
    }

    /// Solve the puzzle drawing candidates from `rng`.
    pub fn solve_with_rng<R: Rng + ?Sized>(&self, puzzle: &Puzzle, rng: &mut R) -> Result<Outcome> {
        let tracer = self.tracer_for(&puzzle.lattice);
        let mut stats = SearchStats::default();
        let mut last_end = SearchEnd::Exhausted;

        for &strategy in self.config.strategy.sequence() {
            log::info!(
                "{} search: {} blocks to place, {} open slots",
                strategy,
                puzzle.inventory.total(),
                puzzle.lattice.available_positions().len()
            );
            let mut search = Search::new(strategy, puzzle, tracer);
            last_end = search.run(rng, self.config.max_iterations)?;
            stats.absorb(search.stats());

            match last_end {
                SearchEnd::Solved => {
                    let (lattice, placements) = search.into_parts();
                    return Ok(Outcome::Solved(Solution {
                        lattice,
                        placements,
                        strategy,
                        seed: None,
                        stats,
                    }));
                }
                SearchEnd::Exhausted => log::info!("{} search exhausted", strategy),
                SearchEnd::OutOfBudget => {}
            }
        }

        Ok(match last_end {
            SearchEnd::OutOfBudget => Outcome::OutOfBudget { stats },
            _ => Outcome::NoSolution { stats },
        })
    }

    /// Trace every ray against the puzzle's own lattice
    pub fn trace(&self, puzzle: &Puzzle) -> Result<Vec<Trace>> {
        let tracer = self.tracer_for(&puzzle.lattice);
        puzzle
            .rays
            .iter()
            .map(|ray| tracer.trace(&puzzle.lattice, ray))
            .collect()
    }

    /// Whether `lattice` satisfies the puzzle's targets
    pub fn verify(&self, puzzle: &Puzzle, lattice: &Lattice) -> Result<bool> {
        is_solved(&self.tracer_for(lattice), lattice, &puzzle.rays, &puzzle.targets)
    }
}

/// Seed from OS entropy, falling back to a process-wide counter
pub fn entropy_seed() -> u64 {
    let mut seed_bytes = [0u8; 8];
    if getrandom::getrandom(&mut seed_bytes).is_err() {
        static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
        let counter = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        seed_bytes = counter.to_le_bytes();
    }
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockKind, LazorError, Point};

    const SINGLE_MIRROR: &str = "\
GRID START
o o o
o o o
o o o
GRID STOP
A 1
L 1 6 1 -1
P 4 5
";

    const CORNER: &str = "\
GRID START
o o o
o o o
o o o
GRID STOP
A 2
L 1 6 1 -1
P 0 5
";

    const PRISM: &str = "\
GRID START
o o o
o o o
o o o
GRID STOP
C 1
L 1 6 1 -1
P 6 1
P 4 5
";

    const BLOCKED: &str = "\
GRID START
x x x
x o x
x x x
GRID STOP
B 1
L 2 5 1 -1
P 5 2
";

    const TRAP: &str = "\
GRID START
o A
GRID STOP
A 1
L 2 1 1 1
P 0 0
";

    #[test]
    fn test_solve_single_mirror() {
        let puzzle: Puzzle = SINGLE_MIRROR.parse().unwrap();
        let solver = Solver::with_config(SolverConfig::heuristic().with_seed(11));
        let solution = solver.solve(&puzzle).unwrap().into_solution().unwrap();

        assert_eq!(solution.strategy, Strategy::Heuristic);
        assert_eq!(solution.seed, Some(11));
        assert_eq!(
            solution.placements,
            vec![Placement {
                position: Point::new(3, 3),
                kind: BlockKind::Reflect
            }]
        );
        assert!(solver.verify(&puzzle, &solution.lattice).unwrap());
    }

    #[test]
    fn test_solve_corner_needs_two_mirrors() {
        let puzzle: Puzzle = CORNER.parse().unwrap();
        for config in [SolverConfig::heuristic(), SolverConfig::exhaustive()] {
            let solver = Solver::with_config(config.with_seed(3));
            let solution = solver.solve(&puzzle).unwrap().into_solution().unwrap();
            assert_eq!(solution.placements.len(), 2);
            assert!(solution
                .placements
                .iter()
                .all(|p| p.kind == BlockKind::Reflect));
            assert!(solver.verify(&puzzle, &solution.lattice).unwrap());
            assert!(!solver.verify(&puzzle, &puzzle.lattice).unwrap());
        }
    }

    #[test]
    fn test_solve_prism_uses_refraction() {
        let puzzle: Puzzle = PRISM.parse().unwrap();
        let solver = Solver::with_config(SolverConfig::auto().with_seed(5));
        let solution = solver.solve(&puzzle).unwrap().into_solution().unwrap();
        assert_eq!(solution.strategy, Strategy::Heuristic);
        assert_eq!(
            solution.lattice.placed_blocks(),
            vec![(Point::new(3, 3), BlockKind::Refract)]
        );
    }

    #[test]
    fn test_auto_falls_back_then_reports_no_solution() {
        let puzzle: Puzzle = BLOCKED.parse().unwrap();
        let solver = Solver::with_config(SolverConfig::auto().with_seed(1));
        let outcome = solver.solve(&puzzle).unwrap();

        assert!(matches!(outcome, Outcome::NoSolution { .. }));
        // One placement and one evaluation per strategy.
        assert_eq!(outcome.stats().placements, 2);
        assert_eq!(outcome.stats().evaluations, 2);
    }

    #[test]
    fn test_budget_reported_separately() {
        let puzzle: Puzzle = CORNER.parse().unwrap();
        let config = SolverConfig::exhaustive().with_seed(8).with_max_iterations(1);
        let outcome = Solver::with_config(config).solve(&puzzle).unwrap();
        assert!(matches!(outcome, Outcome::OutOfBudget { .. }));
        assert!(outcome.solution().is_none());
    }

    #[test]
    fn test_same_seed_same_solution() {
        let puzzle: Puzzle = CORNER.parse().unwrap();
        let solver = Solver::with_config(SolverConfig::exhaustive().with_seed(99));
        let first = solver.solve(&puzzle).unwrap().into_solution().unwrap();
        let second = solver.solve(&puzzle).unwrap().into_solution().unwrap();
        assert_eq!(first.placements, second.placements);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_trace_uses_puzzle_lattice() {
        let puzzle: Puzzle = SINGLE_MIRROR.parse().unwrap();
        let traces = Solver::new().trace(&puzzle).unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].path.last(), Some(&Point::new(6, 1)));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config: SolverConfig =
            serde_json::from_str(r#"{"strategy":"exhaustive","seed":7}"#).unwrap();
        assert_eq!(config, SolverConfig::exhaustive().with_seed(7));
        assert_eq!(config.max_iterations, None);
    }

    #[test]
    fn test_trace_overrun_does_not_abort_solve() {
        let puzzle: Puzzle = TRAP.parse().unwrap();
        for config in [SolverConfig::heuristic(), SolverConfig::exhaustive()] {
            let outcome = Solver::with_config(config.with_seed(6)).solve(&puzzle).unwrap();
            assert!(matches!(outcome, Outcome::NoSolution { .. }));
            assert_eq!(outcome.stats().trace_overruns, 1);
            assert_eq!(outcome.stats().backtracks, 1);
        }

        let outcome = Solver::with_config(SolverConfig::auto().with_seed(6))
            .solve(&puzzle)
            .unwrap();
        assert_eq!(outcome.stats().trace_overruns, 2);
    }

    #[test]
    fn test_trace_step_limit_is_honored() {
        let puzzle: Puzzle = SINGLE_MIRROR.parse().unwrap();
        let config = SolverConfig {
            trace_step_limit: Some(3),
            ..SolverConfig::heuristic().with_seed(2)
        };
        let solver = Solver::with_config(config);
        assert_eq!(solver.tracer_for(&puzzle.lattice).step_limit(), 3);
        assert!(matches!(
            solver.trace(&puzzle),
            Err(LazorError::TraceOverrun { limit: 3 })
        ));

        // Every heuristic trace overruns, so the search ends at depth 0.
        let outcome = solver.solve(&puzzle).unwrap();
        assert!(matches!(outcome, Outcome::NoSolution { .. }));
        assert_eq!(outcome.stats().trace_overruns, 1);
        assert_eq!(outcome.stats().placements, 0);

        let default_limit = Solver::new().tracer_for(&puzzle.lattice).step_limit();
        assert_eq!(default_limit, crate::DEFAULT_STEPS_PER_CELL * 7 * 7);
    }

    #[test]
    fn test_solution_json_round_trip_and_validation() {
        let puzzle: Puzzle = CORNER.parse().unwrap();
        let solver = Solver::with_config(SolverConfig::exhaustive().with_seed(10));
        let solution = solver.solve(&puzzle).unwrap().into_solution().unwrap();

        let json = serde_json::to_string(&solution).unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lattice, solution.lattice);
        assert!(solver.verify(&puzzle, &back.lattice).unwrap());

        let broken = json.replacen("\"width\":7", "\"width\":9", 1);
        assert!(serde_json::from_str::<Solution>(&broken).is_err());
    }
}

//! Depth-indexed backtracking placement search.
//!
//! The search is an explicit state machine. Depth is the length of the
//! placement record. Below full depth the search draws a candidate and
//! places it; at full depth it evaluates the goal and either stops or
//! backtracks. Attempt memory exists only for depths `0..total`, and the
//! evaluate state never reads it.

use super::candidates::{dedup_in_order, AttemptSet, CandidatePool};
use super::goal;
use super::types::{Placement, SearchStats, Strategy};
use crate::error::{LazorError, Result};
use crate::tracer::Tracer;
use crate::{Inventory, Lattice, Point, Puzzle, Ray};
use rand::Rng;

/// Where the search stands between two iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Depth below the total: place another block
    Searching,
    /// Depth equals the total: check the goal
    Evaluate,
    /// Undo the most recent placement
    Backtrack,
    /// Nothing left to try at depth 0
    Exhausted,
    Solved,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchState::Exhausted | SearchState::Solved)
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEnd {
    Solved,
    Exhausted,
    OutOfBudget,
}

/// One search run over a private copy of the puzzle's lattice and inventory.
pub struct Search<'p> {
    strategy: Strategy,
    tracer: Tracer,
    rays: &'p [Ray],
    targets: &'p [Point],
    lattice: Lattice,
    inventory: Inventory,
    total: usize,
    record: Vec<Placement>,
    attempts: Vec<AttemptSet>,
    stats: SearchStats,
}

impl<'p> Search<'p> {
    pub fn new(strategy: Strategy, puzzle: &'p Puzzle, tracer: Tracer) -> Self {
        let total = puzzle.inventory.total();
        Self {
            strategy,
            tracer,
            rays: &puzzle.rays,
            targets: &puzzle.targets,
            lattice: puzzle.lattice.clone(),
            inventory: puzzle.inventory,
            total,
            record: Vec::with_capacity(total),
            attempts: vec![AttemptSet::default(); total],
            stats: SearchStats::default(),
        }
    }

    /// Current depth: number of committed placements
    pub fn depth(&self) -> usize {
        self.record.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn record(&self) -> &[Placement] {
        &self.record
    }

    /// Attempt memory for `depth`; `None` at or past full depth
    pub fn attempts(&self, depth: usize) -> Option<&AttemptSet> {
        self.attempts.get(depth)
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// State to enter at the current depth
    pub fn initial_state(&self) -> SearchState {
        self.advance_state()
    }

    /// Drive the state machine until it stops or the budget runs out.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        max_iterations: Option<usize>,
    ) -> Result<SearchEnd> {
        let mut state = self.initial_state();
        loop {
            match state {
                SearchState::Solved => return Ok(SearchEnd::Solved),
                SearchState::Exhausted => return Ok(SearchEnd::Exhausted),
                _ => {}
            }
            if max_iterations.is_some_and(|max| self.stats.iterations >= max) {
                log::warn!(
                    "{} search stopped after {} iterations at depth {}",
                    self.strategy,
                    self.stats.iterations,
                    self.depth()
                );
                return Ok(SearchEnd::OutOfBudget);
            }
            state = self.step(state, rng)?;
        }
    }

    /// Perform one transition.
    pub fn step<R: Rng + ?Sized>(&mut self, state: SearchState, rng: &mut R) -> Result<SearchState> {
        if state.is_terminal() {
            return Ok(state);
        }
        self.stats.iterations += 1;
        match state {
            SearchState::Searching => self.place_next(rng),
            SearchState::Evaluate => self.evaluate(),
            SearchState::Backtrack => self.backtrack(),
            terminal => Ok(terminal),
        }
    }

    /// Consume the search, handing back the lattice and placement record
    pub fn into_parts(self) -> (Lattice, Vec<Placement>) {
        (self.lattice, self.record)
    }

    fn advance_state(&self) -> SearchState {
        if self.depth() == self.total {
            SearchState::Evaluate
        } else {
            SearchState::Searching
        }
    }

    fn dead_end(&self) -> SearchState {
        if self.depth() > 0 {
            SearchState::Backtrack
        } else {
            SearchState::Exhausted
        }
    }

    fn place_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SearchState> {
        let depth = self.depth();
        if depth >= self.total {
            return self.evaluate();
        }

        let crossed = match self.strategy {
            Strategy::Heuristic => match self.crossed_open() {
                Ok(crossed) => crossed,
                Err(LazorError::TraceOverrun { .. }) => {
                    self.stats.trace_overruns += 1;
                    return Ok(self.dead_end());
                }
                Err(e) => return Err(e),
            },
            Strategy::Exhaustive => Vec::new(),
        };

        let pool = CandidatePool::build(
            self.strategy,
            &self.lattice,
            &self.inventory,
            &crossed,
            &self.attempts[depth],
        );
        let Some((kind, position)) = pool.choose(rng) else {
            return Ok(self.dead_end());
        };

        self.inventory.take(kind)?;
        self.lattice.place(kind, position)?;
        self.attempts[depth].insert(kind, position);
        self.record.push(Placement { position, kind });
        self.stats.placements += 1;
        log::debug!("depth {}: placed {} at {}", depth, kind, position);

        Ok(self.advance_state())
    }

    fn evaluate(&mut self) -> Result<SearchState> {
        self.stats.evaluations += 1;
        let solved = match goal::is_solved(&self.tracer, &self.lattice, self.rays, self.targets) {
            Ok(solved) => solved,
            Err(LazorError::TraceOverrun { .. }) => {
                self.stats.trace_overruns += 1;
                false
            }
            Err(e) => return Err(e),
        };

        if solved {
            log::info!(
                "{} search solved with {} placements after {} iterations",
                self.strategy,
                self.total,
                self.stats.iterations
            );
            Ok(SearchState::Solved)
        } else {
            Ok(self.dead_end())
        }
    }

    fn backtrack(&mut self) -> Result<SearchState> {
        let vacated = self.depth();
        let Some(last) = self.record.pop() else {
            return Ok(SearchState::Exhausted);
        };
        self.lattice.revert(last.position)?;
        self.inventory.restore(last.kind);
        if vacated < self.total {
            self.attempts[vacated].clear();
        }
        self.stats.backtracks += 1;
        log::debug!(
            "depth {}: removed {} at {}",
            vacated - 1,
            last.kind,
            last.position
        );
        Ok(SearchState::Searching)
    }

    /// Open slots grazed by any ray on the current lattice, first-seen order
    fn crossed_open(&self) -> Result<Vec<Point>> {
        let mut crossed = Vec::new();
        for ray in self.rays {
            crossed.extend(self.tracer.trace(&self.lattice, ray)?.crossed_open);
        }
        Ok(dedup_in_order(crossed))
    }
}

//! Lazor puzzle engine
//!
//! Traces diagonal lasers through a doubled-coordinate lattice of reflect,
//! opaque and refract blocks, and searches for block placements that make the
//! lasers pass through every target point.

mod error;
mod inventory;
mod lattice;
mod puzzle;
mod ray;
mod tracer;

pub mod solver;

pub use error::{LazorError, Result};
pub use inventory::Inventory;
pub use lattice::{BlockKind, Cell, Lattice, Point};
pub use puzzle::Puzzle;
pub use ray::{Direction, Ray};
pub use solver::{
    Outcome, Placement, SearchStats, Solution, Solver, SolverConfig, Strategy, StrategyChoice,
};
pub use tracer::{Trace, Tracer, DEFAULT_STEPS_PER_CELL};

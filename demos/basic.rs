//! Basic example of using the lazor engine

use lazor_core::{Outcome, Puzzle, Solver, SolverConfig};

const PUZZLE: &str = "\
# Two mirrors bend the laser back to the left edge.
GRID START
o o o
o o o
o o o
GRID STOP
A 2
L 1 6 1 -1
P 0 5
";

fn main() {
    let puzzle: Puzzle = match PUZZLE.parse() {
        Ok(puzzle) => puzzle,
        Err(e) => {
            eprintln!("Failed to parse puzzle: {}", e);
            return;
        }
    };

    println!("Puzzle grid:");
    println!("{}", puzzle.lattice);
    println!("Blocks to place: {:?}", puzzle.inventory);

    // Trace the lasers before anything is placed
    let solver = Solver::with_config(SolverConfig::auto().with_seed(2024));
    if let Ok(traces) = solver.trace(&puzzle) {
        for (ray, trace) in puzzle.rays.iter().zip(&traces) {
            println!("Ray {} visits {} points", ray, trace.path.len());
        }
    }

    println!("\nSolving...\n");
    match solver.solve(&puzzle) {
        Ok(Outcome::Solved(solution)) => {
            println!("Solved with the {} strategy:", solution.strategy);
            println!("{}", solution.lattice);
            for placement in &solution.placements {
                let (col, row) = placement.position.author_coords();
                println!("  {} at column {}, row {}", placement.kind, col, row);
            }
            println!("Stats: {:?}", solution.stats);
        }
        Ok(Outcome::NoSolution { stats }) => println!("No solution ({:?})", stats),
        Ok(Outcome::OutOfBudget { stats }) => println!("Gave up ({:?})", stats),
        Err(e) => eprintln!("Search failed: {}", e),
    }
}

//! Ray tracing through the lattice.
//!
//! A ray moves one diagonal step at a time. Before each step the slot it
//! grazes (if any) is inspected: reflect blocks flip one axis of the
//! direction, opaque blocks absorb the ray, refract blocks spawn a
//! transmitted branch and then reflect. Deflections are resolved in place
//! before the ray advances, so several flips can happen at one point.
//!
//! Branches are kept on an explicit stack instead of recursing. A refract
//! encounter suspends the reflected continuation, traces the transmitted
//! branch to completion, then resumes, which yields the same path order as
//! depth-first recursion.

use crate::error::{LazorError, Result};
use crate::{BlockKind, Cell, Direction, Lattice, Point, Ray};
use serde::Serialize;
use std::collections::HashSet;

/// Steps allowed per lattice cell when no explicit ceiling is configured
pub const DEFAULT_STEPS_PER_CELL: usize = 16;

/// Result of tracing one ray, including every refraction branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trace {
    /// Open slots grazed by the ray, in encounter order (may repeat)
    pub crossed_open: Vec<Point>,
    /// Lattice points visited, starting with the origin
    pub path: Vec<Point>,
}

impl Trace {
    pub fn visited(&self) -> HashSet<Point> {
        self.path.iter().copied().collect()
    }
}

/// Which boundary a step crosses next to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Crossing {
    /// Slot lies left/right of the step: reflection flips dx
    Vertical,
    /// Slot lies above/below the step: reflection flips dy
    Horizontal,
}

impl Crossing {
    fn reflect(self, direction: Direction) -> Direction {
        match self {
            Crossing::Vertical => direction.flip_x(),
            Crossing::Horizontal => direction.flip_y(),
        }
    }
}

fn is_odd(v: i32) -> bool {
    v % 2 != 0
}

/// The slot grazed when stepping from `current` to `next`, if any
fn adjacent_slot(current: Point, next: Point) -> Option<(Point, Crossing)> {
    if is_odd(next.x) && is_odd(current.y) {
        Some((Point::new(next.x, current.y), Crossing::Vertical))
    } else if is_odd(current.x) && is_odd(next.y) {
        Some((Point::new(current.x, next.y), Crossing::Horizontal))
    } else {
        None
    }
}

/// A branch waiting to be traced: where it stands, where it heads, and
/// whether its position still has to be recorded in the path.
struct Branch {
    current: Point,
    direction: Direction,
    record_origin: bool,
}

/// Traces rays against a lattice with a bounded step budget.
#[derive(Debug, Clone, Copy)]
pub struct Tracer {
    step_limit: usize,
}

impl Tracer {
    pub fn new(step_limit: usize) -> Self {
        Self { step_limit }
    }

    /// Tracer with a ceiling proportional to the lattice size
    pub fn for_lattice(lattice: &Lattice) -> Self {
        Self::new(DEFAULT_STEPS_PER_CELL * lattice.width() * lattice.height())
    }

    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    /// Compute the crossed open slots and full path of `ray`.
    ///
    /// Fails with [`LazorError::TraceOverrun`] when the combined work of all
    /// branches exceeds the step ceiling, which only happens when blocks trap
    /// the ray in a cycle.
    pub fn trace(&self, lattice: &Lattice, ray: &Ray) -> Result<Trace> {
        let mut pending = vec![Branch {
            current: ray.origin,
            direction: ray.direction,
            record_origin: true,
        }];
        let mut trace = Trace::default();
        let mut steps = 0usize;

        while let Some(branch) = pending.pop() {
            if branch.record_origin {
                trace.path.push(branch.current);
            }
            self.run_branch(lattice, branch, &mut trace, &mut pending, &mut steps)?;
        }

        Ok(trace)
    }

    /// Walk one branch until it exits, is absorbed, or splits.
    ///
    /// On a split the reflected continuation and the transmitted branch are
    /// pushed onto `pending` (transmitted on top, so it runs first).
    fn run_branch(
        &self,
        lattice: &Lattice,
        branch: Branch,
        trace: &mut Trace,
        pending: &mut Vec<Branch>,
        steps: &mut usize,
    ) -> Result<()> {
        let mut current = branch.current;
        let mut direction = branch.direction;

        loop {
            *steps += 1;
            if *steps > self.step_limit {
                log::debug!("trace overrun after {} steps at {}", self.step_limit, current);
                return Err(LazorError::TraceOverrun {
                    limit: self.step_limit,
                });
            }

            let next = current.step(direction);
            if !lattice.contains(next) {
                return Ok(());
            }

            if let Some((slot, crossing)) = adjacent_slot(current, next) {
                let cell = lattice.get(slot).unwrap_or_default();
                match cell.block() {
                    Some(BlockKind::Reflect) => {
                        direction = crossing.reflect(direction);
                        continue;
                    }
                    Some(BlockKind::Opaque) => return Ok(()),
                    Some(BlockKind::Refract) => {
                        pending.push(Branch {
                            current,
                            direction: crossing.reflect(direction),
                            record_origin: false,
                        });
                        pending.push(Branch {
                            current: next,
                            direction,
                            record_origin: true,
                        });
                        return Ok(());
                    }
                    None => {
                        if cell == Cell::Open {
                            trace.crossed_open.push(slot);
                        }
                    }
                }
            }

            current = next;
            trace.path.push(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(x: i32, y: i32, dx: i32, dy: i32) -> Ray {
        Ray::new(Point::new(x, y), Direction::new(dx, dy).unwrap())
    }

    fn points(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn trace(rows: &[&str], ray: Ray) -> Result<Trace> {
        let lattice = Lattice::from_rows_str(rows);
        Tracer::for_lattice(&lattice).trace(&lattice, &ray)
    }

    #[test]
    fn test_straight_path_records_crossed_open_slots() {
        let result = trace(&["o o o", "o o o", "o o o"], ray(1, 6, 1, -1)).unwrap();
        assert_eq!(
            result.path,
            points(&[(1, 6), (2, 5), (3, 4), (4, 3), (5, 2), (6, 1)])
        );
        assert_eq!(
            result.crossed_open,
            points(&[(1, 5), (3, 5), (3, 3), (5, 3), (5, 1)])
        );
    }

    #[test]
    fn test_blocked_slots_do_not_interact() {
        let result = trace(&["x x x", "x x x", "x x x"], ray(2, 5, 1, -1)).unwrap();
        assert_eq!(result.path, points(&[(2, 5), (3, 4), (4, 3), (5, 2), (6, 1)]));
        assert!(result.crossed_open.is_empty());
    }

    #[test]
    fn test_reflect_flips_crossing_axis() {
        let result = trace(&["x x x", "x A x", "x x x"], ray(2, 5, 1, -1)).unwrap();
        assert_eq!(result.path, points(&[(2, 5), (3, 4), (4, 5), (5, 6)]));
    }

    #[test]
    fn test_opaque_absorbs() {
        let result = trace(&["x x x", "x B x", "x x x"], ray(2, 5, 1, -1)).unwrap();
        assert_eq!(result.path, points(&[(2, 5), (3, 4)]));
    }

    #[test]
    fn test_refract_transmits_then_reflects() {
        let result = trace(&["x x x", "x C x", "x x x"], ray(2, 5, 1, -1)).unwrap();
        assert_eq!(
            result.path,
            points(&[(2, 5), (3, 4), (4, 3), (5, 2), (6, 1), (4, 5), (5, 6)])
        );

        // The transmitted branch is an ordinary trace from just past the block.
        let transmitted = trace(&["x x x", "x C x", "x x x"], ray(4, 3, 1, -1)).unwrap();
        assert_eq!(&result.path[2..5], transmitted.path.as_slice());
    }

    #[test]
    fn test_two_reflections_flip_both_axes() {
        // Vertical bounce off (5, 3), then horizontal bounce off (3, 1).
        let result = trace(&["o A o", "o o A", "o o o"], ray(1, 6, 1, -1)).unwrap();
        assert_eq!(
            result.path,
            points(&[(1, 6), (2, 5), (3, 4), (4, 3), (3, 2), (2, 3), (1, 4), (0, 5)])
        );
        assert_eq!(
            result.crossed_open,
            points(&[(1, 5), (3, 5), (3, 3), (3, 3), (1, 3), (1, 5)])
        );
    }

    #[test]
    fn test_trapped_ray_overruns() {
        let lattice = Lattice::from_rows_str(&["x x x", "x A x", "x A x"]);
        let err = Tracer::new(100)
            .trace(&lattice, &ray(3, 4, 1, -1))
            .unwrap_err();
        assert!(matches!(err, LazorError::TraceOverrun { limit: 100 }));
    }

    #[test]
    fn test_refract_pair_is_bounded() {
        let lattice = Lattice::from_rows_str(&["x x x", "x C x", "x C x"]);
        let tracer = Tracer::for_lattice(&lattice);
        assert!(matches!(
            tracer.trace(&lattice, &ray(3, 4, 1, -1)),
            Err(LazorError::TraceOverrun { .. })
        ));
    }

    #[test]
    fn test_trace_is_deterministic() {
        let lattice = Lattice::from_rows_str(&["o C o", "A o B", "o o C"]);
        let tracer = Tracer::for_lattice(&lattice);
        let r = ray(1, 6, 1, -1);
        let first = tracer.trace(&lattice, &r).unwrap();
        let second = tracer.trace(&lattice, &r).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.path[0], r.origin);
    }

    #[test]
    fn test_ray_leaving_immediately() {
        let result = trace(&["o"], ray(0, 1, -1, 1)).unwrap();
        assert_eq!(result.path, points(&[(0, 1)]));
        assert!(result.crossed_open.is_empty());
    }
}

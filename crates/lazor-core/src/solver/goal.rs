//! Goal evaluation: do the rays jointly pass through every target?

use crate::error::Result;
use crate::tracer::Tracer;
use crate::{Lattice, Point, Ray};

/// Targets not on the path of `ray`, in their original order.
pub fn unhit_targets(
    tracer: &Tracer,
    lattice: &Lattice,
    ray: &Ray,
    targets: &[Point],
) -> Result<Vec<Point>> {
    let visited = tracer.trace(lattice, ray)?.visited();
    Ok(targets
        .iter()
        .filter(|t| !visited.contains(t))
        .copied()
        .collect())
}

/// Narrow the target list ray by ray; solved when nothing is left.
pub fn is_solved(tracer: &Tracer, lattice: &Lattice, rays: &[Ray], targets: &[Point]) -> Result<bool> {
    let mut remaining = targets.to_vec();
    for ray in rays {
        if remaining.is_empty() {
            break;
        }
        remaining = unhit_targets(tracer, lattice, ray, &remaining)?;
    }
    Ok(remaining.is_empty())
}

use crate::error::LazorError;
use crate::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagonal unit direction. Both components are always -1 or +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDirection")]
pub struct Direction {
    dx: i32,
    dy: i32,
}

#[derive(Deserialize)]
struct RawDirection {
    dx: i32,
    dy: i32,
}

impl TryFrom<RawDirection> for Direction {
    type Error = LazorError;

    fn try_from(raw: RawDirection) -> Result<Self, LazorError> {
        Direction::new(raw.dx, raw.dy).ok_or(LazorError::InvalidDirection {
            dx: raw.dx,
            dy: raw.dy,
        })
    }
}

impl Direction {
    /// Returns `None` unless both components are -1 or +1.
    pub fn new(dx: i32, dy: i32) -> Option<Self> {
        if dx.abs() == 1 && dy.abs() == 1 {
            Some(Self { dx, dy })
        } else {
            None
        }
    }

    pub fn dx(&self) -> i32 {
        self.dx
    }

    pub fn dy(&self) -> i32 {
        self.dy
    }

    pub fn flip_x(self) -> Self {
        Self {
            dx: -self.dx,
            dy: self.dy,
        }
    }

    pub fn flip_y(self) -> Self {
        Self {
            dx: self.dx,
            dy: -self.dy,
        }
    }
}

impl Point {
    /// The point one step along `direction`
    pub fn step(&self, direction: Direction) -> Point {
        Point::new(self.x + direction.dx, self.y + direction.dy)
    }
}

/// A laser: origin plus direction. Tracing never mutates a ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point,
    pub direction: Direction,
}

impl Ray {
    pub fn new(origin: Point, direction: Direction) -> Self {
        Self { origin, direction }
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> ({:+}, {:+})",
            self.origin, self.direction.dx, self.direction.dy
        )
    }
}

//! Candidate generation for the placement search.
//!
//! A pool is a multiset of block kinds: each kind carries a weight that sets
//! how likely it is to be drawn, plus the positions it may go to. The two
//! policies weight kinds differently:
//!
//! - heuristic: reflect/refract weigh one per grazed open slot still untried,
//!   opaque weighs exactly one whenever any open slot is untried for it;
//! - exhaustive: every kind weighs one per untried open slot.
//!
//! Positions within a kind are drawn uniformly.

use super::types::Strategy;
use crate::{BlockKind, Inventory, Lattice, Point};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Positions already tried per kind at one search depth
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptSet {
    tried: [BTreeSet<Point>; 3],
}

impl AttemptSet {
    pub fn contains(&self, kind: BlockKind, position: Point) -> bool {
        self.tried[kind.index()].contains(&position)
    }

    pub fn insert(&mut self, kind: BlockKind, position: Point) {
        self.tried[kind.index()].insert(position);
    }

    pub fn clear(&mut self) {
        self.tried.iter_mut().for_each(BTreeSet::clear);
    }

    pub fn is_empty(&self) -> bool {
        self.tried.iter().all(BTreeSet::is_empty)
    }

    pub fn len(&self) -> usize {
        self.tried.iter().map(BTreeSet::len).sum()
    }
}

/// Drawable options for a single kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindCandidates {
    pub kind: BlockKind,
    pub weight: usize,
    pub positions: Vec<Point>,
}

/// Weighted multiset of (kind, positions) options for one search step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePool {
    entries: Vec<KindCandidates>,
}

impl CandidatePool {
    /// Build the pool for `strategy`.
    ///
    /// `crossed` lists the open slots grazed by the current rays without
    /// duplicates; only the heuristic policy reads it.
    pub fn build(
        strategy: Strategy,
        lattice: &Lattice,
        inventory: &Inventory,
        crossed: &[Point],
        attempts: &AttemptSet,
    ) -> Self {
        let available = lattice.available_positions();
        let untried = |kind: BlockKind, from: &[Point]| -> Vec<Point> {
            from.iter()
                .copied()
                .filter(|&p| !attempts.contains(kind, p))
                .collect()
        };

        let mut entries = Vec::new();
        for kind in BlockKind::ALL {
            if !inventory.has(kind) {
                continue;
            }
            let (positions, weight) = match (strategy, kind) {
                (Strategy::Heuristic, BlockKind::Opaque) => {
                    let positions = untried(kind, &available);
                    let weight = usize::from(!positions.is_empty());
                    (positions, weight)
                }
                (Strategy::Heuristic, _) => {
                    let positions = untried(kind, crossed);
                    let weight = positions.len();
                    (positions, weight)
                }
                (Strategy::Exhaustive, _) => {
                    let positions = untried(kind, &available);
                    let weight = positions.len();
                    (positions, weight)
                }
            };
            if weight > 0 {
                entries.push(KindCandidates {
                    kind,
                    weight,
                    positions,
                });
            }
        }

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KindCandidates] {
        &self.entries
    }

    /// Weight of `kind` in the pool (0 when absent)
    pub fn weight(&self, kind: BlockKind) -> usize {
        self.entry(kind).map_or(0, |e| e.weight)
    }

    pub fn positions(&self, kind: BlockKind) -> &[Point] {
        self.entry(kind).map(|e| e.positions.as_slice()).unwrap_or(&[])
    }

    pub fn total_weight(&self) -> usize {
        self.entries.iter().map(|e| e.weight).sum()
    }

    fn entry(&self, kind: BlockKind) -> Option<&KindCandidates> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Draw a kind by weight, then a position for it uniformly.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(BlockKind, Point)> {
        let index = WeightedIndex::new(self.entries.iter().map(|e| e.weight)).ok()?;
        let entry = &self.entries[index.sample(rng)];
        let position = *entry.positions.choose(rng)?;
        Some((entry.kind, position))
    }
}

/// Drop repeats while keeping first-seen order
pub(crate) fn dedup_in_order(points: impl IntoIterator<Item = Point>) -> Vec<Point> {
    let mut seen = BTreeSet::new();
    points.into_iter().filter(|p| seen.insert(*p)).collect()
}

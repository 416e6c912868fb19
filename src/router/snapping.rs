// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use crate::distance::{direction_cosine, Projection};
use crate::world::{WorldGraph, WorldGraphMode};
use crate::{LatLon, Segment};

use super::Options;

/// A segment chosen for a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestSegment {
    pub segment: Segment,

    /// True if the segment was preferred for following the provided direction.
    pub codirectional: bool,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    segment: Segment,
    codirectional: bool,
    squared_distance: f64,
}

/// Orders snapping candidates: segments following the direction of movement first,
/// then by distance from the checkpoint.
#[derive(Debug, Clone, Copy)]
pub struct BestEdgeComparator {
    direction: Option<(f64, f64)>,
    min_cos: f64,
}

impl BestEdgeComparator {
    /// `direction` is a vector (east, north) of the movement at the checkpoint.
    pub fn new(direction: Option<(f64, f64)>, min_cos: f64) -> Self {
        let direction = direction.filter(|&(x, y)| x != 0.0 || y != 0.0);
        Self { direction, min_cos }
    }

    pub fn is_codirectional(&self, back: LatLon, front: LatLon) -> bool {
        self.direction
            .is_some_and(|d| direction_cosine(back, front, d) >= self.min_cos)
    }

    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        b.codirectional
            .cmp(&a.codirectional)
            .then(a.squared_distance.total_cmp(&b.squared_distance))
    }
}

/// Returns true if fewer than `limit` distinct segments can be reached from `s`
/// (or can reach `s`, if `is_outgoing` is false).
pub fn is_dead_end(world: &mut WorldGraph, s: Segment, is_outgoing: bool, limit: usize) -> bool {
    let mut visited: HashSet<Segment> = HashSet::from([s]);
    let mut queue: VecDeque<Segment> = VecDeque::from([s]);
    let mut edges = Vec::new();

    while let Some(v) = queue.pop_front() {
        edges.clear();
        world.edges(v, is_outgoing, &mut edges);
        for &(t, _) in &edges {
            if visited.insert(t) {
                if visited.len() >= limit {
                    return false;
                }
                queue.push_back(t);
            }
        }
    }

    return true;
}

/// Finds the segment a checkpoint should be connected with.
///
/// `is_outgoing` is true for checkpoints the route leaves (start and intermediate ones).
/// The direction of movement is only considered for such checkpoints.
pub fn find_best_segment(
    world: &mut WorldGraph,
    point: LatLon,
    direction: Option<(f64, f64)>,
    is_outgoing: bool,
    options: &Options,
) -> Option<BestSegment> {
    let id = world.store().partition_at(point)?;
    let candidates: Vec<(Segment, Projection)> = world.find_closest_edges(id, point, options.max_candidates);
    if candidates.is_empty() {
        log::debug!("no roads near {point:?}");
        return None;
    }

    let comparator = BestEdgeComparator::new(
        if is_outgoing { direction } else { None },
        options.codirectional_cos,
    );

    let previous_mode = world.mode();
    world.set_mode(WorldGraphMode::NoLeaps);

    let mut best: Option<Candidate> = None;
    for (segment, proj) in candidates {
        if is_dead_end(world, segment, is_outgoing, options.dead_end_limit) {
            continue;
        }

        let codirectional = match (world.point(segment, false), world.point(segment, true)) {
            (Some(back), Some(front)) => comparator.is_codirectional(back, front),
            _ => false,
        };
        let candidate = Candidate {
            segment,
            codirectional,
            squared_distance: proj.squared_distance,
        };

        if best.is_none_or(|b| comparator.compare(&candidate, &b) == Ordering::Less) {
            best = Some(candidate);
        }
    }

    world.set_mode(previous_mode);

    let best = best?;
    return Some(BestSegment {
        segment: best.segment,
        codirectional: best.codirectional,
    });
}

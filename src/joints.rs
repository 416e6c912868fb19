// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Contraction of road runs without branching into single search vertices.

use std::collections::{HashMap, HashSet};

use crate::astar::Graph;
use crate::starter::RouteStarter;
use crate::{PartitionId, RouteWeight, Segment};

/// A contiguous run of segments of one road in one direction, from `first` to `last`.
/// Fake segments always form single-segment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointSegment {
    pub first: Segment,
    pub last: Segment,
}

impl JointSegment {
    pub const fn single(s: Segment) -> Self {
        Self { first: s, last: s }
    }

    pub fn is_fake(&self) -> bool {
        self.first.is_fake()
    }
}

impl std::fmt::Display for JointSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "[{}]", self.first)
        } else {
            write!(f, "[{} .. {}]", self.first, self.last)
        }
    }
}

/// The segment adjacent to `s` on the same road, in the direction of `s` (`ahead`) or behind it.
fn neighbour_on_road(s: Segment, ahead: bool) -> Option<Segment> {
    let up = s.forward == ahead;
    let segment = if up { s.segment.checked_add(1)? } else { s.segment.checked_sub(1)? };
    Some(Segment { segment, ..s })
}

/// Graph of [JointSegments](JointSegment) over a [RouteStarter].
///
/// Runs are cut at road points shared with other roads, road ends, partition borders,
/// endpoints of real segments with fake parts and endpoints of the search's own
/// start and finish segments.
pub struct JointGraph<'a> {
    starter: &'a mut RouteStarter,

    /// (partition, feature, road point)
    boundaries: HashSet<(PartitionId, u32, u32)>,

    /// Weight of traversing a run after its first segment.
    inner: HashMap<JointSegment, RouteWeight>,
    scratch: Vec<(Segment, RouteWeight)>,
}

impl<'a> JointGraph<'a> {
    /// Creates a joint view of `starter` for a search between `start` and `finish`.
    pub fn new(starter: &'a mut RouteStarter, start: Segment, finish: Segment) -> Self {
        let mut cut_at: Vec<Segment> = starter.fake_edges().reals_with_parts().collect();
        cut_at.push(start);
        cut_at.push(finish);

        let boundaries = cut_at
            .into_iter()
            .filter(|s| s.is_real())
            .flat_map(|s| {
                [
                    (s.partition, s.feature, s.point_id(false)),
                    (s.partition, s.feature, s.point_id(true)),
                ]
            })
            .collect();

        Self {
            starter,
            boundaries,
            inner: HashMap::default(),
            scratch: Vec::new(),
        }
    }

    pub fn starter(&mut self) -> &mut RouteStarter {
        self.starter
    }

    fn is_boundary(&mut self, s: Segment, front: bool) -> bool {
        s.is_fake()
            || self
                .boundaries
                .contains(&(s.partition, s.feature, s.point_id(front)))
            || self.starter.graph_mut().is_joint(s, front)
    }

    /// Weight of the edge between two consecutive segments of one road.
    fn step_weight(&mut self, from: Segment, to: Segment) -> Option<RouteWeight> {
        self.scratch.clear();
        let mut edges = std::mem::take(&mut self.scratch);
        self.starter.edges(from, true, &mut edges);
        let w = edges.iter().find(|e| e.0 == to).map(|e| e.1);
        self.scratch = edges;
        w
    }

    /// Extends a run starting at `s` forwards, returning its last segment
    /// and the weight accumulated after `s`.
    fn extend_forward(&mut self, s: Segment) -> (Segment, RouteWeight) {
        let mut cur = s;
        let mut acc = RouteWeight::ZERO;
        while !self.is_boundary(cur, true) {
            let Some(next) = neighbour_on_road(cur, true) else {
                break;
            };
            let Some(w) = self.step_weight(cur, next) else {
                break;
            };
            acc = acc + w;
            cur = next;
        }
        (cur, acc)
    }

    /// Extends a run ending at `s` backwards, returning its first segment.
    fn extend_backward(&mut self, s: Segment) -> Segment {
        let mut cur = s;
        while !self.is_boundary(cur, false) {
            let Some(prev) = neighbour_on_road(cur, false) else {
                break;
            };
            if self.step_weight(prev, cur).is_none() {
                break;
            }
            cur = prev;
        }
        cur
    }

    fn inner_weight(&mut self, j: JointSegment) -> RouteWeight {
        if j.first == j.last {
            return RouteWeight::ZERO;
        }
        if let Some(&w) = self.inner.get(&j) {
            return w;
        }

        let mut acc = RouteWeight::ZERO;
        let mut cur = j.first;
        while cur != j.last {
            let Some(next) = neighbour_on_road(cur, true) else {
                break;
            };
            let Some(w) = self.step_weight(cur, next) else {
                break;
            };
            acc = acc + w;
            cur = next;
        }
        self.inner.insert(j, acc);
        return acc;
    }

    pub fn edges(&mut self, j: JointSegment, is_outgoing: bool, out: &mut Vec<(JointSegment, RouteWeight)>) {
        let mut edges = Vec::new();

        if is_outgoing {
            self.starter.edges(j.last, true, &mut edges);
            for (t, w) in edges {
                if t.is_fake() {
                    out.push((JointSegment::single(t), w));
                    continue;
                }
                let (last, inner) = self.extend_forward(t);
                let target = JointSegment { first: t, last };
                self.inner.insert(target, inner);
                out.push((target, w + inner));
            }
        } else {
            let inner = self.inner_weight(j);
            self.starter.edges(j.first, false, &mut edges);
            for (t, w) in edges {
                if t.is_fake() {
                    out.push((JointSegment::single(t), w + inner));
                    continue;
                }
                let first = self.extend_backward(t);
                out.push((JointSegment { first, last: t }, w + inner));
            }
        }
    }

    pub fn heuristic(&mut self, from: JointSegment, to: JointSegment) -> f64 {
        self.starter.heuristic(from.last, to.last)
    }
}

impl Graph for JointGraph<'_> {
    type Vertex = JointSegment;
    type Weight = RouteWeight;

    fn edges(&mut self, v: JointSegment, is_outgoing: bool, out: &mut Vec<(JointSegment, RouteWeight)>) {
        JointGraph::edges(self, v, is_outgoing, out);
    }

    fn heuristic(&mut self, from: JointSegment, to: JointSegment) -> f64 {
        JointGraph::heuristic(self, from, to)
    }
}

/// Expands a run into its segments.
pub fn reconstruct_joint(j: JointSegment) -> Vec<Segment> {
    let mut segments = vec![j.first];
    let mut cur = j.first;
    while cur != j.last {
        match neighbour_on_road(cur, true) {
            Some(next) if next.feature == j.last.feature => {
                segments.push(next);
                cur = next;
            }
            _ => break,
        }
    }
    return segments;
}

/// Expands a path of runs into a path of segments, dropping a repeated segment
/// where consecutive runs share it.
pub fn process_joints(path: &[JointSegment]) -> Vec<Segment> {
    let mut result: Vec<Segment> = Vec::new();
    for &j in path {
        for s in reconstruct_joint(j) {
            if result.last() != Some(&s) {
                result.push(s);
            }
        }
    }
    return result;
}

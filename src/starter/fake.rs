// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};

use crate::distance::project_onto_segment;
use crate::world::WorldGraph;
use crate::{earth_distance, Junction, LatLon, RouteWeight, Segment};

/// What a fake vertex stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeKind {
    /// A synthetic connection between a query point and the road network.
    Pure,

    /// A part of a real segment, cut at the projection of a query point.
    PartOfReal(Segment),
}

/// Which query point a fake vertex belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeSide {
    Start,
    Finish,

    /// Connects the start with the finish projected onto the same segment.
    Between,
}

/// A synthetic segment from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeVertex {
    pub from: Junction,
    pub to: Junction,
    pub kind: FakeKind,
    pub side: FakeSide,
    pub weight: RouteWeight,

    /// Expected travel time, in seconds.
    pub eta: f64,
}

impl FakeVertex {
    /// The real segment this vertex is a part of.
    pub fn real(&self) -> Option<Segment> {
        match self.kind {
            FakeKind::Pure => None,
            FakeKind::PartOfReal(s) => Some(s),
        }
    }

    pub fn length(&self) -> f64 {
        earth_distance(self.from.point, self.to.point)
    }
}

/// Fake vertices with edges between them, owned by a route starter.
///
/// Fake ids are allocated from `offset` upwards, so that edges of several
/// starters (one per sub-route) can be [appended](FakeEdges::append) together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeEdges {
    offset: u32,
    next_id: u32,
    vertices: BTreeMap<Segment, FakeVertex>,
    outgoing: HashMap<Segment, Vec<Segment>>,
    ingoing: HashMap<Segment, Vec<Segment>>,

    /// real segment → fake parts of it
    parts: HashMap<Segment, Vec<Segment>>,
}

impl FakeEdges {
    pub fn new(offset: u32) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    /// Allocates a new fake segment for `v`.
    pub fn add_vertex(&mut self, v: FakeVertex) -> Segment {
        let s = Segment::fake(self.offset + self.next_id);
        self.next_id += 1;
        if let Some(real) = v.real() {
            self.parts.entry(real).or_default().push(s);
        }
        self.vertices.insert(s, v);
        return s;
    }

    pub fn add_edge(&mut self, from: Segment, to: Segment) {
        let out = self.outgoing.entry(from).or_default();
        if !out.contains(&to) {
            out.push(to);
            self.ingoing.entry(to).or_default().push(from);
        }
    }

    pub fn vertex(&self, s: Segment) -> Option<&FakeVertex> {
        self.vertices.get(&s)
    }

    pub fn contains(&self, s: Segment) -> bool {
        self.vertices.contains_key(&s)
    }

    pub fn outgoing(&self, s: Segment) -> &[Segment] {
        self.outgoing.get(&s).map(|v| v.as_slice()).unwrap_or_default()
    }

    pub fn ingoing(&self, s: Segment) -> &[Segment] {
        self.ingoing.get(&s).map(|v| v.as_slice()).unwrap_or_default()
    }

    /// Fake parts of a real segment, restricted to one side.
    pub fn parts(&self, real: Segment, side: FakeSide) -> impl Iterator<Item = (Segment, &FakeVertex)> {
        self.parts
            .get(&real)
            .into_iter()
            .flatten()
            .filter_map(|&s| self.vertices.get(&s).map(|v| (s, v)))
            .filter(move |(_, v)| v.side == side)
    }

    /// Real segments with at least one fake part.
    pub fn reals_with_parts(&self) -> impl Iterator<Item = Segment> + '_ {
        self.parts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// First fake id not used by these edges.
    pub fn next_offset(&self) -> u32 {
        self.offset + self.next_id
    }

    /// Merges fake vertices and edges of another starter, whose ids must not overlap.
    pub fn append(&mut self, other: &FakeEdges) {
        for (&s, &v) in &other.vertices {
            self.vertices.insert(s, v);
        }
        for (&from, targets) in &other.outgoing {
            for &to in targets {
                self.add_edge(from, to);
            }
        }
        for (&real, fakes) in &other.parts {
            let parts = self.parts.entry(real).or_default();
            for &s in fakes {
                if !parts.contains(&s) {
                    parts.push(s);
                }
            }
        }
        let end = other.next_offset().max(self.next_offset());
        self.next_id = end - self.offset;
    }
}

/// Projection of a query point onto one nearby real segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndingProjection {
    pub segment: Segment,

    /// The projected point, on the segment.
    pub junction: Junction,
    pub segment_back: Junction,
    pub segment_front: Junction,
    pub is_one_way: bool,
}

/// A query point together with its projections onto the road network.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeEnding {
    pub origin: Junction,
    pub projections: Vec<EndingProjection>,
}

impl FakeEnding {
    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}

/// Projects `point` onto each of `segments`. Segments whose geometry
/// is not available are skipped.
pub fn make_fake_ending(world: &mut WorldGraph, segments: &[Segment], point: LatLon) -> FakeEnding {
    let mut ending = FakeEnding {
        origin: Junction::flat(point),
        projections: Vec::with_capacity(segments.len()),
    };

    for &segment in segments {
        let (Some(back), Some(front)) = (world.junction(segment, false), world.junction(segment, true)) else {
            continue;
        };
        let proj = project_onto_segment(point, back.point, front.point);
        let altitude = back.altitude as f64 + (front.altitude as f64 - back.altitude as f64) * proj.t;
        let junction = Junction::new(proj.point, altitude.round() as i16);

        ending.origin.altitude = junction.altitude;
        ending.projections.push(EndingProjection {
            segment,
            junction,
            segment_back: back,
            segment_front: front,
            is_one_way: !world.is_bidirectional(segment),
        });
    }

    return ending;
}

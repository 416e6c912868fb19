// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Connecting arbitrary query points with the road network.

use crate::astar::Graph;
use crate::world::{WorldGraph, WorldGraphMode};
use crate::{earth_distance, Junction, LatLon, PartitionId, RouteWeight, Segment};

mod fake;

pub use fake::{make_fake_ending, EndingProjection, FakeEdges, FakeEnding, FakeKind, FakeSide, FakeVertex};

/// Read access to the geometry and weights of real and fake segments.
pub struct RouteView<'a> {
    world: &'a mut WorldGraph,
    fake: &'a FakeEdges,
}

impl<'a> RouteView<'a> {
    pub fn new(world: &'a mut WorldGraph, fake: &'a FakeEdges) -> Self {
        Self { world, fake }
    }

    pub fn world(&mut self) -> &mut WorldGraph {
        self.world
    }

    pub fn fake_vertex(&self, s: Segment) -> Option<&FakeVertex> {
        self.fake.vertex(s)
    }

    pub fn junction(&mut self, s: Segment, front: bool) -> Option<Junction> {
        if s.is_fake() {
            let v = self.fake.vertex(s)?;
            return Some(if front { v.to } else { v.from });
        }
        self.world.junction(s, front)
    }

    pub fn point(&mut self, s: Segment, front: bool) -> Option<LatLon> {
        self.junction(s, front).map(|j| j.point)
    }

    /// Junction before the `i`-th segment of a route; `i == route.len()` gives the route's end.
    pub fn route_junction(&mut self, route: &[Segment], i: usize) -> Option<Junction> {
        if i == route.len() {
            self.junction(*route.last()?, true)
        } else {
            self.junction(*route.get(i)?, false)
        }
    }

    pub fn weight(&mut self, s: Segment) -> Option<RouteWeight> {
        if s.is_fake() {
            return self.fake.vertex(s).map(|v| v.weight);
        }
        self.world.segment_weight(s)
    }

    /// Expected travel time over a segment, in seconds.
    pub fn eta(&mut self, s: Segment) -> f64 {
        if s.is_fake() {
            return self.fake.vertex(s).map(|v| v.eta).unwrap_or_default();
        }
        self.world.segment_eta(s)
    }

    /// The real segment behind `s`: `s` itself if real, the cut segment for parts of real ones.
    pub fn convert_to_real(&self, s: Segment) -> Option<Segment> {
        if s.is_real() {
            Some(s)
        } else {
            self.fake.vertex(s)?.real()
        }
    }
}

/// Wraps a [WorldGraph] with fake segments connecting the start (and finish) query points
/// with the segments they were snapped to.
///
/// Start ending: `start → projection → part of real → real graph`; the finish ending mirrors it.
pub struct RouteStarter {
    world: WorldGraph,
    fake: FakeEdges,
    start: Segment,
    finish: Option<Segment>,
    start_point: LatLon,
    finish_point: Option<LatLon>,
    start_partitions: Vec<PartitionId>,
    finish_partitions: Vec<PartitionId>,
    max_weight: f64,
}

impl RouteStarter {
    /// Creates fake edges for `start` (and `finish`), with fake ids starting at `fake_offset`.
    ///
    /// If `strict_forward` is set, the start is only connected with its segments in their own direction.
    pub fn new(
        mut world: WorldGraph,
        start: &FakeEnding,
        finish: Option<&FakeEnding>,
        strict_forward: bool,
        fake_offset: u32,
    ) -> Self {
        let mut fake = FakeEdges::new(fake_offset);
        let estimator = world.estimator().clone();

        // Start
        let start_segment = fake.add_vertex(FakeVertex {
            from: start.origin,
            to: start.origin,
            kind: FakeKind::Pure,
            side: FakeSide::Start,
            weight: RouteWeight::ZERO,
            eta: 0.0,
        });

        // (projection vertex, [(part of real, real)])
        let mut start_parts: Vec<(Segment, Vec<(Segment, Segment)>)> = Vec::new();
        for p in &start.projections {
            let offroad = estimator.offroad_time(start.origin.point, p.junction.point);
            let pj = fake.add_vertex(FakeVertex {
                from: start.origin,
                to: p.junction,
                kind: FakeKind::Pure,
                side: FakeSide::Start,
                weight: RouteWeight::new(offroad).with_fake_edge(),
                eta: offroad,
            });
            fake.add_edge(start_segment, pj);

            let mut directions = vec![(p.segment, p.segment_front)];
            if !p.is_one_way && !strict_forward {
                directions.push((p.segment.reversed(), p.segment_back));
            }

            let mut parts = Vec::new();
            for (real, to) in directions {
                let dist = earth_distance(p.junction.point, to.point);
                let Some(weight) = world.weight_of_part(real, dist) else {
                    continue;
                };
                let por = fake.add_vertex(FakeVertex {
                    from: p.junction,
                    to,
                    kind: FakeKind::PartOfReal(real),
                    side: FakeSide::Start,
                    weight,
                    eta: world.eta_of_part(real, dist),
                });
                fake.add_edge(pj, por);
                parts.push((por, real));
            }
            start_parts.push((pj, parts));
        }

        // Finish
        let mut finish_segment = None;
        let mut finish_parts: Vec<(Segment, Vec<(Segment, Segment)>)> = Vec::new();
        if let Some(finish) = finish {
            let fv = fake.add_vertex(FakeVertex {
                from: finish.origin,
                to: finish.origin,
                kind: FakeKind::Pure,
                side: FakeSide::Finish,
                weight: RouteWeight::ZERO,
                eta: 0.0,
            });
            finish_segment = Some(fv);

            for p in &finish.projections {
                let offroad = estimator.offroad_time(p.junction.point, finish.origin.point);
                let pj = fake.add_vertex(FakeVertex {
                    from: p.junction,
                    to: finish.origin,
                    kind: FakeKind::Pure,
                    side: FakeSide::Finish,
                    weight: RouteWeight::new(offroad).with_fake_edge(),
                    eta: offroad,
                });
                fake.add_edge(pj, fv);

                let mut directions = vec![(p.segment, p.segment_back)];
                if !p.is_one_way {
                    directions.push((p.segment.reversed(), p.segment_front));
                }

                let mut parts = Vec::new();
                for (real, from) in directions {
                    let dist = earth_distance(from.point, p.junction.point);
                    let Some(weight) = world.weight_of_part(real, dist) else {
                        continue;
                    };
                    let por = fake.add_vertex(FakeVertex {
                        from,
                        to: p.junction,
                        kind: FakeKind::PartOfReal(real),
                        side: FakeSide::Finish,
                        weight,
                        eta: world.eta_of_part(real, dist),
                    });
                    fake.add_edge(por, pj);
                    parts.push((por, real));
                }
                finish_parts.push((pj, parts));
            }

            // Start and finish on the same segment, with the finish ahead of the start
            for (start_pj, starts) in &start_parts {
                for &(start_por, real) in starts {
                    for (finish_pj, finishes) in &finish_parts {
                        if !finishes.iter().any(|&(_, r)| r == real) {
                            continue;
                        }
                        let (Some(s), Some(f), Some(back)) =
                            (fake.vertex(start_por), fake.vertex(*finish_pj), world.junction(real, false))
                        else {
                            continue;
                        };
                        let (from, to) = (s.from, f.from);
                        if earth_distance(back.point, from.point) > earth_distance(back.point, to.point) {
                            continue;
                        }

                        let dist = earth_distance(from.point, to.point);
                        let Some(weight) = world.weight_of_part(real, dist) else {
                            continue;
                        };
                        let between = fake.add_vertex(FakeVertex {
                            from,
                            to,
                            kind: FakeKind::PartOfReal(real),
                            side: FakeSide::Between,
                            weight,
                            eta: world.eta_of_part(real, dist),
                        });
                        fake.add_edge(*start_pj, between);
                        fake.add_edge(between, *finish_pj);
                    }
                }
            }
        }

        let start_partitions = partitions_of(start);
        let finish_partitions = finish.map(partitions_of).unwrap_or_default();

        Self {
            world,
            fake,
            start: start_segment,
            finish: finish_segment,
            start_point: start.origin.point,
            finish_point: finish.map(|f| f.origin.point),
            start_partitions,
            finish_partitions,
            max_weight: f64::INFINITY,
        }
    }

    pub fn graph(&self) -> &WorldGraph {
        &self.world
    }

    pub fn graph_mut(&mut self) -> &mut WorldGraph {
        &mut self.world
    }

    pub fn into_parts(self) -> (WorldGraph, FakeEdges) {
        (self.world, self.fake)
    }

    pub fn view(&mut self) -> RouteView<'_> {
        RouteView::new(&mut self.world, &self.fake)
    }

    pub fn start_segment(&self) -> Segment {
        self.start
    }

    pub fn finish_segment(&self) -> Option<Segment> {
        self.finish
    }

    pub fn start_point(&self) -> LatLon {
        self.start_point
    }

    pub fn finish_point(&self) -> Option<LatLon> {
        self.finish_point
    }

    pub fn start_partitions(&self) -> &[PartitionId] {
        &self.start_partitions
    }

    pub fn finish_partitions(&self) -> &[PartitionId] {
        &self.finish_partitions
    }

    pub fn fake_edges(&self) -> &FakeEdges {
        &self.fake
    }

    /// Adds fake vertices and edges of another starter.
    pub fn append(&mut self, other: &FakeEdges) {
        self.fake.append(other);
    }

    pub fn set_mode(&mut self, mode: WorldGraphMode) {
        self.world.set_mode(mode);
    }

    /// Limits the weight of routes accepted by searches over this starter.
    pub fn set_max_weight(&mut self, seconds: f64) {
        self.max_weight = seconds;
    }

    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    pub fn junction(&mut self, s: Segment, front: bool) -> Option<Junction> {
        self.view().junction(s, front)
    }

    pub fn point(&mut self, s: Segment, front: bool) -> Option<LatLon> {
        self.view().point(s, front)
    }

    pub fn weight(&mut self, s: Segment) -> Option<RouteWeight> {
        self.view().weight(s)
    }

    pub fn convert_to_real(&self, s: Segment) -> Option<Segment> {
        if s.is_real() {
            Some(s)
        } else {
            self.fake.vertex(s)?.real()
        }
    }

    /// Crow-flies estimate of the travel time between the front points of two segments.
    pub fn heuristic(&mut self, from: Segment, to: Segment) -> f64 {
        match (self.point(from, true), self.point(to, true)) {
            (Some(a), Some(b)) => self.world.estimator().heuristic(a, b),
            _ => 0.0,
        }
    }

    fn leap_estimate(&self, from: LatLon, to: LatLon) -> RouteWeight {
        RouteWeight::new(self.world.estimator().leap_estimate(from, to))
    }

    fn world_edges(&mut self, s: Segment, is_outgoing: bool) -> Vec<(Segment, RouteWeight)> {
        let mut edges = Vec::new();
        self.world.edges(s, is_outgoing, &mut edges);
        edges
    }

    /// Edges of real world neighbours of `s`, followed by fake parts attached to them.
    fn push_real(
        &mut self,
        s: Segment,
        is_outgoing: bool,
        adjust: Option<(RouteWeight, RouteWeight)>,
        out: &mut Vec<(Segment, RouteWeight)>,
    ) {
        for (t, w) in self.world_edges(s, is_outgoing) {
            // Replace the weight of a real segment with the weight of its fake part
            let w = match adjust {
                Some((real, part)) => w - real + part,
                None => w,
            };
            out.push((t, w));

            if is_outgoing {
                let Some(tw) = self.world.segment_weight(t) else {
                    continue;
                };
                for (p, v) in self.fake.parts(t, FakeSide::Finish) {
                    out.push((p, w - tw + v.weight));
                }
            } else {
                for (p, _) in self.fake.parts(t, FakeSide::Start) {
                    out.push((p, w));
                }
            }
        }
    }

    fn leap_edges(&mut self, s: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        if is_outgoing {
            if s == self.start {
                for id in self.start_partitions.clone() {
                    for exit in self.world.exits(id) {
                        if let Some(to) = self.world.point(exit, true) {
                            out.push((exit, self.leap_estimate(self.start_point, to)));
                        }
                    }
                }
                return;
            }

            out.extend(self.world_edges(s, true));
            if let (Some(fv), Some(finish)) = (self.finish, self.finish_point) {
                if self.finish_partitions.contains(&s.partition) && self.world.is_enter(s) {
                    if let Some(from) = self.world.point(s, true) {
                        out.push((fv, self.leap_estimate(from, finish)));
                    }
                }
            }
        } else {
            if Some(s) == self.finish {
                let Some(finish) = self.finish_point else {
                    return;
                };
                for id in self.finish_partitions.clone() {
                    for enter in self.world.enters(id) {
                        if let Some(from) = self.world.point(enter, true) {
                            out.push((enter, self.leap_estimate(from, finish)));
                        }
                    }
                }
                return;
            }

            out.extend(self.world_edges(s, false));
            if self.start_partitions.contains(&s.partition) && self.world.is_exit(s) {
                if let Some(to) = self.world.point(s, true) {
                    out.push((self.start, self.leap_estimate(self.start_point, to)));
                }
            }
        }
    }

    /// Appends all outgoing (or ingoing) edges of a real or fake segment to `out`.
    pub fn edges(&mut self, s: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        if self.world.mode().policy().leaps {
            self.leap_edges(s, is_outgoing, out);
            return;
        }

        if s.is_real() {
            self.push_real(s, is_outgoing, None, out);
            return;
        }

        let Some(v) = self.fake.vertex(s).copied() else {
            return;
        };

        if is_outgoing {
            for &t in self.fake.outgoing(s) {
                if let Some(tv) = self.fake.vertex(t) {
                    out.push((t, tv.weight));
                }
            }
            // A start part continues as its real segment would
            if let (FakeSide::Start, Some(real)) = (v.side, v.real()) {
                self.push_real(real, true, None, out);
            }
        } else {
            for &t in self.fake.ingoing(s) {
                out.push((t, v.weight));
            }
            // A finish part is entered like its real segment, but weighs less
            if let (FakeSide::Finish, Some(real)) = (v.side, v.real()) {
                if let Some(real_weight) = self.world.segment_weight(real) {
                    self.push_real(real, false, Some((real_weight, v.weight)), out);
                }
            }
        }
    }
}

impl Graph for RouteStarter {
    type Vertex = Segment;
    type Weight = RouteWeight;

    fn edges(&mut self, v: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        RouteStarter::edges(self, v, is_outgoing, out);
    }

    fn heuristic(&mut self, from: Segment, to: Segment) -> f64 {
        RouteStarter::heuristic(self, from, to)
    }
}

fn partitions_of(ending: &FakeEnding) -> Vec<PartitionId> {
    let mut ids: Vec<PartitionId> = ending
        .projections
        .iter()
        .map(|p| p.segment.partition)
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::astar::{find_path_bidirectional, Params};
    use crate::testing::{grid_point, single_grid, three_partitions};
    use crate::vehicle::RoadTypes;
    use crate::VehicleType;

    fn world(store: impl crate::store::PartitionStore + 'static) -> WorldGraph {
        WorldGraph::new(Arc::new(store), VehicleType::Car, None, RoadTypes::NONE)
    }

    /// Point slightly north of the row road `row`, between columns `col` and `col + 1`.
    fn near_row(lon0: f64, row: usize, col: usize, t: f64) -> LatLon {
        let a = grid_point(lon0, row, col);
        let b = grid_point(lon0, row, col + 1);
        LatLon::new(a.lat + 0.0001, a.lon + (b.lon - a.lon) * t)
    }

    fn ending(w: &mut WorldGraph, partition: PartitionId, row: usize, col: usize, t: f64) -> FakeEnding {
        let s = Segment::new(partition, row as u32, col as u32, true);
        let lon0 = crate::testing::grid_lon(partition as usize);
        make_fake_ending(w, &[s], near_row(lon0, row, col, t))
    }

    fn route(starter: &mut RouteStarter) -> Vec<Segment> {
        let start = starter.start_segment();
        let finish = starter.finish_segment().unwrap();
        find_path_bidirectional(
            starter,
            Params {
                start,
                finish,
                visit_period: 1,
                cancelled: &|| false,
                on_visit: &mut |_, _, _| {},
                check_length: &|_| true,
            },
        )
        .unwrap()
        .path
    }

    #[test]
    fn fake_structure() {
        let mut w = world(single_grid());
        let s = ending(&mut w, 0, 1, 1, 0.5);
        let f = ending(&mut w, 0, 3, 3, 0.5);
        let mut starter = RouteStarter::new(w, &s, Some(&f), false, 0);

        // Sv, Pj, 2×PoR for each ending
        assert_eq!(starter.fake_edges().len(), 8);
        let start = starter.start_segment();
        assert_eq!(starter.fake_edges().outgoing(start).len(), 1);

        let pj = starter.fake_edges().outgoing(start)[0];
        let mut out = Vec::new();
        starter.edges(pj, true, &mut out);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|(_, w)| w.num_fake_edges == 0));

        let v = *starter.fake_edges().vertex(pj).unwrap();
        assert_eq!(v.weight.num_fake_edges, 1);
        assert_eq!(v.from.point, s.origin.point);
    }

    #[test]
    fn strict_forward_start() {
        let mut w = world(single_grid());
        let s = ending(&mut w, 0, 1, 1, 0.5);
        let starter = RouteStarter::new(w, &s, None, true, 0);
        assert_eq!(starter.fake_edges().len(), 3);
        assert_eq!(starter.finish_segment(), None);
    }

    #[test]
    fn fake_offset() {
        let mut w = world(single_grid());
        let s = ending(&mut w, 0, 1, 1, 0.5);
        let starter = RouteStarter::new(w, &s, None, false, 100);
        assert_eq!(starter.start_segment(), Segment::fake(100));
        assert_eq!(starter.fake_edges().next_offset(), 104);
    }

    #[test]
    fn route_through_fakes() {
        let mut w = world(single_grid());
        let s = ending(&mut w, 0, 1, 1, 0.5);
        let f = ending(&mut w, 0, 1, 3, 0.5);
        let mut starter = RouteStarter::new(w, &s, Some(&f), false, 0);

        let path = route(&mut starter);
        assert_eq!(path.first(), Some(&starter.start_segment()));
        assert_eq!(path.last(), starter.finish_segment().as_ref());

        // Straight along row 1: start part, segments 2, finish part
        let real: Vec<Segment> = path.iter().filter_map(|&s| starter.convert_to_real(s)).collect();
        assert_eq!(
            real,
            vec![
                Segment::new(0, 1, 1, true),
                Segment::new(0, 1, 2, true),
                Segment::new(0, 1, 3, true),
            ],
        );

        let mut view = starter.view();
        let first = view.route_junction(&path, 0).unwrap();
        let last = view.route_junction(&path, path.len()).unwrap();
        assert_eq!(first.point, s.origin.point);
        assert_eq!(last.point, f.origin.point);
    }

    #[test]
    fn same_segment() {
        let mut w = world(single_grid());
        let s = ending(&mut w, 0, 1, 1, 0.2);
        let f = ending(&mut w, 0, 1, 1, 0.8);
        let mut starter = RouteStarter::new(w, &s, Some(&f), false, 0);

        let path = route(&mut starter);
        assert_eq!(path.len(), 5);
        let between = starter.fake_edges().vertex(path[2]).unwrap();
        assert_eq!(between.side, FakeSide::Between);
        assert_eq!(between.real(), Some(Segment::new(0, 1, 1, true)));
    }

    #[test]
    fn finish_behind_start_on_same_segment() {
        let mut w = world(single_grid());
        let s = ending(&mut w, 0, 1, 1, 0.8);
        let f = ending(&mut w, 0, 1, 1, 0.2);
        let mut starter = RouteStarter::new(w, &s, Some(&f), false, 0);

        // Going backwards along the reversed segment
        let path = route(&mut starter);
        assert_eq!(path.len(), 5);
        let between = starter.fake_edges().vertex(path[2]).unwrap();
        assert_eq!(between.real(), Some(Segment::new(0, 1, 1, false)));
    }

    #[test]
    fn leaps_from_start_to_exits() {
        let mut w = world(three_partitions());
        let s = ending(&mut w, 0, 2, 1, 0.5);
        let f = ending(&mut w, 2, 2, 3, 0.5);
        let mut starter = RouteStarter::new(w, &s, Some(&f), false, 0);
        starter.set_mode(WorldGraphMode::LeapsOnly);

        let mut out = Vec::new();
        starter.edges(starter.start_segment(), true, &mut out);
        assert!(!out.is_empty());
        assert!(out.iter().all(|(t, _)| t.partition == 0));

        let path = route(&mut starter);
        assert!(path.len() >= 6);
        assert_eq!(path[1].partition, 0);
        assert_eq!(path[path.len() - 2].partition, 2);
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::distance::{project_onto_segment, Projection};
use crate::estimator::EdgeEstimator;
use crate::kd::KDTree;
use crate::store::{Partition, Road, TransitInfo, SNAP_RADIUS};
use crate::vehicle::{RoadTypes, TurnRestriction, VehicleModel};
use crate::{earth_distance, Junction, LatLon, PartitionId, RouteWeight, Segment};

/// A point of a road: index of the road and index of the point on that road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct RoadPoint {
    pub feature: u32,
    pub point: u32,
}

/// Vehicle-specific interpretation of a [Road].
#[derive(Debug, Clone, Copy)]
struct RoadInfo {
    /// Free-flow speed in km/h, `None` if the road is not routable.
    speed: Option<f64>,
    forward: bool,
    backward: bool,
    transit: bool,
    types: RoadTypes,
}

/// Routing graph of a single loaded partition, built for one vehicle.
///
/// Vertices are directed [Segments](Segment). An outgoing edge `s → t` weighs
/// as much as traversing `t` plus the penalty of the junction between them;
/// an ingoing edge of `t` from `s` has the very same weight.
pub(crate) struct IndexGraph {
    id: PartitionId,
    data: Arc<Partition>,
    estimator: Arc<EdgeEstimator>,
    roads: Vec<RoadInfo>,

    /// Road points of nodes shared by more than one road point, and of border nodes.
    joints: HashMap<i64, Vec<RoadPoint>>,

    /// (from feature, via node) → applicable restrictions.
    restrictions: HashMap<(u32, i64), Vec<(TurnRestriction, u32)>>,
    tree: Option<KDTree<RoadPoint>>,
    max_segment_length: f64,
}

impl IndexGraph {
    pub(crate) fn new(
        id: PartitionId,
        data: Arc<Partition>,
        model: &VehicleModel,
        estimator: Arc<EdgeEstimator>,
        avoid: RoadTypes,
    ) -> Self {
        let roads: Vec<RoadInfo> = data
            .roads
            .iter()
            .map(|road| {
                let class = model.road_class(&road.tags);
                let types = RoadTypes::from_tags(&road.tags);
                let (forward, backward) = model.way_direction(&road.tags);
                let routable = road.points.len() >= 2 && !types.intersects(avoid);
                RoadInfo {
                    speed: class.filter(|_| routable).map(|c| c.speed),
                    forward,
                    backward,
                    transit: class.is_some_and(|c| c.transit),
                    types,
                }
            })
            .collect();

        let mut joints: HashMap<i64, Vec<RoadPoint>> = HashMap::new();
        let mut points = Vec::new();
        let mut max_segment_length: f64 = 0.0;
        for (feature, road) in data.roads.iter().enumerate() {
            for (point, (node, junction)) in road.nodes.iter().zip(&road.points).enumerate() {
                let rp = RoadPoint {
                    feature: feature as u32,
                    point: point as u32,
                };
                joints.entry(*node).or_default().push(rp);
                if roads[feature].speed.is_some() {
                    points.push((junction.point, rp));
                }
            }
            for pair in road.points.windows(2) {
                max_segment_length = max_segment_length.max(earth_distance(pair[0].point, pair[1].point));
            }
        }
        joints.retain(|node, rps| rps.len() > 1 || data.border_nodes.contains(node));

        let mut restrictions: HashMap<(u32, i64), Vec<(TurnRestriction, u32)>> = HashMap::new();
        for r in &data.restrictions {
            let kind = model.restriction_kind(&r.tags);
            if kind != TurnRestriction::Inapplicable {
                restrictions.entry((r.from, r.via)).or_default().push((kind, r.to));
            }
        }

        Self {
            id,
            estimator,
            roads,
            joints,
            restrictions,
            tree: KDTree::build(&mut points),
            max_segment_length,
            data,
        }
    }

    pub(crate) fn id(&self) -> PartitionId {
        self.id
    }

    pub(crate) fn data(&self) -> &Arc<Partition> {
        &self.data
    }

    pub(crate) fn road(&self, feature: u32) -> Option<&Road> {
        self.data.roads.get(feature as usize)
    }

    /// Checks whether a real segment exists and may be traversed in its direction.
    pub(crate) fn is_traversable(&self, s: Segment) -> bool {
        match (self.roads.get(s.feature as usize), self.road(s.feature)) {
            (Some(info), Some(road)) => {
                info.speed.is_some()
                    && s.segment < road.num_segments()
                    && if s.forward { info.forward } else { info.backward }
            }
            _ => false,
        }
    }

    pub(crate) fn is_transit(&self, feature: u32) -> bool {
        self.roads.get(feature as usize).is_some_and(|r| r.transit)
    }

    pub(crate) fn is_bidirectional(&self, feature: u32) -> bool {
        self.roads
            .get(feature as usize)
            .is_some_and(|r| r.forward && r.backward)
    }

    pub(crate) fn road_types(&self, feature: u32) -> RoadTypes {
        self.roads
            .get(feature as usize)
            .map(|r| r.types)
            .unwrap_or_default()
    }

    pub(crate) fn transit_info(&self, feature: u32) -> Option<&TransitInfo> {
        self.data.transit.as_ref()?.lines.get(&feature)
    }

    pub(crate) fn junction(&self, s: Segment, front: bool) -> Option<Junction> {
        self.road(s.feature)?
            .points
            .get(s.point_id(front) as usize)
            .copied()
    }

    pub(crate) fn node(&self, s: Segment, front: bool) -> Option<i64> {
        self.road(s.feature)?
            .nodes
            .get(s.point_id(front) as usize)
            .copied()
    }

    pub(crate) fn segment_length(&self, s: Segment) -> Option<f64> {
        Some(earth_distance(
            self.junction(s, false)?.point,
            self.junction(s, true)?.point,
        ))
    }

    /// Time of traversing `distance` meters of `s`, or `None` if `s` is closed or not routable.
    pub(crate) fn weight_of_part(&self, s: Segment, distance: f64) -> Option<RouteWeight> {
        let speed = self.roads.get(s.feature as usize)?.speed?;
        self.estimator
            .segment_time(s, distance, speed)
            .map(RouteWeight::new)
    }

    pub(crate) fn segment_weight(&self, s: Segment) -> Option<RouteWeight> {
        self.weight_of_part(s, self.segment_length(s)?)
    }

    /// Expected travel time of `distance` meters of `s`, without structural penalties.
    pub(crate) fn eta_of_part(&self, s: Segment, distance: f64) -> f64 {
        match self.roads.get(s.feature as usize).and_then(|r| r.speed) {
            Some(speed) => self
                .estimator
                .segment_time(s, distance, speed)
                .unwrap_or_else(|| self.estimator.free_flow_time(distance, speed)),
            None => 0.0,
        }
    }

    /// Returns true if the front (or back) point of `s` ends a contracted run of segments:
    /// it is shared with another road, it ends the road, or it lies on the partition border.
    pub(crate) fn is_joint(&self, s: Segment, front: bool) -> bool {
        let Some(road) = self.road(s.feature) else {
            return true;
        };
        let point = s.point_id(front);
        if point == 0 || point as usize + 1 >= road.nodes.len() {
            return true;
        }
        let node = road.nodes[point as usize];
        self.joints.contains_key(&node) || self.data.border_nodes.contains(&node)
    }

    pub(crate) fn is_border_node(&self, node: i64) -> bool {
        self.data.border_nodes.contains(&node)
    }

    /// Road points located at `node`. `fallback` is the road point the node was reached from.
    pub(crate) fn road_points_at(&self, node: i64, fallback: RoadPoint) -> Vec<RoadPoint> {
        match self.joints.get(&node) {
            Some(rps) => rps.clone(),
            None if self.road(fallback.feature).and_then(|r| r.nodes.get(fallback.point as usize))
                == Some(&node) =>
            {
                vec![fallback]
            }
            None => self.find_road_points(node),
        }
    }

    /// All road points located at `node`.
    pub(crate) fn road_points_of(&self, node: i64) -> Vec<RoadPoint> {
        match self.joints.get(&node) {
            Some(rps) => rps.clone(),
            None => self.find_road_points(node),
        }
    }

    fn find_road_points(&self, node: i64) -> Vec<RoadPoint> {
        self.data
            .roads
            .iter()
            .enumerate()
            .flat_map(|(feature, road)| {
                road.nodes
                    .iter()
                    .enumerate()
                    .filter(move |(_, &n)| n == node)
                    .map(move |(point, _)| RoadPoint {
                        feature: feature as u32,
                        point: point as u32,
                    })
            })
            .collect()
    }

    /// Checks turn restrictions of moving from road `from` onto road `to` through `via`.
    fn is_turn_allowed(&self, from: u32, via: i64, to: u32) -> bool {
        let Some(rules) = self.restrictions.get(&(from, via)) else {
            return true;
        };

        let mut has_mandatory = false;
        let mut mandated = false;
        for &(kind, target) in rules {
            match kind {
                TurnRestriction::Prohibitory if target == to => return false,
                TurnRestriction::Mandatory => {
                    has_mandatory = true;
                    mandated |= target == to;
                }
                _ => {}
            }
        }
        return !has_mandatory || mandated;
    }

    /// Penalty of moving from road `from` onto road `to` through `node`.
    pub(crate) fn junction_penalty(&self, from: u32, node: i64, to: u32) -> RouteWeight {
        self.penalty(self.is_transit(from), node, to)
    }

    /// Penalty of entering road `to` through `node`, coming from a transit road or not.
    pub(crate) fn penalty(&self, from_transit: bool, node: i64, to: u32) -> RouteWeight {
        let mut w = RouteWeight::ZERO;
        if self.data.barriers.contains(&node) {
            w = w + RouteWeight::new(self.estimator.barrier_penalty()).with_barrier();
        }
        if !from_transit && self.roads.get(to as usize).is_some_and(|r| r.transit) {
            w = w + RouteWeight::new(self.estimator.transfer_penalty()).with_transfer();
        }
        return w;
    }

    /// Appends segments adjacent to `s` through the road point `at` (which must
    /// lie on the front of `s` for outgoing, on the back for ingoing edges).
    pub(crate) fn push_adjacent(
        &self,
        at: RoadPoint,
        is_outgoing: bool,
        out: &mut Vec<Segment>,
    ) {
        let Some(road) = self.road(at.feature) else {
            return;
        };
        let Some(info) = self.roads.get(at.feature as usize) else {
            return;
        };
        if info.speed.is_none() {
            return;
        }

        let len = road.points.len() as u32;
        let has_next = at.point + 1 < len;
        let has_prev = at.point > 0;
        let f = at.feature;

        if is_outgoing {
            if has_next && info.forward {
                out.push(Segment::new(self.id, f, at.point, true));
            }
            if has_prev && info.backward {
                out.push(Segment::new(self.id, f, at.point - 1, false));
            }
        } else {
            if has_prev && info.forward {
                out.push(Segment::new(self.id, f, at.point - 1, true));
            }
            if has_next && info.backward {
                out.push(Segment::new(self.id, f, at.point, false));
            }
        }
    }

    /// Real edges of `s` within this partition.
    pub(crate) fn edges(&self, s: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        let Some(node) = self.node(s, is_outgoing) else {
            return;
        };
        let here = RoadPoint {
            feature: s.feature,
            point: s.point_id(is_outgoing),
        };

        let mut candidates = Vec::new();
        for rp in self.road_points_at(node, here) {
            self.push_adjacent(rp, is_outgoing, &mut candidates);
        }

        // U-turns are only allowed at dead ends
        if candidates.len() > 1 {
            candidates.retain(|&c| c != s.reversed());
        }

        for t in candidates {
            let (from, to) = if is_outgoing { (s, t) } else { (t, s) };
            let straight = from.feature == to.feature && from.forward == to.forward;
            if !straight && !self.is_turn_allowed(from.feature, node, to.feature) {
                continue;
            }

            let Some(w) = self.segment_weight(to) else {
                continue;
            };
            out.push((t, w + self.junction_penalty(from.feature, node, to.feature)));
        }
    }

    /// Finds up to `count` segments closest to `point`, as directed segments
    /// (both directions of bidirectional roads) with the projection of `point`.
    pub(crate) fn find_closest_edges(&self, point: LatLon, count: usize) -> Vec<(Segment, Projection)> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };

        // Any segment within SNAP_RADIUS has an end within this distance
        let mut nearby = Vec::new();
        tree.find_within(point, SNAP_RADIUS + self.max_segment_length * 0.5, &mut nearby);

        let mut undirected: BTreeSet<(u32, u32)> = BTreeSet::new();
        for rp in nearby {
            let Some(road) = self.road(rp.feature) else {
                continue;
            };
            if rp.point > 0 {
                undirected.insert((rp.feature, rp.point - 1));
            }
            if rp.point + 1 < road.points.len() as u32 {
                undirected.insert((rp.feature, rp.point));
            }
        }

        let mut candidates: Vec<((u32, u32), Projection)> = undirected
            .into_iter()
            .filter_map(|(feature, segment)| {
                let road = self.road(feature)?;
                let a = road.points.get(segment as usize)?.point;
                let b = road.points.get(segment as usize + 1)?.point;
                let proj = project_onto_segment(point, a, b);
                if proj.squared_distance <= SNAP_RADIUS * SNAP_RADIUS {
                    Some(((feature, segment), proj))
                } else {
                    None
                }
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.1.squared_distance
                .total_cmp(&b.1.squared_distance)
                .then(a.0.cmp(&b.0))
        });
        candidates.truncate(count);

        let mut result = Vec::with_capacity(candidates.len() * 2);
        for ((feature, segment), proj) in candidates {
            let info = &self.roads[feature as usize];
            if info.forward {
                result.push((Segment::new(self.id, feature, segment, true), proj));
            }
            if info.backward {
                result.push((Segment::new(self.id, feature, segment, false), proj));
            }
        }
        return result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Partition, Restriction};
    use crate::testing::{road, road_tagged, tags};
    use crate::vehicle::{CAR_MODEL, PEDESTRIAN_MODEL};
    use crate::VehicleType;

    //        4
    //        |
    //  1 --- 2 --- 3      road 0: 1-2-3 (residential)
    //        |            road 1: 4-2-5 (residential, oneway)
    //        5            road 2: 3-6 (primary)
    //              6
    fn cross() -> Partition {
        Partition {
            name: "cross".to_string(),
            roads: vec![
                road(10, "residential", &[(1, 0.0, 0.0), (2, 0.0, 0.001), (3, 0.0, 0.002)]),
                road_tagged(
                    11,
                    &[("highway", "residential"), ("oneway", "yes")],
                    &[(4, 0.001, 0.001), (2, 0.0, 0.001), (5, -0.001, 0.001)],
                ),
                road(12, "primary", &[(3, 0.0, 0.002), (6, -0.001, 0.003)]),
            ],
            restrictions: vec![Restriction {
                tags: tags(&[("type", "restriction"), ("restriction", "no_right_turn")]),
                from: 0,
                via: 2,
                to: 1,
            }],
            barriers: [3].into_iter().collect(),
            ..Default::default()
        }
    }

    fn graph(model: &VehicleModel, vehicle: VehicleType) -> IndexGraph {
        IndexGraph::new(
            0,
            Arc::new(cross()),
            model,
            Arc::new(EdgeEstimator::new(vehicle, None)),
            RoadTypes::NONE,
        )
    }

    fn targets(g: &IndexGraph, s: Segment, is_outgoing: bool) -> Vec<Segment> {
        let mut out = Vec::new();
        g.edges(s, is_outgoing, &mut out);
        let mut segments: Vec<Segment> = out.into_iter().map(|(s, _)| s).collect();
        segments.sort();
        segments
    }

    #[test]
    fn nodes_without_points_are_ignored() {
        let mut p = cross();
        p.roads[2].nodes.push(7);
        let g = IndexGraph::new(
            0,
            Arc::new(p),
            &CAR_MODEL,
            Arc::new(EdgeEstimator::new(VehicleType::Car, None)),
            RoadTypes::NONE,
        );

        let closest = g.find_closest_edges(LatLon::new(-0.0005, 0.0025), 4);
        assert!(closest.iter().any(|(s, _)| s.feature == 2 && s.segment == 0));
    }

    #[test]
    fn outgoing_edges_respect_oneway_and_restrictions() {
        let g = graph(&CAR_MODEL, VehicleType::Car);

        // 1→2 continues to 2→3; 2→5 is restricted, 2→4 is against the oneway
        let s = Segment::new(0, 0, 0, true);
        assert_eq!(targets(&g, s, true), vec![Segment::new(0, 0, 1, true)]);

        // 3→2 can't turn onto 2→5 either, as the restriction ignores direction
        let s = Segment::new(0, 0, 1, false);
        assert_eq!(targets(&g, s, true), vec![Segment::new(0, 0, 0, false)]);

        // 4→2 may continue or turn both ways
        let s = Segment::new(0, 1, 0, true);
        assert_eq!(
            targets(&g, s, true),
            vec![
                Segment::new(0, 0, 0, false),
                Segment::new(0, 0, 1, true),
                Segment::new(0, 1, 1, true),
            ],
        );
    }

    #[test]
    fn ingoing_edges_mirror_outgoing() {
        let g = graph(&CAR_MODEL, VehicleType::Car);
        let t = Segment::new(0, 0, 1, true); // 2→3

        let mut ingoing = Vec::new();
        g.edges(t, false, &mut ingoing);
        for (s, w) in ingoing {
            let mut outgoing = Vec::new();
            g.edges(s, true, &mut outgoing);
            let found = outgoing.iter().find(|(x, _)| *x == t).map(|(_, w)| *w);
            assert_eq!(found, Some(w), "edge {s} -> {t}");
        }
    }

    #[test]
    fn u_turn_only_at_dead_ends() {
        let g = graph(&CAR_MODEL, VehicleType::Car);

        // 2→1 reaches the dead end at 1 - turning around is the only option
        let s = Segment::new(0, 0, 0, false);
        assert_eq!(targets(&g, s, true), vec![s.reversed()]);
    }

    #[test]
    fn barrier_penalty() {
        let g = graph(&CAR_MODEL, VehicleType::Car);
        let s = Segment::new(0, 0, 1, true); // 2→3, node 3 has a barrier
        let mut out = Vec::new();
        g.edges(s, true, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.num_barriers, 1);
        let plain = g.segment_weight(out[0].0).unwrap();
        assert!(out[0].1.weight > plain.weight);
    }

    #[test]
    fn pedestrians_ignore_oneway() {
        let g = graph(&PEDESTRIAN_MODEL, VehicleType::Pedestrian);
        assert!(g.is_bidirectional(1));
        assert!(g.is_traversable(Segment::new(0, 1, 0, false)));
        assert!(!graph(&CAR_MODEL, VehicleType::Car).is_traversable(Segment::new(0, 1, 0, false)));
    }

    #[test]
    fn joints() {
        let g = graph(&CAR_MODEL, VehicleType::Car);
        let s = Segment::new(0, 0, 0, true);
        assert!(g.is_joint(s, false)); // road end
        assert!(g.is_joint(s, true)); // shared with road 1
        assert!(g.is_joint(Segment::new(0, 1, 0, true), false));
    }

    #[test]
    fn closest_edges() {
        let g = graph(&CAR_MODEL, VehicleType::Car);
        let edges = g.find_closest_edges(LatLon::new(0.0002, 0.0005), 12);

        // Closest is road 0 segment 0 (both directions), then the oneway road 1
        assert_eq!(edges[0].0, Segment::new(0, 0, 0, true));
        assert_eq!(edges[1].0, Segment::new(0, 0, 0, false));
        assert!(edges.iter().all(|(s, _)| g.is_traversable(*s)));
        assert!(g.find_closest_edges(LatLon::new(1.0, 1.0), 12).is_empty());
    }
}

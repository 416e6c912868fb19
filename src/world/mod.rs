// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Unified routing graph over all loadable partitions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::astar::{distances_from, Graph};
use crate::distance::Projection;
use crate::estimator::{EdgeEstimator, TrafficCache};
use crate::store::{PartitionStatus, PartitionStore, SpeedCamera, SpeedCameraPolicy, TransitInfo};
use crate::vehicle::{RoadTypes, VehicleModel};
use crate::{Junction, LatLon, PartitionId, RouteWeight, Segment, VehicleType};

mod cross;
mod index_graph;

use cross::CrossPartitionGraph;
pub(crate) use index_graph::IndexGraph;

/// Traversal mode of a [WorldGraph].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorldGraphMode {
    /// Real edges of a single partition only.
    SingleMwm,

    /// Contracted real edges, crossing partition borders.
    Joints,

    /// Real edges, crossing partition borders.
    #[default]
    NoLeaps,

    /// Leap and twin edges between partition borders only.
    LeapsOnly,

    /// Contracted real edges of a single partition only.
    JointSingleMwm,
}

/// What a [WorldGraphMode] permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePolicy {
    pub cross_partition: bool,
    pub leaps: bool,
    pub joints: bool,
}

impl WorldGraphMode {
    pub fn policy(self) -> ModePolicy {
        let (cross_partition, leaps, joints) = match self {
            Self::SingleMwm => (false, false, false),
            Self::Joints => (true, false, true),
            Self::NoLeaps => (true, false, false),
            Self::LeapsOnly => (true, true, false),
            Self::JointSingleMwm => (false, false, true),
        };
        ModePolicy {
            cross_partition,
            leaps,
            joints,
        }
    }
}

impl std::fmt::Display for WorldGraphMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::SingleMwm => "single-mwm",
            Self::Joints => "joints",
            Self::NoLeaps => "no-leaps",
            Self::LeapsOnly => "leaps-only",
            Self::JointSingleMwm => "joint-single-mwm",
        })
    }
}

/// Routing graph of a single partition, as seen by the generic searches.
struct SinglePartition<'a> {
    graph: &'a IndexGraph,
}

impl Graph for SinglePartition<'_> {
    type Vertex = Segment;
    type Weight = RouteWeight;

    fn edges(&mut self, v: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        self.graph.edges(v, is_outgoing, out);
    }

    fn heuristic(&mut self, _: Segment, _: Segment) -> f64 {
        0.0
    }
}

/// Graph of directed real [Segments](Segment) spanning every loadable partition.
///
/// Per-partition graphs are loaded lazily and kept until [WorldGraph::clear_cached_graphs].
/// The set of edges depends on the current [WorldGraphMode].
pub struct WorldGraph {
    store: Arc<dyn PartitionStore>,
    model: &'static VehicleModel<'static>,
    estimator: Arc<EdgeEstimator>,
    avoid: RoadTypes,
    mode: WorldGraphMode,
    graphs: HashMap<PartitionId, Arc<IndexGraph>>,
    unloadable: HashSet<PartitionId>,
    cross: CrossPartitionGraph,

    /// (enter or exit, is_outgoing) → leap edges
    leaps: HashMap<(Segment, bool), Arc<Vec<(Segment, RouteWeight)>>>,
}

impl WorldGraph {
    pub fn new(
        store: Arc<dyn PartitionStore>,
        vehicle: VehicleType,
        traffic: Option<Arc<TrafficCache>>,
        avoid: RoadTypes,
    ) -> Self {
        let model = vehicle.model();
        let estimator = Arc::new(EdgeEstimator::new(vehicle, traffic));
        Self {
            cross: CrossPartitionGraph::new(store.clone(), model, estimator.clone(), avoid),
            store,
            model,
            estimator,
            avoid,
            mode: WorldGraphMode::default(),
            graphs: HashMap::default(),
            unloadable: HashSet::default(),
            leaps: HashMap::default(),
        }
    }

    pub fn mode(&self) -> WorldGraphMode {
        self.mode
    }

    /// Changes the traversal mode; takes effect on the next edge query.
    pub fn set_mode(&mut self, mode: WorldGraphMode) {
        self.mode = mode;
    }

    pub fn estimator(&self) -> &Arc<EdgeEstimator> {
        &self.estimator
    }

    pub fn store(&self) -> &Arc<dyn PartitionStore> {
        &self.store
    }

    pub fn vehicle(&self) -> VehicleType {
        self.estimator.vehicle()
    }

    /// Evicts all loaded per-partition graphs.
    pub fn clear_cached_graphs(&mut self) {
        self.graphs.clear();
    }

    /// Number of currently loaded per-partition graphs.
    pub fn num_loaded(&self) -> usize {
        self.graphs.len()
    }

    /// Returns the routing graph of a partition, loading it if necessary.
    /// Partitions which can't be loaded are reported once and skipped afterwards.
    pub(crate) fn graph(&mut self, id: PartitionId) -> Option<Arc<IndexGraph>> {
        if let Some(g) = self.graphs.get(&id) {
            return Some(g.clone());
        }
        if id == crate::FAKE_PARTITION_ID || self.unloadable.contains(&id) {
            return None;
        }

        if self.store.status(id) != Some(PartitionStatus::Ready) {
            log::warn!("partition {id} is not ready for routing");
            self.unloadable.insert(id);
            return None;
        }

        let data = match self.store.load(id) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("partition {id} could not be loaded: {e}");
                self.unloadable.insert(id);
                return None;
            }
        };

        let g = Arc::new(IndexGraph::new(
            id,
            data,
            self.model,
            self.estimator.clone(),
            self.avoid,
        ));
        self.graphs.insert(id, g.clone());
        return Some(g);
    }

    /// Appends all outgoing (or ingoing) edges of a real segment to `out`.
    pub fn edges(&mut self, s: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        if s.is_fake() {
            return;
        }

        let policy = self.mode.policy();
        if policy.leaps {
            self.leap_edges(s, is_outgoing, out);
            return;
        }

        let Some(g) = self.graph(s.partition) else {
            return;
        };
        let first_own = out.len();
        g.edges(s, is_outgoing, out);

        if policy.cross_partition {
            let first_cross = out.len();
            self.cross_edges(&g, s, is_outgoing, out);

            // The partition end is not a dead end if the road continues in a neighbour
            if out.len() > first_cross {
                let u_turn = s.reversed();
                let mut idx = first_own;
                while idx < first_cross && idx < out.len() {
                    if out[idx].0 == u_turn {
                        out.remove(idx);
                        break;
                    }
                    idx += 1;
                }
            }
        }
    }

    /// Edges through the border node at the front (or back) of `s` into neighbouring partitions.
    fn cross_edges(&mut self, p: &IndexGraph, s: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        let Some(node) = p.node(s, is_outgoing) else {
            return;
        };
        if !p.is_border_node(node) {
            return;
        }

        let mut candidates = Vec::new();
        for id in self.cross.neighbors(p.id()) {
            let Some(q) = self.graph(id) else {
                continue;
            };
            if !q.is_border_node(node) {
                continue;
            }

            candidates.clear();
            for rp in q.road_points_of(node) {
                q.push_adjacent(rp, is_outgoing, &mut candidates);
            }

            for &t in &candidates {
                let weight = if is_outgoing {
                    q.segment_weight(t)
                        .map(|w| w + q.penalty(p.is_transit(s.feature), node, t.feature))
                } else {
                    p.segment_weight(s)
                        .map(|w| w + p.penalty(q.is_transit(t.feature), node, s.feature))
                };
                if let Some(w) = weight {
                    out.push((t, w));
                }
            }
        }
    }

    fn leap_edges(&mut self, s: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        // Outgoing: enter → exits of the same partition, exit → twin enters.
        // Ingoing: exit ← enters of the same partition, enter ← twin exits.
        let (leap_from, twin_from) = if is_outgoing {
            (self.cross.is_enter(s), self.cross.is_exit(s))
        } else {
            (self.cross.is_exit(s), self.cross.is_enter(s))
        };

        if leap_from {
            out.extend(self.leaps(s, is_outgoing).iter().copied());
        }
        if twin_from {
            self.cross.twins(s, is_outgoing, out);
        }
    }

    /// Leap edges of a border segment: shortest paths inside its partition
    /// to every exit (outgoing) or from every enter (ingoing).
    fn leaps(&mut self, s: Segment, is_outgoing: bool) -> Arc<Vec<(Segment, RouteWeight)>> {
        if let Some(cached) = self.leaps.get(&(s, is_outgoing)) {
            return cached.clone();
        }

        let targets: HashSet<Segment> = if is_outgoing {
            self.cross.exits(s.partition).into_iter().collect()
        } else {
            self.cross.enters(s.partition).into_iter().collect()
        };

        let mut edges: Vec<(Segment, RouteWeight)> = match self.graph(s.partition) {
            Some(g) => distances_from(&mut SinglePartition { graph: &g }, s, is_outgoing, &targets)
                .into_iter()
                .filter(|&(t, _)| t != s)
                .collect(),
            None => Vec::new(),
        };
        edges.sort();

        let edges = Arc::new(edges);
        self.leaps.insert((s, is_outgoing), edges.clone());
        return edges;
    }

    pub fn junction(&mut self, s: Segment, front: bool) -> Option<Junction> {
        if s.is_fake() {
            return None;
        }
        if self.mode.policy().leaps {
            if let Some(j) = self.cross.junction(s, front) {
                return Some(j);
            }
        }
        match self.graph(s.partition) {
            Some(g) => g.junction(s, front),
            None => self.cross.junction(s, front),
        }
    }

    pub fn point(&mut self, s: Segment, front: bool) -> Option<LatLon> {
        self.junction(s, front).map(|j| j.point)
    }

    pub fn segment_weight(&mut self, s: Segment) -> Option<RouteWeight> {
        if self.mode.policy().leaps {
            if let Some(w) = self.cross.weight(s) {
                return Some(w);
            }
        }
        self.graph(s.partition)?.segment_weight(s)
    }

    /// Weight of traversing `distance` meters of `s`, `None` if `s` is closed.
    pub fn weight_of_part(&mut self, s: Segment, distance: f64) -> Option<RouteWeight> {
        self.graph(s.partition)?.weight_of_part(s, distance)
    }

    /// Expected travel time over `distance` meters of `s`.
    pub fn eta_of_part(&mut self, s: Segment, distance: f64) -> f64 {
        self.graph(s.partition)
            .map(|g| g.eta_of_part(s, distance))
            .unwrap_or_default()
    }

    /// Expected travel time over the whole of `s`.
    pub fn segment_eta(&mut self, s: Segment) -> f64 {
        let Some(g) = self.graph(s.partition) else {
            return 0.0;
        };
        match g.segment_length(s) {
            Some(length) => g.eta_of_part(s, length),
            None => 0.0,
        }
    }

    pub fn segment_length(&mut self, s: Segment) -> Option<f64> {
        self.graph(s.partition)?.segment_length(s)
    }

    pub fn is_joint(&mut self, s: Segment, front: bool) -> bool {
        match self.graph(s.partition) {
            Some(g) => g.is_joint(s, front),
            None => true,
        }
    }

    pub fn is_bidirectional(&mut self, s: Segment) -> bool {
        self.graph(s.partition)
            .is_some_and(|g| g.is_bidirectional(s.feature))
    }

    pub fn is_traversable(&mut self, s: Segment) -> bool {
        self.graph(s.partition)
            .is_some_and(|g| g.is_traversable(s))
    }

    pub fn road_types(&mut self, s: Segment) -> RoadTypes {
        self.graph(s.partition)
            .map(|g| g.road_types(s.feature))
            .unwrap_or_default()
    }

    pub fn road_name(&mut self, s: Segment) -> Option<String> {
        let g = self.graph(s.partition)?;
        let name = g.road(s.feature)?.name()?.to_string();
        Some(name)
    }

    pub fn transit_info(&mut self, s: Segment) -> Option<TransitInfo> {
        self.graph(s.partition)?.transit_info(s.feature).cloned()
    }

    /// Returns true if the partition has a public transport network.
    pub fn has_transit(&mut self, id: PartitionId) -> bool {
        self.graph(id).is_some_and(|g| g.data().transit.is_some())
    }

    /// Speed cameras on `s`. A camera on a road point belongs to the segment ending there.
    pub fn speed_cameras(&mut self, s: Segment) -> Vec<SpeedCamera> {
        let Some(g) = self.graph(s.partition) else {
            return Vec::new();
        };
        let Some(road) = g.road(s.feature) else {
            return Vec::new();
        };
        let front = s.point_id(true);
        road.speed_cameras
            .iter()
            .filter(|c| c.point == front)
            .copied()
            .collect()
    }

    pub fn speed_camera_policy(&mut self, id: PartitionId) -> SpeedCameraPolicy {
        self.graph(id)
            .map(|g| g.data().speed_cameras)
            .unwrap_or_default()
    }

    /// Directed segments of a partition closest to `point`, with the projections of `point` on them.
    pub fn find_closest_edges(&mut self, id: PartitionId, point: LatLon, count: usize) -> Vec<(Segment, Projection)> {
        self.graph(id)
            .map(|g| g.find_closest_edges(point, count))
            .unwrap_or_default()
    }

    pub fn enters(&mut self, id: PartitionId) -> Vec<Segment> {
        self.cross.enters(id)
    }

    pub fn exits(&mut self, id: PartitionId) -> Vec<Segment> {
        self.cross.exits(id)
    }

    pub fn is_enter(&mut self, s: Segment) -> bool {
        self.cross.is_enter(s)
    }

    pub fn is_exit(&mut self, s: Segment) -> bool {
        self.cross.is_exit(s)
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::estimator::EdgeEstimator;
use crate::store::{CrossSection, PartitionStatus, PartitionStore};
use crate::vehicle::{RoadTypes, VehicleModel};
use crate::{earth_distance, Junction, PartitionId, RouteWeight, Segment};

/// A directed segment crossing into (enter) or out of (exit) a partition
/// through a border node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Transition {
    pub segment: Segment,

    /// The border node: the back of an enter, the front of an exit.
    pub node: i64,

    /// Geometry in the direction of `segment`.
    pub back: Junction,
    pub front: Junction,

    pub is_enter: bool,

    /// Weight of traversing the segment, `None` if it is closed.
    pub weight: Option<RouteWeight>,
}

/// All transitions of one partition.
#[derive(Debug, Default)]
pub(crate) struct Transitions {
    items: Vec<Transition>,
    by_segment: HashMap<(Segment, bool), usize>,
    by_node: HashMap<i64, Vec<usize>>,
}

impl Transitions {
    pub(crate) fn build(
        section: &CrossSection,
        model: &VehicleModel,
        estimator: &EdgeEstimator,
        avoid: RoadTypes,
    ) -> Self {
        let mut t = Self::default();

        for bs in &section.segments {
            let Some(class) = model.road_class(&bs.tags) else {
                continue;
            };
            if RoadTypes::from_tags(&bs.tags).intersects(avoid) {
                continue;
            }

            let (fwd, bwd) = model.way_direction(&bs.tags);
            let dist = earth_distance(bs.back.point, bs.front.point);
            let forward = Segment::new(section.partition, bs.feature, bs.segment, true);

            // A border node at the front of the road direction is left by the forward
            // segment and entered by the backward one; and the other way round.
            let candidates = [
                (fwd, forward, !bs.border_at_front),
                (bwd, forward.reversed(), bs.border_at_front),
            ];

            for (allowed, segment, is_enter) in candidates {
                if !allowed {
                    continue;
                }
                let (back, front) = if segment.forward {
                    (bs.back, bs.front)
                } else {
                    (bs.front, bs.back)
                };
                let weight = estimator
                    .segment_time(segment, dist, class.speed)
                    .map(RouteWeight::new);
                t.push(Transition {
                    segment,
                    node: bs.node,
                    back,
                    front,
                    is_enter,
                    weight,
                });
            }
        }

        return t;
    }

    fn push(&mut self, transition: Transition) {
        let key = (transition.segment, transition.is_enter);
        if self.by_segment.contains_key(&key) {
            return;
        }
        let idx = self.items.len();
        self.by_segment.insert(key, idx);
        self.by_node.entry(transition.node).or_default().push(idx);
        self.items.push(transition);
    }

    pub(crate) fn get(&self, s: Segment, is_enter: bool) -> Option<&Transition> {
        self.by_segment
            .get(&(s, is_enter))
            .and_then(|&idx| self.items.get(idx))
    }

    /// The transition of `s`, regardless of whether it's an enter or an exit.
    pub(crate) fn find(&self, s: Segment) -> Option<&Transition> {
        self.get(s, true).or_else(|| self.get(s, false))
    }

    pub(crate) fn at_node(&self, node: i64) -> impl Iterator<Item = &Transition> {
        self.by_node
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|&idx| self.items.get(idx))
    }

    pub(crate) fn segments(&self, is_enter: bool) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self
            .items
            .iter()
            .filter(|t| t.is_enter == is_enter && t.weight.is_some())
            .map(|t| t.segment)
            .collect();
        segments.sort();
        segments
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

/// Graph of partition borders, built from light cross sections only.
///
/// Twin edges connect an exit of one partition with the enters of neighbouring
/// partitions sharing its border node.
pub(crate) struct CrossPartitionGraph {
    store: Arc<dyn PartitionStore>,
    model: &'static VehicleModel<'static>,
    estimator: Arc<EdgeEstimator>,
    avoid: RoadTypes,
    transitions: HashMap<PartitionId, Arc<Transitions>>,
    neighbors: HashMap<PartitionId, Vec<PartitionId>>,
    unloadable: HashSet<PartitionId>,
}

impl CrossPartitionGraph {
    pub(crate) fn new(
        store: Arc<dyn PartitionStore>,
        model: &'static VehicleModel<'static>,
        estimator: Arc<EdgeEstimator>,
        avoid: RoadTypes,
    ) -> Self {
        Self {
            store,
            model,
            estimator,
            avoid,
            transitions: HashMap::default(),
            neighbors: HashMap::default(),
            unloadable: HashSet::default(),
        }
    }

    /// Transitions of a partition, or `None` if its cross section can't be loaded.
    pub(crate) fn transitions(&mut self, id: PartitionId) -> Option<Arc<Transitions>> {
        if let Some(t) = self.transitions.get(&id) {
            return Some(t.clone());
        }
        if self.unloadable.contains(&id) {
            return None;
        }

        let section = match self.store.cross_section(id) {
            Ok(section) => section,
            Err(e) => {
                log::warn!("partition {id}: cross section not available: {e}");
                self.unloadable.insert(id);
                return None;
            }
        };

        let t = Arc::new(Transitions::build(
            &section,
            self.model,
            &self.estimator,
            self.avoid,
        ));
        log::debug!("partition {id}: {} transitions", t.len());
        self.transitions.insert(id, t.clone());
        return Some(t);
    }

    /// Ready partitions whose bounds touch the bounds of `id`.
    pub(crate) fn neighbors(&mut self, id: PartitionId) -> Vec<PartitionId> {
        if let Some(n) = self.neighbors.get(&id) {
            return n.clone();
        }
        let n: Vec<PartitionId> = self
            .store
            .neighbors(id)
            .into_iter()
            .filter(|&other| self.store.status(other) == Some(PartitionStatus::Ready))
            .collect();
        self.neighbors.insert(id, n.clone());
        return n;
    }

    pub(crate) fn is_enter(&mut self, s: Segment) -> bool {
        s.is_real()
            && self
                .transitions(s.partition)
                .is_some_and(|t| t.get(s, true).is_some())
    }

    pub(crate) fn is_exit(&mut self, s: Segment) -> bool {
        s.is_real()
            && self
                .transitions(s.partition)
                .is_some_and(|t| t.get(s, false).is_some())
    }

    pub(crate) fn enters(&mut self, id: PartitionId) -> Vec<Segment> {
        self.transitions(id)
            .map(|t| t.segments(true))
            .unwrap_or_default()
    }

    pub(crate) fn exits(&mut self, id: PartitionId) -> Vec<Segment> {
        self.transitions(id)
            .map(|t| t.segments(false))
            .unwrap_or_default()
    }

    pub(crate) fn junction(&mut self, s: Segment, front: bool) -> Option<Junction> {
        if s.is_fake() {
            return None;
        }
        let transitions = self.transitions(s.partition)?;
        let t = transitions.find(s)?;
        Some(if front { t.front } else { t.back })
    }

    pub(crate) fn weight(&mut self, s: Segment) -> Option<RouteWeight> {
        if s.is_fake() {
            return None;
        }
        self.transitions(s.partition)?.find(s)?.weight
    }

    /// Twin edges: outgoing edges of an exit lead to the enters of neighbouring
    /// partitions at its border node, ingoing edges of an enter come from
    /// such exits. Both weigh as much as the enter.
    pub(crate) fn twins(&mut self, s: Segment, is_outgoing: bool, out: &mut Vec<(Segment, RouteWeight)>) {
        if s.is_fake() {
            return;
        }
        let Some(own) = self.transitions(s.partition) else {
            return;
        };

        // Outgoing twins start at an exit, ingoing twins end at an enter
        let Some(here) = own.get(s, !is_outgoing) else {
            return;
        };
        let node = here.node;
        let own_weight = here.weight;

        for other in self.neighbors(s.partition) {
            let Some(theirs) = self.transitions(other) else {
                continue;
            };
            for t in theirs.at_node(node) {
                if t.is_enter != is_outgoing {
                    continue;
                }
                let weight = if is_outgoing { t.weight } else { own_weight };
                if let Some(w) = weight {
                    out.push((t.segment, w));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{grid_node, two_partitions, GRID_SIZE, WEST_BASE};
    use crate::vehicle::CAR_MODEL;
    use crate::VehicleType;

    fn graph() -> CrossPartitionGraph {
        CrossPartitionGraph::new(
            Arc::new(two_partitions()),
            &CAR_MODEL,
            Arc::new(EdgeEstimator::new(VehicleType::Car, None)),
            RoadTypes::NONE,
        )
    }

    #[test]
    fn enters_and_exits_on_both_sides() {
        let mut g = graph();

        // Row roads cross the border in both directions. The western column road
        // runs along the border, so each of its directed segments is both an enter and an exit.
        let along_border = 2 * (GRID_SIZE - 1);
        assert_eq!(g.exits(0).len(), GRID_SIZE + along_border);
        assert_eq!(g.enters(0).len(), GRID_SIZE + along_border);
        assert_eq!(g.exits(1).len(), GRID_SIZE);
        assert_eq!(g.enters(1).len(), GRID_SIZE);
        assert_eq!(g.neighbors(0), vec![1]);
    }

    #[test]
    fn twins_share_border_node() {
        let mut g = graph();
        let border = grid_node(WEST_BASE, 2, GRID_SIZE - 1);

        for exit in g.exits(0) {
            let t = g.transitions(0).unwrap();
            let node = t.get(exit, false).unwrap().node;
            if node != border {
                continue;
            }

            let mut twins = Vec::new();
            g.twins(exit, true, &mut twins);
            assert!(!twins.is_empty());
            for (enter, w) in twins {
                assert_eq!(enter.partition, 1);
                assert!(g.is_enter(enter));
                let theirs = g.transitions(1).unwrap();
                assert_eq!(theirs.get(enter, true).unwrap().node, border);
                assert_eq!(Some(w), g.weight(enter));

                // And back again through the ingoing twins of the enter
                let mut back = Vec::new();
                g.twins(enter, false, &mut back);
                assert!(back.iter().any(|&(x, bw)| x == exit && bw == w));
            }
        }
    }

    #[test]
    fn enter_geometry_starts_at_border() {
        let mut g = graph();
        for enter in g.enters(1) {
            let t = g.transitions(1).unwrap();
            let tr = t.get(enter, true).unwrap();
            assert_eq!(g.junction(enter, false), Some(tr.back));
            assert!(tr.back.point.lon < tr.front.point.lon);
        }
    }
}

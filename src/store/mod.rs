// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Boundary with the partitioned road graph data.

use std::collections::HashMap;
use std::sync::Arc;

use crate::distance::project_onto_segment;
use crate::{LatLon, PartitionId};

pub mod osm;
mod partition;

pub use partition::{
    BorderSegment, CrossSection, Partition, Rect, Restriction, Road, SpeedCamera,
    SpeedCameraPolicy, TransitInfo, TransitSection,
};

/// Radius around a query point in which roads are looked for, in meters.
pub const SNAP_RADIUS: f64 = 100.0;

/// Availability of a partition's routing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionStatus {
    Ready,

    /// Known, but not downloaded.
    Absent,

    /// Downloaded, but in an unsupported (too old) version.
    Outdated,
}

/// Errors raised when accessing partition data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown partition {0}")]
    UnknownPartition(PartitionId),

    #[error("partition {0:?} has no routing data")]
    NoRoutingData(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Source of per-partition routing graphs.
pub trait PartitionStore {
    /// All known partitions, in ascending order.
    fn ids(&self) -> Vec<PartitionId>;

    fn name(&self, id: PartitionId) -> Option<&str>;

    fn status(&self, id: PartitionId) -> Option<PartitionStatus>;

    fn bounds(&self, id: PartitionId) -> Option<Rect>;

    /// Partition covering the provided point, or having a road within
    /// [SNAP_RADIUS] of it.
    fn partition_at(&self, point: LatLon) -> Option<PartitionId>;

    /// Loads the full routing graph of a partition.
    fn load(&self, id: PartitionId) -> Result<Arc<Partition>, Error>;

    /// Loads the light cross-partition section of a partition.
    fn cross_section(&self, id: PartitionId) -> Result<Arc<CrossSection>, Error>;

    /// Partitions whose bounds intersect the bounds of `id`, excluding `id` itself.
    fn neighbors(&self, id: PartitionId) -> Vec<PartitionId> {
        let Some(rect) = self.bounds(id) else {
            return Vec::new();
        };
        self.ids()
            .into_iter()
            .filter(|&other| other != id)
            .filter(|&other| self.bounds(other).is_some_and(|r| r.intersects(&rect)))
            .collect()
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    status: PartitionStatus,
    bounds: Rect,
    data: Option<Arc<Partition>>,
    cross: Option<Arc<CrossSection>>,
}

/// [PartitionStore] keeping all partitions in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<Entry>,
}

/// Builds a [MemoryStore], detecting border nodes shared between partitions.
#[derive(Debug, Default)]
pub struct StoreBuilder {
    partitions: Vec<(Partition, PartitionStatus)>,
    absent: Vec<(String, Rect)>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a partition with routing data. Ids are assigned in insertion order,
    /// starting with partitions with data, followed by absent ones.
    pub fn add(&mut self, partition: Partition) -> PartitionId {
        self.partitions.push((partition, PartitionStatus::Ready));
        (self.partitions.len() - 1) as PartitionId
    }

    /// Adds a partition whose data is in an unsupported version.
    pub fn add_outdated(&mut self, partition: Partition) -> PartitionId {
        self.partitions.push((partition, PartitionStatus::Outdated));
        (self.partitions.len() - 1) as PartitionId
    }

    /// Registers a known, but not downloaded partition.
    pub fn add_absent(&mut self, name: impl Into<String>, bounds: Rect) {
        self.absent.push((name.into(), bounds));
    }

    pub fn build(mut self) -> MemoryStore {
        for (partition, _) in &mut self.partitions {
            let name = &partition.name;
            partition.roads.retain(|r| {
                let ok = r.nodes.len() == r.points.len() && r.points.len() > 1;
                if !ok {
                    log::warn!(
                        "{name}: dropping road {} with {} nodes and {} points",
                        r.id,
                        r.nodes.len(),
                        r.points.len(),
                    );
                }
                ok
            });
        }

        // Nodes referenced by more than one partition are border nodes
        let mut node_partitions: HashMap<i64, Vec<usize>> = HashMap::new();
        for (idx, (partition, _)) in self.partitions.iter().enumerate() {
            for road in &partition.roads {
                for &node in &road.nodes {
                    let owners = node_partitions.entry(node).or_default();
                    if !owners.contains(&idx) {
                        owners.push(idx);
                    }
                }
            }
        }

        let mut entries = Vec::with_capacity(self.partitions.len() + self.absent.len());
        for (idx, (mut partition, status)) in self.partitions.into_iter().enumerate() {
            partition.border_nodes = partition
                .roads
                .iter()
                .flat_map(|r| r.nodes.iter().copied())
                .filter(|n| node_partitions.get(n).is_some_and(|owners| owners.len() > 1))
                .collect();

            let id = idx as PartitionId;
            let cross = CrossSection::build(id, &partition);
            entries.push(Entry {
                name: partition.name.clone(),
                status,
                bounds: partition.bounds(),
                data: Some(Arc::new(partition)),
                cross: Some(Arc::new(cross)),
            });
        }

        for (name, bounds) in self.absent {
            entries.push(Entry {
                name,
                status: PartitionStatus::Absent,
                bounds,
                data: None,
                cross: None,
            });
        }

        MemoryStore { entries }
    }
}

impl MemoryStore {
    fn entry(&self, id: PartitionId) -> Result<&Entry, Error> {
        self.entries
            .get(id as usize)
            .ok_or(Error::UnknownPartition(id))
    }

    /// Distance from `point` to the closest road segment of a partition.
    fn distance_to_roads(&self, id: PartitionId, point: LatLon) -> f64 {
        self.entries
            .get(id as usize)
            .and_then(|e| e.data.as_ref())
            .map(|data| {
                data.roads
                    .iter()
                    .flat_map(|r| r.points.windows(2))
                    .map(|w| project_onto_segment(point, w[0].point, w[1].point).squared_distance)
                    .fold(f64::INFINITY, f64::min)
                    .sqrt()
            })
            .unwrap_or(f64::INFINITY)
    }

    /// Picks the partition with the closest road, then the lowest id.
    fn closest(&self, candidates: Vec<PartitionId>, point: LatLon) -> Option<PartitionId> {
        if candidates.len() < 2 {
            return candidates.first().copied();
        }
        return candidates.into_iter().min_by(|&a, &b| {
            self.distance_to_roads(a, point)
                .total_cmp(&self.distance_to_roads(b, point))
                .then(a.cmp(&b))
        });
    }
}

impl PartitionStore for MemoryStore {
    fn ids(&self) -> Vec<PartitionId> {
        (0..self.entries.len() as PartitionId).collect()
    }

    fn name(&self, id: PartitionId) -> Option<&str> {
        self.entries.get(id as usize).map(|e| e.name.as_str())
    }

    fn status(&self, id: PartitionId) -> Option<PartitionStatus> {
        self.entries.get(id as usize).map(|e| e.status)
    }

    fn bounds(&self, id: PartitionId) -> Option<Rect> {
        self.entries.get(id as usize).map(|e| e.bounds)
    }

    fn partition_at(&self, point: LatLon) -> Option<PartitionId> {
        let inside: Vec<PartitionId> = self
            .ids()
            .into_iter()
            .filter(|&id| self.entries[id as usize].bounds.contains(point))
            .collect();
        if !inside.is_empty() {
            return self.closest(inside, point);
        }

        // Points just outside of the road bounds can still be snapped to a road
        let nearby: Vec<PartitionId> = self
            .ids()
            .into_iter()
            .filter(|&id| self.entries[id as usize].bounds.expanded(SNAP_RADIUS).contains(point))
            .filter(|&id| self.distance_to_roads(id, point) <= SNAP_RADIUS)
            .collect();
        return self.closest(nearby, point);
    }

    fn load(&self, id: PartitionId) -> Result<Arc<Partition>, Error> {
        let entry = self.entry(id)?;
        entry
            .data
            .clone()
            .ok_or_else(|| Error::NoRoutingData(entry.name.clone()))
    }

    fn cross_section(&self, id: PartitionId) -> Result<Arc<CrossSection>, Error> {
        let entry = self.entry(id)?;
        entry
            .cross
            .clone()
            .ok_or_else(|| Error::NoRoutingData(entry.name.clone()))
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::distance::EARTH_RADIUS;
use crate::{Junction, LatLon, PartitionId};

/// Routing data of one partition of the road network.
///
/// Roads are indexed by their position in [Partition::roads] (the "feature index"),
/// road points by their position in [Road::points]. Roads crossing a partition
/// border are clipped at a node shared by both partitions - a border node.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub name: String,
    pub roads: Vec<Road>,
    pub restrictions: Vec<Restriction>,

    /// Nodes with barriers (gates, bollards, ...).
    pub barriers: HashSet<i64>,

    /// Nodes shared with other partitions. Filled in by the [StoreBuilder](super::StoreBuilder).
    pub border_nodes: HashSet<i64>,

    /// Public transport data, absent in partitions without a transit network.
    pub transit: Option<TransitSection>,

    pub speed_cameras: SpeedCameraPolicy,
}

/// A routable way.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    /// Identifier of the road in the source data.
    pub id: i64,
    pub tags: HashMap<String, String>,

    /// Node ids of every road point; nodes shared between roads form junctions.
    pub nodes: Vec<i64>,
    pub points: Vec<Junction>,
    pub speed_cameras: Vec<SpeedCamera>,
}

impl Road {
    pub fn name(&self) -> Option<&str> {
        self.tags
            .get("name")
            .or_else(|| self.tags.get("ref"))
            .map(|v| v.as_str())
    }

    pub fn num_segments(&self) -> u32 {
        self.points.len().saturating_sub(1) as u32
    }
}

/// A speed camera located on a road point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedCamera {
    pub point: u32,

    /// Enforced speed in km/h, if known.
    pub max_speed: Option<u16>,
}

/// Whether speed camera data may be shown inside a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedCameraPolicy {
    #[default]
    Allowed,
    PartlyProhibited,
    Prohibited,
}

/// A turn restriction from one road to another through a via node.
///
/// Kept with the raw relation tags, as applicability depends on the vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Restriction {
    pub tags: HashMap<String, String>,
    pub from: u32,
    pub via: i64,
    pub to: u32,
}

/// Public transport lines of a partition, keyed by feature index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitSection {
    pub lines: HashMap<u32, TransitInfo>,
}

/// Description of a public transport line using a road.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitInfo {
    /// Transport mode, e.g. "subway" or "tram".
    pub mode: String,

    /// Human readable line name or number.
    pub line: String,
}

/// Geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: LatLon,
    pub max: LatLon,
}

impl Rect {
    pub const EMPTY: Self = Self {
        min: LatLon::new(f64::INFINITY, f64::INFINITY),
        max: LatLon::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    pub fn new(min: LatLon, max: LatLon) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.lat > self.max.lat || self.min.lon > self.max.lon
    }

    pub fn add(&mut self, p: LatLon) {
        self.min.lat = self.min.lat.min(p.lat);
        self.min.lon = self.min.lon.min(p.lon);
        self.max.lat = self.max.lat.max(p.lat);
        self.max.lon = self.max.lon.max(p.lon);
    }

    /// The rectangle grown by `meters` on every side.
    pub fn expanded(&self, meters: f64) -> Self {
        if self.is_empty() {
            return *self;
        }
        let d_lat = (meters / EARTH_RADIUS).to_degrees();
        let widest = self.min.lat.abs().max(self.max.lat.abs()).min(89.0);
        let d_lon = d_lat / widest.to_radians().cos();
        return Self {
            min: LatLon::new(self.min.lat - d_lat, self.min.lon - d_lon),
            max: LatLon::new(self.max.lat + d_lat, self.max.lon + d_lon),
        };
    }

    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.min.lat && p.lat <= self.max.lat && p.lon >= self.min.lon && p.lon <= self.max.lon
    }

    /// Rectangles sharing only an edge or a corner also intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.lat <= other.max.lat
            && other.min.lat <= self.max.lat
            && self.min.lon <= other.max.lon
            && other.min.lon <= self.max.lon
    }
}

/// One road segment touching a border node, in the light cross-partition section.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSegment {
    pub feature: u32,
    pub segment: u32,

    /// Whether the border node is at `segment + 1` (as opposed to `segment`).
    pub border_at_front: bool,
    pub node: i64,

    /// Geometry in the road's forward direction.
    pub back: Junction,
    pub front: Junction,
    pub tags: Arc<HashMap<String, String>>,
}

/// Light per-partition section with just the segments touching border nodes.
///
/// Lets the long-distance leap search move between partitions
/// without loading their full routing graphs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossSection {
    pub partition: PartitionId,
    pub segments: Vec<BorderSegment>,
}

impl CrossSection {
    pub fn build(partition: PartitionId, data: &Partition) -> Self {
        let mut segments = Vec::new();

        for (feature, road) in data.roads.iter().enumerate() {
            let tags = Arc::new(road.tags.clone());
            let pairs = road.nodes.windows(2).zip(road.points.windows(2));
            for (segment, (nodes, points)) in pairs.enumerate() {
                for (node, border_at_front) in [(nodes[0], false), (nodes[1], true)] {
                    if data.border_nodes.contains(&node) {
                        segments.push(BorderSegment {
                            feature: feature as u32,
                            segment: segment as u32,
                            border_at_front,
                            node,
                            back: points[0],
                            front: points[1],
                            tags: tags.clone(),
                        });
                    }
                }
            }
        }

        Self {
            partition,
            segments,
        }
    }
}

impl Partition {
    /// Bounding box of all road points.
    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::EMPTY;
        for road in &self.roads {
            for point in &road.points {
                rect.add(point.point);
            }
        }
        return rect;
    }
}

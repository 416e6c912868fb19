// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::store::{SpeedCamera, TransitInfo};
use crate::vehicle::RoadTypes;
use crate::{Junction, LatLon, Segment};

/// One traversed segment of a [Route], annotated for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    /// The traversed segment. Fake segments stand for parts of real ones
    /// and for connections with the query points.
    pub segment: Segment,

    /// The junction at the end of the segment.
    pub junction: Junction,

    /// Time from the start of the route to `junction`, in seconds.
    pub time: f64,

    /// Distance from the start of the route to `junction`, in meters.
    pub distance: f64,

    pub road_types: RoadTypes,
    pub speed_cameras: Vec<SpeedCamera>,
    pub transit: Option<TransitInfo>,
    pub road_name: Option<String>,
}

/// A leg of a [Route] between two consecutive checkpoints.
///
/// `begin..end` indexes [Route::segments]; passed legs have `begin == end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubrouteAttrs {
    pub start: Junction,
    pub finish: Junction,
    pub begin: usize,
    pub end: usize,
}

impl SubrouteAttrs {
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    TurnLeft,
    TurnRight,
    UTurn,
    ReachedYourDestination,
}

/// A maneuver at the junction ending the `index`-th segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnItem {
    pub index: usize,
    pub direction: TurnDirection,
}

/// A computed route: geometry, timing and annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    /// Name of the router which computed the route.
    pub name: String,

    /// Junctions along the route, one more than there are segments.
    pub junctions: Vec<Junction>,

    /// Time from the start to each of the junctions, in seconds.
    pub times: Vec<f64>,

    pub segments: Vec<RouteSegment>,
    pub subroutes: Vec<SubrouteAttrs>,
    pub current_subroute: usize,

    /// Names of partitions which are needed, but not downloaded.
    pub absent_partitions: Vec<String>,

    /// Names of partitions where only some speed cameras can be shown.
    pub speed_cam_partly_prohibited: Vec<String>,

    pub turns: Vec<TurnItem>,
}

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Expected travel time, in seconds.
    pub fn total_time(&self) -> f64 {
        self.times.last().copied().unwrap_or_default()
    }

    /// Length of the route, in meters.
    pub fn total_distance(&self) -> f64 {
        self.segments.last().map(|s| s.distance).unwrap_or_default()
    }

    /// A route is valid if it has at least two junctions and times never decrease.
    pub fn is_valid(&self) -> bool {
        self.junctions.len() >= 2
            && self.times.len() == self.junctions.len()
            && self.times.windows(2).all(|t| t[0] <= t[1])
    }

    pub fn polyline(&self) -> Vec<LatLon> {
        self.junctions.iter().map(|j| j.point).collect()
    }

    pub fn start(&self) -> Option<LatLon> {
        self.junctions.first().map(|j| j.point)
    }

    pub fn finish(&self) -> Option<LatLon> {
        self.junctions.last().map(|j| j.point)
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Identifier of a loadable partition of the road network.
pub type PartitionId = u32;

/// Reserved [PartitionId] of synthetic (fake) segments.
pub const FAKE_PARTITION_ID: PartitionId = PartitionId::MAX;

/// Default altitude, used when the data doesn't provide one.
pub const DEFAULT_ALTITUDE: i16 = 0;

/// A geographic position, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A 3D vertex between two segments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Junction {
    pub point: LatLon,

    /// Altitude in meters.
    pub altitude: i16,
}

impl Junction {
    pub const fn new(point: LatLon, altitude: i16) -> Self {
        Self { point, altitude }
    }

    pub const fn flat(point: LatLon) -> Self {
        Self {
            point,
            altitude: DEFAULT_ALTITUDE,
        }
    }
}

/// One directed traversable unit of a road: the part between
/// road points `segment` and `segment + 1` of feature `feature`.
///
/// Segments are plain values; all geometry is looked up through
/// the [WorldGraph](crate::WorldGraph) which owns loaded partitions.
/// Fake segments have `partition == FAKE_PARTITION_ID` and store
/// their fake id in `feature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    pub partition: PartitionId,
    pub feature: u32,
    pub segment: u32,
    pub forward: bool,
}

impl Segment {
    pub const fn new(partition: PartitionId, feature: u32, segment: u32, forward: bool) -> Self {
        Self {
            partition,
            feature,
            segment,
            forward,
        }
    }

    pub const fn fake(id: u32) -> Self {
        Self {
            partition: FAKE_PARTITION_ID,
            feature: id,
            segment: 0,
            forward: true,
        }
    }

    pub const fn is_fake(&self) -> bool {
        self.partition == FAKE_PARTITION_ID
    }

    pub const fn is_real(&self) -> bool {
        !self.is_fake()
    }

    /// Index of the road point at the front (`front == true`) or the back of the segment.
    pub const fn point_id(&self, front: bool) -> u32 {
        if self.forward == front {
            self.segment + 1
        } else {
            self.segment
        }
    }

    /// The same road stretch, traversed in the opposite direction.
    pub const fn reversed(&self) -> Self {
        Self {
            forward: !self.forward,
            ..*self
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_fake() {
            write!(f, "fake#{}", self.feature)
        } else {
            write!(
                f,
                "{}/{}/{}{}",
                self.partition,
                self.feature,
                self.segment,
                if self.forward { "+" } else { "-" }
            )
        }
    }
}

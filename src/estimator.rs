// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::{earth_distance, LatLon, Segment, VehicleType};

/// Coarse live-traffic speed class of a segment, as a share of the free-flow speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedGroup {
    G0,
    G1,
    G2,
    G3,
    G4,
    G5,

    /// The segment is temporarily closed.
    TempBlock,

    Unknown,
}

impl SpeedGroup {
    /// Multiplier of the free-flow speed, or `None` if the segment is closed.
    pub fn factor(self) -> Option<f64> {
        match self {
            Self::G0 => Some(0.08),
            Self::G1 => Some(0.16),
            Self::G2 => Some(0.33),
            Self::G3 => Some(0.58),
            Self::G4 => Some(0.83),
            Self::G5 | Self::Unknown => Some(1.0),
            Self::TempBlock => None,
        }
    }
}

/// Live-traffic speed classes keyed by real segment.
#[derive(Debug, Clone, Default)]
pub struct TrafficCache {
    speeds: HashMap<Segment, SpeedGroup>,
}

impl TrafficCache {
    pub fn set(&mut self, segment: Segment, group: SpeedGroup) {
        self.speeds.insert(segment, group);
    }

    pub fn get(&self, segment: Segment) -> SpeedGroup {
        self.speeds
            .get(&segment)
            .copied()
            .unwrap_or(SpeedGroup::Unknown)
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }
}

/// Converts distances and road speeds into travel times (seconds) for one vehicle.
#[derive(Debug, Clone)]
pub struct EdgeEstimator {
    vehicle: VehicleType,

    /// Fastest speed of any road, in m/s; used for admissible heuristics.
    max_speed: f64,

    /// Speed between a query point and the road network, in m/s.
    offroad_speed: f64,

    traffic: Option<Arc<TrafficCache>>,
}

impl EdgeEstimator {
    pub fn new(vehicle: VehicleType, traffic: Option<Arc<TrafficCache>>) -> Self {
        let model = vehicle.model();
        Self {
            vehicle,
            max_speed: kmph_to_mps(model.max_speed()),
            offroad_speed: kmph_to_mps(model.offroad_speed),
            // Live traffic is only meaningful for cars.
            traffic: if vehicle == VehicleType::Car {
                traffic
            } else {
                None
            },
        }
    }

    pub fn vehicle(&self) -> VehicleType {
        self.vehicle
    }

    /// Time of traversing `distance` meters of a real segment with free-flow `speed` (km/h),
    /// adjusted by live traffic. Returns `None` for closed segments.
    pub fn segment_time(&self, segment: Segment, distance: f64, speed: f64) -> Option<f64> {
        let factor = match &self.traffic {
            Some(traffic) => traffic.get(segment).factor()?,
            None => 1.0,
        };
        return Some(distance / (kmph_to_mps(speed) * factor));
    }

    /// Free-flow time of traversing `distance` meters with `speed` (km/h), ignoring traffic.
    pub fn free_flow_time(&self, distance: f64, speed: f64) -> f64 {
        distance / kmph_to_mps(speed)
    }

    /// Time of moving between a query point and the road network.
    pub fn offroad_time(&self, from: LatLon, to: LatLon) -> f64 {
        earth_distance(from, to) / self.offroad_speed
    }

    /// Lower bound of the travel time between two points.
    pub fn heuristic(&self, from: LatLon, to: LatLon) -> f64 {
        earth_distance(from, to) / self.max_speed
    }

    /// Rough estimate of the travel time between two far-away points,
    /// used to connect query points with partition borders in leap searches.
    pub fn leap_estimate(&self, from: LatLon, to: LatLon) -> f64 {
        earth_distance(from, to) / (self.max_speed * 0.5)
    }

    /// Extra time of passing a barrier (gate, bollard, ...).
    pub fn barrier_penalty(&self) -> f64 {
        match self.vehicle {
            VehicleType::Car => 60.0,
            VehicleType::Bicycle => 10.0,
            VehicleType::Pedestrian | VehicleType::Transit => 0.0,
        }
    }

    /// Extra time of boarding a public transport line.
    pub fn transfer_penalty(&self) -> f64 {
        match self.vehicle {
            VehicleType::Transit => 120.0,
            _ => 0.0,
        }
    }
}

fn kmph_to_mps(speed: f64) -> f64 {
    speed * 1000.0 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b) as f64).abs() < 1e-6,
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    #[test]
    fn segment_time_with_traffic() {
        let s = Segment::new(0, 1, 0, true);
        let mut traffic = TrafficCache::default();
        traffic.set(s, SpeedGroup::G3);
        traffic.set(s.reversed(), SpeedGroup::TempBlock);
        let traffic = Arc::new(traffic);

        let car = EdgeEstimator::new(VehicleType::Car, Some(traffic.clone()));
        assert_almost_eq!(car.segment_time(s, 1000.0, 36.0).unwrap(), 100.0 / 0.58);
        assert_eq!(car.segment_time(s.reversed(), 1000.0, 36.0), None);
        assert_almost_eq!(
            car.segment_time(Segment::new(0, 2, 0, true), 1000.0, 36.0).unwrap(),
            100.0
        );

        let bike = EdgeEstimator::new(VehicleType::Bicycle, Some(traffic));
        assert_almost_eq!(bike.segment_time(s.reversed(), 1000.0, 36.0).unwrap(), 100.0);
    }

    #[test]
    fn heuristic_is_a_lower_bound() {
        let e = EdgeEstimator::new(VehicleType::Car, None);
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 0.01);
        let fastest = e.free_flow_time(earth_distance(a, b), VehicleType::Car.model().max_speed());
        assert_almost_eq!(e.heuristic(a, b), fastest);
        assert!(e.leap_estimate(a, b) > e.heuristic(a, b));
        assert!(e.offroad_time(a, b) > e.heuristic(a, b));
    }
}

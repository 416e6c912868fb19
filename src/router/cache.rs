// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::ops::Range;

use crate::starter::{FakeEdges, RouteView};
use crate::{earth_distance, LatLon, RouteWeight, Segment};

/// One segment of a cached route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStep {
    pub segment: Segment,

    /// Weight of traversing the segment.
    pub weight: RouteWeight,

    /// The front point of the segment.
    pub point: LatLon,
}

/// The last successfully computed route, kept to be adjusted
/// when the start moves along it.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCache {
    pub start: LatLon,
    pub finish: LatLon,
    pub steps: Vec<RouteStep>,

    /// Ranges of `steps` between consecutive checkpoints.
    pub legs: Vec<Range<usize>>,

    /// Fake segments used by `steps`.
    pub fake: FakeEdges,
}

impl RouteCache {
    pub(crate) fn build(
        view: &mut RouteView<'_>,
        path: &[Segment],
        legs: Vec<Range<usize>>,
        start: LatLon,
        finish: LatLon,
        fake: FakeEdges,
    ) -> Self {
        let steps = path
            .iter()
            .map(|&segment| RouteStep {
                segment,
                weight: view.weight(segment).unwrap_or(RouteWeight::ZERO),
                point: view.point(segment, true).unwrap_or(start),
            })
            .collect();

        Self {
            start,
            finish,
            steps,
            legs,
            fake,
        }
    }

    /// Crow-flies distance between `point` and the closest point of the route, in meters.
    pub fn distance_to(&self, point: LatLon) -> f64 {
        self.steps
            .iter()
            .map(|s| earth_distance(s.point, point))
            .fold(f64::INFINITY, f64::min)
    }

    /// Steps of the `i`-th leg.
    pub fn leg(&self, i: usize) -> &[RouteStep] {
        self.legs
            .get(i)
            .and_then(|r| self.steps.get(r.clone()))
            .unwrap_or_default()
    }
}

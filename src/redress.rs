// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Conversion of found segment paths into annotated [Routes](Route).

use std::ops::Range;

use crate::delegate::RouterDelegate;
use crate::distance::bearing;
use crate::route::{Route, RouteSegment, SubrouteAttrs, TurnDirection, TurnItem};
use crate::router::RouterResultCode;
use crate::starter::RouteView;
use crate::store::SpeedCameraPolicy;
use crate::{earth_distance, Junction, Segment, VehicleType};

/// Errors of a [DirectionsEngine].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectionsError {
    #[error("route has {0} junctions, at least 2 are required")]
    TooFewJunctions(usize),

    #[error("cancelled")]
    Cancelled,
}

/// Generator of turn instructions for a route.
pub trait DirectionsEngine {
    fn generate(
        &mut self,
        junctions: &[Junction],
        cancelled: &dyn Fn() -> bool,
    ) -> Result<Vec<TurnItem>, DirectionsError>;

    /// Drops any state kept between routes.
    fn clear(&mut self);
}

/// Generates turns from changes of the bearing between consecutive segments.
#[derive(Debug, Default, Clone)]
pub struct GeometryDirections {
    last: Vec<TurnItem>,
}

impl GeometryDirections {
    /// Smallest change of bearing (in degrees) reported as a turn.
    pub const TURN_ANGLE: f64 = 30.0;

    /// Smallest change of bearing (in degrees) reported as a U-turn.
    pub const U_TURN_ANGLE: f64 = 150.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Turns generated for the last route.
    pub fn last(&self) -> &[TurnItem] {
        &self.last
    }
}

impl DirectionsEngine for GeometryDirections {
    fn generate(
        &mut self,
        junctions: &[Junction],
        cancelled: &dyn Fn() -> bool,
    ) -> Result<Vec<TurnItem>, DirectionsError> {
        if junctions.len() < 2 {
            return Err(DirectionsError::TooFewJunctions(junctions.len()));
        }

        let mut turns = Vec::new();
        let mut incoming: Option<f64> = None;
        for (i, pair) in junctions.windows(2).enumerate() {
            if i % 64 == 0 && cancelled() {
                return Err(DirectionsError::Cancelled);
            }
            let (a, b) = (pair[0].point, pair[1].point);
            if a == b {
                continue;
            }

            let outgoing = bearing(a, b);
            if let Some(incoming) = incoming {
                // Positive deltas turn clockwise, i.e. right
                let mut delta = outgoing - incoming;
                if delta > 180.0 {
                    delta -= 360.0;
                } else if delta <= -180.0 {
                    delta += 360.0;
                }

                let direction = if delta.abs() > Self::U_TURN_ANGLE {
                    Some(TurnDirection::UTurn)
                } else if delta > Self::TURN_ANGLE {
                    Some(TurnDirection::TurnRight)
                } else if delta < -Self::TURN_ANGLE {
                    Some(TurnDirection::TurnLeft)
                } else {
                    None
                };

                // The turn happens at the end of the previous segment
                if let Some(direction) = direction {
                    turns.push(TurnItem { index: i - 1, direction });
                }
            }
            incoming = Some(outgoing);
        }

        turns.push(TurnItem {
            index: junctions.len() - 2,
            direction: TurnDirection::ReachedYourDestination,
        });

        self.last = turns.clone();
        return Ok(turns);
    }

    fn clear(&mut self) {
        self.last.clear();
    }
}

/// Builds a [Route] from a found path.
///
/// `legs` are ranges of `path` belonging to consecutive checkpoint pairs; `passed`
/// empty legs are recorded before them.
pub fn redress_route(
    view: &mut RouteView<'_>,
    path: &[Segment],
    legs: &[Range<usize>],
    passed: usize,
    directions: Option<&mut dyn DirectionsEngine>,
    delegate: &dyn RouterDelegate,
    name: &str,
) -> Result<Route, RouterResultCode> {
    let mut route = Route::new(name);
    let vehicle = view.world().vehicle();

    if let Some(first) = view.route_junction(path, 0) {
        route.junctions.push(first);
        route.times.push(0.0);
    }

    let mut time = 0.0;
    let mut distance = 0.0;
    for (i, &s) in path.iter().enumerate() {
        let (Some(back), Some(front)) = (view.junction(s, false), view.junction(s, true)) else {
            log::error!("no geometry of segment {s} (at {i})");
            return Err(RouterResultCode::RouteNotFoundRedressRouteError);
        };

        // The first segment only leads to the start of the route
        if i > 0 {
            time += view.eta(s);
            distance += earth_distance(back.point, front.point);
        }

        let mut segment = RouteSegment {
            segment: s,
            junction: front,
            time,
            distance,
            road_types: Default::default(),
            speed_cameras: Vec::new(),
            transit: None,
            road_name: None,
        };

        if let Some(real) = view.convert_to_real(s) {
            let world = view.world();
            if vehicle == VehicleType::Car {
                segment.road_types = world.road_types(real);
            }
            if vehicle == VehicleType::Transit {
                segment.transit = world.transit_info(real);
            }
            segment.road_name = world.road_name(real);

            if s.is_real() {
                match world.speed_camera_policy(s.partition) {
                    SpeedCameraPolicy::Prohibited => {}
                    SpeedCameraPolicy::Allowed => segment.speed_cameras = world.speed_cameras(s),
                    SpeedCameraPolicy::PartlyProhibited => {
                        segment.speed_cameras = world.speed_cameras(s);
                        if let Some(name) = world.store().name(s.partition) {
                            if !route.speed_cam_partly_prohibited.iter().any(|n| n == name) {
                                route.speed_cam_partly_prohibited.push(name.to_string());
                            }
                        }
                    }
                }
            }
        }

        route.junctions.push(front);
        route.times.push(time);
        route.segments.push(segment);
    }

    let start = route.junctions.first().copied().unwrap_or_default();
    for _ in 0..passed {
        route.subroutes.push(SubrouteAttrs {
            start,
            finish: start,
            begin: 0,
            end: 0,
        });
    }
    for leg in legs {
        route.subroutes.push(SubrouteAttrs {
            start: route.junctions.get(leg.start).copied().unwrap_or_default(),
            finish: route.junctions.get(leg.end).copied().unwrap_or_default(),
            begin: leg.start,
            end: leg.end,
        });
    }
    route.current_subroute = passed;

    let cancelled = || delegate.is_cancelled();
    if let Some(engine) = directions {
        match engine.generate(&route.junctions, &cancelled) {
            Ok(turns) => route.turns = turns,
            Err(e) => log::warn!("failed to generate directions: {e}"),
        }
    }

    if delegate.is_cancelled() {
        return Err(RouterResultCode::Cancelled);
    }
    if !route.is_valid() {
        log::error!(
            "invalid route: {} junctions, {} times",
            route.junctions.len(),
            route.times.len(),
        );
        return Err(RouterResultCode::RouteNotFoundRedressRouteError);
    }

    return Ok(route);
}

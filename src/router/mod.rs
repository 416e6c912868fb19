// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Top-level orchestration of a route calculation.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use crate::astar::SubProgress;
use crate::checkpoints::{Checkpoints, CheckpointsError};
use crate::delegate::{NoopDelegate, RouterDelegate};
use crate::estimator::TrafficCache;
use crate::leaps::process_leaps;
use crate::redress::{redress_route, DirectionsEngine, GeometryDirections};
use crate::route::Route;
use crate::starter::{make_fake_ending, FakeEdges, FakeEnding, RouteStarter, RouteView};
use crate::store::{PartitionStatus, PartitionStore, Rect};
use crate::vehicle::RoadTypes;
use crate::world::{WorldGraph, WorldGraphMode};
use crate::{earth_distance, LatLon, PartitionId, RouteWeight, Segment, VehicleType};

mod cache;
mod code;
mod search;
mod snapping;

pub use cache::{RouteCache, RouteStep};
pub use code::RouterResultCode;
pub use search::{adjust_path, find_path, SearchContext};
pub use snapping::{find_best_segment, is_dead_end, BestEdgeComparator, BestSegment};

/// Errors of the [Router::route_between] convenience wrapper.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Checkpoints(#[from] CheckpointsError),

    #[error("{0}")]
    Route(RouterResultCode),
}

/// Tuned constants of the [Router].
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Number of nearest segments considered when snapping a checkpoint.
    pub max_candidates: usize,

    /// Segments from which fewer distinct segments are reachable are dead ends.
    pub dead_end_limit: usize,

    /// Minimal cosine between a segment and the direction of movement for the
    /// segment to be preferred at the start.
    pub codirectional_cos: f64,

    /// Settled vertices between cancellation checks.
    pub visit_period: u32,
    pub visit_period_for_leaps: u32,

    /// Minimal progress change reported to the delegate.
    pub progress_interval: f64,

    /// Share of the progress of a leg spent on finding leaps.
    pub leaps_contribution: f64,

    /// The start must be at most this far from the last route (in meters) to adjust it.
    pub adjust_range_m: f64,

    /// Routes are only adjusted if the finish is at least this far away (in meters).
    pub min_distance_to_finish_m: f64,

    /// Maximal weight (in seconds) of a detour joining the last route.
    pub adjust_limit_s: f64,

    /// Failed leaps are only widened to exits closer than this (in meters).
    pub min_dist_between_exits_m: f64,

    /// Routes weigh at most `max_weight_base_s + max_weight_factor × crow-flies time`.
    pub max_weight_base_s: f64,
    pub max_weight_factor: f64,

    /// Road types avoided by cars.
    pub avoid: RoadTypes,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_candidates: 12,
            dead_end_limit: 50,
            codirectional_cos: 0.97,
            visit_period: 40,
            visit_period_for_leaps: 10,
            progress_interval: 0.005,
            leaps_contribution: 0.15,
            adjust_range_m: 5000.0,
            min_distance_to_finish_m: 10_000.0,
            adjust_limit_s: 300.0,
            min_dist_between_exits_m: 100_000.0,
            max_weight_base_s: 7200.0,
            max_weight_factor: 20.0,
            avoid: RoadTypes::NONE,
        }
    }
}

/// Computes routes between checkpoints for one vehicle type.
pub struct Router {
    vehicle: VehicleType,
    store: Arc<dyn PartitionStore>,
    traffic: Option<Arc<TrafficCache>>,
    options: Options,
    directions: Box<dyn DirectionsEngine>,
    cache: Option<RouteCache>,
}

impl Router {
    pub fn new(
        vehicle: VehicleType,
        store: Arc<dyn PartitionStore>,
        traffic: Option<Arc<TrafficCache>>,
        options: Options,
    ) -> Self {
        Self {
            vehicle,
            store,
            traffic,
            options,
            directions: Box::new(GeometryDirections::new()),
            cache: None,
        }
    }

    /// Replaces the engine generating turn instructions.
    pub fn with_directions(mut self, directions: Box<dyn DirectionsEngine>) -> Self {
        self.directions = directions;
        self
    }

    pub fn name(&self) -> String {
        format!("astar-bidirectional-{}", self.vehicle.name())
    }

    pub fn vehicle(&self) -> VehicleType {
        self.vehicle
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The last successfully computed route.
    pub fn cache(&self) -> Option<&RouteCache> {
        self.cache.as_ref()
    }

    /// Forgets the last route and any state of the directions engine.
    pub fn clear_state(&mut self) {
        self.directions.clear();
        self.cache = None;
    }

    /// Computes a route through `checkpoints`, starting at the last passed one.
    ///
    /// `direction` is the (east, north) vector of movement at the start, if known.
    /// With `adjust`, the last route is reused if the start moved along it.
    pub fn calculate_route(
        &mut self,
        checkpoints: &Checkpoints,
        direction: Option<(f64, f64)>,
        adjust: bool,
        delegate: &dyn RouterDelegate,
    ) -> (RouterResultCode, Route) {
        let started = Instant::now();
        let mut route = Route::new(self.name());

        if let Err(code) = self.check_partitions(checkpoints, &mut route) {
            log::warn!("{}: {code}", self.name());
            return (code, route);
        }

        let options = self.options.clone();
        let mut ctx = SearchContext::new(delegate, &options);

        if adjust {
            match self.try_adjust(checkpoints, direction, &mut ctx) {
                Some(Ok(adjusted)) => {
                    ctx.flush();
                    log::info!(
                        "{}: route adjusted in {:.3?}, {:.0} s",
                        self.name(),
                        started.elapsed(),
                        adjusted.total_time(),
                    );
                    return (RouterResultCode::NoError, adjusted);
                }
                Some(Err(RouterResultCode::Cancelled)) => {
                    return (RouterResultCode::Cancelled, route);
                }
                Some(Err(code)) => {
                    log::warn!("{}: adjusting failed ({code}), recomputing the route", self.name());
                    ctx = SearchContext::new(delegate, &options);
                }
                None => {}
            }
        }

        self.cache = None;
        match self.calculate_full(checkpoints, direction, &mut ctx) {
            Ok(computed) => {
                ctx.flush();
                log::info!(
                    "{}: route calculated in {:.3?}, {} segments, {:.0} s",
                    self.name(),
                    started.elapsed(),
                    computed.segments.len(),
                    computed.total_time(),
                );
                (RouterResultCode::NoError, computed)
            }
            Err(code) => {
                log::info!("{}: {code} after {:.3?}", self.name(), started.elapsed());
                (code, route)
            }
        }
    }

    /// Computes a route between `points`, without progress reporting or adjusting.
    pub fn route_between(&mut self, points: Vec<LatLon>) -> Result<Route, Error> {
        let checkpoints = Checkpoints::new(points)?;
        let (code, route) = self.calculate_route(&checkpoints, None, false, &NoopDelegate);
        if code.is_ok() {
            Ok(route)
        } else {
            Err(Error::Route(code))
        }
    }

    fn world(&self) -> WorldGraph {
        WorldGraph::new(
            self.store.clone(),
            self.vehicle,
            self.traffic.clone(),
            self.options.avoid,
        )
    }

    fn check_partitions(&self, checkpoints: &Checkpoints, route: &mut Route) -> Result<(), RouterResultCode> {
        for id in self.store.ids() {
            if self.store.status(id) == Some(PartitionStatus::Outdated) {
                log::warn!(
                    "partition {} is in an unsupported version",
                    self.store.name(id).unwrap_or_default(),
                );
                return Err(RouterResultCode::FileTooOld);
            }
        }

        let points = &checkpoints.points()[checkpoints.passed_idx()..];
        for (i, &point) in points.iter().enumerate() {
            let Some(id) = self.store.partition_at(point) else {
                log::warn!("no partition covers checkpoint {point:?}");
                return Err(point_not_found(i, points.len()));
            };
            if self.store.status(id) == Some(PartitionStatus::Absent) {
                let name = self.store.name(id).unwrap_or_default().to_string();
                if !route.absent_partitions.contains(&name) {
                    route.absent_partitions.push(name);
                }
            }
        }

        if !route.absent_partitions.is_empty() {
            return Err(RouterResultCode::NeedMoreMaps);
        }
        Ok(())
    }

    fn snap(
        &self,
        world: &mut WorldGraph,
        point: LatLon,
        direction: Option<(f64, f64)>,
        is_outgoing: bool,
    ) -> Option<(FakeEnding, bool)> {
        let best = find_best_segment(world, point, direction, is_outgoing, &self.options)?;
        log::debug!(
            "snapped {point:?} to {}{}",
            best.segment,
            if best.codirectional { " (codirectional)" } else { "" },
        );
        let ending = make_fake_ending(world, &[best.segment], point);
        if ending.is_empty() {
            return None;
        }
        Some((ending, best.codirectional))
    }

    fn calculate_full(
        &mut self,
        checkpoints: &Checkpoints,
        direction: Option<(f64, f64)>,
        ctx: &mut SearchContext<'_>,
    ) -> Result<Route, RouterResultCode> {
        let passed = checkpoints.passed_idx();
        let points = &checkpoints.points()[passed..];
        let mut world = self.world();

        let mut endings = Vec::with_capacity(points.len());
        let mut start_codirectional = false;
        for (i, &point) in points.iter().enumerate() {
            let is_finish = i + 1 == points.len();
            let hint = if i == 0 { direction } else { None };
            let Some((ending, codirectional)) = self.snap(&mut world, point, hint, !is_finish) else {
                log::warn!("checkpoint {} at {point:?} is not on the road network", passed + i);
                return Err(point_not_found(i, points.len()));
            };
            if i == 0 {
                start_codirectional = codirectional;
            }
            endings.push(ending);
        }

        let num_legs = endings.len() - 1;
        let mut fake = FakeEdges::default();
        let mut path: Vec<Segment> = Vec::new();
        let mut legs: Vec<Range<usize>> = Vec::with_capacity(num_legs);

        for leg in 0..num_legs {
            let strict_forward = self.vehicle == VehicleType::Car && (leg > 0 || start_codirectional);
            let mut starter = RouteStarter::new(
                world,
                &endings[leg],
                Some(&endings[leg + 1]),
                strict_forward,
                fake.next_offset(),
            );

            ctx.progress.push(SubProgress::plain(1.0 / num_legs as f64));
            let result = self.find_subroute(&mut starter, ctx);
            close_stage(ctx, result.is_ok());

            let (w, leg_fake) = starter.into_parts();
            world = w;
            let leg_path = result?;

            fake.append(&leg_fake);
            let begin = path.len();
            path.extend(leg_path);
            legs.push(begin..path.len());
        }

        let name = self.name();
        let mut view = RouteView::new(&mut world, &fake);
        let route = redress_route(
            &mut view,
            &path,
            &legs,
            passed,
            Some(self.directions.as_mut()),
            ctx.delegate,
            &name,
        )?;

        self.cache = Some(RouteCache::build(
            &mut view,
            &path,
            legs,
            checkpoints.start(),
            checkpoints.finish(),
            fake.clone(),
        ));
        return Ok(route);
    }

    fn select_mode(&self, starter: &RouteStarter) -> WorldGraphMode {
        match self.vehicle {
            VehicleType::Pedestrian | VehicleType::Bicycle => WorldGraphMode::Joints,
            VehicleType::Transit => WorldGraphMode::NoLeaps,
            VehicleType::Car => {
                let bounds: Vec<Rect> = starter
                    .start_partitions()
                    .iter()
                    .chain(starter.finish_partitions())
                    .filter_map(|&id| self.store.bounds(id))
                    .collect();
                let neighbours = bounds
                    .iter()
                    .all(|a| bounds.iter().all(|b| a.intersects(b)));
                if neighbours {
                    WorldGraphMode::Joints
                } else {
                    WorldGraphMode::LeapsOnly
                }
            }
        }
    }

    /// Finds the path of a single leg, from the start to the finish of `starter`.
    fn find_subroute(
        &self,
        starter: &mut RouteStarter,
        ctx: &mut SearchContext<'_>,
    ) -> Result<Vec<Segment>, RouterResultCode> {
        let start = starter.start_segment();
        let Some(finish) = starter.finish_segment() else {
            log::error!("leg without a finish");
            return Err(RouterResultCode::InternalError);
        };
        let a = starter.start_point();
        let b = starter.finish_point().unwrap_or(a);

        let crow_flies = starter.graph().estimator().heuristic(a, b);
        starter.set_max_weight(self.options.max_weight_base_s + self.options.max_weight_factor * crow_flies);

        let mode = self.select_mode(starter);
        log::info!("{}: searching in {mode} mode", self.name());

        let result = if mode == WorldGraphMode::LeapsOnly {
            self.find_with_leaps(starter, start, finish, ctx)
        } else {
            ctx.progress.push(SubProgress::new(a, b, 1.0));
            let r = find_path(starter, start, finish, mode, ctx).map(|r| r.path);
            close_stage(ctx, r.is_ok());
            r
        };

        if self.vehicle == VehicleType::Transit && matches!(result, Err(RouterResultCode::RouteNotFound)) {
            return Err(transit_failure(starter));
        }
        return result;
    }

    fn find_with_leaps(
        &self,
        starter: &mut RouteStarter,
        start: Segment,
        finish: Segment,
        ctx: &mut SearchContext<'_>,
    ) -> Result<Vec<Segment>, RouterResultCode> {
        let a = starter.start_point();
        let b = starter.finish_point().unwrap_or(a);

        ctx.progress.push(SubProgress::new(a, b, self.options.leaps_contribution));
        let leaps = find_path(starter, start, finish, WorldGraphMode::LeapsOnly, ctx);
        close_stage(ctx, leaps.is_ok());
        let leaps = leaps?;
        log::debug!("found {} leap segments, weight {:.0} s", leaps.path.len(), leaps.distance.weight);

        ctx.progress.push(SubProgress::plain(1.0 - self.options.leaps_contribution));
        let result = process_leaps(&leaps.path, starter, ctx);
        close_stage(ctx, result.is_ok());
        return result;
    }

    fn try_adjust(
        &mut self,
        checkpoints: &Checkpoints,
        direction: Option<(f64, f64)>,
        ctx: &mut SearchContext<'_>,
    ) -> Option<Result<Route, RouterResultCode>> {
        let cache = self.cache.take()?;
        let start = checkpoints.start();
        let finish = checkpoints.finish();

        if cache.finish != finish {
            log::debug!("not adjusting: the finish has changed");
            return None;
        }
        if cache.legs.len() != checkpoints.num_subroutes() - checkpoints.passed_idx() {
            log::debug!("not adjusting: the checkpoints have changed");
            return None;
        }
        if cache.distance_to(start) > self.options.adjust_range_m {
            log::debug!("not adjusting: too far from the last route");
            return None;
        }
        if earth_distance(start, finish) < self.options.min_distance_to_finish_m {
            log::debug!("not adjusting: too close to the finish");
            return None;
        }

        Some(self.adjust(cache, checkpoints, direction, ctx))
    }

    fn adjust(
        &mut self,
        cache: RouteCache,
        checkpoints: &Checkpoints,
        direction: Option<(f64, f64)>,
        ctx: &mut SearchContext<'_>,
    ) -> Result<Route, RouterResultCode> {
        let start = checkpoints.start();
        let mut world = self.world();
        let Some((ending, codirectional)) = self.snap(&mut world, start, direction, true) else {
            return Err(RouterResultCode::StartPointNotFound);
        };

        let strict_forward = self.vehicle == VehicleType::Car && codirectional;
        let mut starter = RouteStarter::new(world, &ending, None, strict_forward, cache.fake.next_offset());
        starter.append(&cache.fake);

        let prev_route: Vec<(Segment, RouteWeight)> = cache
            .leg(0)
            .iter()
            .map(|s| (s.segment, s.weight))
            .collect();
        let Some(target) = cache.leg(0).last().map(|s| s.point) else {
            return Err(RouterResultCode::RouteNotFound);
        };

        ctx.progress.push(SubProgress::new(start, target, 1.0));
        let result = adjust_path(&mut starter, &prev_route, self.options.adjust_limit_s, ctx);
        close_stage(ctx, result.is_ok());
        let adjusted = result?;

        // The adjusted leg ends where the cached one did; later legs are reused as they are
        let mut path = adjusted.path;
        let mut legs = vec![0..path.len()];
        for i in 1..cache.legs.len() {
            let begin = path.len();
            path.extend(cache.leg(i).iter().map(|s| s.segment));
            legs.push(begin..path.len());
        }

        let (mut world, fake) = starter.into_parts();
        let name = self.name();
        let mut view = RouteView::new(&mut world, &fake);
        let route = redress_route(
            &mut view,
            &path,
            &legs,
            checkpoints.passed_idx(),
            Some(self.directions.as_mut()),
            ctx.delegate,
            &name,
        )?;

        self.cache = Some(RouteCache::build(
            &mut view,
            &path,
            legs,
            start,
            checkpoints.finish(),
            fake.clone(),
        ));
        return Ok(route);
    }
}

fn point_not_found(i: usize, len: usize) -> RouterResultCode {
    if i == 0 {
        RouterResultCode::StartPointNotFound
    } else if i + 1 == len {
        RouterResultCode::EndPointNotFound
    } else {
        RouterResultCode::IntermediatePointNotFound
    }
}

fn close_stage(ctx: &mut SearchContext<'_>, ok: bool) {
    if ok {
        ctx.progress.pop_and_flush();
    } else {
        ctx.progress.drop_last();
    }
}

/// Explains a failed transit search: either there's no transit network
/// at one of the ends, or the walking parts would be too long.
fn transit_failure(starter: &mut RouteStarter) -> RouterResultCode {
    let partitions: Vec<PartitionId> = starter
        .start_partitions()
        .iter()
        .chain(starter.finish_partitions())
        .copied()
        .collect();

    if partitions.iter().any(|&id| !starter.graph_mut().has_transit(id)) {
        RouterResultCode::TransitRouteNotFoundNoNetwork
    } else {
        RouterResultCode::TransitRouteNotFoundTooLongPedestrian
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::store::StoreBuilder;
    use crate::testing::{grid, grid_lon, grid_point, road, road_tagged, single_grid, three_partitions, EAST_BASE, WEST_BASE};

    fn router(store: impl PartitionStore + 'static, vehicle: VehicleType) -> Router {
        Router::new(vehicle, Arc::new(store), None, Options::default())
    }

    /// Point slightly north of the middle of a row segment.
    fn near_row(partition: usize, row: usize, col: usize) -> LatLon {
        let a = grid_point(grid_lon(partition), row, col);
        LatLon::new(a.lat + 0.0001, a.lon + 0.001)
    }

    fn checkpoints(points: &[LatLon]) -> Checkpoints {
        Checkpoints::new(points.to_vec()).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        cancelled: bool,
        progress: RefCell<Vec<f64>>,
        point_checks: Cell<usize>,
    }

    impl RouterDelegate for Recorder {
        fn is_cancelled(&self) -> bool {
            self.cancelled
        }

        fn on_progress(&self, progress: f64) {
            self.progress.borrow_mut().push(progress);
        }

        fn on_point_check(&self, _point: LatLon) {
            self.point_checks.set(self.point_checks.get() + 1);
        }
    }

    #[test]
    fn connected_endpoints() {
        let mut r = router(single_grid(), VehicleType::Car);
        let (a, b) = (near_row(0, 1, 0), near_row(0, 4, 3));
        let delegate = Recorder::default();
        let (code, route) = r.calculate_route(&checkpoints(&[a, b]), None, false, &delegate);

        assert_eq!(code, RouterResultCode::NoError);
        assert!(route.is_valid());
        assert_eq!(route.start(), Some(a));
        assert_eq!(route.finish(), Some(b));
        assert_eq!(route.name, "astar-bidirectional-car");
        assert_eq!(route.subroutes.len(), 1);
        assert!(route.times.windows(2).all(|t| t[0] <= t[1]));

        let progress = delegate.progress.borrow();
        assert!(progress.windows(2).all(|p| p[0] <= p[1]));
        assert!((progress.last().copied().unwrap_or_default() - 1.0).abs() < 1e-6);
        assert!(delegate.point_checks.get() > 0);
        assert!(r.cache().is_some());
    }

    #[test]
    fn repeated_calculations_are_equal() {
        let mut r = router(single_grid(), VehicleType::Car);
        let points = checkpoints(&[near_row(0, 0, 1), near_row(0, 4, 3)]);
        let (c1, r1) = r.calculate_route(&points, None, false, &NoopDelegate);
        let (c2, r2) = r.calculate_route(&points, None, false, &NoopDelegate);
        assert_eq!(c1, RouterResultCode::NoError);
        assert_eq!(c2, RouterResultCode::NoError);
        assert_eq!(r1, r2);
    }

    #[test]
    fn intermediate_checkpoints() {
        let mut r = router(single_grid(), VehicleType::Car);
        let points = checkpoints(&[near_row(0, 1, 0), near_row(0, 1, 3), near_row(0, 4, 3)]);
        let (code, route) = r.calculate_route(&points, None, false, &NoopDelegate);

        assert_eq!(code, RouterResultCode::NoError);
        assert_eq!(route.subroutes.len(), 2);
        assert_eq!(route.subroutes[0].begin, 0);
        assert_eq!(route.subroutes[0].end, route.subroutes[1].begin);
        assert_eq!(route.subroutes[1].end, route.segments.len());
        assert_eq!(route.subroutes[0].finish.point, near_row(0, 1, 3));

        let passed = points.clone().with_passed_idx(1).unwrap();
        let (code, route) = r.calculate_route(&passed, None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NoError);
        assert_eq!(route.subroutes.len(), 2);
        assert!(route.subroutes[0].is_empty());
        assert_eq!(route.current_subroute, 1);
    }

    #[test]
    fn adjusted_route_keeps_later_legs() {
        let mut r = Router::new(
            VehicleType::Car,
            Arc::new(single_grid()),
            None,
            Options {
                min_distance_to_finish_m: 0.0,
                ..Default::default()
            },
        );
        let (m, b) = (near_row(0, 1, 3), near_row(0, 4, 3));
        let (code, first) = r.calculate_route(&checkpoints(&[near_row(0, 1, 0), m, b]), None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NoError);

        let moved = near_row(0, 1, 1);
        let (code, adjusted) = r.calculate_route(&checkpoints(&[moved, m, b]), None, true, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NoError);
        assert_eq!(adjusted.start(), Some(moved));
        assert_eq!(adjusted.finish(), Some(b));

        // The new start got fresh fake ids, so the route wasn't recomputed from scratch
        assert_ne!(adjusted.segments[0].segment, first.segments[0].segment);

        let suffix = |route: &Route| -> Vec<Segment> {
            let leg = route.subroutes[1];
            route.segments[leg.begin..leg.end].iter().map(|s| s.segment).collect()
        };
        assert_eq!(suffix(&adjusted), suffix(&first));
        assert!(adjusted.total_time() < first.total_time());
    }

    #[test]
    fn adjust_falls_back_to_full_calculation() {
        let mut r = router(single_grid(), VehicleType::Car);
        let points = checkpoints(&[near_row(0, 1, 0), near_row(0, 4, 3)]);
        let (_, first) = r.calculate_route(&points, None, false, &NoopDelegate);

        // Too close to the finish with default options
        let (code, route) = r.calculate_route(&points, None, true, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NoError);
        assert_eq!(route, first);
    }

    #[test]
    fn adjust_recalculates_when_finish_changed_or_nothing_cached() {
        let options = Options {
            min_distance_to_finish_m: 0.0,
            ..Default::default()
        };
        let fresh = |points: &Checkpoints| {
            let mut r = Router::new(VehicleType::Car, Arc::new(single_grid()), None, options.clone());
            r.calculate_route(points, None, false, &NoopDelegate)
        };

        let mut r = Router::new(VehicleType::Car, Arc::new(single_grid()), None, options.clone());
        let (code, _) = r.calculate_route(&checkpoints(&[near_row(0, 1, 0), near_row(0, 4, 3)]), None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NoError);

        // A different finish can't reuse the cached route
        let moved_finish = checkpoints(&[near_row(0, 1, 1), near_row(0, 3, 4)]);
        let (code, route) = r.calculate_route(&moved_finish, None, true, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NoError);
        assert_eq!((code, route), fresh(&moved_finish));
        assert_eq!(r.cache().map(|c| c.finish), Some(near_row(0, 3, 4)));

        // Nothing to adjust after the state was cleared
        r.clear_state();
        let moved_start = checkpoints(&[near_row(0, 2, 1), near_row(0, 3, 4)]);
        let (code, route) = r.calculate_route(&moved_start, None, true, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NoError);
        assert_eq!((code, route), fresh(&moved_start));
        assert!(r.cache().is_some());
    }

    #[test]
    fn checkpoint_beyond_outermost_road() {
        let mut r = router(single_grid(), VehicleType::Car);
        // 11 m north of the northernmost row
        let (a, b) = (near_row(0, 1, 0), near_row(0, 5, 2));
        let (code, route) = r.calculate_route(&checkpoints(&[a, b]), None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NoError);
        assert_eq!(route.finish(), Some(b));
    }

    #[test]
    fn leaps_across_partitions() {
        let mut r = router(three_partitions(), VehicleType::Car);
        let (code, route) = r.calculate_route(&checkpoints(&[near_row(0, 2, 1), near_row(2, 3, 3)]), None, false, &NoopDelegate);

        assert_eq!(code, RouterResultCode::NoError);
        assert!(route.is_valid());
        assert!(route.segments.iter().any(|s| s.segment.partition == 1));
        assert!(route.segments.iter().any(|s| s.segment.partition == 2));
    }

    #[test]
    fn bicycle_prefers_cycleway() {
        // A slightly bent cycleway along row 1, from column 0 to column 2
        let mut p = grid("west", WEST_BASE, 0.0, "residential", None);
        let a = grid_point(0.0, 1, 0);
        let b = grid_point(0.0, 1, 2);
        p.roads.push(road_tagged(
            99,
            &[("highway", "cycleway"), ("name", "Cycle path")],
            &[
                (WEST_BASE + 100, a.lat, a.lon),
                (9001, a.lat - 0.0002, (a.lon + b.lon) * 0.5),
                (WEST_BASE + 102, b.lat, b.lon),
            ],
        ));
        let mut builder = StoreBuilder::new();
        builder.add(p);

        let mut r = router(builder.build(), VehicleType::Bicycle);
        let (code, route) = r.calculate_route(&checkpoints(&[a, b]), None, false, &NoopDelegate);

        assert_eq!(code, RouterResultCode::NoError);
        assert!(route.total_distance() > 400.0 && route.total_distance() < 500.0);
        assert!(route
            .segments
            .iter()
            .any(|s| s.road_name.as_deref() == Some("Cycle path")));
    }

    #[test]
    fn dead_end_checkpoints() {
        let mut p = grid("west", WEST_BASE, 0.0, "residential", None);
        p.roads.push(road(
            99,
            "residential",
            &[(9001, 0.02, 0.0), (9002, 0.02, 0.001), (9003, 0.02, 0.002)],
        ));
        let mut builder = StoreBuilder::new();
        builder.add(p);
        let mut r = router(builder.build(), VehicleType::Car);
        let isolated = LatLon::new(0.02, 0.001);

        let (code, _) = r.calculate_route(&checkpoints(&[isolated, near_row(0, 1, 1)]), None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::StartPointNotFound);

        let (code, _) = r.calculate_route(&checkpoints(&[near_row(0, 1, 1), isolated]), None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::EndPointNotFound);

        let (code, _) = r.calculate_route(
            &checkpoints(&[near_row(0, 1, 1), isolated, near_row(0, 3, 1)]),
            None,
            false,
            &NoopDelegate,
        );
        assert_eq!(code, RouterResultCode::IntermediatePointNotFound);
    }

    #[test]
    fn cancellation() {
        let mut r = router(single_grid(), VehicleType::Car);
        let delegate = Recorder {
            cancelled: true,
            ..Default::default()
        };
        let (code, route) = r.calculate_route(&checkpoints(&[near_row(0, 0, 0), near_row(0, 4, 4)]), None, false, &delegate);
        assert_eq!(code, RouterResultCode::Cancelled);
        assert!(route.segments.is_empty());
        assert!(delegate.point_checks.get() < r.options().visit_period as usize);
        assert!(r.cache().is_none());
    }

    #[test]
    fn point_checks_are_throttled() {
        let points = checkpoints(&[near_row(0, 0, 0), near_row(0, 4, 4)]);
        let point_checks = |visit_period: u32| {
            let options = Options {
                visit_period,
                ..Default::default()
            };
            let mut r = Router::new(VehicleType::Car, Arc::new(single_grid()), None, options);
            let delegate = Recorder::default();
            let (code, _) = r.calculate_route(&points, None, false, &delegate);
            assert_eq!(code, RouterResultCode::NoError);
            delegate.point_checks.get()
        };

        let every = point_checks(1);
        let throttled = point_checks(40);
        assert!(every > 0);
        assert!(throttled * 10 < every);
    }

    #[test]
    fn missing_and_outdated_partitions() {
        let mut b = StoreBuilder::new();
        b.add(grid("west", WEST_BASE, grid_lon(0), "residential", None));
        b.add_absent("east", Rect::new(LatLon::new(0.0, 0.0101), LatLon::new(0.01, 0.02)));
        let mut r = router(b.build(), VehicleType::Car);

        let (code, route) = r.calculate_route(&checkpoints(&[near_row(0, 1, 1), near_row(1, 1, 1)]), None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::NeedMoreMaps);
        assert_eq!(route.absent_partitions, vec!["east".to_string()]);

        let (code, _) = r.calculate_route(&checkpoints(&[LatLon::new(1.0, 1.0), near_row(0, 1, 1)]), None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::StartPointNotFound);

        let mut b = StoreBuilder::new();
        b.add(grid("west", WEST_BASE, grid_lon(0), "residential", None));
        b.add_outdated(grid("east", EAST_BASE, grid_lon(1), "residential", Some(WEST_BASE)));
        let mut r = router(b.build(), VehicleType::Car);
        let (code, _) = r.calculate_route(&checkpoints(&[near_row(0, 1, 1), near_row(0, 3, 1)]), None, false, &NoopDelegate);
        assert_eq!(code, RouterResultCode::FileTooOld);
    }

    #[test]
    fn transit_without_network() {
        let mut r = router(single_grid(), VehicleType::Transit);
        let mut world = r.world();
        let ending = make_fake_ending(&mut world, &[Segment::new(0, 1, 1, true)], near_row(0, 1, 1));
        let mut starter = RouteStarter::new(world, &ending, Some(&ending), false, 0);
        assert_eq!(transit_failure(&mut starter), RouterResultCode::TransitRouteNotFoundNoNetwork);

        r.clear_state();
        assert!(r.cache().is_none());
    }

    #[test]
    fn route_between_points() {
        let mut r = router(single_grid(), VehicleType::Pedestrian);
        let route = r.route_between(vec![near_row(0, 1, 0), near_row(0, 2, 2)]).unwrap();
        assert!(route.is_valid());
        assert_eq!(route.name, "astar-bidirectional-pedestrian");

        assert!(matches!(
            r.route_between(vec![near_row(0, 1, 0)]),
            Err(Error::Checkpoints(CheckpointsError::TooFew(1))),
        ));
        assert!(matches!(
            r.route_between(vec![near_row(0, 1, 0), LatLon::new(1.0, 1.0)]),
            Err(Error::Route(RouterResultCode::EndPointNotFound)),
        ));
    }
}

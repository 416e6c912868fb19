// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::astar::{self, find_path_bidirectional, AdjustParams, Params, Progress, RoutingResult};
use crate::delegate::RouterDelegate;
use crate::joints::{process_joints, JointGraph, JointSegment};
use crate::starter::RouteStarter;
use crate::world::WorldGraphMode;
use crate::{LatLon, RouteWeight, Segment};

use super::{Options, RouterResultCode};

/// State shared by all searches of one route calculation.
pub struct SearchContext<'a> {
    pub delegate: &'a dyn RouterDelegate,
    pub options: &'a Options,
    pub progress: Progress,
    last_reported: f64,
    visits: u64,
}

impl<'a> SearchContext<'a> {
    pub fn new(delegate: &'a dyn RouterDelegate, options: &'a Options) -> Self {
        Self {
            delegate,
            options,
            progress: Progress::new(),
            last_reported: 0.0,
            visits: 0,
        }
    }

    /// Counts a settled vertex, returning true on every `period`-th one.
    fn count_visit(&mut self, period: u32) -> bool {
        self.visits += 1;
        return period <= 1 || self.visits % period as u64 == 0;
    }

    fn on_visit(&mut self, current: Option<LatLon>, target: Option<LatLon>) {
        let (Some(current), Some(target)) = (current, target) else {
            return;
        };
        self.delegate.on_point_check(current);
        let v = self.progress.update(current, target);
        self.report(v);
    }

    fn report(&mut self, v: f64) {
        if v - self.last_reported >= self.options.progress_interval {
            self.last_reported = v;
            self.delegate.on_progress(v);
        }
    }

    /// Reports the current progress, regardless of throttling.
    pub fn flush(&mut self) {
        let v = self.progress.last_value();
        if v > self.last_reported {
            self.last_reported = v;
            self.delegate.on_progress(v);
        }
    }
}

/// Finds a path between two segments of `starter`, searching the world graph in `mode`.
pub fn find_path(
    starter: &mut RouteStarter,
    start: Segment,
    finish: Segment,
    mode: WorldGraphMode,
    ctx: &mut SearchContext<'_>,
) -> Result<RoutingResult<Segment, RouteWeight>, RouterResultCode> {
    starter.set_mode(mode);
    let policy = mode.policy();

    let delegate = ctx.delegate;
    let cancelled = || delegate.is_cancelled();
    let max_weight = starter.max_weight();
    let check_length = |w: RouteWeight| w.weight <= max_weight;
    let visit_period = if policy.leaps {
        ctx.options.visit_period_for_leaps
    } else {
        ctx.options.visit_period
    };

    if policy.joints {
        let mut graph = JointGraph::new(starter, start, finish);
        let mut on_visit = |g: &mut JointGraph<'_>, v: JointSegment, target: JointSegment| {
            if !ctx.count_visit(visit_period) {
                return;
            }
            let current = g.starter().point(v.last, true);
            let target = g.starter().point(target.last, true);
            ctx.on_visit(current, target);
        };
        let r = find_path_bidirectional(
            &mut graph,
            Params {
                start: JointSegment::single(start),
                finish: JointSegment::single(finish),
                visit_period,
                cancelled: &cancelled,
                on_visit: &mut on_visit,
                check_length: &check_length,
            },
        )?;
        return Ok(RoutingResult {
            path: process_joints(&r.path),
            distance: r.distance,
        });
    }

    let mut on_visit = |g: &mut RouteStarter, v: Segment, target: Segment| {
        if !ctx.count_visit(visit_period) {
            return;
        }
        let current = g.point(v, true);
        let target = g.point(target, true);
        ctx.on_visit(current, target);
    };
    let params = Params {
        start,
        finish,
        visit_period,
        cancelled: &cancelled,
        on_visit: &mut on_visit,
        check_length: &check_length,
    };

    let r = if policy.leaps {
        astar::find_path(starter, params)?
    } else {
        find_path_bidirectional(starter, params)?
    };
    return Ok(r);
}

/// Joins the route `prev_route` from the start of `starter`, in [WorldGraphMode::NoLeaps] mode.
pub fn adjust_path(
    starter: &mut RouteStarter,
    prev_route: &[(Segment, RouteWeight)],
    limit_s: f64,
    ctx: &mut SearchContext<'_>,
) -> Result<RoutingResult<Segment, RouteWeight>, RouterResultCode> {
    starter.set_mode(WorldGraphMode::NoLeaps);
    let start = starter.start_segment();

    let delegate = ctx.delegate;
    let cancelled = || delegate.is_cancelled();
    let max_weight = starter.max_weight();
    let check_length = |w: RouteWeight| w.weight <= limit_s && w.weight <= max_weight;
    let visit_period = ctx.options.visit_period;

    let mut on_visit = |g: &mut RouteStarter, v: Segment, target: Segment| {
        if !ctx.count_visit(visit_period) {
            return;
        }
        let current = g.point(v, true);
        let target = g.point(target, true);
        ctx.on_visit(current, target);
    };

    let r = astar::adjust_route(
        starter,
        AdjustParams {
            start,
            prev_route,
            visit_period,
            cancelled: &cancelled,
            on_visit: &mut on_visit,
            check_length: &check_length,
        },
    );
    return r.map_err(RouterResultCode::from);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::NoopDelegate;

    #[test]
    fn every_nth_visit_counts() {
        let options = Options::default();
        let delegate = NoopDelegate;
        let mut ctx = SearchContext::new(&delegate, &options);

        let counted: Vec<bool> = (0..6).map(|_| ctx.count_visit(3)).collect();
        assert_eq!(counted, [false, false, true, false, false, true]);
        assert!(ctx.count_visit(1));
        assert!(ctx.count_visit(0));
    }
}

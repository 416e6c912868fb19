// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Expansion of coarse leap paths into detailed routes.
//!
//! A path found in [WorldGraphMode::LeapsOnly] mode has the shape
//! `[start, exit A, enter B, exit B, ..., enter F, finish]`. Every leap
//! (a pair of an enter and an exit of one partition) is replaced by a detailed
//! path found inside that partition alone, so that at most one partition graph
//! has to be kept in memory at a time.

use crate::astar::SubProgress;
use crate::router::{find_path, RouterResultCode, SearchContext};
use crate::starter::RouteStarter;
use crate::world::WorldGraphMode;
use crate::{earth_distance, Segment};

/// Replaces leaps of `input` with detailed paths.
pub fn process_leaps(
    input: &[Segment],
    starter: &mut RouteStarter,
    ctx: &mut SearchContext<'_>,
) -> Result<Vec<Segment>, RouterResultCode> {
    let n = input.len();
    if n < 4 {
        log::error!("leap path too short: {n} segments");
        return Err(RouterResultCode::InternalError);
    }

    // Routes may wander through the start (or finish) partition more than once;
    // such loops are collapsed into a single search.
    let start_partition = input[1].partition;
    let finish_partition = input[n - 2].partition;

    let start_leap_end = (1..=n - 3)
        .rev()
        .find(|&i| input[i].partition == start_partition)
        .unwrap_or(1);
    let finish_leap_start = (start_leap_end..n - 1)
        .find(|&i| input[i].partition == finish_partition)
        .unwrap_or(n - 2);

    log::debug!(
        "processing {} leaps, start leap ends at {start_leap_end}, finish leap starts at {finish_leap_start}",
        n / 2 - 1,
    );

    if start_leap_end >= finish_leap_start {
        let path = search(input, starter, ctx, 0, n - 1, WorldGraphMode::Joints, 1.0)?;
        return Ok(path);
    }

    let mut paths: Vec<(usize, Vec<Segment>)> = Vec::new();
    let mut covered = 0;
    let mut last_from = 0;
    let mut i = start_leap_end;

    loop {
        let (from, mut to) = if i == start_leap_end {
            (0, i)
        } else if i == finish_leap_start {
            (i, n - 1)
        } else {
            (i, i + 1)
        };

        let collapsed = (i == start_leap_end && start_leap_end > 1)
            || (i == finish_leap_start && finish_leap_start < n - 2);
        let mode = if collapsed {
            WorldGraphMode::Joints
        } else {
            WorldGraphMode::JointSingleMwm
        };

        let contribution = |from: usize, to: usize| (to + 1 - from.max(covered)) as f64 / n as f64;

        let mut used_from = from;
        let mut result = search(input, starter, ctx, from, to, mode, contribution(from, to));

        // Skip the exits close to the unreachable one and search across partitions
        if matches!(result, Err(RouterResultCode::RouteNotFound)) {
            let failed = to;
            to = widened_end(input, starter, failed, finish_leap_start, ctx.options.min_dist_between_exits_m);
            log::debug!("leap {from}..{failed} not found, widening to {to}");
            result = search(input, starter, ctx, from, to, WorldGraphMode::Joints, contribution(from, to));

            // Last resort: start over from the last good leap
            if matches!(result, Err(RouterResultCode::RouteNotFound)) && from != 0 {
                log::debug!("leap {from}..{to} not found, retrying from {last_from}");
                used_from = last_from;
                result = search(
                    input,
                    starter,
                    ctx,
                    last_from,
                    to,
                    WorldGraphMode::Joints,
                    contribution(last_from, to),
                );
            }
        }

        let path = result?;
        if paths.last().is_some_and(|p| p.0 == used_from) {
            paths.pop();
        }
        paths.push((used_from, path));
        covered = to + 1;
        last_from = used_from;

        if to == n - 1 {
            break;
        }
        i = to + 1;
    }

    let mut result: Vec<Segment> = Vec::new();
    for (_, path) in paths {
        for s in path {
            if result.last() != Some(&s) {
                result.push(s);
            }
        }
    }
    return Ok(result);
}

/// Index of the leap path element a failed leap ending at `failed` is widened to:
/// the exit after the run of exits within `limit` meters of the failed one,
/// or the finish once no exit is left before the finish partition.
fn widened_end(
    input: &[Segment],
    starter: &mut RouteStarter,
    failed: usize,
    finish_leap_start: usize,
    limit: f64,
) -> usize {
    let n = input.len();
    let mut next = failed;
    if let Some(origin) = starter.point(input[failed], true) {
        while next + 2 < finish_leap_start {
            let Some(p) = starter.point(input[next + 2], true) else {
                break;
            };
            if earth_distance(origin, p) > limit {
                break;
            }
            next += 2;
        }
    }

    if next + 2 > finish_leap_start || next == finish_leap_start {
        return n - 1;
    }
    return next + 2;
}

fn search(
    input: &[Segment],
    starter: &mut RouteStarter,
    ctx: &mut SearchContext<'_>,
    from: usize,
    to: usize,
    mode: WorldGraphMode,
    contribution: f64,
) -> Result<Vec<Segment>, RouterResultCode> {
    let (start, finish) = (input[from], input[to]);

    starter.graph_mut().clear_cached_graphs();

    let sub = match (starter.point(start, true), starter.point(finish, true)) {
        (Some(a), Some(b)) => SubProgress::new(a, b, contribution),
        _ => SubProgress::plain(contribution),
    };
    ctx.progress.push(sub);

    log::debug!("leap {from}..{to}: searching {start} -> {finish} in {mode} mode");
    match find_path(starter, start, finish, mode, ctx) {
        Ok(r) => {
            ctx.progress.pop_and_flush();
            Ok(r.path)
        }
        Err(code) => {
            ctx.progress.drop_last();
            Err(code)
        }
    }
}

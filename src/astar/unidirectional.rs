// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap, HashSet};

use super::{AStarError, AdjustParams, Graph, Params, QueueItem, RoutingResult, Weight};

fn reconstruct_path<V: Copy + Eq + std::hash::Hash>(came_from: &HashMap<V, V>, mut last: V) -> Vec<V> {
    let mut path = vec![last];

    while let Some(&v) = came_from.get(&last) {
        path.push(v);
        last = v;
    }

    path.reverse();
    return path;
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the shortest path between `params.start` and `params.finish`,
/// following outgoing edges only.
pub fn find_path<G: Graph>(
    g: &mut G,
    params: Params<'_, G>,
) -> Result<RoutingResult<G::Vertex, G::Weight>, AStarError> {
    let Params {
        start,
        finish,
        visit_period,
        cancelled,
        on_visit,
        check_length,
    } = params;

    let mut queue: BinaryHeap<QueueItem<G::Vertex, G::Weight>> = BinaryHeap::default();
    let mut came_from: HashMap<G::Vertex, G::Vertex> = HashMap::default();
    let mut known: HashMap<G::Vertex, G::Weight> = HashMap::default();
    let mut edges = Vec::new();
    let mut steps: u32 = 0;

    let initial = G::Weight::from_potential(g.heuristic(start, finish));
    queue.push(QueueItem {
        at: start,
        distance: G::Weight::zero(),
        key: initial,
    });
    known.insert(start, G::Weight::zero());

    while let Some(item) = queue.pop() {
        if item.at == finish {
            return Ok(RoutingResult {
                path: reconstruct_path(&came_from, finish),
                distance: item.distance,
            });
        }

        // Contrary to the wikipedia definition, we might keep multiple items in the queue
        // for the same node. Only the cheapest one is expanded.
        if known.get(&item.at).is_some_and(|&d| item.distance > d) {
            continue;
        }

        steps += 1;
        if visit_period > 0 && steps % visit_period == 0 && cancelled() {
            return Err(AStarError::Cancelled);
        }
        on_visit(g, item.at, finish);

        edges.clear();
        g.edges(item.at, true, &mut edges);
        for &(v, w) in &edges {
            let distance = item.distance + w;
            if known.get(&v).is_some_and(|&d| d <= distance) {
                continue;
            }

            let key = distance + G::Weight::from_potential(g.heuristic(v, finish));
            if !check_length(key) {
                continue;
            }

            known.insert(v, distance);
            came_from.insert(v, item.at);
            queue.push(QueueItem {
                at: v,
                distance,
                key,
            });
        }
    }

    return Err(AStarError::NoPath);
}

/// Finds the cheapest way from `params.start` to the end of an already known route,
/// allowing the new path to join the known route at any of its vertices.
///
/// The search is a plain Dijkstra over outgoing edges, which stops once no unsettled
/// vertex can improve the best join. The returned path continues along
/// `params.prev_route` after the first occurrence of the join vertex.
pub fn adjust_route<G: Graph>(
    g: &mut G,
    params: AdjustParams<'_, G>,
) -> Result<RoutingResult<G::Vertex, G::Weight>, AStarError> {
    let AdjustParams {
        start,
        prev_route,
        visit_period,
        cancelled,
        on_visit,
        check_length,
    } = params;

    let Some(&(route_end, _)) = prev_route.last() else {
        return Err(AStarError::NoPath);
    };

    // Remaining weight of the known route from each of its vertices.
    // Walking backwards leaves the values of the first occurrences in the map.
    let mut remaining: HashMap<G::Vertex, G::Weight> = HashMap::default();
    let mut acc = G::Weight::zero();
    for &(v, w) in prev_route.iter().rev() {
        remaining.insert(v, acc);
        acc = acc + w;
    }

    let mut queue: BinaryHeap<QueueItem<G::Vertex, G::Weight>> = BinaryHeap::default();
    let mut came_from: HashMap<G::Vertex, G::Vertex> = HashMap::default();
    let mut known: HashMap<G::Vertex, G::Weight> = HashMap::default();
    let mut edges = Vec::new();
    let mut steps: u32 = 0;
    let mut best: Option<(G::Weight, G::Vertex)> = None;

    queue.push(QueueItem {
        at: start,
        distance: G::Weight::zero(),
        key: G::Weight::zero(),
    });
    known.insert(start, G::Weight::zero());

    while let Some(item) = queue.pop() {
        if best.is_some_and(|(total, _)| item.distance >= total) {
            break;
        }
        if known.get(&item.at).is_some_and(|&d| item.distance > d) {
            continue;
        }

        steps += 1;
        if visit_period > 0 && steps % visit_period == 0 && cancelled() {
            return Err(AStarError::Cancelled);
        }
        on_visit(g, item.at, route_end);

        if let Some(&rest) = remaining.get(&item.at) {
            let total = item.distance + rest;
            if best.is_none_or(|(b, _)| total < b) {
                best = Some((total, item.at));
            }
        }

        edges.clear();
        g.edges(item.at, true, &mut edges);
        for &(v, w) in &edges {
            let distance = item.distance + w;
            if !check_length(distance) || known.get(&v).is_some_and(|&d| d <= distance) {
                continue;
            }

            known.insert(v, distance);
            came_from.insert(v, item.at);
            queue.push(QueueItem {
                at: v,
                distance,
                key: distance,
            });
        }
    }

    let (distance, join) = best.ok_or(AStarError::NoPath)?;
    let mut path = reconstruct_path(&came_from, join);
    if let Some(idx) = prev_route.iter().position(|&(v, _)| v == join) {
        path.extend(prev_route[idx + 1..].iter().map(|&(v, _)| v));
    }

    return Ok(RoutingResult { path, distance });
}

/// Runs a [Dijkstra search](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// from `start` until all `targets` are settled, following outgoing or ingoing edges.
///
/// Returns the distances to the reached targets; unreachable targets are absent.
pub fn distances_from<G: Graph>(
    g: &mut G,
    start: G::Vertex,
    is_outgoing: bool,
    targets: &HashSet<G::Vertex>,
) -> HashMap<G::Vertex, G::Weight> {
    let mut found: HashMap<G::Vertex, G::Weight> = HashMap::default();
    let mut queue: BinaryHeap<QueueItem<G::Vertex, G::Weight>> = BinaryHeap::default();
    let mut known: HashMap<G::Vertex, G::Weight> = HashMap::default();
    let mut edges = Vec::new();

    queue.push(QueueItem {
        at: start,
        distance: G::Weight::zero(),
        key: G::Weight::zero(),
    });
    known.insert(start, G::Weight::zero());

    while let Some(item) = queue.pop() {
        if found.len() == targets.len() {
            break;
        }
        if known.get(&item.at).is_some_and(|&d| item.distance > d) {
            continue;
        }
        if targets.contains(&item.at) {
            found.entry(item.at).or_insert(item.distance);
        }

        edges.clear();
        g.edges(item.at, is_outgoing, &mut edges);
        for &(v, w) in &edges {
            let distance = item.distance + w;
            if known.get(&v).is_some_and(|&d| d <= distance) {
                continue;
            }
            known.insert(v, distance);
            queue.push(QueueItem {
                at: v,
                distance,
                key: distance,
            });
        }
    }

    return found;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::test_graph::{total, LineGraph};
    use crate::astar::find_path_bidirectional;
    use crate::RouteWeight;

    //   1 --- 2 --- 3 --- 4 --- 5
    //          \         /
    //           `-- 6 --'
    fn sample() -> LineGraph {
        let mut g = LineGraph::new(&[(1, 0.0), (2, 1.0), (3, 2.0), (4, 3.0), (5, 4.0), (6, 2.0)]);
        g.add_both(1, 2, 1.0);
        g.add_both(2, 3, 1.0);
        g.add_both(3, 4, 1.0);
        g.add_both(4, 5, 1.0);
        g.add_both(2, 6, 1.5);
        g.add_both(6, 4, 1.5);
        g
    }

    type Found = Result<RoutingResult<u32, RouteWeight>, AStarError>;

    fn uni(g: &mut LineGraph, start: u32, finish: u32, on_visit: &mut dyn FnMut(&mut LineGraph, u32, u32)) -> Found {
        find_path(
            g,
            Params {
                start,
                finish,
                visit_period: 1,
                cancelled: &|| false,
                on_visit,
                check_length: &|_| true,
            },
        )
    }

    fn bi(g: &mut LineGraph, start: u32, finish: u32) -> Found {
        find_path_bidirectional(
            g,
            Params {
                start,
                finish,
                visit_period: 1,
                cancelled: &|| false,
                on_visit: &mut |_, _, _| {},
                check_length: &|_| true,
            },
        )
    }

    #[test]
    fn finds_shortest_path() {
        let mut g = sample();
        let r = uni(&mut g, 1, 5, &mut |_, _, _| {}).unwrap();
        assert_eq!(r.path, vec![1, 2, 3, 4, 5]);
        assert_eq!(r.distance, RouteWeight::new(4.0));
    }

    #[test]
    fn agrees_with_bidirectional() {
        let mut g = sample();
        g.edges.get_mut(&3).unwrap().retain(|e| e.0 != 4);
        let uni = uni(&mut g, 1, 5, &mut |_, _, _| {}).unwrap();
        let bi = bi(&mut g, 1, 5).unwrap();
        assert_eq!(uni.path, vec![1, 2, 6, 4, 5]);
        assert_eq!(uni.distance, bi.distance);
        assert_eq!(total(&bi.path, &g), bi.distance);
    }

    #[test]
    fn visits_towards_finish() {
        let mut g = sample();
        let mut targets = Vec::new();
        uni(&mut g, 1, 5, &mut |_, _, to| targets.push(to)).unwrap();
        assert!(!targets.is_empty());
        assert!(targets.iter().all(|&t| t == 5));
    }

    #[test]
    fn no_path() {
        let mut g = sample();
        g.positions.insert(7, 9.0);
        assert_eq!(uni(&mut g, 1, 7, &mut |_, _, _| {}), Err(AStarError::NoPath));
    }

    #[test]
    fn adjust_joins_previous_route() {
        //   10 -> 3 is the only way onto the old route 1-2-3-4-5
        let mut g = sample();
        g.positions.insert(10, 2.5);
        g.add(10, 3, 1.0);

        let prev: Vec<(u32, RouteWeight)> = [1, 2, 3, 4, 5]
            .iter()
            .map(|&v| (v, RouteWeight::new(1.0)))
            .collect();

        let r = adjust_route(
            &mut g,
            AdjustParams {
                start: 10,
                prev_route: &prev,
                visit_period: 1,
                cancelled: &|| false,
                on_visit: &mut |_, _, _| {},
                check_length: &|_| true,
            },
        )
        .unwrap();

        assert_eq!(r.path, vec![10, 3, 4, 5]);
        assert_eq!(r.distance, RouteWeight::new(3.0));
    }

    #[test]
    fn adjust_rejects_long_detours() {
        let mut g = sample();
        g.positions.insert(10, 2.5);
        g.add(10, 3, 100.0);
        let prev: Vec<(u32, RouteWeight)> = [3, 4, 5]
            .iter()
            .map(|&v| (v, RouteWeight::new(1.0)))
            .collect();

        let r = adjust_route(
            &mut g,
            AdjustParams {
                start: 10,
                prev_route: &prev,
                visit_period: 1,
                cancelled: &|| false,
                on_visit: &mut |_, _, _| {},
                check_length: &|w| w.weight <= 30.0,
            },
        );
        assert_eq!(r, Err(AStarError::NoPath));
    }

    #[test]
    fn adjust_cancelled() {
        let mut g = sample();
        let prev = [(5, RouteWeight::ZERO)];
        let r = adjust_route(
            &mut g,
            AdjustParams {
                start: 1,
                prev_route: &prev,
                visit_period: 1,
                cancelled: &|| true,
                on_visit: &mut |_, _, _| {},
                check_length: &|_| true,
            },
        );
        assert_eq!(r, Err(AStarError::Cancelled));
    }

    #[test]
    fn distances_to_targets() {
        let mut g = sample();
        let targets: HashSet<u32> = [4, 6].into_iter().collect();

        let forward = distances_from(&mut g, 1, true, &targets);
        assert_eq!(forward.len(), 2);
        assert_eq!(forward[&4], RouteWeight::new(3.0));
        assert_eq!(forward[&6], RouteWeight::new(2.5));

        g.edges.remove(&6);
        let backward = distances_from(&mut g, 4, false, &targets);
        assert_eq!(backward.len(), 1);
        assert_eq!(backward[&4], RouteWeight::ZERO);
    }
}

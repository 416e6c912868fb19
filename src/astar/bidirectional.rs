// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap};

use super::{AStarError, Graph, Params, QueueItem, RoutingResult, Weight};

#[derive(Debug, Clone, Copy)]
struct Entry<V, W> {
    /// Distance with reduced edge weights, used for ordering.
    reduced: W,

    /// Actual distance from the origin of the side.
    real: W,
    parent: Option<V>,
}

/// One of the two frontiers of a bidirectional search.
struct Side<V, W> {
    is_forward: bool,
    target: V,
    queue: BinaryHeap<QueueItem<V, W>>,
    entries: HashMap<V, Entry<V, W>>,
}

impl<V: Copy + Eq + std::hash::Hash, W: Weight> Side<V, W> {
    fn new(is_forward: bool, origin: V, target: V) -> Self {
        let mut side = Self {
            is_forward,
            target,
            queue: BinaryHeap::default(),
            entries: HashMap::default(),
        };
        side.entries.insert(
            origin,
            Entry {
                reduced: W::zero(),
                real: W::zero(),
                parent: None,
            },
        );
        side.queue.push(QueueItem {
            at: origin,
            distance: W::zero(),
            key: W::zero(),
        });
        return side;
    }

    fn top(&self) -> Option<W> {
        self.queue.peek().map(|item| item.key)
    }

    /// Vertices from `v` back to the origin of this side.
    fn chain(&self, mut v: V) -> Vec<V> {
        let mut chain = vec![v];
        while let Some(parent) = self.entries.get(&v).and_then(|e| e.parent) {
            chain.push(parent);
            v = parent;
        }
        return chain;
    }
}

/// Averaged potential of the forward search; the backward potential is its negation.
/// Using both makes reduced weights consistent for both sides.
fn potential<G: Graph>(g: &mut G, v: G::Vertex, start: G::Vertex, finish: G::Vertex, is_forward: bool) -> f64 {
    let p = (g.heuristic(v, finish) - g.heuristic(v, start)) * 0.5;
    if is_forward {
        p
    } else {
        -p
    }
}

/// Finds the shortest path between `params.start` and `params.finish` with a
/// [bidirectional A*](https://en.wikipedia.org/wiki/Bidirectional_search) search.
///
/// Both frontiers use averaged potentials, and the search stops once the sum of the
/// tops of both queues is not better than the best known path through a vertex
/// reached from both sides.
///
/// Every `visit_period` settled vertices, `params.cancelled` is polled and
/// [AStarError::Cancelled] is returned once it reports true.
pub fn find_path_bidirectional<G: Graph>(
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

    let mut forward: Side<G::Vertex, G::Weight> = Side::new(true, start, finish);
    let mut backward: Side<G::Vertex, G::Weight> = Side::new(false, finish, start);

    // Best meeting vertex with the sum of reduced distances from both sides
    let mut best: Option<(G::Weight, G::Vertex)> = if start == finish {
        Some((G::Weight::zero(), start))
    } else {
        None
    };

    let mut edges = Vec::new();
    let mut steps: u32 = 0;

    loop {
        let use_forward = match (forward.top(), backward.top()) {
            (Some(f), Some(b)) => {
                if best.is_some_and(|(w, _)| f + b >= w) {
                    break;
                }
                f <= b
            }
            _ => break,
        };

        let (cur, other) = if use_forward {
            (&mut forward, &backward)
        } else {
            (&mut backward, &forward)
        };

        let Some(item) = cur.queue.pop() else {
            break;
        };
        let Some(entry) = cur.entries.get(&item.at).copied() else {
            continue;
        };

        // Multiple items for the same vertex may be kept in the queue
        if item.key > entry.reduced {
            continue;
        }

        steps += 1;
        if visit_period > 0 && steps % visit_period == 0 && cancelled() {
            return Err(AStarError::Cancelled);
        }
        on_visit(g, item.at, cur.target);

        let pu = potential(g, item.at, start, finish, cur.is_forward);

        edges.clear();
        g.edges(item.at, cur.is_forward, &mut edges);
        for &(v, w) in &edges {
            let real = entry.real + w;
            let remaining = g.heuristic(v, cur.target);
            if !check_length(real + G::Weight::from_potential(remaining)) {
                continue;
            }

            let pv = potential(g, v, start, finish, cur.is_forward);
            let reduced_edge =
                (w + G::Weight::from_potential(pv) - G::Weight::from_potential(pu)).non_negative();
            let reduced = entry.reduced + reduced_edge;

            if cur.entries.get(&v).is_some_and(|e| e.reduced <= reduced) {
                continue;
            }

            cur.entries.insert(
                v,
                Entry {
                    reduced,
                    real,
                    parent: Some(item.at),
                },
            );
            cur.queue.push(QueueItem {
                at: v,
                distance: real,
                key: reduced,
            });

            if let Some(o) = other.entries.get(&v) {
                let through = reduced + o.reduced;
                if best.is_none_or(|(w, _)| through < w) {
                    best = Some((through, v));
                }
            }
        }
    }

    let (_, meet) = best.ok_or(AStarError::NoPath)?;

    let mut path = forward.chain(meet);
    path.reverse();
    path.extend(backward.chain(meet).into_iter().skip(1));

    let distance = match (forward.entries.get(&meet), backward.entries.get(&meet)) {
        (Some(f), Some(b)) => f.real + b.real,
        _ => return Err(AStarError::NoPath),
    };

    return Ok(RoutingResult { path, distance });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::test_graph::{total, LineGraph};
    use crate::RouteWeight;

    fn search(g: &mut LineGraph, start: u32, finish: u32) -> Result<RoutingResult<u32, RouteWeight>, AStarError> {
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

    //   1 --- 2 --- 3 --- 4
    //    \               /
    //     `---- 5 -----'
    fn diamond() -> LineGraph {
        let mut g = LineGraph::new(&[(1, 0.0), (2, 1.0), (3, 2.0), (4, 3.0), (5, 1.5)]);
        g.add_both(1, 2, 1.0);
        g.add_both(2, 3, 1.0);
        g.add_both(3, 4, 1.0);
        g.add_both(1, 5, 2.0);
        g.add_both(5, 4, 2.0);
        g
    }

    #[test]
    fn shortest_path() {
        let mut g = diamond();
        let r = search(&mut g, 1, 4).unwrap();
        assert_eq!(r.path, vec![1, 2, 3, 4]);
        assert_eq!(r.distance, RouteWeight::new(3.0));
        assert_eq!(total(&r.path, &g), r.distance);
    }

    #[test]
    fn detour_when_cheaper() {
        let mut g = diamond();
        g.edges.get_mut(&2).unwrap().retain(|e| e.0 != 3);
        let r = search(&mut g, 1, 4).unwrap();
        assert_eq!(r.path, vec![1, 5, 4]);
        assert_eq!(r.distance, RouteWeight::new(4.0));
    }

    #[test]
    fn same_start_and_finish() {
        let mut g = diamond();
        let r = search(&mut g, 3, 3).unwrap();
        assert_eq!(r.path, vec![3]);
        assert_eq!(r.distance, RouteWeight::ZERO);
    }

    #[test]
    fn no_path() {
        let mut g = diamond();
        g.add(6, 1, 1.0);
        assert_eq!(search(&mut g, 1, 6), Err(AStarError::NoPath));
    }

    #[test]
    fn length_limit() {
        let mut g = diamond();
        let r = find_path_bidirectional(
            &mut g,
            Params {
                start: 1,
                finish: 4,
                visit_period: 1,
                cancelled: &|| false,
                on_visit: &mut |_, _, _| {},
                check_length: &|w| w.weight <= 1.5,
            },
        );
        assert_eq!(r, Err(AStarError::NoPath));
    }

    #[test]
    fn cancellation() {
        let mut g = diamond();
        let mut visited = 0;
        let r = find_path_bidirectional(
            &mut g,
            Params {
                start: 1,
                finish: 4,
                visit_period: 2,
                cancelled: &|| true,
                on_visit: &mut |_, _, _| visited += 1,
                check_length: &|_| true,
            },
        );
        assert_eq!(r, Err(AStarError::Cancelled));
        assert_eq!(visited, 1);
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Generic shortest path searches over lazily expanded graphs.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Add, Sub};

mod bidirectional;
mod error;
mod progress;
mod unidirectional;

pub use bidirectional::find_path_bidirectional;
pub use error::AStarError;
pub use progress::{Progress, SubProgress};
pub use unidirectional::{adjust_route, distances_from, find_path};

/// Weight of a path, totally ordered.
pub trait Weight: Copy + Ord + Debug + Add<Output = Self> + Sub<Output = Self> {
    fn zero() -> Self;
    fn infinity() -> Self;

    /// Converts a heuristic estimate (in seconds) into a weight.
    fn from_potential(seconds: f64) -> Self;

    /// Clamps negative components of the weight to zero.
    fn non_negative(self) -> Self;
}

/// A directed graph which is discovered while searching.
///
/// Edges follow a "weight of the target" convention: the weight of an edge `u → v`
/// is the cost of traversing `v`, as returned for outgoing edges of `u`
/// and for ingoing edges of `v` alike.
pub trait Graph {
    type Vertex: Copy + Eq + Hash + Debug;
    type Weight: Weight;

    /// Appends all outgoing (if `is_outgoing`) or ingoing edges of `v` to `out`.
    fn edges(
        &mut self,
        v: Self::Vertex,
        is_outgoing: bool,
        out: &mut Vec<(Self::Vertex, Self::Weight)>,
    );

    /// Lower bound of the path weight between two vertices, in seconds.
    fn heuristic(&mut self, from: Self::Vertex, to: Self::Vertex) -> f64;
}

/// Parameters of a point-to-point search.
pub struct Params<'a, G: Graph> {
    pub start: G::Vertex,
    pub finish: G::Vertex,

    /// Number of settled vertices between checks of [Params::cancelled].
    pub visit_period: u32,
    pub cancelled: &'a dyn Fn() -> bool,

    /// Called for every settled vertex together with the vertex the search heads to.
    pub on_visit: &'a mut dyn FnMut(&mut G, G::Vertex, G::Vertex),

    /// Paths whose estimated total weight is rejected by this function are not expanded.
    pub check_length: &'a dyn Fn(G::Weight) -> bool,
}

/// Parameters of a search joining an already known route.
pub struct AdjustParams<'a, G: Graph> {
    pub start: G::Vertex,

    /// The known route, as vertices with weights of the edges leading to them.
    pub prev_route: &'a [(G::Vertex, G::Weight)],

    pub visit_period: u32,
    pub cancelled: &'a dyn Fn() -> bool,
    pub on_visit: &'a mut dyn FnMut(&mut G, G::Vertex, G::Vertex),
    pub check_length: &'a dyn Fn(G::Weight) -> bool,
}

/// A found path together with its total weight.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingResult<V, W> {
    pub path: Vec<V>,
    pub distance: W,
}

#[derive(Debug, Clone, Copy)]
struct QueueItem<V, W> {
    at: V,
    distance: W,
    key: W,
}

impl<V, W: Ord> PartialEq for QueueItem<V, W> {
    fn eq(&self, other: &Self) -> bool {
        self.key.eq(&other.key)
    }
}

impl<V, W: Ord> PartialOrd for QueueItem<V, W> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, W: Ord> Eq for QueueItem<V, W> {}

impl<V, W: Ord> Ord for QueueItem<V, W> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower scores are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other.key.cmp(&self.key)
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::ops::{Add, Sub};

use crate::astar::Weight;

/// Composite weight of a (partial) route: travel time in seconds
/// together with counters of structural penalties.
///
/// Weights are compared by time first; equal times are ordered
/// by the number of barriers, transit transfers and fake edges, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteWeight {
    pub weight: f64,
    pub num_barriers: i32,
    pub num_transfers: i32,
    pub num_fake_edges: i32,
}

impl RouteWeight {
    pub const ZERO: Self = Self::new(0.0);

    pub const INFINITY: Self = Self {
        weight: f64::INFINITY,
        num_barriers: 0,
        num_transfers: 0,
        num_fake_edges: 0,
    };

    pub const fn new(weight: f64) -> Self {
        Self {
            weight,
            num_barriers: 0,
            num_transfers: 0,
            num_fake_edges: 0,
        }
    }

    pub fn with_fake_edge(mut self) -> Self {
        self.num_fake_edges += 1;
        self
    }

    pub fn with_barrier(mut self) -> Self {
        self.num_barriers += 1;
        self
    }

    pub fn with_transfer(mut self) -> Self {
        self.num_transfers += 1;
        self
    }
}

impl PartialEq for RouteWeight {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RouteWeight {}

impl PartialOrd for RouteWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RouteWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then(self.num_barriers.cmp(&other.num_barriers))
            .then(self.num_transfers.cmp(&other.num_transfers))
            .then(self.num_fake_edges.cmp(&other.num_fake_edges))
    }
}

impl Add for RouteWeight {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            weight: self.weight + rhs.weight,
            num_barriers: self.num_barriers + rhs.num_barriers,
            num_transfers: self.num_transfers + rhs.num_transfers,
            num_fake_edges: self.num_fake_edges + rhs.num_fake_edges,
        }
    }
}

impl Sub for RouteWeight {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            weight: self.weight - rhs.weight,
            num_barriers: self.num_barriers - rhs.num_barriers,
            num_transfers: self.num_transfers - rhs.num_transfers,
            num_fake_edges: self.num_fake_edges - rhs.num_fake_edges,
        }
    }
}

impl std::fmt::Display for RouteWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.1}s (barriers: {}, transfers: {}, fake: {})",
            self.weight, self.num_barriers, self.num_transfers, self.num_fake_edges
        )
    }
}

impl Weight for RouteWeight {
    fn zero() -> Self {
        Self::ZERO
    }

    fn infinity() -> Self {
        Self::INFINITY
    }

    fn from_potential(seconds: f64) -> Self {
        Self::new(seconds)
    }

    fn non_negative(self) -> Self {
        if self.weight < 0.0 {
            Self {
                weight: 0.0,
                ..self
            }
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        let a = RouteWeight::new(10.0);
        let b = RouteWeight::new(10.0).with_barrier();
        let c = RouteWeight::new(10.0).with_fake_edge();
        let d = RouteWeight::new(9.0).with_barrier().with_barrier();

        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
        assert!(d < a);
        assert!(RouteWeight::new(1e9) < RouteWeight::INFINITY);
        assert_eq!(a, RouteWeight::new(10.0));
    }

    #[test]
    fn arithmetic() {
        let a = RouteWeight::new(10.0).with_transfer();
        let b = RouteWeight::new(2.5).with_fake_edge();
        let sum = a + b;
        assert_eq!(sum.weight, 12.5);
        assert_eq!(sum.num_transfers, 1);
        assert_eq!(sum.num_fake_edges, 1);
        assert_eq!(sum - b, a);
        assert_eq!(RouteWeight::new(-0.5).non_negative().weight, 0.0);
    }
}

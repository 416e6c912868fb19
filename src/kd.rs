// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, LatLon};

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree)
/// over positioned items, used to find road points close to a query point.
///
/// This implementation assumes euclidean geometry, even though the distance function
/// used is [earth_distance]. This results in undefined behavior when points
/// are close to the ante meridian (180°/-180° longitude) or poles (90°/-90° latitude).
#[derive(Debug, Clone)]
pub struct KDTree<T> {
    pivot: (LatLon, T),
    left: Option<Box<KDTree<T>>>,
    right: Option<Box<KDTree<T>>>,
}

impl<T: Copy> KDTree<T> {
    /// Finds the closest item to the given position, together with its distance in meters.
    pub fn find_nearest(&self, point: LatLon) -> (T, f64) {
        let (best, dist) = self.find_nearest_impl(point, false);
        (best.1, dist)
    }

    fn find_nearest_impl(&self, point: LatLon, lon_divides: bool) -> ((LatLon, T), f64) {
        // Start by assuming that pivot is the closest
        let mut best = self.pivot;
        let mut best_dist = earth_distance(point, best.0);

        let (first, second) = if self.goes_left(point, lon_divides) {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(ref branch) = first {
            let (alt, alt_dist) = branch.find_nearest_impl(point, !lon_divides);
            if alt_dist < best_dist {
                best = alt;
                best_dist = alt_dist;
            }
        }

        // A closer item is possible in the second branch if and only if
        // the splitting axis is closer than the current best candidate.
        if let Some(ref branch) = second {
            if self.distance_to_axis(point, lon_divides) < best_dist {
                let (alt, alt_dist) = branch.find_nearest_impl(point, !lon_divides);
                if alt_dist < best_dist {
                    best = alt;
                    best_dist = alt_dist;
                }
            }
        }

        return (best, best_dist);
    }

    /// Appends all items within `radius` meters of the given position to `out`.
    pub fn find_within(&self, point: LatLon, radius: f64, out: &mut Vec<T>) {
        self.find_within_impl(point, radius, false, out);
    }

    fn find_within_impl(&self, point: LatLon, radius: f64, lon_divides: bool, out: &mut Vec<T>) {
        if earth_distance(point, self.pivot.0) <= radius {
            out.push(self.pivot.1);
        }

        let (near, far) = if self.goes_left(point, lon_divides) {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(ref branch) = near {
            branch.find_within_impl(point, radius, !lon_divides, out);
        }

        if let Some(ref branch) = far {
            if self.distance_to_axis(point, lon_divides) <= radius {
                branch.find_within_impl(point, radius, !lon_divides, out);
            }
        }
    }

    fn goes_left(&self, point: LatLon, lon_divides: bool) -> bool {
        if lon_divides {
            point.lon < self.pivot.0.lon
        } else {
            point.lat < self.pivot.0.lat
        }
    }

    fn distance_to_axis(&self, point: LatLon, lon_divides: bool) -> f64 {
        let axis = if lon_divides {
            LatLon::new(point.lat, self.pivot.0.lon)
        } else {
            LatLon::new(self.pivot.0.lat, point.lon)
        };
        earth_distance(point, axis)
    }

    /// Builds a k-d tree from a mutable slice of positioned items. Items will be reordered
    /// in the slice to facilitate building the tree.
    pub fn build(items: &mut [(LatLon, T)]) -> Option<Self> {
        Self::build_impl(items, false)
    }

    fn build_impl(items: &mut [(LatLon, T)], lon_divides: bool) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => Some(Self {
                pivot: items[0],
                left: None,
                right: None,
            }),
            _ => {
                if lon_divides {
                    items.sort_by(|a, b| a.0.lon.total_cmp(&b.0.lon));
                } else {
                    items.sort_by(|a, b| a.0.lat.total_cmp(&b.0.lat));
                }
                let median = items.len() / 2;
                let pivot = items[median];
                let (left, right_and_pivot) = items.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: Self::build_impl(left, !lon_divides).map(Box::new),
                    right: Self::build_impl(right, !lon_divides).map(Box::new),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KDTree<u32> {
        KDTree::build(&mut [
            (LatLon::new(0.01, 0.01), 1),
            (LatLon::new(0.01, 0.05), 2),
            (LatLon::new(0.03, 0.09), 3),
            (LatLon::new(0.04, 0.03), 4),
            (LatLon::new(0.04, 0.07), 5),
            (LatLon::new(0.07, 0.03), 6),
            (LatLon::new(0.07, 0.01), 7),
            (LatLon::new(0.08, 0.05), 8),
            (LatLon::new(0.08, 0.09), 9),
        ])
        .expect("k-d tree from non-empty slice must not be empty")
    }

    #[test]
    fn nearest() {
        let tree = sample();
        assert_eq!(tree.find_nearest(LatLon::new(0.02, 0.02)).0, 1);
        assert_eq!(tree.find_nearest(LatLon::new(0.05, 0.03)).0, 4);
        assert_eq!(tree.find_nearest(LatLon::new(0.05, 0.08)).0, 5);
        assert_eq!(tree.find_nearest(LatLon::new(0.09, 0.06)).0, 8);
    }

    #[test]
    fn within() {
        let tree = sample();

        let mut found = Vec::new();
        tree.find_within(LatLon::new(0.055, 0.03), 2_000.0, &mut found);
        found.sort();
        assert_eq!(found, vec![4, 6]);

        found.clear();
        tree.find_within(LatLon::new(0.055, 0.03), 100.0, &mut found);
        assert!(found.is_empty());
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Synthetic partitions shared by unit tests.

use std::collections::HashMap;

use crate::store::{MemoryStore, Partition, Road, StoreBuilder};
use crate::{Junction, LatLon};

/// Number of nodes along each side of a test grid.
pub(crate) const GRID_SIZE: usize = 6;

/// Distance between neighbouring grid nodes, in degrees (about 222 m).
pub(crate) const SPACING: f64 = 0.002;

pub(crate) const WEST_BASE: i64 = 1000;
pub(crate) const EAST_BASE: i64 = 2000;
pub(crate) const FAR_EAST_BASE: i64 = 3000;

/// Node id of a grid node.
pub(crate) fn grid_node(base: i64, row: usize, col: usize) -> i64 {
    base + row as i64 * 100 + col as i64
}

/// Position of a grid node in a grid whose south-west corner is at (0, `lon0`).
pub(crate) fn grid_point(lon0: f64, row: usize, col: usize) -> LatLon {
    LatLon::new(row as f64 * SPACING, lon0 + col as f64 * SPACING)
}

pub(crate) fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|&(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub(crate) fn road_tagged(id: i64, road_tags: &[(&str, &str)], points: &[(i64, f64, f64)]) -> Road {
    Road {
        id,
        tags: tags(road_tags),
        nodes: points.iter().map(|p| p.0).collect(),
        points: points
            .iter()
            .map(|&(_, lat, lon)| Junction::flat(LatLon::new(lat, lon)))
            .collect(),
        speed_cameras: Vec::new(),
    }
}

pub(crate) fn road(id: i64, highway: &str, points: &[(i64, f64, f64)]) -> Road {
    road_tagged(id, &[("highway", highway)], points)
}

/// Builds a square grid of two-way roads: row roads (west to east) come first,
/// followed by column roads (south to north).
///
/// If `west` is set, the first column reuses the last column of the grid with base `west`,
/// and its column road is left out (it belongs to the western grid).
pub(crate) fn grid(name: &str, base: i64, lon0: f64, highway: &str, west: Option<i64>) -> Partition {
    let node = |row: usize, col: usize| match west {
        Some(west_base) if col == 0 => grid_node(west_base, row, GRID_SIZE - 1),
        _ => grid_node(base, row, col),
    };
    let point = |row: usize, col: usize| {
        let p = grid_point(lon0, row, col);
        (node(row, col), p.lat, p.lon)
    };

    let mut roads = Vec::new();
    for row in 0..GRID_SIZE {
        let points: Vec<_> = (0..GRID_SIZE).map(|col| point(row, col)).collect();
        roads.push(road(base * 10 + row as i64, highway, &points));
    }
    for col in 0..GRID_SIZE {
        if col == 0 && west.is_some() {
            continue;
        }
        let points: Vec<_> = (0..GRID_SIZE).map(|row| point(row, col)).collect();
        roads.push(road(base * 10 + 50 + col as i64, highway, &points));
    }

    Partition {
        name: name.to_string(),
        roads,
        ..Default::default()
    }
}

/// Longitude of the western edge of the `i`-th grid in a west-to-east chain.
pub(crate) fn grid_lon(i: usize) -> f64 {
    i as f64 * (GRID_SIZE - 1) as f64 * SPACING
}

pub(crate) fn single_grid() -> MemoryStore {
    let mut b = StoreBuilder::new();
    b.add(grid("west", WEST_BASE, grid_lon(0), "residential", None));
    b.build()
}

/// Two grids sharing the border column of nodes at longitude 0.01.
pub(crate) fn two_partitions() -> MemoryStore {
    let mut b = StoreBuilder::new();
    b.add(grid("west", WEST_BASE, grid_lon(0), "residential", None));
    b.add(grid("east", EAST_BASE, grid_lon(1), "residential", Some(WEST_BASE)));
    b.build()
}

/// Three grids in a row; the outer ones are not neighbours of each other.
pub(crate) fn three_partitions() -> MemoryStore {
    let mut b = StoreBuilder::new();
    b.add(grid("west", WEST_BASE, grid_lon(0), "residential", None));
    b.add(grid("east", EAST_BASE, grid_lon(1), "residential", Some(WEST_BASE)));
    b.add(grid("far-east", FAR_EAST_BASE, grid_lon(2), "residential", Some(EAST_BASE)));
    b.build()
}

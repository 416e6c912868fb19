// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Point-to-point routing over road networks split into partitions (regions).
//!
//! Every partition is routable on its own, as an index graph whose vertices are
//! directed road segments. A [WorldGraph] stitches loaded partitions together
//! through their shared border nodes, and can view them in several
//! [modes](WorldGraphMode): confined to single partitions, collapsed into
//! "joints" (runs of segments between junctions), or as "leaps" between
//! partition exits. The [Router] combines these views to answer queries for
//! pedestrians, bicycles, cars and public transport.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! let mut builder = regionroute::store::StoreBuilder::new();
//! for path in ["path/to/region-a.osm.bz2", "path/to/region-b.osm.bz2"] {
//!     let options = regionroute::store::osm::Options::default();
//!     let partition = regionroute::store::osm::read_partition_from_file(path, &options, path)
//!         .expect("failed to load partition");
//!     builder.add(partition);
//! }
//!
//! let mut router = regionroute::Router::new(
//!     regionroute::VehicleType::Car,
//!     Arc::new(builder.build()),
//!     None,
//!     regionroute::router::Options::default(),
//! );
//! let route = router
//!     .route_between(vec![
//!         regionroute::LatLon::new(52.2297, 21.0122),
//!         regionroute::LatLon::new(52.4064, 16.9252),
//!     ])
//!     .expect("failed to find route");
//!
//! println!("{:.0} s, {:.0} m", route.total_time(), route.total_distance());
//! ```

pub mod astar;
mod checkpoints;
mod delegate;
pub mod distance;
pub mod estimator;
pub mod joints;
mod kd;
pub mod leaps;
pub mod redress;
mod route;
pub mod router;
mod segment;
pub mod starter;
pub mod store;
pub mod vehicle;
mod weight;
pub mod world;

#[cfg(test)]
mod testing;

pub use astar::AStarError;
pub use checkpoints::{Checkpoints, CheckpointsError};
pub use delegate::{NoopDelegate, RouterDelegate};
pub use distance::earth_distance;
pub use kd::KDTree;
pub use route::{Route, RouteSegment, SubrouteAttrs, TurnDirection, TurnItem};
pub use router::{Router, RouterResultCode};
pub use segment::{Junction, LatLon, PartitionId, Segment, DEFAULT_ALTITUDE, FAKE_PARTITION_ID};
pub use vehicle::VehicleType;
pub use weight::RouteWeight;
pub use world::{WorldGraph, WorldGraphMode};

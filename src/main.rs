// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use regionroute::store::{osm, MemoryStore, StoreBuilder};
use regionroute::{LatLon, Router, VehicleType};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct PartitionLoadError(PathBuf, #[source] regionroute::store::Error);

#[derive(Debug, thiserror::Error)]
#[error("routing failed: {0}")]
struct RoutingError(regionroute::RouterResultCode);

#[derive(Parser)]
struct Cli {
    /// Paths to OSM files, one per partition. Neighbouring extracts must share border nodes.
    #[arg(short, long = "partition", required = true)]
    partitions: Vec<PathBuf>,

    /// Vehicle type: pedestrian, bicycle, car or transit
    #[arg(short, long, default_value = "car")]
    vehicle: VehicleType,

    /// Latitude of the start point
    start_lat: f64,

    /// Longitude of the start point
    start_lon: f64,

    /// Latitude of the end point
    end_lat: f64,

    /// Longitude of the end point
    end_lon: f64,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let store = load_store(&cli.partitions)?;
    let mut router = Router::new(cli.vehicle, Arc::new(store), None, Default::default());

    let points = vec![
        LatLon::new(cli.start_lat, cli.start_lon),
        LatLon::new(cli.end_lat, cli.end_lon),
    ];
    let route = match router.route_between(points) {
        Ok(route) => route,
        Err(regionroute::router::Error::Route(code)) => return Err(RoutingError(code).into()),
        Err(e) => return Err(e.into()),
    };

    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{");
    println!("        \"time\": {:.1},", route.total_time());
    println!("        \"distance\": {:.1}", route.total_distance());
    println!("      }},");

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut points = route.polyline().into_iter().peekable();
    while let Some(p) = points.next() {
        let suffix = if points.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", p.lon, p.lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");

    Ok(())
}

fn load_store(paths: &[PathBuf]) -> Result<MemoryStore, PartitionLoadError> {
    let mut builder = StoreBuilder::new();
    for path in paths {
        builder.add(load_partition(path)?);
    }
    Ok(builder.build())
}

fn load_partition<P: AsRef<Path>>(path: P) -> Result<regionroute::store::Partition, PartitionLoadError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let options = osm::Options {
        file_format: osm::FileFormat::from_path(path),
        ..Default::default()
    };
    match osm::read_partition_from_file(&name, &options, path) {
        Ok(p) => Ok(p),
        Err(e) => Err(PartitionLoadError(PathBuf::from(path), e)),
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Reading partitions from [OpenStreetMap](https://www.openstreetmap.org/) extracts.
//!
//! Every extract becomes one [Partition]. Extracts of neighbouring regions
//! should share the nodes on their common border, so that a
//! [StoreBuilder](super::StoreBuilder) can stitch them together.

use std::fs::File;
use std::io;
use std::path::Path;

use builder::PartitionBuilder;

use super::{Error, Partition, SpeedCameraPolicy};

mod builder;
mod model;
mod xml;

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Guess the format based on the file extension
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format of a file based on its extension, defaulting to [FileFormat::Xml].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let name = path.as_ref().to_string_lossy();
        if name.ends_with(".gz") {
            Self::XmlGz
        } else if name.ends_with(".bz2") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// Additional controls for interpreting OSM data as a [Partition].
#[derive(Debug, Clone)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,

    /// Filter nodes by a specific bounding box. In order: left (min lon), bottom (min lat),
    /// right (max lon), top (max lat). Ignored if all values are set to zero, or at least one
    /// of them is not finite.
    pub bbox: [f64; 4],

    /// Whether speed camera data may be shown inside the partition.
    pub speed_cameras: SpeedCameraPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            file_format: FileFormat::Unknown,
            bbox: [0.0; 4],
            speed_cameras: SpeedCameraPolicy::Allowed,
        }
    }
}

/// Parse a [Partition] from a reader.
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn read_partition_from_io<R: io::Read>(
    name: &str,
    options: &Options,
    reader: R,
) -> Result<Partition, Error> {
    let mut builder = PartitionBuilder::new(options);

    match options.file_format {
        FileFormat::Unknown | FileFormat::Xml => {
            let b = io::BufReader::new(reader);
            builder.add_features(xml::Reader::from_io(b))?;
        }

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(reader);
            let b = io::BufReader::new(d);
            builder.add_features(xml::Reader::from_io(b))?;
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(reader);
            let b = io::BufReader::new(d);
            builder.add_features(xml::Reader::from_io(b))?;
        }
    }

    let partition = builder.build(name);
    log::info!(
        "loaded partition {:?}: {} roads, {} restrictions",
        name,
        partition.roads.len(),
        partition.restrictions.len(),
    );
    Ok(partition)
}

/// Parse a [Partition] from a file at the provided path.
/// [FileFormat::Unknown] is resolved with [FileFormat::from_path].
pub fn read_partition_from_file<P: AsRef<Path>>(
    name: &str,
    options: &Options,
    path: P,
) -> Result<Partition, Error> {
    let mut options = options.clone();
    if options.file_format == FileFormat::Unknown {
        options.file_format = FileFormat::from_path(&path);
    }

    let f = File::open(path)?;
    read_partition_from_io(name, &options, f)
}

/// Parse a [Partition] from an in-memory buffer.
pub fn read_partition_from_buffer(
    name: &str,
    options: &Options,
    data: &[u8],
) -> Result<Partition, Error> {
    match options.file_format {
        FileFormat::Unknown | FileFormat::Xml => {
            // Fast path is available for in-memory XML data
            let mut builder = PartitionBuilder::new(options);
            builder.add_features(xml::Reader::from_buffer(data))?;
            Ok(builder.build(name))
        }
        _ => read_partition_from_io(name, options, io::Cursor::new(data)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::VehicleType;

    const DATA: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="-1" lat="0.0" lon="0.0"/>
  <node id="-2" lat="0.0" lon="0.001">
    <tag k="highway" v="speed_camera"/>
    <tag k="maxspeed" v="50"/>
  </node>
  <node id="-3" lat="0.0" lon="0.002">
    <tag k="barrier" v="lift_gate"/>
  </node>
  <node id="-4" lat="0.001" lon="0.002">
    <tag k="ele" v="120.4"/>
  </node>
  <node id="-5" lat="0.002" lon="0.002"/>
  <node id="-6" lat="0.0" lon="0.003"/>
  <node id="-7" lat="0.5" lon="0.5">
    <tag k="barrier" v="gate"/>
  </node>
  <way id="-10">
    <nd ref="-1"/>
    <nd ref="-2"/>
    <nd ref="-3"/>
    <tag k="highway" v="primary"/>
    <tag k="name" v="Main Street"/>
  </way>
  <way id="-11">
    <nd ref="-3"/>
    <nd ref="-4"/>
    <nd ref="-99"/>
    <tag k="highway" v="residential"/>
  </way>
  <way id="-12">
    <nd ref="-3"/>
    <nd ref="-6"/>
    <tag k="railway" v="tram"/>
    <tag k="ref" v="17"/>
  </way>
  <way id="-13">
    <nd ref="-4"/>
    <nd ref="-5"/>
    <tag k="building" v="yes"/>
  </way>
  <relation id="-20">
    <member type="way" ref="-10" role="from"/>
    <member type="node" ref="-3" role="via"/>
    <member type="way" ref="-11" role="to"/>
    <tag k="type" v="restriction"/>
    <tag k="restriction" v="no_left_turn"/>
  </relation>
  <relation id="-21">
    <member type="way" ref="-10" role="from"/>
    <member type="way" ref="-12" role="via"/>
    <member type="way" ref="-11" role="to"/>
    <tag k="type" v="restriction"/>
    <tag k="restriction" v="no_u_turn"/>
  </relation>
</osm>
"#;

    fn check_partition(p: &Partition) {
        assert_eq!(p.name, "test");
        assert_eq!(p.roads.len(), 3);

        let main = &p.roads[0];
        assert_eq!(main.id, -10);
        assert_eq!(main.nodes, vec![-1, -2, -3]);
        assert_eq!(main.name(), Some("Main Street"));
        assert_eq!(main.speed_cameras.len(), 1);
        assert_eq!(main.speed_cameras[0].point, 1);
        assert_eq!(main.speed_cameras[0].max_speed, Some(50));

        // Unknown node references are dropped
        assert_eq!(p.roads[1].nodes, vec![-3, -4]);
        assert_eq!(p.roads[1].points[1].altitude, 120);

        // Only barriers on roads are kept
        assert_eq!(p.barriers.len(), 1);
        assert!(p.barriers.contains(&-3));

        // Via-way restrictions are not supported
        assert_eq!(p.restrictions.len(), 1);
        assert_eq!(p.restrictions[0].from, 0);
        assert_eq!(p.restrictions[0].via, -3);
        assert_eq!(p.restrictions[0].to, 1);

        let transit = p.transit.as_ref().expect("tram line should create a transit section");
        assert_eq!(transit.lines[&2].mode, "tram");
        assert_eq!(transit.lines[&2].line, "17");
        assert!(VehicleType::Transit.model().road_class(&p.roads[2].tags).is_some());
    }

    #[test]
    fn read_xml() {
        let options = Options {
            file_format: FileFormat::Xml,
            ..Default::default()
        };
        let p = read_partition_from_buffer("test", &options, DATA).unwrap();
        check_partition(&p);
    }

    #[test]
    fn read_gz() {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        encoder.write_all(DATA).unwrap();
        let compressed = encoder.finish().unwrap();

        let options = Options {
            file_format: FileFormat::XmlGz,
            ..Default::default()
        };
        let p = read_partition_from_buffer("test", &options, &compressed).unwrap();
        check_partition(&p);
    }

    #[test]
    fn bbox_filter() {
        let options = Options {
            file_format: FileFormat::Xml,
            bbox: [-0.0005, -0.0005, 0.0015, 0.0005],
            ..Default::default()
        };
        let p = read_partition_from_buffer("test", &options, DATA).unwrap();
        assert_eq!(p.roads.len(), 1);
        assert_eq!(p.roads[0].nodes, vec![-1, -2]);
    }

    #[test]
    fn format_from_path() {
        assert_eq!(FileFormat::from_path("a/b.osm"), FileFormat::Xml);
        assert_eq!(FileFormat::from_path("a/b.osm.gz"), FileFormat::XmlGz);
        assert_eq!(FileFormat::from_path("a/b.osm.bz2"), FileFormat::XmlBz2);
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};

use crate::store::{Partition, Restriction, Road, SpeedCamera, TransitInfo, TransitSection};
use crate::{Junction, LatLon, DEFAULT_ALTITUDE};

use super::model::{self, FeatureType};
use super::Options;

/// Helper object used for storing state related to converting [OSM features](super::model::Feature)
/// into a [Partition].
pub(super) struct PartitionBuilder<'a> {
    options: &'a Options,
    nodes: HashMap<i64, model::Node>,
    ways: Vec<model::Way>,
    relations: Vec<model::Relation>,
    ignore_bbox: bool,
}

impl<'a> PartitionBuilder<'a> {
    pub(super) fn new(options: &'a Options) -> Self {
        let ignore_bbox =
            options.bbox.iter().all(|&x| x == 0.0) || options.bbox.iter().any(|x| !x.is_finite());

        Self {
            options,
            nodes: HashMap::default(),
            ways: Vec::default(),
            relations: Vec::default(),
            ignore_bbox,
        }
    }

    /// Add all features from the provided iterator.
    pub(super) fn add_features<E, I: Iterator<Item = Result<model::Feature, E>>>(
        &mut self,
        features: I,
    ) -> Result<(), E> {
        for f in features {
            match f? {
                model::Feature::Node(n) => self.add_node(n),
                model::Feature::Way(w) => self.add_way(w),
                model::Feature::Relation(r) => self.add_relation(r),
            }
        }
        Ok(())
    }

    fn add_node(&mut self, n: model::Node) {
        if self.is_in_bbox(n.lat, n.lon) {
            self.nodes.insert(n.id, n);
        }
    }

    fn is_in_bbox(&self, lat: f64, lon: f64) -> bool {
        if self.ignore_bbox {
            return true;
        }
        let [min_lon, min_lat, max_lon, max_lat] = self.options.bbox;
        lat >= min_lat && lat <= max_lat && lon >= min_lon && lon <= max_lon
    }

    fn add_way(&mut self, w: model::Way) {
        let is_road = w.tags.contains_key("highway")
            || w.tags.contains_key("railway")
            || w.tags.get("route").map(|v| v.as_str()) == Some("ferry");
        if is_road {
            self.ways.push(w);
        }
    }

    fn add_relation(&mut self, r: model::Relation) {
        if r.tags.get("type").map(|v| v.as_str()) == Some("restriction") {
            self.relations.push(r);
        }
    }

    /// Converts all collected features into a [Partition].
    pub(super) fn build(self, name: &str) -> Partition {
        let mut partition = Partition {
            name: name.to_string(),
            speed_cameras: self.options.speed_cameras,
            ..Default::default()
        };
        let mut way_features: HashMap<i64, u32> = HashMap::default();
        let mut used_nodes: HashSet<i64> = HashSet::default();
        let mut transit = TransitSection::default();

        for w in &self.ways {
            let nodes: Vec<i64> = w
                .nodes
                .iter()
                .copied()
                .filter(|id| self.nodes.contains_key(id))
                .collect();

            if nodes.len() < 2 {
                log::debug!("way {} has less than 2 known nodes - skipping", w.id);
                continue;
            }

            let feature = partition.roads.len() as u32;
            let mut points = Vec::with_capacity(nodes.len());
            let mut speed_cameras = Vec::new();
            for (idx, id) in nodes.iter().enumerate() {
                let n = &self.nodes[id];
                points.push(Junction::new(LatLon::new(n.lat, n.lon), node_altitude(n)));
                if n.tags.get("highway").map(|v| v.as_str()) == Some("speed_camera") {
                    speed_cameras.push(SpeedCamera {
                        point: idx as u32,
                        max_speed: n.tags.get("maxspeed").and_then(|v| v.parse().ok()),
                    });
                }
            }

            if let Some(mode @ ("subway" | "light_rail" | "tram")) =
                w.tags.get("railway").map(|v| v.as_str())
            {
                let line = w
                    .tags
                    .get("name")
                    .or_else(|| w.tags.get("ref"))
                    .cloned()
                    .unwrap_or_default();
                transit.lines.insert(
                    feature,
                    TransitInfo {
                        mode: mode.to_string(),
                        line,
                    },
                );
            }

            used_nodes.extend(nodes.iter().copied());
            way_features.insert(w.id, feature);
            partition.roads.push(Road {
                id: w.id,
                tags: w.tags.clone(),
                nodes,
                points,
                speed_cameras,
            });
        }

        partition.barriers = used_nodes
            .iter()
            .copied()
            .filter(|id| is_barrier(&self.nodes[id]))
            .collect();

        for r in &self.relations {
            match restriction_members(r, &way_features) {
                Ok((from, via, to)) => partition.restrictions.push(Restriction {
                    tags: r.tags.clone(),
                    from,
                    via,
                    to,
                }),
                Err(e) => log::debug!("skipping restriction {}: {}", r.id, e),
            }
        }

        if !transit.lines.is_empty() {
            partition.transit = Some(transit);
        }

        return partition;
    }
}

fn node_altitude(n: &model::Node) -> i16 {
    n.tags
        .get("ele")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|ele| ele.is_finite())
        .map(|ele| ele.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16)
        .unwrap_or(DEFAULT_ALTITUDE)
}

fn is_barrier(n: &model::Node) -> bool {
    match n.tags.get("barrier").map(|v| v.as_str()) {
        None | Some("no") | Some("kerb") | Some("entrance") => false,
        Some(_) => true,
    }
}

/// Returns the (from feature, via node, to feature) triple of a restriction.
/// Only restrictions with a single via node are supported.
fn restriction_members(
    r: &model::Relation,
    way_features: &HashMap<i64, u32>,
) -> Result<(u32, i64, u32), InvalidRestriction> {
    let mut from: Option<&model::RelationMember> = None;
    let mut via: Option<&model::RelationMember> = None;
    let mut to: Option<&model::RelationMember> = None;

    for m in &r.members {
        let slot = match m.role.as_str() {
            "from" => &mut from,
            "via" => &mut via,
            "to" => &mut to,
            _ => continue,
        };
        if slot.is_some() {
            return Err(InvalidRestriction::MultipleMembers(m.role.clone()));
        }
        *slot = Some(m);
    }

    let (from, via, to) = match (from, via, to) {
        (Some(from), Some(via), Some(to)) => (from, via, to),
        (None, _, _) => return Err(InvalidRestriction::MissingMember("from")),
        (_, None, _) => return Err(InvalidRestriction::MissingMember("via")),
        (_, _, None) => return Err(InvalidRestriction::MissingMember("to")),
    };

    if via.type_ != FeatureType::Node {
        return Err(InvalidRestriction::UnsupportedVia);
    }

    let feature = |m: &model::RelationMember| -> Result<u32, InvalidRestriction> {
        if m.type_ != FeatureType::Way {
            return Err(InvalidRestriction::InvalidMemberType(m.role.clone()));
        }
        way_features
            .get(&m.ref_)
            .copied()
            .ok_or(InvalidRestriction::ReferenceToUnknownWay(m.ref_))
    };

    Ok((feature(from)?, via.ref_, feature(to)?))
}

#[derive(Debug)]
enum InvalidRestriction {
    MultipleMembers(String),
    MissingMember(&'static str),
    UnsupportedVia,
    InvalidMemberType(String),
    ReferenceToUnknownWay(i64),
}

impl std::fmt::Display for InvalidRestriction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleMembers(role) => write!(f, "multiple '{role}' members"),
            Self::MissingMember(role) => write!(f, "missing '{role}' member"),
            Self::UnsupportedVia => write!(f, "only via nodes are supported"),
            Self::InvalidMemberType(role) => write!(f, "member with role {role} must be a way"),
            Self::ReferenceToUnknownWay(way_id) => write!(f, "reference to unknown way {way_id}"),
        }
    }
}

impl std::error::Error for InvalidRestriction {}

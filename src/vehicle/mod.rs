// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

mod models;

pub use models::{BICYCLE_MODEL, CAR_MODEL, PEDESTRIAN_MODEL, TRANSIT_MODEL};

/// Vehicle class a route is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleType {
    Pedestrian,
    Bicycle,
    Car,
    Transit,
}

impl VehicleType {
    /// The [VehicleModel] used to interpret road attributes for this vehicle.
    pub fn model(self) -> &'static VehicleModel<'static> {
        match self {
            Self::Pedestrian => &PEDESTRIAN_MODEL,
            Self::Bicycle => &BICYCLE_MODEL,
            Self::Car => &CAR_MODEL,
            Self::Transit => &TRANSIT_MODEL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pedestrian => "pedestrian",
            Self::Bicycle => "bicycle",
            Self::Car => "car",
            Self::Transit => "transit",
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pedestrian" | "foot" => Ok(Self::Pedestrian),
            "bicycle" | "bike" => Ok(Self::Bicycle),
            "car" => Ok(Self::Car),
            "transit" => Ok(Self::Transit),
            _ => Err(format!("unknown vehicle type: {s}")),
        }
    }
}

/// Describes how road attributes (OSM tags) translate into
/// traversal speeds and permissions for one vehicle class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleModel<'a> {
    /// Human readable name, customary the most specific
    /// [access tag](https://wiki.openstreetmap.org/wiki/Key:access).
    pub name: &'a str,

    /// Road classes usable for routing, matched in order against way tags.
    /// Ways without a matching [RoadSpeed] are not routable.
    pub speeds: &'a [RoadSpeed<'a>],

    /// Array of OSM [access tags](https://wiki.openstreetmap.org/wiki/Key:access#Land-based_transportation)
    /// (in order from least to most specific) to consider when checking for road prohibitions.
    pub access: &'a [&'a str],

    /// Pedestrian semantics: `oneway` tags are ignored - only `oneway:foot` tags are considered, except on:
    /// - `highway=footway`,
    /// - `highway=path`,
    /// - `highway=steps`,
    /// - `highway=platform`
    /// - `public_transport=platform`,
    /// - `railway=platform`;
    ///
    /// and only `restriction:foot` turn restrictions are considered.
    pub pedestrian: bool,

    /// Force no routing over [motorroad=yes](https://wiki.openstreetmap.org/wiki/Key:motorroad) ways.
    pub disallow_motorroad: bool,

    /// Force ignoring of [turn restrictions](https://wiki.openstreetmap.org/wiki/Turn_restriction).
    pub disable_restrictions: bool,

    /// Speed of moving between a query point and the road network, in km/h.
    pub offroad_speed: f64,
}

/// Traversal speed for OSM ways with specific keys and values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSpeed<'a> {
    /// Key of an OSM way for which this speed applies, e.g. "highway" or "railway".
    pub key: &'a str,

    /// Value under [RoadSpeed::key], e.g. "motorway", "residential" or "subway".
    pub value: &'a str,

    /// Speed in km/h. Must be finite and positive.
    pub speed: f64,

    /// Set for public transport lines, boarding which counts as a transfer.
    pub transit: bool,
}

/// Turn restriction kind indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRestriction {
    /// Not a turn restriction, or a turn restriction which does not apply for the current [VehicleModel].
    Inapplicable,

    /// The turn indicated by this restriction is prohibited.
    Prohibitory,

    /// The turn indicated by this restriction is the only one allowed from the `from` road.
    Mandatory,
}

/// Set of road kinds which can be reported on a route or avoided by cars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoadTypes(u8);

impl RoadTypes {
    pub const NONE: Self = Self(0);
    pub const TOLL: Self = Self(1);
    pub const MOTORWAY: Self = Self(1 << 1);
    pub const FERRY: Self = Self(1 << 2);
    pub const DIRTY: Self = Self(1 << 3);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Classifies a way with given tags.
    pub fn from_tags(tags: &HashMap<String, String>) -> Self {
        let mut types = Self::NONE;

        if matches!(tags.get("toll").map(|v| v.as_str()), Some("yes")) {
            types = types | Self::TOLL;
        }

        match tags.get("highway").map(|v| v.as_str()) {
            Some("motorway") | Some("motorway_link") => types = types | Self::MOTORWAY,
            Some("track") => types = types | Self::DIRTY,
            _ => {}
        }

        if tags.get("route").map(|v| v.as_str()) == Some("ferry") {
            types = types | Self::FERRY;
        }

        match tags.get("surface").map(|v| v.as_str()) {
            Some("unpaved") | Some("dirt") | Some("ground") | Some("gravel") | Some("grass")
            | Some("mud") | Some("sand") => types = types | Self::DIRTY,
            _ => {}
        }

        return types;
    }
}

impl std::ops::BitOr for RoadTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl<'a> VehicleModel<'a> {
    /// Finds the first matching [RoadSpeed] for a way with given tags.
    /// Returns `None` if there is no matching class, or if the way is disallowed
    /// by the access tags (as determined by [VehicleModel::is_allowed]).
    pub fn road_class(&self, tags: &HashMap<String, String>) -> Option<&'a RoadSpeed<'a>> {
        let class = self
            .speeds
            .iter()
            .find(|s| tags.get(s.key).map(|v| v.as_str()) == Some(s.value))?;

        if !(class.speed.is_finite() && class.speed > 0.0) || !self.is_allowed(tags) {
            return None;
        }
        return Some(class);
    }

    /// Returns the speed, in km/h, over a way with given tags,
    /// or `None` if the way is not routable.
    pub fn way_speed(&self, tags: &HashMap<String, String>) -> Option<f64> {
        self.road_class(tags).map(|class| class.speed)
    }

    /// Returns the fastest speed of any road class of this model, in km/h.
    pub fn max_speed(&self) -> f64 {
        self.speeds
            .iter()
            .map(|s| s.speed)
            .fold(self.offroad_speed, f64::max)
    }

    /// Checks if the way is routable, by considering motor roads ([VehicleModel::disallow_motorroad])
    /// and access tags ([VehicleModel::access]).
    pub fn is_allowed(&self, tags: &HashMap<String, String>) -> bool {
        // Check against the motorroad tag
        if self.disallow_motorroad && tags.get("motorroad").map(|v| v.as_str()) == Some("yes") {
            return false;
        }

        // Check against the access tags
        match self
            .access
            .iter()
            .rev()
            .find_map(|&mode| tags.get(mode).map(|v| v.as_str()))
        {
            Some("no") | Some("private") => false,
            _ => true,
        }
    }

    /// Checks if a way is traversable forward (first return value) and
    /// backwards (second return value) by investigating mode-specific and generic one-way tags.
    ///
    /// Some ways (highway=motorway, highway=motorway_link, junction=roundabout and
    /// junction=circular) default to being one-way, except if overridden by specific tags.
    pub fn way_direction(&self, tags: &HashMap<String, String>) -> (bool, bool) {
        let mut forward = true;
        let mut backward = true;

        // Default one-way ways (pedestrian exception - does not apply)
        if !self.pedestrian {
            match tags.get("highway").map(|s| s.as_str()).unwrap_or("") {
                "motorway" | "motorway_link" => {
                    backward = false;
                }
                _ => {}
            }

            match tags.get("junction").map(|s| s.as_str()).unwrap_or("") {
                "roundabout" | "circular" => {
                    backward = false;
                }
                _ => {}
            }
        }

        match self.get_active_oneway_value(tags) {
            "yes" | "true" | "1" => {
                forward = true;
                backward = false;
            }

            "-1" | "reverse" => {
                forward = false;
                backward = true;
            }

            "no" => {
                forward = true;
                backward = true;
            }

            _ => {}
        }

        return (forward, backward);
    }

    /// Returns the value of the most specific "oneway:MODE" tag (based on [VehicleModel::access]),
    /// falling back to simply "oneway", and returning an empty string if no relevant tag was found.
    fn get_active_oneway_value<'t>(&self, tags: &'t HashMap<String, String>) -> &'t str {
        if self.pedestrian {
            if let Some(oneway_foot) = tags.get("oneway:foot") {
                return oneway_foot.as_str();
            }

            if Self::allow_generic_oneway_to_apply_on_foot(tags) {
                if let Some(oneway) = tags.get("oneway") {
                    return oneway.as_str();
                }
            }

            return "";
        } else {
            self.access
                .iter()
                .rev()
                .filter(|&&mode| mode != "access")
                .find_map(|&mode| tags.get(&format!("oneway:{}", mode)))
                .or_else(|| tags.get("oneway"))
                .map(|oneway_tag| oneway_tag.as_str())
                .unwrap_or("")
        }
    }

    fn allow_generic_oneway_to_apply_on_foot(tags: &HashMap<String, String>) -> bool {
        match tags.get("highway").map(|v| v.as_str()) {
            Some("footway") | Some("path") | Some("steps") | Some("platform") => return true,
            _ => {}
        }

        if tags.get("public_transport").map(|v| v.as_str()) == Some("platform") {
            return true;
        }

        if tags.get("railway").map(|v| v.as_str()) == Some("platform") {
            return true;
        }

        return false;
    }

    /// Figures out what kind of [TurnRestriction] a relation with given tags represents.
    pub fn restriction_kind(&self, tags: &HashMap<String, String>) -> TurnRestriction {
        if self.disable_restrictions
            || tags.get("type").map(|v| v.as_str()) != Some("restriction")
            || self.is_exempted(tags)
        {
            return TurnRestriction::Inapplicable;
        }

        let (kind, description) = self
            .get_active_restriction_tag(tags)
            .split_once('_')
            .unwrap_or(("", ""));

        match description {
            "right_turn" | "left_turn" | "u_turn" | "straight_on" => {}
            _ => return TurnRestriction::Inapplicable,
        }

        return match kind {
            "no" => TurnRestriction::Prohibitory,
            "only" => TurnRestriction::Mandatory,
            _ => TurnRestriction::Inapplicable,
        };
    }

    /// Returns true if [VehicleModel::access] intersects with any mode present in the `except` tag.
    /// If the tag is missing, returns false.
    pub fn is_exempted(&self, tags: &HashMap<String, String>) -> bool {
        tags.get("except")
            .map_or("", |v| v.as_str())
            .split(';')
            .any(|exempted_type| self.access.contains(&exempted_type))
    }

    /// Returns the value of the most specific "restriction:MODE" tag (based on [VehicleModel::access]),
    /// falling back to simply "restriction", and returning an empty string if no relevant tag
    /// was found.
    fn get_active_restriction_tag<'t>(&self, tags: &'t HashMap<String, String>) -> &'t str {
        if self.pedestrian {
            tags.get("restriction:foot")
                .map(|v| v.as_str())
                .unwrap_or("")
        } else {
            self.access
                .iter()
                .rev()
                .filter(|&&mode| mode != "access")
                .find_map(|&mode| tags.get(&format!("restriction:{}", mode)))
                .or_else(|| tags.get("restriction"))
                .map(|v| v.as_str())
                .unwrap_or("")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MODEL: VehicleModel = VehicleModel {
        name: "cat",
        speeds: &[
            RoadSpeed {
                key: "highway",
                value: "footway",
                speed: 6.0,
                transit: false,
            },
            RoadSpeed {
                key: "highway",
                value: "path",
                speed: 3.0,
                transit: false,
            },
            RoadSpeed {
                key: "railway",
                value: "subway",
                speed: 0.0,
                transit: true,
            },
        ],
        access: &["access", "cat"],
        pedestrian: false,
        disallow_motorroad: true,
        disable_restrictions: false,
        offroad_speed: 2.0,
    };

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    #[test]
    fn way_speed() {
        assert_eq!(TEST_MODEL.way_speed(&tags! {"highway": "footway"}), Some(6.0));
        assert_eq!(TEST_MODEL.way_speed(&tags! {"highway": "path"}), Some(3.0));
        assert_eq!(TEST_MODEL.way_speed(&tags! {"highway": "motorway"}), None);
        assert_eq!(TEST_MODEL.way_speed(&tags! {}), None);
        assert_eq!(TEST_MODEL.way_speed(&tags! {"railway": "subway"}), None);
        assert_eq!(
            TEST_MODEL.way_speed(&tags! {"highway": "path", "access": "no"}),
            None,
        );
        assert_eq!(
            TEST_MODEL.way_speed(&tags! {"highway": "path", "access": "no", "cat": "destination"}),
            Some(3.0),
        );
        assert_eq!(
            TEST_MODEL.way_speed(&tags! {"highway": "path", "motorroad": "yes"}),
            None,
        );
        assert_eq!(TEST_MODEL.max_speed(), 6.0);
    }

    #[test]
    fn is_allowed() {
        assert!(TEST_MODEL.is_allowed(&tags! {"highway": "footway"}));
        assert!(!TEST_MODEL.is_allowed(&tags! {"highway": "footway", "access": "no"}));
        assert!(!TEST_MODEL.is_allowed(&tags! {"highway": "footway", "access": "private"}));
        assert!(TEST_MODEL.is_allowed(&tags! {"highway": "footway", "access": "destination"}));
        assert!(TEST_MODEL.is_allowed(&tags! {"highway": "footway", "access": "no", "cat": "yes"}));
    }

    #[test]
    fn way_direction() {
        assert_eq!(
            TEST_MODEL.way_direction(&tags! {"highway": "path"}),
            (true, true),
        );
        assert_eq!(
            TEST_MODEL.way_direction(&tags! {"highway": "path", "oneway": "yes"}),
            (true, false),
        );
        assert_eq!(
            TEST_MODEL.way_direction(&tags! {"highway": "path", "oneway": "-1"}),
            (false, true),
        );
        assert_eq!(
            TEST_MODEL.way_direction(&tags! {"highway": "motorway_link"}),
            (true, false),
        );
        assert_eq!(
            TEST_MODEL.way_direction(&tags! {"highway": "path", "junction": "roundabout"}),
            (true, false),
        );
        assert_eq!(
            TEST_MODEL.way_direction(&tags! {"junction": "circular", "oneway": "-1"}),
            (false, true),
        );
    }

    #[test]
    fn way_direction_pedestrian() {
        assert_eq!(
            PEDESTRIAN_MODEL.way_direction(&tags! {"highway": "residential", "oneway": "yes"}),
            (true, true),
        );
        assert_eq!(
            PEDESTRIAN_MODEL
                .way_direction(&tags! {"highway": "residential", "oneway:foot": "yes"}),
            (true, false),
        );
        assert_eq!(
            PEDESTRIAN_MODEL.way_direction(&tags! {"highway": "footway", "oneway": "-1"}),
            (false, true),
        );
        assert_eq!(
            CAR_MODEL.way_direction(&tags! {"highway": "residential", "oneway": "yes"}),
            (true, false),
        );
    }

    #[test]
    fn restriction_kind() {
        assert_eq!(
            TEST_MODEL.restriction_kind(&tags! {"type": "multipolygon"}),
            TurnRestriction::Inapplicable,
        );
        assert_eq!(
            TEST_MODEL.restriction_kind(&tags! {"type": "restriction", "restriction": "no_u_turn"}),
            TurnRestriction::Prohibitory,
        );
        assert_eq!(
            TEST_MODEL
                .restriction_kind(&tags! {"type": "restriction", "restriction": "only_left_turn"}),
            TurnRestriction::Mandatory,
        );
        assert_eq!(
            TEST_MODEL.restriction_kind(
                &tags! {"type": "restriction", "restriction": "only_left_turn", "except": "psv;cat"}
            ),
            TurnRestriction::Inapplicable,
        );
        assert_eq!(
            TEST_MODEL
                .restriction_kind(&tags! {"type": "restriction", "restriction:cat": "no_u_turn"}),
            TurnRestriction::Prohibitory,
        );
        assert_eq!(
            PEDESTRIAN_MODEL
                .restriction_kind(&tags! {"type": "restriction", "restriction": "no_u_turn"}),
            TurnRestriction::Inapplicable,
        );
    }

    #[test]
    fn road_types() {
        let t = RoadTypes::from_tags(&tags! {"highway": "motorway", "toll": "yes"});
        assert!(t.contains(RoadTypes::MOTORWAY));
        assert!(t.contains(RoadTypes::TOLL));
        assert!(!t.intersects(RoadTypes::FERRY | RoadTypes::DIRTY));
        assert!(RoadTypes::from_tags(&tags! {"highway": "track"}).contains(RoadTypes::DIRTY));
        assert!(RoadTypes::from_tags(&tags! {"highway": "residential"}).is_empty());
    }

    #[test]
    fn vehicle_types() {
        assert_eq!("car".parse::<VehicleType>(), Ok(VehicleType::Car));
        assert_eq!("foot".parse::<VehicleType>(), Ok(VehicleType::Pedestrian));
        assert!("plane".parse::<VehicleType>().is_err());
        assert!(VehicleType::Transit.model().pedestrian);
    }
}

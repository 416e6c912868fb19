// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{RoadSpeed, VehicleModel};

/// Car model, with typical free-flow speeds per road class.
pub const CAR_MODEL: VehicleModel = VehicleModel {
    name: "motorcar",
    speeds: &[
        RoadSpeed {
            key: "highway",
            value: "motorway",
            speed: 115.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "motorway_link",
            speed: 75.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "trunk",
            speed: 90.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "trunk_link",
            speed: 70.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "primary",
            speed: 65.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "primary_link",
            speed: 55.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "secondary",
            speed: 55.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "secondary_link",
            speed: 45.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "tertiary",
            speed: 40.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "tertiary_link",
            speed: 35.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "unclassified",
            speed: 30.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "residential",
            speed: 25.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "living_street",
            speed: 10.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "service",
            speed: 15.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "track",
            speed: 5.0,
            transit: false,
        },
        RoadSpeed {
            key: "route",
            value: "ferry",
            speed: 20.0,
            transit: false,
        },
    ],
    access: &["access", "vehicle", "motor_vehicle", "motorcar"],
    pedestrian: false,
    disallow_motorroad: false,
    disable_restrictions: false,
    offroad_speed: 10.0,
};

/// Bicycle model, strongly preferring dedicated cycleways over busy roads.
pub const BICYCLE_MODEL: VehicleModel = VehicleModel {
    name: "bicycle",
    speeds: &[
        RoadSpeed {
            key: "highway",
            value: "trunk",
            speed: 8.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "trunk_link",
            speed: 8.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "primary",
            speed: 10.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "primary_link",
            speed: 10.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "secondary",
            speed: 12.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "secondary_link",
            speed: 12.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "tertiary",
            speed: 14.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "tertiary_link",
            speed: 14.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "unclassified",
            speed: 14.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "cycleway",
            speed: 20.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "residential",
            speed: 15.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "living_street",
            speed: 12.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "service",
            speed: 12.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "track",
            speed: 10.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "path",
            speed: 12.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "bridleway",
            speed: 6.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "footway",
            speed: 6.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "pedestrian",
            speed: 6.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "steps",
            speed: 2.0,
            transit: false,
        },
        RoadSpeed {
            key: "route",
            value: "ferry",
            speed: 10.0,
            transit: false,
        },
    ],
    access: &["access", "vehicle", "bicycle"],
    pedestrian: false,
    disallow_motorroad: true,
    disable_restrictions: false,
    offroad_speed: 3.0,
};

/// Walking model.
pub const PEDESTRIAN_MODEL: VehicleModel = VehicleModel {
    name: "foot",
    speeds: &[
        RoadSpeed {
            key: "highway",
            value: "trunk",
            speed: 3.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "trunk_link",
            speed: 3.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "primary",
            speed: 4.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "primary_link",
            speed: 4.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "secondary",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "secondary_link",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "tertiary",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "tertiary_link",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "unclassified",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "residential",
            speed: 4.8,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "living_street",
            speed: 4.8,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "service",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "track",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "bridleway",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "cycleway",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "footway",
            speed: 5.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "path",
            speed: 5.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "pedestrian",
            speed: 5.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "steps",
            speed: 3.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "platform",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "railway",
            value: "platform",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "public_transport",
            value: "platform",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "route",
            value: "ferry",
            speed: 10.0,
            transit: false,
        },
    ],
    access: &["access", "foot"],
    pedestrian: true,
    disallow_motorroad: true,
    disable_restrictions: false,
    offroad_speed: 3.0,
};

/// Public transport model: walking plus subway, light rail and tram lines.
pub const TRANSIT_MODEL: VehicleModel = VehicleModel {
    name: "transit",
    speeds: &[
        RoadSpeed {
            key: "highway",
            value: "trunk",
            speed: 3.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "trunk_link",
            speed: 3.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "primary",
            speed: 4.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "primary_link",
            speed: 4.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "secondary",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "secondary_link",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "tertiary",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "tertiary_link",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "unclassified",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "residential",
            speed: 4.8,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "living_street",
            speed: 4.8,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "service",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "track",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "bridleway",
            speed: 4.6,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "cycleway",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "footway",
            speed: 5.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "path",
            speed: 5.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "pedestrian",
            speed: 5.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "steps",
            speed: 3.0,
            transit: false,
        },
        RoadSpeed {
            key: "highway",
            value: "platform",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "railway",
            value: "platform",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "public_transport",
            value: "platform",
            speed: 4.5,
            transit: false,
        },
        RoadSpeed {
            key: "route",
            value: "ferry",
            speed: 10.0,
            transit: false,
        },
        RoadSpeed {
            key: "railway",
            value: "subway",
            speed: 40.0,
            transit: true,
        },
        RoadSpeed {
            key: "railway",
            value: "light_rail",
            speed: 35.0,
            transit: true,
        },
        RoadSpeed {
            key: "railway",
            value: "tram",
            speed: 20.0,
            transit: true,
        },
    ],
    access: &["access", "foot"],
    pedestrian: true,
    disallow_motorroad: true,
    disable_restrictions: false,
    offroad_speed: 3.0,
};

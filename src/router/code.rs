// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::astar::AStarError;

/// Outcome of a route calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum RouterResultCode {
    NoError = 0,
    Cancelled = 1,
    RouteNotFound = 2,
    StartPointNotFound = 3,
    EndPointNotFound = 4,
    IntermediatePointNotFound = 5,

    /// Some partitions needed by the route are not downloaded.
    NeedMoreMaps = 6,

    /// Some partitions are in an unsupported version.
    FileTooOld = 7,
    InternalError = 8,

    /// A route was found, but couldn't be turned into a valid [Route](crate::Route).
    RouteNotFoundRedressRouteError = 9,
    TransitRouteNotFoundNoNetwork = 10,
    TransitRouteNotFoundTooLongPedestrian = 11,
}

impl RouterResultCode {
    pub fn is_ok(self) -> bool {
        self == Self::NoError
    }
}

impl std::fmt::Display for RouterResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoError => "no error",
            Self::Cancelled => "cancelled",
            Self::RouteNotFound => "route not found",
            Self::StartPointNotFound => "start point not found",
            Self::EndPointNotFound => "end point not found",
            Self::IntermediatePointNotFound => "intermediate point not found",
            Self::NeedMoreMaps => "need more maps",
            Self::FileTooOld => "file too old",
            Self::InternalError => "internal error",
            Self::RouteNotFoundRedressRouteError => "route not found: redress error",
            Self::TransitRouteNotFoundNoNetwork => "transit route not found: no network",
            Self::TransitRouteNotFoundTooLongPedestrian => "transit route not found: pedestrian part too long",
        };
        f.write_str(s)
    }
}

impl From<AStarError> for RouterResultCode {
    fn from(e: AStarError) -> Self {
        match e {
            AStarError::NoPath => Self::RouteNotFound,
            AStarError::Cancelled => Self::Cancelled,
        }
    }
}

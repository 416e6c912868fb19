// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Error conditions which may occur during a graph search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AStarError {
    /// The queue was exhausted before the target was reached,
    /// or every path to the target was rejected by the length check.
    NoPath,

    /// The caller requested the search to stop.
    Cancelled,
}

impl std::fmt::Display for AStarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPath => write!(f, "no path"),
            Self::Cancelled => write!(f, "search cancelled"),
        }
    }
}

impl std::error::Error for AStarError {}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::LatLon;

/// Callbacks of a running route calculation.
///
/// All methods are called on the calculating thread; implementations needing
/// to record anything should use interior mutability.
pub trait RouterDelegate {
    /// Polled periodically. Once it returns true, the calculation stops with
    /// [RouterResultCode::Cancelled](crate::RouterResultCode::Cancelled).
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Overall progress, in `[0, 1]`. Reported values never decrease.
    fn on_progress(&self, _progress: f64) {}

    /// Position of a vertex settled by a search.
    fn on_point_check(&self, _point: LatLon) {}
}

/// Delegate which never cancels and ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelegate;

impl RouterDelegate for NoopDelegate {}

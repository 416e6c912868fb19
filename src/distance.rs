// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::LatLon;

/// Mean radius of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
pub(crate) const EARTH_RADIUS: f64 = 6_371_008.8;

/// Mean diameter of Earth, in meters.
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the `haversine formula <https://en.wikipedia.org/wiki/Haversine_formula>`_.
/// Returns the result in meters.
pub fn earth_distance(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lon1 = a.lon.to_radians();
    let lat2 = b.lat.to_radians();
    let lon2 = b.lon.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    EARTH_DIAMETER * h.sqrt().min(1.0).asin()
}

/// Local east/north offset of `p` from `origin`, in meters, using an
/// equirectangular approximation. Only meaningful for nearby points.
pub fn local_offset(origin: LatLon, p: LatLon) -> (f64, f64) {
    let cos_lat = origin.lat.to_radians().cos();
    let east = (p.lon - origin.lon).to_radians() * EARTH_RADIUS * cos_lat;
    let north = (p.lat - origin.lat).to_radians() * EARTH_RADIUS;
    return (east, north);
}

/// Orthogonal projection of `p` onto the segment `a`-`b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Projected point, on the segment.
    pub point: LatLon,

    /// Position of the projected point along the segment, in `[0, 1]`.
    pub t: f64,

    /// Squared planar distance from `p` to the projected point, in square meters.
    pub squared_distance: f64,
}

/// Projects `p` onto the segment between `a` and `b`.
pub fn project_onto_segment(p: LatLon, a: LatLon, b: LatLon) -> Projection {
    let (bx, by) = local_offset(a, b);
    let (px, py) = local_offset(a, p);
    let length_sq = bx * bx + by * by;

    let t = if length_sq > 0.0 {
        ((px * bx + py * by) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let dx = px - t * bx;
    let dy = py - t * by;

    Projection {
        point: LatLon {
            lat: a.lat + t * (b.lat - a.lat),
            lon: a.lon + t * (b.lon - a.lon),
        },
        t,
        squared_distance: dx * dx + dy * dy,
    }
}

/// Cosine of the angle between the direction `a`→`b` and the provided
/// direction vector (east, north). Returns 0 for degenerate inputs.
pub fn direction_cosine(a: LatLon, b: LatLon, direction: (f64, f64)) -> f64 {
    let (x, y) = local_offset(a, b);
    let (dx, dy) = direction;
    let norm = (x * x + y * y).sqrt() * (dx * dx + dy * dy).sqrt();
    if norm <= 0.0 {
        return 0.0;
    }
    return (x * dx + y * dy) / norm;
}

/// Initial bearing from `a` to `b`, in degrees in `[0, 360)`, clockwise from north.
pub fn bearing(a: LatLon, b: LatLon) -> f64 {
    let (east, north) = local_offset(a, b);
    let deg = east.atan2(north).to_degrees();
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr, $eps:expr) => {
            assert!(
                (($a - $b) as f64).abs() < $eps,
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    #[test]
    fn distance() {
        let warsaw = LatLon::new(52.2297, 21.0122);
        let krakow = LatLon::new(50.0647, 19.9450);
        assert_almost_eq!(earth_distance(warsaw, krakow), 252_000.0, 1_000.0);
        assert_eq!(earth_distance(warsaw, warsaw), 0.0);
    }

    #[test]
    fn projection() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 0.01);
        let p = LatLon::new(0.001, 0.005);

        let proj = project_onto_segment(p, a, b);
        assert_almost_eq!(proj.t, 0.5, 1e-6);
        assert_almost_eq!(proj.point.lon, 0.005, 1e-9);
        assert_almost_eq!(proj.point.lat, 0.0, 1e-9);
        assert_almost_eq!(proj.squared_distance.sqrt(), 111.2, 0.5);

        let before = project_onto_segment(LatLon::new(0.0, -0.01), a, b);
        assert_eq!(before.t, 0.0);
    }

    #[test]
    fn directions() {
        let a = LatLon::new(0.0, 0.0);
        let east = LatLon::new(0.0, 0.01);
        assert_almost_eq!(direction_cosine(a, east, (1.0, 0.0)), 1.0, 1e-9);
        assert_almost_eq!(direction_cosine(a, east, (0.0, 1.0)), 0.0, 1e-9);
        assert_almost_eq!(bearing(a, east), 90.0, 1e-6);
        assert_almost_eq!(bearing(east, a), 270.0, 1e-6);
    }
}

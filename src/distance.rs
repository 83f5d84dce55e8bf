// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use geo::Coord;

/// Mean radius of Earth, in kilometers.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_RADIUS: f64 = 6371.0088;

/// Mean diameter of Earth, in kilometers.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Length of one degree of latitude, in meters.
const METERS_PER_DEGREE: f64 = EARTH_RADIUS * 1000.0 * std::f64::consts::PI / 180.0;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the `haversine formula <https://en.wikipedia.org/wiki/Haversine_formula>`_.
/// Returns the result in kilometers.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    EARTH_DIAMETER * h.sqrt().asin()
}

/// Equirectangular projection centered at a given position, mapping
/// lat-lon degrees onto a plane measured in meters.
///
/// Distortion is negligible within the few kilometers a walking isochrone
/// spans, which makes it a stand-in for a proper UTM projection.
/// Coordinates use the GeoJSON axis order: `x` is longitude, `y` is latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin_lat: f64,
    origin_lon: f64,
    meters_per_lon_degree: f64,
}

impl LocalProjection {
    pub fn new(origin_lat: f64, origin_lon: f64) -> Self {
        Self {
            origin_lat,
            origin_lon,
            meters_per_lon_degree: METERS_PER_DEGREE * origin_lat.to_radians().cos(),
        }
    }

    /// Converts a lon-lat coordinate into meters east and north of the origin.
    pub fn project(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.origin_lon) * self.meters_per_lon_degree,
            y: (c.y - self.origin_lat) * METERS_PER_DEGREE,
        }
    }

    /// Inverse of [LocalProjection::project].
    pub fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: c.x / self.meters_per_lon_degree + self.origin_lon,
            y: c.y / METERS_PER_DEGREE + self.origin_lat,
        }
    }
}

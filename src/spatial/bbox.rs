//! Bounding boxes used to prefilter nearby-search candidates.

use geo::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use super::EARTH_RADIUS_KM;

/// Approximate length of one degree of latitude, in km
pub const KM_PER_DEGREE: f64 = 111.0;

/// Below this `cos(lat)` the longitude span is treated as unbounded
const POLAR_COS_EPSILON: f64 = 1e-6;

/// Latitude/longitude rectangle, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    /// Boxes covering every point within `radius_km` of `center`.
    ///
    /// Usually a single box. Near the poles the longitude range widens to the
    /// whole globe, and a box crossing the antimeridian is split in two.
    pub fn around(center: Point<f64>, radius_km: f64) -> Vec<BoundingBox> {
        let (lat, lng) = (center.y(), center.x());
        let d_lat = radius_km / KM_PER_DEGREE;

        let min_lat = (lat - d_lat).max(-90.0);
        let max_lat = (lat + d_lat).min(90.0);
        let full = vec![BoundingBox::new(min_lat, max_lat, -180.0, 180.0)];

        let cos_lat = lat.to_radians().cos();
        let touches_pole = lat + d_lat >= 90.0 || lat - d_lat <= -90.0;
        if cos_lat < POLAR_COS_EPSILON || touches_pole {
            return full;
        }

        // Widest longitude reached by the circle on the sphere; the flat
        // estimate falls short of it at high latitudes and large radii
        let reach = (radius_km / EARTH_RADIUS_KM).sin() / cos_lat;
        if reach >= 1.0 || radius_km / EARTH_RADIUS_KM >= FRAC_PI_2 {
            return full;
        }
        let d_lng = (radius_km / (KM_PER_DEGREE * cos_lat)).max(reach.asin().to_degrees());
        if d_lng >= 180.0 {
            return full;
        }

        let min_lng = lng - d_lng;
        let max_lng = lng + d_lng;
        if min_lng < -180.0 {
            vec![
                BoundingBox::new(min_lat, max_lat, min_lng + 360.0, 180.0),
                BoundingBox::new(min_lat, max_lat, -180.0, max_lng),
            ]
        } else if max_lng > 180.0 {
            vec![
                BoundingBox::new(min_lat, max_lat, min_lng, 180.0),
                BoundingBox::new(min_lat, max_lat, -180.0, max_lng - 360.0),
            ]
        } else {
            vec![BoundingBox::new(min_lat, max_lat, min_lng, max_lng)]
        }
    }
}

//! Post office records and geo query results.

use geo::Point;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::RoutingCode;

/// A single post office from the reference dataset.
///
/// Field aliases accept the column names of the India Post directory
/// (`officename`, `statename`, ...) alongside the canonical names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOfficeRecord {
    #[serde(alias = "pincode")]
    pub code: RoutingCode,

    #[serde(alias = "officename", alias = "office")]
    pub office_name: String,

    /// Head/sub/branch office ("H.O", "S.O", "B.O")
    #[serde(
        default,
        alias = "officetype",
        alias = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub office_type: Option<String>,

    /// Delivery status ("Delivery" / "Non-Delivery")
    #[serde(default, alias = "deliverystatus", skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,

    #[serde(default, alias = "divisionname", skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,

    #[serde(default, alias = "regionname", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, alias = "circlename", skip_serializing_if = "Option::is_none")]
    pub circle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taluk: Option<String>,

    #[serde(alias = "districtname")]
    pub district: String,

    #[serde(alias = "statename")]
    pub state: String,

    #[serde(default, alias = "lat", deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,

    #[serde(default, alias = "lng", deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
}

impl PostOfficeRecord {
    /// Create a record with the required fields and no coordinates
    pub fn new(code: RoutingCode, office_name: &str, district: &str, state: &str) -> Self {
        Self {
            code,
            office_name: office_name.to_string(),
            office_type: None,
            delivery: None,
            division: None,
            region: None,
            circle: None,
            taluk: None,
            district: district.to_string(),
            state: state.to_string(),
            latitude: None,
            longitude: None,
        }
    }

    /// Set coordinates (builder style)
    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lng);
        self
    }

    /// Location as a `Point` (x = longitude, y = latitude).
    ///
    /// `None` when either coordinate is missing, not finite, or outside the
    /// valid latitude/longitude range.
    pub fn point(&self) -> Option<Point<f64>> {
        let lat = self.latitude.filter(|v| v.is_finite() && v.abs() <= 90.0)?;
        let lng = self.longitude.filter(|v| v.is_finite() && v.abs() <= 180.0)?;
        Some(Point::new(lng, lat))
    }
}

/// Accepts a number, a numeric string, or anything else (empty cells, "NA",
/// null) as a missing coordinate.
fn lenient_coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    deserializer.deserialize_any(CoordinateVisitor)
}

struct CoordinateVisitor;

impl<'de> Visitor<'de> for CoordinateVisitor {
    type Value = Option<f64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a coordinate as number or string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// A post office annotated with its distance from a query point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoCandidate {
    #[serde(flatten)]
    pub record: PostOfficeRecord,

    /// Exact great-circle distance; rounded only when serialized
    #[serde(serialize_with = "serialize_rounded")]
    pub distance_km: f64,
}

impl GeoCandidate {
    /// Distance rounded to two decimals, for display
    pub fn rounded_distance_km(&self) -> f64 {
        round_two(self.distance_km)
    }
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_two(*value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> RoutingCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_deserialize_directory_row() {
        let json = r#"{
            "officename": "Connaught Place S.O",
            "pincode": 110001,
            "officetype": "S.O",
            "delivery": "Non-Delivery",
            "district": "New Delhi",
            "statename": "DELHI",
            "latitude": "28.6304",
            "longitude": 77.2177
        }"#;
        let record: PostOfficeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.code, code("110001"));
        assert_eq!(record.office_type.as_deref(), Some("S.O"));
        assert_eq!(record.latitude, Some(28.6304));
        assert_eq!(record.longitude, Some(77.2177));
        assert!(record.point().is_some());
    }

    #[test]
    fn test_unparseable_coordinates_are_missing() {
        let json = r#"{
            "code": "110001",
            "office_name": "Baroda House",
            "district": "New Delhi",
            "state": "DELHI",
            "latitude": "NA",
            "longitude": null
        }"#;
        let record: PostOfficeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
        assert!(record.point().is_none());
    }

    #[test]
    fn test_point_rejects_out_of_range() {
        let record = PostOfficeRecord::new(code("110001"), "X", "D", "S").at(91.0, 10.0);
        assert!(record.point().is_none());
        let record = PostOfficeRecord::new(code("110001"), "X", "D", "S").at(f64::NAN, 10.0);
        assert!(record.point().is_none());
    }

    #[test]
    fn test_candidate_serializes_rounded_distance() {
        let candidate = GeoCandidate {
            record: PostOfficeRecord::new(code("110001"), "Parliament House", "New Delhi", "DELHI"),
            distance_km: 1.23456,
        };
        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value["distance_km"], serde_json::json!(1.23));
        assert_eq!(value["code"], "110001");
        assert_eq!(value["office_name"], "Parliament House");
        assert_eq!(candidate.rounded_distance_km(), 1.23);
    }
}

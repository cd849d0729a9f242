use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw reading as posted by a device: an untyped JSON object whose fields
/// are optional and inconsistently named
pub type RawReading = Map<String, Value>;

/// Geospatial point stored alongside each reading for geo-queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Canonical sensor reading written to the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReading {
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch seconds, always positive
    pub timestamp: i64,
    pub position_point: GeoPoint,
    pub geohash: String,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub device_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_date_time: Option<String>,
    pub received_at: String,
}

/// Allow-listed gas and particulate measurements
///
/// Each field is present only when the device sent a numeric value; absent
/// values are omitted from the stored document, never written as zero or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nh3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvoc: Option<f64>,
}

/// Field names accepted for the measurement allow-list, in storage order
pub const MEASUREMENT_FIELDS: [&str; 7] = ["co", "co2", "nh3", "no2", "pm10", "pm25", "tvoc"];

impl Measurements {
    /// Mutable slot for an allow-listed field name, `None` for anything else
    pub fn slot_mut(&mut self, field: &str) -> Option<&mut Option<f64>> {
        match field {
            "co" => Some(&mut self.co),
            "co2" => Some(&mut self.co2),
            "nh3" => Some(&mut self.nh3),
            "no2" => Some(&mut self.no2),
            "pm10" => Some(&mut self.pm10),
            "pm25" => Some(&mut self.pm25),
            "tvoc" => Some(&mut self.tvoc),
            _ => None,
        }
    }
}

/// Key under which a reading is stored
pub type DocumentKey = String;

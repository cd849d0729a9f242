//! Raw device payload → canonical [`NormalizedReading`]
//!
//! Coordinates are the only mandatory fields. Everything else is best-effort:
//! a missing timestamp becomes the server time, a missing device label
//! becomes the default, and measurements outside the allow-list are dropped.

use thiserror::Error;

use crate::coercion::{coerce_number, first_number, first_text, first_verbatim, text_or};
use crate::domain::{GeoPoint, Measurements, NormalizedReading, RawReading, MEASUREMENT_FIELDS};
use crate::time::Clock;

/// Latitude aliases, short name first
pub const LATITUDE_ALIASES: [&str; 2] = ["lat", "latitud"];
/// Longitude aliases, short names first
pub const LONGITUDE_ALIASES: [&str; 3] = ["lng", "lon", "longitud"];
pub const TIMESTAMP_ALIASES: [&str; 2] = ["timestamp", "ts"];
pub const DEVICE_LABEL_ALIASES: [&str; 3] = ["dispositivo", "deviceLabel", "device"];
pub const IDENTIFIER_ALIASES: [&str; 2] = ["idArchivo", "originalIdentifier"];
pub const DEVICE_DATE_TIME_ALIASES: [&str; 1] = ["fechaHora"];

pub const DEFAULT_DEVICE_LABEL: &str = "esp32";

/// Raw timestamps above this are taken to be epoch milliseconds
pub const MILLIS_THRESHOLD: f64 = 2_000_000_000.0;

/// Longest caller identifier accepted, in bytes
///
/// The identifier is stored verbatim next to the reading, so it has to stay
/// well inside the store's per-item size limit.
pub const MAX_IDENTIFIER_LENGTH: usize = 1024;

/// Geohash length used for stored readings
pub const GEOHASH_PRECISION: usize = 10;

/// Why a raw reading could not be normalized
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidReading {
    #[error("missing or non-numeric coordinates")]
    MissingCoordinates,

    #[error("coordinates out of range: lat={latitude}, lon={longitude}")]
    CoordinatesOutOfRange { latitude: f64, longitude: f64 },

    #[error("identifier of {length} bytes exceeds limit of {limit}")]
    IdentifierTooLong { length: usize, limit: usize },

    #[error("geohash encoding failed: {0}")]
    Geohash(String),
}

/// Build the canonical reading for one raw device payload
///
/// `default_device_label` is used when the payload carries no device label.
/// The clock supplies the fallback timestamp and the receive time.
pub fn normalize_reading(
    raw: &RawReading,
    default_device_label: &str,
    clock: &dyn Clock,
) -> Result<NormalizedReading, InvalidReading> {
    let (latitude, longitude) =
        match (first_number(raw, &LATITUDE_ALIASES), first_number(raw, &LONGITUDE_ALIASES)) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(InvalidReading::MissingCoordinates),
        };

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(InvalidReading::CoordinatesOutOfRange {
            latitude,
            longitude,
        });
    }

    let original_identifier = first_verbatim(raw, &IDENTIFIER_ALIASES);
    if let Some(id) = &original_identifier {
        if id.len() > MAX_IDENTIFIER_LENGTH {
            return Err(InvalidReading::IdentifierTooLong {
                length: id.len(),
                limit: MAX_IDENTIFIER_LENGTH,
            });
        }
    }

    // First alias that resolves to whole epoch seconds wins
    let timestamp = TIMESTAMP_ALIASES
        .iter()
        .filter_map(|alias| raw.get(*alias))
        .filter_map(coerce_number)
        .find_map(epoch_seconds)
        .unwrap_or_else(|| clock.now_epoch_seconds());

    let mut measurements = Measurements::default();
    for field in MEASUREMENT_FIELDS {
        if let Some(slot) = measurements.slot_mut(field) {
            *slot = first_number(raw, &[field]);
        }
    }

    Ok(NormalizedReading {
        latitude,
        longitude,
        timestamp,
        position_point: GeoPoint::new(latitude, longitude),
        geohash: encode_geohash(latitude, longitude)?,
        measurements,
        device_label: text_or(raw, &DEVICE_LABEL_ALIASES, default_device_label),
        original_identifier,
        device_date_time: first_text(raw, &DEVICE_DATE_TIME_ALIASES),
        received_at: clock.now_rfc3339(),
    })
}

/// Resolve a raw timestamp into positive epoch seconds
///
/// Values above [`MILLIS_THRESHOLD`] are downscaled from milliseconds and
/// rounded; smaller values lose any fractional part. Absent values, and
/// anything that does not end up as at least one second, fall back to the
/// clock.
pub fn normalize_timestamp(raw: Option<f64>, clock: &dyn Clock) -> i64 {
    raw.and_then(epoch_seconds)
        .unwrap_or_else(|| clock.now_epoch_seconds())
}

fn epoch_seconds(raw: f64) -> Option<i64> {
    let seconds = if raw > MILLIS_THRESHOLD {
        (raw / 1000.0).round()
    } else {
        raw.trunc()
    };

    (seconds >= 1.0 && seconds < i64::MAX as f64).then_some(seconds as i64)
}

/// Geohash for a coordinate pair; same input always yields the same hash
pub fn encode_geohash(latitude: f64, longitude: f64) -> Result<String, InvalidReading> {
    geohash::encode(
        geohash::Coord {
            x: longitude,
            y: latitude,
        },
        GEOHASH_PRECISION,
    )
    .map_err(|e| InvalidReading::Geohash(e.to_string()))
}

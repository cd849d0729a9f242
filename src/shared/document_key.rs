use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::domain::{DocumentKey, NormalizedReading};
use crate::time::Clock;

/// Maximum length of a document key, in characters
pub const MAX_KEY_LENGTH: usize = 200;

/// Replace path-unsafe characters and whitespace with `_` and cap the length
pub fn sanitize_key(raw: &str) -> String {
    static UNSAFE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = UNSAFE_REGEX.get_or_init(|| {
        Regex::new(r"[/\\#?&\s]").expect("document key regex is valid")
    });

    regex
        .replace_all(raw, "_")
        .chars()
        .take(MAX_KEY_LENGTH)
        .collect()
}

/// Key taken from the caller identifier, when the reading has one
fn stable_key(reading: &NormalizedReading) -> Option<DocumentKey> {
    reading
        .original_identifier
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(sanitize_key)
}

fn synthesized_key(device_label: &str, clock: &dyn Clock) -> DocumentKey {
    // Leave room for the millis suffix and any collision counter
    let prefix: String = sanitize_key(device_label).chars().take(MAX_KEY_LENGTH - 40).collect();
    format!("{}_{}", prefix, clock.now_epoch_millis())
}

/// Key assigned to one reading, plus the id the device expects back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedKey {
    pub key: DocumentKey,
    /// Original identifier when the device sent one, otherwise the key itself
    pub ack_id: String,
}

/// Hands out document keys for one batch submission
///
/// Stable keys are returned as-is even when repeated, so a repeated
/// identifier targets the same document. Synthesized keys never take a key
/// already issued or reserved in the batch; on collision they get `_<n>`.
#[derive(Debug, Default)]
pub struct KeyAssigner {
    issued: HashSet<DocumentKey>,
}

impl KeyAssigner {
    /// Assigner that reserves the stable key of every reading in the batch
    /// up front, so a keyless item never lands on a later item's key
    pub fn for_batch<'a>(readings: impl IntoIterator<Item = &'a NormalizedReading>) -> Self {
        Self {
            issued: readings.into_iter().filter_map(stable_key).collect(),
        }
    }

    pub fn assign(&mut self, reading: &NormalizedReading, clock: &dyn Clock) -> AssignedKey {
        let identifier = reading.original_identifier.as_deref();
        if let (Some(key), Some(id)) = (stable_key(reading), identifier) {
            self.issued.insert(key.clone());
            return AssignedKey {
                key,
                ack_id: id.to_string(),
            };
        }

        let base = synthesized_key(&reading.device_label, clock);
        let mut key = base.clone();
        let mut counter = 1;
        while self.issued.contains(&key) {
            key = format!("{}_{}", base, counter);
            counter += 1;
        }
        self.issued.insert(key.clone());

        AssignedKey {
            ack_id: key.clone(),
            key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeoPoint, Measurements};
    use crate::time::FixedClock;

    fn reading(original_identifier: Option<&str>, device_label: &str) -> NormalizedReading {
        NormalizedReading {
            latitude: 1.0,
            longitude: 2.0,
            timestamp: 1705316400,
            position_point: GeoPoint::new(1.0, 2.0),
            geohash: "s00twy01mt".to_string(),
            measurements: Measurements::default(),
            device_label: device_label.to_string(),
            original_identifier: original_identifier.map(String::from),
            device_date_time: None,
            received_at: "2024-01-15T11:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_sanitize_key_replaces_unsafe_characters() {
        assert_eq!(sanitize_key("a/b\\c#d?e&f g\th"), "a_b_c_d_e_f_g_h");
        assert_eq!(sanitize_key("f1.txt"), "f1.txt");
        assert_eq!(sanitize_key("2024-01-15_10:30.csv"), "2024-01-15_10:30.csv");
    }

    #[test]
    fn test_sanitize_key_truncates() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_key(&long).chars().count(), MAX_KEY_LENGTH);

        let multibyte = "ñ".repeat(250);
        assert_eq!(sanitize_key(&multibyte).chars().count(), MAX_KEY_LENGTH);
    }

    #[test]
    fn test_assign_prefers_original_identifier() {
        let clock = FixedClock::from_epoch_millis(1705316400123);
        let assigned = KeyAssigner::default().assign(&reading(Some("logs/f 1.txt"), "esp32"), &clock);
        assert_eq!(assigned.key, "logs_f_1.txt");
    }

    #[test]
    fn test_assign_synthesized_from_device_and_millis() {
        let clock = FixedClock::from_epoch_millis(1705316400123);
        assert_eq!(
            KeyAssigner::default().assign(&reading(None, "esp32"), &clock).key,
            "esp32_1705316400123"
        );
        assert_eq!(
            KeyAssigner::default().assign(&reading(None, "nodo 3/b"), &clock).key,
            "nodo_3_b_1705316400123"
        );
    }

    #[test]
    fn test_stable_key_ignores_clock() {
        let first = KeyAssigner::default().assign(
            &reading(Some("f1.txt"), "esp32"),
            &FixedClock::from_epoch_millis(1),
        );
        let second = KeyAssigner::default().assign(
            &reading(Some("f1.txt"), "esp32"),
            &FixedClock::from_epoch_millis(999_999),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_whitespace_identifier_is_stable() {
        let clock = FixedClock::from_epoch_millis(1705316400123);
        let assigned = KeyAssigner::default().assign(&reading(Some("  "), "esp32"), &clock);

        assert_eq!(assigned.key, "__");
        assert_eq!(assigned.ack_id, "  ");
    }

    #[test]
    fn test_synthesized_key_skips_reserved_stable_key() {
        let clock = FixedClock::from_epoch_millis(1705316400123);
        let keyless = reading(None, "esp32");
        let later = reading(Some("esp32_1705316400123"), "esp32");
        let mut assigner = KeyAssigner::for_batch([&keyless, &later]);

        let first = assigner.assign(&keyless, &clock);
        let second = assigner.assign(&later, &clock);

        assert_eq!(first.key, "esp32_1705316400123_1");
        assert_eq!(second.key, "esp32_1705316400123");
    }

    #[test]
    fn test_assigner_returns_original_identifier_as_ack() {
        let clock = FixedClock::from_epoch_millis(1705316400123);
        let mut assigner = KeyAssigner::default();
        let assigned = assigner.assign(&reading(Some("dir/f1.txt"), "esp32"), &clock);

        assert_eq!(assigned.key, "dir_f1.txt");
        assert_eq!(assigned.ack_id, "dir/f1.txt");
    }

    #[test]
    fn test_assigner_deduplicates_synthesized_keys() {
        let clock = FixedClock::from_epoch_millis(1705316400123);
        let mut assigner = KeyAssigner::default();

        let first = assigner.assign(&reading(None, "esp32"), &clock);
        let second = assigner.assign(&reading(None, "esp32"), &clock);
        let third = assigner.assign(&reading(None, "esp32"), &clock);

        assert_eq!(first.key, "esp32_1705316400123");
        assert_eq!(second.key, "esp32_1705316400123_1");
        assert_eq!(third.key, "esp32_1705316400123_2");
        assert_eq!(second.ack_id, second.key);
    }

    #[test]
    fn test_assigner_keeps_repeated_stable_keys() {
        let clock = FixedClock::from_epoch_millis(1705316400123);
        let mut assigner = KeyAssigner::default();

        let first = assigner.assign(&reading(Some("f1.txt"), "esp32"), &clock);
        let second = assigner.assign(&reading(Some("f1.txt"), "esp32"), &clock);
        assert_eq!(first.key, second.key);
    }
}

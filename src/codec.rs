//! JSON encoding of snapshots and other serializable display structures.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("Failed to serialize value to JSON")
}

pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize value to JSON")
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).context("Failed to parse JSON")
}

/// Encode into the byte payload handed out by the export operations
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(to_json(value)?.into_bytes())
}

/// Decode a byte payload; anything that is not UTF-8 JSON of the expected shape is rejected
pub fn from_bytes<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let json = std::str::from_utf8(data).context("Payload is not valid UTF-8")?;
    from_json(json)
}

/// Best-effort rendering for log messages.
pub fn to_log_string<T: Serialize>(value: &T) -> String {
    to_json_pretty(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{
        DisplayMode, HdrState, InitialState, ModifiedState, SingleDisplayConfigState,
    };

    fn sample_state() -> SingleDisplayConfigState {
        SingleDisplayConfigState {
            initial: InitialState {
                topology: vec![vec!["DeviceId1".to_string()]],
                primary_devices: ["DeviceId1".to_string()].into_iter().collect(),
            },
            modified: ModifiedState {
                topology: vec![vec!["DeviceId1".to_string()], vec!["DeviceId2".to_string()]],
                original_modes: [
                    ("DeviceId1".to_string(), DisplayMode::new(1920, 1080, 120, 1)),
                    ("DeviceId2".to_string(), DisplayMode::new(2560, 1440, 60000, 1001)),
                ]
                .into_iter()
                .collect(),
                original_hdr_states: [
                    ("DeviceId1".to_string(), Some(HdrState::Enabled)),
                    ("DeviceId2".to_string(), None),
                ]
                .into_iter()
                .collect(),
                original_primary_device: "DeviceId1".to_string(),
            },
        }
    }

    #[test]
    fn test_snapshot_survives_encoding() {
        let state = sample_state();
        let bytes = to_bytes(&state).unwrap();
        let decoded: SingleDisplayConfigState = from_bytes(&bytes).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_field_names_in_payload() {
        let json = to_json(&sample_state()).unwrap();
        for field in [
            "\"initial\"",
            "\"modified\"",
            "\"primary_devices\"",
            "\"original_modes\"",
            "\"original_hdr_states\"",
            "\"original_primary_device\"",
            "\"refresh_rate\"",
            "\"numerator\"",
        ] {
            assert!(json.contains(field), "missing {} in {}", field, json);
        }
        assert!(json.contains("\"Enabled\""));
        assert!(json.contains("null"));
    }

    #[test]
    fn test_parse_handwritten_payload() {
        let json = r#"{
            "initial": {"topology": [["A"]], "primary_devices": ["A"]},
            "modified": {
                "topology": [["A", "B"]],
                "original_modes": {"A": {"resolution": {"width": 1280, "height": 720}, "refresh_rate": {"numerator": 60, "denominator": 1}}},
                "original_hdr_states": {"A": "Disabled"},
                "original_primary_device": "A"
            }
        }"#;
        let state: SingleDisplayConfigState = from_json(json).unwrap();
        assert_eq!(state.modified.topology, vec![vec!["A".to_string(), "B".to_string()]]);
        assert_eq!(
            state.modified.original_modes["A"],
            DisplayMode::new(1280, 720, 60, 1)
        );
        assert_eq!(
            state.modified.original_hdr_states["A"],
            Some(HdrState::Disabled)
        );
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert!(from_bytes::<SingleDisplayConfigState>(b"").is_err());
        assert!(from_bytes::<SingleDisplayConfigState>(b"not json").is_err());
        assert!(from_bytes::<SingleDisplayConfigState>(&[0xff, 0xfe, 0x00]).is_err());
        assert!(from_bytes::<SingleDisplayConfigState>(br#"{"initial": {}}"#).is_err());
        assert!(from_bytes::<SingleDisplayConfigState>(br#"[1, 2, 3]"#).is_err());
    }
}

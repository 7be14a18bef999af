use display_settings_manager::display::{
    EnumeratedDevice, HdrState, ModifiedState, SingleDisplayConfigState,
};
use display_settings_manager::system::DisplayCall;

mod test_utils;
use test_utils::{DisplayFixture, ModifiedStateBuilder, TestLayouts, topology};

/// Integration tests for capturing and exporting the live display configuration

#[cfg(test)]
mod capture {
    use super::*;

    #[test]
    fn test_capture_fills_both_halves() {
        let fixture = DisplayFixture::new().with_live_state(&TestLayouts::desk());
        let manager = fixture.manager();

        let state = manager.capture_current_state().unwrap();

        let desk = TestLayouts::desk();
        assert_eq!(state.initial.topology, desk.topology);
        assert_eq!(
            state.initial.primary_devices.iter().collect::<Vec<_>>(),
            vec!["DeviceId1"]
        );
        assert_eq!(state.modified, desk);
    }

    #[test]
    fn test_capture_never_changes_settings() {
        let fixture = DisplayFixture::new().with_live_state(&TestLayouts::desk());
        let manager = fixture.manager();

        assert!(manager.capture_current_state().is_some());
        assert!(manager.export_current_settings().is_some());
        assert!(manager.export_restore_profile().is_some());
        assert!(fixture.display.get_mutation_calls().is_empty());
    }

    #[test]
    fn test_capture_without_primary_device() {
        let fixture = DisplayFixture::new().with_live_state(
            &ModifiedStateBuilder::new()
                .topology(&[&["DeviceId1", "DeviceId2"]])
                .mode("DeviceId1", 1920, 1080, 60)
                .mode("DeviceId2", 1920, 1080, 60)
                .build(),
        );
        let manager = fixture.manager();

        let state = manager.capture_current_state().unwrap();
        assert!(state.initial.primary_devices.is_empty());
        assert_eq!(state.modified.original_primary_device, "");
    }

    #[test]
    fn test_capture_api_unavailable() {
        let fixture = DisplayFixture::new().with_live_state(&TestLayouts::desk());
        fixture.display.set_api_available(false);
        let manager = fixture.manager();

        assert!(manager.capture_current_state().is_none());
        assert!(manager.export_current_settings().is_none());
        assert!(manager.export_restore_profile().is_none());
        assert!(
            fixture
                .display
                .get_calls()
                .iter()
                .all(|call| *call == DisplayCall::IsApiAccessAvailable)
        );
    }

    #[test]
    fn test_capture_invalid_topology() {
        let fixture = DisplayFixture::new();
        fixture
            .display
            .set_mock_topology(topology(&[&["DeviceId1", "DeviceId2", "DeviceId3"]]));
        let manager = fixture.manager();

        assert!(manager.capture_current_state().is_none());
        assert!(
            !fixture
                .display
                .get_calls()
                .iter()
                .any(|call| matches!(call, DisplayCall::GetCurrentDisplayModes(_)))
        );
    }

    #[test]
    fn test_capture_modes_unreadable() {
        let fixture = DisplayFixture::new().with_live_state(&TestLayouts::desk());
        fixture.display.set_modes_unreadable(true);
        let manager = fixture.manager();

        assert!(manager.capture_current_state().is_none());
    }

    #[test]
    fn test_capture_tolerates_unreadable_hdr() {
        let fixture = DisplayFixture::new().with_live_state(&TestLayouts::desk());
        fixture.display.set_hdr_unreadable(true);
        let manager = fixture.manager();

        let state = manager.capture_current_state().unwrap();
        assert!(state.modified.original_hdr_states.is_empty());
        assert_eq!(state.modified.original_modes.len(), 2);
        assert_eq!(state.modified.original_primary_device, "DeviceId1");
    }
}

#[cfg(test)]
mod export {
    use super::*;

    #[test]
    fn test_export_current_settings_payload() {
        let fixture = DisplayFixture::new().with_live_state(&TestLayouts::couch());
        let manager = fixture.manager();

        let payload = manager.export_current_settings().unwrap();
        let decoded: ModifiedState = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, TestLayouts::couch());

        let raw: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(raw["original_primary_device"], "DeviceId3");
        assert_eq!(raw["original_hdr_states"]["DeviceId3"], "Disabled");
    }

    #[test]
    fn test_export_restore_profile_decodes_to_capture() {
        let fixture = DisplayFixture::new().with_live_state(&TestLayouts::desk());
        let manager = fixture.manager();

        let payload = manager.export_restore_profile().unwrap();
        let decoded: SingleDisplayConfigState = serde_json::from_slice(&payload).unwrap();

        assert_eq!(Some(decoded), manager.capture_current_state());
    }

    #[test]
    fn test_export_keeps_unsupported_hdr_entries() {
        let fixture = DisplayFixture::new().with_live_state(&TestLayouts::desk());
        let manager = fixture.manager();

        let payload = manager.export_current_settings().unwrap();
        let decoded: ModifiedState = serde_json::from_slice(&payload).unwrap();

        assert_eq!(
            decoded.original_hdr_states.get("DeviceId1"),
            Some(&Some(HdrState::Enabled))
        );
        assert_eq!(decoded.original_hdr_states.get("DeviceId2"), Some(&None));
    }
}

#[cfg(test)]
mod queries {
    use super::*;
    use display_settings_manager::display::{EnumeratedDeviceInfo, Point, Rational, Resolution};

    fn device(device_id: &str, display_name: &str, friendly_name: &str) -> EnumeratedDevice {
        EnumeratedDevice {
            device_id: device_id.to_string(),
            display_name: display_name.to_string(),
            friendly_name: friendly_name.to_string(),
            info: Some(EnumeratedDeviceInfo {
                resolution: Resolution {
                    width: 1920,
                    height: 1080,
                },
                resolution_scale: 1.0,
                refresh_rate: Rational {
                    numerator: 60,
                    denominator: 1,
                },
                primary: true,
                origin_point: Point { x: 0, y: 0 },
                hdr_state: None,
            }),
        }
    }

    #[test]
    fn test_enum_available_devices_passes_through() {
        let fixture = DisplayFixture::new();
        let devices = vec![
            device("DeviceId1", "\\\\.\\DISPLAY1", "Desk Monitor"),
            device("DeviceId2", "", "Inactive Panel"),
        ];
        fixture.display.set_mock_devices(devices.clone());
        let manager = fixture.manager();

        assert_eq!(manager.enum_available_devices(), devices);
        assert_eq!(manager.get_display_name("DeviceId1"), "\\\\.\\DISPLAY1");
        assert_eq!(manager.get_display_name("DeviceId2"), "");
        assert_eq!(manager.get_display_name("Unknown"), "");
        assert!(fixture.display.get_mutation_calls().is_empty());
    }

    #[test]
    fn test_workarounds_are_kept() {
        let fixture = DisplayFixture::new();
        let manager = fixture.manager();
        assert_eq!(manager.get_workarounds().hdr_blank_delay_ms, Some(1));
    }
}

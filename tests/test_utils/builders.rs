//! Test utility builders for creating topologies and display snapshots
//!
//! Individual methods may not be used by all tests, so dead code warnings are suppressed.

#![allow(dead_code)]

use display_settings_manager::display::{
    ActiveTopology, DisplayMode, HdrState, InitialState, ModifiedState, SingleDisplayConfigState,
};

/// Build a topology from string slices
pub fn topology(groups: &[&[&str]]) -> ActiveTopology {
    groups
        .iter()
        .map(|group| group.iter().map(|id| id.to_string()).collect())
        .collect()
}

/// Mode with an integer refresh rate
pub fn mode(width: u32, height: u32, hz: u32) -> DisplayMode {
    DisplayMode::new(width, height, hz, 1)
}

/// Builder for creating test ModifiedState instances
pub struct ModifiedStateBuilder {
    state: ModifiedState,
}

impl ModifiedStateBuilder {
    pub fn new() -> Self {
        Self {
            state: ModifiedState {
                topology: topology(&[&["DeviceId1"]]),
                ..Default::default()
            },
        }
    }

    pub fn topology(mut self, groups: &[&[&str]]) -> Self {
        self.state.topology = topology(groups);
        self
    }

    pub fn mode(mut self, device_id: &str, width: u32, height: u32, hz: u32) -> Self {
        self.state
            .original_modes
            .insert(device_id.to_string(), mode(width, height, hz));
        self
    }

    pub fn hdr(mut self, device_id: &str, state: Option<HdrState>) -> Self {
        self.state
            .original_hdr_states
            .insert(device_id.to_string(), state);
        self
    }

    pub fn primary(mut self, device_id: &str) -> Self {
        self.state.original_primary_device = device_id.to_string();
        self
    }

    pub fn build(self) -> ModifiedState {
        self.state
    }
}

impl Default for ModifiedStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test SingleDisplayConfigState instances
pub struct SnapshotBuilder {
    initial: InitialState,
    modified: ModifiedState,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            initial: InitialState {
                topology: topology(&[&["DeviceId1"]]),
                primary_devices: Default::default(),
            },
            modified: ModifiedStateBuilder::new().build(),
        }
    }

    pub fn initial_topology(mut self, groups: &[&[&str]]) -> Self {
        self.initial.topology = topology(groups);
        self
    }

    pub fn initial_primary(mut self, device_id: &str) -> Self {
        self.initial.primary_devices.insert(device_id.to_string());
        self
    }

    pub fn modified(mut self, modified: ModifiedState) -> Self {
        self.modified = modified;
        self
    }

    pub fn build(self) -> SingleDisplayConfigState {
        SingleDisplayConfigState {
            initial: self.initial,
            modified: self.modified,
        }
    }

    pub fn build_bytes(self) -> Vec<u8> {
        serde_json::to_vec(&self.build()).expect("Snapshot must serialize")
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Collection of common layouts
pub struct TestLayouts;

impl TestLayouts {
    /// Two extended monitors, first one primary with HDR on, second without HDR support
    pub fn desk() -> ModifiedState {
        ModifiedStateBuilder::new()
            .topology(&[&["DeviceId1"], &["DeviceId2"]])
            .mode("DeviceId1", 2560, 1440, 144)
            .mode("DeviceId2", 1920, 1080, 60)
            .hdr("DeviceId1", Some(HdrState::Enabled))
            .hdr("DeviceId2", None)
            .primary("DeviceId1")
            .build()
    }

    /// Only the TV, HDR off
    pub fn couch() -> ModifiedState {
        ModifiedStateBuilder::new()
            .topology(&[&["DeviceId3"]])
            .mode("DeviceId3", 3840, 2160, 60)
            .hdr("DeviceId3", Some(HdrState::Disabled))
            .primary("DeviceId3")
            .build()
    }
}

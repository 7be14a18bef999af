#![allow(dead_code)]

use display_settings_manager::config::Workarounds;
use display_settings_manager::display::ModifiedState;
use display_settings_manager::settings::SettingsManager;
use display_settings_manager::system::{MockAudioContext, MockDisplaySystem, MockPersistentState};

pub type MockManager = SettingsManager<MockDisplaySystem, MockAudioContext, MockPersistentState>;

/// Test fixture that creates a complete mocked environment
pub struct DisplayFixture {
    pub display: MockDisplaySystem,
    pub audio: MockAudioContext,
    pub store: MockPersistentState,
    pub workarounds: Workarounds,
}

impl DisplayFixture {
    pub fn new() -> Self {
        Self {
            display: MockDisplaySystem::new(),
            audio: MockAudioContext::new(),
            store: MockPersistentState::new(),
            workarounds: Workarounds {
                hdr_blank_delay_ms: Some(1),
            },
        }
    }

    /// Make the live mock system look exactly like the given state
    pub fn with_live_state(self, state: &ModifiedState) -> Self {
        self.set_live_state(state);
        self
    }

    pub fn set_live_state(&self, state: &ModifiedState) {
        self.display.set_mock_topology(state.topology.clone());
        self.display.set_mock_modes(state.original_modes.clone());
        self.display
            .set_mock_hdr_states(state.original_hdr_states.clone());
        self.display.set_mock_primary(&state.original_primary_device);
    }

    pub fn without_blanking(mut self) -> Self {
        self.workarounds.hdr_blank_delay_ms = None;
        self
    }

    pub fn manager(&self) -> MockManager {
        SettingsManager::new(
            self.display.clone(),
            self.audio.clone(),
            self.store.clone(),
            self.workarounds.clone(),
        )
    }
}

impl Default for DisplayFixture {
    fn default() -> Self {
        Self::new()
    }
}

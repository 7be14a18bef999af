use std::cell::Cell;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::config::Workarounds;
use crate::display::{
    ActiveTopology, EnumeratedDeviceList, InitialState, ModeStrictness, ModifiedState,
    SingleDisplayConfigState, flatten_topology,
};
use crate::system::{
    AudioContextInterface, DisplayDeviceInterface, NoopAudioContext, PersistentStateInterface,
};

use super::result::{RevertError, RevertResult};
use super::scope::ScopeExit;
use super::utils;

/// Captures the current display configuration and replays captured snapshots.
///
/// The manager assumes exclusive use of the display API for the duration of
/// each call; it never retries and never runs anything in parallel.
pub struct SettingsManager<
    D: DisplayDeviceInterface,
    A: AudioContextInterface,
    P: PersistentStateInterface,
> {
    dd_api: D,
    audio_context: A,
    persistent_state: P,
    workarounds: Workarounds,
}

impl<D: DisplayDeviceInterface, A: AudioContextInterface, P: PersistentStateInterface>
    SettingsManager<D, A, P>
{
    pub fn new(dd_api: D, audio_context: A, persistent_state: P, workarounds: Workarounds) -> Self {
        info!(
            "Provided workaround settings for SettingsManager:\n{}",
            codec::to_log_string(&workarounds)
        );

        Self {
            dd_api,
            audio_context,
            persistent_state,
            workarounds,
        }
    }

    pub fn enum_available_devices(&self) -> EnumeratedDeviceList {
        self.dd_api.enum_available_devices()
    }

    pub fn get_display_name(&self, device_id: &str) -> String {
        self.dd_api.get_display_name(device_id)
    }

    pub fn get_workarounds(&self) -> &Workarounds {
        &self.workarounds
    }

    /// Read the live configuration into a snapshot whose `initial` and
    /// `modified` halves both describe the current state.
    ///
    /// Returns `None` when the API is unavailable, the current topology is
    /// invalid or the display modes cannot be read. Unreadable HDR states are
    /// tolerated and leave the HDR map empty. Never changes system settings.
    pub fn capture_current_state(&self) -> Option<SingleDisplayConfigState> {
        if !self.dd_api.is_api_access_available() {
            error!("Capture: API temporarily unavailable.");
            return None;
        }

        let topology = self.dd_api.get_current_topology();
        if !self.dd_api.is_topology_valid(&topology) {
            error!(
                "Capture: current topology is invalid:\n{}",
                codec::to_log_string(&topology)
            );
            return None;
        }

        let device_ids = flatten_topology(&topology);
        let modes = self.dd_api.get_current_display_modes(&device_ids);
        if modes.is_empty() {
            error!("Capture: failed to get current display modes!");
            return None;
        }

        let hdr_states = self.dd_api.get_current_hdr_states(&device_ids);
        if hdr_states.is_empty() {
            warn!("Capture: HDR states are not available, continuing without them.");
        }

        let primary_devices: BTreeSet<String> = device_ids
            .iter()
            .filter(|device_id| self.dd_api.is_primary(device_id))
            .cloned()
            .collect();
        // Same answer as utils::get_primary_device, without asking the API twice
        let original_primary_device = primary_devices.iter().next().cloned().unwrap_or_default();

        debug!(
            "Captured {} devices, primary: '{}'",
            device_ids.len(),
            original_primary_device
        );

        Some(SingleDisplayConfigState {
            initial: InitialState {
                topology: topology.clone(),
                primary_devices,
            },
            modified: ModifiedState {
                topology,
                original_modes: modes,
                original_hdr_states: hdr_states,
                original_primary_device,
            },
        })
    }

    /// Encode the current point-in-time configuration.
    pub fn export_current_settings(&self) -> Option<Vec<u8>> {
        let state = self.capture_current_state()?;
        Self::encode("Export settings", &state.modified)
    }

    /// Encode the current configuration as a transition snapshot accepted by
    /// [`Self::restore_from_profile`].
    pub fn export_restore_profile(&self) -> Option<Vec<u8>> {
        let state = self.capture_current_state()?;
        Self::encode("Export profile", &state)
    }

    fn encode<T: serde::Serialize>(operation: &str, value: &T) -> Option<Vec<u8>> {
        match codec::to_bytes(value) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("{}: failed to encode snapshot: {:#}", operation, e);
                None
            }
        }
    }

    /// Decode a transition snapshot and replay it onto the system.
    ///
    /// A payload that does not decode is reported as
    /// [`RevertError::PersistenceSaveFailed`] and no display API call is made.
    pub fn restore_from_profile(&self, data: &[u8]) -> RevertResult {
        let snapshot: SingleDisplayConfigState = match codec::from_bytes(data) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Restore profile: failed to parse profile JSON: {:#}", e);
                return Err(RevertError::PersistenceSaveFailed);
            }
        };

        self.restore_state(&snapshot)
    }

    /// Capture the current configuration and retain it in the persistent store.
    pub fn save_restore_profile(&self) -> bool {
        let Some(state) = self.capture_current_state() else {
            error!("Save profile: nothing could be captured.");
            return false;
        };

        if let Err(e) = self.persistent_state.persist_state(Some(state)) {
            error!("Save profile: failed to persist state: {:#}", e);
            return false;
        }

        info!("Save profile: current display settings retained.");
        true
    }

    /// Replay the retained snapshot, then forget it.
    ///
    /// Succeeds trivially when nothing is retained. The retained snapshot is
    /// kept if the replay fails, so the caller may try again later.
    pub fn restore_from_persistence(&self) -> RevertResult {
        let Some(state) = self.persistent_state.get_state() else {
            debug!("Restore persistence: no retained state.");
            return Ok(());
        };

        self.restore_state(&state)?;

        if let Err(e) = self.persistent_state.persist_state(None) {
            error!("Restore persistence: failed to clear persistence: {:#}", e);
            return Err(RevertError::PersistenceSaveFailed);
        }

        self.release_audio_context();
        Ok(())
    }

    /// Forget the retained snapshot without replaying it.
    pub fn reset_persistence(&self) -> bool {
        info!("Trying to reset persistent display device settings.");
        if self.persistent_state.get_state().is_none() {
            return true;
        }

        if let Err(e) = self.persistent_state.persist_state(None) {
            error!("Failed to clear persistence: {:#}", e);
            return false;
        }

        self.release_audio_context();
        true
    }

    fn release_audio_context(&self) {
        if self.audio_context.is_captured() {
            debug!("Releasing captured audio context");
            self.audio_context.release();
        }
    }

    fn restore_state(&self, snapshot: &SingleDisplayConfigState) -> RevertResult {
        if !self.dd_api.is_api_access_available() {
            warn!("Restore: API temporarily unavailable.");
            return Err(RevertError::ApiTemporarilyUnavailable);
        }

        let current_topology = self.dd_api.get_current_topology();
        if !self.dd_api.is_topology_valid(&current_topology) {
            error!(
                "Restore: current topology is invalid:\n{}",
                codec::to_log_string(&current_topology)
            );
            return Err(RevertError::TopologyIsInvalid);
        }

        let system_settings_touched = Cell::new(false);
        let _hdr_blank_always_executed_guard = ScopeExit::new(|| {
            if system_settings_touched.get() {
                utils::blank_hdr_states(&self.dd_api, self.workarounds.hdr_blank_delay());
            }
        });

        let modified = &snapshot.modified;
        self.switch_topology(
            "modified",
            &current_topology,
            &modified.topology,
            &system_settings_touched,
        )?;
        self.revert_hdr_states(modified, &system_settings_touched)?;
        self.revert_display_modes(modified, &system_settings_touched)?;
        self.revert_primary_device(modified, &system_settings_touched)?;
        self.switch_topology(
            "initial",
            &modified.topology,
            &snapshot.initial.topology,
            &system_settings_touched,
        )?;

        info!("Restore: display settings restored.");
        Ok(())
    }

    fn switch_topology(
        &self,
        label: &str,
        from: &ActiveTopology,
        to: &ActiveTopology,
        touched: &Cell<bool>,
    ) -> RevertResult {
        if !self.dd_api.is_topology_valid(to) {
            error!(
                "Restore: {} topology is invalid:\n{}",
                label,
                codec::to_log_string(to)
            );
            return Err(RevertError::TopologyIsInvalid);
        }

        if self.dd_api.is_topology_the_same(from, to) {
            debug!("Restore: already using the {} topology.", label);
            return Ok(());
        }

        touched.set(true);
        if let Err(e) = self.dd_api.set_topology(to) {
            error!("Restore: failed to set {} topology: {:#}", label, e);
            return Err(RevertError::SwitchingTopologyFailed);
        }

        Ok(())
    }

    fn revert_hdr_states(&self, modified: &ModifiedState, touched: &Cell<bool>) -> RevertResult {
        if modified.original_hdr_states.is_empty() {
            return Ok(());
        }

        let current_states = self
            .dd_api
            .get_current_hdr_states(&flatten_topology(&modified.topology));
        if current_states == modified.original_hdr_states {
            return Ok(());
        }

        touched.set(true);
        info!(
            "Restore: applying HDR states:\n{}",
            codec::to_log_string(&modified.original_hdr_states)
        );
        if let Err(e) = self.dd_api.set_hdr_states(&modified.original_hdr_states) {
            error!("Restore: failed to apply HDR states: {:#}", e);
            return Err(RevertError::RevertingHdrStatesFailed);
        }

        Ok(())
    }

    fn revert_display_modes(&self, modified: &ModifiedState, touched: &Cell<bool>) -> RevertResult {
        if modified.original_modes.is_empty() {
            return Ok(());
        }

        let current_modes = self
            .dd_api
            .get_current_display_modes(&flatten_topology(&modified.topology));
        if current_modes == modified.original_modes {
            return Ok(());
        }

        touched.set(true);
        info!(
            "Restore: applying display modes (strict):\n{}",
            codec::to_log_string(&modified.original_modes)
        );
        if let Err(e) = self
            .dd_api
            .set_display_modes(&modified.original_modes, ModeStrictness::Strict)
        {
            error!("Restore: failed to apply display modes: {:#}", e);
            return Err(RevertError::RevertingDisplayModesFailed);
        }

        Ok(())
    }

    fn revert_primary_device(&self, modified: &ModifiedState, touched: &Cell<bool>) -> RevertResult {
        if modified.original_primary_device.is_empty() {
            return Ok(());
        }

        let current_primary = utils::get_primary_device(&self.dd_api, &modified.topology);
        if current_primary == modified.original_primary_device {
            return Ok(());
        }

        touched.set(true);
        info!(
            "Restore: setting primary device to: {}",
            modified.original_primary_device
        );
        if let Err(e) = self
            .dd_api
            .set_as_primary(&modified.original_primary_device)
        {
            error!("Restore: failed to set primary device: {:#}", e);
            return Err(RevertError::RevertingPrimaryDeviceFailed);
        }

        Ok(())
    }

    /// Get reference to the display API (for testing)
    #[cfg(any(test, feature = "test-mocks"))]
    pub fn get_display_api(&self) -> &D {
        &self.dd_api
    }
}

// Convenience constructor for callers without audio bookkeeping
impl<D: DisplayDeviceInterface, P: PersistentStateInterface>
    SettingsManager<D, NoopAudioContext, P>
{
    pub fn without_audio_context(dd_api: D, persistent_state: P, workarounds: Workarounds) -> Self {
        Self::new(dd_api, NoopAudioContext, persistent_state, workarounds)
    }
}

use anyhow::Result;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::display::{
    self, ActiveTopology, DeviceDisplayModeMap, EnumeratedDeviceList, HdrStateMap,
    ModeStrictness, SingleDisplayConfigState,
};
use crate::system::traits::{
    AudioContextInterface, DisplayDeviceInterface, FileSystemInterface, PersistentStateInterface,
};

/// Recorded display API call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    IsApiAccessAvailable,
    EnumAvailableDevices,
    GetDisplayName(String),
    GetCurrentTopology,
    IsTopologyValid(ActiveTopology),
    IsTopologyTheSame,
    SetTopology(ActiveTopology),
    GetCurrentDisplayModes(BTreeSet<String>),
    SetDisplayModes(DeviceDisplayModeMap, ModeStrictness),
    IsPrimary(String),
    SetAsPrimary(String),
    GetCurrentHdrStates(BTreeSet<String>),
    SetHdrStates(HdrStateMap),
}

impl DisplayCall {
    /// Whether the call changes system settings
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            DisplayCall::SetTopology(_)
                | DisplayCall::SetDisplayModes(..)
                | DisplayCall::SetAsPrimary(_)
                | DisplayCall::SetHdrStates(_)
        )
    }
}

/// Mock display system for testing - provides controllable display state
#[derive(Clone)]
pub struct MockDisplaySystem {
    pub api_available: Arc<AtomicBool>,
    pub devices: Arc<Mutex<EnumeratedDeviceList>>,
    pub topology: Arc<Mutex<ActiveTopology>>,
    pub modes: Arc<Mutex<DeviceDisplayModeMap>>,
    pub hdr_states: Arc<Mutex<HdrStateMap>>,
    pub primary_device: Arc<Mutex<String>>,
    pub calls: Arc<Mutex<Vec<DisplayCall>>>,
    pub should_fail_set_topology: Arc<AtomicBool>,
    pub should_fail_set_modes: Arc<AtomicBool>,
    pub should_fail_set_hdr: Arc<AtomicBool>,
    pub should_fail_set_primary: Arc<AtomicBool>,
    pub modes_unreadable: Arc<AtomicBool>,
    pub hdr_unreadable: Arc<AtomicBool>,
}

impl MockDisplaySystem {
    pub fn new() -> Self {
        Self {
            api_available: Arc::new(AtomicBool::new(true)),
            devices: Arc::new(Mutex::new(Vec::new())),
            topology: Arc::new(Mutex::new(Vec::new())),
            modes: Arc::new(Mutex::new(DeviceDisplayModeMap::new())),
            hdr_states: Arc::new(Mutex::new(HdrStateMap::new())),
            primary_device: Arc::new(Mutex::new(String::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            should_fail_set_topology: Arc::new(AtomicBool::new(false)),
            should_fail_set_modes: Arc::new(AtomicBool::new(false)),
            should_fail_set_hdr: Arc::new(AtomicBool::new(false)),
            should_fail_set_primary: Arc::new(AtomicBool::new(false)),
            modes_unreadable: Arc::new(AtomicBool::new(false)),
            hdr_unreadable: Arc::new(AtomicBool::new(false)),
        }
    }

    fn record(&self, call: DisplayCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Set the active topology without recording a call
    pub fn set_mock_topology(&self, topology: ActiveTopology) {
        *self.topology.lock().unwrap() = topology;
    }

    /// Set the current mode map without recording a call
    pub fn set_mock_modes(&self, modes: DeviceDisplayModeMap) {
        *self.modes.lock().unwrap() = modes;
    }

    /// Set the current HDR map without recording a call
    pub fn set_mock_hdr_states(&self, states: HdrStateMap) {
        *self.hdr_states.lock().unwrap() = states;
    }

    /// Set the primary device without recording a call
    pub fn set_mock_primary(&self, device_id: &str) {
        *self.primary_device.lock().unwrap() = device_id.to_string();
    }

    /// Set the list returned by device enumeration
    pub fn set_mock_devices(&self, devices: EnumeratedDeviceList) {
        *self.devices.lock().unwrap() = devices;
    }

    /// Configure API availability
    pub fn set_api_available(&self, available: bool) {
        self.api_available.store(available, Ordering::Relaxed);
    }

    /// Configure the mock to fail topology switching
    pub fn set_topology_failure(&self, should_fail: bool) {
        self.should_fail_set_topology
            .store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail display mode changes
    pub fn set_modes_failure(&self, should_fail: bool) {
        self.should_fail_set_modes.store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail HDR changes
    pub fn set_hdr_failure(&self, should_fail: bool) {
        self.should_fail_set_hdr.store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail primary device changes
    pub fn set_primary_failure(&self, should_fail: bool) {
        self.should_fail_set_primary
            .store(should_fail, Ordering::Relaxed);
    }

    /// Make display mode queries return the empty "unreadable" map
    pub fn set_modes_unreadable(&self, unreadable: bool) {
        self.modes_unreadable.store(unreadable, Ordering::Relaxed);
    }

    /// Make HDR queries return the empty "not queryable" map
    pub fn set_hdr_unreadable(&self, unreadable: bool) {
        self.hdr_unreadable.store(unreadable, Ordering::Relaxed);
    }

    /// Get all calls that were made
    pub fn get_calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Get only the calls that changed system settings
    pub fn get_mutation_calls(&self) -> Vec<DisplayCall> {
        self.get_calls()
            .into_iter()
            .filter(DisplayCall::is_mutation)
            .collect()
    }

    /// Clear the call history
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn current_topology(&self) -> ActiveTopology {
        self.topology.lock().unwrap().clone()
    }

    pub fn current_modes(&self) -> DeviceDisplayModeMap {
        self.modes.lock().unwrap().clone()
    }

    pub fn current_hdr_states(&self) -> HdrStateMap {
        self.hdr_states.lock().unwrap().clone()
    }

    pub fn current_primary(&self) -> String {
        self.primary_device.lock().unwrap().clone()
    }
}

impl DisplayDeviceInterface for MockDisplaySystem {
    fn is_api_access_available(&self) -> bool {
        self.record(DisplayCall::IsApiAccessAvailable);
        self.api_available.load(Ordering::Relaxed)
    }

    fn enum_available_devices(&self) -> EnumeratedDeviceList {
        self.record(DisplayCall::EnumAvailableDevices);
        self.devices.lock().unwrap().clone()
    }

    fn get_display_name(&self, device_id: &str) -> String {
        self.record(DisplayCall::GetDisplayName(device_id.to_string()));
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.device_id == device_id)
            .map(|d| d.display_name.clone())
            .unwrap_or_default()
    }

    fn get_current_topology(&self) -> ActiveTopology {
        self.record(DisplayCall::GetCurrentTopology);
        self.current_topology()
    }

    fn is_topology_valid(&self, topology: &ActiveTopology) -> bool {
        self.record(DisplayCall::IsTopologyValid(topology.clone()));
        display::is_topology_valid(topology)
    }

    fn is_topology_the_same(&self, lhs: &ActiveTopology, rhs: &ActiveTopology) -> bool {
        self.record(DisplayCall::IsTopologyTheSame);
        display::is_topology_the_same(lhs, rhs)
    }

    fn set_topology(&self, topology: &ActiveTopology) -> Result<()> {
        self.record(DisplayCall::SetTopology(topology.clone()));
        if self.should_fail_set_topology.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock set topology failure"));
        }
        self.set_mock_topology(topology.clone());
        Ok(())
    }

    fn get_current_display_modes(&self, device_ids: &BTreeSet<String>) -> DeviceDisplayModeMap {
        self.record(DisplayCall::GetCurrentDisplayModes(device_ids.clone()));
        if self.modes_unreadable.load(Ordering::Relaxed) {
            return DeviceDisplayModeMap::new();
        }

        let modes = self.modes.lock().unwrap();
        let mut result = DeviceDisplayModeMap::new();
        for id in device_ids {
            match modes.get(id) {
                Some(mode) => {
                    result.insert(id.clone(), *mode);
                }
                None => return DeviceDisplayModeMap::new(),
            }
        }
        result
    }

    fn set_display_modes(
        &self,
        modes: &DeviceDisplayModeMap,
        strictness: ModeStrictness,
    ) -> Result<()> {
        self.record(DisplayCall::SetDisplayModes(modes.clone(), strictness));
        if self.should_fail_set_modes.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock set display modes failure"));
        }
        self.modes
            .lock()
            .unwrap()
            .extend(modes.iter().map(|(id, mode)| (id.clone(), *mode)));
        Ok(())
    }

    fn is_primary(&self, device_id: &str) -> bool {
        self.record(DisplayCall::IsPrimary(device_id.to_string()));
        *self.primary_device.lock().unwrap() == device_id
    }

    fn set_as_primary(&self, device_id: &str) -> Result<()> {
        self.record(DisplayCall::SetAsPrimary(device_id.to_string()));
        if self.should_fail_set_primary.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock set primary failure"));
        }
        self.set_mock_primary(device_id);
        Ok(())
    }

    fn get_current_hdr_states(&self, device_ids: &BTreeSet<String>) -> HdrStateMap {
        self.record(DisplayCall::GetCurrentHdrStates(device_ids.clone()));
        if self.hdr_unreadable.load(Ordering::Relaxed) {
            return HdrStateMap::new();
        }

        let states = self.hdr_states.lock().unwrap();
        device_ids
            .iter()
            .map(|id| (id.clone(), states.get(id).copied().flatten()))
            .collect()
    }

    fn set_hdr_states(&self, states: &HdrStateMap) -> Result<()> {
        self.record(DisplayCall::SetHdrStates(states.clone()));
        if self.should_fail_set_hdr.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock set HDR states failure"));
        }
        let mut current = self.hdr_states.lock().unwrap();
        for (id, state) in states {
            if let Some(state) = state {
                current.insert(id.clone(), Some(*state));
            }
        }
        Ok(())
    }
}

impl Default for MockDisplaySystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock persistent state store for testing
#[derive(Clone)]
pub struct MockPersistentState {
    pub state: Arc<Mutex<Option<SingleDisplayConfigState>>>,
    pub get_calls: Arc<AtomicUsize>,
    pub persist_calls: Arc<Mutex<Vec<Option<SingleDisplayConfigState>>>>,
    pub should_fail_persist: Arc<AtomicBool>,
}

impl MockPersistentState {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
            get_calls: Arc::new(AtomicUsize::new(0)),
            persist_calls: Arc::new(Mutex::new(Vec::new())),
            should_fail_persist: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a store that already retains the given snapshot
    pub fn with_state(state: SingleDisplayConfigState) -> Self {
        let store = Self::new();
        *store.state.lock().unwrap() = Some(state);
        store
    }

    /// Configure the mock to fail persisting
    pub fn set_persist_failure(&self, should_fail: bool) {
        self.should_fail_persist.store(should_fail, Ordering::Relaxed);
    }

    /// Get all persist calls that were made
    pub fn get_persist_calls(&self) -> Vec<Option<SingleDisplayConfigState>> {
        self.persist_calls.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }

    /// Retained snapshot, without counting a call
    pub fn retained(&self) -> Option<SingleDisplayConfigState> {
        self.state.lock().unwrap().clone()
    }
}

impl PersistentStateInterface for MockPersistentState {
    fn get_state(&self) -> Option<SingleDisplayConfigState> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.retained()
    }

    fn persist_state(&self, state: Option<SingleDisplayConfigState>) -> Result<()> {
        self.persist_calls.lock().unwrap().push(state.clone());
        if self.should_fail_persist.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock persist failure"));
        }
        *self.state.lock().unwrap() = state;
        Ok(())
    }
}

impl Default for MockPersistentState {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock audio context for testing
#[derive(Clone)]
pub struct MockAudioContext {
    pub captured: Arc<AtomicBool>,
    pub capture_calls: Arc<AtomicUsize>,
    pub is_captured_calls: Arc<AtomicUsize>,
    pub release_calls: Arc<AtomicUsize>,
}

impl MockAudioContext {
    pub fn new() -> Self {
        Self {
            captured: Arc::new(AtomicBool::new(false)),
            capture_calls: Arc::new(AtomicUsize::new(0)),
            is_captured_calls: Arc::new(AtomicUsize::new(0)),
            release_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mark the context as captured without recording a call
    pub fn set_captured(&self, captured: bool) {
        self.captured.store(captured, Ordering::Relaxed);
    }

    pub fn get_release_count(&self) -> usize {
        self.release_calls.load(Ordering::Relaxed)
    }

    /// Total number of calls of any kind
    pub fn get_total_call_count(&self) -> usize {
        self.capture_calls.load(Ordering::Relaxed)
            + self.is_captured_calls.load(Ordering::Relaxed)
            + self.release_calls.load(Ordering::Relaxed)
    }
}

impl AudioContextInterface for MockAudioContext {
    fn capture(&self) -> bool {
        self.capture_calls.fetch_add(1, Ordering::Relaxed);
        self.captured.store(true, Ordering::Relaxed);
        true
    }

    fn is_captured(&self) -> bool {
        self.is_captured_calls.fetch_add(1, Ordering::Relaxed);
        self.captured.load(Ordering::Relaxed)
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::Relaxed);
        self.captured.store(false, Ordering::Relaxed);
    }
}

impl Default for MockAudioContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock file system for testing - provides controllable file operations
#[derive(Clone)]
pub struct MockFileSystem {
    pub files: Arc<Mutex<HashMap<PathBuf, String>>>,
    pub read_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub write_calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub remove_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub directory_creation_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub should_fail_read: Arc<AtomicBool>,
    pub should_fail_write: Arc<AtomicBool>,
    pub should_fail_remove: Arc<AtomicBool>,
    pub should_fail_create_dir: Arc<AtomicBool>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            read_calls: Arc::new(Mutex::new(Vec::new())),
            write_calls: Arc::new(Mutex::new(Vec::new())),
            remove_calls: Arc::new(Mutex::new(Vec::new())),
            directory_creation_calls: Arc::new(Mutex::new(Vec::new())),
            should_fail_read: Arc::new(AtomicBool::new(false)),
            should_fail_write: Arc::new(AtomicBool::new(false)),
            should_fail_remove: Arc::new(AtomicBool::new(false)),
            should_fail_create_dir: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a file to the mock file system
    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: String) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content);
    }

    /// Get the content of a file in the mock file system
    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// Get all read calls that were made
    pub fn get_read_calls(&self) -> Vec<PathBuf> {
        self.read_calls.lock().unwrap().clone()
    }

    /// Get all write calls that were made
    pub fn get_write_calls(&self) -> Vec<(PathBuf, String)> {
        self.write_calls.lock().unwrap().clone()
    }

    /// Get all remove calls that were made
    pub fn get_remove_calls(&self) -> Vec<PathBuf> {
        self.remove_calls.lock().unwrap().clone()
    }

    /// Get all directory creation calls that were made
    pub fn get_directory_creation_calls(&self) -> Vec<PathBuf> {
        self.directory_creation_calls.lock().unwrap().clone()
    }

    /// Configure the mock to fail read operations
    pub fn set_read_failure(&self, should_fail: bool) {
        self.should_fail_read.store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail write operations
    pub fn set_write_failure(&self, should_fail: bool) {
        self.should_fail_write.store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail remove operations
    pub fn set_remove_failure(&self, should_fail: bool) {
        self.should_fail_remove.store(should_fail, Ordering::Relaxed);
    }

    /// Configure the mock to fail directory creation
    pub fn set_create_dir_failure(&self, should_fail: bool) {
        self.should_fail_create_dir
            .store(should_fail, Ordering::Relaxed);
    }
}

impl FileSystemInterface for MockFileSystem {
    fn read_file(&self, path: &Path) -> Result<String> {
        self.read_calls.lock().unwrap().push(path.to_path_buf());

        if self.should_fail_read.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock read failure"));
        }

        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.write_calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));

        if self.should_fail_write.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock write failure"));
        }

        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_calls.lock().unwrap().push(path.to_path_buf());

        if self.should_fail_remove.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock remove failure"));
        }

        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        self.directory_creation_calls
            .lock()
            .unwrap()
            .push(path.to_path_buf());

        if self.should_fail_create_dir.load(Ordering::Relaxed) {
            return Err(anyhow::anyhow!("Mock create directory failure"));
        }

        Ok(())
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}


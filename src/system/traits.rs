use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

use crate::display::{
    ActiveTopology, DeviceDisplayModeMap, EnumeratedDeviceList, HdrStateMap, ModeStrictness,
    SingleDisplayConfigState,
};

/// Trait for display device operations - abstracts the OS display configuration API
pub trait DisplayDeviceInterface {
    /// Check if the API can currently be used (it may be unavailable e.g. while the session is locked)
    fn is_api_access_available(&self) -> bool;

    /// Enumerate all known display devices, active or not
    fn enum_available_devices(&self) -> EnumeratedDeviceList;

    /// Get the display name (e.g. `\\.\DISPLAY1`) of an active device, or empty string
    fn get_display_name(&self, device_id: &str) -> String;

    /// Get the currently active topology
    fn get_current_topology(&self) -> ActiveTopology;

    /// Check whether the topology could be applied by this API
    fn is_topology_valid(&self, topology: &ActiveTopology) -> bool;

    /// Check whether two topologies describe the same device grouping
    fn is_topology_the_same(&self, lhs: &ActiveTopology, rhs: &ActiveTopology) -> bool;

    /// Activate the given topology
    fn set_topology(&self, topology: &ActiveTopology) -> Result<()>;

    /// Get the current modes for the devices.
    /// Returns an empty map if the modes could not be read for every device.
    fn get_current_display_modes(&self, device_ids: &BTreeSet<String>) -> DeviceDisplayModeMap;

    /// Apply display modes to the devices
    fn set_display_modes(
        &self,
        modes: &DeviceDisplayModeMap,
        strictness: ModeStrictness,
    ) -> Result<()>;

    /// Check if the device is the primary one
    fn is_primary(&self, device_id: &str) -> bool;

    /// Make the device the primary one
    fn set_as_primary(&self, device_id: &str) -> Result<()>;

    /// Get the HDR states for the devices.
    /// Returns an empty map if HDR states cannot be queried.
    fn get_current_hdr_states(&self, device_ids: &BTreeSet<String>) -> HdrStateMap;

    /// Apply HDR states to the devices
    fn set_hdr_states(&self, states: &HdrStateMap) -> Result<()>;
}

/// Trait for retaining a display snapshot between process runs
pub trait PersistentStateInterface {
    /// Get the currently retained snapshot, if any
    fn get_state(&self) -> Option<SingleDisplayConfigState>;

    /// Retain the snapshot, or clear the retained one when `None` is passed
    fn persist_state(&self, state: Option<SingleDisplayConfigState>) -> Result<()>;
}

/// Trait for the audio bookkeeping tied to display device teardown
pub trait AudioContextInterface {
    /// Capture the audio context; returns false if it could not be captured
    fn capture(&self) -> bool;

    /// Check if the audio context is currently captured
    fn is_captured(&self) -> bool;

    /// Release a captured audio context
    fn release(&self);
}

/// Trait for file system operations - abstracts std::fs for testability
pub trait FileSystemInterface {
    /// Read the entire contents of a file
    fn read_file(&self, path: &Path) -> Result<String>;

    /// Write content to a file
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Check if a file exists
    fn file_exists(&self, path: &Path) -> bool;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Create the directory structure
    fn create_dir(&self, path: &Path) -> Result<()>;
}

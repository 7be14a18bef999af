use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::codec;
use crate::display::{
    self, ActiveTopology, DeviceDisplayModeMap, DisplayMode, EnumeratedDevice,
    EnumeratedDeviceInfo, EnumeratedDeviceList, HdrState, HdrStateMap, ModeStrictness, Point,
};
use crate::system::traits::{DisplayDeviceInterface, FileSystemInterface};

/// One display output in a simulated layout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedDevice {
    pub device_id: String,
    pub display_name: String,
    #[serde(default)]
    pub friendly_name: String,
    /// Modes the panel accepts; an empty list accepts anything
    #[serde(default)]
    pub supported_modes: Vec<DisplayMode>,
    pub current_mode: DisplayMode,
    /// `None` means the panel is not HDR capable
    #[serde(default)]
    pub hdr_state: Option<HdrState>,
    #[serde(default)]
    pub primary: bool,
}

/// JSON document describing a simulated display layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedDisplayState {
    #[serde(default = "default_api_available")]
    pub api_available: bool,
    pub devices: Vec<SimulatedDevice>,
    pub topology: ActiveTopology,
}

fn default_api_available() -> bool {
    true
}

impl SimulatedDisplayState {
    fn device(&self, device_id: &str) -> Option<&SimulatedDevice> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    fn device_mut(&mut self, device_id: &str) -> Option<&mut SimulatedDevice> {
        self.devices.iter_mut().find(|d| d.device_id == device_id)
    }

    fn is_active(&self, device_id: &str) -> bool {
        self.topology.iter().flatten().any(|id| id == device_id)
    }

    fn origin_of(&self, device_id: &str) -> Point {
        // Groups are laid out left to right, duplicated devices share an origin
        let mut x = 0;
        for group in &self.topology {
            if group.iter().any(|id| id == device_id) {
                return Point { x, y: 0 };
            }
            let width = group
                .iter()
                .filter_map(|id| self.device(id))
                .map(|d| d.current_mode.resolution.width)
                .max()
                .unwrap_or(0);
            x += i32::try_from(width).unwrap_or(i32::MAX);
        }
        Point { x: 0, y: 0 }
    }
}

/// Display backend over a JSON layout document, for dry runs and scripting.
/// Every successful mutation is written back to the document.
pub struct SimulatedDisplaySystem<F: FileSystemInterface> {
    file_system: F,
    path: PathBuf,
    state: Mutex<SimulatedDisplayState>,
}

impl<F: FileSystemInterface> SimulatedDisplaySystem<F> {
    /// Load the layout document from the given path
    pub fn load(file_system: F, path: PathBuf) -> Result<Self> {
        debug!("Loading simulated display layout from: {}", path.display());

        let content = file_system
            .read_file(&path)
            .with_context(|| format!("Failed to read display layout: {}", path.display()))?;
        let state: SimulatedDisplayState = codec::from_json(&content)
            .with_context(|| format!("Failed to parse display layout: {}", path.display()))?;

        info!(
            "Loaded simulated display layout with {} devices",
            state.devices.len()
        );
        Ok(Self::with_state(file_system, path, state))
    }

    pub fn with_state(file_system: F, path: PathBuf, state: SimulatedDisplayState) -> Self {
        Self {
            file_system,
            path,
            state: Mutex::new(state),
        }
    }

    /// Get the layout document path
    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current layout
    pub fn snapshot(&self) -> SimulatedDisplayState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, SimulatedDisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change to a copy of the layout, persist it and only then commit it
    fn mutate<R>(
        &self,
        change: impl FnOnce(&mut SimulatedDisplayState) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self.lock_state();
        let mut next = guard.clone();
        let result = change(&mut next)?;

        let content = codec::to_json_pretty(&next)?;
        self.file_system
            .write_file(&self.path, &content)
            .with_context(|| format!("Failed to save display layout: {}", self.path.display()))?;

        *guard = next;
        Ok(result)
    }
}

fn resolve_mode(
    device: &SimulatedDevice,
    requested: &DisplayMode,
    strictness: ModeStrictness,
) -> Result<DisplayMode> {
    if device.supported_modes.is_empty() || device.supported_modes.contains(requested) {
        return Ok(*requested);
    }

    if strictness == ModeStrictness::Strict {
        bail!(
            "Mode {} is not supported by device {}",
            requested,
            device.device_id
        );
    }

    let distance = |mode: &DisplayMode| {
        let dw = mode.resolution.width.abs_diff(requested.resolution.width);
        let dh = mode.resolution.height.abs_diff(requested.resolution.height);
        let dr = (mode.refresh_rate.as_f64() - requested.refresh_rate.as_f64()).abs();
        (u64::from(dw) + u64::from(dh), (dr * 1000.0) as u64)
    };

    let closest = device
        .supported_modes
        .iter()
        .min_by_key(|mode| distance(mode))
        .copied()
        .unwrap_or(*requested);
    debug!(
        "Using closest mode {} instead of {} for device {}",
        closest, requested, device.device_id
    );
    Ok(closest)
}

impl<F: FileSystemInterface> DisplayDeviceInterface for SimulatedDisplaySystem<F> {
    fn is_api_access_available(&self) -> bool {
        self.lock_state().api_available
    }

    fn enum_available_devices(&self) -> EnumeratedDeviceList {
        let state = self.lock_state();
        state
            .devices
            .iter()
            .map(|device| {
                let info = state.is_active(&device.device_id).then(|| EnumeratedDeviceInfo {
                    resolution: device.current_mode.resolution,
                    resolution_scale: 1.0,
                    refresh_rate: device.current_mode.refresh_rate,
                    primary: device.primary,
                    origin_point: state.origin_of(&device.device_id),
                    hdr_state: device.hdr_state,
                });
                EnumeratedDevice {
                    device_id: device.device_id.clone(),
                    display_name: if info.is_some() {
                        device.display_name.clone()
                    } else {
                        String::new()
                    },
                    friendly_name: device.friendly_name.clone(),
                    info,
                }
            })
            .collect()
    }

    fn get_display_name(&self, device_id: &str) -> String {
        let state = self.lock_state();
        match state.device(device_id) {
            Some(device) if state.is_active(device_id) => device.display_name.clone(),
            _ => String::new(),
        }
    }

    fn get_current_topology(&self) -> ActiveTopology {
        self.lock_state().topology.clone()
    }

    fn is_topology_valid(&self, topology: &ActiveTopology) -> bool {
        if !display::is_topology_valid(topology) {
            return false;
        }

        let state = self.lock_state();
        topology.iter().flatten().all(|id| {
            let known = state.device(id).is_some();
            if !known {
                debug!("Topology references unknown device '{}'", id);
            }
            known
        })
    }

    fn is_topology_the_same(&self, lhs: &ActiveTopology, rhs: &ActiveTopology) -> bool {
        display::is_topology_the_same(lhs, rhs)
    }

    fn set_topology(&self, topology: &ActiveTopology) -> Result<()> {
        if !self.is_topology_valid(topology) {
            bail!("Refusing to apply invalid topology {:?}", topology);
        }

        self.mutate(|state| {
            state.topology = topology.clone();

            let active = display::flatten_topology(topology);
            for device in &mut state.devices {
                if !active.contains(&device.device_id) {
                    device.primary = false;
                }
            }

            if !state.devices.iter().any(|d| d.primary) {
                if let Some(first) = active.iter().next() {
                    if let Some(device) = state.device_mut(first) {
                        device.primary = true;
                    }
                }
            }

            info!("Applied topology {:?}", topology);
            Ok(())
        })
    }

    fn get_current_display_modes(&self, device_ids: &BTreeSet<String>) -> DeviceDisplayModeMap {
        let state = self.lock_state();
        let mut modes = DeviceDisplayModeMap::new();
        for id in device_ids {
            match state.device(id) {
                Some(device) if state.is_active(id) => {
                    modes.insert(id.clone(), device.current_mode);
                }
                _ => {
                    warn!("Cannot read display mode of inactive device '{}'", id);
                    return DeviceDisplayModeMap::new();
                }
            }
        }
        modes
    }

    fn set_display_modes(
        &self,
        modes: &DeviceDisplayModeMap,
        strictness: ModeStrictness,
    ) -> Result<()> {
        self.mutate(|state| {
            for (id, requested) in modes {
                if !state.is_active(id) {
                    bail!("Cannot set display mode for inactive device '{}'", id);
                }
                let device = state
                    .device_mut(id)
                    .ok_or_else(|| anyhow::anyhow!("Unknown device '{}'", id))?;
                device.current_mode = resolve_mode(device, requested, strictness)?;
            }
            Ok(())
        })
    }

    fn is_primary(&self, device_id: &str) -> bool {
        let state = self.lock_state();
        state.is_active(device_id) && state.device(device_id).is_some_and(|d| d.primary)
    }

    fn set_as_primary(&self, device_id: &str) -> Result<()> {
        self.mutate(|state| {
            if !state.is_active(device_id) {
                bail!("Cannot make inactive device '{}' primary", device_id);
            }
            for device in &mut state.devices {
                device.primary = device.device_id == device_id;
            }
            Ok(())
        })
    }

    fn get_current_hdr_states(&self, device_ids: &BTreeSet<String>) -> HdrStateMap {
        let state = self.lock_state();
        let mut states = HdrStateMap::new();
        for id in device_ids {
            match state.device(id) {
                Some(device) if state.is_active(id) => {
                    states.insert(id.clone(), device.hdr_state);
                }
                _ => {
                    warn!("Cannot read HDR state of inactive device '{}'", id);
                    return HdrStateMap::new();
                }
            }
        }
        states
    }

    fn set_hdr_states(&self, states: &HdrStateMap) -> Result<()> {
        self.mutate(|state| {
            for (id, requested) in states {
                let Some(requested) = requested else {
                    continue;
                };
                if !state.is_active(id) {
                    bail!("Cannot set HDR state for inactive device '{}'", id);
                }
                let device = state
                    .device_mut(id)
                    .ok_or_else(|| anyhow::anyhow!("Unknown device '{}'", id))?;
                if device.hdr_state.is_none() {
                    bail!("Device '{}' does not support HDR", id);
                }
                device.hdr_state = Some(*requested);
            }
            Ok(())
        })
    }
}

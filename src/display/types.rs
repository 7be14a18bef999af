use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Groups of device ids that are currently active.
///
/// A group with a single device is an extended output, a group with more
/// devices is a duplicated (mirrored) set.
pub type ActiveTopology = Vec<Vec<String>>;

pub type DeviceDisplayModeMap = BTreeMap<String, DisplayMode>;

/// `None` marks a device that does not support HDR.
pub type HdrStateMap = BTreeMap<String, Option<HdrState>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub fn as_f64(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        f64::from(self.numerator) / f64::from(self.denominator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayMode {
    pub resolution: Resolution,
    pub refresh_rate: Rational,
}

impl DisplayMode {
    pub fn new(width: u32, height: u32, numerator: u32, denominator: u32) -> Self {
        Self {
            resolution: Resolution { width, height },
            refresh_rate: Rational {
                numerator,
                denominator,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HdrState {
    Disabled,
    Enabled,
}

/// How `set_display_modes` treats a mode the device does not list exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeStrictness {
    /// Fall back to the closest mode the device supports
    #[default]
    BestEffort,
    /// Fail unless the exact mode is supported
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumeratedDeviceInfo {
    pub resolution: Resolution,
    pub resolution_scale: f64,
    pub refresh_rate: Rational,
    pub primary: bool,
    pub origin_point: Point,
    pub hdr_state: Option<HdrState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumeratedDevice {
    pub device_id: String,
    pub display_name: String,
    pub friendly_name: String,
    /// Only present for devices that are part of the active topology
    pub info: Option<EnumeratedDeviceInfo>,
}

pub type EnumeratedDeviceList = Vec<EnumeratedDevice>;

/// Topology and primary devices from before the caller reconfigured anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialState {
    pub topology: ActiveTopology,
    pub primary_devices: BTreeSet<String>,
}

/// A full point-in-time description of the display configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedState {
    pub topology: ActiveTopology,
    pub original_modes: DeviceDisplayModeMap,
    pub original_hdr_states: HdrStateMap,
    pub original_primary_device: String,
}

/// Before/after pair bracketing a temporary reconfiguration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleDisplayConfigState {
    pub initial: InitialState,
    pub modified: ModifiedState,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.2}Hz", self.resolution, self.refresh_rate.as_f64())
    }
}

impl fmt::Display for HdrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdrState::Disabled => write!(f, "HDR off"),
            HdrState::Enabled => write!(f, "HDR on"),
        }
    }
}

impl fmt::Display for EnumeratedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.friendly_name.is_empty() {
            &self.display_name
        } else {
            &self.friendly_name
        };
        write!(f, "{} [{}]", name, self.device_id)?;
        match &self.info {
            Some(info) => write!(
                f,
                ": {} @ {:.2}Hz{}{}",
                info.resolution,
                info.refresh_rate.as_f64(),
                if info.primary { ", Primary" } else { "" },
                match info.hdr_state {
                    Some(state) => format!(", {}", state),
                    None => String::new(),
                }
            ),
            None => write!(f, ": Inactive"),
        }
    }
}

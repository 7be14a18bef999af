pub mod topology;
pub mod types;

pub use topology::{flatten_topology, is_topology_the_same, is_topology_valid};
pub use types::{
    ActiveTopology, DeviceDisplayModeMap, DisplayMode, EnumeratedDevice, EnumeratedDeviceInfo,
    EnumeratedDeviceList, HdrState, HdrStateMap, InitialState, ModeStrictness, ModifiedState,
    Point, Rational, Resolution, SingleDisplayConfigState,
};

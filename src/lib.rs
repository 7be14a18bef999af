pub mod codec;
pub mod config;
pub mod display;
pub mod logging;
pub mod persistence;
pub mod settings;
pub mod system;

pub use config::{Config, Workarounds};
pub use display::{
    ActiveTopology, DeviceDisplayModeMap, DisplayMode, EnumeratedDevice, HdrState, HdrStateMap,
    InitialState, ModeStrictness, ModifiedState, SingleDisplayConfigState,
};
pub use persistence::FilePersistentState;
pub use settings::{RevertError, RevertResult, SettingsManager};

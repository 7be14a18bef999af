pub mod manager;
pub mod result;
pub mod scope;
pub mod utils;

pub use manager::SettingsManager;
pub use result::{RevertError, RevertResult};
pub use scope::ScopeExit;
pub use utils::{blank_hdr_states, get_primary_device};

use thiserror::Error;

/// Why restoring a display snapshot stopped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertError {
    #[error("Display API is temporarily unavailable")]
    ApiTemporarilyUnavailable,

    #[error("Topology is invalid")]
    TopologyIsInvalid,

    #[error("Failed to switch topology")]
    SwitchingTopologyFailed,

    #[error("Failed to revert HDR states")]
    RevertingHdrStatesFailed,

    #[error("Failed to revert display modes")]
    RevertingDisplayModesFailed,

    #[error("Failed to revert primary device")]
    RevertingPrimaryDeviceFailed,

    /// Also returned when a restore payload cannot be decoded
    #[error("Failed to save or load persistent state")]
    PersistenceSaveFailed,
}

impl RevertError {
    /// Returns true if repeating the same call later may succeed without any change.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ApiTemporarilyUnavailable)
    }
}

pub type RevertResult = std::result::Result<(), RevertError>;

use std::time::Duration;
use tracing::{debug, error, info};

use crate::codec;
use crate::display::{ActiveTopology, HdrState, HdrStateMap, flatten_topology};
use crate::system::DisplayDeviceInterface;

/// Get the primary device within the topology, or an empty string if none of them is primary.
pub fn get_primary_device<D: DisplayDeviceInterface + ?Sized>(
    dd_api: &D,
    topology: &ActiveTopology,
) -> String {
    flatten_topology(topology)
        .into_iter()
        .find(|device_id| dd_api.is_primary(device_id))
        .unwrap_or_default()
}

/// Toggle HDR off and back on for every device that currently has it enabled.
///
/// Some HDR panels keep showing washed-out colors after a topology or mode
/// change until HDR is cycled. Nothing happens when no delay is configured.
/// Failures are only logged.
pub fn blank_hdr_states<D: DisplayDeviceInterface + ?Sized>(
    dd_api: &D,
    delay: Option<Duration>,
) {
    let Some(delay) = delay else {
        return;
    };

    let topology = dd_api.get_current_topology();
    if !dd_api.is_topology_valid(&topology) {
        error!("Cannot blank HDR states, current topology is invalid");
        return;
    }

    let current_states = dd_api.get_current_hdr_states(&flatten_topology(&topology));
    let enabled: Vec<&String> = current_states
        .iter()
        .filter(|(_, state)| **state == Some(HdrState::Enabled))
        .map(|(device_id, _)| device_id)
        .collect();
    if enabled.is_empty() {
        debug!("No HDR enabled devices to blank");
        return;
    }

    let with_state = |state: HdrState| -> HdrStateMap {
        enabled
            .iter()
            .map(|device_id| ((*device_id).clone(), Some(state)))
            .collect()
    };

    info!(
        "Applying HDR blanking workaround (delay {}ms) for: {}",
        delay.as_millis(),
        codec::to_log_string(&enabled)
    );

    if let Err(e) = dd_api.set_hdr_states(&with_state(HdrState::Disabled)) {
        error!("Failed to disable HDR states for blanking: {:#}", e);
        return;
    }

    std::thread::sleep(delay);

    if let Err(e) = dd_api.set_hdr_states(&with_state(HdrState::Enabled)) {
        error!("Failed to re-enable HDR states after blanking: {:#}", e);
    }
}

use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use super::types::ActiveTopology;

/// Maximum number of devices that can be duplicated within one group.
pub const MAX_DUPLICATED_DEVICES: usize = 2;

/// Collect every device id referenced by the topology
pub fn flatten_topology(topology: &ActiveTopology) -> BTreeSet<String> {
    topology.iter().flatten().cloned().collect()
}

/// Structural validity check shared by the shipped display backends.
pub fn is_topology_valid(topology: &ActiveTopology) -> bool {
    if topology.is_empty() {
        debug!("Topology input is empty!");
        return false;
    }

    let mut seen = HashSet::new();
    for group in topology {
        if group.is_empty() || group.len() > MAX_DUPLICATED_DEVICES {
            debug!(
                "Topology group has invalid size {} (max {})",
                group.len(),
                MAX_DUPLICATED_DEVICES
            );
            return false;
        }

        for device_id in group {
            if !seen.insert(device_id.as_str()) {
                debug!("Device '{}' appears more than once in topology", device_id);
                return false;
            }
        }
    }

    true
}

/// Order-insensitive comparison: group order and order within a group do not matter.
pub fn is_topology_the_same(lhs: &ActiveTopology, rhs: &ActiveTopology) -> bool {
    normalize(lhs) == normalize(rhs)
}

fn normalize(topology: &ActiveTopology) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = topology
        .iter()
        .map(|group| {
            let mut sorted = group.clone();
            sorted.sort();
            sorted
        })
        .collect();
    groups.sort();
    groups
}

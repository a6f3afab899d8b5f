use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::{
    Component, Error, FlatMemberships, HostVars, Inventory, MembershipEntry, Memberships, Result,
    flatten,
    inventory::{COMPONENT_VAR, UNGROUPED_GROUP, label_group, partition_group},
};

pub const DEFAULT_NID_LENGTH: usize = 6;

/// Host name prefix; the zero-padded NID follows it.
pub const HOST_NAME_PREFIX: &str = "nid";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Minimum number of NID digits in host names.
    pub nid_length: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            nid_length: DEFAULT_NID_LENGTH,
        }
    }
}

impl BuildOptions {
    pub fn with_nid_length(nid_length: usize) -> Self {
        Self { nid_length }
    }
}

/// `nid` followed by the NID, zero-padded to at least `width` digits.
pub fn host_name(nid: u64, width: usize) -> String {
    format!("{HOST_NAME_PREFIX}{nid:0width$}")
}

/// Flattens `memberships` and builds the inventory in one step.
pub fn build(
    components: &[Component],
    memberships: &Memberships,
    options: &BuildOptions,
) -> Result<Inventory> {
    let flat = flatten(memberships)?;
    build_inventory(components, &flat, options)
}

/// Builds the grouped inventory from fetched components and flattened memberships.
///
/// Either every component becomes a host or the build fails; no partial
/// inventory is returned.
pub fn build_inventory(
    components: &[Component],
    memberships: &FlatMemberships,
    options: &BuildOptions,
) -> Result<Inventory> {
    let unassigned = MembershipEntry::default();
    let mut inventory = Inventory::new();
    let mut owners: HashMap<String, &str> = HashMap::with_capacity(components.len());

    for component in components {
        let id = component.id()?;
        let host = host_name(component.nid()?, options.nid_length);
        if let Some(first) = owners.insert(host.clone(), id) {
            return Err(Error::HostNameCollision {
                host,
                first: first.to_string(),
                second: id.to_string(),
            });
        }

        let membership = memberships.get(id).unwrap_or(&unassigned);
        if membership.is_unassigned() {
            inventory.add_to_group(UNGROUPED_GROUP.to_string(), &host);
        } else {
            if let Some(partition) = membership.partition() {
                inventory.add_to_group(partition_group(partition), &host);
            }
            for label in &membership.group_labels {
                inventory.add_to_group(label_group(label), &host);
            }
        }

        let mut vars = HostVars::new();
        vars.insert(
            COMPONENT_VAR.to_string(),
            merged_record(component, id, membership),
        );
        inventory.add_host(&host, vars);
    }

    debug!(
        hosts = inventory.host_count(),
        groups = inventory.groups().len(),
        "built inventory"
    );
    Ok(inventory)
}

/// The raw component record plus `partitionName`, `groupLabels` and a lower-case `id`.
fn merged_record(component: &Component, id: &str, membership: &MembershipEntry) -> Value {
    let mut record = component.fields().clone();
    record.insert(
        "partitionName".to_string(),
        Value::String(membership.partition_name.clone()),
    );
    record.insert(
        "groupLabels".to_string(),
        Value::Array(
            membership
                .group_labels
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    record.insert("id".to_string(), Value::String(id.to_string()));
    Value::Object(record)
}

//! Turns smd component and membership records into a grouped node inventory.
//!
//! Nothing in this crate talks to the network: callers hand in the fetched
//! [`Component`]s and [`Memberships`] and get back an [`Inventory`].

mod builder;
mod component;
mod error;
mod filter;
mod inventory;
mod membership;

pub use builder::{
    BuildOptions, DEFAULT_NID_LENGTH, HOST_NAME_PREFIX, build, build_inventory, host_name,
};
pub use component::{COMPONENTS_SOURCE, Component, ID_FIELD, NID_FIELD, parse_components};
pub use error::{Error, ErrorKind, Result};
pub use filter::{FilterSpec, FilterValue};
pub use inventory::{
    ALL_GROUP, COMPONENT_VAR, GROUP_GROUP_PREFIX, HostVars, Inventory, PARTITION_GROUP_PREFIX,
    UNGROUPED_GROUP, label_group, partition_group,
};
pub use membership::{
    FlatMemberships, GROUPS_SOURCE, Group, MembershipEntry, Members, Memberships,
    PARTITIONS_SOURCE, Partition, flatten, parse_groups, parse_partitions,
};

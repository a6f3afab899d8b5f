use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

pub const PARTITIONS_SOURCE: &str = "smd partitions";
pub const GROUPS_SOURCE: &str = "smd groups";

/// Member identifiers of a partition or group.
///
/// smd nests them as `{"ids": [...]}`; a bare list is accepted as well.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MembersRepr")]
pub struct Members {
    pub ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MembersRepr {
    Flat(Vec<String>),
    Nested {
        #[serde(default)]
        ids: Option<Vec<String>>,
    },
}

impl From<MembersRepr> for Members {
    fn from(repr: MembersRepr) -> Self {
        let ids = match repr {
            MembersRepr::Flat(ids) => ids,
            MembersRepr::Nested { ids } => ids.unwrap_or_default(),
        };
        Self { ids }
    }
}

impl<S: Into<String>> FromIterator<S> for Members {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Members,
}

impl Partition {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            members: members.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub members: Members,
}

impl Group {
    pub fn new<I, S>(label: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: Some(label.into()),
            members: members.into_iter().collect(),
        }
    }
}

/// Everything smd knows about partition and group membership.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memberships {
    pub partitions: Vec<Partition>,
    pub groups: Vec<Group>,
}

impl Memberships {
    pub fn new(partitions: Vec<Partition>, groups: Vec<Group>) -> Self {
        Self { partitions, groups }
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty() && self.groups.is_empty()
    }
}

/// Membership of one component, as merged into its host variables.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipEntry {
    /// Empty when the component is in no partition.
    pub partition_name: String,
    pub group_labels: Vec<String>,
}

impl MembershipEntry {
    pub fn partition(&self) -> Option<&str> {
        (!self.partition_name.is_empty()).then_some(self.partition_name.as_str())
    }

    pub fn is_unassigned(&self) -> bool {
        self.partition_name.is_empty() && self.group_labels.is_empty()
    }
}

pub type FlatMemberships = HashMap<String, MembershipEntry>;

/// Parses the body of `GET /hsm/v2/partitions`.
pub fn parse_partitions(body: &str) -> Result<Vec<Partition>> {
    serde_json::from_str(body).map_err(|err| Error::malformed(PARTITIONS_SOURCE, err.to_string()))
}

/// Parses the body of `GET /hsm/v2/groups`.
pub fn parse_groups(body: &str) -> Result<Vec<Group>> {
    serde_json::from_str(body).map_err(|err| Error::malformed(GROUPS_SOURCE, err.to_string()))
}

/// Inverts partition and group member lists into a per-component lookup.
///
/// A component listed in several partitions keeps the last one seen.
pub fn flatten(memberships: &Memberships) -> Result<FlatMemberships> {
    let mut flat = FlatMemberships::new();

    for (idx, partition) in memberships.partitions.iter().enumerate() {
        let name = required_name(partition.name.as_deref(), PARTITIONS_SOURCE, "name", idx)?;
        for id in &partition.members.ids {
            let entry = flat.entry(id.clone()).or_default();
            if !entry.partition_name.is_empty() && entry.partition_name != name {
                warn!(
                    component = %id,
                    previous = %entry.partition_name,
                    partition = %name,
                    "component listed in more than one partition; keeping the last"
                );
            }
            entry.partition_name = name.to_string();
        }
    }

    for (idx, group) in memberships.groups.iter().enumerate() {
        let label = required_name(group.label.as_deref(), GROUPS_SOURCE, "label", idx)?;
        for id in &group.members.ids {
            flat.entry(id.clone())
                .or_default()
                .group_labels
                .push(label.to_string());
        }
    }

    Ok(flat)
}

fn required_name<'a>(
    value: Option<&'a str>,
    source_name: &str,
    field: &str,
    idx: usize,
) -> Result<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::malformed(
            source_name,
            format!("entry #{idx} has no `{field}`"),
        )),
    }
}

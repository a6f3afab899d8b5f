use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value, json};

pub const ALL_GROUP: &str = "all";
pub const UNGROUPED_GROUP: &str = "ungrouped";
pub const PARTITION_GROUP_PREFIX: &str = "prt_";
pub const GROUP_GROUP_PREFIX: &str = "grp_";
/// The single host variable carrying the merged smd record.
pub const COMPONENT_VAR: &str = "smd_component";

pub type HostVars = Map<String, Value>;

pub fn partition_group(name: &str) -> String {
    format!("{PARTITION_GROUP_PREFIX}{name}")
}

pub fn label_group(label: &str) -> String {
    format!("{GROUP_GROUP_PREFIX}{label}")
}

/// Grouped hosts plus per-host variables.
///
/// Group contents are ordered sets so that equal inputs give equal output
/// regardless of the order components were processed in.
#[derive(Clone, Debug, PartialEq)]
pub struct Inventory {
    groups: BTreeMap<String, BTreeSet<String>>,
    hostvars: BTreeMap<String, HostVars>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(UNGROUPED_GROUP.to_string(), BTreeSet::new());
        Self {
            groups,
            hostvars: BTreeMap::new(),
        }
    }

    pub(crate) fn add_host(&mut self, host: &str, vars: HostVars) {
        self.hostvars.insert(host.to_string(), vars);
    }

    pub(crate) fn add_to_group(&mut self, group: String, host: &str) {
        self.groups.entry(group).or_default().insert(host.to_string());
    }

    pub fn contains_host(&self, host: &str) -> bool {
        self.hostvars.contains_key(host)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hostvars.keys().map(String::as_str)
    }

    pub fn host_count(&self) -> usize {
        self.hostvars.len()
    }

    pub fn groups(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(name)
    }

    /// Names of the groups `host` is a direct member of.
    pub fn groups_of(&self, host: &str) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|(_, hosts)| hosts.contains(host))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn host_vars(&self, host: &str) -> Option<&HostVars> {
        self.hostvars.get(host)
    }

    /// The `smd_component` variable of `host`.
    pub fn component(&self, host: &str) -> Option<&Map<String, Value>> {
        self.hostvars
            .get(host)
            .and_then(|vars| vars.get(COMPONENT_VAR))
            .and_then(Value::as_object)
    }

    /// Renders the dynamic inventory document printed for `--list`.
    pub fn to_list_json(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(
            "_meta".to_string(),
            json!({ "hostvars": self.hostvars }),
        );
        let children: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        doc.insert(ALL_GROUP.to_string(), json!({ "children": children }));
        for (name, hosts) in &self.groups {
            doc.insert(name.clone(), json!({ "hosts": hosts }));
        }
        Value::Object(doc)
    }

    /// Renders the document printed for `--host`; unknown hosts get `{}`.
    pub fn to_host_json(&self, host: &str) -> Value {
        self.hostvars
            .get(host)
            .cloned()
            .map_or_else(|| Value::Object(Map::new()), Value::Object)
    }
}

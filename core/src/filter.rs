use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Value of one filter key: a single value or several, sent as repeated keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    pub fn values(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }

    /// Appends `value`, turning a single value into a list.
    pub fn push(&mut self, value: String) {
        match self {
            Self::One(first) => {
                let first = std::mem::take(first);
                *self = Self::Many(vec![first, value]);
            }
            Self::Many(values) => values.push(value),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// Query filter for the components endpoint, e.g. `type=Node&role=Compute`.
///
/// Keys serialize in sorted order. An empty filter adds no query string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(BTreeMap<String, FilterValue>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ready compute nodes, the usual target of node automation.
    pub fn compute_nodes() -> Self {
        [("type", "Node"), ("role", "Compute"), ("state", "Ready")]
            .into_iter()
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Every key/value pair, with multi-value keys repeated.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(key, value)| {
            value
                .values()
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in &self.0 {
            if key.trim().is_empty() {
                return Err(Error::configuration("filter keys cannot be empty"));
            }
            if value.values().is_empty() {
                return Err(Error::configuration(format!(
                    "filter `{key}` has an empty list of values"
                )));
            }
        }
        Ok(())
    }

    /// Replaces the query of `url` with this filter.
    pub fn apply_to(&self, url: &mut Url) {
        url.set_query(None);
        if self.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.pairs());
    }
}

impl<K, V> FromIterator<(K, V)> for FilterSpec
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

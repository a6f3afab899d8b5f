use std::{collections::BTreeMap, ffi::OsString};

use smd_core::{FilterSpec, FilterValue};
use tracing::debug;
use url::Url;

use crate::{ConfigError, InventoryConfig, Result};

pub const ENV_PREFIX: &str = "SMD_INVENTORY_";
/// Names the config file; not itself a config key.
pub const CONFIG_PATH_ENV: &str = "SMD_INVENTORY_CONFIG";

const FILTER_BY: &str = "filter_by";

pub fn env_var_to_path(var: &str) -> Result<String> {
    let rest = var
        .strip_prefix(ENV_PREFIX)
        .ok_or_else(|| ConfigError::env(format!("{var} is not an {ENV_PREFIX}* variable")))?;
    if rest.is_empty() {
        return Err(ConfigError::env(format!(
            "invalid env var {var:?}: missing path suffix"
        )));
    }

    let segs = rest
        .split("__")
        .map(|s| s.to_ascii_lowercase())
        .collect::<Vec<_>>();
    Ok(segs.join("."))
}

/// Keeps the `SMD_INVENTORY_*` variables that carry config values.
///
/// Variables outside the prefix are skipped without being decoded; a prefixed
/// variable that is not valid UTF-8 is an error.
pub fn collect_env<I>(vars: I) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut collected = BTreeMap::new();
    for (key, value) in vars {
        if !key.as_encoded_bytes().starts_with(ENV_PREFIX.as_bytes()) {
            continue;
        }
        let key = key.into_string().map_err(|key| {
            ConfigError::env(format!("{key:?} is not a valid UTF-8 variable name"))
        })?;
        if key == CONFIG_PATH_ENV {
            continue;
        }
        let value = value
            .into_string()
            .map_err(|_| ConfigError::env(format!("{key} is not valid UTF-8")))?;
        collected.insert(key, value);
    }
    Ok(collected)
}

impl InventoryConfig {
    /// Overlays `SMD_INVENTORY_*` variables onto this config.
    ///
    /// Empty values are skipped, except under `filter_by`, where an empty
    /// value removes the filter key.
    pub fn apply_env(&mut self, env: &BTreeMap<String, String>) -> Result<()> {
        for (var, raw) in env {
            if var == CONFIG_PATH_ENV {
                continue;
            }
            let path = env_var_to_path(var)?;
            let segs: Vec<&str> = path.split('.').collect();
            debug!(%var, %path, "applying config override from environment");

            match segs.as_slice() {
                [FILTER_BY, key] => {
                    if raw.is_empty() {
                        self.filter_by.remove(key);
                    } else {
                        self.filter_by.insert(*key, parse_filter_value(raw));
                    }
                }
                ["smd_server" | "access_token_envvar" | "nid_length" | FILTER_BY]
                    if raw.is_empty() => {}
                ["smd_server"] => {
                    self.smd_server = Url::parse(raw).map_err(|err| {
                        ConfigError::env(format!("{var}: invalid URL {raw:?}: {err}"))
                    })?;
                }
                ["access_token_envvar"] => self.access_token_envvar = raw.clone(),
                ["nid_length"] => {
                    self.nid_length = raw.trim().parse().map_err(|err| {
                        ConfigError::env(format!("{var}: invalid width {raw:?}: {err}"))
                    })?;
                }
                [FILTER_BY] => {
                    self.filter_by = serde_json::from_str::<FilterSpec>(raw).map_err(|err| {
                        ConfigError::env(format!(
                            "{var}: expected a JSON object of filter values: {err}"
                        ))
                    })?;
                }
                _ => {
                    return Err(ConfigError::env(format!(
                        "{var} does not correspond to a config key"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A JSON array of strings becomes a multi-value filter; anything else is taken verbatim.
fn parse_filter_value(raw: &str) -> FilterValue {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(values) => FilterValue::Many(values),
        Err(_) => FilterValue::One(raw.to_string()),
    }
}

//! Configuration for the smd dynamic inventory.
//!
//! Values are layered: built-in defaults, then a config file, then
//! `SMD_INVENTORY_*` environment variables. Command-line flags are applied on
//! top by the executable.

mod env;
mod error;
mod file;

use serde::{Deserialize, Serialize};
use smd_core::{BuildOptions, DEFAULT_NID_LENGTH, FilterSpec};
use url::Url;

pub use env::{CONFIG_PATH_ENV, ENV_PREFIX, collect_env, env_var_to_path};
pub use error::{ConfigError, Result};
pub use file::{ConfigFormat, verify_file};

pub const PLUGIN_NAME: &str = "smd_inventory";
pub const DEFAULT_SMD_SERVER: &str = "http://localhost:27779";
pub const DEFAULT_ACCESS_TOKEN_ENVVAR: &str = "ACCESS_TOKEN";
/// `u64::MAX` has 20 digits; wider padding is always a typo.
pub const MAX_NID_LENGTH: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Must name this inventory source when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(default = "default_smd_server")]
    pub smd_server: Url,
    #[serde(default = "FilterSpec::compute_nodes")]
    pub filter_by: FilterSpec,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_access_token_envvar")]
    pub access_token_envvar: String,
    #[serde(default = "default_nid_length")]
    pub nid_length: usize,
}

fn default_smd_server() -> Url {
    Url::parse(DEFAULT_SMD_SERVER).expect("default smd server URL is valid")
}

fn default_access_token_envvar() -> String {
    DEFAULT_ACCESS_TOKEN_ENVVAR.to_string()
}

fn default_nid_length() -> usize {
    DEFAULT_NID_LENGTH
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            plugin: None,
            smd_server: default_smd_server(),
            filter_by: FilterSpec::compute_nodes(),
            access_token_envvar: default_access_token_envvar(),
            nid_length: default_nid_length(),
        }
    }
}

impl InventoryConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(plugin) = &self.plugin
            && plugin != PLUGIN_NAME
        {
            return Err(ConfigError::validation(format!(
                "`plugin` must be `{PLUGIN_NAME}`, got `{plugin}`"
            )));
        }

        if !matches!(self.smd_server.scheme(), "http" | "https")
            || self.smd_server.host_str().is_none()
        {
            return Err(ConfigError::validation(format!(
                "`smd_server` must be an http or https URL with a host, got `{}`",
                self.smd_server
            )));
        }

        self.filter_by.validate().map_err(|err| match err {
            smd_core::Error::Configuration(message) => ConfigError::validation(message),
            other => ConfigError::validation(other.to_string()),
        })?;

        let var = self.access_token_envvar.as_str();
        if var.is_empty() || var.contains(['=', '\0']) {
            return Err(ConfigError::validation(format!(
                "`access_token_envvar` must be a non-empty variable name, got {var:?}"
            )));
        }

        if !(1..=MAX_NID_LENGTH).contains(&self.nid_length) {
            return Err(ConfigError::validation(format!(
                "`nid_length` must be between 1 and {MAX_NID_LENGTH}, got {}",
                self.nid_length
            )));
        }

        Ok(())
    }

    /// Reads the bearer token through `lookup` (normally `std::env::var`).
    ///
    /// A missing or blank variable means requests go out unauthenticated.
    pub fn access_token<F>(&self, lookup: F) -> Option<String>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        lookup(&self.access_token_envvar)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions::with_nid_length(self.nid_length)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use smd_core::FilterValue;

    use super::*;

    #[test]
    fn defaults_target_local_ready_compute_nodes() {
        let config = InventoryConfig::default();
        assert_eq!(config.smd_server.as_str(), "http://localhost:27779/");
        assert_eq!(config.filter_by, FilterSpec::compute_nodes());
        assert_eq!(config.access_token_envvar, "ACCESS_TOKEN");
        assert_eq!(config.build_options().nid_length, DEFAULT_NID_LENGTH);
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn token_comes_from_the_named_variable() {
        let env = HashMap::from([
            ("ACCESS_TOKEN".to_string(), " abc \n".to_string()),
            ("OTHER_TOKEN".to_string(), "xyz".to_string()),
        ]);
        let lookup = |name: &str| env.get(name).cloned();

        let mut config = InventoryConfig::default();
        assert_eq!(config.access_token(lookup), Some("abc".to_string()));

        config.access_token_envvar = "OTHER_TOKEN".to_string();
        assert_eq!(config.access_token(lookup), Some("xyz".to_string()));

        config.access_token_envvar = "UNSET_TOKEN".to_string();
        assert_eq!(config.access_token(lookup), None);
    }

    #[test]
    fn blank_token_is_treated_as_absent() {
        let config = InventoryConfig::default();
        assert_eq!(config.access_token(|_| Some("   ".to_string())), None);
    }

    fn rejected(mutate: impl FnOnce(&mut InventoryConfig)) -> ConfigError {
        let mut config = InventoryConfig::default();
        mutate(&mut config);
        let err = config.validate().expect_err("config should be rejected");
        assert!(matches!(err, ConfigError::Validation(_)), "{err:?}");
        err
    }

    #[test]
    fn validate_rejects_bad_values() {
        let err = rejected(|c| c.plugin = Some("other_plugin".to_string()));
        assert!(err.message().contains("`plugin`"), "{err}");

        let err = rejected(|c| c.smd_server = Url::parse("file:///tmp/smd").unwrap());
        assert!(err.message().contains("`smd_server`"), "{err}");

        let err = rejected(|c| c.filter_by.insert("role", FilterValue::Many(Vec::new())));
        assert!(err.message().contains("empty list"), "{err}");

        let err = rejected(|c| c.access_token_envvar = "A=B".to_string());
        assert!(err.message().contains("`access_token_envvar`"), "{err}");

        let err = rejected(|c| c.nid_length = 0);
        assert!(err.message().contains("`nid_length`"), "{err}");
        rejected(|c| c.nid_length = MAX_NID_LENGTH + 1);
    }

    #[test]
    fn matching_plugin_name_is_accepted() {
        let config = InventoryConfig {
            plugin: Some(PLUGIN_NAME.to_string()),
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn config_errors_convert_to_configuration_errors() {
        let err: smd_core::Error = ConfigError::validation("bad width").into();
        assert_eq!(err.kind(), smd_core::ErrorKind::Configuration);
        assert_eq!(err.to_string(), "invalid configuration: bad width");
    }
}

use std::{fs, path::Path};

use tracing::debug;

use crate::{ConfigError, InventoryConfig, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json5,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yml" | "yaml") => Ok(Self::Yaml),
            Some("json" | "json5") => Ok(Self::Json5),
            _ => Err(ConfigError::validation(format!(
                "config file `{}` must end in .yml, .yaml, .json or .json5",
                path.display()
            ))),
        }
    }
}

/// Checks that `path` is a file this inventory source can read.
pub fn verify_file(path: &Path) -> Result<ConfigFormat> {
    let format = ConfigFormat::from_path(path)?;
    if !path.is_file() {
        return Err(ConfigError::io(format!(
            "config file `{}` does not exist or is not a file",
            path.display()
        )));
    }
    Ok(format)
}

impl InventoryConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let format = verify_file(path)?;
        let raw = fs::read_to_string(path).map_err(|err| {
            ConfigError::io(format!("failed to read `{}`: {err}", path.display()))
        })?;
        debug!(path = %path.display(), ?format, "loading config file");
        Self::parse(&raw, format)
            .map_err(|err| ConfigError::parse(format!("{}: {}", path.display(), err.message())))
    }

    /// Parses a config document; an empty document yields the defaults.
    pub fn parse(raw: &str, format: ConfigFormat) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        match format {
            ConfigFormat::Yaml => {
                serde_yml::from_str(raw).map_err(|err| ConfigError::parse(err.to_string()))
            }
            ConfigFormat::Json5 => {
                json5::from_str(raw).map_err(|err| ConfigError::parse(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use smd_core::{FilterSpec, FilterValue};
    use tempfile::NamedTempFile;

    use super::*;

    fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("smd-inventory-")
            .suffix(suffix)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_yaml_plugin_config() {
        let file = config_file(
            ".yml",
            "plugin: smd_inventory\n\
             smd_server: https://smd.example.com:27779\n\
             filter_by:\n  type: Node\n  role: [Compute, Application]\n\
             nid_length: 4\n\
             keyed_groups: ignored\n",
        );

        let config = InventoryConfig::from_path(file.path()).expect("config should load");
        config.validate().unwrap();

        assert_eq!(config.plugin.as_deref(), Some("smd_inventory"));
        assert_eq!(config.smd_server.host_str(), Some("smd.example.com"));
        assert_eq!(config.filter_by.len(), 2);
        assert_eq!(
            config.filter_by.get("role"),
            Some(&FilterValue::Many(vec![
                "Compute".to_string(),
                "Application".to_string()
            ]))
        );
        assert_eq!(config.nid_length, 4);
        assert_eq!(config.access_token_envvar, "ACCESS_TOKEN");
    }

    #[test]
    fn loads_json5_config() {
        let file = config_file(
            ".json5",
            "{ smd_server: 'http://10.0.0.5:27779', filter_by: {}, // all components\n }",
        );

        let config = InventoryConfig::from_path(file.path()).unwrap();
        assert_eq!(config.smd_server.as_str(), "http://10.0.0.5:27779/");
        assert!(config.filter_by.is_empty());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = config_file(".yaml", "\n");
        let config = InventoryConfig::from_path(file.path()).unwrap();
        assert_eq!(config, InventoryConfig::default());
        assert_eq!(config.filter_by, FilterSpec::compute_nodes());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let file = config_file(".ini", "smd_server = x");
        let err = InventoryConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "{err:?}");
        assert!(err.message().contains(".yml"), "{err}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = verify_file(Path::new("/nonexistent/smd_inventory.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)), "{err:?}");
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let file = config_file(".yml", "nid_length: [oops\n");
        let err = InventoryConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");
        assert!(
            err.message()
                .contains(&file.path().display().to_string()),
            "{err}"
        );
    }

    #[test]
    fn format_follows_extension_case_insensitively() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("inv.YAML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("inv.json")).unwrap(),
            ConfigFormat::Json5
        );
        assert!(ConfigFormat::from_path(Path::new("inventory")).is_err());
    }
}

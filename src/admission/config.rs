// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! AdmissionConfiguration lists the enabled admission plugins and their configuration.
//!
//! ```yaml
//! apiVersion: apiserver.config.k8s.io/v1
//! kind: AdmissionConfiguration
//! plugins:
//! - name: AddDefaultFields
//! - name: DenyByName
//!   configuration:
//!     name: forbidden
//! - name: Custom
//!   path: custom.yaml
//! ```
//!
//! Plugins run in the order they are listed.

use super::errors::{AdmissionError, AdmissionResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionConfiguration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub plugins: Vec<AdmissionPluginConfiguration>,
}

/// AdmissionPluginConfiguration enables one plugin.
///
/// At most one of `path` and `configuration` may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionPluginConfiguration {
    pub name: String,
    /// File holding the plugin's configuration, relative to the configuration file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Inline plugin configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_yaml::Value>,
}

impl AdmissionConfiguration {
    /// Parse and validate a configuration document.
    pub fn from_yaml(document: &str) -> AdmissionResult<Self> {
        let config: Self = serde_yaml::from_str(document).map_err(|err| {
            AdmissionError::bad_request(format!("invalid admission configuration: {}", err))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader(mut reader: impl Read) -> AdmissionResult<Self> {
        let mut document = String::new();
        reader.read_to_string(&mut document).map_err(|err| {
            AdmissionError::bad_request(format!("failed to read admission configuration: {}", err))
        })?;
        Self::from_yaml(&document)
    }

    /// Names of the enabled plugins, in order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn validate(&self) -> AdmissionResult<()> {
        let mut seen = HashSet::new();
        for plugin in &self.plugins {
            if plugin.name.is_empty() {
                return Err(AdmissionError::bad_request(
                    "admission configuration contains a plugin without a name",
                ));
            }
            if !seen.insert(plugin.name.as_str()) {
                return Err(AdmissionError::bad_request(format!(
                    "admission plugin {:?} is listed more than once",
                    plugin.name
                )));
            }
            if plugin.path.is_some() && plugin.configuration.is_some() {
                return Err(AdmissionError::bad_request(format!(
                    "admission plugin {:?} sets both path and configuration",
                    plugin.name
                )));
            }
        }
        Ok(())
    }
}

impl AdmissionPluginConfiguration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_configuration(mut self, configuration: serde_yaml::Value) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Returns the raw configuration handed to the plugin's factory, if any.
    ///
    /// Relative paths are resolved against `base_dir`.
    pub fn config_bytes(&self, base_dir: Option<&Path>) -> AdmissionResult<Option<Vec<u8>>> {
        if let Some(configuration) = &self.configuration {
            let encoded = serde_yaml::to_string(configuration).map_err(|err| {
                AdmissionError::bad_request(format!(
                    "failed to encode configuration for admission plugin {:?}: {}",
                    self.name, err
                ))
            })?;
            return Ok(Some(encoded.into_bytes()));
        }
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let resolved = match base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.clone(),
        };
        std::fs::read(&resolved).map(Some).map_err(|err| {
            AdmissionError::bad_request(format!(
                "failed to read configuration for admission plugin {:?} from {}: {}",
                self.name,
                resolved.display(),
                err
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
apiVersion: apiserver.config.k8s.io/v1
kind: AdmissionConfiguration
plugins:
- name: AddDefaultFields
- name: DenyByName
  configuration:
    name: forbidden
"#;

    #[test]
    fn test_parse_keeps_order() {
        let config = AdmissionConfiguration::from_yaml(CONFIG).unwrap();
        assert_eq!(config.kind, "AdmissionConfiguration");
        assert_eq!(config.plugin_names(), vec!["AddDefaultFields", "DenyByName"]);
        assert!(config.plugins[0].config_bytes(None).unwrap().is_none());

        let bytes = config.plugins[1].config_bytes(None).unwrap().unwrap();
        let value: serde_yaml::Value = serde_yaml::from_slice(&bytes).unwrap();
        assert_eq!(value["name"].as_str(), Some("forbidden"));
    }

    #[test]
    fn test_duplicate_plugins_rejected() {
        let err = AdmissionConfiguration::from_yaml("plugins: [{name: A}, {name: A}]").unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_path_and_configuration_are_exclusive() {
        let err = AdmissionConfiguration::from_yaml(
            "plugins: [{name: A, path: a.yaml, configuration: {x: 1}}]",
        )
        .unwrap_err();
        assert!(err.to_string().contains("both path and configuration"));
    }

    #[test]
    fn test_malformed_document() {
        assert!(AdmissionConfiguration::from_yaml("plugins: 3").is_err());
        assert!(AdmissionConfiguration::from_reader("plugins: []".as_bytes())
            .unwrap()
            .plugins
            .is_empty());
    }

    #[test]
    fn test_missing_path_is_reported() {
        let plugin = AdmissionPluginConfiguration {
            name: "A".to_string(),
            path: Some(PathBuf::from("does-not-exist.yaml")),
            configuration: None,
        };
        let err = plugin
            .config_bytes(Some(Path::new("/nonexistent-admission-dir")))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("/nonexistent-admission-dir/does-not-exist.yaml"));
    }
}

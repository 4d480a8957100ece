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

//! DenyByName rejects any request whose object carries a reserved name.
//!
//! Configuration (optional):
//!
//! ```yaml
//! name: deny
//! ```

use crate::admission::errors::field_invalid;
use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface,
    Operation, Plugins, ValidationInterface,
};
use serde::Deserialize;
use std::io::Read;
use std::sync::Arc;

pub const PLUGIN_NAME: &str = "DenyByName";

/// Name rejected when no configuration is given.
pub const DEFAULT_DENIED_NAME: &str = "deny";

pub fn register(plugins: &mut Plugins) -> AdmissionResult<()> {
    plugins.register(PLUGIN_NAME, |config: Option<&mut dyn Read>| {
        let config = Configuration::load(config)?;
        Ok(Arc::new(DenyByName::new(&config.name)) as Arc<dyn Interface>)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    DEFAULT_DENIED_NAME.to_string()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

impl Configuration {
    /// Parse the plugin configuration. Missing or empty input yields the default.
    pub fn load(config: Option<&mut dyn Read>) -> AdmissionResult<Self> {
        let Some(reader) = config else {
            return Ok(Self::default());
        };
        let mut raw = String::new();
        reader
            .read_to_string(&mut raw)
            .map_err(|err| AdmissionError::bad_request(format!("reading configuration: {}", err)))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&raw)
            .map_err(|err| AdmissionError::bad_request(format!("invalid configuration: {}", err)))?;
        if config.name.is_empty() {
            return Err(AdmissionError::bad_request(
                "invalid configuration: name must not be empty",
            ));
        }
        Ok(config)
    }
}

/// DenyByName takes part in both passes so that it rejects as early as possible.
pub struct DenyByName {
    handler: Handler,
    denied_name: String,
}

impl DenyByName {
    pub fn new(denied_name: &str) -> Self {
        Self {
            handler: Handler::new_all(),
            denied_name: denied_name.to_string(),
        }
    }

    fn check(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        let name = attributes
            .get_object()
            .map(|obj| obj.name())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| attributes.get_name());
        if name != self.denied_name {
            return Ok(());
        }
        Err(AdmissionError::forbidden(
            name,
            attributes.get_namespace(),
            attributes.get_resource().resource,
            field_invalid("metadata.name", name, "this name is not allowed"),
        ))
    }
}

impl Default for DenyByName {
    fn default() -> Self {
        Self::new(DEFAULT_DENIED_NAME)
    }
}

impl Interface for DenyByName {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }

    fn as_mutator(&self) -> Option<&dyn MutationInterface> {
        Some(self)
    }

    fn as_validator(&self) -> Option<&dyn ValidationInterface> {
        Some(self)
    }
}

impl MutationInterface for DenyByName {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        self.check(attributes)
    }
}

impl ValidationInterface for DenyByName {
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        self.check(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AttributesRecord, ResourceCoordinates};
    use crate::api::{GroupVersionKind, StatusReason, Unstructured};

    fn coordinates(name: &str) -> ResourceCoordinates {
        ResourceCoordinates::new(
            &GroupVersionKind::new("playlist.grafana.app", "v0alpha1", "Playlist"),
            "playlists",
            "default",
            name,
        )
    }

    fn create(name: &str) -> AttributesRecord {
        let obj = Unstructured::new(
            &GroupVersionKind::new("playlist.grafana.app", "v0alpha1", "Playlist"),
            "default",
            name,
        );
        AttributesRecord::for_create(coordinates(name), obj)
    }

    #[test]
    fn test_denies_sentinel_name() {
        let plugin = DenyByName::default();
        let err = plugin.validate(&create("deny")).unwrap_err();
        assert!(err
            .to_string()
            .contains("playlists \"deny\" is forbidden: metadata.name: Invalid value: \"deny\""));
        assert_eq!(err.status().reason, StatusReason::Forbidden);

        let mut attrs = create("deny");
        assert!(plugin.admit(&mut attrs).is_err());
    }

    #[test]
    fn test_allows_other_names() {
        let plugin = DenyByName::default();
        assert!(plugin.validate(&create("weekly")).is_ok());
        assert!(plugin.validate(&create("denied")).is_ok());
    }

    #[test]
    fn test_handles_all_operations() {
        let plugin = DenyByName::default();
        for op in Operation::ALL {
            assert!(plugin.handles(op), "expected {} to be handled", op);
        }
    }

    #[test]
    fn test_delete_uses_request_name() {
        let plugin = DenyByName::default();
        let attrs = AttributesRecord::for_delete(coordinates("deny"));
        assert!(plugin.validate(&attrs).is_err());
    }

    #[test]
    fn test_configuration() {
        let mut plugins = Plugins::new();
        register(&mut plugins).unwrap();
        let sealed = plugins.seal();

        let mut reader = "name: forbidden".as_bytes();
        let plugin = sealed
            .new_from_plugins(PLUGIN_NAME, Some(&mut reader))
            .ok()
            .unwrap();
        let validator = plugin.as_validator().unwrap();
        assert!(validator.validate(&create("forbidden")).is_err());
        assert!(validator.validate(&create("deny")).is_ok());

        let mut empty = "".as_bytes();
        let plugin = sealed.new_from_plugins(PLUGIN_NAME, Some(&mut empty)).ok().unwrap();
        assert!(plugin.as_validator().unwrap().validate(&create("deny")).is_err());
    }

    #[test]
    fn test_invalid_configuration() {
        let mut unknown = "nmae: typo".as_bytes();
        assert!(Configuration::load(Some(&mut unknown)).is_err());
        let mut blank = "name: ''".as_bytes();
        assert!(Configuration::load(Some(&mut blank)).is_err());
    }
}

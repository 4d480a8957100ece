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

//! AddDefaultFields fills in managed spec fields.
//!
//! On create, each managed field missing from the object's spec is set to its default. On
//! update, a managed field that was set on the stored object but is missing from the new
//! object is carried over, so callers cannot drop it by omission.
//!
//! Configuration (optional):
//!
//! ```yaml
//! fields:
//!   default_fields_key_1: default_fields_value_1
//! ```

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface,
    Operation, Plugins,
};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

pub const PLUGIN_NAME: &str = "AddDefaultFields";

pub const DEFAULT_FIELD_KEY: &str = "default_fields_key_1";
pub const DEFAULT_FIELD_VALUE: &str = "default_fields_value_1";

pub fn register(plugins: &mut Plugins) -> AdmissionResult<()> {
    plugins.register(PLUGIN_NAME, |config: Option<&mut dyn Read>| {
        let config = Configuration::load(config)?;
        Ok(Arc::new(AddDefaultFields::new(config.fields)) as Arc<dyn Interface>)
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Managed fields and their defaults, applied in order.
    pub fields: IndexMap<String, Value>,
}

impl Default for Configuration {
    fn default() -> Self {
        let mut fields = IndexMap::new();
        fields.insert(
            DEFAULT_FIELD_KEY.to_string(),
            Value::String(DEFAULT_FIELD_VALUE.to_string()),
        );
        Self { fields }
    }
}

impl Configuration {
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
        if let Some(key) = config.fields.keys().find(|k| k.is_empty()) {
            return Err(AdmissionError::bad_request(format!(
                "invalid configuration: field name {:?} must not be empty",
                key
            )));
        }
        Ok(config)
    }
}

pub struct AddDefaultFields {
    handler: Handler,
    fields: IndexMap<String, Value>,
}

impl AddDefaultFields {
    pub fn new(fields: IndexMap<String, Value>) -> Self {
        Self {
            handler: Handler::new_create_update(),
            fields,
        }
    }

    /// Managed fields set on the stored object, for carrying over on update.
    fn previous_values(&self, attributes: &dyn Attributes) -> Vec<(String, Value)> {
        let Some(old_spec) = attributes.get_old_object().and_then(|o| o.spec()) else {
            return Vec::new();
        };
        self.fields
            .keys()
            .filter_map(|key| old_spec.get(key).map(|v| (key.clone(), v.clone())))
            .collect()
    }
}

impl Default for AddDefaultFields {
    fn default() -> Self {
        Self::new(Configuration::default().fields)
    }
}

impl Interface for AddDefaultFields {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }

    fn as_mutator(&self) -> Option<&dyn MutationInterface> {
        Some(self)
    }
}

impl MutationInterface for AddDefaultFields {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        let operation = attributes.get_operation();
        let previous = match operation {
            Operation::Update => self.previous_values(attributes),
            _ => Vec::new(),
        };

        let Some(object) = attributes.get_object_mut() else {
            return Ok(());
        };
        if let Some(spec) = object.as_map().get("spec") {
            if !spec.is_object() {
                return Err(AdmissionError::bad_request(format!(
                    "{} \"{}\": spec must be an object",
                    object.group_version_kind().kind,
                    object.name()
                )));
            }
        }

        let spec = object.spec_mut();
        match operation {
            Operation::Create => {
                for (key, value) in &self.fields {
                    if !spec.contains_key(key) {
                        debug!(field = %key, "adding default field");
                        spec.insert(key.clone(), value.clone());
                    }
                }
            }
            Operation::Update => {
                for (key, value) in previous {
                    if !spec.contains_key(&key) {
                        debug!(field = %key, "restoring managed field dropped by update");
                        spec.insert(key, value);
                    }
                }
            }
            Operation::Delete | Operation::Connect => {}
        }
        Ok(())
    }
}

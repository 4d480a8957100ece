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

//! Unstructured objects: API resources held as plain JSON documents.

use super::meta::GroupVersionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unstructured is a resource whose shape is only known to the registry that owns its kind.
///
/// Only the envelope (`apiVersion`, `kind`, `metadata`, `spec`) is interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unstructured {
    object: Map<String, Value>,
}

impl Unstructured {
    /// Create an empty object of the given kind.
    pub fn new(gvk: &GroupVersionKind, namespace: &str, name: &str) -> Self {
        let mut obj = Self::default();
        obj.object
            .insert("apiVersion".to_string(), Value::String(gvk.api_version()));
        obj.object
            .insert("kind".to_string(), Value::String(gvk.kind.clone()));
        obj.set_name(name);
        if !namespace.is_empty() {
            obj.set_namespace(namespace);
        }
        obj
    }

    /// Wrap a JSON value. Returns None unless the value is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self { object }),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.object)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.object
    }

    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(self.str_field("apiVersion"), self.str_field("kind"))
    }

    pub fn name(&self) -> &str {
        self.metadata_str("name")
    }

    pub fn set_name(&mut self, name: &str) {
        self.metadata_mut()
            .insert("name".to_string(), Value::String(name.to_string()));
    }

    pub fn namespace(&self) -> &str {
        self.metadata_str("namespace")
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        self.metadata_mut()
            .insert("namespace".to_string(), Value::String(namespace.to_string()));
    }

    pub fn resource_version(&self) -> &str {
        self.metadata_str("resourceVersion")
    }

    pub fn set_resource_version(&mut self, rv: &str) {
        self.metadata_mut()
            .insert("resourceVersion".to_string(), Value::String(rv.to_string()));
    }

    /// Returns the value of a label, if set.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.object
            .get("metadata")
            .and_then(|m| m.get("labels"))
            .and_then(|l| l.get(key))
            .and_then(Value::as_str)
    }

    pub fn set_label(&mut self, key: &str, value: &str) {
        let labels = self
            .metadata_mut()
            .entry("labels")
            .or_insert_with(|| Value::Object(Map::new()));
        if !labels.is_object() {
            *labels = Value::Object(Map::new());
        }
        if let Value::Object(labels) = labels {
            labels.insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    /// Returns the object's spec if it is a JSON object.
    pub fn spec(&self) -> Option<&Map<String, Value>> {
        self.object.get("spec").and_then(Value::as_object)
    }

    /// Returns the object's spec, creating an empty one if absent or not an object.
    pub fn spec_mut(&mut self) -> &mut Map<String, Value> {
        Self::child_map(&mut self.object, "spec")
    }

    fn str_field(&self, key: &str) -> &str {
        self.object.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    fn metadata_str(&self, key: &str) -> &str {
        self.object
            .get("metadata")
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        Self::child_map(&mut self.object, "metadata")
    }

    fn child_map<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
        let child = parent
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        match child {
            Value::Object(map) => map,
            _ => unreachable!("child was just replaced with an object"),
        }
    }
}

/// UnstructuredList is the result of a list call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstructuredList {
    pub resource_version: String,
    pub items: Vec<Unstructured>,
}

/// TableColumnDefinition describes one column of a server-side table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl TableColumnDefinition {
    pub fn new(name: &str, column_type: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: column_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<Value>,
}

/// Table is the server-side tabular rendering of one object or a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub column_definitions: Vec<TableColumnDefinition>,
    pub rows: Vec<TableRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_sets_envelope() {
        let gvk = GroupVersionKind::new("playlist.grafana.app", "v0alpha1", "Playlist");
        let obj = Unstructured::new(&gvk, "default", "weekly");
        assert_eq!(obj.name(), "weekly");
        assert_eq!(obj.namespace(), "default");
        assert_eq!(obj.group_version_kind(), gvk);
        assert!(obj.spec().is_none());
    }

    #[test]
    fn test_spec_mut_replaces_non_object() {
        let mut obj = Unstructured::from_value(json!({"spec": "bogus"})).unwrap();
        obj.spec_mut().insert("a".to_string(), json!(1));
        assert_eq!(obj.spec().unwrap().get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Unstructured::from_value(json!([1, 2])).is_none());
        assert!(Unstructured::from_value(json!("x")).is_none());
    }

    #[test]
    fn test_labels() {
        let mut obj = Unstructured::default();
        assert_eq!(obj.label("app"), None);
        obj.set_label("app", "web");
        assert_eq!(obj.label("app"), Some("web"));
    }

    #[test]
    fn test_serde_is_transparent() {
        let value = json!({"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "c"}});
        let obj: Unstructured = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(obj.name(), "c");
        assert_eq!(serde_json::to_value(&obj).unwrap(), value);
    }
}

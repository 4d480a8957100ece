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

//! Type metadata and request options shared by admission and storage.

use crate::storage::errors::{StatusError, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// GroupVersionResource identifies a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Returns just the group and resource portion.
    pub fn group_resource(&self) -> GroupResource {
        GroupResource {
            group: self.group.clone(),
            resource: self.resource.clone(),
        }
    }
}

/// GroupResource identifies a resource without version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl GroupResource {
    pub fn new(group: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            resource: resource.to_string(),
        }
    }
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// GroupVersionKind identifies a kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }

    /// Returns the `apiVersion` string, `group/version` or just `version` for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Splits an `apiVersion` string and kind back into a GroupVersionKind.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        match api_version.split_once('/') {
            Some((group, version)) => Self::new(group, version, kind),
            None => Self::new("", api_version, kind),
        }
    }
}

/// GetOptions is the standard query options for a get request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
}

/// ListOptions is the query options for list and watch requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    /// Restricts results to objects whose labels match every `key=value` term.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label_selector: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    /// Maximum number of items to return, zero means unlimited.
    #[serde(default)]
    pub limit: usize,
}

impl ListOptions {
    /// Parses `label_selector` into `(key, value)` pairs.
    ///
    /// Only equality terms (`key=value` or `key==value`) are supported. Any other operator
    /// (`!=`, `in`, `notin`, bare or negated keys) is a BadRequest.
    pub fn label_requirements(&self) -> StorageResult<Vec<(String, String)>> {
        self.label_selector
            .split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| self.equality_term(term))
            .collect()
    }

    fn equality_term(&self, term: &str) -> StorageResult<(String, String)> {
        let unsupported = || {
            StatusError::bad_request(format!(
                "unable to parse label selector {:?}: unsupported term {:?}, only key=value is supported",
                self.label_selector, term
            ))
        };
        if term.contains("!=") {
            return Err(unsupported());
        }
        let (key, value) = term.split_once('=').ok_or_else(unsupported)?;
        let key = key.trim();
        let value = value.strip_prefix('=').unwrap_or(value).trim();
        let is_plain = |s: &str| !s.chars().any(|c| c.is_whitespace() || "!=()".contains(c));
        if key.is_empty() || !is_plain(key) || !is_plain(value) {
            return Err(unsupported());
        }
        Ok((key.to_string(), value.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptions {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptions {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    #[serde(default)]
    pub dry_run: bool,
    /// Fails the delete unless the stored object is at this resource version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub precondition_resource_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    #[serde(default)]
    pub no_headers: bool,
}

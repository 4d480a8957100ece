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

//! Admission interfaces.
//!
//! A plugin implements [`Interface`] and opts into the mutating pass, the validating pass, or
//! both by implementing [`MutationInterface`] and/or [`ValidationInterface`] and returning
//! itself from the matching accessor.

use super::attributes::Attributes;
use super::errors::{AdmissionError, AdmissionResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operation is the type of resource operation being checked for admission control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Create indicates a resource creation operation.
    Create,
    /// Update indicates a resource update operation.
    Update,
    /// Delete indicates a resource deletion operation.
    Delete,
    /// Connect indicates a resource connect operation (e.g., pod exec).
    Connect,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::Connect,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Connect => write!(f, "CONNECT"),
        }
    }
}

impl FromStr for Operation {
    type Err = AdmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(Operation::Create),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            "CONNECT" => Ok(Operation::Connect),
            _ => Err(AdmissionError::bad_request(format!(
                "unknown admission operation {:?}",
                s
            ))),
        }
    }
}

/// Interface is the base admission plugin interface.
///
/// Implementations must be safe to call from many requests at once; the chain never
/// serializes access to a plugin.
pub trait Interface: Send + Sync {
    /// Returns true if this admission controller can handle the given operation.
    fn handles(&self, operation: Operation) -> bool;

    /// Returns the mutating half of the plugin, if it has one.
    fn as_mutator(&self) -> Option<&dyn MutationInterface> {
        None
    }

    /// Returns the validating half of the plugin, if it has one.
    fn as_validator(&self) -> Option<&dyn ValidationInterface> {
        None
    }
}

/// MutationInterface is an admission controller that may rewrite the object under admission.
pub trait MutationInterface: Interface {
    /// Admit makes an admission decision based on the request attributes.
    ///
    /// The attributes passed in are the chain's private working copy; changes to the object
    /// are carried forward to later plugins. Returning an error aborts the chain.
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()>;
}

/// ValidationInterface is an admission controller that only accepts or rejects.
pub trait ValidationInterface: Interface {
    /// Validate makes an admission decision based on the request attributes.
    /// It is NOT allowed to modify the object.
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(format!("{}", Operation::Create), "CREATE");
        assert_eq!(format!("{}", Operation::Update), "UPDATE");
        assert_eq!(format!("{}", Operation::Delete), "DELETE");
        assert_eq!(format!("{}", Operation::Connect), "CONNECT");
    }

    #[test]
    fn test_operation_from_str() {
        assert_eq!("CREATE".parse::<Operation>().ok(), Some(Operation::Create));
        assert_eq!("create".parse::<Operation>().ok(), Some(Operation::Create));
        assert_eq!("UPDATE".parse::<Operation>().ok(), Some(Operation::Update));
        assert_eq!("DELETE".parse::<Operation>().ok(), Some(Operation::Delete));
        assert_eq!("CONNECT".parse::<Operation>().ok(), Some(Operation::Connect));
        assert!("UNKNOWN".parse::<Operation>().is_err());
    }

    #[test]
    fn test_operation_serde_uppercase() {
        let ops: Vec<Operation> = serde_yaml::from_str("[CREATE, DELETE]").unwrap();
        assert_eq!(ops, vec![Operation::Create, Operation::Delete]);
    }

    struct Bare;

    impl Interface for Bare {
        fn handles(&self, _operation: Operation) -> bool {
            true
        }
    }

    #[test]
    fn test_default_accessors_are_empty() {
        assert!(Bare.as_mutator().is_none());
        assert!(Bare.as_validator().is_none());
    }
}

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

//! AlwaysDeny rejects every request. It is deprecated and exists for testing chains.

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Interface, MutationInterface, Operation,
    Plugins, ValidationInterface,
};
use std::io::Read;
use std::sync::Arc;
use tracing::warn;

pub const PLUGIN_NAME: &str = "AlwaysDeny";

pub fn register(plugins: &mut Plugins) -> AdmissionResult<()> {
    plugins.register(PLUGIN_NAME, |_config: Option<&mut dyn Read>| {
        Ok(Arc::new(AlwaysDeny::new()) as Arc<dyn Interface>)
    })
}

pub struct AlwaysDeny;

impl AlwaysDeny {
    pub fn new() -> Self {
        warn!(
            plugin = PLUGIN_NAME,
            "admission plugin is deprecated; remove it from the admission configuration"
        );
        Self
    }

    fn deny_error(&self, attributes: &dyn Attributes) -> AdmissionError {
        AdmissionError::denied(format!(
            "admission control is denying all modifications to {} {:?}",
            attributes.get_resource().group_resource(),
            attributes.get_name()
        ))
    }
}

impl Default for AlwaysDeny {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface for AlwaysDeny {
    fn handles(&self, _operation: Operation) -> bool {
        true
    }

    fn as_mutator(&self) -> Option<&dyn MutationInterface> {
        Some(self)
    }

    fn as_validator(&self) -> Option<&dyn ValidationInterface> {
        Some(self)
    }
}

impl MutationInterface for AlwaysDeny {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        Err(self.deny_error(attributes))
    }
}

impl ValidationInterface for AlwaysDeny {
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        Err(self.deny_error(attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AttributesRecord, ResourceCoordinates};
    use crate::api::{GroupVersionKind, StatusReason};

    fn attributes() -> AttributesRecord {
        let gvk = GroupVersionKind::new("apps", "v1", "Deployment");
        AttributesRecord::for_delete(ResourceCoordinates::new(&gvk, "deployments", "ns", "web"))
    }

    #[test]
    fn test_admission() {
        let handler = AlwaysDeny::new();
        let mut attrs = attributes();
        let err = handler.admit(&mut attrs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "admission control is denying all modifications to deployments.apps \"web\""
        );
        assert_eq!(err.status().reason, StatusReason::Forbidden);
    }

    #[test]
    fn test_validate_denies() {
        let handler = AlwaysDeny::new();
        assert!(handler.validate(&attributes()).is_err());
    }

    #[test]
    fn test_handles() {
        let handler = AlwaysDeny::new();
        for op in Operation::ALL {
            assert!(
                handler.handles(op),
                "Expected handling all operations, including: {:?}",
                op
            );
        }
    }

    #[test]
    fn test_plugin_registration() {
        let mut plugins = Plugins::new();
        register(&mut plugins).unwrap();
        let sealed = plugins.seal();
        assert!(sealed.is_registered(PLUGIN_NAME));

        let plugin = sealed.new_from_plugins(PLUGIN_NAME, None).ok().unwrap();
        assert!(plugin.as_mutator().is_some());
        assert!(plugin.as_validator().is_some());
    }
}

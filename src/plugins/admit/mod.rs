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

//! AlwaysAdmit admits every request. It is deprecated and exists for testing chains.

use crate::admission::{
    AdmissionResult, Attributes, Interface, MutationInterface, Operation, Plugins,
    ValidationInterface,
};
use std::io::Read;
use std::sync::Arc;
use tracing::warn;

pub const PLUGIN_NAME: &str = "AlwaysAdmit";

pub fn register(plugins: &mut Plugins) -> AdmissionResult<()> {
    plugins.register(PLUGIN_NAME, |_config: Option<&mut dyn Read>| {
        Ok(Arc::new(AlwaysAdmit::new()) as Arc<dyn Interface>)
    })
}

pub struct AlwaysAdmit;

impl AlwaysAdmit {
    pub fn new() -> Self {
        warn!(
            plugin = PLUGIN_NAME,
            "admission plugin is deprecated; remove it from the admission configuration"
        );
        Self
    }
}

impl Default for AlwaysAdmit {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface for AlwaysAdmit {
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

impl MutationInterface for AlwaysAdmit {
    fn admit(&self, _attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        Ok(())
    }
}

impl ValidationInterface for AlwaysAdmit {
    fn validate(&self, _attributes: &dyn Attributes) -> AdmissionResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AttributesRecord, Chain, ResourceCoordinates};
    use crate::api::{GroupVersionKind, Unstructured};

    fn attributes(operation: Operation) -> AttributesRecord {
        let gvk = GroupVersionKind::new("", "version", "kind");
        let coords = ResourceCoordinates::new(&gvk, "resource", "namespace", "name")
            .with_subresource("subresource");
        AttributesRecord::new(
            coords,
            operation,
            Some(Unstructured::new(&gvk, "namespace", "name")),
            None,
            false,
        )
    }

    #[test]
    fn test_admits_everything() {
        let handler = AlwaysAdmit::new();
        for op in Operation::ALL {
            let mut attrs = attributes(op);
            assert!(handler.handles(op));
            assert!(handler.admit(&mut attrs).is_ok());
            assert!(handler.validate(&attrs).is_ok());
        }
    }

    #[test]
    fn test_leaves_object_unchanged_in_chain() {
        let chain = Chain::new()
            .with_plugin(PLUGIN_NAME, Arc::new(AlwaysAdmit::new()))
            .unwrap();
        let attrs = attributes(Operation::Create);
        let admitted = chain.admit(&attrs).into_result().unwrap();
        assert_eq!(admitted.as_ref(), attrs.get_object());
    }
}

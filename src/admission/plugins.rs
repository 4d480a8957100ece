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

//! Admission plugin registry.
//!
//! Plugins are registered into a mutable [`Plugins`] during startup. [`Plugins::seal`] turns
//! it into a [`SealedPlugins`], which is immutable and can be shared across request handlers
//! without locking.

use super::errors::{AdmissionError, AdmissionResult};
use super::interfaces::Interface;
use indexmap::IndexMap;
use std::io::Read;
use std::sync::Arc;
use tracing::info;

/// Factory builds an admission plugin from its (optional) configuration bytes.
pub type Factory = fn(config: Option<&mut dyn Read>) -> AdmissionResult<Arc<dyn Interface>>;

/// Plugins is the registry of admission plugin factories, in registration order.
#[derive(Default)]
pub struct Plugins {
    registry: IndexMap<String, Factory>,
}

impl Plugins {
    /// Create a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new admission plugin with the given name and factory.
    ///
    /// Registering the same name twice is an error.
    pub fn register(&mut self, name: &str, factory: Factory) -> AdmissionResult<()> {
        if self.registry.contains_key(name) {
            return Err(AdmissionError::internal_error(format!(
                "admission plugin {:?} was registered twice",
                name
            )));
        }
        info!(plugin = name, "registered admission plugin");
        self.registry.insert(name.to_string(), factory);
        Ok(())
    }

    /// Check if a plugin is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Finish registration. No plugin can be registered afterwards.
    pub fn seal(self) -> SealedPlugins {
        info!(count = self.registry.len(), "sealed admission plugin registry");
        SealedPlugins {
            registry: self.registry,
        }
    }
}

/// SealedPlugins is the read-only registry used once startup has finished.
#[derive(Clone, Default)]
pub struct SealedPlugins {
    registry: IndexMap<String, Factory>,
}

impl SealedPlugins {
    /// Get a factory for the given plugin name.
    pub fn get_factory(&self, name: &str) -> Option<Factory> {
        self.registry.get(name).copied()
    }

    /// Get all registered plugin names, in registration order.
    pub fn registered_names(&self) -> Vec<&str> {
        self.registry.keys().map(String::as_str).collect()
    }

    /// Check if a plugin is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Create a new instance of the named plugin.
    ///
    /// Fails if the name is unknown, if the factory rejects its configuration, or if the
    /// plugin takes part in neither the mutating nor the validating pass.
    pub fn new_from_plugins(
        &self,
        name: &str,
        config: Option<&mut dyn Read>,
    ) -> AdmissionResult<Arc<dyn Interface>> {
        let factory = self.get_factory(name).ok_or_else(|| {
            AdmissionError::internal_error(format!("unknown admission plugin: {}", name))
        })?;
        let plugin = factory(config).map_err(|err| err.initializing(name))?;
        if plugin.as_mutator().is_none() && plugin.as_validator().is_none() {
            return Err(AdmissionError::internal_error(format!(
                "admission plugin {:?} is neither a mutating nor a validating plugin",
                name
            )));
        }
        Ok(plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{Attributes, Handler, Operation, ValidationInterface};
    use crate::api::StatusReason;

    struct TestPlugin {
        handler: Handler,
    }

    impl Interface for TestPlugin {
        fn handles(&self, operation: Operation) -> bool {
            self.handler.handles(operation)
        }

        fn as_validator(&self) -> Option<&dyn ValidationInterface> {
            Some(self)
        }
    }

    impl ValidationInterface for TestPlugin {
        fn validate(&self, _attributes: &dyn Attributes) -> AdmissionResult<()> {
            Ok(())
        }
    }

    struct Inert;

    impl Interface for Inert {
        fn handles(&self, _operation: Operation) -> bool {
            true
        }
    }

    fn test_factory(_config: Option<&mut dyn Read>) -> AdmissionResult<Arc<dyn Interface>> {
        Ok(Arc::new(TestPlugin {
            handler: Handler::new_create_update(),
        }))
    }

    fn inert_factory(_config: Option<&mut dyn Read>) -> AdmissionResult<Arc<dyn Interface>> {
        Ok(Arc::new(Inert))
    }

    fn failing_factory(_config: Option<&mut dyn Read>) -> AdmissionResult<Arc<dyn Interface>> {
        Err(AdmissionError::bad_request("missing field `name`"))
    }

    #[test]
    fn test_plugins_register() {
        let mut plugins = Plugins::new();
        plugins.register("TestPlugin", test_factory).unwrap();

        assert!(plugins.is_registered("TestPlugin"));
        assert!(!plugins.is_registered("Unknown"));

        let sealed = plugins.seal();
        assert_eq!(sealed.registered_names(), vec!["TestPlugin"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut plugins = Plugins::new();
        plugins.register("TestPlugin", test_factory).unwrap();
        assert!(plugins.register("TestPlugin", inert_factory).is_err());
    }

    #[test]
    fn test_registered_names_keep_registration_order() {
        let mut plugins = Plugins::new();
        for name in ["zeta", "alpha", "mu"] {
            plugins.register(name, test_factory).unwrap();
        }
        assert_eq!(plugins.seal().registered_names(), vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_plugins_new_from_plugins() {
        let mut plugins = Plugins::new();
        plugins.register("TestPlugin", test_factory).unwrap();
        let sealed = plugins.seal();

        let plugin = sealed.new_from_plugins("TestPlugin", None).unwrap();
        assert!(plugin.handles(Operation::Create));
        assert!(plugin.handles(Operation::Update));
        assert!(!plugin.handles(Operation::Delete));
    }

    #[test]
    fn test_plugins_unknown_plugin() {
        let sealed = Plugins::new().seal();
        assert!(sealed.new_from_plugins("Unknown", None).is_err());
    }

    #[test]
    fn test_plugin_without_passes_is_rejected() {
        let mut plugins = Plugins::new();
        plugins.register("Inert", inert_factory).unwrap();
        let err = plugins.seal().new_from_plugins("Inert", None).err().unwrap();
        assert!(err.to_string().contains("neither a mutating nor a validating"));
    }

    #[test]
    fn test_factory_failure_names_plugin() {
        let mut plugins = Plugins::new();
        plugins.register("Broken", failing_factory).unwrap();
        let err = plugins.seal().new_from_plugins("Broken", None).err().unwrap();
        assert_eq!(err.status().reason, StatusReason::BadRequest);
        assert!(err.to_string().contains("\"Broken\""));
        assert!(err.to_string().contains("missing field `name`"));
    }

    fn unavailable_factory(_config: Option<&mut dyn Read>) -> AdmissionResult<Arc<dyn Interface>> {
        Err(AdmissionError::internal_error("policy cache unavailable"))
    }

    #[test]
    fn test_factory_failure_keeps_error_class() {
        let mut plugins = Plugins::new();
        plugins.register("Unavailable", unavailable_factory).unwrap();
        let err = plugins
            .seal()
            .new_from_plugins("Unavailable", None)
            .err()
            .unwrap();
        let status = err.status();
        assert_eq!(status.reason, StatusReason::InternalError);
        assert_eq!(status.code, 500);
        assert!(status.message.contains("\"Unavailable\""));
        assert!(status.message.contains("policy cache unavailable"));
    }
}

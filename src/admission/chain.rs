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

//! Chain runs an ordered list of admission plugins over one request.
//!
//! Every mutating plugin runs, in order, before any validating plugin. Mutations are applied
//! to a private copy of the caller's attributes, so the caller's record is never changed and
//! a failed chain leaves nothing half-mutated behind. The first failure stops the chain.

use super::attributes::{Attributes, AttributesRecord};
use super::config::AdmissionConfiguration;
use super::errors::{AdmissionError, AdmissionResult, Stage};
use super::interfaces::Interface;
use super::plugins::SealedPlugins;
use crate::api::{Status, Unstructured};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decision is the outcome of running a chain over one request.
#[derive(Debug)]
pub enum Decision {
    /// The request may proceed with this (possibly mutated) object.
    Allowed { object: Option<Unstructured> },
    /// The request was rejected.
    Denied(AdmissionError),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Returns the admitted object.
    pub fn object(&self) -> Option<&Unstructured> {
        match self {
            Decision::Allowed { object } => object.as_ref(),
            Decision::Denied(_) => None,
        }
    }

    /// Returns the rejection reason.
    pub fn reason(&self) -> Option<&AdmissionError> {
        match self {
            Decision::Allowed { .. } => None,
            Decision::Denied(err) => Some(err),
        }
    }

    /// Status body for a rejected request.
    pub fn status(&self) -> Option<Status> {
        self.reason().map(AdmissionError::status)
    }

    pub fn into_result(self) -> AdmissionResult<Option<Unstructured>> {
        match self {
            Decision::Allowed { object } => Ok(object),
            Decision::Denied(err) => Err(err),
        }
    }
}

struct NamedPlugin {
    name: String,
    plugin: Arc<dyn Interface>,
}

/// Chain is an ordered admission pipeline.
#[derive(Default)]
pub struct Chain {
    plugins: Vec<NamedPlugin>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin. It must take part in at least one pass.
    pub fn with_plugin(mut self, name: &str, plugin: Arc<dyn Interface>) -> AdmissionResult<Self> {
        if plugin.as_mutator().is_none() && plugin.as_validator().is_none() {
            return Err(AdmissionError::internal_error(format!(
                "admission plugin {:?} is neither a mutating nor a validating plugin",
                name
            )));
        }
        self.plugins.push(NamedPlugin {
            name: name.to_string(),
            plugin,
        });
        Ok(self)
    }

    /// Build a chain of unconfigured plugins in the given order.
    pub fn from_plugins(plugins: &SealedPlugins, names: &[&str]) -> AdmissionResult<Self> {
        names.iter().try_fold(Self::new(), |chain, name| {
            let plugin = plugins.new_from_plugins(name, None)?;
            chain.with_plugin(name, plugin)
        })
    }

    /// Build a chain from an admission configuration, in the order it lists plugins.
    ///
    /// `base_dir` resolves relative configuration paths.
    pub fn from_configuration(
        plugins: &SealedPlugins,
        config: &AdmissionConfiguration,
        base_dir: Option<&Path>,
    ) -> AdmissionResult<Self> {
        config.validate()?;
        let mut chain = Self::new();
        for entry in &config.plugins {
            let bytes = entry.config_bytes(base_dir)?;
            let plugin = match bytes {
                Some(bytes) => {
                    let mut reader = bytes.as_slice();
                    plugins.new_from_plugins(&entry.name, Some(&mut reader))?
                }
                None => plugins.new_from_plugins(&entry.name, None)?,
            };
            chain = chain.with_plugin(&entry.name, plugin)?;
        }
        Ok(chain)
    }

    /// Names of the plugins in the chain, in order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run the mutating pass, then the validating pass, over a copy of `attributes`.
    pub fn admit(&self, attributes: &AttributesRecord) -> Decision {
        let mut working = attributes.clone();
        let outcome = self
            .mutate(&mut working)
            .and_then(|()| self.validate(&working));
        match outcome {
            Ok(()) => Decision::Allowed {
                object: working.into_object(),
            },
            Err(err) => Decision::Denied(err),
        }
    }

    /// Run every mutating plugin that handles the operation, in order.
    pub fn mutate(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        attributes.get_context().err()?;
        let operation = attributes.get_operation();
        for entry in &self.plugins {
            attributes.get_context().err()?;
            if !entry.plugin.handles(operation) {
                continue;
            }
            let Some(mutator) = entry.plugin.as_mutator() else {
                continue;
            };
            debug!(plugin = %entry.name, %operation, "running mutating admission plugin");
            mutator.admit(attributes).map_err(|err| {
                warn!(plugin = %entry.name, %operation, error = %err, "mutating admission plugin rejected request");
                err.rejected_by(&entry.name, Stage::Mutate)
            })?;
        }
        Ok(())
    }

    /// Run every validating plugin that handles the operation, in order.
    pub fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        attributes.get_context().err()?;
        let operation = attributes.get_operation();
        for entry in &self.plugins {
            attributes.get_context().err()?;
            if !entry.plugin.handles(operation) {
                continue;
            }
            let Some(validator) = entry.plugin.as_validator() else {
                continue;
            };
            debug!(plugin = %entry.name, %operation, "running validating admission plugin");
            validator.validate(attributes).map_err(|err| {
                warn!(plugin = %entry.name, %operation, error = %err, "validating admission plugin rejected request");
                err.rejected_by(&entry.name, Stage::Validate)
            })?;
        }
        Ok(())
    }
}

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

//! Admission control: attributes, plugin interfaces, the plugin registry and the chain that
//! runs plugins over a write request.

pub mod attributes;
pub mod chain;
pub mod config;
pub mod errors;
mod handler;
mod interfaces;
mod plugins;

pub use attributes::{Attributes, AttributesRecord, RequestContext, ResourceCoordinates};
pub use chain::{Chain, Decision};
pub use config::{AdmissionConfiguration, AdmissionPluginConfiguration};
pub use errors::{AdmissionError, AdmissionResult, Stage};
pub use handler::Handler;
pub use interfaces::{Interface, MutationInterface, Operation, ValidationInterface};
pub use plugins::{Factory, Plugins, SealedPlugins};

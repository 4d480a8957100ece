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

//! Capability-aware storage decoration and two-phase admission for Kubernetes-style API servers.
//!
//! [`storage`] wraps a resource backend so that every capability it exposes is the
//! intersection of what the backend supports and what a policy permits, and turns
//! everything else into a structured "operation unsupported" status.
//!
//! [`admission`] runs an ordered chain of plugins over each write request: all mutators
//! first, then all validators against the mutated object.

pub mod admission;
pub mod api;
pub mod plugins;
pub mod storage;

// Re-export commonly used types
pub use admission::{
    AdmissionError, Attributes, AttributesRecord, Chain, Decision, Handler, Interface,
    MutationInterface, Operation, RequestContext, ValidationInterface,
};
pub use api::{GroupVersionKind, Status, StatusReason, Unstructured};
pub use storage::{is_operation_unsupported, Capabilities, DecoratedStorage, StatusError, Storage};

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

//! API types consumed by admission and storage: object envelopes, type metadata,
//! request options and the Status failure body.

pub mod meta;
pub mod status;
pub mod unstructured;

pub use meta::{
    CreateOptions, DeleteOptions, GetOptions, GroupResource, GroupVersionKind,
    GroupVersionResource, ListOptions, TableOptions, UpdateOptions,
};
pub use status::{Status, StatusCause, StatusDetails, StatusReason};
pub use unstructured::{Table, TableColumnDefinition, TableRow, Unstructured, UnstructuredList};

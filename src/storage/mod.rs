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

//! Storage capability interfaces and the capability-aware decorator.
//!
//! A backend implements [`Storage`] plus whichever optional capability traits it supports,
//! and advertises each one through the matching `as_*` accessor. Callers probe capabilities
//! through those accessors (see [`capabilities::probe`]) instead of assuming them.

pub mod capabilities;
pub mod decorator;
pub mod errors;
pub mod memory;
pub mod watch;

pub use capabilities::{probe, Capabilities, Capability};
pub use decorator::{read_only, DecoratedStorage};
pub use errors::{
    is_operation_unsupported, operation_unsupported, StatusError, StorageResult,
};
pub use memory::MemoryStorage;
pub use watch::{WatchEvent, WatchStream};

use crate::admission::attributes::ResourceCoordinates;
use crate::api::{
    CreateOptions, DeleteOptions, GetOptions, GroupVersionKind, ListOptions, Table,
    TableOptions, Unstructured, UnstructuredList, UpdateOptions,
};

/// Storage is the base interface every resource storage implements.
pub trait Storage: Send + Sync {
    /// Returns the kind of object this storage serves.
    fn object_kind(&self) -> GroupVersionKind;

    /// Releases resources held by the storage. Safe to call more than once.
    fn destroy(&self);

    fn as_getter(&self) -> Option<&dyn Getter> {
        None
    }

    fn as_lister(&self) -> Option<&dyn Lister> {
        None
    }

    fn as_watcher(&self) -> Option<&dyn Watcher> {
        None
    }

    fn as_table_convertor(&self) -> Option<&dyn TableConvertor> {
        None
    }

    fn as_readiness_checker(&self) -> Option<&dyn ReadinessChecker> {
        None
    }

    fn as_scoper(&self) -> Option<&dyn Scoper> {
        None
    }

    fn as_singular_namer(&self) -> Option<&dyn SingularNamer> {
        None
    }

    fn as_creater(&self) -> Option<&dyn Creater> {
        None
    }

    fn as_updater(&self) -> Option<&dyn Updater> {
        None
    }

    fn as_deleter(&self) -> Option<&dyn GracefulDeleter> {
        None
    }
}

pub trait Getter: Send + Sync {
    fn get(&self, coordinates: &ResourceCoordinates, options: &GetOptions)
        -> StorageResult<Unstructured>;
}

pub trait Lister: Send + Sync {
    /// Lists objects in `coordinates.namespace`, or across all namespaces when it is empty.
    fn list(
        &self,
        coordinates: &ResourceCoordinates,
        options: &ListOptions,
    ) -> StorageResult<UnstructuredList>;
}

pub trait Watcher: Send + Sync {
    fn watch(&self, coordinates: &ResourceCoordinates, options: &ListOptions)
        -> StorageResult<WatchStream>;
}

pub trait TableConvertor: Send + Sync {
    fn convert_to_table(
        &self,
        objects: &[Unstructured],
        options: &TableOptions,
    ) -> StorageResult<Table>;
}

/// ReadinessChecker reports whether the storage's own dependencies are usable.
pub trait ReadinessChecker: Send + Sync {
    fn readiness_check(&self) -> StorageResult<()>;
}

pub trait Scoper: Send + Sync {
    fn namespace_scoped(&self) -> bool;
}

pub trait SingularNamer: Send + Sync {
    fn singular_name(&self) -> String;
}

pub trait Creater: Send + Sync {
    fn create(
        &self,
        coordinates: &ResourceCoordinates,
        object: Unstructured,
        options: &CreateOptions,
    ) -> StorageResult<Unstructured>;
}

pub trait Updater: Send + Sync {
    fn update(
        &self,
        coordinates: &ResourceCoordinates,
        object: Unstructured,
        options: &UpdateOptions,
    ) -> StorageResult<Unstructured>;
}

pub trait GracefulDeleter: Send + Sync {
    /// Deletes the object and returns its last stored state.
    fn delete(
        &self,
        coordinates: &ResourceCoordinates,
        options: &DeleteOptions,
    ) -> StorageResult<Unstructured>;
}

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

//! DecoratedStorage presents a policy-restricted view of another storage.
//!
//! The decorated handle advertises a capability only when the policy permits it and the
//! wrapped storage has it. Calling a capability the handle does not advertise fails with
//! [`operation_unsupported`]. `destroy` is always forwarded, and a missing readiness check
//! reports healthy.

use super::capabilities::{probe, Capabilities, Capability};
use super::errors::{operation_unsupported, StatusError, StorageResult};
use super::watch::WatchStream;
use super::{
    Creater, Getter, GracefulDeleter, Lister, ReadinessChecker, Scoper, SingularNamer, Storage,
    TableConvertor, Updater, Watcher,
};
use crate::admission::attributes::ResourceCoordinates;
use crate::api::{
    CreateOptions, DeleteOptions, GetOptions, GroupVersionKind, ListOptions, Table,
    TableOptions, Unstructured, UnstructuredList, UpdateOptions,
};
use std::sync::Arc;
use tracing::debug;

/// Wrap `storage` so that only its read capabilities are exposed.
pub fn read_only(storage: Arc<dyn Storage>) -> DecoratedStorage {
    DecoratedStorage::wrap(storage, Capabilities::READ_ONLY)
}

pub struct DecoratedStorage {
    inner: Arc<dyn Storage>,
    kind: GroupVersionKind,
    capabilities: Capabilities,
}

impl DecoratedStorage {
    /// Wrap `inner`, exposing the capabilities in `policy` that `inner` actually has.
    pub fn wrap(inner: Arc<dyn Storage>, policy: Capabilities) -> Self {
        let kind = inner.object_kind();
        let capabilities = probe(inner.as_ref()) & policy;
        debug!(
            kind = %kind.kind,
            group = %kind.group,
            capabilities = ?capabilities,
            "wrapped storage"
        );
        Self {
            inner,
            kind,
            capabilities,
        }
    }

    /// Capabilities this handle exposes, fixed at construction.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn permits(&self, capability: Capability) -> bool {
        self.capabilities.supports(capability)
    }

    fn unsupported(&self, capability: Capability, name: &str) -> StatusError {
        debug!(
            operation = capability.verb(),
            kind = %self.kind.kind,
            name,
            "operation not supported by decorated storage"
        );
        operation_unsupported(capability.verb(), &self.kind, name)
    }
}

impl Storage for DecoratedStorage {
    fn object_kind(&self) -> GroupVersionKind {
        self.kind.clone()
    }

    fn destroy(&self) {
        self.inner.destroy();
    }

    fn as_getter(&self) -> Option<&dyn Getter> {
        self.permits(Capability::Get).then_some(self as &dyn Getter)
    }

    fn as_lister(&self) -> Option<&dyn Lister> {
        self.permits(Capability::List).then_some(self as &dyn Lister)
    }

    fn as_watcher(&self) -> Option<&dyn Watcher> {
        self.permits(Capability::Watch).then_some(self as &dyn Watcher)
    }

    fn as_table_convertor(&self) -> Option<&dyn TableConvertor> {
        self.permits(Capability::Table)
            .then_some(self as &dyn TableConvertor)
    }

    fn as_readiness_checker(&self) -> Option<&dyn ReadinessChecker> {
        self.permits(Capability::ReadinessCheck)
            .then_some(self as &dyn ReadinessChecker)
    }

    fn as_scoper(&self) -> Option<&dyn Scoper> {
        self.permits(Capability::Scope).then_some(self as &dyn Scoper)
    }

    fn as_singular_namer(&self) -> Option<&dyn SingularNamer> {
        self.permits(Capability::SingularName)
            .then_some(self as &dyn SingularNamer)
    }

    fn as_creater(&self) -> Option<&dyn Creater> {
        self.permits(Capability::Create).then_some(self as &dyn Creater)
    }

    fn as_updater(&self) -> Option<&dyn Updater> {
        self.permits(Capability::Update).then_some(self as &dyn Updater)
    }

    fn as_deleter(&self) -> Option<&dyn GracefulDeleter> {
        self.permits(Capability::Delete)
            .then_some(self as &dyn GracefulDeleter)
    }
}

impl Getter for DecoratedStorage {
    fn get(
        &self,
        coordinates: &ResourceCoordinates,
        options: &GetOptions,
    ) -> StorageResult<Unstructured> {
        match self.inner.as_getter() {
            Some(getter) if self.permits(Capability::Get) => getter.get(coordinates, options),
            _ => Err(self.unsupported(Capability::Get, &coordinates.name)),
        }
    }
}

impl Lister for DecoratedStorage {
    fn list(
        &self,
        coordinates: &ResourceCoordinates,
        options: &ListOptions,
    ) -> StorageResult<UnstructuredList> {
        match self.inner.as_lister() {
            Some(lister) if self.permits(Capability::List) => lister.list(coordinates, options),
            _ => Err(self.unsupported(Capability::List, "")),
        }
    }
}

impl Watcher for DecoratedStorage {
    fn watch(
        &self,
        coordinates: &ResourceCoordinates,
        options: &ListOptions,
    ) -> StorageResult<WatchStream> {
        match self.inner.as_watcher() {
            Some(watcher) if self.permits(Capability::Watch) => {
                watcher.watch(coordinates, options)
            }
            _ => Err(self.unsupported(Capability::Watch, "")),
        }
    }
}

impl TableConvertor for DecoratedStorage {
    fn convert_to_table(
        &self,
        objects: &[Unstructured],
        options: &TableOptions,
    ) -> StorageResult<Table> {
        match self.inner.as_table_convertor() {
            Some(convertor) if self.permits(Capability::Table) => {
                convertor.convert_to_table(objects, options)
            }
            _ => Err(self.unsupported(Capability::Table, "")),
        }
    }
}

impl ReadinessChecker for DecoratedStorage {
    fn readiness_check(&self) -> StorageResult<()> {
        match self.inner.as_readiness_checker() {
            Some(checker) if self.permits(Capability::ReadinessCheck) => checker.readiness_check(),
            _ => Ok(()),
        }
    }
}

impl Scoper for DecoratedStorage {
    /// Storage without a scoper is treated as namespaced.
    fn namespace_scoped(&self) -> bool {
        match self.inner.as_scoper() {
            Some(scoper) if self.permits(Capability::Scope) => scoper.namespace_scoped(),
            _ => true,
        }
    }
}

impl SingularNamer for DecoratedStorage {
    /// Falls back to the lower-cased kind.
    fn singular_name(&self) -> String {
        match self.inner.as_singular_namer() {
            Some(namer) if self.permits(Capability::SingularName) => namer.singular_name(),
            _ => self.kind.kind.to_lowercase(),
        }
    }
}

impl Creater for DecoratedStorage {
    fn create(
        &self,
        coordinates: &ResourceCoordinates,
        object: Unstructured,
        options: &CreateOptions,
    ) -> StorageResult<Unstructured> {
        match self.inner.as_creater() {
            Some(creater) if self.permits(Capability::Create) => {
                creater.create(coordinates, object, options)
            }
            _ => Err(self.unsupported(Capability::Create, &coordinates.name)),
        }
    }
}

impl Updater for DecoratedStorage {
    fn update(
        &self,
        coordinates: &ResourceCoordinates,
        object: Unstructured,
        options: &UpdateOptions,
    ) -> StorageResult<Unstructured> {
        match self.inner.as_updater() {
            Some(updater) if self.permits(Capability::Update) => {
                updater.update(coordinates, object, options)
            }
            _ => Err(self.unsupported(Capability::Update, &coordinates.name)),
        }
    }
}

impl GracefulDeleter for DecoratedStorage {
    fn delete(
        &self,
        coordinates: &ResourceCoordinates,
        options: &DeleteOptions,
    ) -> StorageResult<Unstructured> {
        match self.inner.as_deleter() {
            Some(deleter) if self.permits(Capability::Delete) => {
                deleter.delete(coordinates, options)
            }
            _ => Err(self.unsupported(Capability::Delete, &coordinates.name)),
        }
    }
}

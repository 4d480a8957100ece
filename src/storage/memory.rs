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

//! MemoryStorage is a complete in-process storage backend.

use super::errors::{StatusError, StorageResult};
use super::watch::{WatchEvent, WatchStream};
use super::{
    Creater, Getter, GracefulDeleter, Lister, ReadinessChecker, Scoper, SingularNamer, Storage,
    TableConvertor, Updater, Watcher,
};
use crate::admission::attributes::ResourceCoordinates;
use crate::api::{
    CreateOptions, DeleteOptions, GetOptions, GroupResource, GroupVersionKind, ListOptions,
    Table, TableColumnDefinition, TableOptions, TableRow, Unstructured, UnstructuredList,
    UpdateOptions,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct State {
    /// Objects keyed by (namespace, name).
    objects: BTreeMap<(String, String), Unstructured>,
    revision: u64,
}

/// One open watch: its namespace (empty for all) and label selector.
struct WatcherEntry {
    namespace: String,
    labels: Vec<(String, String)>,
    events: Sender<WatchEvent>,
}

/// MemoryStorage keeps objects of one kind in memory.
///
/// Every write bumps a storage-wide revision that becomes the object's resource version.
/// Watchers receive events for writes made after they started watching, in resource
/// version order: events are sent while the write still holds the state lock.
pub struct MemoryStorage {
    kind: GroupVersionKind,
    resource: GroupResource,
    namespaced: bool,
    singular: String,
    state: RwLock<State>,
    watchers: Mutex<Vec<WatcherEntry>>,
    destroyed: AtomicBool,
}

impl MemoryStorage {
    pub fn new(kind: GroupVersionKind, resource: &str) -> Self {
        Self {
            resource: GroupResource::new(&kind.group, resource),
            singular: kind.kind.to_lowercase(),
            kind,
            namespaced: true,
            state: RwLock::new(State::default()),
            watchers: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn cluster_scoped(mut self) -> Self {
        self.namespaced = false;
        self
    }

    pub fn with_singular_name(mut self, singular: &str) -> Self {
        self.singular = singular.to_string();
        self
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .objects
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(&self, coordinates: &ResourceCoordinates) -> (String, String) {
        let namespace = if self.namespaced {
            coordinates.namespace.clone()
        } else {
            String::new()
        };
        (namespace, coordinates.name.clone())
    }

    fn check_alive(&self) -> StorageResult<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(StatusError::internal(format!(
                "storage for {} has been destroyed",
                self.resource
            )));
        }
        Ok(())
    }

    fn read_state(&self) -> StorageResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| self.poisoned())
    }

    fn write_state(&self) -> StorageResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| self.poisoned())
    }

    fn poisoned(&self) -> StatusError {
        StatusError::internal(format!(
            "storage for {} is unusable after a writer panicked",
            self.resource
        ))
    }

    /// Deliver `event` to the watchers that select it, dropping watchers that went away.
    ///
    /// Callers hold the state write lock.
    fn notify(&self, namespace: &str, event: WatchEvent) {
        let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        watchers.retain(|watcher| {
            let in_scope = watcher.namespace.is_empty() || watcher.namespace == namespace;
            let selected = event
                .object()
                .map_or(true, |object| matches_labels(object, &watcher.labels));
            if !in_scope || !selected {
                return true;
            }
            watcher.events.send(event.clone()).is_ok()
        });
    }
}

fn matches_labels(object: &Unstructured, requirements: &[(String, String)]) -> bool {
    requirements
        .iter()
        .all(|(key, value)| object.label(key) == Some(value.as_str()))
}

impl Storage for MemoryStorage {
    fn object_kind(&self) -> GroupVersionKind {
        self.kind.clone()
    }

    fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            info!(resource = %self.resource, "destroying memory storage");
            self.watchers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    fn as_getter(&self) -> Option<&dyn Getter> {
        Some(self)
    }

    fn as_lister(&self) -> Option<&dyn Lister> {
        Some(self)
    }

    fn as_watcher(&self) -> Option<&dyn Watcher> {
        Some(self)
    }

    fn as_table_convertor(&self) -> Option<&dyn TableConvertor> {
        Some(self)
    }

    fn as_readiness_checker(&self) -> Option<&dyn ReadinessChecker> {
        Some(self)
    }

    fn as_scoper(&self) -> Option<&dyn Scoper> {
        Some(self)
    }

    fn as_singular_namer(&self) -> Option<&dyn SingularNamer> {
        Some(self)
    }

    fn as_creater(&self) -> Option<&dyn Creater> {
        Some(self)
    }

    fn as_updater(&self) -> Option<&dyn Updater> {
        Some(self)
    }

    fn as_deleter(&self) -> Option<&dyn GracefulDeleter> {
        Some(self)
    }
}

impl Getter for MemoryStorage {
    fn get(
        &self,
        coordinates: &ResourceCoordinates,
        _options: &GetOptions,
    ) -> StorageResult<Unstructured> {
        self.check_alive()?;
        let state = self.read_state()?;
        state
            .objects
            .get(&self.key(coordinates))
            .cloned()
            .ok_or_else(|| StatusError::not_found(&self.resource, &coordinates.name))
    }
}

impl Lister for MemoryStorage {
    fn list(
        &self,
        coordinates: &ResourceCoordinates,
        options: &ListOptions,
    ) -> StorageResult<UnstructuredList> {
        self.check_alive()?;
        let requirements = options.label_requirements()?;
        let state = self.read_state()?;
        let mut items: Vec<Unstructured> = state
            .objects
            .iter()
            .filter(|((namespace, _), _)| {
                coordinates.namespace.is_empty() || *namespace == coordinates.namespace
            })
            .map(|(_, object)| object)
            .filter(|object| matches_labels(object, &requirements))
            .cloned()
            .collect();
        if options.limit > 0 {
            items.truncate(options.limit);
        }
        Ok(UnstructuredList {
            resource_version: state.revision.to_string(),
            items,
        })
    }
}

impl Watcher for MemoryStorage {
    fn watch(
        &self,
        coordinates: &ResourceCoordinates,
        options: &ListOptions,
    ) -> StorageResult<WatchStream> {
        self.check_alive()?;
        let labels = options.label_requirements()?;
        let (tx, rx) = channel();
        // Registering under the state lock keeps a concurrent write from being seen twice
        // or out of order.
        let _state = self.read_state()?;
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(WatcherEntry {
                namespace: coordinates.namespace.clone(),
                labels,
                events: tx,
            });
        debug!(resource = %self.resource, namespace = %coordinates.namespace, "watch started");
        Ok(WatchStream::new(rx))
    }
}

impl TableConvertor for MemoryStorage {
    fn convert_to_table(
        &self,
        objects: &[Unstructured],
        options: &TableOptions,
    ) -> StorageResult<Table> {
        let column_definitions = if options.no_headers {
            Vec::new()
        } else {
            vec![
                TableColumnDefinition::new("Name", "string"),
                TableColumnDefinition::new("Resource Version", "string"),
            ]
        };
        let rows = objects
            .iter()
            .map(|object| TableRow {
                cells: vec![
                    Value::String(object.name().to_string()),
                    Value::String(object.resource_version().to_string()),
                ],
            })
            .collect();
        Ok(Table {
            column_definitions,
            rows,
        })
    }
}

impl ReadinessChecker for MemoryStorage {
    fn readiness_check(&self) -> StorageResult<()> {
        self.check_alive()?;
        self.read_state().map(|_| ())
    }
}

impl Scoper for MemoryStorage {
    fn namespace_scoped(&self) -> bool {
        self.namespaced
    }
}

impl SingularNamer for MemoryStorage {
    fn singular_name(&self) -> String {
        self.singular.clone()
    }
}

impl Creater for MemoryStorage {
    fn create(
        &self,
        coordinates: &ResourceCoordinates,
        mut object: Unstructured,
        options: &CreateOptions,
    ) -> StorageResult<Unstructured> {
        self.check_alive()?;
        if coordinates.name.is_empty() {
            return Err(StatusError::bad_request("name is required to create an object"));
        }
        let key = self.key(coordinates);
        let mut state = self.write_state()?;
        if state.objects.contains_key(&key) {
            return Err(StatusError::already_exists(&self.resource, &coordinates.name));
        }
        object.set_name(&coordinates.name);
        if !key.0.is_empty() {
            object.set_namespace(&key.0);
        }
        if options.dry_run {
            return Ok(object);
        }
        state.revision += 1;
        object.set_resource_version(&state.revision.to_string());
        state.objects.insert(key.clone(), object.clone());
        self.notify(&key.0, WatchEvent::Added(object.clone()));
        Ok(object)
    }
}

impl Updater for MemoryStorage {
    fn update(
        &self,
        coordinates: &ResourceCoordinates,
        mut object: Unstructured,
        options: &UpdateOptions,
    ) -> StorageResult<Unstructured> {
        self.check_alive()?;
        let key = self.key(coordinates);
        let mut state = self.write_state()?;
        let current_rv = match state.objects.get(&key) {
            Some(current) => current.resource_version().to_string(),
            None => return Err(StatusError::not_found(&self.resource, &coordinates.name)),
        };
        if !object.resource_version().is_empty() && object.resource_version() != current_rv {
            return Err(StatusError::conflict(
                &self.resource,
                &coordinates.name,
                "the object has been modified; please apply your changes to the latest version and try again",
            ));
        }
        object.set_name(&coordinates.name);
        if !key.0.is_empty() {
            object.set_namespace(&key.0);
        }
        if options.dry_run {
            return Ok(object);
        }
        state.revision += 1;
        object.set_resource_version(&state.revision.to_string());
        state.objects.insert(key.clone(), object.clone());
        self.notify(&key.0, WatchEvent::Modified(object.clone()));
        Ok(object)
    }
}

impl GracefulDeleter for MemoryStorage {
    fn delete(
        &self,
        coordinates: &ResourceCoordinates,
        options: &DeleteOptions,
    ) -> StorageResult<Unstructured> {
        self.check_alive()?;
        let key = self.key(coordinates);
        let mut state = self.write_state()?;
        let current = state
            .objects
            .get(&key)
            .ok_or_else(|| StatusError::not_found(&self.resource, &coordinates.name))?;
        if !options.precondition_resource_version.is_empty()
            && options.precondition_resource_version != current.resource_version()
        {
            return Err(StatusError::conflict(
                &self.resource,
                &coordinates.name,
                "precondition failed: resource version does not match",
            ));
        }
        if options.dry_run {
            return Ok(current.clone());
        }
        let removed = state
            .objects
            .remove(&key)
            .ok_or_else(|| StatusError::not_found(&self.resource, &coordinates.name))?;
        state.revision += 1;
        self.notify(&key.0, WatchEvent::Deleted(removed.clone()));
        Ok(removed)
    }
}

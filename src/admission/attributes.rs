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

//! Admission attributes that describe an admission request.

use super::errors::{AdmissionError, AdmissionResult};
use super::interfaces::Operation;
use crate::api::{GroupResource, GroupVersionKind, GroupVersionResource, Unstructured};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// ResourceCoordinates locate the resource instance a request targets.
///
/// They are decoded by the transport layer and never changed by admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceCoordinates {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub resource: String,
    pub name: String,
    /// Empty for cluster-scoped resources.
    pub namespace: String,
    /// Empty unless the request targets a subresource.
    pub subresource: String,
}

impl ResourceCoordinates {
    pub fn new(gvk: &GroupVersionKind, resource: &str, namespace: &str, name: &str) -> Self {
        Self {
            group: gvk.group.clone(),
            version: gvk.version.clone(),
            kind: gvk.kind.clone(),
            resource: resource.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            subresource: String::new(),
        }
    }

    pub fn with_subresource(mut self, subresource: &str) -> Self {
        self.subresource = subresource.to_string();
        self
    }

    pub fn group_version_resource(&self) -> GroupVersionResource {
        GroupVersionResource::new(&self.group, &self.version, &self.resource)
    }

    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::new(&self.group, &self.version, &self.kind)
    }

    pub fn group_resource(&self) -> GroupResource {
        GroupResource::new(&self.group, &self.resource)
    }
}

/// RequestContext carries the calling request's cancellation signal and deadline.
///
/// Clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context that is cancelled together with `token`.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Token plugins doing I/O should select on.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns an error once the request has been cancelled or its deadline has passed.
    pub fn err(&self) -> AdmissionResult<()> {
        if self.cancel.is_cancelled() {
            return Err(AdmissionError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(AdmissionError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Attributes is an interface used by AdmissionController to get information about a request
/// that is used to make an admission decision.
pub trait Attributes {
    /// Returns the coordinates of the targeted resource.
    fn get_coordinates(&self) -> &ResourceCoordinates;

    /// Returns the name of the object as presented in the request.
    fn get_name(&self) -> &str {
        &self.get_coordinates().name
    }

    /// Returns the namespace associated with the request (if any).
    fn get_namespace(&self) -> &str {
        &self.get_coordinates().namespace
    }

    /// Returns the resource being requested.
    fn get_resource(&self) -> GroupVersionResource {
        self.get_coordinates().group_version_resource()
    }

    /// Returns the name of the subresource being requested.
    fn get_subresource(&self) -> &str {
        &self.get_coordinates().subresource
    }

    /// Returns the kind of object being manipulated.
    fn get_kind(&self) -> GroupVersionKind {
        self.get_coordinates().group_version_kind()
    }

    /// Returns the operation being performed.
    fn get_operation(&self) -> Operation;

    /// Returns the object from the incoming request.
    fn get_object(&self) -> Option<&Unstructured>;

    /// Returns the object as a mutable reference.
    fn get_object_mut(&mut self) -> Option<&mut Unstructured>;

    /// Returns the existing object (only populated for UPDATE requests).
    fn get_old_object(&self) -> Option<&Unstructured>;

    /// Check if this request is a dry run.
    fn is_dry_run(&self) -> bool;

    /// Returns the request's cancellation context.
    fn get_context(&self) -> &RequestContext;
}

/// AttributesRecord is a concrete implementation of Attributes.
#[derive(Debug, Clone)]
pub struct AttributesRecord {
    coordinates: ResourceCoordinates,
    operation: Operation,
    object: Option<Unstructured>,
    old_object: Option<Unstructured>,
    dry_run: bool,
    context: RequestContext,
}

impl AttributesRecord {
    pub fn new(
        coordinates: ResourceCoordinates,
        operation: Operation,
        object: Option<Unstructured>,
        old_object: Option<Unstructured>,
        dry_run: bool,
    ) -> Self {
        Self {
            coordinates,
            operation,
            object,
            old_object,
            dry_run,
            context: RequestContext::default(),
        }
    }

    pub fn for_create(coordinates: ResourceCoordinates, object: Unstructured) -> Self {
        Self::new(coordinates, Operation::Create, Some(object), None, false)
    }

    pub fn for_update(
        coordinates: ResourceCoordinates,
        object: Unstructured,
        old_object: Unstructured,
    ) -> Self {
        Self::new(
            coordinates,
            Operation::Update,
            Some(object),
            Some(old_object),
            false,
        )
    }

    pub fn for_delete(coordinates: ResourceCoordinates) -> Self {
        Self::new(coordinates, Operation::Delete, None, None, false)
    }

    pub fn for_connect(coordinates: ResourceCoordinates, options: Option<Unstructured>) -> Self {
        Self::new(coordinates, Operation::Connect, options, None, false)
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Consume the record and return its object.
    pub fn into_object(self) -> Option<Unstructured> {
        self.object
    }
}

impl Attributes for AttributesRecord {
    fn get_coordinates(&self) -> &ResourceCoordinates {
        &self.coordinates
    }

    fn get_operation(&self) -> Operation {
        self.operation
    }

    fn get_object(&self) -> Option<&Unstructured> {
        self.object.as_ref()
    }

    fn get_object_mut(&mut self) -> Option<&mut Unstructured> {
        self.object.as_mut()
    }

    fn get_old_object(&self) -> Option<&Unstructured> {
        self.old_object.as_ref()
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn get_context(&self) -> &RequestContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinates() -> ResourceCoordinates {
        ResourceCoordinates::new(
            &GroupVersionKind::new("apps", "v1", "Deployment"),
            "deployments",
            "default",
            "web",
        )
    }

    #[test]
    fn test_attributes_record_for_create() {
        let gvk = GroupVersionKind::new("apps", "v1", "Deployment");
        let obj = Unstructured::new(&gvk, "default", "web");
        let attrs = AttributesRecord::for_create(coordinates(), obj);

        assert_eq!(attrs.get_name(), "web");
        assert_eq!(attrs.get_namespace(), "default");
        assert_eq!(attrs.get_operation(), Operation::Create);
        assert_eq!(attrs.get_resource().resource, "deployments");
        assert_eq!(attrs.get_kind(), gvk);
        assert_eq!(attrs.get_subresource(), "");
        assert!(attrs.get_object().is_some());
        assert!(attrs.get_old_object().is_none());
        assert!(!attrs.is_dry_run());
    }

    #[test]
    fn test_delete_has_no_objects() {
        let attrs = AttributesRecord::for_delete(coordinates()).with_dry_run(true);
        assert_eq!(attrs.get_operation(), Operation::Delete);
        assert!(attrs.get_object().is_none());
        assert!(attrs.get_old_object().is_none());
        assert!(attrs.is_dry_run());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = AttributesRecord::for_create(coordinates(), Unstructured::default());
        let mut working = original.clone();
        working.get_object_mut().unwrap().set_name("changed");
        assert_eq!(original.get_object().unwrap().name(), "");
        assert_eq!(working.get_object().unwrap().name(), "changed");
    }

    #[test]
    fn test_coordinates_subresource() {
        let coords = coordinates().with_subresource("status");
        assert_eq!(coords.subresource, "status");
        assert_eq!(coords.group_resource(), GroupResource::new("apps", "deployments"));
    }

    #[test]
    fn test_context_cancellation() {
        let ctx = RequestContext::new();
        assert!(ctx.err().is_ok());
        let shared = ctx.clone();
        shared.cancel();
        assert!(matches!(ctx.err(), Err(AdmissionError::Cancelled)));
    }

    #[test]
    fn test_context_deadline() {
        let ctx = RequestContext::new().with_deadline(Instant::now());
        assert!(matches!(ctx.err(), Err(AdmissionError::DeadlineExceeded)));
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(3600));
        assert!(ctx.err().is_ok());
        assert!(ctx.deadline().is_some());
    }
}

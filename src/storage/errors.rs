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

//! StatusError is the error type of every storage call.
//!
//! The unsupported-operation marker is carried in the Status body as a cause, so
//! [`is_operation_unsupported`] keeps working after the error has been wrapped by other
//! layers or written to the wire and decoded again.

use crate::admission::errors::AdmissionError;
use crate::api::status::{
    Status, StatusCause, StatusDetails, StatusReason, CAUSE_TYPE_OPERATION_UNSUPPORTED,
};
use crate::api::{GroupResource, GroupVersionKind};
use std::error::Error;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StatusError>;

/// StatusError is an error carrying a structured [`Status`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .status.message)]
pub struct StatusError {
    status: Status,
}

impl StatusError {
    pub fn new(status: Status) -> Self {
        Self { status }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn into_status(self) -> Status {
        self.status
    }

    pub fn reason(&self) -> StatusReason {
        self.status.reason
    }

    pub fn code(&self) -> u16 {
        self.status.code
    }

    /// Encode the Status body for the wire.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.status)
    }

    /// Decode a Status body received from the wire.
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body).map(Self::new)
    }

    pub fn not_found(resource: &GroupResource, name: &str) -> Self {
        Self::new(
            Status::failure(
                StatusReason::NotFound,
                format!("{} \"{}\" not found", resource, name),
            )
            .with_details(StatusDetails {
                name: name.to_string(),
                group: resource.group.clone(),
                kind: resource.resource.clone(),
                ..Default::default()
            }),
        )
    }

    pub fn already_exists(resource: &GroupResource, name: &str) -> Self {
        Self::new(
            Status::failure(
                StatusReason::AlreadyExists,
                format!("{} \"{}\" already exists", resource, name),
            )
            .with_details(StatusDetails {
                name: name.to_string(),
                group: resource.group.clone(),
                kind: resource.resource.clone(),
                ..Default::default()
            }),
        )
    }

    pub fn conflict(resource: &GroupResource, name: &str, detail: &str) -> Self {
        Self::new(Status::failure(
            StatusReason::Conflict,
            format!(
                "Operation cannot be fulfilled on {} \"{}\": {}",
                resource, name, detail
            ),
        ))
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(Status::failure(StatusReason::BadRequest, msg))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(Status::failure(
            StatusReason::InternalError,
            format!("Internal error occurred: {}", msg.into()),
        ))
    }

    /// Returns true if this error carries the unsupported-operation marker.
    pub fn is_operation_unsupported(&self) -> bool {
        is_operation_unsupported_status(&self.status)
    }
}

impl From<Status> for StatusError {
    fn from(status: Status) -> Self {
        Self::new(status)
    }
}

/// Build the error returned when `operation` cannot be performed on objects of `kind`.
///
/// The result is a 405 MethodNotAllowed whose details name the kind, group and (when known)
/// the object, plus an `OperationUnsupported` cause naming the operation.
pub fn operation_unsupported(operation: &str, kind: &GroupVersionKind, name: &str) -> StatusError {
    let qualified = if kind.group.is_empty() {
        kind.kind.clone()
    } else {
        format!("{}.{}", kind.kind, kind.group)
    };
    StatusError::new(
        Status::failure(
            StatusReason::MethodNotAllowed,
            format!(
                "{} is not supported on resources of kind \"{}\"",
                operation, qualified
            ),
        )
        .with_details(StatusDetails {
            name: name.to_string(),
            group: kind.group.clone(),
            kind: kind.kind.clone(),
            causes: vec![StatusCause::new(CAUSE_TYPE_OPERATION_UNSUPPORTED, operation)],
        }),
    )
}

/// Returns true if a decoded Status carries the unsupported-operation marker.
pub fn is_operation_unsupported_status(status: &Status) -> bool {
    status.reason == StatusReason::MethodNotAllowed
        && status.has_cause(CAUSE_TYPE_OPERATION_UNSUPPORTED)
}

/// Reports whether `err`, or any error it wraps, is an unsupported-operation failure.
///
/// Follows `Error::source` chains and looks inside aggregated admission errors.
pub fn is_operation_unsupported(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(status_err) = e.downcast_ref::<StatusError>() {
            if status_err.is_operation_unsupported() {
                return true;
            }
        }
        if let Some(status) = e.downcast_ref::<Status>() {
            if is_operation_unsupported_status(status) {
                return true;
            }
        }
        if let Some(admission_err) = e.downcast_ref::<AdmissionError>() {
            match admission_err {
                AdmissionError::Status(status_err) if status_err.is_operation_unsupported() => {
                    return true
                }
                AdmissionError::Aggregate(agg)
                    if agg.errors.iter().any(|inner| is_operation_unsupported(inner)) =>
                {
                    return true
                }
                _ => {}
            }
        }
        current = e.source();
    }
    false
}

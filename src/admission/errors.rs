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

//! Admission error types.

use crate::api::status::{
    Status, StatusCause, StatusDetails, StatusReason, CAUSE_TYPE_ADMISSION_PLUGIN,
};
use crate::storage::errors::StatusError;
use std::fmt;
use thiserror::Error;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// AdmissionError represents errors that can occur during admission.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// BadRequest indicates a malformed request or plugin configuration.
    #[error("{0}")]
    BadRequest(String),

    /// Forbidden indicates the request is not allowed.
    #[error("{0}")]
    Forbidden(ForbiddenError),

    /// Denied is a plugin's plain rejection reason. It surfaces as Forbidden.
    #[error("{0}")]
    Denied(String),

    /// Aggregate represents multiple errors.
    #[error("{0}")]
    Aggregate(AggregateError),

    /// Internal represents an internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// The request was cancelled before admission finished.
    #[error("request was cancelled")]
    Cancelled,

    /// The request deadline passed before admission finished.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// Rejected attributes a failure to the plugin and pass that produced it.
    #[error(transparent)]
    Rejected(RejectionError),

    /// A plugin factory failed; the inner error keeps its class.
    #[error(transparent)]
    Initialization(InitializationError),

    /// Status is an API error surfaced by a collaborator, such as storage.
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl AdmissionError {
    /// Create a new BadRequest error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AdmissionError::BadRequest(msg.into())
    }

    /// Create a new Forbidden error.
    pub fn forbidden(
        name: impl Into<String>,
        namespace: impl Into<String>,
        resource: impl Into<String>,
        field_error: FieldError,
    ) -> Self {
        AdmissionError::Forbidden(ForbiddenError {
            name: name.into(),
            namespace: namespace.into(),
            resource: resource.into(),
            field_error,
        })
    }

    /// Create a plain denial carrying only a reason.
    pub fn denied(reason: impl Into<String>) -> Self {
        AdmissionError::Denied(reason.into())
    }

    /// Create an aggregate error from multiple errors.
    pub fn aggregate(errors: Vec<AdmissionError>) -> Self {
        AdmissionError::Aggregate(AggregateError { errors })
    }

    /// Create an Internal error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        AdmissionError::Internal(msg.into())
    }

    /// Attribute a factory failure to the plugin being built.
    pub fn initializing(self, plugin: impl Into<String>) -> Self {
        AdmissionError::Initialization(InitializationError {
            plugin: plugin.into(),
            source: Box::new(self),
        })
    }

    /// Attribute this error to a plugin and stage.
    pub fn rejected_by(self, plugin: impl Into<String>, stage: Stage) -> Self {
        AdmissionError::Rejected(RejectionError {
            plugin: plugin.into(),
            stage,
            source: Box::new(self),
        })
    }

    /// Returns the plugin a chain rejection is attributed to.
    pub fn rejecting_plugin(&self) -> Option<&str> {
        match self {
            AdmissionError::Rejected(r) => Some(&r.plugin),
            _ => None,
        }
    }

    /// Build the Status body for this error.
    ///
    /// Plain denials become Forbidden; every other error keeps its own class.
    pub fn status(&self) -> Status {
        match self {
            AdmissionError::BadRequest(msg) => Status::failure(StatusReason::BadRequest, msg.clone()),
            AdmissionError::Forbidden(f) => Status::failure(StatusReason::Forbidden, f.to_string())
                .with_details(StatusDetails {
                    name: f.name.clone(),
                    kind: f.resource.clone(),
                    ..Default::default()
                }),
            AdmissionError::Denied(reason) => {
                Status::failure(StatusReason::Forbidden, reason.clone())
            }
            AdmissionError::Aggregate(agg) => {
                let reason = agg
                    .errors
                    .first()
                    .map(|e| e.status().reason)
                    .unwrap_or(StatusReason::InternalError);
                Status::failure(reason, agg.to_string())
            }
            AdmissionError::Internal(_) => {
                Status::failure(StatusReason::InternalError, self.to_string())
            }
            AdmissionError::Cancelled | AdmissionError::DeadlineExceeded => {
                Status::failure(StatusReason::Timeout, self.to_string())
            }
            AdmissionError::Initialization(init) => {
                let mut status = init.source.status();
                status.message = self.to_string();
                status
            }
            AdmissionError::Rejected(r) => {
                let mut status = r.source.status();
                status.message = self.to_string();
                status
                    .details
                    .get_or_insert_with(StatusDetails::default)
                    .causes
                    .push(StatusCause::new(CAUSE_TYPE_ADMISSION_PLUGIN, r.plugin.clone()));
                status
            }
            AdmissionError::Status(e) => e.status().clone(),
        }
    }
}

impl From<AdmissionError> for StatusError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::Status(e) => e,
            other => StatusError::new(other.status()),
        }
    }
}

/// Stage is the chain pass a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Mutate,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Mutate => write!(f, "mutate"),
            Stage::Validate => write!(f, "validate"),
        }
    }
}

/// RejectionError wraps a plugin failure with the plugin name and stage.
#[derive(Debug)]
pub struct RejectionError {
    pub plugin: String,
    pub stage: Stage,
    pub source: Box<AdmissionError>,
}

impl fmt::Display for RejectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "admission plugin \"{}\" failed to {}: {}",
            self.plugin, self.stage, self.source
        )
    }
}

impl std::error::Error for RejectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// InitializationError names the plugin whose factory failed.
#[derive(Debug)]
pub struct InitializationError {
    pub plugin: String,
    pub source: Box<AdmissionError>,
}

impl fmt::Display for InitializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to initialize admission plugin {:?}: {}",
            self.plugin, self.source
        )
    }
}

impl std::error::Error for InitializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// ForbiddenError represents a forbidden admission error with field details.
#[derive(Debug)]
pub struct ForbiddenError {
    pub name: String,
    pub namespace: String,
    pub resource: String,
    pub field_error: FieldError,
}

impl fmt::Display for ForbiddenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" is forbidden: {}",
            self.resource, self.name, self.field_error
        )
    }
}

/// FieldError reports an invalid value in one field of the object.
#[derive(Debug)]
pub struct FieldError {
    pub field: String,
    pub value: String,
    pub detail: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: Invalid value: \"{}\"", self.field, self.value)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Helper function to create an "invalid value" field error.
pub fn field_invalid(field: &str, value: &str, detail: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        value: value.to_string(),
        detail: detail.to_string(),
    }
}

/// AggregateError represents multiple errors.
#[derive(Debug)]
pub struct AggregateError {
    pub errors: Vec<AdmissionError>,
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error_strings: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", error_strings.join(", "))
    }
}

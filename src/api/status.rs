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

//! Status is the structured failure body returned to API callers.
//!
//! Everything callers may branch on (reason, code, causes) is plain serializable data so
//! that it survives being written to the wire and read back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cause type marking a status produced for an operation the storage does not support.
pub const CAUSE_TYPE_OPERATION_UNSUPPORTED: &str = "OperationUnsupported";

/// Cause type carrying the name of the admission plugin that rejected a request.
pub const CAUSE_TYPE_ADMISSION_PLUGIN: &str = "AdmissionPlugin";

/// StatusReason is a machine-readable description of why an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusReason {
    #[default]
    Unknown,
    BadRequest,
    Forbidden,
    NotFound,
    AlreadyExists,
    Conflict,
    MethodNotAllowed,
    Timeout,
    InternalError,
}

impl StatusReason {
    /// HTTP status code associated with the reason.
    pub fn code(&self) -> u16 {
        match self {
            StatusReason::Unknown | StatusReason::InternalError => 500,
            StatusReason::BadRequest => 400,
            StatusReason::Forbidden => 403,
            StatusReason::NotFound => 404,
            StatusReason::MethodNotAllowed => 405,
            StatusReason::AlreadyExists | StatusReason::Conflict => 409,
            StatusReason::Timeout => 504,
        }
    }
}

impl fmt::Display for StatusReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// StatusCause gives one additional detail about a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCause {
    #[serde(rename = "reason")]
    pub cause_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field: String,
}

impl StatusCause {
    pub fn new(cause_type: &str, message: impl Into<String>) -> Self {
        Self {
            cause_type: cause_type.to_string(),
            message: message.into(),
            field: String::new(),
        }
    }
}

/// StatusDetails identifies the resource a failure applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<StatusCause>,
}

/// Status is the body of every failed API response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub message: String,
    pub reason: StatusReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
    pub code: u16,
}

impl Status {
    /// Create a failure status; the code is derived from the reason.
    pub fn failure(reason: StatusReason, message: impl Into<String>) -> Self {
        Self {
            status: "Failure".to_string(),
            message: message.into(),
            reason,
            details: None,
            code: reason.code(),
        }
    }

    pub fn with_details(mut self, details: StatusDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Returns true if any cause carries the given type.
    pub fn has_cause(&self, cause_type: &str) -> bool {
        self.details
            .as_ref()
            .map(|d| d.causes.iter().any(|c| c.cause_type == cause_type))
            .unwrap_or(false)
    }

    /// Returns the message of the first cause with the given type.
    pub fn cause_message(&self, cause_type: &str) -> Option<&str> {
        self.details.as_ref().and_then(|d| {
            d.causes
                .iter()
                .find(|c| c.cause_type == cause_type)
                .map(|c| c.message.as_str())
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Status {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(StatusReason::MethodNotAllowed.code(), 405);
        assert_eq!(StatusReason::Forbidden.code(), 403);
        assert_eq!(StatusReason::Timeout.code(), 504);
        assert_eq!(Status::failure(StatusReason::NotFound, "gone").code, 404);
    }

    #[test]
    fn test_causes_survive_json() {
        let status = Status::failure(StatusReason::MethodNotAllowed, "nope").with_details(
            StatusDetails {
                kind: "Playlist".to_string(),
                causes: vec![StatusCause::new(CAUSE_TYPE_OPERATION_UNSUPPORTED, "create")],
                ..Default::default()
            },
        );
        let json = serde_json::to_string(&status).unwrap();
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
        assert!(back.has_cause(CAUSE_TYPE_OPERATION_UNSUPPORTED));
        assert_eq!(back.cause_message(CAUSE_TYPE_OPERATION_UNSUPPORTED), Some("create"));
        assert!(!back.has_cause(CAUSE_TYPE_ADMISSION_PLUGIN));
    }
}

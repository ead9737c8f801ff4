//! Error taxonomy for request handling.
//!
//! Every failure a handler can hit is an [`ApiError`]. The mapping from error
//! kind to HTTP status lives in exactly one place, [`ApiError::status`], and an
//! error is rendered with [`ApiError::into_response`], which logs it once and
//! writes one JSON envelope.
//!
//! | Kind | Status | Envelope |
//! |---|---|---|
//! | `Decode` | 422 | `{"message"}` |
//! | `Validation` | 422 | `{"message", "errors"}` |
//! | `MissingParameter` | 422 | `{"message"}` |
//! | `NotFound` | 404 | `{"message"}` |
//! | `Internal` | 500 | `{"message"}` |

use crate::codec::{self, DecodeError};
use crate::handler::Response;
use crate::logger::Logger;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to problem description. Empty means valid.
pub type Problems = BTreeMap<String, String>;

/// Errors produced while serving a request.
///
/// Messages accumulate context from the inside out with
/// [`context`](Self::context), so a not-found from the store surfaces as
/// `find plant by id: plant with ID '7' does not exist`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request body was not valid JSON for the expected type.
    #[error("{message}")]
    Decode {
        /// Human-readable message including context.
        message: String,
        /// Underlying decode failure.
        #[source]
        source: DecodeError,
    },

    /// The body decoded but failed validation.
    #[error("{message}")]
    Validation {
        /// Human-readable message including context.
        message: String,
        /// Per-field problems.
        problems: Problems,
    },

    /// A required path parameter was empty.
    #[error("{message}")]
    MissingParameter {
        /// Human-readable message.
        message: String,
    },

    /// The addressed resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Human-readable message including context.
        message: String,
    },

    /// Anything else.
    #[error("{message}")]
    Internal {
        /// Human-readable message including context.
        message: String,
    },
}

impl ApiError {
    /// Wraps a decode failure.
    #[must_use]
    pub fn decode(source: DecodeError) -> Self {
        Self::Decode {
            message: source.to_string(),
            source,
        }
    }

    /// Builds a validation error from a non-empty problem map.
    #[must_use]
    pub fn validation(problems: Problems) -> Self {
        Self::Validation {
            message: format!("invalid input with {} error(-s)", problems.len()),
            problems,
        }
    }

    /// Builds a missing-parameter error.
    #[must_use]
    pub fn missing_parameter(message: impl Into<String>) -> Self {
        Self::MissingParameter {
            message: message.into(),
        }
    }

    /// Builds a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Builds an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Prefixes the message with the name of the failing operation.
    #[must_use]
    pub fn context(mut self, operation: &str) -> Self {
        let message = match &mut self {
            Self::Decode { message, .. }
            | Self::Validation { message, .. }
            | Self::MissingParameter { message }
            | Self::NotFound { message }
            | Self::Internal { message } => message,
        };
        *message = format!("{operation}: {message}");
        self
    }

    /// Returns the message, context included.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Decode { message, .. }
            | Self::Validation { message, .. }
            | Self::MissingParameter { message }
            | Self::NotFound { message }
            | Self::Internal { message } => message,
        }
    }

    /// Returns the per-field problems for validation errors.
    #[must_use]
    pub fn problems(&self) -> Option<&Problems> {
        match self {
            Self::Validation { problems, .. } => Some(problems),
            _ => None,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Decode { .. } | Self::Validation { .. } | Self::MissingParameter { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts to the JSON envelope written to the client.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            message: self.message().to_string(),
            errors: self.problems().cloned(),
        }
    }

    /// Logs the error through `logger` and renders it.
    pub fn into_response(self, logger: &Logger) -> Response {
        logger.error(&self);
        codec::encode(self.status(), &self.to_envelope(), logger)
    }
}

/// JSON error body.
///
/// Serialized as `{"message": ...}`, with an `errors` map only for validation
/// failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Human-readable message.
    pub message: String,

    /// Per-field problems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Problems>,
}

impl ErrorEnvelope {
    /// Creates a generic envelope.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }
}

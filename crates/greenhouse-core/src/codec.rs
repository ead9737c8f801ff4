//! JSON decode, validate and encode helpers.
//!
//! Handlers read request bodies through [`decode`] or [`decode_valid`] and
//! write every response, errors included, through [`encode`].

use crate::error::{ApiError, Problems};
use crate::handler::Response;
use crate::logger::Logger;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Content type of every response body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Failure to turn a request body into a typed value.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Body was empty, malformed, or did not match the target type.
    #[error("decode json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Capability of checking a decoded value's domain rules.
///
/// Returns a map from field name to problem; an empty map means valid.
///
/// ```
/// use greenhouse_core::{Problems, Validate};
///
/// struct Age(i64);
///
/// impl Validate for Age {
///     fn validate(&self) -> Problems {
///         let mut problems = Problems::new();
///         if self.0 < 0 {
///             problems.insert("age".into(), "age cannot be negative".into());
///         }
///         problems
///     }
/// }
///
/// assert!(Age(3).validate().is_empty());
/// ```
pub trait Validate {
    /// Checks the value and reports every problem found.
    fn validate(&self) -> Problems;
}

/// Decodes a JSON body into `T`.
///
/// An empty body is an error.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}

/// Decodes a JSON body into `T` and validates it.
///
/// Decode failures become [`ApiError::Decode`]; validation failures become
/// [`ApiError::Validation`] carrying every problem.
pub fn decode_valid<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = decode(body).map_err(ApiError::decode)?;
    let problems = value.validate();
    if !problems.is_empty() {
        return Err(ApiError::validation(problems));
    }
    Ok(value)
}

/// Writes `value` as a JSON response with `status`.
///
/// If serialization fails the failure is logged through `logger` and the
/// response keeps `status` with an empty body.
pub fn encode<T>(status: StatusCode, value: &T, logger: &Logger) -> Response
where
    T: Serialize + ?Sized,
{
    let body = match serde_json::to_vec(value) {
        Ok(body) => Bytes::from(body),
        Err(err) => {
            logger.error(format_args!("encode json: {err}"));
            Bytes::new()
        }
    };

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

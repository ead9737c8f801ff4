//! Request context types.
//!
//! The [`RequestContext`] carries per-request values from the middleware that
//! creates them down to the handlers and the store. It is immutable: binding a
//! value returns a derived context and leaves the parent untouched.

use crate::logger::Logger;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier minted once per inbound request, using UUID v7.
///
/// UUID v7 combines a millisecond timestamp with 74 random bits, so ids are
/// time-ordered and unique without coordination.
///
/// # Example
///
/// ```
/// use greenhouse_core::TraceId;
///
/// let a = TraceId::new();
/// let b = TraceId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Creates a fresh trace id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a trace id from its hyphenated string form.
    ///
    /// Returns `None` for anything that is not a UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TraceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A typed key for values stored in a [`RequestContext`].
///
/// Each key is its own type, usually a zero-sized struct, so keys declared in
/// different crates can never collide and lookups never need a cast at the
/// call site.
///
/// ```
/// use greenhouse_core::{ContextKey, RequestContext};
///
/// struct TenantKey;
/// impl ContextKey for TenantKey {
///     type Value = String;
/// }
///
/// let ctx = RequestContext::new().with::<TenantKey>("acme".to_string());
/// assert_eq!(ctx.get::<TenantKey>().map(String::as_str), Some("acme"));
/// ```
pub trait ContextKey: 'static {
    /// Type of the value bound under this key.
    type Value: Send + Sync + 'static;
}

/// Key for the request's [`TraceId`].
#[derive(Debug)]
pub struct TraceIdKey;

impl ContextKey for TraceIdKey {
    type Value = TraceId;
}

/// Key for the request-scoped [`Logger`].
#[derive(Debug)]
pub struct LoggerKey;

impl ContextKey for LoggerKey {
    type Value = Logger;
}

struct Binding {
    key: TypeId,
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Binding>>,
}

/// Per-request value carrier.
///
/// Cloning is cheap (one `Arc` bump). Values are attached with
/// [`with`](Self::with), which returns a new context whose lookups see the new
/// binding first; the context it was derived from is unchanged.
///
/// # Example
///
/// ```
/// use greenhouse_core::{RequestContext, TraceId};
///
/// let root = RequestContext::new();
/// let id = TraceId::new();
/// let child = root.with_trace_id(id);
///
/// assert_eq!(child.trace_id(), Some(id));
/// assert_eq!(root.trace_id(), None);
/// ```
#[derive(Clone, Default)]
pub struct RequestContext {
    head: Option<Arc<Binding>>,
}

impl RequestContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self { head: None }
    }

    /// Returns a derived context with `value` bound under `K`.
    ///
    /// An existing binding for `K` is shadowed, not replaced.
    #[must_use]
    pub fn with<K: ContextKey>(&self, value: K::Value) -> Self {
        Self {
            head: Some(Arc::new(Binding {
                key: TypeId::of::<K>(),
                value: Box::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Looks up the most recent value bound under `K`.
    #[must_use]
    pub fn get<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        let mut cursor = self.head.as_deref();
        while let Some(binding) = cursor {
            if binding.key == key {
                return binding.value.downcast_ref::<K::Value>();
            }
            cursor = binding.parent.as_deref();
        }
        None
    }

    /// Returns `true` if a value is bound under `K`.
    #[must_use]
    pub fn contains<K: ContextKey>(&self) -> bool {
        self.get::<K>().is_some()
    }

    /// Returns the trace id, if the tracing stage has run.
    #[must_use]
    pub fn trace_id(&self) -> Option<TraceId> {
        self.get::<TraceIdKey>().copied()
    }

    /// Returns a derived context carrying `trace_id`.
    #[must_use]
    pub fn with_trace_id(&self, trace_id: TraceId) -> Self {
        self.with::<TraceIdKey>(trace_id)
    }

    /// Returns the scoped logger, if one was bound.
    #[must_use]
    pub fn scoped_logger(&self) -> Option<&Logger> {
        self.get::<LoggerKey>()
    }

    /// Returns a derived context carrying `logger`.
    #[must_use]
    pub fn with_logger(&self, logger: Logger) -> Self {
        self.with::<LoggerKey>(logger)
    }

    /// Resolves the logger for this request.
    ///
    /// Never fails: without a scoped logger the `fallback` is returned and a
    /// warning is written through it.
    pub fn logger_or(&self, fallback: &Logger) -> Logger {
        if let Some(logger) = self.scoped_logger() {
            return logger.clone();
        }
        fallback.warn("no request-scoped logger in context, using fallback logger");
        fallback.clone()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("trace_id", &self.trace_id())
            .field("scoped_logger", &self.scoped_logger().is_some())
            .finish_non_exhaustive()
    }
}

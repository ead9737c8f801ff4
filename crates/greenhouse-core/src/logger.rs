//! Structured logger handle.
//!
//! A [`Logger`] wraps a `tracing` span and, for request loggers, a
//! [`TraceId`]. The trace id is written as a `trace_id` field on every event
//! rather than on the span: a span the active filter disables loses its
//! fields, while an enabled event always keeps its own. Loggers are passed
//! explicitly; nothing in the library reaches for a process-wide default.

use crate::context::TraceId;
use std::fmt::Display;
use tracing::field::DisplayValue;
use tracing::Span;

/// Cloneable logger handle.
///
/// `Logger::new()` gives a service-level logger. The tracing middleware derives
/// a per-request child with [`with_trace_id`](Self::with_trace_id).
/// [`Logger::noop`] discards everything.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Option<Span>,
    trace_id: Option<TraceId>,
}

impl Logger {
    /// Creates a service-level logger rooted at a `greenhouse` span.
    #[must_use]
    pub fn new() -> Self {
        Self::from_span(tracing::info_span!("greenhouse"))
    }

    /// Creates a logger that records into `span`.
    #[must_use]
    pub fn from_span(span: Span) -> Self {
        Self {
            span: Some(span),
            trace_id: None,
        }
    }

    /// Creates a logger that drops every event.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            span: None,
            trace_id: None,
        }
    }

    /// Returns `true` for a logger created by [`Logger::noop`].
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.span.is_none()
    }

    /// Derives a child logger that carries `trace_id` on every event.
    ///
    /// The parent is unchanged.
    #[must_use]
    pub fn with_trace_id(&self, trace_id: TraceId) -> Self {
        let span = self
            .span
            .as_ref()
            .map(|parent| tracing::info_span!(parent: parent, "request"));
        Self {
            span,
            trace_id: Some(trace_id),
        }
    }

    /// Returns the trace id this logger was scoped to.
    #[must_use]
    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    /// The trace id as an event field value; `None` records nothing.
    ///
    /// ```
    /// use greenhouse_core::{Logger, TraceId};
    ///
    /// let logger = Logger::new().with_trace_id(TraceId::new());
    /// logger.in_scope(|| tracing::info!(trace_id = logger.trace_field(), status = 200, "done"));
    /// ```
    #[must_use]
    pub fn trace_field(&self) -> Option<DisplayValue<TraceId>> {
        self.trace_id.map(tracing::field::display)
    }

    /// Returns the underlying span.
    #[must_use]
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// Runs `f` inside this logger's span.
    ///
    /// Use it for events with structured fields, passing
    /// [`trace_field`](Self::trace_field) as `trace_id`.
    ///
    /// For a noop logger `f` is not called.
    pub fn in_scope<F: FnOnce()>(&self, f: F) {
        if let Some(span) = &self.span {
            span.in_scope(f);
        }
    }

    /// Emits a debug event.
    pub fn debug(&self, message: impl Display) {
        self.in_scope(|| tracing::debug!(trace_id = self.trace_field(), "{message}"));
    }

    /// Emits an info event.
    pub fn info(&self, message: impl Display) {
        self.in_scope(|| tracing::info!(trace_id = self.trace_field(), "{message}"));
    }

    /// Emits a warning event.
    pub fn warn(&self, message: impl Display) {
        self.in_scope(|| tracing::warn!(trace_id = self.trace_field(), "{message}"));
    }

    /// Emits an error event.
    pub fn error(&self, message: impl Display) {
        self.in_scope(|| tracing::error!(trace_id = self.trace_field(), "{message}"));
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

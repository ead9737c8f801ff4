//! Admin-only access gate.
//!
//! A placeholder that shows how a per-route stage receives its dependencies.
//! It does not check anything and always calls the wrapped handler; a real
//! credential check (e.g. a bearer token comparison) belongs in `process`.

use crate::middleware::{Middleware, Next};
use greenhouse_core::{BoxFuture, Request, RequestContext, Response};

/// Access gate for administrative routes. Currently always passes.
#[derive(Clone)]
pub struct AdminOnly {
    credential: String,
}

impl AdminOnly {
    /// Creates the gate with the credential it would check against.
    #[must_use]
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
        }
    }

    /// Returns `true` if a non-empty credential was configured.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        !self.credential.is_empty()
    }
}

impl std::fmt::Debug for AdminOnly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminOnly")
            .field("credential", &"<redacted>")
            .finish()
    }
}

impl Middleware for AdminOnly {
    fn name(&self) -> &'static str {
        "admin_only"
    }

    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(logger) = ctx.scoped_logger() {
                let configured = self.has_credential();
                logger.in_scope(|| {
                    tracing::debug!(
                        trace_id = logger.trace_field(),
                        credential_configured = configured,
                        "admin gate passed without a check"
                    );
                });
            }
            next.run(ctx, request).await
        })
    }
}

//! The plant API: routes, handlers and middleware in one [`Handler`].
//!
//! ```text
//! tracing -> request log -> router
//!                             ├── GET  {root}/health
//!                             ├── GET  {root}/plants/
//!                             ├── POST {root}/plants/      (admin gate)
//!                             └── GET  {root}/plants/{id}/
//! ```

use std::sync::Arc;

use greenhouse_core::{Handler, Logger};
use greenhouse_middleware::{AdminOnly, Pipeline, RequestLogMiddleware, TracingMiddleware};
use greenhouse_store::Store;
use http::Method;

use crate::handlers;
use crate::router::Router;

/// Credential handed to the admin gate on write routes.
pub const ADMIN_CREDENTIAL: &str = "supersecret";

/// Assembles the plant API.
#[derive(Clone)]
pub struct Api {
    logger: Logger,
    root_prefix: String,
    store: Arc<dyn Store>,
    admin_credential: String,
    trust_request_id: bool,
}

impl Api {
    /// Creates the API over `store`, mounted under `root_prefix`.
    ///
    /// `logger` is the service logger: request loggers are its children and
    /// it is the fallback wherever a context lacks one.
    #[must_use]
    pub fn new(logger: Logger, root_prefix: impl Into<String>, store: Arc<dyn Store>) -> Self {
        Self {
            logger,
            root_prefix: root_prefix.into(),
            store,
            admin_credential: ADMIN_CREDENTIAL.to_string(),
            trust_request_id: false,
        }
    }

    /// Replaces the admin gate credential.
    #[must_use]
    pub fn admin_credential(mut self, credential: impl Into<String>) -> Self {
        self.admin_credential = credential.into();
        self
    }

    /// Reuse a valid incoming `x-request-id` as the trace id.
    #[must_use]
    pub fn trust_request_id(mut self, trust: bool) -> Self {
        self.trust_request_id = trust;
        self
    }

    /// Builds the router with every route registered.
    #[must_use]
    pub fn router(&self) -> Router {
        let logger = &self.logger;
        let store = &self.store;

        let admin = Arc::new(
            Pipeline::builder()
                .stage(AdminOnly::new(self.admin_credential.clone()))
                .build(),
        );

        let mut router = Router::new(self.root_prefix.clone(), logger.clone());
        router.add_route(Method::GET, "/health", handlers::health(logger.clone()));
        router.add_route(
            Method::GET,
            "/plants/",
            handlers::list_plants(Arc::clone(store), logger.clone()),
        );
        router.add_route(
            Method::POST,
            "/plants/",
            admin.into_handler(handlers::create_plant(Arc::clone(store), logger.clone())),
        );
        router.add_route(
            Method::GET,
            "/plants/{id}/",
            handlers::get_plant(Arc::clone(store), logger.clone()),
        );
        router
    }

    /// The global middleware applied to every request.
    #[must_use]
    pub fn global_pipeline(&self) -> Pipeline {
        Pipeline::builder()
            .stage(TracingMiddleware::new(self.logger.clone()).trust_incoming(self.trust_request_id))
            .stage(RequestLogMiddleware::new(self.logger.clone()))
            .build()
    }

    /// Wraps the router in the global pipeline.
    #[must_use]
    pub fn into_handler(self) -> Handler {
        let router = self.router();
        for route in router.describe() {
            self.logger.debug(format_args!("registered route {route}"));
        }
        Arc::new(self.global_pipeline()).into_handler(router.into_handler())
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("root_prefix", &self.root_prefix)
            .field("trust_request_id", &self.trust_request_id)
            .finish_non_exhaustive()
    }
}

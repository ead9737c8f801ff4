//! Health and plant resource handlers.
//!
//! Each constructor captures its dependencies and returns a [`Handler`].
//! Failures become an [`ApiError`](greenhouse_core::ApiError) carrying the
//! operation name, which logs itself once and renders one JSON envelope.
//!
//! | Handler | Success | Failure |
//! |---|---|---|
//! | [`health`] | 200 `""` | - |
//! | [`list_plants`] | 200 array | 500 |
//! | [`get_plant`] | 200 object | 404 / 422 / 500 |
//! | [`create_plant`] | 200 object | 422 / 500 |

use std::sync::Arc;

use greenhouse_core::codec::{decode_valid, encode};
use greenhouse_core::{handler_fn, ApiError, Handler, Logger, Request, RequestContext};
use greenhouse_store::{NewPlant, Store};
use http::StatusCode;

use crate::router::PathParams;

/// Name of the path parameter holding a plant id.
pub const ID_PARAM: &str = "id";

/// Answers 200 with a JSON empty string.
#[must_use]
pub fn health(fallback: Logger) -> Handler {
    handler_fn(move |ctx: RequestContext, _request| {
        let logger = ctx.logger_or(&fallback);
        async move { encode(StatusCode::OK, "", &logger) }
    })
}

/// Lists every plant. An empty store answers `[]`.
#[must_use]
pub fn list_plants(store: Arc<dyn Store>, fallback: Logger) -> Handler {
    handler_fn(move |ctx: RequestContext, _request| {
        let store = Arc::clone(&store);
        let logger = ctx.logger_or(&fallback);
        async move {
            match store.list(&ctx).await {
                Ok(plants) => encode(StatusCode::OK, &plants, &logger),
                Err(err) => err
                    .into_api_error("retrieve all plants")
                    .into_response(&logger),
            }
        }
    })
}

/// Fetches the plant named by the `{id}` path parameter.
#[must_use]
pub fn get_plant(store: Arc<dyn Store>, fallback: Logger) -> Handler {
    handler_fn(move |ctx: RequestContext, request: Request| {
        let store = Arc::clone(&store);
        let logger = ctx.logger_or(&fallback);
        async move {
            let id = path_param(&request, ID_PARAM);
            if id.is_empty() {
                return ApiError::missing_parameter("id is required in path parameters")
                    .into_response(&logger);
            }

            match store.find(&ctx, id).await {
                Ok(plant) => encode(StatusCode::OK, &plant, &logger),
                Err(err) => err.into_api_error("find plant by id").into_response(&logger),
            }
        }
    })
}

/// Decodes, validates and stores a new plant.
///
/// Answers 200 (not 201) with the stored plant, including its assigned id.
#[must_use]
pub fn create_plant(store: Arc<dyn Store>, fallback: Logger) -> Handler {
    handler_fn(move |ctx: RequestContext, request: Request| {
        let store = Arc::clone(&store);
        let logger = ctx.logger_or(&fallback);
        async move {
            let new_plant = match decode_valid::<NewPlant>(request.body()) {
                Ok(plant) => plant,
                Err(err) => return err.context("validation error").into_response(&logger),
            };

            match store.create(&ctx, new_plant).await {
                Ok(plant) => encode(StatusCode::OK, &plant, &logger),
                Err(err) => err
                    .into_api_error("create plant")
                    .into_response(&logger),
            }
        }
    })
}

fn path_param<'a>(request: &'a Request, name: &str) -> &'a str {
    request
        .extensions()
        .get::<PathParams>()
        .and_then(|params| params.get(name))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use greenhouse_core::{BoxFuture, Response, TraceId};
    use greenhouse_store::{MemoryStore, Plant, StoreError};
    use greenhouse_telemetry::capture::capture_logs;
    use http_body_util::BodyExt;

    struct FailingStore;

    impl Store for FailingStore {
        fn list<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Result<Vec<Plant>, StoreError>> {
            Box::pin(async { Err(StoreError::Backend("disk on fire".to_string())) })
        }

        fn find<'a>(
            &'a self,
            _ctx: &'a RequestContext,
            _id: &'a str,
        ) -> BoxFuture<'a, Result<Plant, StoreError>> {
            Box::pin(async { Err(StoreError::Backend("disk on fire".to_string())) })
        }

        fn create<'a>(
            &'a self,
            _ctx: &'a RequestContext,
            _plant: NewPlant,
        ) -> BoxFuture<'a, Result<Plant, StoreError>> {
            Box::pin(async { Err(StoreError::Backend("disk on fire".to_string())) })
        }
    }

    fn memory() -> Arc<dyn Store> {
        Arc::new(MemoryStore::new(Logger::noop()))
    }

    fn scoped_ctx() -> RequestContext {
        RequestContext::new().with_logger(Logger::new().with_trace_id(TraceId::new()))
    }

    fn with_id(id: &str) -> Request {
        let mut request = http::Request::builder()
            .uri(format!("/plants/{id}/"))
            .body(Bytes::new())
            .unwrap();
        let mut params = std::collections::HashMap::new();
        params.insert(ID_PARAM.to_string(), id.to_string());
        request.extensions_mut().insert(PathParams::from(params));
        request
    }

    fn post(body: &str) -> Request {
        http::Request::builder()
            .method(http::Method::POST)
            .uri("/plants/")
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = health(Logger::noop())(scoped_ctx(), Request::new(Bytes::new())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#""""#);
    }

    #[tokio::test]
    async fn test_list_empty_is_array() {
        let response = list_plants(memory(), Logger::noop())(scoped_ctx(), Request::new(Bytes::new())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn test_list_store_failure() {
        let (logs, _guard) = capture_logs();
        let response =
            list_plants(Arc::new(FailingStore), Logger::noop())(scoped_ctx(), Request::new(Bytes::new())).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await,
            r#"{"message":"retrieve all plants: storage backend failure: disk on fire"}"#
        );
        assert_eq!(logs.lines_containing("retrieve all plants").len(), 1);
    }

    #[tokio::test]
    async fn test_get_empty_id() {
        let response = get_plant(memory(), Logger::noop())(scoped_ctx(), with_id("")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_string(response).await,
            r#"{"message":"id is required in path parameters"}"#
        );
    }

    #[tokio::test]
    async fn test_get_missing() {
        let response = get_plant(memory(), Logger::noop())(scoped_ctx(), with_id("123")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_string(response).await,
            r#"{"message":"find plant by id: plant with ID '123' does not exist"}"#
        );
    }

    #[tokio::test]
    async fn test_get_backend_failure() {
        let response = get_plant(Arc::new(FailingStore), Logger::noop())(scoped_ctx(), with_id("1")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = memory();
        let created = create_plant(Arc::clone(&store), Logger::noop())(
            scoped_ctx(),
            post(r#"{"name":"fern","height":3}"#),
        )
        .await;
        assert_eq!(created.status(), StatusCode::OK);
        let plant: Plant = serde_json::from_str(&body_string(created).await).unwrap();
        assert!(!plant.id.is_empty());

        let found = get_plant(store, Logger::noop())(scoped_ctx(), with_id(&plant.id)).await;
        assert_eq!(found.status(), StatusCode::OK);
        let fetched: Plant = serde_json::from_str(&body_string(found).await).unwrap();
        assert_eq!(fetched, plant);
    }

    #[tokio::test]
    async fn test_create_invalid_json() {
        let response = create_plant(memory(), Logger::noop())(scoped_ctx(), post("{")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("validation error: decode json: "));
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_create_invalid_plant() {
        let response =
            create_plant(memory(), Logger::noop())(scoped_ctx(), post(r#"{"name":"","height":-2}"#)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["message"], "validation error: invalid input with 2 error(-s)");
        assert_eq!(body["errors"]["name"], "name cannot be empty");
        assert_eq!(body["errors"]["height"], "height cannot be negative");
    }

    #[tokio::test]
    async fn test_create_store_failure() {
        let response = create_plant(Arc::new(FailingStore), Logger::noop())(
            scoped_ctx(),
            post(r#"{"name":"fern","height":3}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await,
            r#"{"message":"create plant: storage backend failure: disk on fire"}"#
        );
    }
}

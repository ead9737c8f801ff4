//! In-memory store.

use crate::error::StoreError;
use crate::plant::{NewPlant, Plant};
use crate::Store;
use greenhouse_core::{BoxFuture, Logger, RequestContext};
use parking_lot::RwLock;
use uuid::Uuid;

/// Plants held in a vector behind a read/write lock.
///
/// Ids are UUID v7 strings. Nothing survives a restart.
#[derive(Debug)]
pub struct MemoryStore {
    items: RwLock<Vec<Plant>>,
    fallback: Logger,
}

impl MemoryStore {
    /// Creates an empty store.
    ///
    /// `fallback` is used for logging when a call's context has no scoped
    /// logger.
    #[must_use]
    pub fn new(fallback: Logger) -> Self {
        Self::with_items(fallback, Vec::new())
    }

    /// Creates a store seeded with `items`.
    #[must_use]
    pub fn with_items(fallback: Logger, items: Vec<Plant>) -> Self {
        Self {
            items: RwLock::new(items),
            fallback,
        }
    }

    /// Number of stored plants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Store for MemoryStore {
    fn list<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Result<Vec<Plant>, StoreError>> {
        Box::pin(async move { Ok(self.items.read().clone()) })
    }

    fn find<'a>(
        &'a self,
        ctx: &'a RequestContext,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Plant, StoreError>> {
        Box::pin(async move {
            let logger = ctx.logger_or(&self.fallback);
            logger.in_scope(|| {
                tracing::debug!(trace_id = logger.trace_field(), plant_id = id, "looking up plant");
            });

            self.items
                .read()
                .iter()
                .find(|plant| plant.id == id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
        })
    }

    fn create<'a>(
        &'a self,
        ctx: &'a RequestContext,
        plant: NewPlant,
    ) -> BoxFuture<'a, Result<Plant, StoreError>> {
        Box::pin(async move {
            let plant = plant.into_plant(Uuid::now_v7().to_string());
            self.items.write().push(plant.clone());

            let logger = ctx.logger_or(&self.fallback);
            logger.in_scope(|| {
                tracing::debug!(trace_id = logger.trace_field(), plant_id = %plant.id, "created plant");
            });
            Ok(plant)
        })
    }
}

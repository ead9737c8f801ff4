//! # Greenhouse Store
//!
//! The plant model and the storage capability the handlers depend on.
//!
//! - [`Plant`] / [`NewPlant`] - The resource and its creation payload
//! - [`Store`] - Object-safe storage trait, shared as `Arc<dyn Store>`
//! - [`MemoryStore`] - In-process implementation behind a read/write lock
//! - [`StoreError`] - Failures, with not-found distinguished from the rest

#![doc(html_root_url = "https://docs.rs/greenhouse-store/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod memory;
mod plant;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use plant::{NewPlant, Plant};

use greenhouse_core::{BoxFuture, RequestContext};

/// Storage for plants.
///
/// Methods take the request context so implementations can log through the
/// request's scoped logger.
pub trait Store: Send + Sync + 'static {
    /// Returns every plant, in insertion order.
    fn list<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Result<Vec<Plant>, StoreError>>;

    /// Returns the plant with `id`, or [`StoreError::NotFound`].
    fn find<'a>(
        &'a self,
        ctx: &'a RequestContext,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Plant, StoreError>>;

    /// Persists `plant` under a freshly assigned id and returns it.
    fn create<'a>(
        &'a self,
        ctx: &'a RequestContext,
        plant: NewPlant,
    ) -> BoxFuture<'a, Result<Plant, StoreError>>;
}

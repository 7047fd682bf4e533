//! Document persistence contract consumed by the repositories.
//!
//! Two implementations are provided:
//! - [`RedisStore`] - RedisJSON documents, with every membership mutation run
//!   as a single Lua script so the read and the write cannot be split.
//! - [`MemoryStore`] - an in-process map guarded by a mutex, used by tests and
//!   by the CLI's `--memory` mode.
//!
//! Neither keeps a cache: every read observes the latest committed write.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use serde_json::Value;

use crate::{
    errors::RepoError,
    pagination::Window,
    types::{Entity, SetOperation},
};

#[allow(async_fn_in_trait)]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    async fn find_by_id<T: Entity>(&self, id: &str) -> Result<Option<T>, RepoError>;

    /// Load several documents, skipping missing ids and keeping input order.
    async fn find_many<T: Entity>(&self, ids: &[String]) -> Result<Vec<T>, RepoError>;

    /// Look up an entity by one of its unique fields.
    async fn find_by_unique<T: Entity>(&self, field: &str, value: &str) -> Result<Option<T>, RepoError>;

    /// Insert a new entity, assigning its insertion sequence.
    ///
    /// Fails with [`RepoError::ReferenceNotFound`] when a reference field does not
    /// resolve and with [`RepoError::UniqueConstraintViolation`] on a unique clash.
    async fn insert<T: Entity>(&self, entity: T) -> Result<T, RepoError>;

    /// Atomically apply `operation` to the array `field` of entity `id`.
    /// Returns `None` when no such entity exists.
    async fn update_set_field<T: Entity>(
        &self,
        id: &str,
        field: &str,
        operation: SetOperation,
    ) -> Result<Option<T>, RepoError>;

    /// Entities ordered by insertion sequence, sliced by `window`.
    async fn list_paginated<T: Entity>(&self, window: &Window) -> Result<Vec<T>, RepoError>;

    /// Entities whose indexed `field` equals or contains `value`, in insertion order.
    async fn find_where_array_contains<T: Entity>(&self, field: &str, value: &str) -> Result<Vec<T>, RepoError>;

    async fn count_where_contains<T: Entity>(&self, field: &str, value: &str) -> Result<u64, RepoError>;

    async fn count<T: Entity>(&self) -> Result<u64, RepoError>;
}

pub(crate) fn decode_document<T: Entity>(document: Value) -> Result<T, RepoError> {
    serde_json::from_value(document).map_err(|err| RepoError::other(format!("failed to deserialize entity: {err}")))
}

pub(crate) fn encode_document<T: Entity>(entity: &T) -> Result<Value, RepoError> {
    serde_json::to_value(entity).map_err(|err| RepoError::other(format!("failed to serialize entity: {err}")))
}

pub(crate) fn ensure_indexed<T: Entity>(field: &str) -> Result<(), RepoError> {
    if T::DESCRIPTOR.is_indexed(field) {
        Ok(())
    } else {
        Err(RepoError::InvalidRequest {
            message: format!("'{field}' is not an indexed field of {}", T::DESCRIPTOR.collection),
        })
    }
}

use redis::{aio::ConnectionManager, cmd};

use super::{DocumentStore, decode_document, encode_document, ensure_indexed};
use crate::{
    errors::RepoError,
    keys::KeyContext,
    pagination::{SortOrder, Window},
    runtime::{
        commands::{MutationCommand, build_entity_insert, build_set_mutation},
        execute_command,
    },
    types::{Entity, SetOperation},
};

/// Service segment of every key written by this store.
pub const SERVICE: &str = "social";

/// RedisJSON-backed document store.
///
/// Cloning is cheap: the multiplexed [`ConnectionManager`] is shared.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    /// Connect to the server at `url` and namespace all keys under `prefix`.
    ///
    /// # Example
    /// ```ignore
    /// let store = RedisStore::connect("redis://localhost:6379", "murmur").await?;
    /// ```
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, RepoError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, prefix))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Delete every key under this store's namespace. Returns the number removed.
    pub async fn purge(&self) -> Result<u64, RepoError> {
        const SCAN_COUNT: usize = 1000;
        let mut conn = self.conn.clone();
        let pattern = self.keys().pattern();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            if !keys.is_empty() {
                let deleted: u64 = cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                removed += deleted;
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        log::debug!("purged {removed} keys matching {pattern}");
        Ok(removed)
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix, SERVICE)
    }

    async fn load_sorted_by_seq<T: Entity>(&self, ids: &[String]) -> Result<Vec<T>, RepoError> {
        let mut items: Vec<T> = self.find_many(ids).await?;
        items.sort_by_key(|item| item.seq());
        Ok(items)
    }
}

impl DocumentStore for RedisStore {
    async fn find_by_id<T: Entity>(&self, id: &str) -> Result<Option<T>, RepoError> {
        let mut conn = self.conn.clone();
        let key = self.keys().entity(T::DESCRIPTOR.collection, id);
        let result: Option<String> = cmd("JSON.GET").arg(&key).query_async(&mut conn).await?;
        match result {
            Some(json) => {
                let value = serde_json::from_str::<T>(&json)
                    .map_err(|err| RepoError::other(format!("failed to deserialize entity: {err}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn find_many<T: Entity>(&self, ids: &[String]) -> Result<Vec<T>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let keys = self.keys();
        let mut command = cmd("JSON.MGET");
        for id in ids {
            command.arg(keys.entity(T::DESCRIPTOR.collection, id));
        }
        command.arg("$");
        let raw: Vec<Option<String>> = command.query_async(&mut conn).await?;

        let mut items = Vec::with_capacity(raw.len());
        for json in raw.into_iter().flatten() {
            let mut documents: Vec<T> = serde_json::from_str(&json)
                .map_err(|err| RepoError::other(format!("failed to deserialize entity: {err}")))?;
            if !documents.is_empty() {
                items.push(documents.swap_remove(0));
            }
        }
        Ok(items)
    }

    async fn find_by_unique<T: Entity>(&self, field: &str, value: &str) -> Result<Option<T>, RepoError> {
        let unique = T::DESCRIPTOR.unique_field(field).ok_or_else(|| RepoError::InvalidRequest {
            message: format!("'{field}' is not a unique field of {}", T::DESCRIPTOR.collection),
        })?;
        let mut conn = self.conn.clone();
        let key = self
            .keys()
            .unique(T::DESCRIPTOR.collection, field, &unique.normalize(value));
        let owner: Option<String> = cmd("GET").arg(&key).query_async(&mut conn).await?;
        match owner {
            Some(id) => self.find_by_id(&id).await,
            None => Ok(None),
        }
    }

    async fn insert<T: Entity>(&self, entity: T) -> Result<T, RepoError> {
        let payload = encode_document(&entity)?;
        let command = build_entity_insert(&self.keys(), &T::DESCRIPTOR, entity.id(), &payload)?;
        log::debug!("inserting {} '{}'", T::DESCRIPTOR.collection, entity.id());

        let mut conn = self.conn.clone();
        match execute_command(&mut conn, &MutationCommand::InsertEntity(command)).await? {
            Some(document) => decode_document(document),
            None => Err(RepoError::other("insert script returned no document")),
        }
    }

    async fn update_set_field<T: Entity>(
        &self,
        id: &str,
        field: &str,
        operation: SetOperation,
    ) -> Result<Option<T>, RepoError> {
        let command = build_set_mutation(&self.keys(), &T::DESCRIPTOR, id, field, operation)?;
        log::debug!("mutating {}.{} on '{}'", T::DESCRIPTOR.collection, field, id);

        let mut conn = self.conn.clone();
        execute_command(&mut conn, &MutationCommand::MutateSet(command))
            .await?
            .map(decode_document::<T>)
            .transpose()
    }

    async fn list_paginated<T: Entity>(&self, window: &Window) -> Result<Vec<T>, RepoError> {
        let Some((start, stop)) = window.rank_range() else {
            return Ok(Vec::new());
        };
        let mut conn = self.conn.clone();
        let order_key = self.keys().order(T::DESCRIPTOR.collection);
        let command_name = match window.order {
            SortOrder::Asc => "ZRANGE",
            SortOrder::Desc => "ZREVRANGE",
        };
        let ids: Vec<String> = cmd(command_name)
            .arg(&order_key)
            .arg(start)
            .arg(stop)
            .query_async(&mut conn)
            .await?;
        self.find_many(&ids).await
    }

    async fn find_where_array_contains<T: Entity>(&self, field: &str, value: &str) -> Result<Vec<T>, RepoError> {
        ensure_indexed::<T>(field)?;
        let mut conn = self.conn.clone();
        let key = self.keys().reverse_relation(T::DESCRIPTOR.collection, field, value);
        let ids: Vec<String> = cmd("SMEMBERS").arg(&key).query_async(&mut conn).await?;
        self.load_sorted_by_seq(&ids).await
    }

    async fn count_where_contains<T: Entity>(&self, field: &str, value: &str) -> Result<u64, RepoError> {
        ensure_indexed::<T>(field)?;
        let mut conn = self.conn.clone();
        let key = self.keys().reverse_relation(T::DESCRIPTOR.collection, field, value);
        let total: u64 = cmd("SCARD").arg(&key).query_async(&mut conn).await?;
        Ok(total)
    }

    async fn count<T: Entity>(&self) -> Result<u64, RepoError> {
        let mut conn = self.conn.clone();
        let total: u64 = cmd("ZCARD")
            .arg(self.keys().order(T::DESCRIPTOR.collection))
            .query_async(&mut conn)
            .await?;
        Ok(total)
    }
}

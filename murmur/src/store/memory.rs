use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;

use super::{DocumentStore, decode_document, encode_document, ensure_indexed};
use crate::{
    errors::RepoError,
    pagination::{SortOrder, Window},
    types::{Entity, SetOperation, field_values},
};

/// In-process document store with the same semantics as the Redis store.
///
/// Every operation takes the lock, completes synchronously and releases it
/// before returning, so no lock is ever held across an await point.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<&'static str, MemoryCollection>,
}

#[derive(Default)]
struct MemoryCollection {
    sequence: u64,
    documents: HashMap<String, Value>,
    /// seq -> id
    order: BTreeMap<u64, String>,
    /// (field, normalized value) -> owner id
    unique: HashMap<(String, String), String>,
}

impl MemoryCollection {
    fn in_order(&self) -> impl DoubleEndedIterator<Item = &Value> {
        self.order.values().filter_map(|id| self.documents.get(id))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MemoryState {
    fn collection(&mut self, name: &'static str) -> &mut MemoryCollection {
        self.collections.entry(name).or_default()
    }

    fn contains(&self, collection: &str, id: &str) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|c| c.documents.contains_key(id))
    }
}

impl DocumentStore for MemoryStore {
    async fn find_by_id<T: Entity>(&self, id: &str) -> Result<Option<T>, RepoError> {
        let mut state = self.lock();
        let document = state.collection(T::DESCRIPTOR.collection).documents.get(id).cloned();
        document.map(decode_document::<T>).transpose()
    }

    async fn find_many<T: Entity>(&self, ids: &[String]) -> Result<Vec<T>, RepoError> {
        let mut state = self.lock();
        let collection = state.collection(T::DESCRIPTOR.collection);
        ids.iter()
            .filter_map(|id| collection.documents.get(id).cloned())
            .map(decode_document::<T>)
            .collect()
    }

    async fn find_by_unique<T: Entity>(&self, field: &str, value: &str) -> Result<Option<T>, RepoError> {
        let unique = T::DESCRIPTOR.unique_field(field).ok_or_else(|| RepoError::InvalidRequest {
            message: format!("'{field}' is not a unique field of {}", T::DESCRIPTOR.collection),
        })?;
        let mut state = self.lock();
        let collection = state.collection(T::DESCRIPTOR.collection);
        let document = collection
            .unique
            .get(&(field.to_string(), unique.normalize(value)))
            .and_then(|id| collection.documents.get(id))
            .cloned();
        document.map(decode_document::<T>).transpose()
    }

    async fn insert<T: Entity>(&self, entity: T) -> Result<T, RepoError> {
        let descriptor = T::DESCRIPTOR;
        let mut payload = encode_document(&entity)?;
        let mut state = self.lock();

        for reference in descriptor.references {
            for target_id in field_values(&payload, reference.field) {
                if !state.contains(reference.target, &target_id) {
                    return Err(RepoError::ReferenceNotFound {
                        field: reference.field.to_string(),
                        entity_id: target_id,
                    });
                }
            }
        }

        let collection = state.collection(descriptor.collection);
        let mut claims = Vec::with_capacity(descriptor.unique.len());
        for constraint in descriptor.unique {
            let value = payload
                .get(constraint.field)
                .and_then(Value::as_str)
                .ok_or_else(|| RepoError::InvalidRequest {
                    message: format!("unique field '{}' must be a string", constraint.field),
                })?;
            let claim = (constraint.field.to_string(), constraint.normalize(value));
            if let Some(owner) = collection.unique.get(&claim) {
                return Err(RepoError::UniqueConstraintViolation {
                    field: constraint.field.to_string(),
                    value: value.to_string(),
                    existing_entity_id: owner.clone(),
                });
            }
            claims.push(claim);
        }

        let id = entity.id().to_string();
        if collection.documents.contains_key(&id) {
            return Err(RepoError::InvalidRequest {
                message: format!("entity '{id}' already exists"),
            });
        }

        collection.sequence += 1;
        let seq = collection.sequence;
        payload["seq"] = Value::from(seq);
        for claim in claims {
            collection.unique.insert(claim, id.clone());
        }
        collection.order.insert(seq, id.clone());
        collection.documents.insert(id, payload.clone());
        log::debug!("inserted {} #{seq}", descriptor.collection);

        decode_document(payload)
    }

    async fn update_set_field<T: Entity>(
        &self,
        id: &str,
        field: &str,
        operation: SetOperation,
    ) -> Result<Option<T>, RepoError> {
        if !T::DESCRIPTOR.is_set_field(field) {
            return Err(RepoError::InvalidRequest {
                message: format!("'{field}' is not a set field of {}", T::DESCRIPTOR.collection),
            });
        }
        let mut state = self.lock();
        let Some(document) = state.collection(T::DESCRIPTOR.collection).documents.get_mut(id) else {
            return Ok(None);
        };
        let next = operation.apply(&field_values(document, field));
        document[field] = Value::from(next);
        decode_document(document.clone()).map(Some)
    }

    async fn list_paginated<T: Entity>(&self, window: &Window) -> Result<Vec<T>, RepoError> {
        let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
        let mut state = self.lock();
        let collection = state.collection(T::DESCRIPTOR.collection);
        let page: Vec<Value> = match window.order {
            SortOrder::Asc => collection.in_order().skip(skip).take(limit).cloned().collect(),
            SortOrder::Desc => collection.in_order().rev().skip(skip).take(limit).cloned().collect(),
        };
        page.into_iter().map(decode_document::<T>).collect()
    }

    async fn find_where_array_contains<T: Entity>(&self, field: &str, value: &str) -> Result<Vec<T>, RepoError> {
        ensure_indexed::<T>(field)?;
        let mut state = self.lock();
        let matches: Vec<Value> = state
            .collection(T::DESCRIPTOR.collection)
            .in_order()
            .filter(|document| field_values(document, field).iter().any(|item| item == value))
            .cloned()
            .collect();
        matches.into_iter().map(decode_document::<T>).collect()
    }

    async fn count_where_contains<T: Entity>(&self, field: &str, value: &str) -> Result<u64, RepoError> {
        ensure_indexed::<T>(field)?;
        let mut state = self.lock();
        let total = state
            .collection(T::DESCRIPTOR.collection)
            .in_order()
            .filter(|document| field_values(document, field).iter().any(|item| item == value))
            .count();
        Ok(total as u64)
    }

    async fn count<T: Entity>(&self) -> Result<u64, RepoError> {
        let mut state = self.lock();
        Ok(state.collection(T::DESCRIPTOR.collection).documents.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        id::generate_entity_id,
        models::{Post, User},
        pagination::compute_window,
    };
    use chrono::Utc;

    fn user(username: &str) -> User {
        User {
            id: generate_entity_id(),
            seq: 0,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            display_name: username.to_string(),
            password_hash: "hash".to_string(),
            following: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn post(author: &str, title: &str) -> Post {
        Post {
            id: generate_entity_id(),
            seq: 0,
            title: title.to_string(),
            content: "body".to_string(),
            author: author.to_string(),
            published_at: Utc::now(),
            liked_by: Vec::new(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_sequence() {
        let store = MemoryStore::new();
        let first = store.insert(user("alice")).await.expect("alice");
        let second = store.insert(user("bob")).await.expect("bob");
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(store.count::<User>().await.unwrap(), 2);

        let fetched: User = store.find_by_id(&second.id).await.unwrap().expect("bob exists");
        assert_eq!(fetched, second);
    }

    #[tokio::test]
    async fn unique_username_is_case_insensitive() {
        let store = MemoryStore::new();
        let alice = store.insert(user("alice")).await.expect("alice");
        let err = store.insert(user("ALICE")).await.expect_err("duplicate");
        assert!(matches!(
            err,
            RepoError::UniqueConstraintViolation { ref existing_entity_id, .. } if *existing_entity_id == alice.id
        ));

        let found: Option<User> = store.find_by_unique("username", "Alice").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
        assert!(store.find_by_unique::<User>("email", "x").await.is_err());
    }

    #[tokio::test]
    async fn post_insert_requires_existing_author() {
        let store = MemoryStore::new();
        let err = store.insert(post(&generate_entity_id(), "orphan")).await.expect_err("no author");
        assert!(matches!(err, RepoError::ReferenceNotFound { .. }));
        assert_eq!(store.count::<Post>().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_set_field_returns_none_for_unknown_id() {
        let store = MemoryStore::new();
        let result: Option<Post> = store
            .update_set_field("missing", Post::LIKED_BY, SetOperation::toggle("u1"))
            .await
            .unwrap();
        assert!(result.is_none());

        let err = store
            .update_set_field::<Post>("missing", "title", SetOperation::toggle("u1"))
            .await
            .expect_err("title is not a set field");
        assert!(matches!(err, RepoError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn lists_by_sequence_in_both_directions() {
        let store = MemoryStore::new();
        let author = store.insert(user("alice")).await.unwrap();
        for title in ["P1", "P2", "P3"] {
            store.insert(post(&author.id, title)).await.unwrap();
        }

        let titles = |posts: Vec<Post>| posts.into_iter().map(|p| p.title).collect::<Vec<_>>();
        let asc = store.list_paginated::<Post>(&compute_window(2, 1, SortOrder::Asc)).await.unwrap();
        assert_eq!(titles(asc), vec!["P1", "P2"]);
        let desc = store.list_paginated::<Post>(&compute_window(2, 1, SortOrder::Desc)).await.unwrap();
        assert_eq!(titles(desc), vec!["P3", "P2"]);
        let tail = store.list_paginated::<Post>(&compute_window(2, 2, SortOrder::Asc)).await.unwrap();
        assert_eq!(titles(tail), vec!["P3"]);
        let empty = store.list_paginated::<Post>(&compute_window(0, 1, SortOrder::Asc)).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn reverse_lookup_scans_arrays_and_scalars() {
        let store = MemoryStore::new();
        let alice = store.insert(user("alice")).await.unwrap();
        let bob = store.insert(user("bob")).await.unwrap();
        store
            .update_set_field::<User>(
                &bob.id,
                User::FOLLOWING,
                SetOperation::Insert {
                    value: alice.id.clone(),
                    strip: vec![bob.id.clone()],
                },
            )
            .await
            .unwrap();
        store.insert(post(&alice.id, "hello")).await.unwrap();

        let followers: Vec<User> = store.find_where_array_contains(User::FOLLOWING, &alice.id).await.unwrap();
        assert_eq!(followers.into_iter().map(|u| u.id).collect::<Vec<_>>(), vec![bob.id.clone()]);
        assert_eq!(store.count_where_contains::<Post>(Post::AUTHOR, &alice.id).await.unwrap(), 1);
        assert!(store.find_where_array_contains::<Post>("title", "hello").await.is_err());
    }
}

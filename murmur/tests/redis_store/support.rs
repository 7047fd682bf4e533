pub(crate) use chrono::Utc;
pub(crate) use murmur::{
    RedisStore, RepoError,
    id::generate_entity_id,
    models::{Post, User},
    store::DocumentStore,
    types::SetOperation,
};
pub(crate) use serial_test::serial;
pub(crate) use std::sync::atomic::{AtomicUsize, Ordering};

static TEST_NAMESPACE_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string())
}

/// An isolated key prefix, purged when the test finishes with it.
pub(crate) struct TestNamespace {
    pub(crate) store: RedisStore,
}

impl TestNamespace {
    pub(crate) async fn unique() -> Self {
        let idx = TEST_NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
        let salt = generate_entity_id();
        let prefix = format!("murmur_test_{idx}_{}", &salt[..8]);
        let store = RedisStore::connect(&redis_url(), prefix).await.expect("redis store");
        Self { store }
    }

    pub(crate) async fn finish(self) {
        self.store.purge().await.expect("purge namespace");
    }
}

pub(crate) fn user(username: &str) -> User {
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

pub(crate) fn post(author: &str, title: &str) -> Post {
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

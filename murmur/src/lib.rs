//! Murmur social-content engine.
//!
//! Users publish posts, follow one another and like posts. State lives in
//! RedisJSON documents ([`store::RedisStore`]) or in process
//! ([`store::MemoryStore`]); all set-membership changes are applied atomically
//! by the store. [`api::Facade`] is the entry point.
//!
//! ```ignore
//! let config = MurmurConfig::load(None)?;
//! let store = RedisStore::connect(&config.redis.url, config.redis.prefix.clone()).await?;
//! let facade = Facade::new(store, config.signer());
//! let token = facade.register("alice", "alice@example.com", "secret1").await?.token;
//! let post = facade.publish_post("Hello", "first post", &token).await?;
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod errors;
pub mod id;
pub mod keys;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod runtime;
pub mod store;
pub mod types;
pub mod validators;

pub use api::{Envelope, Facade, PostView, Request, Response, UserView};
pub use auth::{AuthGate, Caller, TokenSigner};
pub use config::{ConfigError, MurmurConfig};
pub use errors::{ErrorKind, RepoError, ServiceError, ServiceResult, ValidationError, ValidationIssue};
pub use models::{Post, User};
pub use pagination::{SortOrder, Window, compute_window};
pub use store::{DocumentStore, MemoryStore, RedisStore};

pub use redis;

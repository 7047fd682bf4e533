//! Persisted records for the two collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Entity, EntityDescriptor, ReferenceField, UniqueField};

pub const USERS: &str = "users";
pub const POSTS: &str = "posts";

/// A registered account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    /// Unique username (case-insensitive)
    pub username: String,
    pub email: String,
    pub display_name: String,
    /// Argon2 PHC string. Never leaves the store layer through a view.
    pub password_hash: String,
    /// Ids of followed users, in follow order.
    #[serde(default)]
    pub following: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const FOLLOWING: &'static str = "following";

    pub fn following_count(&self) -> u64 {
        self.following.len() as u64
    }
}

impl Entity for User {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        collection: USERS,
        unique: &[UniqueField {
            field: "username",
            case_insensitive: true,
        }],
        references: &[],
        indexed: &[User::FOLLOWING],
        set_fields: &[User::FOLLOWING],
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn seq(&self) -> u64 {
        self.seq
    }
}

/// A published post.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub title: String,
    pub content: String,
    /// The author of this post
    pub author: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub liked_by: Vec<String>,
}

impl Post {
    pub const AUTHOR: &'static str = "author";
    pub const LIKED_BY: &'static str = "liked_by";

    pub fn like_count(&self) -> u64 {
        self.liked_by.len() as u64
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.liked_by.iter().any(|id| id == user_id)
    }
}

impl Entity for Post {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        collection: POSTS,
        unique: &[],
        references: &[ReferenceField {
            field: Post::AUTHOR,
            target: USERS,
        }],
        indexed: &[Post::AUTHOR],
        set_fields: &[Post::LIKED_BY],
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn seq(&self) -> u64 {
        self.seq
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Post, User};

/// Client-facing post representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub liked_by: Vec<String>,
    pub like_count: u64,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        let like_count = post.like_count();
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author: post.author,
            published_at: post.published_at,
            liked_by: post.liked_by,
            like_count,
        }
    }
}

/// Client-facing user representation. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub following: Vec<String>,
    pub following_count: u64,
    pub follower_count: u64,
    pub post_count: u64,
}

impl UserView {
    pub fn new(user: User, follower_count: u64, post_count: u64) -> Self {
        let following_count = user.following_count();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            following: user.following,
            following_count,
            follower_count,
            post_count,
        }
    }
}

/// Session token returned by `register` and `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub token: String,
}

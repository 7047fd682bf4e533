use chrono::Utc;

use crate::{
    errors::{RepoError, ServiceError, ServiceResult},
    id::{ensure_entity_id, generate_entity_id},
    models::{Post, User},
    pagination::Window,
    repository::{PostRepo, UserRepo},
    store::DocumentStore,
};

/// Publishing and reading posts.
#[derive(Clone)]
pub struct ContentEngine<S> {
    posts: PostRepo<S>,
    users: UserRepo<S>,
}

impl<S: DocumentStore> ContentEngine<S> {
    pub fn new(posts: PostRepo<S>, users: UserRepo<S>) -> Self {
        Self { posts, users }
    }

    pub async fn publish(&self, author: &User, title: &str, content: &str) -> ServiceResult<Post> {
        let post = Post {
            id: generate_entity_id(),
            seq: 0,
            title: title.to_string(),
            content: content.to_string(),
            author: author.id.clone(),
            published_at: Utc::now(),
            liked_by: Vec::new(),
        };
        let post = self.posts.insert(post).await.map_err(|err| match err {
            RepoError::ReferenceNotFound { .. } => ServiceError::not_found("Author not found"),
            other => other.into(),
        })?;
        log::info!("user '{}' published post '{}'", author.id, post.id);
        Ok(post)
    }

    pub async fn find(&self, post_id: &str) -> ServiceResult<Option<Post>> {
        ensure_entity_id("id", post_id)?;
        Ok(self.posts.find(post_id).await?)
    }

    pub async fn page(&self, window: &Window) -> ServiceResult<Vec<Post>> {
        Ok(self.posts.list(window).await?)
    }

    pub async fn total(&self) -> ServiceResult<u64> {
        Ok(self.posts.count().await?)
    }

    /// Posts written by `author_id`, oldest first.
    pub async fn posts_by(&self, author_id: &str) -> ServiceResult<Vec<Post>> {
        ensure_entity_id("userId", author_id)?;
        Ok(self.posts.by_author(author_id).await?)
    }

    pub async fn count_by(&self, author_id: &str) -> ServiceResult<u64> {
        Ok(self.posts.count_by_author(author_id).await?)
    }

    pub async fn author(&self, post: &Post) -> ServiceResult<Option<User>> {
        Ok(self.users.find(&post.author).await?)
    }

    /// Users who liked `post`, in like order.
    pub async fn likers(&self, post: &Post) -> ServiceResult<Vec<User>> {
        Ok(self.users.find_many(&post.liked_by).await?)
    }
}

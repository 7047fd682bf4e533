use crate::{
    errors::{ServiceError, ServiceResult},
    id::ensure_entity_id,
    models::Post,
    repository::PostRepo,
    store::DocumentStore,
    types::SetOperation,
};

/// Like/unlike toggling on posts.
#[derive(Clone)]
pub struct EngagementEngine<S> {
    posts: PostRepo<S>,
}

impl<S: DocumentStore> EngagementEngine<S> {
    pub fn new(posts: PostRepo<S>) -> Self {
        Self { posts }
    }

    /// Flip `user_id`'s membership in the post's `liked_by` set.
    ///
    /// The store applies the toggle atomically, so concurrent toggles by
    /// different users on one post never lose an update.
    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> ServiceResult<Post> {
        ensure_entity_id("postId", post_id)?;
        let post = self
            .posts
            .update_liked_by(post_id, SetOperation::toggle(user_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("Post not found"))?;

        let state = if post.is_liked_by(user_id) { "liked" } else { "unliked" };
        log::info!("user '{user_id}' {state} post '{post_id}' ({} likes)", post.like_count());
        Ok(post)
    }
}

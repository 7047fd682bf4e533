use crate::{
    errors::RepoError,
    models::Post,
    pagination::Window,
    store::DocumentStore,
    types::SetOperation,
};

/// Content store adapter over the `posts` collection.
#[derive(Clone)]
pub struct PostRepo<S> {
    store: S,
}

impl<S: DocumentStore> PostRepo<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn find(&self, post_id: &str) -> Result<Option<Post>, RepoError> {
        self.store.find_by_id(post_id).await
    }

    /// Fails with [`RepoError::ReferenceNotFound`] when the author does not exist.
    pub async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        self.store.insert(post).await
    }

    pub async fn list(&self, window: &Window) -> Result<Vec<Post>, RepoError> {
        self.store.list_paginated(window).await
    }

    pub async fn update_liked_by(&self, post_id: &str, operation: SetOperation) -> Result<Option<Post>, RepoError> {
        self.store.update_set_field(post_id, Post::LIKED_BY, operation).await
    }

    pub async fn by_author(&self, author_id: &str) -> Result<Vec<Post>, RepoError> {
        self.store.find_where_array_contains(Post::AUTHOR, author_id).await
    }

    pub async fn count_by_author(&self, author_id: &str) -> Result<u64, RepoError> {
        self.store.count_where_contains::<Post>(Post::AUTHOR, author_id).await
    }

    pub async fn count(&self) -> Result<u64, RepoError> {
        self.store.count::<Post>().await
    }
}

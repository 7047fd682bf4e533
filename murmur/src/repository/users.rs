use crate::{
    errors::RepoError,
    models::User,
    store::DocumentStore,
    types::SetOperation,
};

/// Identity store adapter over the `users` collection.
#[derive(Clone)]
pub struct UserRepo<S> {
    store: S,
}

impl<S: DocumentStore> UserRepo<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<User>, RepoError> {
        self.store.find_by_id(user_id).await
    }

    /// Users for `ids`, in the same order, skipping ids that do not resolve.
    pub async fn find_many(&self, ids: &[String]) -> Result<Vec<User>, RepoError> {
        self.store.find_many(ids).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.store.find_by_unique("username", username).await
    }

    pub async fn insert(&self, user: User) -> Result<User, RepoError> {
        self.store.insert(user).await
    }

    pub async fn update_following(&self, user_id: &str, operation: SetOperation) -> Result<Option<User>, RepoError> {
        self.store.update_set_field(user_id, User::FOLLOWING, operation).await
    }

    /// Everyone whose `following` set contains `user_id`.
    pub async fn followers_of(&self, user_id: &str) -> Result<Vec<User>, RepoError> {
        self.store.find_where_array_contains(User::FOLLOWING, user_id).await
    }

    pub async fn count_followers(&self, user_id: &str) -> Result<u64, RepoError> {
        self.store.count_where_contains::<User>(User::FOLLOWING, user_id).await
    }
}

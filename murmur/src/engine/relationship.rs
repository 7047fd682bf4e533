use crate::{
    errors::{ServiceError, ServiceResult},
    id::ensure_entity_id,
    models::User,
    repository::UserRepo,
    store::DocumentStore,
    types::SetOperation,
};

const USER_NOT_FOUND: &str = "User not found";

/// Maintains the directed follow graph.
#[derive(Clone)]
pub struct RelationshipEngine<S> {
    users: UserRepo<S>,
}

impl<S: DocumentStore> RelationshipEngine<S> {
    pub fn new(users: UserRepo<S>) -> Self {
        Self { users }
    }

    /// Add `following_id` to the follower's `following` set and return the
    /// updated follower.
    ///
    /// Both ids are stripped before the target is appended, which keeps the set
    /// free of duplicates and of the follower's own id.
    pub async fn follow(&self, follower_id: &str, following_id: &str) -> ServiceResult<User> {
        ensure_entity_id("userId", following_id)?;
        if follower_id == following_id {
            return Err(ServiceError::validation(
                "userId",
                "validation.self_follow",
                "You cannot follow yourself",
            ));
        }
        if self.users.find(following_id).await?.is_none() {
            return Err(ServiceError::not_found(USER_NOT_FOUND));
        }

        let operation = SetOperation::Insert {
            value: following_id.to_string(),
            strip: vec![follower_id.to_string(), following_id.to_string()],
        };
        let user = self
            .users
            .update_following(follower_id, operation)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;
        log::info!("user '{follower_id}' follows '{following_id}'");
        Ok(user)
    }

    /// Remove `following_id` (and the follower's own id) from the set.
    /// Unfollowing someone not followed is a no-op.
    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> ServiceResult<User> {
        ensure_entity_id("userId", following_id)?;
        let operation = SetOperation::Remove {
            values: vec![follower_id.to_string(), following_id.to_string()],
        };
        let user = self
            .users
            .update_following(follower_id, operation)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;
        log::info!("user '{follower_id}' unfollowed '{following_id}'");
        Ok(user)
    }

    /// Users whose `following` set contains `user_id`, in registration order.
    pub async fn followers(&self, user_id: &str) -> ServiceResult<Vec<User>> {
        ensure_entity_id("userId", user_id)?;
        Ok(self.users.followers_of(user_id).await?)
    }

    pub async fn follower_count(&self, user_id: &str) -> ServiceResult<u64> {
        Ok(self.users.count_followers(user_id).await?)
    }

    /// Records of the users `user_id` follows, in follow order.
    pub async fn following(&self, user_id: &str) -> ServiceResult<Vec<User>> {
        ensure_entity_id("userId", user_id)?;
        let user = self
            .users
            .find(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;
        Ok(self.users.find_many(&user.following).await?)
    }
}

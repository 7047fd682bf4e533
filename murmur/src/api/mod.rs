//! Public query/mutation surface.
//!
//! [`Facade`] exposes every operation as an async method returning view
//! objects, and [`Facade::dispatch`] runs a JSON [`Envelope`] through the same
//! methods. Mutations resolve the caller through the [`AuthGate`] first.

mod request;
mod views;

pub use request::{Envelope, ErrorBody, Request, Response};
pub use views::{PostView, TokenView, UserView};

use serde::Serialize;
use serde_json::Value;

use crate::{
    auth::{AccountService, AuthGate, Caller, TokenSigner},
    engine::{ContentEngine, EngagementEngine, RelationshipEngine},
    errors::{ServiceError, ServiceResult},
    id::ensure_entity_id,
    models::{Post, User},
    pagination::{DEFAULT_PAGE, SortOrder, compute_window, total_pages},
    repository::{PostRepo, UserRepo},
    store::DocumentStore,
};

#[derive(Clone)]
pub struct Facade<S> {
    users: UserRepo<S>,
    gate: AuthGate<S>,
    accounts: AccountService<S>,
    engagement: EngagementEngine<S>,
    relationships: RelationshipEngine<S>,
    content: ContentEngine<S>,
}

impl<S: DocumentStore> Facade<S> {
    /// Build every component over one store handle.
    pub fn new(store: S, signer: TokenSigner) -> Self {
        let users = UserRepo::new(store.clone());
        let posts = PostRepo::new(store);
        Self {
            users: users.clone(),
            gate: AuthGate::new(users.clone(), signer.clone()),
            accounts: AccountService::new(users.clone(), signer),
            engagement: EngagementEngine::new(posts.clone()),
            relationships: RelationshipEngine::new(users.clone()),
            content: ContentEngine::new(posts, users),
        }
    }

    pub async fn get_posts(
        &self,
        first: u64,
        page: Option<i64>,
        order: Option<SortOrder>,
    ) -> ServiceResult<Vec<PostView>> {
        let window = compute_window(first, page.unwrap_or(DEFAULT_PAGE), order.unwrap_or_default());
        let posts = self.content.page(&window).await?;
        Ok(posts.into_iter().map(PostView::from).collect())
    }

    /// Number of pages of `first` posts each.
    pub async fn count_pages(&self, first: u64) -> ServiceResult<u64> {
        let total = self.content.total().await?;
        total_pages(total, first)
            .map_err(|err| ServiceError::validation("first", "validation.page_size", err.to_string()))
    }

    pub async fn get_post(&self, id: &str) -> ServiceResult<Option<PostView>> {
        Ok(self.content.find(id).await?.map(PostView::from))
    }

    pub async fn get_user(&self, id: &str) -> ServiceResult<Option<UserView>> {
        ensure_entity_id("id", id)?;
        match self.users.find(id).await? {
            Some(user) => Ok(Some(self.user_view(user).await?)),
            None => Ok(None),
        }
    }

    pub async fn publish_post(&self, title: &str, content: &str, token: &str) -> ServiceResult<PostView> {
        let caller = self.gate.resolve_caller(token).await?;
        let author = caller.require()?;
        Ok(self.content.publish(author, title, content).await?.into())
    }

    pub async fn like_post(&self, post_id: &str, token: &str) -> ServiceResult<PostView> {
        let caller = self.gate.resolve_caller(token).await?;
        let user = caller.require()?;
        Ok(self.engagement.toggle_like(post_id, &user.id).await?.into())
    }

    pub async fn follow_user(&self, user_id: &str, token: &str) -> ServiceResult<UserView> {
        let caller = self.gate.resolve_caller(token).await?;
        let follower = caller.require()?;
        let updated = self.relationships.follow(&follower.id, user_id).await?;
        self.user_view(updated).await
    }

    pub async fn unfollow_user(&self, user_id: &str, token: &str) -> ServiceResult<UserView> {
        let caller = self.gate.resolve_caller(token).await?;
        let follower = caller.require()?;
        let updated = self.relationships.unfollow(&follower.id, user_id).await?;
        self.user_view(updated).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> ServiceResult<TokenView> {
        let token = self.accounts.register(username, email, password).await?;
        Ok(TokenView { token })
    }

    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<TokenView> {
        let token = self.accounts.login(username, password).await?;
        Ok(TokenView { token })
    }

    pub async fn get_user_posts(&self, user_id: &str) -> ServiceResult<Vec<PostView>> {
        let posts = self.content.posts_by(user_id).await?;
        Ok(posts.into_iter().map(PostView::from).collect())
    }

    pub async fn get_followers(&self, user_id: &str) -> ServiceResult<Vec<UserView>> {
        let users = self.relationships.followers(user_id).await?;
        self.user_views(users).await
    }

    pub async fn get_following(&self, user_id: &str) -> ServiceResult<Vec<UserView>> {
        let users = self.relationships.following(user_id).await?;
        self.user_views(users).await
    }

    pub async fn get_post_likers(&self, post_id: &str) -> ServiceResult<Vec<UserView>> {
        let post = self.existing_post(post_id).await?;
        let users = self.content.likers(&post).await?;
        self.user_views(users).await
    }

    pub async fn get_post_author(&self, post_id: &str) -> ServiceResult<UserView> {
        let post = self.existing_post(post_id).await?;
        let author = self
            .content
            .author(&post)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        self.user_view(author).await
    }

    /// Resolve the caller of `token` without performing any operation.
    pub async fn whoami(&self, token: &str) -> ServiceResult<Option<UserView>> {
        match self.gate.resolve_caller(token).await? {
            Caller::Authenticated(user) => Ok(Some(self.user_view(user).await?)),
            Caller::Anonymous => Ok(None),
        }
    }

    /// Run one envelope and wrap the outcome.
    pub async fn dispatch(&self, envelope: Envelope) -> Response {
        let op = envelope.request.name();
        match self.execute(&envelope).await {
            Ok(data) => Response::Data(data),
            Err(err) => {
                log::debug!("{op} failed: {err}");
                Response::error(&err)
            }
        }
    }

    /// Parse `raw` as an envelope and dispatch it.
    pub async fn dispatch_json(&self, raw: &str) -> Response {
        match serde_json::from_str::<Envelope>(raw) {
            Ok(envelope) => self.dispatch(envelope).await,
            Err(err) => Response::bad_request(format!("invalid request: {err}")),
        }
    }

    async fn execute(&self, envelope: &Envelope) -> ServiceResult<Value> {
        let token = envelope.credential();
        match &envelope.request {
            Request::GetPosts { first, page, order } => to_data(self.get_posts(*first, *page, *order).await?),
            Request::GetPost { id } => to_data(self.get_post(id).await?),
            Request::GetUser { id } => to_data(self.get_user(id).await?),
            Request::PublishPost { title, content } => to_data(self.publish_post(title, content, token).await?),
            Request::LikePost { post_id } => to_data(self.like_post(post_id, token).await?),
            Request::FollowUser { user_id } => to_data(self.follow_user(user_id, token).await?),
            Request::UnFollowUser { user_id } => to_data(self.unfollow_user(user_id, token).await?),
            Request::Register {
                username,
                email,
                password,
            } => to_data(self.register(username, email, password).await?),
            Request::Login { username, password } => to_data(self.login(username, password).await?),
            Request::GetUserPosts { user_id } => to_data(self.get_user_posts(user_id).await?),
            Request::GetFollowers { user_id } => to_data(self.get_followers(user_id).await?),
            Request::GetFollowing { user_id } => to_data(self.get_following(user_id).await?),
            Request::GetPostLikers { post_id } => to_data(self.get_post_likers(post_id).await?),
            Request::GetPostAuthor { post_id } => to_data(self.get_post_author(post_id).await?),
        }
    }

    async fn existing_post(&self, post_id: &str) -> ServiceResult<Post> {
        self.content
            .find(post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post not found"))
    }

    async fn user_view(&self, user: User) -> ServiceResult<UserView> {
        let follower_count = self.relationships.follower_count(&user.id).await?;
        let post_count = self.content.count_by(&user.id).await?;
        Ok(UserView::new(user, follower_count, post_count))
    }

    async fn user_views(&self, users: Vec<User>) -> ServiceResult<Vec<UserView>> {
        let mut views = Vec::with_capacity(users.len());
        for user in users {
            views.push(self.user_view(user).await?);
        }
        Ok(views)
    }
}

fn to_data<T: Serialize>(value: T) -> ServiceResult<Value> {
    serde_json::to_value(value).map_err(|err| ServiceError::Internal(format!("failed to encode response: {err}")))
}

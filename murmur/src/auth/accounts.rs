use chrono::Utc;

use crate::{
    auth::{password::PasswordHasher, token::TokenSigner},
    errors::{RepoError, ServiceError, ServiceResult},
    id::generate_entity_id,
    models::User,
    repository::UserRepo,
    store::DocumentStore,
    validators::validate_registration,
};

const USERNAME_TAKEN: &str = "Username already taken";

/// Registration and login.
#[derive(Clone)]
pub struct AccountService<S> {
    users: UserRepo<S>,
    signer: TokenSigner,
    hasher: PasswordHasher,
}

impl<S: DocumentStore> AccountService<S> {
    pub fn new(users: UserRepo<S>, signer: TokenSigner) -> Self {
        Self {
            users,
            signer,
            hasher: PasswordHasher::new(),
        }
    }

    /// Create an account and return a fresh session token.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> ServiceResult<String> {
        validate_registration(email)?;
        if self.users.find_by_username(username).await?.is_some() {
            return Err(username_taken());
        }

        let user = User {
            id: generate_entity_id(),
            seq: 0,
            username: username.to_string(),
            email: email.to_string(),
            display_name: username.to_string(),
            password_hash: self.hasher.hash(password).await?,
            following: Vec::new(),
            created_at: Utc::now(),
        };
        // A concurrent registration can still win the unique claim.
        let user = self.users.insert(user).await.map_err(|err| match err {
            RepoError::UniqueConstraintViolation { .. } => username_taken(),
            other => other.into(),
        })?;
        log::info!("registered user '{}' ({})", user.username, user.id);

        self.issue(&user)
    }

    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<String> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        if !self.hasher.verify(password, &user.password_hash).await? {
            log::warn!("password mismatch for user '{}'", user.id);
            return Err(ServiceError::CredentialMismatch);
        }
        log::info!("user '{}' logged in", user.id);
        self.issue(&user)
    }

    fn issue(&self, user: &User) -> ServiceResult<String> {
        self.signer
            .issue(user)
            .map_err(|err| ServiceError::Credential(err.to_string()))
    }
}

fn username_taken() -> ServiceError {
    ServiceError::validation("username", "validation.unique", USERNAME_TAKEN)
}

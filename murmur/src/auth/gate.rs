use crate::{
    auth::token::TokenSigner,
    errors::{ServiceError, ServiceResult},
    models::User,
    repository::UserRepo,
    store::DocumentStore,
};

/// Identity resolved for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Caller {
    Authenticated(User),
    Anonymous,
}

impl Caller {
    pub fn user(&self) -> Option<&User> {
        match self {
            Caller::Authenticated(user) => Some(user),
            Caller::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Caller::Authenticated(_))
    }

    /// The authenticated user, or "Please login".
    pub fn require(&self) -> ServiceResult<&User> {
        self.user().ok_or(ServiceError::AuthenticationRequired)
    }
}

/// Strip an optional `Bearer ` scheme from an authorization header value.
pub fn bearer_token(header: &str) -> &str {
    let header = header.trim();
    match header.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => header[7..].trim_start(),
        _ => header,
    }
}

#[derive(Clone)]
pub struct AuthGate<S> {
    users: UserRepo<S>,
    signer: TokenSigner,
}

impl<S: DocumentStore> AuthGate<S> {
    pub fn new(users: UserRepo<S>, signer: TokenSigner) -> Self {
        Self { users, signer }
    }

    /// Resolve `credential` to a caller.
    ///
    /// Empty, malformed, forged or expired tokens and tokens naming a user that
    /// no longer exists resolve to [`Caller::Anonymous`]. Store failures are
    /// returned as errors.
    pub async fn resolve_caller(&self, credential: &str) -> ServiceResult<Caller> {
        let token = bearer_token(credential);
        if token.is_empty() {
            return Ok(Caller::Anonymous);
        }
        let claims = match self.signer.verify(token) {
            Ok(claims) => claims,
            Err(err) => {
                log::debug!("rejected credential: {err}");
                return Ok(Caller::Anonymous);
            }
        };
        match self.users.find(&claims.id).await? {
            Some(user) => Ok(Caller::Authenticated(user)),
            None => {
                log::debug!("credential names unknown user '{}'", claims.id);
                Ok(Caller::Anonymous)
            }
        }
    }
}

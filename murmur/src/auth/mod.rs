//! Credentials: signed session tokens, password hashing, the request gate and
//! the account service built on them.

mod accounts;
mod gate;
mod password;
mod token;

pub use accounts::AccountService;
pub use gate::{AuthGate, Caller, bearer_token};
pub use password::PasswordHasher;
pub use token::{DEFAULT_TOKEN_TTL, TokenClaims, TokenError, TokenSigner};

//! Identity and content store adapters.
//!
//! Thin, typed wrappers over a [`DocumentStore`](crate::store::DocumentStore)
//! handle. They own no state besides the handle and never cache.

mod posts;
mod users;

pub use posts::PostRepo;
pub use users::UserRepo;

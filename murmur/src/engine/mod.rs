//! Stateless domain engines. Each holds cloned repository handles only.

mod content;
mod engagement;
mod relationship;

pub use content::ContentEngine;
pub use engagement::EngagementEngine;
pub use relationship::RelationshipEngine;

//! SurrealDB implementations of the core capability traits.

mod identity;
mod organization;
mod profile;

pub use identity::{SurrealIdentityProvider, verify_password};
pub use organization::SurrealOrganizationRepository;
pub use profile::SurrealProfileRepository;

//! Identity domain model.
//!
//! An identity is an authenticatable principal held by the identity
//! provider. Its `claims` are the authorization payload embedded in
//! every token issued to it. Rewriting claims never reaches a token
//! that is already out; the identity must re-authenticate before new
//! claims take effect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved platform-level tenant id.
///
/// A `superadmin` claim bound to this id is not scoped to any real
/// organization, so no organization record has to exist under it.
pub const PLATFORM_ORG: &str = "platform";

/// The single role field carried in claims and mirrored into profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
    Superadmin,
}

/// Authorization payload carried in issued tokens: the owning
/// organization and the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub org_id: String,
    pub role: Role,
}

/// Provider-side view of an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued key, immutable for the identity's lifetime.
    pub uid: String,
    /// Unique within the provider.
    pub email: String,
    pub display_name: Option<String>,
    /// Absent until first set; whole-object overwritten on every
    /// rewrite.
    pub claims: Option<Claims>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdentity {
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub display_name: Option<String>,
}

//! Error taxonomy for the reconciliation core.
//!
//! Every variant except [`CoreError::Upstream`] is terminal for the
//! current call and is reported verbatim to the caller. `Upstream`
//! covers transient provider/store failures; all core operations are
//! idempotent, so callers may repeat the same call after one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Lookup miss. Expected in normal operation; callers decide
    /// whether to provision.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Creating or aliasing would violate a uniqueness invariant
    /// (domain already owned, email already registered).
    #[error("{entity} already exists: {key}")]
    Conflict { entity: String, key: String },

    /// A claims write referenced a tenant that does not exist.
    #[error("organization not found: {org_id}")]
    OrganizationNotFound { org_id: String },

    /// Claims and profile are both absent. Reconciliation needs an
    /// operator-supplied org/role before any claim can be set.
    #[error("identity {uid} has neither claims nor a profile")]
    IrreconcilableIdentity { uid: String },

    /// Input or stored data violates an integrity rule.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The identity provider or document store failed transiently.
    #[error("upstream unavailable: {0}")]
    Upstream(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

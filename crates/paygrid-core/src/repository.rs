//! Capability trait definitions for the two external stores.
//!
//! All operations are async request/response calls; there is no
//! in-process shared state and no background scheduling. Both stores
//! are last-writer-wins per key, so coordinating concurrent writes
//! against the same uid is a caller responsibility.

use crate::error::CoreResult;
use crate::models::identity::{Claims, Identity, NewIdentity, Role};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::profile::Profile;

/// Document-store access to organization records.
pub trait OrganizationRepository: Send + Sync {
    /// Create an organization with a freshly assigned id. The store
    /// keeps a unique index on `domain` as a backstop for the
    /// write-time uniqueness checks.
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = CoreResult<Organization>> + Send;

    fn get_by_id(&self, id: &str) -> impl Future<Output = CoreResult<Organization>> + Send;

    /// Exact match on the primary `domain` field.
    fn get_by_domain(&self, domain: &str)
    -> impl Future<Output = CoreResult<Organization>> + Send;

    /// All organizations whose alias set contains `domain`. More than
    /// one element is a data-integrity fault the caller surfaces.
    fn find_by_alias(
        &self,
        domain: &str,
    ) -> impl Future<Output = CoreResult<Vec<Organization>>> + Send;

    /// Replace the primary domain and alias set in one write.
    fn update_domains(
        &self,
        id: &str,
        domain: String,
        domains: Vec<String>,
    ) -> impl Future<Output = CoreResult<Organization>> + Send;
}

/// Document-store access to profile documents, keyed by uid.
pub trait ProfileRepository: Send + Sync {
    fn get(&self, uid: &str) -> impl Future<Output = CoreResult<Profile>> + Send;

    /// Whole-document write, creating the profile when absent.
    fn upsert(&self, profile: Profile) -> impl Future<Output = CoreResult<Profile>> + Send;

    /// Rewrite only the tenant binding fields, leaving the descriptive
    /// block untouched.
    fn update_binding(
        &self,
        uid: &str,
        org_id: &str,
        role: Role,
    ) -> impl Future<Output = CoreResult<Profile>> + Send;
}

/// The external identity provider: authenticatable principals and
/// their token claim sets.
pub trait IdentityProvider: Send + Sync {
    /// Create an identity, returning it with the provider-issued uid.
    /// Fails with `Conflict` when the email is already registered.
    fn create_identity(
        &self,
        input: NewIdentity,
    ) -> impl Future<Output = CoreResult<Identity>> + Send;

    fn get_identity(&self, uid: &str) -> impl Future<Output = CoreResult<Identity>> + Send;

    fn get_identity_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = CoreResult<Identity>> + Send;

    /// Whole-object claim overwrite. Tokens already issued keep the
    /// old payload until the identity re-authenticates.
    fn set_claims(&self, uid: &str, claims: Claims)
    -> impl Future<Output = CoreResult<()>> + Send;

    fn update_password(
        &self,
        uid: &str,
        password: &str,
    ) -> impl Future<Output = CoreResult<()>> + Send;
}

//! Claims/profile reconciliation.
//!
//! The claim set on the identity and the profile document are written
//! independently and can drift apart after partial failures or manual
//! intervention. Reconciliation converges them with one fixed rule:
//! claims are the authoritative side, the profile is a denormalized
//! mirror that gets rewritten to match.

use chrono::{DateTime, Utc};
use paygrid_core::error::{CoreError, CoreResult};
use paygrid_core::models::identity::{Claims, Identity, Role};
use paygrid_core::models::profile::{Profile, ProfileDetails};
use paygrid_core::repository::{IdentityProvider, OrganizationRepository, ProfileRepository};
use tracing::info;

use crate::config::TenancyConfig;

/// What [`ReconcileService::reconcile`] did to converge the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Claims and profile already agree; nothing was written.
    Converged,
    /// Claims were absent and were derived from the profile binding.
    ClaimsAdopted,
    /// Profile was absent and was synthesized from the claims.
    ProfileSynthesized,
    /// Profile binding differed and was overwritten from the claims.
    ProfileRealigned,
}

/// Converges an identity's token claim set with its persisted profile.
pub struct ReconcileService<O, P, I> {
    org_repo: O,
    profile_repo: P,
    provider: I,
    config: TenancyConfig,
}

impl<O, P, I> ReconcileService<O, P, I>
where
    O: OrganizationRepository,
    P: ProfileRepository,
    I: IdentityProvider,
{
    pub fn new(org_repo: O, profile_repo: P, provider: I, config: TenancyConfig) -> Self {
        Self {
            org_repo,
            profile_repo,
            provider,
            config,
        }
    }

    /// Converge an identity's claim set and profile document.
    ///
    /// The decision is a function of which of the two exist and
    /// whether their bindings agree; repeated calls settle on
    /// [`ReconcileOutcome::Converged`].
    pub async fn reconcile(&self, uid: &str) -> CoreResult<ReconcileOutcome> {
        let identity = self.provider.get_identity(uid).await?;
        let profile = match self.profile_repo.get(uid).await {
            Ok(p) => Some(p),
            Err(CoreError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        match (identity.claims.clone(), profile) {
            (None, None) => Err(CoreError::IrreconcilableIdentity {
                uid: uid.to_string(),
            }),
            (None, Some(profile)) => {
                // The profile is the only tenant hint; adopt its
                // binding as the claim pair. The profile itself stays
                // untouched.
                let claims = Claims {
                    org_id: profile.org_id.clone(),
                    role: profile.role,
                };
                self.provider.set_claims(uid, claims).await?;
                info!(uid, org_id = %profile.org_id, "claims derived from profile");
                Ok(ReconcileOutcome::ClaimsAdopted)
            }
            (Some(claims), None) => {
                let synthesized = profile_from_claims(&identity, &claims, Utc::now());
                self.profile_repo.upsert(synthesized).await?;
                info!(uid, org_id = %claims.org_id, "profile synthesized from claims");
                Ok(ReconcileOutcome::ProfileSynthesized)
            }
            (Some(claims), Some(profile)) => {
                if profile.org_id == claims.org_id && profile.role == claims.role {
                    return Ok(ReconcileOutcome::Converged);
                }
                // Claims win; only the mirror is rewritten, never the
                // claim set.
                self.profile_repo
                    .update_binding(uid, &claims.org_id, claims.role)
                    .await?;
                info!(uid, from = %profile.org_id, to = %claims.org_id, "profile realigned to claims");
                Ok(ReconcileOutcome::ProfileRealigned)
            }
        }
    }

    /// Rewrite an identity's claim pair and push it into the profile.
    ///
    /// The target organization must exist, except for a superadmin
    /// claim bound to the reserved platform tenant. Validation happens
    /// before any write, so a failed call leaves claims and profile
    /// untouched. Repeating the call with identical arguments settles
    /// into a no-op.
    pub async fn set_claims(
        &self,
        uid: &str,
        org_id: &str,
        role: Role,
    ) -> CoreResult<ReconcileOutcome> {
        let identity = self.provider.get_identity(uid).await?;

        let platform_elevation =
            role == Role::Superadmin && org_id == self.config.platform_org_id;
        if !platform_elevation {
            match self.org_repo.get_by_id(org_id).await {
                Ok(_) => {}
                Err(CoreError::NotFound { .. }) => {
                    return Err(CoreError::OrganizationNotFound {
                        org_id: org_id.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let claims = Claims {
            org_id: org_id.to_string(),
            role,
        };
        if identity.claims.as_ref() != Some(&claims) {
            self.provider.set_claims(uid, claims).await?;
            info!(uid, org_id, role = ?role, "claims rewritten");
        }

        self.reconcile(uid).await
    }
}

/// Build the profile mirror for an identity from its claim pair.
///
/// Descriptive fields are best effort: the display name splits into
/// first and last on the first space, everything else starts empty.
pub fn profile_from_claims(identity: &Identity, claims: &Claims, now: DateTime<Utc>) -> Profile {
    let (first_name, last_name) = split_display_name(identity.display_name.as_deref());
    Profile {
        uid: identity.uid.clone(),
        org_id: claims.org_id.clone(),
        role: claims.role,
        email: identity.email.clone(),
        details: ProfileDetails {
            first_name,
            last_name,
            ..ProfileDetails::default()
        },
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn split_display_name(name: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return (None, None);
    };
    match name.split_once(' ') {
        Some((first, rest)) => (Some(first.to_string()), Some(rest.trim().to_string())),
        None => (Some(name.to_string()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_display_name_on_first_space() {
        assert_eq!(
            split_display_name(Some("Alice Smith")),
            (Some("Alice".into()), Some("Smith".into()))
        );
        assert_eq!(
            split_display_name(Some("Mary Jane Watson")),
            (Some("Mary".into()), Some("Jane Watson".into()))
        );
    }

    #[test]
    fn single_token_becomes_first_name() {
        assert_eq!(split_display_name(Some("Prince")), (Some("Prince".into()), None));
    }

    #[test]
    fn missing_or_blank_name_yields_nothing() {
        assert_eq!(split_display_name(None), (None, None));
        assert_eq!(split_display_name(Some("   ")), (None, None));
    }
}

//! Organization + administrator provisioning.
//!
//! Provisioning is a fixed four-step sequence against two
//! independently consistent stores. Every step is create-if-absent or
//! set-if-different, so a crash mid-sequence is recovered by re-running
//! [`ProvisioningService::resume`] rather than hand-repairing a
//! half-created tenant.

use chrono::Utc;
use paygrid_core::error::{CoreError, CoreResult};
use paygrid_core::models::identity::{Claims, NewIdentity, Role};
use paygrid_core::models::organization::{CreateOrganization, Subscription};
use paygrid_core::repository::{IdentityProvider, OrganizationRepository, ProfileRepository};
use serde::Serialize;
use tracing::info;

use crate::domain::normalize_domain;
use crate::reconcile::profile_from_claims;

/// Input for provisioning: the organization to create plus its first
/// administrator.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub org: CreateOrganization,
    pub admin: NewIdentity,
}

/// One effect the step sequence actually performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStep {
    CreatedOrganization,
    CreatedIdentity,
    ClaimsSet,
    ProfileCreated,
    /// Resume found a profile whose binding drifted and realigned it.
    ProfileRealigned,
}

/// Result of a provisioning run.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub org_id: String,
    pub uid: String,
    /// Steps this run performed; empty when everything was already in
    /// place.
    pub steps: Vec<ProvisionStep>,
}

/// Creates an organization and its initial administrator exactly once.
pub struct ProvisioningService<O, P, I> {
    org_repo: O,
    profile_repo: P,
    provider: I,
}

impl<O, P, I> ProvisioningService<O, P, I>
where
    O: OrganizationRepository,
    P: ProfileRepository,
    I: IdentityProvider,
{
    pub fn new(org_repo: O, profile_repo: P, provider: I) -> Self {
        Self {
            org_repo,
            profile_repo,
            provider,
        }
    }

    /// Provision a new organization with its first administrator.
    ///
    /// Preconditions, checked in order and each an early exit:
    /// 1. the normalized domain is not owned (primary or alias) by any
    ///    organization;
    /// 2. the administrator email is unknown to the identity provider.
    ///
    /// A fully provisioned tenant therefore reports `Conflict` on
    /// re-run; use [`resume`](Self::resume) to finish a partially
    /// applied run instead.
    pub async fn provision(&self, request: ProvisionRequest) -> CoreResult<Provisioned> {
        let domain = normalize_domain(&request.org.domain);
        if domain.is_empty() {
            return Err(CoreError::Validation {
                message: "empty domain".into(),
            });
        }

        // 1. Domain uniqueness.
        match self.org_repo.get_by_domain(&domain).await {
            Ok(_) => {
                return Err(CoreError::Conflict {
                    entity: "organization".into(),
                    key: domain,
                });
            }
            Err(CoreError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        if !self.org_repo.find_by_alias(&domain).await?.is_empty() {
            return Err(CoreError::Conflict {
                entity: "organization".into(),
                key: domain,
            });
        }

        // 2. Email uniqueness.
        match self
            .provider
            .get_identity_by_email(&request.admin.email)
            .await
        {
            Ok(_) => {
                return Err(CoreError::Conflict {
                    entity: "identity".into(),
                    key: request.admin.email.clone(),
                });
            }
            Err(CoreError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        self.run_steps(request).await
    }

    /// Re-run the provisioning sequence, completing whatever a
    /// previous partially failed run left undone.
    ///
    /// Safe to call any number of times; a run that finds nothing to
    /// do returns successfully with an empty step list.
    pub async fn resume(&self, request: ProvisionRequest) -> CoreResult<Provisioned> {
        self.run_steps(request).await
    }

    async fn run_steps(&self, request: ProvisionRequest) -> CoreResult<Provisioned> {
        let ProvisionRequest {
            org: org_input,
            admin,
        } = request;
        let mut steps = Vec::new();

        // 1. Organization, create-if-absent by normalized domain.
        let domain = normalize_domain(&org_input.domain);
        if domain.is_empty() {
            return Err(CoreError::Validation {
                message: "empty domain".into(),
            });
        }

        let org = match self.org_repo.get_by_domain(&domain).await {
            Ok(existing) => existing,
            Err(CoreError::NotFound { .. }) => {
                if !self.org_repo.find_by_alias(&domain).await?.is_empty() {
                    return Err(CoreError::Conflict {
                        entity: "organization".into(),
                        key: domain,
                    });
                }

                let mut aliases: Vec<String> = Vec::new();
                for raw in &org_input.domains {
                    let a = normalize_domain(raw);
                    if !a.is_empty() && a != domain && !aliases.contains(&a) {
                        aliases.push(a);
                    }
                }
                for alias in &aliases {
                    self.ensure_domain_unowned(alias).await?;
                }

                let subscription = org_input
                    .subscription
                    .clone()
                    .unwrap_or_else(|| Subscription::trial(Utc::now()));
                let created = self
                    .org_repo
                    .create(CreateOrganization {
                        org_name: org_input.org_name.clone(),
                        domain: domain.clone(),
                        domains: aliases,
                        org_type: org_input.org_type,
                        subscription: Some(subscription),
                    })
                    .await?;
                steps.push(ProvisionStep::CreatedOrganization);
                info!(org_id = %created.id, domain = %created.domain, "organization created");
                created
            }
            Err(e) => return Err(e),
        };

        // 2. Administrator identity, create-if-absent by email.
        let identity = match self.provider.get_identity_by_email(&admin.email).await {
            Ok(existing) => {
                if let Some(claims) = &existing.claims {
                    if claims.org_id != org.id {
                        // The email is already bound to another
                        // tenant; never rebind it silently.
                        return Err(CoreError::Conflict {
                            entity: "identity".into(),
                            key: existing.email,
                        });
                    }
                }
                existing
            }
            Err(CoreError::NotFound { .. }) => {
                let created = self.provider.create_identity(admin.clone()).await?;
                steps.push(ProvisionStep::CreatedIdentity);
                info!(uid = %created.uid, "administrator identity created");
                created
            }
            Err(e) => return Err(e),
        };

        // 3. Claims, set-if-different.
        let claims = Claims {
            org_id: org.id.clone(),
            role: Role::Admin,
        };
        if identity.claims.as_ref() != Some(&claims) {
            self.provider.set_claims(&identity.uid, claims.clone()).await?;
            steps.push(ProvisionStep::ClaimsSet);
            info!(uid = %identity.uid, org_id = %org.id, "administrator claims set");
        }

        // 4. Profile, create-if-absent; an existing profile whose
        //    binding drifted is realigned from the claims.
        match self.profile_repo.get(&identity.uid).await {
            Ok(existing) => {
                if existing.org_id != claims.org_id || existing.role != claims.role {
                    self.profile_repo
                        .update_binding(&identity.uid, &claims.org_id, claims.role)
                        .await?;
                    steps.push(ProvisionStep::ProfileRealigned);
                }
            }
            Err(CoreError::NotFound { .. }) => {
                let profile = profile_from_claims(&identity, &claims, Utc::now());
                self.profile_repo.upsert(profile).await?;
                steps.push(ProvisionStep::ProfileCreated);
            }
            Err(e) => return Err(e),
        }

        Ok(Provisioned {
            org_id: org.id,
            uid: identity.uid,
            steps,
        })
    }

    /// Error with `Conflict` if `domain` is owned by any organization.
    async fn ensure_domain_unowned(&self, domain: &str) -> CoreResult<()> {
        match self.org_repo.get_by_domain(domain).await {
            Ok(_) => {
                return Err(CoreError::Conflict {
                    entity: "organization".into(),
                    key: domain.into(),
                });
            }
            Err(CoreError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        if !self.org_repo.find_by_alias(domain).await?.is_empty() {
            return Err(CoreError::Conflict {
                entity: "organization".into(),
                key: domain.into(),
            });
        }
        Ok(())
    }
}

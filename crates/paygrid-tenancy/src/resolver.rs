//! Tenant resolution from login domains, and domain-table repair.

use paygrid_core::error::{CoreError, CoreResult};
use paygrid_core::models::organization::Organization;
use paygrid_core::repository::OrganizationRepository;
use tracing::info;

use crate::domain::normalize_domain;
use crate::error::TenancyError;

/// Resolves which organization owns a login domain, and keeps the
/// domain table normalized and uniquely owned.
pub struct TenantResolver<O: OrganizationRepository> {
    org_repo: O,
}

impl<O: OrganizationRepository> TenantResolver<O> {
    pub fn new(org_repo: O) -> Self {
        Self { org_repo }
    }

    /// Find the organization owning `raw_domain`.
    ///
    /// The input is normalized, matched against the primary `domain`
    /// field first, then against alias sets. A domain held by more
    /// than one organization is surfaced as a validation error rather
    /// than resolved by query order.
    pub async fn resolve(&self, raw_domain: &str) -> CoreResult<Organization> {
        let domain = normalize_domain(raw_domain);
        if domain.is_empty() {
            return Err(CoreError::Validation {
                message: "empty domain".into(),
            });
        }

        match self.org_repo.get_by_domain(&domain).await {
            Ok(org) => return Ok(org),
            Err(CoreError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let mut matches = self.org_repo.find_by_alias(&domain).await?;
        match matches.len() {
            0 => Err(CoreError::NotFound {
                entity: "organization".into(),
                key: domain,
            }),
            1 => Ok(matches.remove(0)),
            n => Err(TenancyError::AmbiguousDomain { domain, count: n }.into()),
        }
    }

    /// Attach an alias domain to an organization.
    ///
    /// Rejects a value owned (primary or alias) by any other
    /// organization. Re-adding a value the organization already
    /// carries is a no-op, so the call is idempotent.
    pub async fn add_alias(&self, org_id: &str, raw_domain: &str) -> CoreResult<Organization> {
        let domain = normalize_domain(raw_domain);
        if domain.is_empty() {
            return Err(CoreError::Validation {
                message: "empty domain".into(),
            });
        }

        let org = self.org_repo.get_by_id(org_id).await?;
        if org.owns_domain(&domain) {
            return Ok(org);
        }
        self.ensure_unowned(&domain, &org.id).await?;

        let mut domains = org.domains.clone();
        domains.push(domain.clone());
        let updated = self
            .org_repo
            .update_domains(&org.id, org.domain.clone(), domains)
            .await?;
        info!(org_id = %updated.id, %domain, "alias added");
        Ok(updated)
    }

    /// Normalize an organization's stored primary domain and aliases.
    ///
    /// Rows written before normalization existed are converged here
    /// instead of failing lookups. Duplicate aliases collapse; a
    /// normalized value colliding with another organization's holdings
    /// is a conflict.
    pub async fn repair_domains(&self, org_id: &str) -> CoreResult<Organization> {
        let org = self.org_repo.get_by_id(org_id).await?;

        let primary = normalize_domain(&org.domain);
        if primary.is_empty() {
            return Err(CoreError::Validation {
                message: format!("organization {} has an empty primary domain", org.id),
            });
        }

        let mut aliases: Vec<String> = Vec::new();
        for raw in &org.domains {
            let d = normalize_domain(raw);
            if !d.is_empty() && d != primary && !aliases.contains(&d) {
                aliases.push(d);
            }
        }

        if primary == org.domain && aliases == org.domains {
            return Ok(org);
        }

        for value in std::iter::once(&primary).chain(aliases.iter()) {
            if !org.owns_domain(value) {
                self.ensure_unowned(value, &org.id).await?;
            }
        }

        let updated = self
            .org_repo
            .update_domains(&org.id, primary, aliases)
            .await?;
        info!(org_id = %updated.id, domain = %updated.domain, "domain table normalized");
        Ok(updated)
    }

    /// Error with `Conflict` if `domain` is held by an organization
    /// other than `own_id`.
    async fn ensure_unowned(&self, domain: &str, own_id: &str) -> CoreResult<()> {
        match self.org_repo.get_by_domain(domain).await {
            Ok(other) if other.id != own_id => {
                return Err(CoreError::Conflict {
                    entity: "organization".into(),
                    key: domain.into(),
                });
            }
            Ok(_) => {}
            Err(CoreError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        for other in self.org_repo.find_by_alias(domain).await? {
            if other.id != own_id {
                return Err(CoreError::Conflict {
                    entity: "organization".into(),
                    key: domain.into(),
                });
            }
        }
        Ok(())
    }
}

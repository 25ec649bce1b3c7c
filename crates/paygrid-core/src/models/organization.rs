//! Organization domain model.
//!
//! Organizations are the tenant entity of the payroll platform. Each one
//! owns a primary login domain plus an ordered set of alias domains, and
//! every identity's claims bind it to exactly one organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feature tier of an organization.
///
/// Gates optional feature visibility in the application layer; the core
/// only stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgType {
    Education,
    Corporate,
    Full,
}

/// Subscription lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
    Cancelled,
}

/// Plan and billing window attached to an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: String,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// A trial subscription starting at `now`, used when provisioning
    /// omits an explicit plan.
    pub fn trial(now: DateTime<Utc>) -> Self {
        Self {
            plan: "trial".into(),
            status: SubscriptionStatus::Trial,
            starts_at: now,
            ends_at: None,
        }
    }
}

/// An organization (tenant), resolved from the domain a user logs in from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub org_name: String,
    /// Primary lookup domain, stored normalized.
    pub domain: String,
    /// Ordered alias domains. The primary domain is conceptually a
    /// member and is not duplicated here.
    pub domains: Vec<String>,
    pub org_type: OrgType,
    pub subscription: Subscription,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Whether `domain` (already normalized) is this organization's
    /// primary domain or one of its aliases.
    pub fn owns_domain(&self, domain: &str) -> bool {
        self.domain == domain || self.domains.iter().any(|d| d == domain)
    }
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub org_name: String,
    pub domain: String,
    /// Alias domains beyond the primary.
    pub domains: Vec<String>,
    pub org_type: OrgType,
    /// Defaults to a trial subscription when omitted.
    pub subscription: Option<Subscription>,
}

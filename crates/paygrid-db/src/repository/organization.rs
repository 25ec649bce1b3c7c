//! SurrealDB implementation of [`OrganizationRepository`].

use chrono::{DateTime, Utc};
use paygrid_core::error::CoreResult;
use paygrid_core::models::organization::{
    CreateOrganization, OrgType, Organization, Subscription,
};
use paygrid_core::repository::OrganizationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the record key is already
/// known.
#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    org_name: String,
    domain: String,
    domains: Vec<String>,
    org_type: String,
    subscription: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct OrganizationRowWithId {
    record_id: String,
    org_name: String,
    domain: String,
    domains: Vec<String>,
    org_type: String,
    subscription: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_org_type(s: &str) -> Result<OrgType, DbError> {
    match s {
        "education" => Ok(OrgType::Education),
        "corporate" => Ok(OrgType::Corporate),
        "full" => Ok(OrgType::Full),
        other => Err(DbError::Corrupt(format!("unknown org type: {other}"))),
    }
}

fn org_type_to_str(t: OrgType) -> &'static str {
    match t {
        OrgType::Education => "education",
        OrgType::Corporate => "corporate",
        OrgType::Full => "full",
    }
}

fn parse_subscription(value: serde_json::Value) -> Result<Subscription, DbError> {
    serde_json::from_value(value)
        .map_err(|e| DbError::Corrupt(format!("invalid subscription: {e}")))
}

impl OrganizationRow {
    fn into_organization(self, id: String) -> Result<Organization, DbError> {
        Ok(Organization {
            id,
            org_name: self.org_name,
            domain: self.domain,
            domains: self.domains,
            org_type: parse_org_type(&self.org_type)?,
            subscription: parse_subscription(self.subscription)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrganizationRowWithId {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        Ok(Organization {
            id: self.record_id,
            org_name: self.org_name,
            domain: self.domain,
            domains: self.domains,
            org_type: parse_org_type(&self.org_type)?,
            subscription: parse_subscription(self.subscription)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> CoreResult<Organization> {
        let id = Uuid::new_v4().to_string();

        let subscription = input
            .subscription
            .unwrap_or_else(|| Subscription::trial(Utc::now()));
        let subscription_value = serde_json::to_value(&subscription)
            .map_err(|e| DbError::Corrupt(format!("subscription encode: {e}")))?;

        let result = self
            .db
            .query(
                "CREATE type::record('organization', $id) SET \
                 org_name = $org_name, domain = $domain, \
                 domains = $domains, org_type = $org_type, \
                 subscription = $subscription",
            )
            .bind(("id", id.clone()))
            .bind(("org_name", input.org_name))
            .bind(("domain", input.domain))
            .bind(("domains", input.domains))
            .bind(("org_type", org_type_to_str(input.org_type)))
            .bind(("subscription", subscription_value))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            key: id.clone(),
        })?;

        Ok(row.into_organization(id)?)
    }

    async fn get_by_id(&self, id: &str) -> CoreResult<Organization> {
        let id_owned = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('organization', $id)")
            .bind(("id", id_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            key: id_owned.clone(),
        })?;

        Ok(row.into_organization(id_owned)?)
    }

    async fn get_by_domain(&self, domain: &str) -> CoreResult<Organization> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM organization WHERE domain = $domain",
            )
            .bind(("domain", domain.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            key: format!("domain={domain}"),
        })?;

        Ok(row.try_into_organization()?)
    }

    async fn find_by_alias(&self, domain: &str) -> CoreResult<Vec<Organization>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM organization WHERE domains CONTAINS $domain \
                 ORDER BY created_at ASC",
            )
            .bind(("domain", domain.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        let orgs = rows
            .into_iter()
            .map(|row| row.try_into_organization())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(orgs)
    }

    async fn update_domains(
        &self,
        id: &str,
        domain: String,
        domains: Vec<String>,
    ) -> CoreResult<Organization> {
        let id_owned = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('organization', $id) SET \
                 domain = $domain, domains = $domains, \
                 updated_at = time::now()",
            )
            .bind(("id", id_owned.clone()))
            .bind(("domain", domain))
            .bind(("domains", domains))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            key: id_owned.clone(),
        })?;

        Ok(row.into_organization(id_owned)?)
    }
}

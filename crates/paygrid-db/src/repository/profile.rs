//! SurrealDB implementation of [`ProfileRepository`].
//!
//! Profile documents are keyed by the identity's uid, so the 1:1
//! relationship is structural rather than enforced by an index.

use chrono::{DateTime, Utc};
use paygrid_core::error::CoreResult;
use paygrid_core::models::identity::Role;
use paygrid_core::models::profile::{Profile, ProfileDetails};
use paygrid_core::repository::ProfileRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProfileRow {
    org_id: String,
    role: String,
    email: String,
    details: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    match s {
        "admin" => Ok(Role::Admin),
        "employee" => Ok(Role::Employee),
        "superadmin" => Ok(Role::Superadmin),
        other => Err(DbError::Corrupt(format!("unknown role: {other}"))),
    }
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Employee => "employee",
        Role::Superadmin => "superadmin",
    }
}

impl ProfileRow {
    fn into_profile(self, uid: String) -> Result<Profile, DbError> {
        let details: ProfileDetails = serde_json::from_value(self.details)
            .map_err(|e| DbError::Corrupt(format!("invalid profile details: {e}")))?;
        Ok(Profile {
            uid,
            org_id: self.org_id,
            role: parse_role(&self.role)?,
            email: self.email,
            details,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Profile repository.
#[derive(Clone)]
pub struct SurrealProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProfileRepository for SurrealProfileRepository<C> {
    async fn get(&self, uid: &str) -> CoreResult<Profile> {
        let uid_owned = uid.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('profile', $uid)")
            .bind(("uid", uid_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            key: uid_owned.clone(),
        })?;

        Ok(row.into_profile(uid_owned)?)
    }

    async fn upsert(&self, profile: Profile) -> CoreResult<Profile> {
        let uid = profile.uid.clone();
        let details_value = serde_json::to_value(&profile.details)
            .map_err(|e| DbError::Corrupt(format!("details encode: {e}")))?;

        let result = self
            .db
            .query(
                "UPSERT type::record('profile', $uid) SET \
                 org_id = $org_id, role = $role, email = $email, \
                 details = $details, is_active = $is_active, \
                 created_at = $created_at, updated_at = $updated_at",
            )
            .bind(("uid", uid.clone()))
            .bind(("org_id", profile.org_id))
            .bind(("role", role_to_str(profile.role).to_string()))
            .bind(("email", profile.email))
            .bind(("details", details_value))
            .bind(("is_active", profile.is_active))
            .bind(("created_at", profile.created_at))
            .bind(("updated_at", profile.updated_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            key: uid.clone(),
        })?;

        Ok(row.into_profile(uid)?)
    }

    async fn update_binding(&self, uid: &str, org_id: &str, role: Role) -> CoreResult<Profile> {
        let uid_owned = uid.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('profile', $uid) SET \
                 org_id = $org_id, role = $role, \
                 updated_at = time::now()",
            )
            .bind(("uid", uid_owned.clone()))
            .bind(("org_id", org_id.to_string()))
            .bind(("role", role_to_str(role).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            key: uid_owned.clone(),
        })?;

        Ok(row.into_profile(uid_owned)?)
    }
}

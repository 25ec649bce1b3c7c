//! SurrealDB-backed identity directory implementing
//! [`IdentityProvider`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use paygrid_core::error::{CoreError, CoreResult};
use paygrid_core::models::identity::{Claims, Identity, NewIdentity};
use paygrid_core::repository::IdentityProvider;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the uid is already known.
#[derive(Debug, SurrealValue)]
struct IdentityRow {
    email: String,
    display_name: Option<String>,
    claims: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct IdentityRowWithId {
    record_id: String,
    email: String,
    display_name: Option<String>,
    claims: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

fn parse_claims(value: Option<serde_json::Value>) -> Result<Option<Claims>, DbError> {
    value
        .map(|v| {
            serde_json::from_value(v)
                .map_err(|e| DbError::Corrupt(format!("invalid claims: {e}")))
        })
        .transpose()
}

impl IdentityRow {
    fn into_identity(self, uid: String) -> Result<Identity, DbError> {
        Ok(Identity {
            uid,
            email: self.email,
            display_name: self.display_name,
            claims: parse_claims(self.claims)?,
            created_at: self.created_at,
        })
    }
}

impl IdentityRowWithId {
    fn try_into_identity(self) -> Result<Identity, DbError> {
        Ok(Identity {
            uid: self.record_id,
            email: self.email,
            display_name: self.display_name,
            claims: parse_claims(self.claims)?,
            created_at: self.created_at,
        })
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Corrupt(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Corrupt(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// If `pepper` is provided it must match the pepper used during
/// hashing. Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// an error if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, CoreError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| CoreError::Upstream(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CoreError::Upstream(format!("verify error: {e}"))),
    }
}

/// SurrealDB-backed identity provider.
#[derive(Clone)]
pub struct SurrealIdentityProvider<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealIdentityProvider<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> IdentityProvider for SurrealIdentityProvider<C> {
    async fn create_identity(&self, input: NewIdentity) -> CoreResult<Identity> {
        // Uniqueness pre-check; the unique index on email is the
        // backstop.
        match self.get_identity_by_email(&input.email).await {
            Ok(_) => {
                return Err(CoreError::Conflict {
                    entity: "identity".into(),
                    key: input.email,
                });
            }
            Err(CoreError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let uid = Uuid::new_v4().to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('identity', $uid) SET \
                 email = $email, password_hash = $password_hash, \
                 display_name = $display_name, claims = NONE",
            )
            .bind(("uid", uid.clone()))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("display_name", input.display_name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "identity".into(),
            key: uid.clone(),
        })?;

        Ok(row.into_identity(uid)?)
    }

    async fn get_identity(&self, uid: &str) -> CoreResult<Identity> {
        let uid_owned = uid.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('identity', $uid)")
            .bind(("uid", uid_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "identity".into(),
            key: uid_owned.clone(),
        })?;

        Ok(row.into_identity(uid_owned)?)
    }

    async fn get_identity_by_email(&self, email: &str) -> CoreResult<Identity> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM identity WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdentityRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "identity".into(),
            key: format!("email={email}"),
        })?;

        Ok(row.try_into_identity()?)
    }

    async fn set_claims(&self, uid: &str, claims: Claims) -> CoreResult<()> {
        let uid_owned = uid.to_string();
        let claims_value = serde_json::to_value(&claims)
            .map_err(|e| DbError::Corrupt(format!("claims encode: {e}")))?;

        let result = self
            .db
            .query(
                "UPDATE type::record('identity', $uid) SET \
                 claims = $claims",
            )
            .bind(("uid", uid_owned.clone()))
            .bind(("claims", claims_value))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "identity".into(),
                key: uid_owned,
            }
            .into());
        }

        Ok(())
    }

    async fn update_password(&self, uid: &str, password: &str) -> CoreResult<()> {
        let uid_owned = uid.to_string();
        let password_hash = hash_password(password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "UPDATE type::record('identity', $uid) SET \
                 password_hash = $password_hash",
            )
            .bind(("uid", uid_owned.clone()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "identity".into(),
                key: uid_owned,
            }
            .into());
        }

        Ok(())
    }
}

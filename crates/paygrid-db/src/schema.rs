//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Generated keys are stored as strings. Enums are stored as strings
//! with ASSERT constraints. Unique indexes back the uniqueness
//! invariants that the service layer checks before writing.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations (tenants)
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD org_name ON TABLE organization TYPE string;
DEFINE FIELD domain ON TABLE organization TYPE string;
DEFINE FIELD domains ON TABLE organization TYPE array DEFAULT [];
DEFINE FIELD domains.* ON TABLE organization TYPE string;
DEFINE FIELD org_type ON TABLE organization TYPE string \
    ASSERT $value IN ['education', 'corporate', 'full'];
DEFINE FIELD subscription ON TABLE organization TYPE object FLEXIBLE;
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organization_domain ON TABLE organization \
    COLUMNS domain UNIQUE;

-- =======================================================================
-- Identities (identity-provider directory)
-- =======================================================================
DEFINE TABLE identity SCHEMAFULL;
DEFINE FIELD email ON TABLE identity TYPE string;
DEFINE FIELD password_hash ON TABLE identity TYPE string;
DEFINE FIELD display_name ON TABLE identity TYPE option<string>;
DEFINE FIELD claims ON TABLE identity FLEXIBLE TYPE option<object>;
DEFINE FIELD created_at ON TABLE identity TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_identity_email ON TABLE identity \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Profiles (denormalized mirror, keyed by uid)
-- =======================================================================
DEFINE TABLE profile SCHEMAFULL;
DEFINE FIELD org_id ON TABLE profile TYPE string;
DEFINE FIELD role ON TABLE profile TYPE string \
    ASSERT $value IN ['admin', 'employee', 'superadmin'];
DEFINE FIELD email ON TABLE profile TYPE string;
DEFINE FIELD details ON TABLE profile TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD is_active ON TABLE profile TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for tests that bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_defines_the_uniqueness_backstops() {
        assert!(SCHEMA_V1.contains("idx_organization_domain"));
        assert!(SCHEMA_V1.contains("idx_identity_email"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "migrations must be in ascending version order"
            );
        }
    }
}

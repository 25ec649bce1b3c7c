//! Integration tests for the SurrealDB-backed identity directory.

use paygrid_core::error::CoreError;
use paygrid_core::models::identity::{Claims, NewIdentity, Role};
use paygrid_core::repository::IdentityProvider;
use paygrid_db::repository::{SurrealIdentityProvider, verify_password};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use surrealdb_types::SurrealValue;

#[derive(Debug, SurrealValue)]
struct PasswordRow {
    password_hash: String,
}

/// Helper: read the stored hash for a uid straight from the table.
async fn stored_hash(db: &Surreal<surrealdb::engine::local::Db>, uid: &str) -> String {
    let mut result = db
        .query("SELECT password_hash FROM type::record('identity', $uid)")
        .bind(("uid", uid.to_string()))
        .await
        .unwrap();
    let rows: Vec<PasswordRow> = result.take(0).unwrap();
    rows.into_iter().next().unwrap().password_hash
}

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    paygrid_db::run_migrations(&db).await.unwrap();
    db
}

fn alice() -> NewIdentity {
    NewIdentity {
        email: "alice@acme.com".into(),
        password: "correct-horse-battery".into(),
        display_name: Some("Alice Smith".into()),
    }
}

#[tokio::test]
async fn create_and_get_identity() {
    let db = setup().await;
    let provider = SurrealIdentityProvider::new(db);

    let identity = provider.create_identity(alice()).await.unwrap();
    assert_eq!(identity.email, "alice@acme.com");
    assert_eq!(identity.display_name.as_deref(), Some("Alice Smith"));
    assert!(identity.claims.is_none());

    let by_uid = provider.get_identity(&identity.uid).await.unwrap();
    assert_eq!(by_uid.email, identity.email);

    let by_email = provider.get_identity_by_email("alice@acme.com").await.unwrap();
    assert_eq!(by_email.uid, identity.uid);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let db = setup().await;
    let provider = SurrealIdentityProvider::new(db);

    provider.create_identity(alice()).await.unwrap();

    let result = provider.create_identity(alice()).await;
    assert!(matches!(result, Err(CoreError::Conflict { .. })));
}

#[tokio::test]
async fn set_claims_overwrites_the_whole_object() {
    let db = setup().await;
    let provider = SurrealIdentityProvider::new(db);

    let identity = provider.create_identity(alice()).await.unwrap();

    provider
        .set_claims(
            &identity.uid,
            Claims {
                org_id: "org-1".into(),
                role: Role::Employee,
            },
        )
        .await
        .unwrap();

    provider
        .set_claims(
            &identity.uid,
            Claims {
                org_id: "org-2".into(),
                role: Role::Admin,
            },
        )
        .await
        .unwrap();

    let fetched = provider.get_identity(&identity.uid).await.unwrap();
    let claims = fetched.claims.unwrap();
    assert_eq!(claims.org_id, "org-2");
    assert_eq!(claims.role, Role::Admin);
}

#[tokio::test]
async fn set_claims_on_missing_identity_is_not_found() {
    let db = setup().await;
    let provider = SurrealIdentityProvider::new(db);

    let result = provider
        .set_claims(
            "no-such-uid",
            Claims {
                org_id: "org-1".into(),
                role: Role::Admin,
            },
        )
        .await;
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn update_password_rehashes() {
    let db = setup().await;
    let provider = SurrealIdentityProvider::new(db.clone());

    let identity = provider.create_identity(alice()).await.unwrap();
    provider
        .update_password(&identity.uid, "new-passphrase-42")
        .await
        .unwrap();

    // Fetch the stored hash directly and verify against both passwords.
    let hash = stored_hash(&db, &identity.uid).await;

    assert!(verify_password("new-passphrase-42", &hash, None).unwrap());
    assert!(!verify_password("correct-horse-battery", &hash, None).unwrap());
}

#[tokio::test]
async fn pepper_changes_the_verification_input() {
    let db = setup().await;
    let provider = SurrealIdentityProvider::with_pepper(db.clone(), "server-pepper".into());

    let identity = provider.create_identity(alice()).await.unwrap();

    let hash = stored_hash(&db, &identity.uid).await;

    assert!(verify_password("correct-horse-battery", &hash, Some("server-pepper")).unwrap());
    assert!(!verify_password("correct-horse-battery", &hash, None).unwrap());
}

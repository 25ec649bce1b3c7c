//! Integration tests for the Organization and Profile repository
//! implementations using in-memory SurrealDB.

use chrono::Utc;
use paygrid_core::error::CoreError;
use paygrid_core::models::identity::Role;
use paygrid_core::models::organization::{CreateOrganization, OrgType, Subscription};
use paygrid_core::models::profile::{Profile, ProfileDetails};
use paygrid_core::repository::{OrganizationRepository, ProfileRepository};
use paygrid_db::repository::{SurrealOrganizationRepository, SurrealProfileRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    paygrid_db::run_migrations(&db).await.unwrap();
    db
}

fn acme_org() -> CreateOrganization {
    CreateOrganization {
        org_name: "ACME Corp".into(),
        domain: "acme.com".into(),
        domains: vec!["acme.co.uk".into()],
        org_type: OrgType::Corporate,
        subscription: Some(Subscription::trial(Utc::now())),
    }
}

// -----------------------------------------------------------------------
// Organization tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_organization() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let org = repo.create(acme_org()).await.unwrap();
    assert_eq!(org.org_name, "ACME Corp");
    assert_eq!(org.domain, "acme.com");
    assert_eq!(org.domains, vec!["acme.co.uk".to_string()]);
    assert_eq!(org.org_type, OrgType::Corporate);

    let fetched = repo.get_by_id(&org.id).await.unwrap();
    assert_eq!(fetched.id, org.id);
    assert_eq!(fetched.domain, org.domain);
    assert_eq!(fetched.subscription, org.subscription);
}

#[tokio::test]
async fn get_organization_by_domain() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let org = repo.create(acme_org()).await.unwrap();

    let fetched = repo.get_by_domain("acme.com").await.unwrap();
    assert_eq!(fetched.id, org.id);

    let missing = repo.get_by_domain("nobody.example").await;
    assert!(matches!(missing, Err(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn find_organization_by_alias() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let org = repo.create(acme_org()).await.unwrap();

    let matches = repo.find_by_alias("acme.co.uk").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, org.id);

    // The primary domain is not in the alias set.
    let matches = repo.find_by_alias("acme.com").await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn duplicate_primary_domain_is_rejected_by_the_index() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    repo.create(acme_org()).await.unwrap();

    let mut dup = acme_org();
    dup.org_name = "ACME Imitation".into();
    dup.domains = vec![];
    assert!(repo.create(dup).await.is_err());
}

#[tokio::test]
async fn update_domains_replaces_the_whole_set() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let org = repo.create(acme_org()).await.unwrap();

    let updated = repo
        .update_domains(
            &org.id,
            "acme.com".into(),
            vec!["acme.co.uk".into(), "acme.dev".into()],
        )
        .await
        .unwrap();
    assert_eq!(updated.domains.len(), 2);

    let matches = repo.find_by_alias("acme.dev").await.unwrap();
    assert_eq!(matches.len(), 1);
}

// -----------------------------------------------------------------------
// Profile tests
// -----------------------------------------------------------------------

fn profile(uid: &str, org_id: &str, role: Role) -> Profile {
    let now = Utc::now();
    Profile {
        uid: uid.into(),
        org_id: org_id.into(),
        role,
        email: "bob@acme.com".into(),
        details: ProfileDetails {
            first_name: Some("Bob".into()),
            last_name: Some("Jones".into()),
            department: Some("Finance".into()),
            ..ProfileDetails::default()
        },
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn upsert_and_get_profile() {
    let db = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let stored = repo.upsert(profile("uid-1", "org-1", Role::Employee)).await.unwrap();
    assert_eq!(stored.uid, "uid-1");
    assert_eq!(stored.role, Role::Employee);

    let fetched = repo.get("uid-1").await.unwrap();
    assert_eq!(fetched.org_id, "org-1");
    assert_eq!(fetched.details.first_name.as_deref(), Some("Bob"));

    let missing = repo.get("uid-unknown").await;
    assert!(matches!(missing, Err(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn update_binding_preserves_details() {
    let db = setup().await;
    let repo = SurrealProfileRepository::new(db);

    repo.upsert(profile("uid-1", "org-1", Role::Employee)).await.unwrap();

    let updated = repo.update_binding("uid-1", "org-2", Role::Admin).await.unwrap();
    assert_eq!(updated.org_id, "org-2");
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.details.department.as_deref(), Some("Finance"));
    assert_eq!(updated.email, "bob@acme.com");
}

#[tokio::test]
async fn update_binding_on_missing_profile_is_not_found() {
    let db = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let result = repo.update_binding("uid-unknown", "org-1", Role::Admin).await;
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}

//! Integration tests for organization + administrator provisioning.

use chrono::Utc;
use paygrid_core::error::CoreError;
use paygrid_core::models::identity::{NewIdentity, Role};
use paygrid_core::models::organization::{CreateOrganization, OrgType, Subscription};
use paygrid_core::repository::{IdentityProvider, OrganizationRepository, ProfileRepository};
use paygrid_db::repository::{
    SurrealIdentityProvider, SurrealOrganizationRepository, SurrealProfileRepository,
};
use paygrid_tenancy::{ProvisionRequest, ProvisionStep, ProvisioningService};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

type Db = surrealdb::engine::local::Db;

struct Harness {
    org_repo: SurrealOrganizationRepository<Db>,
    profile_repo: SurrealProfileRepository<Db>,
    provider: SurrealIdentityProvider<Db>,
    service: ProvisioningService<
        SurrealOrganizationRepository<Db>,
        SurrealProfileRepository<Db>,
        SurrealIdentityProvider<Db>,
    >,
}

/// Helper: spin up in-memory DB, run migrations, build the service.
async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    paygrid_db::run_migrations(&db).await.unwrap();

    let org_repo = SurrealOrganizationRepository::new(db.clone());
    let profile_repo = SurrealProfileRepository::new(db.clone());
    let provider = SurrealIdentityProvider::new(db.clone());
    let service = ProvisioningService::new(
        org_repo.clone(),
        profile_repo.clone(),
        provider.clone(),
    );

    Harness {
        org_repo,
        profile_repo,
        provider,
        service,
    }
}

fn request(domain: &str, email: &str) -> ProvisionRequest {
    ProvisionRequest {
        org: CreateOrganization {
            org_name: "NewCo".into(),
            domain: domain.into(),
            domains: vec![],
            org_type: OrgType::Corporate,
            subscription: None,
        },
        admin: NewIdentity {
            email: email.into(),
            password: "correct-horse-battery".into(),
            display_name: Some("Ada Lovelace".into()),
        },
    }
}

#[tokio::test]
async fn provisions_org_identity_claims_and_profile() {
    let h = setup().await;

    let provisioned = h
        .service
        .provision(request("HTTPS://Www.NewCo.COM/", "ada@newco.com"))
        .await
        .unwrap();

    assert_eq!(
        provisioned.steps,
        vec![
            ProvisionStep::CreatedOrganization,
            ProvisionStep::CreatedIdentity,
            ProvisionStep::ClaimsSet,
            ProvisionStep::ProfileCreated,
        ]
    );

    // The domain is stored normalized.
    let org = h.org_repo.get_by_domain("newco.com").await.unwrap();
    assert_eq!(org.id, provisioned.org_id);

    let identity = h.provider.get_identity(&provisioned.uid).await.unwrap();
    let claims = identity.claims.expect("admin claims set");
    assert_eq!(claims.org_id, org.id);
    assert_eq!(claims.role, Role::Admin);

    let profile = h.profile_repo.get(&provisioned.uid).await.unwrap();
    assert_eq!(profile.org_id, org.id);
    assert_eq!(profile.role, Role::Admin);
    assert_eq!(profile.email, "ada@newco.com");
    assert_eq!(profile.details.first_name.as_deref(), Some("Ada"));
    assert_eq!(profile.details.last_name.as_deref(), Some("Lovelace"));
    assert!(profile.is_active);
}

#[tokio::test]
async fn provisioning_twice_reports_conflict_without_duplicates() {
    let h = setup().await;

    h.service
        .provision(request("newco.com", "ada@newco.com"))
        .await
        .unwrap();

    let second = h
        .service
        .provision(request("newco.com", "ada@newco.com"))
        .await;
    assert!(matches!(
        second,
        Err(CoreError::Conflict { ref entity, .. }) if entity == "organization"
    ));

    // Exactly one organization and one identity exist.
    assert!(h.org_repo.get_by_domain("newco.com").await.is_ok());
    assert!(h.provider.get_identity_by_email("ada@newco.com").await.is_ok());
}

#[tokio::test]
async fn taken_email_is_an_identity_conflict() {
    let h = setup().await;

    h.service
        .provision(request("first.com", "ada@newco.com"))
        .await
        .unwrap();

    let result = h
        .service
        .provision(request("second.com", "ada@newco.com"))
        .await;
    assert!(matches!(
        result,
        Err(CoreError::Conflict { ref entity, .. }) if entity == "identity"
    ));
}

#[tokio::test]
async fn domain_owned_as_alias_is_a_conflict() {
    let h = setup().await;

    h.org_repo
        .create(CreateOrganization {
            org_name: "Holder".into(),
            domain: "holder.com".into(),
            domains: vec!["newco.com".into()],
            org_type: OrgType::Corporate,
            subscription: Some(Subscription::trial(Utc::now())),
        })
        .await
        .unwrap();

    let result = h
        .service
        .provision(request("newco.com", "ada@newco.com"))
        .await;
    assert!(matches!(result, Err(CoreError::Conflict { .. })));
}

#[tokio::test]
async fn resume_completes_a_partially_created_tenant() {
    let h = setup().await;

    // Simulate a crash after step 1: the organization exists, nothing
    // else does.
    h.org_repo
        .create(CreateOrganization {
            org_name: "NewCo".into(),
            domain: "newco.com".into(),
            domains: vec![],
            org_type: OrgType::Corporate,
            subscription: Some(Subscription::trial(Utc::now())),
        })
        .await
        .unwrap();

    let provisioned = h
        .service
        .resume(request("newco.com", "ada@newco.com"))
        .await
        .unwrap();

    assert_eq!(
        provisioned.steps,
        vec![
            ProvisionStep::CreatedIdentity,
            ProvisionStep::ClaimsSet,
            ProvisionStep::ProfileCreated,
        ]
    );
    assert!(h.profile_repo.get(&provisioned.uid).await.is_ok());

    // A second resume finds nothing to do.
    let again = h
        .service
        .resume(request("newco.com", "ada@newco.com"))
        .await
        .unwrap();
    assert!(again.steps.is_empty());
    assert_eq!(again.org_id, provisioned.org_id);
    assert_eq!(again.uid, provisioned.uid);

    // A strict provision of the now-complete tenant is a conflict.
    let strict = h
        .service
        .provision(request("newco.com", "ada@newco.com"))
        .await;
    assert!(matches!(strict, Err(CoreError::Conflict { .. })));
}

#[tokio::test]
async fn resume_never_rebinds_an_identity_owned_by_another_tenant() {
    let h = setup().await;

    h.service
        .provision(request("first.com", "ada@newco.com"))
        .await
        .unwrap();

    let result = h
        .service
        .resume(request("second.com", "ada@newco.com"))
        .await;
    assert!(matches!(
        result,
        Err(CoreError::Conflict { ref entity, .. }) if entity == "identity"
    ));

    // The identity still belongs to the first organization.
    let first = h.org_repo.get_by_domain("first.com").await.unwrap();
    let identity = h.provider.get_identity_by_email("ada@newco.com").await.unwrap();
    assert_eq!(identity.claims.unwrap().org_id, first.id);
}

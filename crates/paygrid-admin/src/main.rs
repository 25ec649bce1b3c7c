//! PAYGRID Admin — operator CLI for tenant provisioning and repair.
//!
//! Every subcommand is a thin wrapper over the tenancy services; all
//! business rules live in `paygrid-tenancy`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use paygrid_core::error::{CoreError, CoreResult};
use paygrid_core::models::identity::{NewIdentity, Role};
use paygrid_core::models::organization::{CreateOrganization, OrgType};
use paygrid_core::repository::IdentityProvider;
use paygrid_db::repository::{
    SurrealIdentityProvider, SurrealOrganizationRepository, SurrealProfileRepository,
};
use paygrid_db::{DbConfig, DbManager};
use paygrid_tenancy::{
    ProvisionRequest, ProvisioningService, ReconcileService, TenancyConfig, TenantResolver,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "paygrid-admin", about = "PAYGRID operator tools", version)]
struct Cli {
    #[command(flatten)]
    db: DbOpts,

    /// Reserved platform-level tenant id for superadmin elevation.
    #[arg(long, global = true, default_value = "platform")]
    platform_org: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct DbOpts {
    /// SurrealDB WebSocket URL.
    #[arg(long, global = true, default_value = "127.0.0.1:8000")]
    db_url: String,

    #[arg(long, global = true, default_value = "paygrid")]
    db_namespace: String,

    #[arg(long, global = true, default_value = "main")]
    db_name: String,

    #[arg(long, global = true, default_value = "root")]
    db_username: String,

    #[arg(long, global = true, default_value = "root")]
    db_password: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrgTypeArg {
    Education,
    Corporate,
    Full,
}

impl From<OrgTypeArg> for OrgType {
    fn from(value: OrgTypeArg) -> Self {
        match value {
            OrgTypeArg::Education => OrgType::Education,
            OrgTypeArg::Corporate => OrgType::Corporate,
            OrgTypeArg::Full => OrgType::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    Employee,
    Superadmin,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => Role::Admin,
            RoleArg::Employee => Role::Employee,
            RoleArg::Superadmin => Role::Superadmin,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an organization together with its first administrator.
    CreateOrg {
        #[arg(long)]
        name: String,
        #[arg(long)]
        domain: String,
        /// Alias domains beyond the primary; repeatable.
        #[arg(long = "alias")]
        aliases: Vec<String>,
        #[arg(long, value_enum, default_value = "corporate")]
        org_type: OrgTypeArg,
        #[arg(long)]
        admin_email: String,
        #[arg(long)]
        admin_password: String,
        #[arg(long)]
        admin_name: Option<String>,
        /// Finish a partially applied earlier run instead of failing
        /// on the existing organization.
        #[arg(long)]
        resume: bool,
    },

    /// Rewrite an identity's claim pair and reconcile the profile.
    SetClaims {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        org: String,
        #[arg(long, value_enum)]
        role: RoleArg,
    },

    /// Converge an identity's claims and profile.
    Reconcile {
        #[arg(long)]
        uid: String,
    },

    /// Reset an identity's password, looked up by email.
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Debug lookup: which organization owns a domain.
    Resolve { domain: String },

    /// Attach an alias domain to an organization.
    AddAlias {
        #[arg(long)]
        org: String,
        #[arg(long)]
        domain: String,
    },

    /// Normalize an organization's stored domain and aliases.
    RepairDomains {
        #[arg(long)]
        org: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("paygrid=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CoreResult<()> {
    let db_config = DbConfig {
        url: cli.db.db_url,
        namespace: cli.db.db_namespace,
        database: cli.db.db_name,
        username: cli.db.db_username,
        password: cli.db.db_password,
    };
    let manager = DbManager::connect(&db_config)
        .await
        .map_err(|e| CoreError::Upstream(e.to_string()))?;
    let db = manager.client().clone();
    paygrid_db::run_migrations(&db)
        .await
        .map_err(|e| CoreError::Upstream(e.to_string()))?;

    let org_repo = SurrealOrganizationRepository::new(db.clone());
    let profile_repo = SurrealProfileRepository::new(db.clone());
    let provider = SurrealIdentityProvider::new(db.clone());

    let tenancy_config = TenancyConfig {
        platform_org_id: cli.platform_org,
        ..TenancyConfig::default()
    };

    match cli.command {
        Command::CreateOrg {
            name,
            domain,
            aliases,
            org_type,
            admin_email,
            admin_password,
            admin_name,
            resume,
        } => {
            let service = ProvisioningService::new(org_repo, profile_repo, provider);
            let request = ProvisionRequest {
                org: CreateOrganization {
                    org_name: name,
                    domain,
                    domains: aliases,
                    org_type: org_type.into(),
                    subscription: None,
                },
                admin: NewIdentity {
                    email: admin_email,
                    password: admin_password,
                    display_name: admin_name,
                },
            };
            let provisioned = if resume {
                service.resume(request).await?
            } else {
                service.provision(request).await?
            };
            println!("organization: {}", provisioned.org_id);
            println!("administrator: {}", provisioned.uid);
            if provisioned.steps.is_empty() {
                println!("steps: none (already provisioned)");
            } else {
                println!("steps: {:?}", provisioned.steps);
            }
        }

        Command::SetClaims { uid, org, role } => {
            let service =
                ReconcileService::new(org_repo, profile_repo, provider, tenancy_config);
            let outcome = service.set_claims(&uid, &org, role.into()).await?;
            println!("outcome: {outcome:?}");
            println!("note: existing tokens stay stale until the identity signs in again");
        }

        Command::Reconcile { uid } => {
            let service =
                ReconcileService::new(org_repo, profile_repo, provider, tenancy_config);
            let outcome = service.reconcile(&uid).await?;
            println!("outcome: {outcome:?}");
        }

        Command::ResetPassword { email, password } => {
            let identity = provider.get_identity_by_email(&email).await?;
            provider.update_password(&identity.uid, &password).await?;
            println!("password updated for {}", identity.uid);
        }

        Command::Resolve { domain } => {
            let resolver = TenantResolver::new(org_repo);
            let org = resolver.resolve(&domain).await?;
            println!("organization: {} ({})", org.id, org.org_name);
            println!("primary domain: {}", org.domain);
            if !org.domains.is_empty() {
                println!("aliases: {}", org.domains.join(", "));
            }
        }

        Command::AddAlias { org, domain } => {
            let resolver = TenantResolver::new(org_repo);
            let updated = resolver.add_alias(&org, &domain).await?;
            println!("aliases for {}: {}", updated.id, updated.domains.join(", "));
        }

        Command::RepairDomains { org } => {
            let resolver = TenantResolver::new(org_repo);
            let updated = resolver.repair_domains(&org).await?;
            println!("primary domain: {}", updated.domain);
            println!("aliases: {}", updated.domains.join(", "));
        }
    }

    Ok(())
}

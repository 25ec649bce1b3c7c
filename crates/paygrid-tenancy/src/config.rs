//! Tenancy service configuration.

use paygrid_core::models::identity::PLATFORM_ORG;

/// Configuration shared by the tenancy services.
#[derive(Debug, Clone)]
pub struct TenancyConfig {
    /// PEM-encoded Ed25519 private key for identity-token signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for identity-token verification.
    pub jwt_public_key_pem: String,
    /// Identity token lifetime in seconds (default: 3600).
    pub token_lifetime_secs: u64,
    /// Token issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Reserved platform-level tenant id that superadmin claims may
    /// bind to without an organization record existing under it.
    pub platform_org_id: String,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            token_lifetime_secs: 3600,
            jwt_issuer: "paygrid".into(),
            platform_org_id: PLATFORM_ORG.into(),
        }
    }
}

//! Profile domain model.
//!
//! The profile is the persisted, denormalized mirror of an identity's
//! tenant binding plus descriptive payroll fields, keyed by the same
//! uid. Claims are the authoritative side: whenever both exist, the
//! profile's `org_id`/`role` must match the claim pair.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::identity::Role;

/// Descriptive payroll fields nested inside a profile document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Same key as the identity it mirrors.
    pub uid: String,
    pub org_id: String,
    pub role: Role,
    pub email: String,
    pub details: ProfileDetails,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

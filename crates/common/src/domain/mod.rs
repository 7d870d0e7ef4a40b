//! Tenant domain model
//!
//! The aggregate root, its lifecycle state machine and the validation
//! rules shared by the orchestrator and the API edge.

mod tenant;

pub use tenant::{format_schema_name, AttrBag, Tenant};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Initial schema version stamped onto new tenants.
pub const INITIAL_SCHEMA_VERSION: &str = "1.0.0";

/// Lifecycle state of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Provisioning,
    Active,
    Suspended,
    Archived,
    Deleted,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Provisioning => "provisioning",
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Archived => "archived",
            TenantStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provisioning" => Ok(TenantStatus::Provisioning),
            "active" => Ok(TenantStatus::Active),
            "suspended" => Ok(TenantStatus::Suspended),
            "archived" => Ok(TenantStatus::Archived),
            "deleted" => Ok(TenantStatus::Deleted),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Subscription plan tier. Quota defaults derive from the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Basic,
    Professional,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Basic => "basic",
            PlanTier::Professional => "professional",
            PlanTier::Enterprise => "enterprise",
        }
    }

    /// Default seat quota for the tier.
    pub fn default_max_users(&self) -> i32 {
        match self {
            PlanTier::Free => 5,
            PlanTier::Basic => 20,
            PlanTier::Professional => 100,
            PlanTier::Enterprise => 1000,
        }
    }

    /// Default storage quota in gigabytes for the tier.
    pub fn default_max_storage_gb(&self) -> i32 {
        match self {
            PlanTier::Free => 5,
            PlanTier::Basic => 50,
            PlanTier::Professional => 500,
            PlanTier::Enterprise => 5000,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanTier::Free),
            "basic" => Ok(PlanTier::Basic),
            "professional" => Ok(PlanTier::Professional),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(Error::InvalidPlan(other.to_string())),
        }
    }
}

/// Validate a tenant display name: 1..=255 characters.
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidName("name cannot be empty".into()));
    }
    if name.len() > 255 {
        return Err(Error::InvalidName(
            "name cannot exceed 255 characters".into(),
        ));
    }
    Ok(())
}

/// Validate a tenant slug: 1..=100 characters, `[a-z0-9-]+`.
pub fn validate_slug(slug: &str) -> Result<(), Error> {
    if slug.is_empty() {
        return Err(Error::InvalidSlug("slug cannot be empty".into()));
    }
    if slug.len() > 100 {
        return Err(Error::InvalidSlug(
            "slug cannot exceed 100 characters".into(),
        ));
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(Error::InvalidSlug(
            "slug must contain only lowercase letters, numbers and hyphens".into(),
        ));
    }
    Ok(())
}

/// Validate a contact email: 1..=255 characters containing `@`.
pub fn validate_email(email: &str) -> Result<(), Error> {
    if email.is_empty() {
        return Err(Error::InvalidEmail("email cannot be empty".into()));
    }
    if email.len() > 255 {
        return Err(Error::InvalidEmail(
            "email cannot exceed 255 characters".into(),
        ));
    }
    if !email.contains('@') {
        return Err(Error::InvalidEmail("invalid email format".into()));
    }
    Ok(())
}

//! The tenant aggregate root.
//!
//! All lifecycle transitions go through the methods here; a rejected
//! transition leaves the aggregate untouched, `updated_at` included.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{
    validate_email, validate_name, validate_slug, PlanTier, TenantStatus, INITIAL_SCHEMA_VERSION,
};
use crate::errors::Error;

/// Free-form JSON attribute bag (`settings`, `features`).
pub type AttrBag = serde_json::Map<String, Value>;

/// A tenant owns exactly one physical PostgreSQL schema and moves through
/// the lifecycle {provisioning, active, suspended, archived, deleted}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Surrogate registry primary key.
    pub id: Uuid,
    /// Stable external tenant identifier.
    pub tenant_id: Uuid,
    pub name: String,
    pub slug: String,
    /// Physical schema, derived from `tenant_id` (see [`format_schema_name`]).
    pub schema_name: String,
    pub schema_version: String,
    pub status: TenantStatus,
    pub plan: PlanTier,
    pub max_users: i32,
    pub max_storage_gb: i32,
    pub primary_contact_email: String,
    pub primary_contact_name: Option<String>,
    pub billing_email: Option<String>,
    pub settings: AttrBag,
    pub features: AttrBag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

/// Format a tenant id into its PostgreSQL schema name.
///
/// `550e8400-e29b-41d4-a716-446655440000` →
/// `tenant_550e8400e29b41d4a716446655440000`
pub fn format_schema_name(tenant_id: Uuid) -> String {
    format!("tenant_{}", tenant_id.simple())
}

impl Tenant {
    /// Create a new tenant in `Provisioning` state with plan-derived quotas.
    pub fn new(name: &str, slug: &str, plan: PlanTier, email: &str) -> Result<Self, Error> {
        validate_name(name)?;
        validate_slug(slug)?;
        validate_email(email)?;

        let tenant_id = Uuid::new_v4();
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            slug: slug.to_string(),
            schema_name: format_schema_name(tenant_id),
            schema_version: INITIAL_SCHEMA_VERSION.to_string(),
            status: TenantStatus::Provisioning,
            plan,
            max_users: plan.default_max_users(),
            max_storage_gb: plan.default_max_storage_gb(),
            primary_contact_email: email.to_string(),
            primary_contact_name: None,
            billing_email: Some(email.to_string()),
            settings: AttrBag::new(),
            features: AttrBag::new(),
            created_at: now,
            updated_at: now,
            activated_at: None,
            suspended_at: None,
            deleted_at: None,
            created_by: None,
            updated_by: None,
        })
    }

    // Transitions

    /// Activate the tenant (initial provisioning or reactivation after a
    /// suspension). `activated_at` is stamped on the first activation only.
    pub fn activate(&mut self) -> Result<(), Error> {
        match self.status {
            TenantStatus::Deleted => return Err(Error::TenantDeleted),
            TenantStatus::Active => return Err(Error::AlreadyActive),
            TenantStatus::Provisioning | TenantStatus::Suspended => {}
            from => {
                return Err(Error::InvalidTransition {
                    from,
                    to: TenantStatus::Active,
                })
            }
        }

        let now = Utc::now();
        self.status = TenantStatus::Active;
        if self.activated_at.is_none() {
            self.activated_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Suspend an active tenant, recording the reason under
    /// `settings.suspension_reason` (overwriting any prior value).
    pub fn suspend(&mut self, reason: &str) -> Result<(), Error> {
        match self.status {
            TenantStatus::Deleted => return Err(Error::TenantDeleted),
            TenantStatus::Suspended => return Err(Error::AlreadySuspended),
            TenantStatus::Active => {}
            from => {
                return Err(Error::InvalidTransition {
                    from,
                    to: TenantStatus::Suspended,
                })
            }
        }

        let now = Utc::now();
        self.status = TenantStatus::Suspended;
        self.suspended_at = Some(now);
        self.updated_at = now;
        self.settings
            .insert("suspension_reason".to_string(), Value::from(reason));
        Ok(())
    }

    /// Soft-delete the tenant. The registry row and physical schema are
    /// retained; `Deleted` is terminal.
    pub fn delete(&mut self) -> Result<(), Error> {
        match self.status {
            TenantStatus::Deleted => return Err(Error::AlreadyDeleted),
            TenantStatus::Active | TenantStatus::Suspended | TenantStatus::Archived => {}
            from => {
                return Err(Error::InvalidTransition {
                    from,
                    to: TenantStatus::Deleted,
                })
            }
        }

        let now = Utc::now();
        self.status = TenantStatus::Deleted;
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Archive an active tenant. Reserved transition: the aggregate supports
    /// it, no API exposes it yet.
    pub fn archive(&mut self) -> Result<(), Error> {
        match self.status {
            TenantStatus::Deleted => return Err(Error::TenantDeleted),
            TenantStatus::Active => {}
            from => {
                return Err(Error::InvalidTransition {
                    from,
                    to: TenantStatus::Archived,
                })
            }
        }

        self.status = TenantStatus::Archived;
        self.updated_at = Utc::now();
        Ok(())
    }

    // Mutations

    pub fn update_name(&mut self, name: &str) -> Result<(), Error> {
        if self.is_deleted() {
            return Err(Error::TenantDeleted);
        }
        validate_name(name)?;
        self.name = name.to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn update_contact_email(&mut self, email: &str) -> Result<(), Error> {
        if self.is_deleted() {
            return Err(Error::TenantDeleted);
        }
        validate_email(email)?;
        self.primary_contact_email = email.to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Change the subscription plan, rewriting quotas from the new tier and
    /// recording the change under `settings`.
    pub fn change_plan(&mut self, new_plan: PlanTier) -> Result<(), Error> {
        if self.is_deleted() {
            return Err(Error::TenantDeleted);
        }
        if self.plan == new_plan {
            return Err(Error::PlanUnchanged);
        }

        let old_plan = self.plan;
        let now = Utc::now();
        self.plan = new_plan;
        self.max_users = new_plan.default_max_users();
        self.max_storage_gb = new_plan.default_max_storage_gb();
        self.updated_at = now;
        self.settings
            .insert("plan_changed_from".to_string(), Value::from(old_plan.as_str()));
        self.settings
            .insert("plan_changed_at".to_string(), Value::from(now.to_rfc3339()));
        Ok(())
    }

    /// Merge keys into the settings bag; keys the caller omitted are kept.
    pub fn merge_settings(&mut self, incoming: AttrBag) {
        for (k, v) in incoming {
            self.settings.insert(k, v);
        }
        self.updated_at = Utc::now();
    }

    // Queries

    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    pub fn is_suspended(&self) -> bool {
        self.status == TenantStatus::Suspended
    }

    pub fn is_deleted(&self) -> bool {
        self.status == TenantStatus::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> Tenant {
        Tenant::new(
            "Test Company",
            "test-company",
            PlanTier::Professional,
            "admin@test.com",
        )
        .unwrap()
    }

    #[test]
    fn test_new_tenant_defaults() {
        let t = tenant();
        assert_eq!(t.status, TenantStatus::Provisioning);
        assert_eq!(t.plan, PlanTier::Professional);
        assert_eq!(t.max_users, 100);
        assert_eq!(t.max_storage_gb, 500);
        assert_eq!(t.schema_version, "1.0.0");
        assert_eq!(t.billing_email.as_deref(), Some("admin@test.com"));
        assert!(t.settings.is_empty());
        assert!(t.features.is_empty());
        assert!(t.activated_at.is_none());
        assert_ne!(t.id, Uuid::nil());
        assert_ne!(t.tenant_id, Uuid::nil());
    }

    #[test]
    fn test_new_tenant_validation() {
        assert!(matches!(
            Tenant::new("", "slug", PlanTier::Free, "a@b.c"),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            Tenant::new("Name", "", PlanTier::Free, "a@b.c"),
            Err(Error::InvalidSlug(_))
        ));
        assert!(matches!(
            Tenant::new("Name", "Bad Slug", PlanTier::Free, "a@b.c"),
            Err(Error::InvalidSlug(_))
        ));
        assert!(matches!(
            Tenant::new("Name", "slug", PlanTier::Free, "not-an-email"),
            Err(Error::InvalidEmail(_))
        ));
        assert!(matches!(
            Tenant::new("Name", &"x".repeat(101), PlanTier::Free, "a@b.c"),
            Err(Error::InvalidSlug(_))
        ));
    }

    #[test]
    fn test_format_schema_name() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let schema = format_schema_name(id);
        assert_eq!(schema, "tenant_550e8400e29b41d4a716446655440000");
        assert!(!schema.contains('-'));
    }

    #[test]
    fn test_activate() {
        let mut t = tenant();
        t.activate().unwrap();
        assert_eq!(t.status, TenantStatus::Active);
        assert!(t.activated_at.is_some());

        assert!(matches!(t.activate(), Err(Error::AlreadyActive)));
    }

    #[test]
    fn test_activated_at_is_set_once() {
        let mut t = tenant();
        t.activate().unwrap();
        let first = t.activated_at.unwrap();

        t.suspend("payment overdue for 30 days").unwrap();
        t.activate().unwrap();
        assert_eq!(t.activated_at.unwrap(), first);
    }

    #[test]
    fn test_suspend_records_reason() {
        let mut t = tenant();
        t.activate().unwrap();

        t.suspend("payment overdue for 30 days").unwrap();
        assert_eq!(t.status, TenantStatus::Suspended);
        assert!(t.suspended_at.is_some());
        assert_eq!(
            t.settings.get("suspension_reason").and_then(Value::as_str),
            Some("payment overdue for 30 days")
        );

        assert!(matches!(
            t.suspend("another reason"),
            Err(Error::AlreadySuspended)
        ));
    }

    #[test]
    fn test_suspend_requires_active() {
        let mut t = tenant();
        assert!(matches!(
            t.suspend("not yet provisioned"),
            Err(Error::InvalidTransition { .. })
        ));
        assert_eq!(t.status, TenantStatus::Provisioning);
    }

    #[test]
    fn test_delete_is_terminal() {
        let mut t = tenant();
        t.activate().unwrap();
        t.delete().unwrap();
        assert_eq!(t.status, TenantStatus::Deleted);
        assert!(t.deleted_at.is_some());

        assert!(matches!(t.delete(), Err(Error::AlreadyDeleted)));
        assert!(matches!(t.activate(), Err(Error::TenantDeleted)));
        assert!(matches!(t.suspend("r"), Err(Error::TenantDeleted)));
        assert!(matches!(t.update_name("New"), Err(Error::TenantDeleted)));
    }

    #[test]
    fn test_delete_from_provisioning_rejected() {
        let mut t = tenant();
        assert!(matches!(
            t.delete(),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_rejected_transition_leaves_fields_untouched() {
        let mut t = tenant();
        t.activate().unwrap();
        let before = t.clone();

        assert!(t.activate().is_err());
        assert_eq!(t.status, before.status);
        assert_eq!(t.updated_at, before.updated_at);
        assert_eq!(t.activated_at, before.activated_at);
        assert_eq!(t.settings, before.settings);
    }

    #[test]
    fn test_change_plan() {
        let mut t = Tenant::new("T", "t", PlanTier::Basic, "a@b.c").unwrap();
        t.change_plan(PlanTier::Professional).unwrap();
        assert_eq!(t.plan, PlanTier::Professional);
        assert_eq!(t.max_users, 100);
        assert_eq!(t.max_storage_gb, 500);
        assert_eq!(
            t.settings.get("plan_changed_from").and_then(Value::as_str),
            Some("basic")
        );
        assert!(t.settings.contains_key("plan_changed_at"));

        assert!(matches!(
            t.change_plan(PlanTier::Professional),
            Err(Error::PlanUnchanged)
        ));
    }

    #[test]
    fn test_merge_settings_keeps_omitted_keys() {
        let mut t = tenant();
        t.settings.insert("theme".into(), Value::from("dark"));

        let mut incoming = AttrBag::new();
        incoming.insert("locale".into(), Value::from("en-GB"));
        t.merge_settings(incoming);

        assert_eq!(t.settings.get("theme").and_then(Value::as_str), Some("dark"));
        assert_eq!(
            t.settings.get("locale").and_then(Value::as_str),
            Some("en-GB")
        );
    }

    #[test]
    fn test_archive_reserved_transition() {
        let mut t = tenant();
        assert!(matches!(t.archive(), Err(Error::InvalidTransition { .. })));
        t.activate().unwrap();
        t.archive().unwrap();
        assert_eq!(t.status, TenantStatus::Archived);
        // Archived tenants can still be soft-deleted.
        t.delete().unwrap();
        assert_eq!(t.status, TenantStatus::Deleted);
    }

    #[test]
    fn test_status_and_plan_parsing() {
        assert_eq!("active".parse::<TenantStatus>().unwrap(), TenantStatus::Active);
        assert!("bogus".parse::<TenantStatus>().is_err());
        assert_eq!("enterprise".parse::<PlanTier>().unwrap(), PlanTier::Enterprise);
        assert!("gold".parse::<PlanTier>().is_err());
    }
}

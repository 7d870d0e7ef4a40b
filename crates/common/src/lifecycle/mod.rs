//! Lifecycle orchestrator
//!
//! Composes the registry store, the schema provisioner and the event
//! publisher into the tenant use cases. The create flow is the critical
//! path: registry insert, schema provisioning and activation cross the
//! DDL/DML boundary and are deliberately not atomic — a failure after the
//! insert leaves the row in `Provisioning` for the reconciler, it is never
//! rolled back here.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{ListFilter, TenantStore};
use crate::domain::{
    validate_email, validate_name, validate_slug, AttrBag, PlanTier, Tenant, TenantStatus,
};
use crate::errors::{Error, Result};
use crate::events::{EventPublisher, EventType, LifecycleEvent};
use crate::metrics::{record_event_publish, record_lifecycle_operation};
use crate::provisioning::Provisioner;

/// Input for the create flow.
#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    pub plan: PlanTier,
    pub admin_email: String,
    pub admin_name: Option<String>,
    pub settings: Option<AttrBag>,
}

/// Input for the update flow. `settings` is merged key-wise, never replaced.
#[derive(Debug, Clone, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_name: Option<String>,
    pub billing_email: Option<String>,
    pub settings: Option<AttrBag>,
}

/// Listing query; pagination is clamped by [`ListFilter`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<TenantStatus>,
    pub plan: Option<PlanTier>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub tenants: Vec<Tenant>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// Outcome of a validation check. Missing tenants are reported here, not
/// as errors.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub tenant_id: Option<Uuid>,
    pub schema_name: Option<String>,
    pub status: Option<TenantStatus>,
    pub message: String,
}

/// Orchestrates tenant use cases over swappable capabilities.
pub struct TenantLifecycle {
    store: Arc<dyn TenantStore>,
    provisioner: Arc<dyn Provisioner>,
    publisher: Arc<dyn EventPublisher>,
}

impl TenantLifecycle {
    pub fn new(
        store: Arc<dyn TenantStore>,
        provisioner: Arc<dyn Provisioner>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            provisioner,
            publisher,
        }
    }

    /// Create and provision a tenant, returning it in `Active` state.
    ///
    /// Ordering: validate → slug preflight → insert (`Provisioning`) →
    /// provision schema → activate → persist → async `tenant.created`.
    /// The preflight exists only to produce a clean error early; the
    /// unique constraint behind [`TenantStore::create`] is authoritative.
    pub async fn create(&self, cmd: CreateTenant, correlation_id: &str) -> Result<Tenant> {
        info!(name = %cmd.name, slug = %cmd.slug, plan = %cmd.plan, "Creating tenant");

        validate_name(&cmd.name)?;
        validate_slug(&cmd.slug)?;
        validate_email(&cmd.admin_email)?;

        if self.store.exists_by_slug(&cmd.slug).await? {
            record_lifecycle_operation("create", false);
            return Err(Error::SlugExists);
        }

        let mut tenant = Tenant::new(&cmd.name, &cmd.slug, cmd.plan, &cmd.admin_email)?;
        if let Some(admin_name) = cmd.admin_name {
            tenant.primary_contact_name = Some(admin_name);
        }
        if let Some(settings) = cmd.settings {
            tenant.settings = settings;
        }

        self.store.create(&tenant).await?;

        if let Err(e) = self.provisioner.provision(tenant.tenant_id).await {
            // Registry row stays in Provisioning; operators can retry the
            // provisioning or deprovision and mark the row deleted.
            error!(
                tenant_id = %tenant.tenant_id,
                schema = %tenant.schema_name,
                error = %e,
                "Schema provisioning failed, registry row left in provisioning state"
            );
            record_lifecycle_operation("create", false);
            return Err(match e {
                Error::ProvisioningFailed(_) => e,
                other => Error::ProvisioningFailed(other.to_string()),
            });
        }

        tenant.activate()?;
        self.store.update(&tenant).await?;

        self.dispatch(EventType::TenantCreated, &tenant, correlation_id);
        record_lifecycle_operation("create", true);

        info!(
            tenant_id = %tenant.tenant_id,
            schema = %tenant.schema_name,
            "Tenant creation completed"
        );
        Ok(tenant)
    }

    pub async fn get_by_tenant_id(&self, tenant_id: Uuid) -> Result<Tenant> {
        self.store.get_by_tenant_id(tenant_id).await
    }

    pub async fn get_by_row_id(&self, id: Uuid) -> Result<Tenant> {
        self.store.get_by_row_id(id).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Tenant> {
        self.store.get_by_slug(slug).await
    }

    pub async fn list(&self, query: ListQuery) -> Result<ListResult> {
        let filter = ListFilter::new(
            query.page,
            query.page_size,
            query.status,
            query.plan,
            query.search,
        );
        let page = self.store.list(&filter).await?;

        let page_size = filter.page_size();
        let total_pages = (page.total.div_ceil(page_size)).max(1);

        Ok(ListResult {
            tenants: page.tenants,
            total: page.total,
            page: filter.page(),
            page_size,
            total_pages,
        })
    }

    /// Apply a partial update and emit `tenant.updated`.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        cmd: UpdateTenant,
        correlation_id: &str,
    ) -> Result<Tenant> {
        let mut tenant = self.store.get_by_tenant_id(tenant_id).await?;

        if tenant.is_deleted() {
            return Err(Error::TenantDeleted);
        }

        if let Some(name) = &cmd.name {
            tenant.update_name(name)?;
        }
        if let Some(email) = &cmd.contact_email {
            tenant.update_contact_email(email)?;
        }
        if let Some(contact_name) = cmd.contact_name {
            tenant.primary_contact_name = Some(contact_name);
        }
        if let Some(billing_email) = &cmd.billing_email {
            validate_email(billing_email)?;
            tenant.billing_email = Some(billing_email.clone());
        }
        if let Some(settings) = cmd.settings {
            tenant.merge_settings(settings);
        }

        self.store.update(&tenant).await?;
        self.dispatch(EventType::TenantUpdated, &tenant, correlation_id);
        record_lifecycle_operation("update", true);

        info!(tenant_id = %tenant.tenant_id, "Tenant updated");
        Ok(tenant)
    }

    /// Suspend an active tenant, recording the reason.
    pub async fn suspend(
        &self,
        tenant_id: Uuid,
        reason: &str,
        correlation_id: &str,
    ) -> Result<Tenant> {
        if reason.len() < 10 || reason.len() > 500 {
            return Err(Error::Validation {
                message: "suspension reason must be between 10 and 500 characters".into(),
                field: Some("reason".into()),
            });
        }

        warn!(%tenant_id, reason, "Suspending tenant");

        let mut tenant = self.store.get_by_tenant_id(tenant_id).await?;
        tenant.suspend(reason)?;
        self.store.update(&tenant).await?;

        self.dispatch(EventType::TenantSuspended, &tenant, correlation_id);
        record_lifecycle_operation("suspend", true);

        info!(%tenant_id, "Tenant suspended");
        Ok(tenant)
    }

    /// Activate or reactivate a tenant.
    pub async fn activate(&self, tenant_id: Uuid, correlation_id: &str) -> Result<Tenant> {
        let mut tenant = self.store.get_by_tenant_id(tenant_id).await?;
        tenant.activate()?;
        self.store.update(&tenant).await?;

        self.dispatch(EventType::TenantActivated, &tenant, correlation_id);
        record_lifecycle_operation("activate", true);

        info!(%tenant_id, "Tenant activated");
        Ok(tenant)
    }

    /// Soft-delete a tenant. The physical schema is retained.
    pub async fn delete(&self, tenant_id: Uuid, correlation_id: &str) -> Result<()> {
        warn!(%tenant_id, "Deleting tenant (soft delete)");

        let mut tenant = self.store.get_by_tenant_id(tenant_id).await?;
        tenant.delete()?;
        self.store.update(&tenant).await?;

        self.dispatch(EventType::TenantDeleted, &tenant, correlation_id);
        record_lifecycle_operation("delete", true);

        info!(%tenant_id, "Tenant deleted");
        Ok(())
    }

    /// Check whether a tenant exists and is active. Never errors for a
    /// missing tenant; the outcome carries a human-readable message.
    pub async fn validate(&self, tenant_id: Uuid) -> Result<ValidationOutcome> {
        match self.store.get_by_tenant_id(tenant_id).await {
            Ok(tenant) => {
                let valid = tenant.is_active();
                Ok(ValidationOutcome {
                    valid,
                    tenant_id: Some(tenant.tenant_id),
                    schema_name: Some(tenant.schema_name.clone()),
                    status: Some(tenant.status),
                    message: if valid {
                        "tenant is valid and active".into()
                    } else {
                        "tenant is not active".into()
                    },
                })
            }
            Err(Error::TenantNotFound) => Ok(ValidationOutcome {
                valid: false,
                tenant_id: None,
                schema_name: None,
                status: None,
                message: "tenant not found".into(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Registry row count for a status; used by ops views.
    pub async fn count_by_status(&self, status: TenantStatus) -> Result<u64> {
        self.store.count_by_status(status).await
    }

    /// Hand an event to the publisher without blocking the caller. Delivery
    /// failures are logged; they never fail the triggering operation.
    fn dispatch(&self, event_type: EventType, tenant: &Tenant, correlation_id: &str) {
        let publisher = Arc::clone(&self.publisher);
        let event = LifecycleEvent::new(event_type, tenant, correlation_id);

        tokio::spawn(async move {
            let name = event.event_type.as_str();
            let tenant_id = event.tenant_id.clone();
            match publisher.publish(event).await {
                Ok(()) => record_event_publish(name, true),
                Err(e) => {
                    record_event_publish(name, false);
                    error!(event_type = name, %tenant_id, error = %e, "Event publish failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ListPage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Registry kept in a mutex-guarded map; slug uniqueness enforced the
    /// way the database constraint would.
    #[derive(Default)]
    struct InMemoryStore {
        rows: Mutex<HashMap<Uuid, Tenant>>,
    }

    #[async_trait]
    impl TenantStore for InMemoryStore {
        async fn create(&self, tenant: &Tenant) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            if rows.values().any(|t| t.slug == tenant.slug) {
                return Err(Error::SlugExists);
            }
            rows.insert(tenant.tenant_id, tenant.clone());
            Ok(())
        }

        async fn get_by_row_id(&self, id: Uuid) -> Result<Tenant> {
            self.rows
                .lock()
                .unwrap()
                .values()
                .find(|t| t.id == id)
                .cloned()
                .ok_or(Error::TenantNotFound)
        }

        async fn get_by_tenant_id(&self, tenant_id: Uuid) -> Result<Tenant> {
            self.rows
                .lock()
                .unwrap()
                .get(&tenant_id)
                .cloned()
                .ok_or(Error::TenantNotFound)
        }

        async fn get_by_slug(&self, slug: &str) -> Result<Tenant> {
            self.rows
                .lock()
                .unwrap()
                .values()
                .find(|t| t.slug == slug)
                .cloned()
                .ok_or(Error::TenantNotFound)
        }

        async fn update(&self, tenant: &Tenant) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&tenant.tenant_id) {
                Some(existing) => {
                    *existing = tenant.clone();
                    Ok(())
                }
                None => Err(Error::TenantNotFound),
            }
        }

        async fn list(&self, filter: &ListFilter) -> Result<ListPage> {
            let rows = self.rows.lock().unwrap();
            let mut matching: Vec<Tenant> = rows
                .values()
                .filter(|t| filter.status.is_none_or(|s| t.status == s))
                .filter(|t| filter.plan.is_none_or(|p| t.plan == p))
                .filter(|t| {
                    filter.search.as_ref().is_none_or(|s| {
                        let s = s.to_lowercase();
                        t.name.to_lowercase().contains(&s) || t.slug.to_lowercase().contains(&s)
                    })
                })
                .cloned()
                .collect();

            matching.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });

            let total = matching.len() as u64;
            let start = ((filter.page() - 1) * filter.page_size()) as usize;
            let tenants = matching
                .into_iter()
                .skip(start)
                .take(filter.page_size() as usize)
                .collect();
            Ok(ListPage { tenants, total })
        }

        async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .any(|t| t.slug == slug))
        }

        async fn count_by_status(&self, status: TenantStatus) -> Result<u64> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.status == status)
                .count() as u64)
        }
    }

    #[derive(Default)]
    struct FakeProvisioner {
        fail: AtomicBool,
        provisioned: Mutex<Vec<Uuid>>,
        deprovisioned: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl Provisioner for FakeProvisioner {
        async fn provision(&self, tenant_id: Uuid) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::ProvisioningFailed("migration failed".into()));
            }
            self.provisioned.lock().unwrap().push(tenant_id);
            Ok(())
        }

        async fn deprovision(&self, tenant_id: Uuid) -> Result<()> {
            self.deprovisioned.lock().unwrap().push(tenant_id);
            Ok(())
        }

        async fn schema_exists(&self, tenant_id: Uuid) -> Result<bool> {
            Ok(self.provisioned.lock().unwrap().contains(&tenant_id))
        }

        async fn schema_info(&self, schema_name: &str) -> Result<crate::provisioning::SchemaInfo> {
            Ok(crate::provisioning::SchemaInfo {
                schema_name: schema_name.to_string(),
                size: "8 kB".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<LifecycleEvent>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: LifecycleEvent) -> Result<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn close(&self) {}
    }

    struct Harness {
        lifecycle: TenantLifecycle,
        store: Arc<InMemoryStore>,
        provisioner: Arc<FakeProvisioner>,
        publisher: Arc<RecordingPublisher>,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::default());
        let provisioner = Arc::new(FakeProvisioner::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let lifecycle = TenantLifecycle::new(
            store.clone(),
            provisioner.clone(),
            publisher.clone(),
        );
        Harness {
            lifecycle,
            store,
            provisioner,
            publisher,
        }
    }

    fn create_cmd(slug: &str) -> CreateTenant {
        CreateTenant {
            name: "Acme".into(),
            slug: slug.into(),
            plan: PlanTier::Professional,
            admin_email: "ops@acme.test".into(),
            admin_name: None,
            settings: None,
        }
    }

    /// Dispatch is fire-and-forget; give the spawned tasks a moment.
    async fn wait_for_events(publisher: &RecordingPublisher, count: usize) -> Vec<LifecycleEvent> {
        for _ in 0..100 {
            if publisher.events.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        publisher.events.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_create_happy_path() {
        let h = harness();
        let tenant = h.lifecycle.create(create_cmd("acme"), "corr-1").await.unwrap();

        assert_eq!(tenant.status, TenantStatus::Active);
        assert!(tenant.activated_at.is_some());
        assert_eq!(tenant.max_users, 100);
        assert_eq!(tenant.max_storage_gb, 500);
        assert_eq!(
            tenant.schema_name,
            format!("tenant_{}", tenant.tenant_id.simple())
        );

        // Persisted state matches what the caller saw.
        let stored = h.store.get_by_tenant_id(tenant.tenant_id).await.unwrap();
        assert_eq!(stored.status, TenantStatus::Active);

        // Schema was provisioned exactly once.
        assert_eq!(
            h.provisioner.provisioned.lock().unwrap().as_slice(),
            &[tenant.tenant_id]
        );

        let events = wait_for_events(&h.publisher, 1).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::TenantCreated);
        assert_eq!(events[0].correlation_id, "corr-1");
        assert_eq!(events[0].tenant_id, tenant.tenant_id.to_string());
    }

    #[tokio::test]
    async fn test_create_duplicate_slug() {
        let h = harness();
        h.lifecycle.create(create_cmd("acme"), "c").await.unwrap();

        let err = h.lifecycle.create(create_cmd("acme"), "c").await.unwrap_err();
        assert!(matches!(err, Error::SlugExists));

        // Only the first create provisioned a schema.
        assert_eq!(h.provisioner.provisioned.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_invalid_input_short_circuits() {
        let h = harness();

        let err = h
            .lifecycle
            .create(create_cmd("Acme Corp"), "c")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSlug(_)));

        // Rejected before any store or provisioner work.
        assert!(h.store.rows.lock().unwrap().is_empty());
        assert!(h.provisioner.provisioned.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_provisioning_failure_leaves_row() {
        let h = harness();
        h.provisioner.fail.store(true, Ordering::SeqCst);

        let err = h.lifecycle.create(create_cmd("acme"), "c").await.unwrap_err();
        assert!(matches!(err, Error::ProvisioningFailed(_)));

        // The registry row stays in Provisioning for the reconciler.
        let stored = h.store.get_by_slug("acme").await.unwrap();
        assert_eq!(stored.status, TenantStatus::Provisioning);

        // No event was emitted.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.publisher.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_applies_overrides() {
        let h = harness();
        let mut cmd = create_cmd("acme");
        cmd.admin_name = Some("Ada".into());
        let mut settings = AttrBag::new();
        settings.insert("region".into(), serde_json::Value::from("eu-west-1"));
        cmd.settings = Some(settings);

        let tenant = h.lifecycle.create(cmd, "c").await.unwrap();
        assert_eq!(tenant.primary_contact_name.as_deref(), Some("Ada"));
        assert_eq!(
            tenant.settings.get("region").and_then(|v| v.as_str()),
            Some("eu-west-1")
        );
        assert_eq!(tenant.billing_email.as_deref(), Some("ops@acme.test"));
    }

    #[tokio::test]
    async fn test_suspend_and_reactivate() {
        let h = harness();
        let tenant = h.lifecycle.create(create_cmd("acme"), "c").await.unwrap();

        let suspended = h
            .lifecycle
            .suspend(tenant.tenant_id, "payment overdue 30d", "c")
            .await
            .unwrap();
        assert_eq!(suspended.status, TenantStatus::Suspended);
        assert_eq!(
            suspended
                .settings
                .get("suspension_reason")
                .and_then(|v| v.as_str()),
            Some("payment overdue 30d")
        );

        let outcome = h.lifecycle.validate(tenant.tenant_id).await.unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.status, Some(TenantStatus::Suspended));
        assert_eq!(outcome.message, "tenant is not active");

        let reactivated = h.lifecycle.activate(tenant.tenant_id, "c").await.unwrap();
        assert_eq!(reactivated.status, TenantStatus::Active);

        let err = h.lifecycle.activate(tenant.tenant_id, "c").await.unwrap_err();
        assert!(matches!(err, Error::AlreadyActive));

        let events = wait_for_events(&h.publisher, 3).await;
        let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                EventType::TenantCreated,
                EventType::TenantSuspended,
                EventType::TenantActivated
            ]
        );
    }

    #[tokio::test]
    async fn test_suspend_reason_length_enforced() {
        let h = harness();
        let tenant = h.lifecycle.create(create_cmd("acme"), "c").await.unwrap();

        let err = h
            .lifecycle
            .suspend(tenant.tenant_id, "too short", "c")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // Unchanged.
        let stored = h.store.get_by_tenant_id(tenant.tenant_id).await.unwrap();
        assert_eq!(stored.status, TenantStatus::Active);
    }

    #[tokio::test]
    async fn test_delete_then_operate() {
        let h = harness();
        let tenant = h.lifecycle.create(create_cmd("acme"), "c").await.unwrap();

        h.lifecycle.delete(tenant.tenant_id, "c").await.unwrap();

        let stored = h.store.get_by_tenant_id(tenant.tenant_id).await.unwrap();
        assert_eq!(stored.status, TenantStatus::Deleted);
        assert!(stored.deleted_at.is_some());

        // All further operations are blocked.
        assert!(matches!(
            h.lifecycle
                .suspend(tenant.tenant_id, "a valid long reason", "c")
                .await,
            Err(Error::TenantDeleted)
        ));
        assert!(matches!(
            h.lifecycle.activate(tenant.tenant_id, "c").await,
            Err(Error::TenantDeleted)
        ));
        assert!(matches!(
            h.lifecycle
                .update(tenant.tenant_id, UpdateTenant::default(), "c")
                .await,
            Err(Error::TenantDeleted)
        ));
        assert!(matches!(
            h.lifecycle.delete(tenant.tenant_id, "c").await,
            Err(Error::AlreadyDeleted)
        ));

        // Soft delete: no schema was dropped.
        assert!(h.provisioner.deprovisioned.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_settings() {
        let h = harness();
        let mut cmd = create_cmd("acme");
        let mut settings = AttrBag::new();
        settings.insert("theme".into(), serde_json::Value::from("dark"));
        cmd.settings = Some(settings);
        let tenant = h.lifecycle.create(cmd, "c").await.unwrap();

        let mut incoming = AttrBag::new();
        incoming.insert("locale".into(), serde_json::Value::from("en-GB"));
        let updated = h
            .lifecycle
            .update(
                tenant.tenant_id,
                UpdateTenant {
                    name: Some("Acme Ltd".into()),
                    settings: Some(incoming),
                    ..Default::default()
                },
                "c",
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Acme Ltd");
        assert_eq!(
            updated.settings.get("theme").and_then(|v| v.as_str()),
            Some("dark")
        );
        assert_eq!(
            updated.settings.get("locale").and_then(|v| v.as_str()),
            Some("en-GB")
        );
    }

    #[tokio::test]
    async fn test_validate_missing_tenant() {
        let h = harness();
        let outcome = h.lifecycle.validate(Uuid::new_v4()).await.unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.message, "tenant not found");
        assert!(outcome.tenant_id.is_none());
    }

    #[tokio::test]
    async fn test_list_pagination_and_ordering() {
        let h = harness();
        for i in 0..5 {
            let mut tenant = Tenant::new(
                &format!("Tenant {i}"),
                &format!("tenant-{i}"),
                PlanTier::Free,
                "ops@test.dev",
            )
            .unwrap();
            // Distinct creation times so ordering is deterministic.
            tenant.created_at += chrono::Duration::seconds(i);
            tenant.activate().unwrap();
            h.store.create(&tenant).await.unwrap();
        }

        let result = h
            .lifecycle
            .list(ListQuery {
                page: Some(1),
                page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.total, 5);
        assert_eq!(result.tenants.len(), 2);
        assert_eq!(result.total_pages, 3);
        // Newest first.
        assert_eq!(result.tenants[0].slug, "tenant-4");
        assert_eq!(result.tenants[1].slug, "tenant-3");

        let filtered = h
            .lifecycle
            .list(ListQuery {
                search: Some("tenant-2".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.total, 1);
        assert_eq!(filtered.tenants[0].slug, "tenant-2");

        // Empty result still reports one page.
        let none = h
            .lifecycle
            .list(ListQuery {
                status: Some(TenantStatus::Suspended),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(none.total, 0);
        assert_eq!(none.total_pages, 1);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let h = harness();
        h.lifecycle.create(create_cmd("a"), "c").await.unwrap();
        h.lifecycle.create(create_cmd("b"), "c").await.unwrap();
        assert_eq!(
            h.lifecycle
                .count_by_status(TenantStatus::Active)
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            h.lifecycle
                .count_by_status(TenantStatus::Deleted)
                .await
                .unwrap(),
            0
        );
    }
}

//! Tenant registry store
//!
//! `TenantStore` is the capability contract the orchestrator composes;
//! `PgTenantStore` is the SeaORM implementation over
//! `public.tenant_registry`. Slug uniqueness is enforced by the table's
//! unique constraint; the driver error is mapped, never pre-checked here.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{TenantActiveModel, TenantColumn, TenantEntity, TenantModel};
use crate::domain::{AttrBag, PlanTier, Tenant, TenantStatus};
use crate::errors::{Error, Result};

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Upper bound on page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Filter and pagination for tenant listings.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<TenantStatus>,
    pub plan: Option<PlanTier>,
    pub search: Option<String>,
    page: u64,
    page_size: u64,
}

impl ListFilter {
    pub fn new(
        page: Option<u64>,
        page_size: Option<u64>,
        status: Option<TenantStatus>,
        plan: Option<PlanTier>,
        search: Option<String>,
    ) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self {
            status,
            plan,
            search: search.filter(|s| !s.is_empty()),
            page,
            page_size,
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }
}

/// One page of a tenant listing plus the total matching count.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub tenants: Vec<Tenant>,
    pub total: u64,
}

/// Durable mapping from tenant identifiers to tenant records.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Insert a new tenant row. A slug collision surfaces as
    /// [`Error::SlugExists`] from the unique constraint.
    async fn create(&self, tenant: &Tenant) -> Result<()>;

    async fn get_by_row_id(&self, id: Uuid) -> Result<Tenant>;

    async fn get_by_tenant_id(&self, tenant_id: Uuid) -> Result<Tenant>;

    async fn get_by_slug(&self, slug: &str) -> Result<Tenant>;

    /// Whole-record update keyed by `tenant_id`; zero affected rows is
    /// [`Error::TenantNotFound`].
    async fn update(&self, tenant: &Tenant) -> Result<()>;

    /// Paginated listing ordered by `created_at` descending, row id
    /// ascending on ties.
    async fn list(&self, filter: &ListFilter) -> Result<ListPage>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    async fn count_by_status(&self, status: TenantStatus) -> Result<u64>;
}

/// SeaORM implementation of [`TenantStore`].
#[derive(Clone)]
pub struct PgTenantStore {
    db: DatabaseConnection,
}

impl PgTenantStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn create(&self, tenant: &Tenant) -> Result<()> {
        TenantEntity::insert(insert_model(tenant))
            .exec(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("slug") => {
                    Error::SlugExists
                }
                _ => Error::Database(e),
            })?;

        info!(
            tenant_id = %tenant.tenant_id,
            slug = %tenant.slug,
            "Tenant registry row created"
        );
        Ok(())
    }

    async fn get_by_row_id(&self, id: Uuid) -> Result<Tenant> {
        TenantEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(Error::TenantNotFound)
            .and_then(model_to_tenant)
    }

    async fn get_by_tenant_id(&self, tenant_id: Uuid) -> Result<Tenant> {
        TenantEntity::find()
            .filter(TenantColumn::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?
            .ok_or(Error::TenantNotFound)
            .and_then(model_to_tenant)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Tenant> {
        TenantEntity::find()
            .filter(TenantColumn::TenantSlug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(Error::TenantNotFound)
            .and_then(model_to_tenant)
    }

    async fn update(&self, tenant: &Tenant) -> Result<()> {
        let result = TenantEntity::update_many()
            .set(update_model(tenant))
            .filter(TenantColumn::TenantId.eq(tenant.tenant_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(Error::TenantNotFound);
        }

        debug!(tenant_id = %tenant.tenant_id, status = %tenant.status, "Tenant updated");
        Ok(())
    }

    async fn list(&self, filter: &ListFilter) -> Result<ListPage> {
        let mut query = TenantEntity::find();

        if let Some(status) = filter.status {
            query = query.filter(TenantColumn::Status.eq(status.as_str()));
        }
        if let Some(plan) = filter.plan {
            query = query.filter(TenantColumn::PlanTier.eq(plan.as_str()));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                Condition::any()
                    .add(Expr::col((TenantEntity, TenantColumn::TenantName)).ilike(pattern.clone()))
                    .add(Expr::col((TenantEntity, TenantColumn::TenantSlug)).ilike(pattern)),
            );
        }

        let paginator = query
            .order_by_desc(TenantColumn::CreatedAt)
            .order_by_asc(TenantColumn::Id)
            .paginate(&self.db, filter.page_size());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(filter.page() - 1).await?;

        let tenants = models
            .into_iter()
            .map(model_to_tenant)
            .collect::<Result<Vec<_>>>()?;

        Ok(ListPage { tenants, total })
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count = TenantEntity::find()
            .filter(TenantColumn::TenantSlug.eq(slug))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn count_by_status(&self, status: TenantStatus) -> Result<u64> {
        let count = TenantEntity::find()
            .filter(TenantColumn::Status.eq(status.as_str()))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

/// Convert a registry row into the domain aggregate. Empty or null JSON
/// bags become empty objects, never null.
fn model_to_tenant(model: TenantModel) -> Result<Tenant> {
    Ok(Tenant {
        id: model.id,
        tenant_id: model.tenant_id,
        name: model.tenant_name,
        slug: model.tenant_slug,
        schema_name: model.database_schema,
        schema_version: model.schema_version,
        status: model.status.parse()?,
        plan: model.plan_tier.parse()?,
        max_users: model.max_users,
        max_storage_gb: model.max_storage_gb,
        primary_contact_email: model.primary_contact_email,
        primary_contact_name: model.primary_contact_name,
        billing_email: model.billing_email,
        settings: bag_from_json(model.settings),
        features: bag_from_json(model.features),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        activated_at: model.activated_at.map(|t| t.with_timezone(&Utc)),
        suspended_at: model.suspended_at.map(|t| t.with_timezone(&Utc)),
        deleted_at: model.deleted_at.map(|t| t.with_timezone(&Utc)),
        created_by: model.created_by,
        updated_by: model.updated_by,
    })
}

fn bag_from_json(value: serde_json::Value) -> AttrBag {
    value.as_object().cloned().unwrap_or_default()
}

fn insert_model(tenant: &Tenant) -> TenantActiveModel {
    TenantActiveModel {
        id: Set(tenant.id),
        tenant_id: Set(tenant.tenant_id),
        tenant_name: Set(tenant.name.clone()),
        tenant_slug: Set(tenant.slug.clone()),
        database_schema: Set(tenant.schema_name.clone()),
        schema_version: Set(tenant.schema_version.clone()),
        status: Set(tenant.status.as_str().to_string()),
        plan_tier: Set(tenant.plan.as_str().to_string()),
        max_users: Set(tenant.max_users),
        max_storage_gb: Set(tenant.max_storage_gb),
        primary_contact_email: Set(tenant.primary_contact_email.clone()),
        primary_contact_name: Set(tenant.primary_contact_name.clone()),
        billing_email: Set(tenant.billing_email.clone()),
        settings: Set(serde_json::Value::Object(tenant.settings.clone())),
        features: Set(serde_json::Value::Object(tenant.features.clone())),
        created_at: Set(tenant.created_at.into()),
        updated_at: Set(tenant.updated_at.into()),
        activated_at: Set(tenant.activated_at.map(Into::into)),
        suspended_at: Set(tenant.suspended_at.map(Into::into)),
        deleted_at: Set(tenant.deleted_at.map(Into::into)),
        created_by: Set(tenant.created_by),
        updated_by: Set(tenant.updated_by),
    }
}

/// Identity, slug and schema name are immutable after creation; everything
/// else is written through on update.
fn update_model(tenant: &Tenant) -> TenantActiveModel {
    TenantActiveModel {
        tenant_name: Set(tenant.name.clone()),
        schema_version: Set(tenant.schema_version.clone()),
        status: Set(tenant.status.as_str().to_string()),
        plan_tier: Set(tenant.plan.as_str().to_string()),
        max_users: Set(tenant.max_users),
        max_storage_gb: Set(tenant.max_storage_gb),
        primary_contact_email: Set(tenant.primary_contact_email.clone()),
        primary_contact_name: Set(tenant.primary_contact_name.clone()),
        billing_email: Set(tenant.billing_email.clone()),
        settings: Set(serde_json::Value::Object(tenant.settings.clone())),
        features: Set(serde_json::Value::Object(tenant.features.clone())),
        updated_at: Set(tenant.updated_at.into()),
        activated_at: Set(tenant.activated_at.map(Into::into)),
        suspended_at: Set(tenant.suspended_at.map(Into::into)),
        deleted_at: Set(tenant.deleted_at.map(Into::into)),
        updated_by: Set(tenant.updated_by),
        ..Default::default()
    }
}

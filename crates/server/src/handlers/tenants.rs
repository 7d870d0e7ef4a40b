//! Tenant management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use tenantgrid_common::{
    domain::{AttrBag, PlanTier, Tenant, TenantStatus},
    errors::{Error, Result},
    lifecycle::{CreateTenant, ListQuery, UpdateTenant},
};

use super::{parse_id, AppJson, Data, RequestContext};

/// Request to create a new tenant
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 100))]
    pub slug: String,

    pub plan: String,

    #[validate(email, length(max = 255))]
    pub admin_email: String,

    #[validate(length(max = 255))]
    pub admin_name: Option<String>,

    #[serde(default)]
    pub settings: Option<AttrBag>,
}

/// Request to update tenant details. Omitted fields are left unchanged;
/// `settings` keys are merged into the existing bag.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(email, length(max = 255))]
    pub contact_email: Option<String>,

    #[validate(length(max = 255))]
    pub contact_name: Option<String>,

    #[validate(email, length(max = 255))]
    pub billing_email: Option<String>,

    #[serde(default)]
    pub settings: Option<AttrBag>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SuspendTenantRequest {
    #[validate(length(min = 10, max = 500))]
    pub reason: String,
}

/// Query parameters for listing tenants
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTenantsParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<String>,
    pub plan: Option<String>,
    pub search: Option<String>,
}

/// A tenant in API responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub schema_name: String,
    pub status: TenantStatus,
    pub plan: PlanTier,
    pub max_users: i32,
    pub max_storage_gb: i32,
    pub primary_contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_email: Option<String>,
    pub settings: AttrBag,
    pub features: AttrBag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Tenant> for TenantResponse {
    fn from(t: Tenant) -> Self {
        Self {
            id: t.id,
            tenant_id: t.tenant_id,
            name: t.name,
            slug: t.slug,
            schema_name: t.schema_name,
            status: t.status,
            plan: t.plan,
            max_users: t.max_users,
            max_storage_gb: t.max_storage_gb,
            primary_contact_email: t.primary_contact_email,
            primary_contact_name: t.primary_contact_name,
            billing_email: t.billing_email,
            settings: t.settings,
            features: t.features,
            created_at: t.created_at,
            updated_at: t.updated_at,
            activated_at: t.activated_at,
            suspended_at: t.suspended_at,
            deleted_at: t.deleted_at,
        }
    }
}

/// Paginated listing payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTenantsResponse {
    pub tenants: Vec<TenantResponse>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

fn check<T: Validate>(value: &T) -> Result<()> {
    value.validate().map_err(|e| Error::Validation {
        message: e.to_string(),
        field: None,
    })
}

/// POST /api/v1/tenants
pub async fn create_tenant(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(request): AppJson<CreateTenantRequest>,
) -> Result<(StatusCode, Json<Data<TenantResponse>>)> {
    check(&request)?;
    let plan: PlanTier = request.plan.parse()?;

    let tenant = state
        .lifecycle
        .create(
            CreateTenant {
                name: request.name,
                slug: request.slug,
                plan,
                admin_email: request.admin_email,
                admin_name: request.admin_name,
                settings: request.settings,
            },
            &ctx.request_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(Data::new(tenant.into()))))
}

/// GET /api/v1/tenants
pub async fn list_tenants(
    State(state): State<AppState>,
    Query(params): Query<ListTenantsParams>,
) -> Result<Json<Data<ListTenantsResponse>>> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<TenantStatus>)
        .transpose()?;
    let plan = params
        .plan
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<PlanTier>)
        .transpose()?;

    let result = state
        .lifecycle
        .list(ListQuery {
            page: params.page,
            page_size: params.page_size,
            status,
            plan,
            search: params.search,
        })
        .await?;

    Ok(Json(Data::new(ListTenantsResponse {
        tenants: result.tenants.into_iter().map(Into::into).collect(),
        total_count: result.total,
        page: result.page,
        page_size: result.page_size,
        total_pages: result.total_pages,
    })))
}

/// GET /api/v1/tenants/{id} — keyed by registry row id
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Data<TenantResponse>>> {
    let id = parse_id(&id)?;
    let tenant = state.lifecycle.get_by_row_id(id).await?;
    Ok(Json(Data::new(tenant.into())))
}

/// PATCH /api/v1/tenants/{id}
pub async fn update_tenant(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateTenantRequest>,
) -> Result<Json<Data<TenantResponse>>> {
    let tenant_id = parse_id(&id)?;
    check(&request)?;

    let tenant = state
        .lifecycle
        .update(
            tenant_id,
            UpdateTenant {
                name: request.name,
                contact_email: request.contact_email,
                contact_name: request.contact_name,
                billing_email: request.billing_email,
                settings: request.settings,
            },
            &ctx.request_id,
        )
        .await?;

    Ok(Json(Data::new(tenant.into())))
}

/// POST /api/v1/tenants/{id}/suspend
pub async fn suspend_tenant(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    AppJson(request): AppJson<SuspendTenantRequest>,
) -> Result<Json<Data<TenantResponse>>> {
    let tenant_id = parse_id(&id)?;
    check(&request)?;

    let tenant = state
        .lifecycle
        .suspend(tenant_id, &request.reason, &ctx.request_id)
        .await?;

    Ok(Json(Data::new(tenant.into())))
}

/// POST /api/v1/tenants/{id}/activate
pub async fn activate_tenant(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Data<TenantResponse>>> {
    let tenant_id = parse_id(&id)?;
    let tenant = state.lifecycle.activate(tenant_id, &ctx.request_id).await?;
    Ok(Json(Data::new(tenant.into())))
}

/// DELETE /api/v1/tenants/{id} — soft delete
pub async fn delete_tenant(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let tenant_id = parse_id(&id)?;
    state.lifecycle.delete(tenant_id, &ctx.request_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! gRPC service implementation for the tenant read API

use std::sync::Arc;

use tonic::{Request, Response, Status};
use uuid::Uuid;

use tenantgrid_common::domain::{Tenant, TenantStatus};
use tenantgrid_common::errors::Error;
use tenantgrid_common::lifecycle::{ListQuery, TenantLifecycle};
use tenantgrid_common::proto::tenant::{
    tenant_service_server::{TenantService, TenantServiceServer},
    GetBySlugRequest, GetTenantRequest, ListTenantsRequest, ListTenantsResponse,
    Tenant as ProtoTenant, TenantResponse, TenantStatus as ProtoTenantStatus,
    ValidateTenantRequest, ValidationResponse,
};

/// Tenant gRPC service
pub struct TenantGrpcService {
    lifecycle: Arc<TenantLifecycle>,
}

impl TenantGrpcService {
    pub fn new(lifecycle: Arc<TenantLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub fn into_server(self) -> TenantServiceServer<Self> {
        TenantServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl TenantService for TenantGrpcService {
    async fn get_tenant(
        &self,
        request: Request<GetTenantRequest>,
    ) -> Result<Response<TenantResponse>, Status> {
        let req = request.into_inner();

        if req.tenant_id.is_empty() {
            return Err(Status::invalid_argument("tenant_id is required"));
        }
        let tenant_id = Uuid::parse_str(&req.tenant_id)
            .map_err(|_| Status::invalid_argument("invalid tenant_id format"))?;

        let tenant = self
            .lifecycle
            .get_by_tenant_id(tenant_id)
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(TenantResponse {
            tenant: Some(domain_to_proto(&tenant)),
        }))
    }

    async fn get_tenant_by_slug(
        &self,
        request: Request<GetBySlugRequest>,
    ) -> Result<Response<TenantResponse>, Status> {
        let req = request.into_inner();

        if req.slug.is_empty() {
            return Err(Status::invalid_argument("slug is required"));
        }

        let tenant = self
            .lifecycle
            .get_by_slug(&req.slug)
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(TenantResponse {
            tenant: Some(domain_to_proto(&tenant)),
        }))
    }

    async fn validate_tenant(
        &self,
        request: Request<ValidateTenantRequest>,
    ) -> Result<Response<ValidationResponse>, Status> {
        let req = request.into_inner();

        // Missing or malformed ids are reported in-band, never as errors.
        if req.tenant_id.is_empty() {
            return Ok(Response::new(invalid_validation("tenant_id is required")));
        }
        let tenant_id = match Uuid::parse_str(&req.tenant_id) {
            Ok(id) => id,
            Err(_) => {
                return Ok(Response::new(invalid_validation(
                    "invalid tenant_id format",
                )))
            }
        };

        let outcome = self
            .lifecycle
            .validate(tenant_id)
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(ValidationResponse {
            valid: outcome.valid,
            tenant_id: outcome.tenant_id.map(|id| id.to_string()).unwrap_or_default(),
            schema_name: outcome.schema_name.unwrap_or_default(),
            status: outcome
                .status
                .map(|s| status_to_proto(s) as i32)
                .unwrap_or(ProtoTenantStatus::Unspecified as i32),
            message: outcome.message,
        }))
    }

    async fn list_tenants(
        &self,
        request: Request<ListTenantsRequest>,
    ) -> Result<Response<ListTenantsResponse>, Status> {
        let req = request.into_inner();

        let status = parse_filter::<TenantStatus>(&req.status)?;
        let plan = parse_filter(&req.plan)?;

        let result = self
            .lifecycle
            .list(ListQuery {
                page: (req.page > 0).then_some(req.page as u64),
                page_size: (req.page_size > 0).then_some(req.page_size as u64),
                status,
                plan,
                search: (!req.search.is_empty()).then(|| req.search.clone()),
            })
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(ListTenantsResponse {
            tenants: result.tenants.iter().map(domain_to_proto).collect(),
            total_count: result.total as i32,
            page: result.page as i32,
            page_size: result.page_size as i32,
            total_pages: result.total_pages as i32,
        }))
    }
}

fn parse_filter<T: std::str::FromStr<Err = Error>>(raw: &str) -> Result<Option<T>, Status> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| Status::invalid_argument(e.to_string()))
}

fn invalid_validation(message: &str) -> ValidationResponse {
    ValidationResponse {
        valid: false,
        tenant_id: String::new(),
        schema_name: String::new(),
        status: ProtoTenantStatus::Unspecified as i32,
        message: message.to_string(),
    }
}

/// Map domain errors onto gRPC status codes.
fn status_from_error(err: Error) -> Status {
    match &err {
        Error::TenantNotFound => Status::not_found(err.to_string()),
        Error::SlugExists => Status::already_exists(err.to_string()),
        Error::Validation { .. }
        | Error::InvalidId(_)
        | Error::InvalidName(_)
        | Error::InvalidSlug(_)
        | Error::InvalidEmail(_)
        | Error::InvalidPlan(_)
        | Error::InvalidStatus(_)
        | Error::InvalidJson(_) => Status::invalid_argument(err.to_string()),
        Error::AlreadyActive
        | Error::AlreadySuspended
        | Error::AlreadyDeleted
        | Error::PlanUnchanged
        | Error::InvalidTransition { .. }
        | Error::TenantDeleted => Status::failed_precondition(err.to_string()),
        Error::Unauthorized(_) => Status::unauthenticated(err.to_string()),
        Error::Forbidden(_) => Status::permission_denied(err.to_string()),
        Error::DependencyUnavailable(_) => Status::unavailable(err.to_string()),
        Error::Canceled => Status::cancelled(err.to_string()),
        _ => {
            tracing::error!(error = %err, "gRPC internal error");
            Status::internal("internal server error")
        }
    }
}

fn status_to_proto(status: TenantStatus) -> ProtoTenantStatus {
    match status {
        TenantStatus::Provisioning => ProtoTenantStatus::Provisioning,
        TenantStatus::Active => ProtoTenantStatus::Active,
        TenantStatus::Suspended => ProtoTenantStatus::Suspended,
        TenantStatus::Archived => ProtoTenantStatus::Archived,
        TenantStatus::Deleted => ProtoTenantStatus::Deleted,
    }
}

fn domain_to_proto(tenant: &Tenant) -> ProtoTenant {
    ProtoTenant {
        id: tenant.id.to_string(),
        tenant_id: tenant.tenant_id.to_string(),
        name: tenant.name.clone(),
        slug: tenant.slug.clone(),
        schema_name: tenant.schema_name.clone(),
        status: status_to_proto(tenant.status) as i32,
        plan: tenant.plan.to_string(),
        max_users: tenant.max_users,
        max_storage_gb: tenant.max_storage_gb,
        contact_email: tenant.primary_contact_email.clone(),
        contact_name: tenant.primary_contact_name.clone().unwrap_or_default(),
        billing_email: tenant.billing_email.clone().unwrap_or_default(),
        created_at: tenant.created_at.to_rfc3339(),
        updated_at: tenant.updated_at.to_rfc3339(),
        activated_at: tenant
            .activated_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
        suspended_at: tenant
            .suspended_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
        deleted_at: tenant
            .deleted_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantgrid_common::domain::PlanTier;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_to_proto(TenantStatus::Suspended),
            ProtoTenantStatus::Suspended
        );
        assert_eq!(
            status_to_proto(TenantStatus::Deleted),
            ProtoTenantStatus::Deleted
        );
    }

    #[test]
    fn test_domain_to_proto_fields() {
        let mut tenant =
            Tenant::new("Acme", "acme", PlanTier::Professional, "ops@acme.test").unwrap();
        tenant.activate().unwrap();

        let proto = domain_to_proto(&tenant);
        assert_eq!(proto.tenant_id, tenant.tenant_id.to_string());
        assert_eq!(proto.schema_name, tenant.schema_name);
        assert_eq!(proto.status, ProtoTenantStatus::Active as i32);
        assert_eq!(proto.plan, "professional");
        assert_eq!(proto.max_users, 100);
        assert!(!proto.activated_at.is_empty());
        assert!(proto.deleted_at.is_empty());
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            status_from_error(Error::TenantNotFound).code(),
            tonic::Code::NotFound
        );
        assert_eq!(
            status_from_error(Error::SlugExists).code(),
            tonic::Code::AlreadyExists
        );
        assert_eq!(
            status_from_error(Error::AlreadyActive).code(),
            tonic::Code::FailedPrecondition
        );
        assert_eq!(
            status_from_error(Error::TenantDeleted).code(),
            tonic::Code::FailedPrecondition
        );
        assert_eq!(
            status_from_error(Error::Internal("x".into())).code(),
            tonic::Code::Internal
        );
    }
}

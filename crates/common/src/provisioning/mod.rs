//! Tenant schema provisioning
//!
//! Materializes and de-materializes the per-tenant physical schema:
//! schema creation, per-schema migrations, optional seeding and
//! row-level-security policy installation.

mod rls_manager;
mod schema_provisioner;

pub use rls_manager::RlsManager;
pub use schema_provisioner::SchemaProvisioner;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;

/// Summary of a tenant schema's physical footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaInfo {
    pub schema_name: String,
    /// Human-readable total size (`pg_size_pretty`).
    pub size: String,
}

/// Creates, migrates and removes per-tenant PostgreSQL schemas.
///
/// `provision` is not transactional as a whole: CREATE SCHEMA and each
/// migration commit independently. A failure part-way leaves the registry
/// row in `Provisioning` for the reconciler.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Create the schema, apply pending migrations, seed defaults and
    /// install RLS policies. Safe to call again after a partial failure.
    async fn provision(&self, tenant_id: Uuid) -> Result<()>;

    /// `DROP SCHEMA ... CASCADE`. Irreversible; operator tooling only,
    /// never part of soft delete.
    async fn deprovision(&self, tenant_id: Uuid) -> Result<()>;

    async fn schema_exists(&self, tenant_id: Uuid) -> Result<bool>;

    async fn schema_info(&self, schema_name: &str) -> Result<SchemaInfo>;
}

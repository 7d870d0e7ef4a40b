//! TenantGrid Common Library
//!
//! Shared code for the TenantGrid control plane:
//! - Tenant domain model and lifecycle state machine
//! - Registry store over PostgreSQL
//! - Schema provisioning and row-level-security management
//! - Lifecycle orchestration (create / suspend / activate / delete / ...)
//! - Kafka event publishing
//! - Error types, configuration, authentication and metrics

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod metrics;
pub mod provisioning;

// gRPC proto definitions (generated at build time)
pub mod proto {
    pub mod tenant {
        tonic::include_proto!("tenant.v1");
    }

    /// Encoded descriptor set for the reflection service.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("tenant_descriptor");
}

// Re-export commonly used types
pub use config::AppConfig;
pub use domain::{PlanTier, Tenant, TenantStatus};
pub use errors::{Error, Result};
pub use lifecycle::TenantLifecycle;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name used for logging, metrics and Kafka client ids.
pub const SERVICE_NAME: &str = "tenantgrid";

//! Tenant lifecycle events
//!
//! Five event types, keyed by tenant id so the broker preserves per-tenant
//! ordering. Delivery is at-least-once; consumers must be idempotent.

mod kafka;

pub use kafka::KafkaPublisher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::Tenant;
use crate::errors::Result;

/// Lifecycle event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "tenant.created")]
    TenantCreated,
    #[serde(rename = "tenant.updated")]
    TenantUpdated,
    #[serde(rename = "tenant.suspended")]
    TenantSuspended,
    #[serde(rename = "tenant.activated")]
    TenantActivated,
    #[serde(rename = "tenant.deleted")]
    TenantDeleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TenantCreated => "tenant.created",
            EventType::TenantUpdated => "tenant.updated",
            EventType::TenantSuspended => "tenant.suspended",
            EventType::TenantActivated => "tenant.activated",
            EventType::TenantDeleted => "tenant.deleted",
        }
    }
}

/// Event envelope published to the lifecycle topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub event_id: String,
    pub event_type: EventType,
    pub tenant_id: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
    pub payload: EventPayload,
}

/// Tenant snapshot carried by every lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub slug: String,
    pub schema_name: String,
    pub status: String,
    pub plan: String,
    pub contact_email: String,
    pub contact_name: String,
    pub billing_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Build an event for a tenant, stamping a fresh event id and the
    /// caller's correlation id.
    pub fn new(event_type: EventType, tenant: &Tenant, correlation_id: &str) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type,
            tenant_id: tenant.tenant_id.to_string(),
            timestamp: Utc::now(),
            correlation_id: correlation_id.to_string(),
            payload: EventPayload {
                id: tenant.id.to_string(),
                tenant_id: tenant.tenant_id.to_string(),
                name: tenant.name.clone(),
                slug: tenant.slug.clone(),
                schema_name: tenant.schema_name.clone(),
                status: tenant.status.to_string(),
                plan: tenant.plan.to_string(),
                contact_email: tenant.primary_contact_email.clone(),
                contact_name: tenant.primary_contact_name.clone().unwrap_or_default(),
                billing_email: tenant.billing_email.clone().unwrap_or_default(),
                created_at: tenant.created_at,
                updated_at: tenant.updated_at,
            },
        }
    }
}

/// Emits lifecycle events to the message bus.
///
/// Implementations never block the triggering operation: the orchestrator
/// fires publishes from a spawned task and only logs failures.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: LifecycleEvent) -> Result<()>;

    /// Flush buffered messages before shutdown. Best effort.
    async fn close(&self);
}

/// Publisher used when no broker is configured. Logs and drops events.
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: LifecycleEvent) -> Result<()> {
        debug!(
            event_type = event.event_type.as_str(),
            tenant_id = %event.tenant_id,
            "Event publishing disabled, dropping event"
        );
        Ok(())
    }

    async fn close(&self) {}
}

//! Tenant registry entity
//!
//! One row per tenant in `public.tenant_registry`; the single source of
//! truth for tenant status and metadata.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(schema_name = "public", table_name = "tenant_registry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub tenant_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub tenant_name: String,

    #[sea_orm(column_type = "Text", unique)]
    pub tenant_slug: String,

    #[sea_orm(column_type = "Text")]
    pub database_schema: String,

    #[sea_orm(column_type = "Text")]
    pub schema_version: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    #[sea_orm(column_type = "Text")]
    pub plan_tier: String,

    pub max_users: i32,

    pub max_storage_gb: i32,

    #[sea_orm(column_type = "Text")]
    pub primary_contact_email: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub primary_contact_name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub billing_email: Option<String>,

    pub settings: Json,

    pub features: Json,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,

    pub activated_at: Option<DateTimeWithTimeZone>,

    pub suspended_at: Option<DateTimeWithTimeZone>,

    pub deleted_at: Option<DateTimeWithTimeZone>,

    pub created_by: Option<Uuid>,

    pub updated_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! SeaORM entity models

pub mod tenant;

pub use tenant::{
    ActiveModel as TenantActiveModel, Column as TenantColumn, Entity as TenantEntity,
    Model as TenantModel,
};

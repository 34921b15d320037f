//! Cylinder entity - a CO2 canister that carbonation pushes are drawn from.
//!
//! Cylinders are identified to the user by their `number`, which is unique.
//! At most one cylinder is flagged active at a time; see [`crate::core::cylinder`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cylinder database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cylinders")]
pub struct Model {
    /// Unique identifier for the cylinder
    #[sea_orm(primary_key)]
    pub id: i32,
    /// User-facing cylinder number, unique across all cylinders
    #[sea_orm(unique)]
    pub number: i32,
    /// Purchase cost of the cylinder
    pub cost: f64,
    /// Whether this is the cylinder currently in use
    pub is_active: bool,
    /// When the cylinder was registered
    pub created_at: DateTime,
}

/// Defines relationships between Cylinder and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One cylinder feeds many consumption logs
    #[sea_orm(has_many = "super::consumption_log::Entity")]
    ConsumptionLogs,
}

impl Related<super::consumption_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsumptionLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

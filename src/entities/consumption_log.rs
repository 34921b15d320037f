//! Consumption log entity - bottles carbonated on a given day.
//!
//! `volume_ml` and `co2_pushes` are derived from `bottle_size` and `bottle_count`
//! when the row is written and stored alongside them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Consumption log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consumption_logs")]
pub struct Model {
    /// Unique identifier for the log
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Day the bottles were filled
    pub date: Date,
    /// `"1L"` or `"0.5L"`
    pub bottle_size: String,
    /// Number of bottles filled
    pub bottle_count: i32,
    /// Dispensed volume in mL
    pub volume_ml: f64,
    /// Carbonation pushes used
    pub co2_pushes: i32,
    /// Cylinder the pushes were drawn from
    pub cylinder_id: i32,
    /// When the log was recorded
    pub created_at: DateTime,
}

/// Defines relationships between `ConsumptionLog` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each log belongs to one cylinder
    #[sea_orm(
        belongs_to = "super::cylinder::Entity",
        from = "Column::CylinderId",
        to = "super::cylinder::Column::Id"
    )]
    Cylinder,
}

impl Related<super::cylinder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cylinder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! SeaORM entity definitions, one module per table.
//! `cylinders` owns many `consumption_logs`; `settings` is a standalone key/value table.

pub mod consumption_log;
pub mod cylinder;
pub mod setting;

// Aliased re-exports so the three `Entity`/`Model` types can be imported side by side
pub use consumption_log::{
    Column as ConsumptionLogColumn, Entity as ConsumptionLog, Model as ConsumptionLogModel,
};
pub use cylinder::{Column as CylinderColumn, Entity as Cylinder, Model as CylinderModel};
pub use setting::{Column as SettingColumn, Entity as Setting, Model as SettingModel};

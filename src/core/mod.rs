//! Core business logic, independent of the HTTP layer.
//! Every operation takes a database connection and returns the crate `Result`, so the
//! same functions back the API handlers and the tests.

pub mod analytics;
pub mod calculation;
pub mod consumption_log;
pub mod cylinder;
pub mod import_export;
pub mod settings;

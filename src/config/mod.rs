/// Database connection and table creation
pub mod database;

/// Server and storage settings from config.toml and the environment
pub mod server;

pub use server::{AppConfig, load_app_configuration};

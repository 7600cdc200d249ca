pub mod config;
pub mod database;
pub mod job_store;

pub use config::DatabaseConfig;
pub use database::Database;
pub use job_store::PgJobStore;

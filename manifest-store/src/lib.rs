pub mod app_config;
pub mod database;
pub mod passenger_repo;

pub use database::DbClient;
pub use passenger_repo::PostgresStore;

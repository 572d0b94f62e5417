//! Common library for the marketplace services
//!
//! This crate provides the shared PostgreSQL plumbing: pool configuration,
//! connection pooling, embedded schema migrations, health checks and the
//! storage error type.

pub mod database;
pub mod error;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     run_migrations(&pool).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     pool.close().await;
///     Ok(())
/// }
/// ```
pub fn example_usage() {}

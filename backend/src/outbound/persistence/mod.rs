//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations only translate between Diesel rows and domain
//! types. Row structs (`models.rs`) and the table definition (`schema.rs`)
//! stay private to this module; all database failures are mapped to
//! [`HarborRepositoryError`](crate::domain::ports::HarborRepositoryError).
//!
//! # Example
//!
//! ```no_run
//! use harbor_service::outbound::persistence::{DbPool, DieselHarborRepository, PoolConfig};
//!
//! # async fn connect() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/harbors")).await?;
//! let repository = DieselHarborRepository::new(pool);
//! # let _ = repository;
//! # Ok(())
//! # }
//! ```

mod diesel_harbor_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_harbor_repository::DieselHarborRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

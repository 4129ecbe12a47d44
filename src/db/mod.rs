//! Database layer
//!
//! This module provides database abstraction for the Folio content service.
//! It supports:
//! - SQLite (default, single-file deployment and in-memory tests)
//! - MySQL (for shared deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Usage
//!
//! ```ignore
//! use folio::config::DatabaseConfig;
//! use folio::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, is_unique_violation, Backend, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};

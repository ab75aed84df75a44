//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool lifecycle and borrowing
//! - Statement execution with positional arguments
//! - Row decoding into column-name keyed values
//! - Database dispatch macros for reducing code duplication

#[macro_use]
pub mod macros;
pub mod executor;
pub mod params;
pub mod pool;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::{ConnectionPool, DbConnection, DbPool, PoolStats, PoolStatus, PooledConnection};

//! webcode-orm library
//!
//! A small async ORM: record types declare their fields once, a schema with
//! SQL templates is derived on first use, and CRUD operations run through a
//! lifecycle-managed connection pool (MySQL or SQLite).

pub mod blog;
pub mod config;
pub mod db;
pub mod error;
mod macros;
pub mod models;
pub mod record;

pub use config::PoolConfig;
pub use db::{ConnectionPool, QueryExecutor};
pub use error::{DbError, DbResult};
pub use models::{Field, Value};
pub use record::{FindOptions, Limit, Model, register};

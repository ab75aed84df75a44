//! Statement execution engine.
//!
//! This module provides the two primitives every record operation is built on:
//! - `select`: run a query and return decoded rows, optionally capped
//! - `execute`: run a write statement and return the affected row count
//!
//! Both borrow a connection from the pool for exactly the duration of the
//! statement, bind arguments positionally, and bound the statement by the
//! pool's statement timeout.
//!
//! # Architecture
//!
//! The executor uses backend-specific implementations organized in submodules:
//! - `mysql`: MySQL-specific fetch and write operations
//! - `sqlite`: SQLite-specific fetch and write operations
//!
//! Each submodule provides identical functionality adapted to the backend's type system.

use crate::config::Backend;
use crate::db::params::{bind_mysql_param, bind_sqlite_param, count_placeholders};
use crate::db::pool::{ConnectionPool, DbConnection};
use crate::db::types::RowToValues;
use crate::error::{DbError, DbResult};
use crate::models::{Row, Value};
use futures_util::StreamExt;
use std::borrow::Cow;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Executes statements against a lifecycle-managed pool.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: ConnectionPool,
}

impl QueryExecutor {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Autocommit mode the pool was created with.
    pub fn default_autocommit(&self) -> bool {
        self.pool.default_autocommit()
    }

    /// Run a query and return its rows in result order.
    ///
    /// With `size` set, at most that many rows are fetched from the server.
    /// `Some(0)` fetches every row, the same as `None`.
    pub async fn select(&self, sql: &str, args: &[Value], size: Option<usize>) -> DbResult<Vec<Row>> {
        info!(sql = %sql, args = ?args, "SQL");
        check_arguments(sql, args, self.pool.backend().await)?;

        let sql = native_sql(sql);
        let start = Instant::now();
        let fetch_limit = size.filter(|&n| n > 0).unwrap_or(usize::MAX);

        let mut conn = self.pool.acquire().await?;
        let statement_timeout = conn.statement_timeout();

        let rows = match conn.connection() {
            DbConnection::MySql(c) => {
                mysql::fetch_rows(c, &sql, args, fetch_limit, statement_timeout)
                    .await?
                    .iter()
                    .map(RowToValues::to_values)
                    .collect::<Vec<_>>()
            }
            DbConnection::SQLite(c) => {
                sqlite::fetch_rows(c, &sql, args, fetch_limit, statement_timeout)
                    .await?
                    .iter()
                    .map(RowToValues::to_values)
                    .collect::<Vec<_>>()
            }
        };
        conn.release();

        info!(rows = rows.len(), "rows returned");
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Query complete");
        Ok(rows)
    }

    /// Run a write statement and return the number of affected rows.
    ///
    /// With `autocommit` off the statement runs inside a transaction that is
    /// committed on success and rolled back on failure; the original error
    /// is returned either way.
    pub async fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> DbResult<u64> {
        info!(sql = %sql, args = ?args, "SQL");
        check_arguments(sql, args, self.pool.backend().await)?;

        let sql = native_sql(sql);
        let start = Instant::now();

        let mut conn = self.pool.acquire().await?;
        let statement_timeout = conn.statement_timeout();

        let affected = match conn.connection() {
            DbConnection::MySql(c) => {
                mysql::execute_write(c, &sql, args, autocommit, statement_timeout).await?
            }
            DbConnection::SQLite(c) => {
                sqlite::execute_write(c, &sql, args, autocommit, statement_timeout).await?
            }
        };
        conn.release();

        debug!(
            affected,
            autocommit,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Write complete"
        );
        Ok(affected)
    }
}

// =============================================================================
// Common Helper Functions
// =============================================================================

/// Reject argument lists that do not match the statement's placeholders.
fn check_arguments(sql: &str, args: &[Value], backend: Option<Backend>) -> DbResult<()> {
    let Some(expected) = count_placeholders(sql, backend) else {
        return Ok(());
    };
    if expected != args.len() {
        return Err(DbError::invalid_argument(format!(
            "Statement has {} placeholder(s) but {} argument(s) were given",
            expected,
            args.len()
        )));
    }
    Ok(())
}

/// Rewrite `?` placeholders into the backend's native bind syntax.
///
/// MySQL and SQLite both bind `?` natively.
fn native_sql(sql: &str) -> Cow<'_, str> {
    Cow::Borrowed(sql)
}

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs() as u32)
}

/// Roll back a failed transaction, keeping the original error.
async fn rollback<DB: sqlx::Database>(tx: sqlx::Transaction<'_, DB>, error: DbError) -> DbError {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "Rollback failed");
    } else {
        debug!("Transaction rolled back");
    }
    error
}

// =============================================================================
// Backend-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its backend.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use sqlx::mysql::MySqlRow;
    use sqlx::{Connection, MySqlConnection};

    pub async fn fetch_rows(
        conn: &mut MySqlConnection,
        sql: &str,
        args: &[Value],
        fetch_limit: usize,
        statement_timeout: Duration,
    ) -> DbResult<Vec<MySqlRow>> {
        // When args is empty, use raw SQL to avoid prepared statement issues
        let rows_future = if args.is_empty() {
            use sqlx::Executor;
            let stream = conn.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for arg in args {
                query = bind_mysql_param(query, arg);
            }
            let stream = query.fetch(conn);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(statement_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", statement_timeout)),
        }
    }

    pub async fn execute_write(
        conn: &mut MySqlConnection,
        sql: &str,
        args: &[Value],
        autocommit: bool,
        statement_timeout: Duration,
    ) -> DbResult<u64> {
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_mysql_param(query, arg);
        }

        if autocommit {
            return match timeout(statement_timeout, query.execute(conn)).await {
                Ok(Ok(r)) => Ok(r.rows_affected()),
                Ok(Err(e)) => Err(DbError::from(e)),
                Err(_) => Err(timeout_error("write operation", statement_timeout)),
            };
        }

        let mut tx = conn.begin().await?;
        match timeout(statement_timeout, query.execute(&mut *tx)).await {
            Ok(Ok(r)) => {
                tx.commit().await?;
                Ok(r.rows_affected())
            }
            Ok(Err(e)) => Err(rollback(tx, DbError::from(e)).await),
            Err(_) => Err(rollback(tx, timeout_error("write operation", statement_timeout)).await),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Connection, SqliteConnection};

    pub async fn fetch_rows(
        conn: &mut SqliteConnection,
        sql: &str,
        args: &[Value],
        fetch_limit: usize,
        statement_timeout: Duration,
    ) -> DbResult<Vec<SqliteRow>> {
        let rows_future = if args.is_empty() {
            use sqlx::Executor;
            let stream = conn.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for arg in args {
                query = bind_sqlite_param(query, arg);
            }
            let stream = query.fetch(conn);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(statement_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", statement_timeout)),
        }
    }

    pub async fn execute_write(
        conn: &mut SqliteConnection,
        sql: &str,
        args: &[Value],
        autocommit: bool,
        statement_timeout: Duration,
    ) -> DbResult<u64> {
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_sqlite_param(query, arg);
        }

        if autocommit {
            return match timeout(statement_timeout, query.execute(conn)).await {
                Ok(Ok(r)) => Ok(r.rows_affected()),
                Ok(Err(e)) => Err(DbError::from(e)),
                Err(_) => Err(timeout_error("write operation", statement_timeout)),
            };
        }

        let mut tx = conn.begin().await?;
        match timeout(statement_timeout, query.execute(&mut *tx)).await {
            Ok(Ok(r)) => {
                tx.commit().await?;
                Ok(r.rows_affected())
            }
            Ok(Err(e)) => Err(rollback(tx, DbError::from(e)).await),
            Err(_) => Err(rollback(tx, timeout_error("write operation", statement_timeout)).await),
        }
    }
}

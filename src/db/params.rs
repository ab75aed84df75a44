//! Parameter binding utilities for database queries.
//!
//! Arguments are bound positionally, in the order the `?` placeholders
//! appear in the statement.

use crate::config::Backend;
use crate::models::Value;
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, SQLiteDialect};
use sqlparser::tokenizer::{Token, Tokenizer};
use sqlx::mysql::MySqlArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Sqlite};
use tracing::debug;

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q Value,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::String(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q Value,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::String(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}

fn get_dialect(backend: Option<Backend>) -> Box<dyn Dialect> {
    match backend {
        Some(Backend::MySql) => Box::new(MySqlDialect {}),
        Some(Backend::SQLite) => Box::new(SQLiteDialect {}),
        None => Box::new(GenericDialect {}),
    }
}

/// Count `?` placeholders using the backend's SQL tokenizer.
///
/// String literals, quoted identifiers and comments are tokenized away, so a
/// `?` inside them is not counted. Returns `None` when the statement cannot
/// be tokenized; the database then reports the problem itself.
pub fn count_placeholders(sql: &str, backend: Option<Backend>) -> Option<usize> {
    let dialect = get_dialect(backend);
    match Tokenizer::new(dialect.as_ref(), sql).tokenize() {
        Ok(tokens) => Some(
            tokens
                .iter()
                .filter(|token| matches!(token, Token::Placeholder(p) if p.starts_with('?')))
                .count(),
        ),
        Err(e) => {
            debug!(error = %e, "Statement could not be tokenized");
            None
        }
    }
}

//! Record persistence contract.
//!
//! A type implementing [`Model`] maps onto one table. Its schema is built the
//! first time it is needed and shared for the rest of the process; the CRUD
//! operations are provided on top of the schema templates and a
//! [`QueryExecutor`].
//!
//! Implementations are normally generated with the [`model!`](crate::model)
//! macro.

use crate::db::QueryExecutor;
use crate::error::{DbError, DbResult};
use crate::models::{Field, Row, Schema, Value, quote_ident};
use std::future::Future;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// A persistable record type.
pub trait Model: Default + Send + Sync + Sized + 'static {
    /// Type name used in logs and errors; also the table name unless
    /// [`Model::table_name`] overrides it.
    const TYPE_NAME: &'static str;

    fn table_name() -> Option<&'static str> {
        None
    }

    /// Field descriptors in declaration order.
    fn declared_fields() -> Vec<Field>;

    /// Per-type storage for the registered schema.
    fn schema_cell() -> &'static OnceLock<Schema>;

    /// Read a declared field by name.
    fn get_field(&self, name: &str) -> DbResult<Value>;

    /// Assign a declared field by name.
    fn set_field(&mut self, name: &str, value: Value) -> DbResult<()>;

    /// Build and store the schema on first use.
    ///
    /// Repeated and concurrent calls return the same schema. A declaration
    /// error is reported on every call, nothing is cached for it.
    fn register() -> DbResult<&'static Schema> {
        let cell = Self::schema_cell();
        if let Some(schema) = cell.get() {
            return Ok(schema);
        }
        let schema = Schema::build(Self::TYPE_NAME, Self::table_name(), Self::declared_fields())?;
        Ok(cell.get_or_init(|| schema))
    }

    /// Read a field, or `Value::Null` when it is absent.
    fn get_value(&self, name: &str) -> DbResult<Value> {
        self.get_field(name)
    }

    /// Read a field, substituting and storing the declared default when the
    /// field is absent.
    fn get_value_or_default(&mut self, name: &str) -> DbResult<Value> {
        let value = self.get_field(name)?;
        if !value.is_null() {
            return Ok(value);
        }

        let schema = Self::register()?;
        let default = schema.field(name).and_then(|f| f.default().produce());
        match default {
            Some(default) => {
                debug!(model = Self::TYPE_NAME, field = name, value = %default, "Using default value");
                self.set_field(name, default.clone())?;
                Ok(default)
            }
            None => Ok(value),
        }
    }

    /// Build a record from a result row.
    ///
    /// Columns that are not declared fields are ignored; undeclared fields
    /// keep their `Default` value.
    fn from_row(row: Row) -> DbResult<Self> {
        let schema = Self::register()?;
        let mut record = Self::default();
        for (column, value) in row {
            if schema.field(&column).is_some() {
                record.set_field(&column, value)?;
            } else {
                debug!(model = Self::TYPE_NAME, column = %column, "Ignoring unmapped column");
            }
        }
        Ok(record)
    }

    /// Find a record by primary key.
    fn find(
        db: &QueryExecutor,
        pk: impl Into<Value>,
    ) -> impl Future<Output = DbResult<Option<Self>>> + Send {
        let pk = pk.into();
        async move {
            let schema = Self::register()?;
            let sql = format!(
                "{} where {} = ?",
                schema.select_sql(),
                quote_ident(schema.primary_key().name())
            );
            let rows = db.select(&sql, &[pk], Some(1)).await?;
            rows.into_iter().next().map(Self::from_row).transpose()
        }
    }

    /// Find records with an optional filter, ordering and limit.
    fn find_all(
        db: &QueryExecutor,
        options: FindOptions,
    ) -> impl Future<Output = DbResult<Vec<Self>>> + Send {
        async move {
            let schema = Self::register()?;
            let (sql, args) = options.into_query(schema.select_sql())?;
            let rows = db.select(&sql, &args, None).await?;
            rows.into_iter().map(Self::from_row).collect()
        }
    }

    /// Evaluate a single aggregate expression over the table.
    ///
    /// Returns `None` when no row comes back or the result is null.
    fn find_number(
        db: &QueryExecutor,
        expr: &str,
        where_clause: Option<&str>,
        args: Vec<Value>,
    ) -> impl Future<Output = DbResult<Option<Value>>> + Send {
        let mut sql = format!("select {} _num_ from {}", expr, quote_ident(table_of::<Self>()));
        if let Some(w) = where_clause {
            sql.push_str(" where ");
            sql.push_str(w);
        }
        async move {
            Self::register()?;
            let rows = db.select(&sql, &args, Some(1)).await?;
            Ok(rows
                .into_iter()
                .next()
                .and_then(|mut row| row.remove("_num_"))
                .filter(|v| !v.is_null()))
        }
    }

    /// Insert this record.
    ///
    /// Absent fields take their declared default, which is written back into
    /// the record. Returns the affected row count; anything other than one is
    /// logged as a warning.
    fn save(&mut self, db: &QueryExecutor) -> impl Future<Output = DbResult<u64>> + Send {
        async move {
            let schema = Self::register()?;
            let args = schema
                .all_fields()
                .iter()
                .map(|name| self.get_value_or_default(name))
                .collect::<DbResult<Vec<_>>>()?;
            let rows = db
                .execute(schema.insert_sql(), &args, db.default_autocommit())
                .await?;
            if rows != 1 {
                warn!(model = Self::TYPE_NAME, affected = rows, "Failed to insert record");
            }
            Ok(rows)
        }
    }

    /// Update this record by primary key.
    fn update(&self, db: &QueryExecutor) -> impl Future<Output = DbResult<u64>> + Send {
        async move {
            let schema = Self::register()?;
            if schema.fields().is_empty() {
                return Err(DbError::invalid_argument(format!(
                    "{} has no fields to update besides its primary key",
                    Self::TYPE_NAME
                )));
            }
            let args = schema
                .all_fields()
                .iter()
                .map(|name| self.get_value(name))
                .collect::<DbResult<Vec<_>>>()?;
            let rows = db
                .execute(schema.update_sql(), &args, db.default_autocommit())
                .await?;
            if rows != 1 {
                warn!(model = Self::TYPE_NAME, affected = rows, "Failed to update by primary key");
            }
            Ok(rows)
        }
    }

    /// Delete this record by primary key.
    fn remove(&self, db: &QueryExecutor) -> impl Future<Output = DbResult<u64>> + Send {
        async move {
            let schema = Self::register()?;
            let args = [self.get_value(schema.primary_key().name())?];
            let rows = db
                .execute(schema.delete_sql(), &args, db.default_autocommit())
                .await?;
            if rows != 1 {
                warn!(model = Self::TYPE_NAME, affected = rows, "Failed to remove by primary key");
            }
            Ok(rows)
        }
    }
}

/// Register a record type, returning its schema.
pub fn register<M: Model>() -> DbResult<&'static Schema> {
    M::register()
}

fn table_of<M: Model>() -> &'static str {
    M::table_name().unwrap_or(M::TYPE_NAME)
}

/// Row limit of a `find_all` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most `n` rows
    Count(u64),
    /// At most `count` rows after skipping `offset`
    Range { offset: u64, count: u64 },
}

impl Limit {
    fn clause(&self) -> DbResult<(&'static str, Vec<Value>)> {
        Ok(match *self {
            Limit::Count(n) => ("limit ?", vec![to_value(n)?]),
            Limit::Range { offset, count } => {
                ("limit ?, ?", vec![to_value(offset)?, to_value(count)?])
            }
        })
    }
}

/// Limit bounds are bound as signed integers.
fn to_value(n: u64) -> DbResult<Value> {
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| DbError::invalid_argument(format!("Limit value out of range: {}", n)))
}

fn parse_bound(s: &str, input: &str) -> DbResult<u64> {
    s.trim()
        .parse::<u64>()
        .map_err(|_| DbError::invalid_argument(format!("Invalid limit value: {}", input)))
}

impl TryFrom<&str> for Limit {
    type Error = DbError;

    /// Parse `"n"` or `"offset,count"`.
    fn try_from(s: &str) -> DbResult<Self> {
        match s.split_once(',') {
            None => Ok(Limit::Count(parse_bound(s, s)?)),
            Some((offset, count)) => Ok(Limit::Range {
                offset: parse_bound(offset, s)?,
                count: parse_bound(count, s)?,
            }),
        }
    }
}

impl TryFrom<Value> for Limit {
    type Error = DbError;

    fn try_from(value: Value) -> DbResult<Self> {
        match value {
            Value::Int(n) if n >= 0 => Ok(Limit::Count(n as u64)),
            Value::String(s) => Limit::try_from(s.as_str()),
            other => Err(DbError::invalid_argument(format!(
                "Invalid limit value: {}",
                other
            ))),
        }
    }
}

impl From<u64> for Limit {
    fn from(n: u64) -> Self {
        Limit::Count(n)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit::Range { offset, count }
    }
}

/// Filter, ordering and limit of a `find_all` query.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Condition appended after `where`, with `?` placeholders
    pub where_clause: Option<String>,
    /// Arguments for the placeholders in `where_clause`
    pub args: Vec<Value>,
    /// Expression appended after `order by`
    pub order_by: Option<String>,
    pub limit: Option<Limit>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, where_clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.where_clause = Some(where_clause.into());
        self.args = args;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Append the clauses to `select_sql`, returning the statement and its
    /// arguments in placeholder order.
    fn into_query(self, select_sql: &str) -> DbResult<(String, Vec<Value>)> {
        let mut sql = select_sql.to_string();
        let mut args = self.args;
        if let Some(w) = self.where_clause {
            sql.push_str(" where ");
            sql.push_str(&w);
        }
        if let Some(o) = self.order_by {
            sql.push_str(" order by ");
            sql.push_str(&o);
        }
        if let Some(limit) = self.limit {
            let (clause, limit_args) = limit.clause()?;
            sql.push(' ');
            sql.push_str(clause);
            args.extend(limit_args);
        }
        Ok((sql, args))
    }
}

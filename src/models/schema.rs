//! Record schemas.
//!
//! A `Schema` is produced once per record type from its declared fields. It
//! fixes the table name, the primary key, the field order used for binding,
//! and the four SQL templates the record operations are built from.

use super::field::Field;
use crate::error::{DbError, DbResult};
use std::collections::HashSet;
use tracing::{debug, info};

/// Uniform placeholder for bound parameters in every template.
pub const PLACEHOLDER: &str = "?";

/// Quote an identifier with backticks, doubling any embedded backtick.
///
/// Backtick quoting is understood by both MySQL and SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Registered metadata and SQL templates of one record type.
#[derive(Debug, Clone)]
pub struct Schema {
    model: String,
    table: String,
    primary_key: Field,
    /// Non-key fields in declaration order
    fields: Vec<Field>,
    /// `fields` followed by the primary key
    all_fields: Vec<String>,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
}

impl Schema {
    /// Scan declared fields and synthesize the schema.
    ///
    /// Fails with `DbError::Schema` when there is not exactly one primary key,
    /// when two fields share a name, or when no fields are declared.
    pub fn build(model: &str, table: Option<&str>, declared: Vec<Field>) -> DbResult<Self> {
        let table = table.unwrap_or(model).to_string();
        info!(model = %model, table = %table, "Found model");

        if declared.is_empty() {
            return Err(DbError::schema("No fields declared", model));
        }

        let mut seen = HashSet::new();
        let mut primary_key: Option<Field> = None;
        let mut fields = Vec::with_capacity(declared.len());

        for field in declared {
            debug!(model = %model, mapping = %field, "Found mapping");
            if !seen.insert(field.name().to_string()) {
                return Err(DbError::schema(
                    format!("Duplicate field: {}", field.name()),
                    model,
                ));
            }
            if field.is_primary_key() {
                if let Some(existing) = &primary_key {
                    return Err(DbError::schema(
                        format!(
                            "Duplicate primary key for field: {} (already declared on {})",
                            field.name(),
                            existing.name()
                        ),
                        model,
                    ));
                }
                primary_key = Some(field);
            } else {
                fields.push(field);
            }
        }

        let primary_key =
            primary_key.ok_or_else(|| DbError::schema("Primary key not found", model))?;

        let mut all_fields: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
        all_fields.push(primary_key.name().to_string());

        let quoted_table = quote_ident(&table);
        let quoted_pk = quote_ident(primary_key.name());

        let select_sql = format!("select * from {}", quoted_table);
        let insert_sql = format!(
            "insert into {} ({}) values ({})",
            quoted_table,
            all_fields
                .iter()
                .map(|f| quote_ident(f))
                .collect::<Vec<_>>()
                .join(", "),
            vec![PLACEHOLDER; all_fields.len()].join(", ")
        );
        let update_sql = format!(
            "update {} set {} where {} = {}",
            quoted_table,
            fields
                .iter()
                .map(|f| format!("{} = {}", quote_ident(f.name()), PLACEHOLDER))
                .collect::<Vec<_>>()
                .join(", "),
            quoted_pk,
            PLACEHOLDER
        );
        let delete_sql = format!(
            "delete from {} where {} = {}",
            quoted_table, quoted_pk, PLACEHOLDER
        );

        Ok(Self {
            model: model.to_string(),
            table,
            primary_key,
            fields,
            all_fields,
            select_sql,
            insert_sql,
            update_sql,
            delete_sql,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &Field {
        &self.primary_key
    }

    /// Non-key fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Non-key field names followed by the primary key name.
    pub fn all_fields(&self) -> &[String] {
        &self.all_fields
    }

    /// Look up a declared field (key or non-key) by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        if self.primary_key.name() == name {
            return Some(&self.primary_key);
        }
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }
}

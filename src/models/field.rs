//! Field descriptors.
//!
//! A `Field` is pure column metadata: name, storage type, primary-key flag and
//! an optional default. Key uniqueness is checked at registration, not here.

use super::value::Value;
use std::fmt;

/// The kind of field, used for display and to pick a default storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    Text,
    Custom,
}

impl FieldKind {
    /// Storage type used when no explicit DDL is given.
    pub fn default_storage_type(&self) -> &'static str {
        match self {
            Self::String => "varchar(100)",
            Self::Integer => "bigint",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Custom => "",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::String => "StringField",
            Self::Integer => "IntegerField",
            Self::Float => "FloatField",
            Self::Boolean => "BooleanField",
            Self::Text => "TextField",
            Self::Custom => "Field",
        }
    }
}

/// Default applied when a record is saved with the field absent.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    None,
    Value(Value),
    /// Invoked lazily, only when the value is absent.
    Factory(fn() -> Value),
}

impl FieldDefault {
    /// Produce the default value, if any.
    pub fn produce(&self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Value(v) => Some(v.clone()),
            Self::Factory(f) => Some(f()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Metadata describing one column.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    storage_type: String,
    primary_key: bool,
    default: FieldDefault,
    kind: FieldKind,
}

impl Field {
    /// Create a field descriptor from its four metadata parts.
    pub fn new(
        name: impl Into<String>,
        storage_type: impl Into<String>,
        primary_key: bool,
        default: FieldDefault,
    ) -> Self {
        Self {
            name: name.into(),
            storage_type: storage_type.into(),
            primary_key,
            default,
            kind: FieldKind::Custom,
        }
    }

    fn of_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            storage_type: kind.default_storage_type().to_string(),
            primary_key: false,
            default: FieldDefault::None,
            kind,
        }
    }

    /// `varchar(100)` column.
    pub fn string(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::String)
    }

    /// `bigint` column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Integer)
    }

    /// `float` column.
    pub fn float(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Float)
    }

    /// `boolean` column.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Boolean)
    }

    /// `text` column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Text)
    }

    /// Mark this field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Override the storage type.
    pub fn ddl(mut self, storage_type: impl Into<String>) -> Self {
        self.storage_type = storage_type.into();
        self
    }

    /// Use a constant default.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Use a default computed on demand.
    pub fn default_with(mut self, factory: fn() -> Value) -> Self {
        self.default = FieldDefault::Factory(factory);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_type(&self) -> &str {
        &self.storage_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}:{}>",
            self.kind.display_name(),
            self.storage_type,
            self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> Value {
        use std::sync::atomic::{AtomicI64, Ordering};
        static CALLS: AtomicI64 = AtomicI64::new(0);
        Value::Int(CALLS.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[test]
    fn test_field_display() {
        let field = Field::string("email").ddl("varchar(50)");
        assert_eq!(field.to_string(), "<StringField, varchar(50):email>");
        assert_eq!(Field::integer("n").to_string(), "<IntegerField, bigint:n>");
        assert_eq!(Field::float("x").to_string(), "<FloatField, float:x>");
    }

    #[test]
    fn test_field_new_keeps_metadata() {
        let field = Field::new("id", "varchar(50)", true, FieldDefault::None);
        assert_eq!(field.name(), "id");
        assert_eq!(field.storage_type(), "varchar(50)");
        assert!(field.is_primary_key());
        assert!(field.default().is_none());
        assert_eq!(field.kind(), FieldKind::Custom);
    }

    #[test]
    fn test_default_factory_is_lazy() {
        let field = Field::integer("seq").default_with(counter);
        let first = field.default().produce();
        let second = field.default().produce();
        assert_ne!(first, second);
    }

    #[test]
    fn test_constant_default() {
        let field = Field::boolean("admin").default_value(false);
        assert_eq!(field.default().produce(), Some(Value::Bool(false)));
        assert_eq!(Field::text("content").default().produce(), None);
    }
}

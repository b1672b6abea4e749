//! Table definitions shared by storage and validation.
//!
//! Every entity describes itself once as a [`TableSchema`]. The Postgres DDL, the write
//! validation rules, the in-memory constraint checks and the cascade graph are all derived
//! from that description, so they cannot drift apart.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

mod ddl;
mod validation;

pub(crate) use validation::missing_reference_error;
pub use validation::{FieldErrors, WriteMode, NON_FIELD_ERRORS};

/// A stored record as it travels between services and stores
pub type Row = Map<String, Value>;

/// How the primary key of a table is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Integer key equal to the owning account id
    Account,
    /// Random UUID v4 assigned on create
    Uuid,
}

/// Primary key value of a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Account(i64),
    Uuid(Uuid),
}

impl RecordKey {
    /// Parses a key from a path segment. Returns None for anything that can't name a record.
    pub fn parse(kind: KeyKind, raw: &str) -> Option<Self> {
        match kind {
            KeyKind::Account => raw.trim().parse().ok().map(RecordKey::Account),
            KeyKind::Uuid => Uuid::parse_str(raw.trim()).ok().map(RecordKey::Uuid),
        }
    }

    /// Reads a key out of a JSON value, accepting numeric strings for integer keys
    pub fn from_value(kind: KeyKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (KeyKind::Account, Value::Number(n)) => n.as_i64().map(RecordKey::Account),
            (_, Value::String(s)) => Self::parse(kind, s),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordKey::Account(id) => Value::from(*id),
            RecordKey::Uuid(id) => Value::String(id.to_string()),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Account(id) => write!(f, "{}", id),
            RecordKey::Uuid(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Primary key column, always named `id`
    Key,
    Text { max_len: Option<usize> },
    Email,
    Url,
    Integer,
    Boolean,
    Choice(&'static [&'static str]),
    /// Foreign key to another table's primary key
    Reference { table: &'static str, key: KeyKind },
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Bool(bool),
    Str(&'static str),
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Bool(b) => Value::Bool(b),
            FieldDefault::Str(s) => Value::String(s.to_string()),
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
    pub read_only: bool,
    pub default: Option<FieldDefault>,
}

impl Field {
    /// A required, non-null, writable column
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        let read_only = matches!(
            kind,
            FieldKind::Key | FieldKind::CreatedAt | FieldKind::UpdatedAt
        );
        Self {
            name,
            kind,
            required: !read_only,
            nullable: false,
            read_only,
            default: None,
        }
    }

    /// May be omitted, null or blank
    pub const fn optional(self) -> Self {
        Self {
            required: false,
            nullable: true,
            ..self
        }
    }

    pub const fn read_only(self) -> Self {
        Self {
            required: false,
            read_only: true,
            ..self
        }
    }

    pub const fn with_default(self, default: FieldDefault) -> Self {
        Self {
            required: false,
            default: Some(default),
            ..self
        }
    }

    pub fn reference(&self) -> Option<(&'static str, KeyKind)> {
        match self.kind {
            FieldKind::Reference { table, key } => Some((table, key)),
            _ => None,
        }
    }
}

/// Storage layout and write rules for one entity
#[derive(Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    /// Singular name used in messages
    pub label: &'static str,
    pub key: KeyKind,
    pub fields: &'static [Field],
    pub unique_together: &'static [&'static [&'static str]],
}

impl TableSchema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Columns that point at other tables
    pub fn references(&self) -> impl Iterator<Item = (&Field, &'static str, KeyKind)> {
        self.fields
            .iter()
            .filter_map(|f| f.reference().map(|(table, key)| (f, table, key)))
    }

    pub fn parse_key(&self, raw: &str) -> Option<RecordKey> {
        RecordKey::parse(self.key, raw)
    }

    pub fn key_of(&self, row: &Row) -> Option<RecordKey> {
        row.get("id").and_then(|v| RecordKey::from_value(self.key, v))
    }

    /// Sets every creation and update timestamp column to `now`
    pub fn stamp_created(&self, row: &mut Row, now: DateTime<Utc>) {
        for field in self.fields {
            if matches!(field.kind, FieldKind::CreatedAt | FieldKind::UpdatedAt) {
                row.insert(field.name.to_string(), Value::String(now.to_rfc3339()));
            }
        }
    }

    pub fn stamp_updated(&self, row: &mut Row, now: DateTime<Utc>) {
        for field in self.fields {
            if field.kind == FieldKind::UpdatedAt {
                row.insert(field.name.to_string(), Value::String(now.to_rfc3339()));
            }
        }
    }
}

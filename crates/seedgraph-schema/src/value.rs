//! Runtime values held by instance fields
//!
//! References between entities are plain data: a persisted target is held as
//! an [`EntityRef`] (type + identity), a transient target is embedded by value.
//! No value ever points back at its owner.

use crate::collection::CollectionValue;
use crate::instance::Instance;
use crate::kind::TypeName;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use url::Url;

/// Field value
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Unset
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Char(char),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Url(Url),
    /// Reference to a persisted entity
    Ref(EntityRef),
    /// Embedded transient entity
    Entity(Box<Instance>),
    Collection(CollectionValue),
}

impl Value {
    /// Whether the value is unset
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Variant name for diagnostics
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::Char(_) => "char",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::DateTime(_) => "date_time",
            Self::Url(_) => "url",
            Self::Ref(_) => "reference",
            Self::Entity(_) => "entity",
            Self::Collection(_) => "collection",
        }
    }

    /// Integral payload widened to `i64`
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(n) => Some(i64::from(*n)),
            Self::Short(n) => Some(i64::from(*n)),
            Self::Int(n) => Some(i64::from(*n)),
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Entity type of a reference or embedded entity
    #[must_use]
    pub fn entity_type(&self) -> Option<&TypeName> {
        match self {
            Self::Ref(r) => Some(&r.entity),
            Self::Entity(instance) => Some(instance.entity()),
            _ => None,
        }
    }

    /// Comparable identity key derived from a scalar value
    ///
    /// References yield the key they carry. Embedded entities yield `None`:
    /// their identity is only known through the schema.
    #[must_use]
    pub fn as_key(&self) -> Option<EntityKey> {
        match self {
            Self::Byte(_) | Self::Short(_) | Self::Int(_) | Self::Long(_) => {
                self.as_i64().map(EntityKey::Int)
            }
            Self::Bool(b) => Some(EntityKey::Int(i64::from(*b))),
            Self::Char(c) => Some(EntityKey::Text(c.to_string())),
            Self::Text(s) => Some(EntityKey::Text(s.clone())),
            Self::Url(u) => Some(EntityKey::Text(u.to_string())),
            Self::Decimal(d) => Some(EntityKey::Text(d.to_string())),
            Self::Date(d) => Some(EntityKey::Text(d.to_string())),
            Self::DateTime(d) => Some(EntityKey::Text(d.to_string())),
            Self::Float(f) => Some(EntityKey::Text(f.to_string())),
            Self::Double(f) => Some(EntityKey::Text(f.to_string())),
            Self::Ref(r) => Some(r.key.clone()),
            Self::Null | Self::Entity(_) | Self::Collection(_) => None,
        }
    }

    /// Total order between two values of the same scalar variant
    ///
    /// Returns `None` for entities, collections and mixed variants.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Byte(a), Self::Byte(b)) => Some(a.cmp(b)),
            (Self::Short(a), Self::Short(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Long(a), Self::Long(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => Some(a.total_cmp(b)),
            (Self::Double(a), Self::Double(b)) => Some(a.total_cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Char(a), Self::Char(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Url(a), Self::Url(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Url(v) => f.write_str(v.as_str()),
            Self::Ref(r) => write!(f, "{r}"),
            Self::Entity(instance) => write!(f, "{}{{..}}", instance.entity()),
            Self::Collection(items) => write!(f, "{}[{}]", items.kind(), items.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<EntityRef> for Value {
    fn from(v: EntityRef) -> Self {
        Self::Ref(v)
    }
}

/// Comparable entity identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    Int(i64),
    Text(String),
    /// Ordered keys of a multi-field identifier
    Composite(Vec<EntityKey>),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Composite(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Reference to a persisted entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity: TypeName,
    pub key: EntityKey,
}

impl EntityRef {
    /// Create reference
    #[inline]
    #[must_use]
    pub fn new(entity: TypeName, key: EntityKey) -> Self {
        Self { entity, key }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.key)
    }
}

//! Type vocabulary shared by descriptors and values
//!
//! Provides [`TypeName`], [`ScalarKind`], [`FieldShape`], [`RelationKind`]
//! and the fixed [`Keyword`] domain.

use crate::collection::{CollectionKind, ElementType};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Entity type identity
///
/// Cheap to clone; used as stack entry and cache key throughout the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Create type name
    #[inline]
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get name as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// Scalar value kinds a field may declare
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Text,
    Char,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Date,
    DateTime,
    Url,
    /// Closed set of literal variants
    Enum(Vec<String>),
}

impl ScalarKind {
    /// Kind name for diagnostics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Char => "char",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::DateTime => "date_time",
            Self::Url => "url",
            Self::Enum(_) => "enum",
        }
    }

    /// Integral kinds
    #[inline]
    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    /// Check that a value is exactly of this kind
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Text, Value::Text(_))
            | (Self::Char, Value::Char(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::Byte, Value::Byte(_))
            | (Self::Short, Value::Short(_))
            | (Self::Int, Value::Int(_))
            | (Self::Long, Value::Long(_))
            | (Self::Float, Value::Float(_))
            | (Self::Double, Value::Double(_))
            | (Self::Decimal, Value::Decimal(_))
            | (Self::Date, Value::Date(_))
            | (Self::DateTime, Value::DateTime(_))
            | (Self::Url, Value::Url(_)) => true,
            (Self::Enum(variants), Value::Text(text)) => variants.iter().any(|v| v == text),
            _ => false,
        }
    }

    /// Parse a textual literal into a value of this kind
    #[must_use]
    pub fn parse_literal(&self, literal: &str) -> Option<Value> {
        let literal = literal.trim();
        match self {
            Self::Text => Some(Value::Text(literal.to_string())),
            Self::Char => {
                let mut chars = literal.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            Self::Bool => literal.to_ascii_lowercase().parse().ok().map(Value::Bool),
            Self::Byte => literal.parse().ok().map(Value::Byte),
            Self::Short => literal.parse().ok().map(Value::Short),
            Self::Int => literal.parse().ok().map(Value::Int),
            Self::Long => literal.parse().ok().map(Value::Long),
            Self::Float => literal.parse().ok().map(Value::Float),
            Self::Double => literal.parse().ok().map(Value::Double),
            Self::Decimal => Decimal::from_str(literal).ok().map(Value::Decimal),
            Self::Date => NaiveDate::parse_from_str(literal, "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            Self::DateTime => NaiveDateTime::parse_from_str(literal, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(literal, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .map(Value::DateTime),
            Self::Url => Url::parse(literal).ok().map(Value::Url),
            Self::Enum(variants) => variants
                .iter()
                .find(|v| v.as_str() == literal)
                .map(|v| Value::Text(v.clone())),
        }
    }

    /// Convert a value into this kind, if a lossless or conventional
    /// conversion exists
    #[must_use]
    pub fn coerce(&self, value: Value) -> Option<Value> {
        if self.matches(&value) {
            return Some(value);
        }
        match (self, value) {
            (_, Value::Text(text)) => self.parse_literal(&text),
            (Self::Text, Value::Char(c)) => Some(Value::Text(c.to_string())),
            (Self::Text, Value::Url(url)) => Some(Value::Text(url.into())),
            (Self::Text, Value::Date(date)) => Some(Value::Text(date.to_string())),
            (Self::Text, Value::DateTime(dt)) => Some(Value::Text(dt.to_string())),
            (Self::Date, Value::DateTime(dt)) => Some(Value::Date(dt.date())),
            (Self::DateTime, Value::Date(date)) => {
                Some(Value::DateTime(date.and_time(NaiveTime::MIN)))
            }
            (Self::Double, Value::Float(f)) => Some(Value::Double(f64::from(f))),
            #[allow(clippy::cast_possible_truncation)]
            (Self::Float, Value::Double(d)) => Some(Value::Float(d as f32)),
            (Self::Decimal, Value::Double(d)) => Decimal::try_from(d).ok().map(Value::Decimal),
            (Self::Decimal, Value::Float(f)) => Decimal::try_from(f).ok().map(Value::Decimal),
            (kind, value) => {
                let n = value.as_i64()?;
                kind.convert_integral(n)
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn convert_integral(&self, n: i64) -> Option<Value> {
        match self {
            Self::Byte => i8::try_from(n).ok().map(Value::Byte),
            Self::Short => i16::try_from(n).ok().map(Value::Short),
            Self::Int => i32::try_from(n).ok().map(Value::Int),
            Self::Long => Some(Value::Long(n)),
            Self::Float => Some(Value::Float(n as f32)),
            Self::Double => Some(Value::Double(n as f64)),
            Self::Decimal => Some(Value::Decimal(Decimal::from(n))),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(variants) => write!(f, "enum({})", variants.join("|")),
            other => f.write_str(other.name()),
        }
    }
}

/// Declared shape of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    /// Single scalar
    Scalar(ScalarKind),

    /// Collection of scalars
    ScalarCollection {
        collection: CollectionKind,
        element: ScalarKind,
    },

    /// Single reference to another entity
    Reference(TypeName),

    /// Collection of references to another entity
    ReferenceCollection {
        collection: CollectionKind,
        target: TypeName,
    },
}

impl FieldShape {
    /// Shape name for diagnostics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::ScalarCollection { .. } => "scalar collection",
            Self::Reference(_) => "reference",
            Self::ReferenceCollection { .. } => "reference collection",
        }
    }

    /// Whether the field points at other entities
    #[inline]
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Reference(_) | Self::ReferenceCollection { .. })
    }

    /// Referenced entity type, if any
    #[must_use]
    pub fn target(&self) -> Option<&TypeName> {
        match self {
            Self::Reference(target) | Self::ReferenceCollection { target, .. } => Some(target),
            Self::Scalar(_) | Self::ScalarCollection { .. } => None,
        }
    }

    /// Scalar kind of a single-scalar field
    #[must_use]
    pub fn scalar(&self) -> Option<&ScalarKind> {
        match self {
            Self::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    /// Declared collection kind and element type of collection fields
    #[must_use]
    pub fn collection(&self) -> Option<(CollectionKind, ElementType)> {
        match self {
            Self::ScalarCollection {
                collection,
                element,
            } => Some((*collection, ElementType::Scalar(element.clone()))),
            Self::ReferenceCollection { collection, target } => {
                Some((*collection, ElementType::Entity(target.clone())))
            }
            Self::Scalar(_) | Self::Reference(_) => None,
        }
    }

    /// Check that a value may be stored in a field of this shape
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match (self, value) {
            (Self::Scalar(kind), value) => kind.matches(value),
            (Self::Reference(target), value) => value.entity_type() == Some(target),
            (Self::ScalarCollection { element, .. }, Value::Collection(items)) => {
                items.iter().all(|item| element.matches(item))
            }
            (Self::ReferenceCollection { target, .. }, Value::Collection(items)) => items
                .iter()
                .all(|item| item.entity_type() == Some(target)),
            _ => false,
        }
    }
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::ScalarCollection {
                collection,
                element,
            } => write!(f, "{collection}<{element}>"),
            Self::Reference(target) => write!(f, "{target}"),
            Self::ReferenceCollection { collection, target } => {
                write!(f, "{collection}<{target}>")
            }
        }
    }
}

/// Relationship kind between two entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[default]
    None,
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationKind {
    /// Kind expected on the opposite side of the relationship
    #[must_use]
    pub fn mirror(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::OneToOne => Self::OneToOne,
            Self::OneToMany => Self::ManyToOne,
            Self::ManyToOne => Self::OneToMany,
            Self::ManyToMany => Self::ManyToMany,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToOne => "many-to-one",
            Self::ManyToMany => "many-to-many",
        })
    }
}

/// Fixed keyword domain for realistic scalar values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    Name,
    Address,
    City,
    State,
    Country,
    Zip,
    Phone,
    Email,
    Company,
    Url,
    Password,
    PastDate,
    FutureDate,
    Paragraph,
}

impl Keyword {
    /// All keywords
    pub const ALL: [Self; 14] = [
        Self::Name,
        Self::Address,
        Self::City,
        Self::State,
        Self::Country,
        Self::Zip,
        Self::Phone,
        Self::Email,
        Self::Company,
        Self::Url,
        Self::Password,
        Self::PastDate,
        Self::FutureDate,
        Self::Paragraph,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_borrows_as_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(TypeName::new("Person"), 1);
        assert_eq!(map.get("Person"), Some(&1));
        assert_eq!(TypeName::from("Person"), "Person");
    }

    #[test]
    fn relation_mirror_is_involution() {
        for kind in [
            RelationKind::None,
            RelationKind::OneToOne,
            RelationKind::OneToMany,
            RelationKind::ManyToOne,
            RelationKind::ManyToMany,
        ] {
            assert_eq!(kind.mirror().mirror(), kind);
        }
        assert_eq!(RelationKind::OneToMany.mirror(), RelationKind::ManyToOne);
    }

    #[test]
    fn parse_literals() {
        assert_eq!(ScalarKind::Int.parse_literal("42"), Some(Value::Int(42)));
        assert_eq!(ScalarKind::Bool.parse_literal("TRUE"), Some(Value::Bool(true)));
        assert_eq!(ScalarKind::Char.parse_literal("ab"), None);
        assert!(ScalarKind::Url
            .parse_literal("https://example.com/")
            .is_some());
        assert_eq!(
            ScalarKind::Date.parse_literal("2020-02-29"),
            NaiveDate::from_ymd_opt(2020, 2, 29).map(Value::Date)
        );
        let colors = ScalarKind::Enum(vec!["RED".into(), "GREEN".into()]);
        assert_eq!(colors.parse_literal("RED"), Some(Value::Text("RED".into())));
        assert_eq!(colors.parse_literal("BLUE"), None);
    }

    #[test]
    fn coerce_between_kinds() {
        assert_eq!(ScalarKind::Long.coerce(Value::Int(7)), Some(Value::Long(7)));
        assert_eq!(ScalarKind::Byte.coerce(Value::Long(1_000)), None);
        assert_eq!(
            ScalarKind::Text.coerce(Value::Char('x')),
            Some(Value::Text("x".into()))
        );
        assert_eq!(
            ScalarKind::Decimal.coerce(Value::Int(3)),
            Some(Value::Decimal(Decimal::from(3)))
        );
        assert_eq!(ScalarKind::Bool.coerce(Value::Int(1)), None);
    }

    #[test]
    fn shape_accepts_null_and_matching_values() {
        let shape = FieldShape::Scalar(ScalarKind::Text);
        assert!(shape.accepts(&Value::Null));
        assert!(shape.accepts(&Value::Text("a".into())));
        assert!(!shape.accepts(&Value::Int(1)));
        assert!(!shape.is_composite());

        let reference = FieldShape::Reference(TypeName::new("Company"));
        assert!(reference.is_composite());
        assert_eq!(reference.target().map(TypeName::as_str), Some("Company"));
    }
}

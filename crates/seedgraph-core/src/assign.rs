//! Value assigners
//!
//! Produce scalar values for classified fields: built-in defaults per scalar
//! kind plus the directive strategies (keyword, custom keyword, literal set,
//! numeric range, factory). Entity-valued fields are built by the graph
//! builder, not here.

use crate::classifier::ValueSource;
use crate::error::{ConfigurationError, MockError, Result};
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use rust_decimal::Decimal;
use seedgraph_data::{generators, Category, MockRegistry, ReferenceData};
use seedgraph_schema::{
    EntityTypeDescriptor, FieldAccessError, FieldDescriptor, FieldShape, Keyword, ScalarKind,
    TypeName, Value,
};
use std::sync::Arc;

/// Scalar value producer
#[derive(Debug, Clone)]
pub struct ValueAssigner {
    data: Arc<dyn ReferenceData>,
    registry: Arc<MockRegistry>,
}

impl ValueAssigner {
    #[must_use]
    pub fn new(data: Arc<dyn ReferenceData>, registry: Arc<MockRegistry>) -> Self {
        Self { data, registry }
    }

    /// Value for a field under a directive strategy
    ///
    /// [`ValueSource::Default`] is only meaningful for single scalars here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for unregistered or unusable directives
    /// and [`FieldAccessError::TypeMismatch`] when a produced value cannot be
    /// converted to the field's kind.
    pub fn directed(
        &self,
        entity: &EntityTypeDescriptor,
        field: &FieldDescriptor,
        source: &ValueSource,
        rng: &mut dyn RngCore,
    ) -> Result<Value> {
        let value = match source {
            ValueSource::Default => {
                let Some(kind) = field.shape.scalar() else {
                    return Err(no_strategy(&entity.name, &field.name));
                };
                return self.default_scalar(&entity.name, &field.name, kind, rng);
            }
            ValueSource::Keyword(keyword) => self.keyword(*keyword, rng)?,
            ValueSource::CustomKeyword(name) => self.custom_keyword(name, rng)?,
            ValueSource::OfSet(literals) => literals
                .iter()
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .choose(rng)
                .map(|l| Value::Text((*l).clone()))
                .ok_or_else(|| no_strategy(&entity.name, &field.name))?,
            ValueSource::Range { min, max } => return range(entity, field, *min, *max, rng),
            ValueSource::Factory(key) => self
                .registry
                .factory(key)
                .ok_or_else(|| ConfigurationError::UnknownFactory(key.clone()))?
                .value(),
        };
        conform(&entity.name, field, value)
    }

    /// Built-in random value for a scalar kind
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyCorpus`] when the website corpus is
    /// empty and [`ConfigurationError::NoStrategy`] for an enum without
    /// variants.
    pub fn default_scalar(
        &self,
        entity: &TypeName,
        field: &str,
        kind: &ScalarKind,
        rng: &mut dyn RngCore,
    ) -> Result<Value> {
        Ok(match kind {
            ScalarKind::Text => Value::Text(self.data.sentence(rng)),
            ScalarKind::Char => Value::Char(char::from(rng.random_range(b'a'..=b'z'))),
            ScalarKind::Bool => Value::Bool(rng.random()),
            ScalarKind::Byte => Value::Byte(rng.random()),
            ScalarKind::Short => Value::Short(rng.random()),
            ScalarKind::Int => Value::Int(rng.random()),
            ScalarKind::Long => Value::Long(rng.random()),
            ScalarKind::Float => Value::Float(rng.random()),
            ScalarKind::Double => Value::Double(rng.random()),
            ScalarKind::Decimal => Value::Decimal(Decimal::new(rng.random_range(0..10_000_000), 2)),
            ScalarKind::Date => Value::Date(generators::any_date(rng, generators::today())),
            ScalarKind::DateTime => {
                Value::DateTime(generators::date_time_near(rng, generators::now()))
            }
            ScalarKind::Url => self
                .data
                .pick(Category::Website, rng)
                .and_then(|site| ScalarKind::Url.parse_literal(&site))
                .ok_or_else(|| ConfigurationError::EmptyCorpus("website".to_string()))?,
            ScalarKind::Enum(variants) => variants
                .choose(rng)
                .map(|v| Value::Text(v.clone()))
                .ok_or_else(|| no_strategy(entity, field))?,
        })
    }

    fn keyword(&self, keyword: Keyword, rng: &mut dyn RngCore) -> Result<Value> {
        self.data
            .keyword(keyword, rng)
            .ok_or_else(|| ConfigurationError::EmptyCorpus(format!("{keyword:?}").to_lowercase()).into())
    }

    fn custom_keyword(&self, name: &str, rng: &mut dyn RngCore) -> Result<Value> {
        let values = self
            .registry
            .custom_keyword(name)
            .ok_or_else(|| ConfigurationError::UnknownCustomKeyword(name.to_uppercase()))?;
        values
            .choose(rng)
            .cloned()
            .ok_or_else(|| ConfigurationError::EmptyCorpus(name.to_uppercase()).into())
    }
}

fn no_strategy(entity: &TypeName, field: &str) -> MockError {
    ConfigurationError::NoStrategy {
        entity: entity.clone(),
        field: field.to_string(),
    }
    .into()
}

/// Uniform sample in `[min, max)`; decimals in `[min, max]` with 2 places
#[allow(clippy::cast_precision_loss)]
fn range(
    entity: &EntityTypeDescriptor,
    field: &FieldDescriptor,
    min: i64,
    max: i64,
    rng: &mut dyn RngCore,
) -> Result<Value> {
    let unsupported = |kind: &str| -> MockError {
        ConfigurationError::RangeUnsupported {
            entity: entity.name.clone(),
            field: field.name.clone(),
            kind: kind.to_string(),
        }
        .into()
    };
    let Some(kind) = field.shape.scalar() else {
        return Err(unsupported(field.shape.name()));
    };
    let value = match kind {
        ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long => {
            Value::Long(rng.random_range(min..max))
        }
        ScalarKind::Float => {
            let (low, high) = (min as f32, max as f32);
            // Large bounds may round to the same float.
            if low >= high {
                return Err(unsupported(kind.name()));
            }
            Value::Float(rng.random_range(low..high))
        }
        ScalarKind::Double => {
            let (low, high) = (min as f64, max as f64);
            if low >= high {
                return Err(unsupported(kind.name()));
            }
            Value::Double(rng.random_range(low..high))
        }
        ScalarKind::Decimal => {
            let (Some(low), Some(high)) = (min.checked_mul(100), max.checked_mul(100)) else {
                return Err(unsupported(kind.name()));
            };
            Value::Decimal(Decimal::new(rng.random_range(low..=high), 2))
        }
        other => return Err(unsupported(other.name())),
    };
    conform(&entity.name, field, value)
}

/// Convert a produced value to the field's scalar kind
fn conform(entity: &TypeName, field: &FieldDescriptor, value: Value) -> Result<Value> {
    let FieldShape::Scalar(kind) = &field.shape else {
        return Ok(value);
    };
    let found = value.kind_name();
    kind.coerce(value).ok_or_else(|| {
        FieldAccessError::TypeMismatch {
            entity: entity.clone(),
            field: field.name.clone(),
            expected: kind.to_string(),
            found: found.to_string(),
        }
        .into()
    })
}

//! Collection kind resolution
//!
//! Maps a declared collection kind plus element type to a concrete kind that
//! accepts a sample element and supports conditional removal. Only the kind is
//! cached; every resolution returns a fresh empty collection.

use crate::error::{ConfigurationError, Result};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use rand::RngCore;
use seedgraph_schema::{
    CollectionKind, CollectionValue, ConcreteCollectionKind, ElementType, ScalarKind,
    SchemaProvider, Value,
};
use std::sync::Arc;

/// Resolver with a process-wide resolution cache
#[derive(Debug)]
pub struct CollectionResolver {
    schema: Arc<dyn SchemaProvider>,
    cache: DashMap<(CollectionKind, ElementType), ConcreteCollectionKind>,
}

impl CollectionResolver {
    #[must_use]
    pub fn new(schema: Arc<dyn SchemaProvider>) -> Self {
        Self {
            schema,
            cache: DashMap::new(),
        }
    }

    /// Fresh empty collection for a declared kind and element type
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnrecognizedCollectionKind`] when no
    /// candidate accepts a sample element.
    pub fn resolve(
        &self,
        kind: CollectionKind,
        element: &ElementType,
        rng: &mut dyn RngCore,
    ) -> Result<CollectionValue> {
        Ok(CollectionValue::new(self.resolve_kind(kind, element, rng)?))
    }

    /// Concrete kind for a declared kind and element type
    ///
    /// # Errors
    ///
    /// See [`CollectionResolver::resolve`].
    pub fn resolve_kind(
        &self,
        kind: CollectionKind,
        element: &ElementType,
        rng: &mut dyn RngCore,
    ) -> Result<ConcreteCollectionKind> {
        let key = (kind, element.clone());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(*hit.value());
        }
        let concrete = self.pick(kind, element, rng)?;
        tracing::debug!("resolved {}<{}> to {}", kind, element, concrete);
        Ok(*self.cache.entry(key).or_insert(concrete).value())
    }

    /// Number of cached resolutions
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn pick(
        &self,
        kind: CollectionKind,
        element: &ElementType,
        rng: &mut dyn RngCore,
    ) -> Result<ConcreteCollectionKind> {
        let unrecognized = || ConfigurationError::UnrecognizedCollectionKind {
            kind,
            element: element.to_string(),
        };
        let sample = self.sample(element).ok_or_else(unrecognized)?;
        let mut candidates = kind.candidates();
        candidates.shuffle(rng);
        candidates
            .into_iter()
            .find(|candidate| accepts(*candidate, &sample))
            .ok_or_else(|| unrecognized().into())
    }

    fn sample(&self, element: &ElementType) -> Option<Value> {
        match element {
            ElementType::Scalar(kind) => sample_literal(kind).and_then(|l| kind.parse_literal(l)),
            ElementType::Entity(name) => self
                .schema
                .default_instance(name.as_str())
                .ok()
                .map(|instance| Value::Entity(Box::new(instance))),
        }
    }
}

fn sample_literal(kind: &ScalarKind) -> Option<&str> {
    Some(match kind {
        ScalarKind::Text => "sample",
        ScalarKind::Char => "a",
        ScalarKind::Bool => "true",
        ScalarKind::Byte
        | ScalarKind::Short
        | ScalarKind::Int
        | ScalarKind::Long
        | ScalarKind::Float
        | ScalarKind::Double
        | ScalarKind::Decimal => "0",
        ScalarKind::Date => "1970-01-01",
        ScalarKind::DateTime => "1970-01-01T00:00:00",
        ScalarKind::Url => "https://example.com/",
        ScalarKind::Enum(variants) => variants.first()?.as_str(),
    })
}

/// Add the sample, then remove it again by equality
fn accepts(candidate: ConcreteCollectionKind, sample: &Value) -> bool {
    if candidate.is_concurrent() {
        return false;
    }
    let mut trial = CollectionValue::new(candidate);
    if trial.insert(sample.clone()).is_err() {
        return false;
    }
    let needle = sample.to_string();
    trial.remove_if(|item| item.to_string() == needle)
}
